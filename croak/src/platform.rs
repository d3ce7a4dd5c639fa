use crate::net::Socket;
use crate::time::Clock;

/// The clock and socket a [`crate::core::Core`] runs on
pub trait PlatformTypes: Sized + 'static + core::fmt::Debug {
  /// What should we use to keep track of time?
  type Clock: Clock + core::fmt::Debug;

  /// What should we use for networking?
  type Socket: Socket + core::fmt::Debug;
}

/// [`std::net::UdpSocket`] and [`crate::std::Clock`]
pub type Std = crate::std::PlatformTypes;
