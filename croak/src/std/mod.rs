use embedded_time::rate::Fraction;

mod net;

/// The std platform: a monotonic [`Clock`] and a non-blocking
/// [`std::net::UdpSocket`].
#[derive(Clone, Copy, Debug)]
pub struct PlatformTypes;

impl crate::platform::PlatformTypes for PlatformTypes {
  type Clock = Clock;
  type Socket = std::net::UdpSocket;
}

/// Microseconds since the clock was created
#[derive(Debug, Clone, Copy)]
pub struct Clock(std::time::Instant);

impl Default for Clock {
  fn default() -> Self {
    Self::new()
  }
}

impl Clock {
  /// Create a new clock
  pub fn new() -> Self {
    Self(std::time::Instant::now())
  }
}

impl embedded_time::Clock for Clock {
  type T = u64;

  // microseconds
  const SCALING_FACTOR: Fraction = Fraction::new(1, 1_000_000);

  fn try_now(&self) -> Result<embedded_time::Instant<Self>, embedded_time::clock::Error> {
    let now = std::time::Instant::now();
    let elapsed = now.duration_since(self.0);
    Ok(embedded_time::Instant::new(elapsed.as_micros() as u64))
  }
}
