#![allow(dead_code)]

use ::core::cell::Cell;
use ::std::net::{SocketAddr, ToSocketAddrs};
use ::std::sync::{Arc, Mutex};

use croak_msg::{Message, TryFromBytes, TryIntoBytes};
use embedded_time::rate::Fraction;
use embedded_time::Instant;

use crate::net::{Addrd, Socket, TransportError};

/// Platform using mocks for clock and sock
#[derive(Debug, Clone, Copy)]
pub struct Mock;

impl crate::platform::PlatformTypes for Mock {
  type Clock = ClockMock;
  type Socket = SockMock;
}

/// A clock that only moves when told to. One tick is one millisecond.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockMock(pub Cell<u64>);

impl ClockMock {
  pub fn new() -> Self {
    Self(Cell::new(0))
  }

  pub fn set(&self, to: u64) {
    self.0.set(to);
  }
}

impl embedded_time::Clock for ClockMock {
  type T = u64;

  const SCALING_FACTOR: Fraction = Fraction::new(1, 1_000);

  fn try_now(&self) -> Result<Instant<Self>, embedded_time::clock::Error> {
    Ok(Instant::new(self.0.get()))
  }
}

pub type Dgrams = Arc<Mutex<Vec<Addrd<Vec<u8>>>>>;

/// A mocked socket
#[derive(Debug)]
pub struct SockMock {
  /// Inbound bytes from remote sockets. Address represents the sender
  pub rx: Dgrams,
  /// Outbound bytes to remote sockets. Address represents the destination
  pub tx: Dgrams,
}

impl SockMock {
  pub fn new() -> Self {
    Self { rx: Default::default(),
           tx: Default::default() }
  }

  /// Queue a message for the socket to receive
  pub fn send_msg(rx: &Dgrams, msg: Addrd<Message>) {
    rx.lock()
      .unwrap()
      .push(msg.map(|msg| msg.try_into_bytes().unwrap()));
  }

  /// Take every message the socket has sent so far
  pub fn sent(tx: &Dgrams) -> Vec<Addrd<Message>> {
    tx.lock()
      .unwrap()
      .drain(..)
      .map(|dgram| dgram.map(|bytes| Message::try_from_bytes(bytes).unwrap()))
      .collect()
  }
}

impl Socket for SockMock {
  type Error = TransportError;

  fn local_addr(&self) -> Result<SocketAddr, Self::Error> {
    Ok("127.0.0.1:5683".parse().unwrap())
  }

  fn bind_raw<A: ToSocketAddrs>(_: A) -> Result<Self, Self::Error> {
    Ok(Self::new())
  }

  fn send(&self, msg: Addrd<&[u8]>) -> nb::Result<(), Self::Error> {
    self.tx.lock().unwrap().push(msg.map(|bytes| bytes.to_vec()));
    Ok(())
  }

  fn recv(&self, buffer: &mut [u8]) -> nb::Result<Addrd<usize>, Self::Error> {
    let mut rx = self.rx.lock().unwrap();

    if rx.is_empty() {
      return Err(nb::Error::WouldBlock);
    }

    let Addrd(dgram, addr) = rx.remove(0);
    let n = dgram.len().min(buffer.len());
    buffer[..n].copy_from_slice(&dgram[..n]);

    Ok(Addrd(n, addr))
  }
}
