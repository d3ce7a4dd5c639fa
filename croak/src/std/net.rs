use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use crate::net::{Addrd, Socket, TransportError};

impl Socket for UdpSocket {
  type Error = io::Error;

  fn local_addr(&self) -> Result<SocketAddr, Self::Error> {
    UdpSocket::local_addr(self)
  }

  fn bind_raw<A: ToSocketAddrs>(addr: A) -> Result<Self, Self::Error> {
    let sock = UdpSocket::bind(addr)?;
    sock.set_nonblocking(true)?;
    Ok(sock)
  }

  fn send(&self, msg: Addrd<&[u8]>) -> nb::Result<(), Self::Error> {
    self.send_to(msg.data(), msg.addr())
        .map(|_| ())
        .map_err(io_to_nb)
  }

  fn recv(&self, buffer: &mut [u8]) -> nb::Result<Addrd<usize>, Self::Error> {
    self.recv_from(buffer)
        .map(|(n, addr)| Addrd(n, addr))
        .map_err(io_to_nb)
  }
}

impl From<io::Error> for TransportError {
  fn from(err: io::Error) -> Self {
    match err.kind() {
      | io::ErrorKind::AddrInUse => TransportError::AddressInUse,
      | io::ErrorKind::AddrNotAvailable | io::ErrorKind::NotFound => TransportError::HostNotFound,
      | io::ErrorKind::ConnectionRefused | io::ErrorKind::ConnectionReset => {
        TransportError::ConnectionRefused
      },
      | io::ErrorKind::PermissionDenied => TransportError::PermissionDenied,
      | _ => TransportError::Other,
    }
  }
}

fn io_to_nb(err: io::Error) -> nb::Error<io::Error> {
  match err.kind() {
    | io::ErrorKind::WouldBlock => nb::Error::WouldBlock,
    | _ => nb::Error::Other(err),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn io_errors_map_to_transport_errors() {
    let cases = [(io::ErrorKind::AddrInUse, TransportError::AddressInUse),
                 (io::ErrorKind::ConnectionRefused, TransportError::ConnectionRefused),
                 (io::ErrorKind::PermissionDenied, TransportError::PermissionDenied),
                 (io::ErrorKind::TimedOut, TransportError::Other)];

    cases.into_iter().for_each(|(kind, expected)| {
                       assert_eq!(TransportError::from(io::Error::from(kind)), expected)
                     });
  }

  #[test]
  fn poll_nonblocking_socket() {
    let a = UdpSocket::bind_raw("127.0.0.1:0").unwrap();
    let b = UdpSocket::bind_raw("127.0.0.1:0").unwrap();
    let a_addr = Socket::local_addr(&a).unwrap();
    let b_addr = Socket::local_addr(&b).unwrap();

    assert_eq!(b.poll().unwrap(), None);

    nb::block!(Socket::send(&a, Addrd(&[1u8, 2, 3][..], b_addr))).unwrap();

    let dgram = loop {
      if let Some(dgram) = b.poll().unwrap() {
        break dgram;
      }
    };

    assert_eq!(dgram, Addrd(vec![1, 2, 3], a_addr));
  }
}
