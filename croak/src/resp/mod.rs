use std::net::SocketAddr;
use std::string::FromUtf8Error;

use croak_msg::{Code, ContentFormat, Message};

/// Response codes
pub mod code;

/// A response delivered to the application.
///
/// For block-wise transfers this carries the metadata of the
/// last block received and the reassembled body of all blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct Resp {
  pub(crate) msg: Message,
  pub(crate) addr: SocketAddr,
  pub(crate) payload: Vec<u8>,
}

impl Resp {
  pub(crate) fn new(msg: Message, addr: SocketAddr, payload: Vec<u8>) -> Self {
    Self { msg, addr, payload }
  }

  /// The response code
  pub fn code(&self) -> Code {
    self.msg.code
  }

  /// Who sent this response
  pub fn addr(&self) -> SocketAddr {
    self.addr
  }

  /// The full response body
  pub fn payload(&self) -> &[u8] {
    &self.payload
  }

  /// Take the full response body
  pub fn into_payload(self) -> Vec<u8> {
    self.payload
  }

  /// Try to decode the body as UTF-8
  pub fn payload_string(&self) -> Result<String, FromUtf8Error> {
    String::from_utf8(self.payload.clone())
  }

  /// The Content-Format of the body, if the server said
  pub fn content_format(&self) -> Option<ContentFormat> {
    self.msg.content_format()
  }

  /// The sequence number of an observe notification
  pub fn observe_seq(&self) -> Option<u32> {
    self.msg.observe()
  }

  /// The last message received for this response
  pub fn msg(&self) -> &Message {
    &self.msg
  }
}
