use std::net::SocketAddr;

use croak_msg::to_bytes::MessageToBytesError;
use croak_msg::{BlockError, Id, Token};

use crate::exchange::Handle;
use crate::net::TransportError;
use crate::resp::code::StatusError;

/// The context that an error occurred in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum When {
  /// We were polling for messages or timers when the error occurred
  Polling,
  /// We were sending a message
  SendingMessage(Option<SocketAddr>, Id, Token),
  /// We were retransmitting the message of the exchange with this token
  Retrying(Token),
  /// No particular context
  None,
}

impl When {
  /// Construct a specific error from the context the error occurred in
  pub fn what(self, what: What) -> Error {
    Error { when: self, what }
  }
}

/// An error encounterable from within Core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Error {
  /// What happened?
  pub what: What,
  /// What were we doing when it happened?
  pub when: When,
}

impl Error {
  /// Is this a failed response from the server?
  pub fn status(&self) -> Option<StatusError> {
    match self.what {
      | What::Status(e) => Some(e),
      | _ => None,
    }
  }

  /// Did the exchange run out of time?
  pub fn is_timeout(&self) -> bool {
    self.what == What::Timeout
  }
}

/// A contextless error with some additional debug data attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum What {
  /// Some socket operation (e.g. sending a datagram) failed
  Transport(TransportError),
  /// Serializing a message to bytes failed
  ToBytes(MessageToBytesError),
  /// A block option could not be created
  Block(BlockError),
  /// A CONfirmable message was sent many times without an ACKnowledgement,
  /// or no response arrived before the exchange lifetime ran out.
  Timeout,
  /// The server rejected our message with a Reset
  Reset,
  /// The server responded with a 4.xx or 5.xx code
  Status(StatusError),
  /// The request was created with a token that another
  /// outstanding request is using
  TokenInUse(Token),
  /// No outstanding request has this handle
  UnknownExchange(Handle),
  /// The clock failed to provide timing.
  ///
  /// See [`embedded_time::clock::Error`]
  ClockError,
  /// The thread driving the client has stopped
  ClientGone,
}
