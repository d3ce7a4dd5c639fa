//! Low-level representation of CoAP messages.
//!
//! The most notable item in `croak_msg` is [`Message`];
//! a CoAP message very close to the actual byte layout.
//!
//! ## Options
//! Options are stored in the order they were added, each tagged with
//! its absolute [`OptNumber`]. The delta encoding used on the wire is
//! computed when serializing, which sorts the options by number.
//!
//! ## Block-wise transfers
//! The [`Block`] type and [`generate_block_option`] translate between the packed
//! Block1 / Block2 option values (RFC 7959) and `(num, more, size)`.
//!
//! ```
//! use croak_msg::{Code, Id, Message, Token, TryFromBytes, TryIntoBytes, Type};
//!
//! let msg = Message::new(Type::Non,
//!                        Code::new(0, 1),
//!                        Id(24806),
//!                        Token::from_slice(b"abcd").unwrap());
//!
//! let bytes: Vec<u8> = msg.clone().try_into_bytes().unwrap();
//! assert_eq!(bytes, vec![0x54, 0x01, 0x60, 0xE6, 0x61, 0x62, 0x63, 0x64]);
//! assert_eq!(Message::try_from_bytes(&bytes).unwrap(), msg);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(not(test), forbid(missing_debug_implementations, unreachable_pub))]
#![cfg_attr(not(test), deny(unsafe_code))]
#![deny(missing_docs)]

extern crate alloc as std_alloc;

mod cursor;

#[doc(hidden)]
pub mod from_bytes;

/// Message structs
pub mod msg;

#[doc(hidden)]
pub mod to_bytes;

#[doc(inline)]
pub use from_bytes::TryFromBytes;
#[doc(inline)]
pub use msg::*;
#[doc(inline)]
pub use to_bytes::TryIntoBytes;

#[cfg(test)]
pub(crate) fn test_msg() -> (Message, Vec<u8>) {
  //                        version  token len  code (2.05 Content)
  //                        |        |          /
  //                        |  type  |         /  message ID
  //                        |  |     |        |   |
  //                        vv vv vvvv vvvvvvvv vvvvvvvvvvvvvvvv
  let header: [u8; 4] = 0b_01_00_0001_01000101_0000000000000001u32.to_be_bytes();
  let token: [u8; 1] = [254u8];
  let content_format: &[u8] = b"application/json";
  let options: [&[u8]; 2] = [&[0b_1100_1101u8, 0b00000011u8], content_format];
  let payload: [&[u8]; 2] = [&[0b1111_1111_u8], b"hello, world!"];
  let bytes = [header.as_ref(),
               token.as_ref(),
               options.concat().as_ref(),
               payload.concat().as_ref()].concat();

  let msg = Message { id: Id(1),
                      ty: Type::Con,
                      ver: Version(1),
                      token: Token(tinyvec::array_vec!([u8; 8] => 254)),
                      opts: vec![Opt::new(OptNumber(12), content_format.to_vec())],
                      code: Code { class: 2,
                                   detail: 5 },
                      payload: Payload(b"hello, world!".to_vec()) };
  (msg, bytes)
}

#[cfg(test)]
pub(crate) mod tests {
  /// Assert two bytes are equal, printing them in binary when they aren't
  #[macro_export]
  macro_rules! assert_eqb {
    ($actual:expr, $expected:expr) => {
      if $actual != $expected {
        panic!("expected {:08b} to equal {:08b}", $actual, $expected)
      }
    };
  }

  /// Assert two byte sequences are equal, printing them in binary when they aren't
  #[macro_export]
  macro_rules! assert_eqb_iter {
    ($actual:expr, $expected:expr) => {
      if $actual.iter().ne($expected.iter()) {
        panic!("expected {:?} to equal {:?}",
               $actual.into_iter()
                      .map(|b| format!("{:08b}", b))
                      .collect::<Vec<_>>(),
               $expected.into_iter()
                        .map(|b| format!("{:08b}", b))
                        .collect::<Vec<_>>())
      }
    };
  }
}
