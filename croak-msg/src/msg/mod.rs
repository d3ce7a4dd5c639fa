use std_alloc::vec::Vec;

/// Message Code
pub mod code;

/// Message parsing errors
pub mod parse_error;

/// Message ID
pub mod id;

/// Message Options
pub mod opt;

/// Message Type
pub mod ty;

/// Message Token
pub mod token;

/// Message Version
pub mod ver;

pub use code::*;
pub use id::*;
pub use opt::*;
pub use parse_error::*;
pub use token::*;
pub use ty::*;
pub use ver::*;

use crate::cursor::Cursor;
use crate::from_bytes::TryConsumeBytes;
use crate::TryFromBytes;

/// Message payload; the CoAP equivalent of an HTTP body
///
/// See [RFC7252 - Payloads](https://datatracker.ietf.org/doc/html/rfc7252#section-5.5)
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Payload(pub Vec<u8>);

/// Struct representing the first byte of a message.
///
/// ```text
/// CoAP version
/// |
/// |  Message type (request, response, empty)
/// |  |
/// |  |  Length of token, in bytes. (4-bit integer)
/// |  |  |
/// vv vv vvvv
/// 01 00 0000
/// ```
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub(crate) struct Byte1 {
  pub(crate) ver: Version,
  pub(crate) ty: Type,
  pub(crate) tkl: u8,
}

impl TryFrom<u8> for Byte1 {
  type Error = MessageParseError;

  fn try_from(b: u8) -> Result<Self, Self::Error> {
    let ver = b >> 6; // bits 0 & 1
    let ty = b >> 4 & 0b11; // bits 2 & 3
    let tkl = b & 0b1111u8; // last 4 bits

    Ok(Byte1 { ver: Version(ver),
               ty: Type::try_from(ty)?,
               tkl })
  }
}

impl From<Byte1> for u8 {
  fn from(b: Byte1) -> u8 {
    let ver = b.ver.0 << 6;
    let ty = u8::from(b.ty) << 4;
    let tkl = b.tkl;

    ver | ty | tkl
  }
}

/// # `Message` struct
/// Low-level representation of a CoAP message.
///
/// Messages support both serializing to bytes and from bytes, by using the provided [`TryFromBytes`] and [`TryIntoBytes`](crate::TryIntoBytes) traits.
///
/// See [RFC7252 - Message Format](https://datatracker.ietf.org/doc/html/rfc7252#section-3)
///
/// ```
/// use croak_msg::TryFromBytes;
/// use croak_msg::*;
/// # //                       version  token len  code (2.05 Content)
/// # //                       |        |          /
/// # //                       |  type  |         /  message ID
/// # //                       |  |     |        |   |
/// # //                       vv vv vvvv vvvvvvvv vvvvvvvvvvvvvvvv
/// # let header: [u8; 4] = 0b_01_00_0001_01000101_0000000000000001u32.to_be_bytes();
/// # let token: [u8; 1] = [254u8];
/// # let content_format: &[u8] = b"application/json";
/// # let options: [&[u8]; 2] = [&[0b_1100_1101u8, 0b00000011u8], content_format];
/// # let payload: [&[u8]; 2] = [&[0b_11111111u8], b"hello, world!"];
/// let packet: Vec<u8> = /* bytes! */
/// # [header.as_ref(), token.as_ref(), options.concat().as_ref(), payload.concat().as_ref()].concat();
///
/// let msg = Message::try_from_bytes(packet.clone()).unwrap();
///
/// let expected = Message {
///   id: Id(1),
///   ty: Type::Con,
///   ver: Version(1),
///   token: Token(tinyvec::array_vec!([u8; 8] => 254)),
///   opts: vec![Opt::new(OptNumber(12), content_format.to_vec())],
///   code: Code {class: 2, detail: 5},
///   payload: Payload(b"hello, world!".to_vec()),
/// };
///
/// assert_eq!(msg, expected);
/// ```
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Message {
  /// see [`Id`] for details
  pub id: Id,
  /// see [`Type`] for details
  pub ty: Type,
  /// see [`Version`] for details
  pub ver: Version,
  /// see [`Token`] for details
  pub token: Token,
  /// see [`Code`] for details
  pub code: Code,
  /// see [`opt::Opt`] for details
  pub opts: Vec<Opt>,
  /// see [`Payload`]
  pub payload: Payload,
}

impl Default for Type {
  fn default() -> Self {
    Type::Con
  }
}

impl Message {
  /// Create a new message with no options and an empty payload
  pub fn new(ty: Type, code: Code, id: Id, token: Token) -> Self {
    Self { id,
           ty,
           code,
           token,
           ver: Default::default(),
           opts: Default::default(),
           payload: Default::default() }
  }

  /// Create a new empty message that ACKs this one.
  ///
  /// This needs an [`Id`] to assign to the newly created message.
  ///
  /// ```
  /// use croak_msg::{Code, Id, Message, Token, Type};
  ///
  /// let con = Message::new(Type::Con, Code::new(2, 5), Id(7), Token::opaque(&[1]));
  /// let ack = con.ack(con.id);
  ///
  /// assert_eq!(ack.ty, Type::Ack);
  /// assert_eq!(ack.id, Id(7));
  /// assert_eq!(ack.token, con.token);
  /// assert_eq!(ack.code, Code::new(0, 0));
  /// ```
  pub fn ack(&self, id: Id) -> Self {
    Self::new(Type::Ack, Code::new(0, 0), id, self.token)
  }

  /// Create a new empty message that rejects this one with a Reset.
  pub fn reset(&self, id: Id) -> Self {
    Self::new(Type::Reset, Code::new(0, 0), id, self.token)
  }

  /// Get the first value for an option
  pub fn get(&self, number: OptNumber) -> Option<&OptValue> {
    self.opts
        .iter()
        .find(|o| o.number == number)
        .map(|o| &o.value)
  }

  /// Get all values for a (repeatable) option, in insertion order
  pub fn get_all(&self, number: OptNumber) -> impl Iterator<Item = &OptValue> {
    self.opts
        .iter()
        .filter(move |o| o.number == number)
        .map(|o| &o.value)
  }

  /// Replace all values for an option with a single value
  ///
  /// If the value is longer than the option allows, a warning is logged
  /// and the value is stored anyway.
  ///
  /// ```
  /// use croak_msg::{no_repeat, Code, Id, Message, OptValue, Token, Type};
  ///
  /// let mut msg = Message::new(Type::Con, Code::new(0, 1), Id(1), Token::default());
  /// msg.set(no_repeat::ACCEPT, vec![50]);
  /// msg.set(no_repeat::ACCEPT, vec![0]);
  ///
  /// assert_eq!(msg.get_all(no_repeat::ACCEPT).collect::<Vec<_>>(), vec![&OptValue(vec![0])]);
  /// ```
  pub fn set(&mut self, number: OptNumber, value: impl Into<Vec<u8>>) {
    let pos = self.opts.iter().position(|o| o.number == number);
    self.remove(number);

    let opt = Self::checked(Opt::new(number, value));
    match pos {
      | Some(ix) => self.opts.insert(ix, opt),
      | None => self.opts.push(opt),
    }
  }

  /// Add a value for a (repeatable) option, keeping existing values
  pub fn add(&mut self, number: OptNumber, value: impl Into<Vec<u8>>) {
    let opt = Self::checked(Opt::new(number, value));
    self.opts.push(opt);
  }

  /// Remove all values for an option, yielding whether any were present
  pub fn remove(&mut self, number: OptNumber) -> bool {
    let len = self.opts.len();
    self.opts.retain(|o| o.number != number);
    len != self.opts.len()
  }

  fn checked(opt: Opt) -> Opt {
    if let Err(OptValueTooLong { number, max, actual }) = opt.validate() {
      log::warn!("option {} value is {} bytes, more than the allowed {}",
                 number.0,
                 actual,
                 max);
    }

    opt
  }

  /// Get the Block1 option
  pub fn block1(&self) -> Option<Block> {
    self.get(no_repeat::BLOCK1)
        .and_then(|v| Block::from_bytes(&v.0))
  }

  /// Get the Block2 option
  pub fn block2(&self) -> Option<Block> {
    self.get(no_repeat::BLOCK2)
        .and_then(|v| Block::from_bytes(&v.0))
  }

  /// Get the Observe option's value (a registration [`Action`] in requests,
  /// a sequence number in notifications)
  pub fn observe(&self) -> Option<u32> {
    self.get(no_repeat::OBSERVE).and_then(OptValue::as_uint)
  }

  /// Get the Content-Format of the payload
  pub fn content_format(&self) -> Option<ContentFormat> {
    self.get(no_repeat::CONTENT_FORMAT)
        .and_then(OptValue::as_uint)
        .map(|n| ContentFormat::from(n as u16))
  }

  /// Set the Content-Format of the payload
  pub fn set_content_format(&mut self, format: ContentFormat) {
    self.set(no_repeat::CONTENT_FORMAT, format.bytes().0);
  }

  /// Replace the payload
  pub fn set_payload(&mut self, payload: impl Into<Vec<u8>>) {
    self.payload = Payload(payload.into());
  }

  /// Decode a message from bytes into `self`, appending the
  /// decoded payload to the payload `self` already has.
  ///
  /// Header, token and options are replaced. On error `self` is left untouched.
  ///
  /// ```
  /// use croak_msg::{Message, TryFromBytes};
  ///
  /// let mut msg = Message::try_from_bytes([0x60, 0x45, 0, 1, 0xFF, b'a', b'b']).unwrap();
  /// msg.try_append_from_bytes([0x60, 0x45, 0, 2, 0xFF, b'c']).unwrap();
  ///
  /// assert_eq!(msg.payload.0, b"abc".to_vec());
  /// assert_eq!(msg.id.0, 2);
  /// ```
  pub fn try_append_from_bytes<A: AsRef<[u8]>>(&mut self,
                                               bytes: A)
                                               -> Result<(), MessageParseError> {
    let mut next = Self::try_from_bytes(bytes)?;
    let mut payload = core::mem::take(&mut self.payload.0);
    payload.append(&mut next.payload.0);
    next.payload = Payload(payload);
    *self = next;
    Ok(())
  }
}

impl<Bytes: AsRef<[u8]>> TryFromBytes<Bytes> for Message {
  type Error = MessageParseError;

  fn try_from_bytes(bytes: Bytes) -> Result<Self, Self::Error> {
    let mut bytes = Cursor::new(bytes);

    let Byte1 { tkl, ty, ver } = bytes.next()
                                      .ok_or_else(MessageParseError::eof)?
                                      .try_into()?;

    if ver != Version::default() {
      return Err(Self::Error::UnsupportedVersion(ver.0));
    }

    if tkl > 8 {
      return Err(Self::Error::InvalidTokenLength(tkl));
    }

    let code: Code = bytes.next().ok_or_else(MessageParseError::eof)?.into();
    let id: Id = Id::try_consume_bytes(&mut bytes)?;

    let token = bytes.take_exact(tkl as usize)
                     .and_then(Token::from_slice)
                     .ok_or_else(MessageParseError::eof)?;

    let opts = Vec::<Opt>::try_consume_bytes(&mut bytes).map_err(Self::Error::OptParseError)?;

    let payload = Payload(bytes.take_until_end().to_vec());

    Ok(Message { id,
                 ty,
                 ver,
                 code,
                 token,
                 opts,
                 payload })
  }
}
