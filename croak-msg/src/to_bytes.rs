use std_alloc::vec::Vec;

use tinyvec::ArrayVec;

use crate::*;

/// Largest option delta or value length the extended-field scheme can carry
pub const MAX_OPT_LEN_OR_DELTA: u32 = 65535 + 269;

/// Trait allowing fallible conversion into bytes
pub trait TryIntoBytes {
  /// Error type yielded if conversion fails
  type Error;

  /// Try to convert into a collection of bytes
  ///
  /// ```
  /// use croak_msg::{Code, Id, Message, Token, TryIntoBytes, Type};
  ///
  /// let msg = Message::new(Type::Non, Code::new(0, 1), Id(1), Token::default());
  /// let bytes: Vec<u8> = msg.try_into_bytes().unwrap();
  /// assert_eq!(bytes, vec![0b0101_0000, 0x01, 0x00, 0x01]);
  /// ```
  fn try_into_bytes(self) -> Result<Vec<u8>, Self::Error>;
}

/// Errors encounterable serializing to bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MessageToBytesError {
  /// The gap between two consecutive option numbers
  /// was too large to encode
  OptionDeltaTooLarge(u32),
  /// An option value was too long to encode
  OptionValueTooLong(usize),
}

impl<'a> TryIntoBytes for &'a Message {
  type Error = MessageToBytesError;

  fn try_into_bytes(self) -> Result<Vec<u8>, Self::Error> {
    let size = 4
               + self.token.0.len()
               + self.opts.iter().map(|o| 5 + o.value.0.len()).sum::<usize>()
               + 1
               + self.payload.0.len();
    let mut bytes = Vec::with_capacity(size);

    let byte1: u8 = Byte1 { tkl: self.token.0.len() as u8,
                            ver: self.ver,
                            ty: self.ty }.into();
    let code: u8 = self.code.into();
    let id: [u8; 2] = self.id.into();

    bytes.push(byte1);
    bytes.push(code);
    bytes.extend(id);
    bytes.extend(self.token.as_bytes());

    // stable; repeated options keep their relative order
    let mut opts = self.opts.iter().collect::<Vec<_>>();
    opts.sort_by_key(|o| o.number);

    let mut prev = 0u32;
    for opt in opts {
      extend_opt(opt, opt.number.0 - prev, &mut bytes)?;
      prev = opt.number.0;
    }

    if !self.payload.0.is_empty() {
      bytes.push(0b11111111);
      bytes.extend(&self.payload.0);
    }

    Ok(bytes)
  }
}

impl TryIntoBytes for Message {
  type Error = MessageToBytesError;

  fn try_into_bytes(self) -> Result<Vec<u8>, Self::Error> {
    (&self).try_into_bytes()
  }
}

/// Given a collection to [`Extend`] and an Opt, add that Opt's bytes to the collection.
fn extend_opt(opt: &Opt, delta: u32, bytes: &mut Vec<u8>) -> Result<(), MessageToBytesError> {
  let (del, del_bytes) =
    opt_len_or_delta(delta).ok_or(MessageToBytesError::OptionDeltaTooLarge(delta))?;
  let (len, len_bytes) =
    opt_len_or_delta(opt.value.0.len() as u32).ok_or(MessageToBytesError::OptionValueTooLong(opt.value.0.len()))?;

  bytes.push(del << 4 | len);

  if let Some(bs) = del_bytes {
    bytes.extend(bs);
  }

  if let Some(bs) = len_bytes {
    bytes.extend(bs);
  }

  bytes.extend(&opt.value.0);
  Ok(())
}

pub(crate) fn opt_len_or_delta(val: u32) -> Option<(u8, Option<ArrayVec<[u8; 2]>>)> {
  match val {
    | n if n > MAX_OPT_LEN_OR_DELTA => None,
    | n if n >= 269 => {
      let mut bytes = ArrayVec::new();
      bytes.extend(((n - 269) as u16).to_be_bytes());
      Some((14, Some(bytes)))
    },
    | n if n >= 13 => {
      let mut bytes = ArrayVec::new();
      bytes.push((n as u8) - 13);
      Some((13, Some(bytes)))
    },
    | n => Some((n as u8, None)),
  }
}

#[cfg(test)]
mod tests {
  use core::iter::repeat;

  use super::*;
  use crate::{assert_eqb, assert_eqb_iter};

  #[test]
  fn msg() {
    let (msg, expected) = test_msg();
    let actual: Vec<u8> = msg.try_into_bytes().unwrap();
    assert_eqb_iter!(actual, expected);
  }

  #[test]
  fn reference_get() {
    let msg = Message::new(Type::Non,
                           Code::new(0, 1),
                           Id(24806),
                           Token::from_slice(&[0x61, 0x62, 0x63, 0x64]).unwrap());
    let actual: Vec<u8> = msg.try_into_bytes().unwrap();
    assert_eq!(actual,
               vec![0x54, 0x01, 0x60, 0xE6, 0x61, 0x62, 0x63, 0x64]);
  }

  #[test]
  fn byte_1() {
    let byte = Byte1 { ver: Version(1),
                       ty: Type::Ack,
                       tkl: 3 };
    let actual: u8 = byte.into();
    let expected = 0b_01_10_0011u8;
    assert_eqb!(actual, expected)
  }

  #[test]
  fn id() {
    let id = Id(16);
    let actual = u16::from_be_bytes(id.into());
    assert_eqb!(actual, 16)
  }

  #[test]
  fn opt() {
    let cases: [(u32, Vec<u8>, Vec<u8>); 5] =
      [(24,
        repeat(1).take(100).collect(),
        [[0b1101_1101u8, 24 - 13, 100 - 13].as_ref(),
         repeat(1).take(100).collect::<Vec<u8>>().as_ref()].concat()),
       (1, vec![1], vec![0b0001_0001, 1]),
       (24, vec![1], vec![0b1101_0001, 11, 1]),
       (13, vec![], vec![0b1101_0000, 0]),
       (24,
        repeat(1).take(300).collect(),
        [[0b1101_1110, 24 - 13].as_ref(),
         (300u16 - 269).to_be_bytes().as_ref(),
         repeat(1).take(300).collect::<Vec<u8>>().as_ref()].concat())];

    cases.into_iter().for_each(|(delta, values, expected)| {
                       let opt = Opt::new(OptNumber(delta), values);
                       let mut actual = Vec::<u8>::new();
                       extend_opt(&opt, delta, &mut actual).unwrap();
                       assert_eqb_iter!(actual, expected)
                     });
  }

  #[test]
  fn opt_out_of_range() {
    assert_eq!(opt_len_or_delta(MAX_OPT_LEN_OR_DELTA).map(|(n, _)| n), Some(14));
    assert_eq!(opt_len_or_delta(MAX_OPT_LEN_OR_DELTA + 1), None);

    let mut msg = Message::default();
    msg.add(OptNumber(MAX_OPT_LEN_OR_DELTA + 1), vec![]);
    assert_eq!(msg.try_into_bytes(),
               Err(MessageToBytesError::OptionDeltaTooLarge(MAX_OPT_LEN_OR_DELTA + 1)));
  }

  #[test]
  fn options_sorted_by_number() {
    let mut msg = Message::new(Type::Con, Code::new(0, 1), Id(1), Token::default());
    msg.set(no_repeat::BLOCK2, vec![0x02]);
    msg.add(repeat::PATH, "a");
    msg.set(no_repeat::HOST, "h");
    msg.add(repeat::PATH, "b");

    let bytes: Vec<u8> = (&msg).try_into_bytes().unwrap();
    assert_eq!(&bytes[4..],
               &[0x31, b'h', 0x81, b'a', 0x01, b'b', 0xC1, 0x02]);

    let decoded = Message::try_from_bytes(&bytes).unwrap();
    let numbers = decoded.opts.iter().map(|o| o.number.0).collect::<Vec<_>>();
    assert_eq!(numbers, vec![3, 11, 11, 23]);
    assert_eq!(decoded.get_all(repeat::PATH).map(|v| v.0.clone()).collect::<Vec<_>>(),
               vec![b"a".to_vec(), b"b".to_vec()]);
  }

  #[test]
  fn round_trip() {
    let mut msg = Message::new(Type::Non, Code::new(2, 5), Id(0xBEEF), Token::opaque(b"x"));
    msg.set(no_repeat::PROXY_URI, repeat(b'u').take(400).collect::<Vec<u8>>());
    msg.set(no_repeat::SIZE1, OptValue::uint(1 << 20).0);
    msg.set(OptNumber(2000), vec![9]);
    msg.set_payload(b"payload".to_vec());

    let bytes: Vec<u8> = (&msg).try_into_bytes().unwrap();
    let decoded = Message::try_from_bytes(&bytes).unwrap();

    let mut expected = msg.clone();
    expected.opts.sort_by_key(|o| o.number);
    assert_eq!(decoded, expected);
  }

  #[test]
  fn oversized_value_warns_but_encodes() {
    let mut msg = Message::new(Type::Con, Code::new(0, 1), Id(3), Token::default());
    msg.set(no_repeat::IF_NONE_MATCH, vec![1, 2]);
    assert!(msg.opts[0].validate().is_err());

    let bytes: Vec<u8> = (&msg).try_into_bytes().unwrap();
    assert_eq!(Message::try_from_bytes(&bytes).unwrap(), msg);

    let other = Message::new(Type::Con, Code::new(0, 1), Id(4), Token::default());
    assert_eq!(other.try_into_bytes().unwrap(), vec![0x40, 0x01, 0x00, 0x04]);
  }

  #[test]
  fn no_payload_marker() {
    let msg = Message::new(Type::Con, Code::new(2, 5), Id(0), Token::default());

    assert_ne!(msg.try_into_bytes().unwrap().last(), Some(&0b11111111));
  }
}
