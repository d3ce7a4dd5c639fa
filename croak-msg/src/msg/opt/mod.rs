use std_alloc::vec::Vec;

use crate::cursor::Cursor;
use crate::from_bytes::*;

/// Option parsing errors
pub mod parse_error;
pub use parse_error::*;

/// Well-known option numbers & value types
pub mod known;
pub use known::*;

pub(crate) fn parse_opt_len_or_delta<A: AsRef<[u8]>>(head: u8,
                                                     bytes: &mut Cursor<A>,
                                                     reserved_err: OptParseError)
                                                     -> Result<u32, OptParseError> {
  match head {
    | 13 => {
      let n = bytes.next().ok_or_else(OptParseError::eof)?;
      Ok((n as u32) + 13)
    },
    | 14 => match bytes.take_exact(2) {
      | Some(&[a, b]) => Ok(u16::from_be_bytes([a, b]) as u32 + 269),
      | _ => Err(OptParseError::eof()),
    },
    | 15 => Err(reserved_err),
    | _ => Ok(head as u32),
  }
}

/// # `Opt` struct
/// A CoAP Option (the CoAP equivalent of an HTTP header): an [`OptNumber`]
/// identifying the option and its raw [`OptValue`].
///
/// On the wire, options are delta-encoded against the previous option's
/// number. That encoding is handled when (de)serializing a whole [`Message`](crate::Message),
/// so an `Opt` always carries its absolute number.
///
/// See [RFC7252 - Options](https://datatracker.ietf.org/doc/html/rfc7252#section-5.4)
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Opt {
  /// See [`OptNumber`]
  pub number: OptNumber,
  /// See [`OptValue`]
  pub value: OptValue,
}

impl Opt {
  /// Create a new option
  pub fn new(number: OptNumber, value: impl Into<Vec<u8>>) -> Self {
    Opt { number,
          value: OptValue(value.into()) }
  }

  /// Check this option's value against the maximum length
  /// allowed for its number.
  ///
  /// ```
  /// use croak_msg::{no_repeat, Opt};
  ///
  /// assert!(Opt::new(no_repeat::PORT, vec![22, 51]).validate().is_ok());
  /// assert!(Opt::new(no_repeat::IF_NONE_MATCH, vec![1]).validate().is_err());
  /// ```
  pub fn validate(&self) -> Result<(), OptValueTooLong> {
    match self.number.max_len() {
      | Some(max) if self.value.0.len() > max => Err(OptValueTooLong { number: self.number,
                                                                       max,
                                                                       actual:
                                                                         self.value.0.len() }),
      | _ => Ok(()),
    }
  }
}

/// An option value was longer than allowed for its number.
///
/// This is a warning rather than a fatal condition; the value is kept
/// and will be serialized as-is.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct OptValueTooLong {
  /// The offending option
  pub number: OptNumber,
  /// Maximum length for the option
  pub max: usize,
  /// Actual length of the value
  pub actual: usize,
}

/// # Option Number
/// Identifies which option is being set (e.g. Content-Format has a Number of 12)
///
/// See [RFC7252 - Option Numbers](https://datatracker.ietf.org/doc/html/rfc7252#section-5.4.6)
#[derive(Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Debug, Default)]
pub struct OptNumber(pub u32);

/// Whether or not a recipient must understand an option
///
/// See [RFC7252 - Critical/Elective](https://datatracker.ietf.org/doc/html/rfc7252#section-5.4.1)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum OptionMustBeProcessed {
  /// This option must be processed,
  /// and a response that ignores it
  /// will be rejected.
  ///
  /// Corresponds to the option being "critical"
  /// in strict CoAP terms
  Yes,
  /// This option does not _need_ to
  /// be processed,
  /// and a response that ignores it
  /// will be processed anyway.
  ///
  /// Corresponds to the option being "elective"
  /// in strict CoAP terms
  No,
}

/// How a proxy should treat an option it does not understand
///
/// See [RFC7252 - Proxy Unsafe or Safe-to-Forward](https://datatracker.ietf.org/doc/html/rfc7252#section-5.4.2)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum WhenOptionUnsupportedByProxy {
  /// This option /must be/ processed & understood by proxies
  /// and may not be forwarded blindly to their destination.
  Error,
  /// This option may not be processed & understood by proxies
  /// and may be forwarded blindly to their destination.
  Forward,
}

/// Whether an option is part of a proxy's cache key
///
/// See [RFC7252 - Proxy Unsafe or Safe-to-Forward](https://datatracker.ietf.org/doc/html/rfc7252#section-5.4.2)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum WhenOptionChanges {
  /// Different values for this option yield different responses
  ResponseChanges,
  /// Different values for this option should yield the cached response
  ResponseDoesNotChange,
}

impl OptNumber {
  /// Whether or not this option may be ignored by a server
  pub fn must_be_processed(&self) -> OptionMustBeProcessed {
    match self.0 & 0b1 {
      | 1 => OptionMustBeProcessed::Yes,
      | _ => OptionMustBeProcessed::No,
    }
  }

  /// Whether or not this option may be forwarded blindly by
  /// a proxy that does not support processing it
  pub fn when_unsupported_by_proxy(&self) -> WhenOptionUnsupportedByProxy {
    match (self.0 & 0b10) >> 1 {
      | 1 => WhenOptionUnsupportedByProxy::Error,
      | _ => WhenOptionUnsupportedByProxy::Forward,
    }
  }

  /// Whether or not different values for this option should
  /// yield proxies' cached response
  pub fn when_option_changes(&self) -> WhenOptionChanges {
    match (self.0 & 0b11100) >> 2 {
      | 0b111 => WhenOptionChanges::ResponseDoesNotChange,
      | _ => WhenOptionChanges::ResponseChanges,
    }
  }

  /// Maximum length of a value for this option, if the option is known.
  ///
  /// ```
  /// use croak_msg::{no_repeat, OptNumber};
  ///
  /// assert_eq!(no_repeat::IF_NONE_MATCH.max_len(), Some(0));
  /// assert_eq!(no_repeat::PROXY_URI.max_len(), Some(1034));
  /// assert_eq!(OptNumber(2048).max_len(), None);
  /// ```
  pub fn max_len(&self) -> Option<usize> {
    use known::{no_repeat as nr, repeat as r};

    match *self {
      | nr::IF_NONE_MATCH => Some(0),
      | nr::PORT | nr::CONTENT_FORMAT | nr::ACCEPT => Some(2),
      | nr::OBSERVE | nr::BLOCK1 | nr::BLOCK2 => Some(3),
      | nr::MAX_AGE | nr::SIZE1 | nr::SIZE2 => Some(4),
      | r::IF_MATCH | r::ETAG => Some(8),
      | nr::HOST
      | nr::PROXY_SCHEME
      | r::LOCATION_PATH
      | r::PATH
      | r::QUERY
      | r::LOCATION_QUERY => Some(255),
      | nr::PROXY_URI => Some(1034),
      | _ => None,
    }
  }
}

/// The raw bytes of an option value
///
/// See [RFC7252 - Option Value Formats](https://datatracker.ietf.org/doc/html/rfc7252#section-3.2)
#[derive(Default, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct OptValue(pub Vec<u8>);

impl OptValue {
  /// Interpret this value as a variable-length big-endian unsigned integer
  ///
  /// Yields `None` if longer than 4 bytes.
  pub fn as_uint(&self) -> Option<u32> {
    if self.0.len() > 4 {
      return None;
    }

    Some(self.0.iter().fold(0u32, |n, b| (n << 8) | *b as u32))
  }

  /// Encode an unsigned integer in as few bytes as possible
  ///
  /// ```
  /// use croak_msg::OptValue;
  ///
  /// assert_eq!(OptValue::uint(0).0, Vec::<u8>::new());
  /// assert_eq!(OptValue::uint(5683).0, vec![0x16, 0x33]);
  /// assert_eq!(OptValue::uint(5683).as_uint(), Some(5683));
  /// ```
  pub fn uint(n: u32) -> Self {
    let skip = n.leading_zeros() as usize / 8;
    OptValue(n.to_be_bytes()[skip..].to_vec())
  }
}

impl<Bytes: AsRef<[u8]>> TryConsumeBytes<Bytes> for Vec<Opt> {
  type Error = OptParseError;

  fn try_consume_bytes(bytes: &mut Cursor<Bytes>) -> Result<Self, Self::Error> {
    let mut opts = Vec::new();
    let mut number = 0u32;

    loop {
      match consume_opt(bytes, number) {
        | Ok(opt) => {
          number = opt.number.0;
          opts.push(opt);
        },
        | Err(OptParseError::OptionsExhausted) => break Ok(opts),
        | Err(e) => break Err(e),
      }
    }
  }
}

fn consume_opt<Bytes: AsRef<[u8]>>(bytes: &mut Cursor<Bytes>,
                                   prev: u32)
                                   -> Result<Opt, OptParseError> {
  let byte1 = bytes.next()
                   .ok_or(OptParseError::OptionsExhausted)
                   .and_then(|b| {
                     if b == 0b11111111 {
                       Err(OptParseError::OptionsExhausted)
                     } else {
                       Ok(b)
                     }
                   })?;

  // delta's extended bytes come before the length's
  let delta = parse_opt_len_or_delta(byte1 >> 4,
                                     bytes,
                                     OptParseError::OptionDeltaReservedValue(15))?;

  let len = parse_opt_len_or_delta(byte1 & 0b00001111,
                                   bytes,
                                   OptParseError::ValueLengthReservedValue(15))?
            as usize;

  let number = prev.checked_add(delta)
                   .filter(|n| *n <= u16::MAX as u32)
                   .ok_or(OptParseError::OptionNumberTooLarge(prev.saturating_add(delta)))?;

  let value = bytes.take_exact(len)
                   .ok_or_else(OptParseError::eof)?
                   .to_vec();

  Ok(Opt { number: OptNumber(number),
           value: OptValue(value) })
}
