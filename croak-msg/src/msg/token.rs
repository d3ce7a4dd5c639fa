use tinyvec::ArrayVec;

/// # Message Token
///
/// The Token is used to match a response with a request.  The token
/// value is a sequence of 0 to 8 bytes.
///
/// Every message carries a token, even if it is of zero length.
/// Every request carries a client-generated token that the server
/// MUST echo (without modification) in any resulting response.
///
/// Unlike the message [`Id`](crate::Id), which only pairs a CON
/// with its ACK, the token survives separate responses, retransmissions
/// and every notification of an observed resource.
///
/// See [RFC7252 - Token](https://datatracker.ietf.org/doc/html/rfc7252#section-5.3.1)
#[derive(Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Debug, Default)]
pub struct Token(pub ArrayVec<[u8; 8]>);

impl Token {
  /// Take an arbitrary-length sequence of bytes and turn it into an opaque message token
  ///
  /// Currently uses the BLAKE2 hashing algorithm, but this may change in the future.
  ///
  /// ```
  /// use croak_msg::Token;
  ///
  /// let my_token = Token::opaque(&[0, 1, 2]);
  /// assert_eq!(my_token.0.len(), 8);
  /// ```
  pub fn opaque(data: &[u8]) -> Token {
    use blake2::digest::consts::U8;
    use blake2::{Blake2b, Digest};

    let mut digest = Blake2b::<U8>::new();
    digest.update(data);
    Token(Into::<[u8; 8]>::into(digest.finalize()).into())
  }

  /// Copy a byte slice into a token, yielding `None` if it is longer than 8 bytes.
  ///
  /// ```
  /// use croak_msg::Token;
  ///
  /// assert!(Token::from_slice(b"abcd").is_some());
  /// assert!(Token::from_slice(&[0; 9]).is_none());
  /// ```
  pub fn from_slice(bytes: &[u8]) -> Option<Token> {
    ArrayVec::try_from(bytes).ok().map(Token)
  }

  /// The token's bytes
  pub fn as_bytes(&self) -> &[u8] {
    self.0.as_slice()
  }

  /// Is this the zero-length token?
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}
