use croak_msg::Code;

/// Request method
#[derive(Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Method(pub(crate) Code);

impl core::fmt::Debug for Method {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    match *self {
      | Method::EMPTY => write!(f, "EMPTY"),
      | Method::GET => write!(f, "GET"),
      | Method::POST => write!(f, "POST"),
      | Method::PUT => write!(f, "PUT"),
      | Method::DELETE => write!(f, "DELETE"),
      | Method(code) => write!(f, "Method({})", code),
    }
  }
}

impl core::fmt::Display for Method {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    core::fmt::Debug::fmt(self, f)
  }
}

impl Method {
  /// The code of this method
  pub fn code(&self) -> Code {
    self.0
  }

  code!(#[doc = "EMPTY (0.00): no method; used by empty ACK & RST messages"]
        EMPTY = Method(0 * 00));
  code!(#[doc = "GET (0.01): retrieve a representation of the target resource"]
        GET = Method(0 * 01));
  code!(#[doc = "POST (0.02): process the representation enclosed in the request"]
        POST = Method(0 * 02));
  code!(#[doc = "PUT (0.03): create or replace the target resource with the enclosed representation"]
        PUT = Method(0 * 03));
  code!(#[doc = "DELETE (0.04): delete the target resource"]
        DELETE = Method(0 * 04));
}
