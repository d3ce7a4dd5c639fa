pub use croak_msg::Code;

// 2.xx
code!(#[doc = "2.01 Created"] CREATED = 2*01);
code!(#[doc = "2.02 Deleted"] DELETED = 2*02);
code!(#[doc = "2.03 Valid"]   VALID   = 2*03);
code!(#[doc = "2.04 Changed"] CHANGED = 2*04);
code!(#[doc = "2.05 Content"] CONTENT = 2*05);
code!(
      #[doc = concat!(
    "## [2.31 Continue](https://www.rfc-editor.org/rfc/rfc7959#section-2.9.1)\n",
    "This success status code indicates that the transfer of this\n",
    "block of the request body was successful and that the server\n",
    "encourages sending further blocks, but that a final outcome of the\n",
    "whole block-wise request cannot yet be determined.  No payload is\n",
    "returned with this response code.",
  )]
      CONTINUE = 2 * 31
);

// 4.xx
code!(#[doc = "4.00 Bad Request"]                BAD_REQUEST                = 4*00);
code!(#[doc = "4.01 Unauthorized"]               UNAUTHORIZED               = 4*01);
code!(#[doc = "4.02 Bad Option"]                 BAD_OPTION                 = 4*02);
code!(#[doc = "4.03 Forbidden"]                  FORBIDDEN                  = 4*03);
code!(#[doc = "4.04 Not Found"]                  NOT_FOUND                  = 4*04);
code!(#[doc = "4.05 Method Not Allowed"]         METHOD_NOT_ALLOWED         = 4*05);
code!(#[doc = "4.06 Not Acceptable"]             NOT_ACCEPTABLE             = 4*06);
code!(
      #[doc = concat!(
    "## [4.08 Request Entity Incomplete](https://www.rfc-editor.org/rfc/rfc7959#section-2.9.2)\n",
    "This client error status code indicates that the server has not\n",
    "received the blocks of the request body that it needs to proceed.\n",
    "The client has not sent all blocks, not sent them in the order\n",
    "required by the server, or has sent them long enough ago that the\n",
    "server has already discarded them.",
  )]
      REQUEST_ENTITY_INCOMPLETE = 4 * 08
);
code!(#[doc = "4.12 Precondition Failed"]        PRECONDITION_FAILED        = 4*12);
code!(#[doc = "4.13 Request Entity Too Large"]   REQUEST_ENTITY_TOO_LARGE   = 4*13);
code!(#[doc = "4.15 Unsupported Content-Format"] UNSUPPORTED_CONTENT_FORMAT = 4*15);

// 5.xx
code!(#[doc = "5.00 Internal Server Error"]  INTERNAL_SERVER_ERROR  =  5*00);
code!(#[doc = "5.01 Not Implemented"]        NOT_IMPLEMENTED        =  5*01);
code!(#[doc = "5.02 Bad Gateway"]            BAD_GATEWAY            =  5*02);
code!(#[doc = "5.03 Service Unavailable"]    SERVICE_UNAVAILABLE    =  5*03);
code!(#[doc = "5.04 Gateway Timeout"]        GATEWAY_TIMEOUT        =  5*04);
code!(#[doc = "5.05 Proxying Not Supported"] PROXYING_NOT_SUPPORTED =  5*05);

/// A response whose code is in the 4.xx or 5.xx class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum StatusError {
  BadRequest,
  Unauthorized,
  BadOption,
  Forbidden,
  NotFound,
  MethodNotAllowed,
  NotAcceptable,
  RequestEntityIncomplete,
  PreconditionFailed,
  RequestEntityTooLarge,
  UnsupportedContentFormat,
  InternalServerError,
  NotImplemented,
  BadGateway,
  ServiceUnavailable,
  GatewayTimeout,
  ProxyingNotSupported,
  /// An error code without a name of its own
  Other(Code),
}

impl StatusError {
  /// Classify a response code, yielding `None` for codes
  /// that are not errors.
  ///
  /// ```
  /// use croak::resp::code::{self, StatusError};
  ///
  /// assert_eq!(StatusError::from_code(code::NOT_FOUND), Some(StatusError::NotFound));
  /// assert_eq!(StatusError::from_code(code::CONTENT), None);
  /// ```
  pub fn from_code(code: Code) -> Option<Self> {
    use StatusError::*;

    if !code.is_error() {
      return None;
    }

    Some(match code {
           | BAD_REQUEST => BadRequest,
           | UNAUTHORIZED => Unauthorized,
           | BAD_OPTION => BadOption,
           | FORBIDDEN => Forbidden,
           | NOT_FOUND => NotFound,
           | METHOD_NOT_ALLOWED => MethodNotAllowed,
           | NOT_ACCEPTABLE => NotAcceptable,
           | REQUEST_ENTITY_INCOMPLETE => RequestEntityIncomplete,
           | PRECONDITION_FAILED => PreconditionFailed,
           | REQUEST_ENTITY_TOO_LARGE => RequestEntityTooLarge,
           | UNSUPPORTED_CONTENT_FORMAT => UnsupportedContentFormat,
           | INTERNAL_SERVER_ERROR => InternalServerError,
           | NOT_IMPLEMENTED => NotImplemented,
           | BAD_GATEWAY => BadGateway,
           | SERVICE_UNAVAILABLE => ServiceUnavailable,
           | GATEWAY_TIMEOUT => GatewayTimeout,
           | PROXYING_NOT_SUPPORTED => ProxyingNotSupported,
           | other => Other(other),
         })
  }

  /// The response code this error was created from
  pub fn code(&self) -> Code {
    use StatusError::*;

    match *self {
      | BadRequest => BAD_REQUEST,
      | Unauthorized => UNAUTHORIZED,
      | BadOption => BAD_OPTION,
      | Forbidden => FORBIDDEN,
      | NotFound => NOT_FOUND,
      | MethodNotAllowed => METHOD_NOT_ALLOWED,
      | NotAcceptable => NOT_ACCEPTABLE,
      | RequestEntityIncomplete => REQUEST_ENTITY_INCOMPLETE,
      | PreconditionFailed => PRECONDITION_FAILED,
      | RequestEntityTooLarge => REQUEST_ENTITY_TOO_LARGE,
      | UnsupportedContentFormat => UNSUPPORTED_CONTENT_FORMAT,
      | InternalServerError => INTERNAL_SERVER_ERROR,
      | NotImplemented => NOT_IMPLEMENTED,
      | BadGateway => BAD_GATEWAY,
      | ServiceUnavailable => SERVICE_UNAVAILABLE,
      | GatewayTimeout => GATEWAY_TIMEOUT,
      | ProxyingNotSupported => PROXYING_NOT_SUPPORTED,
      | Other(code) => code,
    }
  }
}
