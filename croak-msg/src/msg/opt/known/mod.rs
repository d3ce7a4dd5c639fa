/// Content-Format values
pub mod content_format;
pub use content_format::*;

/// Observe option values
pub mod observe;
pub use observe::*;

/// Block1 & Block2 option values
pub mod block;
pub use block::*;

macro_rules! opt {
  (#[doc = $doc:expr] $name:ident = $n:literal) => {
    #[doc = $doc]
    #[allow(clippy::zero_prefixed_literal)]
    pub const $name: crate::OptNumber = crate::OptNumber($n);
  };
}

/// Non-repeatable options
pub mod no_repeat {
  opt!(#[doc = "Uri-Host: the internet host of the resource being requested"]
       HOST = 3);
  opt!(#[doc = "If-None-Match: make the request conditional on the target not existing"]
       IF_NONE_MATCH = 5);
  opt!(#[doc = "Observe (RFC7641): register or deregister interest in a resource"]
       OBSERVE = 6);
  opt!(#[doc = "Uri-Port: the transport-layer port of the resource. See [`HOST`]"]
       PORT = 7);
  opt!(#[doc = "Content-Format: the representation format of the message payload"]
       CONTENT_FORMAT = 12);
  opt!(#[doc = "Max-Age: maximum time a response may be cached before it is considered not fresh"]
       MAX_AGE = 14);
  opt!(#[doc = "Accept: which Content-Format is acceptable to the client"]
       ACCEPT = 17);
  opt!(#[doc = "Block2 (RFC7959): pertains to the response payload"]
       BLOCK2 = 23);
  opt!(#[doc = "Block1 (RFC7959): pertains to the request payload"]
       BLOCK1 = 27);
  opt!(#[doc = "Size2 (RFC7959): size of the resource representation in a response"]
       SIZE2 = 28);
  opt!(#[doc = "Proxy-Uri: absolute URI used to make a request to a forward-proxy"]
       PROXY_URI = 35);
  opt!(#[doc = "Proxy-Scheme: see [`PROXY_URI`]"]
       PROXY_SCHEME = 39);
  opt!(#[doc = "Size1: size of the request payload"]
       SIZE1 = 60);
}

/// Repeatable options
pub mod repeat {
  opt!(#[doc = "If-Match: make the request conditional on the current ETag of the target"]
       IF_MATCH = 1);
  opt!(#[doc = "ETag: an entity-tag, a resource-local identifier for a representation"]
       ETAG = 4);
  opt!(#[doc = "Location-Path: one segment of the relative URI of a created resource"]
       LOCATION_PATH = 8);
  opt!(#[doc = "Uri-Path: one segment of the absolute path to the resource"]
       PATH = 11);
  opt!(#[doc = "Uri-Query: one argument parameterizing the resource"]
       QUERY = 15);
  opt!(#[doc = "Location-Query: see [`LOCATION_PATH`]"]
       LOCATION_QUERY = 20);
}
