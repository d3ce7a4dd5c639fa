use std::net::SocketAddr;

use croak_msg::opt::known::{no_repeat, repeat};
use croak_msg::{ContentFormat, Id, Message, OptValue, Token, Type};

/// Request methods
pub mod method;

#[doc(inline)]
pub use method::Method;

/// A CoAP request, before it is handed to [`crate::core::Core::send_req`]
///
/// Requests are confirmable by default; the message ID and token are
/// assigned when the request is sent unless they were set explicitly.
///
/// ```
/// use croak::req::Req;
/// use croak_msg::ContentFormat;
///
/// let mut req = Req::post("127.0.0.1:5683".parse().unwrap(), "sensors/temp");
/// req.set_content_format(ContentFormat::Json);
/// req.set_payload(r#"{"celsius": 21}"#);
///
/// assert_eq!(req.path(), vec!["sensors", "temp"]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Req {
  pub(crate) msg: Message,
  pub(crate) addr: SocketAddr,
  pub(crate) payload: Vec<u8>,
  pub(crate) observe: bool,
}

impl Req {
  /// Create a request
  pub fn new(method: Method, addr: SocketAddr, path: impl AsRef<str>) -> Self {
    let msg = Message::new(Type::Con, method.0, Id(0), Token::default());
    let mut self_ = Self { msg,
                           addr,
                           payload: Vec::new(),
                           observe: false };

    path.as_ref()
        .split('/')
        .filter(|seg| !seg.is_empty())
        .for_each(|seg| self_.msg.add(repeat::PATH, seg.as_bytes()));

    self_
  }

  /// Create a new GET request
  pub fn get(addr: SocketAddr, path: impl AsRef<str>) -> Self {
    Self::new(Method::GET, addr, path)
  }

  /// Create a new POST request
  pub fn post(addr: SocketAddr, path: impl AsRef<str>) -> Self {
    Self::new(Method::POST, addr, path)
  }

  /// Create a new PUT request
  pub fn put(addr: SocketAddr, path: impl AsRef<str>) -> Self {
    Self::new(Method::PUT, addr, path)
  }

  /// Create a new DELETE request
  pub fn delete(addr: SocketAddr, path: impl AsRef<str>) -> Self {
    Self::new(Method::DELETE, addr, path)
  }

  /// Set this request to be non-confirmable
  ///
  /// Some messages do not require an acknowledgement.
  ///
  /// This is particularly true for messages that are repeated regularly for
  /// application requirements, such as repeated readings from a sensor.
  pub fn non(&mut self) -> () {
    self.msg.ty = Type::Non;
  }

  /// Updates the Message ID for this request
  pub fn set_msg_id(&mut self, id: Id) {
    self.msg.id = id;
  }

  /// Updates the Message Token for this request
  pub fn set_msg_token(&mut self, token: Token) {
    self.msg.token = token;
  }

  /// Set the request body.
  ///
  /// Bodies larger than the configured block size are sent with Block1.
  pub fn set_payload<P: Into<Vec<u8>>>(&mut self, payload: P) {
    self.payload = payload.into();
  }

  /// Add a Uri-Query argument (ex. `"lang=en"`)
  pub fn add_query(&mut self, query: impl AsRef<str>) {
    self.msg.add(repeat::QUERY, query.as_ref().as_bytes());
  }

  /// Set the Content-Format of the body
  pub fn set_content_format(&mut self, format: ContentFormat) {
    self.msg.set_content_format(format);
  }

  /// Tell the server which Content-Format we would like back
  pub fn set_accept(&mut self, format: ContentFormat) {
    self.msg.set(no_repeat::ACCEPT, format.bytes().0);
  }

  /// Send this request through a forward-proxy, targeting an absolute URI
  pub fn set_proxy_uri(&mut self, uri: impl AsRef<str>) {
    self.msg.set(no_repeat::PROXY_URI, uri.as_ref().as_bytes());
  }

  /// Observe the target resource (RFC7641).
  ///
  /// The server will keep sending notifications until the
  /// observation is cancelled.
  pub fn observe(&mut self) {
    self.observe = true;
  }

  /// Get the request method
  pub fn method(&self) -> Method {
    Method(self.msg.code)
  }

  /// Get the request type (confirmable, non-confirmable)
  pub fn msg_type(&self) -> Type {
    self.msg.ty
  }

  /// Get the Uri-Path segments of this request
  pub fn path(&self) -> Vec<&str> {
    self.msg
        .get_all(repeat::PATH)
        .filter_map(|OptValue(seg)| core::str::from_utf8(seg).ok())
        .collect()
  }

  /// Get the Uri-Query arguments of this request
  pub fn query(&self) -> Vec<&str> {
    self.msg
        .get_all(repeat::QUERY)
        .filter_map(|OptValue(seg)| core::str::from_utf8(seg).ok())
        .collect()
  }

  /// Get the Proxy-Uri of this request
  pub fn proxy_uri(&self) -> Option<&str> {
    self.msg
        .get(no_repeat::PROXY_URI)
        .and_then(|OptValue(uri)| core::str::from_utf8(uri).ok())
  }

  /// Is this request an observe registration?
  pub fn is_observe(&self) -> bool {
    self.observe
  }

  /// The address this request will be sent to
  pub fn addr(&self) -> SocketAddr {
    self.addr
  }

  /// The request body
  pub fn payload(&self) -> &[u8] {
    &self.payload
  }

  /// Borrow the underlying message (without the body)
  pub fn msg(&self) -> &Message {
    &self.msg
  }

  /// Mutably borrow the underlying message, for options without a helper
  pub fn msg_mut(&mut self) -> &mut Message {
    &mut self.msg
  }
}
