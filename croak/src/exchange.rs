use std::collections::BTreeMap;
use std::net::SocketAddr;

use croak_msg::{Block, Code, Id, Message, Token};
use embedded_time::Instant;

use crate::retry::{Attempts, RetryTimer, YouShould};
use crate::time::Clock;

/// Opaque identifier the application uses to refer to a request it sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(pub(crate) u64);

/// A request that has been sent and not yet been resolved
#[derive(Debug)]
pub struct InFlight<C: Clock> {
  pub(crate) msg: Message,
  pub(crate) addr: SocketAddr,
  /// The whole request body; `msg.payload` holds the current Block1 slice of it
  pub(crate) payload: Vec<u8>,
  /// `msg` as it was last put on the wire
  pub(crate) frame: Vec<u8>,
  pub(crate) timer: Option<RetryTimer<C>>,
  pub(crate) expires_at: Option<Instant<C>>,
  pub(crate) transmitting: bool,
  pub(crate) cancel_observe: bool,
  pub(crate) observe: bool,
}

/// What the timers of an [`InFlight`] request say should happen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimerAction {
  Idle,
  Retransmit(Attempts),
  Expired,
}

impl<C: Clock> InFlight<C> {
  pub(crate) fn new(msg: Message, addr: SocketAddr, payload: Vec<u8>, observe: bool) -> Self {
    Self { msg,
           addr,
           payload,
           frame: Vec::new(),
           timer: None,
           expires_at: None,
           transmitting: false,
           cancel_observe: false,
           observe }
  }

  /// The message most recently sent for this request
  pub fn msg(&self) -> &Message {
    &self.msg
  }

  /// Where the request was sent
  pub fn addr(&self) -> SocketAddr {
    self.addr
  }

  /// Has the request been sent, and are we waiting on an acknowledgement?
  pub fn is_transmitting(&self) -> bool {
    self.transmitting
  }

  /// Has cancellation of this observation been requested?
  pub fn is_cancelling_observe(&self) -> bool {
    self.cancel_observe
  }

  /// Number of retransmissions of the current message
  pub fn retransmits(&self) -> Attempts {
    self.timer
        .as_ref()
        .map(|t| t.retransmits())
        .unwrap_or_default()
  }

  pub(crate) fn stop_timers(&mut self) {
    self.timer = None;
    self.expires_at = None;
    self.transmitting = false;
  }

  pub(crate) fn check_timers(&mut self, now: Instant<C>) -> TimerAction {
    if self.expires_at.map(|at| now >= at).unwrap_or(false) {
      return TimerAction::Expired;
    }

    match self.timer.as_mut().map(|t| t.what_should_i_do(now)) {
      | None | Some(Err(nb::Error::WouldBlock)) => TimerAction::Idle,
      | Some(Ok(YouShould::Retry)) => TimerAction::Retransmit(self.retransmits()),
      | Some(Ok(YouShould::Cry)) => TimerAction::Expired,
      | Some(Err(nb::Error::Other(never))) => match never {},
    }
  }
}

/// A response received for an [`InFlight`] request
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
  pub(crate) msg: Message,
  pub(crate) addr: SocketAddr,
}

impl Reply {
  /// Wrap a received message
  pub fn new(msg: Message, addr: SocketAddr) -> Self {
    Self { msg, addr }
  }

  /// The received message
  pub fn msg(&self) -> &Message {
    &self.msg
  }

  /// Who sent it
  pub fn addr(&self) -> SocketAddr {
    self.addr
  }

  /// Response code
  pub fn code(&self) -> Code {
    self.msg.code
  }

  /// The Block2 number of this reply, 0 if it was not block-wise
  pub fn block_num(&self) -> u32 {
    self.msg.block2().map(|b| b.num()).unwrap_or(0)
  }

  /// Does the server have more Block2 blocks after this one?
  pub fn has_next_block(&self) -> bool {
    self.msg.block2().map(|b| b.more()).unwrap_or(false)
  }

  /// The Block2 size of this reply
  pub fn block_size(&self) -> Option<u16> {
    self.msg.block2().map(|b| b.size())
  }

  /// The Block1 the server acknowledged with this reply
  pub fn block1(&self) -> Option<Block> {
    self.msg.block1()
  }

  /// The Block1 number the server wants next, if it wants more
  pub fn next_block_to_send(&self) -> Option<u32> {
    self.block1()
        .filter(|b| b.more())
        .map(|b| b.num() + 1)
  }
}

/// A request and the replies it has received so far
#[derive(Debug)]
pub struct Exchange<C: Clock> {
  pub(crate) handle: Handle,
  pub(crate) req: InFlight<C>,
  pub(crate) replies: Vec<Reply>,
}

impl<C: Clock> Exchange<C> {
  /// The handle the application knows this exchange by
  pub fn handle(&self) -> Handle {
    self.handle
  }

  /// The request
  pub fn req(&self) -> &InFlight<C> {
    &self.req
  }

  /// Replies received since the last delivery
  pub fn replies(&self) -> &[Reply] {
    &self.replies
  }
}

/// All outstanding exchanges, keyed by token
#[derive(Debug)]
pub struct Exchanges<C: Clock> {
  map: BTreeMap<Token, Exchange<C>>,
}

impl<C: Clock> Default for Exchanges<C> {
  fn default() -> Self {
    Self { map: BTreeMap::new() }
  }
}

impl<C: Clock> Exchanges<C> {
  /// Start tracking a request.
  ///
  /// Yields `false` and leaves the existing exchange alone
  /// if the token is already in use.
  pub fn register(&mut self, token: Token, handle: Handle, req: InFlight<C>) -> bool {
    if self.map.contains_key(&token) {
      return false;
    }

    self.map.insert(token,
                    Exchange { handle,
                               req,
                               replies: Vec::new() });
    true
  }

  /// Record a reply for the exchange with this token
  pub fn add_reply(&mut self, token: &Token, reply: Reply) -> bool {
    match self.map.get_mut(token) {
      | Some(ex) => {
        ex.replies.push(reply);
        true
      },
      | None => false,
    }
  }

  /// Stop tracking an exchange
  pub fn forget(&mut self, token: &Token) -> Option<Exchange<C>> {
    self.map.remove(token)
  }

  /// Discard the replies of an exchange, keeping the request
  pub fn forget_replies(&mut self, token: &Token) -> bool {
    self.map
        .get_mut(token)
        .map(|ex| ex.replies.clear())
        .is_some()
  }

  /// Is there an exchange using this token?
  pub fn is_token_registered(&self, token: &Token) -> bool {
    self.map.contains_key(token)
  }

  /// Is there an exchange whose current message uses this ID?
  pub fn is_message_id_registered(&self, id: Id) -> bool {
    self.find_by_message_id(id).is_some()
  }

  /// Find the exchange whose current message uses this ID
  pub fn find_by_message_id(&self, id: Id) -> Option<Token> {
    self.map
        .iter()
        .find(|(_, ex)| ex.req.msg.id == id)
        .map(|(token, _)| *token)
  }

  /// Find the exchange the application knows by this handle
  pub fn find_by_handle(&self, handle: Handle) -> Option<Token> {
    self.map
        .iter()
        .find(|(_, ex)| ex.handle == handle)
        .map(|(token, _)| *token)
  }

  /// Borrow an exchange
  pub fn get(&self, token: &Token) -> Option<&Exchange<C>> {
    self.map.get(token)
  }

  pub(crate) fn get_mut(&mut self, token: &Token) -> Option<&mut Exchange<C>> {
    self.map.get_mut(token)
  }

  /// Tokens of all outstanding exchanges
  pub fn tokens(&self) -> Vec<Token> {
    self.map.keys().copied().collect()
  }

  /// Number of outstanding exchanges
  pub fn len(&self) -> usize {
    self.map.len()
  }

  /// Are there no outstanding exchanges?
  pub fn is_empty(&self) -> bool {
    self.map.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use croak_msg::opt::known::no_repeat;
  use croak_msg::Type;
  use embedded_time::duration::Milliseconds;

  use super::*;
  use crate::test::ClockMock;

  fn addr() -> SocketAddr {
    "10.0.0.1:5683".parse().unwrap()
  }

  fn token(n: u8) -> Token {
    Token::from_slice(&[n]).unwrap()
  }

  fn inflight(id: u16, token: Token) -> InFlight<ClockMock> {
    InFlight::new(Message::new(Type::Con, Code::new(0, 1), Id(id), token),
                  addr(),
                  vec![],
                  false)
  }

  fn reply(block2: Option<Block>, block1: Option<Block>) -> Reply {
    let mut msg = Message::new(Type::Ack, Code::new(2, 5), Id(1), token(1));
    if let Some(b) = block2 {
      msg.set(no_repeat::BLOCK2, b.bytes().to_vec());
    }
    if let Some(b) = block1 {
      msg.set(no_repeat::BLOCK1, b.bytes().to_vec());
    }
    Reply::new(msg, addr())
  }

  #[test]
  fn register_rejects_duplicate_tokens() {
    let mut exs = Exchanges::<ClockMock>::default();
    assert!(exs.register(token(1), Handle(0), inflight(1, token(1))));
    assert!(!exs.register(token(1), Handle(1), inflight(2, token(1))));
    assert_eq!(exs.len(), 1);
    assert_eq!(exs.get(&token(1)).map(|ex| ex.handle()), Some(Handle(0)));
  }

  #[test]
  fn lookups() {
    let mut exs = Exchanges::<ClockMock>::default();
    exs.register(token(1), Handle(10), inflight(100, token(1)));
    exs.register(token(2), Handle(20), inflight(200, token(2)));

    assert!(exs.is_token_registered(&token(2)));
    assert!(!exs.is_token_registered(&token(3)));
    assert!(exs.is_message_id_registered(Id(100)));
    assert!(!exs.is_message_id_registered(Id(300)));
    assert_eq!(exs.find_by_message_id(Id(200)), Some(token(2)));
    assert_eq!(exs.find_by_handle(Handle(10)), Some(token(1)));
    assert_eq!(exs.find_by_handle(Handle(30)), None);
    assert_eq!(exs.tokens(), vec![token(1), token(2)]);
  }

  #[test]
  fn replies_can_be_forgotten() {
    let mut exs = Exchanges::<ClockMock>::default();
    exs.register(token(1), Handle(0), inflight(1, token(1)));

    assert!(exs.add_reply(&token(1), reply(None, None)));
    assert!(exs.add_reply(&token(1), reply(None, None)));
    assert!(!exs.add_reply(&token(9), reply(None, None)));
    assert_eq!(exs.get(&token(1)).unwrap().replies().len(), 2);

    assert!(exs.forget_replies(&token(1)));
    assert!(exs.get(&token(1)).unwrap().replies().is_empty());
    assert!(exs.is_token_registered(&token(1)));

    assert!(exs.forget(&token(1)).is_some());
    assert!(exs.is_empty());
    assert!(!exs.forget_replies(&token(1)));
  }

  #[test]
  fn reply_block_fields() {
    let r = reply(None, None);
    assert_eq!((r.block_num(), r.has_next_block(), r.block_size()), (0, false, None));
    assert_eq!(r.next_block_to_send(), None);

    let r = reply(Some(Block::try_new(3, 64, true).unwrap()),
                  Some(Block::try_new(1, 32, true).unwrap()));
    assert_eq!((r.block_num(), r.has_next_block(), r.block_size()), (3, true, Some(64)));
    assert_eq!(r.next_block_to_send(), Some(2));

    let r = reply(None, Some(Block::try_new(1, 32, false).unwrap()));
    assert_eq!(r.next_block_to_send(), None);
  }

  #[test]
  fn timers_expire_at_lifetime_deadline() {
    use embedded_time::Clock;

    let clock = ClockMock::new();
    let mut req = inflight(1, token(1));
    let now = clock.try_now().unwrap();
    req.timer = Some(RetryTimer::new(now, Milliseconds(100), Milliseconds(100), Attempts(100)));
    req.expires_at = now.checked_add(Milliseconds(250u64));

    clock.set(100);
    assert_eq!(req.check_timers(clock.try_now().unwrap()), TimerAction::Retransmit(Attempts(1)));
    clock.set(150);
    assert_eq!(req.check_timers(clock.try_now().unwrap()), TimerAction::Idle);
    clock.set(250);
    assert_eq!(req.check_timers(clock.try_now().unwrap()), TimerAction::Expired);

    req.stop_timers();
    assert_eq!(req.check_timers(clock.try_now().unwrap()), TimerAction::Idle);
  }
}
