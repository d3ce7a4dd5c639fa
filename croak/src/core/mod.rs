use std::collections::VecDeque;

use croak_msg::opt::known::no_repeat;
use croak_msg::opt::known::observe::Action;
use croak_msg::{generate_block_option,
                BlockError,
                CodeKind,
                Id,
                Message,
                OptValue,
                Payload,
                Token,
                TryFromBytes,
                TryIntoBytes,
                Type};
use embedded_time::{Clock, Instant};
use rand::{Rng, SeedableRng};
use tinyvec::ArrayVec;

mod error;
#[doc(inline)]
pub use error::*;

use crate::block::{self, NextAction};
use crate::config::Config;
use crate::exchange::{Exchanges, Handle, InFlight, Reply, TimerAction};
use crate::logging;
use crate::net::{Addrd, Socket};
use crate::platform::PlatformTypes;
use crate::req::Req;
use crate::resp::code::StatusError;
use crate::resp::Resp;
use crate::retry::RetryTimer;
use crate::time::Millis;

/// Something that happened to a request the application sent
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
  /// A notification for an active observation arrived.
  ///
  /// More may follow until the observation is cancelled.
  Notification(Handle, Resp),
  /// The request completed with a successful response
  Completed(Handle, Resp),
  /// The request failed. Nothing else will be heard about it.
  Failed(Handle, Error),
}

impl Event {
  /// The request this event is about
  pub fn handle(&self) -> Handle {
    match self {
      | Event::Notification(h, _) | Event::Completed(h, _) | Event::Failed(h, _) => *h,
    }
  }

  /// Is this the last event for its request?
  pub fn is_terminal(&self) -> bool {
    !matches!(self, Event::Notification(..))
  }
}

/// A CoAP client runtime.
///
/// `Core` never blocks. Outbound requests go out immediately in
/// [`Core::send_req`], and everything else (inbound datagrams,
/// retransmissions, timeouts) happens when you call [`Core::poll`].
/// Outcomes are queued as [`Event`]s for [`Core::poll_event`].
#[allow(missing_debug_implementations)]
pub struct Core<P: PlatformTypes> {
  sock: P::Socket,
  pub(crate) clock: P::Clock,
  config: Config,
  rand: rand_chacha::ChaCha8Rng,
  exchanges: Exchanges<P::Clock>,
  events: VecDeque<Event>,
  next_handle: u64,
}

impl<P: PlatformTypes> Core<P> {
  /// Creates a new Core with the default runtime behavior
  pub fn new(clock: P::Clock, sock: P::Socket) -> Self {
    Self::new_config(Config::default(), clock, sock)
  }

  /// Create a new core with custom runtime behavior
  pub fn new_config(config: Config, clock: P::Clock, sock: P::Socket) -> Self {
    Self { rand: rand_chacha::ChaCha8Rng::seed_from_u64(config.token_seed as u64),
           config,
           sock,
           clock,
           exchanges: Default::default(),
           events: Default::default(),
           next_handle: 0 }
  }

  /// Reseed the generator that message IDs, tokens and
  /// initial timeouts are drawn from
  pub fn reseed(&mut self, seed: u64) {
    self.rand = rand_chacha::ChaCha8Rng::seed_from_u64(seed);
  }

  /// Get the runtime config
  pub fn config(&self) -> &Config {
    &self.config
  }

  /// Change the runtime config.
  ///
  /// Changes apply to messages sent afterwards.
  pub fn config_mut(&mut self) -> &mut Config {
    &mut self.config
  }

  /// The socket this core sends & receives on
  pub fn socket(&self) -> &P::Socket {
    &self.sock
  }

  /// Outstanding requests
  pub fn exchanges(&self) -> &Exchanges<P::Clock> {
    &self.exchanges
  }

  /// Pop the oldest event that has not been seen yet
  pub fn poll_event(&mut self) -> Option<Event> {
    self.events.pop_front()
  }

  fn now(&self, when: When) -> Result<Instant<P::Clock>, Error> {
    self.clock
        .try_now()
        .map_err(|_| when.what(What::ClockError))
  }

  fn next_handle(&mut self) -> Handle {
    let handle = Handle(self.next_handle);
    self.next_handle = self.next_handle.wrapping_add(1);
    handle
  }

  fn unique_id(&mut self) -> Id {
    loop {
      let id = Id(self.rand.gen_range(1..=u16::MAX));
      if !self.exchanges.is_message_id_registered(id) {
        break id;
      }
    }
  }

  fn unique_token(&mut self) -> Token {
    loop {
      let mut bytes = ArrayVec::<[u8; 10]>::new();
      bytes.extend(self.config.token_seed.to_be_bytes());
      bytes.extend(self.rand.gen::<u64>().to_be_bytes());

      let token = Token::opaque(&bytes);
      if !self.exchanges.is_token_registered(&token) {
        break token;
      }
    }
  }

  /// Send a request.
  ///
  /// A message ID is generated if the request's is 0, and a token
  /// is generated if the request's is empty.
  ///
  /// The returned [`Handle`] identifies the [`Event`]s of this request.
  pub fn send_req(&mut self, req: Req) -> Result<Handle, Error> {
    let Req { mut msg,
              addr,
              payload,
              observe, } = req;

    if msg.id == Id(0) {
      msg.id = self.unique_id();
    }

    if msg.token.is_empty() {
      msg.token = self.unique_token();
    }

    let token = msg.token;
    let when = When::SendingMessage(Some(addr), msg.id, token);

    if self.exchanges.is_token_registered(&token) {
      return Err(when.what(What::TokenInUse(token)));
    }

    if observe {
      msg.set(no_repeat::OBSERVE,
              OptValue::uint(u8::from(Action::Register) as u32).0);
    }

    let mut inflight = InFlight::new(msg, addr, payload, observe);
    match self.config.block_size {
      | Some(size) => {
        Self::first_blocks(&mut inflight, size).map_err(|e| when.what(What::Block(e)))?
      },
      | None => inflight.msg.payload = Payload(inflight.payload.clone()),
    }

    let handle = self.next_handle();
    self.exchanges.register(token, handle, inflight);

    self.transmit(&token)
        .map(|_| handle)
        .map_err(|e| {
          self.exchanges.forget(&token);
          e
        })
  }

  fn first_blocks(req: &mut InFlight<P::Clock>, size: u16) -> Result<(), BlockError> {
    let block2 = generate_block_option(no_repeat::BLOCK2, 0, size, 0)?;
    req.msg.set(block2.number, block2.value.0);

    if req.payload.len() > size as usize {
      let block1 = generate_block_option(no_repeat::BLOCK1, 0, size, req.payload.len())?;
      req.msg.set(block1.number, block1.value.0);
      req.msg
         .set(no_repeat::SIZE1, OptValue::uint(req.payload.len() as u32).0);
      req.msg.payload = Payload(block::slice(&req.payload, 0, size).to_vec());
    } else {
      req.msg.payload = Payload(req.payload.clone());
    }

    Ok(())
  }

  /// Stop caring about an observation.
  ///
  /// Nothing is sent right away; the next notification the server
  /// sends is answered with a Reset and the request completes.
  pub fn cancel_observe(&mut self, handle: Handle) -> Result<(), Error> {
    let token = self.exchanges
                    .find_by_handle(handle)
                    .ok_or_else(|| When::None.what(What::UnknownExchange(handle)))?;

    if let Some(ex) = self.exchanges.get_mut(&token) {
      log::trace!("observation {:?} will be cancelled on the next notification",
                  handle);
      ex.req.cancel_observe = true;
    }

    Ok(())
  }

  /// Forget about a request. Any replies that arrive for it are dropped.
  ///
  /// Yields whether the request was outstanding.
  pub fn abort(&mut self, handle: Handle) -> bool {
    self.exchanges
        .find_by_handle(handle)
        .and_then(|token| self.exchanges.forget(&token))
        .is_some()
  }

  /// Receive everything waiting on the socket, then
  /// retransmit and time out requests as needed.
  pub fn poll(&mut self) -> Result<(), Error> {
    loop {
      match self.sock.poll() {
        | Ok(Some(Addrd(bytes, addr))) => self.datagram_received(Addrd(bytes.as_slice(), addr)),
        | Ok(None) => break,
        | Err(e) => return Err(When::Polling.what(What::Transport(e.into()))),
      }
    }

    self.fire_timers()
  }

  /// Process a datagram received out-of-band (not from [`Core::poll`]).
  pub fn datagram_received(&mut self, dgram: Addrd<&[u8]>) {
    log::trace!("recvd {}b <- {}", dgram.data().len(), dgram.addr());

    match Message::try_from_bytes(dgram.data()) {
      | Ok(msg) => self.msg_recvd(Addrd(msg, dgram.addr())),
      | Err(e) => log::debug!("dropping malformed datagram from {}: {:?}", dgram.addr(), e),
    }
  }

  fn correlate(&self, msg: &Message) -> Option<Token> {
    Some(msg.token).filter(|t| !t.is_empty() && self.exchanges.is_token_registered(t))
                   .or_else(|| match msg.ty {
                     | Type::Ack | Type::Reset => self.exchanges.find_by_message_id(msg.id),
                     | _ => None,
                   })
  }

  fn msg_recvd(&mut self, Addrd(msg, addr): Addrd<Message>) {
    log::trace!("recvd {} <- {}", logging::msg_summary(&msg), addr);

    let token = match self.correlate(&msg) {
      | Some(token) => token,
      | None => {
        log::trace!("{:?} {:?} from {} matches no request; dropping",
                    msg.ty,
                    msg.id,
                    addr);
        return;
      },
    };

    match (msg.ty, msg.code.kind()) {
      | (Type::Reset, _) => self.fail(&token, When::Polling.what(What::Reset)),
      | (Type::Ack, CodeKind::Empty) => {
        self.stop_timers(&token);
        log::trace!("{:?} was Acked, waiting for the response", msg.id)
      },
      | (_, CodeKind::Response) => {
        self.stop_timers(&token);
        self.reply_recvd(token, Reply::new(msg, addr))
      },
      | _ => log::debug!("ignoring {} from {}", logging::msg_summary(&msg), addr),
    }
  }

  fn stop_timers(&mut self, token: &Token) {
    if let Some(ex) = self.exchanges.get_mut(token) {
      ex.req.stop_timers();
    }
  }

  fn reply_recvd(&mut self, token: Token, reply: Reply) {
    let (cancel, body_len) = match self.exchanges.get(&token) {
      | Some(ex) => (ex.req.cancel_observe, ex.req.payload.len()),
      | None => return,
    };

    self.exchanges.add_reply(&token, reply.clone());

    if cancel {
      let rst = reply.msg().reset(reply.msg().id);
      self.send_msg(Addrd(&rst, reply.addr())).ok();
      self.deliver(&token);
      return;
    }

    if reply.msg().ty == Type::Con {
      let ack = reply.msg().ack(reply.msg().id);
      self.send_msg(Addrd(&ack, reply.addr())).ok();
    }

    if let Some(status) = StatusError::from_code(reply.code()) {
      self.fail(&token, When::Polling.what(What::Status(status)));
      return;
    }

    let next = match block::next_action(&reply, body_len) {
      | NextAction::SendBlock1 { num, size } => self.send_block1(&token, num, size),
      | NextAction::RequestBlock2 { num, size } => self.request_block2(&token, num, size),
      | NextAction::Deliver => {
        self.deliver(&token);
        Ok(())
      },
    };

    if let Err(e) = next {
      self.fail(&token, e);
    }
  }

  fn send_block1(&mut self, token: &Token, num: u32, size: u16) -> Result<(), Error> {
    let id = self.unique_id();

    if let Some(ex) = self.exchanges.get_mut(token) {
      let req = &mut ex.req;
      let when = When::SendingMessage(Some(req.addr), id, *token);
      let block1 = generate_block_option(no_repeat::BLOCK1, num, size, req.payload.len())
                     .map_err(|e| when.what(What::Block(e)))?;

      log::trace!("sending block1 {} ({}b blocks) of {}b body", num, size, req.payload.len());

      req.msg.id = id;
      req.msg.set(block1.number, block1.value.0);
      req.msg.remove(no_repeat::SIZE1);
      req.msg.payload = Payload(block::slice(&req.payload, num, size).to_vec());
    }

    self.transmit(token)
  }

  fn request_block2(&mut self, token: &Token, num: u32, size: u16) -> Result<(), Error> {
    let id = self.unique_id();

    if let Some(ex) = self.exchanges.get_mut(token) {
      let req = &mut ex.req;
      let when = When::SendingMessage(Some(req.addr), id, *token);
      let block2 = generate_block_option(no_repeat::BLOCK2, num, size, 0)
                     .map_err(|e| when.what(What::Block(e)))?;

      log::trace!("requesting block2 {} ({}b blocks)", num, size);

      req.msg.id = id;
      req.msg.set(block2.number, block2.value.0);
      req.msg.remove(no_repeat::BLOCK1);
      req.msg.remove(no_repeat::SIZE1);
      req.msg.remove(no_repeat::OBSERVE);
      req.msg.payload = Payload::default();
    }

    self.transmit(token)
  }

  /// Hand the reassembled replies of an exchange to the application
  fn deliver(&mut self, token: &Token) {
    let (handle, notification, resp) = match self.exchanges.get(token) {
      | Some(ex) => {
        let last = match ex.replies.last() {
          | Some(last) => last,
          | None => return,
        };
        let observed = ex.replies.iter().any(|r| r.msg().observe().is_some());
        let resp = Resp::new(last.msg().clone(),
                             last.addr(),
                             block::merge(&ex.replies));

        (ex.handle, ex.req.observe && !ex.req.cancel_observe && observed, resp)
      },
      | None => return,
    };

    if notification {
      self.exchanges.forget_replies(token);
      self.events.push_back(Event::Notification(handle, resp));
    } else {
      self.exchanges.forget(token);
      self.events.push_back(Event::Completed(handle, resp));
    }
  }

  fn fail(&mut self, token: &Token, err: Error) {
    if let Some(ex) = self.exchanges.forget(token) {
      match err.what {
        | What::Timeout => log::warn!("{:?} timed out", ex.handle),
        | _ => log::debug!("{:?} failed: {:?}", ex.handle, err),
      }

      self.events.push_back(Event::Failed(ex.handle, err));
    }
  }

  /// Retransmit CON messages whose ACK is overdue,
  /// and fail exchanges that ran out of time.
  pub fn fire_timers(&mut self) -> Result<(), Error> {
    let now = self.now(When::Polling)?;

    for token in self.exchanges.tokens() {
      let action = match self.exchanges.get_mut(&token) {
        | Some(ex) => ex.req.check_timers(now),
        | None => continue,
      };

      match action {
        | TimerAction::Idle => (),
        | TimerAction::Expired => self.fail(&token, When::Retrying(token).what(What::Timeout)),
        | TimerAction::Retransmit(attempt) => {
          let sent = match self.exchanges.get(&token) {
            | Some(ex) => {
              log::debug!("retransmitting {} (attempt {}) -> {}",
                          logging::msg_summary(&ex.req.msg),
                          attempt.0,
                          ex.req.addr);
              Self::send(When::Retrying(token),
                         &self.sock,
                         Addrd(ex.req.frame.as_slice(), ex.req.addr))
            },
            | None => Ok(()),
          };

          if let Err(e) = sent {
            self.fail(&token, e);
          }
        },
      }
    }

    Ok(())
  }

  /// Encode the current message of an exchange, arm its timers
  /// if it is confirmable, and send it.
  fn transmit(&mut self, token: &Token) -> Result<(), Error> {
    let now = self.now(When::None)?;
    let init = self.config.retry_strategy().pick(&mut self.rand);
    let timer = RetryTimer::new(now,
                                init,
                                self.config.max_transmit_span(),
                                self.config.max_retransmit);
    let lifetime: Millis = self.config.max_transmit_wait();
    let expires_at = now.checked_add(lifetime);

    let sock = &self.sock;
    let req = match self.exchanges.get_mut(token) {
      | Some(ex) => &mut ex.req,
      | None => return Ok(()),
    };

    let when = When::SendingMessage(Some(req.addr), req.msg.id, *token);
    req.frame = (&req.msg).try_into_bytes()
                          .map_err(|e| when.what(What::ToBytes(e)))?;

    if req.msg.ty == Type::Con {
      req.timer = Some(timer);
      req.expires_at = expires_at;
      req.transmitting = true;
    }

    log::trace!("sending {} -> {}", logging::msg_summary(&req.msg), req.addr);
    Self::send(when, sock, Addrd(req.frame.as_slice(), req.addr))
  }

  fn send_msg(&mut self, msg: Addrd<&Message>) -> Result<(), Error> {
    let when = When::SendingMessage(Some(msg.addr()), msg.data().id, msg.data().token);

    log::trace!("sending {} -> {}",
                logging::msg_summary(msg.data()),
                msg.addr());

    let bytes = msg.data()
                   .try_into_bytes()
                   .map_err(|e| when.what(What::ToBytes(e)))?;

    Self::send(when, &self.sock, Addrd(bytes.as_slice(), msg.addr())).map_err(|e| {
                                                                       log::warn!("{:?}", e);
                                                                       e
                                                                     })
  }

  fn send(when: When, sock: &P::Socket, dgram: Addrd<&[u8]>) -> Result<(), Error> {
    nb::block!(sock.send(dgram)).map_err(|err| when.what(What::Transport(err.into())))?;

    log::trace!("sent {}b -> {}", dgram.data().len(), dgram.addr());
    Ok(())
  }
}
