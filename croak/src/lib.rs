//! `croak` is the client side of a CoAP protocol engine.
//!
//! ## CoAP
//! CoAP is an application-level network protocol that copies the semantics of HTTP
//! to an environment conducive to **constrained** devices. (weak hardware, small battery capacity, etc.)
//!
//! CoAP customarily sits on top of UDP, which offers no guarantee of delivery or ordering.
//! The engine in this crate fills that gap for a client:
//! - Confirmable requests are retransmitted with exponential backoff until they are
//!   acknowledged or time out ([`retry`])
//! - Responses are correlated with requests by token, falling back to message ID for
//!   empty ACKs and Resets ([`exchange`])
//! - Large request and response bodies are split and reassembled with the Block1 & Block2
//!   options of RFC7959 ([`block`])
//! - Observed resources deliver a stream of notifications until the observation is cancelled
//!
//! ## Structure
//! [`core::Core`] is a deterministic, non-blocking state machine generic over a clock and a
//! socket ([`platform::PlatformTypes`]). It never blocks or spawns; you drive it by calling
//! [`core::Core::poll`] and drain what happened with [`core::Core::poll_event`].
//!
//! [`blocking::Client`] runs a `Core` on a worker thread over a std UDP socket
//! and hands out [`blocking::Reply`] handles.
//!
//! ```no_run
//! use croak::blocking::Client;
//! use croak::req::Req;
//!
//! let client = Client::new_std(0).unwrap();
//! let req = Req::get("127.0.0.1:5683".parse().unwrap(), "hello");
//!
//! let resp = client.send(req).unwrap().wait().unwrap();
//! println!("Hello, {}!", resp.payload_string().unwrap());
//! ```

// -
// style
#![allow(clippy::unused_unit)]
// -
// deny
#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
#![cfg_attr(not(test), deny(unsafe_code))]
// -
// warnings
#![cfg_attr(not(test), warn(unreachable_pub))]

macro_rules! code {
  (#[doc = $doc:expr] $name:ident = $c:literal * $d:literal) => {
    #[doc = $doc]
    #[allow(clippy::zero_prefixed_literal)]
    pub const $name: croak_msg::Code = croak_msg::Code::new($c, $d);
  };
  (#[doc = $doc:expr] $name:ident = $newtype:tt($c:literal * $d:literal)) => {
    #[doc = $doc]
    #[allow(clippy::zero_prefixed_literal)]
    pub const $name: $newtype = $newtype(croak_msg::Code::new($c, $d));
  };
}

#[cfg(test)]
pub(crate) mod test;

pub(crate) mod logging;

/// Blocking rust CoAP client
pub mod blocking;

/// customizable retrying of fallible operations
pub mod retry;

/// responses
pub mod resp;

/// requests
pub mod req;

/// low-level coap behavior
pub mod core;

/// request/response correlation
pub mod exchange;

/// block-wise transfers
pub mod block;

/// platform configuration
pub mod platform;

/// network abstractions
pub mod net;

/// time abstractions
pub mod time;

/// configuring runtime behavior
pub mod config;

/// CoRE Link Format (resource discovery)
pub mod link_format;

/// `std` clock & socket implementations
pub mod std;

pub use croak_msg::ContentFormat;
