use std::collections::HashMap;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::config::Config;
use crate::core::{Core, Error, Event, What, When};
use crate::exchange::Handle;
use crate::link_format::{parse_core_link_list, Resource};
use crate::net::Socket;
use crate::platform::Std;
use crate::req::Req;
use crate::resp::Resp;
use crate::ContentFormat;

/// How long the worker waits for a command before polling the socket again
const POLL_INTERVAL: Duration = Duration::from_millis(5);

#[derive(Debug)]
enum Command {
  Send(Req, mpsc::Sender<Result<Handle, Error>>, mpsc::Sender<Event>),
  CancelObserve(Handle),
  Abort(Handle),
  Configure(Config),
  Shutdown,
}

fn gone<T>(_: T) -> Error {
  When::None.what(What::ClientGone)
}

/// A blocking CoAP request client.
///
/// The protocol runs on a worker thread that owns the socket;
/// every request gets a [`Reply`] to wait on.
///
/// ```no_run
/// use croak::blocking::Client;
/// use croak::req::Req;
/// use croak::ContentFormat;
///
/// let client = Client::new_std(1234).unwrap();
/// let mut req = Req::get("127.0.0.1:5683".parse().unwrap(), "hello");
/// req.set_accept(ContentFormat::Text);
///
/// let rep = client.send(req).unwrap().wait().unwrap();
///
/// println!("Hello, {}!", rep.payload_string().unwrap());
/// ```
#[derive(Debug)]
pub struct Client {
  cmds: mpsc::Sender<Command>,
  worker: Option<thread::JoinHandle<()>>,
  local_addr: SocketAddr,
}

/// Helper methods on Client Results
pub trait ClientResultExt<T> {
  /// If we timed out waiting for a response, consider that Ok(None).
  ///
  /// Usually used to handle sending non-confirmable requests that
  /// the server may have received but not responded to.
  fn timeout_ok(self) -> Result<Option<T>, Error>;
}

impl<T> ClientResultExt<T> for Result<T, Error> {
  fn timeout_ok(self) -> Result<Option<T>, Error> {
    match self {
      | Ok(t) => Ok(Some(t)),
      | Err(Error { what: What::Timeout,
                    .. }) => Ok(None),
      | Err(e) => Err(e),
    }
  }
}

impl Client {
  /// Create a new client listening on `0.0.0.0:port`.
  ///
  /// Port 0 lets the operating system pick one.
  pub fn new_std(port: u16) -> Result<Self, Error> {
    Self::bind(("0.0.0.0", port), Config::default())
  }

  /// Create a new client bound to `addr`, with custom runtime behavior
  pub fn bind<A: ToSocketAddrs>(addr: A, config: Config) -> Result<Self, Error> {
    let transport = |e: std::io::Error| When::None.what(What::Transport(e.into()));

    let sock = <UdpSocket as Socket>::bind_raw(addr).map_err(transport)?;
    let local_addr = Socket::local_addr(&sock).map_err(transport)?;

    let mut core = Core::<Std>::new_config(config, crate::std::Clock::new(), sock);
    core.reseed(SystemTime::now().duration_since(UNIX_EPOCH)
                                 .map(|d| d.as_nanos() as u64)
                                 .unwrap_or_default());

    let (cmds, rx) = mpsc::channel();
    let worker = thread::Builder::new().name(format!("croak {}", local_addr))
                                       .spawn(move || run(core, rx))
                                       .map_err(transport)?;

    log::debug!("client listening on {}", local_addr);

    Ok(Self { cmds,
              worker: Some(worker),
              local_addr })
  }

  /// The address the client's socket is bound to
  pub fn local_addr(&self) -> SocketAddr {
    self.local_addr
  }

  /// Send a request
  pub fn send(&self, req: Req) -> Result<Reply, Error> {
    let (ack_tx, ack_rx) = mpsc::channel();
    let (events_tx, events_rx) = mpsc::channel();

    self.cmds
        .send(Command::Send(req, ack_tx, events_tx))
        .map_err(gone)?;

    let handle = ack_rx.recv().map_err(gone)??;

    Ok(Reply { handle,
               events: events_rx,
               cmds: self.cmds.clone() })
  }

  /// Replace the runtime config
  pub fn configure(&self, config: Config) -> Result<(), Error> {
    self.cmds.send(Command::Configure(config)).map_err(gone)
  }

  /// Ask a server which resources it has (`GET /.well-known/core`)
  pub fn discover(&self, addr: SocketAddr) -> Result<Vec<Resource>, Error> {
    let mut req = Req::get(addr, ".well-known/core");
    req.set_accept(ContentFormat::LinkFormat);

    self.send(req)?
        .wait()
        .map(|resp| parse_core_link_list(resp.payload()))
  }
}

impl Drop for Client {
  fn drop(&mut self) {
    self.cmds.send(Command::Shutdown).ok();
    if let Some(worker) = self.worker.take() {
      worker.join().ok();
    }
  }
}

/// The pending outcome of a request sent with [`Client::send`].
///
/// Dropping a `Reply` abandons the request.
#[derive(Debug)]
pub struct Reply {
  handle: Handle,
  events: mpsc::Receiver<Event>,
  cmds: mpsc::Sender<Command>,
}

impl Reply {
  /// The handle the request is known by
  pub fn handle(&self) -> Handle {
    self.handle
  }

  /// Block until the response (or the first notification
  /// of an observation) arrives
  pub fn wait(self) -> Result<Resp, Error> {
    self.recv().unwrap_or_else(|| Err(gone(())))
  }

  /// Block until the next response or notification arrives.
  ///
  /// Yields `None` once nothing more will arrive.
  pub fn recv(&self) -> Option<Result<Resp, Error>> {
    self.events.recv().ok().map(Self::outcome)
  }

  /// Like [`Reply::recv`], giving up after `timeout`
  pub fn recv_timeout(&self, timeout: Duration) -> Option<Result<Resp, Error>> {
    self.events
        .recv_timeout(timeout)
        .ok()
        .map(Self::outcome)
  }

  /// Iterate over the notifications of an observation
  pub fn notifications(&self) -> impl Iterator<Item = Result<Resp, Error>> + '_ {
    std::iter::from_fn(move || self.recv())
  }

  /// Stop observing. The observation ends when the next notification arrives.
  pub fn cancel_observe(&self) -> Result<(), Error> {
    self.cmds
        .send(Command::CancelObserve(self.handle))
        .map_err(gone)
  }

  fn outcome(event: Event) -> Result<Resp, Error> {
    match event {
      | Event::Notification(_, resp) | Event::Completed(_, resp) => Ok(resp),
      | Event::Failed(_, e) => Err(e),
    }
  }
}

impl Drop for Reply {
  fn drop(&mut self) {
    self.cmds.send(Command::Abort(self.handle)).ok();
  }
}

fn run(mut core: Core<Std>, cmds: mpsc::Receiver<Command>) {
  let mut replies = HashMap::<Handle, mpsc::Sender<Event>>::new();

  loop {
    match cmds.recv_timeout(POLL_INTERVAL) {
      | Ok(Command::Send(req, ack, events)) => {
        let sent = core.send_req(req);
        if let Ok(handle) = sent {
          replies.insert(handle, events);
        }
        ack.send(sent).ok();
      },
      | Ok(Command::CancelObserve(handle)) => {
        if let Err(e) = core.cancel_observe(handle) {
          log::debug!("{:?}", e);
        }
      },
      | Ok(Command::Abort(handle)) => {
        core.abort(handle);
        replies.remove(&handle);
      },
      | Ok(Command::Configure(config)) => *core.config_mut() = config,
      | Ok(Command::Shutdown) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
      | Err(mpsc::RecvTimeoutError::Timeout) => (),
    }

    if let Err(e) = core.poll() {
      log::warn!("{:?}", e);
    }

    while let Some(event) = core.poll_event() {
      let handle = event.handle();
      let terminal = event.is_terminal();

      if let Some(tx) = replies.get(&handle) {
        tx.send(event).ok();
      }

      if terminal {
        replies.remove(&handle);
      }
    }
  }

  log::debug!("client worker stopped");
}

#[cfg(test)]
mod tests {
  use croak_msg::opt::known::repeat;
  use croak_msg::{Message, TryFromBytes, TryIntoBytes};
  use embedded_time::duration::Milliseconds;

  use super::*;
  use crate::resp::code;
  use crate::retry::Attempts;

  fn serve_once(respond: impl FnOnce(&Message) -> Message + Send + 'static)
                -> (SocketAddr, thread::JoinHandle<Message>) {
    let server = UdpSocket::bind("127.0.0.1:0").unwrap();
    server.set_read_timeout(Some(Duration::from_secs(5)))
          .unwrap();
    let addr = server.local_addr().unwrap();

    let handle = thread::spawn(move || {
      let mut buf = [0u8; 1152];
      let (n, client) = server.recv_from(&mut buf).unwrap();
      let req = Message::try_from_bytes(&buf[..n]).unwrap();

      let resp = respond(&req).try_into_bytes().unwrap();
      server.send_to(&resp, client).unwrap();
      req
    });

    (addr, handle)
  }

  #[test]
  fn discover_over_loopback() {
    simple_logger::init_with_level(log::Level::Trace).ok();

    let (server, req) = serve_once(|req| {
                          let mut resp = req.ack(req.id);
                          resp.code = code::CONTENT;
                          resp.set_content_format(ContentFormat::LinkFormat);
                          resp.set_payload(br#"</a>;obs,</b>;rt="b""#.to_vec());
                          resp
                        });

    let client = Client::bind("127.0.0.1:0", Config::default()).unwrap();
    let resources = client.discover(server).unwrap();
    let req = req.join().unwrap();

    assert_eq!(req.get_all(repeat::PATH)
                  .map(|v| v.0.clone())
                  .collect::<Vec<_>>(),
               vec![b".well-known".to_vec(), b"core".to_vec()]);
    assert_eq!(resources.iter()
                        .map(|r| (r.path.as_str(), r.observable))
                        .collect::<Vec<_>>(),
               vec![("/a", true), ("/b", false)]);
  }

  #[test]
  fn error_status_over_loopback() {
    let (server, req) = serve_once(|req| {
                          let mut resp = req.ack(req.id);
                          resp.code = code::NOT_FOUND;
                          resp
                        });

    let client = Client::new_std(0).unwrap();
    let err = client.send(Req::get(server, "nope"))
                    .unwrap()
                    .wait()
                    .unwrap_err();
    req.join().unwrap();

    assert_eq!(err.status(), Some(code::StatusError::NotFound));
  }

  #[test]
  fn silent_server_times_out() {
    let silent = UdpSocket::bind("127.0.0.1:0").unwrap();

    let mut config = Config::default();
    config.set_ack_timeout(Milliseconds(10))
          .set_ack_random_factor(1.0)
          .set_max_retransmit(Attempts(1));

    let client = Client::bind("127.0.0.1:0", config).unwrap();
    let outcome = client.send(Req::get(silent.local_addr().unwrap(), "x"))
                        .unwrap()
                        .wait()
                        .timeout_ok()
                        .unwrap();

    assert_eq!(outcome, None);
  }
}
