use std::net::TcpStream;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use serde_json::Value;
use tracing::{debug, info, warn};
use tungstenite::{HandshakeError, WebSocket};
use url::Url;

use super::codec::{encode_connect, encode_event, EnginePacket, SocketPacket};
use super::{socket_url, Emit, PushEvent, DEFAULT_SOCKET_PATH};
use crate::error::{ConsoleError, Result};

/// How long a blocking read waits before the loop checks for outgoing commands.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Per-address TCP connect limit; also bounds a single blocked write.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Upper bound on the websocket upgrade once TCP is connected.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Used until the handshake supplies `pingInterval + pingTimeout`.
const DEFAULT_HEARTBEAT: Duration = Duration::from_secs(45);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushConfig {
    pub base_url: String,
    /// Socket.IO mount point, `/socket.io` or `/ws/socket.io`.
    pub path: String,
    pub reconnect_delay: Duration,
}

impl PushConfig {
    pub fn new(base_url: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            path: path.into(),
            reconnect_delay: Duration::from_secs(2),
        }
    }

    pub fn socket_url(&self) -> Result<Url> {
        socket_url(&self.base_url, &self.path)
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self::new("http://127.0.0.1:5000", DEFAULT_SOCKET_PATH)
    }
}

#[derive(Debug)]
enum Command {
    Emit(Emit),
    Disconnect,
}

enum SessionEnd {
    Shutdown,
    Closed,
}

/// Handle to the background push connection.
///
/// The websocket lives on its own thread. Outgoing [`Emit`]s and incoming
/// [`PushEvent`]s cross over unbounded channels; the owner drains events on
/// its own schedule. The connection is retried after `reconnect_delay` until
/// [`PushClient::disconnect`] is called or the handle is dropped.
pub struct PushClient {
    commands: Sender<Command>,
    events: Receiver<PushEvent>,
    handle: Option<JoinHandle<()>>,
}

impl PushClient {
    pub fn connect(config: PushConfig) -> Result<Self> {
        let url = config.socket_url()?;
        let (command_tx, command_rx) = unbounded::<Command>();
        let (event_tx, event_rx) = unbounded::<PushEvent>();
        let delay = config.reconnect_delay;

        let handle = std::thread::Builder::new()
            .name("chaddi-push-client".into())
            .spawn(move || run(url, delay, command_rx, event_tx))?;

        Ok(Self {
            commands: command_tx,
            events: event_rx,
            handle: Some(handle),
        })
    }

    /// Queues an event for the server. Emits issued before the namespace is
    /// joined are flushed once it is.
    pub fn emit(&self, emit: Emit) -> Result<()> {
        self.commands
            .send(Command::Emit(emit))
            .map_err(|_| ConsoleError::Disconnected)
    }

    pub fn try_recv(&self) -> Option<PushEvent> {
        self.events.try_recv().ok()
    }

    pub fn drain(&self) -> Vec<PushEvent> {
        self.events.try_iter().collect()
    }

    pub fn events(&self) -> &Receiver<PushEvent> {
        &self.events
    }

    /// Closes the websocket and waits for the connection thread to exit.
    pub fn disconnect(&mut self) {
        let _ = self.commands.send(Command::Disconnect);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("push client thread panicked");
            }
        }
    }
}

impl Drop for PushClient {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Disconnect);
    }
}

fn run(url: Url, delay: Duration, commands: Receiver<Command>, events: Sender<PushEvent>) {
    let mut pending: Vec<Emit> = Vec::new();
    loop {
        let mut session = Session {
            events: &events,
            joined: false,
            heartbeat: DEFAULT_HEARTBEAT,
            last_seen: Instant::now(),
        };
        let outcome = session.run(&url, &commands, &mut pending);
        if session.joined {
            let _ = events.send(PushEvent::Disconnected);
        }
        match outcome {
            Ok(SessionEnd::Shutdown) => return,
            Ok(SessionEnd::Closed) => info!(%url, "push stream closed"),
            Err(error) => warn!(%url, %error, "push stream failed"),
        }

        let deadline = Instant::now() + delay;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match commands.recv_timeout(remaining) {
                Ok(Command::Emit(emit)) => pending.push(emit),
                Ok(Command::Disconnect) | Err(RecvTimeoutError::Disconnected) => return,
                Err(RecvTimeoutError::Timeout) => break,
            }
        }
        debug!(%url, "reconnecting push stream");
    }
}

struct Session<'a> {
    events: &'a Sender<PushEvent>,
    joined: bool,
    heartbeat: Duration,
    last_seen: Instant,
}

type Socket = WebSocket<TcpStream>;

impl Session<'_> {
    fn run(
        &mut self,
        url: &Url,
        commands: &Receiver<Command>,
        pending: &mut Vec<Emit>,
    ) -> Result<SessionEnd> {
        let Some(mut socket) = open(url, commands, pending)? else {
            return Ok(SessionEnd::Shutdown);
        };
        debug!(%url, "websocket open");
        self.last_seen = Instant::now();

        loop {
            loop {
                match commands.try_recv() {
                    Ok(Command::Emit(emit)) if self.joined => send_emit(&mut socket, &emit)?,
                    Ok(Command::Emit(emit)) => pending.push(emit),
                    Ok(Command::Disconnect) | Err(TryRecvError::Disconnected) => {
                        close(&mut socket, self.joined);
                        return Ok(SessionEnd::Shutdown);
                    }
                    Err(TryRecvError::Empty) => break,
                }
            }

            match socket.read() {
                Ok(tungstenite::Message::Text(text)) => {
                    self.last_seen = Instant::now();
                    if let Some(end) = self.on_frame(&mut socket, text.as_str(), pending)? {
                        return Ok(end);
                    }
                }
                Ok(tungstenite::Message::Close(_)) => return Ok(SessionEnd::Closed),
                Ok(_) => self.last_seen = Instant::now(),
                Err(tungstenite::Error::Io(e))
                    if matches!(
                        e.kind(),
                        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                    ) => {}
                Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                    return Ok(SessionEnd::Closed)
                }
                Err(e) => return Err(e.into()),
            }

            if self.last_seen.elapsed() > self.heartbeat {
                return Err(ConsoleError::Protocol("ping timeout".into()));
            }
        }
    }

    fn on_frame(
        &mut self,
        socket: &mut Socket,
        frame: &str,
        pending: &mut Vec<Emit>,
    ) -> Result<Option<SessionEnd>> {
        match EnginePacket::decode(frame)? {
            EnginePacket::Open(handshake) => {
                if let Some(heartbeat) = heartbeat_from(&handshake) {
                    self.heartbeat = heartbeat;
                }
                socket.send(tungstenite::Message::text(encode_connect()))?;
            }
            EnginePacket::Ping(data) => {
                socket.send(tungstenite::Message::text(EnginePacket::Pong(data).encode()))?;
            }
            EnginePacket::Close => return Ok(Some(SessionEnd::Closed)),
            EnginePacket::Message(payload) => match SocketPacket::decode(&payload) {
                Ok(SocketPacket::Connect { .. }) => {
                    self.joined = true;
                    info!("push stream connected");
                    let _ = self.events.send(PushEvent::Connected);
                    for emit in pending.drain(..) {
                        send_emit(socket, &emit)?;
                    }
                }
                Ok(SocketPacket::Event { name, args, .. }) => {
                    let _ = self.events.send(PushEvent::from_event(&name, args));
                }
                Ok(SocketPacket::Disconnect { .. }) => return Ok(Some(SessionEnd::Closed)),
                Ok(SocketPacket::ConnectError { data, .. }) => {
                    return Err(ConsoleError::Protocol(format!(
                        "namespace connect refused: {}",
                        data.unwrap_or(Value::Null)
                    )))
                }
                Ok(SocketPacket::Ack { .. }) => {}
                Err(error) => debug!(%error, "skipping socket.io packet"),
            },
            EnginePacket::Pong(_) | EnginePacket::Upgrade | EnginePacket::Noop => {}
        }
        Ok(None)
    }
}

/// Connects and upgrades with bounded waits. Returns `None` when a disconnect
/// was requested before the upgrade finished.
fn open(
    url: &Url,
    commands: &Receiver<Command>,
    pending: &mut Vec<Emit>,
) -> Result<Option<Socket>> {
    if url.scheme() != "ws" {
        return Err(ConsoleError::Protocol(format!(
            "{} push streams are not supported, use a plain http base URL",
            url.scheme()
        )));
    }

    let stream = connect_tcp(url)?;
    stream.set_read_timeout(Some(POLL_INTERVAL))?;
    stream.set_write_timeout(Some(CONNECT_TIMEOUT))?;

    let deadline = Instant::now() + HANDSHAKE_TIMEOUT;
    let mut attempt = tungstenite::client(url.as_str(), stream);
    loop {
        match attempt {
            Ok((socket, _response)) => return Ok(Some(socket)),
            Err(HandshakeError::Failure(e)) => return Err(e.into()),
            Err(HandshakeError::Interrupted(mid)) => {
                if queue_commands(commands, pending) {
                    debug!(%url, "disconnect requested during websocket upgrade");
                    return Ok(None);
                }
                if Instant::now() >= deadline {
                    return Err(ConsoleError::Protocol("websocket upgrade timed out".into()));
                }
                attempt = mid.handshake();
            }
        }
    }
}

fn connect_tcp(url: &Url) -> Result<TcpStream> {
    let mut last_error = None;
    for addr in url.socket_addrs(|| Some(80))? {
        match TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_error = Some(e),
        }
    }
    let error = last_error.unwrap_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::NotFound, "no address for host")
    });
    Err(error.into())
}

/// Moves queued emits into `pending`. True when the owner asked to disconnect.
fn queue_commands(commands: &Receiver<Command>, pending: &mut Vec<Emit>) -> bool {
    loop {
        match commands.try_recv() {
            Ok(Command::Emit(emit)) => pending.push(emit),
            Ok(Command::Disconnect) | Err(TryRecvError::Disconnected) => return true,
            Err(TryRecvError::Empty) => return false,
        }
    }
}

fn heartbeat_from(handshake: &Value) -> Option<Duration> {
    let interval = handshake.get("pingInterval")?.as_u64()?;
    let timeout = handshake.get("pingTimeout")?.as_u64()?;
    Some(Duration::from_millis(interval + timeout))
}

fn send_emit(socket: &mut Socket, emit: &Emit) -> Result<()> {
    debug!(event = emit.event_name(), "emit");
    socket.send(tungstenite::Message::text(encode_event(
        emit.event_name(),
        emit.payload(),
    )))?;
    Ok(())
}

fn close(socket: &mut Socket, joined: bool) {
    if joined {
        let leave = EnginePacket::Message(SocketPacket::Disconnect { namespace: "/".into() }.encode());
        let _ = socket.send(tungstenite::Message::text(leave.encode()));
    }
    let _ = socket.close(None);
    let _ = socket.flush();
}
