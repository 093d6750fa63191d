//! Websocket I/O thread.
//!
//! The thread owns the socket. It only moves frames and state changes across `mpsc` channels;
//! protocol state lives with the caller, which drains [`SocketEvent`]s from its own thread.
//!
//! ```text
//! Disconnected -> Connecting -> HandshakeSent -> (delay) -> Ready -> Closed
//! ```

use crate::error::ConnectorError;
use crate::lsp_transport::{decode_frame, write_lsp_message};
use serde_json::Value;
use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::mpsc::{self, RecvTimeoutError, TryRecvError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};
use tungstenite::client::IntoClientRequest;
use tungstenite::{HandshakeError, WebSocket};

/// How long a closing socket keeps reading for the peer's close frame.
const CLOSE_GRACE: Duration = Duration::from_millis(500);

/// Per-address limit on opening the TCP connection.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Limit on the websocket upgrade once the TCP connection is up.
const UPGRADE_TIMEOUT: Duration = Duration::from_secs(10);

/// Lifecycle of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection was ever opened.
    Disconnected,
    /// The websocket is being opened.
    Connecting,
    /// The handshake frame is out; waiting for the server to come up.
    HandshakeSent,
    /// The protocol client may talk to the server.
    Ready,
    /// Terminal.
    Closed,
}

impl ConnectionState {
    /// Whether the socket exists and is open.
    pub fn is_open(self) -> bool {
        matches!(self, Self::HandshakeSent | Self::Ready)
    }
}

/// Commands for the I/O thread.
#[derive(Debug)]
pub enum SocketCommand {
    /// Send one JSON-RPC message.
    Send(Value),
    /// Close the socket and stop.
    Close,
}

/// Events reported by the I/O thread.
#[derive(Debug)]
pub enum SocketEvent {
    /// The connection moved to a new state.
    State(ConnectionState),
    /// A JSON-RPC message arrived.
    Message(Value),
    /// A non-fatal problem (the connection may still be usable).
    Error(String),
}

/// What the I/O thread needs to open a connection.
#[derive(Debug, Clone)]
pub struct SocketOptions {
    /// `ws://host:port/path`.
    pub url: String,
    /// First frame sent after the socket opens.
    pub handshake: Value,
    /// Wait between the handshake and [`ConnectionState::Ready`].
    pub handshake_delay: Duration,
    /// Read timeout between outbound flushes.
    pub poll_interval: Duration,
}

/// Caller-side handle to a connection's I/O thread.
///
/// Dropping the handle closes the connection.
#[derive(Debug)]
pub struct Socket {
    commands: mpsc::Sender<SocketCommand>,
    events: mpsc::Receiver<SocketEvent>,
    state: Arc<Mutex<ConnectionState>>,
}

impl Socket {
    /// Spawn the I/O thread and start connecting.
    pub fn open(options: SocketOptions) -> Self {
        let (tx_commands, rx_commands) = mpsc::channel::<SocketCommand>();
        let (tx_events, rx_events) = mpsc::channel::<SocketEvent>();
        let state = Arc::new(Mutex::new(ConnectionState::Connecting));

        {
            let state = state.clone();
            thread::spawn(move || io_loop(options, rx_commands, tx_events, state));
        }

        Self {
            commands: tx_commands,
            events: rx_events,
            state,
        }
    }

    /// Current state. Never waits on the I/O thread beyond a field read.
    pub fn state(&self) -> ConnectionState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sender the protocol client writes through.
    pub fn sender(&self) -> mpsc::Sender<SocketCommand> {
        self.commands.clone()
    }

    /// Next pending event, if any.
    pub fn try_recv(&self) -> Option<SocketEvent> {
        self.events.try_recv().ok()
    }

    /// Mark the connection closed and ask the I/O thread to shut the socket.
    pub fn close(&self) {
        set_state(&self.state, ConnectionState::Closed);
        let _ = self.commands.send(SocketCommand::Close);
    }
}

impl Drop for Socket {
    fn drop(&mut self) {
        self.close();
    }
}

/// Move to `next` unless the connection is already closed. Returns whether it moved.
fn set_state(state: &Mutex<ConnectionState>, next: ConnectionState) -> bool {
    let mut current = state.lock().unwrap_or_else(PoisonError::into_inner);
    if *current == ConnectionState::Closed {
        return false;
    }
    *current = next;
    true
}

fn open_stream(host: &str, port: u16) -> Result<TcpStream, ConnectorError> {
    let mut last_err = None;
    for addr in (host, port).to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT) {
            Ok(stream) => return Ok(stream),
            Err(err) => last_err = Some(err),
        }
    }
    Err(last_err
        .unwrap_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no address for {host}")))
        .into())
}

/// Open the websocket. The upgrade gives up after `upgrade_timeout`, or as soon as `state`
/// turns [`ConnectionState::Closed`].
fn connect(
    url: &str,
    poll_interval: Duration,
    upgrade_timeout: Duration,
    state: &Mutex<ConnectionState>,
) -> Result<WebSocket<TcpStream>, ConnectorError> {
    let request = url.into_client_request()?;
    let uri = request.uri();
    if uri.scheme_str() != Some("ws") {
        return Err(ConnectorError::UnsupportedUrl(url.to_string()));
    }
    let host = uri
        .host()
        .ok_or_else(|| ConnectorError::UnsupportedUrl(url.to_string()))?
        .to_string();
    let port = uri.port_u16().unwrap_or(80);

    let stream = open_stream(&host, port)?;
    // Timeouts go on before the upgrade so a silent peer cannot hold the thread.
    stream.set_read_timeout(Some(poll_interval))?;
    stream.set_write_timeout(Some(upgrade_timeout))?;

    let deadline = Instant::now() + upgrade_timeout;
    let mut attempt = tungstenite::client(request, stream);
    loop {
        match attempt {
            Ok((socket, _response)) => return Ok(socket),
            Err(HandshakeError::Failure(err)) => return Err(ConnectorError::WebSocket(err)),
            Err(HandshakeError::Interrupted(mid)) => {
                if *state.lock().unwrap_or_else(PoisonError::into_inner) == ConnectionState::Closed {
                    return Err(ConnectorError::Handshake("closed during upgrade".to_string()));
                }
                if Instant::now() >= deadline {
                    return Err(ConnectorError::Handshake(format!(
                        "no upgrade response within {upgrade_timeout:?}"
                    )));
                }
                attempt = mid.handshake();
            }
        }
    }
}

fn io_loop(
    options: SocketOptions,
    commands: mpsc::Receiver<SocketCommand>,
    events: mpsc::Sender<SocketEvent>,
    state: Arc<Mutex<ConnectionState>>,
) {
    // The event goes out before the state flips so a caller that sees `Closed` can always
    // drain the matching event.
    let finish = |state: &Mutex<ConnectionState>| {
        let _ = events.send(SocketEvent::State(ConnectionState::Closed));
        *state.lock().unwrap_or_else(PoisonError::into_inner) = ConnectionState::Closed;
    };

    let poll_interval = options.poll_interval.max(Duration::from_millis(1));
    let mut socket = match connect(&options.url, poll_interval, UPGRADE_TIMEOUT, &state) {
        Ok(socket) => socket,
        Err(err) => {
            tracing::warn!(url = %options.url, error = %err, "language service connection failed");
            let _ = events.send(SocketEvent::Error(err.to_string()));
            finish(&state);
            return;
        }
    };

    if let Err(err) = write_lsp_message(&mut socket, &options.handshake) {
        tracing::warn!(error = %err, "failed to send language service handshake");
        let _ = events.send(SocketEvent::Error(err.to_string()));
        finish(&state);
        return;
    }
    if set_state(&state, ConnectionState::HandshakeSent) {
        let _ = events.send(SocketEvent::State(ConnectionState::HandshakeSent));
    }
    tracing::debug!(url = %options.url, "handshake sent");

    // The server process needs time to start; nothing is read or written meanwhile.
    let deadline = Instant::now() + options.handshake_delay;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        match commands.recv_timeout(remaining) {
            Ok(SocketCommand::Close) | Err(RecvTimeoutError::Disconnected) => {
                close_socket(&mut socket);
                finish(&state);
                return;
            }
            Ok(SocketCommand::Send(_)) => {
                tracing::debug!("dropping message sent before the connection was ready");
            }
            Err(RecvTimeoutError::Timeout) => break,
        }
    }
    if set_state(&state, ConnectionState::Ready) {
        let _ = events.send(SocketEvent::State(ConnectionState::Ready));
    }

    loop {
        loop {
            match commands.try_recv() {
                Ok(SocketCommand::Send(value)) => {
                    if let Err(err) = write_lsp_message(&mut socket, &value) {
                        tracing::warn!(error = %err, "language service write failed");
                        finish(&state);
                        return;
                    }
                }
                Ok(SocketCommand::Close) | Err(TryRecvError::Disconnected) => {
                    close_socket(&mut socket);
                    finish(&state);
                    return;
                }
                Err(TryRecvError::Empty) => break,
            }
        }

        match socket.read() {
            Ok(frame) => match decode_frame(&frame) {
                Ok(Some(value)) => {
                    if events.send(SocketEvent::Message(value)).is_err() {
                        close_socket(&mut socket);
                        finish(&state);
                        return;
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(error = %err, "ignoring malformed language service frame");
                    let _ = events.send(SocketEvent::Error(err.to_string()));
                }
            },
            Err(tungstenite::Error::Io(err)) if is_timeout(&err) => {}
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                tracing::debug!(url = %options.url, "language service closed the connection");
                break;
            }
            Err(err) => {
                tracing::warn!(error = %err, "language service read failed");
                break;
            }
        }
    }
    finish(&state);
}

fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}

/// Start the close handshake and read until the peer answers or the grace period ends.
fn close_socket(socket: &mut WebSocket<TcpStream>) {
    if socket.close(None).is_err() {
        return;
    }
    let deadline = Instant::now() + CLOSE_GRACE;
    while Instant::now() < deadline {
        match socket.read() {
            Ok(_) => {}
            Err(tungstenite::Error::Io(err)) if is_timeout(&err) => {}
            Err(_) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_open_states() {
        assert!(!ConnectionState::Disconnected.is_open());
        assert!(!ConnectionState::Connecting.is_open());
        assert!(ConnectionState::HandshakeSent.is_open());
        assert!(ConnectionState::Ready.is_open());
        assert!(!ConnectionState::Closed.is_open());
    }

    #[test]
    fn test_closed_is_terminal() {
        let state = Mutex::new(ConnectionState::Connecting);
        assert!(set_state(&state, ConnectionState::Closed));
        assert!(!set_state(&state, ConnectionState::Ready));
        assert_eq!(*state.lock().unwrap(), ConnectionState::Closed);
    }

    #[test]
    fn test_unsupported_scheme_is_rejected() {
        let state = Mutex::new(ConnectionState::Connecting);
        let err = connect(
            "http://127.0.0.1:1/",
            Duration::from_millis(5),
            Duration::from_millis(50),
            &state,
        )
        .unwrap_err();
        assert!(matches!(err, ConnectorError::UnsupportedUrl(_)));
    }

    /// Accepts connections and never answers.
    fn silent_listener() -> (std::net::TcpListener, String) {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("ws://{}/", listener.local_addr().unwrap());
        (listener, url)
    }

    #[test]
    fn test_silent_server_times_out_the_upgrade() {
        let (_listener, url) = silent_listener();
        let state = Mutex::new(ConnectionState::Connecting);

        let started = Instant::now();
        let err = connect(&url, Duration::from_millis(10), Duration::from_millis(150), &state)
            .unwrap_err();
        assert!(matches!(err, ConnectorError::Handshake(_)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_close_cancels_a_pending_upgrade() {
        let (_listener, url) = silent_listener();
        let state = Mutex::new(ConnectionState::Closed);

        let started = Instant::now();
        let err = connect(&url, Duration::from_millis(10), Duration::from_secs(30), &state)
            .unwrap_err();
        assert!(matches!(err, ConnectorError::Handshake(ref reason) if reason.contains("closed")));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
