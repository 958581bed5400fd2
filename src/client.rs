// ABOUTME: Message-oriented client wrapper that layers FramedDecoder over a duplex stream
// ABOUTME: Exposes a pull-based recv_message/send_message pair plus a handler-driven run() adapter

use std::collections::VecDeque;
use std::future::Future;
use std::io;
use std::net::SocketAddr;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::mpsc;

use crate::decoder::{DecodeEvent, FramedDecoder};
use crate::error::{FramedError, Result};
use crate::varsize::VarSize;

/// Size of the scratch buffer used for each individual read from the transport.
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Lifecycle state of a [`FramedClient`], mirroring the client-side connect/read/close lifecycle.
///
/// `FramedClient::new` always starts `Connected` since it wraps an
/// already-established transport handle; `Idle`/`Connecting` are exposed for
/// callers (like [`FramedClient::connect`] below) that model the handshake
/// before a stream exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Connected,
    Closing,
    Closed,
}

/// A message-oriented wrapper around any `AsyncRead + AsyncWrite` transport.
///
/// Frames every outbound payload with its [`VarSize`]-encoded length and
/// reassembles inbound payloads through a private [`FramedDecoder`]. One
/// `FramedClient` owns its transport exclusively; it is not `Clone` (use
/// [`FramedClient::run`]'s returned [`FramedClientHandle`] to send from other
/// tasks once the client is handed off to its driving loop).
pub struct FramedClient<S> {
    stream: S,
    decoder: FramedDecoder,
    pending_events: VecDeque<DecodeEvent>,
    state: ConnectionState,
}

impl<S> FramedClient<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Wrap an already-connected transport `stream`.
    pub fn new(stream: S, max_message_size: usize) -> Self {
        Self {
            stream,
            decoder: FramedDecoder::new(max_message_size),
            pending_events: VecDeque::new(),
            state: ConnectionState::Connected,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Send `payload` as a single framed message: the wire form of
    /// `VarSize(payload.len())` followed by the payload bytes, as one
    /// ordered pair of writes.
    pub async fn send_message(&mut self, payload: impl Into<Bytes>) -> Result<()> {
        let payload = payload.into();
        let prefix = VarSize::encode(payload.len() as u64);
        self.stream.write_all(prefix.bytes()).await?;
        self.stream.write_all(&payload).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Like [`send_message`](Self::send_message), but also invokes
    /// `on_complete` with the write's outcome once the payload write (and
    /// flush) has finished — "fires after the payload write completes" is
    /// simply "awaiting the future this method returns has completed".
    pub async fn send_message_with<F>(&mut self, payload: impl Into<Bytes>, on_complete: F) -> Result<()>
    where
        F: FnOnce(&Result<()>),
    {
        let result = self.send_message(payload).await;
        on_complete(&result);
        result
    }

    /// Receive the next complete message, pulling more bytes off the
    /// transport as needed.
    ///
    /// Returns `Ok(None)` on a clean EOF. A [`FramedError::MessageTooLong`]
    /// does *not* end the stream — the decoder has already resynchronized
    /// past the offending body, and the next call continues with whatever
    /// follows it. A [`FramedError::InvalidEncoding`] does end the stream:
    /// the decoder is poisoned and every following call returns the same
    /// error without reading further.
    pub async fn recv_message(&mut self) -> Result<Option<Bytes>> {
        loop {
            if let Some(event) = self.pending_events.pop_front() {
                match event {
                    DecodeEvent::Message(bytes) => return Ok(Some(bytes)),
                    DecodeEvent::TooLong { declared_size } => {
                        return Err(FramedError::MessageTooLong {
                            declared_size,
                            max: self.decoder.max_message_size(),
                        });
                    }
                    DecodeEvent::InvalidEncoding => return Err(FramedError::InvalidEncoding),
                }
            }

            // Once poisoned, stay poisoned without touching the transport
            // again: there is no further byte sequence that would un-wedge
            // an 8-byte unterminated size prefix.
            if self.decoder.is_poisoned() {
                return Err(FramedError::InvalidEncoding);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let n = self.stream.read(&mut chunk).await?;
            if n == 0 {
                self.state = ConnectionState::Closed;
                return Ok(None);
            }

            let events = &mut self.pending_events;
            self.decoder
                .ingest(&chunk[..n], &mut |event| events.push_back(event));
        }
    }

    /// Shut down the transport and mark this client `Closed`.
    pub async fn close(&mut self) -> Result<()> {
        self.state = ConnectionState::Closing;
        self.stream.shutdown().await?;
        self.state = ConnectionState::Closed;
        Ok(())
    }

    /// Hand this client off to a background task that drives `recv_message`
    /// in a loop, invoking `handler`'s hooks for each event, and multiplexes
    /// in sends issued via the returned [`FramedClientHandle`].
    ///
    /// This realizes a push-callback style as the
    /// tokio-idiomatic actor-per-connection pattern: the handler's methods
    /// run on the task spawned here, and outbound sends from other tasks are
    /// routed back into it over a channel rather than through shared state.
    pub fn run<H>(mut self, mut handler: H) -> FramedClientHandle
    where
        H: FramedHandler,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<Bytes>();
        let handle = FramedClientHandle::new(tx);
        let self_handle = handle.clone();

        tokio::spawn(async move {
            handler.on_connect(self_handle).await;
            loop {
                tokio::select! {
                    incoming = self.recv_message() => {
                        match incoming {
                            Ok(Some(message)) => handler.on_receive(message).await,
                            Ok(None) => {
                                handler.on_close(None).await;
                                break;
                            }
                            Err(FramedError::MessageTooLong { declared_size, .. }) => {
                                handler.on_message_too_long(declared_size).await;
                            }
                            Err(err) => {
                                handler.on_close(Some(err)).await;
                                break;
                            }
                        }
                    }
                    Some(payload) = rx.recv() => {
                        if let Err(err) = self.send_message(payload).await {
                            handler.on_close(Some(err)).await;
                            break;
                        }
                    }
                }
            }
        });

        handle
    }
}

/// `FramedClient` specialized for plain TCP, this crate's primary transport.
pub type TcpFramedClient = FramedClient<TcpStream>;

impl TcpFramedClient {
    /// Connect to `addr` and wrap the resulting `TcpStream`.
    pub async fn connect(addr: impl ToSocketAddrs, max_message_size: usize) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self::new(stream, max_message_size))
    }
}

/// Hooks invoked by [`FramedClient::run`] (and [`crate::server::FramedServer::listen`])
/// for each decoded event on a connection.
///
/// Uses native async-fn-in-trait rather than `#[async_trait]`: every method
/// here runs to completion on the single task driving the connection, so no
/// boxed, type-erased future is needed.
pub trait FramedHandler: Send + 'static {
    /// Called once, immediately after the connection's task starts, with a
    /// handle for sending to this peer from elsewhere in the program.
    fn on_connect(&mut self, _handle: FramedClientHandle) -> impl Future<Output = ()> + Send {
        async {}
    }

    /// Called once per complete message delivered by the decoder.
    fn on_receive(&mut self, message: Bytes) -> impl Future<Output = ()> + Send;

    /// Called once per oversize message; the connection stays open.
    fn on_message_too_long(&mut self, declared_size: u64) -> impl Future<Output = ()> + Send {
        async move {
            let _ = declared_size;
        }
    }

    /// Called exactly once, when the connection ends (cleanly or with `error`).
    fn on_close(&mut self, error: Option<FramedError>) -> impl Future<Output = ()> + Send {
        async move {
            let _ = error;
        }
    }
}

/// A cheap, cloneable sender for pushing outbound messages into a
/// [`FramedClient::run`]-driven task (client-side) or a
/// [`crate::server::FramedServer::listen`]-driven peer task (server-side,
/// re-exported there as `FramedPeerHandle`) from anywhere else in the program.
#[derive(Clone)]
pub struct FramedClientHandle {
    sender: mpsc::UnboundedSender<Bytes>,
    peer_addr: Option<SocketAddr>,
}

impl FramedClientHandle {
    pub(crate) fn new(sender: mpsc::UnboundedSender<Bytes>) -> Self {
        Self {
            sender,
            peer_addr: None,
        }
    }

    pub(crate) fn with_peer_addr(sender: mpsc::UnboundedSender<Bytes>, peer_addr: SocketAddr) -> Self {
        Self {
            sender,
            peer_addr: Some(peer_addr),
        }
    }

    /// The remote address this handle sends to, when known (server-side peers only).
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    /// Queue `payload` for sending on the task that owns the connection.
    ///
    /// Fails only if that task has already stopped (the connection is closed
    /// or closing); the failure carries no partial-write information since
    /// none occurred.
    pub fn send_message(&self, payload: impl Into<Bytes>) -> Result<()> {
        self.sender.send(payload.into()).map_err(|_| {
            FramedError::Transport(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "connection task has stopped accepting sends",
            ))
        })
    }
}
