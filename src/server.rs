// ABOUTME: Accepts TCP connections and drives one FramedConnectedPeer task per accepted peer
// ABOUTME: Per-peer state (the handler instance) is owned by that peer's task, not a raw user_data slot

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::mpsc;

use crate::client::{FramedClient, FramedClientHandle, FramedHandler};
use crate::error::{FramedError, Result};

/// A handle for sending to one accepted peer from elsewhere in the program.
///
/// Identical in shape to [`FramedClientHandle`] — re-exported under this name
/// for symmetry with [`FramedConnectedPeer`]/[`crate::client::FramedClient`].
pub type FramedPeerHandle = FramedClientHandle;

/// The server-side counterpart of [`FramedClient`]: framing state plus a
/// transport handle bound to a single accepted connection.
///
/// Where a C-style peer wrapper would attach this to the accepted peer's `user_data` slot,
/// here it is simply owned by the tokio task spawned for that peer in
/// [`FramedServer::listen`] — non-null for exactly the task's lifetime, and
/// dropped when the task ends, with no separate attach/detach step needed.
pub struct FramedConnectedPeer {
    inner: FramedClient<TcpStream>,
    peer_addr: SocketAddr,
}

impl FramedConnectedPeer {
    fn new(stream: TcpStream, peer_addr: SocketAddr, max_message_size: usize) -> Self {
        Self {
            inner: FramedClient::new(stream, max_message_size),
            peer_addr,
        }
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    pub async fn send_message(&mut self, payload: impl Into<Bytes>) -> Result<()> {
        self.inner.send_message(payload).await
    }

    pub async fn send_message_with<F>(&mut self, payload: impl Into<Bytes>, on_complete: F) -> Result<()>
    where
        F: FnOnce(&Result<()>),
    {
        self.inner.send_message_with(payload, on_complete).await
    }

    pub async fn recv_message(&mut self) -> Result<Option<Bytes>> {
        self.inner.recv_message().await
    }
}

/// Accepts connections on a TCP listener and frames each one.
///
/// Maintains no peer map of its own: each accepted peer gets its own task
/// owning a [`FramedConnectedPeer`] and a freshly constructed handler, so
/// per-peer state never needs to be looked up by identity from shared state.
pub struct FramedServer {
    max_message_size: usize,
}

impl FramedServer {
    pub fn new(max_message_size: usize) -> Self {
        Self { max_message_size }
    }

    /// Bind `addr` and accept connections indefinitely, calling `make_handler()`
    /// once per accepted peer to construct that peer's handler.
    ///
    /// Returns only if the bind itself fails or the accept loop hits a fatal
    /// listener error; each individual peer's lifetime is independent and
    /// errors on one connection never propagate here.
    pub async fn listen<H, F>(&self, addr: impl ToSocketAddrs, make_handler: F) -> std::io::Result<()>
    where
        H: FramedHandler,
        F: Fn() -> H + Send + Sync + 'static,
    {
        let listener = TcpListener::bind(addr).await?;
        let make_handler = Arc::new(make_handler);
        let max_message_size = self.max_message_size;

        loop {
            let (stream, peer_addr) = listener.accept().await?;
            let make_handler = make_handler.clone();

            tokio::spawn(async move {
                let mut handler = make_handler();
                let mut peer = FramedConnectedPeer::new(stream, peer_addr, max_message_size);
                let (tx, mut rx) = mpsc::unbounded_channel::<Bytes>();
                let handle = FramedPeerHandle::with_peer_addr(tx, peer_addr);

                handler.on_connect(handle).await;

                loop {
                    tokio::select! {
                        incoming = peer.recv_message() => {
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
                            if let Err(err) = peer.send_message(payload).await {
                                handler.on_close(Some(err)).await;
                                break;
                            }
                        }
                    }
                }
            });
        }
    }
}
