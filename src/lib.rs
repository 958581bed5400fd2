//! An asynchronous message-framing library: a variable-length size-prefix
//! codec plus a streaming decoder that reassembles discrete application
//! messages from arbitrary TCP chunk boundaries, and a generic client/server
//! wrapper that grafts this onto any `AsyncRead + AsyncWrite` transport.
//!
//! # Examples
//!
//! ## Client: connect, send one message, receive the reply
//!
//! ```rust,no_run
//! use frameio::{TcpFramedClient, DEFAULT_MAX_MESSAGE_SIZE};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = TcpFramedClient::connect("127.0.0.1:9000", DEFAULT_MAX_MESSAGE_SIZE).await?;
//!
//!     client.send_message("ping").await?;
//!
//!     if let Some(reply) = client.recv_message().await? {
//!         println!("got {} bytes back", reply.len());
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Server: echo every message back to its sender
//!
//! ```rust,no_run
//! use bytes::Bytes;
//! use frameio::{FramedClientHandle, FramedHandler, FramedServer, DEFAULT_MAX_MESSAGE_SIZE};
//! use std::future::Future;
//!
//! struct Echo {
//!     handle: Option<FramedClientHandle>,
//! }
//!
//! impl FramedHandler for Echo {
//!     fn on_connect(&mut self, handle: FramedClientHandle) -> impl Future<Output = ()> + Send {
//!         self.handle = Some(handle);
//!         async {}
//!     }
//!
//!     fn on_receive(&mut self, message: Bytes) -> impl Future<Output = ()> + Send {
//!         let handle = self.handle.clone();
//!         async move {
//!             if let Some(handle) = handle {
//!                 let _ = handle.send_message(message);
//!             }
//!         }
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let server = FramedServer::new(DEFAULT_MAX_MESSAGE_SIZE);
//!     server.listen("127.0.0.1:9000", || Echo { handle: None }).await
//! }
//! ```

pub mod client;
pub mod decoder;
pub mod error;
pub mod fs;
pub mod server;
pub mod tcp;
pub mod transport;
pub mod udp;
pub mod varsize;

pub use client::{
    ConnectionState, FramedClient, FramedClientHandle, FramedHandler, TcpFramedClient,
};
pub use decoder::{DecodeEvent, FramedDecoder};
pub use error::{FramedError, Result};
pub use fs::{stat, stat_file, StatData};
pub use server::{FramedConnectedPeer, FramedPeerHandle, FramedServer};
pub use udp::UdpEndpoint;
pub use varsize::{VarSize, INVALID, MAX_VALUE};

/// Default cap on a single message's body, in bytes (2 MiB).
///
/// Used as the suggested `max_message_size` when a caller has no
/// application-specific limit in mind.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 2 * 1024 * 1024;

/// Re-exports the names most programs built on this crate will need.
pub mod prelude {
    pub use crate::{
        ConnectionState, DecodeEvent, FramedClient, FramedClientHandle, FramedConnectedPeer,
        FramedDecoder, FramedError, FramedHandler, FramedPeerHandle, FramedServer, Result,
        TcpFramedClient, VarSize, DEFAULT_MAX_MESSAGE_SIZE,
    };
}
