// ABOUTME: Concrete TCP bindings for FramedClient/FramedServer over real sockets
// ABOUTME: Thin by design — real behavior lives in client.rs/server.rs, generic over any AsyncRead+AsyncWrite

pub use crate::client::{FramedClient, TcpFramedClient};
pub use crate::server::{FramedConnectedPeer, FramedServer};
