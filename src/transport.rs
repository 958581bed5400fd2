// ABOUTME: Documents the transport contract FramedClient/FramedServer are generic over
// ABOUTME: No hand-written Transport trait: tokio's AsyncRead + AsyncWrite already is the contract

//! A transport contract: `connect`/`send_data`/`close` plus
//! receive/connect/close callbacks and a per-peer `user_data` slot, serialized
//! per connection on one event-loop thread.
//!
//! [`tokio::io::AsyncRead`] and [`tokio::io::AsyncWrite`] already provide the
//! capability set this crate needs from a transport: ordered, byte-granular
//! writes (`send_data`); chunked reads delivered in order (the receive
//! callback); and `close` is simply dropping or
//! [`shutdown`](tokio::io::AsyncWriteExt::shutdown)-ing the stream. Every
//! concrete transport used by this crate — [`tokio::net::TcpStream`] for
//! production use, [`tokio::io::DuplexStream`] in tests — already implements
//! both traits, so [`crate::client::FramedClient`] and
//! [`crate::server::FramedServer`] are simply generic over
//! `S: AsyncRead + AsyncWrite + Unpin + Send + 'static` rather than consuming
//! a hand-written vtable.
//!
//! This realizes one generic type parameterized by the transport, instead of
//! a templated base class and derived wrappers: `FramedClient<TcpStream>` is
//! the owning client shape, `FramedClient<tokio::io::DuplexStream>` (used in
//! this crate's own tests) demonstrates the same code working unmodified over
//! a second transport.
