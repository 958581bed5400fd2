// ABOUTME: Crate-wide error type for framing, transport, and filesystem operations
// ABOUTME: Maps the size-prefix codec and decoder failure modes onto structured variants

use thiserror::Error;

/// Errors produced by the framing layer, transports, and filesystem helpers.
#[derive(Debug, Error)]
pub enum FramedError {
    /// A message's declared size exceeded the connection's `max_message_size`.
    ///
    /// The offending body is consumed and discarded; the stream resynchronizes
    /// and decoding continues with the next message.
    #[error("declared message size {declared_size} exceeds max_message_size {max}")]
    MessageTooLong { declared_size: u64, max: usize },

    /// An I/O error surfaced by the underlying transport (connect, read, write, close).
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// An 8-byte size prefix was consumed without its completion bit being cleared.
    ///
    /// The connection is unrecoverable; the recommended action is to close it.
    #[error("invalid size-prefix encoding: 8 bytes consumed without completion")]
    InvalidEncoding,
}

/// A specialized `Result` type for framing operations.
pub type Result<T> = std::result::Result<T, FramedError>;
