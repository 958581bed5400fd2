// ABOUTME: Stateful per-connection reassembly of length-prefixed messages from byte chunks
// ABOUTME: Alternates a VarSize size-phase and a buffered body-phase, resyncing past oversize bodies

use bytes::{Bytes, BytesMut};

use crate::varsize::VarSize;

/// One outcome of [`FramedDecoder::ingest`] for a single completed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeEvent {
    /// A complete message body, exactly `declared_size` bytes.
    Message(Bytes),
    /// A message whose declared size exceeded `max_message_size`. The body
    /// bytes were consumed and discarded; the stream remains resynchronized.
    TooLong { declared_size: u64 },
    /// A size prefix ran 8 bytes without its completion bit clearing. The
    /// connection is unrecoverable; this fires exactly once per decoder and
    /// every subsequent `ingest` call is a no-op.
    InvalidEncoding,
}

/// Reassembles discrete messages out of arbitrary byte chunks from a stream transport.
///
/// A `FramedDecoder` alternates between a size phase (accumulating a
/// [`VarSize`] prefix) and a body phase (copying payload bytes into an
/// internally owned buffer). [`ingest`](Self::ingest) never suspends: it is a
/// plain synchronous function driven by whatever chunks the caller's
/// transport delivers, and a single call may emit zero, one, or many events.
pub struct FramedDecoder {
    max_message_size: usize,
    pending_size: VarSize,
    offset: usize,
    oversize: bool,
    poisoned: bool,
    buffer: BytesMut,
}

impl FramedDecoder {
    /// Allocate a decoder whose body buffer holds at most `max_message_size` bytes.
    pub fn new(max_message_size: usize) -> Self {
        Self {
            max_message_size,
            pending_size: VarSize::new(),
            offset: 0,
            oversize: false,
            poisoned: false,
            buffer: BytesMut::zeroed(max_message_size),
        }
    }

    pub fn max_message_size(&self) -> usize {
        self.max_message_size
    }

    /// Whether an unterminated size prefix has already poisoned this decoder.
    /// Once `true`, `ingest` is permanently a no-op.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Consume `chunk` left to right, invoking `on_event` once per completed message.
    ///
    /// The size phase and body phase alternate within a single call: a chunk
    /// boundary never forces a partial message to be delivered early, and a
    /// chunk carrying several complete messages back to back delivers all of
    /// them before returning.
    ///
    /// Once a size prefix runs 8 bytes without completing, the decoder is
    /// poisoned: `on_event` is called once with `DecodeEvent::InvalidEncoding`
    /// and every following call (including the rest of the current chunk) is
    /// a no-op, matching the "unrecoverable, stop advancing" policy of
    /// [`crate::FramedError::InvalidEncoding`].
    pub fn ingest(&mut self, chunk: &[u8], on_event: &mut dyn FnMut(DecodeEvent)) {
        if self.poisoned {
            return;
        }

        let mut pos = 0usize;

        loop {
            if !self.pending_size.is_complete() {
                if pos >= chunk.len() {
                    break;
                }
                pos += self.pending_size.add_bytes(&chunk[pos..]);
                if !self.pending_size.is_complete() {
                    if self.pending_size.bytes_count() >= 8 {
                        self.poisoned = true;
                        on_event(DecodeEvent::InvalidEncoding);
                    }
                    // Chunk ran out before the size prefix did (or the
                    // prefix is malformed); wait for more bytes, or stop
                    // entirely if poisoned above.
                    break;
                }

                let declared = self
                    .pending_size
                    .value()
                    .expect("just checked pending_size.is_complete()");
                self.oversize = declared > self.max_message_size as u64;
                self.offset = 0;
                if self.oversize {
                    on_event(DecodeEvent::TooLong {
                        declared_size: declared,
                    });
                }
                // Fall through to the body phase in this same pass: a
                // zero-length message completes with no further chunk bytes.
            }

            let declared = self
                .pending_size
                .value()
                .expect("pending_size.is_complete() holds in the body phase") as usize;
            let remaining_in_message = declared - self.offset;
            let available = chunk.len() - pos;
            let take = remaining_in_message.min(available);

            if !self.oversize {
                self.buffer[self.offset..self.offset + take]
                    .copy_from_slice(&chunk[pos..pos + take]);
            }
            self.offset += take;
            pos += take;

            if self.offset != declared {
                // Body incomplete and the chunk is exhausted; wait for more bytes.
                break;
            }

            if !self.oversize {
                let body = self.buffer.split_to(declared).freeze();
                // Refills the buffer back to max_message_size. `BytesMut`
                // copies rather than mutates in place if `body` (or a clone
                // of it) is still retained elsewhere, giving exactly the
                // "fresh allocation only if retained" reuse policy.
                self.buffer.resize(self.max_message_size, 0);
                on_event(DecodeEvent::Message(body));
            }
            // Oversize messages were already reported once, at size-completion time.
            self.pending_size.reset();
            self.offset = 0;
            self.oversize = false;
        }
    }
}
