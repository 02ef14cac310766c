//! Protocol error taxonomy.
//!
//! The decode loop has to distinguish "wait for more bytes" from "this
//! message is bad" from "the socket is dead", so every failure mode is an
//! explicit variant rather than a panic or a stringly error. A frame that
//! is merely not fully buffered yet is not an error at all; the framer
//! reports it as [`FrameDecision::Incomplete`](crate::family::FrameDecision).

/// Errors surfaced by the protocol core.
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    /// A typed read ran past the buffered bytes. On a live stream this means
    /// "message not fully received yet" and the caller defers to the next
    /// pump; inside a framed message it means the payload is shorter than
    /// the declared layout.
    #[error("buffer underrun: needed {needed} bytes, {remaining} remaining")]
    BufferUnderrun {
        /// Bytes the read required.
        needed: usize,
        /// Bytes left past the cursor.
        remaining: usize,
    },

    /// A type id with no registered handler. Logged, skipped by its
    /// declared length, never fatal.
    #[error("unknown packet type {0:#06x}")]
    UnknownType(u16),

    /// The transport failed or closed underneath us.
    #[error("connection lost: {0}")]
    ConnectionLost(String),

    /// A declared length is inconsistent with what the framing allows
    /// (below the header minimum, or past the sanity cap).
    #[error("malformed message {id:#06x}: declared length {length}")]
    MalformedMessage {
        /// Offending type id.
        id: u16,
        /// Declared on-wire length.
        length: usize,
    },
}
