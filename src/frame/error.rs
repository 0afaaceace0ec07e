//! Errors raised while splitting the byte stream into frames.

use std::io;

use thiserror::Error;

/// Framing-level failures.
///
/// A frame that is merely incomplete is not an error: the decoder keeps the
/// bytes and waits for more. Only conditions that cannot be fixed by reading
/// further are reported here.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Declared body length exceeds the configured maximum. Buffered bytes
    /// for the stream are discarded when this is reported.
    #[error("frame exceeds max length: {size} > {max}")]
    TooLarge {
        /// Body length announced by the prefix.
        size: usize,
        /// Maximum body length accepted by the decoder.
        max: usize,
    },

    /// The body was delimited correctly but its header could not be read.
    /// The frame's bytes are consumed so the stream stays aligned.
    #[error("malformed frame header: {reason}")]
    MalformedHeader {
        /// What was wrong with the header.
        reason: &'static str,
    },

    /// Context discriminator longer than the one-byte length field allows.
    #[error("frame context is {len} bytes; at most 255 are allowed")]
    ContextTooLong {
        /// Length of the rejected context.
        len: usize,
    },

    /// The stream ended with an unfinished frame in the buffer.
    #[error("stream ended mid-frame: {bytes_received} bytes buffered")]
    TruncatedAtEof {
        /// Bytes left in the buffer at EOF, prefix included.
        bytes_received: usize,
        /// Body length announced by the prefix, when the prefix was complete.
        expected: Option<usize>,
    },

    /// Transport failure surfaced through the codec.
    #[error("transport error: {0}")]
    Io(#[from] io::Error),
}

impl FrameError {
    /// Returns `true` when the connection cannot continue after this error.
    ///
    /// Malformed headers only cost the offending frame; everything else
    /// leaves the stream in an unknown position.
    #[must_use]
    pub fn is_fatal(&self) -> bool { !matches!(self, Self::MalformedHeader { .. }) }
}
