//! Wire frames and the length-prefixed decoder that extracts them.
//!
//! Every frame on the wire is a 4-byte big-endian body length followed by
//! the body. The body starts with a one-byte context length, the UTF-8
//! context discriminator, and finally the JSON payload:
//!
//! ```text
//! +-----------+---------+-------------------+------------------+
//! | len: u32  | ctx: u8 | context (ctx B)   | payload (JSON)   |
//! +-----------+---------+-------------------+------------------+
//! ```

use bytes::Bytes;
use serde::Serialize;

mod decoder;
mod error;

pub use decoder::{FrameCodec, FrameDecoder, Frames};
pub use error::FrameError;

/// Size of the length prefix in bytes.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Smallest accepted maximum body length.
///
/// Frame lengths passed to [`FrameDecoder::new`] are clamped to at least this
/// value so a handshake frame always fits.
pub const MIN_FRAME_LENGTH: usize = 64;

/// Largest accepted maximum body length (16 MiB).
pub const MAX_FRAME_LENGTH: usize = 16 * 1024 * 1024;

/// Default maximum body length (1 MiB). Cover art is the largest payload the
/// desktop plugin sends and stays well below this.
pub const DEFAULT_MAX_FRAME_LENGTH: usize = 1024 * 1024;

pub(crate) fn clamp_frame_length(value: usize) -> usize {
    value.clamp(MIN_FRAME_LENGTH, MAX_FRAME_LENGTH)
}

/// One complete, self-delimited protocol message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    context: String,
    payload: Bytes,
}

impl Frame {
    /// Build a frame from a context discriminator and raw payload bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use mbrc::frame::Frame;
    ///
    /// let frame = Frame::new("playervolume", &b"42"[..]);
    /// assert_eq!(frame.context(), "playervolume");
    /// assert_eq!(frame.payload(), b"42");
    /// ```
    pub fn new(context: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            context: context.into(),
            payload: payload.into(),
        }
    }

    /// Build a frame whose payload is the JSON encoding of `data`.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` cannot be serialised to JSON.
    pub fn json<T: Serialize + ?Sized>(
        context: impl Into<String>,
        data: &T,
    ) -> Result<Self, serde_json::Error> {
        let payload = serde_json::to_vec(data)?;
        Ok(Self::new(context, payload))
    }

    /// Context discriminator naming the message kind.
    #[must_use]
    pub fn context(&self) -> &str { &self.context }

    /// Raw payload bytes following the context.
    #[must_use]
    pub fn payload(&self) -> &[u8] { &self.payload }

    /// Body length as written after the length prefix.
    #[must_use]
    pub fn body_len(&self) -> usize { 1 + self.context.len() + self.payload.len() }

    /// Split the frame into its context and payload.
    #[must_use]
    pub fn into_parts(self) -> (String, Bytes) { (self.context, self.payload) }
}

#[cfg(test)]
mod tests;
