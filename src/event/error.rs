//! Errors raised while turning frames into events.

use thiserror::Error;

use super::EventKind;

/// Frame-local decoding failures. Both are recoverable: the frame is skipped
/// and the stream continues.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The frame's context names no known event.
    #[error("unknown event kind `{context}`")]
    UnknownEventKind {
        /// Context discriminator as received.
        context: String,
    },

    /// The payload does not have the shape expected for its kind.
    #[error("malformed `{kind}` payload: {source}")]
    MalformedPayload {
        /// Kind named by the frame.
        kind: EventKind,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}
