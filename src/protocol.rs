//! Inbound pipeline: bytes to frames to events to commands.
//!
//! [`ProtocolHandler::answer_processor`] is the single entry point for
//! bytes read from the socket. Frames are decoded, classified and
//! dispatched in arrival order; a frame that cannot be decoded or has no
//! command is logged and skipped, and a failing command never stops the
//! frames behind it. Only an oversized frame poisons the stream.

use std::sync::Arc;

use thiserror::Error;

use crate::{
    command::{CommandContext, CommandRegistry, execute_isolated},
    event::{DecodeError, EventRouter},
    frame::{Frame, FrameDecoder, FrameError},
    metrics::{self, Direction},
};

/// Failures that make the inbound stream unusable.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A frame announced a body larger than the configured maximum.
    #[error("frame of {size} bytes exceeds maximum of {max}")]
    FrameTooLarge {
        /// Body length announced by the length prefix.
        size: usize,
        /// Configured maximum body length.
        max: usize,
    },
    /// Any other unrecoverable framing failure.
    #[error(transparent)]
    Framing(FrameError),
}

impl From<FrameError> for ProtocolError {
    fn from(value: FrameError) -> Self {
        match value {
            FrameError::TooLarge { size, max } => Self::FrameTooLarge { size, max },
            other => Self::Framing(other),
        }
    }
}

/// What happened to the frames of one chunk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IngestSummary {
    /// Complete frames extracted.
    pub frames: usize,
    /// Frames whose command ran to completion.
    pub dispatched: usize,
    /// Frames dropped before reaching a command.
    pub skipped: usize,
    /// Frames whose command returned an error or panicked.
    pub failed: usize,
}

/// Owns the frame decoder of one connection and drives command dispatch.
pub struct ProtocolHandler {
    decoder: FrameDecoder,
    router: EventRouter,
    registry: Arc<CommandRegistry>,
    ctx: CommandContext,
}

impl ProtocolHandler {
    /// Create a handler that dispatches through `registry` with `ctx`,
    /// rejecting frames whose body exceeds `max_frame_length`.
    #[must_use]
    pub fn new(registry: Arc<CommandRegistry>, ctx: CommandContext, max_frame_length: usize) -> Self {
        Self {
            decoder: FrameDecoder::new(max_frame_length),
            router: EventRouter,
            registry,
            ctx,
        }
    }

    /// Feed a chunk of socket bytes and run the command of every frame it
    /// completes, in order.
    ///
    /// Bytes of an unfinished frame stay buffered for the next call.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::FrameTooLarge`] when a frame exceeds the
    /// maximum length. The buffered bytes are discarded and the connection
    /// should be dropped.
    pub fn answer_processor(&mut self, chunk: &[u8]) -> Result<IngestSummary, ProtocolError> {
        let mut summary = IngestSummary::default();
        for result in self.decoder.feed(chunk) {
            match result {
                Ok(frame) => {
                    summary.frames += 1;
                    metrics::inc_frames(Direction::Inbound);
                    dispatch(&self.router, &self.registry, &self.ctx, &frame, &mut summary);
                }
                Err(err) if err.is_fatal() => {
                    log::error!("dropping inbound stream: error={err}");
                    return Err(err.into());
                }
                Err(err) => {
                    log::warn!("skipping frame: error={err}");
                    metrics::inc_frames_skipped();
                    summary.skipped += 1;
                }
            }
        }
        Ok(summary)
    }

    /// Discard buffered bytes; used when a new socket replaces the old one.
    pub fn reset(&mut self) { self.decoder.reset(); }

    #[must_use]
    pub fn context(&self) -> &CommandContext { &self.ctx }

    #[must_use]
    pub fn buffered_len(&self) -> usize { self.decoder.buffered_len() }

    #[must_use]
    pub fn max_frame_length(&self) -> usize { self.decoder.max_frame_length() }
}

fn dispatch(
    router: &EventRouter,
    registry: &CommandRegistry,
    ctx: &CommandContext,
    frame: &Frame,
    summary: &mut IngestSummary,
) {
    let event = match router.decode(frame) {
        Ok(event) => event,
        Err(err) => {
            match &err {
                DecodeError::UnknownEventKind { context } => {
                    log::debug!("ignoring frame: context={context}");
                }
                DecodeError::MalformedPayload { .. } => {
                    log::warn!("failed to decode event: context={}, error={err}", frame.context());
                }
            }
            metrics::inc_frames_skipped();
            summary.skipped += 1;
            return;
        }
    };

    let Some(command) = registry.lookup(event.kind()) else {
        log::debug!("no command registered: kind={}", event.kind());
        metrics::inc_frames_skipped();
        summary.skipped += 1;
        return;
    };

    match execute_isolated(command.as_ref(), &event, ctx) {
        Ok(()) => summary.dispatched += 1,
        Err(err) => {
            log::warn!("command failed: kind={}, error={err}", event.kind());
            metrics::inc_command_failures();
            summary.failed += 1;
        }
    }
}
