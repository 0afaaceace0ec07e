//! Metric helpers for `mbrc`.
//!
//! This module defines metric names and simple helper functions
//! wrapping the [`metrics`](https://docs.rs/metrics) crate. Without the
//! `metrics` feature the helpers compile to nothing.

#[cfg(feature = "metrics")]
use metrics::{counter, gauge};

/// Name of the gauge tracking open connections to the plugin.
pub const CONNECTIONS_ACTIVE: &str = "mbrc_connections_active";
/// Name of the counter tracking processed frames.
pub const FRAMES_PROCESSED: &str = "mbrc_frames_processed_total";
/// Name of the counter tracking inbound frames dropped before dispatch.
pub const FRAMES_SKIPPED: &str = "mbrc_frames_skipped_total";
/// Name of the counter tracking failed or panicking commands.
pub const COMMAND_FAILURES: &str = "mbrc_command_failures_total";
/// Name of the counter tracking scheduled reconnects.
pub const RECONNECTS: &str = "mbrc_reconnects_total";

/// Direction of frame processing.
#[derive(Clone, Copy, Debug)]
pub enum Direction {
    /// Frames received from the plugin.
    Inbound,
    /// Frames written to the plugin.
    Outbound,
}

impl Direction {
    #[cfg_attr(not(feature = "metrics"), allow(dead_code))]
    fn as_str(self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

/// Increment the open connections gauge.
pub fn inc_connections() {
    #[cfg(feature = "metrics")]
    gauge!(CONNECTIONS_ACTIVE).increment(1.0);
}

/// Decrement the open connections gauge.
pub fn dec_connections() {
    #[cfg(feature = "metrics")]
    gauge!(CONNECTIONS_ACTIVE).decrement(1.0);
}

/// Record a processed frame for the given direction.
pub fn inc_frames(direction: Direction) {
    #[cfg(feature = "metrics")]
    counter!(FRAMES_PROCESSED, "direction" => direction.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = direction;
}

/// Record an inbound frame that was not dispatched.
pub fn inc_frames_skipped() {
    #[cfg(feature = "metrics")]
    counter!(FRAMES_SKIPPED).increment(1);
}

/// Record a command that returned an error or panicked.
pub fn inc_command_failures() {
    #[cfg(feature = "metrics")]
    counter!(COMMAND_FAILURES).increment(1);
}

/// Record a scheduled reconnect.
pub fn inc_reconnects() {
    #[cfg(feature = "metrics")]
    counter!(RECONNECTS).increment(1);
}
