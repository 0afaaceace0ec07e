//! Test support for `mbrc`.
//!
//! Provides a loopback [`FakeDesktop`] that speaks the plugin's framing,
//! commands that record or sabotage dispatch, connectors that never reach
//! the network, and a shared `log` capture fixture.

mod commands;
mod connectors;
mod desktop;
mod logging;

use bytes::BytesMut;
pub use commands::{
    FailingCommand,
    PanickingCommand,
    RecordingCommand,
    TestContext,
    test_context,
};
pub use connectors::{RefusingConnector, StalledConnector};
pub use desktop::{DesktopPeer, FakeDesktop, STEP_TIMEOUT};
pub use logging::{LoggerHandle, logger};
use mbrc::frame::{Frame, FrameDecoder};

/// Concatenate the wire encoding of `frames`.
///
/// # Panics
///
/// Panics if a frame cannot be encoded with the default limits.
#[must_use]
pub fn wire(frames: &[Frame]) -> Vec<u8> {
    let encoder = FrameDecoder::default();
    let mut buf = BytesMut::new();
    for frame in frames {
        encoder.encode(frame, &mut buf).expect("encode frame");
    }
    buf.to_vec()
}
