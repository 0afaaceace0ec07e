//! Connection configuration.

use std::time::Duration;

use super::BackoffConfig;
use crate::{
    event::payload::ProtocolRequest,
    frame::{DEFAULT_MAX_FRAME_LENGTH, Frame, clamp_frame_length},
};

/// Default port the desktop plugin listens on.
pub const DEFAULT_PORT: u16 = 3000;

/// Protocol version announced in the handshake.
pub const PROTOCOL_VERSION: u32 = 4;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_READ_BUFFER_SIZE: usize = 8 * 1024;
const DEFAULT_OUTBOUND_CAPACITY: usize = 64;

/// Frames sent right after the socket connects.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandshakeConfig {
    /// Name announced in the `player` frame.
    pub client_name: String,
    /// Version announced in the `protocol` frame.
    pub protocol_version: u32,
    /// Ask the plugin not to broadcast updates to this client.
    pub no_broadcast: bool,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            client_name: "Android".to_owned(),
            protocol_version: PROTOCOL_VERSION,
            no_broadcast: false,
        }
    }
}

impl HandshakeConfig {
    /// The `player` and `protocol` frames, in the order they are sent.
    ///
    /// # Errors
    ///
    /// Returns an error if a payload cannot be serialised.
    pub fn frames(&self) -> Result<[Frame; 2], serde_json::Error> {
        Ok([
            Frame::json("player", &self.client_name)?,
            Frame::json(
                "protocol",
                &ProtocolRequest {
                    protocol_version: self.protocol_version,
                    no_broadcast: self.no_broadcast,
                },
            )?,
        ])
    }
}

/// Settings for [`ConnectionManager`](super::ConnectionManager).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use mbrc::connection::ConnectionConfig;
///
/// let config = ConnectionConfig::new("192.168.1.20:3000")
///     .connect_timeout(Duration::from_secs(3))
///     .without_handshake();
/// assert_eq!(config.address, "192.168.1.20:3000");
/// assert!(config.handshake.is_none());
/// ```
#[derive(Clone, Debug)]
pub struct ConnectionConfig {
    /// `host:port` of the desktop plugin.
    pub address: String,
    /// Upper bound for a single connect attempt.
    pub connect_timeout: Duration,
    pub backoff: BackoffConfig,
    /// Largest frame body accepted or sent.
    pub max_frame_length: usize,
    /// Size of the buffer used for each socket read.
    pub read_buffer_size: usize,
    /// Frames that may wait in the outbox before senders see backpressure.
    pub outbound_capacity: usize,
    /// Set `TCP_NODELAY` on connected sockets.
    pub nodelay: bool,
    /// Handshake sent on every connect; `None` disables it.
    pub handshake: Option<HandshakeConfig>,
}

impl ConnectionConfig {
    /// Configuration with defaults for everything but the address.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            backoff: BackoffConfig::default(),
            max_frame_length: DEFAULT_MAX_FRAME_LENGTH,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
            nodelay: true,
            handshake: Some(HandshakeConfig::default()),
        }
    }

    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub fn backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }

    #[must_use]
    pub fn max_frame_length(mut self, length: usize) -> Self {
        self.max_frame_length = length;
        self
    }

    #[must_use]
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    #[must_use]
    pub fn outbound_capacity(mut self, capacity: usize) -> Self {
        self.outbound_capacity = capacity;
        self
    }

    #[must_use]
    pub fn nodelay(mut self, enabled: bool) -> Self {
        self.nodelay = enabled;
        self
    }

    #[must_use]
    pub fn handshake(mut self, handshake: HandshakeConfig) -> Self {
        self.handshake = Some(handshake);
        self
    }

    #[must_use]
    pub fn without_handshake(mut self) -> Self {
        self.handshake = None;
        self
    }

    /// Clamp every field to a usable value.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.connect_timeout = self.connect_timeout.max(Duration::from_millis(1));
        self.backoff = self.backoff.normalized();
        self.max_frame_length = clamp_frame_length(self.max_frame_length);
        self.read_buffer_size = self.read_buffer_size.max(1);
        self.outbound_capacity = self.outbound_capacity.max(1);
        self
    }
}
