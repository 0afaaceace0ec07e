//! Payload shapes carried by the desktop plugin's messages.

use serde::{Deserialize, Serialize};

/// Metadata of the track currently playing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub artist: String,
    pub title: String,
    pub album: String,
    pub year: String,
    #[serde(default)]
    pub path: String,
}

/// Cover art update. `cover` holds base64 image data when `status` reports
/// that a cover is available.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverPayload {
    pub status: u16,
    #[serde(default)]
    pub cover: String,
}

/// Lyrics update for the current track.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricsPayload {
    pub status: u16,
    #[serde(default)]
    pub lyrics: String,
}

/// Playback position in milliseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub current: i64,
    pub total: i64,
}

/// Result of moving an entry in the now-playing list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMoved {
    pub from: i32,
    pub to: i32,
    pub success: bool,
}

/// Result of removing an entry from the now-playing list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRemoved {
    pub index: i32,
    pub success: bool,
}

/// Star rating as sent by the player. An empty string means unrated.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rating(pub String);

impl Rating {
    /// Numeric rating, or `None` when unrated or unparsable.
    #[must_use]
    pub fn value(&self) -> Option<f32> { self.0.trim().parse().ok() }
}

/// Last.fm love status of the current track.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LfmRating {
    Love,
    Ban,
    #[default]
    Normal,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayState {
    Playing,
    Paused,
    Stopped,
    #[default]
    #[serde(other)]
    Undefined,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    #[default]
    None,
    All,
    One,
}

/// Shuffle setting. Older plugins send a plain boolean, newer ones name the
/// mode; both are accepted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "ShuffleWire")]
pub enum ShuffleMode {
    #[default]
    Off,
    Shuffle,
    AutoDj,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ShuffleWire {
    Flag(bool),
    Name(ShuffleName),
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum ShuffleName {
    Off,
    Shuffle,
    AutoDj,
}

impl From<ShuffleWire> for ShuffleMode {
    fn from(value: ShuffleWire) -> Self {
        match value {
            ShuffleWire::Flag(true) | ShuffleWire::Name(ShuffleName::Shuffle) => Self::Shuffle,
            ShuffleWire::Flag(false) | ShuffleWire::Name(ShuffleName::Off) => Self::Off,
            ShuffleWire::Name(ShuffleName::AutoDj) => Self::AutoDj,
        }
    }
}

/// Snapshot of the player sent after the handshake and on request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStatus {
    #[serde(rename = "playermute")]
    pub mute: bool,
    #[serde(rename = "playerrepeat")]
    pub repeat: RepeatMode,
    #[serde(rename = "playershuffle")]
    pub shuffle: ShuffleMode,
    pub scrobbler: bool,
    #[serde(rename = "playerstate")]
    pub state: PlayState,
    #[serde(rename = "playervolume")]
    pub volume: u8,
}

/// Body of the `protocol` handshake frame sent by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolRequest {
    pub protocol_version: u32,
    pub no_broadcast: bool,
}
