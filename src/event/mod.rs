//! Typed events decoded from frames.
//!
//! [`EventRouter`] classifies a [`Frame`] by its context discriminator and
//! parses the JSON payload into the matching [`Event`] variant. Decoding has
//! no side effects; dispatching the event is left to
//! [`ProtocolHandler`](crate::protocol::ProtocolHandler).

use std::fmt;

use crate::frame::Frame;

mod error;
pub mod payload;

pub use error::DecodeError;
use payload::{
    CoverPayload,
    LfmRating,
    LyricsPayload,
    PlayState,
    PlayerStatus,
    Position,
    Rating,
    RepeatMode,
    ShuffleMode,
    TrackInfo,
    TrackMoved,
    TrackRemoved,
};

fn parse_json<T: serde::de::DeserializeOwned>(payload: &[u8]) -> Result<T, serde_json::Error> {
    // The plugin sends an empty body where it has no data.
    let payload = if payload.is_empty() { b"null".as_slice() } else { payload };
    serde_json::from_slice(payload)
}

macro_rules! events {
    (
        units { $( $(#[$umeta:meta])* $unit:ident => $uctx:literal, )* }
        data { $( $(#[$dmeta:meta])* $variant:ident($ty:ty) => $ctx:literal, )* }
    ) => {
        /// Discriminator of an [`Event`], used as the command registry key.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum EventKind {
            $( $unit, )*
            $( $variant, )*
        }

        impl EventKind {
            /// Every known kind, in declaration order.
            pub const ALL: &'static [EventKind] = &[
                $( EventKind::$unit, )*
                $( EventKind::$variant, )*
            ];

            /// Wire context string for this kind.
            #[must_use]
            pub const fn context(self) -> &'static str {
                match self {
                    $( Self::$unit => $uctx, )*
                    $( Self::$variant => $ctx, )*
                }
            }

            /// Look up the kind named by a wire context string.
            #[must_use]
            pub fn from_context(context: &str) -> Option<Self> {
                match context {
                    $( $uctx => Some(Self::$unit), )*
                    $( $ctx => Some(Self::$variant), )*
                    _ => None,
                }
            }
        }

        /// Decoded protocol message.
        #[derive(Clone, Debug, PartialEq, Eq)]
        pub enum Event {
            $( $(#[$umeta])* $unit, )*
            $( $(#[$dmeta])* $variant($ty), )*
        }

        impl Event {
            /// Kind of this event.
            #[must_use]
            pub fn kind(&self) -> EventKind {
                match self {
                    $( Self::$unit => EventKind::$unit, )*
                    $( Self::$variant(_) => EventKind::$variant, )*
                }
            }

            fn from_payload(kind: EventKind, payload: &[u8]) -> Result<Self, serde_json::Error> {
                match kind {
                    $( EventKind::$unit => Ok(Self::$unit), )*
                    $( EventKind::$variant => parse_json(payload).map(Self::$variant), )*
                }
            }

            fn to_payload(&self) -> Result<Vec<u8>, serde_json::Error> {
                match self {
                    $( Self::$unit => Ok(Vec::new()), )*
                    $( Self::$variant(data) => serde_json::to_vec(data), )*
                }
            }
        }
    };
}

events! {
    units {
        /// Keep-alive probe from the plugin; answered with `pong`.
        Ping => "ping",
        /// Answer to a client `ping`.
        Pong => "pong",
    }
    data {
        NowPlayingCover(CoverPayload) => "nowplayingcover",
        NowPlayingLfmRating(LfmRating) => "nowplayinglfmrating",
        NowPlayingListMove(TrackMoved) => "nowplayinglistmove",
        NowPlayingListRemove(TrackRemoved) => "nowplayinglistremove",
        /// Acknowledges a request to play a now-playing entry.
        NowPlayingListPlay(bool) => "nowplayinglistplay",
        NowPlayingLyrics(LyricsPayload) => "nowplayinglyrics",
        NowPlayingPosition(Position) => "nowplayingposition",
        NowPlayingRating(Rating) => "nowplayingrating",
        NowPlayingTrack(TrackInfo) => "nowplayingtrack",
        PlayerMute(bool) => "playermute",
        PlayerNext(bool) => "playernext",
        PlayerPrevious(bool) => "playerprevious",
        PlayerRepeat(RepeatMode) => "playerrepeat",
        PlayerScrobble(bool) => "scrobbler",
        PlayerShuffle(ShuffleMode) => "playershuffle",
        PlayerState(PlayState) => "playerstate",
        PlayerStatus(PlayerStatus) => "playerstatus",
        PlayerVolume(u8) => "playervolume",
        PluginVersion(String) => "pluginversion",
        /// Protocol version announced by the plugin in reply to the
        /// client handshake.
        ProtocolTag(u32) => "protocol",
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.context()) }
}

impl Event {
    /// Encode this event as the frame the plugin would send for it.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be serialised.
    ///
    /// # Examples
    ///
    /// ```
    /// use mbrc::event::{Event, EventRouter};
    ///
    /// let frame = Event::PlayerVolume(80).to_frame().expect("encode volume");
    /// assert_eq!(frame.context(), "playervolume");
    /// assert_eq!(
    ///     EventRouter.decode(&frame).expect("decode volume"),
    ///     Event::PlayerVolume(80)
    /// );
    /// ```
    pub fn to_frame(&self) -> Result<Frame, serde_json::Error> {
        Ok(Frame::new(self.kind().context(), self.to_payload()?))
    }
}

/// Maps frames to typed events.
#[derive(Clone, Copy, Debug, Default)]
pub struct EventRouter;

impl EventRouter {
    /// Resolve the event kind named by `frame`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::UnknownEventKind`] for unrecognised contexts.
    pub fn classify(&self, frame: &Frame) -> Result<EventKind, DecodeError> {
        EventKind::from_context(frame.context()).ok_or_else(|| DecodeError::UnknownEventKind {
            context: frame.context().to_owned(),
        })
    }

    /// Decode `frame` into an [`Event`].
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::UnknownEventKind`] when the context is not
    /// known and [`DecodeError::MalformedPayload`] when the payload does not
    /// parse as the kind's shape.
    pub fn decode(&self, frame: &Frame) -> Result<Event, DecodeError> {
        let kind = self.classify(frame)?;
        Event::from_payload(kind, frame.payload())
            .map_err(|source| DecodeError::MalformedPayload { kind, source })
    }
}

#[cfg(test)]
mod tests;
