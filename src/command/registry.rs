//! Kind-keyed table of commands.

use std::{collections::HashMap, fmt, sync::Arc};

use super::{
    Command,
    builtin::{LogOnly, PingReply, ProtocolVersionUpdate, PublishEvent},
};
use crate::event::EventKind;

/// Maps each [`EventKind`] to at most one [`Command`].
///
/// The registry is filled before the connection starts and then shared
/// read-only behind an [`Arc`].
///
/// # Examples
///
/// ```
/// use mbrc::{
///     command::{CommandContext, CommandError, CommandRegistry},
///     event::{Event, EventKind},
/// };
///
/// let registry = CommandRegistry::new().with(
///     EventKind::PlayerVolume,
///     |event: &Event, _ctx: &CommandContext| -> Result<(), CommandError> {
///         println!("{event:?}");
///         Ok(())
///     },
/// );
/// assert!(registry.contains(EventKind::PlayerVolume));
/// assert!(registry.lookup(EventKind::Ping).is_none());
/// ```
#[derive(Clone, Default)]
pub struct CommandRegistry {
    commands: HashMap<EventKind, Arc<dyn Command>>,
}

impl CommandRegistry {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Registry wired with the built-in commands.
    ///
    /// State updates are republished to subscribers, `ping` is answered
    /// with `pong`, and `protocol`/`pong` replies activate the session.
    /// Acknowledgements without state (`nowplayinglistplay`, `playernext`,
    /// `playerprevious`) are only logged.
    #[must_use]
    pub fn with_defaults() -> Self {
        let publish: Arc<dyn Command> = Arc::new(PublishEvent);
        let log_only: Arc<dyn Command> = Arc::new(LogOnly);
        let protocol: Arc<dyn Command> = Arc::new(ProtocolVersionUpdate);

        let mut registry = Self::new();
        for kind in [
            EventKind::NowPlayingCover,
            EventKind::NowPlayingLfmRating,
            EventKind::NowPlayingListMove,
            EventKind::NowPlayingListRemove,
            EventKind::NowPlayingLyrics,
            EventKind::NowPlayingPosition,
            EventKind::NowPlayingRating,
            EventKind::NowPlayingTrack,
            EventKind::PlayerMute,
            EventKind::PlayerRepeat,
            EventKind::PlayerScrobble,
            EventKind::PlayerShuffle,
            EventKind::PlayerState,
            EventKind::PlayerStatus,
            EventKind::PlayerVolume,
            EventKind::PluginVersion,
        ] {
            registry.register_shared(kind, Arc::clone(&publish));
        }
        for kind in [
            EventKind::NowPlayingListPlay,
            EventKind::PlayerNext,
            EventKind::PlayerPrevious,
        ] {
            registry.register_shared(kind, Arc::clone(&log_only));
        }
        registry.register_shared(EventKind::ProtocolTag, Arc::clone(&protocol));
        registry.register_shared(EventKind::Pong, protocol);
        registry.register(EventKind::Ping, PingReply);
        registry
    }

    /// Bind `command` to `kind`, replacing any previous binding.
    pub fn register<C: Command>(&mut self, kind: EventKind, command: C) {
        self.register_shared(kind, Arc::new(command));
    }

    /// Bind an already shared command to `kind`.
    pub fn register_shared(&mut self, kind: EventKind, command: Arc<dyn Command>) {
        if self.commands.insert(kind, command).is_some() {
            log::warn!("command replaced: kind={kind}");
        }
    }

    /// Builder form of [`register`](Self::register).
    #[must_use]
    pub fn with<C: Command>(mut self, kind: EventKind, command: C) -> Self {
        self.register(kind, command);
        self
    }

    /// Command bound to `kind`, if any.
    #[must_use]
    pub fn lookup(&self, kind: EventKind) -> Option<&Arc<dyn Command>> { self.commands.get(&kind) }

    #[must_use]
    pub fn contains(&self, kind: EventKind) -> bool { self.commands.contains_key(&kind) }

    #[must_use]
    pub fn len(&self) -> usize { self.commands.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.commands.is_empty() }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.commands.keys().copied().collect();
        kinds.sort_unstable();
        f.debug_struct("CommandRegistry")
            .field("kinds", &kinds)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use mbrc_testing::logger;

    use super::*;
    use crate::{
        command::{CommandContext, CommandError},
        event::Event,
    };

    fn noop(_: &Event, _: &CommandContext) -> Result<(), CommandError> { Ok(()) }

    #[test]
    fn lookup_of_unregistered_kind_is_none() {
        let registry = CommandRegistry::new();
        assert!(registry.is_empty());
        for &kind in EventKind::ALL {
            assert!(registry.lookup(kind).is_none());
        }
    }

    #[test]
    fn reregistration_overwrites_and_warns() {
        static SECOND: AtomicUsize = AtomicUsize::new(0);
        let mut log = logger();
        log.clear();

        let mut registry = CommandRegistry::new().with(EventKind::PlayerMute, noop);
        registry.register(
            EventKind::PlayerMute,
            |_: &Event, _: &CommandContext| -> Result<(), CommandError> {
                SECOND.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        );
        assert_eq!(registry.len(), 1);

        let (outbox, _rx) = crate::connection::Outbox::channel(1);
        let (intents, _intents_rx) = crate::connection::IntentSender::channel();
        let ctx = CommandContext::new(
            crate::notify::Notifier::default(),
            outbox,
            intents,
            Arc::default(),
        );
        registry
            .lookup(EventKind::PlayerMute)
            .expect("command registered")
            .execute(&Event::PlayerMute(true), &ctx)
            .expect("command runs");
        assert_eq!(SECOND.load(Ordering::SeqCst), 1);

        let mut found = false;
        while let Some(record) = log.pop() {
            let message = record.args().to_string();
            if message.contains("command replaced") && message.contains("kind=playermute") {
                found = true;
                break;
            }
        }
        assert!(found, "expected replacement warning");
    }

    #[test]
    fn defaults_cover_every_known_kind() {
        let registry = CommandRegistry::with_defaults();
        for &kind in EventKind::ALL {
            assert!(registry.contains(kind), "no default command for {kind}");
        }
        assert_eq!(registry.len(), EventKind::ALL.len());
    }
}
