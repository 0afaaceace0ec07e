//! Commands installed by [`CommandRegistry::with_defaults`](super::CommandRegistry::with_defaults).

use super::{Command, CommandContext, CommandError};
use crate::{event::Event, frame::Frame, notify::Notification};

/// Republishes the event to notification subscribers.
#[derive(Clone, Copy, Debug, Default)]
pub struct PublishEvent;

impl Command for PublishEvent {
    fn execute(&self, event: &Event, ctx: &CommandContext) -> Result<(), CommandError> {
        ctx.publish(Notification::Event(event.clone()));
        Ok(())
    }
}

/// Answers a `ping` with an empty `pong` frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct PingReply;

impl Command for PingReply {
    fn execute(&self, _event: &Event, ctx: &CommandContext) -> Result<(), CommandError> {
        ctx.send(Frame::new("pong", &b""[..]))
    }
}

/// Records the plugin's protocol version and marks the session active.
///
/// A `pong` counts as a handshake reply too: older plugins answer the
/// client's `protocol` frame with it.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProtocolVersionUpdate;

impl Command for ProtocolVersionUpdate {
    fn execute(&self, event: &Event, ctx: &CommandContext) -> Result<(), CommandError> {
        if let Event::ProtocolTag(version) = event {
            tracing::debug!(version, "peer protocol version");
            ctx.session().set_peer_protocol(*version);
            ctx.publish(Notification::Event(event.clone()));
        }
        ctx.activate();
        Ok(())
    }
}

/// Logs the event at debug level and does nothing else.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogOnly;

impl Command for LogOnly {
    fn execute(&self, event: &Event, _ctx: &CommandContext) -> Result<(), CommandError> {
        tracing::debug!(kind = %event.kind(), ?event, "event acknowledged");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rstest::{fixture, rstest};
    use tokio::sync::mpsc;

    use super::*;
    use crate::{
        command::Session,
        connection::{IntentSender, Outbox},
        event::payload::PlayState,
        notify::Notifier,
    };

    struct Harness {
        ctx: CommandContext,
        notifier: Notifier,
        session: Arc<Session>,
        outbound: mpsc::Receiver<Frame>,
    }

    #[fixture]
    fn harness() -> Harness {
        let notifier = Notifier::default();
        let session = Arc::new(Session::default());
        let (outbox, outbound) = Outbox::channel(4);
        let (intents, _rx) = IntentSender::channel();
        Harness {
            ctx: CommandContext::new(notifier.clone(), outbox, intents, Arc::clone(&session)),
            notifier,
            session,
            outbound,
        }
    }

    #[rstest]
    fn publish_event_forwards_to_subscribers(harness: Harness) {
        let mut rx = harness.notifier.subscribe();
        let event = Event::PlayerState(PlayState::Playing);
        PublishEvent
            .execute(&event, &harness.ctx)
            .expect("publish succeeds");
        assert_eq!(rx.try_recv().expect("notification"), Notification::Event(event));
    }

    #[rstest]
    fn ping_is_answered_with_pong(mut harness: Harness) {
        PingReply
            .execute(&Event::Ping, &harness.ctx)
            .expect("reply queued");
        let frame = harness.outbound.try_recv().expect("pong queued");
        assert_eq!(frame.context(), "pong");
        assert!(frame.payload().is_empty());
    }

    #[rstest]
    #[case::protocol(Event::ProtocolTag(4), Some(4))]
    #[case::pong(Event::Pong, None)]
    fn handshake_replies_activate_the_session(
        harness: Harness,
        #[case] event: Event,
        #[case] version: Option<u32>,
    ) {
        ProtocolVersionUpdate
            .execute(&event, &harness.ctx)
            .expect("update succeeds");
        assert!(harness.session.take_activation_request());
        assert_eq!(harness.session.peer_protocol(), version);
    }

    #[rstest]
    fn log_only_has_no_side_effects(mut harness: Harness) {
        let mut rx = harness.notifier.subscribe();
        LogOnly
            .execute(&Event::PlayerNext(true), &harness.ctx)
            .expect("log succeeds");
        assert!(rx.try_recv().is_err());
        assert!(harness.outbound.try_recv().is_err());
        assert!(!harness.session.take_activation_request());
    }
}
