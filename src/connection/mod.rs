//! Connection lifecycle towards the desktop plugin.
//!
//! [`ConnectionManager`] owns a background worker that connects, performs
//! the handshake, feeds socket bytes to the
//! [`ProtocolHandler`](crate::protocol::ProtocolHandler), writes queued
//! frames, and reconnects with exponential back-off when the socket fails.
//! Every state change is published through the [`Notifier`].

use std::{future::Future, sync::Arc};

use tokio::{
    sync::{Mutex, Notify, mpsc, watch},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

mod backoff;
mod channels;
mod config;
mod connector;
mod error;
mod state;
mod worker;

pub use backoff::{Backoff, BackoffConfig};
pub use channels::{Intent, IntentSender, Outbox};
pub use config::{ConnectionConfig, DEFAULT_PORT, HandshakeConfig, PROTOCOL_VERSION};
pub use connector::{Connector, TcpConnector, Transport};
pub use error::{ConnectionError, ManagerGone, OutboxError};
pub use state::ConnectionState;
use state::StatusCell;
use worker::Worker;

use crate::{
    command::{CommandContext, CommandRegistry, Session},
    frame::Frame,
    notify::{Notification, Notifier},
    protocol::ProtocolHandler,
};

struct Running {
    shutdown: CancellationToken,
    reset: Arc<Notify>,
    handle: JoinHandle<()>,
}

/// Supervises the connection to one desktop plugin.
///
/// The manager starts stopped. [`start`](Self::start) spawns the worker,
/// [`stop`](Self::stop) cancels it and waits for it to finish, and
/// [`reset`](Self::reset) replaces the current socket without waiting for
/// back-off. Commands reach the manager through [`Intent`]s, which are
/// processed by [`drive`](Self::drive) or [`handle_intent`](Self::handle_intent).
///
/// # Examples
///
/// ```no_run
/// use mbrc::{
///     command::CommandRegistry,
///     connection::{ConnectionConfig, ConnectionManager},
///     notify::Notifier,
/// };
///
/// # async fn run() {
/// let mut manager = ConnectionManager::new(
///     ConnectionConfig::new("192.168.1.20:3000"),
///     CommandRegistry::with_defaults(),
///     Notifier::default(),
/// );
/// let mut notifications = manager.subscribe();
/// manager.start();
/// while let Ok(notification) = notifications.recv().await {
///     println!("{notification:?}");
/// }
/// # }
/// ```
pub struct ConnectionManager {
    config: ConnectionConfig,
    connector: Arc<dyn Connector>,
    registry: Arc<CommandRegistry>,
    notifier: Notifier,
    status: Arc<StatusCell>,
    outbox: Outbox,
    outbound: Arc<Mutex<mpsc::Receiver<Frame>>>,
    intents: IntentSender,
    intents_rx: mpsc::UnboundedReceiver<Intent>,
    session: Arc<Session>,
    running: Option<Running>,
}

impl ConnectionManager {
    /// Manager connecting over TCP to `config.address`.
    #[must_use]
    pub fn new(config: ConnectionConfig, registry: CommandRegistry, notifier: Notifier) -> Self {
        let connector = TcpConnector::new(config.address.clone(), config.nodelay);
        Self::with_connector(config, Arc::new(connector), registry, notifier)
    }

    /// Manager obtaining its transports from `connector`.
    #[must_use]
    pub fn with_connector(
        config: ConnectionConfig,
        connector: Arc<dyn Connector>,
        registry: CommandRegistry,
        notifier: Notifier,
    ) -> Self {
        let config = config.normalized();
        let (outbox, outbound) = Outbox::channel(config.outbound_capacity);
        let (intents, intents_rx) = IntentSender::channel();
        Self {
            status: Arc::new(StatusCell::new(notifier.clone())),
            config,
            connector,
            registry: Arc::new(registry),
            notifier,
            outbox,
            outbound: Arc::new(Mutex::new(outbound)),
            intents,
            intents_rx,
            session: Arc::default(),
            running: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ConnectionConfig { &self.config }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState { self.status.current() }

    /// Receiver that observes every state change.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> { self.status.watch() }

    /// Subscribe to notifications published from now on.
    #[must_use]
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Notification> {
        self.notifier.subscribe()
    }

    #[must_use]
    pub fn notifier(&self) -> &Notifier { &self.notifier }

    /// Handle for queuing frames to the plugin.
    #[must_use]
    pub fn outbox(&self) -> Outbox { self.outbox.clone() }

    /// Handle for raising intents from outside the manager.
    #[must_use]
    pub fn intents(&self) -> IntentSender { self.intents.clone() }

    /// Protocol version announced by the plugin on the current connection.
    #[must_use]
    pub fn peer_protocol(&self) -> Option<u32> { self.session.peer_protocol() }

    /// Returns `true` while a worker is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|running| !running.handle.is_finished())
    }

    /// Start connecting. Does nothing if already running.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }
        let shutdown = CancellationToken::new();
        let reset = Arc::new(Notify::new());
        let ctx = CommandContext::new(
            self.notifier.clone(),
            self.outbox.clone(),
            self.intents.clone(),
            Arc::clone(&self.session),
        );
        let worker = Worker {
            handler: ProtocolHandler::new(
                Arc::clone(&self.registry),
                ctx,
                self.config.max_frame_length,
            ),
            config: self.config.clone(),
            connector: Arc::clone(&self.connector),
            status: Arc::clone(&self.status),
            notifier: self.notifier.clone(),
            outbound: Arc::clone(&self.outbound),
            session: Arc::clone(&self.session),
            reset: Arc::clone(&reset),
            shutdown: shutdown.clone(),
        };

        self.status.transition(ConnectionState::Connecting);
        let handle = tokio::spawn(worker.run());
        self.running = Some(Running {
            shutdown,
            reset,
            handle,
        });
    }

    /// Stop the worker and wait for it to exit.
    ///
    /// Interrupts a pending connect, read, write or back-off sleep. The
    /// manager stays disconnected until the next [`start`](Self::start).
    pub async fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            running.shutdown.cancel();
            if let Err(err) = running.handle.await {
                log::error!("connection worker failed: error={err}");
            }
        }
        self.status.transition(ConnectionState::Disconnected);
    }

    /// Drop the current socket and reconnect at once, starting the
    /// back-off schedule over. Starts the worker if it is not running.
    pub fn reset(&mut self) {
        match &self.running {
            Some(running) if !running.handle.is_finished() => running.reset.notify_one(),
            _ => self.start(),
        }
    }

    /// Apply `intent`.
    pub async fn handle_intent(&mut self, intent: Intent) {
        tracing::debug!(?intent, "handling intent");
        match intent {
            Intent::Start => self.start(),
            Intent::Stop => self.stop().await,
            Intent::Reset => self.reset(),
        }
    }

    /// Wait for the next intent raised through an [`IntentSender`].
    pub async fn next_intent(&mut self) -> Option<Intent> { self.intents_rx.recv().await }

    /// Process intents until `shutdown` completes, then stop.
    pub async fn drive<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                biased;
                () = &mut shutdown => break,
                Some(intent) = self.intents_rx.recv() => self.handle_intent(intent).await,
            }
        }
        self.stop().await;
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        if let Some(running) = &self.running {
            running.shutdown.cancel();
        }
    }
}
