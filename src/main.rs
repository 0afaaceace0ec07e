//! Connects to a desktop plugin and logs what it sends.
//!
//! Runs until interrupted with Ctrl-C.

mod cli;

use std::time::Duration;

use clap::Parser;
use mbrc::{
    command::CommandRegistry,
    connection::{ConnectionConfig, ConnectionManager, HandshakeConfig},
    notify::{Notification, Notifier},
};
use tokio::sync::broadcast::error::RecvError;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Applications embedding the library should install their own subscriber.
    tracing_subscriber::fmt::init();

    let cli = cli::Cli::parse();

    #[cfg(feature = "metrics")]
    if let Some(listen) = cli.metrics_listen {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(listen)
            .install()?;
        tracing::info!(%listen, "serving metrics");
    }
    #[cfg(not(feature = "metrics"))]
    if cli.metrics_listen.is_some() {
        tracing::warn!("built without the metrics feature; ignoring --metrics-listen");
    }

    let mut config = ConnectionConfig::new(cli.address())
        .connect_timeout(Duration::from_millis(cli.connect_timeout_ms))
        .max_frame_length(cli.max_frame_length);
    config = if cli.no_handshake {
        config.without_handshake()
    } else {
        config.handshake(HandshakeConfig {
            client_name: cli.client_name.clone(),
            ..HandshakeConfig::default()
        })
    };

    let notifier = Notifier::default();
    let mut notifications = notifier.subscribe();
    tokio::spawn(async move {
        loop {
            match notifications.recv().await {
                Ok(Notification::Status(change)) => {
                    tracing::info!(from = %change.previous, to = %change.current, "status");
                }
                Ok(Notification::ReconnectScheduled { attempt, delay }) => {
                    tracing::info!(attempt, ?delay, "reconnecting");
                }
                Ok(Notification::Event(event)) => tracing::info!(kind = %event.kind(), ?event),
                Err(RecvError::Lagged(missed)) => tracing::warn!(missed, "notifications dropped"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut manager = ConnectionManager::new(config, CommandRegistry::with_defaults(), notifier);
    manager.start();
    manager
        .drive(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(%err, "cannot listen for Ctrl-C");
            }
        })
        .await;

    Ok(())
}
