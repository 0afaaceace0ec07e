//! [`Connector`]s that never touch the network.

use std::{
    io,
    sync::atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use mbrc::connection::{Connector, Transport};

/// Refuses every connect attempt and counts them.
#[derive(Debug, Default)]
pub struct RefusingConnector {
    attempts: AtomicUsize,
}

impl RefusingConnector {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    #[must_use]
    pub fn attempts(&self) -> usize { self.attempts.load(Ordering::SeqCst) }
}

#[async_trait]
impl Connector for RefusingConnector {
    async fn connect(&self) -> io::Result<Box<dyn Transport>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(io::Error::from(io::ErrorKind::ConnectionRefused))
    }
}

/// Never completes a connect attempt.
#[derive(Debug, Default)]
pub struct StalledConnector;

#[async_trait]
impl Connector for StalledConnector {
    async fn connect(&self) -> io::Result<Box<dyn Transport>> {
        futures::future::pending().await
    }
}
