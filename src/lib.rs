#![doc(html_root_url = "https://docs.rs/mbrc/latest")]
//! Client-side protocol engine for a desktop music player remote.
//!
//! The desktop plugin speaks a length-prefixed framed protocol over TCP.
//! This crate splits the byte stream into [`Frame`]s, decodes them into
//! typed [`Event`]s, dispatches each event to the [`Command`] registered
//! for its kind, and keeps the connection alive with a supervised
//! reconnect loop.
//!
//! ```no_run
//! use mbrc::{CommandRegistry, ConnectionConfig, ConnectionManager, Notifier};
//!
//! # async fn run() {
//! let mut manager = ConnectionManager::new(
//!     ConnectionConfig::new("127.0.0.1:3000"),
//!     CommandRegistry::with_defaults(),
//!     Notifier::default(),
//! );
//! manager.start();
//! manager
//!     .drive(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await;
//! # }
//! ```

pub mod command;
pub mod connection;
pub mod event;
pub mod frame;
pub mod metrics;
pub mod notify;
pub mod protocol;

pub use command::{Command, CommandContext, CommandError, CommandRegistry};
pub use connection::{ConnectionConfig, ConnectionManager, ConnectionState, Intent};
pub use event::{Event, EventKind, EventRouter};
pub use frame::{Frame, FrameDecoder, FrameError};
pub use notify::{ConnectionStatusChange, Notification, Notifier};
pub use protocol::{IngestSummary, ProtocolError, ProtocolHandler};
