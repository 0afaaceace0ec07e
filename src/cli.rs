//! Command line interface for the `mbrc` binary.
//!
//! The binary connects to a desktop plugin and prints every notification it
//! receives; it doubles as a smoke test for a plugin installation.

use std::net::SocketAddr;

use clap::Parser;

/// Command line arguments for the `mbrc` binary.
#[derive(Debug, Parser)]
#[command(
    name = "mbrc",
    version,
    about = "Connect to a music player remote plugin and log its events"
)]
pub struct Cli {
    /// Host name or address of the machine running the plugin.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port the plugin listens on.
    #[arg(short, long, default_value_t = 3000)]
    pub port: u16,

    /// Give up a connect attempt after this many milliseconds.
    #[arg(long, default_value_t = 10_000)]
    pub connect_timeout_ms: u64,

    /// Largest frame body accepted, in bytes.
    #[arg(long, default_value_t = 1024 * 1024)]
    pub max_frame_length: usize,

    /// Name announced to the plugin during the handshake.
    #[arg(long, default_value = "Android")]
    pub client_name: String,

    /// Skip the handshake sent after connecting.
    #[arg(long)]
    pub no_handshake: bool,

    /// Serve Prometheus metrics on this address.
    #[arg(long)]
    pub metrics_listen: Option<SocketAddr>,
}

impl Cli {
    /// `host:port` to connect to.
    #[must_use]
    pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}
