//! Socket establishment.

use std::io;

use async_trait::async_trait;
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::TcpStream,
};

/// Byte stream the connection worker reads from and writes to.
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send + 'static {}
impl<T> Transport for T where T: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

/// Source of fresh transports, called once per connect attempt.
///
/// Implementations must be cancellation-safe: dropping a pending
/// `connect()` future must not leak resources.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self) -> io::Result<Box<dyn Transport>>;
}

/// Connects to a `host:port` over TCP.
#[derive(Clone, Debug)]
pub struct TcpConnector {
    address: String,
    nodelay: bool,
}

impl TcpConnector {
    #[must_use]
    pub fn new(address: impl Into<String>, nodelay: bool) -> Self {
        Self {
            address: address.into(),
            nodelay,
        }
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self) -> io::Result<Box<dyn Transport>> {
        let stream = TcpStream::connect(self.address.as_str()).await?;
        stream.set_nodelay(self.nodelay)?;
        Ok(Box::new(stream))
    }
}
