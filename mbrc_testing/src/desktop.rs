//! A stand-in for the desktop plugin listening on loopback.

use std::{io, net::SocketAddr, time::Duration};

use futures::{SinkExt, StreamExt};
use mbrc::{
    event::Event,
    frame::{Frame, FrameCodec},
};
use tokio::{
    io::AsyncWriteExt,
    net::{TcpListener, TcpStream},
    time::timeout,
};
use tokio_util::codec::Framed;

/// How long helpers wait before declaring a test hung.
pub const STEP_TIMEOUT: Duration = Duration::from_secs(5);

/// Loopback listener that hands out one [`DesktopPeer`] per client
/// connection.
pub struct FakeDesktop {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl FakeDesktop {
    /// Bind to an ephemeral port on `127.0.0.1`.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be bound.
    pub async fn bind() -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let local_addr = listener.local_addr()?;
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// `host:port` clients should connect to.
    #[must_use]
    pub fn address(&self) -> String { self.local_addr.to_string() }

    /// Wait for the next client.
    ///
    /// # Panics
    ///
    /// Panics if no client connects within [`STEP_TIMEOUT`].
    pub async fn accept(&self) -> DesktopPeer {
        let (stream, _) = timeout(STEP_TIMEOUT, self.listener.accept())
            .await
            .expect("client did not connect in time")
            .expect("accept client");
        DesktopPeer {
            framed: Framed::new(stream, FrameCodec::default()),
        }
    }

    /// Wait up to `limit` for a client; `None` if none connects.
    ///
    /// # Panics
    ///
    /// Panics if accepting fails.
    pub async fn try_accept(&self, limit: Duration) -> Option<DesktopPeer> {
        let (stream, _) = timeout(limit, self.listener.accept())
            .await
            .ok()?
            .expect("accept client");
        Some(DesktopPeer {
            framed: Framed::new(stream, FrameCodec::default()),
        })
    }
}

/// Server side of one client connection.
pub struct DesktopPeer {
    framed: Framed<TcpStream, FrameCodec>,
}

impl DesktopPeer {
    /// Send `frame` to the client.
    ///
    /// # Panics
    ///
    /// Panics if the frame cannot be written.
    pub async fn send(&mut self, frame: Frame) {
        self.framed.send(frame).await.expect("send frame");
    }

    /// Encode and send `event` the way the plugin would.
    ///
    /// # Panics
    ///
    /// Panics if the event cannot be encoded or written.
    pub async fn send_event(&mut self, event: &Event) {
        let frame = event.to_frame().expect("encode event");
        self.send(frame).await;
    }

    /// Write bytes straight to the socket, bypassing the codec.
    ///
    /// # Panics
    ///
    /// Panics if the bytes cannot be written.
    pub async fn send_raw(&mut self, bytes: &[u8]) {
        let stream = self.framed.get_mut();
        stream.write_all(bytes).await.expect("write raw bytes");
        stream.flush().await.expect("flush raw bytes");
    }

    /// Next frame from the client, or `None` once it disconnects.
    ///
    /// # Panics
    ///
    /// Panics if nothing arrives within [`STEP_TIMEOUT`] or the stream is
    /// corrupt.
    pub async fn recv(&mut self) -> Option<Frame> {
        timeout(STEP_TIMEOUT, self.framed.next())
            .await
            .expect("client frame did not arrive in time")
            .map(|frame| frame.expect("decode client frame"))
    }

    /// Next frame from the client, which must still be connected.
    ///
    /// # Panics
    ///
    /// Panics if the client disconnected instead.
    pub async fn expect_frame(&mut self) -> Frame {
        self.recv().await.expect("client closed the connection")
    }

    /// Read the `player` and `protocol` handshake frames.
    ///
    /// # Panics
    ///
    /// Panics unless the next two frames are the handshake in order.
    pub async fn expect_handshake(&mut self) -> [Frame; 2] {
        let player = self.expect_frame().await;
        assert_eq!(player.context(), "player", "first frame must be player");
        let protocol = self.expect_frame().await;
        assert_eq!(protocol.context(), "protocol", "second frame must be protocol");
        [player, protocol]
    }

    /// Complete the handshake by answering with a `protocol` frame.
    pub async fn accept_handshake(&mut self, version: u32) -> [Frame; 2] {
        let frames = self.expect_handshake().await;
        self.send_event(&Event::ProtocolTag(version)).await;
        frames
    }

    /// Wait until the client closes its side of the connection.
    ///
    /// # Panics
    ///
    /// Panics if the client keeps the socket open for [`STEP_TIMEOUT`].
    pub async fn expect_closed(&mut self) {
        loop {
            match timeout(STEP_TIMEOUT, self.framed.next())
                .await
                .expect("client did not close in time")
            {
                None | Some(Err(_)) => return,
                Some(Ok(_)) => {}
            }
        }
    }
}
