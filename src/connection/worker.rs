//! Task that owns the socket: connect, serve, back off, repeat.

use std::sync::Arc;

use bytes::BytesMut;
use tokio::{
    io::{AsyncReadExt, AsyncWrite, AsyncWriteExt},
    sync::{Mutex, Notify, mpsc},
    time::{sleep, timeout},
};
use tokio_util::{codec::Encoder, sync::CancellationToken};

use super::{
    Backoff,
    ConnectionConfig,
    ConnectionError,
    ConnectionState,
    Connector,
    Transport,
    state::StatusCell,
};
use crate::{
    command::Session,
    frame::{Frame, FrameCodec, LENGTH_PREFIX_SIZE},
    metrics::{self, Direction},
    notify::{Notification, Notifier},
    protocol::ProtocolHandler,
};

/// Why a connect attempt or a served connection ended.
enum SessionEnd {
    Shutdown,
    Reset,
    Failed(ConnectionError),
}

pub(super) struct Worker {
    pub(super) config: ConnectionConfig,
    pub(super) connector: Arc<dyn Connector>,
    pub(super) handler: ProtocolHandler,
    pub(super) status: Arc<StatusCell>,
    pub(super) notifier: Notifier,
    pub(super) outbound: Arc<Mutex<mpsc::Receiver<Frame>>>,
    pub(super) session: Arc<Session>,
    pub(super) reset: Arc<Notify>,
    pub(super) shutdown: CancellationToken,
}

impl Worker {
    pub(super) async fn run(mut self) {
        let mut outbound = Arc::clone(&self.outbound).lock_owned().await;
        let mut backoff = Backoff::new(self.config.backoff);

        while !self.shutdown.is_cancelled() {
            self.status.transition(ConnectionState::Connecting);
            let end = match self.connect().await {
                Ok(transport) => {
                    self.status.transition(ConnectionState::Connected);
                    backoff.reset();
                    metrics::inc_connections();
                    let end = self.serve(transport, &mut outbound).await;
                    metrics::dec_connections();
                    end
                }
                Err(end) => end,
            };
            self.status.transition(ConnectionState::Disconnected);

            match end {
                SessionEnd::Shutdown => break,
                SessionEnd::Reset => {
                    log::info!("connection reset requested");
                    backoff.reset();
                }
                SessionEnd::Failed(err) => {
                    log::warn!("connection lost: address={}, error={err}", self.config.address);
                    if !self.wait_before_retry(&mut backoff).await {
                        break;
                    }
                }
            }
        }

        self.status.transition(ConnectionState::Disconnected);
        tracing::debug!(address = %self.config.address, "connection worker stopped");
    }

    async fn connect(&self) -> Result<Box<dyn Transport>, SessionEnd> {
        let limit = self.config.connect_timeout;
        tracing::debug!(address = %self.config.address, ?limit, "connecting");
        tokio::select! {
            biased;
            () = self.shutdown.cancelled() => Err(SessionEnd::Shutdown),
            () = self.reset.notified() => Err(SessionEnd::Reset),
            result = timeout(limit, self.connector.connect()) => match result {
                Ok(Ok(transport)) => Ok(transport),
                Ok(Err(err)) => Err(SessionEnd::Failed(ConnectionError::Connect(err))),
                Err(_) => Err(SessionEnd::Failed(ConnectionError::Timeout(limit))),
            },
        }
    }

    async fn serve(
        &mut self,
        transport: Box<dyn Transport>,
        outbound: &mut mpsc::Receiver<Frame>,
    ) -> SessionEnd {
        self.handler.reset();
        self.session.clear();
        let (mut reader, mut writer) = tokio::io::split(transport);
        let mut codec = FrameCodec::new(self.config.max_frame_length);

        let mut stale = 0_usize;
        while outbound.try_recv().is_ok() {
            stale += 1;
        }
        if stale > 0 {
            log::debug!("discarded stale outbound frames: count={stale}");
        }

        if let Some(handshake) = &self.config.handshake {
            match handshake.frames() {
                Ok(frames) => {
                    for frame in &frames {
                        if let Err(end) = self.write_frame(&mut writer, &mut codec, frame).await {
                            return end;
                        }
                    }
                }
                Err(err) => log::error!("cannot encode handshake: error={err}"),
            }
        }

        let mut read_buf = vec![0_u8; self.config.read_buffer_size];
        loop {
            tokio::select! {
                biased;
                () = self.shutdown.cancelled() => return SessionEnd::Shutdown,
                () = self.reset.notified() => return SessionEnd::Reset,
                read = reader.read(&mut read_buf) => {
                    let n = match read {
                        Ok(0) => return SessionEnd::Failed(ConnectionError::Eof),
                        Ok(n) => n,
                        Err(err) => return SessionEnd::Failed(err.into()),
                    };
                    if let Err(err) = self.handler.answer_processor(&read_buf[..n]) {
                        return SessionEnd::Failed(err.into());
                    }
                    if self.session.take_activation_request() {
                        self.status.transition_if(
                            |state| state == ConnectionState::Connected,
                            ConnectionState::Active,
                        );
                    }
                }
                Some(frame) = outbound.recv() => {
                    if let Err(end) = self.write_frame(&mut writer, &mut codec, &frame).await {
                        return end;
                    }
                }
            }
        }
    }

    /// Write one frame. Frames that cannot be encoded are dropped.
    async fn write_frame<W>(
        &self,
        writer: &mut W,
        codec: &mut FrameCodec,
        frame: &Frame,
    ) -> Result<(), SessionEnd>
    where
        W: AsyncWrite + Unpin,
    {
        let mut buf = BytesMut::with_capacity(LENGTH_PREFIX_SIZE + frame.body_len());
        if let Err(err) = codec.encode(frame, &mut buf) {
            log::warn!(
                "dropping outbound frame: context={}, error={err}",
                frame.context()
            );
            return Ok(());
        }
        tokio::select! {
            biased;
            () = self.shutdown.cancelled() => Err(SessionEnd::Shutdown),
            result = writer.write_all(&buf) => match result {
                Ok(()) => {
                    metrics::inc_frames(Direction::Outbound);
                    Ok(())
                }
                Err(err) => Err(SessionEnd::Failed(err.into())),
            },
        }
    }

    /// Publish and sit out the next back-off delay. Returns `false` when
    /// shut down while waiting.
    async fn wait_before_retry(&self, backoff: &mut Backoff) -> bool {
        let delay = backoff.next_delay();
        let attempt = backoff.attempt();
        tracing::info!(attempt, ?delay, "reconnect scheduled");
        self.notifier
            .publish(Notification::ReconnectScheduled { attempt, delay });
        metrics::inc_reconnects();

        tokio::select! {
            biased;
            () = self.shutdown.cancelled() => false,
            () = self.reset.notified() => {
                backoff.reset();
                true
            }
            () = sleep(delay) => true,
        }
    }
}
