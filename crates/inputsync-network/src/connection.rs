//! Relay connection management
//!
//! A single background task keeps the relay connection alive. Each live
//! connection gets one I/O task that reads newline-delimited lines for the
//! installed [`LineHandler`] and writes queued outbound lines.

use crate::protocol::{LineCodec, MessageStats};
use crate::session::Session;
use crate::throttle::SendThrottle;
use crate::transport::{self, TransportConfig};
use crate::NetworkError;
use bytes::BytesMut;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const READ_BUFFER_SIZE: usize = 8 * 1024;

/// Receives every line read from the relay, on the I/O task
pub trait LineHandler: Send + Sync {
    fn on_line(&self, line: &str);
}

/// Outbound side as seen by the host-facing code
pub trait Outbound: Send + Sync {
    fn session(&self) -> &Arc<Session>;

    /// Queue a line. Returns false when disconnected or suppressed.
    fn send(&self, line: &str) -> bool;

    /// Rate limiter for periodic snapshot sends
    fn claim_move_slot(&self, now: Instant) -> bool;

    fn is_active(&self) -> bool {
        self.session().is_active()
    }
}

pub struct ConnectionManager {
    config: TransportConfig,
    session: Arc<Session>,
    runtime: Handle,
    started: AtomicBool,
    /// Writer channel of the live connection, tagged with its generation
    outbound: Mutex<Option<(u64, mpsc::UnboundedSender<String>)>>,
    throttle: Mutex<SendThrottle>,
    stats: Mutex<MessageStats>,
}

impl ConnectionManager {
    pub fn new(config: TransportConfig, session: Arc<Session>, runtime: Handle) -> Self {
        Self {
            config,
            session,
            runtime,
            started: AtomicBool::new(false),
            outbound: Mutex::new(None),
            throttle: Mutex::new(SendThrottle::default()),
            stats: Mutex::new(MessageStats::default()),
        }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    pub fn session_handle(&self) -> Arc<Session> {
        self.session.clone()
    }

    pub fn stats(&self) -> MessageStats {
        lock(&self.stats).clone()
    }

    /// Start the reconnect loop. Later calls are no-ops.
    pub fn connect(self: &Arc<Self>, handler: Arc<dyn LineHandler>) {
        if self.started.swap(true, Ordering::AcqRel) {
            return;
        }
        info!("Starting relay connection loop for {}", self.config.address());
        let manager = Arc::clone(self);
        self.runtime.spawn(async move { manager.retry_loop(handler).await });
    }

    async fn retry_loop(self: Arc<Self>, handler: Arc<dyn LineHandler>) {
        loop {
            if !self.session.is_connected() {
                match transport::connect(&self.config).await {
                    Ok(stream) => self.attach(stream, handler.clone()),
                    Err(e) => {
                        debug!("Connect attempt failed: {}", e);
                        self.session.reset();
                    }
                }
            }
            tokio::time::sleep(self.config.retry_interval).await;
        }
    }

    fn attach(self: &Arc<Self>, stream: TcpStream, handler: Arc<dyn LineHandler>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut outbound = lock(&self.outbound);
        lock(&self.throttle).reset();
        let generation = self.session.mark_connected();
        *outbound = Some((generation, tx));
        drop(outbound);
        info!("Connected to relay (connection {})", generation);

        let manager = Arc::clone(self);
        self.runtime.spawn(async move {
            if let Err(e) = manager.run_connection(stream, rx, handler.as_ref()).await {
                debug!("Connection {} ended: {}", generation, e);
            }
            manager.detach(generation);
        });
    }

    async fn run_connection(
        &self,
        stream: TcpStream,
        mut outgoing: mpsc::UnboundedReceiver<String>,
        handler: &dyn LineHandler,
    ) -> Result<(), NetworkError> {
        let (mut reader, mut writer) = stream.into_split();
        let mut inbound = BytesMut::with_capacity(READ_BUFFER_SIZE);
        let mut frame = BytesMut::new();

        loop {
            tokio::select! {
                read = reader.read_buf(&mut inbound) => {
                    if read? == 0 {
                        return Err(NetworkError::ConnectionFailed("closed by relay".to_string()));
                    }
                    while let Some(line) = LineCodec::decode(&mut inbound)? {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        lock(&self.stats).record_received(line);
                        handler.on_line(line);
                    }
                }
                next = outgoing.recv() => {
                    let Some(line) = next else {
                        return Ok(());
                    };
                    frame.clear();
                    LineCodec::encode(&line, &mut frame);
                    writer.write_all(&frame).await?;
                }
            }
        }
    }

    /// Tear down after the connection task ends, unless a newer connection
    /// already replaced it
    fn detach(&self, generation: u64) {
        let mut outbound = lock(&self.outbound);
        if matches!(outbound.as_ref(), Some((current, _)) if *current == generation) {
            outbound.take();
        }
        if self.session.reset_if(generation) {
            warn!("Relay connection lost; retrying");
        }
    }
}

impl Outbound for ConnectionManager {
    fn session(&self) -> &Arc<Session> {
        &self.session
    }

    fn send(&self, line: &str) -> bool {
        if !self.session.is_connected() || self.session.is_suppressed() {
            return false;
        }
        let queued = lock(&self.outbound)
            .as_ref()
            .map_or(false, |(_, tx)| tx.send(line.to_string()).is_ok());

        let mut stats = lock(&self.stats);
        if queued {
            stats.record_sent(line);
        } else {
            stats.record_dropped();
        }
        queued
    }

    fn claim_move_slot(&self, now: Instant) -> bool {
        lock(&self.throttle).try_acquire(now)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn writer_generation(manager: &ConnectionManager) -> Option<u64> {
        lock(&manager.outbound).as_ref().map(|(generation, _)| *generation)
    }

    #[tokio::test]
    async fn stale_teardown_keeps_newer_writer() {
        let session = Arc::new(Session::new());
        let manager = ConnectionManager::new(
            TransportConfig::default(),
            session.clone(),
            Handle::current(),
        );

        let first = session.mark_connected();
        let (stale_tx, _stale_rx) = mpsc::unbounded_channel();
        *lock(&manager.outbound) = Some((first, stale_tx));

        // A reconnect lands before the old connection task tears down
        let second = session.mark_connected();
        let (tx, mut rx) = mpsc::unbounded_channel();
        *lock(&manager.outbound) = Some((second, tx));

        manager.detach(first);
        assert_eq!(writer_generation(&manager), Some(second));
        assert!(session.is_connected());
        assert!(manager.send("PAUSE"));
        assert_eq!(rx.try_recv().ok().as_deref(), Some("PAUSE"));

        manager.detach(second);
        assert_eq!(writer_generation(&manager), None);
        assert!(!session.is_connected());
        assert!(!manager.send("PAUSE"));
    }
}
