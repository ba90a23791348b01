//! In-process relay on an ephemeral port plus a raw line client

use anyhow::{anyhow, Context, Result};
use inputsync::relay::{Relay, RelayState, SEND_QUEUE_LINES};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

pub const RECV_TIMEOUT: Duration = Duration::from_secs(2);

pub struct RelayHarness {
    addr: SocketAddr,
    relay: Relay,
    task: JoinHandle<Result<()>>,
}

impl RelayHarness {
    pub async fn start() -> Result<Self> {
        Self::start_with_queue(SEND_QUEUE_LINES).await
    }

    pub async fn start_with_queue(queue_size: usize) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let relay = Relay::new(RelayState::new(), queue_size);
        let task = tokio::spawn(relay.clone().serve(listener));
        Ok(Self { addr, relay, task })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn relay(&self) -> &Relay {
        &self.relay
    }

    pub async fn connect(&self) -> Result<LineClient> {
        LineClient::connect(self.addr).await
    }

    /// Wait until the relay has registered `count` clients
    pub async fn wait_for_clients(&self, count: usize) -> Result<()> {
        let deadline = tokio::time::Instant::now() + RECV_TIMEOUT;
        while tokio::time::Instant::now() < deadline {
            if self.relay.state().lock().await.peers().len() == count {
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        Err(anyhow!("relay never reached {} clients", count))
    }
}

impl Drop for RelayHarness {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Speaks the line protocol directly, without a client runtime
pub struct LineClient {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl LineClient {
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .with_context(|| format!("connect to {addr}"))?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            lines: BufReader::new(reader).lines(),
            writer,
        })
    }

    pub async fn send(&mut self, line: &str) -> Result<()> {
        self.writer.write_all(format!("{line}\n").as_bytes()).await?;
        Ok(())
    }

    pub async fn recv(&mut self) -> Result<String> {
        let next = tokio::time::timeout(RECV_TIMEOUT, self.lines.next_line())
            .await
            .context("timed out waiting for a line")??;
        next.ok_or_else(|| anyhow!("relay closed the connection"))
    }

    /// Skip lines until one equals `expected`
    pub async fn expect(&mut self, expected: &str) -> Result<()> {
        loop {
            let line = self.recv().await?;
            if line == expected {
                return Ok(());
            }
        }
    }

    /// Fails if any line arrives within `window`
    pub async fn expect_silence(&mut self, window: Duration) -> Result<()> {
        match tokio::time::timeout(window, self.lines.next_line()).await {
            Err(_) => Ok(()),
            Ok(Ok(Some(line))) => Err(anyhow!("unexpected line: {line}")),
            Ok(Ok(None)) => Err(anyhow!("relay closed the connection")),
            Ok(Err(e)) => Err(e.into()),
        }
    }
}
