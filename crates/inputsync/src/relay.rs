//! Relay server
//!
//! Accepts any number of clients, keeps exactly one of them as leader, and
//! fans every received line out to all other clients. Leader-only commands
//! from followers are dropped. Each client gets a bounded send queue; lines
//! for a client whose queue is full are dropped rather than blocking others.

use anyhow::{Context, Result};
use bytes::BytesMut;
use clap::{Parser, ValueEnum};
use inputsync_network::{LineCodec, Message, MessageStats, Role};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, trace, warn};

/// Per-client send queue capacity, in lines
pub const SEND_QUEUE_LINES: usize = 20_000;

/// Commands only the leader may issue
pub const LEADER_ONLY_PREFIXES: [&str; 9] = [
    "UI_", "STATE_", "CHAT_", "CMD_", "MOVE_", "INV_", "HBAR_", "OPEN_", "CLOSE_",
];

pub type PeerId = u64;

#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "InputSync relay - leader election and line fan-out")]
pub struct Args {
    /// Address to bind to
    #[arg(short, long, env = "INPUTSYNC_RELAY_BIND", default_value = "127.0.0.1:25590")]
    pub bind: SocketAddr,

    /// Send queue capacity per client, in lines
    #[arg(long, default_value_t = SEND_QUEUE_LINES)]
    pub queue_size: usize,

    /// Logging level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Log every relayed line
    #[arg(long)]
    pub trace_lines: bool,

    /// Run without the interactive console
    #[arg(long)]
    pub no_console: bool,
}

struct Peer {
    id: PeerId,
    addr: SocketAddr,
    tx: mpsc::Sender<String>,
    focused: bool,
    /// Focus clock value of the last gain; larger is more recent
    focused_at: u64,
}

/// One row of the client listing
#[derive(Debug, Clone, PartialEq)]
pub struct PeerInfo {
    pub id: PeerId,
    pub addr: SocketAddr,
    pub focused: bool,
    pub leader: bool,
}

/// Membership, leader election and fan-out. Connection I/O lives in
/// [`Relay`]; this part is synchronous.
#[derive(Default)]
pub struct RelayState {
    peers: Vec<Peer>,
    leader: Option<PeerId>,
    next_id: PeerId,
    focus_clock: u64,
    stats: MessageStats,
    trace_lines: bool,
}

impl RelayState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_line_tracing(mut self, enabled: bool) -> Self {
        self.trace_lines = enabled;
        self
    }

    pub fn leader(&self) -> Option<PeerId> {
        self.leader
    }

    pub fn stats(&self) -> &MessageStats {
        &self.stats
    }

    pub fn peers(&self) -> Vec<PeerInfo> {
        self.peers
            .iter()
            .map(|p| PeerInfo {
                id: p.id,
                addr: p.addr,
                focused: p.focused,
                leader: self.leader == Some(p.id),
            })
            .collect()
    }

    /// Register a client. Every client learns its role afterwards.
    pub fn join(&mut self, addr: SocketAddr, tx: mpsc::Sender<String>) -> PeerId {
        let id = self.next_id;
        self.next_id += 1;
        self.peers.push(Peer {
            id,
            addr,
            tx,
            focused: false,
            focused_at: 0,
        });
        if self.leader.is_none() {
            self.elect();
        }
        self.announce_roles();
        id
    }

    pub fn leave(&mut self, id: PeerId) {
        let before = self.peers.len();
        self.peers.retain(|p| p.id != id);
        if self.peers.len() == before {
            return;
        }
        if self.leader == Some(id) {
            self.elect();
        }
        self.announce_roles();
    }

    pub fn handle_line(&mut self, from: PeerId, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        self.stats.record_received(line);
        if self.trace_lines {
            trace!("[{}] {}", from, line);
        }

        match Message::parse(line) {
            Ok(Message::Focus(focused)) => {
                self.set_focus(from, focused);
                return;
            }
            _ if is_leader_only(line) && self.leader != Some(from) => {
                debug!("Dropping leader-only line from follower {}: {}", from, line);
                self.stats.record_dropped();
                return;
            }
            _ => {}
        }
        self.broadcast(line, Some(from));
    }

    /// Queue `line` to every client except `except`. Returns how many
    /// clients accepted it.
    pub fn broadcast(&mut self, line: &str, except: Option<PeerId>) -> usize {
        let mut delivered = 0;
        for peer in self.peers.iter().filter(|p| Some(p.id) != except) {
            if deliver(peer, line, &mut self.stats) {
                delivered += 1;
            }
        }
        delivered
    }

    pub fn console(&mut self, command: &ConsoleCommand) -> Vec<String> {
        match command {
            ConsoleCommand::Pause => self.console_broadcast(Message::Pause),
            ConsoleCommand::Resume => self.console_broadcast(Message::Resume),
            ConsoleCommand::Toggle => self.console_broadcast(Message::ToggleSync),
            ConsoleCommand::Clients if self.peers.is_empty() => vec!["No clients.".to_string()],
            ConsoleCommand::Clients => self
                .peers()
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    format!(
                        "{}: {}{}{}",
                        i,
                        p.addr,
                        if p.leader { " (SOURCE)" } else { "" },
                        if p.focused { " (FOCUSED)" } else { "" }
                    )
                })
                .collect(),
            ConsoleCommand::Source => {
                let source = self
                    .leader
                    .and_then(|id| self.peers.iter().find(|p| p.id == id))
                    .map_or_else(|| "None".to_string(), |p| p.addr.to_string());
                vec![format!("Source: {source}")]
            }
            ConsoleCommand::Empty | ConsoleCommand::Quit => Vec::new(),
            ConsoleCommand::Unknown(_) => vec!["Unknown command.".to_string()],
        }
    }

    fn console_broadcast(&mut self, message: Message) -> Vec<String> {
        let line = message.encode();
        let delivered = self.broadcast(&line, None);
        vec![format!("Sent {line} to {delivered} client(s).")]
    }

    fn set_focus(&mut self, id: PeerId, focused: bool) {
        self.focus_clock += 1;
        let clock = self.focus_clock;
        let Some(peer) = self.peers.iter_mut().find(|p| p.id == id) else {
            return;
        };
        peer.focused = focused;
        if focused {
            peer.focused_at = clock;
            self.elect();
        } else if self.leader == Some(id) {
            self.elect();
        }
        self.announce_roles();
    }

    /// Most recently focused client, else the earliest connected one
    fn elect(&mut self) {
        let previous = self.leader;
        self.leader = self
            .peers
            .iter()
            .filter(|p| p.focused)
            .max_by_key(|p| p.focused_at)
            .or_else(|| self.peers.first())
            .map(|p| p.id);
        if self.leader != previous {
            match self.leader.and_then(|id| self.peers.iter().find(|p| p.id == id)) {
                Some(peer) => info!("Leader is now {} ({})", peer.id, peer.addr),
                None => info!("No clients; leader cleared"),
            }
        }
    }

    fn announce_roles(&mut self) {
        let leader_line = Message::Role(Role::Leader).encode();
        let follower_line = Message::Role(Role::Follower).encode();
        for peer in &self.peers {
            let line = if self.leader == Some(peer.id) {
                &leader_line
            } else {
                &follower_line
            };
            deliver(peer, line, &mut self.stats);
        }
    }
}

fn is_leader_only(line: &str) -> bool {
    LEADER_ONLY_PREFIXES.iter().any(|prefix| line.starts_with(prefix))
}

fn deliver(peer: &Peer, line: &str, stats: &mut MessageStats) -> bool {
    match peer.tx.try_send(line.to_string()) {
        Ok(()) => {
            stats.record_sent(line);
            true
        }
        Err(mpsc::error::TrySendError::Full(_)) => {
            warn!("Send queue full for {}; dropping line", peer.addr);
            stats.record_dropped();
            false
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            stats.record_dropped();
            false
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Pause,
    Resume,
    Toggle,
    Clients,
    Source,
    Quit,
    Empty,
    Unknown(String),
}

impl ConsoleCommand {
    pub fn parse(input: &str) -> Self {
        match input.trim().to_ascii_lowercase().as_str() {
            "" => ConsoleCommand::Empty,
            "pause" => ConsoleCommand::Pause,
            "resume" => ConsoleCommand::Resume,
            "toggle" => ConsoleCommand::Toggle,
            "clients" => ConsoleCommand::Clients,
            "source" => ConsoleCommand::Source,
            "q" | "quit" | "exit" => ConsoleCommand::Quit,
            other => ConsoleCommand::Unknown(other.to_string()),
        }
    }
}

/// Networked relay over a shared [`RelayState`]
#[derive(Clone)]
pub struct Relay {
    state: Arc<Mutex<RelayState>>,
    queue_size: usize,
}

impl Relay {
    pub fn new(state: RelayState, queue_size: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            queue_size: queue_size.max(1),
        }
    }

    pub fn state(&self) -> &Arc<Mutex<RelayState>> {
        &self.state
    }

    /// Accept clients until the listener fails
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        loop {
            let (stream, addr) = listener.accept().await.context("accept failed")?;
            let relay = self.clone();
            tokio::spawn(async move {
                if let Err(e) = relay.handle_peer(stream, addr).await {
                    debug!("Client {} ended with error: {}", addr, e);
                }
            });
        }
    }

    async fn handle_peer(self, stream: TcpStream, addr: SocketAddr) -> Result<()> {
        stream.set_nodelay(true)?;
        let (mut reader, writer) = stream.into_split();
        let (tx, rx) = mpsc::channel(self.queue_size);

        let id = self.state.lock().await.join(addr, tx);
        info!("[+] {} connected", addr);
        tokio::spawn(write_lines(writer, rx, addr));

        let result = self.read_lines(id, &mut reader).await;

        // Dropping the peer closes its queue, which ends the writer
        self.state.lock().await.leave(id);
        info!("[-] {} disconnected", addr);
        result
    }

    async fn read_lines(&self, id: PeerId, reader: &mut OwnedReadHalf) -> Result<()> {
        let mut buffer = BytesMut::with_capacity(8 * 1024);
        loop {
            if reader.read_buf(&mut buffer).await? == 0 {
                return Ok(());
            }
            while let Some(line) = LineCodec::decode(&mut buffer)? {
                self.state.lock().await.handle_line(id, &line);
            }
        }
    }
}

async fn write_lines(mut writer: OwnedWriteHalf, mut rx: mpsc::Receiver<String>, addr: SocketAddr) {
    let mut frame = BytesMut::new();
    while let Some(line) = rx.recv().await {
        frame.clear();
        LineCodec::encode(&line, &mut frame);
        if let Err(e) = writer.write_all(&frame).await {
            debug!("Write to {} failed: {}", addr, e);
            break;
        }
    }
}

async fn console_loop(relay: &Relay) -> Result<()> {
    println!("Commands: pause | resume | toggle | clients | source | quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = ConsoleCommand::parse(&line);
        if command == ConsoleCommand::Quit {
            break;
        }
        for output in relay.state.lock().await.console(&command) {
            println!("{output}");
        }
    }
    Ok(())
}

pub async fn run() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::from(args.log_level.clone()))
        .with_target(false)
        .init();

    let listener = TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind))?;
    info!("Relay listening on {}", listener.local_addr()?);

    let relay = Relay::new(
        RelayState::new().with_line_tracing(args.trace_lines),
        args.queue_size,
    );
    let server = tokio::spawn(relay.clone().serve(listener));

    if args.no_console {
        return server.await.context("relay task panicked")?;
    }

    let outcome = console_loop(&relay).await;
    server.abort();
    if let Err(e) = &outcome {
        error!("Console failed: {}", e);
    }
    info!("Relay shutting down");
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    fn drain(rx: &mut mpsc::Receiver<String>) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(line) = rx.try_recv() {
            lines.push(line);
        }
        lines
    }

    #[test]
    fn first_client_leads() {
        let mut state = RelayState::new();
        let (tx, mut rx) = mpsc::channel(16);
        let id = state.join(addr(1), tx);
        assert_eq!(state.leader(), Some(id));
        assert_eq!(drain(&mut rx), vec!["ROLE_LEADER"]);
    }

    #[test]
    fn full_queue_drops_instead_of_blocking() {
        let mut state = RelayState::new();
        let (tx_a, _rx_a) = mpsc::channel(16);
        let (tx_b, mut rx_b) = mpsc::channel(2);
        let a = state.join(addr(1), tx_a);
        state.join(addr(2), tx_b);
        // b already holds its role line; one more fits
        state.handle_line(a, "PAUSE");
        state.handle_line(a, "RESUME");
        assert_eq!(drain(&mut rx_b), vec!["ROLE_FOLLOWER", "PAUSE"]);
        assert!(state.stats().lines_dropped >= 1);
    }

    #[test]
    fn console_parsing() {
        assert_eq!(ConsoleCommand::parse("  Clients "), ConsoleCommand::Clients);
        assert_eq!(ConsoleCommand::parse("q"), ConsoleCommand::Quit);
        assert_eq!(ConsoleCommand::parse("exit"), ConsoleCommand::Quit);
        assert_eq!(
            ConsoleCommand::parse("bogus"),
            ConsoleCommand::Unknown("bogus".to_string())
        );
    }
}
