//! Client composition root
//!
//! [`SyncClient`] is what an embedder holds: it wires the relay connection,
//! dispatcher, main-thread queue and tick driver together, and it is the
//! [`InputListener`] the host installs in place of its previous one.

use crate::config::SyncConfig;
use crate::dispatcher::ProtocolDispatcher;
use crate::executor::MainThreadQueue;
use crate::host::{Host, Key, KeyAction, MouseButton};
use crate::input::{InputCapture, InputListener};
use crate::replica::Replica;
use crate::tick::TickDriver;
use inputsync_introspect::StructuralResolver;
use inputsync_network::{ConnectionManager, LineHandler, Outbound, Session};
use inputsync_state::PendingSnapshot;
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Handle;
use tracing::info;

pub struct SyncClient {
    outbound: Arc<dyn Outbound>,
    dispatcher: Arc<ProtocolDispatcher>,
    connection: Option<Arc<ConnectionManager>>,
    resolver: StructuralResolver,
    replica: Replica,
    tick: TickDriver,
    input: InputCapture,
    previous: Option<Box<dyn InputListener>>,
}

impl SyncClient {
    /// Connect to the relay on `runtime` and keep reconnecting in the
    /// background
    pub fn start(config: &SyncConfig, runtime: Handle) -> Self {
        let session = Arc::new(Session::new());
        session.set_enabled(config.start_enabled);
        let connection = Arc::new(ConnectionManager::new(
            config.transport(),
            session,
            runtime,
        ));

        let mut client = Self::with_outbound(connection.clone());
        let handler: Arc<dyn LineHandler> = client.dispatcher.clone();
        connection.connect(handler);
        client.connection = Some(connection);
        client
    }

    /// Client over an arbitrary outbound. Lines are fed through
    /// [`dispatcher`](Self::dispatcher).
    pub fn with_outbound(outbound: Arc<dyn Outbound>) -> Self {
        let session = Arc::clone(outbound.session());
        let pending = Arc::new(PendingSnapshot::new());
        let queue = Arc::new(MainThreadQueue::new());
        let dispatcher = Arc::new(ProtocolDispatcher::new(
            session,
            pending.clone(),
            queue.clone(),
        ));
        Self {
            tick: TickDriver::new(outbound.clone(), queue, pending),
            outbound,
            dispatcher,
            connection: None,
            resolver: StructuralResolver::new(),
            replica: Replica::new(),
            input: InputCapture::new(),
            previous: None,
        }
    }
}

impl SyncClient {
    pub fn session(&self) -> &Arc<Session> {
        self.outbound.session()
    }

    pub fn dispatcher(&self) -> &Arc<ProtocolDispatcher> {
        &self.dispatcher
    }

    pub fn connection(&self) -> Option<&Arc<ConnectionManager>> {
        self.connection.as_ref()
    }

    pub fn resolver(&self) -> &StructuralResolver {
        &self.resolver
    }

    /// Keep `listener` and forward every input callback to it first
    pub fn chain_listener(&mut self, listener: Box<dyn InputListener>) {
        self.previous = Some(listener);
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.session().set_enabled(enabled);
        info!("Sync {}", if enabled { "enabled" } else { "disabled" });
    }

    /// Flip the local sync toggle. Returns the new state.
    pub fn toggle(&self) -> bool {
        let enabled = self.session().toggle();
        info!("Sync {}", if enabled { "enabled" } else { "disabled" });
        enabled
    }

    /// Once per host tick, on the main thread
    pub fn on_tick(&mut self, host: &mut dyn Host) {
        self.tick.tick(host, &mut self.resolver, &mut self.replica);
    }

    pub fn on_tick_at(&mut self, now: Instant, host: &mut dyn Host) {
        self.tick.tick_at(now, host, &mut self.resolver, &mut self.replica);
    }
}

impl InputListener for SyncClient {
    fn on_cursor_pos(&mut self, host: &mut dyn Host, x: f64, y: f64) {
        if let Some(previous) = self.previous.as_mut() {
            previous.on_cursor_pos(host, x, y);
        }
        self.input.cursor_moved(host, self.outbound.as_ref(), x, y);
    }

    fn on_mouse_button(
        &mut self,
        host: &mut dyn Host,
        button: MouseButton,
        action: KeyAction,
        mods: i32,
    ) {
        if let Some(previous) = self.previous.as_mut() {
            previous.on_mouse_button(host, button, action, mods);
        }
        self.input.mouse_button(
            host,
            &mut self.resolver,
            self.outbound.as_ref(),
            button,
            action,
            mods,
        );
    }

    fn on_scroll(&mut self, host: &mut dyn Host, dx: f64, dy: f64) {
        if let Some(previous) = self.previous.as_mut() {
            previous.on_scroll(host, dx, dy);
        }
        self.input.scrolled(self.outbound.as_ref(), dx, dy);
    }

    fn on_key(
        &mut self,
        host: &mut dyn Host,
        key: Key,
        scancode: i32,
        action: KeyAction,
        mods: i32,
    ) {
        // The previous handler may open or close screens
        let screen_before = host.active_screen();
        if let Some(previous) = self.previous.as_mut() {
            previous.on_key(host, key, scancode, action, mods);
        }
        self.input
            .key_pressed(host, self.outbound.as_ref(), key, action, screen_before);
    }

    fn on_char(&mut self, host: &mut dyn Host, codepoint: u32, mods: i32) {
        if let Some(previous) = self.previous.as_mut() {
            previous.on_char(host, codepoint, mods);
        }
        self.input.char_typed(self.outbound.as_ref(), codepoint, mods);
    }
}
