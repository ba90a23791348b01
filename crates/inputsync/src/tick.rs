//! Per-frame driver
//!
//! Called once per host tick on the main thread. Drains queued follower work,
//! reports window focus, then either replays the latest leader snapshot
//! (follower) or captures and sends one (leader).

use crate::capture::capture;
use crate::executor::{ApplyScope, MainThreadQueue};
use crate::host::Host;
use crate::replica::{read_chat_buffer, Replica};
use inputsync_introspect::StructuralResolver;
use inputsync_network::{Message, Outbound, Role};
use inputsync_state::{ChatSync, PendingSnapshot};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace, warn};

pub struct TickDriver {
    outbound: Arc<dyn Outbound>,
    queue: Arc<MainThreadQueue>,
    pending: Arc<PendingSnapshot>,
    chat: ChatSync,
    reported_focus: Option<bool>,
    seen_generation: u64,
}

impl TickDriver {
    pub fn new(
        outbound: Arc<dyn Outbound>,
        queue: Arc<MainThreadQueue>,
        pending: Arc<PendingSnapshot>,
    ) -> Self {
        Self {
            outbound,
            queue,
            pending,
            chat: ChatSync::new(),
            reported_focus: None,
            seen_generation: 0,
        }
    }

    pub fn tick(
        &mut self,
        host: &mut dyn Host,
        resolver: &mut StructuralResolver,
        replica: &mut Replica,
    ) {
        self.tick_at(Instant::now(), host, resolver, replica);
    }

    pub fn tick_at(
        &mut self,
        now: Instant,
        host: &mut dyn Host,
        resolver: &mut StructuralResolver,
        replica: &mut Replica,
    ) {
        self.observe_generation(replica);

        let drained = self.queue.drain(&mut ApplyScope {
            host: &mut *host,
            resolver: &mut *resolver,
            replica: &mut *replica,
        });
        if drained > 0 {
            trace!("Ran {} queued jobs", drained);
        }

        self.report_focus(host);

        let session = self.outbound.session();
        if !session.is_connected() || !session.is_enabled() {
            return;
        }

        match session.role() {
            Some(Role::Follower) => self.follow(host, resolver, replica),
            Some(Role::Leader) => self.lead(now, host, resolver),
            None => {}
        }
    }

    /// Reset per-connection state once for every new connection
    fn observe_generation(&mut self, replica: &mut Replica) {
        let session = self.outbound.session();
        let generation = session.generation();
        if !session.is_connected() || generation == self.seen_generation {
            return;
        }
        debug!("New relay connection {}; resetting tick state", generation);
        self.seen_generation = generation;
        self.reported_focus = None;
        self.chat.reset();
        replica.reset_edges();
    }

    /// Focus is reported on change and once per connection, whatever the
    /// role or toggle state
    fn report_focus(&mut self, host: &dyn Host) {
        if !self.outbound.session().is_connected() {
            return;
        }
        let focused = host.is_focused();
        if self.reported_focus == Some(focused) {
            return;
        }
        if self.outbound.send(&Message::Focus(focused).encode()) {
            self.reported_focus = Some(focused);
        }
    }

    fn follow(
        &mut self,
        host: &mut dyn Host,
        resolver: &mut StructuralResolver,
        replica: &mut Replica,
    ) {
        let Some(snapshot) = self.pending.latest() else {
            return;
        };
        let _guard = self.outbound.session().suppress();
        if let Err(e) = replica.apply_snapshot(host, resolver, &snapshot) {
            if e.is_expected() {
                trace!("Snapshot not applied: {}", e);
            } else {
                warn!("Snapshot apply failed: {}", e);
            }
        }
    }

    fn lead(&mut self, now: Instant, host: &mut dyn Host, resolver: &mut StructuralResolver) {
        if !host.has_player() || !self.outbound.is_active() {
            return;
        }
        if !self.outbound.claim_move_slot(now) {
            return;
        }

        if let Some(snapshot) = capture(host, resolver) {
            self.outbound.send(&snapshot.encode());
        }

        let buffer = read_chat_buffer(host, resolver);
        if let Some(payload) = self.chat.observe(buffer.as_deref()) {
            self.outbound.send(&format!("CHAT_SET_{payload}"));
        }
    }
}
