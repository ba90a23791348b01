//! Routes received lines
//!
//! Runs on the network task. Control messages update the session directly;
//! snapshots land in the pending slot; everything else is queued for the main
//! thread and applied there under echo suppression.

use crate::executor::MainThreadQueue;
use inputsync_network::{LineHandler, Message, Session};
use inputsync_state::PendingSnapshot;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct ProtocolDispatcher {
    session: Arc<Session>,
    pending: Arc<PendingSnapshot>,
    queue: Arc<MainThreadQueue>,
}

impl ProtocolDispatcher {
    pub fn new(
        session: Arc<Session>,
        pending: Arc<PendingSnapshot>,
        queue: Arc<MainThreadQueue>,
    ) -> Self {
        Self {
            session,
            pending,
            queue,
        }
    }

    pub fn dispatch(&self, message: Message) {
        match message {
            Message::Role(role) => {
                self.session.set_role(role);
                info!("Assigned role {:?}", role);
            }
            Message::Pause => {
                self.session.set_enabled(false);
                info!("Sync paused");
            }
            Message::Resume => {
                self.session.set_enabled(true);
                info!("Sync resumed");
            }
            Message::ToggleSync => {
                let enabled = self.session.toggle();
                info!("Sync {}", if enabled { "enabled" } else { "disabled" });
            }
            // Focus reports are for the relay only
            Message::Focus(_) => {}
            _ if !self.session.is_enabled() || !self.session.is_follower() => {
                debug!("Ignoring {:?}", message);
            }
            Message::Move(snapshot) => self.pending.replace(snapshot),
            other => self.submit(other),
        }
    }

    fn submit(&self, message: Message) {
        let session = Arc::clone(&self.session);
        self.queue.submit(Box::new(move |scope| {
            // Role or pause may have changed since the line arrived
            if !session.is_enabled() || !session.is_follower() {
                debug!("Discarding queued {:?}", message);
                return;
            }
            let _guard = session.suppress();
            let label = format!("{message:?}");
            if let Err(e) = scope.apply(message) {
                if e.is_expected() {
                    debug!("Dropped {}: {}", label, e);
                } else {
                    warn!("Failed to apply {}: {}", label, e);
                }
            }
        }));
    }
}

impl LineHandler for ProtocolDispatcher {
    fn on_line(&self, line: &str) {
        match Message::parse(line) {
            Ok(message) => self.dispatch(message),
            Err(e) => debug!("Dropping line: {}", e),
        }
    }
}
