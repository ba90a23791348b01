//! Outbound that records lines instead of writing to a socket

use inputsync_network::{Outbound, Role, SendThrottle, Session};
use std::sync::{Arc, Mutex};
use std::time::Instant;

#[derive(Default)]
pub struct RecordingOutbound {
    session: Arc<Session>,
    lines: Mutex<Vec<String>>,
    throttle: Mutex<SendThrottle>,
}

impl RecordingOutbound {
    /// Not connected; every send is refused
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Connected with `role` already assigned
    pub fn connected(role: Role) -> Arc<Self> {
        let outbound = Self::new();
        outbound.session.mark_connected();
        outbound.session.set_role(role);
        outbound
    }

    pub fn sent(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn take_sent(&self) -> Vec<String> {
        std::mem::take(&mut *self.lines.lock().unwrap())
    }

    /// Sent lines starting with `prefix`
    pub fn sent_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|line| line.starts_with(prefix))
            .collect()
    }
}

impl Outbound for RecordingOutbound {
    fn session(&self) -> &Arc<Session> {
        &self.session
    }

    fn send(&self, line: &str) -> bool {
        if !self.session.is_connected() || self.session.is_suppressed() {
            return false;
        }
        self.lines.lock().unwrap().push(line.to_string());
        true
    }

    fn claim_move_slot(&self, now: Instant) -> bool {
        self.throttle.lock().unwrap().try_acquire(now)
    }
}
