//! Connection/role state shared between the network tasks and the host loop
//!
//! Every flag is an atomic; readers may observe a value one update stale,
//! which is acceptable for all callers.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, AtomicUsize, Ordering};

/// Role assigned by the relay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Leader,
    Follower,
}

const UNASSIGNED: u8 = 0;
const LEADER: u8 = 1;
const FOLLOWER: u8 = 2;

#[derive(Debug)]
pub struct Session {
    connected: AtomicBool,
    role: AtomicU8,
    enabled: AtomicBool,
    suppress_depth: AtomicUsize,
    generation: AtomicU64,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            connected: AtomicBool::new(false),
            role: AtomicU8::new(UNASSIGNED),
            enabled: AtomicBool::new(true),
            suppress_depth: AtomicUsize::new(0),
            generation: AtomicU64::new(0),
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// `None` until the relay assigns a role on the current connection
    pub fn role(&self) -> Option<Role> {
        match self.role.load(Ordering::Acquire) {
            LEADER => Some(Role::Leader),
            FOLLOWER => Some(Role::Follower),
            _ => None,
        }
    }

    pub fn set_role(&self, role: Role) {
        let raw = match role {
            Role::Leader => LEADER,
            Role::Follower => FOLLOWER,
        };
        self.role.store(raw, Ordering::Release);
    }

    pub fn is_leader(&self) -> bool {
        self.role() == Some(Role::Leader)
    }

    pub fn is_follower(&self) -> bool {
        self.role() == Some(Role::Follower)
    }

    /// Global sync switch (PAUSE / RESUME / TOGGLE_SYNC)
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    /// Flip the sync switch, returning the new state
    pub fn toggle(&self) -> bool {
        !self.enabled.fetch_xor(true, Ordering::AcqRel)
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppress_depth.load(Ordering::Acquire) > 0
    }

    /// Suppress outbound traffic until the returned guard is dropped.
    /// Guards nest. The depth is shared by every thread using this session,
    /// not scoped per thread.
    pub fn suppress(&self) -> SuppressGuard<'_> {
        self.suppress_depth.fetch_add(1, Ordering::AcqRel);
        SuppressGuard { session: self }
    }

    /// The single gate for emitting leader traffic
    pub fn is_active(&self) -> bool {
        self.is_connected() && self.is_enabled() && self.is_leader() && !self.is_suppressed()
    }

    /// Counter bumped on every successful connect
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Record a fresh connection: connected, no role yet. Returns its generation.
    pub fn mark_connected(&self) -> u64 {
        self.role.store(UNASSIGNED, Ordering::Release);
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.connected.store(true, Ordering::Release);
        generation
    }

    /// Back to disconnected and unassigned
    pub fn reset(&self) {
        self.connected.store(false, Ordering::Release);
        self.role.store(UNASSIGNED, Ordering::Release);
    }

    /// Reset only if `generation` is still the current connection
    pub fn reset_if(&self, generation: u64) -> bool {
        if self.generation() != generation {
            return false;
        }
        self.reset();
        true
    }
}

/// Keeps outbound traffic suppressed while alive
#[must_use = "suppression ends as soon as the guard is dropped"]
#[derive(Debug)]
pub struct SuppressGuard<'a> {
    session: &'a Session,
}

impl Drop for SuppressGuard<'_> {
    fn drop(&mut self) {
        self.session.suppress_depth.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leader() -> Session {
        let session = Session::new();
        session.mark_connected();
        session.set_role(Role::Leader);
        session
    }

    #[test]
    fn active_requires_every_condition() {
        let session = Session::new();
        assert!(!session.is_active());

        session.mark_connected();
        assert!(!session.is_active(), "no role yet");

        session.set_role(Role::Leader);
        assert!(session.is_active());

        session.set_enabled(false);
        assert!(!session.is_active());
        assert!(session.toggle());
        assert!(session.is_active());
    }

    #[test]
    fn nested_guards_release_in_order() {
        let session = leader();
        {
            let _outer = session.suppress();
            {
                let _inner = session.suppress();
                assert!(!session.is_active());
            }
            assert!(!session.is_active());
        }
        assert!(session.is_active());
    }

    #[test]
    fn stale_generation_cannot_reset() {
        let session = leader();
        let first = session.generation();
        let second = session.mark_connected();
        session.set_role(Role::Follower);

        assert!(!session.reset_if(first));
        assert!(session.is_connected());
        assert!(session.reset_if(second));
        assert!(!session.is_connected());
        assert_eq!(session.role(), None);
    }
}
