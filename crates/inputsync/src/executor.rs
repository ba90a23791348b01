//! Main-thread work queue
//!
//! Lines arrive on the network task but host state may only be touched on the
//! host's main thread. Handlers submit closures here; the tick drains them.

use crate::host::Host;
use crate::replica::{ApplyError, Replica};
use inputsync_introspect::StructuralResolver;
use inputsync_network::Message;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::warn;

/// Everything a queued job may touch
pub struct ApplyScope<'a> {
    pub host: &'a mut dyn Host,
    pub resolver: &'a mut StructuralResolver,
    pub replica: &'a mut Replica,
}

impl ApplyScope<'_> {
    pub fn apply(&mut self, message: Message) -> Result<(), ApplyError> {
        self.replica.apply(&mut *self.host, &mut *self.resolver, message)
    }
}

pub type Job = Box<dyn FnOnce(&mut ApplyScope<'_>) + Send>;

pub struct MainThreadQueue {
    tx: mpsc::UnboundedSender<Job>,
    rx: Mutex<mpsc::UnboundedReceiver<Job>>,
}

impl MainThreadQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(rx),
        }
    }

    /// Callable from any thread
    pub fn submit(&self, job: Job) {
        if self.tx.send(job).is_err() {
            warn!("Main-thread queue closed; dropping job");
        }
    }

    /// Run every queued job in submission order. Returns how many ran.
    pub fn drain(&self, scope: &mut ApplyScope<'_>) -> usize {
        let mut rx = self.rx.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut ran = 0;
        while let Ok(job) = rx.try_recv() {
            job(scope);
            ran += 1;
        }
        ran
    }
}

impl Default for MainThreadQueue {
    fn default() -> Self {
        Self::new()
    }
}
