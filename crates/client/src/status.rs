//! Live agent status surface.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::types::PeerDirection;

/// Snapshot-free view of the agent's peering state.
///
/// Shared via `Arc` between the connection layer (writer) and the
/// indicator's listeners and timers (readers); all fields are atomic so
/// readers never block a status push.
#[derive(Default)]
pub struct AgentStatus {
    running: AtomicBool,
    incoming: AtomicU32,
    outgoing: AtomicU32,
}

impl AgentStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the agent's mesh connection is in a running state.
    pub fn running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Relaxed);
    }

    /// Number of currently active peerings in the given direction.
    pub fn peerings(&self, direction: PeerDirection) -> u32 {
        self.counter(direction).load(Ordering::Relaxed)
    }

    pub fn set_peerings(&self, direction: PeerDirection, count: u32) {
        self.counter(direction).store(count, Ordering::Relaxed);
    }

    /// Records one new active peering.
    pub fn add_peering(&self, direction: PeerDirection) {
        self.counter(direction).fetch_add(1, Ordering::Relaxed);
    }

    /// Records one ended peering; saturates at zero.
    pub fn remove_peering(&self, direction: PeerDirection) {
        let counter = self.counter(direction);
        let mut current = counter.load(Ordering::Relaxed);
        while current > 0 {
            match counter.compare_exchange_weak(
                current,
                current - 1,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(observed) => current = observed,
            }
        }
    }

    fn counter(&self, direction: PeerDirection) -> &AtomicU32 {
        match direction {
            PeerDirection::Incoming => &self.incoming,
            PeerDirection::Outgoing => &self.outgoing,
        }
    }
}
