//! Agent connection facade and notification hub.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::status::AgentStatus;
use crate::types::{NotifyChannel, NotifyEvent};

/// Facade over the background mesh agent connection.
///
/// Tracks connectivity and configuration validity, owns the shared
/// [`AgentStatus`], and fans push notifications out to per-category
/// subscriber channels.
pub struct AgentClient {
    connected: AtomicBool,
    valid_configuration: AtomicBool,
    caches_running: AtomicBool,
    status: Arc<AgentStatus>,
    subscribers: Mutex<HashMap<NotifyChannel, Vec<mpsc::UnboundedSender<NotifyEvent>>>>,
}

impl AgentClient {
    fn new(connected: bool, valid_configuration: bool) -> Arc<Self> {
        Arc::new(Self {
            connected: AtomicBool::new(connected),
            valid_configuration: AtomicBool::new(valid_configuration),
            caches_running: AtomicBool::new(connected),
            status: Arc::new(AgentStatus::new()),
            subscribers: Mutex::new(HashMap::new()),
        })
    }

    /// A client whose agent connection is up with a valid configuration.
    pub fn connected() -> Arc<Self> {
        Self::new(true, true)
    }

    /// A client with no agent connection behind it.
    pub fn disconnected() -> Arc<Self> {
        Self::new(false, false)
    }

    /// A connected client whose configuration retrieval failed.
    pub fn misconfigured() -> Arc<Self> {
        Self::new(true, false)
    }

    /// Whether the agent connection is up.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Relaxed);
    }

    /// Whether the agent retrieved a valid configuration.
    pub fn valid_configuration(&self) -> bool {
        self.valid_configuration.load(Ordering::Relaxed)
    }

    /// The shared status surface.
    pub fn status(&self) -> Arc<AgentStatus> {
        Arc::clone(&self.status)
    }

    /// Stops the agent's background caches. No-op when already stopped.
    pub fn stop_caches(&self) {
        if self.caches_running.swap(false, Ordering::Relaxed) {
            info!("agent caches stopped");
        }
    }

    /// Whether the background caches are running.
    pub fn caches_running(&self) -> bool {
        self.caches_running.load(Ordering::Relaxed)
    }

    /// Subscribes to one event category. Every subscriber of a channel
    /// receives every event pushed on it.
    pub fn subscribe(&self, channel: NotifyChannel) -> mpsc::UnboundedReceiver<NotifyEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.entry(channel).or_default().push(tx);
        }
        rx
    }

    /// Pushes an event to all subscribers of its channel, dropping
    /// subscribers whose receiver is gone. No subscribers is a no-op.
    pub fn notify(&self, event: NotifyEvent) {
        let Ok(mut subs) = self.subscribers.lock() else {
            return;
        };
        let Some(senders) = subs.get_mut(&event.channel) else {
            return;
        };
        senders.retain(|tx| tx.send(event.clone()).is_ok());
        debug!(channel = ?event.channel, subscribers = senders.len(), "notification dispatched");
    }
}
