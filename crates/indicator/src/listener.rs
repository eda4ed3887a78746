//! Listener routines bridging agent notifications into UI mutations.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use peertray_client::{NotifyChannel, NotifyEvent};

use crate::diag;

/// Callback invoked with each notification received on the channel.
pub type ListenerCallback = Arc<dyn Fn(NotifyEvent) + Send + Sync + 'static>;

/// A long-lived routine bound to one notification channel.
///
/// Runs until the shutdown broadcast fires, the notification channel
/// closes, or the listener is replaced. Never blocks indicator
/// shutdown: the loop always selects over the cancellation token.
pub struct Listener {
    channel: NotifyChannel,
    cancel: CancellationToken,
}

impl Listener {
    pub(crate) fn spawn(
        channel: NotifyChannel,
        mut events: mpsc::UnboundedReceiver<NotifyEvent>,
        callback: ListenerCallback,
        quit: &CancellationToken,
    ) -> Self {
        let cancel = quit.child_token();
        let token = cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    event = events.recv() => match event {
                        Some(event) => {
                            diag::count_event();
                            callback(event);
                        }
                        // Source gone: terminal for this routine.
                        None => break,
                    },
                }
            }
            debug!(channel = ?channel, "listener stopped");
        });
        Self { channel, cancel }
    }

    /// The notification channel this listener is bound to.
    pub fn channel(&self) -> NotifyChannel {
        self.channel
    }

    /// Stops this listener ahead of the global shutdown.
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}
