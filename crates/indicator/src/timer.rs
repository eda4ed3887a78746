//! Periodic refresh routines.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::diag;

/// Callback invoked on each tick.
pub type TimerCallback = Arc<dyn Fn() + Send + Sync + 'static>;

/// A named routine firing a callback on a fixed interval, for refresh
/// tasks not driven by push notifications.
pub struct Timer {
    name: String,
    period: Duration,
    cancel: CancellationToken,
}

impl Timer {
    pub(crate) fn spawn(
        name: &str,
        period: Duration,
        callback: TimerCallback,
        quit: &CancellationToken,
    ) -> Self {
        let cancel = quit.child_token();
        let token = cancel.clone();
        let task_name = name.to_string();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // Skip the immediate first tick.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        diag::count_tick();
                        callback();
                    }
                }
            }
            debug!(timer = %task_name, "timer stopped");
        });
        Self {
            name: name.to_string(),
            period,
            cancel,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Stops this timer ahead of the global shutdown.
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}
