//! Process-wide diagnostics counters, flushed at quit.

use std::sync::atomic::{AtomicU64, Ordering};

static ICON_UPDATES: AtomicU64 = AtomicU64::new(0);
static LABEL_UPDATES: AtomicU64 = AtomicU64::new(0);
static CLICKS_DISPATCHED: AtomicU64 = AtomicU64::new(0);
static EVENTS_DELIVERED: AtomicU64 = AtomicU64::new(0);
static TIMER_TICKS: AtomicU64 = AtomicU64::new(0);

pub(crate) fn count_icon_update() {
    ICON_UPDATES.fetch_add(1, Ordering::Relaxed);
}

pub(crate) fn count_label_update() {
    LABEL_UPDATES.fetch_add(1, Ordering::Relaxed);
}

pub(crate) fn count_click() {
    CLICKS_DISPATCHED.fetch_add(1, Ordering::Relaxed);
}

pub(crate) fn count_event() {
    EVENTS_DELIVERED.fetch_add(1, Ordering::Relaxed);
}

pub(crate) fn count_tick() {
    TIMER_TICKS.fetch_add(1, Ordering::Relaxed);
}

/// Logs all counters. Called from `Indicator::quit`.
pub(crate) fn dump() {
    tracing::info!(
        icon_updates = ICON_UPDATES.load(Ordering::Relaxed),
        label_updates = LABEL_UPDATES.load(Ordering::Relaxed),
        clicks_dispatched = CLICKS_DISPATCHED.load(Ordering::Relaxed),
        events_delivered = EVENTS_DELIVERED.load(Ordering::Relaxed),
        timer_ticks = TIMER_TICKS.load(Ordering::Relaxed),
        "indicator diagnostics"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment() {
        let before = CLICKS_DISPATCHED.load(Ordering::Relaxed);
        count_click();
        assert!(CLICKS_DISPATCHED.load(Ordering::Relaxed) > before);
        dump();
    }
}
