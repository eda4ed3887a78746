//! Tray indicator state machine for the PeerTray agent.
//!
//! The [`Indicator`] owns the menu tree and the tray-visible resources
//! (icon, label, notification popups), and bridges asynchronous agent
//! notifications into thread-safe UI updates. Menu elements are
//! [`MenuNode`]s — a typed tree with an object pool for dynamically
//! sized list regions. Long-lived work runs as tokio tasks: one
//! [`Listener`] per subscribed notification channel, one [`Timer`] per
//! periodic refresh, one click-routine per connected node. A single
//! `CancellationToken` is the shutdown broadcast; per-node stop tokens
//! are children of it.
//!
//! Construction and all methods that spawn routines must run within a
//! tokio runtime context.

mod config;
mod diag;
mod icon;
mod indicator;
mod listener;
mod menu;
mod pool;
mod timer;

pub use config::{ConfigError, IndicatorConfig};
pub use icon::Icon;
pub use indicator::Indicator;
pub use listener::{Listener, ListenerCallback};
pub use menu::{MenuNode, NodeCallback, NodeType};
pub use pool::NodePool;
pub use timer::{Timer, TimerCallback};
