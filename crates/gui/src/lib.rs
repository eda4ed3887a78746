//! Tray toolkit boundary for the PeerTray indicator.
//!
//! The indicator never talks to an OS tray API directly. It goes through
//! the [`GuiProvider`] and [`TrayItem`] capability traits defined here,
//! which a platform binding (StatusNotifierItem on Linux, Shell_NotifyIcon
//! on Windows, NSStatusBar on macOS) implements on the toolkit's own
//! event-loop thread. Clicks travel back through per-item channels.
//!
//! Two in-crate implementations are provided:
//! - [`MockGuiProvider`] — records every call, used by tests
//! - [`HeadlessGuiProvider`] — logs operations, for running the agent
//!   without a desktop session

mod headless;
mod mock;
mod provider;

pub use headless::{HeadlessGuiProvider, HeadlessTrayItem};
pub use mock::{MockGuiProvider, MockTrayItem};
pub use provider::{ExitFn, GuiProvider, ReadyFn, TrayItem};
