//! Headless provider for running the agent without a desktop session.
//!
//! Every tray operation is logged through `tracing` instead of drawn.
//! `run` blocks the calling thread the way a real toolkit event loop
//! would, until `quit` is called.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::provider::{ExitFn, GuiProvider, ReadyFn, TrayItem};

/// A [`GuiProvider`] with no display server behind it.
#[derive(Default)]
pub struct HeadlessGuiProvider {
    quit_flag: Mutex<bool>,
    quit_cond: Condvar,
    on_exit: Mutex<Option<ExitFn>>,
    items: AtomicUsize,
}

impl HeadlessGuiProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl GuiProvider for HeadlessGuiProvider {
    fn run(&self, on_ready: ReadyFn, on_exit: ExitFn) {
        if let Ok(mut slot) = self.on_exit.lock() {
            *slot = Some(on_exit);
        }
        info!("headless tray ready");
        on_ready();

        if let Ok(mut quit) = self.quit_flag.lock() {
            while !*quit {
                match self.quit_cond.wait(quit) {
                    Ok(g) => quit = g,
                    Err(_) => return,
                }
            }
        }
        let on_exit = self.on_exit.lock().ok().and_then(|mut s| s.take());
        if let Some(on_exit) = on_exit {
            on_exit();
        }
        info!("headless tray exited");
    }

    fn set_icon(&self, image: &[u8]) {
        debug!(bytes = image.len(), "tray icon updated");
    }

    fn set_title(&self, title: &str) {
        debug!(title, "tray title updated");
    }

    fn add_separator(&self) {
        debug!("separator added");
    }

    fn notify(&self, title: &str, body: &str) {
        info!(title, body, "desktop notification");
    }

    fn new_item(&self) -> Arc<dyn TrayItem> {
        let id = self.items.fetch_add(1, Ordering::Relaxed);
        Arc::new(HeadlessTrayItem {
            id,
            ..HeadlessTrayItem::default()
        })
    }

    fn quit(&self) {
        if let Ok(mut quit) = self.quit_flag.lock() {
            *quit = true;
        }
        self.quit_cond.notify_all();
    }
}

/// Menu item counterpart of [`HeadlessGuiProvider`].
#[derive(Default)]
pub struct HeadlessTrayItem {
    id: usize,
    title: Mutex<String>,
    visible: AtomicBool,
    enabled: AtomicBool,
    checked: AtomicBool,
    clicks: Mutex<Option<mpsc::UnboundedSender<()>>>,
}

impl TrayItem for HeadlessTrayItem {
    fn set_title(&self, title: &str) {
        debug!(item = self.id, title, "item title");
        if let Ok(mut t) = self.title.lock() {
            *t = title.to_string();
        }
    }

    fn title(&self) -> String {
        self.title.lock().map(|g| g.clone()).unwrap_or_default()
    }

    fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::Relaxed);
    }

    fn visible(&self) -> bool {
        self.visible.load(Ordering::Relaxed)
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    fn enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    fn set_checked(&self, checked: bool) {
        self.checked.store(checked, Ordering::Relaxed);
    }

    fn checked(&self) -> bool {
        self.checked.load(Ordering::Relaxed)
    }

    fn connect_clicks(&self, clicks: mpsc::UnboundedSender<()>) {
        if let Ok(mut slot) = self.clicks.lock() {
            *slot = Some(clicks);
        }
    }
}
