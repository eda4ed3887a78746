//! Recording test double for the toolkit boundary.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::provider::{ExitFn, GuiProvider, ReadyFn, TrayItem};

/// A [`GuiProvider`] that records every call instead of touching a
/// display server. Items it creates are [`MockTrayItem`]s, reachable via
/// [`items`](MockGuiProvider::items) for assertions.
#[derive(Default)]
pub struct MockGuiProvider {
    icon: Mutex<Vec<u8>>,
    icon_updates: AtomicUsize,
    title: Mutex<String>,
    separators: AtomicUsize,
    notifications: Mutex<Vec<(String, String)>>,
    items: Mutex<Vec<Arc<MockTrayItem>>>,
    on_exit: Mutex<Option<ExitFn>>,
    quit_calls: AtomicUsize,
}

impl MockGuiProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Image bytes most recently passed to `set_icon`.
    pub fn icon(&self) -> Vec<u8> {
        self.icon.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// Number of `set_icon` calls observed.
    pub fn icon_updates(&self) -> usize {
        self.icon_updates.load(Ordering::Relaxed)
    }

    /// Tray title most recently passed to `set_title`.
    pub fn title(&self) -> String {
        self.title.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// Number of separators added.
    pub fn separators(&self) -> usize {
        self.separators.load(Ordering::Relaxed)
    }

    /// All `(title, body)` notification popups shown so far.
    pub fn notifications(&self) -> Vec<(String, String)> {
        self.notifications
            .lock()
            .map(|g| g.clone())
            .unwrap_or_default()
    }

    /// All items created so far, in creation order.
    pub fn items(&self) -> Vec<Arc<MockTrayItem>> {
        self.items.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// Number of `quit` calls observed.
    pub fn quit_calls(&self) -> usize {
        self.quit_calls.load(Ordering::Relaxed)
    }
}

impl GuiProvider for MockGuiProvider {
    fn run(&self, on_ready: ReadyFn, on_exit: ExitFn) {
        if let Ok(mut slot) = self.on_exit.lock() {
            *slot = Some(on_exit);
        }
        on_ready();
    }

    fn set_icon(&self, image: &[u8]) {
        if let Ok(mut icon) = self.icon.lock() {
            *icon = image.to_vec();
        }
        self.icon_updates.fetch_add(1, Ordering::Relaxed);
    }

    fn set_title(&self, title: &str) {
        if let Ok(mut t) = self.title.lock() {
            *t = title.to_string();
        }
    }

    fn add_separator(&self) {
        self.separators.fetch_add(1, Ordering::Relaxed);
    }

    fn notify(&self, title: &str, body: &str) {
        if let Ok(mut n) = self.notifications.lock() {
            n.push((title.to_string(), body.to_string()));
        }
    }

    fn new_item(&self) -> Arc<dyn TrayItem> {
        let item = Arc::new(MockTrayItem::default());
        if let Ok(mut items) = self.items.lock() {
            items.push(Arc::clone(&item));
        }
        item
    }

    fn quit(&self) {
        self.quit_calls.fetch_add(1, Ordering::Relaxed);
        let on_exit = self.on_exit.lock().ok().and_then(|mut s| s.take());
        if let Some(on_exit) = on_exit {
            on_exit();
        }
    }
}

/// A menu item widget that only records state.
#[derive(Default)]
pub struct MockTrayItem {
    title: Mutex<String>,
    visible: AtomicBool,
    enabled: AtomicBool,
    checked: AtomicBool,
    clicks: Mutex<Option<mpsc::UnboundedSender<()>>>,
}

impl MockTrayItem {
    /// Simulates a user click: delivers one event on the wired channel.
    /// Returns `false` if no live channel is wired.
    pub fn click(&self) -> bool {
        self.clicks
            .lock()
            .ok()
            .and_then(|g| g.as_ref().map(|tx| tx.send(()).is_ok()))
            .unwrap_or(false)
    }
}

impl TrayItem for MockTrayItem {
    fn set_title(&self, title: &str) {
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
