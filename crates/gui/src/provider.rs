//! Capability traits for the native tray toolkit.

use std::sync::Arc;

use tokio::sync::mpsc;

/// Callback invoked once the toolkit event loop is ready.
pub type ReadyFn = Box<dyn FnOnce() + Send + 'static>;

/// Callback invoked after the toolkit event loop has terminated.
pub type ExitFn = Box<dyn FnOnce() + Send + 'static>;

/// Boundary to the graphic server hosting the tray indicator.
///
/// All methods must be callable from any thread; implementations are
/// responsible for marshalling onto the toolkit's single update thread.
pub trait GuiProvider: Send + Sync {
    /// Runs the toolkit event loop. Blocks the calling thread until
    /// [`quit`](Self::quit) is called, then runs `on_exit`. `on_ready`
    /// fires once the tray is available.
    fn run(&self, on_ready: ReadyFn, on_exit: ExitFn);

    /// Replaces the tray icon with the given encoded image.
    fn set_icon(&self, image: &[u8]);

    /// Sets the text label shown next to the tray icon.
    fn set_title(&self, title: &str);

    /// Appends a separator line to the tray menu.
    fn add_separator(&self);

    /// Shows a desktop notification popup.
    fn notify(&self, title: &str, body: &str);

    /// Creates a new menu item widget, initially hidden.
    fn new_item(&self) -> Arc<dyn TrayItem>;

    /// Terminates the event loop started by [`run`](Self::run).
    /// Must be a no-op when called more than once.
    fn quit(&self);
}

/// One native menu item widget.
///
/// Created once and reused across visibility toggles; the indicator never
/// destroys an item, it hides it.
pub trait TrayItem: Send + Sync {
    fn set_title(&self, title: &str);

    /// The title currently displayed by the widget.
    fn title(&self) -> String;

    fn set_visible(&self, visible: bool);

    fn visible(&self) -> bool;

    fn set_enabled(&self, enabled: bool);

    fn enabled(&self) -> bool;

    fn set_checked(&self, checked: bool);

    fn checked(&self) -> bool;

    /// Wires the sender on which the binding delivers one `()` per user
    /// click. Replaces any previously wired sender.
    fn connect_clicks(&self, clicks: mpsc::UnboundedSender<()>);
}
