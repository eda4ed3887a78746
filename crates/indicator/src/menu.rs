//! Menu tree nodes.
//!
//! A [`MenuNode`] pairs model state with an owned native widget handle;
//! the two must never diverge, so every setter propagates to the widget
//! immediately. Nodes hosting sub-elements carry the relevant registry
//! (`action_map`, `option_map`, or the LIST-child pool).
//!
//! Structural mutation (registering actions/options, acquiring or
//! freeing LIST children) is single-writer: callers invoke it from the
//! toolkit event-loop thread or from one listener routine at a time.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use peertray_gui::{GuiProvider, TrayItem};

use crate::diag;
use crate::pool::NodePool;

/// Callback invoked by a node's click-routine on each click event.
pub type NodeCallback = Arc<dyn Fn() + Send + Sync + 'static>;

/// The seven node variants of the menu tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    /// Owning root of the tree; hosts the ACTION registry.
    Root,
    /// Fixed menu header.
    Title,
    /// Fixed status display.
    Status,
    /// Top-level menu action; may host OPTIONs and LIST children.
    Action,
    /// Top-level quick trigger.
    Quick,
    /// Selectable sub-choice under an ACTION.
    Option,
    /// Pooled child of a dynamically sized list region.
    List,
}

/// One element of the menu tree.
pub struct MenuNode {
    kind: NodeType,
    gui: Arc<dyn GuiProvider>,
    item: Arc<dyn TrayItem>,
    title: Mutex<String>,
    tag: Mutex<String>,
    /// Check-group name for OPTION nodes; exclusivity is caller-enforced.
    group: Mutex<String>,
    is_visible: AtomicBool,
    is_enabled: AtomicBool,
    is_checked: AtomicBool,
    is_invalid: AtomicBool,
    parent: Mutex<Weak<MenuNode>>,
    action_map: Mutex<HashMap<String, Arc<MenuNode>>>,
    option_map: Mutex<HashMap<String, Arc<MenuNode>>>,
    node_list: Mutex<Option<NodePool>>,
    clicks_tx: Mutex<mpsc::UnboundedSender<()>>,
    /// Keeps pre-connect click senders alive; dropped on first connect.
    clicks_rx: Mutex<Option<mpsc::UnboundedReceiver<()>>>,
    quit: CancellationToken,
    stop: Mutex<CancellationToken>,
    stopped: AtomicBool,
}

impl MenuNode {
    pub(crate) fn new(
        kind: NodeType,
        gui: &Arc<dyn GuiProvider>,
        quit: &CancellationToken,
    ) -> Arc<Self> {
        let item = gui.new_item();
        let (tx, rx) = mpsc::unbounded_channel();
        item.connect_clicks(tx.clone());
        item.set_visible(false);
        item.set_enabled(true);
        Arc::new(Self {
            kind,
            gui: Arc::clone(gui),
            item,
            title: Mutex::new(String::new()),
            tag: Mutex::new(String::new()),
            group: Mutex::new(String::new()),
            is_visible: AtomicBool::new(false),
            is_enabled: AtomicBool::new(true),
            is_checked: AtomicBool::new(false),
            is_invalid: AtomicBool::new(false),
            parent: Mutex::new(Weak::new()),
            action_map: Mutex::new(HashMap::new()),
            option_map: Mutex::new(HashMap::new()),
            node_list: Mutex::new(None),
            clicks_tx: Mutex::new(tx),
            clicks_rx: Mutex::new(Some(rx)),
            quit: quit.clone(),
            stop: Mutex::new(quit.child_token()),
            stopped: AtomicBool::new(false),
        })
    }

    pub fn kind(&self) -> NodeType {
        self.kind
    }

    pub fn title(&self) -> String {
        self.title.lock().map(|g| g.clone()).unwrap_or_default()
    }

    pub fn tag(&self) -> String {
        self.tag.lock().map(|g| g.clone()).unwrap_or_default()
    }

    pub fn group(&self) -> String {
        self.group.lock().map(|g| g.clone()).unwrap_or_default()
    }

    pub fn is_visible(&self) -> bool {
        self.is_visible.load(Ordering::Relaxed)
    }

    pub fn is_enabled(&self) -> bool {
        self.is_enabled.load(Ordering::Relaxed)
    }

    pub fn is_checked(&self) -> bool {
        self.is_checked.load(Ordering::Relaxed)
    }

    pub fn is_invalid(&self) -> bool {
        self.is_invalid.load(Ordering::Relaxed)
    }

    /// Whether the click-routine has been stopped (per-node disconnect
    /// or single-use completion).
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }

    pub fn parent(&self) -> Option<Arc<MenuNode>> {
        self.parent.lock().ok().and_then(|g| g.upgrade())
    }

    pub(crate) fn set_parent(&self, parent: &Arc<MenuNode>) {
        if let Ok(mut p) = self.parent.lock() {
            *p = Arc::downgrade(parent);
        }
    }

    /// The owned native widget handle.
    pub fn item(&self) -> Arc<dyn TrayItem> {
        Arc::clone(&self.item)
    }

    pub fn set_title(&self, title: &str) {
        if let Ok(mut t) = self.title.lock() {
            *t = title.to_string();
        }
        self.apply_title();
    }

    /// Tag is model state only; it has no widget counterpart.
    pub fn set_tag(&self, tag: &str) {
        if let Ok(mut t) = self.tag.lock() {
            *t = tag.to_string();
        }
    }

    pub(crate) fn set_group(&self, group: &str) {
        if let Ok(mut g) = self.group.lock() {
            *g = group.to_string();
        }
    }

    pub fn set_is_visible(&self, visible: bool) {
        self.is_visible.store(visible, Ordering::Relaxed);
        self.item.set_visible(visible);
    }

    pub fn set_is_enabled(&self, enabled: bool) {
        self.is_enabled.store(enabled, Ordering::Relaxed);
        if !self.is_invalid() {
            self.item.set_enabled(enabled);
        }
    }

    /// Checked nodes render a checkmark-prefixed title; unchecking
    /// reverts the displayed title to the plain form.
    pub fn set_is_checked(&self, checked: bool) {
        self.is_checked.store(checked, Ordering::Relaxed);
        self.item.set_checked(checked);
        self.apply_title();
    }

    /// Invalid nodes are rendered disabled until marked valid again.
    pub fn set_is_invalid(&self, invalid: bool) {
        self.is_invalid.store(invalid, Ordering::Relaxed);
        self.item.set_enabled(!invalid && self.is_enabled());
    }

    fn apply_title(&self) {
        let title = self.title();
        if self.is_checked() {
            self.item.set_title(&format!("\u{2714} {title}"));
        } else {
            self.item.set_title(&title);
        }
    }

    /// A sender delivering click events to the current click-routine.
    ///
    /// Senders obtained before a later [`connect`](Self::connect) are
    /// detached from the replacement routine.
    pub fn channel(&self) -> mpsc::UnboundedSender<()> {
        self.clicks_tx
            .lock()
            .map(|g| g.clone())
            .unwrap_or_else(|_| mpsc::unbounded_channel().0)
    }

    /// Starts (or replaces) the node's click-routine: a task that waits
    /// on the click channel and the shutdown broadcast, invoking
    /// `callback` per click. With `single_use` the routine performs one
    /// invocation, marks the node stopped, and exits.
    pub fn connect(self: &Arc<Self>, single_use: bool, callback: NodeCallback) {
        if let Ok(stop) = self.stop.lock() {
            stop.cancel();
        }

        let (tx, mut rx) = mpsc::unbounded_channel();
        self.item.connect_clicks(tx.clone());
        if let Ok(mut current) = self.clicks_tx.lock() {
            *current = tx;
        }
        if let Ok(mut initial) = self.clicks_rx.lock() {
            *initial = None;
        }

        let stop = self.quit.child_token();
        if let Ok(mut current) = self.stop.lock() {
            *current = stop.clone();
        }
        self.stopped.store(false, Ordering::Relaxed);

        let node = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = stop.cancelled() => break,
                    event = rx.recv() => match event {
                        Some(()) => {
                            diag::count_click();
                            callback();
                            if single_use {
                                node.stopped.store(true, Ordering::Relaxed);
                                break;
                            }
                        }
                        None => break,
                    },
                }
            }
            debug!(tag = %node.tag(), "click-routine stopped");
        });
    }

    /// Stops this node's click-routine without affecting siblings.
    /// Idempotent; safe to call even if never connected.
    pub fn disconnect(&self) {
        if let Ok(stop) = self.stop.lock() {
            stop.cancel();
        }
        self.stopped.store(true, Ordering::Relaxed);
    }

    /// Registers an ACTION child under this node's action registry,
    /// visible by default. A duplicate tag overwrites the previous
    /// registration; callers should treat that as a programming error.
    pub fn add_action(
        self: &Arc<Self>,
        title: &str,
        tag: &str,
        callback: Option<NodeCallback>,
    ) -> Arc<MenuNode> {
        let node = MenuNode::new(NodeType::Action, &self.gui, &self.quit);
        node.set_parent(self);
        node.set_title(title);
        node.set_tag(tag);
        if let Some(callback) = callback {
            node.connect(false, callback);
        }
        node.set_is_visible(true);
        if let Ok(mut map) = self.action_map.lock() {
            if map.insert(tag.to_string(), Arc::clone(&node)).is_some() {
                warn!(tag, "duplicate action tag overwritten");
            }
        }
        node
    }

    /// Looks up an ACTION by tag.
    pub fn action(&self, tag: &str) -> Option<Arc<MenuNode>> {
        self.action_map.lock().ok().and_then(|m| m.get(tag).cloned())
    }

    pub fn action_count(&self) -> usize {
        self.action_map.lock().map(|m| m.len()).unwrap_or(0)
    }

    /// Registers an OPTION under this ACTION. `group` names the check
    /// group the option belongs to; mutual exclusivity inside a group is
    /// enforced by callers, not by the node.
    pub fn add_option(
        self: &Arc<Self>,
        title: &str,
        tag: &str,
        group: &str,
        checked: bool,
        callback: Option<NodeCallback>,
    ) -> Arc<MenuNode> {
        let node = MenuNode::new(NodeType::Option, &self.gui, &self.quit);
        node.set_parent(self);
        node.set_title(title);
        node.set_tag(tag);
        node.set_group(group);
        if checked {
            node.set_is_checked(true);
        }
        if let Some(callback) = callback {
            node.connect(false, callback);
        }
        node.set_is_visible(true);
        if let Ok(mut map) = self.option_map.lock() {
            if map.insert(tag.to_string(), Arc::clone(&node)).is_some() {
                warn!(tag, "duplicate option tag overwritten");
            }
        }
        node
    }

    /// Looks up an OPTION by tag.
    pub fn option(&self, tag: &str) -> Option<Arc<MenuNode>> {
        self.option_map.lock().ok().and_then(|m| m.get(tag).cloned())
    }

    /// Acquires a LIST child named `name`: recycles a pooled node when
    /// one is free, otherwise allocates a new one. The node comes back
    /// titled, tagged, and visible.
    pub fn use_list_child(self: &Arc<Self>, title: &str, name: &str) -> Arc<MenuNode> {
        let node = {
            let mut guard = match self.node_list.lock() {
                Ok(g) => g,
                Err(poisoned) => poisoned.into_inner(),
            };
            let pool = guard.get_or_insert_with(NodePool::new);
            let node = pool
                .take_free()
                .unwrap_or_else(|| MenuNode::new(NodeType::List, &self.gui, &self.quit));
            pool.put_used(name.to_string(), Arc::clone(&node));
            node
        };
        node.set_parent(self);
        node.set_title(title);
        node.set_tag(name);
        node.set_is_visible(true);
        node
    }

    /// Looks up a used LIST child by name.
    pub fn list_child(&self, name: &str) -> Option<Arc<MenuNode>> {
        self.node_list
            .lock()
            .ok()
            .and_then(|g| g.as_ref().and_then(|pool| pool.get(name)))
    }

    /// Returns the named LIST child to the free pool, resetting its
    /// display state. The native widget is kept for reuse.
    pub fn free_list_child(&self, name: &str) {
        let released = self
            .node_list
            .lock()
            .ok()
            .and_then(|mut g| g.as_mut().and_then(|pool| pool.release(name)));
        if let Some(node) = released {
            node.reset_display();
        }
    }

    /// Returns every used LIST child to the free pool in one pass.
    pub fn free_list_children(&self) {
        let released = self
            .node_list
            .lock()
            .ok()
            .and_then(|mut g| g.as_mut().map(|pool| pool.release_all()))
            .unwrap_or_default();
        for node in released {
            node.reset_display();
        }
    }

    /// `(used, free)` counts of this node's LIST pool.
    pub fn list_counts(&self) -> (usize, usize) {
        self.node_list
            .lock()
            .ok()
            .and_then(|g| g.as_ref().map(|p| (p.used_count(), p.tot_free())))
            .unwrap_or((0, 0))
    }

    fn reset_display(&self) {
        self.set_is_visible(false);
        self.set_is_checked(false);
        self.set_is_invalid(false);
        self.set_is_enabled(true);
        self.set_title("");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peertray_gui::MockGuiProvider;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn root() -> (Arc<MockGuiProvider>, Arc<MenuNode>, CancellationToken) {
        let mock = MockGuiProvider::new();
        let gui: Arc<dyn GuiProvider> = Arc::clone(&mock) as Arc<dyn GuiProvider>;
        let quit = CancellationToken::new();
        let node = MenuNode::new(NodeType::Root, &gui, &quit);
        (mock, node, quit)
    }

    async fn wait_for(counter: &AtomicUsize, expected: usize) {
        for _ in 0..200 {
            if counter.load(Ordering::Relaxed) == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!(
            "counter stuck at {} (expected {expected})",
            counter.load(Ordering::Relaxed)
        );
    }

    #[test]
    fn setters_propagate_to_the_widget() {
        let (_, node, _) = root();
        let item = node.item();

        node.set_title("entry");
        assert_eq!(item.title(), "entry");

        node.set_is_visible(true);
        assert!(node.is_visible());
        assert!(item.visible());

        node.set_is_enabled(false);
        assert!(!node.is_enabled());
        assert!(!item.enabled());
        node.set_is_enabled(true);
        assert!(item.enabled());
    }

    #[test]
    fn checked_title_reverts_when_unchecked() {
        let (_, node, _) = root();
        let item = node.item();
        node.set_title("option A");

        node.set_is_checked(true);
        assert!(item.checked());
        assert_ne!(item.title(), "option A");

        node.set_is_checked(false);
        assert!(!item.checked());
        assert_eq!(item.title(), "option A");
    }

    #[test]
    fn invalid_renders_disabled_and_restores() {
        let (_, node, _) = root();
        let item = node.item();

        node.set_is_invalid(true);
        assert!(node.is_invalid());
        assert!(!item.enabled());

        // Enabling while invalid only updates the model.
        node.set_is_enabled(true);
        assert!(!item.enabled());

        node.set_is_invalid(false);
        assert!(item.enabled());
    }

    #[test]
    fn action_registration_and_lookup() {
        let (_, node, _) = root();
        let action = node.add_action("Peers", "peers", None);
        assert_eq!(action.kind(), NodeType::Action);
        assert!(action.is_visible());
        assert_eq!(action.tag(), "peers");
        assert!(action.parent().is_some());

        let found = node.action("peers").expect("registered action");
        assert!(Arc::ptr_eq(&found, &action));
        assert!(node.action("missing").is_none());
    }

    #[test]
    fn option_registration_and_lookup() {
        let (_, node, _) = root();
        let action = node.add_action("Mode", "mode", None);
        let option = action.add_option("Silent", "silent", "notify-mode", true, None);

        assert_eq!(option.kind(), NodeType::Option);
        assert_eq!(option.group(), "notify-mode");
        assert!(option.is_checked());
        assert!(option.is_visible());
        assert!(action.option("silent").is_some());
        assert!(action.option("loud").is_none());
    }

    #[test]
    fn list_children_pool_recycling() {
        let (_, node, _) = root();
        let action = node.add_action("Peers", "peers", None);

        let child1 = action.use_list_child("cluster-a", "child1");
        let child2 = action.use_list_child("cluster-b", "child2");
        assert!(child1.is_visible());
        assert_eq!(child2.title(), "cluster-b");
        assert!(action.list_child("child1").is_some());
        assert_eq!(action.list_counts(), (2, 0));

        action.free_list_child("child2");
        assert_eq!(action.list_counts(), (1, 1));
        assert!(action.list_child("child2").is_none());
        assert!(!child2.is_visible());

        // Recycling reuses the pooled widget instead of allocating.
        let recycled = action.use_list_child("cluster-c", "child3");
        assert!(Arc::ptr_eq(&recycled, &child2));
        assert_eq!(recycled.title(), "cluster-c");
        assert_eq!(action.list_counts(), (2, 0));

        action.free_list_children();
        assert_eq!(action.list_counts(), (0, 2));
    }

    #[tokio::test]
    async fn connect_runs_callback_per_click() {
        let (_, node, _) = root();
        let action = node.add_action("Ping", "ping", None);

        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        action.connect(
            false,
            Arc::new(move || {
                h.fetch_add(1, Ordering::Relaxed);
            }),
        );

        let clicks = action.channel();
        clicks.send(()).expect("send click");
        wait_for(&hits, 1).await;
        clicks.send(()).expect("send click");
        wait_for(&hits, 2).await;
    }

    #[tokio::test]
    async fn single_use_runs_once_and_stops() {
        let (_, node, _) = root();
        let action = node.add_action("Confirm", "confirm", None);

        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        action.connect(
            true,
            Arc::new(move || {
                h.fetch_add(1, Ordering::Relaxed);
            }),
        );

        let clicks = action.channel();
        clicks.send(()).expect("send click");
        wait_for(&hits, 1).await;

        clicks.send(()).expect("channel still open");
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(hits.load(Ordering::Relaxed), 1);
        assert!(action.is_stopped());
    }

    #[tokio::test]
    async fn disconnect_stops_callback_delivery() {
        let (_, node, _) = root();
        let action = node.add_action("Ping", "ping", None);

        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        action.connect(
            false,
            Arc::new(move || {
                h.fetch_add(1, Ordering::Relaxed);
            }),
        );
        let clicks = action.channel();
        clicks.send(()).expect("send click");
        wait_for(&hits, 1).await;

        action.disconnect();
        assert!(action.is_stopped());
        // Idempotent.
        action.disconnect();
        assert!(action.is_stopped());

        tokio::time::sleep(Duration::from_millis(20)).await;
        let _ = clicks.send(());
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(hits.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn quit_broadcast_stops_click_routines() {
        let (_, node, quit) = root();
        let action = node.add_action("Ping", "ping", None);

        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        action.connect(
            false,
            Arc::new(move || {
                h.fetch_add(1, Ordering::Relaxed);
            }),
        );
        let clicks = action.channel();

        quit.cancel();
        tokio::time::sleep(Duration::from_millis(20)).await;
        let _ = clicks.send(());
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(hits.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn mock_item_click_reaches_the_callback() {
        let (mock, node, _) = root();
        let action = node.add_action("Ping", "ping", None);

        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        action.connect(
            false,
            Arc::new(move || {
                h.fetch_add(1, Ordering::Relaxed);
            }),
        );

        // The action's widget is the second item created (root is first).
        let items = mock.items();
        assert!(items[1].click());
        wait_for(&hits, 1).await;
    }
}
