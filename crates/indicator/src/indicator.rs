//! The indicator: owner of the menu tree and tray-visible resources.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock, Weak};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use peertray_client::{AgentClient, NotifyChannel, PeerDirection};
use peertray_gui::GuiProvider;

use crate::config::IndicatorConfig;
use crate::diag;
use crate::icon::Icon;
use crate::listener::{Listener, ListenerCallback};
use crate::menu::{MenuNode, NodeCallback, NodeType};
use crate::timer::{Timer, TimerCallback};

/// Stateful controller of the tray indicator and its menu.
///
/// Owns the menu tree root, the fixed TITLE/STATUS nodes, the registries
/// of quick entries, listeners and timers, and one lock per tray-visible
/// resource (icon, label, notification popups). Intended to be
/// constructed once per process, before the toolkit event loop takes
/// over the main thread.
pub struct Indicator {
    gui: Arc<dyn GuiProvider>,
    client: Arc<AgentClient>,
    config: IndicatorConfig,
    menu: Arc<MenuNode>,
    menu_title_node: Arc<MenuNode>,
    menu_title_text: Mutex<String>,
    menu_status_node: Arc<MenuNode>,
    quick_map: Mutex<HashMap<String, Arc<MenuNode>>>,
    /// The currently selected ACTION, or the root when none.
    active_node: Mutex<Weak<MenuNode>>,
    icon: RwLock<Icon>,
    label: RwLock<String>,
    /// Serializes desktop notification popups.
    notification: RwLock<()>,
    listeners: Mutex<HashMap<NotifyChannel, Listener>>,
    timers: Mutex<HashMap<String, Timer>>,
    quit: CancellationToken,
}

impl Indicator {
    /// Builds the indicator: fixed nodes, initial icon by connectivity,
    /// degraded error states when the agent is unreachable or
    /// misconfigured.
    pub fn new(
        gui: Arc<dyn GuiProvider>,
        client: Arc<AgentClient>,
        config: IndicatorConfig,
    ) -> Arc<Self> {
        let quit = CancellationToken::new();
        let menu_title_node = MenuNode::new(NodeType::Title, &gui, &quit);
        let menu = MenuNode::new(NodeType::Root, &gui, &quit);
        let menu_status_node = MenuNode::new(NodeType::Status, &gui, &quit);

        let indicator = Arc::new(Self {
            gui,
            client,
            config,
            menu,
            menu_title_node,
            menu_title_text: Mutex::new(String::new()),
            menu_status_node,
            quick_map: Mutex::new(HashMap::new()),
            active_node: Mutex::new(Weak::new()),
            icon: RwLock::new(Icon::Nil),
            label: RwLock::new(String::new()),
            notification: RwLock::new(()),
            listeners: Mutex::new(HashMap::new()),
            timers: Mutex::new(HashMap::new()),
            quit,
        });

        indicator.deselect_action();
        indicator.set_icon(Icon::NoConn);
        indicator.set_label("");

        if !indicator.client.is_connected() {
            indicator.show_error_no_connection();
        } else if !indicator.client.valid_configuration() {
            indicator.set_icon(Icon::Warning);
            indicator.show_error(
                "PeerTray Agent",
                "agent could not retrieve configuration data",
            );
        } else {
            indicator.set_icon(Icon::Main);
        }

        info!(
            connected = indicator.client.is_connected(),
            "indicator initialized"
        );
        indicator
    }

    /// The root of the menu tree.
    pub fn menu(&self) -> Arc<MenuNode> {
        Arc::clone(&self.menu)
    }

    /// The fixed STATUS node.
    pub fn status_node(&self) -> Arc<MenuNode> {
        Arc::clone(&self.menu_status_node)
    }

    /// The agent client this indicator observes.
    pub fn client(&self) -> Arc<AgentClient> {
        Arc::clone(&self.client)
    }

    /// Adds an ACTION to the menu, visible by default, registered under
    /// `tag` in the root's action registry.
    pub fn add_action(
        &self,
        title: &str,
        tag: &str,
        callback: Option<NodeCallback>,
    ) -> Arc<MenuNode> {
        self.menu.add_action(title, tag, callback)
    }

    /// Looks up an ACTION by tag.
    pub fn action(&self, tag: &str) -> Option<Arc<MenuNode>> {
        self.menu.action(tag)
    }

    /// Adds a QUICK to the menu, visible by default, registered under
    /// `tag` in the quick registry. A duplicate tag overwrites the
    /// previous registration.
    pub fn add_quick(
        &self,
        title: &str,
        tag: &str,
        callback: Option<NodeCallback>,
    ) -> Arc<MenuNode> {
        let node = MenuNode::new(NodeType::Quick, &self.gui, &self.quit);
        node.set_parent(&self.menu);
        node.set_title(title);
        node.set_tag(tag);
        if let Some(callback) = callback {
            node.connect(false, callback);
        }
        node.set_is_visible(true);
        if let Ok(mut map) = self.quick_map.lock() {
            if map.insert(tag.to_string(), Arc::clone(&node)).is_some() {
                tracing::warn!(tag, "duplicate quick tag overwritten");
            }
        }
        node
    }

    /// Looks up a QUICK by tag.
    pub fn quick(&self, tag: &str) -> Option<Arc<MenuNode>> {
        self.quick_map.lock().ok().and_then(|m| m.get(tag).cloned())
    }

    pub fn quick_count(&self) -> usize {
        self.quick_map.lock().map(|m| m.len()).unwrap_or(0)
    }

    /// Appends a separator line to the menu.
    pub fn add_separator(&self) {
        self.gui.add_separator();
    }

    /// Sets the menu header shown by the TITLE node.
    pub fn set_menu_title(&self, title: &str) {
        self.menu_title_node.set_title(title);
        self.menu_title_node.set_is_visible(true);
        if let Ok(mut text) = self.menu_title_text.lock() {
            *text = title.to_string();
        }
    }

    /// The menu header text currently in use.
    pub fn menu_title(&self) -> String {
        self.menu_title_text
            .lock()
            .map(|g| g.clone())
            .unwrap_or_default()
    }

    /// Updates the STATUS node's display text.
    pub fn refresh_status(&self, text: &str) {
        self.menu_status_node.set_title(text);
        self.menu_status_node.set_is_visible(true);
    }

    /// The tray icon currently set.
    pub fn icon(&self) -> Icon {
        self.icon.read().map(|g| *g).unwrap_or(Icon::Nil)
    }

    /// Sets the tray icon. [`Icon::Nil`] (or anything that does not
    /// resolve to an image) is ignored.
    pub fn set_icon(&self, icon: Icon) {
        let Some(image) = icon.resolve() else {
            debug!(icon = ?icon, "ignored unresolvable tray icon");
            return;
        };
        if let Ok(mut current) = self.icon.write() {
            self.gui.set_icon(image);
            *current = icon;
            diag::count_icon_update();
        }
    }

    /// The tray label text currently set.
    pub fn label(&self) -> String {
        self.label.read().map(|g| g.clone()).unwrap_or_default()
    }

    /// Sets the tray label text.
    pub fn set_label(&self, label: &str) {
        if let Ok(mut current) = self.label.write() {
            self.gui.set_title(label);
            *current = label.to_string();
            diag::count_label_update();
        }
    }

    /// Recomputes the tray label from the current peering counts. The
    /// label is visually intrusive, so it is displayed only while the
    /// connection is running with at least one active peering.
    pub fn refresh_label(&self) {
        let status = self.client.status();
        let incoming = status.peerings(PeerDirection::Incoming);
        let outgoing = status.peerings(PeerDirection::Outgoing);
        if self.config.label_enabled && status.running() && (incoming > 0 || outgoing > 0) {
            self.set_label(&format!("(IN:{incoming}/OUT:{outgoing})"));
        } else {
            self.set_label("");
        }
    }

    /// Shows an error popup, honoring the notification config switch.
    pub fn show_error(&self, title: &str, body: &str) {
        if !self.config.notifications_enabled {
            return;
        }
        if let Ok(_serialized) = self.notification.write() {
            self.gui.notify(title, body);
        }
    }

    /// Degraded no-connection state: `NoConn` icon plus an error popup.
    pub fn show_error_no_connection(&self) {
        self.set_icon(Icon::NoConn);
        self.show_error("PeerTray Agent", "no connection to the mesh agent");
    }

    /// Marks the ACTION with this tag as the currently selected node.
    pub fn select_action(&self, tag: &str) -> Option<Arc<MenuNode>> {
        let node = self.menu.action(tag)?;
        if let Ok(mut active) = self.active_node.lock() {
            *active = Arc::downgrade(&node);
        }
        Some(node)
    }

    /// Resets the selection back to the root.
    pub fn deselect_action(&self) {
        if let Ok(mut active) = self.active_node.lock() {
            *active = Arc::downgrade(&self.menu);
        }
    }

    /// The currently selected ACTION, or the root when none.
    pub fn active_node(&self) -> Arc<MenuNode> {
        self.active_node
            .lock()
            .ok()
            .and_then(|g| g.upgrade())
            .unwrap_or_else(|| Arc::clone(&self.menu))
    }

    /// Subscribes a listener routine to one notification channel.
    /// Re-listening on the same channel replaces the previous routine.
    pub fn listen(&self, channel: NotifyChannel, callback: ListenerCallback) {
        let events = self.client.subscribe(channel);
        let listener = Listener::spawn(channel, events, callback, &self.quit);
        if let Ok(mut listeners) = self.listeners.lock() {
            if let Some(previous) = listeners.insert(channel, listener) {
                previous.stop();
            }
        }
    }

    /// Starts a named periodic refresh routine. Re-registering a name
    /// replaces the previous timer.
    pub fn start_timer(&self, name: &str, period: Duration, callback: TimerCallback) {
        let timer = Timer::spawn(name, period, callback, &self.quit);
        if let Ok(mut timers) = self.timers.lock() {
            if let Some(previous) = timers.insert(name.to_string(), timer) {
                previous.stop();
            }
        }
    }

    /// Broadcasts the shutdown signal to every listener, timer, and node
    /// click-routine. Idempotent.
    pub fn disconnect(&self) {
        if !self.quit.is_cancelled() {
            self.quit.cancel();
            debug!("quit signal broadcast");
        }
    }

    /// Whether the shutdown broadcast has fired.
    pub fn is_disconnected(&self) -> bool {
        self.quit.is_cancelled()
    }

    /// Stops the indicator: flushes diagnostics, broadcasts shutdown,
    /// stops the agent caches when connected, and terminates the toolkit
    /// event loop. Safe to call more than once.
    pub fn quit(&self) {
        diag::dump();
        self.disconnect();
        if self.client.is_connected() {
            self.client.stop_caches();
        }
        self.gui.quit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peertray_client::NotifyEvent;
    use peertray_gui::MockGuiProvider;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn indicator_with(client: Arc<AgentClient>) -> (Arc<MockGuiProvider>, Arc<Indicator>) {
        let mock = MockGuiProvider::new();
        let gui: Arc<dyn GuiProvider> = Arc::clone(&mock) as Arc<dyn GuiProvider>;
        let config = IndicatorConfig::default();
        let indicator = Indicator::new(gui, client, config);
        (mock, indicator)
    }

    fn connected_indicator() -> (Arc<MockGuiProvider>, Arc<Indicator>) {
        indicator_with(AgentClient::connected())
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
    fn startup_connected_shows_main_icon() {
        let (mock, indicator) = connected_indicator();
        assert_eq!(indicator.icon(), Icon::Main);
        assert!(mock.notifications().is_empty());
        assert!(Arc::ptr_eq(&indicator.active_node(), &indicator.menu()));
    }

    #[test]
    fn startup_disconnected_degrades() {
        let (mock, indicator) = indicator_with(AgentClient::disconnected());
        assert_eq!(indicator.icon(), Icon::NoConn);
        assert_eq!(mock.notifications().len(), 1);
    }

    #[test]
    fn startup_misconfigured_degrades() {
        let (mock, indicator) = indicator_with(AgentClient::misconfigured());
        assert_eq!(indicator.icon(), Icon::Warning);
        assert_eq!(mock.notifications().len(), 1);
    }

    #[test]
    fn set_icon_round_trips_and_reaches_the_gui() {
        let (mock, indicator) = connected_indicator();
        indicator.set_icon(Icon::Green);
        assert_eq!(indicator.icon(), Icon::Green);
        assert_eq!(mock.icon(), Icon::Green.resolve().expect("asset"));
    }

    #[test]
    fn set_icon_nil_is_a_noop() {
        let (_, indicator) = connected_indicator();
        indicator.set_icon(Icon::Cyan);
        indicator.set_icon(Icon::Nil);
        assert_eq!(indicator.icon(), Icon::Cyan);
    }

    #[test]
    fn set_label_round_trips() {
        let (mock, indicator) = connected_indicator();
        indicator.set_label("test");
        assert_eq!(indicator.label(), "test");
        assert_eq!(mock.title(), "test");

        indicator.set_label("");
        assert_eq!(indicator.label(), "");
    }

    #[test]
    fn refresh_label_shows_counts_only_while_running_and_peered() {
        let (_, indicator) = connected_indicator();
        let status = indicator.client().status();

        // Not running: cleared even with peerings.
        status.set_peerings(PeerDirection::Incoming, 2);
        indicator.refresh_label();
        assert_eq!(indicator.label(), "");

        status.set_running(true);
        indicator.refresh_label();
        assert_eq!(indicator.label(), "(IN:2/OUT:0)");

        status.set_peerings(PeerDirection::Outgoing, 3);
        indicator.refresh_label();
        assert_eq!(indicator.label(), "(IN:2/OUT:3)");

        // Running but idle: cleared.
        status.set_peerings(PeerDirection::Incoming, 0);
        status.set_peerings(PeerDirection::Outgoing, 0);
        indicator.refresh_label();
        assert_eq!(indicator.label(), "");
    }

    #[test]
    fn action_and_quick_registration() {
        let (_, indicator) = connected_indicator();
        let action = indicator.add_action("Peers", "peers", None);
        assert!(action.is_visible());
        assert!(indicator.action("peers").is_some());
        assert!(indicator.action("missing").is_none());

        indicator.add_quick("About", "about", None);
        indicator.add_quick("Quit", "quit", None);
        assert_eq!(indicator.quick_count(), 2);
        assert!(indicator.quick("about").is_some());
        assert!(indicator.quick("missing").is_none());
    }

    #[test]
    fn menu_title_and_status() {
        let (_, indicator) = connected_indicator();
        indicator.set_menu_title("PeerTray");
        assert_eq!(indicator.menu_title(), "PeerTray");
        assert!(indicator.menu().action("PeerTray").is_none());

        indicator.refresh_status("2 peers active");
        let status = indicator.status_node();
        assert!(status.is_visible());
        assert_eq!(status.title(), "2 peers active");
    }

    #[test]
    fn select_and_deselect_action() {
        let (_, indicator) = connected_indicator();
        let action = indicator.add_action("Peers", "peers", None);

        let selected = indicator.select_action("peers").expect("selected");
        assert!(Arc::ptr_eq(&selected, &action));
        assert!(Arc::ptr_eq(&indicator.active_node(), &action));

        assert!(indicator.select_action("missing").is_none());
        assert!(Arc::ptr_eq(&indicator.active_node(), &action));

        indicator.deselect_action();
        assert!(Arc::ptr_eq(&indicator.active_node(), &indicator.menu()));
    }

    #[test]
    fn separator_delegates_to_the_gui() {
        let (mock, indicator) = connected_indicator();
        indicator.add_separator();
        assert_eq!(mock.separators(), 1);
    }

    #[test]
    fn notifications_respect_the_config_switch() {
        let mock = MockGuiProvider::new();
        let gui: Arc<dyn GuiProvider> = Arc::clone(&mock) as Arc<dyn GuiProvider>;
        let config = IndicatorConfig {
            notifications_enabled: false,
            ..IndicatorConfig::default()
        };
        let indicator = Indicator::new(gui, AgentClient::connected(), config);

        indicator.show_error("title", "body");
        assert!(mock.notifications().is_empty());
    }

    #[tokio::test]
    async fn listener_bridges_events_into_mutations() {
        let (_, indicator) = connected_indicator();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        indicator.listen(
            NotifyChannel::PeeringAdded,
            Arc::new(move |_event| {
                h.fetch_add(1, Ordering::Relaxed);
            }),
        );

        indicator
            .client()
            .notify(NotifyEvent::new(NotifyChannel::PeeringAdded));
        wait_for(&hits, 1).await;
    }

    #[tokio::test]
    async fn relisten_replaces_the_previous_routine() {
        let (_, indicator) = connected_indicator();
        let old_hits = Arc::new(AtomicUsize::new(0));
        let new_hits = Arc::new(AtomicUsize::new(0));

        let h = Arc::clone(&old_hits);
        indicator.listen(
            NotifyChannel::Connectivity,
            Arc::new(move |_| {
                h.fetch_add(1, Ordering::Relaxed);
            }),
        );
        let h = Arc::clone(&new_hits);
        indicator.listen(
            NotifyChannel::Connectivity,
            Arc::new(move |_| {
                h.fetch_add(1, Ordering::Relaxed);
            }),
        );

        tokio::time::sleep(Duration::from_millis(20)).await;
        indicator
            .client()
            .notify(NotifyEvent::new(NotifyChannel::Connectivity));
        wait_for(&new_hits, 1).await;
        assert_eq!(old_hits.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn timers_stop_on_quit() {
        let (_, indicator) = connected_indicator();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        indicator.start_timer(
            "label-refresh",
            Duration::from_millis(10),
            Arc::new(move || {
                h.fetch_add(1, Ordering::Relaxed);
            }),
        );

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(hits.load(Ordering::Relaxed) >= 1);

        indicator.quit();
        tokio::time::sleep(Duration::from_millis(30)).await;
        let frozen = hits.load(Ordering::Relaxed);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(hits.load(Ordering::Relaxed), frozen);
    }

    #[test]
    fn disconnect_is_idempotent() {
        let (_, indicator) = connected_indicator();
        assert!(!indicator.is_disconnected());
        indicator.disconnect();
        assert!(indicator.is_disconnected());
        indicator.disconnect();
        assert!(indicator.is_disconnected());
    }

    #[test]
    fn quit_is_idempotent_and_leaves_resources_usable() {
        let (mock, indicator) = connected_indicator();
        indicator.quit();
        indicator.quit();

        // Resource locks are not held across shutdown.
        assert_eq!(indicator.icon(), Icon::Main);
        assert_eq!(indicator.label(), "");
        assert!(indicator.is_disconnected());
        assert!(!indicator.client().caches_running());
        assert_eq!(mock.quit_calls(), 2);
    }
}
