//! PeerTray agent entry point.
//!
//! Wires config, the agent client, and the indicator together over the
//! headless provider, then hands the main thread to the provider's
//! event loop. Ctrl-C triggers the same shutdown path as the Quit menu
//! entry.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use peertray_client::{AgentClient, NotifyChannel};
use peertray_gui::{GuiProvider, HeadlessGuiProvider};
use peertray_indicator::{Indicator, IndicatorConfig};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let runtime = tokio::runtime::Runtime::new().context("building tokio runtime")?;
    let _guard = runtime.enter();

    let config = match IndicatorConfig::load() {
        Ok(config) => config,
        Err(error) => {
            warn!(%error, "failed to load config, using defaults");
            IndicatorConfig::default()
        }
    };

    let gui = HeadlessGuiProvider::new();
    let client = AgentClient::connected();
    let indicator = Indicator::new(
        Arc::clone(&gui) as Arc<dyn GuiProvider>,
        client,
        config,
    );

    indicator.set_menu_title("PeerTray");
    indicator.add_action("Peers", "peers", None);
    indicator.add_separator();
    let quitter = Arc::clone(&indicator);
    indicator.add_quick("Quit", "quit", Some(Arc::new(move || quitter.quit())));

    // Peering changes and a slow fallback tick both recompute the label.
    for channel in [NotifyChannel::PeeringAdded, NotifyChannel::PeeringRemoved] {
        let refresher = Arc::clone(&indicator);
        indicator.listen(channel, Arc::new(move |_event| refresher.refresh_label()));
    }
    let refresher = Arc::clone(&indicator);
    indicator.start_timer(
        "label-refresh",
        Duration::from_secs(30),
        Arc::new(move || refresher.refresh_label()),
    );

    let interrupted = Arc::clone(&indicator);
    runtime.spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, shutting down");
            interrupted.quit();
        }
    });

    let ready = Arc::clone(&indicator);
    gui.run(
        Box::new(move || {
            ready.refresh_label();
            info!("peertray agent ready");
        }),
        Box::new(|| info!("peertray agent exited")),
    );

    Ok(())
}
