//! ==============================================================================
//! main.rs - environmental monitor entry point
//! ==============================================================================
//!
//! purpose:
//!     polls the hosted readings store on a fixed interval and serves the
//!     latest window as a live dashboard.
//!
//! responsibilities:
//!     - load configuration (config/monitor.toml + environment overrides)
//!     - initialize logging
//!     - own the refresh controller (start on boot, stop on shutdown)
//!     - serve the web dashboard from the shared state
//!
//! architecture:
//!
//!     ┌─────────────────────────────────────────────────────────────┐
//!     │                      envmon (this file)                      │
//!     │  ┌──────────────────┐              ┌─────────────────────┐  │
//!     │  │ refresh loop     │   writes     │ web server          │  │
//!     │  │ (5s interval)    │ ──────────>  │ (port 3000)         │  │
//!     │  └────────┬─────────┘  MonitorState└─────────────────────┘  │
//!     └───────────┼─────────────────────────────────────────────────┘
//!                 │ https (rest)
//!                 ▼
//!          ┌─────────────┐
//!          │ sensor_data │  hosted store
//!          └─────────────┘
//!
//! ==============================================================================

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use envmon::config::MonitorConfig;
use envmon::refresh::{MonitorState, RefreshController, RefreshSettings};
use envmon::server::{self, ServerState};
use envmon::store::RestStore;

#[tokio::main]
async fn main() -> Result<()> {
    // startup banner
    println!("===========================================================");
    println!("  Environmental Monitor");
    println!("  temperature · humidity · air quality");
    println!("===========================================================");

    // step 1: load configuration
    let config = MonitorConfig::load_or_default();
    config.validate()?;
    config.print_summary();

    // step 2: logging, RUST_LOG wins over the config level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .context("invalid log level")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // step 3: store accessor
    let store = RestStore::new(&config.store)
        .with_context(|| format!("set store.url in monitor.toml or {}", envmon::config::ENV_STORE_URL))?;
    tracing::info!(endpoint = store.endpoint(), "store configured");

    // step 4: refresh loop owns the only timer
    let state = MonitorState::new_shared();
    let mut controller = RefreshController::new(store, state.clone(), RefreshSettings::from_config(&config));
    controller.start();

    // step 5: web server in background
    let web_state = ServerState {
        monitor: state,
        chart_points: config.chart.points,
        refresh_secs: config.polling.interval_seconds,
    };
    let bind = config.server.bind.clone();
    let server = tokio::spawn(async move {
        tracing::info!("dashboard live at http://{}", bind);
        if let Err(e) = server::run_server(&bind, web_state).await {
            tracing::error!("web server error: {:#}", e);
        }
    });

    tokio::signal::ctrl_c().await.context("failed to listen for ctrl-c")?;
    println!("\n[SHUTDOWN] stopping refresh loop...");
    controller.stop().await;
    server.abort();
    Ok(())
}
