//! ==============================================================================
//! refresh.rs - the polling loop that keeps the held window current
//! ==============================================================================
//!
//! purpose:
//!     owns the only timer in the process. every tick issues one fetch
//!     against the store and applies whatever comes back to the shared
//!     state. the dashboard only ever reads that state.
//!
//! lifecycle:
//!
//! ```text
//! new() ──start()──> running ──stop()──> stopped (terminal)
//! ```
//!
//! - start() fetches immediately, then once per interval
//! - each tick spawns its own fetch, so a hung request never holds up
//!   the next tick; responses apply in arrival order (last one wins)
//! - stop() raises the halt flag, aborts the timer and all in-flight
//!   fetches, then waits out any write already in progress. once it
//!   returns nothing can mutate the state again, even a fetch that
//!   resolves later.
//! - dropping a running controller raises the same flag and aborts the
//!   same tasks. it cannot wait for a write already holding the lock.
//!
//! state machine (MonitorState::apply):
//!
//! ```text
//! Loading --rows--> Ready       Ready --rows--> Ready (window replaced)
//! Loading --0 rows--> Empty     Ready --0 rows / error--> Ready (kept)
//! Loading --error--> Empty      Empty --rows--> Ready
//! ```
//!
//! relationships:
//!     - uses: store.rs (ReadingStore)
//!     - read by: server.rs (dashboard and api handlers)
//!
//! ==============================================================================

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;

use crate::config::MonitorConfig;
use crate::domain::{DisplayState, LoadStatus, Window};
use crate::error::{FetchError, FetchResult};
use crate::metrics::{aqi_band, celsius_to_fahrenheit, humidity_band};
use crate::store::ReadingStore;

// ==============================================================================
// shared state
// ==============================================================================
// written only by fetch tasks spawned from the refresh loop, read by the
// web server between writes.

pub type SharedState = Arc<RwLock<MonitorState>>;

#[derive(Clone, Debug, Default)]
pub struct MonitorState {
    pub window: Window,
    pub status: LoadStatus,
    /// when the window was last replaced
    pub last_update: Option<DateTime<Utc>>,
    /// sequence number of the request whose rows are held
    pub applied_seq: u64,
}

/// what happened when a fetch outcome reached the state
#[derive(Debug)]
pub enum Applied {
    Replaced { rows: usize, superseded: bool },
    NoRows,
    Failed(FetchError),
    /// the controller was stopped before the response arrived
    Discarded,
}

impl MonitorState {
    pub fn new_shared() -> SharedState {
        Arc::new(RwLock::new(Self::default()))
    }

    pub fn display(&self, chart_points: usize) -> DisplayState {
        DisplayState::from_window(&self.window, self.status, chart_points)
    }

    /// apply the outcome of request `seq`.
    ///
    /// a successful non-empty result replaces the window wholesale, even if
    /// a later-issued request already landed. `superseded` reports that case.
    pub fn apply(&mut self, seq: u64, outcome: FetchResult<Window>) -> Applied {
        match outcome {
            Ok(window) if !window.is_empty() => {
                let superseded = seq < self.applied_seq;
                let rows = window.len();
                self.window = window;
                self.status = LoadStatus::Ready;
                self.applied_seq = seq;
                self.last_update = Some(Utc::now());
                Applied::Replaced { rows, superseded }
            }
            Ok(_) => {
                self.settle_empty();
                Applied::NoRows
            }
            Err(e) => {
                self.settle_empty();
                Applied::Failed(e)
            }
        }
    }

    // no data on the first resolution means "nothing to show"
    fn settle_empty(&mut self) {
        if self.status == LoadStatus::Loading {
            self.status = LoadStatus::Empty;
        }
    }
}

// ==============================================================================
// refresh controller
// ==============================================================================

#[derive(Clone, Debug)]
pub struct RefreshSettings {
    pub interval: Duration,
    pub limit: usize,
    /// log a summary line for every new latest reading
    pub show_sensor_data: bool,
}

impl RefreshSettings {
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self {
            interval: config.polling.interval(),
            limit: config.polling.limit,
            show_sensor_data: config.logging.show_sensor_data,
        }
    }
}

pub struct RefreshController<S: ReadingStore> {
    store: Arc<S>,
    state: SharedState,
    settings: RefreshSettings,
    seq: Arc<AtomicU64>,
    ticker: Option<JoinHandle<()>>,
    /// checked under the write lock before every apply
    halted: Arc<AtomicBool>,
}

impl<S: ReadingStore> RefreshController<S> {
    pub fn new(store: S, state: SharedState, settings: RefreshSettings) -> Self {
        Self {
            store: Arc::new(store),
            state,
            settings,
            seq: Arc::new(AtomicU64::new(0)),
            ticker: None,
            halted: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn state(&self) -> SharedState {
        self.state.clone()
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::SeqCst)
    }

    /// spawn the polling loop. must be called inside a tokio runtime.
    pub fn start(&mut self) {
        if self.is_halted() {
            tracing::warn!("refresh controller already stopped; create a new one to poll again");
            return;
        }
        if self.ticker.is_some() {
            return;
        }
        tracing::info!(
            interval_secs = self.settings.interval.as_secs_f64(),
            limit = self.settings.limit,
            "starting refresh loop"
        );
        self.ticker = Some(tokio::spawn(run_loop(
            self.store.clone(),
            self.state.clone(),
            self.settings.clone(),
            self.seq.clone(),
            self.halted.clone(),
        )));
    }

    /// fetch and apply once, outside the timer
    pub async fn refresh_once(&self) -> Applied {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        fetch_and_apply(self.store.as_ref(), &self.state, &self.settings, &self.halted, seq).await
    }

    /// stop polling. no state mutation happens after this returns.
    pub async fn stop(&mut self) {
        self.halted.store(true, Ordering::SeqCst);
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
            // the loop owns the in-flight JoinSet; its drop aborts them
            let _ = ticker.await;
        }
        // a fetch that passed the halt check before we raised it finishes here
        drop(self.state.write().await);
        tracing::info!("refresh loop stopped");
    }
}

impl<S: ReadingStore> Drop for RefreshController<S> {
    fn drop(&mut self) {
        self.halted.store(true, Ordering::SeqCst);
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

async fn run_loop<S: ReadingStore>(
    store: Arc<S>,
    state: SharedState,
    settings: RefreshSettings,
    seq: Arc<AtomicU64>,
    halted: Arc<AtomicBool>,
) {
    let mut ticker = tokio::time::interval(settings.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let id = seq.fetch_add(1, Ordering::SeqCst) + 1;
                let store = store.clone();
                let state = state.clone();
                let settings = settings.clone();
                let halted = halted.clone();
                in_flight.spawn(async move {
                    fetch_and_apply(store.as_ref(), &state, &settings, &halted, id).await;
                });
            }
            Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
        }
    }
}

async fn fetch_and_apply<S: ReadingStore>(
    store: &S,
    state: &SharedState,
    settings: &RefreshSettings,
    halted: &AtomicBool,
    seq: u64,
) -> Applied {
    let outcome = store.fetch_latest(settings.limit).await;

    let (applied, latest) = {
        let mut guard = state.write().await;
        let applied = if halted.load(Ordering::SeqCst) {
            Applied::Discarded
        } else {
            guard.apply(seq, outcome)
        };
        (applied, guard.window.latest().cloned())
    };

    match &applied {
        Applied::Replaced { rows, superseded } => {
            if *superseded {
                tracing::debug!(seq, "older response replaced a newer window");
            }
            tracing::debug!(seq, rows, "window replaced");
            if settings.show_sensor_data {
                if let Some(r) = latest {
                    tracing::info!(
                        "[POLL] {} | {:.1}°C ({:.1}°F) | {:.1}% ({}) | AQI {} ({})",
                        r.location,
                        r.temperature,
                        celsius_to_fahrenheit(r.temperature),
                        r.humidity,
                        humidity_band(r.humidity).label(),
                        r.aqi,
                        aqi_band(r.aqi).label(),
                    );
                }
            }
        }
        Applied::NoRows => tracing::debug!(seq, "store returned no rows"),
        Applied::Failed(e) => tracing::warn!(seq, "error fetching readings: {}", e),
        Applied::Discarded => tracing::debug!(seq, "response arrived after teardown"),
    }
    applied
}
