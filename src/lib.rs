//! envmon - environmental sensor dashboard
//!
//! polls a hosted store for temperature, humidity and air-quality readings,
//! keeps the latest window in memory and serves it as cards and bar charts.

pub mod config;
pub mod dashboard;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod refresh;
pub mod server;
pub mod store;

pub use config::MonitorConfig;
pub use domain::{DisplayState, LoadStatus, Reading, Window};
pub use error::FetchError;
pub use refresh::{MonitorState, RefreshController, RefreshSettings, SharedState};
pub use store::{ReadingStore, RestStore};
