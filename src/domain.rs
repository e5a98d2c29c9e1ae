//! ==============================================================================
//! domain.rs - readings, the held window, and the derived display state
//! ==============================================================================
//!
//! purpose:
//!     types shared between the store accessor, the refresh loop and the
//!     dashboard. a `Window` is whatever the last successful poll returned,
//!     newest first. a `DisplayState` is recomputed from it on every render.
//!
//! relationships:
//!     - produced by: store.rs (rows decoded into readings)
//!     - held by: refresh.rs (MonitorState)
//!     - consumed by: dashboard.rs (cards and charts)
//!
//! ==============================================================================

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

/// maximum number of readings requested per poll
pub const WINDOW_LIMIT: usize = 50;

/// number of readings plotted in each chart
pub const CHART_POINTS: usize = 20;

/// one sensor sample, as stored in the `sensor_data` collection
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// opaque row identifier assigned by the store (text or numeric key)
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    /// temperature in celsius
    pub temperature: f64,
    /// relative humidity (0-100% expected, not enforced)
    pub humidity: f64,
    /// air quality index, non-negative
    pub aqi: f64,
    /// free-text location label
    pub location: String,
    /// store-assigned sample time; offset-less values are read as UTC
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// parse an ISO-8601 timestamp, with or without an offset
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .or_else(|_| raw.parse::<NaiveDateTime>().map(|n| n.and_utc()))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f").map(|n| n.and_utc()))
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(|e| de::Error::custom(format!("invalid timestamp {raw:?}: {e}")))
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RowId {
        Text(String),
        Int(i64),
        Uint(u64),
        Float(f64),
    }

    Ok(match RowId::deserialize(deserializer)? {
        RowId::Text(id) => id,
        RowId::Int(id) => id.to_string(),
        RowId::Uint(id) => id.to_string(),
        RowId::Float(id) => id.to_string(),
    })
}

/// the most recent readings, newest first
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Window {
    readings: Vec<Reading>,
}

impl Window {
    /// build a window from rows in any order.
    ///
    /// rows are sorted by timestamp descending and truncated to `limit`, so
    /// the window invariant holds even if the store ignored the ordering.
    pub fn from_rows(mut rows: Vec<Reading>, limit: usize) -> Self {
        rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        rows.truncate(limit);
        Self { readings: rows }
    }

    pub fn latest(&self) -> Option<&Reading> {
        self.readings.first()
    }

    /// the newest `points` readings, reordered oldest to newest
    pub fn chart_slice(&self, points: usize) -> Vec<Reading> {
        self.readings.iter().take(points).rev().cloned().collect()
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

/// where the refresh loop is in its lifecycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    /// no fetch has resolved yet
    #[default]
    Loading,
    /// a non-empty window is held
    Ready,
    /// the first fetch resolved without data (no rows, or store unreachable)
    Empty,
}

/// everything the dashboard needs, derived from a window
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DisplayState {
    pub latest: Option<Reading>,
    /// oldest to newest
    pub chart: Vec<Reading>,
    pub loading: bool,
    pub has_data: bool,
}

impl DisplayState {
    pub fn from_window(window: &Window, status: LoadStatus, chart_points: usize) -> Self {
        let latest = window.latest().cloned();
        Self {
            has_data: latest.is_some(),
            latest,
            chart: window.chart_slice(chart_points),
            loading: status == LoadStatus::Loading,
        }
    }
}
