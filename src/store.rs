//! ==============================================================================
//! store.rs - read access to the hosted readings collection
//! ==============================================================================
//!
//! purpose:
//!     issues the one query the dashboard needs: every column of the
//!     readings table, ordered by timestamp descending, limited to N rows.
//!
//! wire contract (postgrest, as exposed by supabase):
//!
//! ```text
//! GET {url}/rest/v1/{table}?select=*&order=timestamp.desc&limit=50
//! apikey: {key}
//! Authorization: Bearer {key}
//!
//! -> 200 [{ "id", "temperature", "humidity", "aqi", "location", "timestamp" }, ...]
//! ```
//!
//! any transport, status or decode failure is a single FetchError for the
//! caller; there are never partial results.
//!
//! relationships:
//!     - used by: refresh.rs (RefreshController polls through ReadingStore)
//!     - produces: domain.rs (Window)
//!
//! ==============================================================================

use std::future::Future;

use crate::config::StoreConfig;
use crate::domain::{Reading, Window};
use crate::error::{FetchError, FetchResult};

/// anything that can hand back the latest readings, newest first
pub trait ReadingStore: Send + Sync + 'static {
    fn fetch_latest(&self, limit: usize) -> impl Future<Output = FetchResult<Window>> + Send;
}

#[derive(Clone, Debug)]
pub struct RestStore {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl RestStore {
    pub fn new(config: &StoreConfig) -> FetchResult<Self> {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(client: reqwest::Client, config: &StoreConfig) -> FetchResult<Self> {
        let base = config.url.trim().trim_end_matches('/');
        if base.is_empty() {
            return Err(FetchError::Config("store url is empty".to_string()));
        }
        if config.table.trim().is_empty() {
            return Err(FetchError::Config("store table is empty".to_string()));
        }
        Ok(Self {
            client,
            endpoint: format!("{}/rest/v1/{}", base, config.table.trim()),
            api_key: config.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl ReadingStore for RestStore {
    async fn fetch_latest(&self, limit: usize) -> FetchResult<Window> {
        let limit_param = limit.to_string();
        let mut request = self.client.get(&self.endpoint).query(&[
            ("select", "*"),
            ("order", "timestamp.desc"),
            ("limit", limit_param.as_str()),
        ]);
        if !self.api_key.is_empty() {
            request = request.header("apikey", &self.api_key).bearer_auth(&self.api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(FetchError::Status { status: status.as_u16(), body });
        }

        let rows: Vec<Reading> = serde_json::from_str(&body)?;
        Ok(Window::from_rows(rows, limit))
    }
}
