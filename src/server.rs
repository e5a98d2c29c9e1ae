//! ==============================================================================
//! server.rs - web server for the dashboard
//! ==============================================================================
//!
//! routes:
//!     GET /              html dashboard (re-requests itself every poll interval)
//!     GET /api           derived view as json
//!     GET /api/readings  the held window, newest first
//!
//! handlers only read the shared state; the refresh loop is the single writer.
//!
//! ==============================================================================

use anyhow::{Context, Result};
use axum::{
    extract::State,
    response::{Html, Json},
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;

use crate::dashboard::{render_html, status_label, DashboardView};
use crate::domain::{LoadStatus, Window};
use crate::refresh::SharedState;

#[derive(Clone)]
pub struct ServerState {
    pub monitor: SharedState,
    pub chart_points: usize,
    pub refresh_secs: u64,
}

#[derive(Serialize)]
pub struct ApiResponse {
    pub status: LoadStatus,
    pub message: &'static str,
    /// unix timestamp (ms) of last successful update
    pub last_update: Option<i64>,
    pub dashboard: Option<DashboardView>,
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/", get(dashboard_handler))
        .route("/api", get(api_handler))
        .route("/api/readings", get(readings_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run_server(bind: &str, state: ServerState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind dashboard on {}", bind))?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn dashboard_handler(State(state): State<ServerState>) -> Html<String> {
    let display = state.monitor.read().await.display(state.chart_points);
    Html(render_html(&display, state.refresh_secs))
}

/// json api endpoint for programmatic access
async fn api_handler(State(state): State<ServerState>) -> Json<ApiResponse> {
    let monitor = state.monitor.read().await;
    let display = monitor.display(state.chart_points);
    Json(ApiResponse {
        status: monitor.status,
        message: status_label(monitor.status),
        last_update: monitor.last_update.map(|t| t.timestamp_millis()),
        dashboard: DashboardView::build(&display),
    })
}

async fn readings_handler(State(state): State<ServerState>) -> Json<Window> {
    Json(state.monitor.read().await.window.clone())
}
