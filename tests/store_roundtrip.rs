//! drives RestStore and the refresh loop against a local stand-in for the
//! hosted store's REST endpoint.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use envmon::config::StoreConfig;
use envmon::dashboard::DashboardView;
use envmon::domain::{LoadStatus, CHART_POINTS, WINDOW_LIMIT};
use envmon::refresh::{Applied, MonitorState, RefreshController, RefreshSettings};
use envmon::store::{ReadingStore, RestStore};
use envmon::FetchError;

const API_KEY: &str = "test-anon-key";

#[derive(Clone)]
struct Fixture {
    rows: Arc<Vec<Value>>,
    fail: Arc<AtomicBool>,
}

fn row(id: usize, minute: usize, aqi: f64) -> Value {
    json!({
        "id": format!("row-{id}"),
        "temperature": 20.0 + id as f64 * 0.5,
        "humidity": 45.0,
        "aqi": aqi,
        "location": "Rooftop",
        "timestamp": format!("2024-05-01T{:02}:{:02}:00+00:00", 10 + minute / 60, minute % 60),
    })
}

async fn sensor_data(
    State(fixture): State<Fixture>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    if fixture.fail.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"message": "boom"})));
    }
    let authorized = headers.get("apikey").and_then(|v| v.to_str().ok()) == Some(API_KEY)
        && headers.get("authorization").and_then(|v| v.to_str().ok())
            == Some(&format!("Bearer {API_KEY}")[..]);
    if !authorized {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Invalid API key"})));
    }
    assert_eq!(params.get("select").map(String::as_str), Some("*"));
    assert_eq!(params.get("order").map(String::as_str), Some("timestamp.desc"));
    let limit: usize = params.get("limit").and_then(|l| l.parse().ok()).unwrap_or(usize::MAX);

    // the fixture is stored oldest first; answer like the real store would
    let rows: Vec<Value> = fixture.rows.iter().rev().take(limit).cloned().collect();
    (StatusCode::OK, Json(Value::Array(rows)))
}

async fn serve(rows: Vec<Value>) -> (String, Arc<AtomicBool>) {
    let fail = Arc::new(AtomicBool::new(false));
    let fixture = Fixture { rows: Arc::new(rows), fail: fail.clone() };
    let app = Router::new()
        .route("/rest/v1/sensor_data", get(sensor_data))
        .with_state(fixture);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), fail)
}

fn store_config(url: &str, api_key: &str) -> StoreConfig {
    StoreConfig {
        url: url.to_string(),
        table: "sensor_data".to_string(),
        api_key: api_key.to_string(),
    }
}

#[tokio::test]
async fn test_fetch_latest_returns_newest_first_window() {
    let rows = (0..70).map(|i| row(i, i, 30.0)).collect();
    let (url, _) = serve(rows).await;
    let store = RestStore::new(&store_config(&url, API_KEY)).unwrap();

    let window = store.fetch_latest(WINDOW_LIMIT).await.unwrap();
    assert_eq!(window.len(), WINDOW_LIMIT);
    assert_eq!(window.latest().unwrap().id, "row-69");
    assert_eq!(window.readings().last().unwrap().id, "row-20");

    let chart = window.chart_slice(CHART_POINTS);
    assert_eq!(chart.first().unwrap().id, "row-50");
    assert_eq!(chart.last().unwrap().id, "row-69");
}

#[tokio::test]
async fn test_bad_key_is_status_error() {
    let (url, _) = serve(vec![row(0, 0, 30.0)]).await;
    let store = RestStore::new(&store_config(&url, "wrong")).unwrap();

    match store.fetch_latest(WINDOW_LIMIT).await {
        Err(FetchError::Status { status, .. }) => assert_eq!(status, 401),
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_store_is_transport_error() {
    // nothing listens on port 9 locally
    let store = RestStore::new(&store_config("http://127.0.0.1:9", API_KEY)).unwrap();
    let err = store.fetch_latest(WINDOW_LIMIT).await.unwrap_err();
    assert!(matches!(err, FetchError::Transport(_)));
}

#[tokio::test]
async fn test_failures_keep_the_held_window() {
    let rows = vec![row(1, 1, 40.0), row(2, 2, 60.0), row(3, 3, 120.0)];
    let (url, fail) = serve(rows).await;
    let store = RestStore::new(&store_config(&url, API_KEY)).unwrap();
    let settings = RefreshSettings {
        interval: Duration::from_secs(60),
        limit: WINDOW_LIMIT,
        show_sensor_data: false,
    };
    let controller = RefreshController::new(store, MonitorState::new_shared(), settings);

    assert!(matches!(controller.refresh_once().await, Applied::Replaced { rows: 3, .. }));

    fail.store(true, Ordering::SeqCst);
    assert!(matches!(controller.refresh_once().await, Applied::Failed(_)));

    let state = controller.state();
    let state = state.read().await;
    assert_eq!(state.status, LoadStatus::Ready);
    assert_eq!(state.window.len(), 3);

    let view = DashboardView::build(&state.display(CHART_POINTS)).unwrap();
    assert_eq!(view.location, "Rooftop");
    assert_eq!(view.cards[3].value, "Unhealthy for Sensitive");
    let heights: Vec<f64> = view.charts[2].bars.iter().map(|b| b.height).collect();
    assert_eq!(heights.len(), 3);
    assert!((heights[1] - 50.0).abs() < 1e-9);
    assert!((heights[2] - 100.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_unreachable_on_first_load_shows_no_data() {
    let store = RestStore::new(&store_config("http://127.0.0.1:9", API_KEY)).unwrap();
    let settings = RefreshSettings {
        interval: Duration::from_millis(20),
        limit: WINDOW_LIMIT,
        show_sensor_data: false,
    };
    let mut controller = RefreshController::new(store, MonitorState::new_shared(), settings);
    controller.start();

    let state = controller.state();
    tokio::time::timeout(Duration::from_secs(5), async {
        while state.read().await.status == LoadStatus::Loading {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("first fetch never resolved");

    controller.stop().await;
    let state = state.read().await;
    assert_eq!(state.status, LoadStatus::Empty);
    assert!(!state.display(CHART_POINTS).has_data);
}
