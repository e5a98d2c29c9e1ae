//! ==============================================================================
//! dashboard.rs - cards, charts and the html page
//! ==============================================================================
//!
//! purpose:
//!     turns a DisplayState into a DashboardView (what the json api returns)
//!     and renders that view as a single self-refreshing html page.
//!
//! layout:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │ Environmental Monitor        location · timestamp      │
//! ├─────────────┬─────────────┬─────────────┬──────────────┤
//! │ Temperature │ Humidity    │ Air Quality │ Overall      │
//! │ °C / °F     │ % / band    │ AQI / band  │ band         │
//! ├─────────────┴──────┬──────┴─────────────┴──────────────┤
//! │ temperature bars   │ humidity bars   │ aqi bars        │
//! └────────────────────┴─────────────────┴─────────────────┘
//! ```
//!
//! relationships:
//!     - uses: metrics.rs (bands, conversion, change, normalization)
//!     - used by: server.rs (GET / and GET /api)
//!
//! ==============================================================================

use serde::Serialize;
use std::fmt::Write;

use crate::domain::{DisplayState, LoadStatus, Reading};
use crate::metrics::{
    aqi_band, celsius_to_fahrenheit, format_change, humidity_band, normalize, percent_change,
    Metric, Trend,
};

const HEADER_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";
const AXIS_TIME_FORMAT: &str = "%H:%M:%S";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SummaryCard {
    pub title: &'static str,
    pub value: String,
    pub subtitle: String,
    pub gradient: &'static str,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Bar {
    pub id: String,
    /// percent of the chart height
    pub height: f64,
    pub tooltip: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChartPanel {
    pub metric: Metric,
    pub title: &'static str,
    pub unit: &'static str,
    pub gradient: &'static str,
    /// newest value, formatted
    pub latest: String,
    /// change between the last two points, e.g. "+1.2%"
    pub change: String,
    pub trend: Trend,
    pub bars: Vec<Bar>,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DashboardView {
    pub location: String,
    pub timestamp: String,
    pub cards: Vec<SummaryCard>,
    /// empty when there is nothing to chart
    pub charts: Vec<ChartPanel>,
}

impl DashboardView {
    /// None while loading or when there is no latest reading
    pub fn build(display: &DisplayState) -> Option<Self> {
        if display.loading {
            return None;
        }
        let latest = display.latest.as_ref()?;
        let charts = if display.chart.is_empty() {
            Vec::new()
        } else {
            Metric::ALL.iter().map(|&m| chart_panel(m, &display.chart)).collect()
        };
        Some(Self {
            location: latest.location.clone(),
            timestamp: latest.timestamp.format(HEADER_TIME_FORMAT).to_string(),
            cards: summary_cards(latest),
            charts,
        })
    }
}

pub fn summary_cards(latest: &Reading) -> Vec<SummaryCard> {
    let air = aqi_band(latest.aqi);
    vec![
        SummaryCard {
            title: "Temperature",
            value: format!("{:.1}°C", latest.temperature),
            subtitle: format!("{:.1}°F", celsius_to_fahrenheit(latest.temperature)),
            gradient: Metric::Temperature.gradient(),
        },
        SummaryCard {
            title: "Humidity",
            value: format!("{:.1}%", latest.humidity),
            subtitle: humidity_band(latest.humidity).label().to_string(),
            gradient: Metric::Humidity.gradient(),
        },
        SummaryCard {
            title: "Air Quality Index",
            value: latest.aqi.to_string(),
            subtitle: air.label().to_string(),
            gradient: air.gradient(),
        },
        SummaryCard {
            title: "Overall Status",
            value: air.label().to_string(),
            subtitle: "System Active".to_string(),
            gradient: "from-teal-400 to-emerald-500",
        },
    ]
}

/// one chart over `points`, which must be oldest to newest and non-empty
pub fn chart_panel(metric: Metric, points: &[Reading]) -> ChartPanel {
    let values: Vec<f64> = points.iter().map(|r| metric.value(r)).collect();
    let heights = normalize(&values);

    let latest = values.last().copied().unwrap_or_default();
    let previous = values.len().checked_sub(2).map(|i| values[i]);
    let change = percent_change(previous, latest);

    let bars = points
        .iter()
        .zip(values.iter().zip(heights))
        .map(|(r, (&v, height))| Bar {
            id: r.id.clone(),
            height,
            tooltip: metric.format(v),
        })
        .collect();

    let axis_time = |r: Option<&Reading>| {
        r.map(|r| r.timestamp.format(AXIS_TIME_FORMAT).to_string())
            .unwrap_or_default()
    };

    ChartPanel {
        metric,
        title: metric.title(),
        unit: metric.unit(),
        gradient: metric.gradient(),
        latest: metric.format(latest),
        change: format_change(change),
        trend: Trend::of(change),
        bars,
        start_time: axis_time(points.first()),
        end_time: axis_time(points.last()),
    }
}

// ==============================================================================
// html
// ==============================================================================

/// escape html special characters to prevent xss
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// render the whole page for the current state
pub fn render_html(display: &DisplayState, refresh_secs: u64) -> String {
    let body = match DashboardView::build(display) {
        Some(view) => render_dashboard(&view),
        None if display.loading => {
            r#"<div class="center"><div class="spinner"></div><p>Loading sensor data...</p></div>"#.to_string()
        }
        None => r#"<div class="center"><p class="muted">No sensor data available</p></div>"#.to_string(),
    };
    page(&body, refresh_secs)
}

/// status line used when the page itself is not needed
pub fn status_label(status: LoadStatus) -> &'static str {
    match status {
        LoadStatus::Loading => "Loading sensor data...",
        LoadStatus::Ready => "System Active",
        LoadStatus::Empty => "No sensor data available",
    }
}

fn render_dashboard(view: &DashboardView) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        r#"<header><h1>Environmental Monitor</h1><p class="muted">{} · {}</p></header>"#,
        html_escape(&view.location),
        html_escape(&view.timestamp)
    );

    html.push_str(r#"<section class="cards">"#);
    for card in &view.cards {
        let _ = write!(
            html,
            r#"<div class="card {}"><h3>{}</h3><p class="value">{}</p><p class="muted">{}</p></div>"#,
            card.gradient,
            html_escape(card.title),
            html_escape(&card.value),
            html_escape(&card.subtitle)
        );
    }
    html.push_str("</section>");

    if !view.charts.is_empty() {
        html.push_str(r#"<h2>Historical Data</h2><section class="charts">"#);
        for chart in &view.charts {
            render_chart(&mut html, chart);
        }
        html.push_str("</section>");
    }
    html
}

fn render_chart(html: &mut String, chart: &ChartPanel) {
    let trend = match chart.trend {
        Trend::Up => "up",
        Trend::Down => "down",
        Trend::Flat => "flat",
    };
    let _ = write!(
        html,
        r#"<div class="chart"><div class="chart-head"><div><h3>{}</h3><p class="value">{}</p></div><span class="change {}">{}</span></div><div class="bars">"#,
        html_escape(chart.title),
        html_escape(&chart.latest),
        trend,
        html_escape(&chart.change)
    );
    for bar in &chart.bars {
        let _ = write!(
            html,
            r#"<div class="bar {}" style="height: {:.1}%" title="{}"></div>"#,
            chart.gradient,
            bar.height,
            html_escape(&bar.tooltip)
        );
    }
    let _ = write!(
        html,
        r#"</div><div class="axis"><span>{}</span><span>{}</span></div></div>"#,
        html_escape(&chart.start_time),
        html_escape(&chart.end_time)
    );
}

fn page(body: &str, refresh_secs: u64) -> String {
    format!(
        r#"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<meta http-equiv="refresh" content="{refresh_secs}">
<title>Environmental Monitor</title>
<style>
body {{ font-family: system-ui; margin: 0; padding: 2rem; background: #0f172a; color: #f1f5f9; }}
h1 {{ color: #38bdf8; margin-bottom: 0.25rem; }}
.muted {{ color: #94a3b8; }}
.center {{ min-height: 80vh; display: flex; flex-direction: column; align-items: center; justify-content: center; }}
.spinner {{ width: 4rem; height: 4rem; border-radius: 50%; border: 4px solid #1e293b; border-top-color: #3b82f6; }}
.cards {{ display: grid; grid-template-columns: repeat(auto-fit, minmax(14rem, 1fr)); gap: 1.5rem; margin: 2rem 0; }}
.charts {{ display: grid; grid-template-columns: repeat(auto-fit, minmax(18rem, 1fr)); gap: 1.5rem; }}
.card, .chart {{ background: #1e293b; border: 1px solid #334155; border-radius: 1rem; padding: 1.5rem; }}
.value {{ font-size: 1.75rem; font-weight: bold; margin: 0.25rem 0; }}
.chart-head {{ display: flex; justify-content: space-between; align-items: flex-start; }}
.change {{ padding: 0.25rem 0.75rem; border-radius: 999px; font-size: 0.85rem; }}
.change.up {{ background: #7f1d1d55; color: #f87171; }}
.change.down {{ background: #14532d55; color: #4ade80; }}
.change.flat {{ background: #33415555; color: #94a3b8; }}
.bars {{ height: 8rem; display: flex; align-items: flex-end; gap: 0.25rem; margin-top: 1rem; }}
.bar {{ flex: 1; background: #38bdf8; border-radius: 0.25rem 0.25rem 0 0; }}
.axis {{ display: flex; justify-content: space-between; font-size: 0.75rem; color: #64748b; margin-top: 1rem; }}
</style>
</head>
<body>
{body}
</body>
</html>"#
    )
}
