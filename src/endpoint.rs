/// HTTP endpoint serving the forecast dashboard as JSON
///
/// Provides a simple REST API for dashboard front ends and analysis
/// notebooks to pull a fully assembled forecast in one request.
///
/// Endpoints:
/// - GET /dashboard?start=YYYY-MM-DD&end=YYYY-MM-DD - Full dashboard payload
/// - GET /health - Service health check

use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::artifacts::ModelSet;
use crate::config::BasinConfig;
use crate::dashboard::{
    discharge_chart, flood_alert_days, headline_metrics, DischargeChart, FloodDay,
    HeadlineMetrics,
};
use crate::features::engineer_features;
use crate::ingest::client::MeteoClient;
use crate::model::FetchError;
use crate::predict::predict_next_day;

/// How far back the default window reaches (ten days including today).
const DEFAULT_WINDOW_DAYS: i64 = 9;

/// Everything a request handler needs. Built once at startup; the client
/// carries the response cache across requests.
pub struct AppState {
    pub basin: BasinConfig,
    pub models: ModelSet,
    pub client: MeteoClient,
}

// ---------------------------------------------------------------------------
// Response Types
// ---------------------------------------------------------------------------

/// Complete dashboard payload: headline metrics, chart, and alerts.
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub basin: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub metrics: HeadlineMetrics,
    pub chart: DischargeChart,
    pub flood_days: Vec<FloodDay>,
    /// Non-fatal degradations, e.g. predictions skipped for missing inputs.
    pub warnings: Vec<String>,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Run the full pipeline for one window: fetch, engineer, predict, render.
///
/// A prediction failure is reported as a warning rather than an error: the
/// historical dashboard still renders, just without the forecast overlay.
pub fn build_dashboard(
    state: &AppState,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<DashboardResponse, PipelineError> {
    let table = state
        .client
        .fetch_window(&state.basin, start, end)
        .map_err(PipelineError::Fetch)?;

    let engineered = engineer_features(&table).map_err(|e| PipelineError::Insufficient(e.to_string()))?;

    let mut warnings = Vec::new();
    let predicted = match predict_next_day(&engineered, &state.models) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("⚠️  Prediction skipped: {}", e);
            warnings.push(format!("prediction skipped: {}", e));
            engineered
        }
    };

    let metrics =
        headline_metrics(&predicted).map_err(|e| PipelineError::Insufficient(e.to_string()))?;
    let chart =
        discharge_chart(&predicted).map_err(|e| PipelineError::Insufficient(e.to_string()))?;

    Ok(DashboardResponse {
        basin: state.basin.name.clone(),
        start,
        end,
        metrics,
        chart,
        flood_days: flood_alert_days(&predicted),
        warnings,
    })
}

/// Failures that abort a dashboard request.
#[derive(Debug)]
pub enum PipelineError {
    /// Upstream data acquisition failed; maps to 502.
    Fetch(FetchError),
    /// The window produced too little data to render; maps to 422.
    Insufficient(String),
}

// ---------------------------------------------------------------------------
// Query Parsing
// ---------------------------------------------------------------------------

/// Resolve the requested window against `today`.
///
/// Missing parameters fall back to the trailing ten-day window. An `end`
/// past `today` is clamped back to `today`. Unknown parameters are ignored;
/// malformed dates and inverted ranges are errors.
fn resolve_range(query: &str, today: NaiveDate) -> Result<(NaiveDate, NaiveDate), String> {
    let mut start = None;
    let mut end = None;

    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            format!("malformed query parameter: {}", pair)
        })?;
        if key != "start" && key != "end" {
            continue;
        }
        let parsed = NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map_err(|_| format!("invalid date for {}: {} (expected YYYY-MM-DD)", key, value))?;
        if key == "start" {
            start = Some(parsed);
        } else {
            end = Some(parsed);
        }
    }

    let end = end.unwrap_or(today).min(today);
    let start = start.unwrap_or(end - Duration::days(DEFAULT_WINDOW_DAYS));

    if start > end {
        return Err(format!("start {} is after end {}", start, end));
    }
    Ok((start, end))
}

// ---------------------------------------------------------------------------
// HTTP Server
// ---------------------------------------------------------------------------

/// Start the HTTP endpoint server on the specified port. Blocks forever.
pub fn start_endpoint_server(port: u16, state: AppState) -> Result<(), String> {
    let server = tiny_http::Server::http(format!("0.0.0.0:{}", port))
        .map_err(|e| format!("Failed to start HTTP server: {}", e))?;

    println!("📡 HTTP endpoint listening on http://0.0.0.0:{}", port);
    println!("   GET /dashboard?start=YYYY-MM-DD&end=YYYY-MM-DD - Forecast dashboard");
    println!("   GET /health - Service health check\n");

    for request in server.incoming_requests() {
        let url = request.url().to_string();
        let (path, query) = match url.split_once('?') {
            Some((p, q)) => (p, q),
            None => (url.as_str(), ""),
        };

        // Route requests
        let response = if path == "/health" {
            handle_health(&state)
        } else if path == "/dashboard" {
            handle_dashboard(&state, query)
        } else {
            create_response(
                404,
                serde_json::json!({
                    "error": "Not found",
                    "available_endpoints": ["/health", "/dashboard?start=&end="]
                }),
            )
        };

        if let Err(e) = request.respond(response) {
            eprintln!("Failed to send response: {}", e);
        }
    }

    Ok(())
}

/// Handle /health endpoint
fn handle_health(state: &AppState) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    create_response(
        200,
        serde_json::json!({
            "status": "ok",
            "service": "floodcast",
            "version": env!("CARGO_PKG_VERSION"),
            "basin": state.basin.name,
        }),
    )
}

/// Handle /dashboard endpoint
fn handle_dashboard(state: &AppState, query: &str) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    let today = Utc::now().date_naive();
    let (start, end) = match resolve_range(query, today) {
        Ok(range) => range,
        Err(message) => {
            return create_response(400, serde_json::json!({ "error": message }));
        }
    };

    match build_dashboard(state, start, end) {
        Ok(payload) => match serde_json::to_value(&payload) {
            Ok(json) => create_response(200, json),
            Err(e) => create_response(
                500,
                serde_json::json!({ "error": format!("serialization failed: {}", e) }),
            ),
        },
        Err(PipelineError::Fetch(e)) => create_response(
            502,
            serde_json::json!({
                "error": format!("upstream data acquisition failed: {}", e),
                "start": start.to_string(),
                "end": end.to_string(),
            }),
        ),
        Err(PipelineError::Insufficient(message)) => create_response(
            422,
            serde_json::json!({
                "error": message,
                "start": start.to_string(),
                "end": end.to_string(),
            }),
        ),
    }
}

/// Create HTTP response with JSON body
fn create_response(status_code: u16, json: serde_json::Value) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    let body = serde_json::to_string_pretty(&json).unwrap_or_else(|_| "{}".to_string());
    let bytes = body.into_bytes();

    let mut response = tiny_http::Response::from_data(bytes)
        .with_status_code(tiny_http::StatusCode::from(status_code));
    if let Ok(header) =
        tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
    {
        response = response.with_header(header);
    }
    response
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
