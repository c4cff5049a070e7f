//! REST API and SSE routes

use crate::state::{AppState, DashboardEvent};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Json, Router,
};
use futures::stream::{Stream, StreamExt as FuturesStreamExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use tower_http::cors::CorsLayer;
use vts_core::model::{FieldMask, InferenceResult, TelemetryFrame};
use vts_core::Channel;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/state", get(current_state))
        .route("/api/history", get(history))
        .route("/api/history/:channel", get(channel_history))
        .route("/api/inference", get(latest_inference))
        .route("/api/stream", get(event_stream))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// === Index ===

#[derive(Serialize)]
struct ServiceIndex {
    name: &'static str,
    version: &'static str,
    source: String,
    endpoints: Vec<&'static str>,
}

async fn index(State(state): State<AppState>) -> Json<ServiceIndex> {
    let source = state.source.read().await.name().to_string();
    Json(ServiceIndex {
        name: "vehicle-telemetry-sim",
        version: env!("CARGO_PKG_VERSION"),
        source,
        endpoints: vec![
            "/api/state",
            "/api/history",
            "/api/history/:channel",
            "/api/inference",
            "/api/stream",
        ],
    })
}

// === Snapshot Endpoints ===

async fn current_state(State(state): State<AppState>) -> Json<TelemetryFrame> {
    let source = state.source.read().await;
    Json(TelemetryFrame::new(
        source.tick(),
        source.mode(),
        source.current_state(),
    ))
}

#[derive(Deserialize)]
struct HistoryQuery {
    #[serde(default)]
    normalized: bool,
}

async fn history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Json<BTreeMap<&'static str, Vec<f64>>> {
    let source = state.source.read().await;
    let history = source.history();
    if query.normalized {
        Json(history.to_normalized_map())
    } else {
        Json(history.to_map())
    }
}

#[derive(Serialize)]
struct ChannelResponse {
    channel: Channel,
    samples: Vec<f64>,
}

async fn channel_history(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ChannelResponse>, (StatusCode, String)> {
    let channel: Channel = name
        .parse()
        .map_err(|e: vts_core::TelemetryError| (StatusCode::NOT_FOUND, e.to_string()))?;

    let source = state.source.read().await;
    let samples = source.history().channel(channel);
    let samples = if query.normalized {
        samples.normalized()
    } else {
        samples.to_vec()
    };

    Ok(Json(ChannelResponse { channel, samples }))
}

async fn latest_inference(
    State(state): State<AppState>,
) -> Result<Json<InferenceResult>, (StatusCode, String)> {
    let latest = state.latest_inference.read().await;
    match &*latest {
        Some(result) => Ok(Json(result.clone())),
        None => Err((
            StatusCode::NOT_FOUND,
            "No inference has run yet".to_string(),
        )),
    }
}

// === Event Stream Endpoint ===

#[derive(Deserialize)]
struct StreamQuery {
    fields: Option<String>,
}

fn encode_event(event: &DashboardEvent, mask: Option<&FieldMask>) -> serde_json::Result<String> {
    match event {
        DashboardEvent::Telemetry(frame) => frame.to_json_filtered(mask),
        DashboardEvent::Secondary(readout) => serde_json::to_string(readout),
        DashboardEvent::Diagnostics(result) => serde_json::to_string(result),
    }
}

async fn event_stream(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.subscribe();
    let field_mask = query.fields.map(|f| FieldMask::parse(&f));

    let stream = BroadcastStream::new(rx).filter_map(move |result| {
        let mask = field_mask.clone();
        async move {
            match result {
                Ok(event) => match encode_event(&event, mask.as_ref()) {
                    Ok(json) => Some(Ok(Event::default().event(event.kind()).data(json))),
                    Err(e) => {
                        tracing::error!("Failed to serialize {} event: {}", event.kind(), e);
                        None
                    }
                },
                Err(e) => {
                    tracing::warn!("Broadcast stream error: {}", e);
                    None
                }
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vts_core::model::{DriveMode, SecondaryReadout};
    use vts_core::VehicleState;

    #[test]
    fn test_encode_telemetry_respects_mask() {
        let frame = TelemetryFrame::new(3, DriveMode::Decelerating, VehicleState::initial());
        let mask = FieldMask::parse("speed");
        let json = encode_event(&DashboardEvent::Telemetry(frame), Some(&mask)).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["state"].as_object().unwrap().len(), 1);
        assert_eq!(parsed["mode"], "DECELERATING");
    }

    #[test]
    fn test_encode_secondary_ignores_mask() {
        let state = VehicleState::initial();
        let readout = SecondaryReadout::from_state(&state, DriveMode::Accelerating);
        let mask = FieldMask::parse("rpm");
        let json = encode_event(&DashboardEvent::Secondary(readout), Some(&mask)).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["coolant"], 90.0);
        assert_eq!(parsed["battery"], 13.5);
    }
}
