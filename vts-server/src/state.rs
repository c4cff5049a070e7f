//! Application state management

use crate::config::ServerConfig;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};
use vts_core::model::{InferenceResult, SecondaryReadout, TelemetryFrame};
use vts_core::TelemetrySource;
use vts_sim::{InferenceEngine, Simulator};

/// Events pushed to dashboard subscribers
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum DashboardEvent {
    /// Fast cadence: every simulator step
    Telemetry(TelemetryFrame),
    /// Slow cadence: secondary gauges
    Secondary(SecondaryReadout),
    /// Inference cadence: diagnostic panels
    Diagnostics(InferenceResult),
}

impl DashboardEvent {
    /// SSE event name
    pub fn kind(&self) -> &'static str {
        match self {
            DashboardEvent::Telemetry(_) => "telemetry",
            DashboardEvent::Secondary(_) => "secondary",
            DashboardEvent::Diagnostics(_) => "diagnostics",
        }
    }
}

/// Seed for the inference engine's RNG, kept apart from the simulator's stream
fn engine_seed(seed: u64) -> u64 {
    seed.wrapping_add(1)
}

/// Shared application state
///
/// The source is the only writer of vehicle state; it is stepped under the
/// write lock so readers never observe a half-applied step.
#[derive(Clone)]
pub struct AppState {
    /// The telemetry source being driven by the scheduler
    pub source: Arc<RwLock<Box<dyn TelemetrySource>>>,

    /// Heuristic diagnostics; owns the wear counter
    pub engine: Arc<Mutex<InferenceEngine>>,

    /// Result of the most recent inference tick
    pub latest_inference: Arc<RwLock<Option<InferenceResult>>>,

    /// Broadcast channel for dashboard events
    /// Multiple consumers can subscribe to receive events
    pub events_tx: broadcast::Sender<DashboardEvent>,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Self {
        let (simulator, engine) = match config.seed {
            Some(seed) => (
                Simulator::seeded(seed),
                InferenceEngine::seeded(engine_seed(seed)),
            ),
            None => (Simulator::new(), InferenceEngine::new()),
        };
        Self::with_source(Box::new(simulator), engine, config.event_buffer)
    }

    pub fn with_source(
        source: Box<dyn TelemetrySource>,
        engine: InferenceEngine,
        event_buffer: usize,
    ) -> Self {
        let (events_tx, _) = broadcast::channel(event_buffer);

        Self {
            source: Arc::new(RwLock::new(source)),
            engine: Arc::new(Mutex::new(engine)),
            latest_inference: Arc::new(RwLock::new(None)),
            events_tx,
        }
    }

    /// Subscribe to dashboard events
    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.events_tx.subscribe()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(&ServerConfig::default())
    }
}
