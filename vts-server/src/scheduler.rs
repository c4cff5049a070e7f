//! Periodic driver for the simulator and the inference engine
//!
//! This module handles:
//! - Stepping the telemetry source at the fast cadence
//! - Publishing the slow-changing secondary readout
//! - Running inference and publishing diagnostics
//!
//! All three run on one task, so each cycle finishes before the next starts.

use crate::config::ServerConfig;
use crate::state::{AppState, DashboardEvent};
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use vts_core::model::{SecondaryReadout, TelemetryFrame};

/// Main scheduler loop. Returns once `cancel` fires.
pub async fn run(state: AppState, config: ServerConfig, cancel: CancellationToken) {
    let mut step = interval(config.step_interval());
    let mut secondary = interval(config.secondary_interval());
    let mut inference = interval(config.inference_interval());
    for timer in [&mut step, &mut secondary, &mut inference] {
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    }

    info!(
        step_ms = config.step_interval_ms,
        secondary_ms = config.secondary_interval_ms,
        inference_ms = config.inference_interval_ms,
        "Scheduler started"
    );

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = step.tick() => {
                step_cycle(&state).await;
            }
            _ = secondary.tick() => {
                secondary_cycle(&state).await;
            }
            _ = inference.tick() => inference_cycle(&state).await,
        }
    }

    info!("Scheduler stopped");
}

/// Advance the source one step and broadcast the new frame
pub async fn step_cycle(state: &AppState) -> TelemetryFrame {
    let frame = {
        let mut source = state.source.write().await;
        source.step();
        TelemetryFrame::new(source.tick(), source.mode(), source.current_state())
    };

    // Ignore error if no receivers (they'll get the next frame)
    let _ = state.events_tx.send(DashboardEvent::Telemetry(frame.clone()));
    frame
}

/// Broadcast the secondary gauges
pub async fn secondary_cycle(state: &AppState) -> SecondaryReadout {
    let readout = {
        let source = state.source.read().await;
        SecondaryReadout::from_state(&source.current_state(), source.mode())
    };

    let _ = state.events_tx.send(DashboardEvent::Secondary(readout));
    readout
}

/// Run inference over the current snapshot, store and broadcast the result
pub async fn inference_cycle(state: &AppState) {
    let result = {
        let source = state.source.read().await;
        let mut engine = state.engine.lock().await;
        engine.infer(&source.current_state(), source.history())
    };

    debug!(
        hygiene = result.health.hygiene,
        anomaly = result.anomaly.detected,
        style = result.driver.style.label(),
        "Diagnostics updated"
    );

    *state.latest_inference.write().await = Some(result.clone());
    let _ = state.events_tx.send(DashboardEvent::Diagnostics(result));
}
