use crate::core::GridSize;
use serde::Serialize;
use std::time::Duration;

/// Running counters for the tick loop
#[derive(Debug, Clone, Default, Serialize)]
pub struct OrchestratorMetrics {
    pub total_ticks: u64,
    pub successful_ticks: u64,
    pub failed_ticks: u64,
    pub paused_ticks: u64,
    pub readback_ticks: u64,
    pub tuning_pushes: u64,
    pub avg_tick_duration_ms: f64,
    pub max_tick_duration_ms: f64,
    pub last_tick_duration_ms: f64,
    pub frame_rate_hz: f64,
}

impl OrchestratorMetrics {
    pub(crate) fn record_success(
        &mut self,
        duration: Duration,
        paused: bool,
        readback: bool,
        tuning_pushed: bool,
    ) {
        let duration_ms = duration.as_secs_f64() * 1000.0;

        self.total_ticks += 1;
        self.successful_ticks += 1;
        self.paused_ticks += paused as u64;
        self.readback_ticks += readback as u64;
        self.tuning_pushes += tuning_pushed as u64;
        self.last_tick_duration_ms = duration_ms;

        if duration_ms > self.max_tick_duration_ms {
            self.max_tick_duration_ms = duration_ms;
        }

        let total = self.avg_tick_duration_ms * (self.successful_ticks - 1) as f64;
        self.avg_tick_duration_ms = (total + duration_ms) / self.successful_ticks as f64;
    }

    pub(crate) fn record_failure(&mut self, duration: Duration) {
        self.total_ticks += 1;
        self.failed_ticks += 1;
        self.last_tick_duration_ms = duration.as_secs_f64() * 1000.0;
    }
}

/// Point-in-time view of the orchestrator, for status output
#[derive(Debug, Clone, Serialize)]
pub struct OrchestratorSnapshot {
    pub name: String,
    pub display: String,
    pub grid: GridSize,
    pub readback_supported: bool,
    pub paused: bool,
    pub application: Option<String>,
    pub tuning_last_pushed_secs: f64,
    pub metrics: OrchestratorMetrics,
}
