use serde::Serialize;
use std::fmt::Write;
use std::time::Instant;

/// Wall time spent in one stage of the per-file pipeline.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTiming {
    pub label: String,
    pub elapsed_ms: f64,
}

/// Stage timings for one processed file, in execution order.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingBreakdown {
    pub total_ms: f64,
    pub stages: Vec<StageTiming>,
}

impl TimingBreakdown {
    /// Runs `f`, recording its wall time under `label`.
    pub fn measure<T>(&mut self, label: &str, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        self.stages.push(StageTiming {
            label: label.to_string(),
            elapsed_ms: elapsed_ms(start),
        });
        out
    }

    /// Sets the total from the pipeline start.
    pub fn finish(&mut self, start: Instant) {
        self.total_ms = elapsed_ms(start);
    }

    pub fn stage_ms(&self, label: &str) -> Option<f64> {
        self.stages
            .iter()
            .find(|s| s.label == label)
            .map(|s| s.elapsed_ms)
    }

    /// One-line summary for debug logs, e.g. `total 12.3ms (load 0.4, predict 11.2)`.
    pub fn summary(&self) -> String {
        let mut out = format!("total {:.1}ms", self.total_ms);
        if !self.stages.is_empty() {
            let stages: Vec<String> = self
                .stages
                .iter()
                .map(|s| format!("{} {:.1}", s.label, s.elapsed_ms))
                .collect();
            let _ = write!(out, " ({})", stages.join(", "));
        }
        out
    }
}

pub fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
