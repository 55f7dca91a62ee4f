//! Stage latency windows.
//! Every reel flow records its stage timings and one end-to-end timing keyed
//! by outcome, so failed flows show up next to delivered ones.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, info};

pub mod metric_names {
    pub const FETCH_METADATA: &str = "t_fetch_metadata";
    pub const TRANSCRIBE: &str = "t_transcribe";
    pub const ASSEMBLE: &str = "t_assemble";
    pub const TRANSLATE: &str = "t_translate";
    pub const FLOW_DELIVERED: &str = "t_flow_delivered";
    pub const FLOW_FAILED: &str = "t_flow_failed";
    /// Flow cut short by a chat API error.
    pub const FLOW_ABORTED: &str = "t_flow_aborted";
}

const DEFAULT_WINDOW: usize = 512;

/// Most recent samples for one metric, oldest first.
struct LatencyWindow {
    samples: VecDeque<Duration>,
    limit: usize,
}

impl LatencyWindow {
    fn new(limit: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(limit.min(64)),
            limit,
        }
    }

    fn push(&mut self, sample: Duration) {
        if self.samples.len() == self.limit {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Nearest-rank quantile, `q` in 0..=1.
    fn quantile(sorted: &[Duration], q: f64) -> Duration {
        if sorted.is_empty() {
            return Duration::ZERO;
        }
        let rank = (q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64).round() as usize;
        sorted[rank]
    }

    fn summarize(&self) -> LatencySummary {
        let mut sorted: Vec<Duration> = self.samples.iter().copied().collect();
        sorted.sort_unstable();
        LatencySummary {
            count: sorted.len(),
            p50: Self::quantile(&sorted, 0.50),
            p95: Self::quantile(&sorted, 0.95),
            max: sorted.last().copied().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencySummary {
    pub count: usize,
    pub p50: Duration,
    pub p95: Duration,
    pub max: Duration,
}

pub struct MetricsRegistry {
    windows: Mutex<HashMap<&'static str, LatencyWindow>>,
    window: usize,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::with_window(DEFAULT_WINDOW)
    }

    pub fn with_window(window: usize) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            window: window.max(1),
        }
    }

    pub fn record(&self, name: &'static str, elapsed: Duration) {
        self.windows
            .lock()
            .entry(name)
            .or_insert_with(|| LatencyWindow::new(self.window))
            .push(elapsed);
        debug!(metric = name, elapsed_ms = elapsed.as_millis() as u64, "metric_recorded");
    }

    /// Records the time elapsed since `started`.
    pub fn record_since(&self, name: &'static str, started: Instant) {
        self.record(name, started.elapsed());
    }

    /// Samples currently held for `name`.
    pub fn count(&self, name: &str) -> usize {
        self.windows.lock().get(name).map_or(0, |w| w.samples.len())
    }

    /// Per-metric summaries sorted by name.
    pub fn summary(&self) -> Vec<(&'static str, LatencySummary)> {
        let windows = self.windows.lock();
        let mut out: Vec<_> = windows
            .iter()
            .map(|(&name, window)| (name, window.summarize()))
            .collect();
        out.sort_by_key(|(name, _)| *name);
        out
    }

    pub fn log_summary(&self) {
        for (name, s) in self.summary() {
            info!(
                metric = name,
                count = s.count,
                p50_ms = s.p50.as_millis() as u64,
                p95_ms = s.p95.as_millis() as u64,
                max_ms = s.max.as_millis() as u64,
                "metric_summary"
            );
        }
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}
