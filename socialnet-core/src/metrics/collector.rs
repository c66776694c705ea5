//! In-memory metrics sink

use super::MetricsSink;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

type Key = (&'static str, &'static str);

/// Metrics collector that aggregates counts per (metric, method)
#[derive(Debug, Default)]
pub struct MetricsCollector {
    counters: Mutex<HashMap<Key, u64>>,
    timings: Mutex<HashMap<Key, Vec<Duration>>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a counter
    pub fn count(&self, name: &'static str, method: &'static str) -> u64 {
        self.counters
            .lock()
            .map(|c| c.get(&(name, method)).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Number of durations recorded for a timing
    pub fn timings(&self, name: &'static str, method: &'static str) -> usize {
        self.timings
            .lock()
            .map(|t| t.get(&(name, method)).map(Vec::len).unwrap_or(0))
            .unwrap_or(0)
    }
}

impl MetricsSink for MetricsCollector {
    fn increment(&self, name: &'static str, method: &'static str) {
        if let Ok(mut counters) = self.counters.lock() {
            *counters.entry((name, method)).or_insert(0) += 1;
        }
    }

    fn record_duration(&self, name: &'static str, method: &'static str, elapsed: Duration) {
        if let Ok(mut timings) = self.timings.lock() {
            timings.entry((name, method)).or_default().push(elapsed);
        }
    }
}
