//! Metrics emission for observability
//!
//! Components never touch a global registry directly; they hold an injected
//! [`MetricsSink`]. [`FacadeSink`] forwards to the `metrics` facade (and from
//! there to whatever exporter the binary installs), [`MetricsCollector`]
//! keeps counts in memory for tests and diagnostics.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::sync::Arc;
use std::time::{Duration, Instant};

mod collector;

pub use collector::MetricsCollector;

pub const RPC_REQUESTS: &str = "rpc.requests.total";
pub const RPC_FAILURES: &str = "rpc.requests.failed";
pub const RPC_DURATION: &str = "rpc.request.duration_ms";
pub const FEED_CACHE_HIT: &str = "newsfeed.cache.hit";
pub const FEED_CACHE_MISS: &str = "newsfeed.cache.miss";
pub const FEED_CACHE_ERROR: &str = "newsfeed.cache.error";
pub const FEED_GENERATED: &str = "newsfeed.generated";

/// Destination for counters and timings
pub trait MetricsSink: Send + Sync {
    /// Bump counter `name` for `method` by one
    fn increment(&self, name: &'static str, method: &'static str);

    /// Record how long `method` took
    fn record_duration(&self, name: &'static str, method: &'static str, elapsed: Duration);
}

/// Sink that forwards to the `metrics` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct FacadeSink;

impl MetricsSink for FacadeSink {
    fn increment(&self, name: &'static str, method: &'static str) {
        counter!(name, "method" => method).increment(1);
    }

    fn record_duration(&self, name: &'static str, method: &'static str, elapsed: Duration) {
        histogram!(name, "method" => method).record(elapsed.as_secs_f64() * 1000.0);
    }
}

/// Sink that drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl MetricsSink for NoopSink {
    fn increment(&self, _name: &'static str, _method: &'static str) {}

    fn record_duration(&self, _name: &'static str, _method: &'static str, _elapsed: Duration) {}
}

/// Register metric descriptions with the installed recorder
pub fn describe_metrics() {
    describe_counter!(RPC_REQUESTS, "Total RPC requests handled, by method");
    describe_counter!(RPC_FAILURES, "RPC requests that failed with an infrastructure error");
    describe_histogram!(RPC_DURATION, "RPC request duration in milliseconds");
    describe_counter!(FEED_CACHE_HIT, "Newsfeed requests served from cache");
    describe_counter!(FEED_CACHE_MISS, "Newsfeed requests that missed the cache");
    describe_counter!(FEED_CACHE_ERROR, "Cache backend failures downgraded to misses");
    describe_counter!(FEED_GENERATED, "Newsfeeds computed from the follow graph");
}

/// Timer for measuring operation duration
pub struct Timer {
    sink: Arc<dyn MetricsSink>,
    method: &'static str,
    start: Instant,
}

impl Timer {
    pub fn start(sink: Arc<dyn MetricsSink>, method: &'static str) -> Self {
        Self {
            sink,
            method,
            start: Instant::now(),
        }
    }

    /// Stop the timer and record the duration
    pub fn stop(self) {
        self.sink
            .record_duration(RPC_DURATION, self.method, self.start.elapsed());
    }
}
