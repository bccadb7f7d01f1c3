//! # Collector de Métricas
//! src/metrics/collector.rs
//!
//! Recolecta métricas de los requests HTTP en tiempo real.
//! Las del executor y la cola viven en `/status`.

use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Latencias guardadas para calcular percentiles
const MAX_LATENCIES: usize = 10_000;

/// Collector de métricas thread-safe
#[derive(Clone)]
pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsData>>,
    start_time: Instant,
}

#[derive(Default)]
struct MetricsData {
    total_requests: u64,
    status_codes: BTreeMap<u16, u64>,
    /// Microsegundos, las más viejas primero
    latencies: VecDeque<u64>,
    requests_per_path: BTreeMap<String, u64>,
    active_connections: u64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MetricsData::default())),
            start_time: Instant::now(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MetricsData> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registra un request terminado
    pub fn record_request(&self, path: &str, status_code: u16, latency: Duration) {
        let mut data = self.lock();

        data.total_requests += 1;
        *data.status_codes.entry(status_code).or_insert(0) += 1;
        *data.requests_per_path.entry(path.to_string()).or_insert(0) += 1;

        if data.latencies.len() >= MAX_LATENCIES {
            data.latencies.pop_front();
        }
        data.latencies.push_back(latency.as_micros() as u64);
    }

    pub fn connection_opened(&self) {
        self.lock().active_connections += 1;
    }

    pub fn connection_closed(&self) {
        let mut data = self.lock();
        data.active_connections = data.active_connections.saturating_sub(1);
    }

    pub fn active_connections(&self) -> u64 {
        self.lock().active_connections
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let data = self.lock();

        MetricsSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),
            total_requests: data.total_requests,
            active_connections: data.active_connections,
            status_codes: data
                .status_codes
                .iter()
                .map(|(code, count)| (code.to_string(), *count))
                .collect(),
            requests_per_path: data.requests_per_path.clone(),
            latency_us: LatencySummary::from_samples(data.latencies.iter().copied()),
        }
    }

    /// Métricas en formato JSON para `/metrics`
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Percentiles de latencia en microsegundos
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LatencySummary {
    pub p50: u64,
    pub p95: u64,
    pub p99: u64,
    pub avg: u64,
    pub samples: usize,
}

impl LatencySummary {
    fn from_samples(samples: impl Iterator<Item = u64>) -> Self {
        let mut sorted: Vec<u64> = samples.collect();
        if sorted.is_empty() {
            return Self::default();
        }
        sorted.sort_unstable();

        let len = sorted.len();
        Self {
            p50: sorted[len * 50 / 100],
            p95: sorted[len * 95 / 100],
            p99: sorted[len * 99 / 100],
            avg: sorted.iter().sum::<u64>() / len as u64,
            samples: len,
        }
    }
}

/// Snapshot de métricas
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub total_requests: u64,
    pub active_connections: u64,
    pub status_codes: BTreeMap<String, u64>,
    pub requests_per_path: BTreeMap<String, u64>,
    pub latency_us: LatencySummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_by_status_and_path() {
        let collector = MetricsCollector::new();

        collector.record_request("/send", 200, Duration::from_millis(1));
        collector.record_request("/send", 400, Duration::from_millis(1));
        collector.record_request("/status", 200, Duration::from_millis(1));

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.total_requests, 3);
        assert_eq!(snapshot.status_codes["200"], 2);
        assert_eq!(snapshot.status_codes["400"], 1);
        assert_eq!(snapshot.requests_per_path["/send"], 2);
    }

    #[test]
    fn test_percentiles() {
        let collector = MetricsCollector::new();
        for i in 1..=100 {
            collector.record_request("/send", 200, Duration::from_micros(i));
        }

        let latency = collector.snapshot().latency_us;
        assert_eq!(latency.samples, 100);
        assert!(latency.p95 > latency.p50);
        assert!(latency.p99 > latency.p95);
    }

    #[test]
    fn test_latency_window_is_bounded() {
        let collector = MetricsCollector::new();
        for i in 0..(MAX_LATENCIES as u64 + 500) {
            collector.record_request("/send", 200, Duration::from_micros(i));
        }

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.total_requests, MAX_LATENCIES as u64 + 500);
        assert_eq!(snapshot.latency_us.samples, MAX_LATENCIES);
    }

    #[test]
    fn test_active_connections_never_negative() {
        let collector = MetricsCollector::new();

        collector.connection_opened();
        collector.connection_closed();
        collector.connection_closed();

        assert_eq!(collector.active_connections(), 0);
    }

    #[test]
    fn test_json_is_valid() {
        let collector = MetricsCollector::new();
        collector.record_request("/send", 200, Duration::from_millis(5));

        let json: serde_json::Value = serde_json::from_str(&collector.to_json()).unwrap();
        assert_eq!(json["total_requests"], 1);
        assert_eq!(json["requests_per_path"]["/send"], 1);
        assert!(json["latency_us"]["p50"].as_u64().unwrap() >= 5000);
    }
}
