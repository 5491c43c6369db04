//! Per-host aggregation over a metrics snapshot.
//!
//! Enabled with the `summary` feature.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::AttemptMetric;

/// Aggregated view of one host's attempts.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostSummary {
    pub host: String,
    pub attempts: usize,
    /// Attempts that ended with a 2xx status.
    ///
    /// Includes 2xx responses whose payload the validator rejected, since the
    /// recorder keeps the status but not the verdict.
    pub http_ok: usize,
    /// Attempts made while the host served as a fallback.
    pub fallbacks: usize,
    pub mean_latency_ms: f64,
    pub p95_latency_ms: u64,
}

impl HostSummary {
    /// Share of attempts that ended with a 2xx status.
    pub fn http_ok_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.http_ok as f64 / self.attempts as f64
        }
    }
}

/// Groups metrics by host, sorted by host name.
pub fn summarize(metrics: &[AttemptMetric]) -> Vec<HostSummary> {
    let mut by_host: BTreeMap<&str, Vec<&AttemptMetric>> = BTreeMap::new();
    for metric in metrics {
        by_host
            .entry(metric.endpoint_host.as_str())
            .or_default()
            .push(metric);
    }

    by_host
        .into_iter()
        .map(|(host, entries)| {
            let mut latencies: Vec<u64> = entries.iter().map(|m| m.latency_ms).collect();
            latencies.sort_unstable();
            let total: u64 = latencies.iter().sum();

            HostSummary {
                host: host.to_owned(),
                attempts: entries.len(),
                http_ok: entries
                    .iter()
                    .filter(|m| (200..300).contains(&m.status_code))
                    .count(),
                fallbacks: entries.iter().filter(|m| m.is_fallback).count(),
                mean_latency_ms: total as f64 / entries.len() as f64,
                p95_latency_ms: percentile(&latencies, 95),
            }
        })
        .collect()
}

// Nearest-rank percentile over sorted input.
fn percentile(sorted: &[u64], pct: usize) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let rank = (pct * sorted.len()).div_ceil(100).max(1);
    sorted[rank.min(sorted.len()) - 1]
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{percentile, summarize};
    use crate::AttemptMetric;

    fn metric(host: &str, latency_ms: u64, status_code: u16, is_fallback: bool) -> AttemptMetric {
        AttemptMetric {
            id: latency_ms,
            timestamp: Utc::now(),
            endpoint_host: host.to_owned(),
            latency_ms,
            status_code,
            is_fallback,
            method: "GET".to_owned(),
        }
    }

    #[test]
    fn groups_by_host() {
        let metrics = vec![
            metric("b.example", 40, 200, true),
            metric("a.example", 10, 200, false),
            metric("a.example", 30, 0, false),
            metric("a.example", 20, 503, false),
        ];

        let summary = summarize(&metrics);
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].host, "a.example");
        assert_eq!(summary[0].attempts, 3);
        assert_eq!(summary[0].http_ok, 1);
        assert_eq!(summary[0].fallbacks, 0);
        assert!((summary[0].mean_latency_ms - 20.0).abs() < f64::EPSILON);
        assert_eq!(summary[0].p95_latency_ms, 30);
        assert_eq!(summary[1].fallbacks, 1);
        assert!((summary[1].http_ok_rate() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn nearest_rank_percentile() {
        let sorted: Vec<u64> = (1..=100).collect();
        assert_eq!(percentile(&sorted, 95), 95);
        assert_eq!(percentile(&sorted, 50), 50);
        assert_eq!(percentile(&[7], 95), 7);
        assert_eq!(percentile(&[], 95), 0);
    }
}
