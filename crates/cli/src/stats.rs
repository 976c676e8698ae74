//! Latency statistics for `cinemood benchmark`.

use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct LatencyStats {
    pub count: usize,
    pub average: Duration,
    pub p50: Duration,
    pub p95: Duration,
    pub p99: Duration,
    pub max: Duration,
}

impl LatencyStats {
    /// `None` when no request completed
    pub fn from_timings(mut timings: Vec<Duration>) -> Option<Self> {
        if timings.is_empty() {
            return None;
        }
        timings.sort();

        let count = timings.len();
        let total: Duration = timings.iter().sum();
        Some(Self {
            count,
            average: total / count as u32,
            p50: percentile(&timings, 0.50),
            p95: percentile(&timings, 0.95),
            p99: percentile(&timings, 0.99),
            max: timings[count - 1],
        })
    }
}

/// Nearest-rank percentile of sorted, non-empty timings
fn percentile(sorted: &[Duration], p: f64) -> Duration {
    let rank = (p * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}
