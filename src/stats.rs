// src/stats.rs
//! Per-scan statistics

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Entries processed during one scan, shared with the worker tasks
#[derive(Clone)]
pub struct ScanStats {
    processed: Arc<AtomicU64>,
    start_time: Instant,
}

/// Result of a completed scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSummary {
    pub processed: u64,
    pub elapsed: Duration,
}

impl ScanStats {
    /// Start a fresh counter at zero
    pub fn new() -> Self {
        Self {
            processed: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }

    pub(crate) fn increment_processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Entries per second since the scan started
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed().as_secs_f64();
        if secs > 0.0 {
            self.processed() as f64 / secs
        } else {
            0.0
        }
    }

    pub fn summary(&self) -> ScanSummary {
        ScanSummary {
            processed: self.processed(),
            elapsed: self.elapsed(),
        }
    }

    /// Progress line for a scan of `total` entries starting at `start_index`
    pub fn format_progress(&self, start_index: u64, total: u64) -> String {
        let processed = self.processed();
        let throughput = self.throughput();
        let eta = if throughput > 0.0 {
            let remaining = total.saturating_sub(processed) as f64;
            Self::format_duration((remaining / throughput) as u64)
        } else {
            "unknown".to_string()
        };

        format!(
            "Processed: {} entries (to index {}). Throughput: {:.2}/s ETA: {}",
            processed,
            start_index + processed,
            throughput,
            eta
        )
    }

    /// Format a duration in whole seconds
    pub fn format_duration(secs: u64) -> String {
        let hours = secs / 3600;
        let minutes = (secs % 3600) / 60;
        let seconds = secs % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}

impl Default for ScanStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_new_stats_are_zero() {
        let stats = ScanStats::new();
        assert_eq!(stats.processed(), 0);
        assert_eq!(stats.summary().processed, 0);
    }

    #[test]
    fn test_clone_shares_counter() {
        let stats1 = ScanStats::new();
        let stats2 = stats1.clone();

        stats1.increment_processed();
        stats2.increment_processed();

        assert_eq!(stats1.processed(), 2);
        assert_eq!(stats2.processed(), 2);
    }

    #[test]
    fn test_concurrent_increments() {
        let stats = ScanStats::new();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let stats = stats.clone();
                thread::spawn(move || {
                    for _ in 0..1000 {
                        stats.increment_processed();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(stats.processed(), 8000);
    }

    #[test]
    fn test_throughput() {
        let stats = ScanStats::new();
        thread::sleep(Duration::from_millis(50));
        for _ in 0..10 {
            stats.increment_processed();
        }
        assert!(stats.throughput() > 0.0);
        assert!(stats.format_progress(100, 1000).starts_with("Processed: 10 entries (to index 110)"));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(ScanStats::format_duration(30), "30s");
        assert_eq!(ScanStats::format_duration(90), "1m 30s");
        assert_eq!(ScanStats::format_duration(3661), "1h 1m 1s");
    }
}
