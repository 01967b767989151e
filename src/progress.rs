// src/progress.rs
//! Scan progress bar using indicatif

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::stats::ScanStats;

const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Progress bar over the entries of one scan
pub struct ProgressIndicator {
    bar: Option<ProgressBar>,
}

impl ProgressIndicator {
    /// Create a progress bar for `total` entries, or a no-op when disabled
    pub fn new(enabled: bool, total: u64) -> Self {
        if !enabled {
            return Self { bar: None };
        }

        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );

        Self { bar: Some(bar) }
    }

    /// Refresh the bar from `stats` until the returned task is aborted
    pub fn spawn_ticker(&self, stats: ScanStats, start_index: u64) -> Option<JoinHandle<()>> {
        let bar = self.bar.clone()?;

        Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK_INTERVAL);
            loop {
                interval.tick().await;
                let total = bar.length().unwrap_or_default();
                bar.set_position(stats.processed());
                bar.set_message(stats.format_progress(start_index, total));
            }
        }))
    }

    /// Finish and clear the bar
    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.bar.is_some()
    }
}
