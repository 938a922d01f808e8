//! Shared progress tracking for parallel diagram generation.
//!
//! Workers bump an atomic counter; reporting is throttled so that at most one
//! log line per interval is emitted no matter how many workers finish.

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Counts completed jobs and reports progress at a bounded rate.
pub struct ProgressTracker {
    label: String,
    total: u64,
    completed: AtomicU64,
    interval: Duration,
    last_report: Mutex<Instant>,
    bar: Option<ProgressBar>,
}

impl ProgressTracker {
    pub fn new(label: impl Into<String>, total: u64) -> Self {
        Self {
            label: label.into(),
            total,
            completed: AtomicU64::new(0),
            interval: DEFAULT_INTERVAL,
            last_report: Mutex::new(Instant::now()),
            bar: None,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Also drive a terminal progress bar
    pub fn with_bar(mut self) -> Self {
        let pb = ProgressBar::new(self.total);
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} tables {msg}",
            )
            .unwrap()
            .progress_chars("█▓▒░  ")
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        self.bar = Some(pb);
        self
    }

    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Record one finished job, returning the new count
    pub fn inc(&self) -> u64 {
        let done = self.completed.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(pb) = &self.bar {
            pb.set_position(done);
        }
        if self.should_report() {
            log::info!("{}: {}/{}", self.label, done, self.total);
        }
        done
    }

    /// True at most once per interval across all threads
    fn should_report(&self) -> bool {
        let Ok(mut last) = self.last_report.try_lock() else {
            return false;
        };
        let now = Instant::now();
        if now.duration_since(*last) < self.interval {
            return false;
        }
        *last = now;
        true
    }

    pub fn finish(&self) {
        if let Some(pb) = &self.bar {
            pb.finish_with_message("done");
        }
        log::info!("{}: {}/{} done", self.label, self.completed(), self.total);
    }
}
