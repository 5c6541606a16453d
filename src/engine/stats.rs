// Materialization statistics: files written, failures, bytes and connection usage.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

#[derive(Debug, Clone)]
pub struct StatsSnapshot {
    pub files_written: u64,
    pub files_failed: u64,
    pub bytes_written: u64,
    pub active_workers: u32,
    pub peak_workers: u32,
    pub elapsed: Duration,
    pub write_bps: u64,
}

pub struct StatsCollector {
    files_written: AtomicU64,
    files_failed: AtomicU64,
    bytes_written: AtomicU64,
    active_workers: AtomicU32,
    peak_workers: AtomicU32,
    started_at: Mutex<Instant>,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self {
            files_written: AtomicU64::new(0),
            files_failed: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            active_workers: AtomicU32::new(0),
            peak_workers: AtomicU32::new(0),
            started_at: Mutex::new(Instant::now()),
        }
    }

    /// Restart the clock used for throughput.
    pub fn restart(&self) {
        *self.started_at.lock() = Instant::now();
    }

    pub fn record_file_written(&self, bytes: u64) {
        self.files_written.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_file_failed(&self) {
        self.files_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_workers(&self) {
        let now = self.active_workers.fetch_add(1, Ordering::Relaxed) + 1;
        self.peak_workers.fetch_max(now, Ordering::Relaxed);
    }

    pub fn decrement_workers(&self) {
        self.active_workers.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let elapsed = self.started_at.lock().elapsed();
        let bytes_written = self.bytes_written.load(Ordering::Relaxed);
        let secs = elapsed.as_secs_f64();
        let write_bps = if secs > 0.1 {
            (bytes_written as f64 / secs) as u64
        } else {
            0
        };

        StatsSnapshot {
            files_written: self.files_written.load(Ordering::Relaxed),
            files_failed: self.files_failed.load(Ordering::Relaxed),
            bytes_written,
            active_workers: self.active_workers.load(Ordering::Relaxed),
            peak_workers: self.peak_workers.load(Ordering::Relaxed),
            elapsed,
            write_bps,
        }
    }
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new()
    }
}
