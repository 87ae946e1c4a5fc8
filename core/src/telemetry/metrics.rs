use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};

/// Counters describing how loads have gone so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseMetrics {
    pub rows_parsed: usize,
    pub rows_skipped: usize,
    pub load_failures: usize,
}

pub struct MetricsRecorder {
    inner: Mutex<ParseMetrics>,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(ParseMetrics::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ParseMetrics> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn record_parsed(&self, rows: usize) {
        self.lock().rows_parsed += rows;
    }

    pub fn record_skipped(&self, rows: usize) {
        self.lock().rows_skipped += rows;
    }

    pub fn record_failure(&self) {
        self.lock().load_failures += 1;
    }

    pub fn snapshot(&self) -> ParseMetrics {
        *self.lock()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let metrics = MetricsRecorder::new();
        metrics.record_parsed(3);
        metrics.record_parsed(2);
        metrics.record_skipped(1);
        metrics.record_failure();
        assert_eq!(
            metrics.snapshot(),
            ParseMetrics {
                rows_parsed: 5,
                rows_skipped: 1,
                load_failures: 1
            }
        );
    }
}
