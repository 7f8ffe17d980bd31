//! Pipeline counters shared across workers.

use serde::Serialize;
use std::sync::Mutex;

/// Point-in-time copy of the pipeline counters.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MetricsSnapshot {
    pub packets_decoded: usize,
    pub packets_dropped: usize,
    pub sweeps_emitted: usize,
    pub pairings: usize,
    pub errors: usize,
}

/// Counter set updated by the readers and the processor; cloned out via
/// `snapshot` for shutdown reporting.
#[derive(Default)]
pub struct PipelineMetrics {
    inner: Mutex<MetricsSnapshot>,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_packet_decoded(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.packets_decoded += 1;
        }
    }

    pub fn record_packet_dropped(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.packets_dropped += 1;
        }
    }

    pub fn record_sweep_emitted(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.sweeps_emitted += 1;
        }
    }

    pub fn record_pairing(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.pairings += 1;
        }
    }

    pub fn record_error(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.errors += 1;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.inner.lock().map(|metrics| *metrics).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_independently() {
        let metrics = PipelineMetrics::new();
        metrics.record_packet_decoded();
        metrics.record_packet_decoded();
        metrics.record_packet_dropped();
        metrics.record_pairing();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.packets_decoded, 2);
        assert_eq!(snapshot.packets_dropped, 1);
        assert_eq!(snapshot.pairings, 1);
        assert_eq!(snapshot.errors, 0);
    }
}
