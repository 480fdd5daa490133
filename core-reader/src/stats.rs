//! Reader counters.

use crate::fill::FillOutcome;
use serde::{Deserialize, Serialize};

/// Snapshot of a reader's activity since it was opened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderStats {
    /// Reads that reached the cache (EOF and empty reads excluded).
    pub reads: u64,
    /// Reads answered from an already filled buffer.
    pub hits: u64,
    /// Reads that needed a fill.
    pub misses: u64,
    /// Fills run.
    pub fills: u64,
    /// Fills that produced nothing.
    pub failed_fills: u64,
    /// Bytes reported by fills.
    pub bytes_filled: u64,
    /// Bytes copied out to callers.
    pub bytes_served: u64,
    /// Workers that hit an integrity fault.
    pub integrity_faults: u64,
    /// Workers that hit any other fault.
    pub io_faults: u64,
    /// Fills that left a hole behind a short worker.
    pub gaps: u64,
}

impl ReaderStats {
    /// Fraction of reads served without a fill.
    pub fn hit_ratio(&self) -> f64 {
        if self.reads == 0 {
            return 0.0;
        }
        self.hits as f64 / self.reads as f64
    }

    pub(crate) fn record_hit(&mut self) {
        self.reads += 1;
        self.hits += 1;
    }

    pub(crate) fn record_miss(&mut self) {
        self.reads += 1;
        self.misses += 1;
    }

    pub(crate) fn record_fill(&mut self, outcome: &FillOutcome) {
        self.fills += 1;
        self.bytes_filled += outcome.bytes as u64;
        self.integrity_faults += outcome.integrity_faults as u64;
        self.io_faults += outcome.io_faults as u64;
        if outcome.gap_detected {
            self.gaps += 1;
        }
        if outcome.bytes == 0 {
            self.failed_fills += 1;
        }
    }

    pub(crate) fn record_served(&mut self, bytes: usize) {
        self.bytes_served += bytes as u64;
    }
}
