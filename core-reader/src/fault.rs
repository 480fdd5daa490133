//! Single-shot integrity fault reporting shared by all fill workers.

use bridge_traits::notify::{IntegrityFaultReport, IntegrityNotifier};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Forwards at most one integrity fault per reader to the host notifier.
///
/// Workers of the same fill may fault at the same time; the flag is claimed
/// with a compare-and-swap so only the winner's report is kept. The flag is
/// never reset.
///
/// Claiming and delivering are separate steps. Workers call [`report`],
/// which only records the winning report; the fill coordinator calls
/// [`notify_pending`] after the join, so a slow notifier never holds up a
/// fill worker.
///
/// [`report`]: FaultReporter::report
/// [`notify_pending`]: FaultReporter::notify_pending
pub struct FaultReporter {
    reported: AtomicBool,
    pending: Mutex<Option<IntegrityFaultReport>>,
    notifier: Arc<dyn IntegrityNotifier>,
}

impl FaultReporter {
    pub fn new(notifier: Arc<dyn IntegrityNotifier>) -> Self {
        Self {
            reported: AtomicBool::new(false),
            pending: Mutex::new(None),
            notifier,
        }
    }

    /// Record an integrity fault. Returns `true` if this call won the flag;
    /// its report is delivered by the next [`FaultReporter::notify_pending`].
    pub fn report(&self, report: IntegrityFaultReport) -> bool {
        if self
            .reported
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(
                offset = report.offset,
                worker = report.worker,
                "integrity fault already reported"
            );
            return false;
        }

        warn!(
            offset = report.offset,
            worker = report.worker,
            message = %report.message,
            "integrity check failed"
        );
        *self.pending.lock() = Some(report);
        true
    }

    /// Hand the recorded report, if any, to the host notifier.
    ///
    /// Returns `true` if a report was delivered. Later calls do nothing.
    pub fn notify_pending(&self) -> bool {
        let Some(report) = self.pending.lock().take() else {
            return false;
        };
        debug!(offset = report.offset, "notifying host of integrity fault");
        self.notifier.notify_integrity_fault(&report);
        true
    }

    /// Whether the host has been notified.
    pub fn has_reported(&self) -> bool {
        self.reported.load(Ordering::Acquire)
    }
}

impl fmt::Debug for FaultReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaultReporter")
            .field("reported", &self.has_reported())
            .finish_non_exhaustive()
    }
}
