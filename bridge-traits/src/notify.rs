//! Integrity Fault Notification
//!
//! Hosts surface corrupted content to users in platform-specific ways
//! (toast, dialog, log). The core only promises to call the notifier at
//! most once per reader; how and where the report is displayed is the
//! host's business.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Details about the first integrity failure seen by a reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityFaultReport {
    /// Absolute plaintext offset where the failing worker started reading.
    pub offset: u64,
    /// Index of the worker stream that hit the fault.
    pub worker: usize,
    /// Message from the decrypting stream.
    pub message: String,
}

/// Receives integrity fault notifications.
///
/// Called on the thread that issued the read, after the fill workers have
/// joined and while the reader is still locked. Implementations should hand
/// the report off (channel, event bus, UI dispatcher) and return; a blocking
/// notifier stalls every reader call until it returns.
pub trait IntegrityNotifier: Send + Sync {
    fn notify_integrity_fault(&self, report: &IntegrityFaultReport);
}

/// Notifier that drops every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl IntegrityNotifier for NoopNotifier {
    fn notify_integrity_fault(&self, _report: &IntegrityFaultReport) {}
}

/// Adapts a closure into an [`IntegrityNotifier`].
///
/// The closure runs inline on the reading thread, so keep it short.
///
/// ```
/// use bridge_traits::notify::{FnNotifier, IntegrityNotifier, IntegrityFaultReport};
///
/// let notifier = FnNotifier::new(|report: &IntegrityFaultReport| {
///     eprintln!("corrupted chunk near {}", report.offset);
/// });
/// notifier.notify_integrity_fault(&IntegrityFaultReport {
///     offset: 0,
///     worker: 0,
///     message: "tag mismatch".into(),
/// });
/// ```
pub struct FnNotifier<F> {
    callback: F,
}

impl<F> FnNotifier<F>
where
    F: Fn(&IntegrityFaultReport) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> IntegrityNotifier for FnNotifier<F>
where
    F: Fn(&IntegrityFaultReport) + Send + Sync,
{
    fn notify_integrity_fault(&self, report: &IntegrityFaultReport) {
        (self.callback)(report)
    }
}

impl<F> fmt::Debug for FnNotifier<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnNotifier").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn report() -> IntegrityFaultReport {
        IntegrityFaultReport {
            offset: 4096,
            worker: 2,
            message: "tag mismatch".to_string(),
        }
    }

    #[test]
    fn test_fn_notifier_invokes_closure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let notifier = FnNotifier::new(move |r: &IntegrityFaultReport| {
            assert_eq!(r.worker, 2);
            seen.fetch_add(1, Ordering::SeqCst);
        });

        notifier.notify_integrity_fault(&report());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_noop_notifier() {
        NoopNotifier.notify_integrity_fault(&report());
    }

    #[test]
    fn test_report_serializes() {
        let json = serde_json::to_string(&report()).unwrap();
        assert!(json.contains("\"offset\":4096"));
        let back: IntegrityFaultReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report());
    }
}
