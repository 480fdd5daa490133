//! # Parallel Fill
//!
//! Splits one cache fill into contiguous parts and decrypts them at the same
//! time, each part on its own worker stream.
//!
//! ## Placement
//!
//! With `n` workers and a fill of `len` bytes, `part = ceil(len / n)` and
//! worker `i` owns `target[i * part .. (i + 1) * part]` (the last part is
//! shorter). The target is split with `chunks_mut`, so every worker writes
//! a disjoint slice and placement does not depend on completion order.
//!
//! ## Faults
//!
//! A worker that fails contributes 0 bytes and never cancels its siblings.
//! Integrity faults are recorded on the [`FaultReporter`] and the host is
//! notified on the calling thread once every worker has joined; everything
//! else is logged at debug level and dropped.

use crate::error::{ReaderError, Result};
use crate::fault::FaultReporter;
use bridge_traits::notify::IntegrityFaultReport;
use bridge_traits::{BridgeError, DecryptingStream};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::fmt;
use tracing::{debug, trace};

/// Result of one fill, after every worker has finished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FillOutcome {
    /// Bytes the fill reports as written.
    pub bytes: usize,
    /// Number of workers that took part.
    pub workers: usize,
    /// Workers that hit an integrity fault.
    pub integrity_faults: usize,
    /// Workers that hit any other fault.
    pub io_faults: usize,
    /// Workers that returned fewer bytes than their part.
    pub short_workers: usize,
    /// A short worker was followed by one that produced data.
    pub gap_detected: bool,
}

impl FillOutcome {
    /// Any worker faulted or the buffer has a hole.
    pub fn is_degraded(&self) -> bool {
        self.integrity_faults > 0 || self.io_faults > 0 || self.gap_detected
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkerFault {
    Integrity,
    Io,
}

#[derive(Debug, Clone, Copy, Default)]
struct WorkerReport {
    bytes: usize,
    expected: usize,
    fault: Option<WorkerFault>,
}

impl WorkerReport {
    fn is_short(&self) -> bool {
        self.bytes < self.expected
    }
}

/// Drives worker streams to fill one buffer and joins them.
pub struct ParallelFillCoordinator {
    pool: Option<ThreadPool>,
    thread_count: usize,
    truncate_on_short_read: bool,
}

impl ParallelFillCoordinator {
    /// Build the worker pool.
    ///
    /// `thread_count == 0` builds no pool; fills then run on the calling
    /// thread with a single stream.
    pub fn new(thread_count: usize, truncate_on_short_read: bool) -> Result<Self> {
        let pool = if thread_count == 0 {
            None
        } else {
            let pool = ThreadPoolBuilder::new()
                .num_threads(thread_count)
                .thread_name(|index| format!("reader-fill-{index}"))
                .build()
                .map_err(|e| ReaderError::WorkerPool(e.to_string()))?;
            Some(pool)
        };

        Ok(Self {
            pool,
            thread_count,
            truncate_on_short_read,
        })
    }

    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    /// Fill `storage[write_offset .. write_offset + requested_size]` with
    /// plaintext starting at `start_position`.
    ///
    /// Blocks until every worker has returned, then delivers a pending
    /// integrity report to the host notifier. The requested range is
    /// clamped to the storage length. Each stream in `streams` is used by at
    /// most one worker.
    pub fn fill(
        &self,
        streams: &mut [Box<dyn DecryptingStream>],
        storage: &mut [u8],
        start_position: u64,
        write_offset: usize,
        requested_size: usize,
        faults: &FaultReporter,
    ) -> FillOutcome {
        let begin = write_offset.min(storage.len());
        let end = write_offset.saturating_add(requested_size).min(storage.len());
        let target = &mut storage[begin..end];

        if target.is_empty() || streams.is_empty() {
            return FillOutcome::default();
        }

        let (reports, part) = match &self.pool {
            None => {
                let part = target.len();
                let report = run_worker(0, &mut *streams[0], start_position, target, faults);
                (vec![report], part)
            }
            Some(pool) => {
                let workers = self.thread_count.min(streams.len());
                let part = target.len().div_ceil(workers);
                let mut reports = vec![WorkerReport::default(); target.len().div_ceil(part)];

                pool.scope(|scope| {
                    let jobs = target
                        .chunks_mut(part)
                        .zip(streams.iter_mut())
                        .zip(reports.iter_mut())
                        .enumerate();

                    for (worker, ((chunk, stream), slot)) in jobs {
                        let offset = start_position + (worker * part) as u64;
                        scope.spawn(move |_| {
                            *slot = run_worker(worker, &mut **stream, offset, chunk, faults);
                        });
                    }
                });

                (reports, part)
            }
        };

        faults.notify_pending();

        let outcome = self.summarize(&reports, part);
        trace!(
            start_position,
            bytes = outcome.bytes,
            workers = outcome.workers,
            "fill joined"
        );
        outcome
    }

    fn summarize(&self, reports: &[WorkerReport], part: usize) -> FillOutcome {
        let mut outcome = FillOutcome {
            workers: reports.len(),
            ..Default::default()
        };

        for report in reports {
            match report.fault {
                Some(WorkerFault::Integrity) => outcome.integrity_faults += 1,
                Some(WorkerFault::Io) => outcome.io_faults += 1,
                None => {}
            }
            if report.is_short() {
                outcome.short_workers += 1;
            }
        }

        let first_short = reports.iter().position(WorkerReport::is_short);
        outcome.gap_detected = first_short
            .is_some_and(|index| reports[index + 1..].iter().any(|r| r.bytes > 0));

        outcome.bytes = match first_short {
            Some(index) if self.truncate_on_short_read => index * part + reports[index].bytes,
            _ => reports.iter().map(|r| r.bytes).sum(),
        };

        outcome
    }
}

impl fmt::Debug for ParallelFillCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParallelFillCoordinator")
            .field("thread_count", &self.thread_count)
            .field("truncate_on_short_read", &self.truncate_on_short_read)
            .finish()
    }
}

fn run_worker(
    worker: usize,
    stream: &mut dyn DecryptingStream,
    offset: u64,
    part: &mut [u8],
    faults: &FaultReporter,
) -> WorkerReport {
    let expected = part.len();

    match read_part(stream, offset, part) {
        Ok(bytes) => {
            trace!(worker, offset, bytes, "worker finished");
            WorkerReport {
                bytes,
                expected,
                fault: None,
            }
        }
        Err(BridgeError::IntegrityFault(message)) => {
            faults.report(IntegrityFaultReport {
                offset,
                worker,
                message,
            });
            WorkerReport {
                bytes: 0,
                expected,
                fault: Some(WorkerFault::Integrity),
            }
        }
        Err(err) => {
            debug!(worker, offset, error = %err, "worker read failed");
            WorkerReport {
                bytes: 0,
                expected,
                fault: Some(WorkerFault::Io),
            }
        }
    }
}

/// Seek, then read until `part` is full or the stream reports end of data.
fn read_part(
    stream: &mut dyn DecryptingStream,
    offset: u64,
    part: &mut [u8],
) -> bridge_traits::error::Result<usize> {
    stream.seek(offset)?;

    let mut filled = 0;
    while filled < part.len() {
        let read = stream.read(&mut part[filled..])?;
        if read == 0 {
            break;
        }
        filled += read.min(part.len() - filled);
    }
    Ok(filled)
}
