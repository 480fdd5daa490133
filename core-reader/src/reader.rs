//! # Random-Access Reader
//!
//! Serves `read_at(position, out)` over a forward-only decrypting source.
//!
//! ## Read path
//!
//! 1. `position >= size()` returns 0 without touching any stream.
//! 2. A buffer covering `position` answers the read directly.
//! 3. Otherwise a buffer is chosen for the fill, the fill starts
//!    `stream_offset` bytes before `position` (clamped at 0), and the
//!    workers decrypt up to one buffer's worth of plaintext into it.
//!
//! Each read copies from exactly one buffer, so a request that runs past
//! the end of a buffer's coverage returns a short count.
//!
//! ## Concurrency
//!
//! The pool, the worker streams and the closed flag sit behind one mutex.
//! Reads and `close` hold it for their whole body, so overlapping calls
//! serialise and a close never races an in-flight fill. The fan-out inside
//! a fill happens on the coordinator's own thread pool.

use crate::cache::CacheBufferPool;
use crate::config::ReaderConfig;
use crate::error::{ReaderError, Result};
use crate::fault::FaultReporter;
use crate::fill::{FillOutcome, ParallelFillCoordinator};
use crate::stats::ReaderStats;
use crate::workers::WorkerStreamSet;
use bridge_traits::notify::{IntegrityNotifier, NoopNotifier};
use bridge_traits::DecryptingSource;
use core_runtime::events::{CoreEvent, EventBus, ReaderEvent};
use parking_lot::Mutex;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

struct ReaderState {
    pool: CacheBufferPool,
    streams: WorkerStreamSet,
    stats: ReaderStats,
    closed: bool,
}

/// Random-access view over one decrypting source.
///
/// Owns a fixed pool of cache buffers and a fixed set of worker streams,
/// both allocated by [`open`](Self::open) and released by
/// [`close`](Self::close) (or on drop).
///
/// # Example
///
/// ```ignore
/// use core_reader::{RandomAccessReader, ReaderConfig};
///
/// let reader = RandomAccessReader::builder(&source)
///     .config(ReaderConfig::default().with_thread_count(4))
///     .event_bus(bus.clone())
///     .open()?;
///
/// let mut header = [0u8; 4096];
/// let n = reader.read_at(0, &mut header);
/// reader.close();
/// ```
pub struct RandomAccessReader {
    source_size: u64,
    config: ReaderConfig,
    coordinator: ParallelFillCoordinator,
    faults: FaultReporter,
    events: Option<EventBus>,
    state: Mutex<ReaderState>,
}

impl RandomAccessReader {
    /// Start building a reader over `source`.
    pub fn builder(source: &dyn DecryptingSource) -> ReaderBuilder<'_> {
        ReaderBuilder {
            source,
            config: ReaderConfig::default(),
            notifier: None,
            events: None,
        }
    }

    /// Open a reader with an explicit notifier and no event bus.
    pub fn open(
        source: &dyn DecryptingSource,
        config: ReaderConfig,
        notifier: Arc<dyn IntegrityNotifier>,
    ) -> Result<Self> {
        Self::open_with(source, config, notifier, None)
    }

    fn open_with(
        source: &dyn DecryptingSource,
        config: ReaderConfig,
        notifier: Arc<dyn IntegrityNotifier>,
        events: Option<EventBus>,
    ) -> Result<Self> {
        config.validate().map_err(ReaderError::InvalidConfig)?;

        let source_size = source.plaintext_len()?;
        let coordinator =
            ParallelFillCoordinator::new(config.thread_count, config.truncate_on_short_read)?;
        let streams = WorkerStreamSet::open(source, config.thread_count, config.cache_buffer_size)?;
        let pool = CacheBufferPool::new(
            config.cache_buffer_count,
            config.cache_buffer_size,
            config.selection_policy,
        );

        info!(
            source_size,
            buffers = config.cache_buffer_count,
            buffer_size = config.cache_buffer_size,
            threads = config.thread_count,
            policy = ?config.selection_policy,
            "reader opened"
        );

        let reader = Self {
            source_size,
            coordinator,
            faults: FaultReporter::new(notifier),
            events,
            state: Mutex::new(ReaderState {
                pool,
                streams,
                stats: ReaderStats::default(),
                closed: false,
            }),
            config,
        };

        reader.emit(ReaderEvent::Opened {
            source_len: source_size,
            buffer_count: reader.config.cache_buffer_count,
            thread_count: reader.config.thread_count,
        });

        Ok(reader)
    }

    /// Plaintext length of the source. Fixed for the reader's lifetime.
    pub fn size(&self) -> u64 {
        self.source_size
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Read up to `out.len()` bytes at `position`.
    ///
    /// Never fails: end of data, a failed fill and a closed reader all
    /// return 0. Use [`try_read_at`](Self::try_read_at) to tell them apart.
    pub fn read_at(&self, position: u64, out: &mut [u8]) -> usize {
        match self.try_read_at(position, out) {
            Ok(read) => read,
            Err(err) => {
                debug!(position, error = %err, "read_at returning 0");
                0
            }
        }
    }

    /// Read up to `out.len()` bytes at `position`, reporting why nothing was read.
    ///
    /// Returns `Ok(0)` only for `position >= size()` or an empty `out`.
    ///
    /// # Errors
    ///
    /// - [`ReaderError::Closed`] after [`close`](Self::close)
    /// - [`ReaderError::FillFailed`] when a miss fill did not reach `position`
    #[instrument(level = "trace", skip(self, out), fields(len = out.len()))]
    pub fn try_read_at(&self, position: u64, out: &mut [u8]) -> Result<usize> {
        let mut guard = self.state.lock();
        let ReaderState {
            pool,
            streams,
            stats,
            closed,
        } = &mut *guard;

        if *closed {
            return Err(ReaderError::Closed);
        }

        if position >= self.source_size || out.is_empty() {
            return Ok(0);
        }

        if let Some(index) = pool.find_covering(position) {
            pool.touch(index);
            let copied = pool.buffer(index).copy_to(position, out);
            stats.record_hit();
            stats.record_served(copied);
            return Ok(copied);
        }

        stats.record_miss();

        let index = pool.select_for_fill();
        // A failed fill may leave partial data behind; drop coverage first
        pool.invalidate(index);

        let fill_start = position.saturating_sub(self.config.stream_offset);
        let capacity = pool.buffer(index).capacity();
        let requested = usize::try_from(self.source_size - fill_start)
            .map_or(capacity, |remaining| remaining.min(capacity));

        debug!(position, fill_start, requested, buffer = index, "cache miss");

        let outcome = self.coordinator.fill(
            streams.streams_mut(),
            pool.buffer_mut(index).storage_mut(),
            fill_start,
            0,
            requested,
            &self.faults,
        );
        stats.record_fill(&outcome);

        if outcome.is_degraded() {
            self.report_degraded(fill_start, &outcome);
        }

        if outcome.bytes == 0 {
            return Err(fill_failed(position, &outcome));
        }

        pool.commit(index, fill_start, outcome.bytes);

        let copied = pool.buffer(index).copy_to(position, out);
        if copied == 0 {
            return Err(fill_failed(position, &outcome));
        }

        stats.record_served(copied);
        Ok(copied)
    }

    /// Wipe and release every buffer and close every worker stream.
    ///
    /// Calling this again does nothing.
    #[instrument(level = "trace", skip(self))]
    pub fn close(&self) {
        let stats = {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;

            state.pool.wipe();
            state.pool.release();
            state.streams.close();
            state.stats
        };

        info!(
            hits = stats.hits,
            misses = stats.misses,
            fills = stats.fills,
            "reader closed"
        );
        self.emit(ReaderEvent::Closed {
            hits: stats.hits,
            misses: stats.misses,
        });
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Whether the host has already been told about an integrity fault.
    pub fn integrity_fault_reported(&self) -> bool {
        self.faults.has_reported()
    }

    pub fn stats(&self) -> ReaderStats {
        self.state.lock().stats
    }

    /// Coverage of each cache buffer, in pool order.
    pub fn cached_ranges(&self) -> Vec<Option<Range<u64>>> {
        self.state.lock().pool.coverage()
    }

    /// Bytes of buffer storage currently allocated. Zero once closed.
    pub fn allocated_bytes(&self) -> usize {
        self.state
            .lock()
            .pool
            .buffers()
            .iter()
            .map(|buffer| buffer.capacity())
            .sum()
    }

    fn report_degraded(&self, fill_start: u64, outcome: &FillOutcome) {
        warn!(
            fill_start,
            bytes = outcome.bytes,
            integrity_faults = outcome.integrity_faults,
            io_faults = outcome.io_faults,
            gap = outcome.gap_detected,
            "cache fill degraded"
        );
        self.emit(ReaderEvent::FillDegraded {
            fill_start,
            bytes: outcome.bytes,
            integrity_faults: outcome.integrity_faults,
            io_faults: outcome.io_faults,
        });
    }

    fn emit(&self, event: ReaderEvent) {
        if let Some(bus) = &self.events {
            bus.emit(CoreEvent::Reader(event)).ok();
        }
    }
}

fn fill_failed(position: u64, outcome: &FillOutcome) -> ReaderError {
    ReaderError::FillFailed {
        position,
        integrity_faults: outcome.integrity_faults,
        io_faults: outcome.io_faults,
    }
}

impl Drop for RandomAccessReader {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for RandomAccessReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomAccessReader")
            .field("source_size", &self.source_size)
            .field("config", &self.config)
            .field("coordinator", &self.coordinator)
            .field("faults", &self.faults)
            .finish_non_exhaustive()
    }
}

/// Builder for [`RandomAccessReader`].
///
/// Without an explicit notifier, integrity faults go to the event bus if
/// one was given, and are otherwise only logged.
pub struct ReaderBuilder<'a> {
    source: &'a dyn DecryptingSource,
    config: ReaderConfig,
    notifier: Option<Arc<dyn IntegrityNotifier>>,
    events: Option<EventBus>,
}

impl<'a> ReaderBuilder<'a> {
    pub fn config(mut self, config: ReaderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn IntegrityNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Publish lifecycle and fault events on `bus`.
    pub fn event_bus(mut self, bus: EventBus) -> Self {
        self.events = Some(bus);
        self
    }

    pub fn open(self) -> Result<RandomAccessReader> {
        let notifier: Arc<dyn IntegrityNotifier> = match (self.notifier, &self.events) {
            (Some(notifier), _) => notifier,
            (None, Some(bus)) => Arc::new(bus.clone()),
            (None, None) => Arc::new(NoopNotifier),
        };

        RandomAccessReader::open_with(self.source, self.config, notifier, self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::{BridgeError, DecryptingStream};

    /// Plaintext `i % 251` served from memory.
    struct PatternSource {
        len: u64,
    }

    struct PatternStream {
        len: u64,
        cursor: u64,
    }

    impl DecryptingStream for PatternStream {
        fn seek(&mut self, offset: u64) -> bridge_traits::error::Result<()> {
            if offset > self.len {
                return Err(BridgeError::OutOfBounds {
                    offset,
                    len: self.len,
                });
            }
            self.cursor = offset;
            Ok(())
        }

        fn read(&mut self, buf: &mut [u8]) -> bridge_traits::error::Result<usize> {
            let remaining = (self.len - self.cursor).min(buf.len() as u64) as usize;
            for (i, byte) in buf[..remaining].iter_mut().enumerate() {
                *byte = ((self.cursor + i as u64) % 251) as u8;
            }
            self.cursor += remaining as u64;
            Ok(remaining)
        }

        fn close(&mut self) -> bridge_traits::error::Result<()> {
            Ok(())
        }
    }

    impl DecryptingSource for PatternSource {
        fn plaintext_len(&self) -> bridge_traits::error::Result<u64> {
            Ok(self.len)
        }

        fn open_stream(
            &self,
            _read_ahead_hint: usize,
        ) -> bridge_traits::error::Result<Box<dyn DecryptingStream>> {
            Ok(Box::new(PatternStream {
                len: self.len,
                cursor: 0,
            }))
        }
    }

    fn small_config() -> ReaderConfig {
        ReaderConfig::default()
            .with_cache_buffer_size(64)
            .with_stream_offset(8)
            .with_thread_count(2)
    }

    #[test]
    fn test_invalid_config_rejected() {
        let source = PatternSource { len: 100 };
        let err = RandomAccessReader::builder(&source)
            .config(ReaderConfig::default().with_cache_buffer_count(0))
            .open()
            .unwrap_err();
        assert!(matches!(err, ReaderError::InvalidConfig(_)));
    }

    #[test]
    fn test_miss_then_hit() {
        let source = PatternSource { len: 1000 };
        let reader = RandomAccessReader::builder(&source)
            .config(small_config())
            .open()
            .unwrap();

        let mut out = [0u8; 4];
        assert_eq!(reader.read_at(100, &mut out), 4);
        assert_eq!(out, [100, 101, 102, 103]);
        assert_eq!(reader.cached_ranges()[0], Some(92..156));

        assert_eq!(reader.read_at(95, &mut out), 4);
        let stats = reader.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
    }

    #[test]
    fn test_fill_is_clamped_to_source_end() {
        let source = PatternSource { len: 100 };
        let reader = RandomAccessReader::builder(&source)
            .config(small_config())
            .open()
            .unwrap();

        let mut out = [0u8; 16];
        assert_eq!(reader.read_at(90, &mut out), 10);
        assert_eq!(reader.cached_ranges()[0], Some(82..100));
        assert_eq!(reader.stats().io_faults, 0);
    }

    #[test]
    fn test_close_wipes_and_releases() {
        let source = PatternSource { len: 1000 };
        let reader = RandomAccessReader::builder(&source)
            .config(small_config())
            .open()
            .unwrap();
        let mut out = [0u8; 4];
        reader.read_at(0, &mut out);

        reader.close();
        {
            let state = reader.state.lock();
            assert!(state.streams.is_closed());
            assert!(state.pool.buffers().iter().all(|b| b.is_empty()));
        }
        assert_eq!(reader.allocated_bytes(), 0);
        assert!(matches!(
            reader.try_read_at(0, &mut out),
            Err(ReaderError::Closed)
        ));
    }
}
