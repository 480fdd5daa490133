//! Dedicated decrypting streams, one per fill worker.

use crate::error::Result;
use bridge_traits::{DecryptingSource, DecryptingStream};
use tracing::{debug, warn};

/// Fixed set of worker streams opened once per reader.
///
/// Holds `max(thread_count, 1)` handles. Each handle keeps its own cursor
/// and is only ever driven by one worker at a time.
pub struct WorkerStreamSet {
    streams: Vec<Box<dyn DecryptingStream>>,
    read_ahead_hint: usize,
    closed: bool,
}

impl WorkerStreamSet {
    /// Open the worker streams.
    ///
    /// Each stream gets a read-ahead hint of `ceil(cache_capacity / thread_count)`,
    /// or `cache_capacity` for a direct fill. If any open fails, the streams
    /// already opened are closed before the error is returned.
    pub fn open(
        source: &dyn DecryptingSource,
        thread_count: usize,
        cache_capacity: usize,
    ) -> Result<Self> {
        let count = thread_count.max(1);
        let read_ahead_hint = cache_capacity.div_ceil(count);

        let mut set = Self {
            streams: Vec::with_capacity(count),
            read_ahead_hint,
            closed: false,
        };

        for index in 0..count {
            match source.open_stream(read_ahead_hint) {
                Ok(stream) => set.streams.push(stream),
                Err(err) => {
                    warn!(index, error = %err, "failed to open worker stream");
                    set.close();
                    return Err(err.into());
                }
            }
        }

        debug!(count, read_ahead_hint, "worker streams opened");
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    pub fn read_ahead_hint(&self) -> usize {
        self.read_ahead_hint
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub(crate) fn streams_mut(&mut self) -> &mut [Box<dyn DecryptingStream>] {
        &mut self.streams
    }

    /// Close every stream exactly once. Later calls do nothing.
    ///
    /// Close errors are logged and otherwise ignored.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        for (index, mut stream) in self.streams.drain(..).enumerate() {
            if let Err(err) = stream.close() {
                warn!(index, error = %err, "failed to close worker stream");
            }
        }
    }
}

impl Drop for WorkerStreamSet {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for WorkerStreamSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerStreamSet")
            .field("streams", &self.streams.len())
            .field("read_ahead_hint", &self.read_ahead_hint)
            .field("closed", &self.closed)
            .finish()
    }
}
