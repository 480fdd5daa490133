//! # Reader Configuration
//!
//! Sizes of the cache pool and the fill fan-out for one reader.

use crate::cache::SelectionPolicy;
use serde::{Deserialize, Serialize};

/// Upper bound for `thread_count`.
pub const MAX_THREAD_COUNT: usize = 64;

/// Random-access reader configuration.
///
/// Everything is fixed at construction: the reader allocates
/// `cache_buffer_count * cache_buffer_size` bytes and opens its worker
/// streams once, then never grows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Number of cache buffers in the pool.
    ///
    /// Default: 2.
    #[serde(default = "default_cache_buffer_count")]
    pub cache_buffer_count: usize,

    /// Capacity of each cache buffer in bytes, and the size of every fill.
    ///
    /// Should be a multiple of the decrypting stream's integrity chunk size
    /// so fills never decrypt a chunk twice.
    ///
    /// Default: 2 MiB.
    #[serde(default = "default_cache_buffer_size")]
    pub cache_buffer_size: usize,

    /// Number of parallel fill workers, each with a dedicated stream.
    ///
    /// `0` fills directly on the calling thread with a single stream.
    ///
    /// Default: 1.
    #[serde(default = "default_thread_count")]
    pub thread_count: usize,

    /// Bytes a fill starts before the requested position.
    ///
    /// Playback engines often probe slightly backwards right after a seek;
    /// starting the fill early lets the second probe hit the cache.
    ///
    /// Default: 256 KiB.
    #[serde(default = "default_stream_offset")]
    pub stream_offset: u64,

    /// Which buffer a miss overwrites once every buffer holds data.
    ///
    /// Default: [`SelectionPolicy::ReplaceLast`].
    #[serde(default)]
    pub selection_policy: SelectionPolicy,

    /// Cut a fill's byte count at the first worker that came up short.
    ///
    /// When `false` the per-worker counts are summed even if a middle
    /// worker left a hole in the buffer.
    ///
    /// Default: false.
    #[serde(default)]
    pub truncate_on_short_read: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            cache_buffer_count: default_cache_buffer_count(),
            cache_buffer_size: default_cache_buffer_size(),
            thread_count: default_thread_count(),
            stream_offset: default_stream_offset(),
            selection_policy: SelectionPolicy::default(),
            truncate_on_short_read: false,
        }
    }
}

impl ReaderConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration for memory-constrained hosts.
    ///
    /// - Two 512 KiB buffers
    /// - Direct fills on the calling thread
    /// - 64 KiB backward padding
    pub fn low_memory() -> Self {
        Self {
            cache_buffer_size: 512 * 1024,
            thread_count: 0,
            stream_offset: 64 * 1024,
            ..Default::default()
        }
    }

    /// Configuration for fast scrubbing on multi-core devices.
    ///
    /// - Three 4 MiB buffers, least-recently-used replacement
    /// - Four fill workers
    pub fn high_throughput() -> Self {
        Self {
            cache_buffer_count: 3,
            cache_buffer_size: 4 * 1024 * 1024,
            thread_count: 4,
            selection_policy: SelectionPolicy::LeastRecentlyUsed,
            ..Default::default()
        }
    }

    /// Set the number of cache buffers.
    pub fn with_cache_buffer_count(mut self, count: usize) -> Self {
        self.cache_buffer_count = count;
        self
    }

    /// Set the capacity of each cache buffer.
    pub fn with_cache_buffer_size(mut self, bytes: usize) -> Self {
        self.cache_buffer_size = bytes;
        self
    }

    /// Set the number of fill workers.
    pub fn with_thread_count(mut self, count: usize) -> Self {
        self.thread_count = count;
        self
    }

    /// Set the backward padding applied to fills.
    pub fn with_stream_offset(mut self, bytes: u64) -> Self {
        self.stream_offset = bytes;
        self
    }

    /// Set the buffer selection policy.
    pub fn with_selection_policy(mut self, policy: SelectionPolicy) -> Self {
        self.selection_policy = policy;
        self
    }

    /// Enable or disable truncation at the first short worker.
    pub fn with_truncate_on_short_read(mut self, enabled: bool) -> Self {
        self.truncate_on_short_read = enabled;
        self
    }

    /// Number of worker streams the reader opens.
    pub fn worker_stream_count(&self) -> usize {
        self.thread_count.max(1)
    }

    /// Bytes each worker reads during a full-size fill, rounded up.
    ///
    /// Also used as the read-ahead hint for each worker stream.
    pub fn part_size(&self) -> usize {
        self.cache_buffer_size.div_ceil(self.worker_stream_count())
    }

    /// Total bytes held by the cache pool.
    pub fn total_cache_bytes(&self) -> usize {
        self.cache_buffer_count * self.cache_buffer_size
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.cache_buffer_count == 0 {
            return Err("cache_buffer_count must be at least 1".to_string());
        }

        if self.cache_buffer_size == 0 {
            return Err("cache_buffer_size must be > 0".to_string());
        }

        if self.thread_count > MAX_THREAD_COUNT {
            return Err(format!(
                "thread_count must not exceed {}",
                MAX_THREAD_COUNT
            ));
        }

        if self.thread_count > self.cache_buffer_size {
            return Err("thread_count cannot exceed cache_buffer_size".to_string());
        }

        // A fill starting stream_offset bytes back must still reach the
        // position that triggered it.
        if self.stream_offset >= self.cache_buffer_size as u64 {
            return Err("stream_offset must be smaller than cache_buffer_size".to_string());
        }

        Ok(())
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_cache_buffer_count() -> usize {
    2
}

fn default_cache_buffer_size() -> usize {
    2 * 1024 * 1024 // 2 MiB
}

fn default_thread_count() -> usize {
    1
}

fn default_stream_offset() -> u64 {
    256 * 1024 // 256 KiB
}
