//! In-memory decrypting source with call counters and fault injection.

#![allow(dead_code)]

use bridge_traits::error::Result;
use bridge_traits::notify::{FnNotifier, IntegrityFaultReport, IntegrityNotifier};
use bridge_traits::{BridgeError, DecryptingSource, DecryptingStream};
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const MIB: usize = 1024 * 1024;

/// Plaintext byte at `offset`.
pub fn pattern(offset: u64) -> u8 {
    (offset % 251) as u8
}

pub fn expected(range: Range<u64>) -> Vec<u8> {
    range.map(pattern).collect()
}

#[derive(Debug, Default)]
pub struct Counters {
    pub opens: AtomicUsize,
    pub seeks: AtomicUsize,
    pub reads: AtomicUsize,
    pub closes: AtomicUsize,
}

impl Counters {
    /// Seeks plus reads across every stream.
    pub fn stream_calls(&self) -> usize {
        self.seeks.load(Ordering::SeqCst) + self.reads.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

/// Source of `len` pattern bytes.
#[derive(Debug, Clone)]
pub struct MemorySource {
    len: u64,
    counters: Arc<Counters>,
    /// Seeking to an offset inside any of these ranges and then reading fails the integrity check.
    corrupt_seeks: Vec<Range<u64>>,
    /// Seeking to an offset inside any of these ranges fails with an I/O error.
    failing_seeks: Vec<Range<u64>>,
    /// Largest count a single `read` returns.
    max_read: usize,
    /// Length reported by `plaintext_len`, when it differs from the data.
    reported_len: Option<u64>,
}

impl MemorySource {
    pub fn new(len: u64) -> Self {
        Self {
            len,
            counters: Arc::new(Counters::default()),
            corrupt_seeks: Vec::new(),
            failing_seeks: Vec::new(),
            max_read: usize::MAX,
            reported_len: None,
        }
    }

    pub fn with_corrupt_seeks(mut self, range: Range<u64>) -> Self {
        self.corrupt_seeks.push(range);
        self
    }

    pub fn with_failing_seeks(mut self, range: Range<u64>) -> Self {
        self.failing_seeks.push(range);
        self
    }

    pub fn with_max_read(mut self, max_read: usize) -> Self {
        self.max_read = max_read;
        self
    }

    pub fn with_reported_len(mut self, len: u64) -> Self {
        self.reported_len = Some(len);
        self
    }

    pub fn counters(&self) -> Arc<Counters> {
        Arc::clone(&self.counters)
    }
}

impl DecryptingSource for MemorySource {
    fn plaintext_len(&self) -> Result<u64> {
        Ok(self.reported_len.unwrap_or(self.len))
    }

    fn open_stream(&self, _read_ahead_hint: usize) -> Result<Box<dyn DecryptingStream>> {
        self.counters.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryStream {
            source: self.clone(),
            cursor: 0,
            corrupt: false,
            closed: false,
        }))
    }
}

struct MemoryStream {
    source: MemorySource,
    cursor: u64,
    corrupt: bool,
    closed: bool,
}

impl DecryptingStream for MemoryStream {
    fn seek(&mut self, offset: u64) -> Result<()> {
        self.source.counters.seeks.fetch_add(1, Ordering::SeqCst);

        if offset > self.source.len {
            return Err(BridgeError::OutOfBounds {
                offset,
                len: self.source.len,
            });
        }
        if self.source.failing_seeks.iter().any(|r| r.contains(&offset)) {
            return Err(BridgeError::OperationFailed(format!(
                "seek to {offset} failed"
            )));
        }

        self.corrupt = self.source.corrupt_seeks.iter().any(|r| r.contains(&offset));
        self.cursor = offset;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.source.counters.reads.fetch_add(1, Ordering::SeqCst);

        if self.closed {
            return Err(BridgeError::Closed);
        }
        if self.corrupt {
            return Err(BridgeError::IntegrityFault(format!(
                "authentication tag mismatch near {}",
                self.cursor
            )));
        }

        let remaining = self.source.len.saturating_sub(self.cursor);
        let count = (buf.len() as u64)
            .min(remaining)
            .min(self.source.max_read as u64) as usize;

        for (i, byte) in buf[..count].iter_mut().enumerate() {
            *byte = pattern(self.cursor + i as u64);
        }
        self.cursor += count as u64;
        Ok(count)
    }

    fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            self.source.counters.closes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// Notifier that counts how often it was called.
pub fn counting_notifier() -> (Arc<AtomicUsize>, Arc<dyn IntegrityNotifier>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let notifier = FnNotifier::new(move |_: &IntegrityFaultReport| {
        seen.fetch_add(1, Ordering::SeqCst);
    });
    (calls, Arc::new(notifier))
}
