//! Fixed-size pool of cache buffers

use super::{CacheBuffer, SelectionPolicy};
use std::ops::Range;
use tracing::trace;

/// Small fixed-count collection of [`CacheBuffer`]s.
///
/// The number of buffers never changes after construction. Lookups scan
/// in pool order, so when two buffers overlap the earlier one wins.
#[derive(Debug)]
pub struct CacheBufferPool {
    buffers: Vec<CacheBuffer>,
    policy: SelectionPolicy,
    next_victim: usize,
    clock: u64,
    last_used: Vec<u64>,
}

impl CacheBufferPool {
    /// Allocate `buffer_count` empty buffers of `buffer_size` bytes each.
    pub fn new(buffer_count: usize, buffer_size: usize, policy: SelectionPolicy) -> Self {
        debug_assert!(buffer_count > 0, "pool needs at least one buffer");
        Self {
            buffers: (0..buffer_count)
                .map(|_| CacheBuffer::new(buffer_size))
                .collect(),
            policy,
            next_victim: 0,
            clock: 0,
            last_used: vec![0; buffer_count],
        }
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    pub fn buffers(&self) -> &[CacheBuffer] {
        &self.buffers
    }

    pub fn buffer(&self, index: usize) -> &CacheBuffer {
        &self.buffers[index]
    }

    pub(crate) fn buffer_mut(&mut self, index: usize) -> &mut CacheBuffer {
        &mut self.buffers[index]
    }

    /// Coverage of every buffer in pool order.
    pub fn coverage(&self) -> Vec<Option<Range<u64>>> {
        self.buffers.iter().map(CacheBuffer::coverage).collect()
    }

    /// Index of the first buffer whose coverage contains `position`.
    pub fn find_covering(&self, position: u64) -> Option<usize> {
        self.buffers.iter().position(|buffer| buffer.covers(position))
    }

    /// Pick the buffer the next fill will overwrite.
    ///
    /// The first empty buffer is always preferred. Once every buffer holds
    /// data the configured [`SelectionPolicy`] decides.
    pub fn select_for_fill(&mut self) -> usize {
        if let Some(index) = self.buffers.iter().position(CacheBuffer::is_empty) {
            return index;
        }

        let last = self.buffers.len().saturating_sub(1);
        let index = match self.policy {
            SelectionPolicy::ReplaceLast => last,
            SelectionPolicy::RoundRobin => {
                let index = self.next_victim % self.buffers.len().max(1);
                self.next_victim = index + 1;
                index
            }
            SelectionPolicy::LeastRecentlyUsed => self
                .last_used
                .iter()
                .enumerate()
                .min_by_key(|(_, tick)| **tick)
                .map(|(index, _)| index)
                .unwrap_or(last),
        };

        trace!(index, policy = ?self.policy, "selected occupied buffer for fill");
        index
    }

    /// Mark a buffer as used by a hit.
    pub fn touch(&mut self, index: usize) {
        self.clock += 1;
        self.last_used[index] = self.clock;
    }

    /// Replace a buffer's coverage after a successful fill.
    pub(crate) fn commit(&mut self, index: usize, start_pos: u64, count: usize) {
        self.buffers[index].commit(start_pos, count);
        self.touch(index);
    }

    /// Drop a buffer's coverage before its storage is overwritten.
    pub(crate) fn invalidate(&mut self, index: usize) {
        self.buffers[index].invalidate();
    }

    /// Zero every buffer and forget all coverage.
    pub(crate) fn wipe(&mut self) {
        for buffer in &mut self.buffers {
            buffer.wipe();
        }
        self.next_victim = 0;
        self.clock = 0;
        self.last_used.fill(0);
    }

    /// Wipe and free every buffer's storage. The pool keeps its length.
    pub(crate) fn release(&mut self) {
        for buffer in &mut self.buffers {
            buffer.release();
        }
    }
}
