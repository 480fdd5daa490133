//! Single cache buffer

use std::fmt;
use std::ops::Range;
use zeroize::Zeroize;

/// Fixed-capacity plaintext region tagged with the source range it holds.
///
/// `count == 0` means the buffer is empty and available. Coverage only
/// changes through [`commit`](Self::commit) after a fill has finished.
pub struct CacheBuffer {
    storage: Vec<u8>,
    start_pos: u64,
    count: usize,
}

impl CacheBuffer {
    /// Allocate an empty buffer of `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            storage: vec![0; capacity],
            start_pos: 0,
            count: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    pub fn start_pos(&self) -> u64 {
        self.start_pos
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Source range currently held, or `None` when empty.
    pub fn coverage(&self) -> Option<Range<u64>> {
        if self.is_empty() {
            return None;
        }
        Some(self.start_pos..self.start_pos + self.count as u64)
    }

    /// Returns `true` if `position` falls inside the coverage.
    pub fn covers(&self, position: u64) -> bool {
        self.coverage()
            .is_some_and(|range| range.contains(&position))
    }

    pub fn storage(&self) -> &[u8] {
        &self.storage
    }

    pub(crate) fn storage_mut(&mut self) -> &mut [u8] {
        &mut self.storage
    }

    /// Copy bytes starting at absolute `position` into `out`.
    ///
    /// Copies `min(out.len(), end - position)` bytes and returns the count;
    /// returns 0 when `position` is not covered.
    pub fn copy_to(&self, position: u64, out: &mut [u8]) -> usize {
        if !self.covers(position) {
            return 0;
        }

        let offset = (position - self.start_pos) as usize;
        let len = out.len().min(self.count - offset);
        out[..len].copy_from_slice(&self.storage[offset..offset + len]);
        len
    }

    /// Record that the first `count` bytes of storage now hold `[start_pos, start_pos + count)`.
    pub(crate) fn commit(&mut self, start_pos: u64, count: usize) {
        debug_assert!(count <= self.capacity());
        self.start_pos = start_pos;
        self.count = count.min(self.capacity());
    }

    /// Forget the coverage without touching storage.
    pub(crate) fn invalidate(&mut self) {
        self.start_pos = 0;
        self.count = 0;
    }

    /// Zero the storage and forget the coverage.
    pub(crate) fn wipe(&mut self) {
        self.storage.as_mut_slice().zeroize();
        self.invalidate();
    }

    /// Wipe and free the storage.
    pub(crate) fn release(&mut self) {
        self.storage.zeroize();
        self.storage = Vec::new();
        self.invalidate();
    }
}

impl fmt::Debug for CacheBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheBuffer")
            .field("capacity", &self.capacity())
            .field("start_pos", &self.start_pos)
            .field("count", &self.count)
            .finish()
    }
}
