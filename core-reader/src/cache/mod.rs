//! # Cache Buffer Pool
//!
//! A handful of fixed-size plaintext buffers, each tagged with the source
//! range it currently holds.
//!
//! ## Overview
//!
//! - [`CacheBuffer`]: one byte region plus its coverage `[start_pos, start_pos + count)`
//! - [`CacheBufferPool`]: fixed-length collection with lookup by coverage
//! - [`SelectionPolicy`]: which buffer a miss overwrites once all are in use
//!
//! The pool is not internally synchronised. The reader owns it behind its
//! state lock, and only one fill is ever in flight against it.

pub mod buffer;
pub mod policy;
pub mod pool;

pub use buffer::CacheBuffer;
pub use policy::SelectionPolicy;
pub use pool::CacheBufferPool;
