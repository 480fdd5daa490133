//! # Core Reader Module
//!
//! Random-access reads over a sequentially decrypting, chunked stream.
//!
//! ## Overview
//!
//! Players and demuxers seek unpredictably, but authenticated chunked
//! decryption only reads forward from a seek point. This crate bridges the
//! two with:
//!
//! - **Cache pool**: a few fixed-size plaintext buffers tagged with the
//!   source range they hold ([`cache`])
//! - **Worker streams**: one dedicated decrypting stream per fill worker
//!   ([`workers`])
//! - **Parallel fill**: a miss is split into contiguous parts decrypted at the
//!   same time and joined before the read returns ([`fill`])
//! - **Fault reporting**: at most one integrity notification per reader
//!   ([`fault`])
//! - **Reader**: [`RandomAccessReader`], the public surface tying them together
//!
//! ## Usage
//!
//! ```ignore
//! use core_reader::{RandomAccessReader, ReaderConfig, ReaderCursor};
//! use std::sync::Arc;
//!
//! let reader = RandomAccessReader::builder(&source)
//!     .config(ReaderConfig::high_throughput())
//!     .notifier(Arc::new(my_notifier))
//!     .open()?;
//!
//! let mut frame = vec![0u8; 65_536];
//! let read = reader.read_at(5_242_880, &mut frame);
//!
//! // Or as a plain `Read + Seek` for a demuxer
//! let cursor = ReaderCursor::new(Arc::new(reader));
//! ```
//!
//! ## Errors
//!
//! [`RandomAccessReader::read_at`] never fails: faults degrade to short or
//! zero counts. [`RandomAccessReader::try_read_at`] returns a
//! [`ReaderError`] instead of 0 when a fill produced nothing.

pub mod cache;
pub mod config;
pub mod cursor;
pub mod error;
pub mod fault;
pub mod fill;
pub mod reader;
pub mod stats;
pub mod workers;

pub use cache::{CacheBuffer, CacheBufferPool, SelectionPolicy};
pub use config::ReaderConfig;
pub use cursor::ReaderCursor;
pub use error::{ReaderError, Result};
pub use fault::FaultReporter;
pub use fill::{FillOutcome, ParallelFillCoordinator};
pub use reader::{RandomAccessReader, ReaderBuilder};
pub use stats::ReaderStats;
pub use workers::WorkerStreamSet;
