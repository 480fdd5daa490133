//! # Host Bridge Traits
//!
//! Capabilities the random-access reader core consumes from (or exposes to)
//! the host platform.
//!
//! ## Overview
//!
//! The core decrypts nothing and displays nothing. It is handed:
//!
//! - a [`DecryptingSource`](stream::DecryptingSource) that opens independent
//!   [`DecryptingStream`](stream::DecryptingStream) handles over one encrypted file
//! - an [`IntegrityNotifier`](notify::IntegrityNotifier) it calls at most once
//!   when decrypted content fails authentication
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! must report chunk authentication failures as
//! [`BridgeError::IntegrityFault`]; the core treats every other variant as a
//! transient I/O fault.
//!
//! ## Thread Safety
//!
//! Streams are `Send` because each one is moved onto a fill worker thread.
//! Sources and notifiers are `Send + Sync` because every worker shares them.

pub mod error;
pub mod notify;
pub mod stream;

pub use error::BridgeError;

// Re-export commonly used types
pub use notify::{FnNotifier, IntegrityFaultReport, IntegrityNotifier, NoopNotifier};
pub use stream::{DecryptingSource, DecryptingStream};
