//! # Core Runtime Module
//!
//! Ambient runtime infrastructure shared by the reader crates:
//! - Logging and tracing initialisation
//! - Event bus for reader lifecycle and integrity notifications
//!
//! ## Overview
//!
//! Nothing in here is required to read bytes. Hosts that want structured
//! logs call [`logging::init_logging`] once at startup; hosts that want to
//! react to corrupted content subscribe to an [`events::EventBus`] and pass
//! it to the reader as its notifier.

pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
pub use events::{CoreEvent, EventBus, EventSeverity, EventStream, ReaderEvent};
pub use logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
