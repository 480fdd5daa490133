//! Workspace placeholder crate.
//!
//! Exposes feature flags that map to the individual workspace crates
//! (`core-reader`, `core-runtime`). Host applications can depend on
//! `seekread-workspace` and enable the features they need without wiring
//! each crate individually.

pub use bridge_traits;

#[cfg(feature = "reader")]
pub use core_reader;

#[cfg(feature = "runtime")]
pub use core_runtime;
