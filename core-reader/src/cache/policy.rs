//! Buffer selection policies

use serde::{Deserialize, Serialize};

/// Policy for choosing the buffer a cache miss fills.
///
/// Every policy prefers an empty buffer; they differ only once every buffer
/// holds data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Always overwrite the last buffer in pool order.
    ///
    /// Earlier buffers keep their content until they are the only choice,
    /// which pins the first region a player touched (usually the header).
    #[default]
    ReplaceLast,

    /// Overwrite buffers in turn.
    RoundRobin,

    /// Overwrite the buffer whose last hit or fill is oldest.
    LeastRecentlyUsed,
}

impl SelectionPolicy {
    /// Returns a human-readable description of the policy.
    pub fn description(&self) -> &'static str {
        match self {
            SelectionPolicy::ReplaceLast => "Overwrite the last buffer when all are full",
            SelectionPolicy::RoundRobin => "Overwrite buffers in turn",
            SelectionPolicy::LeastRecentlyUsed => "Overwrite the least recently used buffer",
        }
    }
}
