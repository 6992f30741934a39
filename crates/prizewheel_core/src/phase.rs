//! Round phase tag.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle phase of a funding round.
///
/// ```text
/// Open ──(capacity reached)──> CountingDown ──(ticks exhausted)──> Drawing
///   ^                                                                 │
///   └──────────────(reset / receipt)────── Resolved <──(animation done)┘
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Accepting purchases.
    #[default]
    Open,
    /// Pool is full, waiting out the countdown.
    CountingDown,
    /// Winner picked, wheel animation in flight.
    Drawing,
    /// Winner known, waiting for reset.
    Resolved,
}

impl Phase {
    /// Returns true if purchases may be committed in this phase.
    #[inline]
    #[must_use]
    pub const fn accepts_purchases(self) -> bool {
        matches!(self, Self::Open)
    }

    /// Human-readable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::CountingDown => "counting down",
            Self::Drawing => "drawing",
            Self::Resolved => "resolved",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
