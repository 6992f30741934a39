//! # Round Values
//!
//! Per-round state and the values handed to collaborators.
//!
//! Everything here is plain data: cloneable, serializable, and free of
//! engine handles, so it can cross threads or be written to disk.

use prizewheel_core::{Phase, Purchase, RotationPlan, Segment, SegmentSet};
use serde::{Deserialize, Serialize};

/// A draw in flight: the winner is fixed, the wheel is still spinning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Draw {
    /// Round this draw belongs to.
    pub round: u64,
    /// Index of the winning segment.
    pub winning_index: usize,
    /// The winning segment.
    pub winner: Segment,
    /// Random unit the selector consumed.
    pub random_unit: f64,
    /// Spin the display must perform.
    pub plan: RotationPlan,
}

/// A finished round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundResult {
    /// Round number.
    pub round: u64,
    /// Index of the winning segment.
    pub winning_index: usize,
    /// The winning segment.
    pub winner: Segment,
    /// Every purchase that funded the round, in acceptance order.
    pub purchases: Vec<Purchase>,
    /// Sale receipt, once recorded.
    pub receipt: Option<String>,
}

/// Phase-tagged round state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum RoundState {
    /// Accepting purchases.
    #[default]
    Open,
    /// Pool full, waiting out the countdown.
    CountingDown {
        /// Ticks left before the draw.
        ticks_remaining: u32,
    },
    /// Animation in flight.
    Drawing {
        /// The draw being animated.
        draw: Draw,
    },
    /// Winner known.
    Resolved {
        /// The outcome.
        result: RoundResult,
    },
}

impl RoundState {
    /// Phase tag of this state.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        match self {
            Self::Open => Phase::Open,
            Self::CountingDown { .. } => Phase::CountingDown,
            Self::Drawing { .. } => Phase::Drawing,
            Self::Resolved { .. } => Phase::Resolved,
        }
    }
}

/// What a tick did.
#[derive(Clone, Debug, PartialEq)]
pub enum TickOutcome {
    /// Not counting down, or the tick was addressed to another round.
    Ignored,
    /// Still counting.
    Counting {
        /// Ticks left after this one.
        ticks_remaining: u32,
    },
    /// The countdown ran out and the draw started.
    DrawStarted(Draw),
}

/// An accepted purchase and what it did to the round.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PurchaseReceipt {
    /// Round the purchase was accepted into.
    pub round: u64,
    /// The recorded purchase.
    pub purchase: Purchase,
    /// Units still available after it.
    pub remaining_space: u32,
    /// True if this purchase filled the pool.
    pub countdown_started: bool,
}

/// Serializable copy of a round, for resuming after a restart.
///
/// Restoring a `CountingDown` snapshot resumes with the same ticks remaining.
/// Restoring a `Drawing` snapshot keeps the recorded winner and plan so the
/// display can replay the spin.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundSnapshot {
    /// Round number.
    pub round: u64,
    /// Round state.
    pub state: RoundState,
    /// Purchases accepted this round.
    pub purchases: Vec<Purchase>,
    /// Segment set the round runs on.
    pub segments: SegmentSet,
    /// Wheel rotation at rest, in degrees.
    pub wheel_angle: f64,
}

impl RoundSnapshot {
    /// Phase the snapshot was taken in.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.state.phase()
    }
}
