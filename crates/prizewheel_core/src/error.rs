//! # Wheel Error Types
//!
//! All errors that can occur while configuring or running a prize wheel round.

use thiserror::Error;

use crate::phase::Phase;

/// Why a purchase request was turned away.
///
/// Rejections are synchronous and never touch the ledger.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseRejection {
    /// Zero or negative units were requested.
    #[error("invalid purchase: {requested} units is not a positive amount")]
    NonPositiveUnits {
        /// The amount requested.
        requested: i64,
    },

    /// The request does not fit in what is left of the pool. No partial fills.
    #[error("invalid purchase: {requested} units exceeds remaining space of {remaining}")]
    ExceedsRemainingSpace {
        /// The amount requested.
        requested: i64,
        /// Units still available this round.
        remaining: u32,
    },

    /// The round is past `Open`.
    #[error("round not accepting purchases (phase: {phase})")]
    RoundNotAccepting {
        /// Phase the round was in when the request arrived.
        phase: Phase,
    },
}

/// Errors that can occur in the wheel engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WheelError {
    /// Segment list or engine settings cannot start a round.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A purchase request was rejected.
    #[error(transparent)]
    InvalidPurchase(#[from] PurchaseRejection),

    /// The display layer reported a finished animation while no draw was in flight.
    #[error("animation completion received while round is {phase}")]
    AnimationProtocolViolation {
        /// Phase the round was actually in.
        phase: Phase,
    },

    /// A lifecycle call was made in a phase that does not allow it.
    #[error("cannot {action} while round is {from}")]
    InvalidTransition {
        /// Phase the round was in.
        from: Phase,
        /// What the caller tried to do.
        action: &'static str,
    },

    /// Receipt numbers must carry at least one non-whitespace character.
    #[error("receipt number must not be blank")]
    InvalidReceipt,

    /// Configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(String),
}

/// Result type for wheel operations.
pub type WheelResult<T> = Result<T, WheelError>;
