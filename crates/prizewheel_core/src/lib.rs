//! # PRIZEWHEEL Core
//!
//! Pure game math for the prize wheel.
//!
//! ## Design Principles
//!
//! 1. **Explicit randomness** - selection takes a random unit, planning takes an RNG
//! 2. **Validated at the edge** - a `SegmentSet` that exists is always drawable
//! 3. **Selector and wheel agree** - both derive positions from the same segment order
//! 4. **External configuration** - engine settings and segments come from TOML
//!
//! ## Example
//!
//! ```rust
//! use prizewheel_core::{select, RotationConfig, RotationPlanner, Segment, SegmentSet};
//!
//! let segments = SegmentSet::new(vec![
//!     Segment::new("A", 30.0, "#8B5CF6"),
//!     Segment::new("B", 20.0, "#0EA5E9"),
//!     Segment::new("C", 10.0, "#10B981"),
//!     Segment::new("D", 40.0, "#6B7280"),
//! ])?;
//!
//! assert_eq!(select(&segments, 0.35).label, "B");
//!
//! let planner = RotationPlanner::new(RotationConfig::default())?;
//! let plan = planner.plan_with(&segments, 1, 0.0, 5, 4000)?;
//! assert_eq!(segments.index_at_angle(plan.resting_angle()), 1);
//! # Ok::<(), prizewheel_core::WheelError>(())
//! ```

pub mod config;
pub mod error;
pub mod ledger;
pub mod phase;
pub mod rotation;
pub mod segment;
pub mod selection;

pub use config::{default_segments, ResetPolicy, WheelConfig};
pub use error::{PurchaseRejection, WheelError, WheelResult};
pub use ledger::{FundingLedger, ParticipantId, ParticipantShare, Purchase, CAPACITY};
pub use phase::Phase;
pub use rotation::{Easing, RotationConfig, RotationPlan, RotationPlanner};
pub use segment::{normalize_degrees, Segment, SegmentArc, SegmentSet, FULL_TURN_DEG};
pub use selection::{select, select_index, SelectionEngine, SelectionStatistics};
