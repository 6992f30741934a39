//! # PRIZEWHEEL
//!
//! Host-side entry point for the prize wheel.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                          PRIZEWHEEL                           │
//! ├───────────────────────────────────────────────────────────────┤
//! │                                                               │
//! │  ┌──────────────────┐        ┌─────────────────────────────┐  │
//! │  │ prizewheel_core  │───────>│ prizewheel_engine           │  │
//! │  │                  │        │                             │  │
//! │  │ • SegmentSet     │        │ • GameStateMachine          │  │
//! │  │ • Selection      │        │ • SharedWheel               │  │
//! │  │ • Rotation       │        │ • RoundDriver (tokio)       │  │
//! │  │ • FundingLedger  │        │ • Observers / EventChannel  │  │
//! │  └──────────────────┘        └──────────────┬──────────────┘  │
//! │                                             │                 │
//! │                              ┌──────────────┴──────────────┐  │
//! │                              │ host: logging, simulation   │  │
//! │                              └─────────────────────────────┘  │
//! │                                                               │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Display, payment and persistence collaborators plug in through
//! [`RoundObserver`] and the [`RoundDriver`] calls.

pub mod logging;
pub mod simulation;

// Re-export the layers
pub use prizewheel_core as core;
pub use prizewheel_engine as engine;

// Re-export commonly used types
pub use logging::{init_logging, init_logging_with, DEFAULT_FILTER};
pub use prizewheel_core::{
    Phase, Purchase, PurchaseRejection, ResetPolicy, Segment, WheelConfig, WheelError,
    WheelResult, CAPACITY,
};
pub use prizewheel_engine::{
    GameStateMachine, RoundDriver, RoundObserver, RoundOutcome, RoundResult, SharedWheel,
    WheelEvent,
};
pub use simulation::{
    fast_timings, SegmentTally, Simulation, SimulationConfig, SimulationReport,
};
