//! # PRIZEWHEEL Engine
//!
//! Round lifecycle for the prize wheel: purchases fill the pool, a countdown
//! runs, one weighted draw picks a segment, the display spins to it, and
//! the pool resets.
//!
//! ## Layers
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ RoundDriver      tokio countdown + animation │
//! ├──────────────────────────────────────────────┤
//! │ SharedWheel      Arc<Mutex<..>> handle       │
//! ├──────────────────────────────────────────────┤
//! │ GameStateMachine phases, ledger, draw        │
//! ├──────────────────────────────────────────────┤
//! │ RoundObserver    display / persistence       │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use prizewheel_engine::{GameStateMachine, TickOutcome};
//! use prizewheel_core::{Phase, WheelConfig};
//!
//! let mut wheel = GameStateMachine::new(WheelConfig {
//!     countdown_ticks: 1,
//!     rng_seed: Some(7),
//!     ..WheelConfig::default()
//! })?;
//!
//! wheel.submit_purchase("wallet-a", 40)?;
//! wheel.submit_purchase("wallet-b", 60)?;
//! assert_eq!(wheel.phase(), Phase::CountingDown);
//!
//! let TickOutcome::DrawStarted(draw) = wheel.tick()? else { unreachable!() };
//! // ... display spins to draw.plan.target_angle ...
//! let result = wheel.notify_animation_complete()?;
//! assert_eq!(result.winner, draw.winner);
//! # Ok::<(), prizewheel_core::WheelError>(())
//! ```

pub mod animation;
pub mod countdown;
pub mod driver;
pub mod events;
pub mod machine;
pub mod observer;
pub mod round;
pub mod shared;

pub use animation::{animation_signal, AnimationCompletion, AnimationNotifier};
pub use countdown::{
    cancel_signal, run_countdown, CancelHandle, CancelListener, CountdownExit, CountdownTimer,
};
pub use driver::{RoundDriver, RoundOutcome};
pub use events::{ChannelObserver, EventChannel, WheelEvent};
pub use machine::GameStateMachine;
pub use observer::{NullObserver, RoundObserver};
pub use round::{Draw, PurchaseReceipt, RoundResult, RoundSnapshot, RoundState, TickOutcome};
pub use shared::SharedWheel;
