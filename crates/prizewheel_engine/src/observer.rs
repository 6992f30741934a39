//! # Collaborator Traits
//!
//! The engine never renders, stores or notifies anything itself. It calls
//! out through `RoundObserver`, which the display and persistence layers
//! implement.
//!
//! ```text
//! Engine defines:           Collaborator implements:
//! ┌─────────────────────┐    ┌────────────────────────┐
//! │ trait RoundObserver │ ←─ │ impl RoundObserver for │
//! └─────────────────────┘    │   WheelCanvas          │
//!                            └────────────────────────┘
//! ```
//!
//! Every method has an empty default, so a collaborator only implements the
//! callbacks it cares about. Callbacks run while the engine is mid-operation;
//! they must not call back into the same engine.

use prizewheel_core::{Phase, Purchase};

use crate::round::{Draw, RoundResult};

/// Receives round lifecycle notifications.
pub trait RoundObserver: Send {
    /// The round entered `phase` with `remaining_space` units unsold.
    fn on_round_phase_changed(&mut self, _phase: Phase, _remaining_space: u32) {}

    /// A purchase was accepted.
    fn on_purchase_accepted(&mut self, _purchase: &Purchase, _remaining_space: u32) {}

    /// One countdown tick elapsed.
    fn on_countdown_tick(&mut self, _ticks_remaining: u32) {}

    /// The winner is picked; the display should start the spin.
    ///
    /// The engine then waits for `notify_animation_complete`.
    fn on_draw_started(&mut self, _draw: &Draw) {}

    /// The spin finished and the winner is final.
    fn on_round_resolved(&mut self, _result: &RoundResult) {}

    /// A sale receipt was recorded against the resolved round.
    fn on_receipt_recorded(&mut self, _result: &RoundResult, _receipt: &str) {}
}

/// Observer that ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullObserver;

impl RoundObserver for NullObserver {}

/// Fans every notification out to several observers, in order.
impl RoundObserver for Vec<Box<dyn RoundObserver>> {
    fn on_round_phase_changed(&mut self, phase: Phase, remaining_space: u32) {
        for observer in self.iter_mut() {
            observer.on_round_phase_changed(phase, remaining_space);
        }
    }

    fn on_purchase_accepted(&mut self, purchase: &Purchase, remaining_space: u32) {
        for observer in self.iter_mut() {
            observer.on_purchase_accepted(purchase, remaining_space);
        }
    }

    fn on_countdown_tick(&mut self, ticks_remaining: u32) {
        for observer in self.iter_mut() {
            observer.on_countdown_tick(ticks_remaining);
        }
    }

    fn on_draw_started(&mut self, draw: &Draw) {
        for observer in self.iter_mut() {
            observer.on_draw_started(draw);
        }
    }

    fn on_round_resolved(&mut self, result: &RoundResult) {
        for observer in self.iter_mut() {
            observer.on_round_resolved(result);
        }
    }

    fn on_receipt_recorded(&mut self, result: &RoundResult, receipt: &str) {
        for observer in self.iter_mut() {
            observer.on_receipt_recorded(result, receipt);
        }
    }
}
