//! # Shared Wheel
//!
//! A cloneable handle to one `GameStateMachine` behind a mutex.
//!
//! Each method takes the lock once, so a purchase is checked and committed
//! in a single critical section. Two handlers racing for the last units can
//! never both succeed.

use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

use prizewheel_core::{
    ParticipantId, Phase, Purchase, PurchaseRejection, Segment, WheelResult,
};

use crate::machine::GameStateMachine;
use crate::round::{Draw, PurchaseReceipt, RoundResult, RoundSnapshot, TickOutcome};

/// Thread-safe handle to a wheel.
#[derive(Clone)]
pub struct SharedWheel {
    inner: Arc<Mutex<GameStateMachine>>,
}

impl SharedWheel {
    /// Wraps a machine.
    #[must_use]
    pub fn new(machine: GameStateMachine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(machine)),
        }
    }

    /// Locks the machine for a multi-step operation.
    pub fn lock(&self) -> MutexGuard<'_, GameStateMachine> {
        self.inner.lock()
    }

    /// See [`GameStateMachine::submit_purchase`].
    ///
    /// # Errors
    ///
    /// See [`GameStateMachine::submit_purchase`].
    pub fn submit_purchase(
        &self,
        participant: impl Into<ParticipantId>,
        units: i64,
    ) -> Result<PurchaseReceipt, PurchaseRejection> {
        self.inner.lock().submit_purchase(participant, units)
    }

    /// See [`GameStateMachine::load_segments`].
    ///
    /// # Errors
    ///
    /// See [`GameStateMachine::load_segments`].
    pub fn load_segments(&self, segments: Vec<Segment>) -> WheelResult<()> {
        self.inner.lock().load_segments(segments)
    }

    /// See [`GameStateMachine::tick_for_round`].
    ///
    /// # Errors
    ///
    /// See [`GameStateMachine::tick`].
    pub fn tick_for_round(&self, round: u64) -> WheelResult<TickOutcome> {
        self.inner.lock().tick_for_round(round)
    }

    /// See [`GameStateMachine::notify_animation_complete`].
    ///
    /// # Errors
    ///
    /// `AnimationProtocolViolation` outside `Drawing`.
    pub fn notify_animation_complete(&self) -> WheelResult<RoundResult> {
        self.inner.lock().notify_animation_complete()
    }

    /// Completes the animation only if `round` is still drawing.
    ///
    /// Returns `None` if the round has moved on.
    pub fn notify_animation_complete_for_round(
        &self,
        round: u64,
    ) -> Option<WheelResult<RoundResult>> {
        let mut machine = self.inner.lock();
        if machine.round() != round || machine.phase() != Phase::Drawing {
            return None;
        }
        Some(machine.notify_animation_complete())
    }

    /// The draw in flight for `round`, if any.
    #[must_use]
    pub fn pending_draw_for_round(&self, round: u64) -> Option<Draw> {
        let machine = self.inner.lock();
        if machine.round() != round {
            return None;
        }
        machine.pending_draw().cloned()
    }

    /// See [`GameStateMachine::reset`].
    ///
    /// # Errors
    ///
    /// `InvalidTransition` outside `Resolved`.
    pub fn reset(&self) -> WheelResult<()> {
        self.inner.lock().reset()
    }

    /// See [`GameStateMachine::record_receipt`].
    ///
    /// # Errors
    ///
    /// See [`GameStateMachine::record_receipt`].
    pub fn record_receipt(&self, receipt_number: &str) -> WheelResult<RoundResult> {
        self.inner.lock().record_receipt(receipt_number)
    }

    /// See [`GameStateMachine::abort`].
    pub fn abort(&self) -> Vec<Purchase> {
        self.inner.lock().abort()
    }

    /// See [`GameStateMachine::snapshot`].
    #[must_use]
    pub fn snapshot(&self) -> RoundSnapshot {
        self.inner.lock().snapshot()
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.inner.lock().phase()
    }

    /// Current round number.
    #[must_use]
    pub fn round(&self) -> u64 {
        self.inner.lock().round()
    }

    /// Units unsold.
    #[must_use]
    pub fn remaining_space(&self) -> u32 {
        self.inner.lock().remaining_space()
    }

    /// Units sold.
    #[must_use]
    pub fn committed(&self) -> u32 {
        self.inner.lock().committed()
    }
}

impl From<GameStateMachine> for SharedWheel {
    fn from(machine: GameStateMachine) -> Self {
        Self::new(machine)
    }
}

impl std::fmt::Debug for SharedWheel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inner.try_lock() {
            Some(machine) => f.debug_tuple("SharedWheel").field(&*machine).finish(),
            None => f.write_str("SharedWheel(<locked>)"),
        }
    }
}
