//! # Round Driver
//!
//! Runs the clock around a [`SharedWheel`] on Tokio.
//!
//! ```text
//! submit_purchase ──(pool full)──> spawn round task
//!                                    │
//!                                    ├─ CountdownTimer ──> DrawStarted
//!                                    │
//!                                    ├─ await AnimationCompletion
//!                                    │     (or plan duration + grace)
//!                                    │
//!                                    └─ notify_animation_complete ──> Resolved
//! ```
//!
//! The display calls [`RoundDriver::notify_animation_complete`] when its
//! spin ends. [`RoundDriver::abort`] cancels the task before voiding the
//! round, so a cancelled countdown never reaches the next round.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use prizewheel_core::{
    ParticipantId, Phase, Purchase, PurchaseRejection, WheelError, WheelResult,
};

use crate::animation::{animation_signal, AnimationCompletion, AnimationNotifier};
use crate::countdown::{cancel_signal, CancelHandle, CancelListener, CountdownExit, CountdownTimer};
use crate::round::{Draw, PurchaseReceipt, RoundResult};
use crate::shared::SharedWheel;

/// How a driven round ended.
#[derive(Clone, Debug, PartialEq)]
pub enum RoundOutcome {
    /// The winner is final.
    Resolved {
        /// The outcome.
        result: RoundResult,
        /// True if the display never confirmed and the grace period ran out.
        timed_out: bool,
    },
    /// The round was aborted through the driver.
    Cancelled,
    /// The round moved on without this task.
    Superseded,
    /// The engine refused to continue.
    Failed(WheelError),
    /// The countdown or round task panicked.
    Panicked,
}

struct RoundTask {
    round: u64,
    /// Feeds both the countdown task and the round task.
    cancel: CancelHandle,
    /// Taken by `wait_for_round`; the cancel handle stays behind.
    handle: Option<JoinHandle<RoundOutcome>>,
}

/// Async host for one wheel.
#[derive(Clone)]
pub struct RoundDriver {
    wheel: SharedWheel,
    tick_interval: Duration,
    animation_grace: Option<Duration>,
    task: Arc<Mutex<Option<RoundTask>>>,
    notifier: Arc<Mutex<Option<AnimationNotifier>>>,
}

impl RoundDriver {
    /// Wraps a wheel, taking timings from its config.
    #[must_use]
    pub fn new(wheel: SharedWheel) -> Self {
        let (tick_interval, animation_grace) = {
            let machine = wheel.lock();
            (
                machine.config().tick_interval(),
                machine.config().animation_timeout(),
            )
        };
        Self {
            wheel,
            tick_interval,
            animation_grace,
            task: Arc::new(Mutex::new(None)),
            notifier: Arc::new(Mutex::new(None)),
        }
    }

    /// The wheel being driven.
    #[must_use]
    pub const fn wheel(&self) -> &SharedWheel {
        &self.wheel
    }

    /// Buys units and, if this fills the pool, starts the round task.
    ///
    /// # Errors
    ///
    /// See [`crate::GameStateMachine::submit_purchase`].
    ///
    /// # Panics
    ///
    /// Panics if the purchase starts a round outside a Tokio runtime.
    pub fn submit_purchase(
        &self,
        participant: impl Into<ParticipantId>,
        units: i64,
    ) -> Result<PurchaseReceipt, PurchaseRejection> {
        let receipt = self.wheel.submit_purchase(participant, units)?;
        if receipt.countdown_started {
            self.start_round(receipt.round);
        }
        Ok(receipt)
    }

    /// Starts the task for a round that is already full, e.g. after a restore.
    ///
    /// Returns false if the wheel is not counting down or drawing.
    ///
    /// # Panics
    ///
    /// Panics outside a Tokio runtime.
    pub fn resume(&self) -> bool {
        let (round, phase) = {
            let machine = self.wheel.lock();
            (machine.round(), machine.phase())
        };
        if !matches!(phase, Phase::CountingDown | Phase::Drawing) {
            return false;
        }
        self.start_round(round);
        true
    }

    /// Tells the engine the spin has ended.
    ///
    /// # Errors
    ///
    /// `AnimationProtocolViolation` if no draw is in flight or the round
    /// task was already signalled.
    pub fn notify_animation_complete(&self) -> WheelResult<()> {
        let (round, phase) = {
            let machine = self.wheel.lock();
            (machine.round(), machine.phase())
        };
        if phase == Phase::Drawing {
            let notifier = self.notifier.lock().take();
            if let Some(notifier) = notifier {
                if notifier.round() == round && notifier.notify() {
                    return Ok(());
                }
            }
        }
        // The round task owns resolution; a repeat signal must not race it.
        if self.owns_round(round) {
            tracing::warn!(
                "Animation completion for round {} rejected in phase {}",
                round,
                phase
            );
            return Err(WheelError::AnimationProtocolViolation { phase });
        }
        self.wheel.notify_animation_complete().map(|_| ())
    }

    /// Waits for the current round task, if any.
    pub async fn wait_for_round(&self) -> Option<RoundOutcome> {
        let (round, handle) = {
            let mut guard = self.task.lock();
            let task = guard.as_mut()?;
            (task.round, task.handle.take()?)
        };
        match handle.await {
            Ok(outcome) => Some(outcome),
            Err(e) if e.is_cancelled() => Some(RoundOutcome::Cancelled),
            Err(e) => {
                tracing::error!("Round task for round {} panicked: {}", round, e);
                Some(RoundOutcome::Panicked)
            }
        }
    }

    /// See [`crate::GameStateMachine::reset`].
    ///
    /// # Errors
    ///
    /// `InvalidTransition` outside `Resolved`.
    pub fn reset(&self) -> WheelResult<()> {
        self.wheel.reset()
    }

    /// See [`crate::GameStateMachine::record_receipt`].
    ///
    /// # Errors
    ///
    /// See [`crate::GameStateMachine::record_receipt`].
    pub fn record_receipt(&self, receipt_number: &str) -> WheelResult<RoundResult> {
        self.wheel.record_receipt(receipt_number)
    }

    /// Cancels the round task, then voids the round.
    pub fn abort(&self) -> Vec<Purchase> {
        if let Some(task) = self.task.lock().as_ref() {
            task.cancel.cancel();
        }
        self.notifier.lock().take();
        self.wheel.abort()
    }

    fn owns_round(&self, round: u64) -> bool {
        self.task.lock().as_ref().is_some_and(|task| task.round == round)
    }

    fn start_round(&self, round: u64) {
        let (cancel, listener) = cancel_signal();
        let (notifier, completion) = animation_signal(round);
        *self.notifier.lock() = Some(notifier);

        let timer = (self.wheel.phase() == Phase::CountingDown).then(|| {
            CountdownTimer::spawn(self.wheel.clone(), round, self.tick_interval, cancel.listener())
        });

        let handle = tokio::spawn(run_round(
            self.wheel.clone(),
            round,
            timer,
            listener,
            completion,
            self.animation_grace,
        ));

        let previous = self.task.lock().replace(RoundTask {
            round,
            cancel,
            handle: Some(handle),
        });
        if let Some(previous) = previous {
            previous.cancel.cancel();
        }
        tracing::debug!("Round {} task started", round);
    }
}

impl std::fmt::Debug for RoundDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoundDriver")
            .field("tick_interval", &self.tick_interval)
            .field("animation_grace", &self.animation_grace)
            .field("active_round", &self.task.lock().as_ref().map(|t| t.round))
            .finish_non_exhaustive()
    }
}

async fn run_round(
    wheel: SharedWheel,
    round: u64,
    timer: Option<CountdownTimer>,
    mut cancel: CancelListener,
    completion: AnimationCompletion,
    grace: Option<Duration>,
) -> RoundOutcome {
    let draw = match timer {
        // The countdown listens to the same cancel signal as this task.
        Some(timer) => match timer.join().await {
            CountdownExit::DrawStarted(draw) => draw,
            CountdownExit::Cancelled => return RoundOutcome::Cancelled,
            CountdownExit::Superseded => return RoundOutcome::Superseded,
            CountdownExit::Failed(e) => return RoundOutcome::Failed(e),
            CountdownExit::Panicked => return RoundOutcome::Panicked,
        },
        None => match wheel.pending_draw_for_round(round) {
            Some(draw) => draw,
            None => return RoundOutcome::Superseded,
        },
    };

    let wait = tokio::select! {
        biased;
        () = cancel.cancelled() => return RoundOutcome::Cancelled,
        wait = wait_for_animation(completion, &draw, grace) => wait,
    };
    let timed_out = match wait {
        AnimationWait::Completed => false,
        AnimationWait::TimedOut => true,
        AnimationWait::Abandoned => return RoundOutcome::Superseded,
    };

    match wheel.notify_animation_complete_for_round(round) {
        Some(Ok(result)) => {
            tracing::info!(
                "Round {} finished: {:?}{}",
                round,
                result.winner.label,
                if timed_out { " (animation timed out)" } else { "" }
            );
            RoundOutcome::Resolved { result, timed_out }
        }
        Some(Err(e)) => RoundOutcome::Failed(e),
        None => RoundOutcome::Superseded,
    }
}

enum AnimationWait {
    Completed,
    TimedOut,
    Abandoned,
}

async fn wait_for_animation(
    completion: AnimationCompletion,
    draw: &Draw,
    grace: Option<Duration>,
) -> AnimationWait {
    let Some(grace) = grace else {
        return if completion.await {
            AnimationWait::Completed
        } else {
            AnimationWait::Abandoned
        };
    };

    let limit = Duration::from_millis(draw.plan.duration_ms) + grace;
    match tokio::time::timeout(limit, completion).await {
        Ok(true) => AnimationWait::Completed,
        Ok(false) => AnimationWait::Abandoned,
        Err(_) => {
            tracing::warn!(
                "Round {}: no animation completion after {:?}, resolving anyway",
                draw.round,
                limit
            );
            AnimationWait::TimedOut
        }
    }
}
