//! # Countdown Timer
//!
//! The only activity the engine starts on its own: a periodic tick from the
//! moment the pool fills until the draw.
//!
//! ```text
//! ┌────────────┐  tick_for_round(r)  ┌──────────────┐
//! │ interval   │ ──────────────────> │ SharedWheel  │
//! │ (period)   │ <── Counting ────── │              │
//! └────────────┘ <── DrawStarted ─── └──────────────┘
//!       ^
//!       └── CancelHandle::cancel()  (stops before the next tick)
//! ```
//!
//! Two guards keep a cancelled timer from firing: the cancel signal is
//! polled before every tick, and each tick carries its round number so the
//! machine drops ticks meant for a round that no longer exists.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use prizewheel_core::WheelError;

use crate::round::{Draw, TickOutcome};
use crate::shared::SharedWheel;

/// Creates a linked cancel handle and listener.
#[must_use]
pub fn cancel_signal() -> (CancelHandle, CancelListener) {
    let (sender, receiver) = watch::channel(false);
    (CancelHandle { sender }, CancelListener { receiver })
}

/// Fires the cancel signal. Dropping it also cancels.
#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl CancelHandle {
    /// Cancels every linked listener.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    /// A new listener on the same signal.
    #[must_use]
    pub fn listener(&self) -> CancelListener {
        CancelListener {
            receiver: self.sender.subscribe(),
        }
    }
}

/// Waits for the cancel signal.
#[derive(Clone, Debug)]
pub struct CancelListener {
    receiver: watch::Receiver<bool>,
}

impl CancelListener {
    /// Returns true once cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves when the signal fires or the handle is dropped.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.receiver.borrow_and_update() {
                return;
            }
            if self.receiver.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Why a countdown stopped.
#[derive(Clone, Debug, PartialEq)]
pub enum CountdownExit {
    /// The last tick started the draw.
    DrawStarted(Draw),
    /// The cancel signal fired.
    Cancelled,
    /// The round moved on without this timer (aborted or restored elsewhere).
    Superseded,
    /// The draw could not be planned.
    Failed(WheelError),
    /// The countdown task panicked, e.g. inside an observer.
    Panicked,
}

/// Ticks `wheel` every `period` until the draw starts or `cancel` fires.
///
/// The first tick lands one full period after the call.
pub async fn run_countdown(
    wheel: SharedWheel,
    round: u64,
    period: Duration,
    mut cancel: CancelListener,
) -> CountdownExit {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                tracing::debug!("Countdown for round {} cancelled", round);
                return CountdownExit::Cancelled;
            }
            _ = ticker.tick() => {
                match wheel.tick_for_round(round) {
                    Ok(TickOutcome::Counting { .. }) => {}
                    Ok(TickOutcome::DrawStarted(draw)) => return CountdownExit::DrawStarted(draw),
                    Ok(TickOutcome::Ignored) => {
                        tracing::debug!("Countdown for round {} superseded", round);
                        return CountdownExit::Superseded;
                    }
                    Err(e) => {
                        tracing::error!("Countdown for round {} failed: {}", round, e);
                        return CountdownExit::Failed(e);
                    }
                }
            }
        }
    }
}

/// A countdown running on its own task.
///
/// The caller keeps the [`CancelHandle`] that feeds `cancel`; dropping the
/// timer detaches the task without stopping it.
#[derive(Debug)]
pub struct CountdownTimer {
    round: u64,
    task: JoinHandle<CountdownExit>,
}

impl CountdownTimer {
    /// Spawns a countdown for `round`.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn spawn(wheel: SharedWheel, round: u64, period: Duration, cancel: CancelListener) -> Self {
        let task = tokio::spawn(run_countdown(wheel, round, period, cancel));
        Self { round, task }
    }

    /// Round this timer ticks.
    #[must_use]
    pub const fn round(&self) -> u64 {
        self.round
    }

    /// Returns true once the countdown has stopped.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the countdown to stop.
    pub async fn join(self) -> CountdownExit {
        match self.task.await {
            Ok(exit) => exit,
            Err(e) if e.is_cancelled() => CountdownExit::Cancelled,
            Err(e) => {
                tracing::error!("Countdown task for round {} panicked: {}", self.round, e);
                CountdownExit::Panicked
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::GameStateMachine;
    use prizewheel_core::{Phase, WheelConfig};

    fn full_wheel(countdown_ticks: u32) -> SharedWheel {
        let wheel = SharedWheel::new(
            GameStateMachine::new(WheelConfig {
                countdown_ticks,
                rng_seed: Some(3),
                ..WheelConfig::default()
            })
            .unwrap(),
        );
        wheel.submit_purchase("alice", 100).unwrap();
        wheel
    }

    #[tokio::test(start_paused = true)]
    async fn test_counts_down_to_draw() {
        let wheel = full_wheel(3);
        let started = Instant::now();
        let (_cancel, listener) = cancel_signal();

        let exit = run_countdown(wheel.clone(), 1, Duration::from_secs(1), listener).await;

        assert!(matches!(exit, CountdownExit::DrawStarted(ref draw) if draw.round == 1));
        assert_eq!(wheel.phase(), Phase::Drawing);
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_before_next_tick() {
        let wheel = full_wheel(5);
        let (cancel, listener) = cancel_signal();
        let timer = CountdownTimer::spawn(wheel.clone(), 1, Duration::from_secs(1), listener);

        time::sleep(Duration::from_millis(2500)).await;
        assert!(!timer.is_finished());
        cancel.cancel();
        assert_eq!(timer.join().await, CountdownExit::Cancelled);

        // Two ticks landed before the cancel, none after
        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(wheel.phase(), Phase::CountingDown);
        assert_eq!(wheel.lock().ticks_remaining(), Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_aborted_round_supersedes_timer() {
        let wheel = full_wheel(5);
        let (_cancel, listener) = cancel_signal();
        let timer = CountdownTimer::spawn(wheel.clone(), 1, Duration::from_secs(1), listener);
        assert_eq!(timer.round(), 1);

        wheel.abort();
        wheel.submit_purchase("bob", 100).unwrap();

        assert_eq!(timer.join().await, CountdownExit::Superseded);
        assert_eq!(wheel.lock().ticks_remaining(), Some(5));
    }

    struct PanicOnTick;

    impl crate::observer::RoundObserver for PanicOnTick {
        fn on_countdown_tick(&mut self, _ticks_remaining: u32) {
            panic!("display crashed");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_countdown_is_not_a_cancel() {
        let wheel = full_wheel(3);
        wheel.lock().set_observer(Box::new(PanicOnTick));
        let (_cancel, listener) = cancel_signal();
        let timer = CountdownTimer::spawn(wheel.clone(), 1, Duration::from_secs(1), listener);

        assert_eq!(timer.join().await, CountdownExit::Panicked);
        // The lock was released while unwinding
        assert_eq!(wheel.phase(), Phase::CountingDown);
    }

    #[tokio::test]
    async fn test_dropped_handle_cancels_listener() {
        let (handle, mut listener) = cancel_signal();
        assert!(!listener.is_cancelled());
        drop(handle);
        listener.cancelled().await;
    }
}
