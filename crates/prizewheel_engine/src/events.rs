//! # Wheel Events
//!
//! Owned copies of observer notifications, for collaborators that live on
//! another thread.
//!
//! ## Event Flow for a Round:
//! ```text
//! 1. submit_purchase  -> PurchaseAccepted (xN)
//! 2. pool full        -> PhaseChanged(CountingDown)
//! 3. each tick        -> CountdownTick
//! 4. countdown done   -> PhaseChanged(Drawing), DrawStarted
//! 5. animation done   -> PhaseChanged(Resolved), RoundResolved
//! 6. receipt          -> ReceiptRecorded, PhaseChanged(Open)
//! ```

use prizewheel_core::{Phase, Purchase};

use crate::observer::RoundObserver;
use crate::round::{Draw, RoundResult};

/// A round notification as a value.
#[derive(Clone, Debug, PartialEq)]
pub enum WheelEvent {
    /// See [`RoundObserver::on_round_phase_changed`].
    PhaseChanged {
        /// New phase.
        phase: Phase,
        /// Units unsold.
        remaining_space: u32,
    },
    /// See [`RoundObserver::on_purchase_accepted`].
    PurchaseAccepted {
        /// The purchase.
        purchase: Purchase,
        /// Units unsold after it.
        remaining_space: u32,
    },
    /// See [`RoundObserver::on_countdown_tick`].
    CountdownTick {
        /// Ticks left.
        ticks_remaining: u32,
    },
    /// See [`RoundObserver::on_draw_started`].
    DrawStarted(Draw),
    /// See [`RoundObserver::on_round_resolved`].
    RoundResolved(RoundResult),
    /// See [`RoundObserver::on_receipt_recorded`].
    ReceiptRecorded {
        /// The round the receipt belongs to.
        result: RoundResult,
        /// Receipt number.
        receipt: String,
    },
}

/// Bidirectional event channel for cross-thread communication.
pub struct EventChannel<T> {
    sender: crossbeam_channel::Sender<T>,
    receiver: crossbeam_channel::Receiver<T>,
}

impl<T> EventChannel<T> {
    /// Creates a new bounded event channel.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = crossbeam_channel::bounded(capacity);
        Self { sender, receiver }
    }

    /// Creates a new unbounded event channel.
    #[must_use]
    pub fn unbounded() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self { sender, receiver }
    }

    /// Tries to send an event (returns immediately).
    ///
    /// # Errors
    ///
    /// Returns the event back if the channel is full or disconnected.
    pub fn try_send(&self, event: T) -> Result<(), crossbeam_channel::TrySendError<T>> {
        self.sender.try_send(event)
    }

    /// Tries to receive an event (non-blocking).
    ///
    /// # Errors
    ///
    /// Returns `Empty` if nothing is queued.
    pub fn try_recv(&self) -> Result<T, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receives an event, waiting at most `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `Timeout` if nothing arrived in time.
    pub fn recv_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Result<T, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Drains every queued event.
    pub fn drain(&self) -> Vec<T> {
        self.receiver.try_iter().collect()
    }

    /// Gets a clone of the sender for another thread.
    #[must_use]
    pub fn sender(&self) -> crossbeam_channel::Sender<T> {
        self.sender.clone()
    }

    /// Gets a clone of the receiver for another thread.
    #[must_use]
    pub fn receiver(&self) -> crossbeam_channel::Receiver<T> {
        self.receiver.clone()
    }
}

impl<T> Default for EventChannel<T> {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventChannel<WheelEvent> {
    /// An observer that feeds this channel.
    #[must_use]
    pub fn observer(&self) -> ChannelObserver {
        ChannelObserver::new(self.sender())
    }
}

/// Observer that forwards every notification as a [`WheelEvent`].
///
/// Sends never block the engine. A full or closed channel drops the event
/// with a warning.
#[derive(Clone, Debug)]
pub struct ChannelObserver {
    sender: crossbeam_channel::Sender<WheelEvent>,
}

impl ChannelObserver {
    /// Wraps a sender.
    #[must_use]
    pub fn new(sender: crossbeam_channel::Sender<WheelEvent>) -> Self {
        Self { sender }
    }

    fn forward(&self, event: WheelEvent) {
        if let Err(e) = self.sender.try_send(event) {
            tracing::warn!("Dropped wheel event: {}", e);
        }
    }
}

impl RoundObserver for ChannelObserver {
    fn on_round_phase_changed(&mut self, phase: Phase, remaining_space: u32) {
        self.forward(WheelEvent::PhaseChanged {
            phase,
            remaining_space,
        });
    }

    fn on_purchase_accepted(&mut self, purchase: &Purchase, remaining_space: u32) {
        self.forward(WheelEvent::PurchaseAccepted {
            purchase: purchase.clone(),
            remaining_space,
        });
    }

    fn on_countdown_tick(&mut self, ticks_remaining: u32) {
        self.forward(WheelEvent::CountdownTick { ticks_remaining });
    }

    fn on_draw_started(&mut self, draw: &Draw) {
        self.forward(WheelEvent::DrawStarted(draw.clone()));
    }

    fn on_round_resolved(&mut self, result: &RoundResult) {
        self.forward(WheelEvent::RoundResolved(result.clone()));
    }

    fn on_receipt_recorded(&mut self, result: &RoundResult, receipt: &str) {
        self.forward(WheelEvent::ReceiptRecorded {
            result: result.clone(),
            receipt: receipt.to_string(),
        });
    }
}
