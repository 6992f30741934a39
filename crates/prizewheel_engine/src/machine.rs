//! # Game State Machine
//!
//! Owns one round at a time and moves it through its phases.
//!
//! ## States
//!
//! - **Open**: purchases accepted until the pool holds `CAPACITY` units.
//! - **CountingDown**: pool full, a fixed number of ticks before the draw.
//! - **Drawing**: winner picked, waiting for the display to finish the spin.
//! - **Resolved**: winner final, waiting for a receipt or reset.
//!
//! ## Ordering
//!
//! The draw reads the ledger and segment set exactly as they were when the
//! last unit sold: nothing can be purchased or reloaded after `Open`.
//!
//! The machine is synchronous and single-owner. Share it through
//! [`crate::SharedWheel`]; drive its clock with [`crate::RoundDriver`] or by
//! calling [`GameStateMachine::tick`] directly.

use prizewheel_core::{
    normalize_degrees, FundingLedger, ParticipantId, Phase, Purchase, PurchaseRejection,
    ResetPolicy, RotationPlanner, Segment, SegmentSet, SelectionEngine, WheelConfig, WheelError,
    WheelResult, CAPACITY,
};

use crate::observer::{NullObserver, RoundObserver};
use crate::round::{Draw, PurchaseReceipt, RoundResult, RoundSnapshot, RoundState, TickOutcome};

/// The round lifecycle.
pub struct GameStateMachine {
    config: WheelConfig,
    segments: SegmentSet,
    ledger: FundingLedger,
    state: RoundState,
    /// Starts at 1, bumped on every reset or abort.
    round: u64,
    selector: SelectionEngine,
    planner: RotationPlanner,
    /// Wheel rotation at rest, normalized to `[0, 360)`.
    wheel_angle: f64,
    observer: Box<dyn RoundObserver>,
}

impl GameStateMachine {
    /// Creates a machine with an open first round.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if the config does not validate.
    pub fn new(config: WheelConfig) -> WheelResult<Self> {
        config.validate()?;
        let segments = config.segment_set()?;
        let planner = RotationPlanner::new(config.rotation.clone())?;
        let selector = SelectionEngine::from_optional_seed(config.rng_seed);
        let ledger = FundingLedger::new(config.unit_price);

        tracing::info!(
            "Wheel ready: {} segments, countdown {} ticks, seeded: {}",
            segments.len(),
            config.countdown_ticks,
            config.rng_seed.is_some()
        );

        Ok(Self {
            config,
            segments,
            ledger,
            state: RoundState::Open,
            round: 1,
            selector,
            planner,
            wheel_angle: 0.0,
            observer: Box::new(NullObserver),
        })
    }

    /// Resumes a round from a snapshot.
    ///
    /// The snapshot's segments replace those in `config`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if the config is invalid or the
    /// snapshot is inconsistent: phase and ledger disagree, or a recorded
    /// draw does not match its segment set or its own spin.
    pub fn restore(config: WheelConfig, snapshot: RoundSnapshot) -> WheelResult<Self> {
        let mut machine = Self::new(config)?;
        let ledger = FundingLedger::restore(machine.config.unit_price, snapshot.purchases)?;
        let phase = snapshot.state.phase();

        if (phase == Phase::Open) == ledger.is_full() {
            return Err(WheelError::InvalidConfiguration(format!(
                "snapshot in phase {phase} has {} of {CAPACITY} units committed",
                ledger.committed()
            )));
        }
        let recorded = match &snapshot.state {
            RoundState::Drawing { draw } => Some((
                draw.round,
                draw.winning_index,
                &draw.winner,
                Some(draw.plan.resting_angle()),
            )),
            RoundState::Resolved { result } => {
                Some((result.round, result.winning_index, &result.winner, None))
            }
            _ => None,
        };
        if let Some((round, index, winner, resting_angle)) = recorded {
            if round != snapshot.round || index >= snapshot.segments.len() {
                return Err(WheelError::InvalidConfiguration(format!(
                    "snapshot draw (round {round}, segment {index}) does not match round {} with {} segments",
                    snapshot.round,
                    snapshot.segments.len()
                )));
            }
            if snapshot.segments.get(index) != Some(winner) {
                return Err(WheelError::InvalidConfiguration(format!(
                    "snapshot winner {:?} is not segment {index}",
                    winner.label
                )));
            }
            if let Some(angle) = resting_angle {
                let shown = snapshot.segments.index_at_angle(angle);
                if shown != index {
                    return Err(WheelError::InvalidConfiguration(format!(
                        "snapshot spin stops on segment {shown}, not the winner {index}"
                    )));
                }
            }
        }
        if !snapshot.wheel_angle.is_finite() {
            return Err(WheelError::InvalidConfiguration(
                "snapshot wheel angle must be finite".to_string(),
            ));
        }

        machine.segments = snapshot.segments;
        machine.ledger = ledger;
        machine.state = snapshot.state;
        machine.round = snapshot.round;
        machine.wheel_angle = normalize_degrees(snapshot.wheel_angle);

        tracing::info!(
            "Restored round {} in phase {} ({} units committed)",
            machine.round,
            phase,
            machine.ledger.committed()
        );
        Ok(machine)
    }

    /// Replaces the observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Box<dyn RoundObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Replaces the observer in place.
    pub fn set_observer(&mut self, observer: Box<dyn RoundObserver>) {
        self.observer = observer;
    }

    // ------------------------------------------------------------------
    // Inbound operations
    // ------------------------------------------------------------------

    /// Buys `units` of the pool for `participant`.
    ///
    /// The purchase that sells the last unit starts the countdown. With
    /// `countdown_ticks = 0` it starts the draw as well.
    ///
    /// # Errors
    ///
    /// `RoundNotAccepting` outside `Open`, otherwise whatever the ledger
    /// rejects. A rejection changes nothing.
    pub fn submit_purchase(
        &mut self,
        participant: impl Into<ParticipantId>,
        units: i64,
    ) -> Result<PurchaseReceipt, PurchaseRejection> {
        let participant = participant.into();
        let phase = self.phase();
        if !phase.accepts_purchases() {
            let rejection = PurchaseRejection::RoundNotAccepting { phase };
            tracing::warn!("Purchase from {} rejected: {}", participant, rejection);
            return Err(rejection);
        }

        let purchase = match self.ledger.commit(participant, units) {
            Ok(purchase) => purchase,
            Err(rejection) => {
                tracing::warn!("Purchase of {} units rejected: {}", units, rejection);
                return Err(rejection);
            }
        };
        let remaining_space = self.ledger.remaining_space();
        tracing::debug!(
            "Round {}: {} bought {} units ({} remaining)",
            self.round,
            purchase.participant,
            purchase.units,
            remaining_space
        );
        self.observer.on_purchase_accepted(&purchase, remaining_space);

        let countdown_started = remaining_space == 0;
        if countdown_started {
            self.enter(RoundState::CountingDown {
                ticks_remaining: self.config.countdown_ticks,
            });
            if self.config.countdown_ticks == 0 {
                // Planning only fails on an index or angle the machine never
                // produces; stay in CountingDown so the next tick retries.
                if let Err(e) = self.start_draw() {
                    tracing::error!("Round {}: draw failed to start: {}", self.round, e);
                }
            }
        }

        Ok(PurchaseReceipt {
            round: self.round,
            purchase,
            remaining_space,
            countdown_started,
        })
    }

    /// Replaces the segment set for the coming round.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless the round is `Open` with nothing sold;
    /// `InvalidConfiguration` if the list does not validate.
    pub fn load_segments(&mut self, segments: Vec<Segment>) -> WheelResult<()> {
        let phase = self.phase();
        if phase != Phase::Open || self.ledger.committed() > 0 {
            return Err(WheelError::InvalidTransition {
                from: phase,
                action: "load segments",
            });
        }
        let segments = SegmentSet::new(segments)?;
        tracing::info!(
            "Round {}: loaded {} segments (total weight {})",
            self.round,
            segments.len(),
            segments.total_weight()
        );
        self.segments = segments;
        Ok(())
    }

    /// Advances the countdown by one tick.
    ///
    /// # Errors
    ///
    /// Only if the draw cannot be planned.
    pub fn tick(&mut self) -> WheelResult<TickOutcome> {
        let RoundState::CountingDown { ticks_remaining } = self.state else {
            tracing::debug!("Tick ignored in phase {}", self.phase());
            return Ok(TickOutcome::Ignored);
        };

        let ticks_remaining = ticks_remaining.saturating_sub(1);
        self.state = RoundState::CountingDown { ticks_remaining };
        tracing::debug!("Round {}: countdown {}", self.round, ticks_remaining);
        self.observer.on_countdown_tick(ticks_remaining);

        if ticks_remaining > 0 {
            return Ok(TickOutcome::Counting { ticks_remaining });
        }
        self.start_draw().map(TickOutcome::DrawStarted)
    }

    /// Advances the countdown only if `round` is still the current round.
    ///
    /// A timer for an aborted round can never move the next one.
    ///
    /// # Errors
    ///
    /// See [`GameStateMachine::tick`].
    pub fn tick_for_round(&mut self, round: u64) -> WheelResult<TickOutcome> {
        if round != self.round {
            tracing::debug!("Stale tick for round {} ignored (current {})", round, self.round);
            return Ok(TickOutcome::Ignored);
        }
        self.tick()
    }

    /// The display finished the spin: the winner becomes final.
    ///
    /// Under `ResetPolicy::Immediate` the next round opens straight away.
    ///
    /// # Errors
    ///
    /// `AnimationProtocolViolation` outside `Drawing`. The state is left
    /// untouched.
    pub fn notify_animation_complete(&mut self) -> WheelResult<RoundResult> {
        let RoundState::Drawing { draw } = &self.state else {
            let phase = self.phase();
            tracing::warn!(
                "Animation completion ignored: round {} is {}",
                self.round,
                phase
            );
            return Err(WheelError::AnimationProtocolViolation { phase });
        };

        let result = RoundResult {
            round: draw.round,
            winning_index: draw.winning_index,
            winner: draw.winner.clone(),
            purchases: self.ledger.purchases().to_vec(),
            receipt: None,
        };
        self.wheel_angle = normalize_degrees(draw.plan.target_angle);

        tracing::info!(
            "Round {} resolved: {:?} wins ({} purchases, {} total)",
            result.round,
            result.winner.label,
            result.purchases.len(),
            self.ledger.total_cost()
        );
        self.enter(RoundState::Resolved {
            result: result.clone(),
        });
        self.observer.on_round_resolved(&result);

        if self.config.reset_policy == ResetPolicy::Immediate {
            self.open_next_round();
        }
        Ok(result)
    }

    /// Opens the next round after a resolved one.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` outside `Resolved`.
    pub fn reset(&mut self) -> WheelResult<()> {
        let phase = self.phase();
        if phase != Phase::Resolved {
            return Err(WheelError::InvalidTransition {
                from: phase,
                action: "reset",
            });
        }
        self.open_next_round();
        Ok(())
    }

    /// Records the sale receipt for the resolved round, then opens the next one.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` outside `Resolved`, `InvalidReceipt` if
    /// `receipt_number` is blank.
    pub fn record_receipt(&mut self, receipt_number: &str) -> WheelResult<RoundResult> {
        let phase = self.phase();
        let RoundState::Resolved { result } = &self.state else {
            return Err(WheelError::InvalidTransition {
                from: phase,
                action: "record a receipt",
            });
        };
        let receipt = receipt_number.trim();
        if receipt.is_empty() {
            return Err(WheelError::InvalidReceipt);
        }

        let mut result = result.clone();
        result.receipt = Some(receipt.to_string());
        tracing::info!("Round {}: receipt {} recorded", result.round, receipt);
        self.observer.on_receipt_recorded(&result, receipt);
        self.open_next_round();
        Ok(result)
    }

    /// Voids the current round and opens a fresh one.
    ///
    /// Returns the voided purchases so the payment side can refund them.
    /// A resolved round is not voided: it is reset and nothing is returned.
    pub fn abort(&mut self) -> Vec<Purchase> {
        let phase = self.phase();
        if phase == Phase::Resolved {
            self.open_next_round();
            return Vec::new();
        }

        let voided = self.ledger.clear();
        if !voided.is_empty() || phase != Phase::Open {
            tracing::warn!(
                "Round {} aborted in phase {}: {} purchases voided",
                self.round,
                phase,
                voided.len()
            );
        }
        self.round += 1;
        self.state = RoundState::Open;
        if phase != Phase::Open {
            self.observer.on_round_phase_changed(Phase::Open, CAPACITY);
        }
        voided
    }

    /// Serializable copy of the round.
    #[must_use]
    pub fn snapshot(&self) -> RoundSnapshot {
        RoundSnapshot {
            round: self.round,
            state: self.state.clone(),
            purchases: self.ledger.purchases().to_vec(),
            segments: self.segments.clone(),
            wheel_angle: self.wheel_angle,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Current phase.
    #[inline]
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// Current round state.
    #[must_use]
    pub const fn state(&self) -> &RoundState {
        &self.state
    }

    /// Current round number.
    #[inline]
    #[must_use]
    pub const fn round(&self) -> u64 {
        self.round
    }

    /// Units unsold.
    #[must_use]
    pub fn remaining_space(&self) -> u32 {
        self.ledger.remaining_space()
    }

    /// Units sold.
    #[must_use]
    pub fn committed(&self) -> u32 {
        self.ledger.committed()
    }

    /// Purchases this round.
    #[must_use]
    pub fn purchases(&self) -> &[Purchase] {
        self.ledger.purchases()
    }

    /// The funding ledger.
    #[must_use]
    pub const fn ledger(&self) -> &FundingLedger {
        &self.ledger
    }

    /// Active segment set.
    #[must_use]
    pub const fn segments(&self) -> &SegmentSet {
        &self.segments
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &WheelConfig {
        &self.config
    }

    /// Ticks left, while counting down.
    #[must_use]
    pub const fn ticks_remaining(&self) -> Option<u32> {
        match self.state {
            RoundState::CountingDown { ticks_remaining } => Some(ticks_remaining),
            _ => None,
        }
    }

    /// Winning segment once drawn.
    #[must_use]
    pub fn winner(&self) -> Option<&Segment> {
        match &self.state {
            RoundState::Drawing { draw } => Some(&draw.winner),
            RoundState::Resolved { result } => Some(&result.winner),
            _ => None,
        }
    }

    /// The draw being animated.
    #[must_use]
    pub fn pending_draw(&self) -> Option<&Draw> {
        match &self.state {
            RoundState::Drawing { draw } => Some(draw),
            _ => None,
        }
    }

    /// The resolved outcome, while waiting for reset.
    #[must_use]
    pub fn result(&self) -> Option<&RoundResult> {
        match &self.state {
            RoundState::Resolved { result } => Some(result),
            _ => None,
        }
    }

    /// Wheel rotation at rest, in `[0, 360)`.
    #[must_use]
    pub const fn wheel_angle(&self) -> f64 {
        self.wheel_angle
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    fn start_draw(&mut self) -> WheelResult<Draw> {
        let (winning_index, random_unit) = self.selector.draw(&self.segments);
        let plan = self.planner.plan(
            &self.segments,
            winning_index,
            self.wheel_angle,
            self.selector.rng_mut(),
        )?;
        let winner = self.segments.as_slice()[winning_index].clone();

        let draw = Draw {
            round: self.round,
            winning_index,
            winner,
            random_unit,
            plan,
        };
        tracing::info!(
            "Round {} draw: {:?} (segment {}, unit {:.6}), spin {} turns over {} ms",
            self.round,
            draw.winner.label,
            winning_index,
            random_unit,
            plan.full_turns,
            plan.duration_ms
        );
        self.enter(RoundState::Drawing { draw: draw.clone() });
        self.observer.on_draw_started(&draw);
        Ok(draw)
    }

    fn open_next_round(&mut self) {
        self.ledger.clear();
        self.round += 1;
        self.enter(RoundState::Open);
    }

    fn enter(&mut self, state: RoundState) {
        let from = self.phase();
        self.state = state;
        let to = self.phase();
        tracing::info!("Round {} transition: {} -> {}", self.round, from, to);
        self.observer
            .on_round_phase_changed(to, self.ledger.remaining_space());
    }
}

impl std::fmt::Debug for GameStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameStateMachine")
            .field("round", &self.round)
            .field("phase", &self.phase())
            .field("committed", &self.ledger.committed())
            .field("segments", &self.segments.len())
            .field("selector", &self.selector)
            .finish_non_exhaustive()
    }
}
