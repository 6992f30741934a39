//! # Round Simulation
//!
//! Plays rounds end to end without a real display or payment rail:
//!
//! ```text
//! participants ──submit_purchase──> RoundDriver ──countdown──> draw
//!                                                               │
//!      DisplayStub <──────────── on_draw_started ───────────────┘
//!          │
//!          └─ sleeps the plan duration ──> notify_animation_complete
//! ```
//!
//! Participants buy random unit counts until the pool is full. A request
//! larger than the space left is rejected by the engine and retried with
//! exactly the remaining units, so every round fills to capacity.

use std::fmt;
use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use tokio::sync::mpsc;

use prizewheel_core::{
    ParticipantId, Phase, Purchase, PurchaseRejection, SegmentSet, WheelConfig, WheelError,
    WheelResult,
};
use prizewheel_engine::{
    Draw, EventChannel, GameStateMachine, RoundDriver, RoundObserver, RoundOutcome, SharedWheel,
    WheelEvent,
};

/// Simulation settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimulationConfig {
    /// Rounds to play.
    pub rounds: u32,
    /// Distinct participant wallets.
    pub participants: u32,
    /// Upper bound of a single purchase request.
    pub max_units_per_purchase: u32,
    /// Seeds the participants' choices. The draw RNG is seeded by the wheel config.
    pub seed: Option<u64>,
    /// Every Nth round the display never confirms its spin.
    ///
    /// Only honored when the wheel config sets an animation timeout.
    pub stall_every: Option<u32>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            rounds: 10,
            participants: 8,
            max_units_per_purchase: 25,
            seed: None,
            stall_every: None,
        }
    }
}

/// Shrinks the countdown and spin timings so a long run finishes quickly.
#[must_use]
pub fn fast_timings(mut config: WheelConfig) -> WheelConfig {
    config.tick_interval_ms = 10;
    config.rotation.min_duration_ms = 30;
    config.rotation.max_duration_ms = 50;
    config
}

/// Wins recorded for one segment.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentTally {
    /// Segment label.
    pub label: String,
    /// Probability implied by the weights.
    pub expected: f64,
    /// Rounds this segment won.
    pub wins: u64,
}

/// Totals for a simulation run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimulationReport {
    /// Rounds resolved.
    pub rounds: u32,
    /// Accepted purchases.
    pub purchases: u64,
    /// Purchases rejected for exceeding the remaining space.
    pub rejected: u64,
    /// Units sold across all rounds.
    pub units_sold: u64,
    /// Sum of quoted purchase costs, in minor units.
    pub revenue: u64,
    /// Countdown ticks observed.
    pub countdown_ticks: u64,
    /// Rounds resolved by the animation timeout.
    pub timed_out: u32,
    /// Wins per segment, in wheel order.
    pub tallies: Vec<SegmentTally>,
}

impl SimulationReport {
    fn new(segments: &SegmentSet) -> Self {
        let tallies = segments
            .iter()
            .enumerate()
            .map(|(i, segment)| SegmentTally {
                label: segment.label.clone(),
                expected: segments.probability(i).unwrap_or(0.0),
                wins: 0,
            })
            .collect();
        Self {
            tallies,
            ..Self::default()
        }
    }

    fn record_purchase(&mut self, purchase: &Purchase) {
        self.purchases += 1;
        self.units_sold += u64::from(purchase.units);
        self.revenue += purchase.cost;
    }

    /// Total wins over all segments.
    #[must_use]
    pub fn total_wins(&self) -> u64 {
        self.tallies.iter().map(|t| t.wins).sum()
    }

    /// Observed win rate of segment `index`.
    #[must_use]
    pub fn win_rate(&self, index: usize) -> f64 {
        let total = self.total_wins();
        match self.tallies.get(index) {
            Some(tally) if total > 0 => tally.wins as f64 / total as f64,
            _ => 0.0,
        }
    }
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Rounds played:      {}", self.rounds)?;
        writeln!(
            f,
            "Purchases:          {} ({} rejected and retried)",
            self.purchases, self.rejected
        )?;
        writeln!(f, "Units sold:         {}", self.units_sold)?;
        writeln!(f, "Revenue:            {} minor units", self.revenue)?;
        writeln!(f, "Countdown ticks:    {}", self.countdown_ticks)?;
        writeln!(f, "Animation timeouts: {}", self.timed_out)?;
        writeln!(f)?;
        writeln!(f, "{:<16} {:>9} {:>9} {:>6}", "Segment", "Expected", "Observed", "Wins")?;
        for (i, tally) in self.tallies.iter().enumerate() {
            writeln!(
                f,
                "{:<16} {:>8.2}% {:>8.2}% {:>6}",
                tally.label,
                tally.expected * 100.0,
                self.win_rate(i) * 100.0,
                tally.wins
            )?;
        }
        Ok(())
    }
}

/// Stand-in display: hands each draw to the simulation loop.
struct DisplayStub {
    draws: mpsc::UnboundedSender<Draw>,
}

impl RoundObserver for DisplayStub {
    fn on_draw_started(&mut self, draw: &Draw) {
        if self.draws.send(draw.clone()).is_err() {
            tracing::warn!("Display stub gone, round {} spin not shown", draw.round);
        }
    }
}

/// Scripted participants and display around one [`RoundDriver`].
pub struct Simulation {
    driver: RoundDriver,
    draws: mpsc::UnboundedReceiver<Draw>,
    events: EventChannel<WheelEvent>,
    rng: ChaCha20Rng,
    participants: Vec<ParticipantId>,
    segments: SegmentSet,
    settings: SimulationConfig,
    can_stall: bool,
}

impl Simulation {
    /// Builds the wheel and its stand-in collaborators.
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` for an invalid wheel config, no participants,
    /// or a zero purchase bound.
    pub fn new(config: WheelConfig, settings: SimulationConfig) -> WheelResult<Self> {
        if settings.participants == 0 || settings.max_units_per_purchase == 0 {
            return Err(WheelError::InvalidConfiguration(
                "simulation needs participants and a positive purchase bound".into(),
            ));
        }

        let segments = config.segment_set()?;
        let can_stall = config.animation_timeout_ms.is_some();

        let (draw_tx, draws) = mpsc::unbounded_channel();
        let events = EventChannel::unbounded();
        let observers: Vec<Box<dyn RoundObserver>> = vec![
            Box::new(DisplayStub { draws: draw_tx }),
            Box::new(events.observer()),
        ];
        let machine = GameStateMachine::new(config)?.with_observer(Box::new(observers));

        let rng = settings
            .seed
            .map_or_else(ChaCha20Rng::from_entropy, ChaCha20Rng::seed_from_u64);
        let participants = (1..=settings.participants)
            .map(|n| ParticipantId::from(format!("wallet-{n:02}")))
            .collect();

        Ok(Self {
            driver: RoundDriver::new(SharedWheel::new(machine)),
            draws,
            events,
            rng,
            participants,
            segments,
            settings,
            can_stall,
        })
    }

    /// The driver behind the simulation.
    #[must_use]
    pub const fn driver(&self) -> &RoundDriver {
        &self.driver
    }

    /// Plays the configured number of rounds.
    ///
    /// # Errors
    ///
    /// Any engine error, or a round that ended without resolving.
    pub async fn run(&mut self) -> WheelResult<SimulationReport> {
        let mut report = SimulationReport::new(&self.segments);

        for n in 1..=self.settings.rounds {
            self.fund_round(&mut report)?;

            let Some(draw) = self.draws.recv().await else {
                return Err(self.unfinished("show the spin"));
            };

            let stalled = self.can_stall
                && self
                    .settings
                    .stall_every
                    .is_some_and(|every| every > 0 && n % every == 0);
            if stalled {
                tracing::debug!("Round {}: display stalls", draw.round);
            } else {
                tokio::time::sleep(Duration::from_millis(draw.plan.duration_ms)).await;
                self.driver.notify_animation_complete()?;
            }

            let result = match self.driver.wait_for_round().await {
                Some(RoundOutcome::Resolved { result, timed_out }) => {
                    if timed_out {
                        report.timed_out += 1;
                    }
                    result
                }
                Some(RoundOutcome::Failed(e)) => return Err(e),
                _ => return Err(self.unfinished("resolve the round")),
            };

            if let Some(tally) = report.tallies.get_mut(result.winning_index) {
                tally.wins += 1;
            }
            report.rounds += 1;

            if self.driver.wheel().phase() == Phase::Resolved {
                self.driver
                    .record_receipt(&format!("SIM-{:05}", result.round))?;
            }

            report.countdown_ticks += self
                .events
                .drain()
                .iter()
                .filter(|e| matches!(e, WheelEvent::CountdownTick { .. }))
                .count() as u64;
        }

        tracing::info!(
            "Simulation finished: {} rounds, {} units sold",
            report.rounds,
            report.units_sold
        );
        Ok(report)
    }

    fn fund_round(&mut self, report: &mut SimulationReport) -> WheelResult<()> {
        while self.driver.wheel().phase() == Phase::Open {
            let who = self.participants[self.rng.gen_range(0..self.participants.len())].clone();
            let requested = i64::from(self.rng.gen_range(1..=self.settings.max_units_per_purchase));

            match self.driver.submit_purchase(who.clone(), requested) {
                Ok(receipt) => report.record_purchase(&receipt.purchase),
                Err(PurchaseRejection::ExceedsRemainingSpace { remaining, .. }) => {
                    report.rejected += 1;
                    let receipt = self.driver.submit_purchase(who, i64::from(remaining))?;
                    report.record_purchase(&receipt.purchase);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn unfinished(&self, action: &'static str) -> WheelError {
        WheelError::InvalidTransition {
            from: self.driver.wheel().phase(),
            action,
        }
    }
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("driver", &self.driver)
            .field("participants", &self.participants.len())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prizewheel_core::Segment;

    #[test]
    fn test_report_rates() {
        let segments = SegmentSet::new(vec![
            Segment::new("a", 1.0, ""),
            Segment::new("b", 3.0, ""),
        ])
        .unwrap();
        let mut report = SimulationReport::new(&segments);
        assert_eq!(report.win_rate(0), 0.0);

        report.tallies[0].wins = 1;
        report.tallies[1].wins = 3;
        assert_eq!(report.total_wins(), 4);
        assert!((report.win_rate(1) - 0.75).abs() < 1e-12);
        assert!((report.tallies[1].expected - 0.75).abs() < 1e-12);

        let text = report.to_string();
        assert!(text.contains("Segment"));
        assert!(text.contains("75.00%"));
    }

    #[test]
    fn test_rejects_empty_cast() {
        let settings = SimulationConfig {
            participants: 0,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            Simulation::new(WheelConfig::default(), settings),
            Err(WheelError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_fast_timings_stay_valid() {
        let config = fast_timings(WheelConfig::default());
        assert!(config.validate().is_ok());
        assert_eq!(config.tick_interval_ms, 10);
    }
}
