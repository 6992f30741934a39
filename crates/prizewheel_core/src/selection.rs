//! # Selection Engine
//!
//! Weighted draw over a `SegmentSet`.
//!
//! The draw itself is a pure function of the segment set and a random unit in
//! `[0, 1)`. Randomness is supplied by the caller so the outcome can be
//! replayed and tested; `SelectionEngine` is a thin seedable source of those
//! units for the live engine.
//!
//! ## Algorithm
//!
//! ```text
//! scaled = unit * total_weight
//! walk segments in order, cumulative += weight
//! first segment with cumulative >= scaled wins
//! rounding past the last sum -> last segment
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::segment::{Segment, SegmentSet};

/// Picks the index of the winning segment for `random_unit`.
///
/// Total over every input: values below 0 select the first segment, values
/// at or above 1 (and NaN) select the last.
#[must_use]
pub fn select_index(segments: &SegmentSet, random_unit: f64) -> usize {
    let unit = if random_unit.is_nan() {
        1.0
    } else {
        random_unit.clamp(0.0, 1.0)
    };
    let scaled = unit * segments.total_weight();

    let mut cumulative = 0.0;
    for (index, segment) in segments.iter().enumerate() {
        cumulative += segment.weight;
        if cumulative >= scaled {
            return index;
        }
    }

    // Accumulated rounding left `scaled` just past the final sum.
    segments.len() - 1
}

/// Picks the winning segment for `random_unit`.
#[must_use]
pub fn select(segments: &SegmentSet, random_unit: f64) -> &Segment {
    let index = select_index(segments, random_unit);
    &segments.as_slice()[index]
}

/// Seedable source of draw units.
///
/// ChaCha20 so a seeded run is reproducible across platforms and an entropy
/// seeded run is not predictable from earlier outcomes.
#[derive(Clone)]
pub struct SelectionEngine {
    rng: ChaCha20Rng,
    draws: u64,
}

impl SelectionEngine {
    /// Creates an engine with a fixed seed.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            draws: 0,
        }
    }

    /// Creates an engine seeded from OS entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha20Rng::from_entropy(),
            draws: 0,
        }
    }

    /// Seeded if `seed` is set, entropy otherwise.
    #[must_use]
    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::from_seed)
    }

    /// Next uniform unit in `[0, 1)`.
    pub fn next_unit(&mut self) -> f64 {
        self.draws += 1;
        self.rng.gen::<f64>()
    }

    /// Draws a winner. Returns `(index, random_unit)`.
    pub fn draw(&mut self, segments: &SegmentSet) -> (usize, f64) {
        let unit = self.next_unit();
        (select_index(segments, unit), unit)
    }

    /// Number of units handed out so far.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }

    /// The underlying RNG, for spin parameters that should share the stream.
    pub fn rng_mut(&mut self) -> &mut ChaCha20Rng {
        &mut self.rng
    }

    /// Runs `samples` draws and tallies the winners.
    pub fn run_statistics(&mut self, segments: &SegmentSet, samples: u64) -> SelectionStatistics {
        let mut stats = SelectionStatistics::new(segments.len());
        for _ in 0..samples {
            let (index, _) = self.draw(segments);
            stats.record(index);
        }
        stats
    }
}

impl std::fmt::Debug for SelectionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // RNG state would let anyone predict the next draw.
        f.debug_struct("SelectionEngine")
            .field("rng", &"[REDACTED]")
            .field("draws", &self.draws)
            .finish()
    }
}

/// Tally of draw outcomes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionStatistics {
    /// Total draws recorded.
    pub samples: u64,
    /// Wins per segment index.
    pub counts: Vec<u64>,
}

impl SelectionStatistics {
    /// Creates an empty tally for `segment_count` segments.
    #[must_use]
    pub fn new(segment_count: usize) -> Self {
        Self {
            samples: 0,
            counts: vec![0; segment_count],
        }
    }

    /// Records one win for `index`.
    pub fn record(&mut self, index: usize) {
        if let Some(count) = self.counts.get_mut(index) {
            *count += 1;
            self.samples += 1;
        }
    }

    /// Observed relative frequency of `index`.
    #[must_use]
    pub fn frequency(&self, index: usize) -> f64 {
        if self.samples == 0 {
            return 0.0;
        }
        self.counts.get(index).map_or(0.0, |&c| c as f64 / self.samples as f64)
    }

    /// Largest absolute gap between observed frequency and `weight / total`.
    #[must_use]
    pub fn max_deviation(&self, segments: &SegmentSet) -> f64 {
        (0..self.counts.len())
            .filter_map(|i| segments.probability(i).map(|p| (self.frequency(i) - p).abs()))
            .fold(0.0, f64::max)
    }
}
