//! # Wheel Configuration
//!
//! Engine settings, loaded once at startup from TOML.
//!
//! ```toml
//! countdown_ticks = 10
//! tick_interval_ms = 1000
//! reset_policy = "after_receipt"
//!
//! [rotation]
//! min_turns = 4
//! max_turns = 8
//!
//! [[segments]]
//! label = "10% OFF"
//! weight = 30
//! color = "#8B5CF6"
//! ```
//!
//! Every field has a default. Validation runs on load so a broken wheel is
//! reported at startup instead of at draw time.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{WheelError, WheelResult};
use crate::rotation::RotationConfig;
use crate::segment::{Segment, SegmentSet};

/// What happens after a round resolves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetPolicy {
    /// Reopen as soon as the winner is known.
    Immediate,
    /// Stay resolved until a receipt is recorded or `reset` is called.
    #[default]
    AfterReceipt,
}

/// Engine settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WheelConfig {
    /// Ticks between the pool filling and the draw. Zero draws immediately.
    pub countdown_ticks: u32,
    /// Countdown tick period (ms). Must be non-zero.
    pub tick_interval_ms: u64,
    /// Quoted price per unit, in minor currency units.
    pub unit_price: u64,
    /// Behaviour after resolution.
    pub reset_policy: ResetPolicy,
    /// Grace after the planned spin before the driver resolves without a
    /// completion signal. `None` waits forever.
    pub animation_timeout_ms: Option<u64>,
    /// Fixed seed for reproducible draws. `None` uses OS entropy.
    pub rng_seed: Option<u64>,
    /// Spin parameters.
    pub rotation: RotationConfig,
    /// Prize slots, in wheel order.
    pub segments: Vec<Segment>,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            countdown_ticks: 10,
            tick_interval_ms: 1000,
            // 1 unit = 1% of a 10^9 minor-unit coin
            unit_price: 10_000_000,
            reset_policy: ResetPolicy::AfterReceipt,
            animation_timeout_ms: None,
            rng_seed: None,
            rotation: RotationConfig::default(),
            segments: default_segments(),
        }
    }
}

/// The stock promotional wheel.
#[must_use]
pub fn default_segments() -> Vec<Segment> {
    vec![
        Segment::new("10% OFF", 30.0, "#8B5CF6"),
        Segment::new("20% OFF", 20.0, "#0EA5E9"),
        Segment::new("30% OFF", 10.0, "#10B981"),
        Segment::new("Try Again", 40.0, "#6B7280"),
    ]
}

impl WheelConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` for malformed TOML or a config that
    /// fails [`WheelConfig::validate`].
    pub fn from_toml_str(source: &str) -> WheelResult<Self> {
        let config: Self = toml::from_str(source)
            .map_err(|e| WheelError::InvalidConfiguration(format!("malformed config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read, otherwise as
    /// [`WheelConfig::from_toml_str`].
    pub fn from_file(path: impl AsRef<Path>) -> WheelResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| WheelError::Io(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }

    /// Checks every field.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` naming the first bad field.
    pub fn validate(&self) -> WheelResult<()> {
        if self.tick_interval_ms == 0 {
            return Err(WheelError::InvalidConfiguration(
                "tick_interval_ms must be greater than zero".to_string(),
            ));
        }
        self.rotation.validate()?;
        self.segment_set()?;
        Ok(())
    }

    /// Builds the validated segment set.
    ///
    /// # Errors
    ///
    /// See [`SegmentSet::new`].
    pub fn segment_set(&self) -> WheelResult<SegmentSet> {
        SegmentSet::new(self.segments.clone())
    }

    /// Countdown tick period.
    #[inline]
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Animation grace period, if any.
    #[must_use]
    pub fn animation_timeout(&self) -> Option<Duration> {
        self.animation_timeout_ms.map(Duration::from_millis)
    }
}
