//! # Rotation Planner
//!
//! Turns a chosen segment into a spin the display layer can animate.
//!
//! The wheel rotates clockwise by `angle` degrees. A point drawn at wheel-local
//! angle `θ` therefore appears at `θ + angle`, and the segment under the fixed
//! pointer is the one covering `pointer - angle`. The planner picks a target
//! so that the winning segment's midpoint ends up under the pointer:
//!
//! ```text
//! offset = (pointer - midpoint - current) mod 360
//! target = current + full_turns * 360 + offset
//! ```
//!
//! Turns and duration are drawn from configured ranges; neither affects where
//! the wheel stops.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{WheelError, WheelResult};
use crate::segment::{normalize_degrees, SegmentSet, FULL_TURN_DEG};

/// Easing curve for the spin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    /// Constant angular velocity.
    Linear,
    /// Fast start, long glide into the pointer: `1 - (1 - t)^3`.
    #[default]
    CubicOut,
}

impl Easing {
    /// Applies the easing function to a progress value (clamped to 0-1).
    #[must_use]
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::CubicOut => {
                let inv = 1.0 - t;
                1.0 - inv * inv * inv
            }
        }
    }
}

/// Spin parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    /// Fewest whole turns before settling.
    pub min_turns: u32,
    /// Most whole turns before settling.
    pub max_turns: u32,
    /// Shortest spin (ms).
    pub min_duration_ms: u64,
    /// Longest spin (ms).
    pub max_duration_ms: u64,
    /// Where the fixed pointer sits, in screen degrees (270 = top of a y-down canvas).
    pub pointer_angle_deg: f64,
    /// Curve the display should animate with.
    pub easing: Easing,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            min_turns: 4,
            max_turns: 8,
            min_duration_ms: 3000,
            max_duration_ms: 5000,
            pointer_angle_deg: 270.0,
            easing: Easing::CubicOut,
        }
    }
}

impl RotationConfig {
    /// Checks the ranges.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` for inverted ranges or a non-finite pointer.
    pub fn validate(&self) -> WheelResult<()> {
        if self.min_turns > self.max_turns {
            return Err(WheelError::InvalidConfiguration(format!(
                "rotation turns range is inverted: {}..={}",
                self.min_turns, self.max_turns
            )));
        }
        if self.min_duration_ms > self.max_duration_ms {
            return Err(WheelError::InvalidConfiguration(format!(
                "rotation duration range is inverted: {}..={} ms",
                self.min_duration_ms, self.max_duration_ms
            )));
        }
        if !self.pointer_angle_deg.is_finite() {
            return Err(WheelError::InvalidConfiguration(
                "pointer angle must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// Where and how long the display must spin.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RotationPlan {
    /// Accumulated rotation when the spin starts.
    pub start_angle: f64,
    /// Accumulated rotation when the spin ends.
    pub target_angle: f64,
    /// Animation length.
    pub duration_ms: u64,
    /// Whole turns included in the travel.
    pub full_turns: u32,
    /// Pointer position the plan was computed for.
    pub pointer_angle_deg: f64,
    /// Curve to animate with.
    pub easing: Easing,
}

impl RotationPlan {
    /// Total degrees travelled.
    #[inline]
    #[must_use]
    pub fn travel(&self) -> f64 {
        self.target_angle - self.start_angle
    }

    /// Wheel-local angle sitting under the pointer once the spin ends.
    #[must_use]
    pub fn resting_angle(&self) -> f64 {
        normalize_degrees(self.pointer_angle_deg - self.target_angle)
    }

    /// Accumulated rotation `elapsed_ms` into the spin.
    ///
    /// Returns exactly `target_angle` once the duration has passed.
    #[must_use]
    pub fn angle_at(&self, elapsed_ms: u64) -> f64 {
        if elapsed_ms >= self.duration_ms {
            return self.target_angle;
        }
        let t = elapsed_ms as f64 / self.duration_ms as f64;
        self.start_angle + self.travel() * self.easing.apply(t)
    }
}

/// Computes spins that agree with the selector.
#[derive(Clone, Debug)]
pub struct RotationPlanner {
    config: RotationConfig,
}

impl RotationPlanner {
    /// Creates a planner.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if the config fails validation.
    pub fn new(config: RotationConfig) -> WheelResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &RotationConfig {
        &self.config
    }

    /// Plans a spin, drawing turns and duration from `rng`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if `winning_index` is out of range or
    /// `current_angle` is not finite.
    pub fn plan<R: Rng + ?Sized>(
        &self,
        segments: &SegmentSet,
        winning_index: usize,
        current_angle: f64,
        rng: &mut R,
    ) -> WheelResult<RotationPlan> {
        let full_turns = rng.gen_range(self.config.min_turns..=self.config.max_turns);
        let duration_ms =
            rng.gen_range(self.config.min_duration_ms..=self.config.max_duration_ms);
        self.plan_with(segments, winning_index, current_angle, full_turns, duration_ms)
    }

    /// Plans a spin with explicit turns and duration.
    ///
    /// # Errors
    ///
    /// Same as [`RotationPlanner::plan`].
    pub fn plan_with(
        &self,
        segments: &SegmentSet,
        winning_index: usize,
        current_angle: f64,
        full_turns: u32,
        duration_ms: u64,
    ) -> WheelResult<RotationPlan> {
        let arc = segments.arc(winning_index).ok_or_else(|| {
            WheelError::InvalidConfiguration(format!(
                "winning index {winning_index} out of range for {} segments",
                segments.len()
            ))
        })?;
        if !current_angle.is_finite() {
            return Err(WheelError::InvalidConfiguration(
                "current wheel angle must be finite".to_string(),
            ));
        }

        let pointer = self.config.pointer_angle_deg;
        let offset = normalize_degrees(pointer - arc.midpoint() - current_angle);
        let target_angle = current_angle + f64::from(full_turns) * FULL_TURN_DEG + offset;

        Ok(RotationPlan {
            start_angle: current_angle,
            target_angle,
            duration_ms,
            full_turns,
            pointer_angle_deg: pointer,
            easing: self.config.easing,
        })
    }
}
