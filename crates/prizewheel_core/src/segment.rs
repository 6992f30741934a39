//! # Segment Set
//!
//! The ordered list of prize slots on the wheel.
//!
//! Order matters twice: it fixes where each segment sits on the wheel, and it
//! is the walk order the selector uses to accumulate weight. The two must never
//! disagree, so both are derived from the same `SegmentSet`.
//!
//! ## Layout
//!
//! ```text
//!            270° (pointer)
//!               │
//!     180° ─────┼───── 0°   segments laid out clockwise from 0°,
//!               │            each spanning weight / total * 360°
//!              90°
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{WheelError, WheelResult};

/// Full turn in degrees.
pub const FULL_TURN_DEG: f64 = 360.0;

/// One prize slot.
///
/// `weight` is the single canonical probability mass. Older configurations
/// named it `probability` or `spaceAmount`; both are accepted on input.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Display label ("10% OFF").
    #[serde(alias = "text")]
    pub label: String,
    /// Relative likelihood. Must be finite and > 0.
    #[serde(alias = "probability", alias = "space_amount", alias = "spaceAmount")]
    pub weight: f64,
    /// Opaque display token, passed through untouched.
    #[serde(default)]
    pub color: String,
}

impl Segment {
    /// Creates a new segment.
    #[must_use]
    pub fn new(label: impl Into<String>, weight: f64, color: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            weight,
            color: color.into(),
        }
    }
}

/// Angular span of one segment, in wheel-local degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SegmentArc {
    /// Inclusive start angle.
    pub start_deg: f64,
    /// Exclusive end angle.
    pub end_deg: f64,
}

impl SegmentArc {
    /// Angle halfway through the span.
    #[inline]
    #[must_use]
    pub fn midpoint(&self) -> f64 {
        (self.start_deg + self.end_deg) * 0.5
    }

    /// Width of the span in degrees.
    #[inline]
    #[must_use]
    pub fn span(&self) -> f64 {
        self.end_deg - self.start_deg
    }

    /// Returns true if `angle` (any real value, normalized first) lies in the span.
    #[must_use]
    pub fn contains(&self, angle: f64) -> bool {
        let a = normalize_degrees(angle);
        a >= self.start_deg && a < self.end_deg
    }
}

/// Reduces any angle to `[0, 360)`.
#[must_use]
pub fn normalize_degrees(angle: f64) -> f64 {
    let a = angle.rem_euclid(FULL_TURN_DEG);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if a >= FULL_TURN_DEG {
        0.0
    } else {
        a
    }
}

/// Validated, ordered collection of segments.
///
/// Construction is the only place weights are checked; a `SegmentSet` that
/// exists is always drawable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Segment>", into = "Vec<Segment>")]
pub struct SegmentSet {
    segments: Vec<Segment>,
    total_weight: f64,
}

impl SegmentSet {
    /// Validates and wraps a segment list.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if the list is empty, if any weight is
    /// not a finite positive number, or if the weights sum to infinity.
    pub fn new(segments: Vec<Segment>) -> WheelResult<Self> {
        if segments.is_empty() {
            return Err(WheelError::InvalidConfiguration(
                "segment list is empty".to_string(),
            ));
        }

        for (index, segment) in segments.iter().enumerate() {
            if !segment.weight.is_finite() || segment.weight <= 0.0 {
                return Err(WheelError::InvalidConfiguration(format!(
                    "segment {index} ({:?}) has non-positive weight {}",
                    segment.label, segment.weight
                )));
            }
        }

        let total_weight: f64 = segments.iter().map(|s| s.weight).sum();
        if !total_weight.is_finite() {
            return Err(WheelError::InvalidConfiguration(
                "segment weights overflow".to_string(),
            ));
        }

        Ok(Self {
            segments,
            total_weight,
        })
    }

    /// Sum of all weights.
    #[inline]
    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// Number of segments. Never zero.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false; kept for API symmetry with `len`.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segment at `index`.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    /// Segments in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Segment> {
        self.segments.iter()
    }

    /// Segments as a slice.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[Segment] {
        &self.segments
    }

    /// Probability of drawing segment `index`, or `None` if out of range.
    #[must_use]
    pub fn probability(&self, index: usize) -> Option<f64> {
        self.get(index).map(|s| s.weight / self.total_weight)
    }

    /// Angular spans of every segment, in order.
    ///
    /// The last span always ends at exactly 360° so the arcs tile the circle
    /// with no floating-point gap.
    #[must_use]
    pub fn arcs(&self) -> Vec<SegmentArc> {
        let last = self.segments.len() - 1;
        let mut cumulative = 0.0;
        self.segments
            .iter()
            .enumerate()
            .map(|(index, segment)| {
                let start_deg = cumulative / self.total_weight * FULL_TURN_DEG;
                cumulative += segment.weight;
                let end_deg = if index == last {
                    FULL_TURN_DEG
                } else {
                    cumulative / self.total_weight * FULL_TURN_DEG
                };
                SegmentArc { start_deg, end_deg }
            })
            .collect()
    }

    /// Angular span of segment `index`.
    #[must_use]
    pub fn arc(&self, index: usize) -> Option<SegmentArc> {
        if index >= self.segments.len() {
            return None;
        }
        self.arcs().get(index).copied()
    }

    /// Index of the segment covering wheel-local `angle`.
    #[must_use]
    pub fn index_at_angle(&self, angle: f64) -> usize {
        let a = normalize_degrees(angle);
        self.arcs()
            .iter()
            .position(|arc| a < arc.end_deg)
            .unwrap_or(self.segments.len() - 1)
    }
}

impl TryFrom<Vec<Segment>> for SegmentSet {
    type Error = WheelError;

    fn try_from(segments: Vec<Segment>) -> WheelResult<Self> {
        Self::new(segments)
    }
}

impl From<SegmentSet> for Vec<Segment> {
    fn from(set: SegmentSet) -> Self {
        set.segments
    }
}

impl<'a> IntoIterator for &'a SegmentSet {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn promo() -> SegmentSet {
        SegmentSet::new(vec![
            Segment::new("A", 30.0, "#8B5CF6"),
            Segment::new("B", 20.0, "#0EA5E9"),
            Segment::new("C", 10.0, "#10B981"),
            Segment::new("D", 40.0, "#6B7280"),
        ])
        .unwrap()
    }

    #[test]
    fn test_rejects_empty_list() {
        let err = SegmentSet::new(Vec::new()).unwrap_err();
        assert!(matches!(err, WheelError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_rejects_non_positive_weights() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let result = SegmentSet::new(vec![
                Segment::new("ok", 1.0, ""),
                Segment::new("bad", bad, ""),
            ]);
            assert!(
                matches!(result, Err(WheelError::InvalidConfiguration(_))),
                "weight {bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_overflowing_total() {
        let result = SegmentSet::new(vec![
            Segment::new("a", f64::MAX, ""),
            Segment::new("b", f64::MAX, ""),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_total_weight_and_order() {
        let set = promo();
        assert!((set.total_weight() - 100.0).abs() < 1e-12);
        let labels: Vec<&str> = set.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, ["A", "B", "C", "D"]);
        assert!((set.probability(3).unwrap() - 0.4).abs() < 1e-12);
        assert!(set.probability(4).is_none());
    }

    #[test]
    fn test_arcs_tile_the_circle() {
        let arcs = promo().arcs();
        assert_eq!(arcs.len(), 4);
        assert!(arcs[0].start_deg.abs() < f64::EPSILON);
        for pair in arcs.windows(2) {
            assert!((pair[0].end_deg - pair[1].start_deg).abs() < 1e-9);
        }
        assert!((arcs[3].end_deg - 360.0).abs() < f64::EPSILON);
        assert!((arcs[0].span() - 108.0).abs() < 1e-9);
        assert!((arcs[1].midpoint() - 144.0).abs() < 1e-9);
    }

    #[test]
    fn test_index_at_angle() {
        let set = promo();
        assert_eq!(set.index_at_angle(0.0), 0);
        assert_eq!(set.index_at_angle(107.9), 0);
        assert_eq!(set.index_at_angle(108.0), 1);
        assert_eq!(set.index_at_angle(200.0), 2);
        assert_eq!(set.index_at_angle(359.99), 3);
        assert_eq!(set.index_at_angle(-1.0), 3);
        assert_eq!(set.index_at_angle(720.0 + 150.0), 1);
    }

    #[test]
    fn test_normalize_degrees() {
        assert!((normalize_degrees(-90.0) - 270.0).abs() < 1e-12);
        assert!((normalize_degrees(725.0) - 5.0).abs() < 1e-12);
        assert!(normalize_degrees(-1e-18) < 360.0);
    }

    #[test]
    fn test_serde_accepts_legacy_weight_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            segments: SegmentSet,
        }

        let parsed: Wrapper = toml::from_str(
            r##"
            [[segments]]
            text = "10% OFF"
            probability = 30
            color = "#8B5CF6"

            [[segments]]
            label = "Try Again"
            spaceAmount = 70
            "##,
        )
        .unwrap();

        assert_eq!(parsed.segments.len(), 2);
        assert_eq!(parsed.segments.get(0).unwrap().label, "10% OFF");
        assert!((parsed.segments.total_weight() - 100.0).abs() < 1e-12);
        assert_eq!(parsed.segments.get(1).unwrap().color, "");
    }

    #[test]
    fn test_serde_validates_on_load() {
        #[derive(Debug, Deserialize)]
        struct Wrapper {
            #[allow(dead_code)]
            segments: SegmentSet,
        }

        let parsed: Result<Wrapper, _> = toml::from_str(
            r#"
            [[segments]]
            label = "free"
            weight = 0
            "#,
        );
        assert!(parsed.is_err());
    }
}
