//! Track geometry: spans, overlap testing, miss classification and target re-rolls
//!
//! All positions are in track units (see `crate::consts`).

use rand::Rng;

use super::state::MissKind;
use crate::consts::*;
use crate::wrapped_distance;

/// Attempts at drawing a far-enough target before falling back to the farthest end
const REROLL_ATTEMPTS: u32 = 64;

/// A closed interval on the track
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub start: f32,
    pub end: f32,
}

impl Span {
    pub fn new(start: f32, width: f32) -> Self {
        Self {
            start,
            end: start + width,
        }
    }

    /// The marker span starting at `position`
    pub fn marker(position: f32) -> Self {
        Self::new(position, INDICATOR_WIDTH)
    }

    /// The target zone starting at `position`
    pub fn target(position: f32) -> Self {
        Self::new(position, TARGET_WIDTH)
    }

    pub fn contains(&self, x: f32) -> bool {
        x >= self.start && x <= self.end
    }

    pub fn center(&self) -> f32 {
        (self.start + self.end) * 0.5
    }
}

/// Result of testing a marker against the target zone
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TapResult {
    Hit,
    Miss { kind: MissKind, distance: f32 },
}

/// Inclusive overlap test between the marker and the target zone
///
/// Covers marker start inside the target, marker end inside the target,
/// and the marker spanning the whole target.
pub fn spans_overlap(marker: Span, target: Span) -> bool {
    target.contains(marker.start)
        || target.contains(marker.end)
        || (marker.start <= target.start && marker.end >= target.end)
}

/// Judge a tap with the marker at `marker_position` and the target at `target_position`
pub fn judge_tap(marker_position: f32, target_position: f32) -> TapResult {
    let marker = Span::marker(marker_position);
    let target = Span::target(target_position);

    if spans_overlap(marker, target) {
        return TapResult::Hit;
    }

    let too_early = marker.start < target.start;
    let distance = if too_early {
        target.start - marker.end
    } else {
        marker.start - target.end
    };
    let near_miss = distance.abs() < NEAR_MISS_THRESHOLD;

    TapResult::Miss {
        kind: MissKind::classify(too_early, near_miss),
        distance,
    }
}

/// Exclusive upper bound for a target start
#[inline]
pub fn max_target_start() -> f32 {
    TARGET_RANGE - TARGET_WIDTH
}

/// Pick a new target start at least `TARGET_MIN_DISTANCE` (wrapped) from `previous`
///
/// Rejection-samples the legal range; if sampling keeps landing too close,
/// the end of the range farthest from `previous` is used instead.
pub fn reroll_target<R: Rng + ?Sized>(previous: f32, rng: &mut R) -> f32 {
    let max_start = max_target_start();

    for _ in 0..REROLL_ATTEMPTS {
        let candidate = rng.random_range(0.0..max_start);
        if wrapped_distance(candidate, previous) >= TARGET_MIN_DISTANCE {
            return candidate;
        }
    }

    log::debug!("Target re-roll fell back after {} attempts", REROLL_ATTEMPTS);
    if wrapped_distance(0.0, previous) >= wrapped_distance(max_start, previous) {
        0.0
    } else {
        max_start
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_marker_at_target_start_hits() {
        assert_eq!(judge_tap(30.0, 30.0), TapResult::Hit);
    }

    #[test]
    fn test_marker_end_inside_target_hits() {
        // Marker [28, 30.5] pokes into [30, 44]
        assert_eq!(judge_tap(28.0, 30.0), TapResult::Hit);
    }

    #[test]
    fn test_marker_on_target_end_boundary_hits() {
        assert_eq!(judge_tap(44.0, 30.0), TapResult::Hit);
    }

    #[test]
    fn test_marker_spanning_target_hits() {
        let marker = Span::new(10.0, 30.0);
        let target = Span::new(15.0, 5.0);
        assert!(spans_overlap(marker, target));
    }

    #[test]
    fn test_too_early_clean_miss() {
        match judge_tap(10.0, 30.0) {
            TapResult::Miss { kind, distance } => {
                assert_eq!(kind, MissKind::TooEarly);
                assert!((distance - 17.5).abs() < 1e-4);
            }
            TapResult::Hit => panic!("expected a miss"),
        }
    }

    #[test]
    fn test_late_near_miss() {
        match judge_tap(46.0, 30.0) {
            TapResult::Miss { kind, distance } => {
                assert_eq!(kind, MissKind::Almost);
                assert!((distance - 2.0).abs() < 1e-4);
            }
            TapResult::Hit => panic!("expected a miss"),
        }
    }

    #[test]
    fn test_early_near_miss() {
        // Marker [24, 26.5], gap of 3.5 before 30
        match judge_tap(24.0, 30.0) {
            TapResult::Miss { kind, .. } => assert_eq!(kind, MissKind::SoClose),
            TapResult::Hit => panic!("expected a miss"),
        }
    }

    #[test]
    fn test_late_clean_miss() {
        match judge_tap(70.0, 30.0) {
            TapResult::Miss { kind, distance } => {
                assert_eq!(kind, MissKind::TooLate);
                assert!((distance - 26.0).abs() < 1e-4);
            }
            TapResult::Hit => panic!("expected a miss"),
        }
    }

    #[test]
    fn test_reroll_stays_in_range() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut target = INITIAL_TARGET;
        for _ in 0..500 {
            target = reroll_target(target, &mut rng);
            assert!(target >= 0.0 && target <= max_target_start());
        }
    }

    proptest! {
        #[test]
        fn prop_overlap_matches_interval_intersection(
            a in 0.0f32..100.0,
            wa in 0.5f32..30.0,
            b in 0.0f32..100.0,
            wb in 0.5f32..30.0,
        ) {
            let m = Span::new(a, wa);
            let t = Span::new(b, wb);
            let intersects = m.start <= t.end && t.start <= m.end;
            prop_assert_eq!(spans_overlap(m, t), intersects);
        }

        #[test]
        fn prop_overlap_is_symmetric(
            a in 0.0f32..100.0,
            wa in 0.5f32..30.0,
            b in 0.0f32..100.0,
            wb in 0.5f32..30.0,
        ) {
            let m = Span::new(a, wa);
            let t = Span::new(b, wb);
            prop_assert_eq!(spans_overlap(m, t), spans_overlap(t, m));
        }

        #[test]
        fn prop_disjoint_spans_never_overlap(
            a in 0.0f32..50.0,
            wa in 0.5f32..20.0,
            gap in 0.01f32..20.0,
            wb in 0.5f32..20.0,
        ) {
            let left = Span::new(a, wa);
            let right = Span::new(left.end + gap, wb);
            prop_assert!(!spans_overlap(left, right));
            prop_assert!(!spans_overlap(right, left));
        }

        #[test]
        fn prop_reroll_keeps_min_distance(seed in any::<u64>(), previous in 0.0f32..71.0) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let next = reroll_target(previous, &mut rng);
            prop_assert!(wrapped_distance(next, previous) >= TARGET_MIN_DISTANCE);
        }
    }
}
