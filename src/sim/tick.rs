//! Session transitions: marker sweep, tap judgement and restart
//!
//! Pure functions over `Session`; timers, feedback and persistence are the
//! controller's business.

use rand::Rng;

use super::scoring::{PointsAward, ScoringMode, speed_increment};
use super::state::{GamePhase, MissKind, Session};
use super::track::{TapResult, judge_tap, reroll_target};
use crate::consts::*;
use crate::wrap_position;

/// What a tap did to the session
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TapOutcome {
    Hit {
        /// Combo after this hit
        combo: u32,
        award: PointsAward,
    },
    Miss {
        kind: MissKind,
        distance: f32,
    },
}

/// Advance the marker by `dt_ms` milliseconds of play
pub fn advance_marker(session: &mut Session, dt_ms: f64) {
    if session.phase != GamePhase::Playing {
        return;
    }
    let travel = session.speed * dt_ms as f32 * SPEED_SCALE;
    session.marker_position = wrap_position(session.marker_position + travel);
}

/// Judge a tap at the current marker position and apply its consequences
///
/// Returns `None` when the session is not accepting taps.
pub fn apply_tap<R: Rng + ?Sized>(
    session: &mut Session,
    scoring: ScoringMode,
    rng: &mut R,
) -> Option<TapOutcome> {
    if session.phase != GamePhase::Playing {
        return None;
    }

    match judge_tap(session.marker_position, session.target_position) {
        TapResult::Hit => {
            session.combo += 1;
            let award = scoring.award(session.combo, session.speed);
            let increment = speed_increment(session.score);
            session.score += award.total();
            session.speed += increment;
            session.target_position = reroll_target(session.target_position, rng);
            Some(TapOutcome::Hit {
                combo: session.combo,
                award,
            })
        }
        TapResult::Miss { kind, distance } => {
            session.combo = 0;
            session.phase = GamePhase::GameOver;
            Some(TapOutcome::Miss { kind, distance })
        }
    }
}

/// Replace the session with a fresh run and a re-rolled target
pub fn restart<R: Rng + ?Sized>(session: &mut Session, rng: &mut R) {
    let target = reroll_target(session.target_position, rng);
    *session = Session::new(target);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wrapped_distance;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn session_at(marker: f32, target: f32) -> Session {
        Session {
            marker_position: marker,
            target_position: target,
            ..Session::default()
        }
    }

    #[test]
    fn test_marker_advances_and_wraps() {
        let mut session = Session::default();
        advance_marker(&mut session, 100.0);
        // 0.7 * 100 * 0.065
        assert!((session.marker_position - 4.55).abs() < 1e-4);

        session.marker_position = 99.0;
        advance_marker(&mut session, 100.0);
        assert!((session.marker_position - 3.55).abs() < 1e-3);
        assert!(session.marker_position < TRACK_LENGTH);
    }

    #[test]
    fn test_marker_frozen_after_game_over() {
        let mut session = session_at(12.0, 30.0);
        session.phase = GamePhase::GameOver;
        advance_marker(&mut session, 500.0);
        assert_eq!(session.marker_position, 12.0);
    }

    #[test]
    fn test_hit_at_target_start() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut session = session_at(30.0, 30.0);
        let outcome = apply_tap(&mut session, ScoringMode::Tiered, &mut rng);

        match outcome {
            Some(TapOutcome::Hit { combo, award }) => {
                assert_eq!(combo, 1);
                assert_eq!(award.combo_bonus, 0);
            }
            other => panic!("expected a hit, got {:?}", other),
        }
        assert_eq!(session.combo, 1);
        assert!(session.is_playing());
        assert!((session.speed - (INITIAL_SPEED + 0.05)).abs() < 1e-6);
        assert!(wrapped_distance(session.target_position, 30.0) >= TARGET_MIN_DISTANCE);
    }

    #[test]
    fn test_early_miss_ends_run() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut session = session_at(10.0, 30.0);
        session.combo = 4;
        let outcome = apply_tap(&mut session, ScoringMode::Classic, &mut rng);

        match outcome {
            Some(TapOutcome::Miss { kind, distance }) => {
                assert_eq!(kind, MissKind::TooEarly);
                assert!((distance - 17.5).abs() < 1e-4);
            }
            other => panic!("expected a miss, got {:?}", other),
        }
        assert_eq!(session.combo, 0);
        assert_eq!(session.phase, GamePhase::GameOver);
        assert_eq!(session.target_position, 30.0);
    }

    #[test]
    fn test_late_near_miss() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut session = session_at(46.0, 30.0);
        let outcome = apply_tap(&mut session, ScoringMode::Classic, &mut rng);
        assert!(matches!(
            outcome,
            Some(TapOutcome::Miss {
                kind: MissKind::Almost,
                ..
            })
        ));
    }

    #[test]
    fn test_tap_ignored_after_game_over() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut session = session_at(30.0, 30.0);
        session.phase = GamePhase::GameOver;
        assert_eq!(apply_tap(&mut session, ScoringMode::Classic, &mut rng), None);
        assert_eq!(session.score, 0);
    }

    #[test]
    fn test_restart_resets_everything() {
        let mut rng = Pcg32::seed_from_u64(9);
        let mut session = Session {
            score: 41,
            combo: 12,
            speed: 2.3,
            marker_position: 77.0,
            target_position: 50.0,
            phase: GamePhase::GameOver,
        };
        restart(&mut session, &mut rng);

        assert_eq!(session.score, 0);
        assert_eq!(session.combo, 0);
        assert_eq!(session.speed, INITIAL_SPEED);
        assert_eq!(session.marker_position, 0.0);
        assert_eq!(session.phase, GamePhase::Playing);
        assert!(wrapped_distance(session.target_position, 50.0) >= TARGET_MIN_DISTANCE);
    }

    proptest! {
        #[test]
        fn prop_speed_ramp_bounded(seed in any::<u64>(), hits in 1usize..60, tiered in any::<bool>()) {
            let scoring = if tiered { ScoringMode::Tiered } else { ScoringMode::Classic };
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut session = Session::default();
            let mut last_speed = session.speed;

            for _ in 0..hits {
                session.marker_position = session.target_position + 1.0;
                let outcome = apply_tap(&mut session, scoring, &mut rng);
                let is_hit = matches!(outcome, Some(TapOutcome::Hit { .. }));
                prop_assert!(is_hit, "tap inside the target should hit");
                prop_assert!(session.speed >= last_speed);
                last_speed = session.speed;
            }

            let bound = INITIAL_SPEED + hits as f32 * MAX_SPEED_INCREMENT;
            prop_assert!(session.speed <= bound + 1e-4);
            prop_assert_eq!(session.combo as usize, hits);
        }

        #[test]
        fn prop_restart_is_total(
            seed in any::<u64>(),
            score in 0u64..10_000,
            combo in 0u32..500,
            speed in 0.7f32..10.0,
            marker in 0.0f32..100.0,
        ) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut session = Session {
                score,
                combo,
                speed,
                marker_position: marker,
                target_position: 20.0,
                phase: GamePhase::GameOver,
            };
            restart(&mut session, &mut rng);
            prop_assert_eq!(session.score, 0);
            prop_assert_eq!(session.combo, 0);
            prop_assert_eq!(session.speed, INITIAL_SPEED);
            prop_assert_eq!(session.phase, GamePhase::Playing);
        }
    }
}
