//! Session state and core simulation types
//!
//! Everything a run mutates lives in `Session`; everything a tap reports
//! back to the host lives in `GameEvent`.

use serde::{Deserialize, Serialize};

use super::scoring::{LedgerRecord, PointsAward};
use crate::consts::*;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Marker sweeping, taps accepted
    Playing,
    /// Run ended on a miss, waiting for restart
    GameOver,
}

/// How a tap that missed the target is reported to the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissKind {
    /// Early, within the near-miss threshold
    SoClose,
    /// Late, within the near-miss threshold
    Almost,
    /// Early, clean miss
    TooEarly,
    /// Late, clean miss
    TooLate,
}

impl MissKind {
    pub fn classify(too_early: bool, near_miss: bool) -> Self {
        match (too_early, near_miss) {
            (true, true) => MissKind::SoClose,
            (false, true) => MissKind::Almost,
            (true, false) => MissKind::TooEarly,
            (false, false) => MissKind::TooLate,
        }
    }

    pub fn is_near_miss(&self) -> bool {
        matches!(self, MissKind::SoClose | MissKind::Almost)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MissKind::SoClose => "SO CLOSE!",
            MissKind::Almost => "ALMOST!",
            MissKind::TooEarly => "TOO EARLY",
            MissKind::TooLate => "TOO LATE",
        }
    }
}

/// Transient feedback text shown under the track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Feedback {
    Perfect,
    Miss(MissKind),
}

impl Feedback {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feedback::Perfect => "PERFECT!",
            Feedback::Miss(kind) => kind.as_str(),
        }
    }
}

/// Things that happened during a controller action, for audio and sync
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// Tap landed inside the target zone
    Hit { combo: u32, award: PointsAward },
    /// Combo reached the banner threshold
    ComboBanner(u32),
    /// Best score raised
    NewHighScore(u64),
    /// Tap missed; the run is over
    Miss { kind: MissKind, distance: f32 },
    /// Merged ledger record that should be written for this wallet
    LedgerSync { wallet: String, record: LedgerRecord },
    /// Fresh run started
    Restarted,
}

/// One run of the game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Points scored this run
    pub score: u64,
    /// Consecutive hits
    pub combo: u32,
    /// Marker speed multiplier
    pub speed: f32,
    /// Left edge of the marker, in [0, TRACK_LENGTH)
    pub marker_position: f32,
    /// Left edge of the target zone, in [0, TARGET_RANGE - TARGET_WIDTH]
    pub target_position: f32,
    /// Current phase
    pub phase: GamePhase,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(INITIAL_TARGET)
    }
}

impl Session {
    /// Fresh run with the target at the given position
    pub fn new(target_position: f32) -> Self {
        Self {
            score: 0,
            combo: 0,
            speed: INITIAL_SPEED,
            marker_position: 0.0,
            target_position,
            phase: GamePhase::Playing,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.phase == GamePhase::Playing
    }
}
