//! Points awarded per hit and the per-hit speed ramp
//!
//! Two scoring models coexist: the flat `Classic` model the game shipped
//! with, and a `Tiered` model with combo and speed bonuses. The host picks
//! one through `Settings::scoring`.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Tiered: base points for every hit
pub const TIERED_HIT_POINTS: u64 = 10;
/// Tiered: bonus per hit once the combo reaches `COMBO_BANNER_THRESHOLD`
pub const TIERED_COMBO_BONUS: u64 = 5;
/// Tiered: bonus per hit while speed is above `TIERED_SPEED_THRESHOLD`
pub const TIERED_SPEED_BONUS: u64 = 3;
/// Tiered: speed above which the speed bonus is paid
pub const TIERED_SPEED_THRESHOLD: f32 = 1.2;
/// Classic: combo at which a hit is worth two points
pub const CLASSIC_DOUBLE_COMBO: u32 = 5;

/// Scoring model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ScoringMode {
    /// +1 per hit, +2 from combo 5
    #[default]
    Classic,
    /// Base points plus combo and speed bonuses
    Tiered,
}

impl ScoringMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoringMode::Classic => "Classic",
            ScoringMode::Tiered => "Tiered",
        }
    }

    /// Points for a hit that brought the combo to `combo`, at `speed` (before the ramp)
    pub fn award(&self, combo: u32, speed: f32) -> PointsAward {
        match self {
            ScoringMode::Classic => PointsAward {
                perfect_hit: 1,
                combo_bonus: u64::from(combo >= CLASSIC_DOUBLE_COMBO),
                speed_bonus: 0,
            },
            ScoringMode::Tiered => PointsAward {
                perfect_hit: TIERED_HIT_POINTS,
                combo_bonus: if combo >= COMBO_BANNER_THRESHOLD {
                    TIERED_COMBO_BONUS
                } else {
                    0
                },
                speed_bonus: if speed > TIERED_SPEED_THRESHOLD {
                    TIERED_SPEED_BONUS
                } else {
                    0
                },
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown scoring mode {0:?} (expected classic or tiered)")]
pub struct UnknownScoringMode(pub String);

impl FromStr for ScoringMode {
    type Err = UnknownScoringMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "classic" | "flat" => Ok(ScoringMode::Classic),
            "tiered" | "bonus" => Ok(ScoringMode::Tiered),
            _ => Err(UnknownScoringMode(s.to_string())),
        }
    }
}

/// Points from a single hit, split by source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PointsAward {
    pub perfect_hit: u64,
    pub combo_bonus: u64,
    pub speed_bonus: u64,
}

impl PointsAward {
    pub fn total(&self) -> u64 {
        self.perfect_hit + self.combo_bonus + self.speed_bonus
    }
}

/// Accumulated points by source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsBreakdown {
    pub perfect_hits: u64,
    pub combo_bonus: u64,
    pub speed_bonus: u64,
}

impl PointsBreakdown {
    pub fn add_award(&mut self, award: &PointsAward) {
        self.perfect_hits += award.perfect_hit;
        self.combo_bonus += award.combo_bonus;
        self.speed_bonus += award.speed_bonus;
    }

    pub fn merge(&mut self, other: &PointsBreakdown) {
        self.perfect_hits += other.perfect_hits;
        self.combo_bonus += other.combo_bonus;
        self.speed_bonus += other.speed_bonus;
    }

    pub fn total(&self) -> u64 {
        self.perfect_hits + self.combo_bonus + self.speed_bonus
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Cumulative points for one wallet, as kept by the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerRecord {
    pub total_points: u64,
    #[serde(default)]
    pub breakdown: PointsBreakdown,
}

impl LedgerRecord {
    /// Fold a session's points into this record
    pub fn merge(&mut self, delta: &PointsBreakdown) {
        self.total_points += delta.total();
        self.breakdown.merge(delta);
    }
}

/// Speed increase for a hit scored with `score_before_hit` points already on the board
pub fn speed_increment(score_before_hit: u64) -> f32 {
    let ramp = BASE_SPEED_INCREMENT + score_before_hit as f32 * SPEED_INCREMENT_PER_POINT;
    ramp.min(MAX_SPEED_INCREMENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classic_award() {
        assert_eq!(ScoringMode::Classic.award(1, 0.7).total(), 1);
        assert_eq!(ScoringMode::Classic.award(4, 0.7).total(), 1);
        assert_eq!(ScoringMode::Classic.award(5, 0.7).total(), 2);
        assert_eq!(ScoringMode::Classic.award(9, 3.0).speed_bonus, 0);
    }

    #[test]
    fn test_tiered_award() {
        let first = ScoringMode::Tiered.award(1, 0.7);
        assert_eq!(first.combo_bonus, 0);
        assert_eq!(first.speed_bonus, 0);
        assert_eq!(first.total(), TIERED_HIT_POINTS);

        let combo = ScoringMode::Tiered.award(3, 0.7);
        assert_eq!(combo.combo_bonus, TIERED_COMBO_BONUS);

        let fast = ScoringMode::Tiered.award(2, 1.3);
        assert_eq!(fast.speed_bonus, TIERED_SPEED_BONUS);
        assert_eq!(fast.combo_bonus, 0);
    }

    #[test]
    fn test_parse_scoring_mode() {
        assert_eq!("Tiered".parse(), Ok(ScoringMode::Tiered));
        assert_eq!(" flat ".parse(), Ok(ScoringMode::Classic));
        assert_eq!(
            "hard".parse::<ScoringMode>(),
            Err(UnknownScoringMode("hard".to_string()))
        );
    }

    #[test]
    fn test_speed_increment_capped() {
        assert!((speed_increment(0) - 0.05).abs() < 1e-6);
        assert!((speed_increment(3) - 0.056).abs() < 1e-6);
        assert_eq!(speed_increment(6), MAX_SPEED_INCREMENT);
        assert_eq!(speed_increment(10_000), MAX_SPEED_INCREMENT);
    }

    #[test]
    fn test_ledger_merge() {
        let mut record = LedgerRecord {
            total_points: 40,
            breakdown: PointsBreakdown {
                perfect_hits: 30,
                combo_bonus: 10,
                speed_bonus: 0,
            },
        };
        let mut delta = PointsBreakdown::default();
        delta.add_award(&ScoringMode::Tiered.award(3, 1.5));
        record.merge(&delta);
        assert_eq!(record.total_points, 58);
        assert_eq!(record.breakdown.perfect_hits, 40);
        assert_eq!(record.breakdown.combo_bonus, 15);
        assert_eq!(record.breakdown.speed_bonus, 3);
    }

    #[test]
    fn test_ledger_record_json_shape() {
        let json = r#"{"totalPoints":12,"breakdown":{"perfectHits":10,"comboBonus":2,"speedBonus":0}}"#;
        let record: LedgerRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.total_points, 12);
        assert_eq!(record.breakdown.combo_bonus, 2);

        let bare: LedgerRecord = serde_json::from_str(r#"{"totalPoints":3}"#).unwrap();
        assert!(bare.breakdown.is_empty());
    }
}
