//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time only advances through explicit millisecond deltas
//! - Seeded RNG only
//! - No rendering or platform dependencies

pub mod scoring;
pub mod state;
pub mod tick;
pub mod timers;
pub mod track;

pub use scoring::{LedgerRecord, PointsAward, PointsBreakdown, ScoringMode, UnknownScoringMode, speed_increment};
pub use state::{Feedback, GameEvent, GamePhase, MissKind, Session};
pub use tick::{TapOutcome, advance_marker, apply_tap, restart};
pub use timers::{TimerKind, Timers};
pub use track::{Span, TapResult, judge_tap, reroll_target, spans_overlap};
