//! One Tap Too Late - a single-screen reflex timing game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (marker sweep, overlap, scoring, timers)
//! - `controller`: Game loop controller owning the session
//! - `renderer`: WebGPU rendering of the track
//! - `platform`: Browser/native platform abstraction (wallet provider)
//! - `persistence`: Local best-score store and the remote points ledger
//! - `ui`: Read-only HUD projection

#[cfg(target_arch = "wasm32")]
pub mod audio;
pub mod controller;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod ui;

pub use controller::GameController;
pub use highscores::HighScore;
pub use settings::Settings;

/// Game configuration constants
///
/// Positions and widths are in track units: the track is 100 units long.
pub mod consts {
    /// Track length; marker positions wrap modulo this value
    pub const TRACK_LENGTH: f32 = 100.0;
    /// Target zone width
    pub const TARGET_WIDTH: f32 = 14.0;
    /// Marker (indicator) width
    pub const INDICATOR_WIDTH: f32 = 2.5;
    /// Rightmost extent of the target zone; target start lies in [0, TARGET_RANGE - TARGET_WIDTH)
    pub const TARGET_RANGE: f32 = 85.0;
    /// Target start on a fresh page load
    pub const INITIAL_TARGET: f32 = 30.0;
    /// Minimum wrapped distance between consecutive target positions
    pub const TARGET_MIN_DISTANCE: f32 = 25.0;
    /// A miss closer than this is a near miss
    pub const NEAR_MISS_THRESHOLD: f32 = 6.0;

    /// Marker speed at the start of a run
    pub const INITIAL_SPEED: f32 = 0.7;
    /// Track units per millisecond per unit of speed
    pub const SPEED_SCALE: f32 = 0.065;
    /// Per-hit speed increase never exceeds this
    pub const MAX_SPEED_INCREMENT: f32 = 0.06;
    /// Per-hit speed increase before the score term
    pub const BASE_SPEED_INCREMENT: f32 = 0.05;
    /// Per-hit speed increase added per point of score
    pub const SPEED_INCREMENT_PER_POINT: f32 = 0.002;

    /// Delay before taps are accepted again after a hit
    pub const REARM_DELAY_MS: f64 = 80.0;
    /// How long hit feedback stays on screen
    pub const FEEDBACK_CLEAR_MS: f64 = 350.0;
    /// How long the combo banner stays on screen
    pub const COMBO_BANNER_MS: f64 = 600.0;
    /// Combo at which the banner (and tiered combo bonus) kicks in
    pub const COMBO_BANNER_THRESHOLD: u32 = 3;
    /// Screen shake after a miss
    pub const SHAKE_MS: f64 = 500.0;
    /// Instructions hide themselves after this long
    pub const INSTRUCTIONS_MS: f64 = 4000.0;

    /// Longest frame delta the browser loop feeds into a tick
    pub const MAX_FRAME_DELTA_MS: f64 = 100.0;
}

/// Wrap a track position into [0, TRACK_LENGTH)
#[inline]
pub fn wrap_position(pos: f32) -> f32 {
    let wrapped = pos.rem_euclid(consts::TRACK_LENGTH);
    // rem_euclid can round up to exactly TRACK_LENGTH for tiny negatives
    if wrapped >= consts::TRACK_LENGTH {
        0.0
    } else {
        wrapped
    }
}

/// Shortest distance between two positions on the wrapped track
#[inline]
pub fn wrapped_distance(a: f32, b: f32) -> f32 {
    let d = (a - b).abs().rem_euclid(consts::TRACK_LENGTH);
    d.min(consts::TRACK_LENGTH - d)
}
