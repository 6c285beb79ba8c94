//! HUD projection
//!
//! `HudView` is a pure read of the controller: the browser layer copies it
//! into the DOM and the renderer turns its track part into geometry.

mod hud;

pub use hud::{FeedbackTone, HudView, TrackView};
