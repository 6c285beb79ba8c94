//! Shape generation for the track
//!
//! Geometry is built in track space: x runs 0..TRACK_LENGTH along the
//! track, y runs 0..TRACK_HEIGHT across it.

use glam::Vec2;

use super::vertex::{Vertex, colors};
use crate::consts::TRACK_LENGTH;
use crate::ui::TrackView;

/// Track thickness in track units
pub const TRACK_HEIGHT: f32 = 20.0;
/// Border thickness around the track
pub const BORDER: f32 = 0.6;
/// Peak horizontal shake offset
pub const SHAKE_AMPLITUDE: f32 = 1.5;

/// Generate vertices for an axis-aligned rectangle
pub fn rect(min: Vec2, max: Vec2, color: [f32; 4]) -> Vec<Vertex> {
    vec![
        Vertex::new(min.x, min.y, color),
        Vertex::new(max.x, min.y, color),
        Vertex::new(min.x, max.y, color),
        Vertex::new(min.x, max.y, color),
        Vertex::new(max.x, min.y, color),
        Vertex::new(max.x, max.y, color),
    ]
}

/// Generate vertices for a hollow rectangle of the given thickness
pub fn frame(min: Vec2, max: Vec2, thickness: f32, color: [f32; 4]) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity(24);
    // Bottom, top, left, right
    vertices.extend(rect(min, Vec2::new(max.x, min.y + thickness), color));
    vertices.extend(rect(Vec2::new(min.x, max.y - thickness), max, color));
    vertices.extend(rect(
        Vec2::new(min.x, min.y + thickness),
        Vec2::new(min.x + thickness, max.y - thickness),
        color,
    ));
    vertices.extend(rect(
        Vec2::new(max.x - thickness, min.y + thickness),
        Vec2::new(max.x, max.y - thickness),
        color,
    ));
    vertices
}

/// A horizontal span of the track, clipped to the track ends; None if fully outside
fn clipped_band(start: f32, width: f32, inset: f32) -> Option<(Vec2, Vec2)> {
    let x0 = start.max(0.0);
    let x1 = (start + width).min(TRACK_LENGTH);
    if x1 <= x0 {
        return None;
    }
    Some((Vec2::new(x0, inset), Vec2::new(x1, TRACK_HEIGHT - inset)))
}

/// Horizontal shake offset for a miss, decaying over the shake window
///
/// `t` is normalized time since the miss (0 = just missed, 1 = done).
pub fn shake_offset(t: f32) -> f32 {
    if !(0.0..1.0).contains(&t) {
        return 0.0;
    }
    let decay = 1.0 - t;
    (t * std::f32::consts::TAU * 5.0).sin() * SHAKE_AMPLITUDE * decay
}

/// Generate the whole track scene: background, glow, target zone, marker
pub fn track_scene(track: &TrackView, shake_t: Option<f32>) -> Vec<Vertex> {
    let dx = shake_t.map(shake_offset).unwrap_or(0.0);
    let mut vertices = Vec::with_capacity(64);

    let min = Vec2::new(0.0, 0.0);
    let max = Vec2::new(TRACK_LENGTH, TRACK_HEIGHT);
    vertices.extend(rect(min, max, colors::TRACK));

    if track.glow {
        let pad = Vec2::splat(BORDER * 2.0);
        vertices.extend(frame(min - pad, max + pad, BORDER * 2.0, colors::PERFECT_GLOW));
    }
    vertices.extend(frame(min, max, BORDER, colors::TRACK_BORDER));

    if let Some((lo, hi)) = clipped_band(track.target_start, track.target_width, BORDER) {
        vertices.extend(rect(
            lo - Vec2::new(0.4, 0.0),
            hi + Vec2::new(0.4, 0.0),
            colors::TARGET_GLOW,
        ));
        vertices.extend(rect(lo, hi, colors::TARGET));
    }

    if let Some((lo, hi)) = clipped_band(track.marker_start, track.marker_width, BORDER) {
        vertices.extend(rect(
            lo - Vec2::new(0.6, 0.0),
            hi + Vec2::new(0.6, 0.0),
            colors::MARKER_GLOW,
        ));
        vertices.extend(rect(lo, hi, colors::MARKER));
    }

    if dx != 0.0 {
        for v in &mut vertices {
            v.position[0] += dx;
        }
    }

    vertices
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(marker: f32) -> TrackView {
        TrackView {
            marker_start: marker,
            marker_width: 2.5,
            target_start: 30.0,
            target_width: 14.0,
            glow: false,
            shake: false,
        }
    }

    #[test]
    fn test_rect_is_two_triangles() {
        let v = rect(Vec2::ZERO, Vec2::new(2.0, 1.0), colors::MARKER);
        assert_eq!(v.len(), 6);
        assert_eq!(v[5].position, [2.0, 1.0]);
    }

    #[test]
    fn test_scene_counts() {
        // background + border frame + target (glow, body) + marker (glow, body)
        let plain = track_scene(&track(10.0), None);
        assert_eq!(plain.len(), 6 + 24 + 12 + 12);

        let glowing = track_scene(
            &TrackView {
                glow: true,
                ..track(10.0)
            },
            None,
        );
        assert_eq!(glowing.len(), plain.len() + 24);
    }

    #[test]
    fn test_marker_clipped_at_track_end() {
        let scene = track_scene(&track(99.0), None);
        let max_x = scene
            .iter()
            .filter(|v| v.color == colors::MARKER)
            .map(|v| v.position[0])
            .fold(f32::MIN, f32::max);
        assert!(max_x <= TRACK_LENGTH);
    }

    #[test]
    fn test_shake_settles() {
        assert_eq!(shake_offset(1.0), 0.0);
        assert_eq!(shake_offset(-0.1), 0.0);
        assert!(shake_offset(0.05).abs() <= SHAKE_AMPLITUDE);
        let still = track_scene(&track(10.0), Some(1.0));
        assert_eq!(still, track_scene(&track(10.0), None));
    }
}
