//! WebGPU rendering module
//!
//! The track is plain colored quads built in track space (`shapes`) and
//! mapped to the viewport by `RenderState`.

pub mod pipeline;
pub mod shapes;
pub mod vertex;

pub use pipeline::{RenderState, track_to_ndc};
pub use shapes::{TRACK_HEIGHT, track_scene};
pub use vertex::Vertex;
