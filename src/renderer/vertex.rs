//! Vertex types for 2D rendering

use bytemuck::{Pod, Zeroable};

/// Track vertex: position (track space until uploaded, then NDC) and RGBA
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }

    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x4];

    /// Buffer layout matching `shader.wgsl`
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Colors for game elements
pub mod colors {
    pub const TRACK: [f32; 4] = [1.0, 1.0, 1.0, 0.04];
    pub const TRACK_BORDER: [f32; 4] = [1.0, 1.0, 1.0, 0.15];
    pub const TARGET: [f32; 4] = [0.0, 1.0, 0.533, 1.0]; // #00ff88
    pub const TARGET_GLOW: [f32; 4] = [0.0, 1.0, 0.533, 0.35];
    pub const MARKER: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
    pub const MARKER_GLOW: [f32; 4] = [1.0, 1.0, 1.0, 0.3];
    pub const PERFECT_GLOW: [f32; 4] = [0.0, 1.0, 0.533, 0.25];
    pub const BACKGROUND: [f32; 4] = [0.039, 0.039, 0.122, 1.0]; // #0a0a1f
}
