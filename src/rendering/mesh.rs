//! Unit shape instanced once per particle.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Flat-shaded vertex of the particle shape
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ShapeVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl ShapeVertex {
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
            wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ShapeVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// Octahedron with per-face normals (8 faces, 24 vertices, CCW outward)
pub fn octahedron() -> Vec<ShapeVertex> {
    let tips = [Vec3::Y, Vec3::NEG_Y];
    let ring = [Vec3::X, Vec3::NEG_Z, Vec3::NEG_X, Vec3::Z];

    let mut vertices = Vec::with_capacity(24);
    for tip in tips {
        for i in 0..ring.len() {
            let (a, b) = (ring[i], ring[(i + 1) % ring.len()]);
            // Bottom faces wind the other way to stay outward-facing
            let (a, b) = if tip.y < 0.0 { (b, a) } else { (a, b) };
            let normal = (a - tip).cross(b - tip).normalize();
            for p in [tip, a, b] {
                vertices.push(ShapeVertex {
                    position: p.to_array(),
                    normal: normal.to_array(),
                });
            }
        }
    }
    vertices
}
