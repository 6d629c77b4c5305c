//! Per-particle GPU instance data.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};

/// Model matrix + colour for one instanced shape
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct InstanceRaw {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
}

impl InstanceRaw {
    pub fn new(translation: Vec3, rotation: Quat, scale: Vec3, color: [f32; 4]) -> Self {
        Self {
            model: Mat4::from_scale_rotation_translation(scale, rotation, translation)
                .to_cols_array_2d(),
            color,
        }
    }

    pub fn translation(&self) -> Vec3 {
        Vec3::new(self.model[3][0], self.model[3][1], self.model[3][2])
    }
}

/// CPU-side instance buffer, sized once to the particle pool
#[derive(Debug, Clone)]
pub struct InstanceBuffer {
    instances: Vec<InstanceRaw>,
}

impl InstanceBuffer {
    pub fn new(count: usize) -> Self {
        Self {
            instances: vec![InstanceRaw::zeroed(); count],
        }
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn as_slice(&self) -> &[InstanceRaw] {
        &self.instances
    }

    pub fn as_mut_slice(&mut self) -> &mut [InstanceRaw] {
        &mut self.instances
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }
}
