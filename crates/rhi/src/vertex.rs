//! Vertex format and its pipeline input description.

use std::mem::offset_of;

use ash::vk;
use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Position and color, both `vec3` in the vertex shader.
///
/// | location | field      | format             | offset |
/// |----------|------------|--------------------|--------|
/// | 0        | `position` | `R32G32B32_SFLOAT` | 0      |
/// | 1        | `color`    | `R32G32B32_SFLOAT` | 12     |
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec3,
    pub color: Vec3,
}

impl Vertex {
    #[inline]
    pub const fn new(position: Vec3, color: Vec3) -> Self {
        Self { position, color }
    }

    /// Per-vertex binding 0, tightly packed.
    pub fn binding_description() -> vk::VertexInputBindingDescription {
        vk::VertexInputBindingDescription {
            binding: 0,
            stride: std::mem::size_of::<Self>() as u32,
            input_rate: vk::VertexInputRate::VERTEX,
        }
    }

    pub fn attribute_descriptions() -> [vk::VertexInputAttributeDescription; 2] {
        [
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: offset_of!(Vertex, position) as u32,
            },
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 1,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: offset_of!(Vertex, color) as u32,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_size() {
        assert_eq!(std::mem::size_of::<Vertex>(), 24);
    }

    #[test]
    fn test_binding_description() {
        let binding = Vertex::binding_description();
        assert_eq!(binding.binding, 0);
        assert_eq!(binding.stride, 24);
        assert_eq!(binding.input_rate, vk::VertexInputRate::VERTEX);
    }

    #[test]
    fn test_attribute_descriptions() {
        let attrs = Vertex::attribute_descriptions();

        assert_eq!(attrs[0].location, 0);
        assert_eq!(attrs[0].offset, 0);
        assert_eq!(attrs[0].format, vk::Format::R32G32B32_SFLOAT);

        assert_eq!(attrs[1].location, 1);
        assert_eq!(attrs[1].offset, 12);
        assert_eq!(attrs[1].format, vk::Format::R32G32B32_SFLOAT);

        assert!(attrs.iter().all(|a| a.binding == 0));
    }

    #[test]
    fn test_vertex_bytes() {
        let vertices = [Vertex::new(Vec3::new(1.0, 2.0, 3.0), Vec3::X)];
        let bytes: &[u8] = bytemuck::cast_slice(&vertices);
        assert_eq!(bytes.len(), 24);
        assert_eq!(&bytes[0..4], &1.0f32.to_ne_bytes());
    }
}
