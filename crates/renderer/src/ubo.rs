//! Uniform buffer object definitions for shaders.
//!
//! These structures must match the WGSL uniform layouts in `shaders/`
//! exactly. All structures use `#[repr(C)]` for predictable memory layout and
//! implement `Pod` and `Zeroable` for safe byte casting.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// Rotation speed of the cube, in degrees per second.
pub const SPIN_DEGREES_PER_SECOND: f32 = 90.0;

/// Eye position of the fixed camera.
pub const EYE: Vec3 = Vec3::new(2.0, 2.0, 2.0);

/// Vertical field of view, in degrees.
pub const FOV_Y_DEGREES: f32 = 45.0;

pub const Z_NEAR: f32 = 0.1;
pub const Z_FAR: f32 = 10.0;

/// Model, view and projection transforms.
///
/// This structure matches the WGSL `Transform` uniform (group 0, binding 0).
///
/// # Memory Layout
///
/// - Offset 0: model matrix (64 bytes)
/// - Offset 64: view matrix (64 bytes)
/// - Offset 128: projection matrix (64 bytes)
/// - Total size: 192 bytes
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct TransformUbo {
    /// Object to world space.
    pub model: Mat4,
    /// World to view space.
    pub view: Mat4,
    /// View to clip space, Y flipped for Vulkan.
    pub proj: Mat4,
}

impl TransformUbo {
    /// Size of the struct in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Transforms of the cube `elapsed_secs` after start, for a framebuffer
    /// with the given aspect ratio.
    ///
    /// The cube spins about the world Z axis and is viewed from [`EYE`]
    /// looking at the origin with Z up.
    pub fn spinning(elapsed_secs: f32, aspect: f32) -> Self {
        let model = Mat4::from_rotation_z(elapsed_secs * SPIN_DEGREES_PER_SECOND.to_radians());
        let view = Mat4::look_at_rh(EYE, Vec3::ZERO, Vec3::Z);
        Self {
            model,
            view,
            proj: vulkan_perspective(aspect),
        }
    }
}

/// Right-handed perspective with a [0, 1] depth range and clip-space Y
/// pointing down.
pub fn vulkan_perspective(aspect: f32) -> Mat4 {
    let mut proj = Mat4::perspective_rh(FOV_Y_DEGREES.to_radians(), aspect, Z_NEAR, Z_FAR);
    proj.y_axis.y *= -1.0;
    proj
}

/// Aspect ratio of a `width` x `height` framebuffer. Degenerate sizes yield 1.
pub fn aspect_ratio(width: u32, height: u32) -> f32 {
    if width == 0 || height == 0 {
        1.0
    } else {
        width as f32 / height as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_transform_ubo_size() {
        // 3 Mat4 (3 * 64) = 192 bytes
        assert_eq!(TransformUbo::SIZE, 192);
    }

    #[test]
    fn test_transform_ubo_alignment() {
        assert_eq!(std::mem::align_of::<TransformUbo>(), 16);
    }

    #[test]
    fn test_ubo_pod_zeroable() {
        let ubo = TransformUbo::spinning(0.0, 1.0);
        let bytes: &[u8] = bytemuck::bytes_of(&ubo);
        assert_eq!(bytes.len(), TransformUbo::SIZE);
        // Column-major, model first.
        let first: &[f32] = bytemuck::cast_slice(&bytes[..16]);
        assert_eq!(first, &[1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_spin_is_quarter_turn_per_second() {
        let ubo = TransformUbo::spinning(1.0, 1.0);
        let x = ubo.model.transform_vector3(Vec3::X);
        assert!((x - Vec3::Y).length() < EPSILON);

        let z = ubo.model.transform_vector3(Vec3::Z);
        assert!((z - Vec3::Z).length() < EPSILON);
    }

    #[test]
    fn test_view_looks_at_origin() {
        let ubo = TransformUbo::spinning(0.0, 1.0);
        let eye_in_view = ubo.view.transform_point3(EYE);
        assert!(eye_in_view.length() < EPSILON);

        // The origin lies straight ahead, on the -Z axis of view space.
        let origin = ubo.view.transform_point3(Vec3::ZERO);
        assert!(origin.x.abs() < EPSILON);
        assert!(origin.y.abs() < EPSILON);
        assert!((origin.z + EYE.length()).abs() < EPSILON);
    }

    #[test]
    fn test_projection_flips_y_and_maps_depth_to_unit_range() {
        let proj = vulkan_perspective(1.0);

        let above = proj * Vec4::new(0.0, 1.0, -2.0, 1.0);
        assert!(above.y / above.w < 0.0);

        let near = proj * Vec4::new(0.0, 0.0, -Z_NEAR, 1.0);
        assert!((near.z / near.w).abs() < EPSILON);

        let far = proj * Vec4::new(0.0, 0.0, -Z_FAR, 1.0);
        assert!((far.z / far.w - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_aspect_ratio() {
        assert!((aspect_ratio(800, 600) - 4.0 / 3.0).abs() < EPSILON);
        assert_eq!(aspect_ratio(0, 600), 1.0);
        assert_eq!(aspect_ratio(800, 0), 1.0);
    }
}
