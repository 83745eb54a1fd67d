//! Core value types: math re-exports, Transform, Camera, LightList.

pub use glam::{Mat3, Mat4, Vec3, Vec4, vec3, vec4};

pub mod camera;
pub mod lights;
pub mod transform;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_pv_is_finite() {
        let cam = camera::Camera::new_perspective(
            vec3(0.0, 2.0, 0.0),
            vec3(0.0, 0.0, -2.0),
            Vec3::Y,
            45f32.to_radians(),
            0.1,
            500.0,
            1000.0 / 600.0,
        );
        let pv = cam.view_projection();
        assert!(pv.to_cols_array().iter().all(|f| f.is_finite()));
    }
}
