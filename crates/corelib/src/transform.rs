use crate::{Mat3, Mat4, Vec3};

/// Build the rotation part of a model matrix from Euler angles in radians.
///
/// Order is yaw (Y), then pitch (X), then roll (Z), with the roll applied
/// around the `(0,0,-1)` axis. The sign of the Z rotation is part of the
/// renderer's draw contract and must not be changed.
#[inline]
pub fn rotation_matrix(rotate: Vec3) -> Mat4 {
    Mat4::from_rotation_y(rotate.y)
        * Mat4::from_rotation_x(rotate.x)
        * Mat4::from_axis_angle(Vec3::NEG_Z, rotate.z)
}

/// Build a model matrix: scale first, then rotate, then translate.
#[inline]
pub fn model_matrix(translate: Vec3, rotate: Vec3, scale: Vec3) -> Mat4 {
    Mat4::from_translation(translate) * rotation_matrix(rotate) * Mat4::from_scale(scale)
}

/// Take a world-space direction into the model's local frame.
///
/// Uses the inverse of the rotation-only submatrix, so translation and scale
/// do not affect the result. Lighting stays in object space this way while
/// lights are authored in world space.
#[inline]
pub fn world_dir_to_model(rotate: Vec3, world_dir: Vec3) -> Vec3 {
    Mat3::from_mat4(rotation_matrix(rotate)).inverse() * world_dir
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vec3;
    use std::f32::consts::FRAC_PI_2;

    fn assert_vec3_near(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-5, "{a:?} != {b:?}");
    }

    #[test]
    fn scale_then_yaw_then_translate() {
        let m = model_matrix(
            vec3(1.0, 0.0, 0.0),
            vec3(0.0, FRAC_PI_2, 0.0),
            vec3(2.0, 1.0, 1.0),
        );
        let p = m.transform_point3(vec3(1.0, 0.0, 0.0));
        assert_vec3_near(p, vec3(1.0, 0.0, -2.0));
    }

    #[test]
    fn roll_spins_around_negative_z() {
        let m = rotation_matrix(vec3(0.0, 0.0, FRAC_PI_2));
        let p = m.transform_point3(vec3(1.0, 0.0, 0.0));
        assert_vec3_near(p, vec3(0.0, -1.0, 0.0));
    }

    #[test]
    fn identity_rotation_leaves_points_alone() {
        let m = model_matrix(Vec3::ZERO, Vec3::ZERO, Vec3::ONE);
        assert_eq!(m, Mat4::IDENTITY);
    }

    #[test]
    fn light_direction_enters_model_space() {
        // A quarter turn of yaw: world -Z becomes model +X... checked both ways.
        let dir = world_dir_to_model(vec3(0.0, FRAC_PI_2, 0.0), vec3(0.0, 0.0, -1.0));
        assert_vec3_near(dir, vec3(1.0, 0.0, 0.0));

        let back = rotation_matrix(vec3(0.0, FRAC_PI_2, 0.0)).transform_vector3(dir);
        assert_vec3_near(back, vec3(0.0, 0.0, -1.0));
    }

    #[test]
    fn light_direction_round_trips_through_rotation() {
        let rot = vec3(0.3, -1.2, 0.7);
        let world = vec3(-5.0, -50.0, -15.0).normalize();
        let local = world_dir_to_model(rot, world);
        // Pure rotation preserves length and inverts cleanly.
        assert!((local.length() - 1.0).abs() < 1e-5);
        let back = rotation_matrix(rot).transform_vector3(local);
        assert_vec3_near(back, world);
    }
}
