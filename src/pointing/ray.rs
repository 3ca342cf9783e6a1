use crate::error::{PointingError, Result};
use crate::math::{rigid, PoseExt, Quat, RigidTransform, Vec3};

/// Shortest eye-to-fingertip distance that still defines a direction (meters)
pub const MIN_RAY_LENGTH: f32 = 1e-6;

/// Unit vector from the eye origin through the fingertip origin.
pub fn pointing_direction(eye: Vec3, finger: Vec3) -> Result<Vec3> {
    let offset = finger - eye;
    let length = offset.length();
    if !length.is_finite() || length < MIN_RAY_LENGTH {
        return Err(PointingError::DegenerateGeometry);
    }
    Ok(offset / length)
}

/// Orientation whose local +X axis is `direction`, built as yaw about Z then
/// pitch about the yawed Y axis. No roll.
pub fn ray_orientation(direction: Vec3) -> Quat {
    let yaw = direction.y.atan2(direction.x);
    let yaw_rotation = Quat::from_rotation_z(yaw);

    let yawed_x = yaw_rotation * Vec3::X;
    let pitch = (-direction.z).atan2(direction.dot(yawed_x));
    let pitch_rotation = Quat::from_rotation_y(pitch);

    yaw_rotation * pitch_rotation
}

/// Ray pose from the eye through the fingertip.
pub fn pointing_ray(eye: &RigidTransform, finger: &RigidTransform) -> Result<RigidTransform> {
    let origin = eye.origin();
    let direction = pointing_direction(origin, finger.origin())?;
    Ok(rigid(ray_orientation(direction), origin))
}
