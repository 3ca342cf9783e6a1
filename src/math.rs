//! Rigid-body pose primitives on top of glam.
//!
//! A pose is a `glam::Affine3A`: composition is `a * b` (the right-hand pose is
//! expressed in the frame of the left-hand one), and the origin is the
//! translation part.

pub use glam::{Affine3A, Quat, Vec3, Vec3A};

/// A rotation plus a translation.
pub type RigidTransform = Affine3A;

/// Build a rigid pose from a rotation and a translation.
#[inline]
pub fn rigid(rotation: Quat, translation: Vec3) -> RigidTransform {
    Affine3A::from_rotation_translation(rotation, translation)
}

/// Extension trait with the pose accessors the pointing pipeline needs.
pub trait PoseExt {
    /// Translation component of the pose
    fn origin(&self) -> Vec3;

    /// Rotation component of the pose (scale is discarded)
    fn rotation(&self) -> Quat;

    /// Direction of the pose's local +X axis in the parent frame
    fn forward(&self) -> Vec3;

    /// True when every component is finite
    fn is_finite_pose(&self) -> bool;
}

impl PoseExt for Affine3A {
    #[inline]
    fn origin(&self) -> Vec3 {
        Vec3::from(self.translation)
    }

    fn rotation(&self) -> Quat {
        let (_, rotation, _) = self.to_scale_rotation_translation();
        if rotation.is_finite() {
            rotation.normalize()
        } else {
            Quat::IDENTITY
        }
    }

    #[inline]
    fn forward(&self) -> Vec3 {
        self.transform_vector3(Vec3::X)
    }

    #[inline]
    fn is_finite_pose(&self) -> bool {
        self.is_finite()
    }
}
