//! Target surfaces for the pointing ray.
//!
//! A surface answers one question, where a ray hits it, and announces changes
//! to its own geometry through a `GeometryNotifier` so that consumers can
//! re-run the intersection without waiting for new pose samples.

pub mod plane;
pub mod sphere;

pub use plane::*;
pub use sphere::*;

use crate::math::{RigidTransform, Vec3};
use crate::observe::{Listeners, Subscription};

/// Tolerance below which a ray is considered parallel to a surface
pub const PARALLEL_EPSILON: f32 = 1e-6;

/// New value of a changed surface parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceParameter {
    Scalar(f32),
    Vector(Vec3),
}

/// A single geometry change announced by a surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryChange {
    pub name: &'static str,
    pub value: SurfaceParameter,
}

/// Outbound change channel owned by each surface.
#[derive(Default)]
pub struct GeometryNotifier {
    listeners: Listeners<GeometryChange>,
}

impl GeometryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Announce that parameter `name` now has `value`
    pub fn notify(&self, name: &'static str, value: SurfaceParameter) {
        log::debug!("Surface parameter '{}' changed to {:?}", name, value);
        self.listeners.emit(&GeometryChange { name, value });
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&GeometryChange) + 'static,
    {
        self.listeners.subscribe(callback)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

/// Something a pointing ray can hit.
///
/// The ray is a full pose: its origin is the eye position and its local +X
/// axis is the pointing direction.
pub trait Surface {
    /// Where the ray meets the surface, or `None` when it does not (parallel,
    /// behind the ray origin, out of bounds...).
    fn intersect(&self, ray: &RigidTransform) -> Option<RigidTransform>;

    /// Channel the surface fires whenever its geometry changes
    fn notifier(&self) -> &GeometryNotifier;

    fn name(&self) -> &str {
        "surface"
    }
}

/// Pose at `point` carrying the ray's orientation
pub(crate) fn hit_pose(ray: &RigidTransform, point: Vec3) -> RigidTransform {
    let mut pose = *ray;
    pose.translation = point.into();
    pose
}
