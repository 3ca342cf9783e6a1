use std::cell::Cell;

use super::{hit_pose, GeometryNotifier, Surface, SurfaceParameter, PARALLEL_EPSILON};
use crate::error::{PointingError, Result};
use crate::math::{PoseExt, RigidTransform, Vec3};

/// Infinite plane through `anchor` with unit `normal`.
///
/// Geometry is mutable through `&self` so a plane can be shared with the
/// pointing model and still be moved by its owner.
pub struct Plane {
    anchor: Cell<Vec3>,
    normal: Cell<Vec3>,
    notifier: GeometryNotifier,
}

impl Plane {
    /// Plane through `anchor` perpendicular to `normal`.
    ///
    /// Fails if the normal has zero length or any component is non-finite.
    pub fn new(anchor: Vec3, normal: Vec3) -> Result<Self> {
        Ok(Self {
            anchor: Cell::new(validate_anchor(anchor)?),
            normal: Cell::new(validate_normal(normal)?),
            notifier: GeometryNotifier::new(),
        })
    }

    /// Horizontal (floor-like) plane through `anchor`, normal +Z
    pub fn horizontal(anchor: Vec3) -> Self {
        Self {
            anchor: Cell::new(anchor),
            normal: Cell::new(Vec3::Z),
            notifier: GeometryNotifier::new(),
        }
    }

    pub fn anchor(&self) -> Vec3 {
        self.anchor.get()
    }

    pub fn normal(&self) -> Vec3 {
        self.normal.get()
    }

    /// Move the plane; notifies `"anchor"`
    pub fn set_anchor(&self, anchor: Vec3) -> Result<()> {
        let anchor = validate_anchor(anchor)?;
        self.anchor.set(anchor);
        self.notifier
            .notify("anchor", SurfaceParameter::Vector(anchor));
        Ok(())
    }

    /// Tilt the plane; notifies `"normal"`
    pub fn set_normal(&self, normal: Vec3) -> Result<()> {
        let normal = validate_normal(normal)?;
        self.normal.set(normal);
        self.notifier
            .notify("normal", SurfaceParameter::Vector(normal));
        Ok(())
    }

    /// Signed distance of `point` from the plane (positive on the normal side)
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal().dot(point - self.anchor())
    }
}

impl Default for Plane {
    fn default() -> Self {
        Self::horizontal(Vec3::ZERO)
    }
}

impl Surface for Plane {
    fn intersect(&self, ray: &RigidTransform) -> Option<RigidTransform> {
        let origin = ray.origin();
        let direction = ray.forward().normalize_or_zero();
        if direction == Vec3::ZERO {
            return None;
        }

        let normal = self.normal();
        let denom = normal.dot(direction);
        if denom.abs() < PARALLEL_EPSILON {
            return None;
        }

        let t = normal.dot(self.anchor() - origin) / denom;
        if !t.is_finite() || t < 0.0 {
            return None;
        }

        Some(hit_pose(ray, origin + direction * t))
    }

    fn notifier(&self) -> &GeometryNotifier {
        &self.notifier
    }

    fn name(&self) -> &str {
        "plane"
    }
}

fn validate_anchor(anchor: Vec3) -> Result<Vec3> {
    if anchor.is_finite() {
        Ok(anchor)
    } else {
        Err(PointingError::InvalidParameter {
            name: "plane anchor",
            value: anchor.length(),
        })
    }
}

fn validate_normal(normal: Vec3) -> Result<Vec3> {
    // try_normalize also rejects non-finite input
    match normal.try_normalize() {
        Some(unit) => Ok(unit),
        None => Err(PointingError::InvalidParameter {
            name: "plane normal",
            value: normal.length(),
        }),
    }
}
