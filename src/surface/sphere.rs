use std::cell::Cell;

use super::{hit_pose, GeometryNotifier, Surface, SurfaceParameter};
use crate::error::{require_positive, PointingError, Result};
use crate::math::{PoseExt, RigidTransform, Vec3};

/// Sphere target, hit on the nearest point in front of the ray origin.
pub struct Sphere {
    center: Cell<Vec3>,
    radius: Cell<f32>,
    notifier: GeometryNotifier,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32) -> Result<Self> {
        Ok(Self {
            center: Cell::new(validate_center(center)?),
            radius: Cell::new(require_positive("sphere radius", radius)?),
            notifier: GeometryNotifier::new(),
        })
    }

    pub fn center(&self) -> Vec3 {
        self.center.get()
    }

    pub fn radius(&self) -> f32 {
        self.radius.get()
    }

    /// Notifies `"center"`
    pub fn set_center(&self, center: Vec3) -> Result<()> {
        let center = validate_center(center)?;
        self.center.set(center);
        self.notifier
            .notify("center", SurfaceParameter::Vector(center));
        Ok(())
    }

    /// Notifies `"radius"`
    pub fn set_radius(&self, radius: f32) -> Result<()> {
        let radius = require_positive("sphere radius", radius)?;
        self.radius.set(radius);
        self.notifier
            .notify("radius", SurfaceParameter::Scalar(radius));
        Ok(())
    }
}

impl Surface for Sphere {
    fn intersect(&self, ray: &RigidTransform) -> Option<RigidTransform> {
        let origin = ray.origin();
        let direction = ray.forward().normalize_or_zero();
        if direction == Vec3::ZERO {
            return None;
        }

        let radius = self.radius();
        let to_origin = origin - self.center();
        let b = to_origin.dot(direction);
        let c = to_origin.length_squared() - radius * radius;
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }

        let root = discriminant.sqrt();
        let near = -b - root;
        let far = -b + root;
        let t = if near >= 0.0 {
            near
        } else if far >= 0.0 {
            // Origin is inside the sphere
            far
        } else {
            return None;
        };

        Some(hit_pose(ray, origin + direction * t))
    }

    fn notifier(&self) -> &GeometryNotifier {
        &self.notifier
    }

    fn name(&self) -> &str {
        "sphere"
    }
}

fn validate_center(center: Vec3) -> Result<Vec3> {
    if center.is_finite() {
        Ok(center)
    } else {
        Err(PointingError::InvalidParameter {
            name: "sphere center",
            value: center.length(),
        })
    }
}
