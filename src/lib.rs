//! Pointing Kinematics
//!
//! Works out where a person is pointing: a body-height driven kinematic chain
//! from footprint to fingertip, a ray cast from the eyes through the fingertip,
//! and a pluggable target surface the ray is intersected with. Everything is
//! recomputed reactively whenever an input changes.

pub mod chain;
pub mod config;
pub mod error;
pub mod math;
pub mod observe;
pub mod pointing;
pub mod profile;
#[cfg(target_arch = "wasm32")]
pub mod session;
pub mod state;
pub mod surface;

/// Tolerance for pose comparisons
pub const EPSILON: f32 = 1e-6;

pub use chain::{Handedness, KinematicChain, LinkId};
pub use config::PointingConfig;
pub use error::{PointingError, Result};
pub use glam::{Affine3A, Quat, Vec3};
pub use math::{PoseExt, RigidTransform};
pub use observe::{Latest, Listeners, PoseStream, Subscription};
pub use pointing::{PointingModel, PointingOutputs, PointingOutputsJson, PoseJson};
pub use profile::{BodyMeasurements, REFERENCE_HEIGHT};
pub use surface::{GeometryChange, GeometryNotifier, Plane, Sphere, Surface, SurfaceParameter};

// Re-exports for WASM API
#[cfg(target_arch = "wasm32")]
pub use session::{
    create_pointing_session, destroy_pointing_session, get_pointing_outputs, push_orientation,
    push_world_pose, set_floor_height, set_session_body_height, set_session_handedness,
};
