//! Kinematic chain from footprint to fingertip.
//!
//! Frame convention: Z is up, X is forward, Y is to the body's left.

use crate::math::{rigid, Quat, RigidTransform, Vec3};
use crate::profile::BodyMeasurements;
use serde::{Deserialize, Serialize};

/// Which hand is used for pointing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Handedness {
    /// Arm hangs from the neck centerline
    #[default]
    Ignore,
    LeftHand,
    RightHand,
}

impl Handedness {
    /// Sign of the lateral (Y) shoulder offset
    #[inline]
    pub const fn lateral_sign(self) -> f32 {
        match self {
            Handedness::Ignore => 0.0,
            Handedness::LeftHand => 1.0,
            Handedness::RightHand => -1.0,
        }
    }
}

/// Named links of the chain, in composition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkId {
    FootprintToNeck,
    NeckToEyes,
    NeckToShoulder,
    ShoulderToWrist,
    WristToFinger,
}

impl LinkId {
    pub const COUNT: usize = 5;

    pub const ALL: [LinkId; Self::COUNT] = [
        LinkId::FootprintToNeck,
        LinkId::NeckToEyes,
        LinkId::NeckToShoulder,
        LinkId::ShoulderToWrist,
        LinkId::WristToFinger,
    ];
}

/// The five rigid links of the pointing skeleton.
///
/// Only `neck_to_shoulder` carries a rotation (the orientation input); the arm
/// is treated as one rigid segment steered by it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicChain {
    pub footprint_to_neck: RigidTransform,
    pub neck_to_eyes: RigidTransform,
    pub neck_to_shoulder: RigidTransform,
    pub shoulder_to_wrist: RigidTransform,
    pub wrist_to_finger: RigidTransform,
}

impl KinematicChain {
    /// Assemble the chain from body measurements, pointing hand and the
    /// latest orientation sample.
    pub fn build(
        measurements: &BodyMeasurements,
        handedness: Handedness,
        orientation: Quat,
    ) -> Self {
        let lateral = measurements.shoulder_to_neck * handedness.lateral_sign();

        Self {
            footprint_to_neck: RigidTransform::from_translation(Vec3::new(
                0.0,
                0.0,
                measurements.shoulder_height,
            )),
            neck_to_eyes: RigidTransform::from_translation(Vec3::new(
                0.0,
                0.0,
                measurements.shoulder_to_eyes,
            )),
            neck_to_shoulder: rigid(orientation, Vec3::new(0.0, lateral, 0.0)),
            shoulder_to_wrist: RigidTransform::from_translation(Vec3::new(
                measurements.shoulder_to_wrist,
                0.0,
                0.0,
            )),
            wrist_to_finger: RigidTransform::from_translation(Vec3::new(
                measurements.wrist_to_finger,
                0.0,
                0.0,
            )),
        }
    }

    pub fn link(&self, id: LinkId) -> RigidTransform {
        match id {
            LinkId::FootprintToNeck => self.footprint_to_neck,
            LinkId::NeckToEyes => self.neck_to_eyes,
            LinkId::NeckToShoulder => self.neck_to_shoulder,
            LinkId::ShoulderToWrist => self.shoulder_to_wrist,
            LinkId::WristToFinger => self.wrist_to_finger,
        }
    }

    /// Fingertip pose in world space
    pub fn finger_pose(&self, world: &RigidTransform) -> RigidTransform {
        *world
            * self.footprint_to_neck
            * self.neck_to_shoulder
            * self.shoulder_to_wrist
            * self.wrist_to_finger
    }

    /// Eye pose in world space
    pub fn eye_pose(&self, world: &RigidTransform) -> RigidTransform {
        *world * self.footprint_to_neck * self.neck_to_eyes
    }
}
