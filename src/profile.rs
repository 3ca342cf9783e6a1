//! Anthropometric body profile.
//!
//! Segment lengths are fixed ratios of a reference body, scaled linearly by the
//! actual body height.

use crate::error::{require_positive, Result};
use serde::{Deserialize, Serialize};

/// Body height the reference ratios were measured at (meters)
pub const REFERENCE_HEIGHT: f32 = 1.835;

/// Footprint to shoulder line at the reference height (meters)
pub const REFERENCE_SHOULDER_HEIGHT: f32 = 1.47;
/// Neck to shoulder joint, lateral
pub const REFERENCE_SHOULDER_TO_NECK: f32 = 0.18;
/// Shoulder line to eyes, vertical
pub const REFERENCE_SHOULDER_TO_EYES: f32 = 0.22;
/// Shoulder joint to wrist
pub const REFERENCE_SHOULDER_TO_WRIST: f32 = 0.51;
/// Wrist to index fingertip
pub const REFERENCE_WRIST_TO_FINGER: f32 = 0.18;

/// The five segment lengths of a body, in meters.
///
/// Always derived as a group from one body height, so the lengths are never
/// partially stale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyMeasurements {
    pub shoulder_height: f32,
    pub shoulder_to_neck: f32,
    pub shoulder_to_eyes: f32,
    pub shoulder_to_wrist: f32,
    pub wrist_to_finger: f32,
}

impl BodyMeasurements {
    /// Measurements of the reference body.
    pub const fn reference() -> Self {
        Self {
            shoulder_height: REFERENCE_SHOULDER_HEIGHT,
            shoulder_to_neck: REFERENCE_SHOULDER_TO_NECK,
            shoulder_to_eyes: REFERENCE_SHOULDER_TO_EYES,
            shoulder_to_wrist: REFERENCE_SHOULDER_TO_WRIST,
            wrist_to_finger: REFERENCE_WRIST_TO_FINGER,
        }
    }

    /// Derive all five lengths for a body of the given height.
    ///
    /// Rejects non-positive and non-finite heights.
    pub fn from_height(body_height: f32) -> Result<Self> {
        let scale = Self::scale(require_positive("body_height", body_height)?);
        let reference = Self::reference();

        Ok(Self {
            shoulder_height: reference.shoulder_height * scale,
            shoulder_to_neck: reference.shoulder_to_neck * scale,
            shoulder_to_eyes: reference.shoulder_to_eyes * scale,
            shoulder_to_wrist: reference.shoulder_to_wrist * scale,
            wrist_to_finger: reference.wrist_to_finger * scale,
        })
    }

    /// Linear scale factor from the reference body
    #[inline]
    pub fn scale(body_height: f32) -> f32 {
        body_height / REFERENCE_HEIGHT
    }

    /// Total arm reach from shoulder joint to fingertip
    pub fn arm_length(&self) -> f32 {
        self.shoulder_to_wrist + self.wrist_to_finger
    }

    pub fn as_array(&self) -> [f32; 5] {
        [
            self.shoulder_height,
            self.shoulder_to_neck,
            self.shoulder_to_eyes,
            self.shoulder_to_wrist,
            self.wrist_to_finger,
        ]
    }
}
