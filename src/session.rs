//! Handle-based wasm API over the session registry.

use wasm_bindgen::prelude::*;

use crate::chain::Handedness;
use crate::math::{Quat, Vec3};
use crate::state::{with_session, with_sessions_mut, SessionHandle};

fn init_logging() {
    console_error_panic_hook::set_once();
    // Fails harmlessly if a logger is already installed
    console_log::init_with_level(log::Level::Info).ok();
}

/// Create a pointing session. Returns 0 if the body height is invalid.
#[wasm_bindgen]
pub fn create_pointing_session(body_height: f32) -> u32 {
    init_logging();

    match with_sessions_mut(|sessions| sessions.create(body_height)) {
        Ok(handle) => {
            log::info!("Created pointing session {}", handle);
            handle
        }
        Err(e) => {
            log::error!("Failed to create pointing session: {}", e);
            0
        }
    }
}

#[wasm_bindgen]
pub fn destroy_pointing_session(handle: u32) -> bool {
    with_sessions_mut(|sessions| sessions.destroy(handle as SessionHandle))
}

/// 0 = ignore, 1 = left hand, 2 = right hand
#[wasm_bindgen]
pub fn set_session_handedness(handle: u32, hand: u8) {
    let handedness = match hand {
        1 => Handedness::LeftHand,
        2 => Handedness::RightHand,
        _ => Handedness::Ignore,
    };
    with_session(handle as SessionHandle, |session| {
        session.model.set_handedness(handedness)
    });
}

#[wasm_bindgen]
pub fn set_session_body_height(handle: u32, body_height: f32) -> bool {
    with_session(handle as SessionHandle, |session| {
        session.model.set_body_height(body_height).map_err(|e| {
            log::warn!("Rejected body height: {}", e);
        })
    })
    .is_some_and(|result| result.is_ok())
}

#[wasm_bindgen]
#[allow(clippy::too_many_arguments)]
pub fn push_world_pose(handle: u32, x: f32, y: f32, z: f32, qx: f32, qy: f32, qz: f32, qw: f32) {
    with_session(handle as SessionHandle, |session| {
        session.push_world_pose(Vec3::new(x, y, z), Quat::from_xyzw(qx, qy, qz, qw))
    });
}

#[wasm_bindgen]
pub fn push_orientation(handle: u32, qx: f32, qy: f32, qz: f32, qw: f32) {
    with_session(handle as SessionHandle, |session| {
        session.push_orientation(Quat::from_xyzw(qx, qy, qz, qw))
    });
}

#[wasm_bindgen]
pub fn set_floor_height(handle: u32, height: f32) {
    with_session(handle as SessionHandle, |session| {
        if let Err(e) = session.set_floor_height(height) {
            log::warn!("Rejected floor height: {}", e);
        }
    });
}

/// Latest `{ ray, pointer, finger }` snapshot, or `null` for an unknown handle
#[wasm_bindgen]
pub fn get_pointing_outputs(handle: u32) -> JsValue {
    with_session(handle as SessionHandle, |session| session.outputs_json())
        .and_then(|outputs| {
            serde_wasm_bindgen::to_value(&outputs)
                .map_err(|e| log::error!("Failed to serialize outputs: {}", e))
                .ok()
        })
        .unwrap_or(JsValue::NULL)
}
