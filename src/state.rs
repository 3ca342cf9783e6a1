//! Session registry behind the handle-based bindings.
//!
//! Each session owns one `PointingModel` together with the streams and floor
//! plane that feed it. Core functions take an explicit `&mut SessionRegistry`;
//! the thread-local below exists only so the wasm bindings can reach it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::chain::Handedness;
use crate::error::Result;
use crate::math::{rigid, Quat, RigidTransform, Vec3};
use crate::observe::PoseStream;
use crate::pointing::{PointingModel, PointingOutputsJson};
use crate::surface::Plane;

pub type SessionHandle = u32;

/// A pointing model plus the inputs a host pushes into it
pub struct PointingSession {
    pub model: PointingModel,
    pub world: PoseStream,
    pub orientation: PoseStream,
    pub floor: Rc<Plane>,
}

impl PointingSession {
    pub fn new(body_height: f32) -> Result<Self> {
        let floor = Rc::new(Plane::default());
        let model = PointingModel::with_surface(body_height, floor.clone(), Handedness::Ignore)?;
        let world = PoseStream::default();
        let orientation = PoseStream::default();
        model.attach_world_pose_stream(&world);
        model.attach_orientation_stream(&orientation);

        Ok(Self {
            model,
            world,
            orientation,
            floor,
        })
    }

    pub fn push_world_pose(&self, position: Vec3, rotation: Quat) {
        self.world.push(rigid(rotation.normalize(), position));
    }

    pub fn push_orientation(&self, rotation: Quat) {
        self.orientation
            .push(RigidTransform::from_quat(rotation.normalize()));
    }

    pub fn set_floor_height(&self, height: f32) -> Result<()> {
        self.floor.set_anchor(Vec3::new(0.0, 0.0, height))
    }

    pub fn outputs_json(&self) -> PointingOutputsJson {
        PointingOutputsJson::from(&self.model.outputs())
    }
}

/// Live sessions keyed by handle
#[derive(Default)]
pub struct SessionRegistry {
    next_handle: SessionHandle,
    sessions: HashMap<SessionHandle, PointingSession>,
}

impl SessionRegistry {
    pub fn create(&mut self, body_height: f32) -> Result<SessionHandle> {
        let session = PointingSession::new(body_height)?;
        let handle = self.allocate_handle();
        self.sessions.insert(handle, session);
        Ok(handle)
    }

    /// Next free handle. 0 is never handed out; the bindings use it for failure.
    fn allocate_handle(&mut self) -> SessionHandle {
        loop {
            self.next_handle = self.next_handle.wrapping_add(1);
            if self.next_handle != 0 && !self.sessions.contains_key(&self.next_handle) {
                return self.next_handle;
            }
        }
    }

    pub fn destroy(&mut self, handle: SessionHandle) -> bool {
        self.sessions.remove(&handle).is_some()
    }

    pub fn get(&self, handle: SessionHandle) -> Option<&PointingSession> {
        self.sessions.get(&handle)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

// Global state access, thin wrapper for WASM bindings only
thread_local! {
    static SESSIONS: RefCell<SessionRegistry> = RefCell::new(SessionRegistry::default());
}

/// Execute a closure with mutable access to the registry
pub fn with_sessions_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut SessionRegistry) -> R,
{
    SESSIONS.with(|sessions| f(&mut sessions.borrow_mut()))
}

/// Execute a closure with the session behind `handle`
///
/// Returns None if no such session exists
pub fn with_session<F, R>(handle: SessionHandle, f: F) -> Option<R>
where
    F: FnOnce(&PointingSession) -> R,
{
    SESSIONS.with(|sessions| sessions.borrow().get(handle).map(f))
}
