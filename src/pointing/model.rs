use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};

use super::ray::pointing_ray;
use crate::chain::{Handedness, KinematicChain};
use crate::config::PointingConfig;
use crate::error::Result;
use crate::math::{PoseExt, Quat, RigidTransform, Vec3};
use crate::observe::{Listeners, PoseStream, Subscription};
use crate::profile::BodyMeasurements;
use crate::surface::{Plane, Surface};

/// Upper bound on back-to-back evaluations caused by triggers raised from
/// inside observers.
const MAX_SETTLE_PASSES: usize = 32;

/// The three published poses, always updated together.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointingOutputs {
    /// Eye-through-fingertip ray; `None` only for degenerate geometry
    pub ray: Option<RigidTransform>,
    /// Where the ray meets the surface; `None` when it misses
    pub pointer: Option<RigidTransform>,
    pub finger: RigidTransform,
}

impl Default for PointingOutputs {
    fn default() -> Self {
        Self {
            ray: None,
            pointer: None,
            finger: RigidTransform::IDENTITY,
        }
    }
}

/// Position + rotation pair, for handing poses to JavaScript or JSON
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseJson {
    pub position: [f32; 3],
    /// Quaternion as [x, y, z, w]
    pub rotation: [f32; 4],
}

impl From<&RigidTransform> for PoseJson {
    fn from(pose: &RigidTransform) -> Self {
        Self {
            position: pose.origin().to_array(),
            rotation: pose.rotation().to_array(),
        }
    }
}

/// Serializable form of `PointingOutputs`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointingOutputsJson {
    pub ray: Option<PoseJson>,
    pub pointer: Option<PoseJson>,
    pub finger: PoseJson,
}

impl From<&PointingOutputs> for PointingOutputsJson {
    fn from(outputs: &PointingOutputs) -> Self {
        Self {
            ray: outputs.ray.as_ref().map(PoseJson::from),
            pointer: outputs.pointer.as_ref().map(PoseJson::from),
            finger: PoseJson::from(&outputs.finger),
        }
    }
}

struct Inputs {
    body_height: f32,
    measurements: BodyMeasurements,
    handedness: Handedness,
    world_pose: RigidTransform,
    orientation_pose: RigidTransform,
    surface: Rc<dyn Surface>,
}

#[derive(Default)]
struct Links {
    world_stream: Option<Subscription>,
    orientation_stream: Option<Subscription>,
    surface: Option<Subscription>,
}

struct ModelCore {
    inputs: RefCell<Inputs>,
    chain: Cell<KinematicChain>,
    outputs: Cell<PointingOutputs>,
    listeners: Listeners<PointingOutputs>,
    links: RefCell<Links>,
    evaluating: Cell<bool>,
    stale: Cell<bool>,
}

/// Resets the evaluation flag even if an observer panics.
struct EvaluationGuard<'a>(&'a Cell<bool>);

impl Drop for EvaluationGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl ModelCore {
    /// Run the pipeline and publish, serialized against nested triggers.
    ///
    /// A trigger raised while an evaluation is in progress only marks the
    /// model stale; the running evaluation then loops once more.
    fn trigger(&self) {
        if self.evaluating.get() {
            self.stale.set(true);
            return;
        }
        self.evaluating.set(true);
        let _guard = EvaluationGuard(&self.evaluating);

        for _ in 0..MAX_SETTLE_PASSES {
            self.stale.set(false);

            let outputs = self.evaluate();
            self.outputs.set(outputs);
            self.listeners.emit(&outputs);

            if !self.stale.get() {
                return;
            }
        }
        log::warn!(
            "Pointing model did not settle after {} passes; observers keep retriggering",
            MAX_SETTLE_PASSES
        );
    }

    fn evaluate(&self) -> PointingOutputs {
        let inputs = self.inputs.borrow();
        let previous = self.outputs.get();

        let chain = KinematicChain::build(
            &inputs.measurements,
            inputs.handedness,
            inputs.orientation_pose.rotation(),
        );
        self.chain.set(chain);

        let finger = chain.finger_pose(&inputs.world_pose);
        let eye = chain.eye_pose(&inputs.world_pose);
        if !finger.is_finite_pose() || !eye.is_finite_pose() {
            log::warn!("Non-finite chain pose; keeping previous outputs");
            return previous;
        }

        let ray = match pointing_ray(&eye, &finger) {
            Ok(ray) => Some(ray),
            Err(err) => {
                if previous.ray.is_some() {
                    log::warn!("{}", err);
                }
                None
            }
        };

        let pointer = ray.and_then(|ray| {
            let hit = inputs
                .surface
                .intersect(&ray)
                .filter(|hit| hit.is_finite_pose());
            if hit.is_none() {
                log::debug!("Pointing ray misses {}", inputs.surface.name());
            }
            hit
        });

        PointingOutputs {
            ray,
            pointer,
            finger,
        }
    }
}

/// Reactive pointing pipeline.
///
/// Holds body height, pointing hand, the latest world and orientation poses
/// and the target surface. Any change re-runs the whole chain synchronously
/// and republishes ray, pointer and fingertip as one snapshot.
///
/// Dropping the model releases its stream subscriptions and detaches it from
/// the surface.
pub struct PointingModel {
    core: Rc<ModelCore>,
}

impl PointingModel {
    /// Model aimed at a horizontal plane through the origin, handedness `Ignore`.
    pub fn new(body_height: f32) -> Result<Self> {
        Self::with_surface(
            body_height,
            Rc::new(Plane::default()),
            Handedness::default(),
        )
    }

    pub fn with_surface(
        body_height: f32,
        surface: Rc<dyn Surface>,
        handedness: Handedness,
    ) -> Result<Self> {
        let measurements = BodyMeasurements::from_height(body_height)?;
        let chain = KinematicChain::build(&measurements, handedness, Quat::IDENTITY);

        let core = Rc::new(ModelCore {
            inputs: RefCell::new(Inputs {
                body_height,
                measurements,
                handedness,
                world_pose: RigidTransform::IDENTITY,
                orientation_pose: RigidTransform::IDENTITY,
                surface: Rc::clone(&surface),
            }),
            chain: Cell::new(chain),
            outputs: Cell::new(PointingOutputs::default()),
            listeners: Listeners::new(),
            links: RefCell::new(Links::default()),
            evaluating: Cell::new(false),
            stale: Cell::new(false),
        });

        let model = Self { core };
        model.core.links.borrow_mut().surface = Some(model.watch_surface(&surface));
        model.core.trigger();

        log::info!(
            "Pointing model ready (body height {:.3}m, {:?}, target {})",
            body_height,
            handedness,
            surface.name()
        );
        Ok(model)
    }

    /// Model from a validated configuration, aimed at a horizontal floor plane
    /// at the configured height.
    pub fn from_config(config: &PointingConfig) -> Result<Self> {
        config.validate()?;
        Self::with_surface(
            config.body_height,
            Rc::new(Plane::horizontal(Vec3::new(0.0, 0.0, config.floor_height))),
            config.handedness,
        )
    }

    // --- Inputs ---

    pub fn set_handedness(&self, handedness: Handedness) {
        self.core.inputs.borrow_mut().handedness = handedness;
        self.core.trigger();
    }

    /// Change body height. Non-positive or non-finite heights are rejected and
    /// the previous height is kept.
    pub fn set_body_height(&self, body_height: f32) -> Result<()> {
        let measurements = BodyMeasurements::from_height(body_height)?;
        {
            let mut inputs = self.core.inputs.borrow_mut();
            inputs.body_height = body_height;
            inputs.measurements = measurements;
        }
        self.core.trigger();
        Ok(())
    }

    /// Follow `stream` for world poses, replacing any previous world-pose
    /// stream. The stream's current value is adopted immediately.
    pub fn attach_world_pose_stream(&self, stream: &PoseStream) {
        let weak = Rc::downgrade(&self.core);
        let subscription = stream.subscribe(move |pose| {
            if let Some(core) = weak.upgrade() {
                apply_world_pose(&core, *pose);
            }
        });
        self.core.links.borrow_mut().world_stream = Some(subscription);
        apply_world_pose(&self.core, stream.latest());
    }

    /// Follow `stream` for orientation samples, replacing any previous
    /// orientation stream. The stream's current value is adopted immediately.
    pub fn attach_orientation_stream(&self, stream: &PoseStream) {
        let weak = Rc::downgrade(&self.core);
        let subscription = stream.subscribe(move |pose| {
            if let Some(core) = weak.upgrade() {
                apply_orientation_pose(&core, *pose);
            }
        });
        self.core.links.borrow_mut().orientation_stream = Some(subscription);
        apply_orientation_pose(&self.core, stream.latest());
    }

    /// Stop following the world-pose stream; the last pose is kept.
    pub fn detach_world_pose_stream(&self) {
        let subscription = self.core.links.borrow_mut().world_stream.take();
        drop(subscription);
    }

    /// Stop following the orientation stream; the last sample is kept.
    pub fn detach_orientation_stream(&self) {
        let subscription = self.core.links.borrow_mut().orientation_stream.take();
        drop(subscription);
    }

    /// Aim at a new surface, detaching from the old one's notifications.
    pub fn set_surface(&self, surface: Rc<dyn Surface>) {
        let watch = self.watch_surface(&surface);
        let previous = self.core.links.borrow_mut().surface.replace(watch);
        drop(previous);

        self.core.inputs.borrow_mut().surface = Rc::clone(&surface);
        log::info!("Pointing target set to {}", surface.name());
        self.core.trigger();
    }

    /// Re-run the pipeline with unchanged inputs
    pub fn recompute(&self) {
        self.core.trigger();
    }

    fn watch_surface(&self, surface: &Rc<dyn Surface>) -> Subscription {
        let weak: Weak<ModelCore> = Rc::downgrade(&self.core);
        surface.notifier().subscribe(move |change| {
            log::debug!("Surface '{}' changed; re-intersecting", change.name);
            if let Some(core) = weak.upgrade() {
                core.trigger();
            }
        })
    }

    // --- Outputs ---

    /// Consistent snapshot of all three outputs
    pub fn outputs(&self) -> PointingOutputs {
        self.core.outputs.get()
    }

    pub fn ray_pose(&self) -> Option<RigidTransform> {
        self.outputs().ray
    }

    pub fn pointer_pose(&self) -> Option<RigidTransform> {
        self.outputs().pointer
    }

    pub fn finger_pose(&self) -> RigidTransform {
        self.outputs().finger
    }

    /// Observe every publication. Each callback receives the full snapshot,
    /// which `outputs()` also returns by the time the callback runs.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&PointingOutputs) + 'static,
    {
        self.core.listeners.subscribe(callback)
    }

    // --- Accessors ---

    pub fn body_height(&self) -> f32 {
        self.core.inputs.borrow().body_height
    }

    pub fn handedness(&self) -> Handedness {
        self.core.inputs.borrow().handedness
    }

    pub fn measurements(&self) -> BodyMeasurements {
        self.core.inputs.borrow().measurements
    }

    /// Chain used for the latest evaluation
    pub fn chain(&self) -> KinematicChain {
        self.core.chain.get()
    }

    pub fn world_pose(&self) -> RigidTransform {
        self.core.inputs.borrow().world_pose
    }

    pub fn orientation_pose(&self) -> RigidTransform {
        self.core.inputs.borrow().orientation_pose
    }

    pub fn surface(&self) -> Rc<dyn Surface> {
        Rc::clone(&self.core.inputs.borrow().surface)
    }
}

fn apply_world_pose(core: &ModelCore, pose: RigidTransform) {
    if !pose.is_finite_pose() {
        log::warn!("Dropping non-finite world pose sample");
        return;
    }
    core.inputs.borrow_mut().world_pose = pose;
    core.trigger();
}

fn apply_orientation_pose(core: &ModelCore, pose: RigidTransform) {
    if !pose.is_finite_pose() {
        log::warn!("Dropping non-finite orientation sample");
        return;
    }
    core.inputs.borrow_mut().orientation_pose = pose;
    core.trigger();
}
