pub mod model;
pub mod ray;

pub use model::*;
pub use ray::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::Handedness;
    use crate::math::{rigid, PoseExt, Quat, RigidTransform, Vec3};
    use crate::observe::PoseStream;
    use crate::profile::REFERENCE_HEIGHT;
    use crate::surface::{GeometryNotifier, Plane, Sphere, Surface};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// Surface that no ray ever hits
    #[derive(Default)]
    struct Nowhere {
        notifier: GeometryNotifier,
    }

    impl Surface for Nowhere {
        fn intersect(&self, _ray: &RigidTransform) -> Option<RigidTransform> {
            None
        }

        fn notifier(&self) -> &GeometryNotifier {
            &self.notifier
        }
    }

    fn assert_finite(outputs: &PointingOutputs) {
        assert!(outputs.finger.is_finite());
        if let Some(ray) = outputs.ray {
            assert!(ray.is_finite());
        }
        if let Some(pointer) = outputs.pointer {
            assert!(pointer.is_finite());
        }
    }

    #[test]
    fn test_right_hand_reference_scenario() {
        let model = PointingModel::new(REFERENCE_HEIGHT).unwrap();
        model.set_handedness(Handedness::RightHand);

        assert_eq!(model.measurements().shoulder_height, 1.47);
        assert_eq!(
            model.chain().neck_to_shoulder.origin(),
            Vec3::new(0.0, -0.18, 0.0)
        );

        let finger = model.finger_pose().origin();
        assert!(
            finger.distance(Vec3::new(0.69, -0.18, 1.47)) < 1e-5,
            "finger at {:?}",
            finger
        );

        let ray = model.ray_pose().expect("ray is defined");
        assert!(ray.origin().distance(Vec3::new(0.0, 0.0, 1.69)) < 1e-5);
        // Forward and downward
        assert!(ray.forward().x > 0.0);
        assert!(ray.forward().z < 0.0);

        let pointer = model.pointer_pose().expect("floor is in front of the ray");
        let hit = pointer.origin();
        assert!(hit.z.abs() < 1e-4, "pointer should lie on the floor, got {:?}", hit);
        assert!(hit.x > finger.x);
        assert!(hit.y < 0.0);
    }

    #[test]
    fn test_ignore_scenario_is_deterministic() {
        let a = PointingModel::new(REFERENCE_HEIGHT).unwrap();
        let b = PointingModel::new(REFERENCE_HEIGHT).unwrap();
        assert_eq!(a.outputs(), b.outputs());

        let finger = a.finger_pose().origin();
        assert!(finger.distance(Vec3::new(0.69, 0.0, 1.47)) < 1e-5);
        assert!(a.pointer_pose().is_some());
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let model = PointingModel::new(1.72).unwrap();
        model.set_handedness(Handedness::LeftHand);
        let before = model.outputs();
        model.recompute();
        model.recompute();
        assert_eq!(model.outputs(), before);
    }

    #[test]
    fn test_handedness_mirrors_finger() {
        let model = PointingModel::new(REFERENCE_HEIGHT).unwrap();
        model.set_handedness(Handedness::LeftHand);
        let left = model.finger_pose().origin();
        model.set_handedness(Handedness::RightHand);
        let right = model.finger_pose().origin();

        assert!((left.y + right.y).abs() < 1e-6);
        assert!((left.x - right.x).abs() < 1e-6);
        assert_eq!(model.handedness(), Handedness::RightHand);
    }

    #[test]
    fn test_surface_that_never_hits() {
        let model = PointingModel::with_surface(
            REFERENCE_HEIGHT,
            Rc::new(Nowhere::default()),
            Handedness::RightHand,
        )
        .unwrap();
        let world = PoseStream::default();
        model.attach_world_pose_stream(&world);

        for step in 0..10 {
            world.push(RigidTransform::from_translation(Vec3::new(
                step as f32,
                0.0,
                0.0,
            )));
            assert!(model.pointer_pose().is_none());
            assert!(model.ray_pose().is_some());
            assert!(model.finger_pose().origin().x > step as f32);
        }
    }

    #[test]
    fn test_degenerate_world_pose_publishes_no_ray() {
        let model = PointingModel::new(REFERENCE_HEIGHT).unwrap();
        let world = PoseStream::default();
        model.attach_world_pose_stream(&world);
        assert!(model.ray_pose().is_some());

        // A collapsed world frame puts eye and fingertip on the same point
        world.push(RigidTransform::from_scale_rotation_translation(
            Vec3::ZERO,
            Quat::IDENTITY,
            Vec3::new(1.0, 2.0, 0.0),
        ));
        let outputs = model.outputs();
        assert!(outputs.ray.is_none());
        assert!(outputs.pointer.is_none());
        assert_finite(&outputs);

        // Usable again after a sane sample
        world.push(RigidTransform::IDENTITY);
        assert!(model.ray_pose().is_some());
        assert!(model.pointer_pose().is_some());
    }

    #[test]
    fn test_non_finite_samples_are_dropped() {
        let model = PointingModel::new(REFERENCE_HEIGHT).unwrap();
        let world = PoseStream::default();
        let orientation = PoseStream::default();
        model.attach_world_pose_stream(&world);
        model.attach_orientation_stream(&orientation);
        let before = model.outputs();

        world.push(RigidTransform::from_translation(Vec3::new(f32::NAN, 0.0, 0.0)));
        orientation.push(rigid(Quat::from_xyzw(f32::INFINITY, 0.0, 0.0, 1.0), Vec3::ZERO));

        assert_eq!(model.outputs(), before);
        assert_eq!(model.world_pose(), RigidTransform::IDENTITY);
        assert_finite(&model.outputs());
    }

    #[test]
    fn test_overflowing_chain_keeps_previous_outputs() {
        let model = PointingModel::new(REFERENCE_HEIGHT).unwrap();
        let world = PoseStream::default();
        model.attach_world_pose_stream(&world);
        let before = model.outputs();

        // Finite sample, but scaling the chain offsets overflows f32
        let huge = RigidTransform::from_scale_rotation_translation(
            Vec3::splat(3.0e38),
            Quat::IDENTITY,
            Vec3::ZERO,
        );
        assert!(huge.is_finite_pose());
        world.push(huge);

        assert_eq!(model.world_pose(), huge);
        assert_eq!(model.outputs(), before);
        assert_finite(&model.outputs());
    }

    #[test]
    fn test_invalid_body_height_keeps_state() {
        assert!(PointingModel::new(0.0).is_err());
        assert!(PointingModel::new(-1.0).is_err());

        let model = PointingModel::new(1.6).unwrap();
        let before = model.outputs();
        assert!(model.set_body_height(-0.2).is_err());
        assert!(model.set_body_height(f32::NAN).is_err());
        assert_eq!(model.body_height(), 1.6);
        assert_eq!(model.outputs(), before);

        model.set_body_height(2.0).unwrap();
        assert_eq!(model.body_height(), 2.0);
        assert!(model.finger_pose().origin().z > before.finger.origin().z);
    }

    #[test]
    fn test_orientation_stream_steers_arm() {
        let model = PointingModel::new(REFERENCE_HEIGHT).unwrap();
        let orientation = PoseStream::default();
        model.attach_orientation_stream(&orientation);

        orientation.push(rigid(
            Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
            Vec3::new(9.0, 9.0, 9.0),
        ));

        // Only the rotation of the orientation sample is used
        let finger = model.finger_pose().origin();
        assert!(finger.distance(Vec3::new(0.0, 0.69, 1.47)) < 1e-5);

        let pointer = model.pointer_pose().unwrap().origin();
        assert!(pointer.y > 0.69);
        assert!(pointer.x.abs() < 1e-4);
    }

    #[test]
    fn test_attach_adopts_current_value_and_replaces_previous_stream() {
        let model = PointingModel::new(REFERENCE_HEIGHT).unwrap();
        let first = PoseStream::new(RigidTransform::from_translation(Vec3::new(1.0, 0.0, 0.0)));
        let second = PoseStream::new(RigidTransform::from_translation(Vec3::new(0.0, 3.0, 0.0)));

        model.attach_world_pose_stream(&first);
        assert_eq!(model.world_pose(), first.latest());

        model.attach_world_pose_stream(&second);
        assert_eq!(model.world_pose(), second.latest());
        assert_eq!(first.subscriber_count(), 0);

        first.push(RigidTransform::from_translation(Vec3::new(7.0, 0.0, 0.0)));
        assert_eq!(model.world_pose(), second.latest());

        model.detach_world_pose_stream();
        second.push(RigidTransform::IDENTITY);
        assert_eq!(
            model.world_pose(),
            RigidTransform::from_translation(Vec3::new(0.0, 3.0, 0.0))
        );
        assert_eq!(second.subscriber_count(), 0);
    }

    #[test]
    fn test_surface_change_reintersects_without_pose_event() {
        let floor = Rc::new(Plane::default());
        let model =
            PointingModel::with_surface(REFERENCE_HEIGHT, floor.clone(), Handedness::Ignore)
                .unwrap();
        let before = model.pointer_pose().unwrap().origin();

        floor.set_anchor(Vec3::new(0.0, 0.0, 1.0)).unwrap();
        let after = model.pointer_pose().unwrap().origin();

        assert!((after.z - 1.0).abs() < 1e-4);
        assert!(after.x < before.x);
    }

    #[test]
    fn test_set_surface_detaches_old_surface() {
        let floor = Rc::new(Plane::default());
        let model =
            PointingModel::with_surface(REFERENCE_HEIGHT, floor.clone(), Handedness::Ignore)
                .unwrap();
        assert_eq!(floor.notifier().listener_count(), 1);

        let publications = Rc::new(Cell::new(0));
        let _sub = {
            let publications = Rc::clone(&publications);
            model.subscribe(move |_| publications.set(publications.get() + 1))
        };

        let ball = Rc::new(Sphere::new(Vec3::new(4.0, 0.0, 1.0), 0.5).unwrap());
        model.set_surface(ball.clone());
        assert_eq!(publications.get(), 1);
        assert_eq!(floor.notifier().listener_count(), 0);
        assert_eq!(ball.notifier().listener_count(), 1);
        assert_eq!(model.surface().name(), "sphere");

        // The old surface no longer drives the model
        floor.set_anchor(Vec3::new(0.0, 0.0, -3.0)).unwrap();
        assert_eq!(publications.get(), 1);

        ball.set_radius(0.6).unwrap();
        assert_eq!(publications.get(), 2);
    }

    #[test]
    fn test_dropping_model_releases_subscriptions() {
        let floor = Rc::new(Plane::default());
        let world = PoseStream::default();
        let orientation = PoseStream::default();
        {
            let model =
                PointingModel::with_surface(1.7, floor.clone(), Handedness::LeftHand).unwrap();
            model.attach_world_pose_stream(&world);
            model.attach_orientation_stream(&orientation);
            assert_eq!(world.subscriber_count(), 1);
        }
        assert_eq!(world.subscriber_count(), 0);
        assert_eq!(orientation.subscriber_count(), 0);
        assert_eq!(floor.notifier().listener_count(), 0);

        // Pushing into orphaned streams is harmless
        world.push(RigidTransform::IDENTITY);
        floor.set_anchor(Vec3::ONE).unwrap();
    }

    #[test]
    fn test_observers_see_consistent_snapshot() {
        let model = Rc::new(PointingModel::new(REFERENCE_HEIGHT).unwrap());
        let checked = Rc::new(Cell::new(0));

        let _sub = {
            let weak = Rc::downgrade(&model);
            let checked = Rc::clone(&checked);
            model.subscribe(move |published| {
                if let Some(model) = weak.upgrade() {
                    assert_eq!(model.outputs(), *published);
                    assert_eq!(model.ray_pose(), published.ray);
                    assert_eq!(model.pointer_pose(), published.pointer);
                    assert_eq!(model.finger_pose(), published.finger);
                    checked.set(checked.get() + 1);
                }
            })
        };

        model.set_handedness(Handedness::RightHand);
        model.set_body_height(1.5).unwrap();
        assert_eq!(checked.get(), 2);
    }

    #[test]
    fn test_push_from_observer_is_serialized() {
        let model = PointingModel::new(REFERENCE_HEIGHT).unwrap();
        let world = PoseStream::default();
        model.attach_world_pose_stream(&world);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let _sub = {
            let world = world.clone();
            let seen = Rc::clone(&seen);
            model.subscribe(move |published| {
                seen.borrow_mut().push(published.finger.origin().x);
                if seen.borrow().len() == 1 {
                    world.push(RigidTransform::from_translation(Vec3::new(5.0, 0.0, 0.0)));
                }
            })
        };

        model.recompute();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert!((seen[0] - 0.69).abs() < 1e-5);
        assert!((seen[1] - 5.69).abs() < 1e-5);
        assert!((model.finger_pose().origin().x - 5.69).abs() < 1e-5);
    }

    #[test]
    fn test_push_from_stream_observer_reaches_model() {
        let model = PointingModel::new(REFERENCE_HEIGHT).unwrap();
        let world = PoseStream::default();
        model.attach_world_pose_stream(&world);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let _sub = {
            let world = world.clone();
            let seen = Rc::clone(&seen);
            model.subscribe(move |published| {
                seen.borrow_mut().push(published.finger.origin().x);
                if seen.borrow().len() == 1 {
                    world.push(RigidTransform::from_translation(Vec3::new(5.0, 0.0, 0.0)));
                }
            })
        };

        // The observer pushes while the model is still handling this sample
        world.push(RigidTransform::from_translation(Vec3::new(1.0, 0.0, 0.0)));

        assert_eq!(model.world_pose(), world.latest());
        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert!((seen[0] - 1.69).abs() < 1e-5);
        assert!((seen[1] - 5.69).abs() < 1e-5);
        assert!((model.finger_pose().origin().x - 5.69).abs() < 1e-5);
    }

    #[test]
    fn test_outputs_json_shape() {
        let model = PointingModel::new(REFERENCE_HEIGHT).unwrap();
        let json = serde_json::to_value(PointingOutputsJson::from(&model.outputs())).unwrap();

        assert!(json["ray"]["position"].is_array());
        assert_eq!(json["ray"]["rotation"].as_array().unwrap().len(), 4);
        assert!(json["pointer"].is_object());
        let finger_z = json["finger"]["position"][2].as_f64().unwrap();
        assert!((finger_z - 1.47).abs() < 1e-5);
    }
}
