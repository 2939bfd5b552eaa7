use crate::interaction::InteractionMode;
use crate::scene::{ObjectHandle, Scene};
use glam::Vec2;
use log::trace;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Velocity {
    pub(crate) rot_x: f32,
    pub(crate) rot_y: f32,
    pub(crate) pos_x: f32,
    pub(crate) pos_y: f32,
    pub(crate) pos_z: f32,
}

impl Velocity {
    fn components_mut(&mut self) -> [&mut f32; 5] {
        [
            &mut self.rot_x,
            &mut self.rot_y,
            &mut self.pos_x,
            &mut self.pos_y,
            &mut self.pos_z,
        ]
    }

    pub(crate) fn magnitude(&self) -> f32 {
        (self.rot_x * self.rot_x
            + self.rot_y * self.rot_y
            + self.pos_x * self.pos_x
            + self.pos_y * self.pos_y
            + self.pos_z * self.pos_z)
            .sqrt()
    }

    pub(crate) fn is_at_rest(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct MotionTuning {
    /// Per-frame velocity multiplier, in (0, 1).
    pub(crate) friction: f32,
    /// Components below this magnitude snap to zero.
    pub(crate) epsilon: f32,
    pub(crate) rotate_sensitivity: f32,
    pub(crate) move_sensitivity: f32,
    pub(crate) depth_sensitivity: f32,
    /// Off: each frame applies pending velocity once and drops it.
    pub(crate) inertia: bool,
}

impl Default for MotionTuning {
    fn default() -> Self {
        Self {
            friction: 0.92,
            epsilon: 1e-4,
            rotate_sensitivity: 0.006,
            move_sensitivity: 0.001,
            depth_sensitivity: 0.001,
            inertia: true,
        }
    }
}

/// Leaky integrator per degree of freedom, one velocity per object.
pub(crate) struct MotionSimulator {
    tuning: MotionTuning,
    velocities: Vec<Velocity>,
}

impl MotionSimulator {
    pub(crate) fn new(tuning: MotionTuning, objects: usize) -> Self {
        Self {
            tuning,
            velocities: vec![Velocity::default(); objects],
        }
    }

    pub(crate) fn tuning(&self) -> &MotionTuning {
        &self.tuning
    }

    pub(crate) fn set_inertia(&mut self, on: bool) {
        self.tuning.inertia = on;
    }

    pub(crate) fn velocity(&self, object: ObjectHandle) -> Option<&Velocity> {
        self.velocities.get(object.index())
    }

    /// Adds a screen-space drag delta to the object's velocity. Unknown
    /// handles are ignored.
    pub(crate) fn apply_impulse(&mut self, object: ObjectHandle, mode: InteractionMode, delta: Vec2) {
        let t = self.tuning;
        let Some(v) = self.velocities.get_mut(object.index()) else {
            return;
        };
        match mode {
            InteractionMode::Rotate => {
                v.rot_y += delta.x * t.rotate_sensitivity;
                v.rot_x += delta.y * t.rotate_sensitivity;
            }
            InteractionMode::Move => {
                v.pos_x += delta.x * t.move_sensitivity;
                v.pos_y -= delta.y * t.move_sensitivity;
            }
            InteractionMode::Depth => {
                v.pos_z += delta.y * t.depth_sensitivity;
            }
        }
        trace!("impulse {object:?} {mode:?} {delta} -> {v:?}");
    }

    /// One frame: integrate, then decay and settle.
    pub(crate) fn tick(&mut self, scene: &mut Scene) {
        for (h, obj) in scene.iter_mut() {
            let Some(v) = self.velocities.get_mut(h.index()) else {
                continue;
            };
            let tf = &mut obj.transform;
            tf.rotation.x += v.rot_x;
            tf.rotation.y += v.rot_y;
            tf.position.x += v.pos_x;
            tf.position.y += v.pos_y;
            tf.position.z += v.pos_z;

            if !self.tuning.inertia {
                *v = Velocity::default();
                continue;
            }
            for c in v.components_mut() {
                *c *= self.tuning.friction;
                if c.abs() < self.tuning.epsilon {
                    *c = 0.0;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const A: ObjectHandle = ObjectHandle(0);
    const B: ObjectHandle = ObjectHandle(1);

    fn sim() -> MotionSimulator {
        MotionSimulator::new(MotionTuning::default(), 2)
    }

    #[test]
    fn impulses_map_to_mode_components() {
        let mut s = sim();
        s.apply_impulse(A, InteractionMode::Rotate, Vec2::new(10.0, 5.0));
        s.apply_impulse(B, InteractionMode::Move, Vec2::new(10.0, 5.0));
        let a = *s.velocity(A).unwrap();
        let b = *s.velocity(B).unwrap();
        assert!((a.rot_y - 0.06).abs() < 1e-7);
        assert!((a.rot_x - 0.03).abs() < 1e-7);
        assert_eq!((a.pos_x, a.pos_y, a.pos_z), (0.0, 0.0, 0.0));
        assert!((b.pos_x - 0.01).abs() < 1e-7);
        assert!((b.pos_y + 0.005).abs() < 1e-7);
        assert_eq!((b.rot_x, b.rot_y), (0.0, 0.0));

        s.apply_impulse(B, InteractionMode::Depth, Vec2::new(40.0, -8.0));
        let b = *s.velocity(B).unwrap();
        assert!((b.pos_z + 0.008).abs() < 1e-7);
        assert!((b.pos_x - 0.01).abs() < 1e-7);
    }

    #[test]
    fn unknown_handle_is_ignored() {
        let mut s = sim();
        s.apply_impulse(ObjectHandle(9), InteractionMode::Rotate, Vec2::new(3.0, 3.0));
        assert!(s.velocity(A).unwrap().is_at_rest());
        assert!(s.velocity(ObjectHandle(9)).is_none());
    }

    #[test]
    fn integration_then_decay() {
        let mut scene = Scene::spheres();
        let start = scene.get(A).unwrap().transform;
        let mut s = sim();
        s.apply_impulse(A, InteractionMode::Rotate, Vec2::new(10.0, 0.0));
        s.tick(&mut scene);
        let after = scene.get(A).unwrap().transform;
        assert!((after.rotation.y - start.rotation.y - 0.06).abs() < 1e-7);
        assert!((s.velocity(A).unwrap().rot_y - 0.06 * 0.92).abs() < 1e-7);
        assert_eq!(
            scene.get(B).unwrap().transform,
            Scene::spheres().get(B).unwrap().transform
        );
    }

    #[test]
    fn end_to_end_rotate_glides_to_rest() {
        let mut scene = Scene::spheres();
        let mut s = sim();
        s.apply_impulse(A, InteractionMode::Rotate, Vec2::new(10.0, 0.0));
        let v0 = s.velocity(A).unwrap().rot_y;
        let mut prev = v0;
        let mut frames = 0;
        while !s.velocity(A).unwrap().is_at_rest() {
            s.tick(&mut scene);
            let v = s.velocity(A).unwrap().rot_y;
            assert!(v < prev);
            prev = v;
            frames += 1;
            assert!(frames < 1000);
        }
        // 0.06 * 0.92^n < 1e-4 first holds at n = 77.
        assert_eq!(frames, 77);
        let total = scene.get(A).unwrap().transform.rotation.y;
        assert!((total - v0 / (1.0 - 0.92)).abs() < 0.01);
    }

    #[test]
    fn inertia_off_tracks_one_to_one() {
        let mut scene = Scene::spheres();
        let x0 = scene.get(A).unwrap().transform.position.x;
        let mut s = MotionSimulator::new(
            MotionTuning {
                inertia: false,
                ..MotionTuning::default()
            },
            2,
        );
        s.apply_impulse(A, InteractionMode::Move, Vec2::new(20.0, 0.0));
        s.apply_impulse(A, InteractionMode::Move, Vec2::new(5.0, 0.0));
        s.tick(&mut scene);
        assert!(s.velocity(A).unwrap().is_at_rest());
        let x1 = scene.get(A).unwrap().transform.position.x;
        assert!((x1 - x0 - 0.025).abs() < 1e-6);
        s.tick(&mut scene);
        assert_eq!(scene.get(A).unwrap().transform.position.x, x1);
    }

    proptest! {
        #[test]
        fn decay_is_geometric_then_exactly_zero(
            friction in 0.05f32..0.99,
            v0 in 0.001f32..5.0,
            n in 1usize..40,
        ) {
            let tuning = MotionTuning { friction, ..MotionTuning::default() };
            let mut s = MotionSimulator::new(tuning, 2);
            let mut scene = Scene::spheres();
            s.apply_impulse(A, InteractionMode::Depth, Vec2::new(0.0, v0 / tuning.depth_sensitivity));
            let start = s.velocity(A).unwrap().pos_z;
            for _ in 0..n {
                s.tick(&mut scene);
            }
            let v = s.velocity(A).unwrap().pos_z;
            let expected = start * friction.powi(n as i32);
            if expected >= tuning.epsilon * 1.01 {
                prop_assert!((v - expected).abs() <= expected * 1e-3);
            } else if expected < tuning.epsilon * 0.99 {
                prop_assert_eq!(v, 0.0);
            }

            let mut frames = 0;
            while !s.velocity(A).unwrap().is_at_rest() {
                let before = s.velocity(A).unwrap().magnitude();
                s.tick(&mut scene);
                prop_assert!(s.velocity(A).unwrap().magnitude() < before);
                frames += 1;
                prop_assert!(frames < 10_000);
            }
        }

        #[test]
        fn moves_between_frames_accumulate(
            d1 in -50.0f32..50.0,
            d2 in -50.0f32..50.0,
            e1 in -50.0f32..50.0,
            e2 in -50.0f32..50.0,
        ) {
            let mut s = sim();
            s.apply_impulse(A, InteractionMode::Rotate, Vec2::new(d1, e1));
            s.apply_impulse(A, InteractionMode::Rotate, Vec2::new(d2, e2));
            let v = *s.velocity(A).unwrap();
            let k = s.tuning().rotate_sensitivity;
            prop_assert!((v.rot_y - (d1 * k + d2 * k)).abs() < 1e-5);
            prop_assert!((v.rot_x - (e1 * k + e2 * k)).abs() < 1e-5);
        }

        #[test]
        fn mode_switch_leaves_prior_velocity(
            d in 1.0f32..50.0,
            dz in 1.0f32..50.0,
        ) {
            let mut s = sim();
            s.apply_impulse(A, InteractionMode::Rotate, Vec2::new(d, d));
            let before = *s.velocity(A).unwrap();
            s.apply_impulse(A, InteractionMode::Depth, Vec2::new(d, dz));
            let after = *s.velocity(A).unwrap();
            prop_assert_eq!(before.rot_x, after.rot_x);
            prop_assert_eq!(before.rot_y, after.rot_y);
            prop_assert!(after.pos_z > 0.0);
        }
    }
}
