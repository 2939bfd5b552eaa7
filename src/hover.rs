use crate::scene::{ObjectHandle, Scene};

const TREMOR_A: (f32, f32) = (8.0, 0.008);
const TREMOR_B: (f32, f32) = (13.0, 0.005);
const BREATHE: (f32, f32) = (2.0, 0.015);

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct HoverTuning {
    /// Fraction of the remaining distance to the target covered per frame.
    pub(crate) smoothing: f32,
    /// Animation seconds per frame.
    pub(crate) time_step: f32,
    /// A fading intensity below this snaps to zero.
    pub(crate) epsilon: f32,
}

impl Default for HoverTuning {
    fn default() -> Self {
        Self {
            smoothing: 0.03,
            time_step: 0.016,
            epsilon: 1e-4,
        }
    }
}

/// Relative scale offset at animation time `t`: a two-part tremor plus a
/// slow breath.
pub(crate) fn pulse(t: f32) -> f32 {
    let wave = |(freq, amp): (f32, f32)| (t * freq).sin() * amp;
    wave(TREMOR_A) + wave(TREMOR_B) + wave(BREATHE)
}

/// Smoothed per-object hover intensity driving the idle tremor.
pub(crate) struct HoverFeedback {
    tuning: HoverTuning,
    time: f32,
    intensities: Vec<f32>,
}

impl HoverFeedback {
    pub(crate) fn new(tuning: HoverTuning, objects: usize) -> Self {
        Self {
            tuning,
            time: 0.0,
            intensities: vec![0.0; objects],
        }
    }

    pub(crate) fn intensity(&self, object: ObjectHandle) -> f32 {
        self.intensities.get(object.index()).copied().unwrap_or(0.0)
    }

    pub(crate) fn tick(&mut self, hovered: Option<ObjectHandle>, dragging: bool, scene: &mut Scene) {
        self.time += self.tuning.time_step;
        let offset = pulse(self.time);
        for (h, obj) in scene.iter_mut() {
            let Some(i) = self.intensities.get_mut(h.index()) else {
                continue;
            };
            let target = if hovered == Some(h) && !dragging {
                1.0
            } else {
                0.0
            };
            *i += (target - *i) * self.tuning.smoothing;
            if target == 0.0 && *i < self.tuning.epsilon {
                *i = 0.0;
            }
            obj.transform.scale = obj.base_scale() * (1.0 + offset * *i);
        }
    }
}
