use glam::Vec3;
use noise::{NoiseFn, Simplex};

pub(crate) const OCTAVES: usize = 5;

/// Fractal sum of 3D simplex noise. Same seed and position always give the
/// same value.
pub(crate) struct NoiseField {
    simplex: Simplex,
}

impl NoiseField {
    pub(crate) fn new(seed: u32) -> Self {
        Self {
            simplex: Simplex::new(seed),
        }
    }

    /// Five octaves, frequency doubling and amplitude halving from 0.5.
    /// Roughly in [-1, 1].
    pub(crate) fn fbm(&self, p: Vec3) -> f32 {
        let mut p = [p.x as f64, p.y as f64, p.z as f64];
        let mut value = 0.0_f64;
        let mut amplitude = 0.5_f64;
        for _ in 0..OCTAVES {
            value += amplitude * self.simplex.get(p);
            p = [p[0] * 2.0, p[1] * 2.0, p[2] * 2.0];
            amplitude *= 0.5;
        }
        value as f32
    }

    /// fbm remapped from its signed range into [0, 1].
    pub(crate) fn mix_factor(&self, p: Vec3) -> f32 {
        (self.fbm(p) * 0.5 + 0.5).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fbm_is_deterministic() {
        let a = NoiseField::new(7);
        let b = NoiseField::new(7);
        let p = Vec3::new(0.31, -1.2, 0.77);
        assert_eq!(a.fbm(p).to_bits(), b.fbm(p).to_bits());
        assert_eq!(a.fbm(p).to_bits(), a.fbm(p).to_bits());
    }

    #[test]
    fn fbm_stays_within_amplitude_sum() {
        let field = NoiseField::new(0);
        let bound = (0..OCTAVES).map(|i| 0.5_f32.powi(i as i32 + 1)).sum::<f32>() + 1e-3;
        for i in 0..400 {
            let t = i as f32 * 0.137;
            let v = field.fbm(Vec3::new(t.sin() * 3.0, t * 0.21, t.cos() * 2.0));
            assert!(v.abs() <= bound, "fbm {v} exceeds {bound}");
        }
    }

    #[test]
    fn mix_factor_is_unit_range_and_varies() {
        let field = NoiseField::new(0);
        let mut lo = f32::MAX;
        let mut hi = f32::MIN;
        for i in 0..200 {
            let p = Vec3::new(i as f32 * 0.05, 0.3, -0.4);
            let m = field.mix_factor(p);
            assert!((0.0..=1.0).contains(&m));
            lo = lo.min(m);
            hi = hi.max(m);
        }
        assert!(hi - lo > 0.05);
    }
}
