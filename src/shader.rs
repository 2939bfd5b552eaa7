use crate::noise_field::NoiseField;
use glam::{Vec2, Vec3};
use std::f32::consts::{PI, TAU};

// Local position is scaled before sampling the noise field.
const NOISE_SCALE: f32 = 2.0;
const AMBIENT: f32 = 0.4;
const DIFFUSE: f32 = 0.6;
const HIGHLIGHT_POWER: i32 = 3;
const HIGHLIGHT_MIX: f32 = 0.5;
const FRESNEL_POWER: f32 = 1.5;
const MAX_ALPHA: f32 = 0.3;
const GRAIN_STRENGTH: f32 = 0.06;

pub(crate) fn rgb_hex(hex: u32) -> Vec3 {
    Vec3::new(
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    )
}

/// Colour parameters for one sphere. The algorithm is shared; only these
/// differ between materials.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Material {
    pub(crate) base_a: Vec3,
    pub(crate) base_b: Vec3,
    pub(crate) highlight: Vec3,
    /// Reserved animation time. Not read by the shader.
    #[allow(dead_code)]
    pub(crate) time: f32,
}

impl Material {
    pub(crate) fn new(base_a: u32, base_b: u32, highlight: u32) -> Self {
        Self {
            base_a: rgb_hex(base_a),
            base_b: rgb_hex(base_b),
            highlight: rgb_hex(highlight),
            time: 0.0,
        }
    }

    /// Magenta with a purple highlight.
    pub(crate) fn magenta() -> Self {
        Self::new(0xf24873, 0xd65090, 0xda59f2)
    }

    pub(crate) fn pink() -> Self {
        Self::new(0xf77c9c, 0xf25580, 0xffaabb)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Lighting {
    /// View-space, normalized.
    pub(crate) light_dir: Vec3,
    pub(crate) view_dir: Vec3,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            light_dir: Vec3::new(-0.5, 1.0, 0.5).normalize(),
            view_dir: Vec3::Z,
        }
    }
}

/// One fragment's geometric inputs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct SurfacePoint {
    /// Object-local position, unaffected by the object's transform.
    pub(crate) position: Vec3,
    /// View-space unit normal.
    pub(crate) normal: Vec3,
    pub(crate) uv: Vec2,
}

/// Intermediate lighting terms of one fragment, before colour assembly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ShadeTerms {
    /// Noise mix factor in [0, 1].
    pub(crate) noise: f32,
    pub(crate) base: Vec3,
    pub(crate) diffuse: f32,
    pub(crate) highlight: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Fragment {
    pub(crate) color: Vec3,
    pub(crate) alpha: f32,
}

pub(crate) struct SurfaceShader {
    noise: NoiseField,
    lighting: Lighting,
    grain: bool,
}

impl SurfaceShader {
    pub(crate) fn new(noise: NoiseField, lighting: Lighting, grain: bool) -> Self {
        Self {
            noise,
            lighting,
            grain,
        }
    }

    pub(crate) fn grain_enabled(&self) -> bool {
        self.grain
    }

    pub(crate) fn set_grain(&mut self, on: bool) {
        self.grain = on;
    }

    pub(crate) fn terms(&self, material: &Material, p: &SurfacePoint) -> ShadeTerms {
        let noise = self.noise.mix_factor(p.position * NOISE_SCALE);
        let diffuse = p.normal.dot(self.lighting.light_dir).max(0.0);
        ShadeTerms {
            noise,
            base: material.base_a.lerp(material.base_b, noise),
            diffuse,
            highlight: diffuse.powi(HIGHLIGHT_POWER),
        }
    }

    pub(crate) fn shade(&self, material: &Material, p: &SurfacePoint) -> Fragment {
        let t = self.terms(material, p);
        let lighting = AMBIENT + t.diffuse * DIFFUSE;
        let mut color = t
            .base
            .lerp(material.highlight, t.highlight * t.noise * HIGHLIGHT_MIX);
        color *= lighting;

        let fresnel = p.normal.dot(self.lighting.view_dir).max(0.0);
        let alpha = fresnel.powf(FRESNEL_POWER) * MAX_ALPHA;

        if self.grain {
            color += Vec3::splat((grain(p.uv, p.position) - 0.5) * GRAIN_STRENGTH);
        }

        Fragment { color, alpha }
    }
}

/// Hash of surface coordinates into [0, 1).
pub(crate) fn grain(uv: Vec2, position: Vec3) -> f32 {
    let seed = uv * 500.0 + Vec2::new(position.x, position.y) * 100.0;
    let h = seed.dot(Vec2::new(12.9898, 78.233)).sin() * 43758.547;
    h - h.floor()
}

/// UV of a unit direction on a latitude/longitude sphere: u wraps around
/// the Y axis, v runs from 1 at the top pole to 0 at the bottom.
pub(crate) fn sphere_uv(dir: Vec3) -> Vec2 {
    let theta = dir.y.clamp(-1.0, 1.0).acos();
    let mut phi = dir.z.atan2(-dir.x);
    if phi < 0.0 {
        phi += TAU;
    }
    Vec2::new(phi / TAU, 1.0 - theta / PI)
}
