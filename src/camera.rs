use glam::{Mat3, Mat4, Vec2, Vec3};
use std::f32::consts::{PI, TAU};

const FOV_Y_DEG: f32 = 50.0;
const NEAR: f32 = 0.1;
const FAR: f32 = 100.0;
const START_DISTANCE: f32 = 5.0;

const DAMPING: f32 = 0.05;
const MIN_POLAR: f32 = 0.01;
const MAX_POLAR: f32 = PI - 0.01;
const MIN_DISTANCE: f32 = 1.5;
const MAX_DISTANCE: f32 = 40.0;
const ZOOM_STEP: f32 = 0.95;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Ray {
    pub(crate) origin: Vec3,
    /// Unit length.
    pub(crate) dir: Vec3,
}

impl Ray {
    pub(crate) fn at(&self, t: f32) -> Vec3 {
        self.origin + self.dir * t
    }
}

/// Precomputed unprojection for casting many rays with one camera pose.
pub(crate) struct RayCaster {
    inv_view_proj: Mat4,
    origin: Vec3,
}

impl RayCaster {
    pub(crate) fn ray(&self, ndc: Vec2) -> Ray {
        let far = self.inv_view_proj.project_point3(Vec3::new(ndc.x, ndc.y, 1.0));
        Ray {
            origin: self.origin,
            dir: (far - self.origin).normalize(),
        }
    }
}

/// Anything that can cast a world-space ray through a point given in
/// normalized device coordinates.
pub(crate) trait RayProvider {
    fn ray(&self, ndc: Vec2, aspect: f32) -> Ray;
}

/// Perspective camera orbiting the origin. Pointer drags rotate it, the
/// wheel zooms, panning is not supported. Motion is damped and settles
/// over several frames after input stops.
pub(crate) struct OrbitCamera {
    target: Vec3,
    distance: f32,
    azimuth: f32,
    polar: f32,
    azimuth_delta: f32,
    polar_delta: f32,
    zoom_scale: f32,
    drag_from: Option<Vec2>,
}

impl OrbitCamera {
    pub(crate) fn new() -> Self {
        Self {
            target: Vec3::ZERO,
            distance: START_DISTANCE,
            azimuth: 0.0,
            polar: PI / 2.0,
            azimuth_delta: 0.0,
            polar_delta: 0.0,
            zoom_scale: 1.0,
            drag_from: None,
        }
    }

    pub(crate) fn eye(&self) -> Vec3 {
        let s = self.polar.sin();
        self.target
            + Vec3::new(
                s * self.azimuth.sin(),
                self.polar.cos(),
                s * self.azimuth.cos(),
            ) * self.distance
    }

    pub(crate) fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Y)
    }

    /// Rotation part of the view matrix, for moving normals into view space.
    pub(crate) fn view_rotation(&self) -> Mat3 {
        Mat3::from_mat4(self.view())
    }

    pub(crate) fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh_gl(FOV_Y_DEG.to_radians(), aspect.max(1e-3), NEAR, FAR)
    }

    pub(crate) fn ray_caster(&self, aspect: f32) -> RayCaster {
        RayCaster {
            inv_view_proj: (self.projection(aspect) * self.view()).inverse(),
            origin: self.eye(),
        }
    }

    pub(crate) fn begin_drag(&mut self, pointer: Vec2) {
        self.drag_from = Some(pointer);
    }

    /// `viewport_height` in the same pixel units as `pointer`.
    pub(crate) fn drag_to(&mut self, pointer: Vec2, viewport_height: f32) {
        let Some(from) = self.drag_from else {
            return;
        };
        let d = pointer - from;
        let h = viewport_height.max(1.0);
        self.azimuth_delta -= TAU * d.x / h;
        self.polar_delta -= TAU * d.y / h;
        self.drag_from = Some(pointer);
    }

    pub(crate) fn end_drag(&mut self) {
        self.drag_from = None;
    }

    /// Positive notches zoom out.
    pub(crate) fn zoom(&mut self, notches: f32) {
        self.zoom_scale *= ZOOM_STEP.powf(-notches);
    }

    /// Advance damping by one frame.
    pub(crate) fn update(&mut self) {
        self.azimuth += self.azimuth_delta * DAMPING;
        self.polar = (self.polar + self.polar_delta * DAMPING).clamp(MIN_POLAR, MAX_POLAR);
        self.azimuth_delta *= 1.0 - DAMPING;
        self.polar_delta *= 1.0 - DAMPING;

        self.distance = (self.distance * self.zoom_scale).clamp(MIN_DISTANCE, MAX_DISTANCE);
        self.zoom_scale = 1.0;
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl RayProvider for OrbitCamera {
    fn ray(&self, ndc: Vec2, aspect: f32) -> Ray {
        self.ray_caster(aspect).ray(ndc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_on_positive_z() {
        let cam = OrbitCamera::new();
        assert!((cam.eye() - Vec3::new(0.0, 0.0, 5.0)).length() < 1e-5);
    }

    #[test]
    fn center_ray_points_at_target() {
        let cam = OrbitCamera::new();
        let ray = cam.ray(Vec2::ZERO, 1.5);
        assert!((ray.dir - Vec3::NEG_Z).length() < 1e-4);
        assert!((ray.at(5.0)).length() < 1e-3);
    }

    #[test]
    fn right_edge_ray_leans_right() {
        let cam = OrbitCamera::new();
        let ray = cam.ray(Vec2::new(1.0, 0.0), 1.0);
        assert!(ray.dir.x > 0.0);
        let half_fov = (FOV_Y_DEG / 2.0).to_radians();
        let angle = ray.dir.angle_between(Vec3::NEG_Z);
        assert!((angle - half_fov).abs() < 1e-3);
    }

    #[test]
    fn drag_rotates_with_damping() {
        let mut cam = OrbitCamera::new();
        cam.begin_drag(Vec2::new(10.0, 10.0));
        cam.drag_to(Vec2::new(30.0, 10.0), 100.0);
        cam.end_drag();
        let before = cam.azimuth;
        cam.update();
        let first = cam.azimuth - before;
        cam.update();
        let second = cam.azimuth - before - first;
        assert!(first < 0.0);
        assert!(second.abs() < first.abs());
    }

    #[test]
    fn drag_without_begin_is_ignored() {
        let mut cam = OrbitCamera::new();
        cam.drag_to(Vec2::new(50.0, 50.0), 100.0);
        cam.update();
        assert_eq!(cam.azimuth, 0.0);
    }

    #[test]
    fn polar_is_clamped() {
        let mut cam = OrbitCamera::new();
        cam.begin_drag(Vec2::ZERO);
        cam.drag_to(Vec2::new(0.0, 10_000.0), 10.0);
        for _ in 0..200 {
            cam.update();
        }
        assert!(cam.polar >= MIN_POLAR && cam.polar <= MAX_POLAR);
    }

    #[test]
    fn zoom_is_bounded() {
        let mut cam = OrbitCamera::new();
        cam.zoom(-500.0);
        cam.update();
        assert_eq!(cam.distance, MIN_DISTANCE);
        cam.zoom(500.0);
        cam.update();
        assert_eq!(cam.distance, MAX_DISTANCE);
    }
}
