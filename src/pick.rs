use crate::camera::{Ray, RayProvider};
use crate::scene::{ObjectHandle, Scene, Viewport};
use glam::{Vec2, Vec3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct PickHit {
    pub(crate) object: ObjectHandle,
    pub(crate) distance: f32,
}

/// Distance along `ray` to the front surface of a sphere. A ray starting
/// inside the sphere sees no front face and misses.
pub(crate) fn intersect_sphere(ray: &Ray, center: Vec3, radius: f32) -> Option<f32> {
    let oc = ray.origin - center;
    let b = oc.dot(ray.dir);
    let c = oc.length_squared() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let t = -b - disc.sqrt();
    (t >= 0.0).then_some(t)
}

/// Nearest object hit by `ray`.
pub(crate) fn pick_ray(ray: &Ray, scene: &Scene) -> Option<PickHit> {
    scene
        .iter()
        .filter_map(|(object, o)| {
            intersect_sphere(ray, o.transform.position, o.world_radius())
                .map(|distance| PickHit { object, distance })
        })
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}

/// Object under a pointer given in viewport pixels.
pub(crate) fn pick<R: RayProvider>(
    pointer: Vec2,
    viewport: &Viewport,
    camera: &R,
    scene: &Scene,
) -> Option<PickHit> {
    let ray = camera.ray(viewport.to_ndc(pointer), viewport.aspect());
    pick_ray(&ray, scene)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::OrbitCamera;
    use crate::scene::DraggableObject;
    use crate::shader::Material;

    struct FixedRay(Ray);

    impl RayProvider for FixedRay {
        fn ray(&self, _ndc: Vec2, _aspect: f32) -> Ray {
            self.0
        }
    }

    fn down_z() -> Ray {
        Ray {
            origin: Vec3::ZERO,
            dir: Vec3::NEG_Z,
        }
    }

    fn sphere(z: f32, radius: f32) -> DraggableObject {
        DraggableObject::new("s", radius, Vec3::new(0.0, 0.0, z), Material::pink())
    }

    #[test]
    fn nearest_hit_wins() {
        // B is listed first and is farther away.
        let scene = Scene::from_objects(vec![sphere(-6.0, 1.0), sphere(-4.0, 1.0)]);
        let hit = pick_ray(&down_z(), &scene).unwrap();
        assert_eq!(hit.object, ObjectHandle(1));
        assert!((hit.distance - 3.0).abs() < 1e-5);
    }

    #[test]
    fn miss_resolves_to_none() {
        let scene = Scene::from_objects(vec![sphere(-4.0, 1.0), sphere(-6.0, 1.0)]);
        let ray = Ray {
            origin: Vec3::new(5.0, 0.0, 0.0),
            dir: Vec3::NEG_Z,
        };
        assert_eq!(pick_ray(&ray, &scene), None);
    }

    #[test]
    fn sphere_behind_ray_is_ignored() {
        assert_eq!(intersect_sphere(&down_z(), Vec3::new(0.0, 0.0, 4.0), 1.0), None);
    }

    #[test]
    fn origin_inside_sphere_misses() {
        assert_eq!(intersect_sphere(&down_z(), Vec3::ZERO, 1.0), None);
    }

    #[test]
    fn tangent_ray_grazes() {
        let t = intersect_sphere(&down_z(), Vec3::new(1.0, 0.0, -5.0), 1.0).unwrap();
        assert!((t - 5.0).abs() < 1e-4);
    }

    #[test]
    fn scaled_radius_is_used() {
        let mut scene = Scene::from_objects(vec![sphere(-4.0, 1.0)]);
        let ray = Ray {
            origin: Vec3::new(1.5, 0.0, 0.0),
            dir: Vec3::NEG_Z,
        };
        assert!(pick_ray(&ray, &scene).is_none());
        scene.iter_mut().next().unwrap().1.transform.scale = 2.0;
        assert!(pick_ray(&ray, &scene).is_some());
    }

    #[test]
    fn pick_goes_through_ray_provider() {
        let scene = Scene::from_objects(vec![sphere(-4.0, 1.0)]);
        let vp = Viewport::new(10, 10, 1, 2);
        let hit = pick(Vec2::new(3.0, 7.0), &vp, &FixedRay(down_z()), &scene);
        assert_eq!(hit.map(|h| h.object), Some(ObjectHandle(0)));
    }

    #[test]
    fn artwork_center_hits_front_sphere() {
        let scene = Scene::spheres();
        let vp = Viewport::new(80, 40, 1, 2);
        let center = Vec2::new(vp.width / 2.0, vp.height / 2.0);
        let hit = pick(center, &vp, &OrbitCamera::new(), &scene).unwrap();
        assert_eq!(hit.object, ObjectHandle(1));
        assert!(pick(Vec2::ZERO, &vp, &OrbitCamera::new(), &scene).is_none());
    }
}
