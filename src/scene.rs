use crate::camera::OrbitCamera;
use crate::interaction::Cursor;
use crate::shader::{rgb_hex, Material};
use glam::{EulerRot, Mat3, Vec2, Vec3};

/// Index of a draggable object in its [`Scene`]. Stable for the scene's
/// lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct ObjectHandle(pub(crate) usize);

impl ObjectHandle {
    pub(crate) fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Transform {
    pub(crate) position: Vec3,
    /// Euler angles, applied in XYZ order.
    pub(crate) rotation: Vec3,
    pub(crate) scale: f32,
}

impl Transform {
    pub(crate) fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Vec3::ZERO,
            scale: 1.0,
        }
    }

    pub(crate) fn rotation_matrix(&self) -> Mat3 {
        Mat3::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        )
    }

    /// World point to object-local coordinates.
    pub(crate) fn to_local(&self, world: Vec3) -> Vec3 {
        self.rotation_matrix().transpose() * (world - self.position) / self.scale
    }
}

pub(crate) struct DraggableObject {
    pub(crate) name: &'static str,
    /// Geometry radius before scaling.
    pub(crate) radius: f32,
    base_scale: f32,
    pub(crate) transform: Transform,
    pub(crate) material: Material,
}

impl DraggableObject {
    pub(crate) fn new(name: &'static str, radius: f32, position: Vec3, material: Material) -> Self {
        let transform = Transform::at(position);
        Self {
            name,
            radius,
            base_scale: transform.scale,
            transform,
            material,
        }
    }

    /// Scale captured at creation; hover feedback modulates around it.
    pub(crate) fn base_scale(&self) -> f32 {
        self.base_scale
    }

    pub(crate) fn world_radius(&self) -> f32 {
        self.radius * self.transform.scale
    }
}

pub(crate) struct Scene {
    objects: Vec<DraggableObject>,
    pub(crate) background: Vec3,
}

impl Scene {
    pub(crate) fn from_objects(objects: Vec<DraggableObject>) -> Self {
        Self {
            objects,
            background: rgb_hex(0x807878),
        }
    }

    /// The artwork: an upper-left sphere set back, a smaller lower-right
    /// one brought forward.
    pub(crate) fn spheres() -> Self {
        Self::from_objects(vec![
            DraggableObject::new(
                "upper",
                1.0,
                Vec3::new(-0.25, 0.55, -0.3),
                Material::magenta(),
            ),
            DraggableObject::new(
                "lower",
                0.85,
                Vec3::new(0.2, -0.5, 0.35),
                Material::pink(),
            ),
        ])
    }

    pub(crate) fn len(&self) -> usize {
        self.objects.len()
    }

    pub(crate) fn get(&self, h: ObjectHandle) -> Option<&DraggableObject> {
        self.objects.get(h.index())
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (ObjectHandle, &DraggableObject)> {
        self.objects
            .iter()
            .enumerate()
            .map(|(i, o)| (ObjectHandle(i), o))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (ObjectHandle, &mut DraggableObject)> {
        self.objects
            .iter_mut()
            .enumerate()
            .map(|(i, o)| (ObjectHandle(i), o))
    }
}

/// Drawable area in canvas pixels, and how many pixels one terminal cell
/// covers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Viewport {
    pub(crate) width: f32,
    pub(crate) height: f32,
    pub(crate) cell_w: f32,
    pub(crate) cell_h: f32,
}

impl Viewport {
    pub(crate) fn new(cols: u16, rows: u16, cell_w: u32, cell_h: u32) -> Self {
        Self {
            width: cols as f32 * cell_w as f32,
            height: rows as f32 * cell_h as f32,
            cell_w: cell_w as f32,
            cell_h: cell_h as f32,
        }
    }

    pub(crate) fn aspect(&self) -> f32 {
        self.width / self.height.max(1.0)
    }

    /// Centre of a terminal cell in canvas pixels.
    pub(crate) fn cell_center(&self, col: u16, row: u16) -> Vec2 {
        Vec2::new(
            (col as f32 + 0.5) * self.cell_w,
            (row as f32 + 0.5) * self.cell_h,
        )
    }

    /// Pixel position to normalized device coordinates, Y up.
    pub(crate) fn to_ndc(&self, pointer: Vec2) -> Vec2 {
        Vec2::new(
            pointer.x / self.width.max(1.0) * 2.0 - 1.0,
            -(pointer.y / self.height.max(1.0)) * 2.0 + 1.0,
        )
    }
}

/// Everything the interaction core reads or writes besides its own state:
/// objects, camera, viewport, and the two host-facing signals.
pub(crate) struct Stage {
    pub(crate) scene: Scene,
    pub(crate) camera: OrbitCamera,
    pub(crate) viewport: Viewport,
    pub(crate) orbit_enabled: bool,
    pub(crate) cursor: Cursor,
}

impl Stage {
    pub(crate) fn new(scene: Scene, viewport: Viewport) -> Self {
        Self {
            scene,
            camera: OrbitCamera::new(),
            viewport,
            orbit_enabled: true,
            cursor: Cursor::Default,
        }
    }
}
