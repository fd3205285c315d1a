use nalgebra::{Point3, Unit, Vector3, Vector4};

use crate::camera::Camera;
use crate::lantern::ray::Ray;
use crate::lantern::scene::Scene;
use crate::util::{in_unit_sphere, PcgRng};

pub const BOUNCE_LIMIT: u32 = 10;
// push bounce origins off the surface so they don't hit it again immediately
const SURFACE_OFFSET: f32 = 0.0001;

/// Everything one frame reads, borrowed for the length of that frame.
///
/// The scene must already be validated: material indices are trusted here.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub scene: &'a Scene,
    pub camera: &'a Camera,
    pub frame_index: u32,
}

// Same split as a RayGen / ClosestHit / Miss shader set: the payload only
// describes the hit, shading happens in per_pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitPayload {
    /// Negative on a miss.
    pub distance: f32,
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
    pub object_index: Option<usize>,
}

impl HitPayload {
    pub fn is_hit(&self) -> bool {
        self.object_index.is_some()
    }
}

impl<'a> RenderContext<'a> {
    pub fn new(scene: &'a Scene, camera: &'a Camera, frame_index: u32) -> Self {
        Self {
            scene,
            camera,
            frame_index,
        }
    }

    /// Linear light reaching pixel (x, y) along one random path, alpha 1.
    pub fn per_pixel(&self, x: u32, y: u32) -> Vector4<f32> {
        let width = self.camera.viewport_size().width;
        let index = x as usize + y as usize * width as usize;

        let mut ray = Ray::new(self.camera.position(), self.camera.rays()[index].into_inner());

        let mut light = Vector3::zeros();
        let mut contribution = Vector3::new(1.0, 1.0, 1.0);

        let seed = x.wrapping_add(y.wrapping_mul(width));
        let mut rng = PcgRng::new(seed.wrapping_mul(self.frame_index));

        for bounce in 0..BOUNCE_LIMIT {
            rng.perturb(bounce);

            let payload = self.trace_ray(&ray);
            let Some(object_index) = payload.object_index else {
                // the sky is black, only emitters light the scene
                break;
            };

            let sphere = &self.scene.spheres[object_index];
            let material = &self.scene.materials[sphere.material_index];

            contribution.component_mul_assign(&material.albedo);
            // emission is not weighted by contribution
            light += material.emission();

            ray.origin = payload.position + payload.normal * SURFACE_OFFSET;
            let scattered = payload.normal + in_unit_sphere(&mut rng).into_inner();
            ray.direction = Unit::try_new(scattered, f32::EPSILON)
                .map_or(payload.normal, Unit::into_inner);
        }

        light.push(1.0)
    }

    /// Closest sphere in front of the ray origin, or a miss.
    pub fn trace_ray(&self, ray: &Ray) -> HitPayload {
        let mut closest: Option<(usize, f32)> = None;

        for (index, sphere) in self.scene.spheres.iter().enumerate() {
            // Solve |origin + t * direction|^2 = r^2 with the sphere moved to
            // the origin:
            // (d.d) t^2 + 2 (o.d) t + (o.o - r^2) = 0
            let origin = ray.origin - sphere.position;

            let a = ray.direction.dot(&ray.direction);
            if a == 0.0 {
                continue;
            }
            let b = 2.0 * origin.coords.dot(&ray.direction);
            let c = origin.coords.dot(&origin.coords) - sphere.radius * sphere.radius;

            let discriminant = b * b - 4.0 * a * c;
            if discriminant < 0.0 {
                continue;
            }

            let distance = (-b - discriminant.sqrt()) / (2.0 * a);
            if distance.is_nan() || distance <= 0.0 {
                continue;
            }

            match closest {
                Some((_, closest_distance)) if closest_distance <= distance => {}
                _ => closest = Some((index, distance)),
            }
        }

        match closest {
            Some((index, distance)) => self.closest_hit(ray, distance, index),
            None => self.miss(ray),
        }
    }

    pub fn closest_hit(&self, ray: &Ray, distance: f32, object_index: usize) -> HitPayload {
        let sphere = &self.scene.spheres[object_index];

        let origin = ray.origin - sphere.position;
        let local_position = origin + ray.direction * distance;
        let normal = local_position.coords.normalize();

        HitPayload {
            distance,
            position: local_position + sphere.position,
            normal,
            object_index: Some(object_index),
        }
    }

    pub fn miss(&self, _ray: &Ray) -> HitPayload {
        HitPayload {
            distance: -1.0,
            position: Point3::origin(),
            normal: Vector3::zeros(),
            object_index: None,
        }
    }
}
