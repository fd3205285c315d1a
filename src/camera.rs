use log::{debug, warn};
use nalgebra::{
    Isometry3, Matrix4, Perspective3, Point3, Unit, UnitQuaternion, Vector2, Vector3, Vector4,
};
use rayon::prelude::*;

use crate::util::ViewportSize;

// radians of look rotation per pixel of mouse travel, before rotation_speed()
const MOUSE_SENSITIVITY: f32 = 0.002;
// forward may not get closer than this to world up (cosine of the angle)
const MAX_PITCH_COS: f32 = 0.999;

/// Movement and look deltas gathered by whatever owns the input devices.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct CameraInput {
    /// x: right, y: up, z: forward. Usually each axis is -1, 0 or 1.
    pub movement: Vector3<f32>,
    /// Mouse travel in pixels since the last tick.
    pub look: Vector2<f32>,
}

impl CameraInput {
    pub fn is_idle(&self) -> bool {
        self.movement == Vector3::zeros() && self.look == Vector2::zeros()
    }
}

pub struct Camera {
    projection: Matrix4<f32>,
    view: Matrix4<f32>,
    inverse_projection: Matrix4<f32>,
    inverse_view: Matrix4<f32>,

    vertical_fov: f32,
    near: f32,
    far: f32,

    position: Point3<f32>,
    forward: Unit<Vector3<f32>>,

    rays: Vec<Unit<Vector3<f32>>>,

    viewport_size: ViewportSize,
}

impl Camera {
    /// `vertical_fov` is in degrees. Nothing can be rendered until the first
    /// [`Camera::resize`].
    pub fn new(vertical_fov: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            projection: Matrix4::identity(),
            view: Matrix4::identity(),
            inverse_projection: Matrix4::identity(),
            inverse_view: Matrix4::identity(),
            vertical_fov,
            near,
            far,
            position: Point3::new(0.0, 0.0, 6.0),
            forward: Unit::new_unchecked(-Vector3::z()),
            rays: vec![],
            viewport_size: ViewportSize::default(),
        };

        camera.reevaluate_view();
        camera
    }

    /// Applies one tick of input. Returns whether the camera moved, in which
    /// case anything accumulated from the old viewpoint is stale.
    pub fn update(&mut self, time_step: f32, input: &CameraInput) -> bool {
        if input.is_idle() {
            return false;
        }

        let up: Unit<Vector3<f32>> = Vector3::y_axis();
        let right = Unit::new_normalize(self.forward.cross(&*up));

        let step = self.movement_speed() * time_step;
        self.position += (self.forward.into_inner() * input.movement.z
            + right.into_inner() * input.movement.x
            + up.into_inner() * input.movement.y)
            * step;

        let delta = input.look * MOUSE_SENSITIVITY;
        if delta != Vector2::zeros() {
            let pitch_delta = delta.y * self.rotation_speed(); // positive when looking down
            let yaw_delta = delta.x * self.rotation_speed(); // positive when looking right

            let yaw = UnitQuaternion::from_axis_angle(&up, -yaw_delta);
            let pitch = UnitQuaternion::from_axis_angle(&right, -pitch_delta);

            let rotated = pitch * yaw * self.forward;
            self.forward = if rotated.dot(&*up).abs() < MAX_PITCH_COS {
                rotated
            } else {
                // too close to the pole, keep the yaw only
                yaw * self.forward
            };
            self.forward.renormalize();
        }

        self.reevaluate_view();
        self.reevaluate_rays();

        true
    }

    pub fn resize(&mut self, new_size: ViewportSize) {
        if self.viewport_size == new_size {
            return;
        }

        self.viewport_size = new_size;
        if new_size.is_empty() {
            warn!("camera resized to empty viewport {new_size}");
            self.rays.clear();
            return;
        }

        debug!("camera resized to {new_size}");
        self.reevaluate_projection();
        self.reevaluate_rays();
    }

    /// Places the camera directly. Refused, returning false, when `forward`
    /// is zero or points straight up or down.
    pub fn set_transform(&mut self, position: Point3<f32>, forward: Vector3<f32>) -> bool {
        let Some(forward) = Unit::try_new(forward, f32::EPSILON) else {
            warn!("ignoring zero camera forward direction");
            return false;
        };
        if forward.dot(&Vector3::y()).abs() >= MAX_PITCH_COS {
            warn!("ignoring camera forward direction parallel to world up");
            return false;
        }

        self.position = position;
        self.forward = forward;
        self.reevaluate_view();
        self.reevaluate_rays();
        true
    }

    pub fn rotation_speed(&self) -> f32 {
        0.3
    }

    pub fn movement_speed(&self) -> f32 {
        5.0
    }

    pub fn position(&self) -> Point3<f32> {
        self.position
    }

    pub fn forward(&self) -> Unit<Vector3<f32>> {
        self.forward
    }

    /// One world space direction per pixel, row major.
    pub fn rays(&self) -> &[Unit<Vector3<f32>>] {
        &self.rays
    }

    pub fn viewport_size(&self) -> ViewportSize {
        self.viewport_size
    }

    pub fn vertical_fov(&self) -> f32 {
        self.vertical_fov
    }

    pub fn projection(&self) -> &Matrix4<f32> {
        &self.projection
    }

    pub fn inverse_projection(&self) -> &Matrix4<f32> {
        &self.inverse_projection
    }

    pub fn view(&self) -> &Matrix4<f32> {
        &self.view
    }

    pub fn inverse_view(&self) -> &Matrix4<f32> {
        &self.inverse_view
    }

    fn reevaluate_projection(&mut self) {
        let perspective = Perspective3::new(
            self.viewport_size.aspect_ratio(),
            self.vertical_fov.to_radians(),
            self.near,
            self.far,
        );
        self.projection = perspective.to_homogeneous();
        self.inverse_projection = perspective.inverse();
    }

    fn reevaluate_view(&mut self) {
        let target = self.position + self.forward.into_inner();
        let view = Isometry3::look_at_rh(&self.position, &target, &Vector3::y_axis());
        self.view = view.to_homogeneous();
        self.inverse_view = view.inverse().to_homogeneous();
    }

    fn reevaluate_rays(&mut self) {
        if self.viewport_size.is_empty() {
            self.rays.clear();
            return;
        }

        let width = self.viewport_size.width;
        let height = self.viewport_size.height;
        let inverse_projection = &self.inverse_projection;
        let inverse_view = &self.inverse_view;

        self.rays = (0..self.viewport_size.pixel_count())
            .into_par_iter()
            .map(|index| {
                let x = (index % width as usize) as f32;
                let y = (index / width as usize) as f32;

                // row 0 is the top of the image
                let coord = Vector2::new(
                    x / width as f32 * 2.0 - 1.0,
                    1.0 - y / height as f32 * 2.0,
                );

                let target = inverse_projection * Vector4::new(coord.x, coord.y, 1.0, 1.0);
                let local = (target.xyz() / target.w).normalize();

                // w = 0 drops the translation part
                let world = inverse_view * local.push(0.0);
                Unit::new_normalize(world.xyz())
            })
            .collect();
    }
}
