//! Settings for a headless render, read from TOML.

use std::fs;
use std::path::{Path, PathBuf};

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::camera::Camera;
use crate::error::ConfigError;
use crate::lantern::scene::Scene;
use crate::util::ViewportSize;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    /// Number of frames to accumulate before writing the image.
    pub frames: u32,
    pub accumulate: bool,
    pub output: PathBuf,
    pub camera: CameraConfig,
    /// Falls back to [`Scene::showcase`] when absent.
    pub scene: Option<Scene>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Degrees.
    pub vertical_fov: f32,
    pub near: f32,
    pub far: f32,
    pub position: Point3<f32>,
    pub forward: Vector3<f32>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            frames: 64,
            accumulate: true,
            output: PathBuf::from("lantern.png"),
            camera: CameraConfig::default(),
            scene: None,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            vertical_fov: 45.0,
            near: 0.1,
            far: 100.0,
            position: Point3::new(0.0, 0.0, 6.0),
            forward: Vector3::new(0.0, 0.0, -1.0),
        }
    }
}

impl RenderConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn viewport_size(&self) -> ViewportSize {
        ViewportSize::new(self.width, self.height)
    }

    pub fn build_scene(&self) -> Scene {
        self.scene.clone().unwrap_or_else(Scene::showcase)
    }
}

impl CameraConfig {
    /// Fails instead of falling back to the default placement when
    /// `forward` can't orient a camera.
    pub fn build(&self) -> Result<Camera, ConfigError> {
        let mut camera = Camera::new(self.vertical_fov, self.near, self.far);
        if !camera.set_transform(self.position, self.forward) {
            return Err(ConfigError::InvalidCamera {
                forward: [self.forward.x, self.forward.y, self.forward.z],
            });
        }
        Ok(camera)
    }
}
