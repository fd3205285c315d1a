use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use log::trace;

use crate::camera::{Camera, CameraInput};
use crate::config::RenderConfig;
use crate::error::{ConfigError, RenderError};
use crate::lantern::scene::Scene;
use crate::lantern::Lantern;
use crate::util::ViewportSize;

/// Command line options of the `lantern` binary.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about = "Progressive CPU path tracer", long_about = None)]
pub struct Options {
    /// TOML render configuration. Built in defaults are used without one.
    #[clap(value_name = "CONFIG")]
    pub config: Option<PathBuf>,

    #[clap(long = "output", short = 'o', value_name = "FILE", help = "Write the final image to the given PNG file.")]
    pub output: Option<PathBuf>,

    #[clap(long = "frames", short = 'f', value_name = "NUM", help = "Number of frames to accumulate.")]
    pub frames: Option<u32>,

    #[clap(long, value_name = "PIXELS")]
    pub width: Option<u32>,

    #[clap(long, value_name = "PIXELS")]
    pub height: Option<u32>,

    #[clap(long = "no-accumulate", help = "Render every frame from scratch.")]
    pub no_accumulate: bool,
}

impl Options {
    /// Command line flags win over the configuration file.
    pub fn apply(&self, config: &mut RenderConfig) {
        if let Some(output) = &self.output {
            config.output = output.clone();
        }
        if let Some(frames) = self.frames {
            config.frames = frames;
        }
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if self.no_accumulate {
            config.accumulate = false;
        }
    }
}

/// Owns everything the interactive viewer would: the scene being edited, the
/// camera the user flies around and the renderer.
pub struct Application {
    camera: Camera,
    scene: Scene,
    lantern: Lantern,
    viewport_size: ViewportSize,
}

impl Application {
    pub fn new(camera: Camera, scene: Scene, viewport_size: ViewportSize) -> Self {
        Self {
            camera,
            scene,
            lantern: Lantern::default(),
            viewport_size,
        }
    }

    pub fn from_config(config: &RenderConfig) -> Result<Self, ConfigError> {
        let mut application = Self::new(
            config.camera.build()?,
            config.build_scene(),
            config.viewport_size(),
        );
        application.lantern.settings.accumulate = config.accumulate;
        Ok(application)
    }

    /// Feeds one tick of input to the camera. Moving the camera throws the
    /// accumulated image away.
    pub fn update(&mut self, time_step: f32, input: &CameraInput) -> bool {
        let moved = self.camera.update(time_step, input);
        if moved {
            trace!("camera moved, resetting accumulation");
            self.lantern.reset_frame_index();
        }
        moved
    }

    /// Brings the camera and renderer to the current viewport size, then
    /// renders one frame.
    pub fn render(&mut self) -> Result<(), RenderError> {
        self.lantern.resize(self.viewport_size);
        self.camera.resize(self.viewport_size);
        self.lantern.render(&self.scene, &self.camera)
    }

    pub fn set_viewport_size(&mut self, viewport_size: ViewportSize) {
        self.viewport_size = viewport_size;
    }

    pub fn viewport_size(&self) -> ViewportSize {
        self.viewport_size
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Scene edits only ever happen between frames, `render` borrows it immutably.
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn lantern(&self) -> &Lantern {
        &self.lantern
    }

    pub fn lantern_mut(&mut self) -> &mut Lantern {
        &mut self.lantern
    }

    pub fn last_render_time(&self) -> Duration {
        self.lantern.last_render_time()
    }
}
