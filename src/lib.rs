use anyhow::Context;
use clap::Parser;
use log::info;

use crate::app::{Application, Options};
use crate::config::RenderConfig;

pub mod app;
pub mod camera;
pub mod config;
pub mod error;
pub mod lantern;
pub mod util;

pub use crate::camera::{Camera, CameraInput};
pub use crate::error::{ConfigError, RenderError};
pub use crate::lantern::scene::{Material, Scene, Sphere};
pub use crate::lantern::{Lantern, Settings};
pub use crate::util::ViewportSize;

/// Entry point of the `lantern` binary: renders a fixed number of frames
/// without a window and writes the result as PNG.
pub fn run() -> anyhow::Result<()> {
    env_logger::init();

    let options = Options::parse();
    let mut config = match &options.config {
        Some(path) => RenderConfig::load(path)?,
        None => RenderConfig::default(),
    };
    options.apply(&mut config);

    let mut application = Application::from_config(&config)?;
    info!(
        "rendering {} frame(s) at {} into {}",
        config.frames,
        config.viewport_size(),
        config.output.display()
    );

    for _ in 0..config.frames {
        application.render()?;
    }

    application
        .lantern()
        .final_image()
        .save(&config.output)
        .with_context(|| format!("failed to write {}", config.output.display()))?;
    info!("wrote {}", config.output.display());

    Ok(())
}
