use std::path::Path;

use bytemuck::cast_slice;
use image::{ColorType, ImageResult};

use crate::error::RenderError;
use crate::util::ViewportSize;

/// Display surface for the renderer: holds whatever was uploaded last, one
/// packed RGBA word per pixel.
pub struct Image {
    size: ViewportSize,
    pixels: Vec<u32>,
}

impl Image {
    pub fn new(size: ViewportSize) -> Image {
        Self {
            size,
            pixels: vec![0; size.pixel_count()],
        }
    }

    /// Replaces the whole surface at once. The buffer must cover it exactly.
    pub fn load_image(&mut self, rgba: &[u32]) -> Result<(), RenderError> {
        if rgba.len() != self.size.pixel_count() {
            return Err(RenderError::DimensionMismatch {
                expected: self.size,
                actual: ViewportSize::new(rgba.len() as u32, 1),
            });
        }

        self.pixels.copy_from_slice(rgba);
        Ok(())
    }

    pub fn resize(&mut self, new_size: ViewportSize) {
        if self.size == new_size {
            return;
        }

        self.size = new_size;
        self.pixels = vec![0; new_size.pixel_count()];
    }

    pub fn size(&self) -> ViewportSize {
        self.size
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Packed words are R in the low byte, so on little endian machines the
    /// raw bytes are already RGBA8.
    pub fn to_rgba8(&self) -> Vec<u8> {
        if cfg!(target_endian = "little") {
            cast_slice::<u32, u8>(&self.pixels).to_vec()
        } else {
            self.pixels.iter().flat_map(|pixel| pixel.to_le_bytes()).collect()
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        image::save_buffer(
            path,
            &self.to_rgba8(),
            self.size.width,
            self.size.height,
            ColorType::Rgba8,
        )
    }
}
