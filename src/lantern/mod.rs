use std::time::{Duration, Instant};

use log::{debug, trace};
use nalgebra::Vector4;
use rayon::prelude::*;

use crate::camera::Camera;
use crate::error::RenderError;
use crate::lantern::buffer::PixelBuffer;
use crate::lantern::scene::Scene;
use crate::lantern::texture::Image;
use crate::lantern::tracer::RenderContext;
use crate::util::{vec4_to_rgba, ViewportSize};

pub mod buffer;
pub mod ray;
pub mod scene;
pub mod texture;
pub mod tracer;

#[derive(Debug, Clone)]
pub struct Settings {
    pub accumulate: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self { accumulate: true }
    }
}

/// Progressive path tracer. Every [`Lantern::render`] adds one sample per
/// pixel to the running sum and publishes the average.
pub struct Lantern {
    final_image: Image,
    image_data: PixelBuffer<u32>,
    accumulation: PixelBuffer<Vector4<f32>>,
    frame_index: u32,
    pub settings: Settings,
    last_render_time: Duration,
}

impl Default for Lantern {
    fn default() -> Self {
        Self::new(ViewportSize::default())
    }
}

impl Lantern {
    pub fn new(viewport_size: ViewportSize) -> Self {
        Self {
            final_image: Image::new(viewport_size),
            image_data: PixelBuffer::new(viewport_size),
            accumulation: PixelBuffer::new(viewport_size),
            frame_index: 1,
            settings: Default::default(),
            last_render_time: Duration::ZERO,
        }
    }

    /// Reallocates every buffer when the size changed. The accumulated
    /// samples are gone afterwards, so accumulation restarts at frame 1.
    pub fn resize(&mut self, new_size: ViewportSize) {
        if self.accumulation.size() == new_size {
            return;
        }

        debug!("renderer resized from {} to {new_size}", self.accumulation.size());
        self.final_image.resize(new_size);
        self.image_data.resize(new_size);
        self.accumulation.resize(new_size);
        self.frame_index = 1;
    }

    /// Renders one frame of `scene` as seen by `camera`.
    ///
    /// The camera must have been resized to the same viewport as the renderer.
    /// On error nothing is accumulated or published and the frame index stays.
    pub fn render(&mut self, scene: &Scene, camera: &Camera) -> Result<(), RenderError> {
        let size = self.accumulation.size();
        if camera.viewport_size() != size || camera.rays().len() != size.pixel_count() {
            return Err(RenderError::DimensionMismatch {
                expected: size,
                actual: camera.viewport_size(),
            });
        }
        scene.validate()?;

        let started = Instant::now();

        if self.frame_index == 1 {
            trace!("clearing accumulation buffer");
            self.accumulation.clear();
        }

        let context = RenderContext::new(scene, camera, self.frame_index);
        let width = size.width as usize;
        let frame_index = self.frame_index as f32;

        self.accumulation
            .as_mut_slice()
            .par_iter_mut()
            .zip(self.image_data.as_mut_slice().par_iter_mut())
            .enumerate()
            .for_each(|(index, (accumulated, pixel))| {
                let x = (index % width) as u32;
                let y = (index / width) as u32;

                *accumulated += context.per_pixel(x, y);

                let color = (*accumulated / frame_index).map(|channel| channel.clamp(0.0, 1.0));
                *pixel = vec4_to_rgba(&color);
            });

        self.final_image.load_image(self.image_data.as_slice())?;

        self.last_render_time = started.elapsed();
        debug!(
            "frame {} rendered at {size} in {:.3}ms",
            self.frame_index,
            self.last_render_time.as_secs_f64() * 1000.0
        );

        if self.settings.accumulate {
            self.frame_index = self.frame_index.saturating_add(1);
        } else {
            self.frame_index = 1;
        }

        Ok(())
    }

    /// The next frame starts a fresh accumulation.
    pub fn reset_frame_index(&mut self) {
        self.frame_index = 1;
    }

    pub fn frame_index(&self) -> u32 {
        self.frame_index
    }

    pub fn final_image(&self) -> &Image {
        &self.final_image
    }

    /// Running sum of every sample since the last reset, not yet divided.
    pub fn accumulation(&self) -> &PixelBuffer<Vector4<f32>> {
        &self.accumulation
    }

    pub fn size(&self) -> ViewportSize {
        self.accumulation.size()
    }

    pub fn last_render_time(&self) -> Duration {
        self.last_render_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lantern::scene::{Material, Sphere};
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn setup(width: u32, height: u32) -> (Lantern, Camera) {
        let size = ViewportSize::new(width, height);
        let mut camera = Camera::new(45.0, 0.1, 100.0);
        camera.resize(size);
        let mut lantern = Lantern::default();
        lantern.resize(size);
        (lantern, camera)
    }

    #[test]
    fn frame_index_counts_up_while_accumulating() {
        let (mut lantern, camera) = setup(4, 3);
        let scene = Scene::showcase();

        assert_eq!(lantern.frame_index(), 1);
        for expected in 2..=5 {
            lantern.render(&scene, &camera).unwrap();
            assert_eq!(lantern.frame_index(), expected);
        }
    }

    #[test]
    fn frame_index_stays_at_one_without_accumulation() {
        let (mut lantern, camera) = setup(4, 3);
        let scene = Scene::showcase();
        lantern.settings.accumulate = false;

        for _ in 0..3 {
            lantern.render(&scene, &camera).unwrap();
            assert_eq!(lantern.frame_index(), 1);
        }
    }

    #[test]
    fn accumulation_is_the_sum_of_every_frame() {
        let (mut lantern, camera) = setup(5, 4);
        let scene = Scene::showcase();
        let frames = 4;

        for _ in 0..frames {
            lantern.render(&scene, &camera).unwrap();
        }

        for y in 0..4 {
            for x in 0..5 {
                let expected: Vector4<f32> = (1..=frames)
                    .map(|frame| RenderContext::new(&scene, &camera, frame).per_pixel(x, y))
                    .sum();
                let accumulated = lantern.accumulation().get(x, y).unwrap();

                assert_relative_eq!(*accumulated, expected, epsilon = 1e-4);
                assert_relative_eq!(
                    *accumulated / frames as f32,
                    expected / frames as f32,
                    epsilon = 1e-4
                );
            }
        }
    }

    #[test]
    fn displayed_pixels_are_the_clamped_average() {
        let (mut lantern, camera) = setup(6, 4);
        let scene = Scene::showcase();

        lantern.render(&scene, &camera).unwrap();
        lantern.render(&scene, &camera).unwrap();

        let frames = (lantern.frame_index() - 1) as f32;
        for (accumulated, pixel) in lantern
            .accumulation()
            .as_slice()
            .iter()
            .zip(lantern.final_image().pixels())
        {
            let color = (accumulated / frames).map(|channel| channel.clamp(0.0, 1.0));
            assert_eq!(*pixel, vec4_to_rgba(&color));
            assert_eq!(pixel >> 24, 0xFF);
        }
    }

    #[test]
    fn empty_scene_renders_opaque_black() {
        let (mut lantern, camera) = setup(3, 3);
        lantern.render(&Scene::default(), &camera).unwrap();

        assert!(lantern.final_image().pixels().iter().all(|&pixel| pixel == 0xFF00_0000));
        assert!(lantern
            .accumulation()
            .as_slice()
            .iter()
            .all(|color| color.xyz() == Vector3::zeros()));
    }

    #[test]
    fn reset_starts_a_fresh_accumulation() {
        let (mut lantern, camera) = setup(4, 4);
        let scene = Scene::showcase();

        lantern.render(&scene, &camera).unwrap();
        lantern.render(&scene, &camera).unwrap();
        lantern.reset_frame_index();
        assert_eq!(lantern.frame_index(), 1);

        lantern.render(&scene, &camera).unwrap();

        let context = RenderContext::new(&scene, &camera, 1);
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(*lantern.accumulation().get(x, y).unwrap(), context.per_pixel(x, y));
            }
        }
    }

    #[test]
    fn disabling_accumulation_clears_on_the_following_frame() {
        let (mut lantern, camera) = setup(4, 4);
        let scene = Scene::showcase();

        for _ in 0..3 {
            lantern.render(&scene, &camera).unwrap();
        }
        assert_eq!(lantern.frame_index(), 4);

        lantern.settings.accumulate = false;
        lantern.render(&scene, &camera).unwrap();
        assert_eq!(lantern.frame_index(), 1);

        // this frame has index 1 and must start from an empty buffer
        lantern.render(&scene, &camera).unwrap();
        let context = RenderContext::new(&scene, &camera, 1);
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(*lantern.accumulation().get(x, y).unwrap(), context.per_pixel(x, y));
            }
        }
    }

    #[test]
    fn resize_to_same_size_keeps_the_accumulation() {
        let (mut lantern, camera) = setup(4, 4);
        let scene = Scene::showcase();
        lantern.render(&scene, &camera).unwrap();

        let accumulation = lantern.accumulation().clone();
        let pixels = lantern.final_image().pixels().to_vec();

        lantern.resize(ViewportSize::new(4, 4));
        lantern.resize(ViewportSize::new(4, 4));

        assert_eq!(lantern.accumulation(), &accumulation);
        assert_eq!(lantern.final_image().pixels(), pixels.as_slice());
    }

    #[test]
    fn resize_reallocates_every_buffer() {
        let (mut lantern, _) = setup(4, 4);
        lantern.resize(ViewportSize::new(8, 2));

        assert_eq!(lantern.size(), ViewportSize::new(8, 2));
        assert_eq!(lantern.accumulation().len(), 16);
        assert_eq!(lantern.final_image().size(), ViewportSize::new(8, 2));
    }

    #[test]
    fn resize_restarts_accumulation() {
        let (mut lantern, mut camera) = setup(4, 4);
        let scene = Scene::showcase();
        lantern.render(&scene, &camera).unwrap();
        lantern.render(&scene, &camera).unwrap();

        lantern.resize(ViewportSize::new(3, 3));
        camera.resize(ViewportSize::new(3, 3));
        assert_eq!(lantern.frame_index(), 1);

        lantern.render(&scene, &camera).unwrap();
        let context = RenderContext::new(&scene, &camera, 1);
        assert_eq!(*lantern.accumulation().get(2, 2).unwrap(), context.per_pixel(2, 2));
    }

    #[test]
    fn mismatched_camera_is_rejected() {
        let (mut lantern, mut camera) = setup(4, 4);
        let scene = Scene::showcase();
        lantern.render(&scene, &camera).unwrap();
        let pixels = lantern.final_image().pixels().to_vec();

        camera.resize(ViewportSize::new(5, 4));
        assert_eq!(
            lantern.render(&scene, &camera),
            Err(RenderError::DimensionMismatch {
                expected: ViewportSize::new(4, 4),
                actual: ViewportSize::new(5, 4),
            })
        );
        assert_eq!(lantern.frame_index(), 2);
        assert_eq!(lantern.final_image().pixels(), pixels.as_slice());
    }

    #[test]
    fn invalid_material_fails_the_whole_frame() {
        let (mut lantern, camera) = setup(4, 4);
        let mut scene = Scene::showcase();
        scene.add_sphere(Sphere {
            material_index: 42,
            ..Default::default()
        });

        assert!(matches!(
            lantern.render(&scene, &camera),
            Err(RenderError::InvalidMaterialIndex { sphere: 3, material_index: 42, .. })
        ));
        assert_eq!(lantern.frame_index(), 1);
        assert!(lantern.final_image().pixels().iter().all(|&pixel| pixel == 0));
    }

    #[test]
    fn bright_emitter_saturates() {
        let (mut lantern, camera) = setup(2, 2);
        let mut scene = Scene::default();
        let sun = scene.add_material(Material {
            emission_color: Vector3::new(1.0, 1.0, 1.0),
            emission_power: 10.0,
            ..Default::default()
        });
        scene.add_sphere(Sphere {
            position: Vector3::zeros(),
            radius: 1.0,
            material_index: sun,
        });

        lantern.render(&scene, &camera).unwrap();
        // the center pixel looks straight at the sphere
        assert_eq!(lantern.final_image().pixels()[3], 0xFFFF_FFFF);
    }
}
