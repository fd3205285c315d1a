use std::fmt;

use nalgebra::{Unit, Vector3, Vector4};
use rand::{Error, RngCore, SeedableRng};

/// Size of a viewport, display surface or pixel buffer, in pixels.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

impl ViewportSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

impl fmt::Display for ViewportSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// One round of the PCG output permutation used as a stateless hash.
pub fn pcg_hash(input: u32) -> u32 {
    let state = input.wrapping_mul(747_796_405).wrapping_add(2_891_336_453);
    let word = ((state >> ((state >> 28) + 4)) ^ state).wrapping_mul(277_803_737);
    (word >> 22) ^ word
}

/// Tiny generator whose whole state is a 32 bit seed that gets re-hashed on
/// every draw. Same seed, same sequence, on every platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcgRng {
    state: u32,
}

impl PcgRng {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    pub fn state(&self) -> u32 {
        self.state
    }

    /// Nudges the seed without drawing, used to decorrelate bounces.
    pub fn perturb(&mut self, offset: u32) {
        self.state = self.state.wrapping_add(offset);
    }
}

impl RngCore for PcgRng {
    fn next_u32(&mut self) -> u32 {
        self.state = pcg_hash(self.state);
        self.state
    }

    fn next_u64(&mut self) -> u64 {
        let high = u64::from(self.next_u32());
        let low = u64::from(self.next_u32());
        (high << 32) | low
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        dest.chunks_mut(4).for_each(|chunk| {
            let bytes = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        });
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for PcgRng {
    type Seed = [u8; 4];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u32::from_le_bytes(seed))
    }
}

/// Float in [0, 1) built from the top 24 bits of the next draw.
pub fn random_float<R: RngCore + ?Sized>(rng: &mut R) -> f32 {
    const SCALE: f32 = 1.0 / (1u32 << 24) as f32;
    (rng.next_u32() >> 8) as f32 * SCALE
}

/// Direction made of three draws in [-1, 1], normalized.
///
/// Not exactly uniform over the sphere (the cube corners are over-represented)
/// but good enough for a diffuse bounce.
pub fn in_unit_sphere<R: RngCore + ?Sized>(rng: &mut R) -> Unit<Vector3<f32>> {
    loop {
        let candidate = Vector3::new(
            random_float(rng) * 2.0 - 1.0,
            random_float(rng) * 2.0 - 1.0,
            random_float(rng) * 2.0 - 1.0,
        );

        if let Some(direction) = Unit::try_new(candidate, f32::EPSILON) {
            return direction;
        }
    }
}

/// Packs a color with channels in [0, 1] as `(A << 24) | (B << 16) | (G << 8) | R`.
pub fn vec4_to_rgba(color: &Vector4<f32>) -> u32 {
    // float to int casts saturate, so this is floor() for anything in range
    let channel = |value: f32| (value.clamp(0.0, 1.0) * 255.0) as u8 as u32;

    (channel(color.w) << 24) | (channel(color.z) << 16) | (channel(color.y) << 8) | channel(color.x)
}
