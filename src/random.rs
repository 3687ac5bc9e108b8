//! Random number generation for path tracing.
//!
//! Every path owns one [`RandomState`] and threads it by `&mut` through every
//! call that needs randomness. There is no global or thread-local generator, so a
//! path is fully reproducible from its seed.

use glam::{Vec2, Vec3A};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Per-path pseudo-random state.
///
/// Each draw advances the generator in place.
#[derive(Debug, Clone)]
pub struct RandomState {
    rng: ChaCha8Rng,
}

impl RandomState {
    /// Create a generator from an explicit seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Seed a generator from a pixel coordinate and a time value.
    ///
    /// Neighbouring pixels and successive frames get decorrelated streams.
    pub fn from_pixel(uv: Vec2, time: f32) -> Self {
        let mut h = mix64(u64::from(uv.x.to_bits()));
        h = mix64(h ^ u64::from(uv.y.to_bits()).rotate_left(21));
        h = mix64(h ^ u64::from(time.to_bits()).rotate_left(42));
        Self::new(h)
    }

    /// Generate a random f32 in [0.0, 1.0)
    pub fn next_f32(&mut self) -> f32 {
        self.rng.random()
    }

    /// Generate a random f32 in [min, max)
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        min + (max - min) * self.next_f32()
    }

    /// Generate random unit vector uniformly distributed on unit sphere.
    pub fn unit_vector(&mut self) -> Vec3A {
        // Generate uniform θ in [0, 2π)
        let theta = 2.0 * std::f32::consts::PI * self.next_f32();

        // Generate uniform cos(φ) in [-1, 1] for proper sphere distribution
        let cos_phi = 2.0 * self.next_f32() - 1.0;
        let sin_phi = (1.0 - cos_phi * cos_phi).max(0.0).sqrt();

        Vec3A::new(sin_phi * theta.cos(), sin_phi * theta.sin(), cos_phi)
    }

    /// Cosine-weighted direction on the hemisphere around `normal`.
    pub fn cosine_hemisphere(&mut self, normal: Vec3A) -> Vec3A {
        let direction = normal + self.unit_vector();

        // Catch degenerate scatter direction (very close to zero)
        if direction.length_squared() < 1e-8 {
            return normal;
        }
        direction.normalize()
    }

    /// Generate random point inside unit disk using rejection sampling.
    pub fn in_unit_disk(&mut self) -> Vec2 {
        loop {
            let p = Vec2::new(self.range(-1.0, 1.0), self.range(-1.0, 1.0));
            if p.length_squared() < 1.0 {
                return p;
            }
        }
    }
}

/// SplitMix64 finalizer.
fn mix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
