//! Sampled textures: environment maps, fractal noise and material maps.
//!
//! Textures are stored as linear f32 RGB and sampled bilinearly with repeat
//! wrapping. They are immutable once built and shared by all pixel workers.

use std::f32::consts::{PI, TAU};
use std::path::Path;

use glam::{Vec2, Vec3A};
use image::{Rgb, Rgb32FImage};
use log::debug;
use noise::{Fbm, MultiFractal, NoiseFn, Perlin};

use crate::error::Result;

/// Bilinearly filtered, repeat-wrapped RGB texture.
#[derive(Debug, Clone)]
pub struct Texture {
    image: Rgb32FImage,
}

impl Texture {
    /// Wrap an existing image. Empty images are replaced by a single black texel.
    pub fn new(image: Rgb32FImage) -> Self {
        if image.width() == 0 || image.height() == 0 {
            return Self::solid(Vec3A::ZERO);
        }
        Self { image }
    }

    /// Load a texture from disk (PNG, JPEG, Radiance HDR, OpenEXR, ...).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let image = image::open(path)?.into_rgb32f();
        debug!("Loaded texture {} ({}x{})", path.display(), image.width(), image.height());
        Ok(Self::new(image))
    }

    /// Single-texel texture of a constant color.
    pub fn solid(color: Vec3A) -> Self {
        Self {
            image: Rgb32FImage::from_pixel(1, 1, Rgb([color.x, color.y, color.z])),
        }
    }

    /// Generate a tileable multi-octave fractal noise texture in [0, 1].
    ///
    /// The square is wrapped onto a torus in 4D noise space so the result tiles
    /// seamlessly in both directions.
    pub fn fractal_noise(size: u32, seed: u32, octaves: usize) -> Self {
        let size = size.max(1);
        let fbm = Fbm::<Perlin>::new(seed).set_octaves(octaves.max(1));
        let radius = 1.5_f64;
        let image = Rgb32FImage::from_fn(size, size, |x, y| {
            let a = f64::from(x) / f64::from(size) * std::f64::consts::TAU;
            let b = f64::from(y) / f64::from(size) * std::f64::consts::TAU;
            let value = fbm.get([radius * a.cos(), radius * a.sin(), radius * b.cos(), radius * b.sin()]);
            let v = ((value * 0.5 + 0.5) as f32).clamp(0.0, 1.0);
            Rgb([v, v, v])
        });
        debug!("Generated {size}x{size} fractal noise texture (seed {seed}, {octaves} octaves)");
        Self { image }
    }

    fn texel(&self, x: i64, y: i64) -> Vec3A {
        let w = i64::from(self.image.width());
        let h = i64::from(self.image.height());
        let px = self.image.get_pixel(x.rem_euclid(w) as u32, y.rem_euclid(h) as u32);
        Vec3A::new(px[0], px[1], px[2])
    }

    /// Bilinear sample at `uv`; (0, 0) is the top-left corner of the image.
    pub fn sample(&self, uv: Vec2) -> Vec3A {
        if !uv.is_finite() {
            return self.texel(0, 0);
        }
        let x = uv.x * self.image.width() as f32 - 0.5;
        let y = uv.y * self.image.height() as f32 - 0.5;
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let top = self.texel(x0, y0).lerp(self.texel(x0 + 1, y0), fx);
        let bottom = self.texel(x0, y0 + 1).lerp(self.texel(x0 + 1, y0 + 1), fx);
        top.lerp(bottom, fy)
    }

    /// Red channel at `uv`, for single-channel textures.
    pub fn sample_scalar(&self, uv: Vec2) -> f32 {
        self.sample(uv).x
    }

    /// Triplanar projection blended by the squared normal components.
    pub fn sample_triplanar(&self, p: Vec3A, normal: Vec3A, scale: f32) -> Vec3A {
        let weights = normal * normal;
        let total = weights.x + weights.y + weights.z;
        let weights = if total > 0.0 { weights / total } else { Vec3A::splat(1.0 / 3.0) };
        let q = p * scale;
        self.sample(Vec2::new(q.y, q.z)) * weights.x
            + self.sample(Vec2::new(q.z, q.x)) * weights.y
            + self.sample(Vec2::new(q.x, q.y)) * weights.z
    }

    /// Look up an equirectangular (latitude/longitude) map by direction.
    pub fn sample_equirect(&self, direction: Vec3A) -> Vec3A {
        self.sample(direction_to_equirect(direction))
    }
}

/// Spherical UV of a unit direction: u follows the azimuth, v = 0 straight up.
pub fn direction_to_equirect(direction: Vec3A) -> Vec2 {
    let d = direction.normalize_or(Vec3A::Y);
    let u = 0.5 + d.z.atan2(d.x) / TAU;
    let v = d.y.clamp(-1.0, 1.0).acos() / PI;
    Vec2::new(u, v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn solid_texture_is_constant() {
        let tex = Texture::solid(Vec3A::new(0.2, 0.4, 0.6));
        for uv in [Vec2::ZERO, Vec2::new(0.3, 0.9), Vec2::new(-4.2, 17.5)] {
            assert!(tex.sample(uv).abs_diff_eq(Vec3A::new(0.2, 0.4, 0.6), 1e-6));
        }
    }

    #[test]
    fn bilinear_blends_neighbours() {
        let image = Rgb32FImage::from_fn(2, 1, |x, _| if x == 0 { Rgb([0.0; 3]) } else { Rgb([1.0; 3]) });
        let tex = Texture::new(image);
        // Halfway between the two texel centres.
        assert_abs_diff_eq!(tex.sample_scalar(Vec2::new(0.5, 0.5)), 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(tex.sample_scalar(Vec2::new(0.25, 0.5)), 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(tex.sample_scalar(Vec2::new(0.75, 0.5)), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn triplanar_weights_sum_to_one() {
        let tex = Texture::solid(Vec3A::ONE);
        let n = Vec3A::new(0.3, -0.8, 0.52).normalize();
        let c = tex.sample_triplanar(Vec3A::new(1.2, 3.4, -0.7), n, 2.0);
        assert!(c.abs_diff_eq(Vec3A::ONE, 1e-5));
    }

    #[test]
    fn equirect_poles_and_horizon() {
        assert_abs_diff_eq!(direction_to_equirect(Vec3A::Y).y, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(direction_to_equirect(Vec3A::NEG_Y).y, 1.0, epsilon = 1e-6);
        let horizon = direction_to_equirect(Vec3A::X);
        assert_abs_diff_eq!(horizon.x, 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(horizon.y, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn fractal_noise_tiles_and_stays_in_range() {
        let tex = Texture::fractal_noise(32, 3, 4);
        for i in 0..32 {
            let uv = Vec2::new(i as f32 / 32.0, 0.37);
            let v = tex.sample_scalar(uv);
            assert!((0.0..=1.0).contains(&v));
            assert_abs_diff_eq!(v, tex.sample_scalar(uv + Vec2::new(1.0, 0.0)), epsilon = 1e-5);
        }
    }
}
