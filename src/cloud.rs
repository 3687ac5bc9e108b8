//! Volumetric cloud medium sampled while marching through cloud volumes.

use glam::{Vec2, Vec3A};

use crate::ray::Color;
use crate::sdf::Object;
use crate::texture::Texture;

/// Base and tint colors blended into every cloud sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CloudPalette {
    /// Color of thin, sunlit cloud
    pub bright: Color,
    /// Color of dense cloud cores
    pub dark: Color,
    /// Tint applied towards the top of the volume, where the light enters
    pub light_tint: Color,
}

impl Default for CloudPalette {
    fn default() -> Self {
        Self {
            bright: Color::new(1.0, 0.98, 0.95),
            dark: Color::new(0.42, 0.45, 0.52),
            light_tint: Color::new(1.0, 0.86, 0.7),
        }
    }
}

/// Shape parameters of the cloud density field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CloudSettings {
    pub palette: CloudPalette,
    /// World-space frequency of the base noise octave
    pub noise_scale: f32,
    /// Raw density below which the cloud is empty
    pub threshold: f32,
    /// Opacity gained per unit length at full density
    pub absorption: f32,
    /// Smallest step taken inside a volume
    pub min_step: f32,
}

impl Default for CloudSettings {
    fn default() -> Self {
        Self {
            palette: CloudPalette::default(),
            noise_scale: 0.15,
            threshold: 0.5,
            absorption: 1.6,
            min_step: 0.02,
        }
    }
}

/// Noise octaves summed into the density field.
const OCTAVES: usize = 3;

/// Participating medium: settings plus the noise texture that drives density.
#[derive(Debug, Clone)]
pub struct CloudMedium {
    pub settings: CloudSettings,
    noise: Texture,
}

impl CloudMedium {
    pub fn new(settings: CloudSettings, noise: Texture) -> Self {
        Self { settings, noise }
    }

    /// Density in [0, 1] at a world point inside `volume`.
    pub fn density(&self, volume: &Object, p: Vec3A) -> f32 {
        let height = self.relative_height(volume, p);
        let falloff = smoothstep(0.0, 0.25, height) * (1.0 - smoothstep(0.55, 1.0, height));

        let mut raw = 0.0;
        let mut amplitude = 0.5;
        let mut total = 0.0;
        let mut frequency = self.settings.noise_scale;
        for octave in 0..OCTAVES {
            // Shear the 2D lookup by height so the field varies in all three axes.
            let shift = octave as f32 * 0.37;
            let uv = Vec2::new(p.x + p.y * 0.41 + shift, p.z - p.y * 0.23 - shift) * frequency;
            raw += amplitude * self.noise.sample_scalar(uv);
            total += amplitude;
            amplitude *= 0.5;
            frequency *= 2.03;
        }
        let raw = raw / total * falloff;

        let threshold = self.settings.threshold.clamp(0.0, 0.999);
        ((raw - threshold) / (1.0 - threshold)).clamp(0.0, 1.0)
    }

    /// Light scattered towards the viewer by a sample of the given density.
    pub fn color(&self, volume: &Object, p: Vec3A, density: f32, light: Color) -> Color {
        let palette = &self.settings.palette;
        let height = self.relative_height(volume, p);
        let base = palette.bright.lerp(palette.dark, density);
        let tint = Color::ONE.lerp(palette.light_tint, height);
        base * tint * light
    }

    /// Opacity of one march step of length `step` through `density`.
    pub fn step_opacity(&self, density: f32, step: f32) -> f32 {
        1.0 - (-density * self.settings.absorption * step).exp()
    }

    /// Height of `p` within the volume's local box, 0 at the bottom and 1 at the top.
    fn relative_height(&self, volume: &Object, p: Vec3A) -> f32 {
        let local = volume.transform.to_local(p);
        let half = volume.transform.scale().y.max(1e-6);
        (local.y / half * 0.5 + 0.5).clamp(0.0, 1.0)
    }
}

pub(crate) fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Material;
    use crate::sdf::ShapeKind;
    use crate::transform::Transform;
    use approx::assert_abs_diff_eq;

    fn volume() -> Object {
        Object::new(
            ShapeKind::CloudVolume,
            Transform::at(Vec3A::ZERO, Vec3A::new(4.0, 1.0, 4.0)),
            Material::default(),
        )
    }

    #[test]
    fn uniform_noise_below_threshold_is_empty() {
        let medium = CloudMedium::new(CloudSettings::default(), Texture::solid(Vec3A::splat(0.4)));
        assert_eq!(medium.density(&volume(), Vec3A::ZERO), 0.0);
    }

    #[test]
    fn saturated_noise_is_dense_mid_volume_and_fades_at_edges() {
        let medium = CloudMedium::new(CloudSettings::default(), Texture::solid(Vec3A::ONE));
        let obj = volume();
        let mid = medium.density(&obj, Vec3A::new(0.0, -0.2, 0.0));
        assert!(mid > 0.5, "mid density {mid}");
        assert_eq!(medium.density(&obj, Vec3A::new(0.0, -1.0, 0.0)), 0.0);
        assert_eq!(medium.density(&obj, Vec3A::new(0.0, 1.0, 0.0)), 0.0);
    }

    #[test]
    fn color_stays_within_palette() {
        let medium = CloudMedium::new(CloudSettings::default(), Texture::solid(Vec3A::ONE));
        let c = medium.color(&volume(), Vec3A::ZERO, 0.7, Color::ONE);
        assert!(c.max_element() <= 1.0);
        assert!(c.min_element() >= 0.0);
    }

    #[test]
    fn opacity_grows_with_step() {
        let medium = CloudMedium::new(CloudSettings::default(), Texture::solid(Vec3A::ONE));
        assert_abs_diff_eq!(medium.step_opacity(0.0, 1.0), 0.0, epsilon = 1e-6);
        assert!(medium.step_opacity(1.0, 0.1) < medium.step_opacity(1.0, 0.5));
        assert!(medium.step_opacity(1.0, 100.0) <= 1.0);
    }
}
