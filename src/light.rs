//! The scene's single directional light.

use glam::Vec3A;

use crate::ray::Color;

/// Distant light such as the sun.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    /// Unit direction pointing from the scene towards the light
    pub direction: Vec3A,
    pub color: Color,
    pub intensity: f32,
    /// Attenuation applied to light that reaches a path from the sky
    pub attenuation: f32,
    /// Exponent of the highlight seen when looking into the light
    pub highlight_power: f32,
    /// Radius of the random offset applied to shadow ray origins
    pub shadow_jitter: f32,
}

impl DirectionalLight {
    pub fn new(direction: Vec3A, color: Color, intensity: f32) -> Self {
        Self {
            direction: direction.normalize_or(Vec3A::Y),
            color,
            intensity,
            ..Self::default()
        }
    }

    /// Color scaled by intensity.
    pub fn radiance(&self) -> Color {
        self.color * self.intensity
    }

    /// Phong-like highlight for a ray escaping in `direction`.
    pub fn highlight(&self, direction: Vec3A) -> Color {
        let alignment = direction.dot(self.direction).max(0.0);
        self.radiance() * alignment.powf(self.highlight_power.max(1.0))
    }
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: Vec3A::new(0.4, 0.8, 0.45).normalize(),
            color: Color::new(1.0, 0.95, 0.88),
            intensity: 2.5,
            attenuation: 1.0,
            highlight_power: 800.0,
            shadow_jitter: 0.01,
        }
    }
}
