//! Radiance arriving from outside the scene.

use glam::Vec3A;

use crate::light::DirectionalLight;
use crate::ray::Color;
use crate::texture::Texture;

/// Sky seen by rays that escape the scene.
///
/// Uses an equirectangular HDRI when one is configured, otherwise a vertical
/// gradient between the horizon and zenith colors.
#[derive(Debug, Clone)]
pub struct Environment {
    pub map: Option<Texture>,
    pub horizon: Color,
    pub zenith: Color,
    /// Multiplier applied to the sky
    pub intensity: f32,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            map: None,
            horizon: Color::new(1.0, 1.0, 1.0),
            zenith: Color::new(0.5, 0.7, 1.0),
            intensity: 1.0,
        }
    }
}

impl Environment {
    pub fn from_map(map: Texture) -> Self {
        Self {
            map: Some(map),
            ..Self::default()
        }
    }

    /// Sky color in `direction`, without the light's highlight.
    pub fn sample(&self, direction: Vec3A) -> Color {
        let sky = match &self.map {
            Some(map) => map.sample_equirect(direction),
            None => {
                // Blend factor: Y = -1 (down) gives 0, Y = 1 (up) gives 1
                let a = 0.5 * (direction.normalize_or(Vec3A::Y).y + 1.0);
                self.horizon.lerp(self.zenith, a)
            }
        };
        sky * self.intensity
    }

    /// Everything an escaping ray sees: sky plus the light's highlight.
    pub fn radiance(&self, direction: Vec3A, light: &DirectionalLight) -> Color {
        self.sample(direction) + light.highlight(direction)
    }
}
