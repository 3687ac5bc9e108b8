//! Ray representation for distance-field path tracing.
//!
//! A ray is defined as r(t) = origin + t * direction. Besides its geometry it
//! carries the state of the path it belongs to: gathered radiance, path
//! throughput, light attenuation and any cloud contribution picked up since the
//! last surface interaction.

use glam::Vec3A;

/// RGB color type using Vec3A for SIMD optimization.
pub type Color = Vec3A;

/// Front-to-back composite of participating media crossed by a ray segment.
///
/// `color` is premultiplied by opacity. The accumulator is merged into the ray
/// at the next solid hit or when the ray escapes to the sky.
#[derive(Debug, Clone, Copy, Default)]
pub struct CloudAccumulator {
    /// Premultiplied in-scattered color
    pub color: Color,
    /// Accumulated opacity in [0, 1]
    pub opacity: f32,
}

impl CloudAccumulator {
    /// Composite one medium sample behind everything gathered so far.
    pub fn add(&mut self, color: Color, alpha: f32) {
        let alpha = alpha.clamp(0.0, 1.0);
        let visible = 1.0 - self.opacity;
        self.color += visible * alpha * color;
        self.opacity += visible * alpha;
    }

    /// True when no medium has been composited.
    pub fn is_empty(&self) -> bool {
        self.opacity <= 0.0
    }
}

/// Ray in 3D space together with the state of the path it carries.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Starting point of the ray in world coordinates.
    pub origin: Vec3A,

    /// Unit direction vector of the ray.
    ///
    /// Every constructor and scattering operation keeps this normalized; the
    /// ray marcher relies on it to interpret distances along the ray.
    pub direction: Vec3A,

    /// Radiance gathered along the path so far.
    pub radiance: Color,

    /// Fraction of light the path still carries, per channel.
    pub throughput: Color,

    /// Attenuation applied to light reaching the path from the sky.
    pub attenuation: f32,

    /// Cloud contribution pending merge.
    pub cloud: CloudAccumulator,
}

impl Ray {
    /// Create a new primary ray with full throughput and no gathered light.
    pub fn new(origin: Vec3A, direction: Vec3A) -> Self {
        Self {
            origin,
            direction: direction.normalize_or(Vec3A::NEG_Z),
            radiance: Color::ZERO,
            throughput: Color::ONE,
            attenuation: 1.0,
            cloud: CloudAccumulator::default(),
        }
    }

    /// Compute a point at parameter t along the ray.
    ///
    /// Returns r(t) = origin + t * direction.
    pub fn at(&self, t: f32) -> Vec3A {
        self.origin + t * self.direction
    }

    /// Fold the pending cloud composite into the path and clear it.
    ///
    /// In-scattered cloud light is weighted by the current throughput, and the
    /// cloud's opacity then occludes whatever lies behind it.
    pub fn merge_cloud(&mut self) {
        if self.cloud.is_empty() {
            return;
        }
        self.radiance += self.throughput * self.cloud.color;
        self.throughput *= 1.0 - self.cloud.opacity;
        self.cloud = CloudAccumulator::default();
    }

    /// Largest throughput channel, used for termination decisions.
    pub fn throughput_magnitude(&self) -> f32 {
        self.throughput.max_element()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn new_normalizes_direction() {
        let ray = Ray::new(Vec3A::ZERO, Vec3A::new(3.0, 0.0, 4.0));
        assert_relative_eq!(ray.direction.length(), 1.0, epsilon = 1e-6);
        assert_relative_eq!(ray.at(5.0).x, 3.0, epsilon = 1e-5);
    }

    #[test]
    fn cloud_composite_saturates() {
        let mut cloud = CloudAccumulator::default();
        for _ in 0..64 {
            cloud.add(Color::ONE, 0.5);
        }
        assert!(cloud.opacity <= 1.0);
        assert_relative_eq!(cloud.opacity, 1.0, epsilon = 1e-5);
        assert!(cloud.color.max_element() <= 1.0 + 1e-5);
    }

    #[test]
    fn merge_cloud_occludes_and_clears() {
        let mut ray = Ray::new(Vec3A::ZERO, Vec3A::Z);
        ray.cloud.add(Color::splat(0.8), 0.25);
        ray.merge_cloud();
        assert_relative_eq!(ray.radiance.x, 0.2, epsilon = 1e-6);
        assert_relative_eq!(ray.throughput.y, 0.75, epsilon = 1e-6);
        assert!(ray.cloud.is_empty());
    }
}
