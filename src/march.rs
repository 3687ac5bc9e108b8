//! Sphere tracing through the scene's distance field.
//!
//! Solid objects are found by stepping along the ray by the distance to the
//! nearest surface. Cloud volumes are not surfaces: inside them the marcher
//! takes randomized steps and composites the medium into the ray instead.

use glam::Vec3A;

use crate::cloud::CloudMedium;
use crate::interval::Interval;
use crate::random::RandomState;
use crate::ray::{Color, Ray};
use crate::scene::Scene;

/// Closest march distance; keeps secondary rays off the surface they left.
pub const TMIN: f32 = 0.001;
/// Distance below which a solid surface counts as hit.
pub const PRECISION: f32 = 0.0001;
/// Farthest march distance.
pub const TMAX: f32 = 2000.0;
/// Step budget per raycast.
pub const MAX_RAYMARCH: u32 = 512;

const _: () = assert!(PRECISION < TMIN);

/// Scale of the randomized step taken inside cloud volumes, relative to `t`.
const CLOUD_STEP_SCALE: f32 = 0.3;

/// Outcome of one raycast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRecord {
    /// Index of the nearest object at the final march position, if any
    pub object: Option<usize>,
    /// True when a solid surface was reached
    pub hit: bool,
    /// Distance travelled along the ray
    pub t: f32,
    /// World-space position at `t`
    pub position: Vec3A,
}

impl HitRecord {
    fn miss(ray: &Ray, t: f32, object: Option<usize>) -> Self {
        Self {
            object,
            hit: false,
            t,
            position: ray.at(t.min(TMAX)),
        }
    }
}

/// Ray marcher over a scene and its cloud medium.
#[derive(Debug, Clone, Copy)]
pub struct Marcher<'a> {
    scene: &'a Scene,
    medium: &'a CloudMedium,
    light: Color,
    max_steps: u32,
}

impl<'a> Marcher<'a> {
    /// `light` colors the light scattered by clouds.
    pub fn new(scene: &'a Scene, medium: &'a CloudMedium, light: Color) -> Self {
        Self {
            scene,
            medium,
            light,
            max_steps: MAX_RAYMARCH,
        }
    }

    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    pub fn scene(&self) -> &'a Scene {
        self.scene
    }

    /// March `ray` from its origin until it hits a solid surface or gives up.
    ///
    /// Cloud contributions gathered on the way are merged into the ray before
    /// returning, whether or not a surface was hit.
    pub fn raycast(&self, ray: &mut Ray, rng: &mut RandomState) -> HitRecord {
        let range = Interval::new(TMIN, TMAX);
        let mut t = range.min;
        let mut last_object = None;

        for _ in 0..self.max_steps {
            if !range.contains(t) {
                break;
            }
            let p = ray.at(t);
            let Some(nearest) = self.scene.nearest_object(p) else {
                break;
            };
            last_object = Some(nearest.index);

            if nearest.object.is_cloud() {
                if nearest.distance < 0.0 {
                    let step = (CLOUD_STEP_SCALE * t * (0.5 + rng.next_f32())).max(self.medium.settings.min_step);
                    let density = self.medium.density(nearest.object, p);
                    if density > 0.0 {
                        let color = self.medium.color(nearest.object, p, density, self.light);
                        ray.cloud.add(color, self.medium.step_opacity(density, step));
                    }
                    t += step;
                } else {
                    // Volume boundaries are never surfaces; step until inside.
                    t += nearest.distance.max(PRECISION);
                }
                continue;
            }

            if nearest.distance.abs() < PRECISION {
                ray.merge_cloud();
                return HitRecord {
                    object: Some(nearest.index),
                    hit: true,
                    t,
                    position: p,
                };
            }
            t += nearest.distance.abs();
        }

        ray.merge_cloud();
        HitRecord::miss(ray, t, last_object)
    }
}
