//! Path integrator: the bounce loop that turns a primary ray into radiance.

use crate::environment::Environment;
use crate::light::DirectionalLight;
use crate::march::Marcher;
use crate::random::RandomState;
use crate::ray::{Color, Ray};
use crate::shading::Shader;

/// Bounce budget per primary ray.
pub const MAX_RAYTRACE: u32 = 512;

/// Throughput below which a path is not worth continuing.
const MIN_THROUGHPUT: f32 = 0.001;

/// Floor of the roulette survival probability, bounding the reweighting factor.
const MIN_SURVIVAL: f32 = 0.05;

/// Tunables of the bounce loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegratorSettings {
    pub max_bounces: u32,
    /// Controls how slowly roulette survival decays with bounce depth
    pub light_quality: f32,
}

impl Default for IntegratorSettings {
    fn default() -> Self {
        Self {
            max_bounces: MAX_RAYTRACE,
            light_quality: 4.0,
        }
    }
}

/// Why a path stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathEnd {
    /// Terminated by Russian roulette
    RouletteKilled,
    /// Throughput fell below the useful minimum
    ThroughputExhausted,
    /// Escaped to the sky
    SkyEscaped,
    /// Absorbed by an emissive surface
    Emissive,
    /// Ran out of bounces; treated as a sky escape
    BudgetExhausted,
}

/// Result of tracing one path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathSample {
    pub radiance: Color,
    pub end: PathEnd,
    /// Number of surface interactions before the path ended
    pub bounces: u32,
}

/// Survival probability of the roulette test at a given bounce.
pub fn survival_probability(bounce: u32, light_quality: f32) -> f32 {
    let decay = bounce as f32 / light_quality.max(1e-3);
    (-decay).exp().clamp(MIN_SURVIVAL, 1.0)
}

/// Monte Carlo path tracer over one frame's scene.
#[derive(Debug, Clone, Copy)]
pub struct PathIntegrator<'a> {
    marcher: Marcher<'a>,
    shader: Shader<'a>,
    environment: &'a Environment,
    light: &'a DirectionalLight,
    settings: IntegratorSettings,
}

impl<'a> PathIntegrator<'a> {
    pub fn new(
        marcher: Marcher<'a>,
        shader: Shader<'a>,
        environment: &'a Environment,
        light: &'a DirectionalLight,
        settings: IntegratorSettings,
    ) -> Self {
        Self {
            marcher,
            shader,
            environment,
            light,
            settings,
        }
    }

    /// Radiance carried back along `ray`.
    pub fn trace(&self, ray: Ray, rng: &mut RandomState) -> Color {
        self.trace_path(ray, rng).radiance
    }

    /// Trace a path and report how it ended.
    pub fn trace_path(&self, mut ray: Ray, rng: &mut RandomState) -> PathSample {
        let scene = self.marcher.scene();

        for bounce in 0..self.settings.max_bounces {
            let survival = survival_probability(bounce, self.settings.light_quality);
            if ray.throughput_magnitude() < MIN_THROUGHPUT {
                return finish(ray, PathEnd::ThroughputExhausted, bounce);
            }
            if rng.next_f32() >= survival {
                return finish(ray, PathEnd::RouletteKilled, bounce);
            }

            let hit = self.marcher.raycast(&mut ray, rng);
            let object = hit.object.and_then(|index| scene.object(index));
            let Some(object) = object.filter(|_| hit.hit) else {
                self.escape(&mut ray);
                return finish(ray, PathEnd::SkyEscaped, bounce);
            };

            if object.material.is_emissive() {
                ray.radiance += ray.throughput * object.material.emitted();
                return finish(ray, PathEnd::Emissive, bounce);
            }

            self.shader.shade(&hit, &mut ray, rng);
            ray.throughput /= survival;
        }

        self.escape(&mut ray);
        finish(ray, PathEnd::BudgetExhausted, self.settings.max_bounces)
    }

    /// Gather the sky for a ray leaving the scene.
    fn escape(&self, ray: &mut Ray) {
        ray.attenuation *= self.light.attenuation;
        ray.radiance += ray.throughput * self.environment.radiance(ray.direction, self.light) * ray.attenuation;
    }
}

fn finish(ray: Ray, end: PathEnd, bounces: u32) -> PathSample {
    let radiance = if ray.radiance.is_finite() {
        ray.radiance.max(Color::ZERO)
    } else {
        Color::ZERO
    };
    PathSample {
        radiance,
        end,
        bounces,
    }
}
