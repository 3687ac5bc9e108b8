//! Per-pixel entry point and frame rendering.

use glam::{Vec2, Vec4};
use image::{Rgb, Rgb32FImage};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use rayon::prelude::*;

use crate::accumulate::FrameAccumulator;
use crate::camera::Camera;
use crate::cloud::CloudMedium;
use crate::environment::Environment;
use crate::integrator::{IntegratorSettings, PathIntegrator};
use crate::light::DirectionalLight;
use crate::march::{Marcher, MAX_RAYMARCH};
use crate::material::MaterialTextures;
use crate::random::RandomState;
use crate::ray::Color;
use crate::scene::Scene;
use crate::shading::{Shader, ShadingSettings};

/// Map unbounded radiance into [0, 1) with `1 - exp(-c)`.
pub fn tone_map(color: Color) -> Color {
    let c = color.max(Color::ZERO);
    Color::new(1.0 - (-c.x).exp(), 1.0 - (-c.y).exp(), 1.0 - (-c.z).exp())
}

/// Inverse of [`tone_map`] for colors in [0, 1).
pub fn inverse_tone_map(color: Color) -> Color {
    let c = color.clamp(Color::ZERO, Color::splat(1.0 - f32::EPSILON));
    Color::new(-(1.0 - c.x).ln(), -(1.0 - c.y).ln(), -(1.0 - c.z).ln())
}

/// Encode a tone-mapped color with the display gamma.
pub fn apply_gamma(color: Color, gamma: f32) -> Color {
    let gamma = if gamma > 0.0 { gamma } else { 1.0 };
    color.max(Color::ZERO).powf(1.0 / gamma)
}

/// Number of f32 values in an RGB frame, computed without `u32` overflow.
fn frame_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 3
}

/// Everything needed to render a frame, shared read-only by all pixel workers.
#[derive(Debug, Clone)]
pub struct Renderer {
    pub scene: Scene,
    pub camera: Camera,
    pub light: DirectionalLight,
    pub environment: Environment,
    pub medium: CloudMedium,
    pub textures: MaterialTextures,
    pub shading: ShadingSettings,
    pub integrator: IntegratorSettings,
    pub max_march_steps: u32,
    /// Display gamma applied after tone mapping
    pub gamma: f32,
}

impl Renderer {
    pub fn new(
        scene: Scene,
        camera: Camera,
        light: DirectionalLight,
        environment: Environment,
        medium: CloudMedium,
    ) -> Self {
        Self {
            scene,
            camera,
            light,
            environment,
            medium,
            textures: MaterialTextures::default(),
            shading: ShadingSettings::default(),
            integrator: IntegratorSettings::default(),
            max_march_steps: MAX_RAYMARCH,
            gamma: 2.2,
        }
    }

    /// Path integrator borrowing this renderer's scene and settings.
    pub fn path_integrator(&self) -> PathIntegrator<'_> {
        let marcher =
            Marcher::new(&self.scene, &self.medium, self.light.radiance()).with_max_steps(self.max_march_steps);
        let shader = Shader::new(marcher, &self.textures, &self.light, self.shading);
        PathIntegrator::new(marcher, shader, &self.environment, &self.light, self.integrator)
    }

    /// Render one sample of the pixel at `uv` and return its display color.
    ///
    /// `uv` is in [0, 1] with (0, 0) at the lower-left corner; `pixel_size` is
    /// the pixel footprint in uv units and scales the anti-aliasing jitter.
    pub fn render_pixel(&self, uv: Vec2, time: f32, pixel_size: Vec2) -> Vec4 {
        self.shade_pixel(&self.path_integrator(), uv, time, pixel_size)
    }

    fn shade_pixel(&self, integrator: &PathIntegrator<'_>, uv: Vec2, time: f32, pixel_size: Vec2) -> Vec4 {
        let mut rng = RandomState::from_pixel(uv, time);
        let jitter = Vec2::new(rng.next_f32() - 0.5, rng.next_f32() - 0.5) * pixel_size;
        let ray = self.camera.get_ray(uv + jitter, &mut rng);
        let radiance = integrator.trace(ray, &mut rng);
        let color = apply_gamma(tone_map(radiance), self.gamma);
        color.extend(1.0)
    }

    /// Render a full frame in parallel, one sample per pixel.
    ///
    /// Rows are processed in parallel with Rayon. The returned image holds
    /// display-referred colors in [0, 1]; row 0 is the top of the image.
    pub fn render_frame(&self, width: u32, height: u32, time: f32) -> Rgb32FImage {
        let width = width.max(1);
        let height = height.max(1);
        let integrator = self.path_integrator();
        let pixel_size = Vec2::new(1.0 / width as f32, 1.0 / height as f32);

        debug!("Rendering {}x{} frame at time {:.3} using {} threads", width, height, time, rayon::current_num_threads());
        let pb = ProgressBar::new(u64::from(height));
        if let Ok(style) = ProgressStyle::default_bar().template("{bar:40} {pos}/{len} rows ETA: {eta}") {
            pb.set_style(style);
        }

        let mut buffer = vec![0.0f32; frame_len(width, height)];
        buffer
            .par_chunks_mut(width as usize * 3)
            .enumerate()
            .for_each(|(y, row)| {
                let v = 1.0 - (y as f32 + 0.5) * pixel_size.y;
                for (x, pixel) in row.chunks_exact_mut(3).enumerate() {
                    let u = (x as f32 + 0.5) * pixel_size.x;
                    let color = self.shade_pixel(&integrator, Vec2::new(u, v), time, pixel_size);
                    pixel.copy_from_slice(&[color.x, color.y, color.z]);
                }
                pb.inc(1);
            });
        pb.finish_and_clear();

        Rgb32FImage::from_raw(width, height, buffer).unwrap_or_else(|| {
            // Unreachable: the buffer is sized from the same dimensions.
            Rgb32FImage::from_pixel(width, height, Rgb([0.0; 3]))
        })
    }

    /// Render `frames` frames starting at `start_time` and blend them progressively.
    pub fn render_progressive(
        &self,
        width: u32,
        height: u32,
        frames: u32,
        start_time: f32,
        time_step: f32,
    ) -> Rgb32FImage {
        let mut accumulator = FrameAccumulator::new(width.max(1), height.max(1));
        let start = std::time::Instant::now();
        for frame in 0..frames.max(1) {
            let image = self.render_frame(width, height, start_time + frame as f32 * time_step);
            accumulator.blend(&image);
            debug!("Frame {}/{} blended", frame + 1, frames.max(1));
        }
        info!("Rendered {} frame(s) in {:.2?}", accumulator.frame_count(), start.elapsed());
        accumulator.into_image()
    }
}
