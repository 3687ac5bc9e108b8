//! TOML render configuration.
//!
//! Every section and field is optional; missing values fall back to the
//! defaults below. A configuration without `[[objects]]` renders the built-in
//! demo scene.
//!
//! ```toml
//! [render]
//! width = 640
//! height = 360
//! frames = 32
//!
//! [camera]
//! position = [0.0, 0.6, 4.0]
//! look_at = [0.0, 0.0, 0.0]
//!
//! [[objects]]
//! shape = "sphere"
//! position = [0.0, 0.0, 0.0]
//! scale = [0.5, 0.5, 0.5]
//! material = { emission = [1.0, 1.0, 1.0], emission_intensity = 10.0 }
//! ```

use std::path::{Path, PathBuf};

use glam::{Mat3A, Vec3A};
use log::{debug, info, warn};
use serde::Deserialize;

use crate::camera::Camera;
use crate::cloud::{CloudMedium, CloudPalette, CloudSettings};
use crate::environment::Environment;
use crate::error::{Error, Result};
use crate::integrator::{IntegratorSettings, MAX_RAYTRACE};
use crate::light::DirectionalLight;
use crate::march::MAX_RAYMARCH;
use crate::material::{Material, MaterialTextures};
use crate::renderer::Renderer;
use crate::scene::Scene;
use crate::scenes::demo_scene;
use crate::sdf::{Object, ShapeKind};
use crate::shading::ShadingSettings;
use crate::texture::Texture;
use crate::transform::Transform;

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub render: RenderSection,
    pub camera: CameraSection,
    pub light: LightSection,
    pub clouds: CloudSection,
    pub environment: EnvironmentSection,
    pub textures: TextureSection,
    pub objects: Option<Vec<ObjectConfig>>,

    /// Directory relative texture paths are resolved against
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderSection {
    pub width: u32,
    pub height: u32,
    /// Frames blended into the final image
    pub frames: u32,
    /// Time advanced between frames, decorrelating their random streams
    pub time_step: f32,
    pub gamma: f32,
    pub light_quality: f32,
    pub max_bounces: u32,
    pub max_march_steps: u32,
}

impl Default for RenderSection {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            frames: 16,
            time_step: 1.0,
            gamma: 2.2,
            light_quality: 4.0,
            max_bounces: MAX_RAYTRACE,
            max_march_steps: MAX_RAYMARCH,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraSection {
    pub position: Vec3A,
    pub look_at: Vec3A,
    pub up: Vec3A,
    /// Row-major camera-to-world rotation; overrides `look_at` and `up`
    pub rotation: Option<[[f32; 3]; 3]>,
    /// Vertical field of view in degrees
    pub vfov: f32,
    /// Defaults to width / height of the rendered image
    pub aspect_ratio: Option<f32>,
    pub aperture: f32,
    /// Defaults to the distance between `position` and `look_at`
    pub focus_distance: Option<f32>,
}

impl Default for CameraSection {
    fn default() -> Self {
        Self {
            position: Vec3A::new(0.0, 0.6, 4.0),
            look_at: Vec3A::new(0.0, -0.1, 0.0),
            up: Vec3A::Y,
            rotation: None,
            vfov: 40.0,
            aspect_ratio: None,
            aperture: 0.0,
            focus_distance: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LightSection {
    pub direction: Vec3A,
    pub color: Vec3A,
    pub intensity: f32,
    pub attenuation: f32,
    pub highlight_power: f32,
    pub shadow_jitter: f32,
}

impl Default for LightSection {
    fn default() -> Self {
        let light = DirectionalLight::default();
        Self {
            direction: light.direction,
            color: light.color,
            intensity: light.intensity,
            attenuation: light.attenuation,
            highlight_power: light.highlight_power,
            shadow_jitter: light.shadow_jitter,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CloudSection {
    pub bright: Vec3A,
    pub dark: Vec3A,
    pub light_tint: Vec3A,
    pub noise_scale: f32,
    pub threshold: f32,
    pub absorption: f32,
    pub min_step: f32,
    /// Noise texture to load instead of generating one
    pub noise_texture: Option<PathBuf>,
    pub noise_size: u32,
    pub noise_seed: u32,
    pub noise_octaves: usize,
}

impl Default for CloudSection {
    fn default() -> Self {
        let settings = CloudSettings::default();
        Self {
            bright: settings.palette.bright,
            dark: settings.palette.dark,
            light_tint: settings.palette.light_tint,
            noise_scale: settings.noise_scale,
            threshold: settings.threshold,
            absorption: settings.absorption,
            min_step: settings.min_step,
            noise_texture: None,
            noise_size: 256,
            noise_seed: 7,
            noise_octaves: 6,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnvironmentSection {
    /// Equirectangular environment map
    pub hdri: Option<PathBuf>,
    pub horizon: Vec3A,
    pub zenith: Vec3A,
    pub intensity: f32,
    /// Index of refraction of the surrounding medium
    pub ior: f32,
}

impl Default for EnvironmentSection {
    fn default() -> Self {
        let env = Environment::default();
        Self {
            hdri: None,
            horizon: env.horizon,
            zenith: env.zenith,
            intensity: env.intensity,
            ior: ShadingSettings::default().env_ior,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TextureSection {
    pub albedo: Option<PathBuf>,
    pub metallic: Option<PathBuf>,
    pub roughness: Option<PathBuf>,
    pub normal: Option<PathBuf>,
    /// World-space frequency of the triplanar projection
    pub scale: f32,
}

impl Default for TextureSection {
    fn default() -> Self {
        Self {
            albedo: None,
            metallic: None,
            roughness: None,
            normal: None,
            scale: 1.0,
        }
    }
}

/// One `[[objects]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ObjectConfig {
    /// `sphere`, `box`, `cylinder` or `cloud`
    pub shape: String,
    pub position: Vec3A,
    /// XYZ Euler angles in degrees
    pub rotation: Vec3A,
    pub scale: Vec3A,
    pub material: MaterialConfig,
}

impl Default for ObjectConfig {
    fn default() -> Self {
        Self {
            shape: "sphere".to_string(),
            position: Vec3A::ZERO,
            rotation: Vec3A::ZERO,
            scale: Vec3A::splat(0.5),
            material: MaterialConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MaterialConfig {
    pub albedo: Vec3A,
    pub roughness: f32,
    pub metallic: f32,
    pub transmission: f32,
    pub ior: f32,
    pub emission: Vec3A,
    pub emission_intensity: f32,
    pub normal: Vec3A,
    pub textured: bool,
}

impl Default for MaterialConfig {
    fn default() -> Self {
        let m = Material::default();
        Self {
            albedo: m.albedo,
            roughness: m.roughness,
            metallic: m.metallic,
            transmission: m.transmission,
            ior: m.ior,
            emission: m.emission,
            emission_intensity: m.emission_intensity,
            normal: m.normal,
            textured: m.textured,
        }
    }
}

impl From<&MaterialConfig> for Material {
    fn from(c: &MaterialConfig) -> Self {
        Material {
            albedo: c.albedo,
            roughness: c.roughness,
            metallic: c.metallic,
            transmission: c.transmission,
            ior: c.ior,
            emission: c.emission,
            emission_intensity: c.emission_intensity,
            normal: c.normal,
            textured: c.textured,
        }
    }
}

/// Strictly above zero; NaN is rejected.
fn positive(value: f32) -> bool {
    !value.is_nan() && value > 0.0
}

/// Map a shape name to its kind; unknown names fall back to a sphere.
pub fn shape_kind(name: &str) -> ShapeKind {
    match name.to_ascii_lowercase().as_str() {
        "sphere" => ShapeKind::Sphere,
        "box" | "cube" => ShapeKind::Box,
        "cylinder" => ShapeKind::Cylinder,
        "cloud" | "cloud_volume" => ShapeKind::CloudVolume,
        other => {
            warn!("Unknown shape '{}', using a sphere", other);
            ShapeKind::Sphere
        }
    }
}

impl ObjectConfig {
    pub fn to_object(&self) -> Object {
        let rotation = Vec3A::new(
            self.rotation.x.to_radians(),
            self.rotation.y.to_radians(),
            self.rotation.z.to_radians(),
        );
        Object::new(
            shape_kind(&self.shape),
            Transform::new(self.position, rotation, self.scale),
            Material::from(&self.material),
        )
    }
}

impl Config {
    /// Read and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml(&raw)?;
        config.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate configuration text.
    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let render = &self.render;
        if render.width == 0 || render.height == 0 {
            return Err(Error::InvalidConfig(format!(
                "image size must be positive, got {}x{}",
                render.width, render.height
            )));
        }
        if render.frames == 0 {
            return Err(Error::InvalidConfig("frames must be at least 1".into()));
        }
        if !positive(render.gamma) {
            return Err(Error::InvalidConfig(format!("gamma must be positive, got {}", render.gamma)));
        }
        if !positive(render.light_quality) {
            return Err(Error::InvalidConfig(format!(
                "light_quality must be positive, got {}",
                render.light_quality
            )));
        }
        if !positive(self.camera.vfov) || self.camera.vfov >= 180.0 {
            return Err(Error::InvalidConfig(format!(
                "camera vfov must be within (0, 180), got {}",
                self.camera.vfov
            )));
        }
        if !positive(self.environment.ior) {
            return Err(Error::InvalidConfig("environment ior must be positive".into()));
        }
        for (i, object) in self.objects.iter().flatten().enumerate() {
            if !positive(object.material.ior) {
                return Err(Error::InvalidConfig(format!("object {} has non-positive ior", i)));
            }
            if !positive(object.scale.min_element()) {
                return Err(Error::InvalidConfig(format!("object {} has non-positive scale", i)));
            }
        }
        Ok(())
    }

    /// Objects to render: the configured list, or the demo scene.
    pub fn objects(&self) -> Vec<Object> {
        match &self.objects {
            Some(objects) => objects.iter().map(ObjectConfig::to_object).collect(),
            None => {
                debug!("No objects configured, using the demo scene");
                demo_scene()
            }
        }
    }

    pub fn camera(&self) -> Camera {
        let c = &self.camera;
        let aspect = c
            .aspect_ratio
            .unwrap_or(self.render.width as f32 / self.render.height.max(1) as f32);
        let focus = c
            .focus_distance
            .unwrap_or_else(|| (c.look_at - c.position).length().max(1e-3));
        match c.rotation {
            Some(rows) => {
                let rotation = Mat3A::from_cols_array_2d(&rows).transpose();
                Camera::from_rotation(c.position, rotation, c.vfov, aspect, c.aperture, focus)
            }
            None => Camera::look_at(c.position, c.look_at, c.up, c.vfov, aspect, c.aperture, focus),
        }
    }

    pub fn light(&self) -> DirectionalLight {
        let l = &self.light;
        DirectionalLight {
            attenuation: l.attenuation,
            highlight_power: l.highlight_power,
            shadow_jitter: l.shadow_jitter,
            ..DirectionalLight::new(l.direction, l.color, l.intensity)
        }
    }

    pub fn cloud_settings(&self) -> CloudSettings {
        let c = &self.clouds;
        CloudSettings {
            palette: CloudPalette {
                bright: c.bright,
                dark: c.dark,
                light_tint: c.light_tint,
            },
            noise_scale: c.noise_scale,
            threshold: c.threshold,
            absorption: c.absorption,
            min_step: c.min_step.max(1e-4),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    fn load_optional(&self, path: &Option<PathBuf>) -> Result<Option<Texture>> {
        path.as_deref()
            .map(|p| Texture::load(self.resolve(p)))
            .transpose()
    }

    /// Load textures and assemble a renderer.
    pub fn build_renderer(&self) -> Result<Renderer> {
        let noise = match &self.clouds.noise_texture {
            Some(path) => Texture::load(self.resolve(path))?,
            None => Texture::fractal_noise(
                self.clouds.noise_size,
                self.clouds.noise_seed,
                self.clouds.noise_octaves,
            ),
        };

        let env = &self.environment;
        let environment = Environment {
            map: self.load_optional(&env.hdri)?,
            horizon: env.horizon,
            zenith: env.zenith,
            intensity: env.intensity,
        };

        let textures = MaterialTextures {
            albedo: self.load_optional(&self.textures.albedo)?,
            metallic: self.load_optional(&self.textures.metallic)?,
            roughness: self.load_optional(&self.textures.roughness)?,
            normal: self.load_optional(&self.textures.normal)?,
            scale: self.textures.scale,
        };

        let scene = Scene::new(self.objects());
        info!("Scene has {} objects", scene.len());

        let mut renderer = Renderer::new(
            scene,
            self.camera(),
            self.light(),
            environment,
            CloudMedium::new(self.cloud_settings(), noise),
        );
        renderer.textures = textures;
        renderer.shading = ShadingSettings {
            env_ior: env.ior,
            ..ShadingSettings::default()
        };
        renderer.integrator = IntegratorSettings {
            max_bounces: self.render.max_bounces,
            light_quality: self.render.light_quality,
        };
        renderer.max_march_steps = self.render.max_march_steps;
        renderer.gamma = self.render.gamma;
        Ok(renderer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.render.width, 800);
        assert!(config.objects.is_none());
        assert!(!config.objects().is_empty());
    }

    #[test]
    fn parses_objects_and_materials() {
        let config = Config::from_toml(
            r#"
            [render]
            width = 64
            height = 32

            [[objects]]
            shape = "cylinder"
            position = [1.0, 2.0, 3.0]
            rotation = [0.0, 90.0, 0.0]
            scale = [0.5, 1.0, 0.5]
            material = { albedo = [0.1, 0.2, 0.3], metallic = 1.0 }

            [[objects]]
            shape = "cloud"
            scale = [4.0, 1.0, 4.0]
            "#,
        )
        .unwrap();
        let objects = config.objects();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].shape, ShapeKind::Cylinder);
        assert_eq!(objects[0].material.metallic, 1.0);
        assert!((objects[0].transform.rotation().y - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        assert_eq!(objects[1].shape, ShapeKind::CloudVolume);
        assert!((config.camera().aspect_ratio - 2.0).abs() < 1e-6);
    }

    #[test]
    fn unknown_shape_falls_back_to_sphere() {
        assert_eq!(shape_kind("torus"), ShapeKind::Sphere);
        assert_eq!(shape_kind("Box"), ShapeKind::Box);
    }

    #[test]
    fn explicit_empty_object_list_is_respected() {
        let config = Config::from_toml("objects = []").unwrap();
        assert!(config.objects().is_empty());
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            Config::from_toml("[render]\nwidth = 0"),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            Config::from_toml("[render]\nlight_quality = -1.0"),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            Config::from_toml("[render]\ngamma = nan"),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            Config::from_toml("[camera]\nvfov = 180.0"),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            Config::from_toml("[[objects]]\nscale = [1.0, 0.0, 1.0]"),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            Config::from_toml("[render]\nunknown_key = 1"),
            Err(Error::ConfigParse(_))
        ));
    }

    #[test]
    fn builds_renderer_without_external_textures() {
        let config = Config::from_toml(
            r#"
            [clouds]
            noise_size = 16
            "#,
        )
        .unwrap();
        let renderer = config.build_renderer().unwrap();
        assert!(renderer.environment.map.is_none());
        assert!(!renderer.scene.is_empty());
    }
}
