//! Surface materials and the scattering primitives they are built on.
//!
//! A single physically based model covers diffuse, metallic, dielectric and
//! emissive surfaces; see [`crate::shading`] for how a bounce is sampled.

use glam::Vec3A;

use crate::interval::Interval;
use crate::random::RandomState;
use crate::ray::Color;
use crate::texture::Texture;

/// Base reflectance of dielectrics at normal incidence.
pub const DIELECTRIC_F0: f32 = 0.04;

/// Physically based surface description.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// Surface reflectance
    pub albedo: Color,
    /// Microfacet roughness in [0, 1]
    pub roughness: f32,
    /// Metalness in [0, 1]
    pub metallic: f32,
    /// Probability of taking the refractive path, in [0, 1]
    pub transmission: f32,
    /// Index of refraction
    pub ior: f32,
    /// Emitted color
    pub emission: Color,
    /// Emission multiplier
    pub emission_intensity: f32,
    /// Tangent-space normal; `(0, 0, 1)` leaves the geometric normal unchanged
    pub normal: Vec3A,
    /// Read albedo, roughness, metallic and normal from the material maps
    pub textured: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            albedo: Color::splat(0.8),
            roughness: 0.5,
            metallic: 0.0,
            transmission: 0.0,
            ior: 1.5,
            emission: Color::ZERO,
            emission_intensity: 0.0,
            normal: Vec3A::Z,
            textured: false,
        }
    }
}

impl Material {
    pub fn diffuse(albedo: Color) -> Self {
        Self {
            albedo,
            roughness: 1.0,
            ..Self::default()
        }
    }

    pub fn metal(albedo: Color, roughness: f32) -> Self {
        Self {
            albedo,
            roughness,
            metallic: 1.0,
            ..Self::default()
        }
    }

    pub fn glass(tint: Color, ior: f32, roughness: f32) -> Self {
        Self {
            albedo: tint,
            roughness,
            transmission: 1.0,
            ior,
            ..Self::default()
        }
    }

    pub fn emissive(color: Color, intensity: f32) -> Self {
        Self {
            albedo: Color::ZERO,
            emission: color,
            emission_intensity: intensity,
            ..Self::default()
        }
    }

    /// Emitted radiance, zero for non-emissive surfaces.
    pub fn emitted(&self) -> Color {
        self.emission * self.emission_intensity
    }

    pub fn is_emissive(&self) -> bool {
        self.emitted().max_element() > 0.0
    }
}

/// Optional maps used by materials with `textured` set.
#[derive(Debug, Clone, Default)]
pub struct MaterialTextures {
    pub albedo: Option<Texture>,
    pub metallic: Option<Texture>,
    pub roughness: Option<Texture>,
    pub normal: Option<Texture>,
    /// World-space frequency of the triplanar projection
    pub scale: f32,
}

/// Material parameters resolved at one surface point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceParams {
    pub albedo: Color,
    pub roughness: f32,
    pub metallic: f32,
    pub transmission: f32,
    pub ior: f32,
    pub normal: Vec3A,
}

impl MaterialTextures {
    /// Resolve a material at world point `p` with geometric normal `normal`.
    ///
    /// Parameters are clamped to their valid ranges so that out-of-range
    /// configuration or texture data cannot destabilize shading.
    pub fn resolve(&self, material: &Material, p: Vec3A, normal: Vec3A) -> SurfaceParams {
        let mut params = SurfaceParams {
            albedo: material.albedo,
            roughness: material.roughness,
            metallic: material.metallic,
            transmission: material.transmission,
            ior: material.ior,
            normal: material.normal,
        };
        if material.textured {
            let scale = if self.scale > 0.0 { self.scale } else { 1.0 };
            if let Some(tex) = &self.albedo {
                params.albedo = tex.sample_triplanar(p, normal, scale);
            }
            if let Some(tex) = &self.roughness {
                params.roughness = tex.sample_triplanar(p, normal, scale).x;
            }
            if let Some(tex) = &self.metallic {
                params.metallic = tex.sample_triplanar(p, normal, scale).x;
            }
            if let Some(tex) = &self.normal {
                params.normal = tex.sample_triplanar(p, normal, scale) * 2.0 - Vec3A::ONE;
            }
        }

        params.albedo = params.albedo.clamp(Color::ZERO, Color::ONE);
        params.roughness = Interval::UNIT.clamp(params.roughness);
        params.metallic = Interval::UNIT.clamp(params.metallic);
        params.transmission = Interval::UNIT.clamp(params.transmission);
        params.ior = if params.ior.is_finite() && params.ior > 0.0 { params.ior } else { 1.0 };
        params.normal = params.normal.normalize_or(Vec3A::Z);
        params
    }
}

/// Reflect a vector off a surface using the law of reflection.
pub fn reflect(v: Vec3A, n: Vec3A) -> Vec3A {
    v - 2.0 * v.dot(n) * n
}

/// Refract a unit vector through an interface using Snell's law.
///
/// `eta` is the ratio of the incident to the transmitted index. Returns `None`
/// on total internal reflection.
pub fn refract(uv: Vec3A, n: Vec3A, eta: f32) -> Option<Vec3A> {
    let cos_theta = (-uv).dot(n).min(1.0);
    let k = 1.0 - eta * eta * (1.0 - cos_theta * cos_theta);
    if k < 0.0 {
        return None;
    }
    Some((eta * uv + (eta * cos_theta - k.sqrt()) * n).normalize())
}

/// Schlick's approximation of Fresnel reflectance.
pub fn schlick(cosine: f32, f0: f32) -> f32 {
    f0 + (1.0 - f0) * (1.0 - cosine.clamp(0.0, 1.0)).powi(5)
}

/// Schlick's approximation with roughness attenuation of the grazing peak.
pub fn schlick_roughness(cosine: f32, f0: Color, roughness: f32) -> Color {
    let peak = Color::splat(1.0 - roughness).max(f0);
    f0 + (peak - f0) * (1.0 - cosine.clamp(0.0, 1.0)).powi(5)
}

/// Normal-incidence reflectance of an interface between two indices.
pub fn ior_to_f0(eta_i: f32, eta_t: f32) -> f32 {
    let r = (eta_i - eta_t) / (eta_i + eta_t);
    r * r
}

/// Orthonormal tangent and bitangent for a unit normal.
///
/// Frisvad's construction; the single branch handles the pole where the
/// general formula divides by zero.
pub fn orthonormal_basis(n: Vec3A) -> (Vec3A, Vec3A) {
    if n.z < -0.999_999_9 {
        return (Vec3A::new(0.0, -1.0, 0.0), Vec3A::new(-1.0, 0.0, 0.0));
    }
    let a = 1.0 / (1.0 + n.z);
    let b = -n.x * n.y * a;
    (
        Vec3A::new(1.0 - n.x * n.x * a, b, -n.x),
        Vec3A::new(b, 1.0 - n.y * n.y * a, -n.y),
    )
}

/// Bring a tangent-space vector into the frame of `normal`.
pub fn tangent_to_world(v: Vec3A, normal: Vec3A) -> Vec3A {
    let (t, b) = orthonormal_basis(normal);
    (t * v.x + b * v.y + normal * v.z).normalize_or(normal)
}

/// Sample a GGX microfacet normal around `normal`.
///
/// `roughness` is perceptual; alpha is its square. A roughness of zero returns
/// the normal unchanged.
pub fn sample_ggx_normal(normal: Vec3A, roughness: f32, rng: &mut RandomState) -> Vec3A {
    let alpha = roughness * roughness;
    let u1 = rng.next_f32();
    let u2 = rng.next_f32();
    if alpha <= 0.0 {
        return normal;
    }
    let phi = std::f32::consts::TAU * u1;
    let cos_theta = ((1.0 - u2) / (1.0 + (alpha * alpha - 1.0) * u2)).max(0.0).sqrt();
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let local = Vec3A::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta);
    tangent_to_world(local, normal)
}
