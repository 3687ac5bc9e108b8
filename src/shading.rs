//! Stochastic BSDF sampling at surface hits.
//!
//! Each call picks one continuation for the path: specular reflection,
//! refraction or diffuse scattering. Diffuse bounces also gather direct light
//! from the directional light through a shadow ray.

use glam::Vec3A;

use crate::cloud::smoothstep;
use crate::interval::Interval;
use crate::light::DirectionalLight;
use crate::march::{HitRecord, Marcher};
use crate::material::{
    ior_to_f0, reflect, refract, sample_ggx_normal, schlick, schlick_roughness, tangent_to_world,
    MaterialTextures, SurfaceParams, DIELECTRIC_F0,
};
use crate::random::RandomState;
use crate::ray::{Color, Ray};

/// Tunables of the shading model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadingSettings {
    /// Index of refraction of the medium surrounding all objects
    pub env_ior: f32,
    /// Extra Fresnel weight given to reflection on transmissive surfaces
    pub dielectric_boost: f32,
    /// Width of the smooth cutoff that absorbs directions below the surface
    pub backface_softness: f32,
    /// Offset of new ray origins along the surface normal
    pub surface_bias: f32,
}

impl Default for ShadingSettings {
    fn default() -> Self {
        Self {
            env_ior: 1.0,
            dielectric_boost: 1.5,
            backface_softness: 0.01,
            surface_bias: 0.001,
        }
    }
}

/// Sampled continuation of a path.
struct Scatter {
    direction: Vec3A,
    /// Normal of the hemisphere the direction is supposed to lie in
    side: Vec3A,
}

/// Surface shader for one frame's scene, textures and light.
#[derive(Debug, Clone, Copy)]
pub struct Shader<'a> {
    marcher: Marcher<'a>,
    textures: &'a MaterialTextures,
    light: &'a DirectionalLight,
    settings: ShadingSettings,
}

impl<'a> Shader<'a> {
    pub fn new(
        marcher: Marcher<'a>,
        textures: &'a MaterialTextures,
        light: &'a DirectionalLight,
        settings: ShadingSettings,
    ) -> Self {
        Self {
            marcher,
            textures,
            light,
            settings,
        }
    }

    /// Turn `ray` into the next ray of its path, leaving from the hit point.
    ///
    /// Throughput is scaled by the surface albedo and by a smooth cutoff for
    /// directions that end up on the wrong side of the surface. Diffuse bounces
    /// add direct light to the ray's radiance. Records without a surface hit
    /// leave the ray untouched.
    pub fn shade(&self, hit: &HitRecord, ray: &mut Ray, rng: &mut RandomState) {
        let scene = self.marcher.scene();
        let Some((index, object)) = hit.object.and_then(|i| scene.object(i).map(|o| (i, o))) else {
            return;
        };
        if !hit.hit {
            return;
        }

        let geometric = scene.normal(index, hit.position);
        let params = self.textures.resolve(&object.material, hit.position, geometric);
        let normal = tangent_to_world(params.normal, geometric);

        let scatter = if rng.next_f32() < params.transmission {
            self.sample_transmission(ray.direction, normal, &params, rng)
        } else {
            self.sample_opaque(ray, hit.position, normal, &params, rng)
        };

        let softness = self.settings.backface_softness.max(1e-6);
        let facing = smoothstep(-softness, softness, scatter.direction.dot(scatter.side));
        ray.throughput *= params.albedo * facing;
        ray.origin = hit.position + scatter.side * self.settings.surface_bias;
        ray.direction = scatter.direction;
        sanitize(ray, scatter.side);
    }

    fn sample_transmission(
        &self,
        incoming: Vec3A,
        normal: Vec3A,
        params: &SurfaceParams,
        rng: &mut RandomState,
    ) -> Scatter {
        let env_ior = self.settings.env_ior.max(1e-3);
        let inside = incoming.dot(normal) > 0.0;
        let (side, eta_i, eta_t) = if inside {
            (-normal, params.ior, env_ior)
        } else {
            (normal, env_ior, params.ior)
        };

        let microfacet = sample_ggx_normal(side, params.roughness, rng);
        let cos_theta = (-incoming).dot(microfacet);
        let fresnel = (schlick(cos_theta, ior_to_f0(eta_i, eta_t)) * self.settings.dielectric_boost).min(1.0);
        let reflect_probability = Interval::UNIT.clamp(fresnel + params.metallic);
        let choose_reflection = rng.next_f32() < reflect_probability;

        // Only accept refractions that actually cross to the far side; total
        // internal reflection falls back to the mirror direction.
        let refracted = refract(incoming, microfacet, eta_i / eta_t).filter(|t| t.dot(side) < 0.0);
        match refracted {
            Some(direction) if !choose_reflection => Scatter {
                direction,
                side: -side,
            },
            _ => Scatter {
                direction: reflect(incoming, microfacet).normalize_or(side),
                side,
            },
        }
    }

    fn sample_opaque(
        &self,
        ray: &mut Ray,
        position: Vec3A,
        normal: Vec3A,
        params: &SurfaceParams,
        rng: &mut RandomState,
    ) -> Scatter {
        let incoming = ray.direction;
        let side = if incoming.dot(normal) > 0.0 { -normal } else { normal };

        let cos_theta = side.dot(-incoming).max(0.0);
        let f0 = Color::splat(DIELECTRIC_F0).lerp(params.albedo, params.metallic);
        let fresnel = schlick_roughness(cos_theta, f0, params.roughness).element_sum() / 3.0;
        let specular_probability = Interval::UNIT.clamp(fresnel + params.metallic);

        if rng.next_f32() < specular_probability {
            let microfacet = sample_ggx_normal(side, params.roughness, rng);
            return Scatter {
                direction: reflect(incoming, microfacet).normalize_or(side),
                side,
            };
        }

        self.gather_direct_light(ray, position, side, params.albedo, rng);
        Scatter {
            direction: rng.cosine_hemisphere(side),
            side,
        }
    }

    /// Add the directional light's contribution at a diffuse hit.
    fn gather_direct_light(
        &self,
        ray: &mut Ray,
        position: Vec3A,
        normal: Vec3A,
        albedo: Color,
        rng: &mut RandomState,
    ) {
        let cos_light = normal.dot(self.light.direction).max(0.0);

        let mut jitter = rng.unit_vector();
        if jitter.dot(normal) < 0.0 {
            jitter = -jitter;
        }
        let origin = position + normal * self.settings.surface_bias + jitter * self.light.shadow_jitter;
        let mut shadow = Ray::new(origin, self.light.direction);
        if self.marcher.raycast(&mut shadow, rng).hit {
            return;
        }

        // Clouds crossed by the shadow ray dim the light.
        let contribution = albedo * cos_light * self.light.radiance() * shadow.throughput;
        ray.radiance += ray.throughput * contribution;
    }
}

/// Keep the ray well defined after degenerate numerics.
fn sanitize(ray: &mut Ray, fallback: Vec3A) {
    ray.direction = if ray.direction.is_finite() {
        ray.direction.normalize_or(fallback)
    } else {
        fallback
    };
    if !ray.throughput.is_finite() {
        ray.throughput = Color::ZERO;
    }
    if !ray.origin.is_finite() {
        ray.throughput = Color::ZERO;
        ray.origin = Vec3A::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::{CloudMedium, CloudSettings};
    use crate::material::Material;
    use crate::scene::Scene;
    use crate::sdf::{Object, ShapeKind};
    use crate::texture::Texture;
    use crate::transform::Transform;
    use approx::assert_abs_diff_eq;

    struct Fixture {
        scene: Scene,
        medium: CloudMedium,
        textures: MaterialTextures,
        light: DirectionalLight,
    }

    impl Fixture {
        fn new(material: Material) -> Self {
            Self {
                scene: Scene::new(vec![Object::new(
                    ShapeKind::Sphere,
                    Transform::at(Vec3A::ZERO, Vec3A::splat(1.0)),
                    material,
                )]),
                medium: CloudMedium::new(CloudSettings::default(), Texture::solid(Vec3A::ZERO)),
                textures: MaterialTextures::default(),
                light: DirectionalLight::new(Vec3A::new(0.0, 0.0, 1.0), Color::ONE, 1.0),
            }
        }

        fn shader(&self) -> Shader<'_> {
            let marcher = Marcher::new(&self.scene, &self.medium, self.light.radiance());
            Shader::new(marcher, &self.textures, &self.light, ShadingSettings::default())
        }
    }

    fn primary_hit(fixture: &Fixture, rng: &mut RandomState) -> (Ray, HitRecord) {
        let mut ray = Ray::new(Vec3A::new(0.1, 0.2, 4.0), Vec3A::NEG_Z);
        let hit = fixture.shader().marcher.raycast(&mut ray, rng);
        assert!(hit.hit);
        (ray, hit)
    }

    fn materials() -> Vec<Material> {
        vec![
            Material::diffuse(Color::new(0.8, 0.3, 0.2)),
            Material::metal(Color::new(0.9, 0.8, 0.5), 0.2),
            Material::metal(Color::splat(0.95), 0.0),
            Material::glass(Color::splat(0.98), 1.5, 0.0),
            Material::glass(Color::splat(0.9), 1.33, 0.6),
            Material {
                roughness: 2.0,
                metallic: -1.0,
                transmission: 0.5,
                ior: f32::NAN,
                ..Material::default()
            },
        ]
    }

    #[test]
    fn scattered_directions_are_unit_length() {
        let mut rng = RandomState::new(21);
        for material in materials() {
            let fixture = Fixture::new(material);
            let shader = fixture.shader();
            for _ in 0..200 {
                let (mut ray, hit) = primary_hit(&fixture, &mut rng);
                shader.shade(&hit, &mut ray, &mut rng);
                assert_abs_diff_eq!(ray.direction.length(), 1.0, epsilon = 1e-4);
                assert!(ray.throughput.is_finite());
                assert!(ray.radiance.is_finite());
            }
        }
    }

    #[test]
    fn throughput_never_exceeds_reflectance() {
        let mut rng = RandomState::new(22);
        for material in materials() {
            let fixture = Fixture::new(material);
            let shader = fixture.shader();
            let max_reflectance = material.albedo.clamp(Color::ZERO, Color::ONE).max_element();
            for _ in 0..200 {
                let (mut ray, hit) = primary_hit(&fixture, &mut rng);
                let before = ray.throughput_magnitude();
                shader.shade(&hit, &mut ray, &mut rng);
                assert!(ray.throughput_magnitude() <= before * max_reflectance + 1e-6);
            }
        }
    }

    #[test]
    fn lit_diffuse_surface_gathers_direct_light() {
        // Light straight behind the camera, surface facing it.
        let fixture = Fixture::new(Material::diffuse(Color::ONE));
        let shader = fixture.shader();
        let mut rng = RandomState::new(23);
        let mut gathered = false;
        for _ in 0..16 {
            let (mut ray, hit) = primary_hit(&fixture, &mut rng);
            shader.shade(&hit, &mut ray, &mut rng);
            gathered |= ray.radiance.x > 0.0;
            assert!(ray.radiance.x <= 1.0 + 1e-5);
        }
        assert!(gathered);
    }

    #[test]
    fn clear_glass_lets_rays_enter() {
        let fixture = Fixture::new(Material::glass(Color::ONE, 1.5, 0.0));
        let shader = fixture.shader();
        let mut rng = RandomState::new(24);
        let mut entered = 0;
        for _ in 0..100 {
            let (mut ray, hit) = primary_hit(&fixture, &mut rng);
            shader.shade(&hit, &mut ray, &mut rng);
            if ray.direction.dot(hit.position.normalize()) < 0.0 {
                entered += 1;
                assert!(fixture.scene.objects()[0].signed_distance(ray.origin) < 0.0);
            }
        }
        assert!(entered > 50, "only {entered} of 100 rays refracted");
    }

    fn surface_hit(position: Vec3A) -> HitRecord {
        HitRecord {
            object: Some(0),
            hit: true,
            t: 1.0,
            position,
        }
    }

    #[test]
    fn grazing_ray_inside_glass_reflects_back_in() {
        let fixture = Fixture::new(Material::glass(Color::ONE, 1.5, 0.0));
        let shader = fixture.shader();
        let sphere = &fixture.scene.objects()[0];
        let mut rng = RandomState::new(26);

        // sin(theta) = 0.95 exceeds 1 / 1.5, so refraction is impossible.
        let position = Vec3A::new((1.0f32 - 0.95 * 0.95).sqrt(), 0.95, 0.0);
        for _ in 0..200 {
            let mut ray = Ray::new(Vec3A::new(-0.3, 0.95, 0.0), Vec3A::X);
            shader.shade(&surface_hit(position), &mut ray, &mut rng);
            assert_abs_diff_eq!(ray.direction.length(), 1.0, epsilon = 1e-4);
            assert!(ray.direction.dot(position) < 0.0, "left the sphere: {}", ray.direction);
            assert!(sphere.signed_distance(ray.origin) < 0.0);
        }
    }

    #[test]
    fn normal_incidence_from_inside_mostly_exits() {
        let fixture = Fixture::new(Material::glass(Color::ONE, 1.5, 0.0));
        let shader = fixture.shader();
        let sphere = &fixture.scene.objects()[0];
        let mut rng = RandomState::new(27);

        let mut exited = 0;
        for _ in 0..200 {
            let mut ray = Ray::new(Vec3A::ZERO, Vec3A::Y);
            shader.shade(&surface_hit(Vec3A::Y), &mut ray, &mut rng);
            if ray.direction.y > 0.0 {
                exited += 1;
                assert!(ray.direction.abs_diff_eq(Vec3A::Y, 1e-4));
                assert!(sphere.signed_distance(ray.origin) > 0.0);
            } else {
                assert!(sphere.signed_distance(ray.origin) < 0.0);
            }
        }
        assert!(exited > 150, "only {exited} of 200 rays exited");
    }

    /// Brightest direct light gathered at a diffuse sphere point facing the
    /// light, with `blocker` placed between the two.
    fn direct_light_through(blocker: Option<Object>, medium: CloudMedium) -> f32 {
        let mut fixture = Fixture::new(Material::diffuse(Color::ONE));
        fixture.medium = medium;
        let mut objects = fixture.scene.objects().to_vec();
        objects.extend(blocker);
        fixture.scene = Scene::new(objects);
        let shader = fixture.shader();

        let position = Vec3A::new(0.1, 0.2, 1.0).normalize();
        let mut rng = RandomState::new(28);
        let mut brightest = 0.0f32;
        for _ in 0..64 {
            let mut ray = Ray::new(Vec3A::new(0.1, 0.2, 4.0), Vec3A::NEG_Z);
            shader.shade(&surface_hit(position), &mut ray, &mut rng);
            brightest = brightest.max(ray.radiance.x);
        }
        brightest
    }

    /// Slab across the light path, positioned so its density falloff is flat
    /// where the shadow rays cross it.
    fn slab(shape: ShapeKind) -> Object {
        Object::new(
            shape,
            Transform::at(Vec3A::new(0.0, 0.4, 2.5), Vec3A::new(2.0, 1.0, 0.25)),
            Material::default(),
        )
    }

    #[test]
    fn clouds_dim_and_solids_block_direct_light() {
        let clear_medium = || CloudMedium::new(CloudSettings::default(), Texture::solid(Vec3A::ZERO));
        let clear = direct_light_through(None, clear_medium());
        assert!(clear > 0.9, "clear sky gave {clear}");

        let dense = CloudMedium::new(
            CloudSettings {
                threshold: 0.0,
                ..CloudSettings::default()
            },
            Texture::solid(Vec3A::ONE),
        );
        let clouded = direct_light_through(Some(slab(ShapeKind::CloudVolume)), dense);
        assert!(clouded > 0.0, "cloud removed all light");
        assert!(clouded < clear - 0.05, "cloud did not dim: {clouded} vs {clear}");

        let blocked = direct_light_through(Some(slab(ShapeKind::Box)), clear_medium());
        assert_eq!(blocked, 0.0);
    }

    #[test]
    fn miss_records_leave_ray_untouched() {
        let fixture = Fixture::new(Material::default());
        let shader = fixture.shader();
        let mut ray = Ray::new(Vec3A::ZERO, Vec3A::X);
        let before = ray;
        let miss = HitRecord {
            object: None,
            hit: false,
            t: 10.0,
            position: Vec3A::new(10.0, 0.0, 0.0),
        };
        shader.shade(&miss, &mut ray, &mut RandomState::new(25));
        assert_eq!(ray.direction, before.direction);
        assert_eq!(ray.throughput, before.throughput);
    }
}
