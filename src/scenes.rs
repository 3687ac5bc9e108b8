//! Built-in demo scene used when the configuration lists no objects.

use glam::Vec3A;

use crate::material::Material;
use crate::ray::Color;
use crate::sdf::{Object, ShapeKind};
use crate::transform::Transform;

/// A small studio: ground slab, glass, metal and textured primitives, an
/// emissive orb and a cloud bank overhead.
pub fn demo_scene() -> Vec<Object> {
    let ground = Object::new(
        ShapeKind::Box,
        Transform::at(Vec3A::new(0.0, -0.55, 0.0), Vec3A::new(8.0, 0.05, 8.0)),
        Material::diffuse(Color::new(0.55, 0.55, 0.52)),
    );

    let glass = Object::new(
        ShapeKind::Sphere,
        Transform::at(Vec3A::new(0.0, 0.0, 0.0), Vec3A::splat(0.5)),
        Material::glass(Color::new(0.96, 0.98, 1.0), 1.5, 0.02),
    );

    let gold = Object::new(
        ShapeKind::Sphere,
        Transform::at(Vec3A::new(1.2, -0.15, -0.4), Vec3A::splat(0.35)),
        Material::metal(Color::new(1.0, 0.78, 0.34), 0.25),
    );

    let pillar = Object::new(
        ShapeKind::Cylinder,
        Transform::new(Vec3A::new(-1.3, -0.05, -0.5), Vec3A::new(0.0, 0.3, 0.0), Vec3A::new(0.3, 0.45, 0.3)),
        Material {
            albedo: Color::new(0.7, 0.25, 0.2),
            roughness: 0.6,
            textured: true,
            ..Material::default()
        },
    );

    let crate_box = Object::new(
        ShapeKind::Box,
        Transform::new(Vec3A::new(0.6, -0.3, 1.0), Vec3A::new(0.0, 0.6, 0.0), Vec3A::splat(0.2)),
        Material {
            albedo: Color::new(0.2, 0.35, 0.6),
            roughness: 0.15,
            ..Material::default()
        },
    );

    let orb = Object::new(
        ShapeKind::Sphere,
        Transform::at(Vec3A::new(-0.4, -0.38, 0.9), Vec3A::splat(0.12)),
        Material::emissive(Color::new(1.0, 0.6, 0.3), 8.0),
    );

    let clouds = Object::new(
        ShapeKind::CloudVolume,
        Transform::at(Vec3A::new(0.0, 4.0, -6.0), Vec3A::new(10.0, 1.2, 4.0)),
        Material::default(),
    );

    vec![ground, glass, gold, pillar, crate_box, orb, clouds]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Scene;

    #[test]
    fn demo_scene_has_one_of_each_shape() {
        let scene = Scene::new(demo_scene());
        for shape in [ShapeKind::Sphere, ShapeKind::Box, ShapeKind::Cylinder, ShapeKind::CloudVolume] {
            assert!(scene.objects().iter().any(|o| o.shape == shape), "{shape:?} missing");
        }
        assert!(scene.objects().iter().any(|o| o.material.is_emissive()));
    }
}
