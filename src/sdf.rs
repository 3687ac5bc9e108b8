//! Signed distance functions for the scene primitives.
//!
//! Distances are negative strictly inside a volume, zero on its boundary and
//! positive outside. Primitive dimensions come from the object's scale.

use glam::{Vec2, Vec3A};

use crate::material::Material;
use crate::transform::Transform;

/// Primitive shape of a scene object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    /// Sphere of radius `scale.x`
    Sphere,
    /// Box with half extents `scale`
    Box,
    /// Capped Y-axis cylinder of radius `scale.x` and half height `scale.y`
    Cylinder,
    /// Participating medium bounded by a box with half extents `scale`
    CloudVolume,
}

/// A primitive placed in the scene with its surface material.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    pub shape: ShapeKind,
    pub transform: Transform,
    pub material: Material,
}

impl Object {
    pub fn new(shape: ShapeKind, transform: Transform, material: Material) -> Self {
        Self {
            shape,
            transform,
            material,
        }
    }

    pub fn is_cloud(&self) -> bool {
        self.shape == ShapeKind::CloudVolume
    }

    /// Signed distance from a world-space point to this object's surface.
    pub fn signed_distance(&self, p: Vec3A) -> f32 {
        let local = self.transform.to_local(p);
        let size = self.transform.scale();
        match self.shape {
            ShapeKind::Sphere => sd_sphere(local, size.x),
            ShapeKind::Box | ShapeKind::CloudVolume => sd_box(local, size),
            ShapeKind::Cylinder => sd_cylinder(local, size.x, size.y),
        }
    }
}

pub fn sd_sphere(p: Vec3A, radius: f32) -> f32 {
    p.length() - radius
}

pub fn sd_box(p: Vec3A, half_extents: Vec3A) -> f32 {
    let q = p.abs() - half_extents;
    q.max(Vec3A::ZERO).length() + q.max_element().min(0.0)
}

pub fn sd_cylinder(p: Vec3A, radius: f32, half_height: f32) -> f32 {
    let d = Vec2::new(Vec2::new(p.x, p.z).length(), p.y.abs()) - Vec2::new(radius, half_height);
    d.x.max(d.y).min(0.0) + d.max(Vec2::ZERO).length()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f32::consts::FRAC_PI_4;

    fn object(shape: ShapeKind, transform: Transform) -> Object {
        Object::new(shape, transform, Material::default())
    }

    #[test]
    fn sign_convention_for_every_primitive() {
        let shapes = [
            ShapeKind::Sphere,
            ShapeKind::Box,
            ShapeKind::Cylinder,
            ShapeKind::CloudVolume,
        ];
        let transform = Transform::new(
            Vec3A::new(0.5, -1.0, 2.0),
            Vec3A::new(0.3, FRAC_PI_4, -0.2),
            Vec3A::new(0.6, 0.4, 0.5),
        );
        for shape in shapes {
            let obj = object(shape, transform);
            let center = transform.position();
            assert!(obj.signed_distance(center) < 0.0, "{shape:?} center");
            assert!(obj.signed_distance(center + Vec3A::splat(3.0)) > 0.0, "{shape:?} far");
        }
    }

    #[test]
    fn sphere_boundary_is_zero() {
        let obj = object(ShapeKind::Sphere, Transform::at(Vec3A::ZERO, Vec3A::splat(0.3)));
        assert_abs_diff_eq!(obj.signed_distance(Vec3A::ZERO), -0.3, epsilon = 1e-6);
        for dir in [Vec3A::X, Vec3A::NEG_Y, Vec3A::new(1.0, 1.0, 1.0).normalize()] {
            assert_abs_diff_eq!(obj.signed_distance(dir * 0.3), 0.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn box_boundary_and_interior() {
        let half = Vec3A::new(1.0, 2.0, 0.5);
        assert_abs_diff_eq!(sd_box(Vec3A::new(1.0, 0.0, 0.0), half), 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(sd_box(Vec3A::new(0.0, 2.0, 0.2), half), 0.0, epsilon = 1e-6);
        // Interior distance is to the nearest face.
        assert_abs_diff_eq!(sd_box(Vec3A::ZERO, half), -0.5, epsilon = 1e-6);
        // Exterior corner distance is Euclidean.
        let corner = sd_box(Vec3A::new(2.0, 3.0, 0.5), half);
        assert_abs_diff_eq!(corner, 2.0f32.sqrt(), epsilon = 1e-6);
    }

    #[test]
    fn cylinder_caps_and_side() {
        assert_abs_diff_eq!(sd_cylinder(Vec3A::new(0.5, 0.0, 0.0), 0.5, 1.0), 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(sd_cylinder(Vec3A::new(0.0, 1.0, 0.2), 0.5, 1.0), 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(sd_cylinder(Vec3A::new(0.0, 3.0, 0.0), 0.5, 1.0), 2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(sd_cylinder(Vec3A::ZERO, 0.5, 1.0), -0.5, epsilon = 1e-6);
    }

    #[test]
    fn rotation_applies_before_evaluation() {
        // A thin slab along local X, turned 90 degrees about Z, extends along world Y.
        let slab = object(
            ShapeKind::Box,
            Transform::new(Vec3A::ZERO, Vec3A::new(0.0, 0.0, std::f32::consts::FRAC_PI_2), Vec3A::new(2.0, 0.1, 0.1)),
        );
        assert!(slab.signed_distance(Vec3A::new(0.0, 1.5, 0.0)) < 0.0);
        assert!(slab.signed_distance(Vec3A::new(1.5, 0.0, 0.0)) > 0.0);
    }
}
