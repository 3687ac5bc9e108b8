//! Object placement in world space.

use glam::{EulerRot, Mat3A, Vec3A};

/// Position, Euler rotation and scale of a scene object.
///
/// The scale doubles as the primitive's dimensions (see [`crate::sdf`]). The
/// inverse rotation is derived once here; transforms are immutable afterwards,
/// so distance queries never rebuild it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    position: Vec3A,
    rotation: Vec3A,
    scale: Vec3A,
    world_to_local: Mat3A,
}

impl Transform {
    /// Build a transform. `rotation` holds XYZ Euler angles in radians.
    pub fn new(position: Vec3A, rotation: Vec3A, scale: Vec3A) -> Self {
        let local_to_world = Mat3A::from_euler(EulerRot::XYZ, rotation.x, rotation.y, rotation.z);
        Self {
            position,
            rotation,
            scale,
            world_to_local: local_to_world.transpose(),
        }
    }

    /// Unrotated transform at `position`.
    pub fn at(position: Vec3A, scale: Vec3A) -> Self {
        Self::new(position, Vec3A::ZERO, scale)
    }

    pub fn position(&self) -> Vec3A {
        self.position
    }

    pub fn rotation(&self) -> Vec3A {
        self.rotation
    }

    pub fn scale(&self) -> Vec3A {
        self.scale
    }

    /// Map a world-space point into object-local space.
    pub fn to_local(&self, p: Vec3A) -> Vec3A {
        self.world_to_local * (p - self.position)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::at(Vec3A::ZERO, Vec3A::ONE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn translation_only() {
        let t = Transform::at(Vec3A::new(1.0, 2.0, 3.0), Vec3A::ONE);
        assert!(t.to_local(Vec3A::new(1.0, 2.0, 3.0)).abs_diff_eq(Vec3A::ZERO, 1e-6));
    }

    #[test]
    fn rotation_is_inverted() {
        // Object turned 90 degrees about Y: its local +X axis points along world -Z.
        let t = Transform::new(Vec3A::ZERO, Vec3A::new(0.0, FRAC_PI_2, 0.0), Vec3A::ONE);
        let local = t.to_local(Vec3A::new(0.0, 0.0, -1.0));
        assert!(local.abs_diff_eq(Vec3A::X, 1e-5), "got {local}");
    }
}
