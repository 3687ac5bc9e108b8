//! Thin-lens camera for primary ray generation.

use glam::{Mat3A, Vec2, Vec3A};

use crate::random::RandomState;
use crate::ray::Ray;

/// Thin-lens camera with depth of field.
///
/// Ray parameters `(s, t)` span the image plane from the lower-left corner
/// `(0, 0)` to the upper-right corner `(1, 1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Point camera is looking from (camera position)
    pub lookfrom: Vec3A,
    /// Point camera is looking at (look target)
    pub lookat: Vec3A,
    /// Camera-relative "up" direction vector
    pub vup: Vec3A,
    /// Vertical field of view in degrees
    pub vfov: f32,
    /// Image width divided by height
    pub aspect_ratio: f32,
    /// Lens diameter; zero gives a pinhole camera
    pub aperture: f32,
    /// Distance from camera lookfrom point to plane of perfect focus
    pub focus_dist: f32,

    /// Lower-left corner of the focus plane
    lower_left_corner: Vec3A,
    /// Full width of the focus plane
    horizontal: Vec3A,
    /// Full height of the focus plane
    vertical: Vec3A,
    /// Camera frame basis vector pointing right (u)
    u: Vec3A,
    /// Camera frame basis vector pointing up (v)
    v: Vec3A,
}

impl Camera {
    /// Camera at `lookfrom` aimed at `lookat`.
    pub fn look_at(
        lookfrom: Vec3A,
        lookat: Vec3A,
        vup: Vec3A,
        vfov: f32,
        aspect_ratio: f32,
        aperture: f32,
        focus_dist: f32,
    ) -> Self {
        let mut camera = Self {
            lookfrom,
            lookat,
            vup,
            vfov,
            aspect_ratio,
            aperture,
            focus_dist,
            lower_left_corner: Vec3A::ZERO,
            horizontal: Vec3A::ZERO,
            vertical: Vec3A::ZERO,
            u: Vec3A::ZERO,
            v: Vec3A::ZERO,
        };
        camera.initialize();
        camera
    }

    /// Camera from a position and an orthonormal rotation matrix.
    ///
    /// The matrix maps camera space (looking down -Z with +Y up) to world space.
    pub fn from_rotation(
        position: Vec3A,
        rotation: Mat3A,
        vfov: f32,
        aspect_ratio: f32,
        aperture: f32,
        focus_dist: f32,
    ) -> Self {
        let forward = rotation * Vec3A::NEG_Z;
        let up = rotation * Vec3A::Y;
        Self::look_at(position, position + forward, up, vfov, aspect_ratio, aperture, focus_dist)
    }

    /// Recompute the image plane after the public parameters changed.
    pub fn initialize(&mut self) {
        let theta = self.vfov.clamp(1e-3, 179.0).to_radians();
        let half_height = (theta / 2.0).tan();
        let half_width = self.aspect_ratio.max(1e-6) * half_height;
        let focus_dist = if self.focus_dist > 0.0 { self.focus_dist } else { 1.0 };

        // Calculate the u,v,w unit basis vectors for the camera coordinate frame
        let w = (self.lookfrom - self.lookat).normalize_or(Vec3A::Z); // Points opposite view direction
        let u = self.vup.cross(w).normalize_or(Vec3A::X); // Points to camera right
        let v = w.cross(u); // Points to camera up

        self.lower_left_corner =
            self.lookfrom - half_width * focus_dist * u - half_height * focus_dist * v - focus_dist * w;
        self.horizontal = 2.0 * half_width * focus_dist * u;
        self.vertical = 2.0 * half_height * focus_dist * v;
        self.u = u;
        self.v = v;
    }

    /// Generate a ray through image-plane position `st`.
    ///
    /// With a non-zero aperture the origin is jittered over the lens disk so
    /// only the focus plane is sharp.
    pub fn get_ray(&self, st: Vec2, rng: &mut RandomState) -> Ray {
        let lens_radius = self.aperture / 2.0;
        let offset = if lens_radius > 0.0 {
            let rd = lens_radius * rng.in_unit_disk();
            self.u * rd.x + self.v * rd.y
        } else {
            Vec3A::ZERO
        };

        let origin = self.lookfrom + offset;
        let target = self.lower_left_corner + st.x * self.horizontal + st.y * self.vertical;
        Ray::new(origin, target - origin)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::look_at(Vec3A::new(0.0, 0.0, 4.0), Vec3A::ZERO, Vec3A::Y, 40.0, 1.0, 0.0, 4.0)
    }
}
