//! Scene description and nearest-object queries.

use glam::Vec3A;

use crate::sdf::Object;

/// Offset used by the tetrahedral gradient estimate.
const NORMAL_EPSILON: f32 = 5e-4;

/// Result of a nearest-object query.
#[derive(Debug, Clone, Copy)]
pub struct NearestObject<'a> {
    /// Position of the object in the scene list
    pub index: usize,
    /// The object itself
    pub object: &'a Object,
    /// Signed distance from the query point, computed for this query only
    pub distance: f32,
}

/// Ordered collection of scene objects.
///
/// Object order is significant: when two objects are equally close, the one
/// that comes first wins.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    objects: Vec<Object>,
}

impl Scene {
    pub fn new(objects: Vec<Object>) -> Self {
        Self { objects }
    }

    pub fn objects(&self) -> &[Object] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn object(&self, index: usize) -> Option<&Object> {
        self.objects.get(index)
    }

    /// Object whose surface is closest to `p` by absolute signed distance.
    ///
    /// Linear scan over every object; returns `None` only for an empty scene.
    pub fn nearest_object(&self, p: Vec3A) -> Option<NearestObject<'_>> {
        let mut nearest: Option<NearestObject<'_>> = None;
        for (index, object) in self.objects.iter().enumerate() {
            let distance = object.signed_distance(p);
            let closer = match nearest {
                Some(best) => distance.abs() < best.distance.abs(),
                None => true,
            };
            if closer {
                nearest = Some(NearestObject {
                    index,
                    object,
                    distance,
                });
            }
        }
        nearest
    }

    /// Outward surface normal of object `index` near `p`.
    ///
    /// Uses the tetrahedral gradient of that object's own distance field, so
    /// neighbouring objects and cloud volumes do not bend it.
    pub fn normal(&self, index: usize, p: Vec3A) -> Vec3A {
        let Some(object) = self.objects.get(index) else {
            return Vec3A::Y;
        };
        let k = [
            Vec3A::new(1.0, -1.0, -1.0),
            Vec3A::new(-1.0, -1.0, 1.0),
            Vec3A::new(-1.0, 1.0, -1.0),
            Vec3A::new(1.0, 1.0, 1.0),
        ];
        let gradient = k
            .iter()
            .map(|&dir| dir * object.signed_distance(p + dir * NORMAL_EPSILON))
            .fold(Vec3A::ZERO, |acc, v| acc + v);
        gradient.normalize_or(Vec3A::Y)
    }
}

impl From<Vec<Object>> for Scene {
    fn from(objects: Vec<Object>) -> Self {
        Self::new(objects)
    }
}
