//! Pointer picking via ray-casting.
//!
//! Converts the pointer's normalized device coordinates into a world-space
//! ray and tests it against the chinchilla's bounding box. The camera is
//! orthographic, so every pointer ray shares the view direction and only
//! the origin slides across the view plane.
//!
//! The returned intersection point is what the drag logic anchors to: the
//! grab offset is the vector from the object pivot to this point.

use cgmath::{ElementWise, InnerSpace, Matrix4, Vector2, Vector3, Vector4, Zero};

use super::camera::OrthoCamera;

/// A 3D ray for intersection testing.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vector3<f32>,
    /// Normalized direction.
    pub direction: Vector3<f32>,
}

impl Ray {
    pub fn new(origin: Vector3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Point along the ray at distance `t`.
    pub fn point_at(&self, t: f32) -> Vector3<f32> {
        self.origin + self.direction * t
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy)]
pub struct Aabb {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl Aabb {
    pub fn new(min: Vector3<f32>, max: Vector3<f32>) -> Self {
        Self { min, max }
    }

    pub fn from_vertices(vertices: &[[f32; 3]]) -> Self {
        if vertices.is_empty() {
            return Self::new(Vector3::zero(), Vector3::zero());
        }

        let mut min = Vector3::new(vertices[0][0], vertices[0][1], vertices[0][2]);
        let mut max = min;

        for vertex in vertices.iter().skip(1) {
            let v = Vector3::new(vertex[0], vertex[1], vertex[2]);
            min.x = min.x.min(v.x);
            min.y = min.y.min(v.y);
            min.z = min.z.min(v.z);
            max.x = max.x.max(v.x);
            max.y = max.y.max(v.y);
            max.z = max.z.max(v.z);
        }

        Self::new(min, max)
    }

    /// Slab test. Returns the distance to the entry point, or the exit
    /// point when the ray starts inside, or None on a miss.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let inv_dir = Vector3::new(
            1.0 / ray.direction.x,
            1.0 / ray.direction.y,
            1.0 / ray.direction.z,
        );

        let t_min = (self.min - ray.origin).mul_element_wise(inv_dir);
        let t_max = (self.max - ray.origin).mul_element_wise(inv_dir);

        let t1 = Vector3::new(
            t_min.x.min(t_max.x),
            t_min.y.min(t_max.y),
            t_min.z.min(t_max.z),
        );
        let t2 = Vector3::new(
            t_min.x.max(t_max.x),
            t_min.y.max(t_max.y),
            t_min.z.max(t_max.z),
        );

        let t_near = t1.x.max(t1.y.max(t1.z));
        let t_far = t2.x.min(t2.y.min(t2.z));

        if t_near <= t_far && t_far >= 0.0 {
            Some(if t_near >= 0.0 { t_near } else { t_far })
        } else {
            None
        }
    }

    /// Applies a transformation matrix by re-bounding the 8 corners.
    pub fn transform(&self, matrix: &Matrix4<f32>) -> Self {
        let corners = [
            Vector3::new(self.min.x, self.min.y, self.min.z),
            Vector3::new(self.max.x, self.min.y, self.min.z),
            Vector3::new(self.min.x, self.max.y, self.min.z),
            Vector3::new(self.min.x, self.min.y, self.max.z),
            Vector3::new(self.max.x, self.max.y, self.min.z),
            Vector3::new(self.max.x, self.min.y, self.max.z),
            Vector3::new(self.min.x, self.max.y, self.max.z),
            Vector3::new(self.max.x, self.max.y, self.max.z),
        ];

        let mut transformed = Vec::with_capacity(8);
        for corner in &corners {
            let homogeneous = matrix * Vector4::new(corner.x, corner.y, corner.z, 1.0);
            transformed.push([
                homogeneous.x / homogeneous.w,
                homogeneous.y / homogeneous.w,
                homogeneous.z / homogeneous.w,
            ]);
        }

        Self::from_vertices(&transformed)
    }
}

/// Result of a successful pick.
#[derive(Debug, Clone, Copy)]
pub struct PickResult {
    /// Distance from the ray origin to the hit.
    pub distance: f32,
    /// World-space intersection point.
    pub point: Vector3<f32>,
}

/// Pointer NDC to world-space ray under the orthographic camera: the origin
/// slides across the view plane, the direction is the view direction.
pub fn screen_to_ray(ndc: Vector2<f32>, camera: &OrthoCamera) -> Ray {
    let (right, up, forward) = camera.basis();
    let origin =
        camera.eye + right * (ndc.x * camera.half_width) + up * (ndc.y * camera.half_height);
    Ray::new(origin, forward)
}

/// Tests a ray against an object's local bounds under its world transform.
pub fn pick(ray: &Ray, local_bounds: &Aabb, transform: &Matrix4<f32>) -> Option<PickResult> {
    let world_bounds = local_bounds.transform(transform);
    world_bounds.intersect_ray(ray).map(|distance| PickResult {
        distance,
        point: ray.point_at(distance),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::SquareMatrix;

    #[test]
    fn test_aabb_creation() {
        let vertices = vec![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [-1.0, -1.0, -1.0]];
        let aabb = Aabb::from_vertices(&vertices);

        assert_eq!(aabb.min, Vector3::new(-1.0, -1.0, -1.0));
        assert_eq!(aabb.max, Vector3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_ray_aabb_intersection() {
        let aabb = Aabb::new(Vector3::new(-1.0, -1.0, -1.0), Vector3::new(1.0, 1.0, 1.0));

        let ray = Ray::new(Vector3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(aabb.intersect_ray(&ray), Some(4.0));

        let ray_miss = Ray::new(Vector3::new(5.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(aabb.intersect_ray(&ray_miss).is_none());
    }

    #[test]
    fn test_transformed_aabb_moves_with_the_object() {
        let aabb = Aabb::new(Vector3::new(-1.0, -1.0, -1.0), Vector3::new(1.0, 1.0, 1.0));
        let moved = aabb.transform(&Matrix4::from_translation(Vector3::new(10.0, 0.0, 0.0)));

        assert_eq!(moved.min, Vector3::new(9.0, -1.0, -1.0));
        assert_eq!(moved.max, Vector3::new(11.0, 1.0, 1.0));
    }

    #[test]
    fn test_center_ray_hits_a_box_at_the_origin() {
        let camera = OrthoCamera::new(800, 600);
        let aabb = Aabb::new(Vector3::new(-1.0, -1.0, -1.0), Vector3::new(1.0, 1.0, 1.0));

        let ray = screen_to_ray(Vector2::new(0.0, 0.0), &camera);
        let result = pick(&ray, &aabb, &Matrix4::identity()).expect("center ray must hit");

        // The hit point lies on the box surface, on the camera side.
        assert!(result.point.magnitude() <= 3.0_f32.sqrt() + 1.0e-4);
        assert!(result.distance > 0.0);
        assert!(
            (result.point - camera.eye).magnitude() < camera.eye.magnitude(),
            "hit must be on the near side"
        );
    }

    #[test]
    fn test_edge_ray_misses_a_small_box() {
        let camera = OrthoCamera::new(800, 600);
        let aabb = Aabb::new(Vector3::new(-1.0, -1.0, -1.0), Vector3::new(1.0, 1.0, 1.0));

        // NDC (1, 0) is 5 world units right of the view center.
        let ray = screen_to_ray(Vector2::new(1.0, 0.0), &camera);
        assert!(pick(&ray, &aabb, &Matrix4::identity()).is_none());
    }
}
