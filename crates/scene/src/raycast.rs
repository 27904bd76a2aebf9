//! Ray intersection against the pickable shapes a scene holds.

use glam::{Mat4, Vec3};

/// Half-line used for picking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Ray origin in world space.
    pub origin: Vec3,
    /// Unit direction in world space.
    pub direction: Vec3,
}

impl Ray {
    /// Create a ray, normalizing `direction`.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Point at parameter `t`.
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Result of intersecting a ray with one shape
#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    /// Position where ray hit the shape
    pub position: Vec3,
    /// Distance from ray origin to hit point
    pub distance: f32,
    /// UV coordinates on a quad (0-1 range); zero for spheres
    pub uv: (f32, f32),
}

/// Raycast against an oriented quad of `size` lying in the local XY plane of
/// `world` and centered on its origin. Both faces are hit.
pub fn raycast_plane_quad(ray: &Ray, world: &Mat4, size: (f32, f32)) -> Option<RayHit> {
    let inverse = world.inverse();
    let origin = inverse.transform_point3(ray.origin);
    let dir = inverse.transform_vector3(ray.direction);

    // Ray parallel to plane
    if dir.z.abs() < 1e-6 {
        return None;
    }

    // Parameter along the local-space ray; the same value addresses the
    // world-space ray because the transform is affine.
    let t = -origin.z / dir.z;
    if t < 0.0 {
        return None;
    }

    let local = origin + dir * t;
    let half_width = size.0 * 0.5;
    let half_height = size.1 * 0.5;
    if local.x.abs() > half_width || local.y.abs() > half_height {
        return None;
    }

    let position = world.transform_point3(local);
    Some(RayHit {
        position,
        distance: (position - ray.origin).length(),
        uv: (
            (local.x + half_width) / size.0,
            (local.y + half_height) / size.1,
        ),
    })
}

/// Raycast against a quad of `size` centered on `center` that always faces
/// `viewer`. Sprites are intersected this way.
pub fn raycast_billboard_quad(ray: &Ray, center: Vec3, size: (f32, f32), viewer: Vec3) -> Option<RayHit> {
    let normal = (viewer - center).normalize_or_zero();
    if normal == Vec3::ZERO {
        return None;
    }
    let up_hint = if normal.y.abs() > 0.999 { Vec3::Z } else { Vec3::Y };
    let right = up_hint.cross(normal).normalize();
    let up = normal.cross(right);

    let denom = ray.direction.dot(normal);
    if denom.abs() < 1e-4 {
        return None;
    }
    let t = (center - ray.origin).dot(normal) / denom;
    if t < 0.0 {
        return None;
    }

    let position = ray.at(t);
    let offset = position - center;
    let (u, v) = (offset.dot(right), offset.dot(up));
    let (half_width, half_height) = (size.0 * 0.5, size.1 * 0.5);
    if u.abs() > half_width || v.abs() > half_height {
        return None;
    }
    Some(RayHit {
        position,
        distance: t,
        uv: ((u + half_width) / size.0, (v + half_height) / size.1),
    })
}
