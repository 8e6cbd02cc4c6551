use glam::DVec3;
use shared::GeoAttr;

use crate::modes::PickCategory;

/// A ray in world space
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: DVec3,
    pub direction: DVec3,
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy)]
pub struct Aabb {
    pub min: DVec3,
    pub max: DVec3,
}

impl Aabb {
    /// Compute AABB from a surface attribute (3 floats per vertex).
    pub fn from_geo(geo: &GeoAttr) -> Self {
        let mut min = DVec3::splat(f64::MAX);
        let mut max = DVec3::splat(f64::MIN);
        for chunk in geo.vertices.chunks_exact(3) {
            let p = DVec3::new(chunk[0], chunk[1], chunk[2]);
            min = min.min(p);
            max = max.max(p);
        }
        Self { min, max }
    }

    /// A box of `radius` around a point, for picking point handles.
    pub fn around_point(center: DVec3, radius: f64) -> Self {
        Self {
            min: center - DVec3::splat(radius),
            max: center + DVec3::splat(radius),
        }
    }

    /// Smallest box containing a point set, `None` for an empty set.
    pub fn from_points<I: IntoIterator<Item = DVec3>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut aabb = Self {
            min: first,
            max: first,
        };
        for p in iter {
            aabb.min = aabb.min.min(p);
            aabb.max = aabb.max.max(p);
        }
        Some(aabb)
    }

    pub fn union(&self, other: &Aabb) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }
}

/// Ray-AABB intersection using the slab method.
/// Returns the distance along the ray to the nearest hit, or None.
pub fn ray_aabb(ray: &Ray, aabb: &Aabb) -> Option<f64> {
    let inv_dir = DVec3::new(
        1.0 / ray.direction.x,
        1.0 / ray.direction.y,
        1.0 / ray.direction.z,
    );

    let t1 = (aabb.min.x - ray.origin.x) * inv_dir.x;
    let t2 = (aabb.max.x - ray.origin.x) * inv_dir.x;
    let t3 = (aabb.min.y - ray.origin.y) * inv_dir.y;
    let t4 = (aabb.max.y - ray.origin.y) * inv_dir.y;
    let t5 = (aabb.min.z - ray.origin.z) * inv_dir.z;
    let t6 = (aabb.max.z - ray.origin.z) * inv_dir.z;

    let tmin = t1.min(t2).max(t3.min(t4)).max(t5.min(t6));
    let tmax = t1.max(t2).min(t3.max(t4)).min(t5.max(t6));

    if tmax < 0.0 || tmin > tmax {
        return None;
    }

    Some(if tmin < 0.0 { tmax } else { tmin })
}

/// Möller-Trumbore ray-triangle intersection.
/// Returns the distance along the ray if hit, or None if no intersection.
pub fn ray_triangle_intersect(ray: &Ray, v0: DVec3, v1: DVec3, v2: DVec3) -> Option<f64> {
    const EPSILON: f64 = 1e-12;

    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = ray.direction.cross(edge2);
    let a = edge1.dot(h);

    // Ray is parallel to triangle
    if a.abs() < EPSILON {
        return None;
    }

    let f = 1.0 / a;
    let s = ray.origin - v0;
    let u = f * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * ray.direction.dot(q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(q);
    (t > EPSILON).then_some(t)
}

/// One pickable scene entity.
#[derive(Debug, Clone)]
pub struct PickTarget {
    pub id: String,
    pub category: PickCategory,
    pub aabb: Aabb,
}

/// Pick the nearest target hit by the ray, considering only the allowed
/// categories.
pub fn pick_nearest(
    ray: &Ray,
    targets: &[PickTarget],
    allowed: &[PickCategory],
) -> Option<(String, PickCategory)> {
    let mut best: Option<(&PickTarget, f64)> = None;
    for target in targets {
        if !allowed.contains(&target.category) {
            continue;
        }
        if let Some(dist) = ray_aabb(ray, &target.aabb) {
            if best.as_ref().is_none_or(|(_, d)| dist < *d) {
                best = Some((target, dist));
            }
        }
    }
    best.map(|(t, _)| (t.id.clone(), t.category))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn down_ray(x: f64, z: f64) -> Ray {
        Ray {
            origin: DVec3::new(x, 100.0, z),
            direction: -DVec3::Y,
        }
    }

    #[test]
    fn test_ray_aabb_hit_and_miss() {
        let aabb = Aabb {
            min: DVec3::new(-1.0, -1.0, -1.0),
            max: DVec3::new(1.0, 1.0, 1.0),
        };
        assert!(ray_aabb(&down_ray(0.0, 0.0), &aabb).is_some());
        assert!(ray_aabb(&down_ray(5.0, 0.0), &aabb).is_none());
    }

    #[test]
    fn test_ray_triangle() {
        let ray = down_ray(0.2, 0.2);
        let hit = ray_triangle_intersect(
            &ray,
            DVec3::new(-1.0, 0.0, -1.0),
            DVec3::new(2.0, 0.0, -1.0),
            DVec3::new(-1.0, 0.0, 2.0),
        );
        assert!((hit.unwrap() - 100.0).abs() < 1e-9);

        let miss = ray_triangle_intersect(
            &down_ray(5.0, 5.0),
            DVec3::new(-1.0, 0.0, -1.0),
            DVec3::new(2.0, 0.0, -1.0),
            DVec3::new(-1.0, 0.0, 2.0),
        );
        assert!(miss.is_none());
    }

    #[test]
    fn test_pick_respects_allow_list() {
        let targets = vec![
            PickTarget {
                id: "road".into(),
                category: PickCategory::RoadSurface,
                aabb: Aabb::around_point(DVec3::ZERO, 2.0),
            },
            PickTarget {
                id: "junction".into(),
                category: PickCategory::JunctionArea,
                aabb: Aabb::around_point(DVec3::ZERO, 5.0),
            },
        ];
        let ray = down_ray(0.0, 0.0);

        let hit = pick_nearest(&ray, &targets, &[PickCategory::JunctionArea]);
        assert_eq!(hit, Some(("junction".into(), PickCategory::JunctionArea)));

        let none = pick_nearest(&ray, &targets, &[PickCategory::ControlPoint]);
        assert!(none.is_none());
    }

    #[test]
    fn test_pick_nearest_wins() {
        let targets = vec![
            PickTarget {
                id: "low".into(),
                category: PickCategory::RoadSurface,
                aabb: Aabb::around_point(DVec3::new(0.0, 0.0, 0.0), 1.0),
            },
            PickTarget {
                id: "high".into(),
                category: PickCategory::RoadSurface,
                aabb: Aabb::around_point(DVec3::new(0.0, 50.0, 0.0), 1.0),
            },
        ];
        let hit = pick_nearest(&down_ray(0.0, 0.0), &targets, &[PickCategory::RoadSurface]);
        assert_eq!(hit.unwrap().0, "high");
    }
}
