use glam::{DVec2, DVec3};

use super::camera::{OrbitCamera, Viewport};

/// Half-space with an inward-facing normal.
#[derive(Debug, Clone, Copy)]
struct Plane {
    normal: DVec3,
    d: f64,
}

impl Plane {
    fn from_points(a: DVec3, b: DVec3, c: DVec3) -> Self {
        let normal = (b - a).cross(c - a).normalize_or_zero();
        Self {
            normal,
            d: -normal.dot(a),
        }
    }

    fn signed_distance(&self, point: DVec3) -> f64 {
        self.normal.dot(point) + self.d
    }

    fn flipped(self) -> Self {
        Self {
            normal: -self.normal,
            d: -self.d,
        }
    }
}

/// Six-plane selection frustum built from a screen-space rectangle.
#[derive(Debug, Clone)]
pub struct Frustum {
    planes: [Plane; 6],
}

impl Frustum {
    /// Build the frustum spanned by the near/far unprojections of a
    /// screen rectangle's corners. A degenerate rectangle is nudged by
    /// an epsilon so the frustum keeps volume.
    pub fn from_screen_rect(
        camera: &OrbitCamera,
        viewport: Viewport,
        start: DVec2,
        current: DVec2,
    ) -> Self {
        let mut min = start.min(current);
        let mut max = start.max(current);
        let nudge = |v: f64| f64::EPSILON * (1.0 + v.abs()) * 4.0;
        if max.x - min.x == 0.0 {
            min.x -= nudge(min.x);
            max.x += nudge(max.x);
        }
        if max.y - min.y == 0.0 {
            min.y -= nudge(min.y);
            max.y += nudge(max.y);
        }

        let corner = |x: f64, y: f64, z: f64| {
            let ndc = viewport.to_ndc(DVec2::new(x, y));
            camera.unproject(DVec3::new(ndc.x, ndc.y, z), viewport)
        };
        // n/f = near/far, t/b = top/bottom, l/r = left/right in screen
        // space.
        let ntl = corner(min.x, min.y, -1.0);
        let ntr = corner(max.x, min.y, -1.0);
        let nbl = corner(min.x, max.y, -1.0);
        let nbr = corner(max.x, max.y, -1.0);
        let ftl = corner(min.x, min.y, 1.0);
        let ftr = corner(max.x, min.y, 1.0);
        let fbl = corner(min.x, max.y, 1.0);
        let fbr = corner(max.x, max.y, 1.0);

        let mut planes = [
            Plane::from_points(ntl, ntr, ftr), // top
            Plane::from_points(nbr, nbl, fbl), // bottom
            Plane::from_points(nbl, ntl, ftl), // left
            Plane::from_points(ntr, nbr, fbr), // right
            Plane::from_points(ntr, ntl, nbl), // near
            Plane::from_points(ftl, ftr, fbr), // far
        ];

        // Winding of the unprojected corners depends on the camera, so
        // orient every plane toward the frustum interior instead of
        // relying on it.
        let centroid =
            (ntl + ntr + nbl + nbr + ftl + ftr + fbl + fbr) / 8.0;
        for plane in &mut planes {
            if plane.signed_distance(centroid) < 0.0 {
                *plane = plane.flipped();
            }
        }

        Self { planes }
    }

    /// True when the point lies inside all six half-spaces.
    pub fn contains(&self, point: DVec3) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.signed_distance(point) >= 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn top_down_camera() -> OrbitCamera {
        let mut camera = OrbitCamera::new();
        camera.pitch = 1.5;
        camera.distance = 100.0;
        camera
    }

    #[test]
    fn test_full_screen_frustum_contains_target() {
        let camera = top_down_camera();
        let viewport = Viewport::new(800.0, 600.0);
        let frustum = Frustum::from_screen_rect(
            &camera,
            viewport,
            DVec2::new(0.0, 0.0),
            DVec2::new(800.0, 600.0),
        );
        assert!(frustum.contains(camera.target));
        // Far outside the view.
        assert!(!frustum.contains(DVec3::new(10_000.0, 0.0, 0.0)));
    }

    #[test]
    fn test_corner_rect_excludes_center() {
        let camera = top_down_camera();
        let viewport = Viewport::new(800.0, 600.0);
        let frustum = Frustum::from_screen_rect(
            &camera,
            viewport,
            DVec2::new(0.0, 0.0),
            DVec2::new(40.0, 40.0),
        );
        assert!(!frustum.contains(camera.target));
    }

    #[test]
    fn test_swapped_corners_select_same_volume() {
        let camera = top_down_camera();
        let viewport = Viewport::new(800.0, 600.0);
        let a = Frustum::from_screen_rect(
            &camera,
            viewport,
            DVec2::new(100.0, 100.0),
            DVec2::new(700.0, 500.0),
        );
        let b = Frustum::from_screen_rect(
            &camera,
            viewport,
            DVec2::new(700.0, 500.0),
            DVec2::new(100.0, 100.0),
        );
        for x in -10..=10 {
            for z in -10..=10 {
                let p = DVec3::new(x as f64 * 8.0, 0.0, z as f64 * 8.0);
                assert_eq!(a.contains(p), b.contains(p));
            }
        }
    }

    #[test]
    fn test_degenerate_rect_has_no_volume_to_speak_of() {
        let camera = top_down_camera();
        let viewport = Viewport::new(800.0, 600.0);
        let frustum = Frustum::from_screen_rect(
            &camera,
            viewport,
            DVec2::new(400.0, 300.0),
            DVec2::new(400.0, 300.0),
        );
        // The nudged frustum is a sliver: it must not grab points away
        // from its axis.
        assert!(!frustum.contains(DVec3::new(50.0, 0.0, 50.0)));
    }
}
