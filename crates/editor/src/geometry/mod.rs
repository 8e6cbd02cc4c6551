//! Curve construction and sampling for road and junction geometry.

mod bezier;
mod curve;
mod mesh;
mod offset;

pub use bezier::{bezier_with_directions, BezierWithDirection, CubicBezier3};
pub use curve::{CatmullRom3, CurveKind};
pub use mesh::{
    junction_geo_attr, junction_geo_by_multiple_roads, junction_geo_by_two_roads,
    strip_geo_attr, JunctionEdgeRef,
};
pub use offset::{
    linear_blend_sample_points, offset_parallel_curve, sample_point_by_offset, OffsetSample,
    ParallelSamples, TransitionParams, transition_sample_points,
};

use glam::DVec3;
use shared::Point3;

/// Unit vector perpendicular to `tangent` in the ground plane, pointing
/// to the offset side. Vertical tangents collapse to zero.
pub fn vertical_vector(tangent: DVec3) -> DVec3 {
    DVec3::new(-tangent.z, 0.0, tangent.x).normalize_or_zero()
}

pub fn vec_of(p: &Point3) -> DVec3 {
    DVec3::new(p.x, p.y, p.z)
}

pub fn point_of(v: DVec3) -> Point3 {
    Point3::new(v.x, v.y, v.z)
}

pub fn vecs_of(points: &[Point3]) -> Vec<DVec3> {
    points.iter().map(vec_of).collect()
}

pub fn points_of(vecs: &[DVec3]) -> Vec<Point3> {
    vecs.iter().copied().map(point_of).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertical_vector_rotates_ninety_degrees() {
        let v = vertical_vector(DVec3::X);
        assert!((v - DVec3::Z).length() < 1e-12);
        let w = vertical_vector(DVec3::Z);
        assert!((w - -DVec3::X).length() < 1e-12);
    }

    #[test]
    fn test_vertical_vector_ignores_height() {
        let v = vertical_vector(DVec3::new(1.0, 5.0, 0.0));
        assert!((v - DVec3::Z).length() < 1e-12);
    }
}
