use glam::{DVec2, DVec3};
use shared::GeoAttr;

use crate::constants::{JUNCTION_BCP_RATIO, JUNCTION_EDGE_SEGMENT, MM_DEVIATION};

use super::bezier::bezier_with_directions;

/// Quad-strip surface between two polylines with the same sample count.
///
/// Every sample pair contributes two triangles, wound `a,b,d` / `a,d,c`
/// so the surface faces up when `points1` is the left rail.
pub fn strip_geo_attr(points1: &[DVec3], points2: &[DVec3]) -> GeoAttr {
    let count = points1.len().min(points2.len());
    let mut vertices = Vec::with_capacity(count * 6);
    let mut indices = Vec::new();

    for i in 0..count {
        let p1 = points1[i];
        let p2 = points2[i];
        vertices.extend_from_slice(&[p1.x, p1.y, p1.z]);
        vertices.extend_from_slice(&[p2.x, p2.y, p2.z]);

        if i + 1 < count {
            let a = (i * 2) as u32;
            let b = (i * 2 + 1) as u32;
            let c = ((i + 1) * 2) as u32;
            let d = ((i + 1) * 2 + 1) as u32;
            indices.extend_from_slice(&[a, b, d]);
            indices.extend_from_slice(&[a, d, c]);
        }
    }

    GeoAttr { vertices, indices }
}

/// One road end on a junction boundary: the anchor data the area mesh is
/// built from.
#[derive(Debug, Clone)]
pub struct JunctionEdgeRef {
    /// Direction out of the road into the junction, in the ground plane.
    pub along_vec: DVec3,
    pub left_point: DVec3,
    pub right_point: DVec3,
    pub is_tail: bool,
}

/// Junction area mesh between exactly two road ends: two bezier edges
/// bridged by a triangle ladder.
pub fn junction_geo_by_two_roads(sample_points: &[Vec<DVec3>]) -> Option<GeoAttr> {
    if sample_points.len() < 2 {
        return None;
    }
    let first = &sample_points[0];
    let second = &sample_points[1];

    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    for p in first.iter().chain(second.iter()) {
        vertices.extend_from_slice(&[p.x, p.y, p.z]);
    }

    let total = (first.len() + second.len()) as u32;
    for i in 0..JUNCTION_EDGE_SEGMENT as u32 {
        indices.extend_from_slice(&[i, total - i - 1, total - i - 2]);
        indices.extend_from_slice(&[i, total - i - 2, i + 1]);
    }

    Some(GeoAttr { vertices, indices })
}

/// Junction area mesh for three or more road ends: a fan around the
/// centroid of the edge midpoints.
pub fn junction_geo_by_multiple_roads(sample_points: &[Vec<DVec3>]) -> Option<GeoAttr> {
    if sample_points.len() < 2 {
        return None;
    }

    let mut vertices = Vec::new();
    let mut indices: Vec<u32> = Vec::new();
    let mut center = DVec3::ZERO;
    let mut vertex_index: u32 = 0;
    let mut group_starts = Vec::with_capacity(sample_points.len());

    for points in sample_points {
        for p in points {
            vertices.extend_from_slice(&[p.x, p.y, p.z]);
        }
        group_starts.push(vertex_index);
        vertex_index += points.len() as u32;
        // Edge segment counts are even, so the midpoint is a sample.
        center += points[(points.len() - 1) / 2];
    }
    center /= sample_points.len() as f64;
    vertices.extend_from_slice(&[center.x, center.y, center.z]);

    let half = (JUNCTION_EDGE_SEGMENT / 2) as u32;
    for i in 0..group_starts.len() {
        let current = group_starts[i];
        let next = group_starts[(i + 1) % group_starts.len()];
        let current_middle = half + current;
        let next_middle = half + next;

        for step in 0..half {
            if step == 0 {
                indices.extend_from_slice(&[vertex_index, next_middle, current_middle]);
            }
            indices.extend_from_slice(&[
                current_middle + step,
                next_middle - step,
                current_middle + step + 1,
            ]);
            indices.extend_from_slice(&[
                next_middle - step,
                next_middle - step - 1,
                current_middle + step + 1,
            ]);
        }
    }

    Some(GeoAttr { vertices, indices })
}

/// Sample the bezier edges bridging consecutive road ends of a junction
/// boundary, one edge per adjacent pair.
fn bezier_edge_sample_points(ref_boundary: &[JunctionEdgeRef]) -> Vec<Vec<DVec3>> {
    let mut sample_points = Vec::new();
    for i in 0..ref_boundary.len() {
        let current = &ref_boundary[i];
        let next = &ref_boundary[(i + 1) % ref_boundary.len()];

        // Which corners connect depends on the in/out relation of the
        // two road ends under the circular ordering.
        let (first_point, second_point) = match (current.is_tail, next.is_tail) {
            (true, true) => (current.left_point, next.right_point),
            (false, false) => (current.right_point, next.left_point),
            (true, false) => (current.left_point, next.left_point),
            (false, true) => (current.right_point, next.right_point),
        };

        // Coincident endpoints cannot form an edge; millimeter deviation
        // counts as coincident.
        if first_point.distance(second_point) < MM_DEVIATION {
            continue;
        }

        let edge = bezier_with_directions(
            first_point,
            current.along_vec,
            next.along_vec,
            second_point,
            None,
        );
        sample_points.push(edge.curve.spaced_points(JUNCTION_EDGE_SEGMENT));
    }
    sample_points
}

/// Sort road ends counterclockwise around the junction so consecutive
/// entries are geometric neighbors.
///
/// The pivot is the centroid of pairwise 2D bezier midpoints between the
/// road-end centers, which stays inside the area even for lopsided
/// junctions.
fn sort_ref_boundary(mut ref_boundary: Vec<JunctionEdgeRef>) -> Vec<JunctionEdgeRef> {
    if ref_boundary.len() < 3 {
        return ref_boundary;
    }

    let centers: Vec<DVec2> = ref_boundary
        .iter()
        .map(|b| {
            DVec2::new(
                (b.left_point.x + b.right_point.x) / 2.0,
                (b.left_point.z + b.right_point.z) / 2.0,
            )
        })
        .collect();

    let mut pivot = DVec2::ZERO;
    let mut count = 0;
    for i in 0..centers.len() {
        let dir1 = DVec2::new(ref_boundary[i].along_vec.x, ref_boundary[i].along_vec.z);
        for j in i + 1..centers.len() {
            let dir2 = DVec2::new(ref_boundary[j].along_vec.x, ref_boundary[j].along_vec.z);
            pivot += bezier2_midpoint(centers[i], dir1, dir2, centers[j]);
            count += 1;
        }
    }
    if count > 0 {
        pivot /= count as f64;
    }

    let mut keyed: Vec<(f64, JunctionEdgeRef)> = centers
        .iter()
        .zip(ref_boundary.drain(..))
        .map(|(center, boundary)| {
            let rel = *center - pivot;
            (rel.y.atan2(rel.x), boundary)
        })
        .collect();
    keyed.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    keyed.into_iter().map(|(_, boundary)| boundary).collect()
}

fn bezier2_midpoint(p1: DVec2, dir1: DVec2, dir2: DVec2, p2: DVec2) -> DVec2 {
    let dist = p1.distance(p2);
    let cp1 = p1 + dir1.normalize_or_zero() * (dist * JUNCTION_BCP_RATIO);
    let cp2 = p2 + dir2.normalize_or_zero() * (dist * JUNCTION_BCP_RATIO);
    // De Casteljau at t = 0.5.
    (p1 + cp1 * 3.0 + cp2 * 3.0 + p2) / 8.0
}

/// Full junction area mesh from unordered road-end anchors. `None` when
/// fewer than two usable edges remain.
pub fn junction_geo_attr(ref_boundary: Vec<JunctionEdgeRef>) -> Option<GeoAttr> {
    if ref_boundary.len() < 2 {
        return None;
    }
    let is_multiple = ref_boundary.len() > 2;
    let sorted = sort_ref_boundary(ref_boundary);
    let sample_points = bezier_edge_sample_points(&sorted);
    if is_multiple {
        junction_geo_by_multiple_roads(&sample_points)
    } else {
        junction_geo_by_two_roads(&sample_points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_counts() {
        let left: Vec<DVec3> = (0..5).map(|i| DVec3::new(i as f64, 0.0, 0.0)).collect();
        let right: Vec<DVec3> = (0..5).map(|i| DVec3::new(i as f64, 0.0, 3.5)).collect();
        let attr = strip_geo_attr(&left, &right);
        assert_eq!(attr.vertices.len(), 5 * 2 * 3);
        assert_eq!(attr.indices.len(), 4 * 6);
        assert!(attr.indices.iter().all(|&i| (i as usize) < 10));
    }

    #[test]
    fn test_strip_tolerates_mismatched_counts() {
        let left: Vec<DVec3> = (0..5).map(|i| DVec3::new(i as f64, 0.0, 0.0)).collect();
        let right: Vec<DVec3> = (0..3).map(|i| DVec3::new(i as f64, 0.0, 3.5)).collect();
        let attr = strip_geo_attr(&left, &right);
        assert_eq!(attr.vertices.len(), 3 * 2 * 3);
    }

    fn facing_ends(gap: f64, width: f64) -> Vec<JunctionEdgeRef> {
        vec![
            JunctionEdgeRef {
                along_vec: DVec3::X,
                left_point: DVec3::new(0.0, 0.0, 0.0),
                right_point: DVec3::new(0.0, 0.0, width),
                is_tail: true,
            },
            JunctionEdgeRef {
                along_vec: -DVec3::X,
                left_point: DVec3::new(gap, 0.0, width),
                right_point: DVec3::new(gap, 0.0, 0.0),
                is_tail: false,
            },
        ]
    }

    #[test]
    fn test_two_road_junction_mesh() {
        let attr = junction_geo_attr(facing_ends(20.0, 3.5)).unwrap();
        let vertex_count = attr.vertices.len() / 3;
        assert_eq!(vertex_count, (JUNCTION_EDGE_SEGMENT + 1) * 2);
        assert_eq!(attr.indices.len(), JUNCTION_EDGE_SEGMENT * 6);
        assert!(attr.indices.iter().all(|&i| (i as usize) < vertex_count));
    }

    #[test]
    fn test_multi_road_junction_mesh_indices_in_range() {
        let ends = vec![
            JunctionEdgeRef {
                along_vec: DVec3::X,
                left_point: DVec3::new(-10.0, 0.0, -2.0),
                right_point: DVec3::new(-10.0, 0.0, 2.0),
                is_tail: true,
            },
            JunctionEdgeRef {
                along_vec: -DVec3::X,
                left_point: DVec3::new(10.0, 0.0, 2.0),
                right_point: DVec3::new(10.0, 0.0, -2.0),
                is_tail: false,
            },
            JunctionEdgeRef {
                along_vec: -DVec3::Z,
                left_point: DVec3::new(-2.0, 0.0, 10.0),
                right_point: DVec3::new(2.0, 0.0, 10.0),
                is_tail: false,
            },
        ];
        let attr = junction_geo_attr(ends).unwrap();
        let vertex_count = (attr.vertices.len() / 3) as u32;
        assert!(!attr.indices.is_empty());
        assert!(attr.indices.iter().all(|&i| i < vertex_count));
    }

    #[test]
    fn test_degenerate_junction_returns_none() {
        assert!(junction_geo_attr(Vec::new()).is_none());
        let one = vec![JunctionEdgeRef {
            along_vec: DVec3::X,
            left_point: DVec3::ZERO,
            right_point: DVec3::Z,
            is_tail: true,
        }];
        assert!(junction_geo_attr(one).is_none());
    }
}
