//! Boundary chain construction and regeneration.
//!
//! Boundaries on one side of a road form a chain from the reference line
//! outward; each lane is bounded by two consecutive chain entries. All
//! sample arrays run from road start to road end regardless of travel
//! direction.

use glam::DVec3;
use shared::{BoundaryId, Lane, LaneBoundary, LaneDirection, Point3, Section, SectionId};

use crate::geometry::{
    offset_parallel_curve, points_of, strip_geo_attr, vec_of, vecs_of, vertical_vector,
    CatmullRom3,
};

use super::{new_entity_id, section_segment};

/// Normals shorter than this are considered collapsed and replaced with
/// the reference-line perpendicular.
const MIN_NORMAL_LENGTH: f64 = 0.3;

/// Ordered boundary ids of one side, reference line outward.
pub(crate) fn chain_boundary_ids(section: &Section, direction: LaneDirection) -> Vec<BoundaryId> {
    let lanes = section.lanes_on_side(direction);
    let mut ids = Vec::with_capacity(lanes.len() + 1);
    if let Some(first) = lanes.first() {
        ids.push(first.left_boundary_id.clone());
    }
    for lane in &lanes {
        ids.push(lane.right_boundary_id.clone());
    }
    ids
}

/// Lane widths of one side, reference line outward.
pub(crate) fn side_widths(section: &Section, direction: LaneDirection) -> Vec<f64> {
    section
        .lanes_on_side(direction)
        .iter()
        .map(|l| l.width)
        .collect()
}

/// Build a complete section with freshly sampled boundary chains for
/// both sides and derived lane geometry.
#[allow(clippy::too_many_arguments)]
pub(crate) fn build_section(
    key_path: &CatmullRom3,
    elevation_path: Option<&CatmullRom3>,
    id: SectionId,
    p_start: f64,
    p_end: f64,
    road_length: f64,
    forward_widths: &[f64],
    reverse_widths: &[f64],
) -> Section {
    let length = (p_end - p_start) * road_length;
    let segment = crate::constants::segment_count_for_length(length);

    let mut boundaries = Vec::new();
    let mut lanes = Vec::new();
    for (direction, widths) in [
        (LaneDirection::Forward, forward_widths),
        (LaneDirection::Reverse, reverse_widths),
    ] {
        if widths.is_empty() {
            continue;
        }
        let mut chain_ids: Vec<BoundaryId> = Vec::with_capacity(widths.len() + 1);
        let mut offset = 0.0;
        for i in 0..=widths.len() {
            if i > 0 {
                offset += widths[i - 1];
            }
            let samples = offset_parallel_curve(
                key_path,
                elevation_path,
                offset,
                p_start,
                p_end,
                segment,
                direction,
            )
            .offset_points;
            let boundary_id = new_entity_id();
            boundaries.push(LaneBoundary {
                id: boundary_id.clone(),
                is_forward: direction == LaneDirection::Forward,
                sample_points: points_of(&samples),
            });
            chain_ids.push(boundary_id);
        }

        for (i, width) in widths.iter().enumerate() {
            let lane_id = match direction {
                LaneDirection::Forward => -((i + 1) as i32),
                LaneDirection::Reverse => (i + 1) as i32,
            };
            lanes.push(Lane {
                id: lane_id,
                width: *width,
                left_boundary_id: chain_ids[i].clone(),
                right_boundary_id: chain_ids[i + 1].clone(),
                is_transition: false,
                is_extends: None,
                sample_points: Vec::new(),
                geo_attr: None,
            });
        }
    }

    let mut section = Section {
        id,
        p_start,
        p_end,
        length,
        lanes,
        boundaries,
    };
    refresh_lane_geometry(&mut section);
    section
}

/// Resample one side's boundary chain from `from_chain_index` outward,
/// with offsets accumulated from the current lane widths.
pub(crate) fn resample_side_from(
    key_path: &CatmullRom3,
    elevation_path: Option<&CatmullRom3>,
    section: &mut Section,
    direction: LaneDirection,
    from_chain_index: usize,
) {
    let widths = side_widths(section, direction);
    let chain = chain_boundary_ids(section, direction);
    let segment = section_segment(section);

    for chain_index in from_chain_index..chain.len() {
        let offset: f64 = widths[..chain_index].iter().sum();
        let samples = offset_parallel_curve(
            key_path,
            elevation_path,
            offset,
            section.p_start,
            section.p_end,
            segment,
            direction,
        )
        .offset_points;
        if let Some(boundary) = section.boundary_mut(&chain[chain_index]) {
            boundary.sample_points = points_of(&samples);
        }
    }
}

/// Recompute every lane's center line and surface mesh from its two
/// boundaries.
pub(crate) fn refresh_lane_geometry(section: &mut Section) {
    for i in 0..section.lanes.len() {
        let (left, right, direction) = {
            let lane = &section.lanes[i];
            let left = section
                .boundary(&lane.left_boundary_id)
                .map(|b| b.sample_points.clone())
                .unwrap_or_default();
            let right = section
                .boundary(&lane.right_boundary_id)
                .map(|b| b.sample_points.clone())
                .unwrap_or_default();
            (left, right, lane.direction())
        };

        let count = left.len().min(right.len());
        let center: Vec<Point3> = (0..count)
            .map(|j| {
                Point3::new(
                    (left[j].x + right[j].x) / 2.0,
                    (left[j].y + right[j].y) / 2.0,
                    (left[j].z + right[j].z) / 2.0,
                )
            })
            .collect();

        // Winding: the inner rail goes first on the forward side so the
        // surface faces up, mirrored for the reverse side.
        let geo = match direction {
            LaneDirection::Forward => strip_geo_attr(&vecs_of(&left), &vecs_of(&right)),
            LaneDirection::Reverse => strip_geo_attr(&vecs_of(&right), &vecs_of(&left)),
        };

        let lane = &mut section.lanes[i];
        lane.sample_points = center;
        lane.geo_attr = Some(geo);
    }
}

/// Offset a boundary outward from an already-shaped base polyline.
///
/// The per-sample normal runs from the reference point to the base
/// point; collapsed normals fall back to the reference-line
/// perpendicular so the offset never degenerates where the base touches
/// the reference line.
pub(crate) fn offset_outward_from_base(
    key_path: &CatmullRom3,
    ref_points: &[DVec3],
    base_points: &[DVec3],
    extra_offset: f64,
    p_start: f64,
    p_end: f64,
    direction: LaneDirection,
) -> Vec<DVec3> {
    let count = ref_points.len().min(base_points.len());
    let mut result = Vec::with_capacity(count);
    let span = p_end - p_start;
    for i in 0..count {
        let mut normal = base_points[i] - ref_points[i];
        if normal.length() < MIN_NORMAL_LENGTH {
            let percent = if count > 1 {
                p_start + span * i as f64 / (count - 1) as f64
            } else {
                p_start
            };
            let vertical = vertical_vector(key_path.tangent_at(percent));
            normal = match direction {
                LaneDirection::Forward => vertical,
                LaneDirection::Reverse => -vertical,
            };
        }
        result.push(base_points[i] + normal.normalize_or_zero() * extra_offset);
    }
    result
}

/// Rewrite one boundary's sample points.
pub(crate) fn set_boundary_samples(section: &mut Section, boundary_id: &str, samples: &[DVec3]) {
    if let Some(boundary) = section.boundary_mut(boundary_id) {
        boundary.sample_points = points_of(samples);
    }
}

/// Boundary sample points as vectors, empty when the boundary is
/// missing.
pub(crate) fn boundary_vecs(section: &Section, boundary_id: &str) -> Vec<DVec3> {
    section
        .boundary(boundary_id)
        .map(|b| b.sample_points.iter().map(vec_of).collect())
        .unwrap_or_default()
}
