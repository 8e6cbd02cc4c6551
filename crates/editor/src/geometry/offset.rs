use glam::DVec3;
use shared::LaneDirection;

use crate::constants::{TWEEN_CONTROL_POINT_EXPONENT, TWEEN_CONTROL_POINT_SEGMENT};

use super::curve::CatmullRom3;
use super::vertical_vector;

/// Reference-line samples and their offset counterparts, both ordered by
/// increasing reference-line parameter.
#[derive(Debug, Clone)]
pub struct ParallelSamples {
    pub ref_points: Vec<DVec3>,
    pub offset_points: Vec<DVec3>,
}

/// Sample a curve parallel to `key_path` at a constant perpendicular
/// offset over `[p_start, p_end]` with `segment + 1` samples.
///
/// The offset runs along the horizontal perpendicular of the tangent;
/// `direction` flips its sign for reverse-side lanes. When an elevation
/// curve is given, its height overrides the sample heights.
/// Self-intersecting output for sharp curvature is tolerated, not
/// corrected.
pub fn offset_parallel_curve(
    key_path: &CatmullRom3,
    elevation_path: Option<&CatmullRom3>,
    offset: f64,
    p_start: f64,
    p_end: f64,
    segment: usize,
    direction: LaneDirection,
) -> ParallelSamples {
    let segment = segment.max(1);
    let space = (p_end - p_start) / segment as f64;
    let signed = match direction {
        LaneDirection::Forward => offset,
        LaneDirection::Reverse => -offset,
    };

    let mut ref_points = Vec::with_capacity(segment + 1);
    let mut offset_points = Vec::with_capacity(segment + 1);
    for i in 0..=segment {
        let val = (p_start + space * i as f64).min(1.0);
        let mut ref_point = key_path.point_at(val);
        let tangent = key_path.tangent_at(val);
        if let Some(elevation) = elevation_path {
            ref_point.y = elevation.point_at(val).y;
        }
        let vertical = vertical_vector(tangent);
        let offset_point = ref_point + vertical * signed;
        ref_points.push(ref_point);
        offset_points.push(offset_point);
    }
    ParallelSamples {
        ref_points,
        offset_points,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OffsetSample {
    pub ref_point: DVec3,
    pub offset_point: DVec3,
}

/// Single-point variant: the point at `percent` shifted by `offset`
/// along the horizontal perpendicular. The sign of `offset` selects the
/// side directly.
pub fn sample_point_by_offset(
    key_path: &CatmullRom3,
    elevation_path: Option<&CatmullRom3>,
    percent: f64,
    offset: f64,
) -> OffsetSample {
    let percent = percent.min(1.0);
    let ref_point = key_path.point_at(percent);
    let tangent = key_path.tangent_at(percent);
    let vertical = vertical_vector(tangent);
    let mut offset_point = ref_point + vertical * offset;
    if let Some(elevation) = elevation_path {
        offset_point.y = elevation.point_at(percent).y;
    }
    OffsetSample {
        ref_point,
        offset_point,
    }
}

/// Inputs for a transition boundary blend. Offsets are signed distances
/// from the reference line; `min_offset` belongs to the narrow end.
pub struct TransitionParams<'a> {
    pub key_path: &'a CatmullRom3,
    pub min_offset: f64,
    pub max_offset: f64,
    pub p_start: f64,
    pub p_end: f64,
    /// Boundary point at the `p_start` side.
    pub start_point: DVec3,
    /// Boundary point at the `p_end` side.
    pub end_point: DVec3,
    /// True when the boundary widens along the travel direction.
    pub is_extends: bool,
    pub segment: usize,
}

/// Boundary sample points blending between two offsets.
///
/// Intermediate control points ramp the offset with a quarter-power
/// exponent, mirrored around a mid control point at the parameter and
/// offset midpoint. A chordal Catmull-Rom through the control points is
/// then resampled at the requested segment count.
pub fn transition_sample_points(params: &TransitionParams<'_>) -> Vec<DVec3> {
    let TransitionParams {
        key_path,
        min_offset,
        max_offset,
        p_start,
        p_end,
        start_point,
        end_point,
        is_extends,
        segment,
    } = *params;

    let tween_segment = TWEEN_CONTROL_POINT_SEGMENT;
    let percent_delta = (p_end - p_start) / tween_segment as f64;
    let offset_delta = (max_offset - min_offset) / tween_segment as f64;

    let middle_point = sample_point_by_offset(
        key_path,
        None,
        (p_start + p_end) / 2.0,
        (min_offset + max_offset) / 2.0,
    )
    .offset_point;

    // The blend shape mirrors around the midpoint, so only half the
    // intervals are iterated; ends and midpoint are handled separately.
    // A widening boundary ramps min -> max along the parameter, a
    // narrowing one max -> min.
    let mut tween_points: Vec<DVec3> = Vec::with_capacity(tween_segment + 1);
    for i in (1..tween_segment / 2).rev() {
        let bias = ((i as f64 / tween_segment as f64) * 2.0).powf(TWEEN_CONTROL_POINT_EXPONENT);
        let ramp = offset_delta * i as f64 * bias;
        let (near_offset, far_offset) = if is_extends {
            (min_offset + ramp, max_offset - ramp)
        } else {
            (max_offset - ramp, min_offset + ramp)
        };
        let near =
            sample_point_by_offset(key_path, None, p_start + percent_delta * i as f64, near_offset)
                .offset_point;
        let far =
            sample_point_by_offset(key_path, None, p_end - percent_delta * i as f64, far_offset)
                .offset_point;
        tween_points.insert(0, near);
        tween_points.push(far);
    }

    let mut control_points: Vec<DVec3> = Vec::with_capacity(tween_segment + 1);
    control_points.extend(tween_points.iter().copied());
    control_points.insert(tween_segment / 2 - 1, middle_point);
    control_points.insert(0, start_point);
    control_points.push(end_point);

    let transition_path = CatmullRom3::chordal(control_points);
    transition_path.spaced_points(segment)
}

/// Straight interpolation between two offsets, used when no smooth blend
/// applies.
pub fn linear_blend_sample_points(
    key_path: &CatmullRom3,
    elevation_path: Option<&CatmullRom3>,
    offset_start: f64,
    offset_end: f64,
    p_start: f64,
    p_end: f64,
    segment: usize,
) -> Vec<DVec3> {
    let segment = segment.max(1);
    (0..=segment)
        .map(|i| {
            let frac = i as f64 / segment as f64;
            let percent = p_start + (p_end - p_start) * frac;
            let offset = offset_start + (offset_end - offset_start) * frac;
            sample_point_by_offset(key_path, elevation_path, percent, offset).offset_point
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight(len: f64) -> CatmullRom3 {
        CatmullRom3::road_curve(vec![
            DVec3::ZERO,
            DVec3::new(len / 2.0, 0.0, 0.0),
            DVec3::new(len, 0.0, 0.0),
        ])
    }

    #[test]
    fn test_offset_distance_constant_on_straight_line() {
        let curve = straight(40.0);
        let samples = offset_parallel_curve(&curve, None, 3.5, 0.0, 1.0, 20, LaneDirection::Forward);
        assert_eq!(samples.ref_points.len(), 21);
        for (r, o) in samples.ref_points.iter().zip(&samples.offset_points) {
            assert!((r.distance(*o) - 3.5).abs() < 1e-9);
        }
    }

    #[test]
    fn test_reverse_side_flips_offset() {
        let curve = straight(10.0);
        let fwd = offset_parallel_curve(&curve, None, 2.0, 0.0, 1.0, 4, LaneDirection::Forward);
        let rev = offset_parallel_curve(&curve, None, 2.0, 0.0, 1.0, 4, LaneDirection::Reverse);
        assert!((fwd.offset_points[2].z - 2.0).abs() < 1e-9);
        assert!((rev.offset_points[2].z + 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_offset_round_trip() {
        // Offsetting by w and then by -w from the offset samples returns
        // to the reference line within tolerance.
        let curve = CatmullRom3::road_curve(vec![
            DVec3::ZERO,
            DVec3::new(20.0, 0.0, 6.0),
            DVec3::new(40.0, 0.0, 0.0),
        ]);
        let out = offset_parallel_curve(&curve, None, 3.5, 0.0, 1.0, 20, LaneDirection::Forward);
        let back_curve = CatmullRom3::road_curve(out.offset_points.clone());
        let back = offset_parallel_curve(&back_curve, None, 3.5, 0.0, 1.0, 20, LaneDirection::Reverse);
        for (orig, returned) in out.ref_points.iter().zip(&back.offset_points) {
            assert!(orig.distance(*returned) < 0.15, "deviation {}", orig.distance(*returned));
        }
    }

    #[test]
    fn test_elevation_overrides_height() {
        let curve = straight(10.0);
        let elevation = CatmullRom3::road_curve(vec![
            DVec3::new(0.0, 2.0, 0.0),
            DVec3::new(5.0, 2.0, 0.0),
            DVec3::new(10.0, 2.0, 0.0),
        ]);
        let samples =
            offset_parallel_curve(&curve, Some(&elevation), 1.0, 0.0, 1.0, 4, LaneDirection::Forward);
        for p in &samples.ref_points {
            assert!((p.y - 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_transition_endpoints_pinned() {
        let curve = straight(30.0);
        let start_point = sample_point_by_offset(&curve, None, 0.0, 0.0).offset_point;
        let end_point = sample_point_by_offset(&curve, None, 1.0, 3.5).offset_point;
        let points = transition_sample_points(&TransitionParams {
            key_path: &curve,
            min_offset: 0.0,
            max_offset: 3.5,
            p_start: 0.0,
            p_end: 1.0,
            start_point,
            end_point,
            is_extends: true,
            segment: 20,
        });
        assert_eq!(points.len(), 21);
        assert!(points[0].distance(start_point) < 1e-6);
        assert!(points[20].distance(end_point) < 1e-6);
        // The blend is monotonic outward on a straight reference line.
        for pair in points.windows(2) {
            assert!(pair[1].z >= pair[0].z - 0.05);
        }
    }

    #[test]
    fn test_transition_narrowing_ramps_inward() {
        let curve = straight(30.0);
        let start_point = sample_point_by_offset(&curve, None, 0.0, 3.5).offset_point;
        let end_point = sample_point_by_offset(&curve, None, 1.0, 0.0).offset_point;
        let points = transition_sample_points(&TransitionParams {
            key_path: &curve,
            min_offset: 0.0,
            max_offset: 3.5,
            p_start: 0.0,
            p_end: 1.0,
            start_point,
            end_point,
            is_extends: false,
            segment: 20,
        });
        assert!(points[0].distance(start_point) < 1e-6);
        assert!(points[20].distance(end_point) < 1e-6);
        for pair in points.windows(2) {
            assert!(pair[1].z <= pair[0].z + 0.05);
        }
    }

    #[test]
    fn test_linear_blend_is_straight_ramp() {
        let curve = straight(20.0);
        let points = linear_blend_sample_points(&curve, None, 1.0, 3.0, 0.0, 1.0, 10);
        assert_eq!(points.len(), 11);
        assert!((points[0].z - 1.0).abs() < 1e-9);
        assert!((points[5].z - 2.0).abs() < 1e-9);
        assert!((points[10].z - 3.0).abs() < 1e-9);
    }
}
