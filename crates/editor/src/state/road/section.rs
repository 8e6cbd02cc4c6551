//! Section splitting, with and without a lane transition.

use shared::{LaneDirection, LaneId, Road, Section, SectionId};
use tracing::debug;

use crate::constants::MM_DEVIATION;
use crate::error::EditError;
use crate::events::ChangeSet;
use crate::geometry::{
    sample_point_by_offset, transition_sample_points, vec_of, CatmullRom3, TransitionParams,
};

use super::boundary::{
    boundary_vecs, build_section, chain_boundary_ids, offset_outward_from_base,
    refresh_lane_geometry, set_boundary_samples, side_widths,
};
use super::{elevation_path_of, key_path_of, section_segment, RoadState};

impl RoadState {
    /// Split a section at a road-line parameter. Both halves keep the
    /// pre-split widths and share the boundary points at the cut. A cut
    /// at the section's first or last boundary is a pure truncation: the
    /// section count stays the same and the returned set is empty.
    pub fn split_section(
        &mut self,
        road_id: &str,
        section_id: SectionId,
        percent: f64,
    ) -> Result<ChangeSet, EditError> {
        let road = self.require_mut(road_id)?;
        let key_path = key_path_of(road);
        let elevation_path = elevation_path_of(road);
        let section_index = Self::require_section_index(road, section_id)?;
        let link_junctions = road.link_junctions.clone();
        let road_length = road.length;

        let (p_start, p_end) = {
            let section = &road.sections[section_index];
            reject_transition_section(section)?;
            (section.p_start, section.p_end)
        };
        if percent < p_start || percent > p_end {
            return Err(EditError::invalid_topology(format!(
                "cut {percent} outside section {section_id}"
            )));
        }

        // Millimeter-close to a section end: nothing to split, nothing
        // changed.
        let epsilon = MM_DEVIATION / road_length.max(MM_DEVIATION);
        if percent - p_start < epsilon || p_end - percent < epsilon {
            debug!(road = road_id, section = section_id, percent, "cut at section end, no split");
            return Ok(ChangeSet::new());
        }

        let mut changed = ChangeSet::road(road_id);
        for junction_id in &link_junctions {
            changed.add_junction(junction_id.clone());
        }

        let (forward_widths, reverse_widths) = {
            let section = &road.sections[section_index];
            (
                side_widths(section, LaneDirection::Forward),
                side_widths(section, LaneDirection::Reverse),
            )
        };

        let first = build_section(
            &key_path,
            elevation_path.as_ref(),
            0,
            p_start,
            percent,
            road_length,
            &forward_widths,
            &reverse_widths,
        );
        let second = build_section(
            &key_path,
            elevation_path.as_ref(),
            0,
            percent,
            p_end,
            road_length,
            &forward_widths,
            &reverse_widths,
        );

        road.sections.splice(section_index..=section_index, [first, second]);
        renumber_sections(road);
        debug!(road = road_id, section = section_id, percent, "section split");
        Ok(changed)
    }

    /// Split out a transition section over `percent_range` in which the
    /// target lane blends between absent and its full width. With
    /// `widen` the lane grows along the travel direction and is absent
    /// before the range; otherwise it shrinks and is absent after it.
    pub fn split_section_with_transition(
        &mut self,
        road_id: &str,
        section_id: SectionId,
        lane_id: LaneId,
        percent_range: (f64, f64),
        widen: bool,
    ) -> Result<ChangeSet, EditError> {
        let (range_start, range_end) = percent_range;
        let road = self.require_mut(road_id)?;
        let key_path = key_path_of(road);
        let elevation_path = elevation_path_of(road);
        let section_index = Self::require_section_index(road, section_id)?;
        let link_junctions = road.link_junctions.clone();
        let road_length = road.length;

        let (p_start, p_end, lane_width) = {
            let section = &road.sections[section_index];
            reject_transition_section(section)?;
            let lane = section.lane(lane_id).ok_or_else(|| {
                EditError::not_found(format!("lane {lane_id} in section {section_id}"))
            })?;
            (section.p_start, section.p_end, lane.width)
        };
        if range_start >= range_end || range_start < p_start || range_end > p_end {
            return Err(EditError::invalid_topology(format!(
                "transition range {range_start}..{range_end} outside section {section_id}"
            )));
        }

        let direction = LaneDirection::of_lane(lane_id);
        let (forward_widths, reverse_widths) = {
            let section = &road.sections[section_index];
            (
                side_widths(section, LaneDirection::Forward),
                side_widths(section, LaneDirection::Reverse),
            )
        };
        // The target side without the transitioning lane.
        let lane_position = lane_id.unsigned_abs() as usize - 1;
        let side = match direction {
            LaneDirection::Forward => &forward_widths,
            LaneDirection::Reverse => &reverse_widths,
        };
        if lane_position >= side.len() {
            return Err(EditError::not_found(format!(
                "lane {lane_id} in section {section_id}"
            )));
        }
        let mut reduced_side = side.clone();
        reduced_side.remove(lane_position);
        let (reduced_forward, reduced_reverse) = match direction {
            LaneDirection::Forward => (reduced_side, reverse_widths.clone()),
            LaneDirection::Reverse => (forward_widths.clone(), reduced_side),
        };

        let epsilon = MM_DEVIATION / road_length.max(MM_DEVIATION);
        let mut pieces: Vec<Section> = Vec::with_capacity(3);

        // Leading piece: full lane set when narrowing, reduced when
        // widening (the lane has not appeared yet).
        if range_start - p_start > epsilon {
            let (fw, rv) = if widen {
                (&reduced_forward, &reduced_reverse)
            } else {
                (&forward_widths, &reverse_widths)
            };
            pieces.push(build_section(
                &key_path,
                elevation_path.as_ref(),
                0,
                p_start,
                range_start,
                road_length,
                fw,
                rv,
            ));
        }

        // Transition piece: built with the full lane set, then the
        // target lane's outer boundary is reshaped into the tween and
        // everything outboard follows it.
        let mut transition = build_section(
            &key_path,
            elevation_path.as_ref(),
            0,
            range_start,
            range_end,
            road_length,
            &forward_widths,
            &reverse_widths,
        );
        shape_transition(
            &key_path,
            &mut transition,
            direction,
            lane_id,
            lane_width,
            widen,
        );

        pieces.push(transition);

        // Trailing piece, mirrored.
        if p_end - range_end > epsilon {
            let (fw, rv) = if widen {
                (&forward_widths, &reverse_widths)
            } else {
                (&reduced_forward, &reduced_reverse)
            };
            pieces.push(build_section(
                &key_path,
                elevation_path.as_ref(),
                0,
                range_end,
                p_end,
                road_length,
                fw,
                rv,
            ));
        }

        road.sections.splice(section_index..=section_index, pieces);
        renumber_sections(road);
        debug!(
            road = road_id,
            section = section_id,
            lane = lane_id,
            widen,
            "transition section created"
        );

        let mut changed = ChangeSet::road(road_id);
        for junction_id in link_junctions {
            changed.add_junction(junction_id);
        }
        Ok(changed)
    }
}

/// Reshape the target lane's outer boundary of a freshly built section
/// into the width tween and re-offset everything outboard of it.
fn shape_transition(
    key_path: &CatmullRom3,
    section: &mut Section,
    direction: LaneDirection,
    lane_id: LaneId,
    lane_width: f64,
    widen: bool,
) {
    let segment = section_segment(section);
    let widths = side_widths(section, direction);
    let chain = chain_boundary_ids(section, direction);
    let lane_position = lane_id.unsigned_abs() as usize - 1;

    // Signed offsets from the reference line.
    let sign = match direction {
        LaneDirection::Forward => 1.0,
        LaneDirection::Reverse => -1.0,
    };
    let inner_offset: f64 = widths[..lane_position].iter().sum();
    let min_offset = sign * inner_offset;
    let max_offset = sign * (inner_offset + lane_width);

    let (start_offset, end_offset) = if widen {
        (min_offset, max_offset)
    } else {
        (max_offset, min_offset)
    };
    let start_point =
        sample_point_by_offset(key_path, None, section.p_start, start_offset).offset_point;
    let end_point = sample_point_by_offset(key_path, None, section.p_end, end_offset).offset_point;

    let tween = transition_sample_points(&TransitionParams {
        key_path,
        min_offset,
        max_offset,
        p_start: section.p_start,
        p_end: section.p_end,
        start_point,
        end_point,
        is_extends: widen,
        segment,
    });

    let outer_chain_index = lane_position + 1;
    set_boundary_samples(section, &chain[outer_chain_index].clone(), &tween);

    if let Some(lane) = section.lane_mut(lane_id) {
        lane.is_transition = true;
        lane.is_extends = Some(widen);
    }

    // Outboard boundaries keep their constant widths relative to the
    // tween shape.
    let ref_points: Vec<_> = section
        .boundary(&chain[0])
        .map(|b| b.sample_points.iter().map(vec_of).collect())
        .unwrap_or_default();
    let mut accumulated = 0.0;
    for chain_index in outer_chain_index + 1..chain.len() {
        accumulated += widths[chain_index - 1];
        let base = boundary_vecs(section, &chain[outer_chain_index]);
        let samples = offset_outward_from_base(
            key_path,
            &ref_points,
            &base,
            accumulated,
            section.p_start,
            section.p_end,
            direction,
        );
        set_boundary_samples(section, &chain[chain_index].clone(), &samples);
    }

    refresh_lane_geometry(section);
}

fn reject_transition_section(section: &Section) -> Result<(), EditError> {
    if section.lanes.iter().any(|l| l.is_transition) {
        return Err(EditError::invalid_topology(format!(
            "section {} already carries a transition",
            section.id
        )));
    }
    Ok(())
}

/// Keep section ids sequential front to back.
fn renumber_sections(road: &mut Road) {
    road.sections
        .sort_by(|a, b| a.p_start.partial_cmp(&b.p_start).unwrap_or(std::cmp::Ordering::Equal));
    for (index, section) in road.sections.iter_mut().enumerate() {
        section.id = index as SectionId;
    }
}
