//! Lane-level operations: width editing and lane count changes.

use shared::{Lane, LaneDirection, LaneId, SectionId};
use tracing::debug;

use crate::constants::{LANE_WIDTH, MAX_LANE_WIDTH, MIN_LANE_WIDTH};
use crate::error::EditError;
use crate::events::ChangeSet;

use super::boundary::{refresh_lane_geometry, resample_side_from};
use super::{elevation_path_of, key_path_of, new_entity_id, RoadState};

impl RoadState {
    /// Set a lane's width, clamped to the editable range.
    ///
    /// The edited lane's outer boundary and every boundary outboard of it
    /// on the same side are re-offset by the accumulated widths; the
    /// opposite side and inboard boundaries never move.
    pub fn update_lane_width(
        &mut self,
        road_id: &str,
        section_id: SectionId,
        lane_id: LaneId,
        width: f64,
    ) -> Result<ChangeSet, EditError> {
        let width = width.clamp(MIN_LANE_WIDTH, MAX_LANE_WIDTH);

        let road = self.require_mut(road_id)?;
        let key_path = key_path_of(road);
        let elevation_path = elevation_path_of(road);
        let section_index = Self::require_section_index(road, section_id)?;
        let link_junctions = road.link_junctions.clone();
        let section = &mut road.sections[section_index];

        let direction = LaneDirection::of_lane(lane_id);
        reject_transition_side(section, direction, lane_id)?;
        let lane = section
            .lane_mut(lane_id)
            .ok_or_else(|| EditError::not_found(format!("lane {lane_id} in section {section_id}")))?;
        lane.width = width;

        // Chain index |id| is the lane's outer boundary.
        resample_side_from(
            &key_path,
            elevation_path.as_ref(),
            section,
            direction,
            lane_id.unsigned_abs() as usize,
        );
        refresh_lane_geometry(section);
        debug!(road = road_id, section = section_id, lane = lane_id, width, "lane width updated");

        let mut changed = ChangeSet::road(road_id);
        for junction_id in link_junctions {
            changed.add_junction(junction_id);
        }
        Ok(changed)
    }

    /// Remove a lane and re-contiguate ids on its side. The last lane of
    /// a side cannot be removed.
    pub fn remove_lane(
        &mut self,
        road_id: &str,
        section_id: SectionId,
        lane_id: LaneId,
    ) -> Result<ChangeSet, EditError> {
        let road = self.require_mut(road_id)?;
        let key_path = key_path_of(road);
        let elevation_path = elevation_path_of(road);
        let section_index = Self::require_section_index(road, section_id)?;
        let link_junctions = road.link_junctions.clone();
        let section = &mut road.sections[section_index];

        let direction = LaneDirection::of_lane(lane_id);
        reject_transition_side(section, direction, lane_id)?;
        let removed = section
            .lane(lane_id)
            .cloned()
            .ok_or_else(|| EditError::not_found(format!("lane {lane_id} in section {section_id}")))?;
        if section.lanes_on_side(direction).len() == 1 {
            return Err(EditError::invalid_topology(format!(
                "lane {lane_id} is the last lane on its side"
            )));
        }

        section.lanes.retain(|l| l.id != lane_id);

        // The removed lane's inner boundary survives: the outboard
        // neighbor inherits it and the outer boundary is dropped.
        let sign = lane_id.signum();
        let outboard_id = sign * (lane_id.abs() + 1);
        if let Some(neighbor) = section.lane_mut(outboard_id) {
            neighbor.left_boundary_id = removed.left_boundary_id.clone();
        }
        section.boundaries.retain(|b| b.id != removed.right_boundary_id);

        // Re-contiguate: ..,-2,-1 / 1,2,..
        let mut side_ids: Vec<LaneId> = section
            .lanes_on_side(direction)
            .iter()
            .map(|l| l.id)
            .collect();
        side_ids.sort_by_key(|id| id.abs());
        for (position, old_id) in side_ids.iter().enumerate() {
            let new_id = sign * (position as i32 + 1);
            if let Some(lane) = section.lane_mut(*old_id) {
                lane.id = new_id;
            }
        }

        resample_side_from(&key_path, elevation_path.as_ref(), section, direction, 0);
        refresh_lane_geometry(section);
        debug!(road = road_id, section = section_id, lane = lane_id, "lane removed");

        let mut changed = ChangeSet::road(road_id);
        for junction_id in link_junctions {
            changed.add_junction(junction_id);
        }
        Ok(changed)
    }

    /// Insert a lane at the target lane's position with the default
    /// width; the target and everything outboard shift outward.
    pub fn add_lane(
        &mut self,
        road_id: &str,
        section_id: SectionId,
        lane_id: LaneId,
    ) -> Result<ChangeSet, EditError> {
        let road = self.require_mut(road_id)?;
        let key_path = key_path_of(road);
        let elevation_path = elevation_path_of(road);
        let section_index = Self::require_section_index(road, section_id)?;
        let link_junctions = road.link_junctions.clone();
        let section = &mut road.sections[section_index];

        let direction = LaneDirection::of_lane(lane_id);
        reject_transition_side(section, direction, lane_id)?;
        let target = section
            .lane(lane_id)
            .cloned()
            .ok_or_else(|| EditError::not_found(format!("lane {lane_id} in section {section_id}")))?;

        // Shift the target and everything outboard one slot outward.
        let sign = lane_id.signum();
        let mut side_ids: Vec<LaneId> = section
            .lanes_on_side(direction)
            .iter()
            .map(|l| l.id)
            .collect();
        side_ids.sort_by_key(|id| std::cmp::Reverse(id.abs()));
        for old_id in side_ids {
            if old_id.abs() >= lane_id.abs() {
                if let Some(lane) = section.lane_mut(old_id) {
                    lane.id = sign * (old_id.abs() + 1);
                }
            }
        }

        // New shared boundary between the new lane and the shifted
        // target; samples are filled by the side resample below.
        let new_boundary_id = new_entity_id();
        let boundary_position = section
            .boundaries
            .iter()
            .position(|b| b.id == target.left_boundary_id)
            .map(|p| p + 1)
            .unwrap_or(section.boundaries.len());
        section.boundaries.insert(
            boundary_position,
            shared::LaneBoundary {
                id: new_boundary_id.clone(),
                is_forward: direction == LaneDirection::Forward,
                sample_points: Vec::new(),
            },
        );
        if let Some(shifted) = section.lane_mut(sign * (lane_id.abs() + 1)) {
            shifted.left_boundary_id = new_boundary_id.clone();
        }
        section.lanes.push(Lane {
            id: lane_id,
            width: LANE_WIDTH,
            left_boundary_id: target.left_boundary_id.clone(),
            right_boundary_id: new_boundary_id,
            is_transition: false,
            is_extends: None,
            sample_points: Vec::new(),
            geo_attr: None,
        });

        resample_side_from(&key_path, elevation_path.as_ref(), section, direction, 0);
        refresh_lane_geometry(section);
        debug!(road = road_id, section = section_id, lane = lane_id, "lane added");

        let mut changed = ChangeSet::road(road_id);
        for junction_id in link_junctions {
            changed.add_junction(junction_id);
        }
        Ok(changed)
    }
}

/// Width and count edits only apply where no transition boundary would
/// be disturbed on the edited side.
fn reject_transition_side(
    section: &shared::Section,
    direction: LaneDirection,
    lane_id: LaneId,
) -> Result<(), EditError> {
    if section
        .lanes_on_side(direction)
        .iter()
        .any(|l| l.is_transition)
    {
        return Err(EditError::invalid_topology(format!(
            "lane {lane_id} shares a side with a transition lane"
        )));
    }
    Ok(())
}
