//! Road arena and the operations that rewrite road geometry.

mod boundary;
mod elevation;
mod lane;
mod section;

pub use elevation::ElevationOp;

use std::collections::BTreeMap;

use glam::DVec3;
use shared::{Point3, Road, RoadId, Section, SectionId};
use uuid::Uuid;

use crate::constants::{segment_count_for_length, LANE_WIDTH};
use crate::error::EditError;
use crate::geometry::{vec_of, CatmullRom3};

pub(crate) fn new_entity_id() -> String {
    Uuid::new_v4().to_string()
}

/// Reference curve of a road, rebuilt from its authored control points.
pub fn key_path_of(road: &Road) -> CatmullRom3 {
    CatmullRom3::road_curve(road.control_points.iter().map(vec_of).collect())
}

/// Vertical profile curve: x is distance along the road, y is height.
/// `None` when the road has fewer than two profile points.
pub fn elevation_path_of(road: &Road) -> Option<CatmullRom3> {
    if road.elevation_points.len() < 2 {
        return None;
    }
    let points = road
        .elevation_points
        .iter()
        .map(|p| DVec3::new(p.x, p.y, 0.0))
        .collect();
    Some(CatmullRom3::road_curve(points))
}

/// Id-indexed arena of roads.
#[derive(Debug, Clone, Default)]
pub struct RoadState {
    roads: BTreeMap<RoadId, Road>,
}

impl RoadState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, road_id: &str) -> Option<&Road> {
        self.roads.get(road_id)
    }

    pub fn get_mut(&mut self, road_id: &str) -> Option<&mut Road> {
        self.roads.get_mut(road_id)
    }

    pub fn require(&self, road_id: &str) -> Result<&Road, EditError> {
        self.roads
            .get(road_id)
            .ok_or_else(|| EditError::not_found(format!("road {road_id}")))
    }

    pub(crate) fn require_mut(&mut self, road_id: &str) -> Result<&mut Road, EditError> {
        self.roads
            .get_mut(road_id)
            .ok_or_else(|| EditError::not_found(format!("road {road_id}")))
    }

    pub fn ids(&self) -> Vec<RoadId> {
        self.roads.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Road> {
        self.roads.values()
    }

    pub fn len(&self) -> usize {
        self.roads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roads.is_empty()
    }

    pub fn insert(&mut self, road: Road) {
        self.roads.insert(road.id.clone(), road);
    }

    pub fn remove(&mut self, road_id: &str) -> Option<Road> {
        self.roads.remove(road_id)
    }

    /// Whole-arena replacement, used by snapshot restore and map import.
    pub fn apply_state(&mut self, roads: Vec<Road>) {
        self.roads = roads.into_iter().map(|r| (r.id.clone(), r)).collect();
    }

    pub fn to_vec(&self) -> Vec<Road> {
        self.roads.values().cloned().collect()
    }

    /// Create a road with a single section covering the full reference
    /// line. Lane ids run `-1..-n` on the forward side and, for two-way
    /// roads, `1..n` on the reverse side.
    pub fn create_road(
        &mut self,
        control_points: Vec<Point3>,
        lane_count: usize,
        lane_width: f64,
        two_way: bool,
    ) -> Result<RoadId, EditError> {
        if control_points.len() < 2 {
            return Err(EditError::degenerate(
                "a road needs at least two control points",
            ));
        }
        if lane_count == 0 {
            return Err(EditError::invalid_topology("a road needs at least one lane"));
        }
        let lane_width = if lane_width > 0.0 { lane_width } else { LANE_WIDTH };

        let key_path = CatmullRom3::road_curve(control_points.iter().map(vec_of).collect());
        let length = key_path.length();
        if length <= 0.0 {
            return Err(EditError::degenerate("road reference line has zero length"));
        }

        let forward_widths = vec![lane_width; lane_count];
        let reverse_widths = if two_way {
            vec![lane_width; lane_count]
        } else {
            Vec::new()
        };
        let section = boundary::build_section(
            &key_path,
            None,
            0,
            0.0,
            1.0,
            length,
            &forward_widths,
            &reverse_widths,
        );

        let road_id = new_entity_id();
        self.insert(Road {
            id: road_id.clone(),
            control_points,
            elevation_points: Vec::new(),
            length,
            sections: vec![section],
            link_junctions: Vec::new(),
        });
        Ok(road_id)
    }

    pub(crate) fn require_section_index(
        road: &Road,
        section_id: SectionId,
    ) -> Result<usize, EditError> {
        road.sections
            .iter()
            .position(|s| s.id == section_id)
            .ok_or_else(|| {
                EditError::not_found(format!("section {section_id} of road {}", road.id))
            })
    }
}

/// Sampling segment count for a section: the length bucket, never less
/// than the resolution the section already carries.
pub(crate) fn section_segment(section: &Section) -> usize {
    let by_length = segment_count_for_length(section.length);
    let existing = section
        .lanes
        .first()
        .filter(|l| l.sample_points.len() > 1)
        .map(|l| l.sample_points.len() - 1);
    existing.map_or(by_length, |e| e.max(by_length))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::LaneDirection;

    fn straight_points(len: f64) -> Vec<Point3> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(len / 2.0, 0.0, 0.0),
            Point3::new(len, 0.0, 0.0),
        ]
    }

    #[test]
    fn test_create_road_one_way() {
        let mut state = RoadState::new();
        let id = state
            .create_road(straight_points(40.0), 2, LANE_WIDTH, false)
            .unwrap();
        let road = state.get(&id).unwrap();
        assert!((road.length - 40.0).abs() < 1e-6);
        assert_eq!(road.sections.len(), 1);

        let section = &road.sections[0];
        assert_eq!(section.p_start, 0.0);
        assert_eq!(section.p_end, 1.0);
        let forward: Vec<i32> = section
            .lanes_on_side(LaneDirection::Forward)
            .iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(forward, vec![-1, -2]);
        assert!(section.lanes_on_side(LaneDirection::Reverse).is_empty());
        // Two lanes share three boundaries on one side.
        assert_eq!(section.boundaries.len(), 3);
    }

    #[test]
    fn test_create_road_two_way() {
        let mut state = RoadState::new();
        let id = state
            .create_road(straight_points(40.0), 1, LANE_WIDTH, true)
            .unwrap();
        let section = &state.get(&id).unwrap().sections[0];
        assert_eq!(section.lanes.len(), 2);
        assert_eq!(section.boundaries.len(), 4);

        // Forward lanes offset one way, reverse the other.
        let fwd = section.lane(-1).unwrap();
        let rev = section.lane(1).unwrap();
        let fwd_outer = section.boundary(&fwd.right_boundary_id).unwrap();
        let rev_outer = section.boundary(&rev.right_boundary_id).unwrap();
        assert!(fwd_outer.sample_points[0].z > 0.0);
        assert!(rev_outer.sample_points[0].z < 0.0);
    }

    #[test]
    fn test_create_road_rejects_degenerate_input() {
        let mut state = RoadState::new();
        let err = state
            .create_road(vec![Point3::new(0.0, 0.0, 0.0)], 1, LANE_WIDTH, false)
            .unwrap_err();
        assert!(matches!(err, EditError::DegenerateGeometry(_)));

        let err = state
            .create_road(straight_points(10.0), 0, LANE_WIDTH, false)
            .unwrap_err();
        assert!(matches!(err, EditError::InvalidTopology(_)));
    }

    #[test]
    fn test_lane_center_between_boundaries() {
        let mut state = RoadState::new();
        let id = state
            .create_road(straight_points(40.0), 1, LANE_WIDTH, false)
            .unwrap();
        let section = &state.get(&id).unwrap().sections[0];
        let lane = section.lane(-1).unwrap();
        assert!(!lane.sample_points.is_empty());
        for p in &lane.sample_points {
            assert!((p.z - LANE_WIDTH / 2.0).abs() < 1e-6);
        }
        assert!(lane.geo_attr.is_some());
    }
}
