//! Junction arena: which road ends meet, the area mesh between them and
//! the lane links crossing it.

mod link;

pub use link::{ht_role, HtRole};

use std::collections::BTreeMap;

use glam::DVec3;
use shared::{
    GeoAttr, HtFlag, Junction, JunctionId, Lane, Road, RoadEnd, RoadEndDescriptor, Section,
};
use tracing::warn;

use crate::error::EditError;
use crate::events::ChangeSet;
use crate::geometry::{junction_geo_attr, vec_of, JunctionEdgeRef};
use crate::state::road::{key_path_of, new_entity_id, RoadState};

/// Id-indexed arena of junctions.
#[derive(Debug, Clone, Default)]
pub struct JunctionState {
    junctions: BTreeMap<JunctionId, Junction>,
}

impl JunctionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, junction_id: &str) -> Option<&Junction> {
        self.junctions.get(junction_id)
    }

    pub fn require(&self, junction_id: &str) -> Result<&Junction, EditError> {
        self.junctions
            .get(junction_id)
            .ok_or_else(|| EditError::not_found(format!("junction {junction_id}")))
    }

    pub(crate) fn require_mut(&mut self, junction_id: &str) -> Result<&mut Junction, EditError> {
        self.junctions
            .get_mut(junction_id)
            .ok_or_else(|| EditError::not_found(format!("junction {junction_id}")))
    }

    pub fn ids(&self) -> Vec<JunctionId> {
        self.junctions.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Junction> {
        self.junctions.values()
    }

    pub fn len(&self) -> usize {
        self.junctions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.junctions.is_empty()
    }

    pub fn insert(&mut self, junction: Junction) {
        self.junctions.insert(junction.id.clone(), junction);
    }

    pub fn remove(&mut self, junction_id: &str) -> Option<Junction> {
        self.junctions.remove(junction_id)
    }

    /// Whole-arena replacement, used by snapshot restore and map import.
    pub fn apply_state(&mut self, junctions: Vec<Junction>) {
        self.junctions = junctions.into_iter().map(|j| (j.id.clone(), j)).collect();
    }

    pub fn to_vec(&self) -> Vec<Junction> {
        self.junctions.values().cloned().collect()
    }

    /// Attach a road end to a junction, creating the junction when no id
    /// is given. The road end must carry lanes in the requested travel
    /// direction and may join a given junction only once.
    pub fn connect_link_road(
        &mut self,
        roads: &mut RoadState,
        junction_id: Option<&str>,
        descriptor: RoadEndDescriptor,
    ) -> Result<(JunctionId, ChangeSet), EditError> {
        let road = roads.require(&descriptor.road_id)?;
        let section = end_section(road, descriptor.end);
        if section.lanes_on_side(descriptor.direction).is_empty() {
            return Err(EditError::invalid_topology(format!(
                "road {} has no {} lanes at its {}",
                descriptor.road_id, descriptor.direction, descriptor.end
            )));
        }

        let junction_id = match junction_id {
            Some(id) => {
                let junction = self.require_mut(id)?;
                if junction.has_link_road(&descriptor) {
                    return Err(EditError::invalid_topology(format!(
                        "road end {descriptor} already joins junction {id}"
                    )));
                }
                junction.link_roads.push(descriptor.clone());
                id.to_string()
            }
            None => {
                let id = new_entity_id();
                self.insert(Junction {
                    id: id.clone(),
                    link_roads: vec![descriptor.clone()],
                    lane_links: Vec::new(),
                    geo_attr: None,
                });
                id
            }
        };

        let road = roads.require_mut(&descriptor.road_id)?;
        if !road.link_junctions.contains(&junction_id) {
            road.link_junctions.push(junction_id.clone());
        }

        self.update_junction(roads, &junction_id)?;

        let mut changed = ChangeSet::junction(&junction_id);
        changed.add_road(descriptor.road_id.clone());
        Ok((junction_id, changed))
    }

    /// Detach a road end. Lane links touching that end are dropped, and
    /// a junction left with fewer than two road ends dissolves.
    pub fn disconnect_link_road(
        &mut self,
        roads: &mut RoadState,
        junction_id: &str,
        descriptor: &RoadEndDescriptor,
    ) -> Result<ChangeSet, EditError> {
        let junction = self.require_mut(junction_id)?;
        let before = junction.link_roads.len();
        junction.link_roads.retain(|d| d != descriptor);
        if junction.link_roads.len() == before {
            return Err(EditError::not_found(format!(
                "road end {descriptor} in junction {junction_id}"
            )));
        }
        junction.lane_links.retain(|link| {
            !flag_matches_descriptor(&link.from, descriptor)
                && !flag_matches_descriptor(&link.to, descriptor)
        });

        let mut changed = ChangeSet::junction(junction_id);
        changed.add_road(descriptor.road_id.clone());

        // The same road may still join through its other end.
        let road_still_joined = junction
            .link_roads
            .iter()
            .any(|d| d.road_id == descriptor.road_id);
        if !road_still_joined {
            if let Some(road) = roads.get_mut(&descriptor.road_id) {
                road.link_junctions.retain(|id| id != junction_id);
            }
        }

        if junction.link_roads.len() < 2 {
            let remaining = junction.link_roads.clone();
            self.junctions.remove(junction_id);
            for d in remaining {
                if let Some(road) = roads.get_mut(&d.road_id) {
                    road.link_junctions.retain(|id| id != junction_id);
                }
                changed.add_road(d.road_id);
            }
            return Ok(changed);
        }

        self.update_junction(roads, junction_id)?;
        Ok(changed)
    }

    /// Drop every reference a junction holds to a road that is being
    /// removed, dissolving junctions that fall below two road ends.
    pub fn remove_road_references(
        &mut self,
        roads: &mut RoadState,
        road_id: &str,
    ) -> Result<ChangeSet, EditError> {
        let affected: Vec<JunctionId> = self
            .junctions
            .values()
            .filter(|j| j.link_roads.iter().any(|d| d.road_id == road_id))
            .map(|j| j.id.clone())
            .collect();

        let mut changed = ChangeSet::new();
        for junction_id in affected {
            let junction = self.require_mut(&junction_id)?;
            junction.link_roads.retain(|d| d.road_id != road_id);
            junction.lane_links.retain(|link| {
                link.from.road_id != road_id && link.to.road_id != road_id
            });
            changed.add_junction(junction_id.clone());

            if junction.link_roads.len() < 2 {
                let remaining = junction.link_roads.clone();
                self.junctions.remove(&junction_id);
                for d in remaining {
                    if let Some(road) = roads.get_mut(&d.road_id) {
                        road.link_junctions.retain(|id| id != &junction_id);
                    }
                    changed.add_road(d.road_id);
                }
            } else {
                self.update_junction(roads, &junction_id)?;
            }
        }
        Ok(changed)
    }

    /// Recompute a junction's area mesh and drop lane links whose
    /// endpoints no longer resolve.
    pub fn update_junction(
        &mut self,
        roads: &RoadState,
        junction_id: &str,
    ) -> Result<(), EditError> {
        self.prune_dangling_links(roads, junction_id)?;
        let input = self.rebuild_input(roads, junction_id)?;
        let geo = compute_geo(&input);
        self.apply_geo(junction_id, geo)
    }

    /// Snapshot of everything the area mesh depends on, detached from
    /// the arenas so the mesh can be computed off-thread.
    pub fn rebuild_input(
        &self,
        roads: &RoadState,
        junction_id: &str,
    ) -> Result<JunctionRebuildInput, EditError> {
        let junction = self.require(junction_id)?;
        let mut anchors = Vec::with_capacity(junction.link_roads.len());
        for descriptor in &junction.link_roads {
            let Some(road) = roads.get(&descriptor.road_id) else {
                warn!(
                    junction = junction_id,
                    road = %descriptor.road_id,
                    "road end missing while rebuilding junction"
                );
                continue;
            };
            let (left_point, right_point) = road_end_points(road, descriptor)?;
            anchors.push(JunctionEdgeRef {
                along_vec: along_vec(road, descriptor.end),
                left_point,
                right_point,
                is_tail: descriptor.end.is_tail(),
            });
        }
        Ok(JunctionRebuildInput {
            junction_id: junction_id.to_string(),
            anchors,
        })
    }

    pub fn apply_geo(&mut self, junction_id: &str, geo: Option<GeoAttr>) -> Result<(), EditError> {
        self.require_mut(junction_id)?.geo_attr = geo;
        Ok(())
    }

    /// Remove lane links whose endpoint lanes no longer exist, returning
    /// how many were dropped.
    pub fn prune_dangling_links(
        &mut self,
        roads: &RoadState,
        junction_id: &str,
    ) -> Result<usize, EditError> {
        let junction = self.require_mut(junction_id)?;
        let before = junction.lane_links.len();
        junction.lane_links.retain(|link| {
            flag_lane(roads, &link.from).is_ok() && flag_lane(roads, &link.to).is_ok()
        });
        let dropped = before - junction.lane_links.len();
        if dropped > 0 {
            warn!(junction = junction_id, dropped, "dangling lane links removed");
        }
        Ok(dropped)
    }
}

/// Detached inputs for one junction's area mesh.
#[derive(Debug, Clone)]
pub struct JunctionRebuildInput {
    pub junction_id: JunctionId,
    pub anchors: Vec<JunctionEdgeRef>,
}

/// Pure mesh computation over a detached input, safe to run on a worker.
pub fn compute_geo(input: &JunctionRebuildInput) -> Option<GeoAttr> {
    junction_geo_attr(input.anchors.clone())
}

fn end_section(road: &Road, end: RoadEnd) -> &Section {
    match end {
        RoadEnd::Start => &road.sections[0],
        RoadEnd::End => &road.sections[road.sections.len() - 1],
    }
}

/// Direction out of the road into the junction, flattened to the ground
/// plane.
pub(crate) fn along_vec(road: &Road, end: RoadEnd) -> DVec3 {
    let key_path = key_path_of(road);
    let tangent = match end {
        RoadEnd::Start => -key_path.tangent_at(0.0),
        RoadEnd::End => key_path.tangent_at(1.0),
    };
    DVec3::new(tangent.x, 0.0, tangent.z).normalize_or_zero()
}

/// Left and right corner of a road end as seen from inside the junction,
/// looking back at the road.
pub(crate) fn road_end_points(
    road: &Road,
    descriptor: &RoadEndDescriptor,
) -> Result<(DVec3, DVec3), EditError> {
    let section = end_section(road, descriptor.end);
    let lanes = section.lanes_on_side(descriptor.direction);
    let (first, last) = match (lanes.first(), lanes.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => {
            return Err(EditError::invalid_topology(format!(
                "road {} has no {} lanes at its {}",
                road.id, descriptor.direction, descriptor.end
            )))
        }
    };

    let corner = |boundary_id: &str| -> Result<DVec3, EditError> {
        let boundary = section.boundary(boundary_id).ok_or_else(|| {
            EditError::not_found(format!("boundary {boundary_id} of road {}", road.id))
        })?;
        let point = match descriptor.end {
            RoadEnd::Start => boundary.sample_points.first(),
            RoadEnd::End => boundary.sample_points.last(),
        };
        point.map(vec_of).ok_or_else(|| {
            EditError::degenerate(format!("boundary {boundary_id} of road {} is empty", road.id))
        })
    };

    let inner = corner(&first.left_boundary_id)?;
    let outer = corner(&last.right_boundary_id)?;
    // Left/right swap with the approach direction so the pair always
    // reads left-to-right from inside the junction.
    let swapped = descriptor.end.is_tail() == (descriptor.direction == shared::LaneDirection::Reverse);
    Ok(if swapped { (outer, inner) } else { (inner, outer) })
}

/// True when a lane-link endpoint belongs to the given road end.
fn flag_matches_descriptor(flag: &HtFlag, descriptor: &RoadEndDescriptor) -> bool {
    flag.road_id == descriptor.road_id
        && flag.end == descriptor.end
        && flag.direction == descriptor.direction
}

/// Resolve a lane endpoint flag against the road arena.
pub(crate) fn flag_lane<'a>(roads: &'a RoadState, flag: &HtFlag) -> Result<&'a Lane, EditError> {
    let road = roads.require(&flag.road_id)?;
    let section = road
        .section(flag.section_id)
        .ok_or_else(|| {
            EditError::not_found(format!(
                "section {} of road {}",
                flag.section_id, flag.road_id
            ))
        })?;
    section.lane(flag.lane_id).ok_or_else(|| {
        EditError::not_found(format!(
            "lane {} in section {} of road {}",
            flag.lane_id, flag.section_id, flag.road_id
        ))
    })
}
