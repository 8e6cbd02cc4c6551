//! Lane links: directed connections between two lane endpoints across a
//! junction.

use shared::{HtFlag, LaneDirection, LaneLink, LaneLinkId, RoadEnd, RoadEndDescriptor};
use tracing::debug;

use crate::constants::LANE_LINK_SEGMENT;
use crate::error::EditError;
use crate::events::ChangeSet;
use crate::geometry::{bezier_with_directions, points_of, vec_of};
use crate::state::road::{new_entity_id, RoadState};

use super::{along_vec, flag_lane, JunctionState};

/// Whether traffic at a lane endpoint leaves its road into the junction
/// or enters the road from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HtRole {
    Outgoing,
    Incoming,
}

/// A forward lane exits at the road tail, a reverse lane exits at the
/// head.
pub fn ht_role(flag: &HtFlag) -> HtRole {
    match (flag.end, flag.direction) {
        (RoadEnd::End, LaneDirection::Forward) | (RoadEnd::Start, LaneDirection::Reverse) => {
            HtRole::Outgoing
        }
        _ => HtRole::Incoming,
    }
}

impl JunctionState {
    /// Connect two lane endpoints with a bezier lane link. One endpoint
    /// must be outgoing and the other incoming; the link always runs
    /// outgoing to incoming regardless of pick order.
    pub fn add_junction_link(
        &mut self,
        roads: &RoadState,
        junction_id: &str,
        pick_a: &HtFlag,
        pick_b: &HtFlag,
    ) -> Result<(LaneLinkId, ChangeSet), EditError> {
        if pick_a == pick_b {
            return Err(EditError::invalid_topology(
                "a lane link needs two distinct endpoints",
            ));
        }
        flag_lane(roads, pick_a)?;
        flag_lane(roads, pick_b)?;

        let junction = self.require(junction_id)?;
        for flag in [pick_a, pick_b] {
            let descriptor = RoadEndDescriptor::new(flag.road_id.clone(), flag.end, flag.direction);
            if !junction.has_link_road(&descriptor) {
                return Err(EditError::invalid_topology(format!(
                    "road end {descriptor} does not join junction {junction_id}"
                )));
            }
        }

        let (from, to) = match (ht_role(pick_a), ht_role(pick_b)) {
            (HtRole::Outgoing, HtRole::Incoming) => (pick_a.clone(), pick_b.clone()),
            (HtRole::Incoming, HtRole::Outgoing) => (pick_b.clone(), pick_a.clone()),
            _ => {
                return Err(EditError::invalid_topology(
                    "a lane link needs one outgoing and one incoming endpoint",
                ))
            }
        };
        if junction
            .lane_links
            .iter()
            .any(|l| l.from == from && l.to == to)
        {
            return Err(EditError::invalid_topology(format!(
                "lane link {from} -> {to} already exists"
            )));
        }

        let from_point = flag_endpoint(roads, &from)?;
        let to_point = flag_endpoint(roads, &to)?;
        let from_dir = along_vec(roads.require(&from.road_id)?, from.end);
        let to_dir = along_vec(roads.require(&to.road_id)?, to.end);

        let edge = bezier_with_directions(from_point, from_dir, to_dir, to_point, None);
        let sample_points = points_of(&edge.curve.spaced_points(LANE_LINK_SEGMENT));
        let length = edge.curve.length();

        let link_id = new_entity_id();
        debug!(junction = junction_id, link = %link_id, %from, %to, "lane link added");
        self.require_mut(junction_id)?.lane_links.push(LaneLink {
            id: link_id.clone(),
            from,
            to,
            length,
            sample_points,
        });
        Ok((link_id, ChangeSet::junction(junction_id)))
    }

    /// Remove a lane link. A road end whose last link disappears is
    /// detached from the junction, which may dissolve it entirely.
    pub fn remove_junction_link(
        &mut self,
        roads: &mut RoadState,
        junction_id: &str,
        link_id: &str,
    ) -> Result<ChangeSet, EditError> {
        let junction = self.require_mut(junction_id)?;
        let index = junction
            .lane_links
            .iter()
            .position(|l| l.id == link_id)
            .ok_or_else(|| {
                EditError::not_found(format!("lane link {link_id} in junction {junction_id}"))
            })?;
        let removed = junction.lane_links.remove(index);

        let mut changed = ChangeSet::junction(junction_id);
        for flag in [&removed.from, &removed.to] {
            let Some(junction) = self.get(junction_id) else {
                break;
            };
            let descriptor = RoadEndDescriptor::new(flag.road_id.clone(), flag.end, flag.direction);
            let still_used = junction.lane_links.iter().any(|l| {
                let ends = [&l.from, &l.to];
                ends.iter().any(|f| {
                    f.road_id == descriptor.road_id
                        && f.end == descriptor.end
                        && f.direction == descriptor.direction
                })
            });
            if !still_used && junction.has_link_road(&descriptor) {
                changed.merge(self.disconnect_link_road(roads, junction_id, &descriptor)?);
            }
        }

        debug!(junction = junction_id, link = link_id, "lane link removed");
        Ok(changed)
    }
}

/// The lane endpoint a link attaches to, at the road end named by the
/// flag.
fn flag_endpoint(roads: &RoadState, flag: &HtFlag) -> Result<glam::DVec3, EditError> {
    let lane = flag_lane(roads, flag)?;
    let point = match flag.end {
        RoadEnd::Start => lane.sample_points.first(),
        RoadEnd::End => lane.sample_points.last(),
    };
    point.map(vec_of).ok_or_else(|| {
        EditError::degenerate(format!(
            "lane {} of road {} has no sample points",
            flag.lane_id, flag.road_id
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::LANE_WIDTH;
    use shared::Point3;

    fn straight_road(state: &mut RoadState, from_x: f64, to_x: f64) -> String {
        state
            .create_road(
                vec![
                    Point3::new(from_x, 0.0, 0.0),
                    Point3::new((from_x + to_x) / 2.0, 0.0, 0.0),
                    Point3::new(to_x, 0.0, 0.0),
                ],
                1,
                LANE_WIDTH,
                false,
            )
            .unwrap()
    }

    fn linked_pair() -> (RoadState, JunctionState, String, String, String) {
        let mut roads = RoadState::new();
        let mut junctions = JunctionState::new();
        let a = straight_road(&mut roads, 0.0, 40.0);
        let b = straight_road(&mut roads, 60.0, 100.0);
        let (junction_id, _) = junctions
            .connect_link_road(
                &mut roads,
                None,
                RoadEndDescriptor::new(&a, RoadEnd::End, LaneDirection::Forward),
            )
            .unwrap();
        junctions
            .connect_link_road(
                &mut roads,
                Some(&junction_id),
                RoadEndDescriptor::new(&b, RoadEnd::Start, LaneDirection::Forward),
            )
            .unwrap();
        (roads, junctions, junction_id, a, b)
    }

    #[test]
    fn test_ht_role() {
        assert_eq!(ht_role(&HtFlag::new("r", 0, -1, RoadEnd::End)), HtRole::Outgoing);
        assert_eq!(ht_role(&HtFlag::new("r", 0, -1, RoadEnd::Start)), HtRole::Incoming);
        assert_eq!(ht_role(&HtFlag::new("r", 0, 1, RoadEnd::Start)), HtRole::Outgoing);
        assert_eq!(ht_role(&HtFlag::new("r", 0, 1, RoadEnd::End)), HtRole::Incoming);
    }

    #[test]
    fn test_add_link_normalizes_direction() {
        let (roads, mut junctions, junction_id, a, b) = linked_pair();
        let outgoing = HtFlag::new(a.clone(), 0, -1, RoadEnd::End);
        let incoming = HtFlag::new(b.clone(), 0, -1, RoadEnd::Start);

        // Picked incoming first; the stored link still runs out -> in.
        let (link_id, changed) = junctions
            .add_junction_link(&roads, &junction_id, &incoming, &outgoing)
            .unwrap();
        assert!(changed.junctions.contains(&junction_id));

        let junction = junctions.get(&junction_id).unwrap();
        let link = junction.lane_link(&link_id).unwrap();
        assert_eq!(link.from.road_id, a);
        assert_eq!(link.to.road_id, b);
        assert_eq!(link.sample_points.len(), LANE_LINK_SEGMENT + 1);
        assert!(link.length >= 20.0);

        // Endpoints land on the lane centers.
        let first = &link.sample_points[0];
        let last = link.sample_points.last().unwrap();
        assert!((first.x - 40.0).abs() < 1e-6);
        assert!((first.z - LANE_WIDTH / 2.0).abs() < 1e-6);
        assert!((last.x - 60.0).abs() < 1e-6);
    }

    #[test]
    fn test_same_role_rejected() {
        let (mut roads, mut junctions, junction_id, a, _) = linked_pair();
        let c = straight_road(&mut roads, -100.0, -60.0);
        junctions
            .connect_link_road(
                &mut roads,
                Some(&junction_id),
                RoadEndDescriptor::new(&c, RoadEnd::End, LaneDirection::Forward),
            )
            .unwrap();

        let first = HtFlag::new(a.clone(), 0, -1, RoadEnd::End);
        let second = HtFlag::new(c.clone(), 0, -1, RoadEnd::End);
        let err = junctions
            .add_junction_link(&roads, &junction_id, &first, &second)
            .unwrap_err();
        assert!(matches!(err, EditError::InvalidTopology(_)));
    }

    #[test]
    fn test_self_and_duplicate_links_rejected() {
        let (roads, mut junctions, junction_id, a, b) = linked_pair();
        let outgoing = HtFlag::new(a.clone(), 0, -1, RoadEnd::End);
        let incoming = HtFlag::new(b.clone(), 0, -1, RoadEnd::Start);

        let err = junctions
            .add_junction_link(&roads, &junction_id, &outgoing, &outgoing)
            .unwrap_err();
        assert!(matches!(err, EditError::InvalidTopology(_)));

        junctions
            .add_junction_link(&roads, &junction_id, &outgoing, &incoming)
            .unwrap();
        let err = junctions
            .add_junction_link(&roads, &junction_id, &outgoing, &incoming)
            .unwrap_err();
        assert!(matches!(err, EditError::InvalidTopology(_)));
    }

    #[test]
    fn test_unjoined_road_end_rejected() {
        let (mut roads, mut junctions, junction_id, a, _) = linked_pair();
        let c = straight_road(&mut roads, -100.0, -60.0);
        let outgoing = HtFlag::new(c, 0, -1, RoadEnd::End);
        let incoming = HtFlag::new(a, 0, -1, RoadEnd::Start);
        let err = junctions
            .add_junction_link(&roads, &junction_id, &outgoing, &incoming)
            .unwrap_err();
        assert!(matches!(err, EditError::InvalidTopology(_)));
    }

    #[test]
    fn test_remove_last_link_detaches_ends() {
        let (mut roads, mut junctions, junction_id, a, b) = linked_pair();
        let outgoing = HtFlag::new(a.clone(), 0, -1, RoadEnd::End);
        let incoming = HtFlag::new(b.clone(), 0, -1, RoadEnd::Start);
        let (link_id, _) = junctions
            .add_junction_link(&roads, &junction_id, &outgoing, &incoming)
            .unwrap();

        let changed = junctions
            .remove_junction_link(&mut roads, &junction_id, &link_id)
            .unwrap();
        // Both ends lost their only link, so the junction dissolved.
        assert!(junctions.get(&junction_id).is_none());
        assert!(changed.junctions.contains(&junction_id));
        assert!(roads.get(&a).unwrap().link_junctions.is_empty());
        assert!(roads.get(&b).unwrap().link_junctions.is_empty());
    }

    #[test]
    fn test_remove_link_keeps_still_used_ends() {
        let (mut roads, mut junctions, junction_id, a, b) = linked_pair();
        let c = straight_road(&mut roads, 50.0, 120.0);
        junctions
            .connect_link_road(
                &mut roads,
                Some(&junction_id),
                RoadEndDescriptor::new(&c, RoadEnd::Start, LaneDirection::Forward),
            )
            .unwrap();

        let outgoing = HtFlag::new(a.clone(), 0, -1, RoadEnd::End);
        let into_b = HtFlag::new(b.clone(), 0, -1, RoadEnd::Start);
        let into_c = HtFlag::new(c.clone(), 0, -1, RoadEnd::Start);
        let (link_b, _) = junctions
            .add_junction_link(&roads, &junction_id, &outgoing, &into_b)
            .unwrap();
        junctions
            .add_junction_link(&roads, &junction_id, &outgoing, &into_c)
            .unwrap();

        junctions
            .remove_junction_link(&mut roads, &junction_id, &link_b)
            .unwrap();
        let junction = junctions.get(&junction_id).unwrap();
        // The b end detached, a and c remain joined through their link.
        assert_eq!(junction.link_roads.len(), 2);
        assert_eq!(junction.lane_links.len(), 1);
        assert!(roads.get(&b).unwrap().link_junctions.is_empty());
        assert!(roads.get(&a).unwrap().link_junctions.contains(&junction_id));
    }
}
