//! Per-mode interaction records: what is selected in each editing mode.
//!
//! Every mode keeps its own record so switching modes never clobbers
//! another mode's selection. Records carry a monotonic timestamp so the
//! most recent selection across modes can be identified.

use serde::{Deserialize, Serialize};
use shared::{HtFlag, JunctionId, LaneId, LaneLinkId, RoadId, SectionId};

use crate::modes::ModeId;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoadInteraction {
    pub selected_road: Option<RoadId>,
    pub selected_point_ids: Vec<String>,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JunctionInteraction {
    pub selected_junction: Option<JunctionId>,
    pub timestamp: u64,
}

/// Selection of a single lane, shared by the lane-width and lane-number
/// modes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LaneInteraction {
    pub selected_road: Option<RoadId>,
    pub selected_section: Option<SectionId>,
    pub selected_lane: Option<LaneId>,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElevationInteraction {
    pub selected_road: Option<RoadId>,
    pub selected_point_index: Option<usize>,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkInteraction {
    pub selected_junction: Option<JunctionId>,
    pub selected_link: Option<LaneLinkId>,
    /// First endpoint of a link under construction.
    pub picked: Option<HtFlag>,
    pub timestamp: u64,
}

/// Outcome of picking a lane endpoint in the link mode.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkPickOutcome {
    /// The pick cancelled a pending endpoint.
    Cleared,
    /// The pick armed the first endpoint of a new link.
    Armed,
    /// The pick completed an endpoint pair.
    Pair(HtFlag, HtFlag),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractionSet {
    pub road: RoadInteraction,
    pub junction: JunctionInteraction,
    pub lane_width: LaneInteraction,
    pub lane_number: LaneInteraction,
    pub elevation: ElevationInteraction,
    pub link: LinkInteraction,
    timestamp_counter: u64,
}

impl InteractionSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_timestamp(&mut self) -> u64 {
        self.timestamp_counter += 1;
        self.timestamp_counter
    }

    pub fn select_road(&mut self, mode: ModeId, road_id: Option<RoadId>) {
        let stamp = self.next_timestamp();
        match mode {
            ModeId::Road => {
                if self.road.selected_road != road_id {
                    self.road.selected_point_ids.clear();
                }
                self.road.selected_road = road_id;
                self.road.timestamp = stamp;
            }
            ModeId::Elevation => {
                if self.elevation.selected_road != road_id {
                    self.elevation.selected_point_index = None;
                }
                self.elevation.selected_road = road_id;
                self.elevation.timestamp = stamp;
            }
            ModeId::LaneWidth | ModeId::LaneNumber => {
                let record = self.lane_record_mut(mode);
                if record.selected_road != road_id {
                    record.selected_section = None;
                    record.selected_lane = None;
                }
                record.selected_road = road_id;
                record.timestamp = stamp;
            }
            ModeId::Junction | ModeId::Link => {}
        }
    }

    pub fn select_road_points(&mut self, point_ids: Vec<String>) {
        self.road.selected_point_ids = point_ids;
        self.road.timestamp = self.next_timestamp();
    }

    pub fn select_junction(&mut self, mode: ModeId, junction_id: Option<JunctionId>) {
        let stamp = self.next_timestamp();
        match mode {
            ModeId::Junction => {
                self.junction.selected_junction = junction_id;
                self.junction.timestamp = stamp;
            }
            ModeId::Link => {
                if self.link.selected_junction != junction_id {
                    self.link.selected_link = None;
                    self.link.picked = None;
                }
                self.link.selected_junction = junction_id;
                self.link.timestamp = stamp;
            }
            _ => {}
        }
    }

    pub fn select_lane(
        &mut self,
        mode: ModeId,
        road_id: RoadId,
        section_id: SectionId,
        lane_id: LaneId,
    ) {
        let stamp = self.next_timestamp();
        let record = self.lane_record_mut(mode);
        record.selected_road = Some(road_id);
        record.selected_section = Some(section_id);
        record.selected_lane = Some(lane_id);
        record.timestamp = stamp;
    }

    pub fn select_elevation_point(&mut self, index: Option<usize>) {
        self.elevation.selected_point_index = index;
        self.elevation.timestamp = self.next_timestamp();
    }

    pub fn select_link(&mut self, link_id: Option<LaneLinkId>) {
        self.link.selected_link = link_id;
        self.link.picked = None;
        self.link.timestamp = self.next_timestamp();
    }

    /// Pick a lane endpoint: the first pick arms a pending endpoint, a
    /// second distinct pick forms a pair, re-picking the armed endpoint
    /// clears it. Any pick drops a selected link.
    pub fn pick_ht_point(&mut self, flag: HtFlag) -> LinkPickOutcome {
        self.link.selected_link = None;
        self.link.timestamp = self.next_timestamp();
        match self.link.picked.take() {
            None => {
                self.link.picked = Some(flag);
                LinkPickOutcome::Armed
            }
            Some(first) if first == flag => LinkPickOutcome::Cleared,
            Some(first) => LinkPickOutcome::Pair(first, flag),
        }
    }

    /// Clear one mode's record, leaving the others untouched.
    pub fn unselect_all(&mut self, mode: ModeId) {
        let stamp = self.next_timestamp();
        match mode {
            ModeId::Road => {
                self.road = RoadInteraction {
                    timestamp: stamp,
                    ..Default::default()
                }
            }
            ModeId::Junction => {
                self.junction = JunctionInteraction {
                    timestamp: stamp,
                    ..Default::default()
                }
            }
            ModeId::LaneWidth | ModeId::LaneNumber => {
                *self.lane_record_mut(mode) = LaneInteraction {
                    timestamp: stamp,
                    ..Default::default()
                }
            }
            ModeId::Elevation => {
                self.elevation = ElevationInteraction {
                    timestamp: stamp,
                    ..Default::default()
                }
            }
            ModeId::Link => {
                self.link = LinkInteraction {
                    timestamp: stamp,
                    ..Default::default()
                }
            }
        }
    }

    /// Whole-set replacement from a snapshot. The counter never runs
    /// backwards so timestamps stay unique across restores.
    pub fn apply_state(&mut self, other: InteractionSet) {
        let counter = self.timestamp_counter.max(other.timestamp_counter);
        *self = other;
        self.timestamp_counter = counter;
    }

    fn lane_record_mut(&mut self, mode: ModeId) -> &mut LaneInteraction {
        match mode {
            ModeId::LaneNumber => &mut self.lane_number,
            _ => &mut self.lane_width,
        }
    }
}
