use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Map file format version written by this editor.
pub const MAP_FORMAT_VERSION: &str = "2.0";

pub type RoadId = String;
pub type JunctionId = String;
pub type BoundaryId = String;
pub type LaneLinkId = String;
/// Sections are numbered front-to-back within a road, starting at 0.
pub type SectionId = u32;
/// Signed lane id: negative = forward side, positive = reverse side.
/// Ids on each side are contiguous starting at -1 / 1.
pub type LaneId = i32;

/// A 3D point in world coordinates (y is up).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const ZERO: Point3 = Point3 { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn distance_to(&self, other: &Point3) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Plain vertex/index buffers handed to the rendering collaborator.
/// Vertices are packed as x, y, z triples.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoAttr {
    pub vertices: Vec<f64>,
    pub indices: Vec<u32>,
}

/// Travel direction of a lane group relative to the road reference line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaneDirection {
    Forward,
    Reverse,
}

impl LaneDirection {
    /// Direction implied by a signed lane id.
    pub fn of_lane(lane_id: LaneId) -> Self {
        if lane_id < 0 {
            LaneDirection::Forward
        } else {
            LaneDirection::Reverse
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LaneDirection::Forward => "forward",
            LaneDirection::Reverse => "reverse",
        }
    }
}

impl fmt::Display for LaneDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LaneDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forward" => Ok(LaneDirection::Forward),
            "reverse" => Ok(LaneDirection::Reverse),
            other => Err(format!("unknown lane direction: {other}")),
        }
    }
}

/// Which end of a road, as a reference-line parameter: start = 0, end = 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoadEnd {
    Start,
    End,
}

impl RoadEnd {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoadEnd::Start => "start",
            RoadEnd::End => "end",
        }
    }

    /// The "percent" form used in end descriptors: "0" or "1".
    pub fn percent_str(&self) -> &'static str {
        match self {
            RoadEnd::Start => "0",
            RoadEnd::End => "1",
        }
    }

    pub fn is_tail(&self) -> bool {
        matches!(self, RoadEnd::End)
    }
}

impl fmt::Display for RoadEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoadEnd {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" | "0" => Ok(RoadEnd::Start),
            "end" | "1" => Ok(RoadEnd::End),
            other => Err(format!("unknown road end: {other}")),
        }
    }
}

/// Head/Tail anchor key: identifies where one lane meets a junction.
///
/// Two flags are equal iff all five components match; the `Display` form
/// `road_section_lane_end_direction` is the deterministic wire key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HtFlag {
    pub road_id: RoadId,
    pub section_id: SectionId,
    pub lane_id: LaneId,
    pub end: RoadEnd,
    pub direction: LaneDirection,
}

impl HtFlag {
    pub fn new(
        road_id: impl Into<RoadId>,
        section_id: SectionId,
        lane_id: LaneId,
        end: RoadEnd,
    ) -> Self {
        Self {
            road_id: road_id.into(),
            section_id,
            lane_id,
            end,
            direction: LaneDirection::of_lane(lane_id),
        }
    }
}

impl fmt::Display for HtFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}_{}",
            self.road_id, self.section_id, self.lane_id, self.end, self.direction
        )
    }
}

impl FromStr for HtFlag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('_').collect();
        if parts.len() != 5 {
            return Err(format!("malformed HT flag: {s}"));
        }
        Ok(HtFlag {
            road_id: parts[0].to_string(),
            section_id: parts[1].parse().map_err(|_| format!("bad section id in {s}"))?,
            lane_id: parts[2].parse().map_err(|_| format!("bad lane id in {s}"))?,
            end: parts[3].parse()?,
            direction: parts[4].parse()?,
        })
    }
}

/// One road end connected to a junction: `roadId_percent_direction`
/// with percent in {0, 1}.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoadEndDescriptor {
    pub road_id: RoadId,
    pub end: RoadEnd,
    pub direction: LaneDirection,
}

impl RoadEndDescriptor {
    pub fn new(road_id: impl Into<RoadId>, end: RoadEnd, direction: LaneDirection) -> Self {
        Self { road_id: road_id.into(), end, direction }
    }
}

impl fmt::Display for RoadEndDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.road_id, self.end.percent_str(), self.direction)
    }
}

impl FromStr for RoadEndDescriptor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('_').collect();
        if parts.len() != 3 {
            return Err(format!("malformed road end descriptor: {s}"));
        }
        Ok(RoadEndDescriptor {
            road_id: parts[0].to_string(),
            end: parts[1].parse()?,
            direction: parts[2].parse()?,
        })
    }
}

/// A drivable strip between two boundary curves.
///
/// `sample_points` (the lane center line) and `geo_attr` are derived from
/// the bounding boundaries and are regenerated whenever those change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lane {
    pub id: LaneId,
    /// Nominal width in meters.
    pub width: f64,
    pub left_boundary_id: BoundaryId,
    pub right_boundary_id: BoundaryId,
    /// True when this lane's outer boundary blends between two widths.
    pub is_transition: bool,
    /// For a transition lane: true = widening along travel direction.
    pub is_extends: Option<bool>,
    pub sample_points: Vec<Point3>,
    pub geo_attr: Option<GeoAttr>,
}

impl Lane {
    pub fn direction(&self) -> LaneDirection {
        LaneDirection::of_lane(self.id)
    }
}

/// A piecewise boundary curve shared between adjacent lanes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneBoundary {
    pub id: BoundaryId,
    pub is_forward: bool,
    pub sample_points: Vec<Point3>,
}

/// A longitudinal slice of a road with a fixed lane count.
///
/// `p_start`/`p_end` are the slice's parameter range on the road reference
/// line; sections tile [0, 1] with no gaps or overlaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub p_start: f64,
    pub p_end: f64,
    pub length: f64,
    pub lanes: Vec<Lane>,
    pub boundaries: Vec<LaneBoundary>,
}

impl Section {
    pub fn lane(&self, lane_id: LaneId) -> Option<&Lane> {
        self.lanes.iter().find(|l| l.id == lane_id)
    }

    pub fn lane_mut(&mut self, lane_id: LaneId) -> Option<&mut Lane> {
        self.lanes.iter_mut().find(|l| l.id == lane_id)
    }

    pub fn boundary(&self, boundary_id: &str) -> Option<&LaneBoundary> {
        self.boundaries.iter().find(|b| b.id == boundary_id)
    }

    pub fn boundary_mut(&mut self, boundary_id: &str) -> Option<&mut LaneBoundary> {
        self.boundaries.iter_mut().find(|b| b.id == boundary_id)
    }

    /// Lanes of one side sorted inner to outer (|id| ascending).
    pub fn lanes_on_side(&self, direction: LaneDirection) -> Vec<&Lane> {
        let mut lanes: Vec<&Lane> = self
            .lanes
            .iter()
            .filter(|l| l.direction() == direction)
            .collect();
        lanes.sort_by_key(|l| l.id.abs());
        lanes
    }
}

/// A drivable path: an ordered reference curve and its sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Road {
    pub id: RoadId,
    /// Authored reference-line control points (the key path).
    pub control_points: Vec<Point3>,
    /// Vertical profile control points; x is distance along the road,
    /// y is height. Empty = flat road.
    pub elevation_points: Vec<Point3>,
    /// Reference-line arc length in meters.
    pub length: f64,
    pub sections: Vec<Section>,
    /// Junctions any end of this road is connected to.
    pub link_junctions: Vec<JunctionId>,
}

impl Road {
    pub fn section(&self, section_id: SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == section_id)
    }

    pub fn section_mut(&mut self, section_id: SectionId) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.id == section_id)
    }
}

/// A directed connecting curve between two HT points inside a junction.
/// `from` is the outgoing anchor, `to` the incoming one; the sampled curve
/// runs from `from` to `to`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneLink {
    pub id: LaneLinkId,
    pub from: HtFlag,
    pub to: HtFlag,
    pub length: f64,
    pub sample_points: Vec<Point3>,
}

/// An area where several roads' lane links connect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Junction {
    pub id: JunctionId,
    pub link_roads: Vec<RoadEndDescriptor>,
    pub lane_links: Vec<LaneLink>,
    pub geo_attr: Option<GeoAttr>,
}

impl Junction {
    pub fn has_link_road(&self, descriptor: &RoadEndDescriptor) -> bool {
        self.link_roads.contains(descriptor)
    }

    pub fn lane_link(&self, link_id: &str) -> Option<&LaneLink> {
        self.lane_links.iter().find(|l| l.id == link_id)
    }
}

/// The serialized entity graph. Round-trip stability is required:
/// importing then exporting must reproduce the graph identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapFile {
    pub version: String,
    pub roads: Vec<Road>,
    pub junctions: Vec<Junction>,
}

impl MapFile {
    pub fn new(roads: Vec<Road>, junctions: Vec<Junction>) -> Self {
        Self {
            version: MAP_FORMAT_VERSION.to_string(),
            roads,
            junctions,
        }
    }
}
