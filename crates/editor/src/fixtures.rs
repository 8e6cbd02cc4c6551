//! Ready-made documents for tests and examples.

use shared::{JunctionId, LaneDirection, Point3, RoadEnd, RoadEndDescriptor, RoadId};

use crate::constants::LANE_WIDTH;
use crate::harness::MapEditor;

/// Control points of a straight road along +x starting at the origin.
pub fn straight_road_points(length: f64) -> Vec<Point3> {
    vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(length / 2.0, 0.0, 0.0),
        Point3::new(length, 0.0, 0.0),
    ]
}

/// An editor holding one straight 40 m road with default lane widths.
pub fn editor_with_straight_road(lane_count: usize, two_way: bool) -> (MapEditor, RoadId) {
    let mut editor = MapEditor::new();
    let road_id = editor
        .create_road(straight_road_points(40.0), lane_count, LANE_WIDTH, two_way)
        .expect("fixture road");
    (editor, road_id)
}

/// Two collinear one-lane roads facing each other across a 20 m gap,
/// joined tail-to-head by one junction.
pub fn two_connected_roads() -> (MapEditor, JunctionId, RoadId, RoadId) {
    let mut editor = MapEditor::new();
    let a = editor
        .create_road(straight_road_points(40.0), 1, LANE_WIDTH, false)
        .expect("fixture road a");
    let b = editor
        .create_road(
            vec![
                Point3::new(60.0, 0.0, 0.0),
                Point3::new(80.0, 0.0, 0.0),
                Point3::new(100.0, 0.0, 0.0),
            ],
            1,
            LANE_WIDTH,
            false,
        )
        .expect("fixture road b");

    let junction_id = editor
        .connect_link_road(
            None,
            RoadEndDescriptor::new(&a, RoadEnd::End, LaneDirection::Forward),
        )
        .expect("fixture junction");
    editor
        .connect_link_road(
            Some(&junction_id),
            RoadEndDescriptor::new(&b, RoadEnd::Start, LaneDirection::Forward),
        )
        .expect("fixture junction second end");

    (editor, junction_id, a, b)
}
