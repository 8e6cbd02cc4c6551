//! Road editing scenarios driven through the editor command surface.

use mapedit::constants::LANE_WIDTH;
use mapedit::fixtures::{editor_with_straight_road, straight_road_points};
use mapedit::state::road::ElevationOp;
use mapedit::{EditError, MapEditor};
use shared::{LaneDirection, Point3};

mod common;

#[test]
fn pure_split_keeps_widths_and_shares_the_cut() {
    common::init_logging();
    let mut editor = MapEditor::new();
    let road_id = editor
        .create_road(straight_road_points(100.0), 1, LANE_WIDTH, false)
        .unwrap();

    // Split at 40 m.
    editor.split_section(&road_id, 0, 0.4).unwrap();

    let road = editor.session.roads.get(&road_id).unwrap();
    assert_eq!(road.sections.len(), 2);
    for section in &road.sections {
        assert_eq!(section.lane(-1).unwrap().width, LANE_WIDTH);
    }

    // Boundary samples at the cut coincide exactly.
    let first = &road.sections[0];
    let second = &road.sections[1];
    let lane_a = first.lane(-1).unwrap();
    let lane_b = second.lane(-1).unwrap();
    for (id_a, id_b) in [
        (&lane_a.left_boundary_id, &lane_b.left_boundary_id),
        (&lane_a.right_boundary_id, &lane_b.right_boundary_id),
    ] {
        let end = first
            .boundary(id_a)
            .unwrap()
            .sample_points
            .last()
            .unwrap()
            .clone();
        let start = second.boundary(id_b).unwrap().sample_points[0].clone();
        assert!(end.distance_to(&start) < 1e-9);
        assert!((end.x - 40.0).abs() < 1e-6);
    }
}

#[test]
fn truncating_split_records_no_history() {
    common::init_logging();
    let (mut editor, road_id) = editor_with_straight_road(1, false);
    let before_json = editor.export_map_json();
    let before_records = editor.history().records().len();

    // A cut at the section boundary is a truncation: the command
    // succeeds but nothing changed, so no record lands in history.
    editor.split_section(&road_id, 0, 0.0).unwrap();

    assert_eq!(editor.export_map_json(), before_json);
    assert_eq!(editor.history().records().len(), before_records);
}

#[test]
fn width_change_shifts_outboard_lanes_only() {
    common::init_logging();
    let (mut editor, road_id) = editor_with_straight_road(3, true);
    editor.update_lane_width(&road_id, 0, -2, 4.0).unwrap();

    let road = editor.session.roads.get(&road_id).unwrap();
    let section = &road.sections[0];

    let outer_z = |lane_id: i32| {
        let lane = section.lane(lane_id).unwrap();
        section.boundary(&lane.right_boundary_id).unwrap().sample_points[0].z
    };
    // Lane -1 untouched, -2 grew by 0.5, -3 carried outward.
    assert!((outer_z(-1) - 3.5).abs() < 1e-6);
    assert!((outer_z(-2) - 7.5).abs() < 1e-6);
    assert!((outer_z(-3) - 11.0).abs() < 1e-6);
    // The reverse side never moves.
    assert!((outer_z(3) + 10.5).abs() < 1e-6);
}

#[test]
fn lane_ids_stay_contiguous_through_add_and_remove() {
    common::init_logging();
    let (mut editor, road_id) = editor_with_straight_road(3, false);
    editor.remove_lane(&road_id, 0, -2).unwrap();
    editor.add_lane(&road_id, 0, -1).unwrap();
    editor.remove_lane(&road_id, 0, -3).unwrap();

    let road = editor.session.roads.get(&road_id).unwrap();
    let ids: Vec<i32> = road.sections[0]
        .lanes_on_side(LaneDirection::Forward)
        .iter()
        .map(|l| l.id)
        .collect();
    assert_eq!(ids, vec![-1, -2]);
}

#[test]
fn removing_the_last_lane_is_rejected_without_mutation() {
    common::init_logging();
    let (mut editor, road_id) = editor_with_straight_road(1, false);
    let before = editor.export_map_json();
    let err = editor.remove_lane(&road_id, 0, -1).unwrap_err();
    assert!(matches!(err, EditError::InvalidTopology(_)));
    assert_eq!(editor.export_map_json(), before);
}

#[test]
fn transition_split_blends_the_lane_in() {
    common::init_logging();
    let (mut editor, road_id) = editor_with_straight_road(2, false);
    editor
        .split_section_with_transition(&road_id, 0, -2, (0.25, 0.75), true)
        .unwrap();

    let road = editor.session.roads.get(&road_id).unwrap();
    assert_eq!(road.sections.len(), 3);
    assert_eq!(
        road.sections[0].lanes_on_side(LaneDirection::Forward).len(),
        1
    );
    let lane = road.sections[1].lane(-2).unwrap();
    assert!(lane.is_transition);
    assert_eq!(lane.is_extends, Some(true));

    // Width edits on the transition side are refused afterwards.
    let err = editor.update_lane_width(&road_id, 1, -1, 4.0).unwrap_err();
    assert!(matches!(err, EditError::InvalidTopology(_)));
}

#[tokio::test]
async fn elevation_edit_lifts_every_boundary() {
    common::init_logging();
    let (mut editor, road_id) = editor_with_straight_road(1, false);
    editor
        .update_road_elevation(
            &road_id,
            vec![Point3::new(0.0, 0.0, 0.0), Point3::new(40.0, 8.0, 0.0)],
            ElevationOp::Add,
        )
        .await
        .unwrap();

    let road = editor.session.roads.get(&road_id).unwrap();
    let section = &road.sections[0];
    for boundary in &section.boundaries {
        let last = boundary.sample_points.last().unwrap();
        assert!((last.y - 8.0).abs() < 1e-6);
    }
    // The edit is undoable like any other.
    assert!(editor.undo());
    let road = editor.session.roads.get(&road_id).unwrap();
    assert!(road.elevation_points.is_empty());
}
