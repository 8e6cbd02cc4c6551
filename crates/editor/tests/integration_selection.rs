//! Box selection and mode-filtered picking through the editor.

use glam::DVec2;
use mapedit::fixtures::{editor_with_straight_road, two_connected_roads};
use mapedit::{ModeId, PickCategory};

mod common;

/// Looks straight down on the road from high above so screen x maps to
/// world x.
fn aim_camera_top_down(editor: &mut mapedit::MapEditor) {
    editor.camera.pitch = 1.5;
    editor.camera.distance = 200.0;
    editor.camera.target = glam::DVec3::new(20.0, 0.0, 0.0);
}

#[test]
fn box_select_grabs_control_points_and_commits_on_finish() {
    common::init_logging();
    let (mut editor, road_id) = editor_with_straight_road(1, false);
    aim_camera_top_down(&mut editor);

    editor.begin_box_select(DVec2::new(0.0, 0.0));
    editor.update_box_select(DVec2::new(1280.0, 720.0));
    let committed = editor.finish_box_select();

    // All three control points of the fixture road.
    assert_eq!(committed.len(), 3);
    assert!(committed.iter().all(|id| id.starts_with(&road_id)));
    assert_eq!(
        editor.session.interaction.road.selected_point_ids,
        committed
    );
    assert!(editor.box_select_rect().is_none());
}

#[test]
fn box_select_swapped_corners_select_the_same_points() {
    common::init_logging();
    let (mut editor, _) = editor_with_straight_road(1, false);
    aim_camera_top_down(&mut editor);
    let a = DVec2::new(200.0, 150.0);
    let b = DVec2::new(1100.0, 600.0);

    editor.begin_box_select(a);
    editor.update_box_select(b);
    let forward = editor.finish_box_select();

    editor.begin_box_select(b);
    editor.update_box_select(a);
    let backward = editor.finish_box_select();

    assert_eq!(forward, backward);
}

#[test]
fn cancel_mid_drag_leaves_no_trace() {
    common::init_logging();
    let (mut editor, _) = editor_with_straight_road(1, false);
    aim_camera_top_down(&mut editor);

    editor.begin_box_select(DVec2::new(0.0, 0.0));
    editor.update_box_select(DVec2::new(1280.0, 720.0));
    editor.cancel_box_select();

    assert!(editor.box_select_rect().is_none());
    assert!(editor
        .session
        .interaction
        .road
        .selected_point_ids
        .is_empty());
}

#[test]
fn mode_switch_cancels_a_drag() {
    common::init_logging();
    let (mut editor, _) = editor_with_straight_road(1, false);
    aim_camera_top_down(&mut editor);
    editor.begin_box_select(DVec2::new(0.0, 0.0));
    editor.activate_mode(ModeId::Junction);
    assert!(editor.box_select_rect().is_none());
}

#[test]
fn picking_honors_the_mode_allow_list() {
    common::init_logging();
    let (mut editor, junction_id, _, _) = two_connected_roads();
    aim_camera_top_down(&mut editor);
    editor.camera.target = glam::DVec3::new(50.0, 0.0, 1.75);

    // The screen center looks into the junction gap.
    let center = DVec2::new(640.0, 360.0);

    editor.activate_mode(ModeId::Junction);
    let hit = editor.pick(center).expect("junction under cursor");
    assert_eq!(hit, (junction_id.clone(), PickCategory::JunctionArea));

    // Lane modes ignore the junction area entirely.
    editor.activate_mode(ModeId::LaneWidth);
    let hit = editor.pick(center);
    assert!(hit.is_none() || hit.unwrap().1 == PickCategory::LaneSurface);
}

#[test]
fn road_mode_picks_the_nearest_control_point() {
    common::init_logging();
    let (mut editor, road_id) = editor_with_straight_road(1, false);
    aim_camera_top_down(&mut editor);

    // The camera looks at (20, 0, 0), the middle control point.
    let hit = editor.pick(DVec2::new(640.0, 360.0)).expect("hit");
    assert_eq!(hit, (format!("{road_id}:1"), PickCategory::ControlPoint));
}
