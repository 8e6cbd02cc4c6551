//! Headless map editor: the session, history and selection wired
//! together behind one command surface.
//!
//! Every mutating command runs against the arenas, resynchronizes the
//! junctions its change set names and commits a history record. Nothing
//! here touches a renderer; callers read sample points and surface
//! attributes straight off the entities.

use glam::DVec2;
use shared::{
    HtFlag, JunctionId, LaneId, LaneLinkId, MapFile, Point3, RoadEndDescriptor, RoadId, SectionId,
};
use tokio::task::JoinSet;
use tracing::warn;

use crate::error::EditError;
use crate::events::ChangeSet;
use crate::geometry::vec_of;
use crate::modes::{ModeId, PickCategory};
use crate::selection::{
    pick_nearest, Aabb, CandidatePoint, OrbitCamera, PickTarget, SelectionBox, Viewport,
};
use crate::state::history::{HistoryStore, MapSnapshot};
use crate::state::interaction::LinkPickOutcome;
use crate::state::junction::compute_geo;
use crate::state::road::{key_path_of, ElevationOp};
use crate::state::EditingSession;

const POINT_PICK_RADIUS: f64 = 1.0;

/// One open document and everything editing it needs.
pub struct MapEditor {
    pub session: EditingSession,
    pub camera: OrbitCamera,
    pub viewport: Viewport,
    history: HistoryStore,
    selection_box: SelectionBox,
}

impl Default for MapEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl MapEditor {
    pub fn new() -> Self {
        let session = EditingSession::new();
        let history = HistoryStore::new(session.snapshot());
        Self {
            session,
            camera: OrbitCamera::new(),
            viewport: Viewport::new(1280.0, 720.0),
            history,
            selection_box: SelectionBox::new(),
        }
    }

    // ── Modes ─────────────────────────────────────────────────

    pub fn active_mode(&self) -> ModeId {
        self.session.active_mode()
    }

    /// Switch editing modes. The switch itself lands in history as a
    /// non-diff record so undo can travel across it.
    pub fn activate_mode(&mut self, mode: ModeId) {
        let previous = self.session.activate_mode(mode);
        if previous != mode {
            self.selection_box.cancel();
            self.history.save(mode.title(), false, self.session.snapshot());
        }
    }

    // ── Road commands ─────────────────────────────────────────

    pub fn create_road(
        &mut self,
        control_points: Vec<Point3>,
        lane_count: usize,
        lane_width: f64,
        two_way: bool,
    ) -> Result<RoadId, EditError> {
        let road_id = self
            .session
            .roads
            .create_road(control_points, lane_count, lane_width, two_way)?;
        self.commit("create road", &ChangeSet::road(&road_id))?;
        Ok(road_id)
    }

    /// Remove a road together with every junction reference to it.
    pub fn remove_road(&mut self, road_id: &str) -> Result<(), EditError> {
        self.session.roads.require(road_id)?;
        self.session.roads.remove(road_id);
        let mut changed = self
            .session
            .junctions
            .remove_road_references(&mut self.session.roads, road_id)?;
        changed.add_road(road_id);
        self.commit("remove road", &changed)?;
        Ok(())
    }

    pub fn update_lane_width(
        &mut self,
        road_id: &str,
        section_id: SectionId,
        lane_id: LaneId,
        width: f64,
    ) -> Result<(), EditError> {
        let changed = self
            .session
            .roads
            .update_lane_width(road_id, section_id, lane_id, width)?;
        self.commit("update lane width", &changed)?;
        Ok(())
    }

    pub fn add_lane(
        &mut self,
        road_id: &str,
        section_id: SectionId,
        lane_id: LaneId,
    ) -> Result<(), EditError> {
        let changed = self.session.roads.add_lane(road_id, section_id, lane_id)?;
        self.commit("add lane", &changed)?;
        Ok(())
    }

    pub fn remove_lane(
        &mut self,
        road_id: &str,
        section_id: SectionId,
        lane_id: LaneId,
    ) -> Result<(), EditError> {
        let changed = self.session.roads.remove_lane(road_id, section_id, lane_id)?;
        self.commit("remove lane", &changed)?;
        Ok(())
    }

    pub fn split_section(
        &mut self,
        road_id: &str,
        section_id: SectionId,
        percent: f64,
    ) -> Result<(), EditError> {
        let changed = self.session.roads.split_section(road_id, section_id, percent)?;
        self.commit("split section", &changed)?;
        Ok(())
    }

    pub fn split_section_with_transition(
        &mut self,
        road_id: &str,
        section_id: SectionId,
        lane_id: LaneId,
        percent_range: (f64, f64),
        widen: bool,
    ) -> Result<(), EditError> {
        let changed = self.session.roads.split_section_with_transition(
            road_id,
            section_id,
            lane_id,
            percent_range,
            widen,
        )?;
        self.commit("split section with transition", &changed)?;
        Ok(())
    }

    /// Replace a road's vertical profile. Junction meshes touched by the
    /// road are recomputed concurrently and gathered before the history
    /// commit, so the snapshot never captures a half-updated document.
    pub async fn update_road_elevation(
        &mut self,
        road_id: &str,
        points: Vec<Point3>,
        op: ElevationOp,
    ) -> Result<(), EditError> {
        let changed = self
            .session
            .roads
            .update_road_elevation(road_id, points, op)?;

        let EditingSession {
            roads, junctions, ..
        } = &mut self.session;
        let mut tasks = JoinSet::new();
        for junction_id in &changed.junctions {
            if junctions.get(junction_id).is_none() {
                continue;
            }
            junctions.prune_dangling_links(roads, junction_id)?;
            let input = junctions.rebuild_input(roads, junction_id)?;
            tasks.spawn(async move {
                let geo = compute_geo(&input);
                (input.junction_id, geo)
            });
        }
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((junction_id, geo)) => self.session.junctions.apply_geo(&junction_id, geo)?,
                Err(err) => warn!(%err, "junction rebuild task failed"),
            }
        }

        self.history
            .save(op.title(), true, self.session.snapshot());
        Ok(())
    }

    // ── Junction commands ─────────────────────────────────────

    pub fn connect_link_road(
        &mut self,
        junction_id: Option<&str>,
        descriptor: RoadEndDescriptor,
    ) -> Result<JunctionId, EditError> {
        let (junction_id, changed) = self.session.junctions.connect_link_road(
            &mut self.session.roads,
            junction_id,
            descriptor,
        )?;
        self.commit("connect road to junction", &changed)?;
        Ok(junction_id)
    }

    pub fn disconnect_link_road(
        &mut self,
        junction_id: &str,
        descriptor: &RoadEndDescriptor,
    ) -> Result<(), EditError> {
        let changed = self.session.junctions.disconnect_link_road(
            &mut self.session.roads,
            junction_id,
            descriptor,
        )?;
        self.commit("disconnect road from junction", &changed)?;
        Ok(())
    }

    pub fn add_junction_link(
        &mut self,
        junction_id: &str,
        pick_a: &HtFlag,
        pick_b: &HtFlag,
    ) -> Result<LaneLinkId, EditError> {
        let (link_id, changed) =
            self.session
                .junctions
                .add_junction_link(&self.session.roads, junction_id, pick_a, pick_b)?;
        self.commit("add lane link", &changed)?;
        Ok(link_id)
    }

    pub fn remove_junction_link(
        &mut self,
        junction_id: &str,
        link_id: &str,
    ) -> Result<(), EditError> {
        let changed = self.session.junctions.remove_junction_link(
            &mut self.session.roads,
            junction_id,
            link_id,
        )?;
        self.commit("remove lane link", &changed)?;
        Ok(())
    }

    /// Pick a lane endpoint in link mode. Two distinct picks with
    /// opposite roles create a lane link in the active junction.
    pub fn select_ht_point(&mut self, flag: HtFlag) -> Result<Option<LaneLinkId>, EditError> {
        match self.session.interaction.pick_ht_point(flag) {
            LinkPickOutcome::Cleared | LinkPickOutcome::Armed => Ok(None),
            LinkPickOutcome::Pair(first, second) => {
                let junction_id = self
                    .session
                    .interaction
                    .link
                    .selected_junction
                    .clone()
                    .ok_or_else(|| {
                        EditError::invalid_topology("no junction active for lane link")
                    })?;
                self.add_junction_link(&junction_id, &first, &second).map(Some)
            }
        }
    }

    // ── Selection commands ────────────────────────────────────

    /// Select a road in the active mode. A changed selection lands in
    /// history like any other edit.
    pub fn select_road(&mut self, road_id: Option<RoadId>) {
        let mode = self.active_mode();
        let current = match mode {
            ModeId::Road => &self.session.interaction.road.selected_road,
            ModeId::Elevation => &self.session.interaction.elevation.selected_road,
            ModeId::LaneWidth => &self.session.interaction.lane_width.selected_road,
            ModeId::LaneNumber => &self.session.interaction.lane_number.selected_road,
            ModeId::Junction | ModeId::Link => return,
        };
        if *current == road_id {
            return;
        }
        self.session.interaction.select_road(mode, road_id);
        self.history.save("select road", true, self.session.snapshot());
    }

    pub fn select_lane(&mut self, road_id: RoadId, section_id: SectionId, lane_id: LaneId) {
        let mode = self.active_mode();
        let record = match mode {
            ModeId::LaneWidth => &self.session.interaction.lane_width,
            ModeId::LaneNumber => &self.session.interaction.lane_number,
            _ => return,
        };
        if record.selected_road.as_ref() == Some(&road_id)
            && record.selected_section == Some(section_id)
            && record.selected_lane == Some(lane_id)
        {
            return;
        }
        self.session
            .interaction
            .select_lane(mode, road_id, section_id, lane_id);
        self.history.save("select lane", true, self.session.snapshot());
    }

    pub fn select_junction(&mut self, junction_id: Option<JunctionId>) {
        let mode = self.active_mode();
        let current = match mode {
            ModeId::Junction => &self.session.interaction.junction.selected_junction,
            ModeId::Link => &self.session.interaction.link.selected_junction,
            _ => return,
        };
        if *current == junction_id {
            return;
        }
        self.session.interaction.select_junction(mode, junction_id);
        self.history
            .save("select junction", true, self.session.snapshot());
    }

    // ── History ───────────────────────────────────────────────

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.undo().cloned() else {
            return false;
        };
        self.restore(&snapshot);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.redo().cloned() else {
            return false;
        };
        self.restore(&snapshot);
        true
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    fn restore(&mut self, snapshot: &MapSnapshot) {
        self.selection_box.cancel();
        self.session.apply_snapshot(snapshot);
    }

    /// Resynchronize the junctions named by a change set, then record
    /// the edit. An empty set means the command changed nothing, so no
    /// record is pushed.
    fn commit(&mut self, title: &str, changed: &ChangeSet) -> Result<(), EditError> {
        if changed.is_empty() {
            return Ok(());
        }
        let EditingSession {
            roads, junctions, ..
        } = &mut self.session;
        for junction_id in &changed.junctions {
            if junctions.get(junction_id).is_some() {
                junctions.update_junction(roads, junction_id)?;
            }
        }
        self.history.save(title, true, self.session.snapshot());
        Ok(())
    }

    // ── Selection ─────────────────────────────────────────────

    /// Hit test at a screen position, honoring the active mode's
    /// category allow-list.
    pub fn pick(&self, screen: DVec2) -> Option<(String, PickCategory)> {
        let ray = self.camera.screen_ray(screen, self.viewport);
        let targets = self.pick_targets();
        pick_nearest(&ray, &targets, self.active_mode().pick_categories())
    }

    pub fn begin_box_select(&mut self, screen: DVec2) {
        self.selection_box.begin(screen);
    }

    /// Pointer move during a box selection; recomputes the transient
    /// set over all reference-line control points.
    pub fn update_box_select(&mut self, screen: DVec2) {
        let candidates = self.control_point_candidates();
        self.selection_box
            .update(screen, &self.camera, self.viewport, &candidates);
    }

    /// Pointer up: commit the selection into the road-mode record and
    /// return it.
    pub fn finish_box_select(&mut self) -> Vec<String> {
        let committed = self.selection_box.finish();
        self.session
            .interaction
            .select_road_points(committed.clone());
        committed
    }

    pub fn cancel_box_select(&mut self) {
        self.selection_box.cancel();
    }

    pub fn box_select_rect(&self) -> Option<(DVec2, DVec2)> {
        self.selection_box.rect()
    }

    fn control_point_candidates(&self) -> Vec<CandidatePoint> {
        let mut candidates = Vec::new();
        for road in self.session.roads.iter() {
            for (index, point) in road.control_points.iter().enumerate() {
                candidates.push(CandidatePoint {
                    id: format!("{}:{}", road.id, index),
                    position: vec_of(point),
                });
            }
        }
        candidates
    }

    fn pick_targets(&self) -> Vec<PickTarget> {
        let mut targets = Vec::new();
        for road in self.session.roads.iter() {
            for (index, point) in road.control_points.iter().enumerate() {
                targets.push(PickTarget {
                    id: format!("{}:{}", road.id, index),
                    category: PickCategory::ControlPoint,
                    aabb: Aabb::around_point(vec_of(point), POINT_PICK_RADIUS),
                });
            }

            if road.length > 0.0 && !road.elevation_points.is_empty() {
                let key_path = key_path_of(road);
                for (index, point) in road.elevation_points.iter().enumerate() {
                    let mut position = key_path.point_at((point.x / road.length).clamp(0.0, 1.0));
                    position.y = point.y;
                    targets.push(PickTarget {
                        id: format!("{}:e{}", road.id, index),
                        category: PickCategory::ElevationPoint,
                        aabb: Aabb::around_point(position, POINT_PICK_RADIUS),
                    });
                }
            }

            let mut road_box: Option<Aabb> = None;
            for section in &road.sections {
                for lane in &section.lanes {
                    let Some(geo) = &lane.geo_attr else {
                        continue;
                    };
                    let aabb = Aabb::from_geo(geo);
                    targets.push(PickTarget {
                        id: format!("{}_{}_{}", road.id, section.id, lane.id),
                        category: PickCategory::LaneSurface,
                        aabb,
                    });
                    road_box = Some(match road_box {
                        Some(existing) => existing.union(&aabb),
                        None => aabb,
                    });
                }
            }
            if let Some(aabb) = road_box {
                targets.push(PickTarget {
                    id: road.id.clone(),
                    category: PickCategory::RoadSurface,
                    aabb,
                });
            }
        }

        for junction in self.session.junctions.iter() {
            if let Some(geo) = &junction.geo_attr {
                targets.push(PickTarget {
                    id: junction.id.clone(),
                    category: PickCategory::JunctionArea,
                    aabb: Aabb::from_geo(geo),
                });
            }
            for link in &junction.lane_links {
                if let Some(aabb) = Aabb::from_points(link.sample_points.iter().map(vec_of)) {
                    targets.push(PickTarget {
                        id: link.id.clone(),
                        category: PickCategory::LaneLinkCurve,
                        aabb,
                    });
                }
            }
        }
        targets
    }

    // ── Persistence ───────────────────────────────────────────

    pub fn export_map_json(&self) -> String {
        let map = MapFile {
            version: shared::MAP_FORMAT_VERSION.to_string(),
            roads: self.session.roads.to_vec(),
            junctions: self.session.junctions.to_vec(),
        };
        serde_json::to_string_pretty(&map).unwrap_or_default()
    }

    /// Load a map, replacing the document. The load lands in history so
    /// it can be undone.
    pub fn load_map_json(&mut self, json: &str) -> Result<(), String> {
        let map: MapFile =
            serde_json::from_str(json).map_err(|e| format!("JSON parse error: {e}"))?;
        self.session.roads.apply_state(map.roads);
        self.session.junctions.apply_state(map.junctions);
        self.selection_box.cancel();
        self.history.save("load map", true, self.session.snapshot());
        Ok(())
    }
}
