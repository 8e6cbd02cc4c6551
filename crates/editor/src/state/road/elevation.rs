//! Vertical profile edits. The profile is a curve over distance along
//! the road; applying it rewrites every boundary height in place so lane
//! shapes in the ground plane survive.

use shared::Point3;
use tracing::debug;

use crate::error::EditError;
use crate::events::ChangeSet;

use super::{elevation_path_of, RoadState};

/// Which kind of profile-point edit produced a new point list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElevationOp {
    Add,
    Update,
    Remove,
}

impl ElevationOp {
    pub fn title(&self) -> &'static str {
        match self {
            ElevationOp::Add => "add elevation point",
            ElevationOp::Update => "move elevation point",
            ElevationOp::Remove => "remove elevation point",
        }
    }
}

impl RoadState {
    /// Replace a road's vertical profile and re-apply it to all sampled
    /// geometry. An empty point list flattens the road back to height
    /// zero; a single point sets a constant height.
    pub fn update_road_elevation(
        &mut self,
        road_id: &str,
        points: Vec<Point3>,
        op: ElevationOp,
    ) -> Result<ChangeSet, EditError> {
        let road = self.require_mut(road_id)?;
        road.elevation_points = points;
        let elevation_path = elevation_path_of(road);
        let constant = match road.elevation_points.len() {
            0 => Some(0.0),
            1 => Some(road.elevation_points[0].y),
            _ => None,
        };

        for section in &mut road.sections {
            let span = section.p_end - section.p_start;
            for boundary in &mut section.boundaries {
                let count = boundary.sample_points.len();
                for (i, point) in boundary.sample_points.iter_mut().enumerate() {
                    point.y = match (constant, &elevation_path) {
                        (Some(height), _) => height,
                        (None, Some(path)) => {
                            let percent = if count > 1 {
                                section.p_start + span * i as f64 / (count - 1) as f64
                            } else {
                                section.p_start
                            };
                            path.point_at(percent).y
                        }
                        (None, None) => point.y,
                    };
                }
            }
            super::boundary::refresh_lane_geometry(section);
        }

        debug!(road = road_id, op = op.title(), "elevation profile applied");
        let mut changed = ChangeSet::road(road_id);
        for junction_id in &self.require(road_id)?.link_junctions {
            changed.add_junction(junction_id.clone());
        }
        Ok(changed)
    }
}
