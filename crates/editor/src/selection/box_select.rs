use glam::{DVec2, DVec3};

use super::camera::{OrbitCamera, Viewport};
use super::frustum::Frustum;

/// A selectable point with a stable id, usually a reference-line control
/// point.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidatePoint {
    pub id: String,
    pub position: DVec3,
}

/// Drag-rectangle selection over candidate points.
///
/// The transient selection is recomputed on every pointer move and only
/// committed on pointer up; redundant updates with the same pointer
/// position are harmless.
#[derive(Debug, Clone, Default)]
pub struct SelectionBox {
    start: Option<DVec2>,
    current: Option<DVec2>,
    selected: Vec<String>,
}

impl SelectionBox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.start.is_some()
    }

    /// Screen rectangle of the drag in progress, for the visual
    /// indicator.
    pub fn rect(&self) -> Option<(DVec2, DVec2)> {
        Some((self.start?, self.current?))
    }

    /// Transient selection as of the last update.
    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn begin(&mut self, screen: DVec2) {
        self.start = Some(screen);
        self.current = Some(screen);
        self.selected.clear();
    }

    /// Pointer move: recompute the transient selection against the
    /// current candidate set.
    pub fn update(
        &mut self,
        screen: DVec2,
        camera: &OrbitCamera,
        viewport: Viewport,
        candidates: &[CandidatePoint],
    ) {
        let Some(start) = self.start else {
            return;
        };
        self.current = Some(screen);
        let frustum = Frustum::from_screen_rect(camera, viewport, start, screen);
        self.selected = candidates
            .iter()
            .filter(|c| frustum.contains(c.position))
            .map(|c| c.id.clone())
            .collect();
    }

    /// Pointer up: commit and return a copy of the selection the caller
    /// owns outright.
    pub fn finish(&mut self) -> Vec<String> {
        let committed = self.selected.clone();
        self.start = None;
        self.current = None;
        self.selected.clear();
        committed
    }

    /// Lost capture or mode switch: drop everything without committing.
    pub fn cancel(&mut self) {
        self.start = None;
        self.current = None;
        self.selected.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn top_down_camera() -> OrbitCamera {
        let mut camera = OrbitCamera::new();
        camera.pitch = 1.5;
        camera.distance = 100.0;
        camera
    }

    fn grid_candidates() -> Vec<CandidatePoint> {
        let mut candidates = Vec::new();
        for x in -2..=2 {
            for z in -2..=2 {
                candidates.push(CandidatePoint {
                    id: format!("p_{x}_{z}"),
                    position: DVec3::new(x as f64 * 10.0, 0.0, z as f64 * 10.0),
                });
            }
        }
        candidates
    }

    #[test]
    fn test_full_screen_drag_selects_all() {
        let camera = top_down_camera();
        let viewport = Viewport::new(800.0, 600.0);
        let candidates = grid_candidates();

        let mut selection = SelectionBox::new();
        selection.begin(DVec2::new(0.0, 0.0));
        selection.update(DVec2::new(800.0, 600.0), &camera, viewport, &candidates);
        assert_eq!(selection.selected().len(), candidates.len());

        let committed = selection.finish();
        assert_eq!(committed.len(), candidates.len());
        // The engine keeps nothing after the commit.
        assert!(!selection.is_dragging());
        assert!(selection.selected().is_empty());
    }

    #[test]
    fn test_swapped_drag_direction_selects_same_set() {
        let camera = top_down_camera();
        let viewport = Viewport::new(800.0, 600.0);
        let candidates = grid_candidates();
        let a = DVec2::new(150.0, 120.0);
        let b = DVec2::new(650.0, 480.0);

        let mut forward = SelectionBox::new();
        forward.begin(a);
        forward.update(b, &camera, viewport, &candidates);

        let mut backward = SelectionBox::new();
        backward.begin(b);
        backward.update(a, &camera, viewport, &candidates);

        assert_eq!(forward.finish(), backward.finish());
    }

    #[test]
    fn test_update_without_begin_is_inert() {
        let camera = top_down_camera();
        let viewport = Viewport::new(800.0, 600.0);
        let mut selection = SelectionBox::new();
        selection.update(DVec2::new(400.0, 300.0), &camera, viewport, &grid_candidates());
        assert!(selection.selected().is_empty());
        assert!(selection.rect().is_none());
    }

    #[test]
    fn test_cancel_clears_everything() {
        let camera = top_down_camera();
        let viewport = Viewport::new(800.0, 600.0);
        let mut selection = SelectionBox::new();
        selection.begin(DVec2::new(0.0, 0.0));
        selection.update(DVec2::new(800.0, 600.0), &camera, viewport, &grid_candidates());
        assert!(!selection.selected().is_empty());

        selection.cancel();
        assert!(!selection.is_dragging());
        assert!(selection.selected().is_empty());
        assert!(selection.rect().is_none());
    }
}
