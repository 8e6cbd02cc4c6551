//! Editor state: the entity arenas, per-mode interaction records and the
//! session that ties them together.

pub mod history;
pub mod interaction;
pub mod junction;
pub mod road;

use crate::modes::ModeId;

use self::history::MapSnapshot;
use self::interaction::InteractionSet;
use self::junction::JunctionState;
use self::road::RoadState;

/// One editing session over one document. Everything an edit touches
/// hangs off this; there is no global state.
#[derive(Debug, Clone, Default)]
pub struct EditingSession {
    pub roads: RoadState,
    pub junctions: JunctionState,
    pub interaction: InteractionSet,
    active_mode: ModeId,
}

impl EditingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_mode(&self) -> ModeId {
        self.active_mode
    }

    /// Switch modes. The outgoing mode's selection is cleared; the
    /// incoming mode keeps whatever its record already held.
    pub fn activate_mode(&mut self, mode: ModeId) -> ModeId {
        let previous = self.active_mode;
        if previous != mode {
            self.interaction.unselect_all(previous);
            self.active_mode = mode;
        }
        previous
    }

    pub fn snapshot(&self) -> MapSnapshot {
        MapSnapshot {
            roads: self.roads.to_vec(),
            junctions: self.junctions.to_vec(),
            interaction: self.interaction.clone(),
            mode: self.active_mode,
        }
    }

    /// Restore a snapshot wholesale, including which mode was active.
    pub fn apply_snapshot(&mut self, snapshot: &MapSnapshot) {
        self.roads.apply_state(snapshot.roads.clone());
        self.junctions.apply_state(snapshot.junctions.clone());
        self.interaction.apply_state(snapshot.interaction.clone());
        self.active_mode = snapshot.mode;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::LANE_WIDTH;
    use shared::Point3;

    #[test]
    fn test_mode_switch_clears_outgoing_selection() {
        let mut session = EditingSession::new();
        session
            .interaction
            .select_road(ModeId::Road, Some("r1".into()));
        session.activate_mode(ModeId::Junction);
        assert!(session.interaction.road.selected_road.is_none());
        assert_eq!(session.active_mode(), ModeId::Junction);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut session = EditingSession::new();
        let id = session
            .roads
            .create_road(
                vec![
                    Point3::new(0.0, 0.0, 0.0),
                    Point3::new(20.0, 0.0, 0.0),
                    Point3::new(40.0, 0.0, 0.0),
                ],
                1,
                LANE_WIDTH,
                false,
            )
            .unwrap();
        session.activate_mode(ModeId::LaneWidth);
        let snap = session.snapshot();

        session.roads.remove(&id);
        session.activate_mode(ModeId::Road);
        session.apply_snapshot(&snap);

        assert!(session.roads.get(&id).is_some());
        assert_eq!(session.active_mode(), ModeId::LaneWidth);
        let restored = session.snapshot();
        assert_eq!(restored.roads, snap.roads);
        assert_eq!(restored.junctions, snap.junctions);
    }
}
