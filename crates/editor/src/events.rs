use shared::{JunctionId, RoadId};

/// Ids touched by one mutating operation.
///
/// Every command returns the set of roads it rewrote and the junctions
/// whose derived geometry must be resynchronized before the edit is
/// committed to history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    pub roads: Vec<RoadId>,
    pub junctions: Vec<JunctionId>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn road(id: impl Into<RoadId>) -> Self {
        let mut set = Self::default();
        set.add_road(id);
        set
    }

    pub fn junction(id: impl Into<JunctionId>) -> Self {
        let mut set = Self::default();
        set.add_junction(id);
        set
    }

    pub fn add_road(&mut self, id: impl Into<RoadId>) {
        let id = id.into();
        if !self.roads.contains(&id) {
            self.roads.push(id);
        }
    }

    pub fn add_junction(&mut self, id: impl Into<JunctionId>) {
        let id = id.into();
        if !self.junctions.contains(&id) {
            self.junctions.push(id);
        }
    }

    pub fn merge(&mut self, other: ChangeSet) {
        for id in other.roads {
            self.add_road(id);
        }
        for id in other.junctions {
            self.add_junction(id);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.roads.is_empty() && self.junctions.is_empty()
    }
}
