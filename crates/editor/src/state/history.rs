//! Undo/redo history over whole-document snapshots.
//!
//! Every record stores a full snapshot of both arenas, the interaction
//! set and the active mode, so undo works across mode switches. Old
//! records past the storage cap keep their metadata but lose the
//! snapshot; an evicted record blocks undo from travelling past it.

use serde::{Deserialize, Serialize};
use shared::{Junction, Road};
use tracing::warn;

use crate::constants::MAX_STORAGE_COUNT;
use crate::modes::ModeId;
use crate::state::interaction::InteractionSet;

/// Everything needed to restore the editor to a past state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapSnapshot {
    pub roads: Vec<Road>,
    pub junctions: Vec<Junction>,
    pub interaction: InteractionSet,
    pub mode: ModeId,
}

#[derive(Debug, Clone)]
pub struct HistoryRecord {
    pub title: String,
    /// False for records that only witness a mode switch or selection.
    pub diff: bool,
    pub data: Option<MapSnapshot>,
}

impl HistoryRecord {
    pub fn is_evicted(&self) -> bool {
        self.data.is_none()
    }
}

/// Linear history with a cursor. The record at the cursor is the current
/// state; saving truncates any redo future.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    records: Vec<HistoryRecord>,
    cursor: usize,
}

impl HistoryStore {
    pub fn new(baseline: MapSnapshot) -> Self {
        Self {
            records: vec![HistoryRecord {
                title: "initial".to_string(),
                diff: false,
                data: Some(baseline),
            }],
            cursor: 0,
        }
    }

    /// Append a record after the cursor, dropping any redo future. Once
    /// the record count passes the cap, the oldest record beyond it is
    /// evicted down to its metadata.
    pub fn save(&mut self, title: impl Into<String>, diff: bool, snapshot: MapSnapshot) {
        self.records.truncate(self.cursor + 1);
        self.records.push(HistoryRecord {
            title: title.into(),
            diff,
            data: Some(snapshot),
        });
        self.cursor = self.records.len() - 1;

        if self.records.len() > MAX_STORAGE_COUNT {
            let evict = self.records.len() - MAX_STORAGE_COUNT - 1;
            self.records[evict].data = None;
        }
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0 && !self.records[self.cursor - 1].is_evicted()
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.records.len()
    }

    /// Step back one record and return the snapshot to restore. Stepping
    /// onto an evicted record is refused.
    pub fn undo(&mut self) -> Option<&MapSnapshot> {
        if self.cursor == 0 {
            return None;
        }
        if self.records[self.cursor - 1].is_evicted() {
            warn!("undo blocked by evicted history record");
            return None;
        }
        self.cursor -= 1;
        self.records[self.cursor].data.as_ref()
    }

    pub fn redo(&mut self) -> Option<&MapSnapshot> {
        if self.cursor + 1 >= self.records.len() {
            return None;
        }
        self.cursor += 1;
        self.records[self.cursor].data.as_ref()
    }

    pub fn records(&self) -> &[HistoryRecord] {
        &self.records
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }
}
