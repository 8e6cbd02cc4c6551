//! Road-network map editing engine.
//!
//! The engine is a headless library: a geometry kernel over Catmull-Rom
//! and bezier curves, id-indexed arenas for roads and junctions, a
//! screen-space selection engine and a snapshot-based undo history, all
//! driven through the [`MapEditor`] command surface. Rendering and
//! persistence sit outside; the engine exposes sample points and plain
//! vertex/index arrays.

pub mod constants;
pub mod error;
pub mod events;
pub mod fixtures;
pub mod geometry;
pub mod harness;
pub mod modes;
pub mod selection;
pub mod state;

pub use error::EditError;
pub use events::ChangeSet;
pub use harness::MapEditor;
pub use modes::{ModeId, PickCategory};
pub use state::history::{HistoryRecord, HistoryStore, MapSnapshot};
pub use state::interaction::{InteractionSet, LinkPickOutcome};
pub use state::junction::{ht_role, HtRole, JunctionState};
pub use state::road::{ElevationOp, RoadState};
pub use state::EditingSession;
