//! Editing modes and what each mode is allowed to pick.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModeId {
    #[default]
    Road,
    Junction,
    LaneWidth,
    LaneNumber,
    Elevation,
    Link,
}

impl ModeId {
    pub const ALL: [ModeId; 6] = [
        ModeId::Road,
        ModeId::Junction,
        ModeId::LaneWidth,
        ModeId::LaneNumber,
        ModeId::Elevation,
        ModeId::Link,
    ];

    /// Human-readable mode name, also used as the history title when a
    /// mode switch is recorded.
    pub fn title(&self) -> &'static str {
        match self {
            ModeId::Road => "road",
            ModeId::Junction => "junction",
            ModeId::LaneWidth => "lane width",
            ModeId::LaneNumber => "lane number",
            ModeId::Elevation => "elevation",
            ModeId::Link => "lane link",
        }
    }

    /// Entity categories this mode reacts to. Picks on anything else
    /// fall through.
    pub fn pick_categories(&self) -> &'static [PickCategory] {
        match self {
            ModeId::Road => &[PickCategory::ControlPoint, PickCategory::RoadSurface],
            ModeId::Junction => &[PickCategory::JunctionArea],
            ModeId::LaneWidth | ModeId::LaneNumber => &[PickCategory::LaneSurface],
            ModeId::Elevation => &[PickCategory::ElevationPoint, PickCategory::RoadSurface],
            ModeId::Link => &[
                PickCategory::HtPoint,
                PickCategory::LaneLinkCurve,
                PickCategory::JunctionArea,
            ],
        }
    }
}

/// What kind of scene entity a ray hit resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PickCategory {
    ControlPoint,
    RoadSurface,
    LaneSurface,
    JunctionArea,
    ElevationPoint,
    HtPoint,
    LaneLinkCurve,
}
