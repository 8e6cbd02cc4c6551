//! Tuning constants for road and junction geometry.

/// Default lane width in meters.
pub const LANE_WIDTH: f64 = 3.5;

/// Narrowest editable lane width in meters.
pub const MIN_LANE_WIDTH: f64 = 0.4;

/// Widest editable lane width in meters.
pub const MAX_LANE_WIDTH: f64 = 99.0;

/// Catmull-Rom tension for road reference curves.
pub const CURVE_TENSION: f64 = 0.5;

/// Default sampling segment count for short curves.
pub const CURVE_SEGMENT: usize = 20;

/// Ratio of endpoint distance used to place bezier control points
/// for junction edges and lane links.
pub const JUNCTION_BCP_RATIO: f64 = 0.5;

/// Segment count for each bezier edge of a junction area. Must be even
/// so the edge midpoint falls on a sample.
pub const JUNCTION_EDGE_SEGMENT: usize = 30;

/// Segment count for a lane-link connecting curve.
pub const LANE_LINK_SEGMENT: usize = 20;

/// Number of control-point intervals on a transition tween. Must be even.
pub const TWEEN_CONTROL_POINT_SEGMENT: usize = 10;

/// Exponent biasing the tween offset ramp. A quarter power keeps the
/// blend flat near the narrow end and steep in the middle.
pub const TWEEN_CONTROL_POINT_EXPONENT: f64 = 0.25;

/// Default sample segment count for a transition boundary.
pub const TWEEN_SAMPLE_SEGMENT: usize = 20;

/// Millimeter-scale deviation treated as coincident.
pub const MM_DEVIATION: f64 = 0.001;

/// How many history records keep their full snapshot data.
pub const MAX_STORAGE_COUNT: usize = 40;

/// Sampling segment count for a section of the given length in meters.
pub fn segment_count_for_length(length: f64) -> usize {
    if length <= 50.0 {
        20
    } else if length <= 100.0 {
        30
    } else if length <= 300.0 {
        40
    } else {
        (length / 10.0).floor() as usize + 1
    }
}
