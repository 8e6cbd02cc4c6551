//! Screen-space selection: a camera to cast rays and frusta through, a
//! box-selection state machine over candidate points and single-object
//! hit picking.

mod box_select;
mod camera;
mod frustum;
mod picking;

pub use box_select::{CandidatePoint, SelectionBox};
pub use camera::{OrbitCamera, Viewport};
pub use frustum::Frustum;
pub use picking::{pick_nearest, ray_aabb, ray_triangle_intersect, Aabb, PickTarget, Ray};
