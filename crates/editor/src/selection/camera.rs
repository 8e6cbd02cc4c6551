use glam::{DMat4, DVec2, DVec3, DVec4};

use super::picking::Ray;

/// Pixel dimensions of the view the camera projects into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }

    /// Screen pixel coordinates to normalized device coordinates.
    pub fn to_ndc(&self, screen: DVec2) -> DVec2 {
        DVec2::new(
            screen.x / self.width * 2.0 - 1.0,
            -(screen.y / self.height * 2.0 - 1.0),
        )
    }
}

/// Orbit camera over the ground plane.
#[derive(Debug, Clone, Copy)]
pub struct OrbitCamera {
    /// Horizontal rotation angle (radians)
    pub yaw: f64,
    /// Vertical rotation angle (radians)
    pub pitch: f64,
    /// Distance from target
    pub distance: f64,
    /// Camera target point
    pub target: DVec3,
    /// Vertical field of view (radians)
    pub fov: f64,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl OrbitCamera {
    pub fn new() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.9,
            distance: 120.0,
            target: DVec3::ZERO,
            fov: 45.0_f64.to_radians(),
        }
    }

    pub fn rotate(&mut self, dx: f64, dy: f64) {
        self.yaw += dx.to_radians();
        self.pitch = (self.pitch + dy.to_radians()).clamp(-1.5, 1.5);
    }

    pub fn zoom(&mut self, delta: f64) {
        self.distance = (self.distance * (1.0 - delta)).clamp(1.0, 5000.0);
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        let right = self.right_vector();
        let up = self.up_vector();
        self.target += right * dx + up * dy;
    }

    /// Camera position in world space
    pub fn eye_position(&self) -> DVec3 {
        let cy = self.yaw.cos();
        let sy = self.yaw.sin();
        let cp = self.pitch.cos();
        let sp = self.pitch.sin();

        self.target
            + DVec3::new(
                self.distance * cp * sy,
                self.distance * sp,
                self.distance * cp * cy,
            )
    }

    /// View matrix (world -> camera)
    pub fn view_matrix(&self) -> DMat4 {
        DMat4::look_at_rh(self.eye_position(), self.target, DVec3::Y)
    }

    /// Projection matrix (camera -> clip)
    pub fn projection_matrix(&self, aspect: f64) -> DMat4 {
        DMat4::perspective_rh_gl(self.fov, aspect, 0.1, 10_000.0)
    }

    pub fn view_projection(&self, aspect: f64) -> DMat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }

    /// Unproject a point in normalized device coordinates back to world
    /// space.
    pub fn unproject(&self, ndc: DVec3, viewport: Viewport) -> DVec3 {
        let vp_inv = self.view_projection(viewport.aspect()).inverse();
        let world = vp_inv * DVec4::new(ndc.x, ndc.y, ndc.z, 1.0);
        world.truncate() / world.w
    }

    /// Cast a ray from a screen position into the scene.
    pub fn screen_ray(&self, screen: DVec2, viewport: Viewport) -> Ray {
        let ndc = viewport.to_ndc(screen);
        let near = self.unproject(DVec3::new(ndc.x, ndc.y, -1.0), viewport);
        let far = self.unproject(DVec3::new(ndc.x, ndc.y, 1.0), viewport);
        Ray {
            origin: near,
            direction: (far - near).normalize_or_zero(),
        }
    }

    fn right_vector(&self) -> DVec3 {
        let fwd = (self.target - self.eye_position()).normalize_or_zero();
        fwd.cross(DVec3::Y).normalize_or_zero()
    }

    fn up_vector(&self) -> DVec3 {
        let fwd = (self.target - self.eye_position()).normalize_or_zero();
        self.right_vector().cross(fwd).normalize_or_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_center_ray_hits_target() {
        let camera = OrbitCamera::new();
        let viewport = Viewport::new(800.0, 600.0);
        let ray = camera.screen_ray(DVec2::new(400.0, 300.0), viewport);

        // The center ray runs from the eye through the target.
        let to_target = (camera.target - ray.origin).normalize_or_zero();
        assert!(ray.direction.dot(to_target) > 0.999);
    }

    #[test]
    fn test_unproject_near_plane_in_front_of_eye() {
        let camera = OrbitCamera::new();
        let viewport = Viewport::new(800.0, 600.0);
        let near = camera.unproject(DVec3::new(0.0, 0.0, -1.0), viewport);
        let eye = camera.eye_position();
        let fwd = (camera.target - eye).normalize_or_zero();
        assert!((near - eye).dot(fwd) > 0.0);
        assert!(near.distance(eye) < 1.0);
    }
}
