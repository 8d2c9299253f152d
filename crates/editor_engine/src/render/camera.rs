//! # 3D Camera
//!
//! Camera abstraction with proper matrix mathematics for a Vulkan-style
//! Y-down normalized device space.
//!
//! ## Design Principles
//! - **Library-agnostic**: no graphics API types in the camera math
//! - **Immutable operation**: matrix getters never modify camera state
//! - **Viewport mapping**: world ↔ screen conversions live here so the
//!   manipulators and the renderer agree on one convention

use crate::foundation::math::{utils, Mat4, Mat4Ext, Quat, Vec2, Vec3, Vec4};

/// A ray in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Ray origin.
    pub origin: Vec3,
    /// Normalized ray direction.
    pub direction: Vec3,
}

impl Ray {
    /// Create a ray from an origin and a direction.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Point at parameter `t` along the ray.
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// 3D camera for perspective projection.
///
/// Uses a right-handed Y-up world space. The projection maps into a Y-down
/// normalized device space, so screen pixel coordinates grow rightward and
/// downward — the same convention the mouse reports positions in.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Camera position in world space.
    pub position: Vec3,

    /// Point the camera is looking at in world space.
    pub target: Vec3,

    /// Up hint for camera orientation (typically `[0, 1, 0]`).
    pub up: Vec3,

    /// Vertical field of view in radians.
    pub fov: f32,

    /// Aspect ratio (width / height).
    pub aspect: f32,

    /// Distance to the near clipping plane.
    pub near: f32,

    /// Distance to the far clipping plane.
    pub far: f32,
}

impl Camera {
    /// Create a perspective camera looking at the origin.
    pub fn perspective(position: Vec3, fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position,
            target: Vec3::zeros(),
            up: Vec3::new(0.0, 1.0, 0.0),
            fov: utils::deg_to_rad(fov_degrees),
            aspect,
            near,
            far,
        }
    }

    /// Update camera position in world space.
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        log::trace!("camera position updated to {position:?}");
    }

    /// Configure the camera to look at a specific point.
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        self.target = target;
        self.up = up;
    }

    /// Normalized view direction.
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize()
    }

    /// Normalized right axis of the camera frame.
    pub fn right(&self) -> Vec3 {
        self.forward().cross(&self.up).normalize()
    }

    /// Orthonormal up axis of the camera frame.
    pub fn up_vector(&self) -> Vec3 {
        self.right().cross(&self.forward())
    }

    /// Translate along the view direction (fly forward/backward).
    pub fn move_forward(&mut self, distance: f32) {
        let offset = self.forward() * distance;
        self.position += offset;
        self.target += offset;
    }

    /// Translate along the right axis (strafe).
    pub fn pan(&mut self, distance: f32) {
        let offset = self.right() * distance;
        self.position += offset;
        self.target += offset;
    }

    /// Rotate the view direction around the world up axis.
    pub fn yaw(&mut self, degrees: f32) {
        let rotation = Quat::from_axis_angle(&Vec3::y_axis(), utils::deg_to_rad(degrees));
        let offset = self.target - self.position;
        self.target = self.position + rotation * offset;
    }

    /// Rotate the view direction around the camera's right axis.
    pub fn pitch(&mut self, degrees: f32) {
        let axis = nalgebra::Unit::new_normalize(self.right());
        let rotation = Quat::from_axis_angle(&axis, utils::deg_to_rad(degrees));
        let offset = self.target - self.position;
        self.target = self.position + rotation * offset;
    }

    /// View matrix for the world-to-camera transformation.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at(self.position, self.target, self.up)
    }

    /// Perspective projection matrix mapping depth to `[0, 1]`.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective(self.fov, self.aspect, self.near, self.far)
    }

    /// Combined view-projection matrix: `P × X × V`, where `X` converts the
    /// Y-up view space into the projection's Y-down convention.
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * Mat4::vulkan_coordinate_transform() * self.view_matrix()
    }

    /// Project a world point into viewport pixel coordinates.
    ///
    /// Returns `(x_px, y_px, depth)` where pixels grow rightward and
    /// downward from the top-left viewport corner.
    pub fn world_to_screen(&self, point: Vec3, viewport: (u32, u32)) -> Vec3 {
        let clip = self.view_projection_matrix() * Vec4::new(point.x, point.y, point.z, 1.0);
        let ndc = clip.xyz() / clip.w;
        Vec3::new(
            (ndc.x + 1.0) * 0.5 * viewport.0 as f32,
            (ndc.y + 1.0) * 0.5 * viewport.1 as f32,
            ndc.z,
        )
    }

    /// Cast a world-space ray through a viewport pixel.
    ///
    /// `pixel` is in viewport coordinates (top-left origin, Y down). The ray
    /// originates at the camera position and points into the scene.
    pub fn screen_ray(&self, pixel: Vec2, viewport: (u32, u32)) -> Ray {
        let ndc_x = pixel.x / viewport.0 as f32 * 2.0 - 1.0;
        let ndc_y = pixel.y / viewport.1 as f32 * 2.0 - 1.0;

        let inv_view_proj = self
            .view_projection_matrix()
            .try_inverse()
            .expect("view-projection matrix is invertible for a valid camera");

        // Unproject a point on the near plane and one on the far plane.
        let near_h = inv_view_proj * Vec4::new(ndc_x, ndc_y, 0.0, 1.0);
        let far_h = inv_view_proj * Vec4::new(ndc_x, ndc_y, 1.0, 1.0);
        let near = near_h.xyz() / near_h.w;
        let far = far_h.xyz() / far_h.w;

        Ray::new(self.position, (far - near).normalize())
    }
}

impl Default for Camera {
    /// Perspective camera above and behind the origin, looking at the scene
    /// center.
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 3.0, 3.0),
            target: Vec3::zeros(),
            up: Vec3::new(0.0, 1.0, 0.0),
            fov: std::f32::consts::FRAC_PI_4,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn test_camera() -> Camera {
        let mut camera = Camera::perspective(Vec3::new(0.0, 0.0, 10.0), 60.0, 1.0, 0.1, 100.0);
        camera.look_at(Vec3::zeros(), Vec3::new(0.0, 1.0, 0.0));
        camera
    }

    #[test]
    fn test_basis_is_orthonormal() {
        let camera = test_camera();
        let (f, r, u) = (camera.forward(), camera.right(), camera.up_vector());
        assert_relative_eq!(f.dot(&r), 0.0, epsilon = 1e-6);
        assert_relative_eq!(f.dot(&u), 0.0, epsilon = 1e-6);
        assert_relative_eq!(r.dot(&u), 0.0, epsilon = 1e-6);
        assert_relative_eq!(r.norm(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_center_projects_to_viewport_center() {
        let camera = test_camera();
        let screen = camera.world_to_screen(Vec3::zeros(), (800, 600));
        assert_relative_eq!(screen.x, 400.0, epsilon = 1e-3);
        assert_relative_eq!(screen.y, 300.0, epsilon = 1e-3);
    }

    #[test]
    fn test_world_up_projects_above_center() {
        let camera = test_camera();
        let center = camera.world_to_screen(Vec3::zeros(), (800, 600));
        let above = camera.world_to_screen(Vec3::new(0.0, 1.0, 0.0), (800, 600));
        // Screen Y grows downward, so a higher world point lands at smaller Y.
        assert!(above.y < center.y);
        let right = camera.world_to_screen(Vec3::new(1.0, 0.0, 0.0), (800, 600));
        assert!(right.x > center.x);
    }

    #[test]
    fn test_screen_ray_through_center_hits_target() {
        let camera = test_camera();
        let ray = camera.screen_ray(Vec2::new(400.0, 300.0), (800, 600));
        assert_relative_eq!(ray.origin, camera.position, epsilon = 1e-5);
        assert_relative_eq!(ray.direction, camera.forward(), epsilon = 1e-4);
    }

    #[test]
    fn test_screen_ray_round_trips_projection() {
        let camera = test_camera();
        let world = Vec3::new(1.5, -0.75, 2.0);
        let screen = camera.world_to_screen(world, (800, 600));
        let ray = camera.screen_ray(Vec2::new(screen.x, screen.y), (800, 600));
        // The ray must pass through the original world point.
        let t = (world - ray.origin).dot(&ray.direction);
        assert_relative_eq!(ray.at(t), world, epsilon = 1e-3);
    }

    #[test]
    fn test_move_forward_keeps_direction() {
        let mut camera = test_camera();
        let before = camera.forward();
        camera.move_forward(2.5);
        assert_relative_eq!(camera.forward(), before, epsilon = 1e-6);
        assert_relative_eq!(camera.position, Vec3::new(0.0, 0.0, 7.5), epsilon = 1e-5);
    }

    #[test]
    fn test_yaw_rotates_about_world_up() {
        let mut camera = test_camera();
        camera.yaw(90.0);
        // Looking from +Z toward origin, a 90 degree yaw swings the view
        // direction onto the X axis.
        assert_relative_eq!(camera.forward().y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(camera.forward().norm(), 1.0, epsilon = 1e-5);
    }
}
