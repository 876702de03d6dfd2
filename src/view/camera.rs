//! Orbit camera for the 3D panel and pan/zoom transform for the UV panel.

use std::f64::consts::PI;

use nalgebra::{Isometry3, Matrix4, Perspective3, Point2, Point3, Vector2, Vector3};

use crate::algo::pick::Ray;

/// Orbit camera that rotates around a target point.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    /// Target point to orbit around.
    pub target: Point3<f64>,
    /// Distance from target.
    pub distance: f64,
    /// Horizontal angle (radians).
    pub azimuth: f64,
    /// Vertical angle (radians), clamped to avoid gimbal lock.
    pub elevation: f64,
    /// Vertical field of view in radians.
    pub fov: f64,
    /// Viewport width over height.
    pub aspect: f64,
    /// Near clip plane.
    pub near: f64,
    /// Far clip plane.
    pub far: f64,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            target: Point3::origin(),
            distance: 3.0,
            azimuth: 0.0,
            elevation: 0.3,
            fov: PI / 4.0,
            aspect: 1.0,
            near: 0.01,
            far: 100.0,
        }
    }
}

impl OrbitCamera {
    /// Create a new orbit camera looking at the given target from a distance.
    pub fn new(target: Point3<f64>, distance: f64) -> Self {
        Self {
            target,
            distance,
            ..Default::default()
        }
    }

    /// Camera looking at a whole bounding box.
    pub fn framing(min: &Point3<f64>, max: &Point3<f64>) -> Self {
        let mut camera = Self::default();
        camera.frame(min, max);
        camera
    }

    /// Re-target the camera on a bounding box.
    pub fn frame(&mut self, min: &Point3<f64>, max: &Point3<f64>) {
        let radius = ((max - min).norm() * 0.5).max(1e-6);
        self.target = nalgebra::center(min, max);
        self.distance = radius / (self.fov * 0.5).sin();
        self.near = self.distance * 1e-3;
        self.far = self.distance * 100.0;
        self.azimuth = 0.0;
        self.elevation = 0.3;
    }

    /// The camera's eye position in world space.
    pub fn eye(&self) -> Point3<f64> {
        let (sin_elev, cos_elev) = self.elevation.sin_cos();
        let (sin_azim, cos_azim) = self.azimuth.sin_cos();
        self.target
            + Vector3::new(cos_elev * sin_azim, sin_elev, cos_elev * cos_azim) * self.distance
    }

    /// Forward, right and up unit vectors.
    fn basis(&self) -> (Vector3<f64>, Vector3<f64>, Vector3<f64>) {
        let forward = (self.target - self.eye()).normalize();
        let right = forward.cross(&Vector3::y()).normalize();
        let up = right.cross(&forward);
        (forward, right, up)
    }

    /// The view matrix (world to camera transform).
    pub fn view_matrix(&self) -> Matrix4<f64> {
        Isometry3::look_at_rh(&self.eye(), &self.target, &Vector3::y()).to_homogeneous()
    }

    /// The projection matrix.
    pub fn projection_matrix(&self) -> Matrix4<f64> {
        Perspective3::new(self.aspect, self.fov, self.near, self.far).to_homogeneous()
    }

    /// Combined view-projection matrix.
    pub fn view_projection_matrix(&self) -> Matrix4<f64> {
        self.projection_matrix() * self.view_matrix()
    }

    /// Ray from the eye through a point in normalized device coordinates.
    pub fn ray_from_ndc(&self, ndc: &Point2<f64>) -> Ray {
        let (forward, right, up) = self.basis();
        let half = (self.fov * 0.5).tan();
        let direction = forward + right * (ndc.x * half * self.aspect) + up * (ndc.y * half);
        Ray::new(self.eye(), direction.normalize())
    }

    /// Rotate the camera by the given deltas (in radians).
    pub fn rotate(&mut self, delta_azimuth: f64, delta_elevation: f64) {
        self.azimuth += delta_azimuth;
        self.elevation += delta_elevation;

        // Clamp elevation to avoid flipping
        let limit = PI / 2.0 - 0.01;
        self.elevation = self.elevation.clamp(-limit, limit);
    }

    /// Move the target in the view plane by an NDC delta.
    pub fn translate(&mut self, delta_ndc: Vector2<f64>) {
        let (_, right, up) = self.basis();
        let half = (self.fov * 0.5).tan() * self.distance;
        self.target -= right * (delta_ndc.x * half * self.aspect) + up * (delta_ndc.y * half);
    }

    /// Zoom the camera by the given factor.
    pub fn zoom(&mut self, factor: f64) {
        self.distance = (self.distance * factor).clamp(self.near * 2.0, self.far * 0.5);
    }
}

/// Pan and zoom of the UV panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvView {
    /// UV point shown at the panel center.
    pub center: Point2<f64>,
    /// NDC units per UV unit.
    pub scale: f64,
}

impl Default for UvView {
    fn default() -> Self {
        Self {
            center: Point2::new(0.5, 0.5),
            scale: 1.8,
        }
    }
}

impl UvView {
    /// UV point under an NDC position.
    pub fn ndc_to_uv(&self, ndc: &Point2<f64>) -> Point2<f64> {
        self.center + ndc.coords / self.scale
    }

    /// NDC position of a UV point.
    pub fn uv_to_ndc(&self, uv: &Point2<f64>) -> Point2<f64> {
        Point2::from((uv - self.center) * self.scale)
    }

    /// Pan by an NDC delta so the content follows the pointer.
    pub fn pan(&mut self, delta_ndc: Vector2<f64>) {
        self.center -= delta_ndc / self.scale;
    }

    /// Zoom by `factor` keeping the UV point under `ndc` in place.
    pub fn zoom_at(&mut self, ndc: &Point2<f64>, factor: f64) {
        let anchor = self.ndc_to_uv(ndc);
        self.scale = (self.scale * factor).clamp(1e-3, 1e6);
        self.center = anchor - ndc.coords / self.scale;
    }

    /// Fit a UV bounding box into the panel.
    pub fn fit(&mut self, min: &Point2<f64>, max: &Point2<f64>) {
        let extent = (max - min).amax().max(1e-9);
        self.center = nalgebra::center(min, max);
        self.scale = 1.8 / extent;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_ray_hits_target() {
        let camera = OrbitCamera::new(Point3::new(1.0, 2.0, 3.0), 5.0);
        let ray = camera.ray_from_ndc(&Point2::origin());
        let through = ray.at(5.0);
        assert!((through - camera.target).norm() < 1e-9);
    }

    #[test]
    fn test_rotate_clamps_elevation() {
        let mut camera = OrbitCamera::default();
        camera.rotate(0.0, 10.0);
        assert!(camera.elevation < PI / 2.0);
        let eye = camera.eye();
        assert!(eye.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn test_translate_moves_target_in_view_plane() {
        let mut camera = OrbitCamera::default();
        let before = camera.eye() - camera.target;
        camera.translate(Vector2::new(0.2, -0.1));
        let after = camera.eye() - camera.target;
        assert!((before - after).norm() < 1e-12);
        assert!(camera.target.coords.norm() > 0.0);
    }

    #[test]
    fn test_frame_sees_whole_box() {
        let camera =
            OrbitCamera::framing(&Point3::new(-1.0, -1.0, -1.0), &Point3::new(1.0, 1.0, 1.0));
        assert_eq!(camera.target, Point3::origin());
        assert!(camera.distance > 3.0_f64.sqrt());
    }

    #[test]
    fn test_uv_zoom_keeps_anchor() {
        let mut view = UvView::default();
        let ndc = Point2::new(0.3, -0.4);
        let anchor = view.ndc_to_uv(&ndc);
        view.zoom_at(&ndc, 2.0);
        assert!((view.ndc_to_uv(&ndc) - anchor).norm() < 1e-12);

        let uv = Point2::new(0.1, 0.7);
        assert!((view.ndc_to_uv(&view.uv_to_ndc(&uv)) - uv).norm() < 1e-12);
    }

    #[test]
    fn test_uv_pan_follows_pointer() {
        let mut view = UvView::default();
        let uv = view.ndc_to_uv(&Point2::new(0.0, 0.0));
        view.pan(Vector2::new(0.5, 0.0));
        assert!((view.ndc_to_uv(&Point2::new(0.5, 0.0)) - uv).norm() < 1e-12);
    }
}
