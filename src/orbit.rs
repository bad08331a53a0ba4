// orbit.rs：自由视角下绕原点旋转的 3D 相机

use glam::{Mat3, Mat4, Vec3};

/// 规范姿态：沿 +Z 距离 5，看向原点。
pub const CANONICAL_DISTANCE: f32 = 5.0;
const MIN_DISTANCE: f32 = 0.5;
const MAX_DISTANCE: f32 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub target: Vec3,
    pub fov_y: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            distance: CANONICAL_DISTANCE,
            target: Vec3::ZERO,
            fov_y: 60f32.to_radians(),
            z_near: 0.1,
            z_far: 1000.0,
        }
    }
}

impl OrbitCamera {
    pub fn drag(&mut self, dx: f32, dy: f32) {
        let k = 0.005f32;
        self.yaw -= dx * k;
        self.pitch += dy * k;
        let lim = core::f32::consts::FRAC_PI_2 - 0.017;
        self.pitch = self.pitch.clamp(-lim, lim);
    }

    pub fn zoom(&mut self, scroll: f32) {
        let factor = (-scroll * 0.1).exp();
        self.distance = (self.distance * factor).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    /// yaw = pitch = 0 时位于 target + (0, 0, distance)。
    pub fn eye(&self) -> Vec3 {
        self.target
            + Vec3::new(
                self.distance * self.yaw.sin() * self.pitch.cos(),
                self.distance * self.pitch.sin(),
                self.distance * self.yaw.cos() * self.pitch.cos(),
            )
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Y)
    }

    /// 相机到世界的旋转（天空盒只需要方向）。
    pub fn rotation(&self) -> Mat3 {
        Mat3::from_mat4(self.view()).transpose()
    }

    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        let proj = Mat4::perspective_rh(self.fov_y, aspect.max(1e-3), self.z_near, self.z_far);
        proj * self.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_eye_sits_on_positive_z() {
        let cam = OrbitCamera::default();
        assert!((cam.eye() - Vec3::new(0.0, 0.0, 5.0)).length() < 1e-6);
        // 看向原点：相机 -Z 指向 target
        let fwd = cam.rotation() * Vec3::NEG_Z;
        assert!((fwd - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn zoom_is_bounded() {
        let mut cam = OrbitCamera::default();
        cam.zoom(1.0e4);
        assert_eq!(cam.distance, MIN_DISTANCE);
        cam.zoom(-1.0e4);
        assert_eq!(cam.distance, MAX_DISTANCE);
    }
}
