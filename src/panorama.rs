// panorama.rs：针孔处的第一人称视角（yaw / pitch / fov）

use glam::{Mat3, Mat4, Vec3};

pub const DEFAULT_FOV_DEG: f32 = 60.0;
pub const MIN_FOV_DEG: f32 = 5.0;
pub const MAX_FOV_DEG: f32 = 150.0;
pub const Z_NEAR: f32 = 0.01;
pub const Z_FAR: f32 = 1000.0;

/// 每帧由输入层产出的相机姿态，核心只读。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub rotation: Mat3,
    pub fov_y: f32,
}

impl CameraPose {
    /// 视线方向（相机看向 -Z）。
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// 相机位于原点，视图矩阵就是旋转的逆。
    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        let view = Mat4::from_mat3(self.rotation.transpose());
        let proj = Mat4::perspective_rh(self.fov_y, aspect.max(1e-3), Z_NEAR, Z_FAR);
        proj * view
    }
}

pub struct PanoramaCamera {
    pub yaw: f32,
    pub pitch: f32,
    pub fov: f32,
    pub sensitivity_scale: f32,
}

impl Default for PanoramaCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl PanoramaCamera {
    pub fn new() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            fov: DEFAULT_FOV_DEG,
            sensitivity_scale: 1.0,
        }
    }

    pub fn reset(&mut self) {
        let sensitivity = self.sensitivity_scale;
        *self = Self::new();
        self.sensitivity_scale = sensitivity;
    }

    /// 鼠标拖动：按当前视场角换算每像素对应的角度，保证拖动跟手。
    pub fn drag(&mut self, dx: f32, dy: f32, viewport_w: f32, viewport_h: f32) {
        if viewport_w <= 0.0 || viewport_h <= 0.0 {
            return;
        }
        let v_f = self.fov.to_radians();
        let aspect = viewport_w / viewport_h;
        let h_f = 2.0 * ((v_f / 2.0).tan() * aspect).atan();

        let yaw_per_px_deg = (h_f / viewport_w).to_degrees();
        let pitch_per_px_deg = (v_f / viewport_h).to_degrees();

        self.yaw += dx * yaw_per_px_deg * self.sensitivity_scale;
        self.pitch = (self.pitch + dy * pitch_per_px_deg * self.sensitivity_scale)
            .clamp(-89.9, 89.9);
    }

    pub fn zoom(&mut self, scroll: f32) {
        self.fov = (self.fov - scroll * 2.5).clamp(MIN_FOV_DEG, MAX_FOV_DEG);
    }

    /// R = Ry(yaw) * Rx(pitch)
    pub fn pose(&self) -> CameraPose {
        let rotation = Mat3::from_rotation_y(self.yaw.to_radians())
            * Mat3::from_rotation_x(self.pitch.to_radians());
        CameraPose {
            rotation,
            fov_y: self.fov.clamp(MIN_FOV_DEG, MAX_FOV_DEG).to_radians(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pose_is_identity() {
        let pose = PanoramaCamera::new().pose();
        assert!(pose.rotation.abs_diff_eq(Mat3::IDENTITY, 1e-6));
        assert!((pose.forward() - Vec3::NEG_Z).length() < 1e-6);
    }

    #[test]
    fn pitch_is_clamped_short_of_the_pole() {
        let mut cam = PanoramaCamera::new();
        cam.drag(0.0, 1.0e6, 800.0, 600.0);
        assert_eq!(cam.pitch, 89.9);
    }

    #[test]
    fn rotation_stays_orthonormal() {
        let mut cam = PanoramaCamera::new();
        cam.yaw = 37.0;
        cam.pitch = -21.0;
        let r = cam.pose().rotation;
        assert!((r * r.transpose()).abs_diff_eq(Mat3::IDENTITY, 1e-5));
    }
}
