// unwrap.rs：胶片展开投影（逐像素重采样）
//
// CPU 实现与 shaders/unwrap.wgsl 使用同一组公式；CPU 版本用于导出和测试。

use crate::equirect::{normalize_direction, unwrap_dir_to_uv, unwrap_lon_lat, LonLat};
use crate::error::FilmError;
use crate::film::{clamp_extent, MIN_EXTENT};
use crate::texture::EnvironmentTexture;
use glam::{Mat3, Vec2, Vec3};
use image::{Rgba, RgbaImage};
use std::f32::consts::{PI, TAU};

/// 经纬网格间距：15°
pub const GRID_SPACING: f32 = PI / 12.0;
pub const GRID_THRESHOLD: f32 = 0.02;
pub const GRID_COLOR: Vec3 = Vec3::new(1.0, 0.85, 0.2);
pub const GRID_BLEND: f32 = 0.5;

/// GLSL 语义的 fract：x - floor(x)，负数也落在 [0, 1)。
pub fn fract(x: f32) -> f32 {
    x - x.floor()
}

/// 展开用的圆柱采样面，与 3D 胶片参数相互独立。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnwrapParameters {
    pub radius: f32,
    pub length: f32,
    pub offset: f32,
    pub cut_offset: f32,
    pub mirror: bool,
    pub show_grid: bool,
}

impl Default for UnwrapParameters {
    fn default() -> Self {
        Self {
            radius: 1.0,
            length: 2.0,
            offset: 0.5,
            cut_offset: 0.0,
            mirror: false,
            show_grid: false,
        }
    }
}

impl UnwrapParameters {
    /// 半径和长度夹到正数下限；cut_offset 折回 [0, 1)。
    pub fn sanitized(&self) -> UnwrapParameters {
        let mut issues = Vec::new();
        let out = UnwrapParameters {
            radius: clamp_extent("unwrap.radius", self.radius, &mut issues),
            length: clamp_extent("unwrap.length", self.length, &mut issues),
            offset: if self.offset.is_finite() { self.offset } else { 0.0 },
            cut_offset: if self.cut_offset.is_finite() {
                fract(self.cut_offset)
            } else {
                0.0
            },
            ..*self
        };
        for e in &issues {
            log::warn!("{}", e);
        }
        out
    }

    /// 展开图每像素对应的角度（度），只读诊断值。
    pub fn angular_resolution(&self, width_px: u32, height_px: u32) -> AngularResolution {
        let r = self.radius.max(MIN_EXTENT);
        let len = self.length.max(MIN_EXTENT);
        let span = ((self.offset + len) / r).atan() - (self.offset / r).atan();
        AngularResolution {
            horizontal_deg_per_px: 360.0 / width_px.max(1) as f32,
            vertical_deg_per_px: span.to_degrees() / height_px.max(1) as f32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngularResolution {
    pub horizontal_deg_per_px: f32,
    pub vertical_deg_per_px: f32,
}

/// 单个展开像素的采样结果。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnwrapSample {
    pub theta: f32,
    pub point: Vec3,
    pub dir: Vec3,
    pub uv: Vec2,
    pub lon_lat: LonLat,
}

/// 相机局部空间中圆柱采样面上的点 P 以及对应的 θ。
pub fn unwrap_point(x: f32, y: f32, params: &UnwrapParameters) -> (f32, Vec3) {
    let x_coord = if params.mirror { 1.0 - x } else { x };
    let theta = fract(x_coord + params.cut_offset) * TAU;
    let h = y * params.length;
    let (sin_t, cos_t) = theta.sin_cos();
    (
        theta,
        Vec3::new(params.radius * cos_t, params.radius * sin_t, params.offset + h),
    )
}

/// 展开图坐标 (x, y) -> 环境贴图 uv。P 退化为零向量时没有方向可言。
pub fn unwrap_sample(
    x: f32,
    y: f32,
    params: &UnwrapParameters,
    camera_rotation: Mat3,
) -> Result<UnwrapSample, FilmError> {
    let (theta, point) = unwrap_point(x, y, params);
    let dir =
        normalize_direction(camera_rotation * point).ok_or(FilmError::DegenerateSampleDirection)?;
    Ok(UnwrapSample {
        theta,
        point,
        dir,
        uv: unwrap_dir_to_uv(dir),
        lon_lat: unwrap_lon_lat(dir),
    })
}

/// 经纬网格叠加：距离网格中线小于阈值时向高亮色混合。
pub fn apply_grid(color: Vec3, lon_lat: LonLat) -> Vec3 {
    let grid_lon = (fract(lon_lat.lon / GRID_SPACING) - 0.5).abs();
    let grid_lat = (fract(lon_lat.lat / GRID_SPACING) - 0.5).abs();
    if grid_lon < GRID_THRESHOLD || grid_lat < GRID_THRESHOLD {
        color.lerp(GRID_COLOR, GRID_BLEND)
    } else {
        color
    }
}

/// 单个像素的最终颜色；退化方向输出黑色。
pub fn shade_unwrap_pixel(
    x: f32,
    y: f32,
    params: &UnwrapParameters,
    camera_rotation: Mat3,
    env: &EnvironmentTexture,
) -> Vec3 {
    let Ok(sample) = unwrap_sample(x, y, params, camera_rotation) else {
        return Vec3::ZERO;
    };
    let color = env.sample(sample.uv);
    if params.show_grid {
        apply_grid(color, sample.lon_lat)
    } else {
        color
    }
}

/// 在 CPU 上渲染整张展开图。第 0 行对应 y 接近 1，与屏幕上的方向一致。
pub fn render_unwrap(
    env: &EnvironmentTexture,
    params: &UnwrapParameters,
    camera_rotation: Mat3,
    width: u32,
    height: u32,
) -> RgbaImage {
    let params = params.sanitized();
    let (w, h) = (width.max(1), height.max(1));
    RgbaImage::from_fn(w, h, |px, py| {
        let x = (px as f32 + 0.5) / w as f32;
        let y = 1.0 - (py as f32 + 0.5) / h as f32;
        let c = shade_unwrap_pixel(x, y, &params, camera_rotation, env).clamp(Vec3::ZERO, Vec3::ONE);
        Rgba([
            (c.x * 255.0).round() as u8,
            (c.y * 255.0).round() as u8,
            (c.z * 255.0).round() as u8,
            255,
        ])
    })
}
