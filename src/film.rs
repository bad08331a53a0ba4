// film.rs：胶片参数与几何构建（平面 / 圆柱）
//
// 旋转策略：参数快照里保存的是绝对姿态，每次重建都在形状的基础朝向上
// 重新施加一次，不做累加。相同参数重建多次结果完全一致。

use crate::error::FilmError;
use glam::{Affine3A, Quat, Vec3};
use std::f32::consts::{FRAC_PI_2, PI, TAU};

/// 宽、高、半径等尺寸的下限，避免零面积几何体。
pub const MIN_EXTENT: f32 = 1e-3;

pub const PLANE_SEGMENTS: usize = 128;
pub const CYLINDER_RADIAL_SEGMENTS: usize = 256;
pub const CYLINDER_HEIGHT_SEGMENTS: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilmShape {
    Plane {
        width: f32,
        height: f32,
    },
    Cylinder {
        radius: f32,
        theta_start: f32,
        theta_length: f32,
        height: f32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilmKind {
    Plane,
    Cylinder,
}

impl FilmShape {
    pub fn kind(&self) -> FilmKind {
        match self {
            FilmShape::Plane { .. } => FilmKind::Plane,
            FilmShape::Cylinder { .. } => FilmKind::Cylinder,
        }
    }

    pub fn default_plane() -> Self {
        FilmShape::Plane {
            width: 2.0,
            height: 1.5,
        }
    }

    pub fn default_cylinder() -> Self {
        FilmShape::Cylinder {
            radius: 2.0,
            theta_start: -FRAC_PI_2,
            theta_length: PI,
            height: 1.5,
        }
    }

    /// 把尺寸夹到合法范围；每次夹取都返回一条 InvalidGeometryParameter。
    pub fn clamped(&self) -> (FilmShape, Vec<FilmError>) {
        let mut issues = Vec::new();
        let shape = match *self {
            FilmShape::Plane { width, height } => FilmShape::Plane {
                width: clamp_extent("width", width, &mut issues),
                height: clamp_extent("height", height, &mut issues),
            },
            FilmShape::Cylinder {
                radius,
                theta_start,
                theta_length,
                height,
            } => {
                let theta_length = clamp_extent("theta_length", theta_length, &mut issues);
                FilmShape::Cylinder {
                    radius: clamp_extent("radius", radius, &mut issues),
                    theta_start: if theta_start.is_finite() { theta_start } else { 0.0 },
                    theta_length: theta_length.min(TAU),
                    height: clamp_extent("height", height, &mut issues),
                }
            }
        };
        (shape, issues)
    }
}

pub(crate) fn clamp_extent(name: &'static str, value: f32, issues: &mut Vec<FilmError>) -> f32 {
    if value.is_finite() && value >= MIN_EXTENT {
        return value;
    }
    issues.push(FilmError::InvalidGeometryParameter {
        name,
        value,
        min: MIN_EXTENT,
    });
    MIN_EXTENT
}

/// 控件端同时记住两种形状最近一次的取值，切换类型时恢复。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilmShapes {
    pub kind: FilmKind,
    pub plane: FilmShape,
    pub cylinder: FilmShape,
}

impl FilmShapes {
    pub fn from_shape(shape: FilmShape) -> Self {
        let mut shapes = Self {
            kind: shape.kind(),
            plane: FilmShape::default_plane(),
            cylinder: FilmShape::default_cylinder(),
        };
        *shapes.active_mut() = shape;
        shapes
    }

    pub fn active(&self) -> FilmShape {
        match self.kind {
            FilmKind::Plane => self.plane,
            FilmKind::Cylinder => self.cylinder,
        }
    }

    pub fn active_mut(&mut self) -> &mut FilmShape {
        match self.kind {
            FilmKind::Plane => &mut self.plane,
            FilmKind::Cylinder => &mut self.cylinder,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FilmPose {
    pub rot_x: f32,
    pub rot_y: f32,
    pub rot_z: f32,
    pub offset: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilmParameters {
    pub shape: FilmShape,
    pub pose: FilmPose,
}

impl Default for FilmParameters {
    fn default() -> Self {
        Self {
            shape: FilmShape::default_plane(),
            // 平面默认放在针孔正前方 2 个单位处
            pose: FilmPose {
                offset: Vec3::new(0.0, 0.0, -2.0),
                ..Default::default()
            },
        }
    }
}

/// 胶片表面：局部空间顶点 + 三角形索引 + 姿态。
/// 每次参数变化整体替换，从不原地修改。
#[derive(Debug, Clone, PartialEq)]
pub struct FilmSurface {
    pub kind: FilmKind,
    pub positions: Vec<Vec3>,
    pub indices: Vec<u32>,
    pub transform: Affine3A,
}

impl FilmSurface {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn to_world(&self, local: Vec3) -> Vec3 {
        self.transform.transform_point3(local)
    }

    pub fn world_positions(&self) -> Vec<Vec3> {
        self.positions.iter().map(|p| self.to_world(*p)).collect()
    }
}

/// 根据参数快照构建胶片表面。参数越界时夹取并记录 warn，不会失败。
pub fn build_film_surface(params: &FilmParameters) -> FilmSurface {
    let (shape, issues) = params.shape.clamped();
    for e in &issues {
        log::warn!("{}", e);
    }

    let pose = &params.pose;
    match shape {
        FilmShape::Plane { width, height } => {
            let (positions, indices) = plane_grid(width, height, PLANE_SEGMENTS, PLANE_SEGMENTS);
            // 平面：网格在原点，整体平移到 offset
            let rotation = pose_rotation(0.0, pose);
            FilmSurface {
                kind: FilmKind::Plane,
                positions,
                indices,
                transform: Affine3A::from_rotation_translation(rotation, pose.offset),
            }
        }
        FilmShape::Cylinder {
            radius,
            theta_start,
            theta_length,
            height,
        } => {
            let (mut positions, indices) = cylinder_shell(
                radius,
                height,
                theta_start,
                theta_length,
                CYLINDER_RADIAL_SEGMENTS,
                CYLINDER_HEIGHT_SEGMENTS,
            );
            // 圆柱：平移作用在几何体上（旋转之前），底边抬到 dy + h/2
            let shift = Vec3::new(pose.offset.x, pose.offset.y + height / 2.0, pose.offset.z);
            for p in &mut positions {
                *p += shift;
            }
            // 基础朝向：绕 X 轴 90°，让圆柱轴线对准针孔前方 (Z)
            let rotation = pose_rotation(FRAC_PI_2, pose);
            FilmSurface {
                kind: FilmKind::Cylinder,
                positions,
                indices,
                transform: Affine3A::from_quat(rotation),
            }
        }
    }
}

/// 欧拉角 XYZ：R = Rx(base_x + rot_x) * Ry(rot_y) * Rz(rot_z)
fn pose_rotation(base_x: f32, pose: &FilmPose) -> Quat {
    Quat::from_rotation_x(base_x + pose.rot_x)
        * Quat::from_rotation_y(pose.rot_y)
        * Quat::from_rotation_z(pose.rot_z)
}

/// XY 平面上的网格，行从 +h/2 到 -h/2，列从 -w/2 到 +w/2。
fn plane_grid(width: f32, height: f32, seg_x: usize, seg_y: usize) -> (Vec<Vec3>, Vec<u32>) {
    let cols = seg_x + 1;
    let rows = seg_y + 1;
    let mut positions = Vec::with_capacity(cols * rows);
    let mut indices = Vec::with_capacity(seg_x * seg_y * 6);

    let half_w = width / 2.0;
    let half_h = height / 2.0;
    let step_w = width / seg_x as f32;
    let step_h = height / seg_y as f32;

    for iy in 0..rows {
        let y = iy as f32 * step_h - half_h;
        for ix in 0..cols {
            let x = ix as f32 * step_w - half_w;
            positions.push(Vec3::new(x, -y, 0.0));
        }
    }

    for iy in 0..seg_y {
        for ix in 0..seg_x {
            let a = (ix + cols * iy) as u32;
            let b = (ix + cols * (iy + 1)) as u32;
            let c = (ix + 1 + cols * (iy + 1)) as u32;
            let d = (ix + 1 + cols * iy) as u32;
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    (positions, indices)
}

/// 开口圆柱壳：顶点 (r·sinθ, y, r·cosθ)，行从 +h/2 到 -h/2。
fn cylinder_shell(
    radius: f32,
    height: f32,
    theta_start: f32,
    theta_length: f32,
    radial: usize,
    height_segments: usize,
) -> (Vec<Vec3>, Vec<u32>) {
    let cols = radial + 1;
    let mut positions = Vec::with_capacity(cols * (height_segments + 1));
    let mut indices = Vec::with_capacity(radial * height_segments * 6);
    let half_h = height / 2.0;

    for y in 0..=height_segments {
        let v = y as f32 / height_segments as f32;
        let py = -v * height + half_h;
        for x in 0..=radial {
            let u = x as f32 / radial as f32;
            let theta = u * theta_length + theta_start;
            let (sin_t, cos_t) = theta.sin_cos();
            positions.push(Vec3::new(radius * sin_t, py, radius * cos_t));
        }
    }

    for y in 0..height_segments {
        for x in 0..radial {
            let a = (y * cols + x) as u32;
            let b = ((y + 1) * cols + x) as u32;
            let c = ((y + 1) * cols + x + 1) as u32;
            let d = (y * cols + x + 1) as u32;
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    (positions, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_grid_is_centered() {
        let surface = build_film_surface(&FilmParameters {
            shape: FilmShape::Plane { width: 2.0, height: 1.0 },
            pose: FilmPose::default(),
        });
        assert_eq!(surface.positions[0], Vec3::new(-1.0, 0.5, 0.0));
        let last = *surface.positions.last().unwrap();
        assert!((last - Vec3::new(1.0, -0.5, 0.0)).length() < 1e-5);
        assert_eq!(surface.indices.len(), PLANE_SEGMENTS * PLANE_SEGMENTS * 6);
    }

    #[test]
    fn cylinder_axis_points_along_z() {
        let surface = build_film_surface(&FilmParameters {
            shape: FilmShape::Cylinder {
                radius: 1.0,
                theta_start: 0.0,
                theta_length: TAU,
                height: 2.0,
            },
            pose: FilmPose::default(),
        });
        // 圆柱上的所有点到 Z 轴的距离都等于半径
        for p in surface.world_positions() {
            let r = (p.x * p.x + p.y * p.y).sqrt();
            assert!((r - 1.0).abs() < 1e-4, "{p:?}");
        }
    }

    #[test]
    fn clamping_reports_each_bad_field() {
        let (shape, issues) = FilmShape::Cylinder {
            radius: 0.0,
            theta_start: 0.0,
            theta_length: 10.0,
            height: -1.0,
        }
        .clamped();
        assert_eq!(issues.len(), 2);
        match shape {
            FilmShape::Cylinder {
                radius,
                theta_length,
                height,
                ..
            } => {
                assert_eq!(radius, MIN_EXTENT);
                assert_eq!(height, MIN_EXTENT);
                assert_eq!(theta_length, TAU);
            }
            FilmShape::Plane { .. } => panic!("shape variant changed"),
        }
    }
}
