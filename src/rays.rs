// rays.rs：从针孔到胶片顶点的调试射线

use crate::film::FilmSurface;
use glam::Vec3;

pub const DEFAULT_RAY_STEP: usize = 100;

/// 射线线段集合，每段为 (原点, 世界空间顶点)。派生数据，整体重算。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RayLines {
    pub segments: Vec<[Vec3; 2]>,
}

impl RayLines {
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// 按顶点顺序，每隔 `sample_step` 个顶点取一条射线。step 为 0 时按 1 处理。
pub fn sample_rays(surface: &FilmSurface, sample_step: usize) -> RayLines {
    let step = sample_step.max(1);
    let segments = surface
        .positions
        .iter()
        .step_by(step)
        .map(|p| [Vec3::ZERO, surface.to_world(*p)])
        .collect();
    RayLines { segments }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::film::{build_film_surface, FilmParameters, FilmPose, FilmShape};

    #[test]
    fn picks_every_nth_vertex_in_order() {
        let surface = build_film_surface(&FilmParameters::default());
        let rays = sample_rays(&surface, 100);
        // 129 * 129 = 16641 个顶点 -> 下标 0, 100, ..., 16600
        assert_eq!(rays.len(), 167);
        let world = surface.world_positions();
        for (k, seg) in rays.segments.iter().enumerate() {
            assert_eq!(seg[0], Vec3::ZERO);
            assert!((seg[1] - world[k * 100]).length() < 1e-6);
        }
    }

    #[test]
    fn zero_step_keeps_every_vertex() {
        let surface = build_film_surface(&FilmParameters {
            shape: FilmShape::default_cylinder(),
            pose: FilmPose::default(),
        });
        assert_eq!(sample_rays(&surface, 0).len(), surface.vertex_count());
    }
}
