// scene.rs：参数快照与派生数据的唯一持有者
//
// 控件每次编辑都推送一个新的参数快照（ParamChange），这里同步重建依赖数据：
// 胶片表面、射线。旧值在替换时整体丢弃。

use crate::error::FilmError;
use crate::film::{build_film_surface, FilmParameters, FilmSurface};
use crate::rays::{sample_rays, RayLines};
use crate::texture::{EnvironmentTexture, LoadOutcome};
use crate::unwrap::UnwrapParameters;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamChange {
    Film(FilmParameters),
    Unwrap(UnwrapParameters),
    RayStep(usize),
}

pub struct FilmScene {
    film: FilmParameters,
    unwrap: UnwrapParameters,
    ray_step: usize,
    surface: FilmSurface,
    rays: RayLines,
    environment: EnvironmentTexture,
    // 几何 / 贴图每替换一次递增，渲染端据此重新上传 GPU 缓冲
    geometry_generation: u64,
    texture_generation: u64,
}

impl FilmScene {
    pub fn new(film: FilmParameters, unwrap: UnwrapParameters, ray_step: usize) -> Self {
        let surface = build_film_surface(&film);
        let rays = sample_rays(&surface, ray_step);
        Self {
            film,
            unwrap: unwrap.sanitized(),
            ray_step: ray_step.max(1),
            surface,
            rays,
            environment: EnvironmentTexture::checkerboard(512, 256, 8),
            geometry_generation: 0,
            texture_generation: 0,
        }
    }

    pub fn film(&self) -> &FilmParameters {
        &self.film
    }

    pub fn unwrap(&self) -> &UnwrapParameters {
        &self.unwrap
    }

    pub fn ray_step(&self) -> usize {
        self.ray_step
    }

    pub fn surface(&self) -> &FilmSurface {
        &self.surface
    }

    pub fn rays(&self) -> &RayLines {
        &self.rays
    }

    pub fn environment(&self) -> &EnvironmentTexture {
        &self.environment
    }

    pub fn geometry_generation(&self) -> u64 {
        self.geometry_generation
    }

    pub fn texture_generation(&self) -> u64 {
        self.texture_generation
    }

    /// 同步应用一次参数变更。
    pub fn apply(&mut self, change: ParamChange) {
        match change {
            ParamChange::Film(film) => {
                self.film = film;
                self.rebuild();
            }
            ParamChange::Unwrap(unwrap) => {
                // 展开参数只影响采样，不需要重建几何
                self.unwrap = unwrap.sanitized();
            }
            ParamChange::RayStep(step) => {
                self.ray_step = step.max(1);
                self.rays = sample_rays(&self.surface, self.ray_step);
                self.geometry_generation += 1;
            }
        }
    }

    /// 整体替换贴图并同步重建依赖的几何。
    pub fn set_environment(&mut self, texture: EnvironmentTexture) {
        self.environment = texture;
        self.texture_generation += 1;
        self.rebuild();
    }

    /// 处理后台加载结果。失败时什么都不变，错误交给调用方记录。
    pub fn on_texture_loaded(&mut self, outcome: LoadOutcome) -> Result<(), FilmError> {
        match outcome {
            LoadOutcome::Loaded { path, texture } => {
                let (w, h) = texture.dimensions();
                log::info!("environment {:?} ({}x{})", path, w, h);
                self.set_environment(texture);
                Ok(())
            }
            LoadOutcome::Failed { path, error } => {
                log::debug!("keeping previous environment, {:?} failed", path);
                Err(error)
            }
        }
    }

    fn rebuild(&mut self) {
        self.surface = build_film_surface(&self.film);
        self.rays = sample_rays(&self.surface, self.ray_step);
        self.geometry_generation += 1;
        log::debug!(
            "film rebuilt: {:?}, {} vertices, {} rays",
            self.surface.kind,
            self.surface.vertex_count(),
            self.rays.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::film::FilmShape;
    use std::path::PathBuf;

    #[test]
    fn film_change_rebuilds_everything() {
        let mut scene = FilmScene::new(FilmParameters::default(), UnwrapParameters::default(), 100);
        let before = scene.geometry_generation();
        let mut film = *scene.film();
        film.shape = FilmShape::default_cylinder();
        scene.apply(ParamChange::Film(film));
        assert_eq!(scene.geometry_generation(), before + 1);
        assert_eq!(scene.surface().vertex_count(), 257 * 2);
        assert_eq!(scene.rays().len(), 6);
    }

    #[test]
    fn unwrap_change_leaves_geometry_alone() {
        let mut scene = FilmScene::new(FilmParameters::default(), UnwrapParameters::default(), 100);
        let before = scene.geometry_generation();
        scene.apply(ParamChange::Unwrap(UnwrapParameters {
            cut_offset: 1.25,
            ..Default::default()
        }));
        assert_eq!(scene.geometry_generation(), before);
        assert!((scene.unwrap().cut_offset - 0.25).abs() < 1e-6);
    }

    #[test]
    fn failed_load_keeps_previous_texture() {
        let mut scene = FilmScene::new(FilmParameters::default(), UnwrapParameters::default(), 100);
        let dims = scene.environment().dimensions();
        let generation = scene.texture_generation();
        let result = scene.on_texture_loaded(LoadOutcome::Failed {
            path: PathBuf::from("broken.jpg"),
            error: FilmError::TextureLoadFailure("bad header".into()),
        });
        assert!(result.is_err());
        assert_eq!(scene.environment().dimensions(), dims);
        assert_eq!(scene.texture_generation(), generation);
    }

    #[test]
    fn loaded_texture_replaces_environment_and_rebuilds() {
        let mut scene = FilmScene::new(FilmParameters::default(), UnwrapParameters::default(), 100);
        let dims = scene.environment().dimensions();
        let texture_gen = scene.texture_generation();
        let geometry_gen = scene.geometry_generation();

        let img = image::RgbaImage::from_pixel(64, 32, image::Rgba([10, 20, 30, 255]));
        let result = scene.on_texture_loaded(LoadOutcome::Loaded {
            path: PathBuf::from("pano.png"),
            texture: EnvironmentTexture::from_image(img),
        });
        assert_eq!(result, Ok(()));
        assert_ne!(scene.environment().dimensions(), dims);
        assert_eq!(scene.environment().dimensions(), (64, 32));
        assert_eq!(scene.texture_generation(), texture_gen + 1);
        assert_eq!(scene.geometry_generation(), geometry_gen + 1);
    }
}
