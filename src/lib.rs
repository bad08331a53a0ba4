// lib.rs：投影与视口合成核心（不依赖 GPU，可单独测试）

pub mod compositor;
pub mod config;
pub mod equirect;
pub mod error;
pub mod export;
pub mod film;
pub mod i18n;
pub mod orbit;
pub mod panorama;
pub mod rays;
pub mod scene;
pub mod texture;
pub mod unwrap;

pub use compositor::{Compositor, PassKind, Rect, RenderPass, ViewportLayout};
pub use error::{FilmError, RenderError};
pub use film::{build_film_surface, FilmKind, FilmParameters, FilmPose, FilmShape, FilmSurface};
pub use panorama::{CameraPose, PanoramaCamera};
pub use rays::{sample_rays, RayLines};
pub use scene::{FilmScene, ParamChange};
pub use texture::{EnvironmentTexture, LoadOutcome};
pub use unwrap::UnwrapParameters;
