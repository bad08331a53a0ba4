// config.rs：命令行 / 环境变量配置
//
// CLI:
//   --lang <code>          界面语言（en, zh-Hans, ...）
//   --image <path>         启动时加载的全景图
//   --ray-step <n>         射线采样间隔（顶点数）
//   --export-width <n>     导出展开图的宽度（像素）
//   --free-view            以自由视角三栏模式启动
// Env:
//   FILMPROJ_LANG          同 --lang，优先级低于 CLI

use crate::rays::DEFAULT_RAY_STEP;
use std::path::PathBuf;

pub const LANG_ENV: &str = "FILMPROJ_LANG";
pub const DEFAULT_LANG: &str = "en";
pub const DEFAULT_EXPORT_WIDTH: u32 = 2048;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub lang: String,
    pub image: Option<PathBuf>,
    pub ray_step: usize,
    pub export_width: u32,
    pub free_view: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            lang: DEFAULT_LANG.to_string(),
            image: None,
            ray_step: DEFAULT_RAY_STEP,
            export_width: DEFAULT_EXPORT_WIDTH,
            free_view: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::parse(std::env::args().skip(1), std::env::var(LANG_ENV).ok())
    }

    /// 未知参数和无法解析的数值都忽略，保留默认值。
    pub fn parse(args: impl IntoIterator<Item = String>, env_lang: Option<String>) -> Self {
        let mut cfg = AppConfig::default();
        let mut cli_lang = None;

        let mut it = args.into_iter();
        while let Some(a) = it.next() {
            match a.as_str() {
                "--lang" => cli_lang = it.next(),
                "--image" => cfg.image = it.next().map(PathBuf::from),
                "--ray-step" => {
                    if let Some(n) = it.next().and_then(|v| v.parse::<usize>().ok()) {
                        cfg.ray_step = n.max(1);
                    }
                }
                "--export-width" => {
                    if let Some(n) = it.next().and_then(|v| v.parse::<u32>().ok()) {
                        cfg.export_width = n.max(1);
                    }
                }
                "--free-view" => cfg.free_view = true,
                _ => {}
            }
        }

        let env_lang = env_lang.filter(|v| !v.trim().is_empty());
        if let Some(lang) = cli_lang.or(env_lang) {
            cfg.lang = lang;
        }
        cfg
    }
}
