// export.rs：把展开图导出为 PNG
//
// 输出尺寸按当前布局中展开栏的宽高比换算，内容在 CPU 上按同一组公式重采样。

use crate::compositor::ViewportLayout;
use crate::error::FilmError;
use crate::texture::EnvironmentTexture;
use crate::unwrap::{render_unwrap, UnwrapParameters};
use glam::Mat3;
use image::RgbaImage;
use std::path::Path;

/// 按展开栏的宽高比计算导出分辨率；没有展开栏时按 2:1。
pub fn export_size(layout: &ViewportLayout, target_width: u32) -> (u32, u32) {
    let width = target_width.max(1);
    let aspect = layout
        .unwrap_rect()
        .filter(|r| r.area() > 0)
        .map(|r| r.aspect())
        .unwrap_or(2.0);
    let height = ((width as f32) / aspect).round().max(1.0) as u32;
    (width, height)
}

pub fn render_export(
    env: &EnvironmentTexture,
    params: &UnwrapParameters,
    camera_rotation: Mat3,
    layout: &ViewportLayout,
    target_width: u32,
) -> RgbaImage {
    let (w, h) = export_size(layout, target_width);
    render_unwrap(env, params, camera_rotation, w, h)
}

pub fn save_png(img: &RgbaImage, path: &Path) -> Result<(), FilmError> {
    img.save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| FilmError::Export(e.to_string()))?;
    log::info!(
        "{}",
        crate::i18n::tr_with(
            "log.exported",
            &[
                ("path", path.display().to_string()),
                ("w", img.width().to_string()),
                ("h", img.height().to_string()),
            ]
        )
    );
    Ok(())
}
