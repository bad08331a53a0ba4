// texture.rs：环境贴图（等距柱状全景图）与后台加载

use crate::error::FilmError;
use glam::{Vec2, Vec3};
use image::io::Reader as ImageReader;
use image::{GenericImage, GenericImageView, Rgba, RgbaImage};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;

/// 只读的环境贴图。加载完成后不再修改，新图整体替换旧图。
#[derive(Debug, Clone)]
pub struct EnvironmentTexture {
    image: Arc<RgbaImage>,
}

impl EnvironmentTexture {
    /// 兼容非 2:1 纹理：以宽度为基准，高度不足时在顶部补黑，原图贴到底部。
    pub fn from_image(img: RgbaImage) -> Self {
        let (src_w, src_h) = img.dimensions();
        let target_h = src_w / 2;

        let img = if target_h > 0 && src_h < target_h {
            let mut canvas = RgbaImage::from_pixel(src_w, target_h, Rgba([0, 0, 0, 255]));
            // y_offset 保证不会越界
            let _ = canvas.copy_from(&img, 0, target_h - src_h);
            canvas
        } else {
            img
        };

        Self {
            image: Arc::new(img),
        }
    }

    /// 还没有图片时使用的棋盘格。
    pub fn checkerboard(width: u32, height: u32, cells: u32) -> Self {
        let cells = cells.max(1);
        let cw = (width / (2 * cells)).max(1);
        let ch = (height / cells).max(1);
        let img = RgbaImage::from_fn(width.max(1), height.max(1), |x, y| {
            if (x / cw + y / ch) % 2 == 0 {
                Rgba([200, 200, 200, 255])
            } else {
                Rgba([60, 60, 60, 255])
            }
        });
        Self {
            image: Arc::new(img),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// 双线性采样；u 方向重复，v 方向夹边，与 GPU 端采样器一致。
    /// v = 0 对应最后一行像素（图像底边），v = 1 对应第一行。返回线性 [0, 1] 的 RGB。
    pub fn sample(&self, uv: Vec2) -> Vec3 {
        let (w, h) = self.image.dimensions();
        let fx = uv.x * w as f32 - 0.5;
        let fy = ((1.0 - uv.y) * h as f32 - 0.5).clamp(0.0, (h - 1) as f32);

        let x0 = fx.floor();
        let y0 = fy.floor();
        let tx = fx - x0;
        let ty = fy - y0;

        let wrap = |x: f32| -> u32 { (x as i64).rem_euclid(w as i64) as u32 };
        let clamp_y = |y: f32| -> u32 { (y as i64).clamp(0, h as i64 - 1) as u32 };

        let (xa, xb) = (wrap(x0), wrap(x0 + 1.0));
        let (ya, yb) = (clamp_y(y0), clamp_y(y0 + 1.0));

        let texel = |x: u32, y: u32| -> Vec3 {
            let p = self.image.get_pixel(x, y);
            Vec3::new(p[0] as f32, p[1] as f32, p[2] as f32) / 255.0
        };

        let top = texel(xa, ya).lerp(texel(xb, ya), tx);
        let bottom = texel(xa, yb).lerp(texel(xb, yb), tx);
        top.lerp(bottom, ty)
    }
}

/// 后台加载的结果。失败时主线程保持旧贴图不变。
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded {
        path: PathBuf,
        texture: EnvironmentTexture,
    },
    Failed {
        path: PathBuf,
        error: FilmError,
    },
}

pub fn decode_image(path: &Path) -> Result<EnvironmentTexture, FilmError> {
    let file = File::open(path).map_err(|e| {
        FilmError::TextureLoadFailure(crate::i18n::tr_with(
            "error.open_file",
            &[("err", e.to_string())],
        ))
    })?;
    let reader = BufReader::new(file);

    let img = ImageReader::new(reader)
        .with_guessed_format()
        .map_err(image::ImageError::IoError)
        .and_then(|mut r| {
            r.no_limits();
            r.decode()
        })
        .map_err(|e| {
            FilmError::TextureLoadFailure(crate::i18n::tr_with(
                "error.decode_image",
                &[("err", e.to_string())],
            ))
        })?;

    let (w, h) = img.dimensions();
    log::info!(
        "{}",
        crate::i18n::tr_with(
            "log.image_loaded_size",
            &[("w", w.to_string()), ("h", h.to_string())]
        )
    );

    Ok(EnvironmentTexture::from_image(img.to_rgba8()))
}

/// 在后台线程解码，完成后通过通道一次性送回。
pub fn start_load_image(path: PathBuf, tx: Sender<LoadOutcome>) {
    thread::spawn(move || {
        log::info!(
            "{}",
            crate::i18n::tr_with("log.loading_image_bg", &[("path", format!("{:?}", path))])
        );

        let outcome = match decode_image(&path) {
            Ok(texture) => LoadOutcome::Loaded { path, texture },
            Err(error) => LoadOutcome::Failed { path, error },
        };

        if tx.send(outcome).is_err() {
            log::error!("{}", crate::i18n::tr("error.send_to_main_failed"));
        }
    });
}
