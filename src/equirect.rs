// equirect.rs：方向向量 <-> 等距柱状 (u, v) 映射
//
// 两套约定并存，不能合并：
// - 胶片视图：lon = atan2(x, z)，v 上下翻转
// - 展开视图：lon = atan2(z, x)，v 不翻转
// 两个渲染 pass 依赖各自的约定保持画面方向一致。
// 贴图 v = 0 对应图像最后一行：展开视图天在上，胶片上的像上下倒立。

use glam::{Vec2, Vec3};
use std::f32::consts::{FRAC_PI_2, PI, TAU};

/// 低于此长度的向量视为退化方向。
pub const MIN_DIRECTION_LENGTH: f32 = 1e-6;

/// 经纬度（弧度）。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LonLat {
    pub lon: f32,
    pub lat: f32,
}

/// 归一化；零向量（或 NaN）返回 None，由调用方跳过该采样。
pub fn normalize_direction(v: Vec3) -> Option<Vec3> {
    let len = v.length();
    if len.is_finite() && len > MIN_DIRECTION_LENGTH {
        Some(v / len)
    } else {
        None
    }
}

/// 胶片约定的经纬度。`dir` 必须是单位向量。
pub fn film_lon_lat(dir: Vec3) -> LonLat {
    LonLat {
        lon: dir.x.atan2(dir.z),
        lat: dir.y.clamp(-1.0, 1.0).asin(),
    }
}

/// 展开约定的经纬度。注意 atan2 参数顺序与胶片约定相反。
pub fn unwrap_lon_lat(dir: Vec3) -> LonLat {
    LonLat {
        lon: dir.z.atan2(dir.x),
        lat: dir.y.clamp(-1.0, 1.0).asin(),
    }
}

fn lon_to_u(lon: f32) -> f32 {
    lon / TAU + 0.5
}

/// 第一人称胶片着色器使用的映射：`v = 1 - (lat/π + 0.5)`。
pub fn film_dir_to_uv(dir: Vec3) -> Vec2 {
    let ll = film_lon_lat(dir);
    Vec2::new(lon_to_u(ll.lon), 1.0 - (ll.lat / PI + 0.5))
}

/// 展开着色器使用的映射：`v = lat/π + 0.5`。
pub fn unwrap_dir_to_uv(dir: Vec3) -> Vec2 {
    let ll = unwrap_lon_lat(dir);
    Vec2::new(lon_to_u(ll.lon), ll.lat / PI + 0.5)
}

/// `film_dir_to_uv` 的逆映射。
pub fn film_uv_to_dir(uv: Vec2) -> Vec3 {
    let lon = (uv.x - 0.5) * TAU;
    let lat = ((0.5 - uv.y) * PI).clamp(-FRAC_PI_2, FRAC_PI_2);
    let (sin_lat, cos_lat) = lat.sin_cos();
    Vec3::new(cos_lat * lon.sin(), sin_lat, cos_lat * lon.cos())
}

/// `unwrap_dir_to_uv` 的逆映射。
pub fn unwrap_uv_to_dir(uv: Vec2) -> Vec3 {
    let lon = (uv.x - 0.5) * TAU;
    let lat = ((uv.y - 0.5) * PI).clamp(-FRAC_PI_2, FRAC_PI_2);
    let (sin_lat, cos_lat) = lat.sin_cos();
    Vec3::new(cos_lat * lon.cos(), sin_lat, cos_lat * lon.sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn sample_dirs() -> Vec<Vec3> {
        let mut out = Vec::new();
        for i in 0..12 {
            for j in 1..8 {
                let lon = -PI + TAU * i as f32 / 12.0 + 0.01;
                let lat = -FRAC_PI_2 + PI * j as f32 / 8.0;
                out.push(Vec3::new(lat.cos() * lon.sin(), lat.sin(), lat.cos() * lon.cos()));
            }
        }
        out
    }

    #[test]
    fn film_round_trip_away_from_poles() {
        for d in sample_dirs() {
            let back = film_uv_to_dir(film_dir_to_uv(d));
            assert!((back - d).length() < EPS, "{d:?} -> {back:?}");
        }
    }

    #[test]
    fn unwrap_round_trip_away_from_poles() {
        for d in sample_dirs() {
            let back = unwrap_uv_to_dir(unwrap_dir_to_uv(d));
            assert!((back - d).length() < EPS, "{d:?} -> {back:?}");
        }
    }

    #[test]
    fn conventions_differ_for_the_same_direction() {
        // +X：胶片约定 lon = π/2，展开约定 lon = 0
        let film = film_dir_to_uv(Vec3::X);
        let unwrap = unwrap_dir_to_uv(Vec3::X);
        assert!((film.x - 0.75).abs() < EPS);
        assert!((unwrap.x - 0.5).abs() < EPS);

        // 正上方：两种约定的 v 互为翻转
        assert!(film_dir_to_uv(Vec3::Y).y.abs() < EPS);
        assert!((unwrap_dir_to_uv(Vec3::Y).y - 1.0).abs() < EPS);
    }

    #[test]
    fn degenerate_direction_is_rejected() {
        assert_eq!(normalize_direction(Vec3::ZERO), None);
        assert_eq!(normalize_direction(Vec3::splat(f32::NAN)), None);
        let n = normalize_direction(Vec3::new(0.0, 3.0, 4.0)).unwrap();
        assert!((n - Vec3::new(0.0, 0.6, 0.8)).length() < EPS);
    }
}
