use film_projector::equirect::{film_dir_to_uv, unwrap_dir_to_uv, unwrap_uv_to_dir};
use film_projector::texture::EnvironmentTexture;
use film_projector::unwrap::{
    render_unwrap, shade_unwrap_pixel, unwrap_point, unwrap_sample, UnwrapParameters,
};
use glam::{Mat3, Vec2, Vec3};
use image::{Rgba, RgbaImage};
use std::f32::consts::{FRAC_PI_2, PI};

const EPS: f32 = 1e-5;

#[test]
fn origin_pixel_hits_theta_zero() {
    let params = UnwrapParameters {
        radius: 1.5,
        offset: 0.25,
        ..Default::default()
    };
    let (theta, p) = unwrap_point(0.0, 0.0, &params);
    assert_eq!(theta, 0.0);
    assert!((p - Vec3::new(1.5, 0.0, 0.25)).length() < EPS);
}

#[test]
fn reference_scenario_matches_formulas() {
    let params = UnwrapParameters {
        radius: 1.0,
        length: 2.0,
        offset: 0.5,
        cut_offset: 0.0,
        mirror: false,
        show_grid: false,
    };
    let s = unwrap_sample(0.25, 0.5, &params, Mat3::IDENTITY).unwrap();
    assert!((s.theta - FRAC_PI_2).abs() < EPS);
    assert!((s.point - Vec3::new(0.0, 1.0, 1.5)).length() < EPS);

    let dir = Vec3::new(0.0, 1.0, 1.5).normalize();
    let lon = dir.z.atan2(dir.x);
    let lat = dir.y.asin();
    let expected = Vec2::new(lon / (2.0 * PI) + 0.5, lat / PI + 0.5);
    assert!((s.uv - expected).length() < EPS, "{:?} vs {:?}", s.uv, expected);
    assert!((s.uv.x - 0.75).abs() < EPS);
}

#[test]
fn camera_rotation_moves_the_sample() {
    let params = UnwrapParameters::default();
    let yaw = Mat3::from_rotation_y(0.7);
    let still = unwrap_sample(0.3, 0.4, &params, Mat3::IDENTITY).unwrap();
    let turned = unwrap_sample(0.3, 0.4, &params, yaw).unwrap();
    assert!((turned.dir - yaw * still.dir).length() < EPS);
    // 绕竖直轴旋转不改变纬度
    assert!((turned.lon_lat.lat - still.lon_lat.lat).abs() < EPS);
}

#[test]
fn mirror_with_cut_matches_shifted_pixel() {
    let base = UnwrapParameters::default();
    let mirrored = UnwrapParameters {
        mirror: true,
        cut_offset: 0.5,
        ..base
    };
    // mirror: x -> 1 - x；cut 0.5：再平移半圈
    let a = unwrap_sample(0.2, 0.3, &mirrored, Mat3::IDENTITY).unwrap();
    let b = unwrap_sample(0.3, 0.3, &base, Mat3::IDENTITY).unwrap();
    assert!((a.dir - b.dir).length() < 1e-4);
}

#[test]
fn unwrap_uv_round_trip() {
    for &(u, v) in &[(0.1, 0.2), (0.5, 0.5), (0.9, 0.8), (0.33, 0.61)] {
        let uv = Vec2::new(u, v);
        let back = unwrap_dir_to_uv(unwrap_uv_to_dir(uv));
        assert!((back - uv).length() < EPS, "{uv:?} -> {back:?}");
    }
}

/// 标准全景图：上半天空（蓝），下半地面（红）。
fn sky_over_ground() -> EnvironmentTexture {
    let mut img = RgbaImage::from_pixel(64, 32, Rgba([255, 0, 0, 255]));
    for y in 0..16 {
        for x in 0..64 {
            img.put_pixel(x, y, Rgba([0, 0, 255, 255]));
        }
    }
    EnvironmentTexture::from_image(img)
}

#[test]
fn cpu_render_keeps_sky_on_top() {
    let env = sky_over_ground();

    // length 很小、offset 为 0：P 几乎落在 XY 平面，纬度只由 θ 决定
    let params = UnwrapParameters {
        radius: 1.0,
        length: 0.01,
        offset: 0.0,
        ..Default::default()
    };
    let out = render_unwrap(&env, &params, Mat3::IDENTITY, 64, 8);
    assert_eq!(out.dimensions(), (64, 8));
    // θ ≈ 90°（x ≈ 0.25）时 P 朝 +y -> 天空
    let px = out.get_pixel(16, 4);
    assert!(px[2] > 200 && px[0] < 50, "{px:?}");
    // θ ≈ 270°（x ≈ 0.75）时 P 朝 -y -> 地面
    let px = out.get_pixel(48, 4);
    assert!(px[0] > 200 && px[2] < 50, "{px:?}");
}

#[test]
fn upward_unwrap_ray_samples_the_sky() {
    let env = sky_over_ground();
    let params = UnwrapParameters {
        radius: 0.2,
        length: 2.0,
        offset: 0.0,
        ..Default::default()
    };
    let s = unwrap_sample(0.25, 0.5, &params, Mat3::IDENTITY).unwrap();
    assert!(s.dir.y > 0.0 && s.uv.y > 0.5, "{s:?}");

    let c = shade_unwrap_pixel(0.25, 0.5, &params, Mat3::IDENTITY, &env);
    assert!(c.z > 0.5 && c.x < 0.5, "{c:?}");
}

#[test]
fn film_convention_shows_an_inverted_image() {
    let env = sky_over_ground();
    let up = Vec3::new(0.0, 0.8, -0.6).normalize();
    let c = env.sample(film_dir_to_uv(up));
    // 胶片上的像上下倒立：朝上的射线落在地面一侧
    assert!(c.x > 0.5 && c.z < 0.5, "{c:?}");
}
