use film_projector::film::{
    build_film_surface, FilmKind, FilmParameters, FilmPose, FilmShape, FilmShapes, MIN_EXTENT,
};
use film_projector::scene::{FilmScene, ParamChange};
use film_projector::unwrap::UnwrapParameters;
use glam::Vec3;
use std::f32::consts::{PI, TAU};

fn cylinder(theta_start: f32, theta_length: f32) -> FilmParameters {
    FilmParameters {
        shape: FilmShape::Cylinder {
            radius: 2.0,
            theta_start,
            theta_length,
            height: 1.5,
        },
        pose: FilmPose {
            rot_x: 0.3,
            rot_y: -0.2,
            rot_z: 0.1,
            offset: Vec3::new(0.5, -0.25, 1.0),
        },
    }
}

#[test]
fn rebuild_is_deterministic() {
    for params in [FilmParameters::default(), cylinder(-PI / 2.0, PI)] {
        let a = build_film_surface(&params);
        let b = build_film_surface(&params);
        assert_eq!(a.vertex_count(), b.vertex_count());
        assert_eq!(a.positions, b.positions);
        assert_eq!(a.world_positions(), b.world_positions());
    }
}

#[test]
fn tessellation_resolution_is_fixed() {
    let plane = build_film_surface(&FilmParameters::default());
    assert_eq!(plane.kind, FilmKind::Plane);
    assert_eq!(plane.vertex_count(), 129 * 129);

    let cyl = build_film_surface(&cylinder(0.0, PI));
    assert_eq!(cyl.kind, FilmKind::Cylinder);
    assert_eq!(cyl.vertex_count(), 257 * 2);
}

#[test]
fn full_turn_cylinder_closes_the_ring() {
    let surface = build_film_surface(&cylinder(-PI / 2.0, TAU));
    let first = surface.positions[0];
    let last = surface.positions[256];
    assert!((first - last).length() < 1e-4, "{first:?} vs {last:?}");

    let angle = |p: Vec3| p.x.atan2(p.z);
    let d = (angle(first) - angle(last)).rem_euclid(TAU);
    assert!(d < 1e-4 || (TAU - d) < 1e-4);
}

#[test]
fn plane_is_placed_at_offset() {
    let params = FilmParameters {
        shape: FilmShape::Plane { width: 2.0, height: 2.0 },
        pose: FilmPose {
            offset: Vec3::new(1.0, 2.0, -3.0),
            ..Default::default()
        },
    };
    let surface = build_film_surface(&params);
    // 129 x 129 网格的中心顶点
    let center = surface.to_world(surface.positions[64 * 129 + 64]);
    assert!((center - Vec3::new(1.0, 2.0, -3.0)).length() < 1e-5);
}

#[test]
fn cylinder_base_is_lifted_before_rotation() {
    let params = FilmParameters {
        shape: FilmShape::Cylinder {
            radius: 1.0,
            theta_start: 0.0,
            theta_length: PI,
            height: 2.0,
        },
        pose: FilmPose {
            offset: Vec3::new(0.0, 0.5, 0.0),
            ..Default::default()
        },
    };
    let surface = build_film_surface(&params);
    // 局部空间 y 范围：dy + h/2 ± h/2 = [0.5, 2.5]
    let ys: Vec<f32> = surface.positions.iter().map(|p| p.y).collect();
    let min = ys.iter().cloned().fold(f32::INFINITY, f32::min);
    let max = ys.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    assert!((min - 0.5).abs() < 1e-5 && (max - 2.5).abs() < 1e-5);
    // 绕 X 轴 90° 后，局部 y 变成世界 z
    for (local, world) in surface.positions.iter().zip(surface.world_positions()) {
        assert!((world.z - local.y).abs() < 1e-5);
    }
}

#[test]
fn repeated_rebuilds_do_not_drift_rotation() {
    let params = cylinder(0.0, PI);
    let mut scene = FilmScene::new(params, UnwrapParameters::default(), 100);
    let reference = scene.surface().world_positions();
    for _ in 0..10 {
        // 与旋转无关的参数变更也会触发重建
        scene.apply(ParamChange::Film(params));
        scene.apply(ParamChange::RayStep(50));
    }
    assert_eq!(scene.surface().world_positions(), reference);
}

#[test]
fn degenerate_sizes_are_clamped_not_rejected() {
    let params = FilmParameters {
        shape: FilmShape::Plane { width: 0.0, height: f32::NAN },
        pose: FilmPose::default(),
    };
    let surface = build_film_surface(&params);
    assert_eq!(surface.vertex_count(), 129 * 129);
    assert!(surface.positions.iter().all(|p| p.is_finite()));
    let xs = surface.positions.iter().map(|p| p.x.abs()).fold(0.0f32, f32::max);
    assert!((xs - MIN_EXTENT / 2.0).abs() < 1e-7);
}

#[test]
fn shape_memory_restores_previous_values() {
    let mut shapes = FilmShapes::from_shape(FilmShape::Plane { width: 3.0, height: 1.0 });
    shapes.kind = FilmKind::Cylinder;
    assert_eq!(shapes.active(), FilmShape::default_cylinder());
    shapes.kind = FilmKind::Plane;
    assert_eq!(shapes.active(), FilmShape::Plane { width: 3.0, height: 1.0 });
}
