use film_projector::compositor::{Compositor, PassKind, Rect, ViewportLayout};
use film_projector::film::FilmParameters;
use film_projector::orbit::OrbitCamera;
use film_projector::scene::FilmScene;
use film_projector::unwrap::UnwrapParameters;

#[test]
fn free_view_round_trip_restores_locked_layout() {
    let mut c = Compositor::new(false);
    let before = c.begin_frame(1280, 720);

    c.request_free_view(true);
    let free = c.begin_frame(1280, 720);
    assert_eq!(free.passes.len(), 3);

    c.request_free_view(false);
    let after = c.begin_frame(1280, 720);
    assert_eq!(before, after);
}

#[test]
fn reentering_free_view_starts_from_canonical_orbit() {
    let mut c = Compositor::new(false);
    c.toggle_free_view();
    c.begin_frame(800, 600);
    c.free_camera_mut().drag(120.0, -40.0);
    c.free_camera_mut().zoom(3.0);
    assert_ne!(*c.free_camera(), OrbitCamera::default());

    c.toggle_free_view();
    c.begin_frame(800, 600);
    c.toggle_free_view();
    c.begin_frame(800, 600);
    assert_eq!(*c.free_camera(), OrbitCamera::default());
}

#[test]
fn repeated_request_before_frame_is_idempotent() {
    let mut c = Compositor::new(false);
    c.request_free_view(true);
    c.request_free_view(false);
    let layout = c.begin_frame(640, 480);
    assert!(!layout.free_view);
    assert_eq!(layout.passes.len(), 2);
}

#[test]
fn aspect_follows_every_resize() {
    let mut c = Compositor::new(false);
    for (w, h) in [(1280u32, 720u32), (640, 640), (300, 1000)] {
        let layout = c.begin_frame(w, h);
        let pano = layout.pass(PassKind::Panorama).unwrap();
        let top = ((h as f32) * 0.6).round() as u32;
        assert_eq!(pano.viewport, Rect { x: 0, y: 0, width: w, height: top });
        assert!((pano.aspect - w as f32 / top as f32).abs() < 1e-6);
        assert_eq!(layout.unwrap_rect().unwrap().height, h - top);
    }
}

#[test]
fn free_layout_splits_top_row() {
    let layout = ViewportLayout::compute(1280, 720, true);
    let pano = layout.pass(PassKind::Panorama).unwrap().viewport;
    let orbit = layout.pass(PassKind::FreeOrbit).unwrap().viewport;
    let unwrap = layout.pass(PassKind::Unwrap).unwrap().viewport;
    assert_eq!(pano, Rect { x: 0, y: 0, width: 640, height: 432 });
    assert_eq!(orbit, Rect { x: 640, y: 0, width: 640, height: 432 });
    assert_eq!(unwrap, Rect { x: 0, y: 432, width: 1280, height: 288 });
    assert!(layout.is_exclusive());
}

#[test]
fn resizing_never_touches_parameters() {
    let scene = FilmScene::new(FilmParameters::default(), UnwrapParameters::default(), 100);
    let film = *scene.film();
    let unwrap = *scene.unwrap();
    let generation = scene.geometry_generation();

    let mut c = Compositor::new(true);
    for (w, h) in [(1920, 1080), (10, 10), (0, 0), (800, 1200)] {
        let _ = c.begin_frame(w, h);
    }
    assert_eq!(*scene.film(), film);
    assert_eq!(*scene.unwrap(), unwrap);
    assert_eq!(scene.geometry_generation(), generation);
}
