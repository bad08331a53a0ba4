// main.rs：窗口、事件循环、参数面板与导出

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // 在 Release 模式下隐藏控制台窗口

mod renderer;

use film_projector::compositor::{Compositor, PassKind, ViewportLayout};
use film_projector::config::AppConfig;
use film_projector::export::{render_export, save_png};
use film_projector::film::{FilmKind, FilmParameters, FilmPose, FilmShape, FilmShapes};
use film_projector::i18n::{self, tr, tr_with};
use film_projector::panorama::PanoramaCamera;
use film_projector::scene::{FilmScene, ParamChange};
use film_projector::texture::{start_load_image, LoadOutcome};
use film_projector::unwrap::UnwrapParameters;
use renderer::{FrameInputs, Renderer};

use winit::{
    dpi::{LogicalSize, PhysicalPosition},
    event::*,
    event_loop::{ControlFlow, EventLoop},
    window::{Fullscreen, Window, WindowBuilder},
};

use std::f32::consts::{PI, TAU};
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::time::Instant;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "hdr", "tif", "tiff"];

/// 面板上可编辑的参数副本。每次编辑后生成新快照推给场景。
struct Controls {
    shapes: FilmShapes,
    pose: FilmPose,
    unwrap: UnwrapParameters,
    ray_step: usize,
}

impl Controls {
    fn from_scene(scene: &FilmScene) -> Self {
        Self {
            shapes: FilmShapes::from_shape(scene.film().shape),
            pose: scene.film().pose,
            unwrap: *scene.unwrap(),
            ray_step: scene.ray_step(),
        }
    }

    fn film(&self) -> FilmParameters {
        FilmParameters {
            shape: self.shapes.active(),
            pose: self.pose,
        }
    }
}

struct UiState {
    controls: Controls,
    show_rays: bool,
    show_axes: bool,
    show_fps: bool,
    is_fullscreen: bool,
    lang: String,
}

/// UI 一帧内产生的动作，在渲染结束后统一执行。
#[derive(Default)]
struct UiActions {
    changes: Vec<ParamChange>,
    open_image: Option<PathBuf>,
    export: bool,
    toggle_free_view: bool,
    reset_view: bool,
    toggle_fullscreen: bool,
    language_changed: bool,
    exit: bool,
}

/// 状态栏显示的只读诊断信息。
struct StatusInfo {
    film_kind: FilmKind,
    yaw: f32,
    pitch: f32,
    fov: f32,
    free_view: bool,
    angular_res: Option<(f32, f32)>,
    fps: f32,
    is_loading: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env();
    i18n::init(config.lang.clone());

    let event_loop = EventLoop::new();
    let window = match WindowBuilder::new()
        .with_title(tr("app.title"))
        .with_inner_size(LogicalSize::new(1280, 720))
        .build(&event_loop)
    {
        Ok(w) => Arc::new(w),
        Err(e) => {
            log::error!("{}", tr_with("error.fatal_gpu", &[("err", e.to_string())]));
            std::process::exit(1);
        }
    };

    let mut renderer = match pollster::block_on(Renderer::new(window.clone())) {
        Ok(r) => r,
        Err(e) => {
            log::error!("{}", tr_with("error.fatal_gpu", &[("err", e.to_string())]));
            std::process::exit(1);
        }
    };

    let mut scene = FilmScene::new(
        FilmParameters::default(),
        UnwrapParameters::default(),
        config.ray_step,
    );
    let mut panorama = PanoramaCamera::new();
    let mut compositor = Compositor::new(config.free_view);
    let mut layout = ViewportLayout::compute(renderer.size.width, renderer.size.height, config.free_view);

    let mut ui = UiState {
        controls: Controls::from_scene(&scene),
        show_rays: true,
        show_axes: true,
        show_fps: false,
        is_fullscreen: false,
        lang: config.lang.clone(),
    };

    // 交互状态：按下时命中的 pass 决定拖动哪个相机
    let mut drag_target: Option<PassKind> = None;
    let mut last_mouse_pos: Option<PhysicalPosition<f64>> = None;
    let mut cursor_pos = PhysicalPosition::new(0.0f64, 0.0f64);

    // FPS 计算
    let mut last_frame_time = Instant::now();
    let mut frame_count = 0;
    let mut fps = 0.0;

    // 异步加载通道
    let (tx, rx): (Sender<LoadOutcome>, Receiver<LoadOutcome>) = channel();
    let mut is_loading = false;
    if let Some(path) = config.image.clone() {
        is_loading = true;
        start_load_image(path, tx.clone());
    }

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        // 新贴图到达：整体替换并同步重建；失败时保持原样
        if let Ok(outcome) = rx.try_recv() {
            if let Err(e) = scene.on_texture_loaded(outcome) {
                log::warn!("{}", tr_with("error.load_failed", &[("err", e.to_string())]));
            }
            is_loading = false;
        }

        match event {
            Event::WindowEvent { event, .. } => {
                // 先让 egui 处理事件
                let response = renderer.egui_state.on_event(&renderer.egui_ctx, &event);
                if response.consumed {
                    return;
                }

                match event {
                    WindowEvent::CloseRequested => {
                        *control_flow = ControlFlow::Exit;
                    }

                    WindowEvent::Resized(new_size) => {
                        // 只影响布局和 aspect，不改任何参数
                        renderer.resize(new_size);
                    }

                    WindowEvent::KeyboardInput { input, .. } => {
                        if input.state == ElementState::Pressed {
                            match input.virtual_keycode {
                                Some(VirtualKeyCode::O) => {
                                    if let Some(path) = pick_image() {
                                        is_loading = true;
                                        start_load_image(path, tx.clone());
                                    }
                                }
                                Some(VirtualKeyCode::F) => compositor.toggle_free_view(),
                                Some(VirtualKeyCode::R) => panorama.reset(),
                                Some(VirtualKeyCode::E) => {
                                    export_unwrap(&scene, &panorama, &layout, config.export_width)
                                }
                                Some(VirtualKeyCode::F11) => {
                                    ui.is_fullscreen = !ui.is_fullscreen;
                                    apply_fullscreen(&window, ui.is_fullscreen);
                                }
                                _ => {}
                            }
                        }
                    }

                    WindowEvent::MouseInput { state, button, .. } => {
                        if button == MouseButton::Left || button == MouseButton::Right {
                            if state == ElementState::Pressed {
                                drag_target = layout.hit_test(cursor_pos.x as f32, cursor_pos.y as f32);
                            } else {
                                drag_target = None;
                                last_mouse_pos = None;
                            }
                        }
                    }

                    WindowEvent::CursorMoved { position, .. } => {
                        cursor_pos = position;
                        if let Some(target) = drag_target {
                            if let Some(last_pos) = last_mouse_pos {
                                let dx = (position.x - last_pos.x) as f32;
                                let dy = (position.y - last_pos.y) as f32;
                                match target {
                                    PassKind::Panorama => {
                                        if let Some(p) = layout.pass(PassKind::Panorama) {
                                            panorama.drag(
                                                dx,
                                                dy,
                                                p.viewport.width as f32,
                                                p.viewport.height as f32,
                                            );
                                        }
                                    }
                                    PassKind::FreeOrbit => compositor.free_camera_mut().drag(dx, dy),
                                    PassKind::Unwrap => {}
                                }
                            }
                            last_mouse_pos = Some(position);
                        }
                    }

                    WindowEvent::MouseWheel { delta, .. } => {
                        let scroll = match delta {
                            MouseScrollDelta::LineDelta(_, y) => y,
                            MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 20.0,
                        };
                        match layout.hit_test(cursor_pos.x as f32, cursor_pos.y as f32) {
                            Some(PassKind::FreeOrbit) => compositor.free_camera_mut().zoom(scroll),
                            Some(PassKind::Panorama) => panorama.zoom(scroll),
                            _ => {}
                        }
                    }

                    WindowEvent::DroppedFile(path) => {
                        is_loading = true;
                        start_load_image(path, tx.clone());
                    }

                    _ => {}
                }
            }

            Event::RedrawRequested(_) => {
                frame_count += 1;
                let now = Instant::now();
                if now.duration_since(last_frame_time).as_secs_f32() >= 1.0 {
                    fps = frame_count as f32 / now.duration_since(last_frame_time).as_secs_f32();
                    frame_count = 0;
                    last_frame_time = now;
                }

                // 挂起的模式切换在这里生效，布局按当前窗口尺寸重算
                layout = compositor.begin_frame(renderer.size.width, renderer.size.height);
                renderer.sync_scene(&scene);

                let frame = FrameInputs {
                    layout: &layout,
                    panorama: panorama.pose(),
                    orbit: *compositor.free_camera(),
                    unwrap: *scene.unwrap(),
                    show_rays: ui.show_rays,
                    show_axes: ui.show_axes,
                };

                let status = StatusInfo {
                    film_kind: scene.film().shape.kind(),
                    yaw: panorama.yaw,
                    pitch: panorama.pitch,
                    fov: panorama.fov,
                    free_view: compositor.requested_free_view(),
                    angular_res: layout.unwrap_rect().map(|r| {
                        let res = scene.unwrap().angular_resolution(r.width, r.height);
                        (res.horizontal_deg_per_px, res.vertical_deg_per_px)
                    }),
                    fps,
                    is_loading,
                };

                let mut actions = UiActions::default();
                let render_result = renderer.render_with_ui(&window, &frame, |ctx| {
                    draw_ui(ctx, &mut ui, &mut panorama, &status, &mut actions);
                });

                match render_result {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => renderer.resize(renderer.size),
                    Err(wgpu::SurfaceError::OutOfMemory) => *control_flow = ControlFlow::Exit,
                    Err(e) => log::error!("{}", tr_with("error.render", &[("err", format!("{:?}", e))])),
                }

                // 参数变更同步应用，下一帧之前几何已重建完毕
                for change in actions.changes {
                    scene.apply(change);
                }
                if let Some(path) = actions.open_image {
                    is_loading = true;
                    start_load_image(path, tx.clone());
                }
                if actions.export {
                    export_unwrap(&scene, &panorama, &layout, config.export_width);
                }
                if actions.toggle_free_view {
                    compositor.toggle_free_view();
                }
                if actions.reset_view {
                    panorama.reset();
                }
                if actions.toggle_fullscreen {
                    ui.is_fullscreen = !ui.is_fullscreen;
                    apply_fullscreen(&window, ui.is_fullscreen);
                }
                if actions.language_changed {
                    i18n::init(ui.lang.clone());
                    window.set_title(&tr("app.title"));
                }
                if actions.exit {
                    *control_flow = ControlFlow::Exit;
                }
            }

            Event::MainEventsCleared => {
                window.request_redraw();
            }

            _ => {}
        }
    });
}

fn pick_image() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .add_filter(&tr("file.filter.images"), IMAGE_EXTENSIONS)
        .pick_file()
}

fn apply_fullscreen(window: &Window, fullscreen: bool) {
    if fullscreen {
        window.set_fullscreen(Some(Fullscreen::Borderless(None)));
    } else {
        window.set_fullscreen(None);
    }
}

/// 按当前视角与展开栏的宽高比重采样并写成 PNG。
fn export_unwrap(scene: &FilmScene, panorama: &PanoramaCamera, layout: &ViewportLayout, width: u32) {
    let Some(path) = rfd::FileDialog::new()
        .add_filter(&tr("file.filter.png"), &["png"])
        .set_file_name("unwrap.png")
        .save_file()
    else {
        return;
    };

    let img = render_export(
        scene.environment(),
        scene.unwrap(),
        panorama.pose().rotation,
        layout,
        width,
    );
    if let Err(e) = save_png(&img, &path) {
        log::error!("{}", e);
    }
}

fn draw_ui(
    ctx: &egui::Context,
    ui_state: &mut UiState,
    panorama: &mut PanoramaCamera,
    status: &StatusInfo,
    actions: &mut UiActions,
) {
    egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
        egui::menu::bar(ui, |ui| {
            // File
            ui.menu_button(tr("menu.file"), |ui| {
                if ui.button(tr("menu.open_image")).clicked() {
                    ui.close_menu();
                    actions.open_image = pick_image();
                }
                if ui.button(tr("menu.export_unwrap")).clicked() {
                    ui.close_menu();
                    actions.export = true;
                }
                if ui.button(tr("menu.exit")).clicked() {
                    actions.exit = true;
                }
            });

            // View
            ui.menu_button(tr("menu.view"), |ui| {
                let mut free_view = status.free_view;
                if ui.checkbox(&mut free_view, tr("view.free_view")).clicked() {
                    actions.toggle_free_view = true;
                    ui.close_menu();
                }
                if ui.button(tr("view.reset")).clicked() {
                    actions.reset_view = true;
                    ui.close_menu();
                }
                let fullscreen_label = if ui_state.is_fullscreen {
                    tr("view.fullscreen.exit")
                } else {
                    tr("view.fullscreen.enter")
                };
                if ui.button(fullscreen_label).clicked() {
                    actions.toggle_fullscreen = true;
                    ui.close_menu();
                }

                ui.separator();
                ui.checkbox(&mut ui_state.show_rays, tr("view.show_rays"));
                ui.checkbox(&mut ui_state.show_axes, tr("view.show_axes"));
                ui.checkbox(&mut ui_state.show_fps, tr("view.show_fps"));

                ui.separator();
                ui.menu_button(tr("view.input_sensitivity"), |ui| {
                    ui.add(
                        egui::Slider::new(&mut panorama.sensitivity_scale, 0.1..=5.0)
                            .text(tr("view.multiplier")),
                    );
                });
            });

            // Language
            ui.menu_button(tr("menu.language"), |ui| {
                let langs: [(&str, &str); 2] = [("en", "English"), ("zh-Hans", "简体中文")];
                for (code, name) in langs {
                    if ui.radio_value(&mut ui_state.lang, code.to_string(), name).clicked() {
                        actions.language_changed = true;
                        ui.close_menu();
                    }
                }
            });
        });
    });

    egui::Window::new(tr("panel.film"))
        .anchor(egui::Align2::RIGHT_TOP, [-8.0, 32.0])
        .default_width(260.0)
        .show(ctx, |ui| {
            film_controls(ui, &mut ui_state.controls, actions);
            ui.separator();
            ui.heading(tr("panel.unwrap"));
            unwrap_controls(ui, &mut ui_state.controls, actions);
        });

    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            if status.is_loading {
                ui.label(egui::RichText::new(tr("status.loading_image")).color(egui::Color32::YELLOW));
                ui.label("|");
            }

            let film_name = match status.film_kind {
                FilmKind::Plane => tr("film.plane"),
                FilmKind::Cylinder => tr("film.cylinder"),
            };
            ui.label(format!("{} {}", tr("status.film_prefix"), film_name));
            ui.label("|");
            ui.label(format!("FOV: {:.1}°", status.fov));
            ui.label("|");
            ui.label(format!("Yaw: {:.1}°", status.yaw));
            ui.label("|");
            ui.label(format!("Pitch: {:.1}°", status.pitch));

            if let Some((h, v)) = status.angular_res {
                ui.label("|");
                ui.label(tr_with(
                    "status.angular_res",
                    &[("h", format!("{:.3}", h)), ("v", format!("{:.3}", v))],
                ));
            }

            if ui_state.show_fps {
                ui.label("|");
                ui.label(egui::RichText::new(format!("FPS: {:.1}", status.fps)).color(egui::Color32::GREEN));
            }
        });
    });
}

fn film_controls(ui: &mut egui::Ui, controls: &mut Controls, actions: &mut UiActions) {
    let mut changed = false;

    ui.label(tr("panel.film_type"));
    ui.horizontal(|ui| {
        changed |= ui
            .radio_value(&mut controls.shapes.kind, FilmKind::Plane, tr("film.plane"))
            .changed();
        changed |= ui
            .radio_value(&mut controls.shapes.kind, FilmKind::Cylinder, tr("film.cylinder"))
            .changed();
    });

    match controls.shapes.active_mut() {
        FilmShape::Plane { width, height } => {
            changed |= ui.add(egui::Slider::new(width, 0.1..=5.0).text(tr("film.width"))).changed();
            changed |= ui.add(egui::Slider::new(height, 0.1..=5.0).text(tr("film.height"))).changed();
        }
        FilmShape::Cylinder {
            radius,
            theta_start,
            theta_length,
            height,
        } => {
            changed |= ui.add(egui::Slider::new(radius, 0.5..=10.0).text(tr("film.radius"))).changed();
            changed |= ui
                .add(egui::Slider::new(theta_start, -PI..=PI).text(tr("film.theta_start")))
                .changed();
            changed |= ui
                .add(egui::Slider::new(theta_length, 0.1..=TAU).text(tr("film.theta_length")))
                .changed();
            changed |= ui.add(egui::Slider::new(height, 0.1..=5.0).text(tr("film.height"))).changed();
        }
    }

    let pose = &mut controls.pose;
    for (value, key) in [
        (&mut pose.rot_x, "film.rot_x"),
        (&mut pose.rot_y, "film.rot_y"),
        (&mut pose.rot_z, "film.rot_z"),
    ] {
        changed |= ui.add(egui::Slider::new(value, -PI..=PI).text(tr(key))).changed();
    }
    for (value, key) in [
        (&mut pose.offset.x, "film.dx"),
        (&mut pose.offset.y, "film.dy"),
        (&mut pose.offset.z, "film.dz"),
    ] {
        changed |= ui.add(egui::Slider::new(value, -10.0..=10.0).text(tr(key))).changed();
    }

    if changed {
        actions.changes.push(ParamChange::Film(controls.film()));
    }

    if ui
        .add(
            egui::Slider::new(&mut controls.ray_step, 1..=1000)
                .logarithmic(true)
                .text(tr("film.ray_step")),
        )
        .changed()
    {
        actions.changes.push(ParamChange::RayStep(controls.ray_step));
    }
}

fn unwrap_controls(ui: &mut egui::Ui, controls: &mut Controls, actions: &mut UiActions) {
    let u = &mut controls.unwrap;
    let mut changed = false;
    changed |= ui.add(egui::Slider::new(&mut u.radius, 0.1..=10.0).text(tr("unwrap.radius"))).changed();
    changed |= ui.add(egui::Slider::new(&mut u.length, 0.1..=10.0).text(tr("unwrap.length"))).changed();
    changed |= ui.add(egui::Slider::new(&mut u.offset, -10.0..=10.0).text(tr("unwrap.offset"))).changed();
    changed |= ui
        .add(egui::Slider::new(&mut u.cut_offset, 0.0..=0.999).text(tr("unwrap.cut_offset")))
        .changed();
    changed |= ui.checkbox(&mut u.mirror, tr("unwrap.mirror")).changed();
    changed |= ui.checkbox(&mut u.show_grid, tr("unwrap.show_grid")).changed();

    if changed {
        actions.changes.push(ParamChange::Unwrap(*u));
    }
}
