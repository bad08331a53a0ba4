// renderer.rs：多视口渲染器（天空 / 胶片 / 射线 / 展开图 + egui）

use film_projector::compositor::{PassKind, ViewportLayout};
use film_projector::orbit::OrbitCamera;
use film_projector::panorama::CameraPose;
use film_projector::scene::FilmScene;
use film_projector::texture::EnvironmentTexture;
use film_projector::unwrap::UnwrapParameters;
use film_projector::RenderError;
use glam::{Mat3, Mat4, Vec3};
use wgpu::util::DeviceExt;
use winit::window::Window;

const RAY_COLOR: [f32; 3] = [1.0, 0.667, 0.0]; // #ffaa00
const AXES_LENGTH: f32 = 2.0;

fn setup_egui_ui_fonts(ctx: &egui::Context) {
    // 只有中日韩等界面语言需要额外字体：系统字体目录优先，其次 ./assets。
    // ab_glyph 对 .ttc 支持不稳定，解析失败的候选直接跳过。
    let mut candidates: Vec<std::path::PathBuf> = Vec::new();

    if cfg!(windows) {
        let win_fonts = std::path::PathBuf::from(r"C:\Windows\Fonts");
        for f in ["msyh.ttf", "simhei.ttf", "Deng.ttf", "malgun.ttf", "meiryo.ttf"] {
            candidates.push(win_fonts.join(f));
        }
    } else if cfg!(target_os = "macos") {
        for f in [
            "/System/Library/Fonts/PingFang.ttc",
            "/System/Library/Fonts/Hiragino Sans GB.ttc",
            "/System/Library/Fonts/Supplemental/Arial Unicode.ttf",
            "/Library/Fonts/NotoSansSC-Regular.otf",
        ] {
            candidates.push(std::path::PathBuf::from(f));
        }
    } else if cfg!(unix) {
        for f in [
            "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
            "/usr/share/fonts/truetype/noto/NotoSansCJK-Regular.ttc",
            "/usr/share/fonts/opentype/noto/NotoSansSC-Regular.otf",
            "/usr/share/fonts/truetype/wqy/wqy-microhei.ttc",
            "/usr/share/fonts/truetype/wqy/wqy-zenhei.ttc",
        ] {
            candidates.push(std::path::PathBuf::from(f));
        }
    }

    let asset_files = ["NotoSansSC-Regular.otf", "NotoSansSC-Regular.ttf", "NotoSansCJK-Regular.ttc"];
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            for f in asset_files {
                candidates.push(dir.join("assets").join(f));
            }
        }
    }
    for f in asset_files {
        candidates.push(std::path::PathBuf::from("assets").join(f));
    }

    let chosen = candidates.into_iter().find_map(|p| {
        let bytes = std::fs::read(&p).ok()?;
        ab_glyph::FontRef::try_from_slice(&bytes).ok()?;
        Some((p, bytes))
    });

    let Some((font_path, font_bytes)) = chosen else {
        log::warn!("{}", film_projector::i18n::tr("font.not_found"));
        return;
    };

    log::info!(
        "{}",
        film_projector::i18n::tr_with("font.using", &[("path", font_path.display().to_string())])
    );

    let mut fonts = egui::FontDefinitions::default();
    fonts
        .font_data
        .insert("ui".to_owned(), egui::FontData::from_owned(font_bytes));
    for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
        if let Some(list) = fonts.families.get_mut(&family) {
            // 放在默认字体之后，拉丁字符仍用 egui 自带字体
            list.push("ui".to_owned());
        }
    }
    ctx.set_fonts(fonts);
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct CameraUniform {
    view_proj: [[f32; 4]; 4],
    cam_to_world: [[f32; 4]; 4],
    params: [f32; 4], // x = tan(fov/2), y = aspect
}

impl CameraUniform {
    fn new(view_proj: Mat4, rotation: Mat3, fov_y: f32, aspect: f32) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            cam_to_world: Mat4::from_mat3(rotation).to_cols_array_2d(),
            params: [(fov_y * 0.5).tan(), aspect, 0.0, 0.0],
        }
    }

    fn panorama(pose: &CameraPose, aspect: f32) -> Self {
        Self::new(pose.view_proj(aspect), pose.rotation, pose.fov_y, aspect)
    }

    fn orbit(cam: &OrbitCamera, aspect: f32) -> Self {
        Self::new(cam.view_proj(aspect), cam.rotation(), cam.fov_y, aspect)
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct UnwrapUniform {
    rotation: [[f32; 4]; 4],
    radius: f32,
    length: f32,
    offset: f32,
    cut_offset: f32,
    mirror: u32,
    show_grid: u32,
    pad0: u32,
    pad1: u32,
}

impl UnwrapUniform {
    fn new(params: &UnwrapParameters, rotation: Mat3) -> Self {
        Self {
            rotation: Mat4::from_mat3(rotation).to_cols_array_2d(),
            radius: params.radius,
            length: params.length,
            offset: params.offset,
            cut_offset: params.cut_offset,
            mirror: params.mirror as u32,
            show_grid: params.show_grid as u32,
            pad0: 0,
            pad1: 0,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct FilmVertex {
    position: [f32; 3],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct LineVertex {
    position: [f32; 3],
    color: [f32; 3],
}

const FILM_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
const LINE_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

/// 胶片网格的 GPU 缓冲；重建时整体替换，旧缓冲随 drop 释放。
struct FilmMesh {
    vertex_buf: wgpu::Buffer,
    index_buf: wgpu::Buffer,
    index_count: u32,
}

struct LineBuffer {
    vertex_buf: wgpu::Buffer,
    vertex_count: u32,
}

/// 每帧渲染需要的只读输入。
pub struct FrameInputs<'a> {
    pub layout: &'a ViewportLayout,
    pub panorama: CameraPose,
    pub orbit: OrbitCamera,
    pub unwrap: UnwrapParameters,
    pub show_rays: bool,
    pub show_axes: bool,
}

pub struct Renderer {
    surface: wgpu::Surface,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pub size: winit::dpi::PhysicalSize<u32>,

    sky_pipeline: wgpu::RenderPipeline,
    film_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    unwrap_pipeline: wgpu::RenderPipeline,

    // 纹理资源
    bind_group_layout: wgpu::BindGroupLayout,
    texture_view: wgpu::TextureView,
    sampler: wgpu::Sampler,

    // 每个 pass 一份 uniform，同一帧内互不覆盖
    panorama_buffer: wgpu::Buffer,
    orbit_buffer: wgpu::Buffer,
    unwrap_buffer: wgpu::Buffer,
    panorama_bind_group: wgpu::BindGroup,
    orbit_bind_group: wgpu::BindGroup,
    unwrap_bind_group: wgpu::BindGroup,

    film_mesh: Option<FilmMesh>,
    rays: Option<LineBuffer>,
    axes: LineBuffer,
    geometry_generation: Option<u64>,
    texture_generation: Option<u64>,

    // UI
    pub egui_ctx: egui::Context,
    pub egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Renderer {
    pub async fn new(window: std::sync::Arc<Window>) -> Result<Self, RenderError> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // window 的 Arc 由 main 持有，生命周期覆盖整个 surface
        let surface = unsafe { instance.create_surface(window.as_ref()) }?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;
        log::info!("GPU: {} ({:?})", adapter.get_info().name, adapter.get_info().backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    features: wgpu::Features::empty(),
                    limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                    label: None,
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        // --- 1. Texture / Sampler ---
        // 先放一张 1x1 占位，sync_scene 会立即换成场景里的贴图
        let texture_view = create_env_texture(&device, &queue, 1, 1, &[128, 128, 128, 255]);
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::Repeat, // 全景图水平循环
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        // --- 2. Uniforms ---
        let camera_init = CameraUniform::new(Mat4::IDENTITY, Mat3::IDENTITY, 1.0, 1.0);
        let panorama_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Panorama Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera_init]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let orbit_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Orbit Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera_init]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let unwrap_init = UnwrapUniform::new(&UnwrapParameters::default(), Mat3::IDENTITY);
        let unwrap_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Unwrap Buffer"),
            contents: bytemuck::cast_slice(&[unwrap_init]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    // Camera / Unwrap uniform
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    // Texture
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    // Sampler
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
            label: Some("scene_bind_group_layout"),
        });

        let make_group = |buffer: &wgpu::Buffer, label: &str| {
            create_bind_group(&device, &bind_group_layout, buffer, &texture_view, &sampler, label)
        };
        let panorama_bind_group = make_group(&panorama_buffer, "panorama_bind_group");
        let orbit_bind_group = make_group(&orbit_buffer, "orbit_bind_group");
        let unwrap_bind_group = make_group(&unwrap_buffer, "unwrap_bind_group");

        // --- 3. Pipelines ---
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let format = config.format;

        let sky_shader = device.create_shader_module(wgpu::include_wgsl!("shaders/sky.wgsl"));
        let film_shader = device.create_shader_module(wgpu::include_wgsl!("shaders/film.wgsl"));
        let line_shader = device.create_shader_module(wgpu::include_wgsl!("shaders/lines.wgsl"));
        let unwrap_shader = device.create_shader_module(wgpu::include_wgsl!("shaders/unwrap.wgsl"));

        let sky_pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            &sky_shader,
            &[], // 无顶点缓冲，全屏三角形由 shader 生成
            wgpu::PrimitiveTopology::TriangleList,
            format,
            "Sky Pipeline",
        );
        let film_pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            &film_shader,
            &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<FilmVertex>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &FILM_ATTRIBUTES,
            }],
            wgpu::PrimitiveTopology::TriangleList,
            format,
            "Film Pipeline",
        );
        let line_pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            &line_shader,
            &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<LineVertex>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &LINE_ATTRIBUTES,
            }],
            wgpu::PrimitiveTopology::LineList,
            format,
            "Line Pipeline",
        );
        let unwrap_pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            &unwrap_shader,
            &[],
            wgpu::PrimitiveTopology::TriangleList,
            format,
            "Unwrap Pipeline",
        );

        let axes = create_line_buffer(&device, &axes_vertices(AXES_LENGTH), "Axes Buffer");

        // --- 4. Egui ---
        let egui_ctx = egui::Context::default();
        setup_egui_ui_fonts(&egui_ctx);

        let mut egui_state = egui_winit::State::new(window.as_ref());
        egui_state.set_pixels_per_point(window.scale_factor() as f32);

        let egui_renderer = egui_wgpu::Renderer::new(&device, config.format, None, 1);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            sky_pipeline,
            film_pipeline,
            line_pipeline,
            unwrap_pipeline,
            bind_group_layout,
            texture_view,
            sampler,
            panorama_buffer,
            orbit_buffer,
            unwrap_buffer,
            panorama_bind_group,
            orbit_bind_group,
            unwrap_bind_group,
            film_mesh: None,
            rays: None,
            axes,
            geometry_generation: None,
            texture_generation: None,
            egui_ctx,
            egui_state,
            egui_renderer,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// 场景有新几何或新贴图时整体重新上传。
    pub fn sync_scene(&mut self, scene: &FilmScene) {
        if self.texture_generation != Some(scene.texture_generation()) {
            self.upload_environment(scene.environment());
            self.texture_generation = Some(scene.texture_generation());
        }

        if self.geometry_generation != Some(scene.geometry_generation()) {
            let surface = scene.surface();
            let vertices: Vec<FilmVertex> = surface
                .world_positions()
                .into_iter()
                .map(|p| FilmVertex { position: p.to_array() })
                .collect();
            self.film_mesh = if vertices.is_empty() || surface.indices.is_empty() {
                None
            } else {
                Some(FilmMesh {
                    vertex_buf: self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Film Vertex Buffer"),
                        contents: bytemuck::cast_slice(&vertices),
                        usage: wgpu::BufferUsages::VERTEX,
                    }),
                    index_buf: self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Film Index Buffer"),
                        contents: bytemuck::cast_slice(&surface.indices),
                        usage: wgpu::BufferUsages::INDEX,
                    }),
                    index_count: surface.indices.len() as u32,
                })
            };

            let ray_vertices: Vec<LineVertex> = scene
                .rays()
                .segments
                .iter()
                .flat_map(|[a, b]| {
                    [
                        LineVertex { position: a.to_array(), color: RAY_COLOR },
                        LineVertex { position: b.to_array(), color: RAY_COLOR },
                    ]
                })
                .collect();
            self.rays = if ray_vertices.is_empty() {
                None
            } else {
                Some(create_line_buffer(&self.device, &ray_vertices, "Ray Buffer"))
            };

            self.geometry_generation = Some(scene.geometry_generation());
        }
    }

    fn upload_environment(&mut self, env: &EnvironmentTexture) {
        // 超过 GPU 纹理尺寸限制时先缩放；uv 是归一化坐标，缩放不影响采样位置
        let max_dim = self.device.limits().max_texture_dimension_2d;
        let (src_w, src_h) = env.dimensions();

        let scaled;
        let img = if src_w > max_dim || src_h > max_dim {
            let scale = (max_dim as f32 / src_w.max(src_h) as f32).min(1.0);
            let new_w = ((src_w as f32 * scale) as u32).max(1);
            let new_h = ((src_h as f32 * scale) as u32).max(1);
            log::warn!(
                "{}",
                film_projector::i18n::tr_with(
                    "gpu.image_too_large_scaled",
                    &[
                        ("src_w", src_w.to_string()),
                        ("src_h", src_h.to_string()),
                        ("max", max_dim.to_string()),
                        ("new_w", new_w.to_string()),
                        ("new_h", new_h.to_string()),
                    ]
                )
            );
            scaled = image::imageops::resize(
                env.image(),
                new_w,
                new_h,
                image::imageops::FilterType::Lanczos3,
            );
            &scaled
        } else {
            env.image()
        };

        // GPU 端 v = 0 从纹理第一行开始；按行翻转后与 CPU 采样一致（v = 0 为图像底边）
        let flipped = image::imageops::flip_vertical(img);
        let (width, height) = flipped.dimensions();
        self.texture_view =
            create_env_texture(&self.device, &self.queue, width, height, flipped.as_raw());

        // 贴图换了，三个 bind group 全部重建
        self.panorama_bind_group = create_bind_group(
            &self.device,
            &self.bind_group_layout,
            &self.panorama_buffer,
            &self.texture_view,
            &self.sampler,
            "panorama_bind_group",
        );
        self.orbit_bind_group = create_bind_group(
            &self.device,
            &self.bind_group_layout,
            &self.orbit_buffer,
            &self.texture_view,
            &self.sampler,
            "orbit_bind_group",
        );
        self.unwrap_bind_group = create_bind_group(
            &self.device,
            &self.bind_group_layout,
            &self.unwrap_buffer,
            &self.texture_view,
            &self.sampler,
            "unwrap_bind_group",
        );
    }

    pub fn render_with_ui(
        &mut self,
        window: &Window,
        frame: &FrameInputs,
        run_ui: impl FnOnce(&egui::Context),
    ) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        // 每个 pass 的 aspect 来自本帧布局，不缓存
        for pass in &frame.layout.passes {
            match pass.kind {
                PassKind::Panorama => self.queue.write_buffer(
                    &self.panorama_buffer,
                    0,
                    bytemuck::cast_slice(&[CameraUniform::panorama(&frame.panorama, pass.aspect)]),
                ),
                PassKind::FreeOrbit => self.queue.write_buffer(
                    &self.orbit_buffer,
                    0,
                    bytemuck::cast_slice(&[CameraUniform::orbit(&frame.orbit, pass.aspect)]),
                ),
                PassKind::Unwrap => self.queue.write_buffer(
                    &self.unwrap_buffer,
                    0,
                    bytemuck::cast_slice(&[UnwrapUniform::new(&frame.unwrap, frame.panorama.rotation)]),
                ),
            }
        }

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });

        // 1. 场景：按固定顺序逐个 pass 设置 viewport + scissor 后绘制
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r: 0.1, g: 0.1, b: 0.1, a: 1.0 }),
                        store: true,
                    },
                })],
                depth_stencil_attachment: None,
            });

            for pass in &frame.layout.passes {
                let r = pass.viewport;
                // 布局来自上一帧的窗口尺寸时可能越界，夹到当前 surface 内
                let x = r.x.min(self.config.width);
                let y = r.y.min(self.config.height);
                let w = r.width.min(self.config.width - x);
                let h = r.height.min(self.config.height - y);
                if w == 0 || h == 0 {
                    continue;
                }
                render_pass.set_viewport(x as f32, y as f32, w as f32, h as f32, 0.0, 1.0);
                render_pass.set_scissor_rect(x, y, w, h);

                match pass.kind {
                    PassKind::Panorama => {
                        self.draw_3d(&mut render_pass, &self.panorama_bind_group, frame.show_rays, false);
                    }
                    PassKind::FreeOrbit => {
                        self.draw_3d(&mut render_pass, &self.orbit_bind_group, frame.show_rays, frame.show_axes);
                    }
                    PassKind::Unwrap => {
                        render_pass.set_pipeline(&self.unwrap_pipeline);
                        render_pass.set_bind_group(0, &self.unwrap_bind_group, &[]);
                        render_pass.draw(0..3, 0..1);
                    }
                }
            }
        }

        // 2. Render UI
        let raw_input = self.egui_state.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, run_ui);

        self.egui_state
            .handle_platform_output(window, &self.egui_ctx, full_output.platform_output);
        let clipped_primitives = self.egui_ctx.tessellate(full_output.shapes);

        let screen_descriptor = egui_wgpu::renderer::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: window.scale_factor() as f32,
        };

        for (id, delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, delta);
        }

        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &clipped_primitives,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations { load: wgpu::LoadOp::Load, store: true },
                })],
                depth_stencil_attachment: None,
            });
            self.egui_renderer
                .render(&mut render_pass, &clipped_primitives, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    /// 天空 -> 胶片 -> 射线 -> 坐标轴。没有深度缓冲，靠绘制顺序叠放。
    fn draw_3d<'a>(
        &'a self,
        render_pass: &mut wgpu::RenderPass<'a>,
        bind_group: &'a wgpu::BindGroup,
        show_rays: bool,
        show_axes: bool,
    ) {
        render_pass.set_bind_group(0, bind_group, &[]);

        render_pass.set_pipeline(&self.sky_pipeline);
        render_pass.draw(0..3, 0..1);

        if let Some(mesh) = &self.film_mesh {
            render_pass.set_pipeline(&self.film_pipeline);
            render_pass.set_vertex_buffer(0, mesh.vertex_buf.slice(..));
            render_pass.set_index_buffer(mesh.index_buf.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }

        let mut lines: Vec<&LineBuffer> = Vec::with_capacity(2);
        if show_rays {
            lines.extend(self.rays.as_ref());
        }
        if show_axes {
            lines.push(&self.axes);
        }
        if !lines.is_empty() {
            render_pass.set_pipeline(&self.line_pipeline);
            for line in lines {
                render_pass.set_vertex_buffer(0, line.vertex_buf.slice(..));
                render_pass.draw(0..line.vertex_count, 0..1);
            }
        }
    }
}

fn create_env_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    width: u32,
    height: u32,
    rgba: &[u8],
) -> wgpu::TextureView {
    let texture_size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        size: texture_size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        label: Some("environment_texture"),
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        rgba,
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        texture_size,
    );
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn create_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    uniform: &wgpu::Buffer,
    texture_view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
    label: &str,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(texture_view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
        label: Some(label),
    })
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    buffers: &[wgpu::VertexBufferLayout],
    topology: wgpu::PrimitiveTopology,
    format: wgpu::TextureFormat,
    label: &str,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: "vs_main",
            buffers,
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None, // 胶片双面可见
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
    })
}

fn create_line_buffer(device: &wgpu::Device, vertices: &[LineVertex], label: &str) -> LineBuffer {
    LineBuffer {
        vertex_buf: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        }),
        vertex_count: vertices.len() as u32,
    }
}

/// X 红、Y 绿、Z 蓝。
fn axes_vertices(length: f32) -> Vec<LineVertex> {
    [
        (Vec3::X, [1.0, 0.0, 0.0]),
        (Vec3::Y, [0.0, 1.0, 0.0]),
        (Vec3::Z, [0.0, 0.0, 1.0]),
    ]
    .into_iter()
    .flat_map(|(axis, color)| {
        [
            LineVertex { position: [0.0; 3], color },
            LineVertex { position: (axis * length).to_array(), color },
        ]
    })
    .collect()
}
