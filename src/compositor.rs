// compositor.rs：多视口布局（锁定双栏 / 自由视角三栏）
//
// 像素坐标原点在左上角（wgpu 约定）。每个 pass 独占一个 viewport + scissor
// 矩形，按 全景 -> 自由视角 -> 展开 的固定顺序绘制。

use crate::orbit::OrbitCamera;

/// 上方 3D 区域占窗口高度的比例。
pub const TOP_FRACTION: f32 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    Panorama,
    FreeOrbit,
    Unwrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x as f32
            && py >= self.y as f32
            && px < (self.x + self.width) as f32
            && py < (self.y + self.height) as f32
    }

    fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// 单个渲染 pass：viewport 与 scissor 相同，aspect 每帧由当前尺寸重新计算。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderPass {
    pub kind: PassKind,
    pub viewport: Rect,
    pub aspect: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewportLayout {
    pub window: (u32, u32),
    pub free_view: bool,
    pub passes: Vec<RenderPass>,
}

impl ViewportLayout {
    pub fn compute(width: u32, height: u32, free_view: bool) -> Self {
        let top_h = ((height as f32) * TOP_FRACTION).round() as u32;
        let top_h = top_h.min(height);
        let bottom_h = height - top_h;

        let mut rects = Vec::with_capacity(3);
        if free_view {
            let left_w = width / 2;
            rects.push((
                PassKind::Panorama,
                Rect { x: 0, y: 0, width: left_w, height: top_h },
            ));
            rects.push((
                PassKind::FreeOrbit,
                Rect { x: left_w, y: 0, width: width - left_w, height: top_h },
            ));
        } else {
            rects.push((
                PassKind::Panorama,
                Rect { x: 0, y: 0, width, height: top_h },
            ));
        }
        rects.push((
            PassKind::Unwrap,
            Rect { x: 0, y: top_h, width, height: bottom_h },
        ));

        let passes = rects
            .into_iter()
            .filter(|(_, r)| r.area() > 0)
            .map(|(kind, viewport)| RenderPass {
                kind,
                viewport,
                aspect: viewport.aspect(),
            })
            .collect();

        Self {
            window: (width, height),
            free_view,
            passes,
        }
    }

    pub fn pass(&self, kind: PassKind) -> Option<&RenderPass> {
        self.passes.iter().find(|p| p.kind == kind)
    }

    /// 导出时需要的子矩形：底部展开栏。
    pub fn unwrap_rect(&self) -> Option<Rect> {
        self.pass(PassKind::Unwrap).map(|p| p.viewport)
    }

    /// 鼠标所在的 pass，用于分发拖动事件。
    pub fn hit_test(&self, px: f32, py: f32) -> Option<PassKind> {
        self.passes
            .iter()
            .find(|p| p.viewport.contains(px, py))
            .map(|p| p.kind)
    }

    /// 所有 pass 两两不重叠。
    pub fn is_exclusive(&self) -> bool {
        self.passes.iter().enumerate().all(|(i, a)| {
            self.passes[i + 1..]
                .iter()
                .all(|b| !a.viewport.intersects(&b.viewport))
        })
    }
}

/// 布局状态机。模式切换先挂起，下一帧开始时生效；每次切换都把自由视角
/// 相机重置到规范姿态。
pub struct Compositor {
    free_view: bool,
    pending: Option<bool>,
    free_camera: OrbitCamera,
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Compositor {
    pub fn new(free_view: bool) -> Self {
        Self {
            free_view,
            pending: None,
            free_camera: OrbitCamera::default(),
        }
    }

    pub fn free_view(&self) -> bool {
        self.free_view
    }

    /// 目标模式（含尚未生效的请求）。
    pub fn requested_free_view(&self) -> bool {
        self.pending.unwrap_or(self.free_view)
    }

    pub fn request_free_view(&mut self, enabled: bool) {
        self.pending = Some(enabled);
    }

    pub fn toggle_free_view(&mut self) {
        let next = !self.requested_free_view();
        self.request_free_view(next);
    }

    pub fn free_camera(&self) -> &OrbitCamera {
        &self.free_camera
    }

    pub fn free_camera_mut(&mut self) -> &mut OrbitCamera {
        &mut self.free_camera
    }

    /// 每帧调用一次：应用挂起的模式切换，并按当前窗口尺寸重新计算布局。
    pub fn begin_frame(&mut self, width: u32, height: u32) -> ViewportLayout {
        if let Some(next) = self.pending.take() {
            if next != self.free_view {
                self.free_view = next;
                self.free_camera = OrbitCamera::default();
                log::debug!("free view -> {}", next);
            }
        }
        ViewportLayout::compute(width, height, self.free_view)
    }
}
