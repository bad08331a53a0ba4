// error.rs：错误类型（全部在本地恢复，仅 RenderError 会终止程序）

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilmError {
    #[error("invalid geometry parameter `{name}` = {value} (clamped to {min})")]
    InvalidGeometryParameter {
        name: &'static str,
        value: f32,
        min: f32,
    },
    #[error("texture load failed: {0}")]
    TextureLoadFailure(String),
    #[error("degenerate sample direction (zero-length vector)")]
    DegenerateSampleDirection,
    #[error("export failed: {0}")]
    Export(String),
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("surface creation failed: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible GPU adapter found")]
    NoAdapter,
    #[error("device request failed: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
}
