use std::path::PathBuf;

/// Errors from bringing up the surface, adapter and device.
#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible GPU adapter found")]
    NoAdapter,
    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
}

/// Errors from asset loading, plus bootstrap failures for callers that
/// handle both in one place.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to load texture (path: {path}): {source}")]
    Texture {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error(transparent)]
    Gpu(#[from] GpuError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_errors_pass_through_unchanged() {
        let err = RenderError::from(GpuError::NoAdapter);
        assert!(matches!(err, RenderError::Gpu(GpuError::NoAdapter)));
        assert_eq!(err.to_string(), GpuError::NoAdapter.to_string());
    }
}
