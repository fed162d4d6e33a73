use crate::error::ShaderError;
use crate::stage::{CompiledStage, StageKind};
use std::path::{Path, PathBuf};

/// Read a shader source file.
pub fn read_source(path: &Path) -> Result<String, ShaderError> {
    std::fs::read_to_string(path).map_err(|source| ShaderError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a shader source file, logging the failure and returning an empty
/// string when it cannot be read.
pub fn load_source(path: &Path) -> String {
    match read_source(path) {
        Ok(text) => text,
        Err(err) => {
            tracing::error!(path = %path.display(), "{err}");
            String::new()
        }
    }
}

/// Paths to the stage sources of one program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramSources {
    pub vertex: PathBuf,
    pub geometry: Option<PathBuf>,
    pub fragment: PathBuf,
}

impl ProgramSources {
    pub fn new(vertex: impl Into<PathBuf>, fragment: impl Into<PathBuf>) -> Self {
        Self {
            vertex: vertex.into(),
            geometry: None,
            fragment: fragment.into(),
        }
    }

    pub fn with_geometry(mut self, geometry: impl Into<PathBuf>) -> Self {
        self.geometry = Some(geometry.into());
        self
    }

    /// `dir/<stem>.vert.wgsl` and `dir/<stem>.frag.wgsl`, plus
    /// `dir/<stem>.geom.wgsl` when that file exists.
    pub fn from_stem(dir: impl AsRef<Path>, stem: &str) -> Self {
        let dir = dir.as_ref();
        let path = |kind: StageKind| dir.join(format!("{stem}.{}.wgsl", kind.file_infix()));
        let geometry = path(StageKind::Geometry);
        Self {
            vertex: path(StageKind::Vertex),
            geometry: geometry.is_file().then_some(geometry),
            fragment: path(StageKind::Fragment),
        }
    }

    /// Compile every listed stage. Stages that fail are still returned.
    pub fn compile(&self) -> Vec<CompiledStage> {
        let mut stages = vec![CompiledStage::from_file(StageKind::Vertex, &self.vertex)];
        if let Some(geometry) = &self.geometry {
            stages.push(CompiledStage::from_file(StageKind::Geometry, geometry));
        }
        stages.push(CompiledStage::from_file(StageKind::Fragment, &self.fragment));
        stages
    }
}
