use crate::stage::StageKind;
use std::path::PathBuf;

/// Errors from reading, compiling and linking shader stages.
///
/// None of these abort the program: the wrapper logs them and keeps an
/// unusable program around instead.
#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    #[error("couldn't read shader file (path: {path}): {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} has no source text")]
    EmptySource(StageKind),
    #[error("{stage} compilation failed:\n{diagnostic}")]
    Compile {
        stage: StageKind,
        diagnostic: String,
    },
    #[error("{0} did not compile")]
    StageNotCompiled(StageKind),
    #[error("program needs exactly one {0}")]
    MissingStage(StageKind),
    #[error("program has more than one {0}")]
    DuplicateStage(StageKind),
    #[error("geometry stage is not supported by the wgpu backend")]
    GeometryUnsupported,
    #[error("{0} has no entry point for its stage")]
    MissingEntryPoint(StageKind),
    #[error("fragment input @location({0}) is not written by the vertex stage")]
    UnmatchedInput(u32),
    #[error("binding {binding} is declared differently by the vertex and fragment stages")]
    LayoutMismatch { binding: u32 },
    #[error("`{name}` uses bind group {group}; only group 0 is supported")]
    UnsupportedGroup { name: String, group: u32 },
    #[error("`{name}` has an unsupported resource type: {detail}")]
    UnsupportedResource { name: String, detail: String },
    #[error("uniform `{0}` is declared more than once")]
    DuplicateUniform(String),
    #[error("pipeline creation failed: {0}")]
    Pipeline(String),
}
