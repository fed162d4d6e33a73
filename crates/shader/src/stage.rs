use crate::error::ShaderError;
use crate::source::load_source;
use naga::valid::{Capabilities, ValidationFlags, Validator};
use std::fmt;
use std::path::Path;

/// Pipeline stage a source file is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StageKind {
    Vertex,
    Geometry,
    Fragment,
}

impl StageKind {
    /// Human-readable name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            StageKind::Vertex => "Vertex Shader",
            StageKind::Geometry => "Geometry Shader",
            StageKind::Fragment => "Fragment Shader",
        }
    }

    /// File name infix, as in `cube.vert.wgsl`.
    pub fn file_infix(self) -> &'static str {
        match self {
            StageKind::Vertex => "vert",
            StageKind::Geometry => "geom",
            StageKind::Fragment => "frag",
        }
    }

    pub(crate) fn naga_stage(self) -> Option<naga::ShaderStage> {
        match self {
            StageKind::Vertex => Some(naga::ShaderStage::Vertex),
            StageKind::Fragment => Some(naga::ShaderStage::Fragment),
            StageKind::Geometry => None,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One compiled (or failed) shader stage.
///
/// A failed stage still exists: it carries its diagnostic in
/// [`info_log`](Self::info_log) and makes any program linked from it fail.
#[derive(Debug, Clone)]
pub struct CompiledStage {
    kind: StageKind,
    source: String,
    module: Option<naga::Module>,
    log: String,
}

impl CompiledStage {
    /// Compile WGSL source for `kind`. Failure is logged, not returned.
    pub fn compile(kind: StageKind, source: impl Into<String>) -> Self {
        let source = source.into();
        match parse_and_validate(kind, &source) {
            Ok(module) => {
                tracing::debug!(stage = %kind, "shader stage compiled");
                Self {
                    kind,
                    source,
                    module: Some(module),
                    log: String::new(),
                }
            }
            Err(err) => {
                tracing::error!(stage = %kind, "ERROR shader <{kind}> compilation failed: {err}");
                Self {
                    kind,
                    source,
                    module: None,
                    log: err.to_string(),
                }
            }
        }
    }

    /// Read `path` and compile it. A read failure yields an empty source,
    /// which then fails to compile.
    pub fn from_file(kind: StageKind, path: impl AsRef<Path>) -> Self {
        Self::compile(kind, load_source(path.as_ref()))
    }

    pub fn kind(&self) -> StageKind {
        self.kind
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_compiled(&self) -> bool {
        self.module.is_some()
    }

    /// Compiler diagnostic, empty on success.
    pub fn info_log(&self) -> &str {
        &self.log
    }

    pub(crate) fn module(&self) -> Option<&naga::Module> {
        self.module.as_ref()
    }
}

fn parse_and_validate(kind: StageKind, source: &str) -> Result<naga::Module, ShaderError> {
    if source.trim().is_empty() {
        return Err(ShaderError::EmptySource(kind));
    }

    let module = naga::front::wgsl::parse_str(source).map_err(|err| ShaderError::Compile {
        stage: kind,
        diagnostic: err.emit_to_string(source),
    })?;

    Validator::new(ValidationFlags::all(), Capabilities::FLOAT64)
        .validate(&module)
        .map_err(|err| ShaderError::Compile {
            stage: kind,
            diagnostic: err.emit_to_string(source),
        })?;

    Ok(module)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(position, 1.0);
}
"#;

    #[test]
    fn valid_source_compiles() {
        let stage = CompiledStage::compile(StageKind::Vertex, VALID);
        assert!(stage.is_compiled());
        assert!(stage.info_log().is_empty());
        assert_eq!(stage.kind(), StageKind::Vertex);
    }

    #[test]
    fn syntax_error_is_reported_not_raised() {
        let stage = CompiledStage::compile(StageKind::Fragment, "fn broken( {");
        assert!(!stage.is_compiled());
        assert!(stage.info_log().contains("Fragment Shader"));
        assert!(stage.info_log().contains("compilation failed"));
    }

    #[test]
    fn type_error_is_reported() {
        let src = r#"
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    let x: f32 = vec2<f32>(1.0, 2.0);
    return vec4<f32>(x);
}
"#;
        let stage = CompiledStage::compile(StageKind::Fragment, src);
        assert!(!stage.is_compiled());
        assert!(!stage.info_log().is_empty());
    }

    #[test]
    fn empty_source_fails() {
        let stage = CompiledStage::compile(StageKind::Vertex, "  \n\t");
        assert!(!stage.is_compiled());
        assert!(stage.info_log().contains("no source text"));
    }

    #[test]
    fn missing_file_fails_twice_over() {
        let dir = tempfile::tempdir().unwrap();
        let stage = CompiledStage::from_file(StageKind::Vertex, dir.path().join("nope.vert.wgsl"));
        assert!(!stage.is_compiled());
        assert!(stage.source().is_empty());
    }

    #[test]
    fn stage_names_are_human_readable() {
        assert_eq!(StageKind::Vertex.to_string(), "Vertex Shader");
        assert_eq!(StageKind::Geometry.to_string(), "Geometry Shader");
        assert_eq!(StageKind::Fragment.file_infix(), "frag");
    }
}
