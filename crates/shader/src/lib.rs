//! Shader program wrapper over wgpu.
//!
//! Each stage is compiled from WGSL on its own with naga, then linked:
//! entry points and stage interfaces are checked and every `@group(0)`
//! resource is merged into one bind group layout. Uniforms are reflected
//! into a name/location table and written by value, GL style, through
//! [`ShaderProgram::set_uniform`].
//!
//! # Invariants
//! - Compile and link failures never abort: they are logged and leave an
//!   unusable program that draws nothing.
//! - Writing to [`UniformLocation::UNRESOLVED`] is a silent no-op.
//! - Uniform locations are dense and stable for the lifetime of a program.

mod error;
mod interface;
mod program;
mod reflect;
mod source;
mod stage;
mod uniform;

pub use error::ShaderError;
pub use interface::{BindingSlot, ProgramInterface, SlotKind};
pub use program::{PipelineSpec, ProgramId, SNAPSHOTS_PER_FRAME, ShaderProgram};
pub use source::{ProgramSources, load_source, read_source};
pub use stage::{CompiledStage, StageKind};
pub use uniform::{
    ScalarKind, UniformBlock, UniformError, UniformField, UniformLocation, UniformRef,
    UniformStaging, UniformTable, UniformType, UniformValue,
};
