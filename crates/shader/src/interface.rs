use crate::error::ShaderError;
use crate::reflect::{ResourceKind, StageReflection, reflect};
use crate::stage::{CompiledStage, StageKind};
use crate::uniform::{UniformBlock, UniformTable};
use std::collections::BTreeMap;

/// What a bind group slot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    /// Index into [`UniformTable::blocks`].
    Uniform { block: usize },
    Texture,
    Sampler,
}

/// One `@group(0) @binding(n)` resource of a linked program.
#[derive(Debug, Clone, PartialEq)]
pub struct BindingSlot {
    pub name: String,
    pub binding: u32,
    pub kind: SlotKind,
    pub visibility: wgpu::ShaderStages,
}

/// The linked, GPU-independent view of a program: entry points, the
/// merged resource layout and the uniform table.
#[derive(Debug, Clone)]
pub struct ProgramInterface {
    vertex_entry: String,
    fragment_entry: String,
    slots: Vec<BindingSlot>,
    uniforms: UniformTable,
}

impl ProgramInterface {
    /// Check that `stages` form a usable program and merge their resources.
    pub fn link(stages: &[CompiledStage]) -> Result<Self, ShaderError> {
        if let Some(failed) = stages.iter().find(|stage| !stage.is_compiled()) {
            return Err(ShaderError::StageNotCompiled(failed.kind()));
        }
        if stages.iter().any(|stage| stage.kind() == StageKind::Geometry) {
            return Err(ShaderError::GeometryUnsupported);
        }

        let vertex = single_stage(stages, StageKind::Vertex)?;
        let fragment = single_stage(stages, StageKind::Fragment)?;
        let (vertex_entry, vertex_info) = reflect_stage(vertex)?;
        let (fragment_entry, fragment_info) = reflect_stage(fragment)?;

        if let Some(missing) = fragment_info
            .inputs
            .iter()
            .find(|location| !vertex_info.outputs.contains(location))
        {
            return Err(ShaderError::UnmatchedInput(*missing));
        }

        let mut merged: BTreeMap<u32, (String, ResourceKind, wgpu::ShaderStages)> = BTreeMap::new();
        for (info, visibility) in [
            (vertex_info, wgpu::ShaderStages::VERTEX),
            (fragment_info, wgpu::ShaderStages::FRAGMENT),
        ] {
            for resource in info.resources {
                match merged.get_mut(&resource.binding) {
                    Some((_, kind, seen_by)) => {
                        if *kind != resource.kind {
                            return Err(ShaderError::LayoutMismatch {
                                binding: resource.binding,
                            });
                        }
                        *seen_by |= visibility;
                    }
                    None => {
                        merged.insert(resource.binding, (resource.name, resource.kind, visibility));
                    }
                }
            }
        }

        let mut uniforms = UniformTable::default();
        let mut slots = Vec::with_capacity(merged.len());
        for (binding, (name, kind, visibility)) in merged {
            let kind = match kind {
                ResourceKind::Uniform(layout) => {
                    let block = uniforms.blocks().len();
                    uniforms.push_block(
                        UniformBlock {
                            name: name.clone(),
                            binding,
                            size: layout.size,
                        },
                        layout.fields,
                    )?;
                    SlotKind::Uniform { block }
                }
                ResourceKind::Texture => SlotKind::Texture,
                ResourceKind::Sampler => SlotKind::Sampler,
            };
            slots.push(BindingSlot {
                name,
                binding,
                kind,
                visibility,
            });
        }

        Ok(Self {
            vertex_entry,
            fragment_entry,
            slots,
            uniforms,
        })
    }

    pub fn vertex_entry(&self) -> &str {
        &self.vertex_entry
    }

    pub fn fragment_entry(&self) -> &str {
        &self.fragment_entry
    }

    /// Resource slots in ascending binding order.
    pub fn slots(&self) -> &[BindingSlot] {
        &self.slots
    }

    pub fn slot(&self, name: &str, kind: SlotKind) -> Option<&BindingSlot> {
        self.slots
            .iter()
            .find(|slot| slot.name == name && slot.kind == kind)
    }

    pub fn uniforms(&self) -> &UniformTable {
        &self.uniforms
    }
}

fn single_stage(stages: &[CompiledStage], kind: StageKind) -> Result<&CompiledStage, ShaderError> {
    let mut matching = stages.iter().filter(|stage| stage.kind() == kind);
    let first = matching.next().ok_or(ShaderError::MissingStage(kind))?;
    if matching.next().is_some() {
        return Err(ShaderError::DuplicateStage(kind));
    }
    Ok(first)
}

fn reflect_stage(stage: &CompiledStage) -> Result<(String, StageReflection), ShaderError> {
    let kind = stage.kind();
    let (Some(module), Some(naga_stage)) = (stage.module(), kind.naga_stage()) else {
        return Err(ShaderError::StageNotCompiled(kind));
    };
    let info = reflect(module, naga_stage)?;
    let entry = info
        .entry_point
        .clone()
        .ok_or(ShaderError::MissingEntryPoint(kind))?;
    Ok((entry, info))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uniform::{ScalarKind, UniformType};

    const VERTEX: &str = r#"
struct Camera {
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> camera: Camera;

struct VertexOutput {
    @builtin(position) clip: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@location(0) position: vec3<f32>, @location(1) uv: vec2<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.clip = camera.projection * camera.view * vec4<f32>(position, 1.0);
    out.uv = uv;
    return out;
}
"#;

    const FRAGMENT: &str = r#"
@group(0) @binding(1)
var<uniform> strength: f32;
@group(0) @binding(2)
var tex: texture_2d<f32>;
@group(0) @binding(3)
var samp: sampler;

@fragment
fn fs_main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {
    return textureSample(tex, samp, uv) * strength;
}
"#;

    fn stages(vertex: &str, fragment: &str) -> Vec<CompiledStage> {
        vec![
            CompiledStage::compile(StageKind::Vertex, vertex),
            CompiledStage::compile(StageKind::Fragment, fragment),
        ]
    }

    #[test]
    fn links_and_merges_resources() {
        let interface = ProgramInterface::link(&stages(VERTEX, FRAGMENT)).unwrap();
        assert_eq!(interface.vertex_entry(), "vs_main");
        assert_eq!(interface.fragment_entry(), "fs_main");

        let kinds: Vec<_> = interface
            .slots()
            .iter()
            .map(|slot| (slot.binding, slot.kind))
            .collect();
        assert_eq!(
            kinds,
            [
                (0, SlotKind::Uniform { block: 0 }),
                (1, SlotKind::Uniform { block: 1 }),
                (2, SlotKind::Texture),
                (3, SlotKind::Sampler),
            ]
        );
        assert_eq!(interface.slots()[0].visibility, wgpu::ShaderStages::VERTEX);
        assert_eq!(interface.slots()[2].visibility, wgpu::ShaderStages::FRAGMENT);

        let uniforms = interface.uniforms();
        assert_eq!(uniforms.len(), 3);
        let projection = uniforms.field(uniforms.resolve("projection")).unwrap();
        assert_eq!(projection.ty, UniformType::Mat4);
        assert_eq!(projection.offset, 64);
        let strength = uniforms.field(uniforms.resolve("strength")).unwrap();
        assert_eq!(strength.ty, UniformType::Scalar(ScalarKind::Float));
        assert_eq!(strength.block, 1);
        assert!(interface.slot("tex", SlotKind::Texture).is_some());
        assert!(interface.slot("tex", SlotKind::Sampler).is_none());
    }

    #[test]
    fn shared_binding_widens_visibility() {
        let fragment = r#"
struct Camera {
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
};
@group(0) @binding(0)
var<uniform> camera: Camera;

@fragment
fn fs_main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {
    return camera.view[0] * uv.x;
}
"#;
        let interface = ProgramInterface::link(&stages(VERTEX, fragment)).unwrap();
        assert_eq!(interface.slots().len(), 1);
        assert_eq!(
            interface.slots()[0].visibility,
            wgpu::ShaderStages::VERTEX_FRAGMENT
        );
        assert_eq!(interface.uniforms().len(), 2);
    }

    #[test]
    fn conflicting_binding_fails() {
        let fragment = r#"
@group(0) @binding(0)
var<uniform> scale: f32;

@fragment
fn fs_main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {
    return vec4<f32>(uv, scale, 1.0);
}
"#;
        let err = ProgramInterface::link(&stages(VERTEX, fragment)).unwrap_err();
        assert!(matches!(err, ShaderError::LayoutMismatch { binding: 0 }));
    }

    #[test]
    fn fragment_input_must_be_produced() {
        let fragment = r#"
@fragment
fn fs_main(@location(1) normal: vec3<f32>) -> @location(0) vec4<f32> {
    return vec4<f32>(normal, 1.0);
}
"#;
        let err = ProgramInterface::link(&stages(VERTEX, fragment)).unwrap_err();
        assert!(matches!(err, ShaderError::UnmatchedInput(1)));
    }

    #[test]
    fn failed_stage_fails_the_link() {
        let err = ProgramInterface::link(&stages(VERTEX, "fn nope(")).unwrap_err();
        assert!(matches!(
            err,
            ShaderError::StageNotCompiled(StageKind::Fragment)
        ));
    }

    #[test]
    fn entry_point_of_the_right_kind_is_required() {
        // A fragment-only module handed in as the vertex stage.
        let err = ProgramInterface::link(&stages(FRAGMENT, FRAGMENT)).unwrap_err();
        assert!(matches!(
            err,
            ShaderError::MissingEntryPoint(StageKind::Vertex)
        ));
    }

    #[test]
    fn both_stages_are_required() {
        let only_vertex = [CompiledStage::compile(StageKind::Vertex, VERTEX)];
        let err = ProgramInterface::link(&only_vertex).unwrap_err();
        assert!(matches!(err, ShaderError::MissingStage(StageKind::Fragment)));

        let mut doubled = stages(VERTEX, FRAGMENT);
        doubled.push(CompiledStage::compile(StageKind::Vertex, VERTEX));
        let err = ProgramInterface::link(&doubled).unwrap_err();
        assert!(matches!(err, ShaderError::DuplicateStage(StageKind::Vertex)));
    }

    #[test]
    fn geometry_stage_is_unsupported() {
        let mut with_geometry = stages(VERTEX, FRAGMENT);
        with_geometry.push(CompiledStage::compile(StageKind::Geometry, VERTEX));
        let err = ProgramInterface::link(&with_geometry).unwrap_err();
        assert!(matches!(err, ShaderError::GeometryUnsupported));
    }

    #[test]
    fn duplicate_uniform_names_across_blocks_fail() {
        let fragment = r#"
struct Other {
    view: mat4x4<f32>,
};
@group(0) @binding(1)
var<uniform> other: Other;

@fragment
fn fs_main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {
    return other.view[0] * uv.y;
}
"#;
        let err = ProgramInterface::link(&stages(VERTEX, fragment)).unwrap_err();
        assert!(matches!(err, ShaderError::DuplicateUniform(name) if name == "view"));
    }

    #[test]
    fn shipped_cube_program_links() {
        let vertex = include_str!("../../../assets/shaders/cube.vert.wgsl");
        let fragment = include_str!("../../../assets/shaders/cube.frag.wgsl");
        let interface = ProgramInterface::link(&stages(vertex, fragment)).unwrap();
        let uniforms = interface.uniforms();
        for name in ["local", "model", "view", "projection", "visible"] {
            assert!(uniforms.resolve(name).is_resolved(), "{name} missing");
        }
        assert!(interface.slot("texture1", SlotKind::Texture).is_some());
        assert!(interface.slot("texture2", SlotKind::Texture).is_some());
        assert!(interface.slot("texture_sampler", SlotKind::Sampler).is_some());
    }
}
