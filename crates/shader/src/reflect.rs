use crate::error::ShaderError;
use crate::uniform::{ScalarKind, UniformType};
use naga::{
    AddressSpace, Binding, Handle, ImageClass, ImageDimension, Module, ScalarKind as NagaScalar,
    StructMember, Type, TypeInner, VectorSize,
};

/// What one stage module exposes to the link step.
#[derive(Debug, Clone, Default)]
pub(crate) struct StageReflection {
    pub entry_point: Option<String>,
    pub inputs: Vec<u32>,
    pub outputs: Vec<u32>,
    pub resources: Vec<Resource>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Resource {
    pub name: String,
    pub binding: u32,
    pub kind: ResourceKind,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ResourceKind {
    Uniform(BlockLayout),
    Texture,
    Sampler,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BlockLayout {
    pub size: u32,
    /// `(name, type, offset)` for every leaf field.
    pub fields: Vec<(String, UniformType, u32)>,
}

pub(crate) fn reflect(module: &Module, stage: naga::ShaderStage) -> Result<StageReflection, ShaderError> {
    let mut out = StageReflection::default();

    if let Some(entry) = module.entry_points.iter().find(|entry| entry.stage == stage) {
        out.entry_point = Some(entry.name.clone());
        for argument in &entry.function.arguments {
            collect_locations(module, argument.binding.as_ref(), argument.ty, &mut out.inputs);
        }
        if let Some(result) = &entry.function.result {
            collect_locations(module, result.binding.as_ref(), result.ty, &mut out.outputs);
        }
    }

    for (_, var) in module.global_variables.iter() {
        let Some(resource_binding) = &var.binding else {
            continue;
        };
        let name = var
            .name
            .clone()
            .unwrap_or_else(|| format!("binding{}", resource_binding.binding));
        if resource_binding.group != 0 {
            return Err(ShaderError::UnsupportedGroup {
                name,
                group: resource_binding.group,
            });
        }

        let inner = &module.types[var.ty].inner;
        let kind = match var.space {
            AddressSpace::Uniform => ResourceKind::Uniform(block_layout(module, &name, var.ty)),
            AddressSpace::Handle => match *inner {
                TypeInner::Image {
                    dim: ImageDimension::D2,
                    arrayed: false,
                    class:
                        ImageClass::Sampled {
                            kind: NagaScalar::Float,
                            multi: false,
                        },
                } => ResourceKind::Texture,
                TypeInner::Sampler { comparison: false } => ResourceKind::Sampler,
                _ => {
                    return Err(ShaderError::UnsupportedResource {
                        name,
                        detail: format!("{inner:?}"),
                    });
                }
            },
            other => {
                return Err(ShaderError::UnsupportedResource {
                    name,
                    detail: format!("address space {other:?}"),
                });
            }
        };

        out.resources.push(Resource {
            name,
            binding: resource_binding.binding,
            kind,
        });
    }

    Ok(out)
}

fn collect_locations(module: &Module, binding: Option<&Binding>, ty: Handle<Type>, out: &mut Vec<u32>) {
    match binding {
        Some(Binding::Location { location, .. }) => out.push(*location),
        Some(Binding::BuiltIn(_)) => {}
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_locations(module, member.binding.as_ref(), member.ty, out);
                }
            }
        }
    }
}

fn block_layout(module: &Module, name: &str, ty: Handle<Type>) -> BlockLayout {
    let inner = &module.types[ty].inner;
    let mut fields = Vec::new();
    match inner {
        TypeInner::Struct { members, .. } => flatten_members(module, members, None, 0, &mut fields),
        other => fields.push((name.to_owned(), uniform_type(other), 0)),
    }
    BlockLayout {
        size: inner.size(module.to_ctx()),
        fields,
    }
}

fn flatten_members(
    module: &Module,
    members: &[StructMember],
    prefix: Option<&str>,
    base: u32,
    out: &mut Vec<(String, UniformType, u32)>,
) {
    for (index, member) in members.iter().enumerate() {
        let own = member
            .name
            .clone()
            .unwrap_or_else(|| format!("member{index}"));
        let name = match prefix {
            Some(prefix) => format!("{prefix}.{own}"),
            None => own,
        };
        let offset = base + member.offset;
        match &module.types[member.ty].inner {
            TypeInner::Struct { members, .. } => {
                flatten_members(module, members, Some(&name), offset, out)
            }
            other => out.push((name, uniform_type(other), offset)),
        }
    }
}

fn uniform_type(inner: &TypeInner) -> UniformType {
    match *inner {
        TypeInner::Scalar(scalar) => scalar_kind(scalar).map_or(UniformType::Unsupported, UniformType::Scalar),
        TypeInner::Vector { size, scalar } => scalar_kind(scalar)
            .map_or(UniformType::Unsupported, |kind| UniformType::Vector(kind, size as u8)),
        TypeInner::Matrix {
            columns: VectorSize::Quad,
            rows: VectorSize::Quad,
            scalar,
        } if scalar == naga::Scalar::F32 => UniformType::Mat4,
        _ => UniformType::Unsupported,
    }
}

fn scalar_kind(scalar: naga::Scalar) -> Option<ScalarKind> {
    match (scalar.kind, scalar.width) {
        (NagaScalar::Sint, 4) => Some(ScalarKind::Int),
        (NagaScalar::Uint, 4) => Some(ScalarKind::Uint),
        (NagaScalar::Float, 4) => Some(ScalarKind::Float),
        (NagaScalar::Float, 8) => Some(ScalarKind::Double),
        _ => None,
    }
}
