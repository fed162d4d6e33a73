use crate::interface::{ProgramInterface, SlotKind};
use crate::source::ProgramSources;
use crate::stage::{CompiledStage, StageKind};
use crate::uniform::{UniformLocation, UniformRef, UniformStaging, UniformValue};
use crate::ShaderError;
use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroU64;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};

/// Uniform snapshots a program can take between two `begin_frame` calls.
pub const SNAPSHOTS_PER_FRAME: u32 = 64;

static NEXT_PROGRAM_ID: AtomicU32 = AtomicU32::new(1);

/// Process-unique program identifier, used in log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(u32);

impl ProgramId {
    fn next() -> Self {
        Self(NEXT_PROGRAM_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ProgramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "program#{}", self.0)
    }
}

/// Fixed-function state the program's render pipeline is built with.
#[derive(Debug, Clone)]
pub struct PipelineSpec<'a> {
    pub label: &'a str,
    pub vertex_buffers: &'a [wgpu::VertexBufferLayout<'a>],
    pub color_format: wgpu::TextureFormat,
    pub depth_format: Option<wgpu::TextureFormat>,
    pub topology: wgpu::PrimitiveTopology,
    pub cull_mode: Option<wgpu::Face>,
}

impl<'a> PipelineSpec<'a> {
    /// Triangle list, no culling, no depth test.
    pub fn new(
        label: &'a str,
        vertex_buffers: &'a [wgpu::VertexBufferLayout<'a>],
        color_format: wgpu::TextureFormat,
    ) -> Self {
        Self {
            label,
            vertex_buffers,
            color_format,
            depth_format: None,
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
        }
    }

    pub fn with_depth(mut self, format: wgpu::TextureFormat) -> Self {
        self.depth_format = Some(format);
        self
    }

    pub fn with_cull_mode(mut self, face: wgpu::Face) -> Self {
        self.cull_mode = Some(face);
        self
    }
}

/// A linked vertex + fragment program with name-addressable uniforms.
///
/// Construction never fails: compile and link errors are logged and kept in
/// [`info_log`](Self::info_log), and the program is then unusable. Drawing
/// with an unusable program is skipped and uniform writes are ignored.
///
/// Uniform writes go to a CPU staging copy. Every [`use_program`] uploads
/// that copy into a fresh slot of a per-frame ring, so draws recorded into
/// one render pass each see the values set before them. Call
/// [`begin_frame`] once per frame to rewind the ring.
///
/// [`use_program`]: Self::use_program
/// [`begin_frame`]: Self::begin_frame
pub struct ShaderProgram {
    id: ProgramId,
    label: String,
    log: String,
    linked: Option<Linked>,
}

struct Linked {
    device: wgpu::Device,
    queue: wgpu::Queue,
    label: String,
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    interface: ProgramInterface,
    staging: UniformStaging,
    rings: Vec<UniformRing>,
    textures: HashMap<u32, wgpu::TextureView>,
    samplers: HashMap<u32, wgpu::Sampler>,
    fallback: Fallback,
    bind_group: Option<wgpu::BindGroup>,
    cursor: u32,
    overflowed: bool,
}

struct UniformRing {
    buffer: wgpu::Buffer,
    stride: u32,
    size: u32,
}

/// 1x1 white texture and a plain sampler for slots nothing was bound to.
struct Fallback {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
}

impl ShaderProgram {
    /// Compile and link a program from a vertex and a fragment source file.
    pub fn from_files(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        spec: &PipelineSpec<'_>,
        vertex: impl AsRef<Path>,
        fragment: impl AsRef<Path>,
    ) -> Self {
        let sources = ProgramSources::new(vertex.as_ref(), fragment.as_ref());
        Self::from_sources(device, queue, spec, &sources)
    }

    /// As [`from_files`](Self::from_files) with a geometry stage. The wgpu
    /// backend has no geometry stage, so the result is always unusable.
    pub fn from_files_with_geometry(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        spec: &PipelineSpec<'_>,
        vertex: impl AsRef<Path>,
        geometry: impl AsRef<Path>,
        fragment: impl AsRef<Path>,
    ) -> Self {
        let sources =
            ProgramSources::new(vertex.as_ref(), fragment.as_ref()).with_geometry(geometry.as_ref());
        Self::from_sources(device, queue, spec, &sources)
    }

    pub fn from_sources(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        spec: &PipelineSpec<'_>,
        sources: &ProgramSources,
    ) -> Self {
        Self::link(device, queue, spec, &sources.compile())
    }

    /// Link already compiled stages into a program.
    pub fn link(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        spec: &PipelineSpec<'_>,
        stages: &[CompiledStage],
    ) -> Self {
        let id = ProgramId::next();
        let linked = ProgramInterface::link(stages)
            .and_then(|interface| Linked::create(device, queue, spec, stages, interface));

        match linked {
            Ok(linked) => {
                tracing::info!(
                    program = %id,
                    label = spec.label,
                    uniforms = linked.interface.uniforms().len(),
                    bindings = linked.interface.slots().len(),
                    "shader program linked"
                );
                Self {
                    id,
                    label: spec.label.to_owned(),
                    log: String::new(),
                    linked: Some(linked),
                }
            }
            Err(err) => {
                tracing::error!(program = %id, label = spec.label, "ERROR linking program: {err}");
                Self {
                    id,
                    label: spec.label.to_owned(),
                    log: err.to_string(),
                    linked: None,
                }
            }
        }
    }

    pub fn id(&self) -> ProgramId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_linked(&self) -> bool {
        self.linked.is_some()
    }

    /// Compile or link diagnostic, empty for a usable program.
    pub fn info_log(&self) -> &str {
        &self.log
    }

    pub fn interface(&self) -> Option<&ProgramInterface> {
        self.linked.as_ref().map(|linked| &linked.interface)
    }

    /// Rewind the uniform ring. Call once per frame before recording draws.
    pub fn begin_frame(&mut self) {
        if let Some(linked) = &mut self.linked {
            linked.cursor = 0;
            linked.overflowed = false;
        }
    }

    /// Make this program current for the following draws in `pass`.
    ///
    /// Uploads the current uniform values. Returns `false`, and binds
    /// nothing, for an unusable program.
    pub fn use_program(&mut self, pass: &mut wgpu::RenderPass<'_>) -> bool {
        match &mut self.linked {
            Some(linked) => {
                linked.bind(self.id, pass);
                true
            }
            None => {
                tracing::trace!(program = %self.id, "skipping draw with unusable program");
                false
            }
        }
    }

    /// Location of the uniform `name`, or [`UniformLocation::UNRESOLVED`].
    pub fn resolve_location(&self, name: &str) -> UniformLocation {
        let location = self
            .linked
            .as_ref()
            .map_or(UniformLocation::UNRESOLVED, |linked| {
                linked.staging.table().resolve(name)
            });
        if !location.is_resolved() {
            tracing::error!(program = %self.id, "ERROR uniform <{name}> doesn't exist");
        }
        location
    }

    /// Stage a uniform value for the next [`use_program`](Self::use_program).
    ///
    /// Unknown names and type mismatches are logged and ignored. Writing to
    /// [`UniformLocation::UNRESOLVED`] is silently ignored.
    pub fn set_uniform<'a>(&mut self, target: impl Into<UniformRef<'a>>, value: impl Into<UniformValue>) {
        let target = target.into();
        let Some(linked) = self.linked.as_mut() else {
            if target != UniformRef::Location(UniformLocation::UNRESOLVED) {
                tracing::error!(program = %self.id, uniform = %target, "uniform write on an unusable program");
            }
            return;
        };
        if let Err(err) = linked.staging.set(target, value.into()) {
            tracing::error!(program = %self.id, "ERROR {err}");
        }
    }

    /// Bind a texture to the `texture_2d<f32>` named `name`.
    pub fn bind_texture(&mut self, name: &str, view: &wgpu::TextureView) -> bool {
        self.bind_resource(name, SlotKind::Texture, |linked, binding| {
            linked.textures.insert(binding, view.clone());
        })
    }

    /// Bind a sampler to the `sampler` named `name`.
    pub fn bind_sampler(&mut self, name: &str, sampler: &wgpu::Sampler) -> bool {
        self.bind_resource(name, SlotKind::Sampler, |linked, binding| {
            linked.samplers.insert(binding, sampler.clone());
        })
    }

    fn bind_resource(&mut self, name: &str, kind: SlotKind, store: impl FnOnce(&mut Linked, u32)) -> bool {
        let Some(linked) = self.linked.as_mut() else {
            return false;
        };
        let Some(binding) = linked.interface.slot(name, kind).map(|slot| slot.binding) else {
            tracing::warn!(program = %self.id, resource = name, ?kind, "no such resource slot");
            return false;
        };
        store(linked, binding);
        linked.bind_group = None;
        true
    }

    /// Free the program's GPU objects.
    pub fn release(self) {
        if let Some(linked) = self.linked {
            for ring in &linked.rings {
                ring.buffer.destroy();
            }
            linked.fallback.texture.destroy();
        }
        tracing::debug!(program = %self.id, label = %self.label, "shader program released");
    }
}

impl fmt::Debug for ShaderProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShaderProgram")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("linked", &self.is_linked())
            .finish()
    }
}

impl Linked {
    fn create(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        spec: &PipelineSpec<'_>,
        stages: &[CompiledStage],
        interface: ProgramInterface,
    ) -> Result<Self, ShaderError> {
        let uniforms = interface.uniforms();
        if uniforms.uses_double() && !device.features().contains(wgpu::Features::SHADER_F64) {
            return Err(ShaderError::Pipeline(
                "f64 uniforms need the SHADER_F64 device feature".into(),
            ));
        }
        let source_of = |kind: StageKind| {
            stages
                .iter()
                .find(|stage| stage.kind() == kind)
                .map(CompiledStage::source)
                .ok_or(ShaderError::MissingStage(kind))
        };
        let vertex_source = source_of(StageKind::Vertex)?;
        let fragment_source = source_of(StageKind::Fragment)?;

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let vertex_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{} vertex", spec.label)),
            source: wgpu::ShaderSource::Wgsl(vertex_source.into()),
        });
        let fragment_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{} fragment", spec.label)),
            source: wgpu::ShaderSource::Wgsl(fragment_source.into()),
        });

        let entries: Vec<wgpu::BindGroupLayoutEntry> = interface
            .slots()
            .iter()
            .map(|slot| wgpu::BindGroupLayoutEntry {
                binding: slot.binding,
                visibility: slot.visibility,
                ty: match slot.kind {
                    SlotKind::Uniform { block } => wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: NonZeroU64::new(u64::from(
                            uniforms.blocks()[block].padded_size(),
                        )),
                    },
                    SlotKind::Texture => wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    SlotKind::Sampler => {
                        wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering)
                    }
                },
                count: None,
            })
            .collect();

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{} bind group layout", spec.label)),
            entries: &entries,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{} pipeline layout", spec.label)),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(spec.label),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex_module,
                entry_point: Some(interface.vertex_entry()),
                compilation_options: Default::default(),
                buffers: spec.vertex_buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: &fragment_module,
                entry_point: Some(interface.fragment_entry()),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: spec.color_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: spec.topology,
                cull_mode: spec.cull_mode,
                ..Default::default()
            },
            depth_stencil: spec.depth_format.map(|format| wgpu::DepthStencilState {
                format,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let alignment = device.limits().min_uniform_buffer_offset_alignment;
        let rings = uniforms
            .blocks()
            .iter()
            .map(|block| {
                let size = block.padded_size();
                let stride = size.next_multiple_of(alignment);
                let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(&format!("{} uniforms @{}", spec.label, block.binding)),
                    size: u64::from(stride) * u64::from(SNAPSHOTS_PER_FRAME),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                UniformRing {
                    buffer,
                    stride,
                    size,
                }
            })
            .collect();

        let fallback = Fallback::new(device, queue);

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(ShaderError::Pipeline(err.to_string()));
        }

        let staging = UniformStaging::new(uniforms.clone());
        Ok(Self {
            device: device.clone(),
            queue: queue.clone(),
            label: spec.label.to_owned(),
            pipeline,
            layout,
            interface,
            staging,
            rings,
            textures: HashMap::new(),
            samplers: HashMap::new(),
            fallback,
            bind_group: None,
            cursor: 0,
            overflowed: false,
        })
    }

    fn bind(&mut self, id: ProgramId, pass: &mut wgpu::RenderPass<'_>) {
        let slot = if self.cursor < SNAPSHOTS_PER_FRAME {
            self.cursor += 1;
            self.cursor - 1
        } else {
            if !self.overflowed {
                tracing::warn!(
                    program = %id,
                    limit = SNAPSHOTS_PER_FRAME,
                    "uniform snapshots exhausted this frame, reusing the last one"
                );
                self.overflowed = true;
            }
            SNAPSHOTS_PER_FRAME - 1
        };

        let mut offsets = Vec::with_capacity(self.rings.len());
        for (index, ring) in self.rings.iter().enumerate() {
            let offset = slot * ring.stride;
            self.queue
                .write_buffer(&ring.buffer, u64::from(offset), self.staging.block_bytes(index));
            offsets.push(offset);
        }

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, self.bind_group(), &offsets);
    }

    fn bind_group(&mut self) -> &wgpu::BindGroup {
        let Linked {
            device,
            label,
            layout,
            interface,
            rings,
            textures,
            samplers,
            fallback,
            bind_group,
            ..
        } = self;
        bind_group.get_or_insert_with(|| {
            let entries: Vec<wgpu::BindGroupEntry<'_>> = interface
                .slots()
                .iter()
                .map(|slot| wgpu::BindGroupEntry {
                    binding: slot.binding,
                    resource: match slot.kind {
                        SlotKind::Uniform { block } => {
                            wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                                buffer: &rings[block].buffer,
                                offset: 0,
                                size: NonZeroU64::new(u64::from(rings[block].size)),
                            })
                        }
                        SlotKind::Texture => wgpu::BindingResource::TextureView(
                            textures.get(&slot.binding).unwrap_or(&fallback.view),
                        ),
                        SlotKind::Sampler => wgpu::BindingResource::Sampler(
                            samplers.get(&slot.binding).unwrap_or(&fallback.sampler),
                        ),
                    },
                })
                .collect();
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("{label} bind group")),
                layout,
                entries: &entries,
            })
        })
    }
}

impl Fallback {
    fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let size = wgpu::Extent3d {
            width: 1,
            height: 1,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("fallback_white"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &[255; 4],
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4),
                rows_per_image: Some(1),
            },
            size,
        );
        let view = texture.create_view(&Default::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("fallback_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        Self {
            texture,
            view,
            sampler,
        }
    }
}
