use crate::depth::{DEPTH_FORMAT, DepthTarget};
use crate::mesh::{CUBE_VERTICES, Vertex, cube_transforms};
use crate::texture::Texture;
use firstlight_shader::{PipelineSpec, ProgramSources, ShaderProgram, UniformLocation};
use glam::Mat4;
use std::path::Path;
use wgpu::util::DeviceExt;

pub const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.2,
    g: 0.3,
    b: 0.3,
    a: 1.0,
};

/// Shader stem under `<assets>/shaders`.
pub const CUBE_SHADER: &str = "cube";

/// Texture files under `<assets>/textures` and the shader slots they feed.
pub const CUBE_TEXTURES: [(&str, &str); 2] =
    [("texture1", "container.png"), ("texture2", "awesomeface.png")];

/// Per-frame values the scene reads from the application.
#[derive(Debug, Clone, Copy)]
pub struct FrameUniforms {
    pub view: Mat4,
    pub projection: Mat4,
    /// Blend factor between the two textures.
    pub visible: f32,
    /// Seconds since start, drives the cube spin.
    pub elapsed: f32,
}

struct Locations {
    visible: UniformLocation,
    local: UniformLocation,
    model: UniformLocation,
    view: UniformLocation,
    projection: UniformLocation,
}

/// Ten textured cubes drawn with one program.
pub struct CubeScene {
    program: ShaderProgram,
    locations: Locations,
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
    textures: Vec<Texture>,
    depth: DepthTarget,
}

impl CubeScene {
    /// Build the scene from `assets`. Shader and texture failures are
    /// logged; the scene still exists and draws what it can.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color_format: wgpu::TextureFormat,
        (width, height): (u32, u32),
        assets: &Path,
    ) -> Self {
        let layouts = [Vertex::layout()];
        let spec = PipelineSpec::new("cube_program", &layouts, color_format).with_depth(DEPTH_FORMAT);
        let sources = ProgramSources::from_stem(assets.join("shaders"), CUBE_SHADER);
        let mut program = ShaderProgram::from_sources(device, queue, &spec, &sources);

        let locations = Locations {
            visible: program.resolve_location("visible"),
            local: program.resolve_location("local"),
            model: program.resolve_location("model"),
            view: program.resolve_location("view"),
            projection: program.resolve_location("projection"),
        };

        let mut textures = Vec::with_capacity(CUBE_TEXTURES.len());
        for (slot, file) in CUBE_TEXTURES {
            match Texture::load(device, queue, &assets.join("textures").join(file), true) {
                Ok(texture) => {
                    program.bind_texture(slot, &texture.view);
                    textures.push(texture);
                }
                Err(err) => tracing::error!(slot, "{err}"),
            }
        }
        if let Some(texture) = textures.first() {
            program.bind_sampler("texture_sampler", &texture.sampler);
        }

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cube_vertex_buffer"),
            contents: bytemuck::cast_slice(&CUBE_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Self {
            program,
            locations,
            vertex_buffer,
            vertex_count: CUBE_VERTICES.len() as u32,
            textures,
            depth: DepthTarget::new(device, width, height),
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth.resize(device, width, height);
    }

    pub fn program(&self) -> &ShaderProgram {
        &self.program
    }

    pub fn loaded_textures(&self) -> usize {
        self.textures.len()
    }

    /// Clear `target` and draw the cubes.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &wgpu::TextureView,
        frame: &FrameUniforms,
    ) {
        self.program.begin_frame();

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("cube_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("cube_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.depth.view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            let program = &mut self.program;
            let locations = &self.locations;
            program.set_uniform(locations.visible, frame.visible);
            program.set_uniform(locations.view, frame.view);
            program.set_uniform(locations.projection, frame.projection);

            pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            for cube in cube_transforms(frame.elapsed) {
                program.set_uniform(locations.local, cube.local);
                program.set_uniform(locations.model, cube.model);
                if program.use_program(&mut pass) {
                    pass.draw(0..self.vertex_count, 0..1);
                }
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    /// Free the program's GPU objects.
    pub fn release(self) {
        self.program.release();
    }
}
