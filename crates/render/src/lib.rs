//! wgpu render support for the cube demo.
//!
//! GPU bootstrap, texture loading, the cube mesh and its per-frame
//! transforms, a depth target and the fixed-rate frame gate.
//!
//! # Invariants
//! - Asset failures never abort: a missing texture leaves its slot on the
//!   program's white fallback, a broken shader leaves the scene empty.
//! - The frame gate never sleeps; the caller decides how to wait.

mod depth;
mod error;
mod frame;
mod gpu;
mod mesh;
mod scene;
mod texture;

pub use depth::{DEPTH_FORMAT, DepthTarget};
pub use error::{GpuError, RenderError};
pub use frame::{FrameLimiter, MAX_DELTA};
pub use gpu::GpuContext;
pub use mesh::{
    CUBE_COUNT, CUBE_POSITIONS, CUBE_VERTICES, CubeTransform, SPIN_RATE, TILT_STEP, Vertex,
    cube_transforms, spin_axis, tilt_axis,
};
pub use scene::{CLEAR_COLOR, CUBE_SHADER, CUBE_TEXTURES, CubeScene, FrameUniforms};
pub use texture::{Texture, decode_rgba, mip_chain};
