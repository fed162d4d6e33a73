use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x2,
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

const fn v(x: f32, y: f32, z: f32, u: f32, w: f32) -> Vertex {
    Vertex {
        position: [x, y, z],
        tex_coords: [u, w],
    }
}

/// Unit cube as a plain triangle list, six vertices per face.
#[rustfmt::skip]
pub const CUBE_VERTICES: [Vertex; 36] = [
    // -Z
    v(-0.5, -0.5, -0.5, 0.0, 0.0), v( 0.5, -0.5, -0.5, 1.0, 0.0), v( 0.5,  0.5, -0.5, 1.0, 1.0),
    v( 0.5,  0.5, -0.5, 1.0, 1.0), v(-0.5,  0.5, -0.5, 0.0, 1.0), v(-0.5, -0.5, -0.5, 0.0, 0.0),
    // +Z
    v(-0.5, -0.5,  0.5, 0.0, 0.0), v( 0.5, -0.5,  0.5, 1.0, 0.0), v( 0.5,  0.5,  0.5, 1.0, 1.0),
    v( 0.5,  0.5,  0.5, 1.0, 1.0), v(-0.5,  0.5,  0.5, 0.0, 1.0), v(-0.5, -0.5,  0.5, 0.0, 0.0),
    // -X
    v(-0.5,  0.5,  0.5, 1.0, 0.0), v(-0.5,  0.5, -0.5, 1.0, 1.0), v(-0.5, -0.5, -0.5, 0.0, 1.0),
    v(-0.5, -0.5, -0.5, 0.0, 1.0), v(-0.5, -0.5,  0.5, 0.0, 0.0), v(-0.5,  0.5,  0.5, 1.0, 0.0),
    // +X
    v( 0.5,  0.5,  0.5, 1.0, 0.0), v( 0.5,  0.5, -0.5, 1.0, 1.0), v( 0.5, -0.5, -0.5, 0.0, 1.0),
    v( 0.5, -0.5, -0.5, 0.0, 1.0), v( 0.5, -0.5,  0.5, 0.0, 0.0), v( 0.5,  0.5,  0.5, 1.0, 0.0),
    // -Y
    v(-0.5, -0.5, -0.5, 0.0, 1.0), v( 0.5, -0.5, -0.5, 1.0, 1.0), v( 0.5, -0.5,  0.5, 1.0, 0.0),
    v( 0.5, -0.5,  0.5, 1.0, 0.0), v(-0.5, -0.5,  0.5, 0.0, 0.0), v(-0.5, -0.5, -0.5, 0.0, 1.0),
    // +Y
    v(-0.5,  0.5, -0.5, 0.0, 1.0), v( 0.5,  0.5, -0.5, 1.0, 1.0), v( 0.5,  0.5,  0.5, 1.0, 0.0),
    v( 0.5,  0.5,  0.5, 1.0, 0.0), v(-0.5,  0.5, -0.5, 0.0, 1.0), v(-0.5,  0.5,  0.5, 0.0, 0.0),
];

pub const CUBE_COUNT: usize = 10;

pub const CUBE_POSITIONS: [Vec3; CUBE_COUNT] = [
    Vec3::new(0.0, 0.0, 0.0),
    Vec3::new(2.0, 5.0, -15.0),
    Vec3::new(-1.5, -2.2, -2.5),
    Vec3::new(-3.8, -2.0, -12.3),
    Vec3::new(2.4, -0.4, -3.5),
    Vec3::new(-1.7, 3.0, -7.5),
    Vec3::new(1.3, -2.0, -2.5),
    Vec3::new(1.5, 2.0, -2.5),
    Vec3::new(1.5, 0.2, -1.5),
    Vec3::new(-1.3, 1.0, -1.5),
];

/// Spin rate of every third cube, degrees per second.
pub const SPIN_RATE: f32 = 50.0;
/// Static tilt step between consecutive cubes, degrees.
pub const TILT_STEP: f32 = 20.0;

/// Per-cube `local` and `model` matrices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubeTransform {
    pub local: Mat4,
    pub model: Mat4,
}

pub fn spin_axis() -> Vec3 {
    Vec3::new(0.5, 1.0, 0.0).normalize()
}

pub fn tilt_axis() -> Vec3 {
    Vec3::new(1.0, 0.3, 0.5).normalize()
}

/// Transforms for all cubes `elapsed` seconds after start.
///
/// Cubes 0, 3, 6 and 9 spin about [`spin_axis`] in their `local` matrix.
/// Cube `i` is tilted `20 * i` degrees about [`tilt_axis`] and placed at
/// `CUBE_POSITIONS[i]`.
pub fn cube_transforms(elapsed: f32) -> [CubeTransform; CUBE_COUNT] {
    let spin = Mat4::from_quat(Quat::from_axis_angle(
        spin_axis(),
        (elapsed * SPIN_RATE).to_radians(),
    ));
    let tilt = tilt_axis();
    std::array::from_fn(|i| CubeTransform {
        local: if i % 3 == 0 { spin } else { Mat4::IDENTITY },
        model: Mat4::from_translation(CUBE_POSITIONS[i])
            * Mat4::from_quat(Quat::from_axis_angle(tilt, (TILT_STEP * i as f32).to_radians())),
    })
}
