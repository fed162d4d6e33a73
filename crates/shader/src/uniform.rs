//! Uniform types, the per-program lookup table and CPU-side staging.
//!
//! Every uniform field a program declares gets a dense integer location.
//! Writes land in a byte image of the owning uniform block, which the GPU
//! program uploads when it is bound for a draw.

use crate::error::ShaderError;
use glam::{DVec2, DVec3, DVec4, IVec2, IVec3, IVec4, Mat4, UVec2, UVec3, UVec4, Vec2, Vec3, Vec4};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Int,
    Uint,
    Float,
    Double,
}

impl ScalarKind {
    pub fn size(self) -> u32 {
        match self {
            ScalarKind::Double => 8,
            _ => 4,
        }
    }

    fn wgsl(self) -> &'static str {
        match self {
            ScalarKind::Int => "i32",
            ScalarKind::Uint => "u32",
            ScalarKind::Float => "f32",
            ScalarKind::Double => "f64",
        }
    }
}

/// Shape of a uniform field as the shader declares it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformType {
    Scalar(ScalarKind),
    Vector(ScalarKind, u8),
    Mat4,
    /// Arrays, non-square matrices and the like. Present in the table so the
    /// name resolves, but every write is rejected.
    Unsupported,
}

impl UniformType {
    pub fn size(self) -> u32 {
        match self {
            UniformType::Scalar(kind) => kind.size(),
            UniformType::Vector(kind, n) => kind.size() * u32::from(n),
            UniformType::Mat4 => 64,
            UniformType::Unsupported => 0,
        }
    }

    pub fn is_double(self) -> bool {
        matches!(
            self,
            UniformType::Scalar(ScalarKind::Double) | UniformType::Vector(ScalarKind::Double, _)
        )
    }
}

impl fmt::Display for UniformType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniformType::Scalar(kind) => f.write_str(kind.wgsl()),
            UniformType::Vector(kind, n) => write!(f, "vec{n}<{}>", kind.wgsl()),
            UniformType::Mat4 => f.write_str("mat4x4<f32>"),
            UniformType::Unsupported => f.write_str("unsupported type"),
        }
    }
}

/// A value to upload into one uniform field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Uint(u32),
    Float(f32),
    Double(f64),
    IVec2(IVec2),
    UVec2(UVec2),
    Vec2(Vec2),
    DVec2(DVec2),
    IVec3(IVec3),
    UVec3(UVec3),
    Vec3(Vec3),
    DVec3(DVec3),
    IVec4(IVec4),
    UVec4(UVec4),
    Vec4(Vec4),
    DVec4(DVec4),
    Mat4(Mat4),
}

macro_rules! uniform_value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for UniformValue {
                fn from(value: $ty) -> Self {
                    UniformValue::$variant(value)
                }
            }
        )*
    };
}

uniform_value_from!(
    i32 => Int, u32 => Uint, f32 => Float, f64 => Double,
    IVec2 => IVec2, UVec2 => UVec2, Vec2 => Vec2, DVec2 => DVec2,
    IVec3 => IVec3, UVec3 => UVec3, Vec3 => Vec3, DVec3 => DVec3,
    IVec4 => IVec4, UVec4 => UVec4, Vec4 => Vec4, DVec4 => DVec4,
    Mat4 => Mat4,
);

/// Booleans travel as `i32` 0/1; WGSL has no host-shareable `bool`.
impl From<bool> for UniformValue {
    fn from(value: bool) -> Self {
        UniformValue::Int(i32::from(value))
    }
}

impl UniformValue {
    pub fn uniform_type(&self) -> UniformType {
        use ScalarKind::*;
        match self {
            UniformValue::Int(_) => UniformType::Scalar(Int),
            UniformValue::Uint(_) => UniformType::Scalar(Uint),
            UniformValue::Float(_) => UniformType::Scalar(Float),
            UniformValue::Double(_) => UniformType::Scalar(Double),
            UniformValue::IVec2(_) => UniformType::Vector(Int, 2),
            UniformValue::UVec2(_) => UniformType::Vector(Uint, 2),
            UniformValue::Vec2(_) => UniformType::Vector(Float, 2),
            UniformValue::DVec2(_) => UniformType::Vector(Double, 2),
            UniformValue::IVec3(_) => UniformType::Vector(Int, 3),
            UniformValue::UVec3(_) => UniformType::Vector(Uint, 3),
            UniformValue::Vec3(_) => UniformType::Vector(Float, 3),
            UniformValue::DVec3(_) => UniformType::Vector(Double, 3),
            UniformValue::IVec4(_) => UniformType::Vector(Int, 4),
            UniformValue::UVec4(_) => UniformType::Vector(Uint, 4),
            UniformValue::Vec4(_) => UniformType::Vector(Float, 4),
            UniformValue::DVec4(_) => UniformType::Vector(Double, 4),
            UniformValue::Mat4(_) => UniformType::Mat4,
        }
    }

    /// Native-endian bytes in WGSL host-shareable layout. Matrices are
    /// column-major.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            UniformValue::Int(v) => v.to_ne_bytes().to_vec(),
            UniformValue::Uint(v) => v.to_ne_bytes().to_vec(),
            UniformValue::Float(v) => v.to_ne_bytes().to_vec(),
            UniformValue::Double(v) => v.to_ne_bytes().to_vec(),
            UniformValue::IVec2(v) => bytemuck::cast_slice(&v.to_array()).to_vec(),
            UniformValue::UVec2(v) => bytemuck::cast_slice(&v.to_array()).to_vec(),
            UniformValue::Vec2(v) => bytemuck::cast_slice(&v.to_array()).to_vec(),
            UniformValue::DVec2(v) => bytemuck::cast_slice(&v.to_array()).to_vec(),
            UniformValue::IVec3(v) => bytemuck::cast_slice(&v.to_array()).to_vec(),
            UniformValue::UVec3(v) => bytemuck::cast_slice(&v.to_array()).to_vec(),
            UniformValue::Vec3(v) => bytemuck::cast_slice(&v.to_array()).to_vec(),
            UniformValue::DVec3(v) => bytemuck::cast_slice(&v.to_array()).to_vec(),
            UniformValue::IVec4(v) => bytemuck::cast_slice(&v.to_array()).to_vec(),
            UniformValue::UVec4(v) => bytemuck::cast_slice(&v.to_array()).to_vec(),
            UniformValue::Vec4(v) => bytemuck::cast_slice(&v.to_array()).to_vec(),
            UniformValue::DVec4(v) => bytemuck::cast_slice(&v.to_array()).to_vec(),
            UniformValue::Mat4(m) => bytemuck::cast_slice(&m.to_cols_array()).to_vec(),
        }
    }
}

/// Opaque handle to a uniform field, valid for the program that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(i32);

impl UniformLocation {
    /// Returned for names the program does not declare. Writing to it is a
    /// silent no-op.
    pub const UNRESOLVED: UniformLocation = UniformLocation(-1);

    pub fn raw(self) -> i32 {
        self.0
    }

    pub fn is_resolved(self) -> bool {
        self.0 >= 0
    }
}

impl fmt::Display for UniformLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Names a uniform either by its source name or by a resolved location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformRef<'a> {
    Name(&'a str),
    Location(UniformLocation),
}

impl<'a> From<&'a str> for UniformRef<'a> {
    fn from(name: &'a str) -> Self {
        UniformRef::Name(name)
    }
}

impl From<UniformLocation> for UniformRef<'_> {
    fn from(location: UniformLocation) -> Self {
        UniformRef::Location(location)
    }
}

impl fmt::Display for UniformRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniformRef::Name(name) => f.write_str(name),
            UniformRef::Location(location) => write!(f, "location {location}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UniformError {
    #[error("uniform <{0}> doesn't exist")]
    UnknownName(String),
    #[error("uniform location {0} is out of range")]
    InvalidLocation(i32),
    #[error("uniform <{name}> is {expected}, got {found}")]
    TypeMismatch {
        name: String,
        expected: UniformType,
        found: UniformType,
    },
}

/// One addressable uniform field.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformField {
    /// Variable name, or `member` / `outer.inner` for struct-typed blocks.
    pub name: String,
    pub ty: UniformType,
    /// Index into [`UniformTable::blocks`].
    pub block: usize,
    /// Byte offset inside the block.
    pub offset: u32,
}

/// One `var<uniform>` binding.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformBlock {
    pub name: String,
    pub binding: u32,
    /// Size of the declared type in bytes.
    pub size: u32,
}

impl UniformBlock {
    /// Size rounded up to the 16-byte granularity uniform buffers use.
    pub fn padded_size(&self) -> u32 {
        self.size.max(1).next_multiple_of(16)
    }
}

/// Name to location lookup for one linked program.
#[derive(Debug, Clone, Default)]
pub struct UniformTable {
    blocks: Vec<UniformBlock>,
    fields: Vec<UniformField>,
    by_name: HashMap<String, usize>,
}

impl UniformTable {
    /// Append a block and its fields. Blocks must arrive in binding order.
    pub(crate) fn push_block(
        &mut self,
        block: UniformBlock,
        fields: impl IntoIterator<Item = (String, UniformType, u32)>,
    ) -> Result<(), ShaderError> {
        let index = self.blocks.len();
        self.blocks.push(block);
        for (name, ty, offset) in fields {
            if self.by_name.contains_key(&name) {
                return Err(ShaderError::DuplicateUniform(name));
            }
            self.by_name.insert(name.clone(), self.fields.len());
            self.fields.push(UniformField {
                name,
                ty,
                block: index,
                offset,
            });
        }
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> UniformLocation {
        self.by_name
            .get(name)
            .and_then(|index| i32::try_from(*index).ok())
            .map_or(UniformLocation::UNRESOLVED, UniformLocation)
    }

    pub fn field(&self, location: UniformLocation) -> Option<&UniformField> {
        usize::try_from(location.0)
            .ok()
            .and_then(|index| self.fields.get(index))
    }

    pub fn fields(&self) -> &[UniformField] {
        &self.fields
    }

    pub fn blocks(&self) -> &[UniformBlock] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn uses_double(&self) -> bool {
        self.fields.iter().any(|field| field.ty.is_double())
    }
}

/// CPU copy of every uniform block of a program.
#[derive(Debug, Clone)]
pub struct UniformStaging {
    table: UniformTable,
    data: Vec<Vec<u8>>,
}

impl UniformStaging {
    /// Zero-initialized blocks, as a freshly linked GL program would have.
    pub fn new(table: UniformTable) -> Self {
        let data = table
            .blocks
            .iter()
            .map(|block| vec![0; block.padded_size() as usize])
            .collect();
        Self { table, data }
    }

    pub fn table(&self) -> &UniformTable {
        &self.table
    }

    pub fn set(&mut self, target: UniformRef<'_>, value: UniformValue) -> Result<(), UniformError> {
        let location = match target {
            UniformRef::Name(name) => {
                let location = self.table.resolve(name);
                if !location.is_resolved() {
                    return Err(UniformError::UnknownName(name.to_owned()));
                }
                location
            }
            UniformRef::Location(location) if location == UniformLocation::UNRESOLVED => {
                return Ok(());
            }
            UniformRef::Location(location) => location,
        };

        let field = self
            .table
            .field(location)
            .ok_or(UniformError::InvalidLocation(location.0))?;
        let found = value.uniform_type();
        if field.ty != found {
            return Err(UniformError::TypeMismatch {
                name: field.name.clone(),
                expected: field.ty,
                found,
            });
        }

        let bytes = value.to_bytes();
        let start = field.offset as usize;
        self.data[field.block][start..start + bytes.len()].copy_from_slice(&bytes);
        Ok(())
    }

    /// Current contents of block `index`, padded to 16 bytes.
    pub fn block_bytes(&self, index: usize) -> &[u8] {
        &self.data[index]
    }
}
