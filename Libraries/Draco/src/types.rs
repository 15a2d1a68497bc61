use serde::{Deserialize, Serialize};

/// Geometry kind recorded in the header of a compressed buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum EncodedGeometryType {
    Invalid = -1,
    PointCloud = 0,
    TriangularMesh = 1,
}

impl EncodedGeometryType {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => EncodedGeometryType::PointCloud,
            1 => EncodedGeometryType::TriangularMesh,
            _ => EncodedGeometryType::Invalid,
        }
    }
}

/// Semantic of a per-point attribute.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum GeometryAttributeType {
    Invalid = -1,
    Position = 0,
    Normal,
    Color,
    TexCoord,
    Generic,
}

impl GeometryAttributeType {
    /// Maps a stable integer tag to a semantic; anything unknown becomes `Invalid`.
    pub fn from_raw(raw: i64) -> Self {
        match raw {
            0 => GeometryAttributeType::Position,
            1 => GeometryAttributeType::Normal,
            2 => GeometryAttributeType::Color,
            3 => GeometryAttributeType::TexCoord,
            4 => GeometryAttributeType::Generic,
            _ => GeometryAttributeType::Invalid,
        }
    }

    pub fn as_raw(self) -> i32 {
        self as i32
    }
}

/// Numeric type of the values stored in an attribute.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum DataType {
    Invalid = 0,
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Float32,
    Float64,
    Bool,
}

impl DataType {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            1 => DataType::Int8,
            2 => DataType::Uint8,
            3 => DataType::Int16,
            4 => DataType::Uint16,
            5 => DataType::Int32,
            6 => DataType::Uint32,
            7 => DataType::Int64,
            8 => DataType::Uint64,
            9 => DataType::Float32,
            10 => DataType::Float64,
            11 => DataType::Bool,
            _ => DataType::Invalid,
        }
    }

    pub fn as_raw(self) -> u32 {
        self as u32
    }

    /// Size of one component in bytes, 0 for `Invalid`.
    pub fn size(self) -> usize {
        match self {
            DataType::Int8 | DataType::Uint8 | DataType::Bool => 1,
            DataType::Int16 | DataType::Uint16 => 2,
            DataType::Int32 | DataType::Uint32 | DataType::Float32 => 4,
            DataType::Int64 | DataType::Uint64 | DataType::Float64 => 8,
            DataType::Invalid => 0,
        }
    }

    pub fn is_integral(self) -> bool {
        !matches!(self, DataType::Float32 | DataType::Float64 | DataType::Invalid)
    }
}

/// Index of a point inside a point cloud or mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct PointIndex(pub u32);

/// Index of a stored value inside an attribute's backing buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct AttributeValueIndex(pub u32);

/// Index of a triangle inside a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FaceIndex(pub u32);

/// Triangle connectivity: three corners, each pointing at a point.
pub type Face = [PointIndex; 3];
