//! Attribute data extractor.
//!
//! Flattens an attribute into the canonical interchange layout: one row of
//! `num_components` values per point, points in ascending index order.
//!
//! Requests are accepted for 8/16/32-bit integers and both float widths.
//! 64-bit integers and bools can be stored but not requested.

use crate::attribute::PointAttribute;
use crate::component::Component;
use crate::point_cloud::PointCloud;
use crate::types::{DataType, PointIndex};

/// Output types the extractor can produce.
pub trait ExtractTarget: Component {}

impl ExtractTarget for i8 {}
impl ExtractTarget for u8 {}
impl ExtractTarget for i16 {}
impl ExtractTarget for u16 {}
impl ExtractTarget for i32 {}
impl ExtractTarget for u32 {}
impl ExtractTarget for f32 {}
impl ExtractTarget for f64 {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Path {
    /// Bulk copy allowed when the stored type matches and mapping is identity.
    Auto,
    PerPoint,
}

/// Typed extractor. `out.len()` must equal `num_points * num_components`.
///
/// On failure `out` is left unchanged.
pub fn attribute_data<T: ExtractTarget>(
    pc: &PointCloud,
    attribute: &PointAttribute,
    out: &mut [T],
) -> bool {
    let mut bytes = vec![0u8; out.len() * T::size()];
    if !extract_into::<T>(pc, attribute, &mut bytes, Path::Auto) {
        return false;
    }
    for (slot, chunk) in out.iter_mut().zip(bytes.chunks_exact(T::size())) {
        *slot = T::read_ne(chunk);
    }
    true
}

/// Byte extractor driven by a runtime type tag.
///
/// `out.len()` must equal `num_points * num_components * data_type.size()`.
/// Unsupported request types return `false` without writing.
pub fn attribute_data_bytes(
    pc: &PointCloud,
    attribute: &PointAttribute,
    data_type: DataType,
    out: &mut [u8],
) -> bool {
    match data_type {
        DataType::Int8 => extract_into::<i8>(pc, attribute, out, Path::Auto),
        DataType::Int16 => extract_into::<i16>(pc, attribute, out, Path::Auto),
        DataType::Int32 => extract_into::<i32>(pc, attribute, out, Path::Auto),
        DataType::Uint8 => extract_into::<u8>(pc, attribute, out, Path::Auto),
        DataType::Uint16 => extract_into::<u16>(pc, attribute, out, Path::Auto),
        DataType::Uint32 => extract_into::<u32>(pc, attribute, out, Path::Auto),
        DataType::Float32 => extract_into::<f32>(pc, attribute, out, Path::Auto),
        DataType::Float64 => extract_into::<f64>(pc, attribute, out, Path::Auto),
        _ => false,
    }
}

fn extract_into<T: ExtractTarget>(
    pc: &PointCloud,
    attribute: &PointAttribute,
    out: &mut [u8],
    path: Path,
) -> bool {
    let components = usize::from(attribute.num_components());
    let num_points = pc.num_points() as usize;
    let row_size = components * T::size();
    let data_size = num_points * row_size;
    if out.len() != data_size {
        return false;
    }

    let type_matches = attribute.data_type() == T::DATA_TYPE;
    if path == Path::Auto && type_matches && attribute.is_mapping_identity() {
        let start = attribute.byte_offset() as usize;
        return match attribute.buffer().get(start..start + data_size) {
            Some(src) => {
                out.copy_from_slice(src);
                true
            }
            None => false,
        };
    }

    let mut values = vec![T::default(); components];
    for (point, row) in (0..pc.num_points()).map(PointIndex).zip(out.chunks_exact_mut(row_size.max(1))) {
        let index = attribute.mapped_index(point);
        if type_matches {
            match attribute.value_bytes(index) {
                Some(src) => row.copy_from_slice(src),
                None => return false,
            }
        } else {
            if !attribute.convert_value::<T>(index, &mut values) {
                return false;
            }
            for (value, chunk) in values.iter().zip(row.chunks_exact_mut(T::size())) {
                value.write_ne(chunk);
            }
        }
    }
    true
}
