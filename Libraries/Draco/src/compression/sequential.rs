//! Sequential body codec.
//!
//! Follows the header. All integers are little-endian.
//!
//! ```text
//! num_points      u32
//! [mesh only]     num_faces u32, then num_faces * 3 corner indices (u32)
//! num_attributes  u32
//! per attribute:
//!   type i8, data_type u8, num_components u8, normalized u8,
//!   unique_id u32, num_values u32, encoding u8 (0 raw, 1 quantized)
//!   raw:        num_values * stride bytes, components little-endian
//!   quantized:  bits u8, min f32 * num_components, range f32,
//!               num_values * num_components codes (u8/u16/u32 by bits)
//!   mapping u8 (0 identity, 1 explicit), explicit: num_points * u32
//! ```

use std::collections::HashSet;
use std::io::{Cursor, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use tracing::trace;

use crate::attribute::{PointAttribute, MAX_NUM_COMPONENTS};
use crate::component::{from_ne_bytes, to_ne_bytes};
use crate::compression::options::EncoderOptions;
use crate::compression::quantization::{QuantizationParams, MAX_QUANTIZATION_BITS};
use crate::mesh::Mesh;
use crate::point_cloud::PointCloud;
use crate::status::{DracoError, DracoResult};
use crate::types::{AttributeValueIndex, DataType, GeometryAttributeType, PointIndex};

const ENCODING_RAW: u8 = 0;
const ENCODING_QUANTIZED: u8 = 1;

const MAPPING_IDENTITY: u8 = 0;
const MAPPING_EXPLICIT: u8 = 1;

fn write_err(err: std::io::Error) -> DracoError {
    DracoError::io(format!("Failed to write encoded data: {}", err))
}

fn truncated() -> DracoError {
    DracoError::io("Unexpected end of encoded data.")
}

pub fn encode_point_cloud_body<W: Write>(
    pc: &PointCloud,
    options: &EncoderOptions,
    out: &mut W,
) -> DracoResult<()> {
    out.write_u32::<LittleEndian>(pc.num_points()).map_err(write_err)?;
    encode_attributes(pc, options, out)
}

pub fn encode_mesh_body<W: Write>(mesh: &Mesh, options: &EncoderOptions, out: &mut W) -> DracoResult<()> {
    if !mesh.faces_are_valid() {
        return Err(DracoError::draco("Face references a point out of range."));
    }
    out.write_u32::<LittleEndian>(mesh.num_points()).map_err(write_err)?;
    out.write_u32::<LittleEndian>(mesh.num_faces()).map_err(write_err)?;
    for corner in mesh.indices() {
        out.write_u32::<LittleEndian>(corner).map_err(write_err)?;
    }
    encode_attributes(mesh.as_point_cloud(), options, out)
}

fn encode_attributes<W: Write>(pc: &PointCloud, options: &EncoderOptions, out: &mut W) -> DracoResult<()> {
    out.write_u32::<LittleEndian>(pc.num_attributes() as u32).map_err(write_err)?;
    for attribute in pc.attributes() {
        let bits = options.attribute_quantization(attribute.attribute_type());
        encode_attribute(pc, attribute, bits, out)?;
    }
    Ok(())
}

fn encode_attribute<W: Write>(
    pc: &PointCloud,
    attribute: &PointAttribute,
    quantization_bits: i32,
    out: &mut W,
) -> DracoResult<()> {
    let data_type = attribute.data_type();
    if data_type == DataType::Invalid
        || attribute.num_components() == 0
        || attribute.num_components() > MAX_NUM_COMPONENTS
    {
        return Err(DracoError::invalid_parameter("Attribute has an invalid layout."));
    }
    let num_values = attribute.size();
    let stride = attribute.stride();
    let values = attribute
        .buffer()
        .get(attribute.byte_offset() as usize..)
        .and_then(|buffer| buffer.get(..num_values * stride))
        .ok_or_else(|| DracoError::draco("Attribute buffer is shorter than its value count."))?;
    check_mapping(pc, attribute)?;

    let quantize = quantization_bits > 0 && data_type == DataType::Float32;
    if quantize && quantization_bits > MAX_QUANTIZATION_BITS {
        return Err(DracoError::invalid_parameter(format!(
            "Invalid quantization bits {} for {:?}.",
            quantization_bits,
            attribute.attribute_type()
        )));
    }

    out.write_i8(attribute.attribute_type().as_raw() as i8).map_err(write_err)?;
    out.write_u8(data_type.as_raw() as u8).map_err(write_err)?;
    out.write_u8(attribute.num_components()).map_err(write_err)?;
    out.write_u8(u8::from(attribute.normalized())).map_err(write_err)?;
    out.write_u32::<LittleEndian>(attribute.unique_id()).map_err(write_err)?;
    out.write_u32::<LittleEndian>(num_values as u32).map_err(write_err)?;

    if quantize {
        trace!(
            "Quantizing {:?} attribute to {} bits",
            attribute.attribute_type(),
            quantization_bits
        );
        let floats = from_ne_bytes::<f32>(values);
        let params = QuantizationParams::compute(&floats, usize::from(attribute.num_components()), quantization_bits)?;
        out.write_u8(ENCODING_QUANTIZED).map_err(write_err)?;
        out.write_u8(params.bits()).map_err(write_err)?;
        for &min in params.min_values() {
            out.write_f32::<LittleEndian>(min).map_err(write_err)?;
        }
        out.write_f32::<LittleEndian>(params.range()).map_err(write_err)?;
        for code in params.quantize(&floats) {
            let written = match params.bits() {
                0..=8 => out.write_u8(code as u8),
                9..=16 => out.write_u16::<LittleEndian>(code as u16),
                _ => out.write_u32::<LittleEndian>(code),
            };
            written.map_err(write_err)?;
        }
    } else {
        out.write_u8(ENCODING_RAW).map_err(write_err)?;
        let mut raw = values.to_vec();
        swap_to_little_endian(&mut raw, data_type.size());
        out.write_all(&raw).map_err(write_err)?;
    }

    match attribute.indices_map() {
        None => out.write_u8(MAPPING_IDENTITY).map_err(write_err)?,
        Some(map) => {
            out.write_u8(MAPPING_EXPLICIT).map_err(write_err)?;
            for index in map {
                out.write_u32::<LittleEndian>(index.0).map_err(write_err)?;
            }
        }
    }
    Ok(())
}

fn check_mapping(pc: &PointCloud, attribute: &PointAttribute) -> DracoResult<()> {
    let num_points = pc.num_points() as usize;
    let num_values = attribute.size();
    let valid = match attribute.indices_map() {
        None => num_values >= num_points,
        Some(map) => map.len() == num_points && map.iter().all(|index| (index.0 as usize) < num_values),
    };
    if valid {
        Ok(())
    } else {
        Err(DracoError::draco("Attribute mapping does not cover every point."))
    }
}

/// Components are stored native-endian in memory and little-endian on the wire.
fn swap_to_little_endian(bytes: &mut [u8], component_size: usize) {
    if cfg!(target_endian = "big") && component_size > 1 {
        for component in bytes.chunks_exact_mut(component_size) {
            component.reverse();
        }
    }
}

pub fn decode_point_cloud_body(cursor: &mut Cursor<&[u8]>, pc: &mut PointCloud) -> DracoResult<()> {
    let num_points = read_u32(cursor)?;
    pc.set_num_points(num_points);
    decode_attributes(cursor, pc)
}

pub fn decode_mesh_body(cursor: &mut Cursor<&[u8]>, mesh: &mut Mesh) -> DracoResult<()> {
    let num_points = read_u32(cursor)?;
    let num_faces = read_u32(cursor)? as usize;
    ensure_remaining(cursor, num_faces.saturating_mul(12))?;
    mesh.set_num_points(num_points);
    for _ in 0..num_faces {
        let mut face = [PointIndex(0); 3];
        for corner in &mut face {
            let index = read_u32(cursor)?;
            if index >= num_points {
                return Err(DracoError::draco("Face references a point out of range."));
            }
            *corner = PointIndex(index);
        }
        mesh.add_face(face);
    }
    decode_attributes(cursor, mesh.as_point_cloud_mut())
}

fn decode_attributes(cursor: &mut Cursor<&[u8]>, pc: &mut PointCloud) -> DracoResult<()> {
    let num_attributes = read_u32(cursor)?;
    let mut unique_ids = HashSet::new();
    for _ in 0..num_attributes {
        let attribute = decode_attribute(cursor, pc.num_points() as usize)?;
        if !unique_ids.insert(attribute.unique_id()) {
            return Err(DracoError::draco("Duplicate attribute unique id."));
        }
        pc.push_attribute(attribute);
    }
    Ok(())
}

fn decode_attribute(cursor: &mut Cursor<&[u8]>, num_points: usize) -> DracoResult<PointAttribute> {
    let attribute_type = GeometryAttributeType::from_raw(i64::from(cursor.read_i8().map_err(|_| truncated())?));
    let data_type = DataType::from_raw(u32::from(read_u8(cursor)?));
    let num_components = read_u8(cursor)?;
    let normalized = read_u8(cursor)? != 0;
    let unique_id = read_u32(cursor)?;
    let num_values = read_u32(cursor)? as usize;
    let encoding = read_u8(cursor)?;
    if attribute_type == GeometryAttributeType::Invalid {
        return Err(DracoError::draco("Invalid attribute type."));
    }
    if data_type == DataType::Invalid || num_components == 0 || num_components > MAX_NUM_COMPONENTS {
        return Err(DracoError::draco("Invalid attribute layout."));
    }

    let mut attribute = PointAttribute::new(attribute_type, num_components, data_type, normalized);
    attribute.set_unique_id(unique_id);
    let components = usize::from(num_components);
    match encoding {
        ENCODING_RAW => {
            let mut raw = read_bytes(cursor, num_values.saturating_mul(attribute.stride()))?.to_vec();
            swap_to_little_endian(&mut raw, data_type.size());
            attribute.reset(num_values);
            fill_values(&mut attribute, &raw)?;
        }
        ENCODING_QUANTIZED => {
            if data_type != DataType::Float32 {
                return Err(DracoError::draco("Quantized attribute must be float32."));
            }
            let bits = read_u8(cursor)?;
            let mut min_values = Vec::with_capacity(components);
            for _ in 0..components {
                min_values.push(cursor.read_f32::<LittleEndian>().map_err(|_| truncated())?);
            }
            let range = cursor.read_f32::<LittleEndian>().map_err(|_| truncated())?;
            let params = QuantizationParams::from_parts(bits, min_values, range)?;
            let count = num_values.saturating_mul(components);
            let code_size = match bits {
                0..=8 => 1,
                9..=16 => 2,
                _ => 4,
            };
            ensure_remaining(cursor, count.saturating_mul(code_size))?;
            let mut codes = Vec::with_capacity(count);
            for _ in 0..count {
                let code = match code_size {
                    1 => u32::from(read_u8(cursor)?),
                    2 => u32::from(cursor.read_u16::<LittleEndian>().map_err(|_| truncated())?),
                    _ => read_u32(cursor)?,
                };
                if code > params.max_quantized_value() {
                    return Err(DracoError::draco("Quantized value out of range."));
                }
                codes.push(code);
            }
            attribute.reset(num_values);
            fill_values(&mut attribute, &to_ne_bytes(&params.dequantize(&codes)))?;
        }
        other => {
            return Err(DracoError::unsupported_feature(format!(
                "Unsupported attribute encoding {}.",
                other
            )));
        }
    }

    match read_u8(cursor)? {
        MAPPING_IDENTITY => {
            if num_values < num_points {
                return Err(DracoError::draco("Attribute has fewer values than points."));
            }
        }
        MAPPING_EXPLICIT => {
            ensure_remaining(cursor, num_points.saturating_mul(4))?;
            let mut map = Vec::with_capacity(num_points);
            for _ in 0..num_points {
                let index = read_u32(cursor)?;
                if index as usize >= num_values {
                    return Err(DracoError::draco("Attribute mapping out of range."));
                }
                map.push(AttributeValueIndex(index));
            }
            attribute.set_indices_map(map);
        }
        other => {
            return Err(DracoError::draco(format!("Unknown attribute mapping {}.", other)));
        }
    }
    Ok(attribute)
}

fn fill_values(attribute: &mut PointAttribute, bytes: &[u8]) -> DracoResult<()> {
    let stride = attribute.stride();
    for (i, value) in bytes.chunks_exact(stride).enumerate() {
        if !attribute.set_value_bytes(AttributeValueIndex(i as u32), value) {
            return Err(DracoError::draco("Failed to store attribute value."));
        }
    }
    Ok(())
}

fn read_u8(cursor: &mut Cursor<&[u8]>) -> DracoResult<u8> {
    cursor.read_u8().map_err(|_| truncated())
}

fn read_u32(cursor: &mut Cursor<&[u8]>) -> DracoResult<u32> {
    cursor.read_u32::<LittleEndian>().map_err(|_| truncated())
}

fn ensure_remaining(cursor: &Cursor<&[u8]>, len: usize) -> DracoResult<()> {
    let remaining = cursor.get_ref().len().saturating_sub(cursor.position() as usize);
    if remaining < len {
        return Err(truncated());
    }
    Ok(())
}

fn read_bytes<'a>(cursor: &mut Cursor<&'a [u8]>, len: usize) -> DracoResult<&'a [u8]> {
    ensure_remaining(cursor, len)?;
    let data: &'a [u8] = *cursor.get_ref();
    let start = cursor.position() as usize;
    cursor.set_position((start + len) as u64);
    Ok(&data[start..start + len])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::PointCloudBuilder;

    fn encoded_cloud() -> Vec<u8> {
        let mut builder = PointCloudBuilder::new();
        builder.start(2);
        builder.set_attribute(2, Some(&[1u16, 2, 3, 4][..]), GeometryAttributeType::Generic, 2);
        let pc = builder.get().unwrap();
        let mut out = Vec::new();
        encode_point_cloud_body(&pc, &EncoderOptions::default(), &mut out).unwrap();
        out
    }

    #[test]
    fn raw_body_layout() {
        let bytes = encoded_cloud();
        // points, attribute count, descriptor, encoding, values, mapping
        assert_eq!(bytes.len(), 4 + 4 + 12 + 1 + 8 + 1);
        assert_eq!(&bytes[..4], &2u32.to_le_bytes());
        assert_eq!(&bytes[21..29], &[1, 0, 2, 0, 3, 0, 4, 0]);

        let mut pc = PointCloud::new();
        decode_point_cloud_body(&mut Cursor::new(&bytes[..]), &mut pc).unwrap();
        assert_eq!(pc.num_points(), 2);
        assert_eq!(pc.attribute_values::<u16>(pc.attribute(0).unwrap()), Some(vec![1, 2, 3, 4]));
    }

    #[test]
    fn every_truncation_is_an_error() {
        let bytes = encoded_cloud();
        for len in 0..bytes.len() {
            let mut pc = PointCloud::new();
            assert!(decode_point_cloud_body(&mut Cursor::new(&bytes[..len]), &mut pc).is_err());
        }
    }

    #[test]
    fn mapping_indices_are_validated() {
        let mut bytes = encoded_cloud();
        let last = bytes.len() - 1;
        bytes[last] = MAPPING_EXPLICIT;
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&5u32.to_le_bytes());
        let mut pc = PointCloud::new();
        let err = decode_point_cloud_body(&mut Cursor::new(&bytes[..]), &mut pc).unwrap_err();
        assert_eq!(err.message(), "Attribute mapping out of range.");
    }

    #[test]
    fn component_count_is_bounded() {
        let mut bytes = encoded_cloud();
        // num_points, num_attributes, type, data_type, then num_components
        assert_eq!(bytes[10], 2);
        bytes[10] = 200;
        let mut pc = PointCloud::new();
        let err = decode_point_cloud_body(&mut Cursor::new(&bytes[..]), &mut pc).unwrap_err();
        assert_eq!(err.message(), "Invalid attribute layout.");

        let mut pc = PointCloud::with_num_points(1);
        let mut attribute = PointAttribute::new(GeometryAttributeType::Generic, 200, DataType::Uint8, false);
        attribute.reset(1);
        pc.add_attribute(attribute);
        let err = encode_point_cloud_body(&pc, &EncoderOptions::default(), &mut Vec::new()).unwrap_err();
        assert_eq!(err.code(), crate::status::StatusCode::InvalidParameter);
    }
}
