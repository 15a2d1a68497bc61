//! C boundary.
//!
//! Every handle is a heap object owned by the caller: `draco_new_*` allocates,
//! the matching `*_free` releases. Attribute handles are borrowed views into
//! their geometry and die with it. Point clouds and meshes share one handle
//! type, so every point-cloud function also accepts a mesh.
//!
//! Null handles never crash: the call logs an error and returns a neutral value
//! (0, false, -1, null) or an error status.

#![allow(non_camel_case_types)]

use std::ffi::{c_char, c_int, c_void};
use std::ptr;
use std::slice;

use tracing::error;

use crate::attribute::PointAttribute;
use crate::builder::{MeshBuilder, PointCloudBuilder, INVALID_ATTRIBUTE_ID};
use crate::compression::{encoded_geometry_type, Decoder, Encoder};
use crate::geometry::Geometry;
use crate::logging::{self, LogCallback};
use crate::mesh::Mesh;
use crate::point_cloud::PointCloud;
use crate::status::{DracoError, DracoResult, Status};
use crate::types::{DataType, EncodedGeometryType, GeometryAttributeType};

pub type draco_status_t = Status;
pub type draco_point_attr_t = PointAttribute;
pub type draco_point_cloud_t = Geometry;
pub type draco_mesh_t = Geometry;
pub type draco_encoder_t = Encoder;
pub type draco_decoder_t = Decoder;
pub type draco_point_cloud_builder_t = PointCloudBuilder;
pub type draco_mesh_builder_t = MeshBuilder;

macro_rules! handle {
    ($ptr:expr, $name:literal, $fallback:expr) => {
        match $ptr.as_ref() {
            Some(handle) => handle,
            None => {
                error!("{} called with a null handle", $name);
                return $fallback;
            }
        }
    };
}

macro_rules! handle_mut {
    ($ptr:expr, $name:literal, $fallback:expr) => {
        match $ptr.as_mut() {
            Some(handle) => handle,
            None => {
                error!("{} called with a null handle", $name);
                return $fallback;
            }
        }
    };
}

fn new_handle<T>(value: T) -> *mut T {
    Box::into_raw(Box::new(value))
}

unsafe fn free_handle<T>(handle: *mut T) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

fn status_handle(status: impl Into<Status>) -> *mut draco_status_t {
    new_handle(status.into())
}

fn null_handle_status(name: &str) -> *mut draco_status_t {
    error!("{} called with a null handle", name);
    status_handle(DracoError::invalid_parameter("Null handle."))
}

/// Borrowed view of caller memory. A null pointer is accepted only for an empty range.
unsafe fn input_bytes<'a>(data: *const c_char, len: usize) -> Option<&'a [u8]> {
    if len == 0 {
        return Some(&[]);
    }
    if data.is_null() {
        return None;
    }
    Some(slice::from_raw_parts(data as *const u8, len))
}

// Logging

#[no_mangle]
pub extern "C" fn draco_init_logging(log_level: u32) -> bool {
    logging::init_logging(logging::level_filter(log_level))
}

#[no_mangle]
pub extern "C" fn draco_register_log_callback(callback: Option<LogCallback>) {
    logging::set_log_callback(callback);
}

#[no_mangle]
pub extern "C" fn draco_unregister_log_callback() {
    logging::set_log_callback(None);
}

// Status

#[no_mangle]
pub unsafe extern "C" fn draco_status_free(status: *mut draco_status_t) {
    free_handle(status);
}

#[no_mangle]
pub unsafe extern "C" fn draco_status_code(status: *const draco_status_t) -> c_int {
    handle!(status, "draco_status_code", -1).code()
}

#[no_mangle]
pub unsafe extern "C" fn draco_status_ok(status: *const draco_status_t) -> bool {
    handle!(status, "draco_status_ok", false).ok()
}

#[no_mangle]
pub unsafe extern "C" fn draco_status_error_msg_length(status: *const draco_status_t) -> usize {
    handle!(status, "draco_status_error_msg_length", 0).error_msg_length()
}

/// Copies the NUL-terminated message into `msg`. Returns the bytes written, 0 if `length` is too small.
#[no_mangle]
pub unsafe extern "C" fn draco_status_error_msg(
    status: *const draco_status_t,
    msg: *mut c_char,
    length: usize,
) -> usize {
    let status = handle!(status, "draco_status_error_msg", 0);
    if msg.is_null() || length == 0 {
        return 0;
    }
    status.copy_error_msg(slice::from_raw_parts_mut(msg as *mut u8, length))
}

// Point attributes

#[no_mangle]
pub unsafe extern "C" fn draco_point_attr_size(pa: *const draco_point_attr_t) -> usize {
    handle!(pa, "draco_point_attr_size", 0).size()
}

#[no_mangle]
pub unsafe extern "C" fn draco_point_attr_type(pa: *const draco_point_attr_t) -> GeometryAttributeType {
    handle!(pa, "draco_point_attr_type", GeometryAttributeType::Invalid).attribute_type()
}

#[no_mangle]
pub unsafe extern "C" fn draco_point_data_type(pa: *const draco_point_attr_t) -> DataType {
    handle!(pa, "draco_point_data_type", DataType::Invalid).data_type()
}

#[no_mangle]
pub unsafe extern "C" fn draco_point_attr_num_components(pa: *const draco_point_attr_t) -> i8 {
    let num_components = handle!(pa, "draco_point_attr_num_components", 0).num_components();
    i8::try_from(num_components).unwrap_or(i8::MAX)
}

#[no_mangle]
pub unsafe extern "C" fn draco_point_attr_normalized(pa: *const draco_point_attr_t) -> bool {
    handle!(pa, "draco_point_attr_normalized", false).normalized()
}

#[no_mangle]
pub unsafe extern "C" fn draco_point_attr_byte_stride(pa: *const draco_point_attr_t) -> i64 {
    handle!(pa, "draco_point_attr_byte_stride", 0).byte_stride()
}

#[no_mangle]
pub unsafe extern "C" fn draco_point_attr_byte_offset(pa: *const draco_point_attr_t) -> i64 {
    handle!(pa, "draco_point_attr_byte_offset", 0).byte_offset()
}

#[no_mangle]
pub unsafe extern "C" fn draco_point_attr_unique_id(pa: *const draco_point_attr_t) -> u32 {
    handle!(pa, "draco_point_attr_unique_id", 0).unique_id()
}

// Point clouds

#[no_mangle]
pub extern "C" fn draco_new_point_cloud() -> *mut draco_point_cloud_t {
    new_handle(Geometry::PointCloud(PointCloud::new()))
}

#[no_mangle]
pub unsafe extern "C" fn draco_point_cloud_free(pc: *mut draco_point_cloud_t) {
    free_handle(pc);
}

#[no_mangle]
pub unsafe extern "C" fn draco_point_cloud_num_points(pc: *const draco_point_cloud_t) -> u32 {
    handle!(pc, "draco_point_cloud_num_points", 0).point_cloud().num_points()
}

#[no_mangle]
pub unsafe extern "C" fn draco_point_cloud_num_attrs(pc: *const draco_point_cloud_t) -> i32 {
    handle!(pc, "draco_point_cloud_num_attrs", 0).point_cloud().num_attributes()
}

/// Attribute at slot `att_id`, null outside `[0, num_attrs)`.
#[no_mangle]
pub unsafe extern "C" fn draco_point_cloud_get_attribute(
    pc: *const draco_point_cloud_t,
    att_id: i32,
) -> *const draco_point_attr_t {
    handle!(pc, "draco_point_cloud_get_attribute", ptr::null())
        .point_cloud()
        .attribute(att_id)
        .map_or(ptr::null(), |attribute| attribute as *const _)
}

#[no_mangle]
pub unsafe extern "C" fn draco_point_cloud_get_named_attribute_id(
    pc: *const draco_point_cloud_t,
    geo_type: i32,
) -> i32 {
    let pc = handle!(pc, "draco_point_cloud_get_named_attribute_id", -1);
    match GeometryAttributeType::from_raw(i64::from(geo_type)) {
        GeometryAttributeType::Invalid => -1,
        attribute_type => pc.point_cloud().named_attribute_id(attribute_type),
    }
}

#[no_mangle]
pub unsafe extern "C" fn draco_point_cloud_get_attribute_by_unique_id(
    pc: *const draco_point_cloud_t,
    unique_id: u32,
) -> *const draco_point_attr_t {
    handle!(pc, "draco_point_cloud_get_attribute_by_unique_id", ptr::null())
        .point_cloud()
        .attribute_by_unique_id(unique_id)
        .map_or(ptr::null(), |attribute| attribute as *const _)
}

/// Writes every point's value of `pa` as `data_type` into `out_values`.
///
/// `out_size` is in bytes and must equal `num_points * num_components * sizeof(data_type)`.
#[no_mangle]
pub unsafe extern "C" fn draco_point_cloud_get_attribute_data(
    pc: *const draco_point_cloud_t,
    pa: *const draco_point_attr_t,
    data_type: u32,
    out_size: usize,
    out_values: *mut c_void,
) -> bool {
    let pc = handle!(pc, "draco_point_cloud_get_attribute_data", false);
    let pa = handle!(pa, "draco_point_cloud_get_attribute_data", false);
    let out: &mut [u8] = if out_size == 0 {
        &mut []
    } else if out_values.is_null() {
        return false;
    } else {
        slice::from_raw_parts_mut(out_values as *mut u8, out_size)
    };
    pc.point_cloud()
        .attribute_data_bytes(pa, DataType::from_raw(data_type), out)
}

// Meshes

#[no_mangle]
pub extern "C" fn draco_new_mesh() -> *mut draco_mesh_t {
    new_handle(Geometry::Mesh(Mesh::new()))
}

#[no_mangle]
pub unsafe extern "C" fn draco_mesh_free(mesh: *mut draco_mesh_t) {
    free_handle(mesh);
}

/// Face count, 0 for a handle holding a plain point cloud.
#[no_mangle]
pub unsafe extern "C" fn draco_mesh_num_faces(mesh: *const draco_mesh_t) -> u32 {
    handle!(mesh, "draco_mesh_num_faces", 0)
        .as_mesh()
        .map_or(0, Mesh::num_faces)
}

/// Writes three corner indices per face. `out_size` is in bytes and must equal `num_faces * 12`.
#[no_mangle]
pub unsafe extern "C" fn draco_mesh_get_indices(
    mesh: *const draco_mesh_t,
    out_size: usize,
    out_values: *mut u32,
) -> bool {
    let Some(mesh) = handle!(mesh, "draco_mesh_get_indices", false).as_mesh() else {
        return false;
    };
    let count = mesh.num_faces() as usize * 3;
    if out_size != count * std::mem::size_of::<u32>() {
        return false;
    }
    if count == 0 {
        return true;
    }
    if out_values.is_null() {
        return false;
    }
    mesh.copy_indices(slice::from_raw_parts_mut(out_values, count))
}

#[no_mangle]
pub unsafe extern "C" fn draco_get_encoded_geometry_type(
    data: *const c_char,
    data_size: usize,
) -> EncodedGeometryType {
    match input_bytes(data, data_size) {
        Some(bytes) => encoded_geometry_type(bytes),
        None => EncodedGeometryType::Invalid,
    }
}

// Decoder

#[no_mangle]
pub extern "C" fn draco_new_decoder() -> *mut draco_decoder_t {
    new_handle(Decoder::new())
}

#[no_mangle]
pub unsafe extern "C" fn draco_decoder_free(decoder: *mut draco_decoder_t) {
    free_handle(decoder);
}

/// Decodes a mesh into `out_mesh`, replacing its content.
#[no_mangle]
pub unsafe extern "C" fn draco_decoder_decode_mesh(
    decoder: *mut draco_decoder_t,
    data: *const c_char,
    data_size: usize,
    out_mesh: *mut draco_mesh_t,
) -> *mut draco_status_t {
    let (Some(decoder), Some(out)) = (decoder.as_ref(), out_mesh.as_mut()) else {
        return null_handle_status("draco_decoder_decode_mesh");
    };
    let Some(bytes) = input_bytes(data, data_size) else {
        return null_handle_status("draco_decoder_decode_mesh");
    };
    if out.as_mesh().is_none() {
        *out = Geometry::Mesh(Mesh::new());
    }
    let result = match out.as_mesh_mut() {
        Some(mesh) => decoder.decode_mesh(bytes, mesh),
        None => Err(DracoError::draco("Input is not a mesh.")),
    };
    status_handle(result)
}

/// Decodes a point cloud into `out_pc`, replacing its content.
#[no_mangle]
pub unsafe extern "C" fn draco_decoder_decode_point_cloud(
    decoder: *mut draco_decoder_t,
    data: *const c_char,
    data_size: usize,
    out_pc: *mut draco_point_cloud_t,
) -> *mut draco_status_t {
    let (Some(decoder), Some(out)) = (decoder.as_ref(), out_pc.as_mut()) else {
        return null_handle_status("draco_decoder_decode_point_cloud");
    };
    let Some(bytes) = input_bytes(data, data_size) else {
        return null_handle_status("draco_decoder_decode_point_cloud");
    };
    if out.as_mesh().is_some() {
        *out = Geometry::PointCloud(PointCloud::new());
    }
    status_handle(decoder.decode_point_cloud(bytes, out.point_cloud_mut()))
}

// Encoder

#[no_mangle]
pub extern "C" fn draco_new_encoder() -> *mut draco_encoder_t {
    new_handle(Encoder::new())
}

#[no_mangle]
pub unsafe extern "C" fn draco_encoder_free(encoder: *mut draco_encoder_t) {
    free_handle(encoder);
}

#[no_mangle]
pub unsafe extern "C" fn draco_encoder_set_attribute_quantization(
    encoder: *mut draco_encoder_t,
    att: u32,
    bits: c_int,
) {
    let encoder = handle_mut!(encoder, "draco_encoder_set_attribute_quantization", ());
    match GeometryAttributeType::from_raw(i64::from(att)) {
        GeometryAttributeType::Invalid => error!("Ignoring quantization for unknown attribute type {}", att),
        attribute_type => encoder.set_attribute_quantization(attribute_type, bits),
    }
}

/// Hands `bytes` to the caller in a `malloc` allocation, released with `free` or [`draco_free_buffer`].
unsafe fn export_buffer(bytes: &[u8], out_data: *mut *mut c_char, data_size: *mut usize) -> DracoResult<()> {
    let buffer = libc::malloc(bytes.len().max(1)) as *mut u8;
    if buffer.is_null() {
        return Err(DracoError::io("Failed to allocate the output buffer."));
    }
    ptr::copy_nonoverlapping(bytes.as_ptr(), buffer, bytes.len());
    *out_data = buffer as *mut c_char;
    *data_size = bytes.len();
    Ok(())
}

unsafe fn encode_to_caller(
    encoded: DracoResult<Vec<u8>>,
    out_data: *mut *mut c_char,
    data_size: *mut usize,
) -> *mut draco_status_t {
    *out_data = ptr::null_mut();
    *data_size = 0;
    status_handle(encoded.and_then(|bytes| export_buffer(&bytes, out_data, data_size)))
}

#[no_mangle]
pub unsafe extern "C" fn draco_encoder_encode_mesh(
    encoder: *mut draco_encoder_t,
    in_mesh: *mut draco_mesh_t,
    out_data: *mut *mut c_char,
    data_size: *mut usize,
) -> *mut draco_status_t {
    let (Some(encoder), Some(geometry)) = (encoder.as_ref(), in_mesh.as_ref()) else {
        return null_handle_status("draco_encoder_encode_mesh");
    };
    if out_data.is_null() || data_size.is_null() {
        return null_handle_status("draco_encoder_encode_mesh");
    }
    let encoded = match geometry.as_mesh() {
        Some(mesh) => encoder.encode_mesh(mesh),
        None => Err(DracoError::draco("Input is not a mesh.")),
    };
    encode_to_caller(encoded, out_data, data_size)
}

#[no_mangle]
pub unsafe extern "C" fn draco_encoder_encode_point_cloud(
    encoder: *mut draco_encoder_t,
    in_pc: *mut draco_point_cloud_t,
    out_data: *mut *mut c_char,
    data_size: *mut usize,
) -> *mut draco_status_t {
    let (Some(encoder), Some(geometry)) = (encoder.as_ref(), in_pc.as_ref()) else {
        return null_handle_status("draco_encoder_encode_point_cloud");
    };
    if out_data.is_null() || data_size.is_null() {
        return null_handle_status("draco_encoder_encode_point_cloud");
    }
    encode_to_caller(encoder.encode_point_cloud(geometry.point_cloud()), out_data, data_size)
}

#[no_mangle]
pub unsafe extern "C" fn draco_free_buffer(data: *mut c_char) {
    if !data.is_null() {
        libc::free(data as *mut c_void);
    }
}

// Builders

/// Borrows `rows` rows of `row_components` values of type `data_type` from `src`.
///
/// `None` means the request cannot describe a valid source: unknown type,
/// negative counts, or a null pointer.
unsafe fn builder_source<'a>(src: *const c_void, rows: c_int, row_components: usize, data_type: u32) -> Option<&'a [u8]> {
    let size = DataType::from_raw(data_type).size();
    if src.is_null() || rows < 0 || size == 0 {
        return None;
    }
    let len = (rows as usize).checked_mul(row_components)?.checked_mul(size)?;
    input_bytes(src as *const c_char, len)
}

#[no_mangle]
pub extern "C" fn draco_new_point_cloud_builder() -> *mut draco_point_cloud_builder_t {
    new_handle(PointCloudBuilder::new())
}

#[no_mangle]
pub unsafe extern "C" fn draco_point_cloud_builder_free(builder: *mut draco_point_cloud_builder_t) {
    free_handle(builder);
}

#[no_mangle]
pub unsafe extern "C" fn draco_point_cloud_builder_start(builder: *mut draco_point_cloud_builder_t, size: c_int) {
    handle_mut!(builder, "draco_point_cloud_builder_start", ()).start(size.max(0) as u32);
}

/// Hands the built point cloud to the caller. Null if the builder was not started.
#[no_mangle]
pub unsafe extern "C" fn draco_point_cloud_builder_get(
    builder: *mut draco_point_cloud_builder_t,
) -> *mut draco_point_cloud_t {
    handle_mut!(builder, "draco_point_cloud_builder_get", ptr::null_mut())
        .get()
        .map_or(ptr::null_mut(), |pc| new_handle(Geometry::PointCloud(pc)))
}

/// Adds an attribute from `num_points` rows of `ncomp` values. Returns its id, or -1 if nothing was added.
#[no_mangle]
pub unsafe extern "C" fn draco_point_cloud_set_attribute(
    num_points: c_int,
    builder: *mut draco_point_cloud_builder_t,
    src: *const c_void,
    att: u32,
    ncomp: i8,
    dt: u32,
) -> c_int {
    let builder = handle_mut!(builder, "draco_point_cloud_set_attribute", INVALID_ATTRIBUTE_ID);
    if ncomp <= 0 {
        return INVALID_ATTRIBUTE_ID;
    }
    let source = builder_source(src, num_points, ncomp as usize, dt);
    builder.set_attribute_bytes(
        num_points.max(0) as usize,
        source,
        GeometryAttributeType::from_raw(i64::from(att)),
        ncomp as u8,
        dt,
    )
}

#[no_mangle]
pub extern "C" fn draco_new_mesh_builder() -> *mut draco_mesh_builder_t {
    new_handle(MeshBuilder::new())
}

#[no_mangle]
pub unsafe extern "C" fn draco_mesh_builder_free(builder: *mut draco_mesh_builder_t) {
    free_handle(builder);
}

#[no_mangle]
pub unsafe extern "C" fn draco_mesh_builder_start(builder: *mut draco_mesh_builder_t, size: c_int) {
    handle_mut!(builder, "draco_mesh_builder_start", ()).start(size.max(0) as u32);
}

/// Hands the built mesh to the caller. Null if the builder was not started.
#[no_mangle]
pub unsafe extern "C" fn draco_mesh_builder_get(builder: *mut draco_mesh_builder_t) -> *mut draco_mesh_t {
    handle_mut!(builder, "draco_mesh_builder_get", ptr::null_mut())
        .get()
        .map_or(ptr::null_mut(), |mesh| new_handle(Geometry::Mesh(mesh)))
}

/// Adds an attribute from `num_faces` rows of `3 * ncomp` values. Returns its id, or -1 if nothing was added.
#[no_mangle]
pub unsafe extern "C" fn draco_mesh_set_attribute(
    num_faces: c_int,
    builder: *mut draco_mesh_builder_t,
    src: *const c_void,
    att: u32,
    ncomp: i8,
    dt: u32,
) -> c_int {
    let builder = handle_mut!(builder, "draco_mesh_set_attribute", INVALID_ATTRIBUTE_ID);
    if ncomp <= 0 {
        return INVALID_ATTRIBUTE_ID;
    }
    let source = builder_source(src, num_faces, 3 * ncomp as usize, dt);
    builder.set_attribute_bytes(
        num_faces.max(0) as usize,
        source,
        GeometryAttributeType::from_raw(i64::from(att)),
        ncomp as u8,
        dt,
    )
}
