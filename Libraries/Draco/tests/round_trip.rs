mod common;

use common::{corner_positions, cube_mesh, cube_tex_coords, init_test_logging, CUBE_POSITIONS};
use draco_api::*;

#[test]
fn cube_round_trip_is_lossless_without_quantization() {
    init_test_logging();
    let mesh = cube_mesh();
    let encoded = Encoder::new().encode_mesh(&mesh).unwrap();
    assert_eq!(encoded_geometry_type(&encoded), EncodedGeometryType::TriangularMesh);

    let mut decoded = Mesh::new();
    Decoder::new().decode_mesh(&encoded, &mut decoded).unwrap();
    assert_eq!(decoded.num_faces(), 12);
    assert_eq!(decoded.num_points(), mesh.num_points());
    assert_eq!(decoded.num_attributes(), 2);
    assert_eq!(corner_positions(&decoded), CUBE_POSITIONS.to_vec());
    assert_eq!(decoded, mesh);
}

#[test]
fn cube_round_trip_with_quantization_stays_within_bound() {
    let mut encoder = Encoder::new();
    encoder.set_attribute_quantization(GeometryAttributeType::Position, 11);
    encoder.set_attribute_quantization(GeometryAttributeType::TexCoord, 10);
    let encoded = encoder.encode_mesh(&cube_mesh()).unwrap();

    let mut decoded = Mesh::new();
    Decoder::new().decode_mesh(&encoded, &mut decoded).unwrap();
    assert_eq!(decoded.num_faces(), 12);

    let bound = 1.0 / 2047.0;
    for (got, want) in corner_positions(&decoded).iter().zip(CUBE_POSITIONS.iter()) {
        for c in 0..3 {
            assert!((got[c] - want[c]).abs() <= bound, "{:?} vs {:?}", got, want);
        }
    }

    let tex = decoded.named_attribute(GeometryAttributeType::TexCoord).unwrap();
    assert_eq!(tex.data_type(), DataType::Float32);
    let values = decoded.attribute_values::<f32>(tex).unwrap();
    let expected = cube_tex_coords();
    let corners = decoded.indices();
    for (corner_slot, &point) in corners.iter().enumerate() {
        for c in 0..2 {
            let got = values[point as usize * 2 + c];
            assert!((got - expected[corner_slot * 2 + c]).abs() <= 1.0 / 1023.0);
        }
    }
}

#[test]
fn decoded_attributes_keep_descriptors() {
    let mesh = cube_mesh();
    let encoded = Encoder::new().encode_mesh(&mesh).unwrap();
    let Geometry::Mesh(decoded) = Decoder::new().decode(&encoded).unwrap() else {
        panic!("expected a mesh");
    };
    for att_id in 0..decoded.num_attributes() {
        let attribute = decoded.attribute(att_id).unwrap();
        assert_eq!(attribute.unique_id(), att_id as u32);
        assert_eq!(decoded.named_attribute_id(attribute.attribute_type()), att_id);
        assert!(!attribute.normalized());
        assert_ne!(attribute.byte_stride(), 0);
        assert_eq!(attribute.byte_offset(), 0);
        assert_eq!(decoded.attribute_by_unique_id(att_id as u32), Some(attribute));
    }
    assert!(decoded.attribute(decoded.num_attributes()).is_none());
}

#[test]
fn point_cloud_with_mixed_types_round_trips() {
    let mut builder = PointCloudBuilder::new();
    builder.start(3);
    let normals = [-1i16, 0, 1, 300, -300, 0, 0, 0, i16::MAX];
    let colors = [255u8, 0, 0, 255, 0, 255, 0, 255, 0, 0, 255, 255];
    let ids = [7u64, 8, u64::MAX];
    assert_eq!(builder.set_attribute(3, Some(&normals[..]), GeometryAttributeType::Normal, 3), 0);
    assert_eq!(builder.set_attribute(3, Some(&colors[..]), GeometryAttributeType::Color, 4), 1);
    assert_eq!(builder.set_attribute(3, Some(&ids[..]), GeometryAttributeType::Generic, 1), 2);
    let pc = builder.get().unwrap();

    // Quantization only touches float attributes.
    let mut encoder = Encoder::new();
    encoder.set_attribute_quantization(GeometryAttributeType::Normal, 8);
    let encoded = encoder.encode_point_cloud(&pc).unwrap();
    let mut decoded = PointCloud::new();
    Decoder::new().decode_point_cloud(&encoded, &mut decoded).unwrap();
    assert_eq!(decoded, pc);

    let normal = decoded.attribute(0).unwrap();
    assert_eq!(decoded.attribute_values::<i16>(normal), Some(normals.to_vec()));
    let generic = decoded.attribute(2).unwrap();
    assert_eq!(generic.data_type(), DataType::Uint64);
    assert_eq!(
        decoded.point_value::<u64>(generic, types::PointIndex(2)),
        Some(vec![u64::MAX])
    );
}

#[test]
fn quantization_limits_are_enforced() {
    let mut builder = PointCloudBuilder::new();
    builder.start(2);
    builder.set_attribute(2, Some(&[0.0f32, 1.0, 2.0, f32::NAN, 4.0, 5.0][..]), GeometryAttributeType::Position, 3);
    let pc = builder.get().unwrap();

    let mut encoder = Encoder::new();
    encoder.set_attribute_quantization(GeometryAttributeType::Position, 31);
    let err = encoder.encode_point_cloud(&pc).unwrap_err();
    assert_eq!(err.code(), StatusCode::InvalidParameter);

    encoder.set_attribute_quantization(GeometryAttributeType::Position, 14);
    assert_eq!(
        encoder.encode_point_cloud(&pc).unwrap_err().code(),
        StatusCode::InvalidParameter
    );

    encoder.set_attribute_quantization(GeometryAttributeType::Position, 0);
    let encoded = encoder.encode_point_cloud(&pc).unwrap();
    let mut decoded = PointCloud::new();
    Decoder::new().decode_point_cloud(&encoded, &mut decoded).unwrap();
    let values = decoded.attribute_values::<f32>(decoded.attribute(0).unwrap()).unwrap();
    assert!(values[3].is_nan());
    assert_eq!(values[5], 5.0);
}

#[test]
fn options_file_drives_the_encoder() {
    let options = EncoderOptions::from_json(r#"{"quantization_bits": {"position": 8}}"#).unwrap();
    let encoder = Encoder::with_options(options);
    assert_eq!(encoder.options().attribute_quantization(GeometryAttributeType::Position), 8);
    let quantized = encoder.encode_mesh(&cube_mesh()).unwrap();
    let raw = Encoder::new().encode_mesh(&cube_mesh()).unwrap();
    assert!(quantized.len() < raw.len());
}

#[test]
fn malformed_input_reports_engine_errors() {
    let mut mesh = Mesh::new();
    let err = Decoder::new().decode_mesh(&[1, 2, 3], &mut mesh).unwrap_err();
    assert_eq!(err.code(), StatusCode::IoError);
    assert_eq!(err.message(), "Failed to parse Draco header.");
    assert_eq!(Status::from(err).code(), -2);

    let encoded = Encoder::new().encode_mesh(&cube_mesh()).unwrap();
    for len in [11usize, 12, 20, encoded.len() / 2, encoded.len() - 1] {
        let mut mesh = Mesh::new();
        assert!(Decoder::new().decode_mesh(&encoded[..len], &mut mesh).is_err());
        assert_eq!(mesh.num_faces(), 0);
        assert_eq!(mesh.num_attributes(), 0);
    }

    let mut future = encoded.clone();
    future[5] = 9;
    let err = Decoder::new().decode_mesh(&future, &mut mesh).unwrap_err();
    assert_eq!(err.code(), StatusCode::UnknownVersion);
    assert_eq!(err.message(), "Unknown major version.");
}

#[test]
fn unquantizable_extent_fails_at_encode() {
    let mut builder = PointCloudBuilder::new();
    builder.start(2);
    let positions = [-3e38f32, 0.0, 0.0, 3e38, 1.0, 1.0];
    builder.set_attribute(2, Some(&positions[..]), GeometryAttributeType::Position, 3);
    let pc = builder.get().unwrap();

    let mut encoder = Encoder::new();
    encoder.set_attribute_quantization(GeometryAttributeType::Position, 11);
    let err = encoder.encode_point_cloud(&pc).unwrap_err();
    assert_eq!(err.code(), StatusCode::InvalidParameter);

    // Without quantization the same values survive untouched.
    let encoded = Encoder::new().encode_point_cloud(&pc).unwrap();
    let mut decoded = PointCloud::new();
    Decoder::new().decode_point_cloud(&encoded, &mut decoded).unwrap();
    assert_eq!(decoded, pc);
}
