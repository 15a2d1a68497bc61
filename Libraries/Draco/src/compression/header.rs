//! The fixed header that opens every compressed buffer.
//!
//! Layout (11 bytes): `"DRACO"`, major version, minor version, encoder type,
//! encoder method, little-endian `u16` flags.

use std::io::{Cursor, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::status::{DracoError, DracoResult, StatusCode};
use crate::types::EncodedGeometryType;

pub const DRACO_MAGIC: &[u8; 5] = b"DRACO";
pub const HEADER_SIZE: usize = 11;

pub const VERSION_MAJOR: u8 = 2;
pub const VERSION_MINOR: u8 = 2;

/// Sequential encoding, the only method this engine writes.
pub const METHOD_SEQUENTIAL: u8 = 0;

pub const METADATA_FLAG_MASK: u16 = 0x8000;

const HEADER_PARSE_ERROR: &str = "Failed to parse Draco header.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DracoHeader {
    pub version_major: u8,
    pub version_minor: u8,
    pub encoder_type: u8,
    pub encoder_method: u8,
    pub flags: u16,
}

impl DracoHeader {
    pub fn new(geometry_type: EncodedGeometryType) -> Self {
        Self {
            version_major: VERSION_MAJOR,
            version_minor: VERSION_MINOR,
            encoder_type: geometry_type as u8,
            encoder_method: METHOD_SEQUENTIAL,
            flags: 0,
        }
    }

    /// Parses the header from the front of `cursor`.
    ///
    /// Only the framing is checked here. Version and method checks belong to the decoder.
    pub fn parse(cursor: &mut Cursor<&[u8]>) -> DracoResult<Self> {
        let mut magic = [0u8; 5];
        cursor
            .read_exact(&mut magic)
            .map_err(|_| DracoError::io(HEADER_PARSE_ERROR))?;
        if &magic != DRACO_MAGIC {
            return Err(DracoError::draco("Not a Draco file."));
        }
        let version_major = read_field(cursor)?;
        let version_minor = read_field(cursor)?;
        let encoder_type = read_field(cursor)?;
        let encoder_method = read_field(cursor)?;
        let flags = cursor
            .read_u16::<LittleEndian>()
            .map_err(|_| DracoError::io(HEADER_PARSE_ERROR))?;
        Ok(Self {
            version_major,
            version_minor,
            encoder_type,
            encoder_method,
            flags,
        })
    }

    pub fn write<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        out.write_all(DRACO_MAGIC)?;
        out.write_u8(self.version_major)?;
        out.write_u8(self.version_minor)?;
        out.write_u8(self.encoder_type)?;
        out.write_u8(self.encoder_method)?;
        out.write_u16::<LittleEndian>(self.flags)
    }

    pub fn geometry_type(&self) -> EncodedGeometryType {
        EncodedGeometryType::from_raw(self.encoder_type)
    }

    /// Rejects streams this engine cannot read.
    pub fn check_supported(&self) -> DracoResult<()> {
        if self.version_major > VERSION_MAJOR {
            return Err(DracoError::new(StatusCode::UnknownVersion, "Unknown major version."));
        }
        if self.version_major == VERSION_MAJOR && self.version_minor > VERSION_MINOR {
            return Err(DracoError::new(StatusCode::UnknownVersion, "Unknown minor version."));
        }
        if self.version_major < VERSION_MAJOR || self.version_minor < VERSION_MINOR {
            return Err(DracoError::new(
                StatusCode::UnsupportedVersion,
                "Old unsupported Draco version.",
            ));
        }
        if self.flags & METADATA_FLAG_MASK != 0 {
            return Err(DracoError::unsupported_feature("Metadata is not supported."));
        }
        if self.encoder_method != METHOD_SEQUENTIAL {
            return Err(DracoError::unsupported_feature(format!(
                "Unsupported encoding method {}.",
                self.encoder_method
            )));
        }
        Ok(())
    }
}

fn read_field(cursor: &mut Cursor<&[u8]>) -> DracoResult<u8> {
    cursor.read_u8().map_err(|_| DracoError::io(HEADER_PARSE_ERROR))
}

/// Geometry kind of a compressed buffer, read from its header alone.
///
/// Truncated or malformed headers yield [`EncodedGeometryType::Invalid`].
pub fn encoded_geometry_type(data: &[u8]) -> EncodedGeometryType {
    let mut cursor = Cursor::new(data);
    match DracoHeader::parse(&mut cursor) {
        Ok(header) => header.geometry_type(),
        Err(_) => EncodedGeometryType::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(header: DracoHeader) -> Vec<u8> {
        let mut out = Vec::new();
        header.write(&mut out).unwrap();
        out
    }

    #[test]
    fn header_is_eleven_bytes() {
        let bytes = header_bytes(DracoHeader::new(EncodedGeometryType::TriangularMesh));
        assert_eq!(bytes.len(), HEADER_SIZE);
        assert_eq!(&bytes[..5], b"DRACO");
        assert_eq!(encoded_geometry_type(&bytes), EncodedGeometryType::TriangularMesh);
        assert_eq!(encoded_geometry_type(&bytes), EncodedGeometryType::TriangularMesh);
    }

    #[test]
    fn sniffing_never_fails_loudly() {
        assert_eq!(encoded_geometry_type(&[]), EncodedGeometryType::Invalid);
        assert_eq!(encoded_geometry_type(b"D"), EncodedGeometryType::Invalid);
        assert_eq!(encoded_geometry_type(b"DRACO\x02\x02\x00"), EncodedGeometryType::Invalid);
        assert_eq!(encoded_geometry_type(b"NOTDRACO___"), EncodedGeometryType::Invalid);

        let mut header = DracoHeader::new(EncodedGeometryType::PointCloud);
        header.encoder_type = 7;
        assert_eq!(encoded_geometry_type(&header_bytes(header)), EncodedGeometryType::Invalid);
    }

    #[test]
    fn parse_errors_carry_engine_codes() {
        let err = DracoHeader::parse(&mut Cursor::new(&[1u8, 2, 3][..])).unwrap_err();
        assert_eq!(err.code(), StatusCode::IoError);
        assert_eq!(err.message(), "Failed to parse Draco header.");

        let err = DracoHeader::parse(&mut Cursor::new(&b"DRECO\x02\x02\x00\x00\x00\x00"[..])).unwrap_err();
        assert_eq!(err.code(), StatusCode::DracoError);
        assert_eq!(err.message(), "Not a Draco file.");
    }

    #[test]
    fn version_checks() {
        let mut header = DracoHeader::new(EncodedGeometryType::PointCloud);
        assert!(header.check_supported().is_ok());

        header.version_major = 3;
        assert_eq!(header.check_supported().unwrap_err().code(), StatusCode::UnknownVersion);

        header.version_major = VERSION_MAJOR;
        header.version_minor = 9;
        assert_eq!(header.check_supported().unwrap_err().message(), "Unknown minor version.");

        header.version_major = 1;
        header.version_minor = 3;
        assert_eq!(header.check_supported().unwrap_err().code(), StatusCode::UnsupportedVersion);

        let mut header = DracoHeader::new(EncodedGeometryType::PointCloud);
        header.flags = METADATA_FLAG_MASK;
        assert_eq!(header.check_supported().unwrap_err().code(), StatusCode::UnsupportedFeature);
    }
}
