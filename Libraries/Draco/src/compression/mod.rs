pub mod decoder;
pub mod encoder;
pub mod header;
pub mod options;
pub mod quantization;
pub mod sequential;

pub use decoder::Decoder;
pub use encoder::Encoder;
pub use header::encoded_geometry_type;
pub use options::EncoderOptions;
