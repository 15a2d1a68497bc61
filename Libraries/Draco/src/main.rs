use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use draco_api::*;
use tracing::{debug, info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, Layer};

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, ValueEnum)]
enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "draco-api")]
struct Args {
    // Set the log level (possible values: error, warn, info, debug, trace)
    #[arg(short, long, default_value = "info")]
    log_level: LogLevel,
    /// Quantization bits for positions and texture coordinates, 0 disables quantization
    #[arg(short, long, default_value_t = 0)]
    quantization_bits: i32,
    /// JSON file with encoder options, overrides --quantization-bits
    #[arg(short, long)]
    options: Option<PathBuf>,
}

// Unit cube as a triangle soup: 12 faces, 3 corners each.
const CUBE_POSITIONS: [[f32; 3]; 36] = [
    [0., 0., 0.], [1., 0., 0.], [0., 1., 0.], [0., 1., 0.], [1., 0., 0.], [1., 1., 0.],
    [0., 1., 1.], [1., 0., 1.], [0., 0., 1.], [1., 1., 1.], [1., 0., 1.], [0., 1., 1.],
    [0., 1., 0.], [1., 1., 0.], [0., 1., 1.], [0., 1., 1.], [1., 1., 0.], [1., 1., 1.],
    [0., 0., 1.], [1., 0., 0.], [0., 0., 0.], [1., 0., 1.], [1., 0., 0.], [0., 0., 1.],
    [1., 0., 0.], [1., 0., 1.], [1., 1., 0.], [1., 1., 0.], [1., 0., 1.], [1., 1., 1.],
    [0., 1., 0.], [0., 0., 1.], [0., 0., 0.], [0., 1., 1.], [0., 0., 1.], [0., 1., 0.],
];

fn cube_tex_coords() -> Vec<f32> {
    (0..36)
        .flat_map(|corner| if corner % 12 == 0 { [0.0, 0.5] } else { [0.5, 0.5] })
        .collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let fmt_layer = tracing_subscriber::fmt::layer()
        .pretty()
        .compact()
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_filter(match args.log_level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        });
    let subscriber = tracing_subscriber::registry().with(fmt_layer);
    tracing::subscriber::set_global_default(subscriber)?;

    info!("{:?}", args);

    let options = match &args.options {
        Some(path) => EncoderOptions::from_file(path)?,
        None => {
            let mut options = EncoderOptions::default();
            options.set_attribute_quantization(GeometryAttributeType::Position, args.quantization_bits);
            options.set_attribute_quantization(GeometryAttributeType::TexCoord, args.quantization_bits);
            options
        }
    };
    debug!("Encoder options: {}", options.to_json()?);

    let positions: Vec<f32> = CUBE_POSITIONS.iter().flatten().copied().collect();
    let tex_coords = cube_tex_coords();

    let mut builder = MeshBuilder::new();
    builder.start(12);
    builder.set_attribute(12, Some(&positions[..]), GeometryAttributeType::Position, 3);
    builder.set_attribute(12, Some(&tex_coords[..]), GeometryAttributeType::TexCoord, 2);
    let mesh = builder.get().ok_or("Mesh builder produced no mesh")?;
    println!("Built mesh: {} faces, {} points", mesh.num_faces(), mesh.num_points());

    let encoded = Encoder::with_options(options).encode_mesh(&mesh)?;
    println!("Encoding successful! Encoded size: {} bytes", encoded.len());
    println!("Encoded geometry type: {:?}", encoded_geometry_type(&encoded));

    let mut decoded = Mesh::new();
    Decoder::new().decode_mesh(&encoded, &mut decoded)?;
    println!(
        "Decoding successful! {} faces, {} points, {} attributes",
        decoded.num_faces(),
        decoded.num_points(),
        decoded.num_attributes()
    );

    let position = decoded
        .named_attribute(GeometryAttributeType::Position)
        .ok_or("Decoded mesh has no positions")?;
    let values = decoded
        .attribute_values::<f32>(position)
        .ok_or("Failed to read decoded positions")?;
    for (face, corners) in decoded.indices().chunks_exact(3).enumerate() {
        let points: Vec<&[f32]> = corners
            .iter()
            .map(|&corner| &values[corner as usize * 3..corner as usize * 3 + 3])
            .collect();
        println!("face {:2}: {:?} -> {:?}", face, corners, points);
    }

    Ok(())
}
