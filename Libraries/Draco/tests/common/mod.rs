#![allow(dead_code)]

use draco_api::{GeometryAttributeType, Mesh, MeshBuilder};

/// Unit cube as a triangle soup, one row per face corner.
pub const CUBE_POSITIONS: [[f32; 3]; 36] = [
    [0., 0., 0.], [1., 0., 0.], [0., 1., 0.], [0., 1., 0.], [1., 0., 0.], [1., 1., 0.],
    [0., 1., 1.], [1., 0., 1.], [0., 0., 1.], [1., 1., 1.], [1., 0., 1.], [0., 1., 1.],
    [0., 1., 0.], [1., 1., 0.], [0., 1., 1.], [0., 1., 1.], [1., 1., 0.], [1., 1., 1.],
    [0., 0., 1.], [1., 0., 0.], [0., 0., 0.], [1., 0., 1.], [1., 0., 0.], [0., 0., 1.],
    [1., 0., 0.], [1., 0., 1.], [1., 1., 0.], [1., 1., 0.], [1., 0., 1.], [1., 1., 1.],
    [0., 1., 0.], [0., 0., 1.], [0., 0., 0.], [0., 1., 1.], [0., 0., 1.], [0., 1., 0.],
];

pub fn cube_positions() -> Vec<f32> {
    CUBE_POSITIONS.iter().flatten().copied().collect()
}

pub fn cube_tex_coords() -> Vec<f32> {
    (0..36)
        .flat_map(|corner| if corner % 12 == 0 { [0.0, 0.5] } else { [0.5, 0.5] })
        .collect()
}

pub fn cube_mesh() -> Mesh {
    let mut builder = MeshBuilder::new();
    builder.start(12);
    assert_eq!(
        builder.set_attribute(12, Some(&cube_positions()[..]), GeometryAttributeType::Position, 3),
        0
    );
    assert_eq!(
        builder.set_attribute(12, Some(&cube_tex_coords()[..]), GeometryAttributeType::TexCoord, 2),
        1
    );
    builder.get().expect("started builder yields a mesh")
}

/// Position of every face corner, in face order.
pub fn corner_positions(mesh: &Mesh) -> Vec<[f32; 3]> {
    let attribute = mesh
        .named_attribute(GeometryAttributeType::Position)
        .expect("mesh has positions");
    let values = mesh.attribute_values::<f32>(attribute).expect("positions are readable");
    mesh.indices()
        .into_iter()
        .map(|corner| {
            let i = corner as usize * 3;
            [values[i], values[i + 1], values[i + 2]]
        })
        .collect()
}

pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}
