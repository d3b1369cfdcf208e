//! Okinawa demo viewer
//!
//! Brings up the engine, uploads a triangle, and spins it with a tint —
//! enough to validate the window, the shader pipeline, and the frame
//! loop end to end.

use nalgebra::{Matrix4, Vector3};
use okinawa::prelude::*;

fn main() -> Result<(), EngineError> {
    env_logger::init();

    let config = EngineConfig::load_from_file("okinawa.toml").unwrap_or_else(|_| {
        log::info!("no okinawa.toml found, using defaults");
        EngineConfig::default()
    });

    let mut engine = Engine::new(config)?;

    let program = engine.load_default_program()?;
    let program_handle = program.handle();

    let (transform_loc, tint_loc) = {
        let reflection = engine
            .renderer()
            .reflection(program_handle)
            .expect("program was just linked");
        (
            reflection.uniform_location("u_transform").unwrap_or(-1),
            reflection.uniform_location("u_tint").unwrap_or(-1),
        )
    };

    // One vec4 per vertex; the vertex shader pulls from binding point 0
    let positions: [[f32; 4]; 3] = [
        [-0.5, -0.5, 0.0, 0.0],
        [0.5, -0.5, 0.0, 0.0],
        [0.0, 0.5, 0.0, 0.0],
    ];
    let vertex_bytes: &[u8] = bytemuck::cast_slice(&positions);

    let renderer = engine.renderer();
    let vertices = renderer
        .create_resource(&ResourceDescriptor::Buffer {
            size: vertex_bytes.len(),
            usage: BufferUsage::Static,
        })
        .map_err(|e| EngineError::Render(e.into()))?;
    renderer
        .upload(vertices, vertex_bytes, 0)
        .map_err(|e| EngineError::Render(e.into()))?;

    let mut angle = 0.0f32;
    engine.run(
        |_dt| {},
        move |renderer, dt| {
            angle += dt * 0.8;

            let transform = Matrix4::new_rotation(Vector3::z() * angle);
            let transform_bytes = bytemuck::cast_slice::<f32, u8>(transform.as_slice()).to_vec();
            let tint = [0.9f32, 0.6, 0.3, 1.0];

            let command = DrawCommand::new(
                PipelineState::with_program(program_handle).with_buffer(0, vertices),
                3,
            )
            .with_uniform(UniformWrite::new(transform_loc, UniformKind::Mat4, transform_bytes))
            .with_uniform(UniformWrite::new(
                tint_loc,
                UniformKind::Vec4,
                bytemuck::cast_slice::<f32, u8>(&tint).to_vec(),
            ));

            renderer.record(&command).map_err(RenderError::from)?;
            Ok(())
        },
    )
}
