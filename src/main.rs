use anyhow::{Context, Result};
use log::info;

use rusted_impulse::engine::physics::DebugRenderer;
use rusted_impulse::game::Scene;

/// Frames simulated when no count is given (10 seconds at 60 FPS)
const DEFAULT_FRAMES: u64 = 600;

/// Seed for the random spawn scene
const DEFAULT_SEED: u64 = 0x5eed;

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let mut args = std::env::args().skip(1);
    let scene: Scene = args.next().as_deref().unwrap_or("collision").parse()?;
    let frames = match args.next() {
        Some(arg) => arg
            .parse::<u64>()
            .with_context(|| format!("Invalid frame count '{}'", arg))?,
        None => DEFAULT_FRAMES,
    };
    let seed = match args.next() {
        Some(arg) => arg
            .parse::<u64>()
            .with_context(|| format!("Invalid seed '{}'", arg))?,
        None => DEFAULT_SEED,
    };

    info!("Starting Rusted Impulse: scene '{}', {} frames", scene, frames);

    let mut world = scene
        .build(seed)
        .with_context(|| format!("Failed to build scene '{}'", scene))?;

    let steps_per_second = ((1.0 / world.timestep()).round() as u64).max(1);
    for frame in 1..=frames {
        let stats = world
            .step()
            .with_context(|| format!("Simulation failed at frame {}", frame))?;

        if frame % steps_per_second == 0 {
            info!(
                "t={:.1}s: {} manifolds, {} contacts",
                frame as f64 * world.timestep(),
                stats.manifolds,
                stats.contacts
            );
        }
    }

    for (handle, body) in world.iter() {
        let position = body.position();
        info!(
            "{:?}: position ({:.3}, {:.3}), rotation {:.3}, speed {:.3}",
            handle,
            position.x,
            position.y,
            body.rotation(),
            body.linear_velocity().length()
        );
    }

    let mut debug_renderer = DebugRenderer::new();
    debug_renderer.set_enabled(true);
    debug_renderer.prepare(world.bodies_mut());
    info!(
        "Debug geometry: {} vertices, {} bytes",
        debug_renderer.vertices().len(),
        debug_renderer.vertex_bytes().len()
    );

    info!("Shutdown complete");
    Ok(())
}
