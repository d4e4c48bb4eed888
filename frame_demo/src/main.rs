//! Headless frame driver
//!
//! Runs the collect and render phases of consecutive frames on two threads:
//! while the render thread draws frame N from the rendering buckets, the
//! main thread updates transforms and collects frame N+1 into the updating
//! buckets. Both join before the buffers swap.
//!
//! Usage: `frame_demo [pipeline.toml|pipeline.ron]`

mod fleet;

use scene_pipeline::config::{Config, ConfigError, PipelineConfig};
use scene_pipeline::foundation::logging;
use scene_pipeline::foundation::math::Vec3;
use scene_pipeline::render::{Camera, RenderCommandCollection};
use scene_pipeline::transform::TransformError;

use fleet::Fleet;

const FRAME_COUNT: usize = 180;
const FRAME_TIME: f32 = 1.0 / 60.0;
const REPORT_INTERVAL: usize = 60;

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("transform: {0}")]
    Transform(#[from] TransformError),

    #[error("render thread panicked")]
    RenderThread,
}

fn load_config() -> Result<PipelineConfig, ConfigError> {
    let config = match std::env::args().nth(1) {
        Some(path) => PipelineConfig::load_from_file(&path)?,
        None => PipelineConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn run() -> Result<(), DemoError> {
    let config = load_config()?;
    logging::init_with_config(&config.logging);
    log::info!(
        "Starting frame demo: {} passes, shadows {}",
        config.passes.len(),
        if config.shadows_enabled { "on" } else { "off" }
    );

    let main_passes = RenderCommandCollection::from_config(&config.passes, false);
    let shadow_passes = config
        .shadows_enabled
        .then(|| RenderCommandCollection::from_config(&config.shadow_passes, true));

    let mut fleet = Fleet::spawn(&mut rand::thread_rng())?;
    let mut camera = Camera::perspective(Vec3::new(0.0, 25.0, 60.0), 60.0, 16.0 / 9.0, 0.1, 500.0);

    for frame in 0..FRAME_COUNT {
        fleet.update(frame, FRAME_TIME)?;
        let centroid = fleet.centroid()?;
        camera.set_position(centroid + Vec3::new(0.0, 25.0, 60.0));
        camera.set_target(centroid);

        let (stats, rendered) = std::thread::scope(|scope| {
            let renderer = scope.spawn(|| {
                let shadow = shadow_passes.as_ref().map_or(0, RenderCommandCollection::render_all);
                shadow + main_passes.render_all()
            });
            let stats = fleet.collect(&main_passes, shadow_passes.as_ref(), &camera);
            (stats, renderer.join())
        });
        let rendered = rendered.map_err(|_| DemoError::RenderThread)?;

        main_passes.swap_buffers();
        if let Some(shadow_passes) = &shadow_passes {
            shadow_passes.swap_buffers();
        }

        if frame % REPORT_INTERVAL == 0 {
            log::info!(
                "Frame {}: collected {} main / {} shadow / {} overlay, rendered {} of previous frame",
                frame,
                stats.main,
                stats.shadow,
                stats.overlay,
                rendered
            );
        }
    }

    // Flush the last collected frame
    let tail = shadow_passes.as_ref().map_or(0, RenderCommandCollection::render_all) + main_passes.render_all();
    log::info!("Finished after {} frames ({} draws, {} in final frame)", FRAME_COUNT, fleet.draw_count(), tail);
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("frame_demo failed: {e}");
        std::process::exit(1);
    }
}
