//! Demo binary that generates a grid of terrain chunks and writes previews.
//!
//! Configuration is loaded from `terrain.ron` and can be overridden via CLI flags.
//! Run with `cargo run -p strata-demo` for the default single chunk.
//! Run with `cargo run -p strata-demo -- --grid-radius 2 --heightmap island.png`
//! to overlay a heightmap on a 5x5 grid.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use strata_config::{CliArgs, ConfigError, TerrainConfig, default_config_dir};
use strata_terrain::{
    AsyncChunkBuilder, ChunkKey, ChunkTask, PreviewImage, RasterHeightSource, TerrainError,
    TerrainTileManager, render_color_preview, render_height_preview,
};
use tracing::{info, warn};

/// Failures that abort the demo.
#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Terrain(#[from] TerrainError),

    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Build the chunk grid described by `config`, attaching the heightmap if one
/// is configured and loads successfully.
fn build_terrain(config: &TerrainConfig) -> Result<TerrainTileManager, DemoError> {
    let mut manager = TerrainTileManager::new(
        config.terrain.clone(),
        config.biome.clone(),
        config.chunks.size,
        config.chunks.segments,
    )?;
    manager.set_rebuild_threads(config.chunks.resolved_threads());

    let start = Instant::now();
    manager.add_chunks_around_origin(config.chunks.grid_radius as i32);
    info!(
        chunks = manager.chunk_count(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "generated terrain grid"
    );

    if let Some(path) = &config.heightmap.path {
        match RasterHeightSource::open(path, config.heightmap.placement()) {
            Ok(raster) => {
                manager.set_heightmap(
                    raster,
                    config.heightmap.center(),
                    config.heightmap.inner_radius,
                    config.heightmap.outer_radius,
                )?;
            }
            Err(e) => warn!("Skipping heightmap {}: {e}", path.display()),
        }
    }

    Ok(manager)
}

/// Stitch every chunk into one color mosaic and, optionally, one height
/// mosaic. Adjacent chunks share their edge row of vertices.
fn render_mosaics(
    manager: &TerrainTileManager,
    radius: i32,
    heights: bool,
) -> Vec<(&'static str, PreviewImage)> {
    let Some(first) = manager.chunks().next() else {
        return Vec::new();
    };
    let segments = first.grid.segments;
    let side = (2 * radius as u32 + 1) * segments + 1;

    let mut color = PreviewImage::new(side, side);
    let mut height = PreviewImage::new(side, side);
    for chunk in manager.chunks() {
        let px = (chunk.key.x + radius) as u32 * segments;
        let py = (chunk.key.z + radius) as u32 * segments;
        color.blit(&render_color_preview(&chunk.samples), px, py);
        if heights {
            height.blit(&render_height_preview(&chunk.samples), px, py);
        }
    }

    let mut images = vec![("terrain_color.png", color)];
    if heights {
        images.push(("terrain_height.png", height));
    }
    images
}

fn write_previews(
    manager: &TerrainTileManager,
    config: &TerrainConfig,
    output_dir: &Path,
) -> Result<(), DemoError> {
    std::fs::create_dir_all(output_dir).map_err(|source| DemoError::OutputDir {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let radius = config.chunks.grid_radius as i32;
    for (name, image) in render_mosaics(manager, radius, config.debug.height_previews) {
        let path = output_dir.join(name);
        image.save_png(&path)?;
        info!("Wrote {} ({}x{})", path.display(), image.width, image.height);
    }
    Ok(())
}

/// Rebuild the ring of chunks just outside the grid on the background pool.
fn demonstrate_background_rebuild(manager: &TerrainTileManager, radius: i32) {
    let builder = AsyncChunkBuilder::with_defaults();
    let ring = radius + 1;

    let mut tasks = Vec::new();
    for x in -ring..=ring {
        for z in -ring..=ring {
            if x.abs() != ring && z.abs() != ring {
                continue;
            }
            let key = ChunkKey::new(x, z);
            tasks.push(ChunkTask {
                key,
                grid: manager.grid_for(key),
                pipeline: Arc::new(manager.pipeline_for(key)),
                priority: (x * x + z * z) as u64,
            });
        }
    }

    // Edge midpoints of the ring are queued before its corners.
    let total = tasks.len();
    let rejected = builder.submit_batch(tasks);
    for task in &rejected {
        warn!(key = ?task.key, "rebuild queue full");
    }
    let submitted = total - rejected.len();

    let deadline = Instant::now() + Duration::from_secs(60);
    let mut received = Vec::new();
    while received.len() < submitted && Instant::now() < deadline {
        received.extend(builder.drain_results());
        std::thread::sleep(Duration::from_millis(2));
    }

    let total_us: u64 = received.iter().map(|r| r.rebuild_time_us).sum();
    info!(
        submitted,
        received = received.len(),
        mean_us = total_us / received.len().max(1) as u64,
        "background ring rebuild complete"
    );
}

fn run(config: &TerrainConfig) -> Result<(), DemoError> {
    config.validate()?;
    let manager = build_terrain(config)?;

    for chunk in manager.chunks() {
        info!(
            x = chunk.key.x,
            z = chunk.key.z,
            min = chunk.samples.min_height(),
            max = chunk.samples.max_height(),
            "chunk heights"
        );
    }

    write_previews(&manager, config, &config.debug.output_dir)?;
    demonstrate_background_rebuild(&manager, config.chunks.grid_radius as i32);
    Ok(())
}

fn main() {
    let args = CliArgs::parse();

    let config_dir = args.config.clone().unwrap_or_else(default_config_dir);

    // Load or create config, then apply CLI overrides
    let mut config = TerrainConfig::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        TerrainConfig::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    strata_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    if let Err(e) = run(&config) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
