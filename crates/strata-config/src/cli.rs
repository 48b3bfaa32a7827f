//! Command-line argument parsing for the terrain generator.

use std::path::PathBuf;

use clap::Parser;
use strata_terrain::NoiseBasis;

use crate::TerrainConfig;

/// Terrain generator command-line arguments.
///
/// CLI values override settings loaded from `terrain.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "strata", about = "Procedural terrain height and color synthesis")]
pub struct CliArgs {
    /// Terrain noise seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Terrain noise basis (simplex, perlin, value).
    #[arg(long)]
    pub noise_type: Option<NoiseBasis>,

    /// Terrain noise octave count.
    #[arg(long)]
    pub octaves: Option<u32>,

    /// Terrain noise scale in world units.
    #[arg(long)]
    pub scale: Option<f64>,

    /// Terrain noise output height.
    #[arg(long)]
    pub height: Option<f64>,

    /// Heightmap image to overlay at the origin.
    #[arg(long, value_name = "PATH")]
    pub heightmap: Option<PathBuf>,

    /// Chunks generated around the origin in each direction.
    #[arg(long)]
    pub grid_radius: Option<u32>,

    /// Quads per chunk side.
    #[arg(long)]
    pub segments: Option<u32>,

    /// Directory preview images are written to.
    #[arg(long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long, value_name = "DIR")]
    pub config: Option<PathBuf>,
}

impl TerrainConfig {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(seed) = args.seed {
            self.terrain.seed = seed;
        }
        if let Some(basis) = args.noise_type {
            self.terrain.basis = basis;
        }
        if let Some(octaves) = args.octaves {
            self.terrain.octaves = octaves;
        }
        if let Some(scale) = args.scale {
            self.terrain.scale = scale;
        }
        if let Some(height) = args.height {
            self.terrain.height = height;
        }
        if let Some(ref path) = args.heightmap {
            self.heightmap.path = Some(path.clone());
        }
        if let Some(radius) = args.grid_radius {
            self.chunks.grid_radius = radius;
        }
        if let Some(segments) = args.segments {
            self.chunks.segments = segments;
        }
        if let Some(ref dir) = args.output {
            self.debug.output_dir = dir.clone();
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
