//! Configuration for the terrain generator.
//!
//! Settings persist to disk as `terrain.ron`. Supports CLI overrides via clap,
//! reload detection, and forward/backward compatible serialization: missing
//! sections fall back to defaults and unknown fields are ignored.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    CONFIG_FILE_NAME, ChunkConfig, DebugConfig, HeightmapConfig, TerrainConfig, default_config_dir,
};
pub use error::ConfigError;
