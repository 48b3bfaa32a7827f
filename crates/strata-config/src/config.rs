//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use glam::DVec2;
use serde::{Deserialize, Serialize};
use strata_terrain::{
    ChunkGrid, ConstantSource, HeightSampler, NoiseConfig, RasterPlacement, TerrainError,
};

use crate::error::ConfigError;

/// File name used inside the config directory.
pub const CONFIG_FILE_NAME: &str = "terrain.ron";

/// Platform config directory for the generator, falling back to the working
/// directory when the platform has none.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("strata"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Top-level terrain generator configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerrainConfig {
    /// Fractal noise driving terrain height.
    pub terrain: NoiseConfig,
    /// Fractal noise driving the arid/humid color mix.
    pub biome: NoiseConfig,
    /// Optional raster heightmap overlay.
    pub heightmap: HeightmapConfig,
    /// Chunk grid layout.
    pub chunks: ChunkConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Raster heightmap overlay configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HeightmapConfig {
    /// Image to load. No overlay is attached when `None`.
    pub path: Option<PathBuf>,
    /// Height of a full-intensity pixel.
    pub height: f64,
    /// World center of the overlay sampler.
    pub center: (f64, f64),
    /// Full-weight radius around `center`.
    pub inner_radius: f64,
    /// Zero-weight radius around `center`.
    pub outer_radius: f64,
    /// World coordinate of the raster's minimum corner.
    pub offset: (f64, f64),
    /// World size covered by the raster.
    pub extent: (f64, f64),
}

/// Chunk grid configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChunkConfig {
    /// Side length of one chunk in world units.
    pub size: f64,
    /// Quads per chunk side.
    pub segments: u32,
    /// Chunks are generated in `[-grid_radius, grid_radius]²`.
    pub grid_radius: u32,
    /// Threads per chunk rebuild (0 = one per CPU core).
    pub rebuild_threads: usize,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Directory preview PNGs are written to.
    pub output_dir: PathBuf,
    /// Also write grayscale height previews next to the color previews.
    pub height_previews: bool,
}

// --- Default implementations ---

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            terrain: NoiseConfig::terrain(),
            biome: NoiseConfig::biome(),
            heightmap: HeightmapConfig::default(),
            chunks: ChunkConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

impl Default for HeightmapConfig {
    fn default() -> Self {
        Self {
            path: None,
            height: 128.0,
            center: (0.0, 0.0),
            inner_radius: 250.0,
            outer_radius: 300.0,
            offset: (-250.0, -250.0),
            extent: (500.0, 500.0),
        }
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            size: 500.0,
            segments: 128,
            grid_radius: 0,
            rebuild_threads: 0,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            output_dir: PathBuf::from("previews"),
            height_previews: true,
        }
    }
}

impl HeightmapConfig {
    /// World placement of the raster.
    pub fn placement(&self) -> RasterPlacement {
        RasterPlacement {
            offset: DVec2::new(self.offset.0, self.offset.1),
            extent: DVec2::new(self.extent.0, self.extent.1),
            height: self.height,
        }
    }

    /// World center of the overlay sampler.
    pub fn center(&self) -> DVec2 {
        DVec2::new(self.center.0, self.center.1)
    }

    fn validate(&self) -> Result<(), TerrainError> {
        HeightSampler::new(
            Arc::new(ConstantSource(0.0)),
            self.center(),
            self.inner_radius,
            self.outer_radius,
        )?;
        let placement = self.placement();
        if !(placement.extent.is_finite() && placement.extent.min_element() > 0.0) {
            return Err(TerrainError::InvalidRaster(format!(
                "extent must be finite and > 0, got {}",
                placement.extent
            )));
        }
        if !placement.offset.is_finite() || !placement.height.is_finite() {
            return Err(TerrainError::InvalidRaster(
                "offset and height must be finite".into(),
            ));
        }
        Ok(())
    }
}

impl ChunkConfig {
    /// Threads to use per chunk rebuild, resolving 0 to the core count.
    pub fn resolved_threads(&self) -> usize {
        if self.rebuild_threads == 0 {
            num_cpus::get().max(1)
        } else {
            self.rebuild_threads
        }
    }
}

// --- Validate / Load / Save / Reload ---

impl TerrainConfig {
    /// Check every section against the ranges the terrain pipeline accepts.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Terrain`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.terrain.validate()?;
        self.biome.validate()?;
        self.heightmap.validate()?;
        ChunkGrid::new(DVec2::ZERO, self.chunks.size, self.chunks.segments)?;
        Ok(())
    }

    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: TerrainConfig =
                ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            config.validate()?;
            log::info!("Loaded terrain config from {}", config_path.display());
            Ok(config)
        } else {
            let config = TerrainConfig::default();
            config.save(config_dir)?;
            log::info!("Created default terrain config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `terrain.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Re-read the file: returns `Some(new_config)` if it changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: TerrainConfig = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
        new_config.validate()?;

        if &new_config != self {
            log::info!("Terrain config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use strata_terrain::NoiseBasis;

    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = TerrainConfig::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(3))
                .unwrap();
        assert!(ron_str.contains("scale: 800.0"));
        assert!(ron_str.contains("scale: 2048.0"));
        assert!(ron_str.contains("basis: simplex"));
    }

    #[test]
    fn test_defaults_match_reference_terrain() {
        let config = TerrainConfig::default();
        assert_eq!(config.terrain.seed, 1);
        assert_eq!(config.terrain.octaves, 6);
        assert_eq!(config.biome.seed, 2);
        assert_eq!(config.heightmap.inner_radius, 250.0);
        assert_eq!(config.heightmap.outer_radius, 300.0);
        assert_eq!(config.chunks.size, 500.0);
        assert_eq!(config.chunks.segments, 128);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = TerrainConfig::default();
        config.terrain.basis = NoiseBasis::Perlin;
        config.heightmap.path = Some(PathBuf::from("maps/island.png"));
        let ron_str = ron::to_string(&config).unwrap();
        let deserialized: TerrainConfig = ron::from_str(&ron_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_missing_section_uses_default() {
        let ron_str = "(terrain: (), chunks: (segments: 16))";
        let config: TerrainConfig = ron::from_str(ron_str).unwrap();
        assert_eq!(config.biome, NoiseConfig::biome());
        assert_eq!(config.heightmap, HeightmapConfig::default());
        assert_eq!(config.chunks.segments, 16);
        assert_eq!(config.chunks.size, 500.0);
    }

    #[test]
    fn test_extra_field_ignored() {
        let result: Result<TerrainConfig, _> = ron::from_str("(future_setting: true)");
        assert!(result.is_ok());
    }

    #[test]
    fn test_basis_parses_lowercase() {
        let config: TerrainConfig = ron::from_str("(terrain: (basis: value))").unwrap();
        assert_eq!(config.terrain.basis, NoiseBasis::Value);
    }

    #[test]
    fn test_validate_rejects_bad_noise() {
        let mut config = TerrainConfig::default();
        config.terrain.persistence = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Terrain(TerrainError::InvalidNoiseConfig { .. }))
        ));
    }

    #[test]
    fn test_validate_rejects_inverted_radii() {
        let mut config = TerrainConfig::default();
        config.heightmap.inner_radius = 400.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Terrain(TerrainError::InvalidSampler(_)))
        ));
    }

    #[test]
    fn test_validate_rejects_empty_extent() {
        let mut config = TerrainConfig::default();
        config.heightmap.extent = (0.0, 500.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Terrain(TerrainError::InvalidRaster(_)))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_segments() {
        let mut config = TerrainConfig::default();
        config.chunks.segments = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = TerrainConfig::default();
        config.terrain.seed = 99;
        config.chunks.grid_radius = 2;
        config.debug.log_level = "debug".to_string();

        config.save(dir.path()).unwrap();
        let loaded = TerrainConfig::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = TerrainConfig::load_or_create(dir.path()).unwrap();
        assert_eq!(config, TerrainConfig::default());
        assert!(dir.path().join(CONFIG_FILE_NAME).exists());
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "(terrain: (octaves: 0))",
        )
        .unwrap();
        assert!(matches!(
            TerrainConfig::load_or_create(dir.path()),
            Err(ConfigError::Terrain(_))
        ));
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = TerrainConfig::default();
        config.save(dir.path()).unwrap();

        let mut modified = config.clone();
        modified.terrain.height = 450.0;
        modified.save(dir.path()).unwrap();

        let result = config.reload(dir.path()).unwrap();
        assert_eq!(result.unwrap().terrain.height, 450.0);
    }

    #[test]
    fn test_reload_no_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = TerrainConfig::default();
        config.save(dir.path()).unwrap();

        assert!(config.reload(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "{{not valid}}").unwrap();
        assert!(matches!(
            TerrainConfig::load_or_create(dir.path()),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_resolved_threads() {
        let mut chunks = ChunkConfig::default();
        assert!(chunks.resolved_threads() >= 1);
        chunks.rebuild_threads = 3;
        assert_eq!(chunks.resolved_threads(), 3);
    }
}
