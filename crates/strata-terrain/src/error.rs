//! Terrain construction error types.

/// Errors raised when constructing noise fields, samplers, rasters or gradients.
///
/// Evaluation itself never fails; every check happens up front so that the
/// per-vertex path stays infallible.
#[derive(Debug, thiserror::Error)]
pub enum TerrainError {
    /// A [`NoiseConfig`](crate::NoiseConfig) field is out of range.
    #[error("invalid noise config: `{field}` {reason}")]
    InvalidNoiseConfig {
        /// Name of the offending field.
        field: &'static str,
        /// Human-readable constraint that was violated.
        reason: String,
    },

    /// Height sampler radii or center are unusable.
    #[error("invalid height sampler: {0}")]
    InvalidSampler(String),

    /// Raster dimensions, buffer length or world placement are unusable.
    #[error("invalid raster: {0}")]
    InvalidRaster(String),

    /// Failed to decode a heightmap image.
    #[error("failed to load heightmap image: {0}")]
    ImageLoad(#[from] image::ImageError),

    /// Chunk grid dimensions are unusable.
    #[error("invalid chunk grid: {0}")]
    InvalidChunk(String),

    /// Color gradient stops are unusable.
    #[error("invalid color gradient: {0}")]
    InvalidGradient(String),
}
