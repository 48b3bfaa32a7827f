//! Chunk vertex grids and their rebuild into per-vertex heights and colors.
//!
//! A chunk is a square plane of `(segments + 1)²` vertices centered on a world
//! offset. Rebuilding evaluates the [`TerrainPipeline`] once per vertex; there
//! is no dependency between vertices, so rows can be split across threads.

use glam::DVec2;
use tracing::debug;

use crate::color::Rgb;
use crate::error::TerrainError;
use crate::pipeline::{TerrainPipeline, VertexSample};

/// Vertex layout of one square chunk.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChunkGrid {
    /// World coordinate of the chunk center.
    pub offset: DVec2,
    /// Side length in world units.
    pub size: f64,
    /// Quads per side; there are `segments + 1` vertices per row.
    pub segments: u32,
}

impl ChunkGrid {
    /// Create a grid.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::InvalidChunk`] if `segments` is 0 or `size` is
    /// not finite and positive.
    pub fn new(offset: DVec2, size: f64, segments: u32) -> Result<Self, TerrainError> {
        if segments == 0 {
            return Err(TerrainError::InvalidChunk("segments must be >= 1".into()));
        }
        if !(size.is_finite() && size > 0.0) {
            return Err(TerrainError::InvalidChunk(format!(
                "size must be finite and > 0, got {size}"
            )));
        }
        if !offset.is_finite() {
            return Err(TerrainError::InvalidChunk(format!(
                "offset must be finite, got {offset}"
            )));
        }
        Ok(Self {
            offset,
            size,
            segments,
        })
    }

    /// Vertices per row (and per column).
    pub fn row_len(&self) -> usize {
        self.segments as usize + 1
    }

    /// Total vertex count.
    pub fn vertex_count(&self) -> usize {
        self.row_len() * self.row_len()
    }

    /// World coordinate of vertex `(ix, iy)`.
    pub fn vertex_position(&self, ix: u32, iy: u32) -> DVec2 {
        let step = self.size / self.segments as f64;
        let half = self.size * 0.5;
        self.offset + DVec2::new(ix as f64 * step - half, iy as f64 * step - half)
    }
}

/// Rebuilt vertex data of one chunk, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct ChunkSamples {
    /// Layout the samples were produced for.
    pub grid: ChunkGrid,
    /// One height per vertex.
    pub heights: Vec<f64>,
    /// One color per vertex.
    pub colors: Vec<Rgb>,
}

impl ChunkSamples {
    /// Sample for vertex `(ix, iy)`.
    ///
    /// # Panics
    ///
    /// Panics if either index exceeds `segments`.
    pub fn vertex(&self, ix: u32, iy: u32) -> VertexSample {
        let idx = iy as usize * self.grid.row_len() + ix as usize;
        VertexSample {
            height: self.heights[idx],
            color: self.colors[idx],
        }
    }

    /// Lowest vertex height.
    pub fn min_height(&self) -> f64 {
        self.heights.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Highest vertex height.
    pub fn max_height(&self) -> f64 {
        self.heights.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }
}

fn rebuild_rows(
    pipeline: &TerrainPipeline,
    grid: &ChunkGrid,
    first_row: u32,
    out: &mut [VertexSample],
) {
    let row_len = grid.row_len();
    for (i, slot) in out.iter_mut().enumerate() {
        let iy = first_row + (i / row_len) as u32;
        let ix = (i % row_len) as u32;
        let p = grid.vertex_position(ix, iy);
        *slot = pipeline.sample(p.x, p.y);
    }
}

fn split_samples(grid: ChunkGrid, samples: Vec<VertexSample>) -> ChunkSamples {
    let (heights, colors) = samples.into_iter().map(|s| (s.height, s.color)).unzip();
    ChunkSamples {
        grid,
        heights,
        colors,
    }
}

/// Evaluate every vertex of `grid` on the calling thread.
pub fn rebuild_chunk(pipeline: &TerrainPipeline, grid: &ChunkGrid) -> ChunkSamples {
    let mut samples = vec![
        VertexSample {
            height: 0.0,
            color: Rgb::default(),
        };
        grid.vertex_count()
    ];
    rebuild_rows(pipeline, grid, 0, &mut samples);
    split_samples(*grid, samples)
}

/// Evaluate every vertex of `grid`, splitting rows across `threads` scoped
/// threads. Output is identical to [`rebuild_chunk`].
pub fn rebuild_chunk_parallel(
    pipeline: &TerrainPipeline,
    grid: &ChunkGrid,
    threads: usize,
) -> ChunkSamples {
    let row_len = grid.row_len();
    let threads = threads.clamp(1, row_len);
    if threads == 1 {
        return rebuild_chunk(pipeline, grid);
    }

    let rows_per_thread = row_len.div_ceil(threads);
    let mut samples = vec![
        VertexSample {
            height: 0.0,
            color: Rgb::default(),
        };
        grid.vertex_count()
    ];

    std::thread::scope(|s| {
        for (band, out) in samples.chunks_mut(rows_per_thread * row_len).enumerate() {
            let first_row = (band * rows_per_thread) as u32;
            s.spawn(move || rebuild_rows(pipeline, grid, first_row, out));
        }
    });

    debug!(
        offset = %grid.offset,
        vertices = grid.vertex_count(),
        threads,
        "rebuilt chunk"
    );
    split_samples(*grid, samples)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::blend::HeightBlender;
    use crate::color::ColorClassifier;
    use crate::height_sampler::HeightSampler;
    use crate::height_source::BumpSource;
    use crate::noise_field::{NoiseConfig, NoiseField};

    fn noise_pipeline() -> TerrainPipeline {
        let terrain = Arc::new(NoiseField::new(NoiseConfig::terrain()).unwrap());
        let base = HeightSampler::new(terrain, DVec2::ZERO, 100_000.0, 100_001.0).unwrap();
        let bump = HeightSampler::new(Arc::new(BumpSource::default()), DVec2::ZERO, 250.0, 300.0)
            .unwrap();
        TerrainPipeline::new(
            HeightBlender::new(vec![bump, base]),
            Arc::new(NoiseField::new(NoiseConfig::biome()).unwrap()),
            Arc::new(ColorClassifier::default()),
        )
    }

    #[test]
    fn test_grid_corners_and_center() {
        let grid = ChunkGrid::new(DVec2::new(500.0, 0.0), 500.0, 4).unwrap();
        assert_eq!(grid.row_len(), 5);
        assert_eq!(grid.vertex_count(), 25);
        assert_eq!(grid.vertex_position(0, 0), DVec2::new(250.0, -250.0));
        assert_eq!(grid.vertex_position(4, 4), DVec2::new(750.0, 250.0));
        assert_eq!(grid.vertex_position(2, 2), DVec2::new(500.0, 0.0));
    }

    #[test]
    fn test_invalid_grid_rejected() {
        assert!(ChunkGrid::new(DVec2::ZERO, 500.0, 0).is_err());
        assert!(ChunkGrid::new(DVec2::ZERO, 0.0, 8).is_err());
        assert!(ChunkGrid::new(DVec2::new(f64::NAN, 0.0), 500.0, 8).is_err());
    }

    #[test]
    fn test_rebuild_produces_one_sample_per_vertex() {
        let grid = ChunkGrid::new(DVec2::ZERO, 500.0, 16).unwrap();
        let samples = rebuild_chunk(&noise_pipeline(), &grid);
        assert_eq!(samples.heights.len(), 17 * 17);
        assert_eq!(samples.colors.len(), 17 * 17);
        assert!(samples.heights.iter().all(|h| h.is_finite()));
    }

    #[test]
    fn test_vertex_lookup_matches_pipeline() {
        let pipeline = noise_pipeline();
        let grid = ChunkGrid::new(DVec2::new(-500.0, 500.0), 500.0, 8).unwrap();
        let samples = rebuild_chunk(&pipeline, &grid);
        let p = grid.vertex_position(3, 5);
        assert_eq!(samples.vertex(3, 5), pipeline.sample(p.x, p.y));
    }

    #[test]
    fn test_parallel_matches_serial() {
        let pipeline = noise_pipeline();
        let grid = ChunkGrid::new(DVec2::ZERO, 500.0, 32).unwrap();
        let serial = rebuild_chunk(&pipeline, &grid);
        for threads in [1, 2, 3, 7, 64] {
            let parallel = rebuild_chunk_parallel(&pipeline, &grid, threads);
            assert_eq!(serial, parallel, "threads={threads} diverged from serial rebuild");
        }
    }

    #[test]
    fn test_min_max_height() {
        let pipeline = noise_pipeline();
        let grid = ChunkGrid::new(DVec2::ZERO, 500.0, 8).unwrap();
        let samples = rebuild_chunk(&pipeline, &grid);
        assert!(samples.min_height() <= samples.max_height());
        assert!(samples.heights.iter().all(|&h| h >= samples.min_height()));
        assert!(samples.heights.iter().all(|&h| h <= samples.max_height()));
    }
}
