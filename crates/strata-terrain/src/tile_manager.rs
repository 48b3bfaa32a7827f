//! Fixed grid of terrain chunks sharing one terrain field, one biome field and
//! an optional raster overlay.

use std::sync::Arc;

use glam::DVec2;
use hashbrown::HashMap;
use tracing::{debug, info};

use crate::blend::HeightBlender;
use crate::chunk::{ChunkGrid, ChunkSamples, rebuild_chunk_parallel};
use crate::color::ColorClassifier;
use crate::error::TerrainError;
use crate::height_sampler::HeightSampler;
use crate::noise_field::{NoiseConfig, NoiseField};
use crate::pipeline::TerrainPipeline;
use crate::raster::RasterHeightSource;

/// Inner radius of the per-chunk noise sampler; large enough that its weight
/// is 1 everywhere a chunk can reach.
pub const BASE_INNER_RADIUS: f64 = 100_000.0;
/// Outer radius of the per-chunk noise sampler.
pub const BASE_OUTER_RADIUS: f64 = 100_001.0;

/// Integer chunk coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkKey {
    /// Chunk index along world x.
    pub x: i32,
    /// Chunk index along world z.
    pub z: i32,
}

impl ChunkKey {
    /// Construct a key.
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// The four diagonal neighbours.
    pub fn diagonal_neighbours(self) -> [ChunkKey; 4] {
        [
            ChunkKey::new(self.x - 1, self.z - 1),
            ChunkKey::new(self.x - 1, self.z + 1),
            ChunkKey::new(self.x + 1, self.z - 1),
            ChunkKey::new(self.x + 1, self.z + 1),
        ]
    }

    /// World offset of this chunk's center for a given chunk size.
    pub fn offset(self, chunk_size: f64) -> DVec2 {
        DVec2::new(self.x as f64 * chunk_size, self.z as f64 * chunk_size)
    }
}

/// One chunk and its most recent rebuild.
#[derive(Clone, Debug)]
pub struct TerrainChunk {
    /// Chunk coordinate.
    pub key: ChunkKey,
    /// Vertex layout.
    pub grid: ChunkGrid,
    /// Diagonal neighbour keys recorded at creation.
    pub neighbours: [ChunkKey; 4],
    /// Latest vertex heights and colors.
    pub samples: ChunkSamples,
}

/// Owns every chunk and the shared synthesis inputs.
///
/// Parameter changes replace the affected field and rebuild every chunk; the
/// manager never mutates a field that a running rebuild could be reading.
pub struct TerrainTileManager {
    terrain: Arc<NoiseField>,
    /// Terrain sampler at the origin, recentered on each chunk.
    base: HeightSampler,
    biome: Arc<NoiseField>,
    classifier: Arc<ColorClassifier>,
    overlay: Option<HeightSampler>,
    chunk_size: f64,
    segments: u32,
    threads: usize,
    chunks: HashMap<ChunkKey, TerrainChunk>,
}

impl TerrainTileManager {
    /// Create a manager with no chunks.
    ///
    /// # Errors
    ///
    /// Returns an error if either noise config is invalid or the chunk layout
    /// is unusable.
    pub fn new(
        terrain: NoiseConfig,
        biome: NoiseConfig,
        chunk_size: f64,
        segments: u32,
    ) -> Result<Self, TerrainError> {
        // The farthest key bounds every chunk offset, so validating it once
        // keeps every later offset finite.
        let farthest = ChunkKey::new(i32::MIN, i32::MIN).offset(chunk_size);
        ChunkGrid::new(farthest, chunk_size, segments)?;
        let terrain = Arc::new(NoiseField::new(terrain)?);
        Ok(Self {
            base: base_sampler(&terrain)?,
            terrain,
            biome: Arc::new(NoiseField::new(biome)?),
            classifier: Arc::new(ColorClassifier::default()),
            overlay: None,
            chunk_size,
            segments,
            threads: num_cpus::get().max(1),
            chunks: HashMap::new(),
        })
    }

    /// Replace the color classifier and rebuild every chunk.
    pub fn set_classifier(&mut self, classifier: ColorClassifier) {
        self.classifier = Arc::new(classifier);
        self.rebuild_all();
    }

    /// Limit how many threads a single chunk rebuild uses.
    pub fn set_rebuild_threads(&mut self, threads: usize) {
        self.threads = threads.max(1);
    }

    /// Snapshot of the pipeline used for the chunk at `key`.
    ///
    /// The snapshot is independent of later parameter changes, which makes it
    /// suitable for handing to background workers.
    pub fn pipeline_for(&self, key: ChunkKey) -> TerrainPipeline {
        let mut blender = HeightBlender::default();
        if let Some(overlay) = &self.overlay {
            blender.push(overlay.clone());
        }
        blender.push(self.base.recentered(key.offset(self.chunk_size)));
        TerrainPipeline::new(blender, self.biome.clone(), self.classifier.clone())
    }

    /// Vertex layout of the chunk at `key`.
    pub fn grid_for(&self, key: ChunkKey) -> ChunkGrid {
        ChunkGrid {
            offset: key.offset(self.chunk_size),
            size: self.chunk_size,
            segments: self.segments,
        }
    }

    fn build(&self, key: ChunkKey) -> TerrainChunk {
        let grid = self.grid_for(key);
        let samples = rebuild_chunk_parallel(&self.pipeline_for(key), &grid, self.threads);
        TerrainChunk {
            key,
            grid,
            neighbours: key.diagonal_neighbours(),
            samples,
        }
    }

    /// Create (or rebuild) the chunk at `(x, z)` and return it.
    pub fn add_chunk(&mut self, x: i32, z: i32) -> &TerrainChunk {
        let key = ChunkKey::new(x, z);
        let chunk = self.build(key);
        debug!(x, z, "added terrain chunk");
        self.chunks.insert(key, chunk);
        &self.chunks[&key]
    }

    /// Create every chunk in the square `[-radius, radius]²`.
    pub fn add_chunks_around_origin(&mut self, radius: i32) {
        for x in -radius..=radius {
            for z in -radius..=radius {
                self.add_chunk(x, z);
            }
        }
    }

    /// Attach a raster heightmap ahead of the noise in every chunk and rebuild.
    ///
    /// A previously attached heightmap is replaced rather than stacked.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::InvalidSampler`] if the radii are unusable; the
    /// manager is left unchanged in that case.
    pub fn set_heightmap(
        &mut self,
        raster: RasterHeightSource,
        center: DVec2,
        inner_radius: f64,
        outer_radius: f64,
    ) -> Result<(), TerrainError> {
        let (w, h) = raster.dimensions();
        let sampler = HeightSampler::new(Arc::new(raster), center, inner_radius, outer_radius)?;
        self.overlay = Some(sampler);
        info!(width = w, height = h, %center, inner_radius, outer_radius, "attached heightmap");
        self.rebuild_all();
        Ok(())
    }

    /// Detach the heightmap overlay, if any, and rebuild.
    pub fn clear_heightmap(&mut self) {
        if self.overlay.take().is_some() {
            self.rebuild_all();
        }
    }

    /// Returns `true` if a heightmap overlay is attached.
    pub fn has_heightmap(&self) -> bool {
        self.overlay.is_some()
    }

    /// Replace the terrain noise layer and rebuild every chunk.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::InvalidNoiseConfig`]; the old field stays in use.
    pub fn set_terrain_noise(&mut self, config: NoiseConfig) -> Result<(), TerrainError> {
        let terrain = Arc::new(NoiseField::new(config)?);
        self.base = base_sampler(&terrain)?;
        self.terrain = terrain;
        self.rebuild_all();
        Ok(())
    }

    /// Replace the biome noise layer and rebuild every chunk.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::InvalidNoiseConfig`]; the old field stays in use.
    pub fn set_biome_noise(&mut self, config: NoiseConfig) -> Result<(), TerrainError> {
        self.biome = Arc::new(NoiseField::new(config)?);
        self.rebuild_all();
        Ok(())
    }

    /// Rebuild every chunk from the current inputs.
    pub fn rebuild_all(&mut self) {
        let keys: Vec<ChunkKey> = self.chunks.keys().copied().collect();
        for key in &keys {
            let chunk = self.build(*key);
            self.chunks.insert(*key, chunk);
        }
        debug!(chunks = keys.len(), "rebuilt all terrain chunks");
    }

    /// The chunk at `key`, if created.
    pub fn chunk(&self, key: ChunkKey) -> Option<&TerrainChunk> {
        self.chunks.get(&key)
    }

    /// All chunks in unspecified order.
    pub fn chunks(&self) -> impl Iterator<Item = &TerrainChunk> {
        self.chunks.values()
    }

    /// Number of chunks.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// The current terrain noise field.
    pub fn terrain(&self) -> &NoiseField {
        &self.terrain
    }

    /// The current biome noise field.
    pub fn biome(&self) -> &NoiseField {
        &self.biome
    }

    /// Chunk side length in world units.
    pub fn chunk_size(&self) -> f64 {
        self.chunk_size
    }
}

fn base_sampler(terrain: &Arc<NoiseField>) -> Result<HeightSampler, TerrainError> {
    HeightSampler::new(terrain.clone(), DVec2::ZERO, BASE_INNER_RADIUS, BASE_OUTER_RADIUS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::RasterPlacement;

    fn manager() -> TerrainTileManager {
        let mut m =
            TerrainTileManager::new(NoiseConfig::terrain(), NoiseConfig::biome(), 500.0, 8)
                .unwrap();
        m.set_rebuild_threads(2);
        m
    }

    fn white_raster() -> RasterHeightSource {
        RasterHeightSource::from_luma(4, 4, vec![255; 16], RasterPlacement::default()).unwrap()
    }

    #[test]
    fn test_diagonal_neighbours() {
        let n = ChunkKey::new(0, 0).diagonal_neighbours();
        assert_eq!(n.len(), 4);
        assert!(n.contains(&ChunkKey::new(-1, -1)));
        assert!(n.contains(&ChunkKey::new(1, 1)));
        assert!(!n.contains(&ChunkKey::new(0, 1)));
    }

    #[test]
    fn test_add_chunks_around_origin() {
        let mut m = manager();
        m.add_chunks_around_origin(1);
        assert_eq!(m.chunk_count(), 9);
        let c = m.chunk(ChunkKey::new(1, -1)).unwrap();
        assert_eq!(c.grid.offset, DVec2::new(500.0, -500.0));
        assert_eq!(c.samples.heights.len(), 81);
    }

    #[test]
    fn test_chunk_heights_match_terrain_field() {
        let mut m = manager();
        m.add_chunk(0, 0);
        let c = m.chunk(ChunkKey::new(0, 0)).unwrap();
        let p = c.grid.vertex_position(2, 6);
        let expected = m.terrain().evaluate_fractal(p.x, p.y);
        let actual = c.samples.vertex(2, 6).height;
        assert!((actual - expected).abs() < 1e-9, "{actual} vs {expected}");
    }

    #[test]
    fn test_set_heightmap_changes_center_only() {
        let mut m = manager();
        m.add_chunk(0, 0);
        m.add_chunk(3, 0);
        let far_before = m.chunk(ChunkKey::new(3, 0)).unwrap().samples.clone();

        m.set_heightmap(white_raster(), DVec2::ZERO, 250.0, 300.0).unwrap();
        assert!(m.has_heightmap());

        // Center vertex: overlay and base both weigh 1, so the result averages 128 and the noise.
        let c = m.chunk(ChunkKey::new(0, 0)).unwrap();
        let noise = m.terrain().evaluate_fractal(0.0, 0.0);
        let center = c.samples.vertex(4, 4).height;
        assert!((center - (128.0 + noise) / 2.0).abs() < 1e-9);

        // Far chunk is out of the overlay's reach.
        assert_eq!(m.chunk(ChunkKey::new(3, 0)).unwrap().samples, far_before);
    }

    #[test]
    fn test_set_heightmap_replaces_previous() {
        let mut m = manager();
        m.add_chunk(0, 0);
        m.set_heightmap(white_raster(), DVec2::ZERO, 250.0, 300.0).unwrap();
        let once = m.chunk(ChunkKey::new(0, 0)).unwrap().samples.clone();
        m.set_heightmap(white_raster(), DVec2::ZERO, 250.0, 300.0).unwrap();
        assert_eq!(m.chunk(ChunkKey::new(0, 0)).unwrap().samples, once);

        m.clear_heightmap();
        assert!(!m.has_heightmap());
    }

    #[test]
    fn test_invalid_heightmap_radii_leave_manager_unchanged() {
        let mut m = manager();
        assert!(m.set_heightmap(white_raster(), DVec2::ZERO, 300.0, 250.0).is_err());
        assert!(!m.has_heightmap());
    }

    #[test]
    fn test_set_terrain_noise_rebuilds() {
        let mut m = manager();
        m.add_chunk(0, 0);
        m.set_terrain_noise(NoiseConfig {
            height: 0.0,
            ..NoiseConfig::terrain()
        })
        .unwrap();
        let c = m.chunk(ChunkKey::new(0, 0)).unwrap();
        assert!(c.samples.heights.iter().all(|&h| h == 0.0));
        assert!(c.samples.colors.iter().all(|&col| col == ColorClassifier::default().ocean));
    }

    #[test]
    fn test_invalid_noise_keeps_old_field() {
        let mut m = manager();
        let before = m.terrain().config().clone();
        let result = m.set_terrain_noise(NoiseConfig {
            octaves: 0,
            ..NoiseConfig::terrain()
        });
        assert!(result.is_err());
        assert_eq!(m.terrain().config(), &before);
        assert!(m.set_biome_noise(NoiseConfig { scale: -1.0, ..NoiseConfig::biome() }).is_err());
    }

    #[test]
    fn test_invalid_layout_rejected() {
        assert!(
            TerrainTileManager::new(NoiseConfig::terrain(), NoiseConfig::biome(), 500.0, 0)
                .is_err()
        );
        // Finite on its own, but far chunk offsets would overflow.
        assert!(matches!(
            TerrainTileManager::new(NoiseConfig::terrain(), NoiseConfig::biome(), 1e300, 8),
            Err(TerrainError::InvalidChunk(_))
        ));
    }

    #[test]
    fn test_pipeline_always_has_base_sampler() {
        let mut m = manager();
        for key in [ChunkKey::new(0, 0), ChunkKey::new(i32::MAX, i32::MIN)] {
            let pipeline = m.pipeline_for(key);
            assert_eq!(pipeline.blender.len(), 1);
            assert_eq!(pipeline.blender.samplers()[0].center(), key.offset(m.chunk_size()));
        }

        m.set_heightmap(white_raster(), DVec2::ZERO, 10.0, 20.0).unwrap();
        m.set_terrain_noise(NoiseConfig { seed: 99, ..NoiseConfig::terrain() }).unwrap();
        let pipeline = m.pipeline_for(ChunkKey::new(3, -2));
        assert_eq!(pipeline.blender.len(), 2);
        assert_eq!(pipeline.blender.samplers()[1].center(), DVec2::new(1500.0, -1000.0));
        assert_eq!(
            pipeline.blender.samplers()[1].radii(),
            (BASE_INNER_RADIUS, BASE_OUTER_RADIUS)
        );
    }
}
