//! Per-vertex synthesis: blended height followed by classified color.

use std::sync::Arc;

use crate::blend::HeightBlender;
use crate::color::{ColorClassifier, Rgb};
use crate::noise_field::NoiseField;

/// Height and color of one vertex.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VertexSample {
    /// Blended height in world units.
    pub height: f64,
    /// Vertex color.
    pub color: Rgb,
}

/// Everything needed to turn a world `(x, z)` into a [`VertexSample`].
///
/// All parts are immutable after construction, so one pipeline can be shared
/// by any number of threads.
#[derive(Clone, Debug)]
pub struct TerrainPipeline {
    /// Height contributors.
    pub blender: HeightBlender,
    /// Biome mix field driving the arid/humid blend.
    pub biome: Arc<NoiseField>,
    /// Height/biome to color rule.
    pub classifier: Arc<ColorClassifier>,
}

impl TerrainPipeline {
    /// Assemble a pipeline.
    pub fn new(
        blender: HeightBlender,
        biome: Arc<NoiseField>,
        classifier: Arc<ColorClassifier>,
    ) -> Self {
        Self {
            blender,
            biome,
            classifier,
        }
    }

    /// Blended height at `(x, z)`.
    pub fn height(&self, x: f64, z: f64) -> f64 {
        self.blender.blend(x, z)
    }

    /// Height and color at `(x, z)`.
    pub fn sample(&self, x: f64, z: f64) -> VertexSample {
        let height = self.blender.blend(x, z);
        let color = self.classifier.classify(x, z, height, &self.biome);
        VertexSample { height, color }
    }
}
