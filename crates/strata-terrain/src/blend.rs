//! Normalized weighted blending of several height samplers.

use crate::height_sampler::HeightSampler;

/// Blend the samplers at `(x, y)` into one height.
///
/// Returns `Σ hᵢ·wᵢ / Σ wᵢ`, or 0 when no sampler has any weight at the point.
/// Sampler order does not change the result beyond floating-point rounding.
pub fn blend_height(samplers: &[HeightSampler], x: f64, y: f64) -> f64 {
    let mut weighted = 0.0;
    let mut total = 0.0;
    for sampler in samplers {
        let (h, w) = sampler.sample_weighted(x, y);
        weighted += h * w;
        total += w;
    }
    if total > 0.0 { weighted / total } else { 0.0 }
}

/// An ordered set of [`HeightSampler`]s evaluated together.
///
/// Higher-priority contributors, such as a raster overlay, are conventionally
/// placed first with [`prepend`](Self::prepend); only their weights decide
/// their influence.
#[derive(Clone, Debug, Default)]
pub struct HeightBlender {
    samplers: Vec<HeightSampler>,
}

impl HeightBlender {
    /// Create a blender over the given samplers.
    pub fn new(samplers: Vec<HeightSampler>) -> Self {
        Self { samplers }
    }

    /// Insert a sampler at the front.
    pub fn prepend(&mut self, sampler: HeightSampler) {
        self.samplers.insert(0, sampler);
    }

    /// Append a sampler at the back.
    pub fn push(&mut self, sampler: HeightSampler) {
        self.samplers.push(sampler);
    }

    /// Blended height at `(x, y)`. See [`blend_height`].
    pub fn blend(&self, x: f64, y: f64) -> f64 {
        blend_height(&self.samplers, x, y)
    }

    /// The samplers in evaluation order.
    pub fn samplers(&self) -> &[HeightSampler] {
        &self.samplers
    }

    /// Number of samplers.
    pub fn len(&self) -> usize {
        self.samplers.len()
    }

    /// Returns `true` if there are no samplers.
    pub fn is_empty(&self) -> bool {
        self.samplers.is_empty()
    }
}
