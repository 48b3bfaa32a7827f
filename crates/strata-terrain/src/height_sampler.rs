//! Localized height contributions with smooth radial falloff.

use std::sync::Arc;

use glam::DVec2;

use crate::error::TerrainError;
use crate::height_source::{HeightSource, smoothstep};

/// Wraps a [`HeightSource`] with a circular region of influence.
///
/// The weight is 1 within `inner_radius` of `center`, 0 at or beyond
/// `outer_radius`, and follows `1 - smoothstep` in between. When the two radii
/// are equal the edge is hard.
#[derive(Clone)]
pub struct HeightSampler {
    center: DVec2,
    inner_radius: f64,
    outer_radius: f64,
    source: Arc<dyn HeightSource>,
}

impl HeightSampler {
    /// Create a sampler.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::InvalidSampler`] if the center or radii are not
    /// finite, a radius is negative, or `outer_radius < inner_radius`.
    pub fn new(
        source: Arc<dyn HeightSource>,
        center: DVec2,
        inner_radius: f64,
        outer_radius: f64,
    ) -> Result<Self, TerrainError> {
        if !center.is_finite() {
            return Err(TerrainError::InvalidSampler(format!(
                "center must be finite, got {center}"
            )));
        }
        if !(inner_radius.is_finite() && outer_radius.is_finite()) {
            return Err(TerrainError::InvalidSampler(format!(
                "radii must be finite, got inner={inner_radius} outer={outer_radius}"
            )));
        }
        if inner_radius < 0.0 || outer_radius < 0.0 {
            return Err(TerrainError::InvalidSampler(format!(
                "radii must be non-negative, got inner={inner_radius} outer={outer_radius}"
            )));
        }
        if outer_radius < inner_radius {
            return Err(TerrainError::InvalidSampler(format!(
                "outer radius {outer_radius} is smaller than inner radius {inner_radius}"
            )));
        }
        Ok(Self {
            center,
            inner_radius,
            outer_radius,
            source,
        })
    }

    /// Falloff weight at world `(x, y)`, always in `[0, 1]`.
    pub fn weight(&self, x: f64, y: f64) -> f64 {
        let d = self.center.distance(DVec2::new(x, y));
        let span = self.outer_radius - self.inner_radius;
        if span <= 0.0 {
            return if d <= self.inner_radius { 1.0 } else { 0.0 };
        }
        let t = ((d - self.inner_radius) / span).clamp(0.0, 1.0);
        1.0 - smoothstep(t)
    }

    /// Height of the wrapped source and the falloff weight at `(x, y)`.
    pub fn sample_weighted(&self, x: f64, y: f64) -> (f64, f64) {
        (self.source.height(x, y), self.weight(x, y))
    }

    /// The same sampler moved to `center`.
    ///
    /// `center` must be finite; the radii were already validated by [`Self::new`].
    pub(crate) fn recentered(&self, center: DVec2) -> Self {
        debug_assert!(center.is_finite());
        Self {
            center,
            ..self.clone()
        }
    }

    /// Center of the region of influence.
    pub fn center(&self) -> DVec2 {
        self.center
    }

    /// `(inner_radius, outer_radius)`.
    pub fn radii(&self) -> (f64, f64) {
        (self.inner_radius, self.outer_radius)
    }
}

impl std::fmt::Debug for HeightSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeightSampler")
            .field("center", &self.center)
            .field("inner_radius", &self.inner_radius)
            .field("outer_radius", &self.outer_radius)
            .finish_non_exhaustive()
    }
}
