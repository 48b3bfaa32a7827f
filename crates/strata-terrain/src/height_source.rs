//! Height sources: anything that maps a world coordinate to a height.

use crate::noise_field::NoiseField;

/// A scalar height function over world `(x, y)`.
///
/// Implementations must be pure per call (or converge to a fixed value per
/// coordinate, as the value-noise cache does) and shareable across threads.
pub trait HeightSource: Send + Sync {
    /// Height at world coordinate `(x, y)`.
    fn height(&self, x: f64, y: f64) -> f64;
}

impl HeightSource for NoiseField {
    fn height(&self, x: f64, y: f64) -> f64 {
        self.evaluate_fractal(x, y)
    }
}

/// A flat height everywhere.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConstantSource(pub f64);

impl HeightSource for ConstantSource {
    fn height(&self, _x: f64, _y: f64) -> f64 {
        self.0
    }
}

/// A radially symmetric hill around the origin.
///
/// Height falls from `peak` at the origin to 0 at `radius` along a quintic
/// smootherstep curve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BumpSource {
    /// Distance from the origin at which the bump reaches 0.
    pub radius: f64,
    /// Height at the origin.
    pub peak: f64,
}

impl Default for BumpSource {
    fn default() -> Self {
        Self {
            radius: 250.0,
            peak: 128.0,
        }
    }
}

impl HeightSource for BumpSource {
    fn height(&self, x: f64, y: f64) -> f64 {
        let dist = (x * x + y * y).sqrt();
        let h = if self.radius > 0.0 {
            1.0 - (dist / self.radius).clamp(0.0, 1.0)
        } else if dist == 0.0 {
            1.0
        } else {
            0.0
        };
        smootherstep(h) * self.peak
    }
}

/// Cubic Hermite smoothstep `t²(3 - 2t)`. Input is expected in `[0, 1]`.
#[inline]
pub fn smoothstep(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

/// Quintic smootherstep `t³(t(6t - 15) + 10)`. Input is expected in `[0, 1]`.
#[inline]
pub fn smootherstep(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}
