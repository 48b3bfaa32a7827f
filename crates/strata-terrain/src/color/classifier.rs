//! Height + biome noise to vertex color.

use super::gradient::ColorGradient;
use super::rgb::{Rgb, interpolate_hsl};
use crate::noise_field::NoiseField;

/// Chooses a vertex color from blended height and a biome mix factor.
///
/// Heights are divided by `height_normalization` to get a gradient parameter.
/// Below `ocean_threshold` the fixed ocean color is returned; otherwise the
/// arid and humid gradients are sampled and mixed in HSL space by the biome
/// field's value.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorClassifier {
    /// Gradient used where the biome mix is 0.
    pub arid: ColorGradient,
    /// Gradient used where the biome mix is 1.
    pub humid: ColorGradient,
    /// Color for everything below the ocean threshold.
    pub ocean: Rgb,
    /// Normalized height below which the ocean color is used.
    pub ocean_threshold: f64,
    /// Divisor mapping world height to the gradient parameter.
    pub height_normalization: f64,
}

impl Default for ColorClassifier {
    fn default() -> Self {
        Self {
            arid: ColorGradient::arid(),
            humid: ColorGradient::humid(),
            ocean: Rgb::from_hex(0xd9d592),
            ocean_threshold: 0.05,
            height_normalization: 100.0,
        }
    }
}

impl ColorClassifier {
    /// Create a classifier with custom gradients and the default ocean rule.
    pub fn new(arid: ColorGradient, humid: ColorGradient) -> Self {
        Self {
            arid,
            humid,
            ..Default::default()
        }
    }

    /// Color for `blended_height` with an explicit biome mix `m`.
    ///
    /// `m` is not clamped; keeping it in `[0, 1]` is the biome field's job.
    pub fn color_for(&self, blended_height: f64, m: f64) -> Rgb {
        let h = blended_height / self.height_normalization;
        if h < self.ocean_threshold {
            return self.ocean;
        }
        let c1 = self.arid.sample(h);
        let c2 = self.humid.sample(h);
        interpolate_hsl(c1, c2, m)
    }

    /// Color at world `(x, y)` for `blended_height`, reading the biome mix from
    /// `biome`.
    pub fn classify(&self, x: f64, y: f64, blended_height: f64, biome: &NoiseField) -> Rgb {
        if blended_height / self.height_normalization < self.ocean_threshold {
            return self.ocean;
        }
        let m = biome.evaluate_fractal(x, y);
        self.color_for(blended_height, m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise_field::NoiseConfig;

    fn biome_field() -> NoiseField {
        NoiseField::new(NoiseConfig::biome()).unwrap()
    }

    #[test]
    fn test_below_five_is_ocean_regardless_of_biome() {
        let classifier = ColorClassifier::default();
        for h in [-100.0, 0.0, 2.5, 4.999] {
            for m in [-1.0, 0.0, 0.37, 1.0, 5.0] {
                assert_eq!(classifier.color_for(h, m), classifier.ocean);
            }
        }
        let biome = biome_field();
        assert_eq!(classifier.classify(123.0, 456.0, 4.0, &biome), classifier.ocean);
    }

    #[test]
    fn test_at_threshold_is_land() {
        let classifier = ColorClassifier::default();
        assert_eq!(classifier.color_for(5.0, 0.0), classifier.arid.sample(0.05));
    }

    #[test]
    fn test_mix_zero_and_one_select_gradients() {
        let classifier = ColorClassifier::default();
        assert_eq!(classifier.color_for(50.0, 0.0), classifier.arid.sample(0.5));
        assert_eq!(classifier.color_for(50.0, 1.0), classifier.humid.sample(0.5));
    }

    #[test]
    fn test_high_ground_is_snow() {
        let classifier = ColorClassifier::default();
        for m in [0.0, 0.5, 1.0] {
            let c = classifier.color_for(250.0, m);
            assert!(
                (c.r - 1.0).abs() < 1e-9 && (c.g - 1.0).abs() < 1e-9 && (c.b - 1.0).abs() < 1e-9,
                "Height above 100 should clamp to snow, got {c:?}"
            );
        }
    }

    #[test]
    fn test_classify_uses_biome_field() {
        let classifier = ColorClassifier::default();
        let biome = biome_field();
        let (x, y) = (1500.0, -700.0);
        let m = biome.evaluate_fractal(x, y);
        assert_eq!(classifier.classify(x, y, 40.0, &biome), classifier.color_for(40.0, m));
    }
}
