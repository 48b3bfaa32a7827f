//! Vertex coloring: RGB/HSL math, piecewise color gradients, and the
//! height/biome color classifier.
//!
//! Colors are interpolated in hue/saturation/lightness space to avoid the
//! muddy midpoints of linear RGB blending.

mod classifier;
mod gradient;
mod rgb;

pub use classifier::ColorClassifier;
pub use gradient::{ColorGradient, ColorStop};
pub use rgb::{Hsl, Rgb, interpolate_hsl};
