//! Piecewise color ramps over a scalar parameter.

use super::rgb::{Rgb, interpolate_hsl};
use crate::error::TerrainError;

/// A control point of a [`ColorGradient`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorStop {
    /// Position along the ramp, in `[0.0, 1.0]`.
    pub t: f64,
    /// Color at `t`.
    pub color: Rgb,
}

impl ColorStop {
    /// Construct a stop.
    pub const fn new(t: f64, color: Rgb) -> Self {
        Self { t, color }
    }
}

/// Ordered color stops, interpolated in HSL space between neighbours.
///
/// Queries below the first stop or above the last clamp to the endpoint color.
/// When two stops share a position, the later one wins at and after it.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorGradient {
    stops: Vec<ColorStop>,
}

impl ColorGradient {
    /// Build a gradient; stops are sorted by position (stable).
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::InvalidGradient`] if `stops` is empty or any
    /// position is outside `[0, 1]` or not finite.
    pub fn new(mut stops: Vec<ColorStop>) -> Result<Self, TerrainError> {
        if stops.is_empty() {
            return Err(TerrainError::InvalidGradient(
                "at least one stop is required".into(),
            ));
        }
        if let Some(bad) = stops.iter().find(|s| !(0.0..=1.0).contains(&s.t)) {
            return Err(TerrainError::InvalidGradient(format!(
                "stop position {} outside [0, 1]",
                bad.t
            )));
        }
        stops.sort_by(|a, b| a.t.total_cmp(&b.t));
        Ok(Self { stops })
    }

    /// Sand to pale sand to snow.
    pub fn arid() -> Self {
        Self {
            stops: vec![
                ColorStop::new(0.0, Rgb::from_hex(0xb7a67d)),
                ColorStop::new(0.5, Rgb::from_hex(0xf1e1bc)),
                ColorStop::new(1.0, Rgb::WHITE),
            ],
        }
    }

    /// Boreal forest to pale meadow to snow.
    pub fn humid() -> Self {
        Self {
            stops: vec![
                ColorStop::new(0.0, Rgb::from_hex(0x29c100)),
                ColorStop::new(0.5, Rgb::from_hex(0xcee59c)),
                ColorStop::new(1.0, Rgb::WHITE),
            ],
        }
    }

    /// Color at parameter `t`.
    pub fn sample(&self, t: f64) -> Rgb {
        let first = &self.stops[0];
        let last = &self.stops[self.stops.len() - 1];

        // Negated comparisons also route NaN to the first stop.
        if !(t > first.t) {
            return self.stops[self.stops.partition_point(|s| s.t <= first.t) - 1].color;
        }
        if t >= last.t {
            return last.color;
        }

        // first.t < t < last.t, so both neighbours exist.
        let upper = self.stops.partition_point(|s| s.t <= t);
        let lo = &self.stops[upper - 1];
        let hi = &self.stops[upper];
        let span = hi.t - lo.t;
        let frac = if span > 0.0 { (t - lo.t) / span } else { 1.0 };
        interpolate_hsl(lo.color, hi.color, frac)
    }

    /// The stops in ascending order.
    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn three_stop() -> ColorGradient {
        ColorGradient::new(vec![
            ColorStop::new(1.0, Rgb::WHITE),
            ColorStop::new(0.0, Rgb::from_hex(0x336699)),
            ColorStop::new(0.5, Rgb::from_hex(0xcc8844)),
        ])
        .unwrap()
    }

    #[test]
    fn test_stops_sorted_on_construction() {
        let g = three_stop();
        let ts: Vec<f64> = g.stops().iter().map(|s| s.t).collect();
        assert_eq!(ts, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_exact_stop_positions_return_stop_color() {
        let g = three_stop();
        assert_eq!(g.sample(0.0), Rgb::from_hex(0x336699));
        assert_eq!(g.sample(0.5), Rgb::from_hex(0xcc8844));
        assert_eq!(g.sample(1.0), Rgb::WHITE);
    }

    #[test]
    fn test_out_of_range_clamps_to_endpoints() {
        let g = three_stop();
        assert_eq!(g.sample(-3.0), Rgb::from_hex(0x336699));
        assert_eq!(g.sample(7.5), Rgb::WHITE);
        assert_eq!(g.sample(f64::NAN), Rgb::from_hex(0x336699));
    }

    #[test]
    fn test_between_stops_matches_hsl_interpolation() {
        let g = three_stop();
        let expected = interpolate_hsl(Rgb::from_hex(0x336699), Rgb::from_hex(0xcc8844), 0.5);
        let actual = g.sample(0.25);
        assert!((actual.r - expected.r).abs() < EPSILON);
        assert!((actual.g - expected.g).abs() < EPSILON);
        assert!((actual.b - expected.b).abs() < EPSILON);
    }

    #[test]
    fn test_single_stop_is_constant() {
        let g = ColorGradient::new(vec![ColorStop::new(0.3, Rgb::from_hex(0x123456))]).unwrap();
        for t in [-1.0, 0.0, 0.3, 0.9, 2.0] {
            assert_eq!(g.sample(t), Rgb::from_hex(0x123456));
        }
    }

    #[test]
    fn test_duplicate_positions_later_stop_wins() {
        let g = ColorGradient::new(vec![
            ColorStop::new(0.0, Rgb::from_hex(0x000000)),
            ColorStop::new(0.5, Rgb::from_hex(0xff0000)),
            ColorStop::new(0.5, Rgb::from_hex(0x00ff00)),
            ColorStop::new(1.0, Rgb::from_hex(0x0000ff)),
        ])
        .unwrap();
        assert_eq!(g.sample(0.5), Rgb::from_hex(0x00ff00));
        // Approaching from below interpolates toward the earlier duplicate.
        let below = g.sample(0.499_999);
        assert!(below.r > 0.99 && below.g < 0.01, "got {below:?}");
    }

    #[test]
    fn test_invalid_gradients_rejected() {
        assert!(ColorGradient::new(vec![]).is_err());
        assert!(ColorGradient::new(vec![ColorStop::new(1.5, Rgb::WHITE)]).is_err());
        assert!(ColorGradient::new(vec![ColorStop::new(f64::NAN, Rgb::WHITE)]).is_err());
    }

    #[test]
    fn test_default_ramps_end_in_snow() {
        assert_eq!(ColorGradient::arid().sample(1.0), Rgb::WHITE);
        assert_eq!(ColorGradient::humid().sample(1.0), Rgb::WHITE);
        assert_eq!(ColorGradient::arid().sample(0.0), Rgb::from_hex(0xb7a67d));
    }
}
