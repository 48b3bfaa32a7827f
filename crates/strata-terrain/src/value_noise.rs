//! Bilinearly filtered lattice white noise with a lazily filled value cache.

use dashmap::DashMap;
use rand::Rng;

use crate::seed::{lattice_rng, pack_lattice_key};

/// Value noise: independent uniform values in `[-1, 1]` at each integer lattice
/// point, bilinearly interpolated in between.
///
/// Lattice values are generated on first use and cached for the lifetime of
/// the field. The cache is append-only and never evicted, so memory grows with
/// the number of distinct lattice points ever touched.
pub struct ValueNoise {
    seed: u64,
    values: DashMap<u64, f64>,
}

impl ValueNoise {
    /// Create an empty value-noise basis for the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            values: DashMap::new(),
        }
    }

    /// Value at the integer lattice point `(ix, iy)`, generating and caching it
    /// on first access.
    ///
    /// Concurrent first accesses to the same point go through the map's entry
    /// lock, so every caller observes the same value.
    pub fn lattice_value(&self, ix: i32, iy: i32) -> f64 {
        let key = pack_lattice_key(ix, iy);
        if let Some(v) = self.values.get(&key) {
            return *v;
        }
        *self.values.entry(key).or_insert_with(|| {
            let mut rng = lattice_rng(self.seed, ix, iy);
            rng.random::<f64>() * 2.0 - 1.0
        })
    }

    /// Sample the filtered noise at a continuous coordinate. Output is in `[-1, 1]`.
    pub fn noise_2d(&self, x: f64, y: f64) -> f64 {
        let x0 = x.floor();
        let y0 = y.floor();
        let xp = x - x0;
        let yp = y - y0;

        let x1 = x0 as i32;
        let y1 = y0 as i32;
        let x2 = x1.wrapping_add(1);
        let y2 = y1.wrapping_add(1);

        let p11 = self.lattice_value(x1, y1);
        let p21 = self.lattice_value(x2, y1);
        let p12 = self.lattice_value(x1, y2);
        let p22 = self.lattice_value(x2, y2);

        let px1 = lerp(xp, p11, p21);
        let px2 = lerp(xp, p12, p22);
        lerp(yp, px1, px2)
    }

    /// Number of lattice points cached so far.
    pub fn cache_len(&self) -> usize {
        self.values.len()
    }
}

#[inline]
pub(crate) fn lerp(t: f64, a: f64, b: f64) -> f64 {
    a + (b - a) * t
}
