//! Normalized multi-octave fractal noise over a selectable 2D basis.
//!
//! Each octave samples the basis at a growing frequency, remaps it into
//! `[0, 1]` and accumulates it with a decaying weight. The sum is divided by
//! the total weight so the output range does not depend on the octave count,
//! then reshaped by `exponentiation` and scaled by `height`.

use noise::{NoiseFn, Perlin, Simplex};
use serde::{Deserialize, Serialize};

use crate::error::TerrainError;
use crate::seed::fold_seed;
use crate::value_noise::ValueNoise;

/// Which basis function a [`NoiseField`] composes into octaves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseBasis {
    /// Seeded simplex gradient noise.
    #[default]
    Simplex,
    /// Classic seeded Perlin noise.
    Perlin,
    /// Bilinearly filtered lattice white noise.
    Value,
}

impl std::str::FromStr for NoiseBasis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "simplex" => Ok(Self::Simplex),
            "perlin" => Ok(Self::Perlin),
            "value" | "rand" => Ok(Self::Value),
            other => Err(format!("unknown noise basis: {other}")),
        }
    }
}

/// Parameters of one fractal noise layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// Seed for the basis function.
    pub seed: u64,
    /// Basis function composed into octaves.
    pub basis: NoiseBasis,
    /// World units per basis period at the first octave. Must be > 0.
    pub scale: f64,
    /// Number of octaves. Must be >= 1.
    pub octaves: u32,
    /// Per-octave amplitude decay; each octave is weighted by
    /// `2^(-persistence)` relative to the previous one. In `(0, 1]`.
    pub persistence: f64,
    /// Per-octave frequency multiplier. Must be > 0.
    pub lacunarity: f64,
    /// Exponent applied to the normalized sum. Values above 1 sharpen peaks,
    /// values below 1 flatten them.
    pub exponentiation: f64,
    /// Output multiplier; the field's range is `[0, height]`.
    pub height: f64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self::terrain()
    }
}

impl NoiseConfig {
    /// Defaults for the terrain height layer.
    pub fn terrain() -> Self {
        Self {
            seed: 1,
            basis: NoiseBasis::Simplex,
            scale: 800.0,
            octaves: 6,
            persistence: 0.707,
            lacunarity: 1.8,
            exponentiation: 4.5,
            height: 300.0,
        }
    }

    /// Defaults for the biome (moisture) layer. Output is in `[0, 1]`.
    pub fn biome() -> Self {
        Self {
            seed: 2,
            basis: NoiseBasis::Simplex,
            scale: 2048.0,
            octaves: 2,
            persistence: 0.5,
            lacunarity: 2.0,
            exponentiation: 1.0,
            height: 1.0,
        }
    }

    /// Check every field against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::InvalidNoiseConfig`] naming the first bad field.
    pub fn validate(&self) -> Result<(), TerrainError> {
        fn bad(field: &'static str, reason: impl Into<String>) -> TerrainError {
            TerrainError::InvalidNoiseConfig {
                field,
                reason: reason.into(),
            }
        }

        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(bad("scale", format!("must be finite and > 0, got {}", self.scale)));
        }
        if self.octaves < 1 {
            return Err(bad("octaves", "must be >= 1, got 0"));
        }
        if !(self.persistence.is_finite() && self.persistence > 0.0 && self.persistence <= 1.0) {
            return Err(bad(
                "persistence",
                format!("must be in (0, 1], got {}", self.persistence),
            ));
        }
        if !(self.lacunarity.is_finite() && self.lacunarity > 0.0) {
            return Err(bad(
                "lacunarity",
                format!("must be finite and > 0, got {}", self.lacunarity),
            ));
        }
        if !(self.exponentiation.is_finite() && self.exponentiation > 0.0) {
            return Err(bad(
                "exponentiation",
                format!("must be finite and > 0, got {}", self.exponentiation),
            ));
        }
        if !(self.height.is_finite() && self.height >= 0.0) {
            return Err(bad("height", format!("must be finite and >= 0, got {}", self.height)));
        }
        Ok(())
    }
}

/// The single basis instance a field was built with.
enum Basis {
    Simplex(Simplex),
    Perlin(Perlin),
    Value(ValueNoise),
}

impl Basis {
    fn new(kind: NoiseBasis, seed: u64) -> Self {
        match kind {
            NoiseBasis::Simplex => Basis::Simplex(Simplex::new(fold_seed(seed))),
            NoiseBasis::Perlin => Basis::Perlin(Perlin::new(fold_seed(seed))),
            NoiseBasis::Value => Basis::Value(ValueNoise::new(seed)),
        }
    }

    /// Basis sample clamped to `[-1, 1]`.
    #[inline]
    fn noise_2d(&self, x: f64, y: f64) -> f64 {
        let n = match self {
            Basis::Simplex(s) => s.get([x, y]),
            Basis::Perlin(p) => p.get([x, y]),
            Basis::Value(v) => v.noise_2d(x, y),
        };
        n.clamp(-1.0, 1.0)
    }
}

/// Remap a basis sample from `[-1, 1]` to `[0, 1]`.
#[inline]
pub fn remap_unit(n: f64) -> f64 {
    (n * 0.5 + 0.5).clamp(0.0, 1.0)
}

/// A fractal noise layer built from a validated [`NoiseConfig`].
///
/// The configuration is fixed at construction; to change it, build a new
/// field. Evaluation takes `&self` and is safe to call from many threads.
pub struct NoiseField {
    config: NoiseConfig,
    basis: Basis,
}

impl NoiseField {
    /// Build a field, constructing only the configured basis.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::InvalidNoiseConfig`] if the config fails
    /// [`NoiseConfig::validate`].
    pub fn new(config: NoiseConfig) -> Result<Self, TerrainError> {
        config.validate()?;
        let basis = Basis::new(config.basis, config.seed);
        Ok(Self { config, basis })
    }

    /// Raw basis sample at `(x, y)` in basis space (no scale applied), clamped
    /// to `[-1, 1]`.
    pub fn basis_noise(&self, x: f64, y: f64) -> f64 {
        self.basis.noise_2d(x, y)
    }

    /// Evaluate the fractal sum at world coordinate `(x, y)`.
    ///
    /// Output lies in `[0, height]` for every octave count.
    pub fn evaluate_fractal(&self, x: f64, y: f64) -> f64 {
        let cfg = &self.config;
        let xs = x / cfg.scale;
        let ys = y / cfg.scale;
        let gain = libm::pow(2.0, -cfg.persistence);

        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut normalization = 0.0;
        let mut total = 0.0;

        for _ in 0..cfg.octaves {
            let sample = remap_unit(self.basis.noise_2d(xs * frequency, ys * frequency));
            total += sample * amplitude;
            normalization += amplitude;
            amplitude *= gain;
            frequency *= cfg.lacunarity;
        }

        let normalized = (total / normalization).clamp(0.0, 1.0);
        libm::pow(normalized, cfg.exponentiation) * cfg.height
    }

    /// Upper bound of [`evaluate_fractal`](Self::evaluate_fractal).
    pub fn max_value(&self) -> f64 {
        self.config.height
    }

    /// Number of cached lattice values, or `None` for bases without a cache.
    pub fn cache_len(&self) -> Option<usize> {
        match &self.basis {
            Basis::Value(v) => Some(v.cache_len()),
            _ => None,
        }
    }

    /// Return a reference to the field's configuration.
    pub fn config(&self) -> &NoiseConfig {
        &self.config
    }
}

impl std::fmt::Debug for NoiseField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoiseField")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
