//! Deterministic seeded lattice utilities.
//!
//! Derives per-lattice-point seeds and RNGs from a field seed and an integer
//! coordinate, and packs 2D lattice coordinates into a single cache key.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Pack two 32-bit lattice coordinates into one 64-bit key.
///
/// `ix` occupies the high half and `iy` the low half, so every distinct pair
/// maps to a distinct key.
#[inline]
pub fn pack_lattice_key(ix: i32, iy: i32) -> u64 {
    ((ix as u32 as u64) << 32) | (iy as u32 as u64)
}

/// Inverse of [`pack_lattice_key`].
#[inline]
pub fn unpack_lattice_key(key: u64) -> (i32, i32) {
    ((key >> 32) as u32 as i32, key as u32 as i32)
}

/// Fold a 64-bit field seed into the 32 bits gradient noise accepts.
///
/// Seeds below 2^32 map to themselves; the high half is mixed in rather than
/// dropped.
#[inline]
pub fn fold_seed(seed: u64) -> u32 {
    (seed ^ (seed >> 32)) as u32
}

/// Derive a u64 seed for a lattice point from the field seed and coordinate.
///
/// Uses SipHash (via std's `DefaultHasher`) to combine the inputs into a
/// well-distributed u64.
pub fn derive_lattice_seed(seed: u64, ix: i32, iy: i32) -> u64 {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    ix.hash(&mut hasher);
    iy.hash(&mut hasher);
    hasher.finish()
}

/// Derive a deterministic RNG for a specific lattice point.
///
/// The returned RNG produces an identical sequence for the same
/// `(seed, ix, iy)` triple regardless of thread, platform or query order.
pub fn lattice_rng(seed: u64, ix: i32, iy: i32) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(derive_lattice_seed(seed, ix, iy))
}
