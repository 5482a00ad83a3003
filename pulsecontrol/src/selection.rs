//! Uniform track selection.

use pulsespotify::Track;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of random indices.
///
/// `index(len)` must return a value in `0..len`; `len` is never zero.
pub trait Draw: Send {
    fn index(&mut self, len: usize) -> usize;
}

/// Uniform draw backed by `StdRng`.
#[derive(Debug, Clone)]
pub struct UniformDraw {
    rng: StdRng,
}

impl UniformDraw {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for UniformDraw {
    fn default() -> Self {
        Self::new()
    }
}

impl Draw for UniformDraw {
    fn index(&mut self, len: usize) -> usize {
        self.rng.random_range(0..len)
    }
}

/// Always returns the same index (clamped to the candidate count).
#[derive(Debug, Clone, Copy)]
pub struct FixedDraw(pub usize);

impl Draw for FixedDraw {
    fn index(&mut self, len: usize) -> usize {
        self.0.min(len - 1)
    }
}

/// Picks one candidate. `None` when there is nothing to pick from.
pub fn select<'a>(candidates: &'a [Track], draw: &mut dyn Draw) -> Option<&'a Track> {
    if candidates.is_empty() {
        return None;
    }
    let index = draw.index(candidates.len());
    candidates.get(index)
}
