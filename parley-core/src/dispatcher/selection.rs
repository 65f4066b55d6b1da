//! Pluggable selection strategies
//!
//! Automatic handlers that answer by choosing from a fixed candidate list
//! take a `SelectionStrategy`, so tests can swap randomness for a
//! deterministic choice.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Mutex, PoisonError};

/// Chooses one index out of `len` candidates
pub trait SelectionStrategy: Send + Sync {
    /// Pick an index in `0..len`, or `None` when there is nothing to pick
    fn pick_index(&self, len: usize) -> Option<usize>;

    /// Name used in logs
    fn name(&self) -> &str;
}

/// Pick one candidate using `strategy`
pub fn pick<'a, T>(strategy: &dyn SelectionStrategy, candidates: &'a [T]) -> Option<&'a T> {
    strategy
        .pick_index(candidates.len())
        .and_then(|idx| candidates.get(idx))
}

/// Uniform choice from the thread-local generator
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSelection;

impl SelectionStrategy for RandomSelection {
    fn pick_index(&self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(rand::thread_rng().gen_range(0..len))
    }

    fn name(&self) -> &str {
        "random"
    }
}

/// Uniform choice from a seeded generator; the sequence is reproducible
#[derive(Debug)]
pub struct SeededSelection {
    rng: Mutex<StdRng>,
}

impl SeededSelection {
    /// Create a generator from a fixed seed
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl SelectionStrategy for SeededSelection {
    fn pick_index(&self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        Some(rng.gen_range(0..len))
    }

    fn name(&self) -> &str {
        "seeded"
    }
}

/// Always the same position, wrapped to the candidate count
#[derive(Debug, Clone, Copy)]
pub struct FixedSelection(pub usize);

impl SelectionStrategy for FixedSelection {
    fn pick_index(&self, len: usize) -> Option<usize> {
        if len == 0 {
            None
        } else {
            Some(self.0 % len)
        }
    }

    fn name(&self) -> &str {
        "fixed"
    }
}
