//! Selection of the canned reply returned when the upstream fails.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Apologies returned when the webhook cannot be reached.
pub const DEFAULT_APOLOGIES: [&str; 3] = [
    "I'm having trouble accessing the admission database right now. Please try again in a moment.",
    "It seems I'm experiencing some technical difficulties. Could you please rephrase your admission-related question?",
    "I apologize, but I'm unable to fetch admission information at the moment. Please try again later or contact the admission office directly.",
];

/// Picks one reply out of a configured list.
pub trait FallbackPolicy: Send + Sync {
    /// Returns `None` only when `options` is empty.
    fn pick<'a>(&self, options: &'a [String]) -> Option<&'a str>;
}

/// Uniform choice using the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomFallback;

impl FallbackPolicy for RandomFallback {
    fn pick<'a>(&self, options: &'a [String]) -> Option<&'a str> {
        if options.is_empty() {
            return None;
        }
        let index = rand::rng().random_range(0..options.len());
        options.get(index).map(String::as_str)
    }
}

/// Uniform choice from a seeded RNG, reproducible across runs.
pub struct SeededFallback {
    rng: Mutex<StdRng>,
}

impl SeededFallback {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl FallbackPolicy for SeededFallback {
    fn pick<'a>(&self, options: &'a [String]) -> Option<&'a str> {
        if options.is_empty() {
            return None;
        }
        let index = self.rng.lock().random_range(0..options.len());
        options.get(index).map(String::as_str)
    }
}

/// Always picks the same position (wrapping around the list).
#[derive(Debug, Clone, Copy)]
pub struct FixedFallback(pub usize);

impl FallbackPolicy for FixedFallback {
    fn pick<'a>(&self, options: &'a [String]) -> Option<&'a str> {
        if options.is_empty() {
            return None;
        }
        options.get(self.0 % options.len()).map(String::as_str)
    }
}

pub fn default_apologies() -> Vec<String> {
    DEFAULT_APOLOGIES.iter().map(|s| s.to_string()).collect()
}
