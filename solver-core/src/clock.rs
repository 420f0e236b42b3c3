//! Wall-clock source for timing the substep loop.
//!
//! `std::time::Instant` is unavailable on `wasm32-unknown-unknown`, so the
//! solver takes its clock as a type parameter and hosts inject their own.

use std::time::Instant;

pub trait Clock {
    /// Milliseconds since an arbitrary, fixed origin. Must be monotonic.
    fn now_ms(&self) -> f64;
}

/// Monotonic clock backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct InstantClock {
    origin: Instant,
}

impl InstantClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for InstantClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for InstantClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1e3
    }
}
