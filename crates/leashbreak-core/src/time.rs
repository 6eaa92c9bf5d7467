use serde::{Deserialize, Serialize};

/// A countdown in seconds, driven by the frame delta.
///
/// Expiry is checked with `<= 0.0` so a large `dt` that overshoots zero still
/// registers exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Countdown {
    pub duration: f32,
    pub remaining: f32,
}

impl Countdown {
    pub fn new(duration: f32) -> Self {
        Self {
            duration,
            remaining: duration,
        }
    }

    /// A countdown that has already run out.
    pub fn idle() -> Self {
        Self {
            duration: 0.0,
            remaining: 0.0,
        }
    }

    pub fn restart(&mut self) {
        self.remaining = self.duration;
    }

    pub fn restart_with(&mut self, duration: f32) {
        self.duration = duration;
        self.remaining = duration;
    }

    /// Advance by `dt`. Returns `true` only on the tick that reaches zero.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.remaining <= 0.0 {
            return false;
        }
        self.remaining -= dt;
        self.remaining <= 0.0
    }

    pub fn is_expired(&self) -> bool {
        self.remaining <= 0.0
    }

    /// Remaining time, never negative.
    pub fn remaining(&self) -> f32 {
        self.remaining.max(0.0)
    }

    /// Fraction of the duration still left, in `[0, 1]`.
    pub fn fraction_remaining(&self) -> f32 {
        if self.duration <= 0.0 {
            return 0.0;
        }
        (self.remaining / self.duration).clamp(0.0, 1.0)
    }

    /// Fraction of the duration already elapsed, in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        1.0 - self.fraction_remaining()
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::idle()
    }
}
