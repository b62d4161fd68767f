//! Frame timing utilities

use std::time::Instant;

/// Measures elapsed time between frames
pub struct FrameTimer {
    last_tick: Instant,
}

impl FrameTimer {
    /// Create a timer starting now
    pub fn new() -> Self {
        Self {
            last_tick: Instant::now(),
        }
    }

    /// Return seconds elapsed since the previous tick and restart the interval
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let delta = now.duration_since(self.last_tick).as_secs_f32();
        self.last_tick = now;
        delta
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_returns_non_negative_delta() {
        let mut timer = FrameTimer::new();
        let delta = timer.tick();
        assert!(delta >= 0.0);
    }
}
