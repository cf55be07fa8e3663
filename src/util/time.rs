//! Time utilities for the match loop

use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time::Instant;

/// Render/simulation tick rate (one logical tick per rendered frame)
pub const SIMULATION_TPS: u32 = 60;
pub const TICK_DURATION_MICROS: u64 = 1_000_000 / SIMULATION_TPS as u64;

/// Real-time length of one countdown step
pub const COUNTDOWN_PERIOD: Duration = Duration::from_secs(1);

/// Get current Unix timestamp in milliseconds
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// Duration of one simulation tick
pub fn tick_duration() -> Duration {
    Duration::from_micros(TICK_DURATION_MICROS)
}

/// Monotonic clock anchored at match start.
///
/// The simulation only ever sees milliseconds since this anchor. Backed by
/// tokio's clock so paused-time tests advance it.
#[derive(Debug, Clone, Copy)]
pub struct MatchClock {
    start: Instant,
}

impl MatchClock {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

impl Default for MatchClock {
    fn default() -> Self {
        Self::start()
    }
}
