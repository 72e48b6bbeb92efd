use std::time::Duration;

// ============================================================================
// Configuration
// ============================================================================

pub const POINTS_PER_ROW: u32 = 100;
pub const POINTS_PER_LEVEL: u32 = 1000;

// Timing (in milliseconds)
pub const BASE_DROP_INTERVAL_MS: u64 = 1000;
pub const DROP_INTERVAL_STEP_MS: u64 = 100;
/// Floor for the speed curve. Without it level 11 and up would reach zero
/// or negative intervals.
pub const MIN_DROP_INTERVAL_MS: u64 = 100;

// ============================================================================
// Speed Curve
// ============================================================================

/// `1000 - (level - 1) * 100`, before clamping. Goes non-positive past level 10.
pub fn unclamped_drop_interval_ms(level: u32) -> i64 {
    BASE_DROP_INTERVAL_MS as i64 - (i64::from(level.max(1)) - 1) * DROP_INTERVAL_STEP_MS as i64
}

pub fn drop_interval_ms(level: u32) -> u64 {
    let interval = unclamped_drop_interval_ms(level).max(MIN_DROP_INTERVAL_MS as i64);
    interval as u64
}

// ============================================================================
// Progression
// ============================================================================

/// Score and level for one game session.
///
/// The level only moves when the score lands exactly on a multiple of
/// `POINTS_PER_LEVEL`. That test never misses because `POINTS_PER_ROW`
/// divides `POINTS_PER_LEVEL`, which keeps `level == 1 + score / 1000`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Progression {
    score: u32,
    level: u32,
}

impl Progression {
    pub fn new() -> Self {
        Self { score: 0, level: 1 }
    }

    /// Resume from an existing score. Rounds down to a whole number of rows.
    pub fn from_score(score: u32) -> Self {
        let score = score - score % POINTS_PER_ROW;
        Self {
            score,
            level: 1 + score / POINTS_PER_LEVEL,
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn drop_interval_ms(&self) -> u64 {
        drop_interval_ms(self.level)
    }

    pub fn drop_interval(&self) -> Duration {
        Duration::from_millis(self.drop_interval_ms())
    }

    /// Credits one cleared row. Returns true when this crossed into a new level.
    pub fn award_row(&mut self) -> bool {
        self.score += POINTS_PER_ROW;
        if self.score % POINTS_PER_LEVEL == 0 {
            self.level += 1;
            return true;
        }
        false
    }
}

impl Default for Progression {
    fn default() -> Self {
        Self::new()
    }
}
