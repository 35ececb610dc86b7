use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

pub const HOUR: i64 = 60 * 60;
pub const DAY: i64 = 24 * HOUR;

/// Wall clock the criteria engine reads, in unix seconds.
#[derive(Resource, Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct CriteriaClock {
    pub now: i64,
    /// Next time daily quests roll over; always after `now`.
    pub next_daily_reset: i64,
    pub reset_hour: u8,
    /// Sub-second remainder carried between ticks.
    #[serde(default)]
    pending_ms: u32,
}

impl Default for CriteriaClock {
    fn default() -> Self {
        Self::at(0, 6)
    }
}

impl CriteriaClock {
    pub fn at(now: i64, reset_hour: u8) -> Self {
        let reset_hour = reset_hour.min(23);
        let day_start = now - now.rem_euclid(DAY);
        let mut next_daily_reset = day_start + i64::from(reset_hour) * HOUR;
        if next_daily_reset <= now {
            next_daily_reset += DAY;
        }
        Self {
            now,
            next_daily_reset,
            reset_hour,
            pending_ms: 0,
        }
    }

    /// Current unix time from the system clock.
    pub fn system(reset_hour: u8) -> Self {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs() as i64)
            .unwrap_or(0);
        Self::at(now, reset_hour)
    }

    /// Moves time forward, rolling the reset boundary as days pass.
    pub fn advance_ms(&mut self, elapsed_ms: u32) {
        let total = u64::from(self.pending_ms) + u64::from(elapsed_ms);
        self.now += (total / 1000) as i64;
        self.pending_ms = (total % 1000) as u32;
        while self.next_daily_reset <= self.now {
            self.next_daily_reset += DAY;
        }
    }

    /// Reset boundary before the most recent one.
    pub fn previous_reset_window(&self) -> i64 {
        self.next_daily_reset - 2 * DAY
    }

    /// Most recent reset boundary.
    pub fn last_reset(&self) -> i64 {
        self.next_daily_reset - DAY
    }
}

/// Milliseconds simulated by the current tick.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickDelta(pub u32);

/// System: moves the clock by the tick delta.
pub fn advance_clock_system(mut clock: ResMut<CriteriaClock>, delta: Res<TickDelta>) {
    clock.advance_ms(delta.0);
}

impl std::fmt::Display for CriteriaClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let seconds_of_day = self.now.rem_euclid(DAY);
        write!(
            f,
            "day {} {:02}:{:02} (reset in {}s)",
            self.now.div_euclid(DAY),
            seconds_of_day / HOUR,
            (seconds_of_day % HOUR) / 60,
            self.next_daily_reset - self.now
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_is_next_occurrence_of_hour() {
        let clock = CriteriaClock::at(3 * DAY + 5 * HOUR, 6);
        assert_eq!(clock.next_daily_reset, 3 * DAY + 6 * HOUR);

        let clock = CriteriaClock::at(3 * DAY + 6 * HOUR, 6);
        assert_eq!(clock.next_daily_reset, 4 * DAY + 6 * HOUR);
        assert_eq!(clock.last_reset(), 3 * DAY + 6 * HOUR);
    }

    #[test]
    fn advancing_rolls_reset_forward() {
        let mut clock = CriteriaClock::at(10 * DAY, 0);
        assert_eq!(clock.next_daily_reset, 11 * DAY);
        clock.advance_ms(u32::try_from(DAY * 1000).unwrap());
        assert_eq!(clock.now, 11 * DAY);
        assert_eq!(clock.next_daily_reset, 12 * DAY);

        clock.advance_ms(600);
        clock.advance_ms(600);
        assert_eq!(clock.now, 11 * DAY + 1);
    }
}
