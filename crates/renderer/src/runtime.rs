use std::time::{Duration, Instant};

/// Most ticks run back to back after a stall before the backlog is dropped.
pub const MAX_CATCH_UP_TICKS: u32 = 8;

/// Fixed-rate tick scheduler driving `Game::update`.
///
/// The clock hands out whole ticks against a monotonic `Instant`, so the
/// logical tick rate stays independent of how often the window redraws.
#[derive(Debug, Clone, Copy)]
pub struct TickClock {
    period: Duration,
    next: Instant,
}

impl TickClock {
    /// Creates a clock whose first tick is due at `now`.
    pub fn new(ticks_per_second: u32, now: Instant) -> Self {
        let period = Duration::from_secs(1) / ticks_per_second.max(1);
        Self { period, next: now }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Number of ticks to run at `now`. Falling more than
    /// [`MAX_CATCH_UP_TICKS`] behind skips the remainder instead of
    /// replaying it.
    pub fn due_ticks(&mut self, now: Instant) -> u32 {
        let mut due = 0;
        while self.next <= now {
            if due == MAX_CATCH_UP_TICKS {
                let behind = now.saturating_duration_since(self.next);
                tracing::debug!(
                    behind_ms = behind.as_millis() as u64,
                    "tick clock fell behind; dropping backlog"
                );
                self.next = now + self.period;
                break;
            }
            due += 1;
            self.next += self.period;
        }
        due
    }

    /// Instant at which the next tick becomes due.
    pub fn next_deadline(&self) -> Instant {
        self.next
    }

    pub fn reset(&mut self, now: Instant) {
        self.next = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_is_due_immediately() {
        let start = Instant::now();
        let mut clock = TickClock::new(60, start);
        assert_eq!(clock.due_ticks(start), 1);
        assert_eq!(clock.due_ticks(start), 0);
        assert_eq!(clock.next_deadline(), start + clock.period());
    }

    #[test]
    fn counts_elapsed_periods() {
        let start = Instant::now();
        let mut clock = TickClock::new(10, start);
        assert_eq!(clock.period(), Duration::from_millis(100));
        assert_eq!(clock.due_ticks(start + Duration::from_millis(350)), 4);
        assert_eq!(clock.due_ticks(start + Duration::from_millis(399)), 0);
        assert_eq!(clock.due_ticks(start + Duration::from_millis(400)), 1);
    }

    #[test]
    fn drops_backlog_after_stall() {
        let start = Instant::now();
        let mut clock = TickClock::new(100, start);
        let later = start + Duration::from_secs(5);
        assert_eq!(clock.due_ticks(later), MAX_CATCH_UP_TICKS);
        assert_eq!(clock.next_deadline(), later + clock.period());
        assert_eq!(clock.due_ticks(later), 0);
    }

    #[test]
    fn zero_rate_is_clamped() {
        let clock = TickClock::new(0, Instant::now());
        assert_eq!(clock.period(), Duration::from_secs(1));
    }

    #[test]
    fn reset_restarts_schedule() {
        let start = Instant::now();
        let mut clock = TickClock::new(60, start);
        clock.due_ticks(start + Duration::from_secs(1));
        let resumed = start + Duration::from_secs(10);
        clock.reset(resumed);
        assert_eq!(clock.due_ticks(resumed), 1);
    }
}
