use std::time::{Duration, Instant};

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Fixed-step trigger for countdown ticks.
///
/// A late caller gets one tick, not a burst: the schedule skips whole steps
/// that were missed.
#[derive(Debug, Clone)]
pub struct TickPacer {
    step: Duration,
    next_tick: Instant,
}

impl TickPacer {
    pub fn new(step: Duration, now: Instant) -> Self {
        Self {
            step: step.max(Duration::from_millis(1)),
            next_tick: now,
        }
    }

    /// Makes the next tick due immediately.
    pub fn restart(&mut self, now: Instant) {
        self.next_tick = now;
    }

    pub fn due(&mut self, now: Instant) -> bool {
        if now < self.next_tick {
            return false;
        }
        while self.next_tick <= now {
            self.next_tick += self.step;
        }
        true
    }

    pub fn until_next(&self, now: Instant) -> Duration {
        self.next_tick.saturating_duration_since(now)
    }
}

pub fn sleep_until(deadline: Instant) {
    let remaining = deadline.saturating_duration_since(Instant::now());
    if !remaining.is_zero() {
        std::thread::sleep(remaining);
    }
}
