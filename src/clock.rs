use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::pacing::sleep_until;

/// Wall-clock source handed to the shell; the countdown core only ever sees
/// the timestamps it produces.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
    fn wait(&self, step: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn wait(&self, step: Duration) {
        sleep_until(Instant::now() + step);
    }
}
