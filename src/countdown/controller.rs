use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum CountdownStatus {
    Idle,
    Running,
    Expired,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct TickResult {
    pub remaining: Duration,
    pub expired: bool,
}

#[derive(Debug, Clone, Copy)]
struct DeadlineState {
    status: CountdownStatus,
    deadline: Option<DateTime<Utc>>,
}

/// Single-timer countdown state machine.
///
/// Every transition takes the caller's notion of "now", so the controller never
/// reads a clock itself. `tick` reports expiry exactly once; afterwards it
/// returns `None` until the next `start` or `reset`.
#[derive(Debug, Clone)]
pub struct CountdownController {
    state: DeadlineState,
}

impl Default for CountdownController {
    fn default() -> Self {
        Self::new()
    }
}

impl CountdownController {
    pub fn new() -> Self {
        Self {
            state: DeadlineState {
                status: CountdownStatus::Idle,
                deadline: None,
            },
        }
    }

    pub fn status(&self) -> CountdownStatus {
        self.state.status
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.state.deadline
    }

    pub fn start(&mut self, duration: Duration, now: DateTime<Utc>) {
        self.state = DeadlineState {
            status: CountdownStatus::Running,
            deadline: Some(deadline_after(now, duration)),
        };
    }

    pub fn stop(&mut self) {
        if self.state.status != CountdownStatus::Running {
            return;
        }
        self.clear();
    }

    pub fn reset(&mut self) {
        self.clear();
    }

    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<TickResult> {
        if self.state.status != CountdownStatus::Running {
            return None;
        }
        let deadline = self.state.deadline?;

        match (deadline - now).to_std() {
            Ok(remaining) if !remaining.is_zero() => Some(TickResult {
                remaining,
                expired: false,
            }),
            _ => {
                self.state = DeadlineState {
                    status: CountdownStatus::Expired,
                    deadline: None,
                };
                Some(TickResult {
                    remaining: Duration::ZERO,
                    expired: true,
                })
            }
        }
    }

    fn clear(&mut self) {
        self.state = DeadlineState {
            status: CountdownStatus::Idle,
            deadline: None,
        };
    }
}

// Spans past the representable calendar saturate at the latest instant.
fn deadline_after(now: DateTime<Utc>, duration: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(duration)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn epoch() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0)
            .single()
            .expect("valid epoch")
    }

    fn secs(value: i64) -> TimeDelta {
        TimeDelta::seconds(value)
    }

    #[test]
    fn starts_idle_without_deadline() {
        let controller = CountdownController::new();
        assert_eq!(controller.status(), CountdownStatus::Idle);
        assert!(controller.deadline().is_none());
    }

    #[test]
    fn immediate_tick_reports_full_duration() {
        let now = epoch();
        let mut controller = CountdownController::new();
        controller.start(Duration::from_secs(90), now);
        assert_eq!(controller.deadline(), Some(now + secs(90)));

        let result = controller.tick(now).expect("running");
        assert_eq!(result.remaining, Duration::from_secs(90));
        assert!(!result.expired);
        assert_eq!(controller.status(), CountdownStatus::Running);
    }

    #[test]
    fn thirty_second_scenario() {
        let start = epoch();
        let mut controller = CountdownController::new();
        controller.start(Duration::from_secs(30), start);

        let before = controller.tick(start + secs(29)).expect("running");
        assert_eq!(before.remaining, Duration::from_secs(1));
        assert!(!before.expired);

        let after = controller.tick(start + secs(31)).expect("expiry edge");
        assert_eq!(after.remaining, Duration::ZERO);
        assert!(after.expired);
        assert_eq!(controller.status(), CountdownStatus::Expired);
    }

    #[test]
    fn zero_duration_expires_exactly_once() {
        let now = epoch();
        let mut controller = CountdownController::new();
        controller.start(Duration::ZERO, now);
        assert_eq!(controller.status(), CountdownStatus::Running);

        let first = controller.tick(now).expect("expiry edge");
        assert!(first.expired);
        assert_eq!(first.remaining, Duration::ZERO);

        assert_eq!(controller.tick(now), None);
        assert_eq!(controller.tick(now + secs(5)), None);
        assert_eq!(controller.status(), CountdownStatus::Expired);
    }

    #[test]
    fn deadline_reached_exactly_counts_as_expiry() {
        let now = epoch();
        let mut controller = CountdownController::new();
        controller.start(Duration::from_secs(10), now);
        let result = controller.tick(now + secs(10)).expect("expiry edge");
        assert!(result.expired);
    }

    #[test]
    fn sub_second_remainder_is_kept() {
        let now = epoch();
        let mut controller = CountdownController::new();
        controller.start(Duration::from_secs(2), now);
        let result = controller
            .tick(now + TimeDelta::milliseconds(1_500))
            .expect("running");
        assert_eq!(result.remaining, Duration::from_millis(500));
    }

    #[test]
    fn stop_silences_ticks_regardless_of_elapsed_time() {
        let now = epoch();
        let mut controller = CountdownController::new();
        controller.start(Duration::from_secs(60), now);
        controller.stop();
        assert_eq!(controller.status(), CountdownStatus::Idle);
        assert!(controller.deadline().is_none());
        assert_eq!(controller.tick(now + secs(1)), None);
        assert_eq!(controller.tick(now + secs(3_600)), None);
    }

    #[test]
    fn stop_outside_running_is_a_no_op() {
        let now = epoch();
        let mut controller = CountdownController::new();
        controller.stop();
        assert_eq!(controller.status(), CountdownStatus::Idle);

        controller.start(Duration::ZERO, now);
        let _ = controller.tick(now);
        controller.stop();
        assert_eq!(controller.status(), CountdownStatus::Expired);
    }

    #[test]
    fn reset_returns_to_idle_from_every_state() {
        let now = epoch();
        let mut controller = CountdownController::new();
        controller.reset();
        assert_eq!(controller.status(), CountdownStatus::Idle);

        controller.start(Duration::from_secs(5), now);
        controller.reset();
        assert_eq!(controller.status(), CountdownStatus::Idle);
        assert!(controller.deadline().is_none());

        controller.start(Duration::ZERO, now);
        let _ = controller.tick(now);
        controller.reset();
        assert_eq!(controller.status(), CountdownStatus::Idle);
        assert!(controller.deadline().is_none());
        assert_eq!(controller.tick(now), None);
    }

    #[test]
    fn restart_after_expiry_signals_again() {
        let now = epoch();
        let mut controller = CountdownController::new();
        controller.start(Duration::ZERO, now);
        assert!(controller.tick(now).expect("first expiry").expired);

        controller.start(Duration::from_secs(1), now);
        assert!(!controller.tick(now).expect("running").expired);
        assert!(controller.tick(now + secs(1)).expect("second expiry").expired);
    }

    #[test]
    fn start_while_running_replaces_deadline() {
        let now = epoch();
        let mut controller = CountdownController::new();
        controller.start(Duration::from_secs(10), now);
        controller.start(Duration::from_secs(100), now + secs(5));
        assert_eq!(controller.deadline(), Some(now + secs(105)));
    }

    #[test]
    fn enormous_span_saturates_instead_of_overflowing() {
        let now = epoch();
        let mut controller = CountdownController::new();
        controller.start(Duration::from_secs(u64::MAX), now);
        assert_eq!(controller.deadline(), Some(DateTime::<Utc>::MAX_UTC));
        let result = controller.tick(now).expect("running");
        assert!(!result.expired);
    }
}
