use std::time::Duration;

pub const IDLE_DISPLAY: &str = "00:00:00";
pub const EXPIRED_DISPLAY: &str = "Time's up!";
pub const FORMAT_HINT: &str = "Please enter a valid time format (e.g., '7d', '3w', '2m', '30s').";

/// Renders a remaining span as `dd:hh:mm:ss`, dropping the sub-second part.
pub fn format_remaining(remaining: Duration) -> String {
    let total_secs = remaining.as_secs();
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;
    format!("{days:02}:{hours:02}:{minutes:02}:{seconds:02}")
}
