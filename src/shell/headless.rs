use std::io::Write;

use anyhow::{Context, Result};
use chrono::TimeDelta;

use crate::clock::Clock;
use crate::countdown::format::FORMAT_HINT;
use crate::pacing::TICK_INTERVAL;
use crate::shell::{CountdownShell, ShellCommand, ShellTick};

/// Runs one countdown in the terminal, printing a line per tick.
///
/// Ticks are scheduled on whole steps from the start time, so time spent
/// writing output does not push later ticks back.
///
/// Returns once the countdown has expired and the chime, if any, has finished.
pub fn run_headless<W: Write>(
    shell: &mut CountdownShell,
    clock: &dyn Clock,
    event_name: &str,
    duration_text: &str,
    out: &mut W,
) -> Result<()> {
    let step = TimeDelta::from_std(TICK_INTERVAL).context("tick interval out of range")?;
    let mut next_tick = clock.now();
    shell.apply(
        ShellCommand::Start {
            event_name: event_name.to_string(),
            duration_text: duration_text.to_string(),
        },
        next_tick,
    )
    .context(FORMAT_HINT)?;
    if !event_name.is_empty() {
        writeln!(out, "{event_name}")?;
    }

    loop {
        match shell.tick(clock.now()) {
            ShellTick::Running => {
                writeln!(out, "{}", shell.display())?;
                out.flush()?;
                let now = clock.now();
                while next_tick <= now {
                    next_tick += step;
                }
                clock.wait((next_tick - now).to_std().unwrap_or_default());
            }
            ShellTick::Expired { chime_failure } => {
                writeln!(out, "{}", shell.display())?;
                out.flush()?;
                if let Some(err) = chime_failure {
                    eprintln!("warning: {err}");
                }
                if let Some(chime) = shell.take_chime() {
                    chime.wait();
                }
                return Ok(());
            }
            ShellTick::Idle => return Ok(()),
        }
    }
}
