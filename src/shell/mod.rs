pub mod headless;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::chime::{ChimeError, ChimePlayer, ChimeTask};
use crate::countdown::controller::{CountdownController, CountdownStatus};
use crate::countdown::format::{EXPIRED_DISPLAY, IDLE_DISPLAY, format_remaining};
use crate::countdown::parser::{ParseError, parse_duration};
use crate::settings::{Rgb, Settings};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ViewMode {
    Normal,
    Compact,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Normal => Self::Compact,
            Self::Compact => Self::Normal,
        }
    }
}

/// Every user action the shell understands.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Start {
        event_name: String,
        duration_text: String,
    },
    Stop,
    Reset,
    ToggleViewMode,
    SetBackground(Rgb),
    SetPicture(PathBuf),
    RemovePicture,
}

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("invalid duration: {0}")]
    InvalidDuration(#[from] ParseError),
}

/// What a single tick produced for the renderer.
#[derive(Debug)]
pub enum ShellTick {
    Idle,
    Running,
    Expired { chime_failure: Option<ChimeError> },
}

pub struct CountdownShell {
    controller: CountdownController,
    event_name: String,
    display: String,
    view_mode: ViewMode,
    background: Rgb,
    picture: Option<PathBuf>,
    chime: Option<ChimePlayer>,
    active_chime: Option<ChimeTask>,
}

impl CountdownShell {
    pub fn new(settings: &Settings, chime: Option<ChimePlayer>) -> Self {
        Self {
            controller: CountdownController::new(),
            event_name: String::new(),
            display: IDLE_DISPLAY.to_string(),
            view_mode: settings.view_mode,
            background: settings.background,
            picture: settings.picture.clone(),
            chime,
            active_chime: None,
        }
    }

    pub fn status(&self) -> CountdownStatus {
        self.controller.status()
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.controller.deadline()
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn background(&self) -> Rgb {
        self.background
    }

    pub fn picture(&self) -> Option<&PathBuf> {
        self.picture.as_ref()
    }

    pub fn chime_playing(&self) -> bool {
        self.active_chime
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }

    /// Copies the shell-owned preferences back into `settings`.
    pub fn store_preferences(&self, settings: &mut Settings) {
        settings.background = self.background;
        settings.view_mode = self.view_mode;
        settings.picture = self.picture.clone();
    }

    pub fn apply(&mut self, command: ShellCommand, now: DateTime<Utc>) -> Result<(), ShellError> {
        match command {
            ShellCommand::Start {
                event_name,
                duration_text,
            } => {
                let duration = parse_duration(&duration_text)?;
                self.cancel_chime();
                self.event_name = event_name;
                self.controller.start(duration, now);
                tracing::info!(
                    event = %self.event_name,
                    seconds = duration.as_secs(),
                    deadline = ?self.controller.deadline(),
                    "countdown started"
                );
                self.display = format_remaining(duration);
            }
            ShellCommand::Stop => {
                if self.controller.status() == CountdownStatus::Running {
                    // The display keeps the last rendered value.
                    self.controller.stop();
                    tracing::info!(display = %self.display, "countdown stopped");
                }
            }
            ShellCommand::Reset => {
                self.controller.reset();
                self.cancel_chime();
                self.display = IDLE_DISPLAY.to_string();
                tracing::info!("countdown reset");
            }
            ShellCommand::ToggleViewMode => {
                self.view_mode = self.view_mode.toggled();
                tracing::debug!(mode = ?self.view_mode, "view mode toggled");
            }
            ShellCommand::SetBackground(color) => {
                self.background = color;
            }
            ShellCommand::SetPicture(path) => {
                self.picture = Some(path);
            }
            ShellCommand::RemovePicture => {
                self.picture = None;
            }
        }
        Ok(())
    }

    pub fn tick(&mut self, now: DateTime<Utc>) -> ShellTick {
        if self
            .active_chime
            .as_ref()
            .is_some_and(ChimeTask::is_finished)
        {
            self.active_chime = None;
        }

        let Some(result) = self.controller.tick(now) else {
            return ShellTick::Idle;
        };
        if !result.expired {
            self.display = format_remaining(result.remaining);
            return ShellTick::Running;
        }

        self.display = EXPIRED_DISPLAY.to_string();
        tracing::info!(event = %self.event_name, "countdown expired");
        ShellTick::Expired {
            chime_failure: self.ring(),
        }
    }

    /// Hands the running chime to the caller, e.g. to let it finish before exit.
    pub fn take_chime(&mut self) -> Option<ChimeTask> {
        self.active_chime.take()
    }

    fn ring(&mut self) -> Option<ChimeError> {
        let player = self.chime.as_ref()?;
        match player.play() {
            Ok(task) => {
                self.active_chime = Some(task);
                None
            }
            Err(ChimeError::Disabled) => None,
            Err(err) => {
                tracing::warn!(error = %err, "chime failed");
                Some(err)
            }
        }
    }

    fn cancel_chime(&mut self) {
        if let Some(task) = self.active_chime.take() {
            task.cancel();
        }
    }
}
