mod chime;
mod clock;
mod countdown;
mod logging;
mod pacing;
mod settings;
mod shell;
mod ui;

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;

use crate::chime::ChimePlayer;
use crate::clock::SystemClock;
use crate::settings::load_settings;
use crate::shell::{CountdownShell, ViewMode};
use crate::ui::app::GuiOptions;

#[derive(Parser, Debug)]
#[command(
    name = "countdown",
    version,
    about = "Desktop countdown timer for a single named event"
)]
struct Cli {
    #[arg(long, default_value = "countdown.json")]
    settings: PathBuf,

    /// Event name shown above the countdown.
    #[arg(long, default_value = "")]
    event: String,

    /// Duration such as 30s, 2m, 3h, 7d or 3w.
    #[arg(long)]
    duration: Option<String>,

    /// Count down in the terminal instead of opening a window.
    #[arg(long)]
    headless: bool,

    #[arg(long)]
    mini: bool,

    #[arg(long)]
    no_chime: bool,

    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level)?;

    let mut settings = load_settings(&cli.settings)
        .with_context(|| format!("failed to load {}", cli.settings.display()))?;
    if cli.mini {
        settings.view_mode = ViewMode::Compact;
    }

    let chime = ChimePlayer::new(settings.chime.clone());
    let chime = (chime.is_enabled() && !cli.no_chime).then_some(chime);
    let sound_enabled = chime.is_some();
    let mut shell = CountdownShell::new(&settings, chime);

    if cli.headless {
        let Some(duration) = cli.duration.as_deref() else {
            bail!("--headless requires --duration");
        };
        let stdout = io::stdout();
        let mut out = stdout.lock();
        return shell::headless::run_headless(
            &mut shell,
            &SystemClock,
            &cli.event,
            duration,
            &mut out,
        );
    }

    ui::app::run_gui(
        shell,
        GuiOptions {
            settings,
            settings_path: cli.settings,
            sound_enabled,
            event_name: cli.event,
            duration_text: cli.duration.unwrap_or_default(),
        },
    )
}
