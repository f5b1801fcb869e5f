use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::shell::ViewMode;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub background: Rgb,
    pub view_mode: ViewMode,
    pub picture: Option<PathBuf>,
    pub chime: ChimeSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            background: Rgb([8, 16, 26]),
            view_mode: ViewMode::Normal,
            picture: None,
            chime: ChimeSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChimeSettings {
    pub enabled: bool,
    pub resource: PathBuf,
    pub player: String,
    pub player_args: Vec<String>,
    pub duration_ms: u64,
}

impl Default for ChimeSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            resource: PathBuf::from(default_chime_resource()),
            player: default_chime_player(),
            player_args: default_chime_player_args(),
            duration_ms: default_chime_duration_ms(),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Rgb(pub [u8; 3]);

impl FromStr for Rgb {
    type Err = anyhow::Error;

    fn from_str(input: &str) -> Result<Self> {
        let hex = input
            .strip_prefix('#')
            .filter(|hex| hex.len() == 6 && hex.is_ascii())
            .ok_or_else(|| anyhow!("invalid color '{input}', expected #RRGGBB"))?;
        let mut channels = [0_u8; 3];
        for (index, channel) in channels.iter_mut().enumerate() {
            let pair = &hex[index * 2..index * 2 + 2];
            *channel = u8::from_str_radix(pair, 16)
                .map_err(|_| anyhow!("invalid color '{input}', expected #RRGGBB"))?;
        }
        Ok(Self(channels))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02X}{g:02X}{b:02X}")
    }
}

/// Reads the settings file, falling back to defaults when it does not exist.
pub fn load_settings(path: &Path) -> Result<Settings> {
    match fs::read_to_string(path) {
        Ok(content) => parse_settings_text(&content),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "settings file not found, using defaults");
            Ok(Settings::default())
        }
        Err(err) => Err(err)
            .with_context(|| format!("unable to read settings file {}", path.display())),
    }
}

pub fn parse_settings_text(content: &str) -> Result<Settings> {
    let raw = serde_json::from_str::<SettingsFile>(content).map_err(|err| {
        let line = err.line();
        let column = err.column();
        anyhow!("invalid JSON at line {line}, column {column}: {err}")
    })?;

    if raw.version != 1 {
        bail!(
            "unsupported settings version {}; expected version 1",
            raw.version
        );
    }
    if raw.chime.duration_ms == 0 {
        bail!("chime duration_ms must be > 0");
    }

    let background = match raw.background_color {
        Some(text) => text.parse::<Rgb>()?,
        None => Settings::default().background,
    };

    Ok(Settings {
        background,
        view_mode: raw.view_mode.into(),
        picture: raw.picture,
        chime: ChimeSettings {
            enabled: raw.chime.enabled,
            resource: raw.chime.resource,
            player: raw.chime.player,
            player_args: raw.chime.player_args,
            duration_ms: raw.chime.duration_ms,
        },
    })
}

pub fn save_settings(path: &Path, settings: &Settings) -> Result<()> {
    let picture = settings
        .picture
        .as_ref()
        .map(|picture| Value::String(picture.display().to_string()))
        .unwrap_or(Value::Null);
    let view_mode = match settings.view_mode {
        ViewMode::Normal => "normal",
        ViewMode::Compact => "compact",
    };

    let payload = json!({
        "version": 1,
        "background_color": settings.background.to_string(),
        "view_mode": view_mode,
        "picture": picture,
        "chime": {
            "enabled": settings.chime.enabled,
            "resource": settings.chime.resource.display().to_string(),
            "player": settings.chime.player,
            "player_args": settings.chime.player_args,
            "duration_ms": settings.chime.duration_ms
        },
    });
    let text = serde_json::to_string_pretty(&payload)?;
    fs::write(path, format!("{text}\n"))
        .with_context(|| format!("unable to write settings file {}", path.display()))?;
    tracing::debug!(path = %path.display(), "settings saved");
    Ok(())
}

#[derive(Debug, Deserialize)]
struct SettingsFile {
    version: u32,
    #[serde(default)]
    background_color: Option<String>,
    #[serde(default)]
    view_mode: ViewModeToken,
    #[serde(default)]
    picture: Option<PathBuf>,
    #[serde(default)]
    chime: ChimeFile,
}

#[derive(Debug, Deserialize)]
struct ChimeFile {
    #[serde(default = "default_enabled")]
    enabled: bool,
    #[serde(default = "default_chime_resource_path")]
    resource: PathBuf,
    #[serde(default = "default_chime_player")]
    player: String,
    #[serde(default = "default_chime_player_args")]
    player_args: Vec<String>,
    #[serde(default = "default_chime_duration_ms")]
    duration_ms: u64,
}

impl Default for ChimeFile {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            resource: default_chime_resource_path(),
            player: default_chime_player(),
            player_args: default_chime_player_args(),
            duration_ms: default_chime_duration_ms(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ViewModeToken {
    #[default]
    Normal,
    Compact,
}

impl From<ViewModeToken> for ViewMode {
    fn from(value: ViewModeToken) -> Self {
        match value {
            ViewModeToken::Normal => ViewMode::Normal,
            ViewModeToken::Compact => ViewMode::Compact,
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_chime_resource() -> &'static str {
    "Resources/beep.wav"
}

fn default_chime_resource_path() -> PathBuf {
    PathBuf::from(default_chime_resource())
}

fn default_chime_player() -> String {
    if cfg!(target_os = "macos") {
        "afplay".to_string()
    } else {
        "aplay".to_string()
    }
}

fn default_chime_player_args() -> Vec<String> {
    if cfg!(target_os = "macos") {
        Vec::new()
    } else {
        vec!["-q".to_string()]
    }
}

fn default_chime_duration_ms() -> u64 {
    5_000
}
