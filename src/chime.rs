use std::io;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::settings::ChimeSettings;

const EXIT_POLL: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum ChimeError {
    #[error("chime is disabled")]
    Disabled,
    #[error("chime resource {} not found", .0.display())]
    MissingResource(PathBuf),
    #[error("failed to start chime player '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// Plays the expiry clip through an external player program.
#[derive(Debug, Clone)]
pub struct ChimePlayer {
    settings: ChimeSettings,
}

impl ChimePlayer {
    pub fn new(settings: ChimeSettings) -> Self {
        Self { settings }
    }

    pub fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    pub fn play_duration(&self) -> Duration {
        Duration::from_millis(self.settings.duration_ms.max(1))
    }

    pub fn play(&self) -> Result<ChimeTask, ChimeError> {
        if !self.settings.enabled {
            return Err(ChimeError::Disabled);
        }
        if !self.settings.resource.is_file() {
            return Err(ChimeError::MissingResource(self.settings.resource.clone()));
        }

        let child = Command::new(&self.settings.player)
            .args(&self.settings.player_args)
            .arg(&self.settings.resource)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| ChimeError::Spawn {
                program: self.settings.player.clone(),
                source,
            })?;
        tracing::debug!(
            player = %self.settings.player,
            resource = %self.settings.resource.display(),
            "chime started"
        );
        Ok(ChimeTask::spawn(child, self.play_duration()))
    }
}

/// One-shot playback guard.
///
/// Playback ends when the player exits by itself, after the configured
/// interval, on `cancel`, or when the task is dropped.
#[derive(Debug)]
pub struct ChimeTask {
    cancel: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl ChimeTask {
    fn spawn(child: Child, limit: Duration) -> Self {
        let (cancel, cancelled) = mpsc::channel::<()>();
        let worker = thread::spawn(move || {
            let mut child = child;
            supervise(&mut child, &cancelled, Instant::now() + limit);
            stop_child(&mut child);
        });
        Self {
            cancel: Some(cancel),
            worker: Some(worker),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.worker
            .as_ref()
            .map(JoinHandle::is_finished)
            .unwrap_or(true)
    }

    /// Blocks until the clip has played out its interval.
    pub fn wait(mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }

    pub fn cancel(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for ChimeTask {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn supervise(child: &mut Child, cancelled: &Receiver<()>, deadline: Instant) {
    loop {
        if let Ok(Some(_)) = child.try_wait() {
            return;
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return;
        }
        // An explicit cancel and a dropped sender both end playback.
        match cancelled.recv_timeout(remaining.min(EXIT_POLL)) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}

fn stop_child(child: &mut Child) {
    match child.try_wait() {
        Ok(Some(_)) => {}
        _ => {
            let _ = child.kill();
            let _ = child.wait();
            tracing::debug!("chime stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::time::Instant;

    use tempfile::tempdir;

    use super::*;

    fn settings_with(resource: PathBuf, player: &str, duration_ms: u64) -> ChimeSettings {
        ChimeSettings {
            enabled: true,
            resource,
            player: player.to_string(),
            player_args: Vec::new(),
            duration_ms,
        }
    }

    #[test]
    fn disabled_chime_does_not_play() {
        let player = ChimePlayer::new(ChimeSettings {
            enabled: false,
            ..ChimeSettings::default()
        });
        assert!(!player.is_enabled());
        assert!(matches!(player.play(), Err(ChimeError::Disabled)));
    }

    #[test]
    fn missing_resource_is_reported() {
        let dir = tempdir().expect("tempdir");
        let resource = dir.path().join("beep.wav");
        let player = ChimePlayer::new(settings_with(resource.clone(), "true", 100));
        match player.play() {
            Err(ChimeError::MissingResource(path)) => assert_eq!(path, resource),
            other => panic!("expected missing resource, got {other:?}"),
        }
    }

    #[test]
    fn unknown_player_is_reported() {
        let dir = tempdir().expect("tempdir");
        let resource = dir.path().join("beep.wav");
        fs::write(&resource, b"RIFF").expect("write clip");
        let player = ChimePlayer::new(settings_with(
            resource,
            "definitely-not-a-chime-player",
            100,
        ));
        let err = player.play().expect_err("spawn should fail");
        assert!(err.to_string().contains("definitely-not-a-chime-player"));
    }

    #[cfg(unix)]
    #[test]
    fn playback_is_cut_off_after_interval() {
        let dir = tempdir().expect("tempdir");
        let resource = dir.path().join("beep.wav");
        fs::write(&resource, b"RIFF").expect("write clip");
        // `tail -f` never exits on its own, so only the task can stop it.
        let mut settings = settings_with(resource, "tail", 50);
        settings.player_args = vec!["-f".to_string()];
        let task = ChimePlayer::new(settings).play().expect("spawn tail");

        let started = Instant::now();
        task.wait();
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(40));
        assert!(elapsed < Duration::from_secs(5));
    }

    #[cfg(unix)]
    #[test]
    fn short_clip_finishes_before_the_interval() {
        let dir = tempdir().expect("tempdir");
        let resource = dir.path().join("beep.wav");
        fs::write(&resource, b"RIFF").expect("write clip");
        // `cat` prints the clip and exits straight away.
        let task = ChimePlayer::new(settings_with(resource, "cat", 60_000))
            .play()
            .expect("spawn cat");

        let started = Instant::now();
        while !task.is_finished() && started.elapsed() < Duration::from_secs(5) {
            thread::sleep(Duration::from_millis(10));
        }
        assert!(task.is_finished());
        task.wait();
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[cfg(unix)]
    #[test]
    fn dropping_the_task_stops_playback_early() {
        let dir = tempdir().expect("tempdir");
        let resource = dir.path().join("beep.wav");
        fs::write(&resource, b"RIFF").expect("write clip");
        let mut settings = settings_with(resource, "tail", 60_000);
        settings.player_args = vec!["-f".to_string()];
        let task = ChimePlayer::new(settings).play().expect("spawn tail");
        assert!(!task.is_finished());

        let started = Instant::now();
        drop(task);
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
