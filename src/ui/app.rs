use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;
use eframe::egui::{
    self, Align, Color32, Layout, RichText, TextEdit, TextureHandle, TextureOptions, Ui,
    load::SizedTexture,
};
use rfd::FileDialog;

use crate::clock::{Clock, SystemClock};
use crate::countdown::controller::CountdownStatus;
use crate::countdown::format::FORMAT_HINT;
use crate::pacing::{TICK_INTERVAL, TickPacer};
use crate::settings::{Rgb, Settings, save_settings};
use crate::shell::{CountdownShell, ShellCommand, ShellTick, ViewMode};
use crate::ui::picture::{PICTURE_EXTENSIONS, is_supported_picture, load_picture};

const NORMAL_SIZE: [f32; 2] = [560.0, 340.0];
const COMPACT_SIZE: [f32; 2] = [240.0, 110.0];
const PICTURE_SIZE: f32 = 120.0;
const EXPIRY_FLASH: Duration = Duration::from_secs(6);

pub struct GuiOptions {
    pub settings: Settings,
    pub settings_path: PathBuf,
    pub sound_enabled: bool,
    pub event_name: String,
    pub duration_text: String,
}

pub fn run_gui(shell: CountdownShell, options: GuiOptions) -> Result<()> {
    let size = match shell.view_mode() {
        ViewMode::Normal => NORMAL_SIZE,
        ViewMode::Compact => COMPACT_SIZE,
    };
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Countdown Timer")
            .with_inner_size(size)
            .with_min_inner_size(COMPACT_SIZE)
            .with_drag_and_drop(true),
        ..Default::default()
    };

    let app = CountdownApp::new(shell, options);

    eframe::run_native(
        "Countdown Timer",
        native_options,
        Box::new(move |cc| {
            configure_theme(&cc.egui_ctx);
            Ok(Box::new(app))
        }),
    )
    .map_err(|err| anyhow::anyhow!("failed to launch countdown GUI: {err}"))?;

    Ok(())
}

fn configure_theme(ctx: &egui::Context) {
    let mut visuals = egui::Visuals::dark();
    visuals.widgets.noninteractive.bg_fill = Color32::from_rgb(10, 18, 30);
    visuals.widgets.inactive.bg_fill = Color32::from_rgb(16, 24, 38);
    visuals.widgets.hovered.bg_fill = Color32::from_rgb(26, 42, 62);
    visuals.widgets.active.bg_fill = Color32::from_rgb(34, 60, 88);
    visuals.selection.bg_fill = Color32::from_rgb(43, 148, 178);
    ctx.set_visuals(visuals);
}

struct CountdownApp {
    shell: CountdownShell,
    clock: SystemClock,
    pacer: TickPacer,
    settings: Settings,
    settings_path: PathBuf,
    sound_enabled: bool,
    event_input: String,
    duration_input: String,
    picture_texture: Option<TextureHandle>,
    picture_checked: bool,
    applied_mode: Option<ViewMode>,
    status_message: Option<(String, Instant)>,
    flash_until: Option<Instant>,
}

impl CountdownApp {
    fn new(shell: CountdownShell, options: GuiOptions) -> Self {
        Self {
            shell,
            clock: SystemClock,
            pacer: TickPacer::new(TICK_INTERVAL, Instant::now()),
            settings: options.settings,
            settings_path: options.settings_path,
            sound_enabled: options.sound_enabled,
            event_input: options.event_name,
            duration_input: options.duration_text,
            picture_texture: None,
            picture_checked: false,
            applied_mode: None,
            status_message: None,
            flash_until: None,
        }
    }

    fn set_status(&mut self, text: impl Into<String>, ttl: Duration) {
        self.status_message = Some((text.into(), Instant::now() + ttl));
    }

    fn dispatch(&mut self, command: ShellCommand) {
        let persists = !matches!(
            command,
            ShellCommand::Start { .. } | ShellCommand::Stop | ShellCommand::Reset
        );
        let starting = matches!(command, ShellCommand::Start { .. });

        if let Err(err) = self.shell.apply(command, self.clock.now()) {
            self.set_status(format!("{FORMAT_HINT} ({err})"), Duration::from_secs(5));
            return;
        }
        if starting {
            self.flash_until = None;
            self.pacer.restart(Instant::now());
        }
        if persists {
            self.persist_preferences();
        }
    }

    fn persist_preferences(&mut self) {
        self.shell.store_preferences(&mut self.settings);
        if let Err(err) = save_settings(&self.settings_path, &self.settings) {
            tracing::warn!(error = %err, "failed to save settings");
            self.set_status(format!("Saving settings failed: {err:#}"), Duration::from_secs(4));
        }
    }

    fn advance(&mut self, ctx: &egui::Context) {
        if !self.pacer.due(Instant::now()) {
            return;
        }
        if let ShellTick::Expired { chime_failure } = self.shell.tick(self.clock.now()) {
            self.flash_until = Some(Instant::now() + EXPIRY_FLASH);
            ctx.send_viewport_cmd(egui::ViewportCommand::RequestUserAttention(
                egui::UserAttentionType::Informational,
            ));
            let event = self.shell.event_name().to_string();
            let text = if event.is_empty() {
                "Countdown finished.".to_string()
            } else {
                format!("'{event}' finished.")
            };
            match chime_failure {
                Some(err) => self.set_status(
                    format!("{text} Error playing sound: {err}"),
                    Duration::from_secs(6),
                ),
                None => self.set_status(text, Duration::from_secs(4)),
            }
        }
    }

    fn attach_picture(&mut self, ctx: &egui::Context, path: &Path) {
        match load_picture(path) {
            Ok(image) => {
                self.picture_texture =
                    Some(ctx.load_texture("countdown-picture", image, TextureOptions::LINEAR));
                self.dispatch(ShellCommand::SetPicture(path.to_path_buf()));
            }
            Err(err) => {
                tracing::warn!(error = %err, "picture rejected");
                self.set_status(err.to_string(), Duration::from_secs(4));
            }
        }
    }

    fn remove_picture(&mut self) {
        self.picture_texture = None;
        self.dispatch(ShellCommand::RemovePicture);
    }

    fn restore_saved_picture(&mut self, ctx: &egui::Context) {
        if self.picture_checked {
            return;
        }
        self.picture_checked = true;
        let Some(path) = self.shell.picture().cloned() else {
            return;
        };
        match load_picture(&path) {
            Ok(image) => {
                self.picture_texture =
                    Some(ctx.load_texture("countdown-picture", image, TextureOptions::LINEAR));
            }
            // The saved path stays; only the texture is missing.
            Err(err) => {
                tracing::warn!(error = %err, "saved picture could not be restored");
                self.set_status(err.to_string(), Duration::from_secs(4));
            }
        }
    }

    fn pick_picture(&mut self, ctx: &egui::Context) {
        if let Some(path) = FileDialog::new()
            .add_filter("Image Files", &PICTURE_EXTENSIONS)
            .pick_file()
        {
            self.attach_picture(ctx, &path);
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|input| {
            input
                .raw
                .dropped_files
                .iter()
                .filter_map(|file| file.path.clone())
                .find(|path| is_supported_picture(path))
        });
        if let Some(path) = dropped {
            self.attach_picture(ctx, &path);
        }
    }

    fn apply_view_mode(&mut self, ctx: &egui::Context) {
        let mode = self.shell.view_mode();
        if self.applied_mode == Some(mode) {
            return;
        }
        if self.applied_mode.is_some() {
            let size = match mode {
                ViewMode::Normal => NORMAL_SIZE,
                ViewMode::Compact => COMPACT_SIZE,
            };
            ctx.send_viewport_cmd(egui::ViewportCommand::InnerSize(egui::vec2(
                size[0], size[1],
            )));
        }
        self.applied_mode = Some(mode);
    }

    fn countdown_color(&self) -> Color32 {
        let flashing = self
            .flash_until
            .map(|until| Instant::now() < until)
            .unwrap_or(false);
        if flashing {
            Color32::from_rgb(255, 106, 106)
        } else {
            contrast_text(self.shell.background())
        }
    }

    fn show_countdown(&self, ui: &mut Ui, size: f32) {
        let text_color = contrast_text(self.shell.background());
        if self.shell.view_mode() == ViewMode::Normal && !self.shell.event_name().is_empty() {
            ui.label(
                RichText::new(self.shell.event_name())
                    .size(18.0)
                    .color(text_color)
                    .strong(),
            );
        }
        ui.label(
            RichText::new(self.shell.display())
                .size(size)
                .monospace()
                .color(self.countdown_color())
                .strong(),
        );
    }

    fn show_inputs(&mut self, ui: &mut Ui) {
        ui.add(
            TextEdit::singleline(&mut self.event_input)
                .hint_text("Event Name")
                .desired_width(220.0),
        );
        let duration_response = ui.add(
            TextEdit::singleline(&mut self.duration_input)
                .hint_text("Enter time (e.g., '7d', '3w', '2m', '30s')")
                .desired_width(220.0),
        );
        if duration_response.lost_focus() && ui.input(|input| input.key_pressed(egui::Key::Enter))
        {
            self.start_from_inputs();
        }
    }

    fn start_from_inputs(&mut self) {
        self.dispatch(ShellCommand::Start {
            event_name: self.event_input.trim().to_string(),
            duration_text: self.duration_input.clone(),
        });
    }

    fn show_buttons(&mut self, ui: &mut Ui) {
        let status = self.shell.status();
        ui.horizontal_wrapped(|ui| {
            if ui.button("Start").clicked() {
                self.start_from_inputs();
            }
            if ui
                .add_enabled(status == CountdownStatus::Running, egui::Button::new("Stop"))
                .clicked()
            {
                self.dispatch(ShellCommand::Stop);
            }
            if ui.button("Reset").clicked() {
                self.flash_until = None;
                self.dispatch(ShellCommand::Reset);
            }
            if ui.button("Mini Mode").clicked() {
                self.dispatch(ShellCommand::ToggleViewMode);
            }
        });
    }

    fn show_appearance(&mut self, ui: &mut Ui, ctx: &egui::Context) {
        ui.horizontal_wrapped(|ui| {
            ui.label("Background:");
            let mut color = self.shell.background().0;
            if ui.color_edit_button_srgb(&mut color).changed() {
                self.dispatch(ShellCommand::SetBackground(Rgb(color)));
            }
            ui.label(
                RichText::new(if self.shell.chime_playing() {
                    "Sound: playing"
                } else if self.sound_enabled {
                    "Sound: on"
                } else {
                    "Sound: off"
                })
                .color(contrast_text(self.shell.background())),
            );
        });
        ui.horizontal_wrapped(|ui| {
            if ui.button("Load Picture").clicked() {
                self.pick_picture(ctx);
            }
            if ui
                .add_enabled(
                    self.shell.picture().is_some(),
                    egui::Button::new("Remove Picture"),
                )
                .clicked()
            {
                self.remove_picture();
            }
            let picture_name = self
                .shell
                .picture()
                .and_then(|path| path.file_name())
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "No picture".to_string());
            ui.label(RichText::new(picture_name).color(contrast_text(self.shell.background())));
        });
    }

    fn show_picture(&self, ui: &mut Ui) {
        match &self.picture_texture {
            Some(texture) => {
                ui.add(
                    egui::Image::from_texture(SizedTexture::from_handle(texture))
                        .fit_to_exact_size(egui::vec2(PICTURE_SIZE, PICTURE_SIZE)),
                );
            }
            None => {
                let (rect, _) = ui.allocate_exact_size(
                    egui::vec2(PICTURE_SIZE, PICTURE_SIZE),
                    egui::Sense::hover(),
                );
                ui.painter()
                    .rect_filled(rect, 2.0, Color32::from_rgb(211, 211, 211));
                ui.painter().text(
                    rect.center(),
                    egui::Align2::CENTER_CENTER,
                    "Drop picture",
                    egui::FontId::proportional(13.0),
                    Color32::from_rgb(60, 60, 60),
                );
            }
        }
    }

    fn show_status(&self, ui: &mut Ui) {
        if let Some((msg, _)) = &self.status_message {
            ui.label(
                RichText::new(msg)
                    .color(Color32::from_rgb(255, 187, 99))
                    .strong(),
            );
        }
    }

    fn show_normal(&mut self, ui: &mut Ui, ctx: &egui::Context) {
        ui.horizontal(|ui| {
            ui.vertical(|ui| {
                self.show_inputs(ui);
                ui.add_space(6.0);
                self.show_countdown(ui, 32.0);
            });
            ui.with_layout(Layout::right_to_left(Align::Min), |ui| {
                self.show_picture(ui);
            });
        });
        ui.add_space(6.0);
        self.show_buttons(ui);
        ui.separator();
        self.show_appearance(ui, ctx);
        self.show_status(ui);
    }

    fn show_compact(&mut self, ui: &mut Ui) {
        ui.vertical_centered(|ui| {
            self.show_countdown(ui, 26.0);
            if ui.button("Toggle Mode").clicked() {
                self.dispatch(ShellCommand::ToggleViewMode);
            }
        });
    }
}

impl eframe::App for CountdownApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Some((_, expires_at)) = &self.status_message
            && Instant::now() >= *expires_at
        {
            self.status_message = None;
        }

        self.restore_saved_picture(ctx);
        self.handle_dropped_files(ctx);
        self.advance(ctx);
        self.apply_view_mode(ctx);

        let [r, g, b] = self.shell.background().0;
        let panel_frame = egui::Frame::central_panel(&ctx.style()).fill(Color32::from_rgb(r, g, b));
        egui::CentralPanel::default()
            .frame(panel_frame)
            .show(ctx, |ui| match self.shell.view_mode() {
                ViewMode::Normal => self.show_normal(ui, ctx),
                ViewMode::Compact => self.show_compact(ui),
            });

        let now = Instant::now();
        let mut wait = self.pacer.until_next(now);
        if let Some(until) = self.flash_until
            && until > now
        {
            wait = wait.min(until - now);
        }
        ctx.request_repaint_after(wait);
    }
}

/// Picks black or white text depending on the background's perceived brightness.
fn contrast_text(background: Rgb) -> Color32 {
    let [r, g, b] = background.0;
    let luma = 0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b);
    if luma > 150.0 {
        Color32::from_rgb(20, 24, 30)
    } else {
        Color32::from_rgb(226, 234, 246)
    }
}
