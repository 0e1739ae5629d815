//! Main window: option tabs, console, and the run lifecycle

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use eframe::egui::{self, RichText};

use super::console::Console;
use super::options_panel::{
    show_advanced_tab, show_basic_tab, show_launcher_tab, status_message, LauncherAction,
    OptionsTab,
};
use super::theme::{FontSize, Spacing, Theme};
use crate::core::{TranslationJob, TranslationOptions, TranslatorConfig};
use crate::host::{
    CommandRunner, RunEvent, RunHandle, RunLog, RunOptions, RunOutcome, CANCELLED_EXIT_CODE,
};
use crate::settings::Settings;

/// Run the desktop window
pub fn run(config_override: Option<PathBuf>) -> anyhow::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Manga Translator")
            .with_inner_size([860.0, 720.0])
            .with_min_inner_size([800.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "manga-translator-gui",
        options,
        Box::new(move |cc| Ok(Box::new(TranslatorApp::new(cc, config_override)))),
    )
    .map_err(|e| anyhow::anyhow!("eframe error: {}", e))
}

/// A translation in progress
struct ActiveRun {
    handle: RunHandle,
    log: Option<RunLog>,
    stopping: bool,
}

pub struct TranslatorApp {
    settings: Settings,
    config_path: PathBuf,
    config: TranslatorConfig,
    options: TranslationOptions,
    launcher_line: String,
    active_tab: OptionsTab,
    console: Console,
    status_msg: Option<(String, bool)>,
    active_run: Option<ActiveRun>,
    /// Write settings back on exit
    persist_settings: bool,
}

impl TranslatorApp {
    fn new(cc: &eframe::CreationContext<'_>, config_override: Option<PathBuf>) -> Self {
        Theme::apply(&cc.egui_ctx);

        let mut settings = Settings::load();
        if config_override.is_some() {
            settings.config_path = config_override;
        }
        let mut app = Self::with_settings(settings);
        app.persist_settings = true;
        app
    }

    fn with_settings(settings: Settings) -> Self {
        let config_path = settings.config_path();
        let config = TranslatorConfig::load(&config_path);

        let mut options = TranslationOptions::from_config(&config);
        settings.fill_options(&mut options);

        Self {
            launcher_line: settings.launcher_line(),
            console: Console::new(settings.max_console_lines),
            settings,
            config_path,
            config,
            options,
            active_tab: OptionsTab::Basic,
            status_msg: None,
            active_run: None,
            persist_settings: false,
        }
    }

    fn is_running(&self) -> bool {
        self.active_run.is_some()
    }

    /// Write the form into the config file
    fn save_configuration(&mut self) -> bool {
        self.options.apply_to(&mut self.config);

        match self.config.save(&self.config_path) {
            Ok(()) => {
                self.console
                    .push(format!("Configuration saved to: {}", self.config_path.display()));
                true
            }
            Err(e) => {
                tracing::error!("{}", e);
                self.console.push(format!("Failed to save configuration: {}", e));
                self.status_msg = Some((e.to_string(), true));
                false
            }
        }
    }

    fn save_settings(&mut self) {
        self.settings.remember(&self.options);
        if !self.persist_settings {
            return;
        }
        if let Err(e) = self.settings.save() {
            tracing::warn!("Failed to save settings: {}", e);
        }
    }

    fn toggle_translation(&mut self, ctx: &egui::Context) {
        if self.is_running() {
            self.stop_translation();
        } else {
            self.start_translation(ctx);
        }
    }

    fn start_translation(&mut self, ctx: &egui::Context) {
        let invocation =
            match TranslationJob::build(&self.settings.launcher, &self.options, &self.config_path) {
                Ok(invocation) => invocation,
                Err(e) => {
                    self.console.push(e.to_string());
                    return;
                }
            };

        if !self.save_configuration() {
            return;
        }
        self.save_settings();

        let command_line = invocation.display();
        self.console.push(format!("Executing command: {}", command_line));
        self.console.push("Starting translation...");
        self.console.push("");

        let log = if self.settings.save_log {
            match RunLog::create(&self.settings.log_dir(), &command_line) {
                Ok(log) => Some(log),
                Err(e) => {
                    tracing::warn!("Run log disabled: {}", e);
                    self.console.push(format!("Could not create log file: {}", e));
                    None
                }
            }
        } else {
            None
        };

        let repaint_ctx = ctx.clone();
        let run_options = RunOptions {
            working_directory: self.settings.working_dir.clone(),
            grace_period: self.settings.grace_period(),
            cancel: None,
            notify: Some(Arc::new(move || repaint_ctx.request_repaint())),
        };

        match CommandRunner::new().spawn(&invocation, &run_options) {
            Ok(handle) => {
                self.status_msg = None;
                self.active_run = Some(ActiveRun {
                    handle,
                    log,
                    stopping: false,
                });
            }
            Err(e) => {
                tracing::error!("Failed to start translator: {}", e);
                self.console.push(format!("Failed to start translation: {}", e));
                self.status_msg = Some((e.to_string(), true));
            }
        }
    }

    fn stop_translation(&mut self) {
        if let Some(run) = self.active_run.as_mut() {
            if !run.stopping {
                self.console.push("Stopping translation...");
                run.stopping = true;
                run.handle.cancel();
            }
        }
    }

    /// Move queued runner events into the console and log
    fn poll_run(&mut self) {
        let Some(run) = self.active_run.as_mut() else {
            return;
        };

        let mut finished = None;
        for event in run.handle.try_events() {
            match event {
                RunEvent::Line(line) => {
                    if let Some(log) = run.log.as_mut() {
                        log.write_line(&line);
                    }
                    self.console.push(line);
                }
                RunEvent::Finished(outcome) => {
                    finished = Some(outcome);
                    break;
                }
            }
        }

        if let Some(outcome) = finished {
            self.translation_complete(outcome);
        }
    }

    fn translation_complete(&mut self, outcome: RunOutcome) {
        let Some(run) = self.active_run.take() else {
            return;
        };

        self.console.push("");
        self.console.push(outcome.summary());

        if let Some(log) = run.log {
            let path = log.path().display().to_string();
            log.finish(&outcome);
            self.console.push(format!("Log written to: {}", path));
        }

        self.status_msg = Some((outcome.summary(), !outcome.success()));
    }

    fn handle_launcher_action(&mut self, action: LauncherAction) {
        match action {
            LauncherAction::ConfigPathChanged(path) => {
                self.config = TranslatorConfig::load(&path);
                // Only the choices stored in the config change; dirs and flags stay as typed
                let loaded = TranslationOptions::from_config(&self.config);
                self.options = TranslationOptions {
                    target_lang: loaded.target_lang,
                    translator: loaded.translator,
                    detector: loaded.detector,
                    inpainter: loaded.inpainter,
                    renderer: loaded.renderer,
                    alignment: loaded.alignment,
                    ocr: loaded.ocr,
                    ..self.options.clone()
                };

                self.console.push(format!("Using configuration: {}", path.display()));
                self.settings.config_path = Some(path.clone());
                self.config_path = path;
            }
            LauncherAction::OpenLogDir => {
                let dir = self.settings.log_dir();
                if let Err(e) = std::fs::create_dir_all(&dir).and_then(|_| open::that(&dir)) {
                    let msg = format!("Could not open {}: {}", dir.display(), e);
                    self.status_msg = Some((msg, true));
                }
            }
        }
    }

    /// Cancel the active run and wait for it, keeping the log complete
    fn abandon_run(&mut self) -> Option<RunOutcome> {
        let mut run = self.active_run.take()?;
        run.handle.cancel();

        let mut outcome = None;
        for event in run.handle.events().iter() {
            match event {
                RunEvent::Line(line) => {
                    if let Some(log) = run.log.as_mut() {
                        log.write_line(&line);
                    }
                }
                RunEvent::Finished(finished) => {
                    outcome = Some(finished);
                    break;
                }
            }
        }

        let outcome = outcome.unwrap_or(RunOutcome {
            exit_code: CANCELLED_EXIT_CODE,
            cancelled: true,
            elapsed: Duration::ZERO,
        });
        if let Some(log) = run.log {
            log.finish(&outcome);
        }
        Some(outcome)
    }

    fn copy_console(&mut self) {
        if self.console.is_empty() {
            self.status_msg = Some(("Console is empty".to_string(), false));
            return;
        }

        let text = self.console.text();
        let result = arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text));
        self.status_msg = Some(match result {
            Ok(()) => ("Console copied to clipboard".to_string(), false),
            Err(e) => (format!("Clipboard unavailable: {}", e), true),
        });
    }

    fn show_button_bar(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.add_space(Spacing::SM);
        ui.horizontal(|ui| {
            let running = self.is_running();
            let stopping = self.active_run.as_ref().is_some_and(|r| r.stopping);

            let (label, color) = match (running, stopping) {
                (false, _) => ("Start translation", Theme::ACCENT_PRIMARY),
                (true, false) => ("Stop translation", Theme::RED),
                (true, true) => ("Stopping...", Theme::ORANGE),
            };
            let toggle = ui.add_enabled(
                !stopping,
                egui::Button::new(
                    RichText::new(label)
                        .size(FontSize::MD)
                        .color(egui::Color32::WHITE),
                )
                .fill(color)
                .min_size(egui::vec2(150.0, 30.0)),
            );
            if toggle.clicked() {
                self.toggle_translation(ctx);
            }

            let save = ui.add_enabled(
                !running,
                egui::Button::new(RichText::new("Save configuration").size(FontSize::MD))
                    .min_size(egui::vec2(0.0, 30.0)),
            );
            if save.clicked() {
                self.save_configuration();
                self.save_settings();
            }

            let exit = ui.add(
                egui::Button::new(RichText::new("Exit").size(FontSize::MD))
                    .min_size(egui::vec2(0.0, 30.0)),
            );
            if exit.clicked() {
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Copy").clicked() {
                    self.copy_console();
                }
                if ui.button("Clear").clicked() {
                    self.console.clear();
                }
            });
        });
        ui.add_space(Spacing::SM);
    }
}

impl eframe::App for TranslatorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_run();
        self.console.set_max_lines(self.settings.max_console_lines);

        egui::TopBottomPanel::bottom("buttons").show(ctx, |ui| {
            self.show_button_bar(ui, ctx);
        });

        egui::TopBottomPanel::top("tabs").show(ctx, |ui| {
            ui.add_enabled_ui(!self.is_running(), |ui| {
                ui.horizontal(|ui| {
                    for tab in OptionsTab::ALL {
                        ui.selectable_value(&mut self.active_tab, tab, tab.label());
                    }
                });
            });
        });

        egui::TopBottomPanel::top("options")
            .resizable(true)
            .default_height(320.0)
            .show(ctx, |ui| {
                let enabled = !self.is_running();
                let mut action = None;

                egui::ScrollArea::vertical()
                    .id_salt("options_scroll")
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        ui.add_enabled_ui(enabled, |ui| {
                            ui.add_space(Spacing::SM);
                            match self.active_tab {
                                OptionsTab::Basic => show_basic_tab(ui, &mut self.options),
                                OptionsTab::Advanced => show_advanced_tab(ui, &mut self.options),
                                OptionsTab::Launcher => {
                                    action = show_launcher_tab(
                                        ui,
                                        &mut self.settings,
                                        &mut self.launcher_line,
                                        &self.config_path,
                                    );
                                }
                            }
                            ui.add_space(Spacing::SM);
                        });
                    });

                if let Some(action) = action {
                    self.handle_launcher_action(action);
                }
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some((msg, is_error)) = &self.status_msg {
                status_message(ui, msg, *is_error);
                ui.add_space(Spacing::XS);
            }
            self.console.show(ui);
        });

        if self.is_running() {
            // Runner events request repaints; this is a fallback tick
            ctx.request_repaint_after(Duration::from_millis(250));
        }
    }
}

impl Drop for TranslatorApp {
    fn drop(&mut self) {
        if self.is_running() {
            tracing::info!("Window closed during a run, stopping translator");
            self.abandon_run();
        }
        self.save_settings();
    }
}
