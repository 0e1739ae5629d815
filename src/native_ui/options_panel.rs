//! Option tabs: basic and advanced translator choices, launcher settings

use std::path::{Path, PathBuf};

use eframe::egui::{self, Color32, Rect, RichText, Rounding, Vec2};

use super::theme::{FontSize, Radius, Spacing, Theme, LABEL_WIDTH};
use crate::core::{
    OptionSet, TranslationOptions, ALIGNMENTS, DETECTORS, INPAINTERS, LANGUAGES, OCR_MODELS,
    RENDERERS, TRANSLATORS,
};
use crate::settings::Settings;

/// Which options tab is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptionsTab {
    #[default]
    Basic,
    Advanced,
    Launcher,
}

impl OptionsTab {
    pub const ALL: [OptionsTab; 3] = [
        OptionsTab::Basic,
        OptionsTab::Advanced,
        OptionsTab::Launcher,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            OptionsTab::Basic => "Basic",
            OptionsTab::Advanced => "Advanced",
            OptionsTab::Launcher => "Launcher",
        }
    }
}

/// Something in the launcher tab the app has to act on
#[derive(Debug, Clone, PartialEq)]
pub enum LauncherAction {
    /// A different translator config file was picked
    ConfigPathChanged(PathBuf),
    /// Open the log directory in the file manager
    OpenLogDir,
}

pub fn show_basic_tab(ui: &mut egui::Ui, options: &mut TranslationOptions) {
    section_header(ui, "Folders");

    settings_card(ui, |ui| {
        dir_picker_row(ui, "Input folder", "Select input directory", &mut options.input_dir);
        setting_divider(ui);
        dir_picker_row(ui, "Output folder", "Select output directory", &mut options.output_dir);
    });

    ui.add_space(Spacing::LG);
    section_header(ui, "Translation");

    settings_card(ui, |ui| {
        choice_row(ui, "target_lang", LANGUAGES, &mut options.target_lang);
        setting_divider(ui);
        choice_row(ui, "translator", TRANSLATORS, &mut options.translator);
        setting_divider(ui);
        setting_toggle(ui, "Use GPU", "Pass --use-gpu to the translator", &mut options.use_gpu);
        setting_divider(ui);
        setting_toggle(ui, "Verbose output", "Pass -v for detailed logs", &mut options.verbose);
    });
}

pub fn show_advanced_tab(ui: &mut egui::Ui, options: &mut TranslationOptions) {
    section_header(ui, "Text detection");
    settings_card(ui, |ui| {
        choice_row(ui, "detector", DETECTORS, &mut options.detector);
    });

    ui.add_space(Spacing::LG);
    section_header(ui, "Text removal");
    settings_card(ui, |ui| {
        choice_row(ui, "inpainter", INPAINTERS, &mut options.inpainter);
    });

    ui.add_space(Spacing::LG);
    section_header(ui, "Rendering");
    settings_card(ui, |ui| {
        choice_row(ui, "renderer", RENDERERS, &mut options.renderer);
        setting_divider(ui);
        choice_row(ui, "alignment", ALIGNMENTS, &mut options.alignment);
    });

    ui.add_space(Spacing::LG);
    section_header(ui, "OCR");
    settings_card(ui, |ui| {
        choice_row(ui, "ocr", OCR_MODELS, &mut options.ocr);
    });

    ui.add_space(Spacing::LG);
    section_header(ui, "Other");
    settings_card(ui, |ui| {
        setting_toggle(
            ui,
            "Ignore errors",
            "Keep going when a page fails",
            &mut options.ignore_errors,
        );
        setting_divider(ui);
        setting_toggle(
            ui,
            "Overwrite",
            "Translate images that already have output",
            &mut options.overwrite,
        );
        setting_divider(ui);
        setting_toggle(
            ui,
            "Skip images without text",
            "Do not write pages with nothing to translate",
            &mut options.skip_no_text,
        );
    });
}

pub fn show_launcher_tab(
    ui: &mut egui::Ui,
    settings: &mut Settings,
    launcher_line: &mut String,
    config_path: &Path,
) -> Option<LauncherAction> {
    let mut action = None;

    section_header(ui, "Translator");

    settings_card(ui, |ui| {
        form_row(ui, "Command", |ui| {
            let response = ui.add(
                egui::TextEdit::singleline(launcher_line)
                    .hint_text("uv run python -m manga_translator")
                    .desired_width(f32::INFINITY),
            );
            if response.changed() {
                settings.set_launcher_line(launcher_line);
            }
        });

        setting_divider(ui);

        let mut working_dir = settings
            .working_dir
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        if dir_picker_row(ui, "Working folder", "Select translator folder", &mut working_dir) {
            let trimmed = working_dir.trim();
            settings.working_dir = (!trimmed.is_empty()).then(|| PathBuf::from(trimmed));
        }

        setting_divider(ui);

        form_row(ui, "Config file", |ui| {
            if ui.button("Browse").clicked() {
                if let Some(path) = rfd::FileDialog::new()
                    .set_title("Select translator config")
                    .add_filter("JSON", &["json"])
                    .save_file()
                {
                    action = Some(LauncherAction::ConfigPathChanged(path));
                }
            }
            ui.label(
                RichText::new(config_path.display().to_string())
                    .size(FontSize::SM)
                    .color(Theme::TEXT_MUTED)
                    .monospace(),
            );
        });
    });

    ui.add_space(Spacing::LG);
    section_header(ui, "Run log");

    settings_card(ui, |ui| {
        setting_toggle(ui, "Save output to a log file", "One file per run", &mut settings.save_log);

        setting_divider(ui);

        let mut log_dir = settings.log_dir().display().to_string();
        if dir_picker_row(ui, "Log folder", "Select log directory", &mut log_dir) {
            let trimmed = log_dir.trim();
            settings.log_dir = (!trimmed.is_empty()).then(|| PathBuf::from(trimmed));
        }

        ui.horizontal(|ui| {
            ui.add_space(LABEL_WIDTH);
            if ui.button("Open log folder").clicked() {
                action = Some(LauncherAction::OpenLogDir);
            }
        });
    });

    ui.add_space(Spacing::LG);
    section_header(ui, "Console");

    settings_card(ui, |ui| {
        form_row(ui, "Max lines", |ui| {
            ui.add(egui::DragValue::new(&mut settings.max_console_lines).range(100..=100_000));
        });
        setting_divider(ui);
        form_row(ui, "Stop timeout", |ui| {
            ui.add(
                egui::DragValue::new(&mut settings.termination_grace_secs)
                    .range(1..=60)
                    .suffix(" s"),
            );
            ui.label(
                RichText::new("before the translator is killed")
                    .size(FontSize::SM)
                    .color(Theme::TEXT_MUTED),
            );
        });
    });

    action
}

// ════════════════════════════════════════════════════════════════════════════════
// HELPER COMPONENTS
// ════════════════════════════════════════════════════════════════════════════════

/// Section header - subtle, uppercase
fn section_header(ui: &mut egui::Ui, text: &str) {
    ui.label(
        RichText::new(text.to_uppercase())
            .size(FontSize::XS)
            .color(Theme::TEXT_SECTION)
    );
    ui.add_space(Spacing::SM);
}

/// Card container for a group of settings
fn settings_card(ui: &mut egui::Ui, content: impl FnOnce(&mut egui::Ui)) {
    egui::Frame::none()
        .fill(Theme::BG_SECONDARY)
        .rounding(Rounding::same(Radius::LG))
        .inner_margin(Spacing::MD)
        .show(ui, |ui| {
            ui.set_min_width(ui.available_width());
            content(ui);
        });
}

/// Divider line between settings in a card
fn setting_divider(ui: &mut egui::Ui) {
    ui.add_space(Spacing::SM);
    let rect = Rect::from_min_size(
        ui.cursor().min,
        Vec2::new(ui.available_width(), 1.0),
    );
    ui.painter().rect_filled(rect, 0.0, Theme::SEPARATOR);
    ui.add_space(Spacing::SM + 1.0);
}

/// Toggle setting row - title, subtitle, and checkbox on right
fn setting_toggle(ui: &mut egui::Ui, title: &str, subtitle: &str, value: &mut bool) -> bool {
    let mut changed = false;

    ui.horizontal(|ui| {
        ui.vertical(|ui| {
            ui.label(RichText::new(title).size(FontSize::MD).color(Theme::TEXT_PRIMARY));
            ui.label(RichText::new(subtitle).size(FontSize::SM).color(Theme::TEXT_MUTED));
        });

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.checkbox(value, "").changed() {
                changed = true;
            }
        });
    });

    changed
}

/// Label column plus content
fn form_row(ui: &mut egui::Ui, label: &str, content: impl FnOnce(&mut egui::Ui)) {
    ui.horizontal(|ui| {
        ui.add_sized(
            [LABEL_WIDTH, 20.0],
            egui::Label::new(RichText::new(label).size(FontSize::MD).color(Theme::TEXT_PRIMARY)),
        );
        content(ui);
    });
}

/// Combo box over one option catalogue
fn choice_row(ui: &mut egui::Ui, id: &str, set: OptionSet, value: &mut String) {
    form_row(ui, set.name, |ui| {
        egui::ComboBox::from_id_salt(id)
            .selected_text(value.as_str())
            .width(180.0)
            .show_ui(ui, |ui| {
                for choice in set.values {
                    ui.selectable_value(value, choice.to_string(), *choice);
                }
            });
    });
}

/// Text field with a folder picker. Returns true when the value changed.
fn dir_picker_row(ui: &mut egui::Ui, label: &str, dialog_title: &str, value: &mut String) -> bool {
    let mut changed = false;

    form_row(ui, label, |ui| {
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("Browse").clicked() {
                let mut dialog = rfd::FileDialog::new().set_title(dialog_title);
                if !value.trim().is_empty() {
                    dialog = dialog.set_directory(value.trim());
                }
                if let Some(dir) = dialog.pick_folder() {
                    *value = dir.display().to_string();
                    changed = true;
                }
            }

            let response = ui.add(
                egui::TextEdit::singleline(value).desired_width(f32::INFINITY),
            );
            changed |= response.changed();
        });
    });

    changed
}

/// Status banner above the console
pub fn status_message(ui: &mut egui::Ui, msg: &str, is_error: bool) {
    let (bg_color, text_color, icon) = if is_error {
        (Color32::from_rgba_unmultiplied(239, 68, 68, 15), Theme::RED, "✕")
    } else {
        (Color32::from_rgba_unmultiplied(34, 197, 94, 15), Theme::GREEN, "✓")
    };

    egui::Frame::none()
        .fill(bg_color)
        .rounding(Rounding::same(Radius::SM))
        .inner_margin(Spacing::SM)
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new(icon).size(FontSize::SM).color(text_color));
                ui.add_space(Spacing::XS);
                ui.label(RichText::new(msg).size(FontSize::SM).color(text_color));
            });
        });
}
