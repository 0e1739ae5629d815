//! Colors, sizes and spacing shared by the window

use eframe::egui::{self, Color32};

pub struct Theme;

impl Theme {
    pub const BG_PRIMARY: Color32 = Color32::from_rgb(24, 24, 27);
    pub const BG_SECONDARY: Color32 = Color32::from_rgb(32, 32, 36);
    pub const BG_CONSOLE: Color32 = Color32::from_rgb(17, 17, 19);

    pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(236, 236, 240);
    pub const TEXT_MUTED: Color32 = Color32::from_rgb(140, 140, 150);
    pub const TEXT_SECTION: Color32 = Color32::from_rgb(110, 110, 122);
    pub const TEXT_CONSOLE: Color32 = Color32::from_rgb(206, 210, 218);

    pub const SEPARATOR: Color32 = Color32::from_rgb(48, 48, 54);

    pub const ACCENT_PRIMARY: Color32 = Color32::from_rgb(94, 106, 210);
    pub const GREEN: Color32 = Color32::from_rgb(34, 197, 94);
    pub const RED: Color32 = Color32::from_rgb(239, 68, 68);
    pub const ORANGE: Color32 = Color32::from_rgb(249, 115, 22);

    /// Install the dark palette on the context
    pub fn apply(ctx: &egui::Context) {
        let mut visuals = egui::Visuals::dark();
        visuals.panel_fill = Self::BG_PRIMARY;
        visuals.window_fill = Self::BG_PRIMARY;
        visuals.extreme_bg_color = Self::BG_CONSOLE;
        visuals.selection.bg_fill = Self::ACCENT_PRIMARY;
        ctx.set_visuals(visuals);
    }
}

pub struct FontSize;

impl FontSize {
    pub const XS: f32 = 10.0;
    pub const SM: f32 = 12.0;
    pub const MD: f32 = 13.0;
}

pub struct Spacing;

impl Spacing {
    pub const XS: f32 = 4.0;
    pub const SM: f32 = 8.0;
    pub const MD: f32 = 12.0;
    pub const LG: f32 = 16.0;
}

pub struct Radius;

impl Radius {
    pub const SM: f32 = 4.0;
    pub const LG: f32 = 8.0;
}

/// Width of the label column in form rows
pub const LABEL_WIDTH: f32 = 110.0;
