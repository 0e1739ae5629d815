//! Native egui window for configuring and running the translator

mod app;
mod console;
mod options_panel;
mod theme;

pub use app::run;
