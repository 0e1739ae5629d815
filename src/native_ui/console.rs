//! Read-only console panel showing the translator's output

use std::collections::VecDeque;

use eframe::egui::{self, RichText};

use super::theme::{FontSize, Theme};

/// Bounded scrollback of console lines
pub struct Console {
    lines: VecDeque<String>,
    max_lines: usize,
}

impl Console {
    pub fn new(max_lines: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            max_lines: max_lines.max(1),
        }
    }

    /// Append a line, dropping the oldest ones past the limit
    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push_back(line.into());
        self.trim();
    }

    pub fn set_max_lines(&mut self, max_lines: usize) {
        self.max_lines = max_lines.max(1);
        self.trim();
    }

    fn trim(&mut self) {
        while self.lines.len() > self.max_lines {
            self.lines.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Whole scrollback as text, for the clipboard
    pub fn text(&self) -> String {
        self.lines.iter().map(String::as_str).collect::<Vec<_>>().join("\n")
    }

    /// Draw the console, pinned to the newest line
    pub fn show(&self, ui: &mut egui::Ui) {
        let row_height = ui.text_style_height(&egui::TextStyle::Monospace);

        egui::Frame::none()
            .fill(Theme::BG_CONSOLE)
            .inner_margin(6.0)
            .show(ui, |ui| {
                egui::ScrollArea::vertical()
                    .id_salt("console")
                    .stick_to_bottom(true)
                    .auto_shrink([false, false])
                    .show_rows(ui, row_height, self.lines.len(), |ui, range| {
                        for line in self.lines.range(range) {
                            ui.label(
                                RichText::new(line)
                                    .monospace()
                                    .size(FontSize::SM)
                                    .color(Theme::TEXT_CONSOLE),
                            );
                        }
                    });
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_text() {
        let mut console = Console::new(10);
        console.push("Starting translation...");
        console.push(String::from("[INFO] page 1"));
        assert_eq!(console.text(), "Starting translation...\n[INFO] page 1");
    }

    #[test]
    fn test_drops_oldest_past_limit() {
        let mut console = Console::new(3);
        for i in 0..5 {
            console.push(format!("line {}", i));
        }
        assert_eq!(console.text(), "line 2\nline 3\nline 4");

        console.set_max_lines(1);
        assert_eq!(console.text(), "line 4");
    }

    #[test]
    fn test_clear() {
        let mut console = Console::new(0);
        console.push("a");
        console.push("b");
        assert_eq!(console.text(), "b");
        console.clear();
        assert!(console.is_empty());
    }
}
