//! Console line cleanup
//!
//! The translator logs with colors and redraws progress bars with carriage
//! returns. Lines are normalized before they reach the console panel or the
//! log file.

use regex_lite::Regex;
use std::sync::OnceLock;

/// Get the compiled ANSI escape regex
fn ansi_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        // CSI sequences (colors, cursor movement) and OSC sequences (titles)
        Regex::new(r"\x1b\[[0-?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)")
            .expect("Invalid ANSI regex")
    })
}

/// Remove ANSI escape sequences from text
pub fn strip_ansi(text: &str) -> String {
    ansi_regex().replace_all(text, "").into_owned()
}

/// Normalize one raw line of child output for display.
///
/// Keeps only the text after the last carriage return, strips escape
/// sequences and trims surrounding whitespace.
pub fn normalize_line(raw: &str) -> String {
    let last_frame = raw
        .trim_end_matches(['\r', '\n'])
        .rsplit('\r')
        .next()
        .unwrap_or_default();
    strip_ansi(last_frame).trim().to_string()
}

/// Decode raw bytes from the child, replacing invalid UTF-8
pub fn decode_line(bytes: &[u8]) -> String {
    normalize_line(&String::from_utf8_lossy(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_colors() {
        assert_eq!(
            strip_ansi("\x1b[32m[INFO]\x1b[0m Detecting text"),
            "[INFO] Detecting text"
        );
    }

    #[test]
    fn test_strip_osc_title() {
        assert_eq!(strip_ansi("\x1b]0;title\x07done"), "done");
    }

    #[test]
    fn test_progress_bar_keeps_last_frame() {
        assert_eq!(normalize_line(" 10%|#   |\r 50%|##  |\r100%|####|\n"), "100%|####|");
    }

    #[test]
    fn test_trims_whitespace() {
        assert_eq!(normalize_line("   -- Translating page 3  \r\n"), "-- Translating page 3");
    }

    #[test]
    fn test_invalid_utf8_is_kept() {
        let line = decode_line(b"page \xff done\n");
        assert!(line.starts_with("page "));
        assert!(line.ends_with(" done"));
    }
}
