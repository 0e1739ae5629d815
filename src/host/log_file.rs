//! Per-run log files
//!
//! One file per run, named after the local start time. Write failures are
//! reported once and then the log goes quiet; they never stop the run.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use super::RunOutcome;

/// Log file for one translator run
pub struct RunLog {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl RunLog {
    /// File name for a run started at `at`
    pub fn file_name(at: DateTime<Local>) -> String {
        format!("translation-{}.log", at.format("%Y%m%d-%H%M%S"))
    }

    /// Create the log file in `dir` and write the header
    pub fn create(dir: &Path, command: &str) -> std::io::Result<Self> {
        fs::create_dir_all(dir)?;

        let now = Local::now();
        let base = Self::file_name(now);
        let (path, file) = Self::open_unique(dir, &base)?;

        let mut writer = BufWriter::new(file);
        writeln!(writer, "# Started: {}", now.format("%Y-%m-%d %H:%M:%S %z"))?;
        writeln!(writer, "# Command: {}", command)?;
        writeln!(writer)?;
        writer.flush()?;

        tracing::info!("Writing run log to {}", path.display());
        Ok(Self {
            path,
            writer: Some(writer),
        })
    }

    /// Two runs in the same second get `-1`, `-2`, ... suffixes
    fn open_unique(dir: &Path, base: &str) -> std::io::Result<(PathBuf, File)> {
        let stem = base.trim_end_matches(".log");
        let mut attempt = 0;
        loop {
            let name = if attempt == 0 {
                base.to_string()
            } else {
                format!("{}-{}.log", stem, attempt)
            };
            let path = dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && attempt < 100 => {
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one console line
    pub fn write_line(&mut self, line: &str) {
        let Some(writer) = self.writer.as_mut() else {
            return;
        };

        if let Err(e) = writeln!(writer, "{}", line) {
            tracing::warn!("Log write to {} failed, disabling: {}", self.path.display(), e);
            self.writer = None;
        }
    }

    /// Write the footer and close the file
    pub fn finish(mut self, outcome: &RunOutcome) {
        self.write_line("");
        self.write_line(&format!(
            "# Finished: {} ({:.1}s)",
            Local::now().format("%Y-%m-%d %H:%M:%S %z"),
            outcome.elapsed.as_secs_f64()
        ));
        self.write_line(&format!("# {}", outcome.summary()));

        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.flush() {
                tracing::warn!("Failed to flush {}: {}", self.path.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_file_name_format() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(RunLog::file_name(at), "translation-20240309-070501.log");
    }

    #[test]
    fn test_header_lines_and_footer() {
        let dir = TempDir::new().unwrap();
        let logs = dir.path().join("logs");

        let command = "uv run python -m manga_translator local -i /in";
        let mut log = RunLog::create(&logs, command).unwrap();
        log.write_line("[INFO] page 1");
        log.write_line("[INFO] page 2");
        let path = log.path().to_path_buf();
        log.finish(&RunOutcome {
            exit_code: 0,
            cancelled: false,
            elapsed: Duration::from_secs(2),
        });

        let content = fs::read_to_string(path).unwrap();
        assert!(content.contains("# Command: uv run python -m manga_translator local -i /in"));
        assert!(content.contains("[INFO] page 1\n[INFO] page 2\n"));
        assert!(content.contains("# Translation completed, return code: 0"));
    }

    #[test]
    fn test_same_second_gets_suffix() {
        let dir = TempDir::new().unwrap();
        let (first, _) = RunLog::open_unique(dir.path(), "translation-x.log").unwrap();
        let (second, _) = RunLog::open_unique(dir.path(), "translation-x.log").unwrap();

        assert_ne!(first, second);
        assert!(second.ends_with("translation-x-1.log"));
    }

    #[test]
    fn test_write_failure_disables_log() {
        let dir = TempDir::new().unwrap();
        let mut log = RunLog::create(dir.path(), "sh -c true").unwrap();
        let path = log.path().to_path_buf();

        // Read-only handle with no buffering, so the next write fails
        log.writer = Some(BufWriter::with_capacity(0, File::open(&path).unwrap()));
        log.write_line("lost");
        assert!(log.writer.is_none());

        log.write_line("also lost");
        log.finish(&RunOutcome {
            exit_code: 0,
            cancelled: false,
            elapsed: Duration::ZERO,
        });

        let content = fs::read_to_string(path).unwrap();
        assert!(content.starts_with("# Started:"));
        assert!(!content.contains("lost"));
    }

    #[test]
    fn test_failed_summary() {
        let outcome = RunOutcome {
            exit_code: -1,
            cancelled: true,
            elapsed: Duration::ZERO,
        };
        assert_eq!(
            outcome.summary(),
            "Translation interrupted or failed, return code: -1"
        );
    }
}
