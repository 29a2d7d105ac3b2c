//! Append-only engine journal.
//!
//! One timestamped line per pipeline action, mirroring what the phase
//! commands print, so a session directory explains itself after the fact.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};

pub const JOURNAL_FILE: &str = "engine_log.txt";

/// Timestamped append-only log under the logs directory.
#[derive(Debug, Clone)]
pub struct Journal {
    path: PathBuf,
}

impl Journal {
    #[must_use]
    pub fn new(logs_dir: &Path) -> Self {
        Self {
            path: logs_dir.join(JOURNAL_FILE),
        }
    }

    /// Append one line. Journal failures are reported, not fatal; the
    /// caller decides whether to continue.
    pub fn append(&self, message: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let stamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, false);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "[{stamp}] {message}")
    }

    /// Append and mirror to the log facade; journal errors degrade to a
    /// warning instead of aborting the phase.
    pub fn record(&self, message: &str) {
        log::info!("{message}");
        if let Err(err) = self.append(message) {
            log::warn!("journal write failed: {err}");
        }
    }
}
