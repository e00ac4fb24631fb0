//! Per-run log transcript capture.
//!
//! Every pipeline component writes human-readable progress through a
//! [`RunLog`]. Lines are forwarded to the `tracing` subscriber for live
//! output and buffered so that the orchestrator can persist the full
//! transcript of a run next to the analysis report. The buffer is cleared
//! at the start of each run, so transcripts of consecutive runs are
//! disjoint.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Buffering log sink, cheap to clone and share across components.
#[derive(Debug, Clone, Default)]
pub struct RunLog {
    lines: Arc<Mutex<Vec<String>>>,
}

impl RunLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.record(Level::INFO, message.as_ref());
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        self.record(Level::WARN, message.as_ref());
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.record(Level::ERROR, message.as_ref());
    }

    /// Start a new capture scope, discarding any previously buffered lines.
    pub fn begin_run(&self) {
        self.lines.lock().unwrap().clear();
    }

    /// The buffered transcript, one timestamped line per entry.
    #[must_use]
    pub fn transcript(&self) -> String {
        self.lines.lock().unwrap().join("\n")
    }

    fn record(&self, level: Level, message: &str) {
        match level {
            Level::WARN => tracing::warn!("{message}"),
            Level::ERROR => tracing::error!("{message}"),
            _ => tracing::info!("{message}"),
        }
        let line = format!("[{}] [{}] {}", Utc::now().to_rfc3339(), level, message);
        self.lines.lock().unwrap().push(line);
    }
}

/// Initialize the global `tracing` subscriber. Honors `RUST_LOG`, defaults
/// to `info`, writes to stderr so stdout stays clean for summaries.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_collects_lines() {
        let log = RunLog::new();
        log.info("first");
        log.warn("second");

        let transcript = log.transcript();
        assert!(transcript.contains("[INFO] first"));
        assert!(transcript.contains("[WARN] second"));
        assert_eq!(transcript.lines().count(), 2);
    }

    #[test]
    fn test_begin_run_resets_scope() {
        let log = RunLog::new();
        log.info("old run");
        log.begin_run();
        log.info("new run");

        let transcript = log.transcript();
        assert!(!transcript.contains("old run"));
        assert!(transcript.contains("new run"));
    }

    #[test]
    fn test_clones_share_buffer() {
        let log = RunLog::new();
        let other = log.clone();
        other.info("shared");
        assert!(log.transcript().contains("shared"));
    }
}
