//! On-disk persistence of analysis reports (pretty JSON) and run
//! transcripts (plain text). File names are derived deterministically from
//! the project name, the model identifier, and a timestamp.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::model::GapAnalysis;

/// Writes run outputs under a fixed reports directory.
pub struct ReportStore {
    reports_dir: PathBuf,
}

impl ReportStore {
    #[must_use]
    pub fn new(reports_dir: impl Into<PathBuf>) -> Self {
        Self {
            reports_dir: reports_dir.into(),
        }
    }

    /// Persist a finished analysis as pretty-printed JSON, returning the
    /// path written.
    pub fn save_analysis(&self, analysis: &GapAnalysis) -> Result<PathBuf> {
        let path = self.reports_dir.join(format!(
            "{}.json",
            file_stem(
                &analysis.repository_name,
                &analysis.llm_model,
                analysis.analysis_date
            )
        ));
        write_json(&path, analysis)?;
        Ok(path)
    }

    /// Persist the captured log transcript of a run next to its report.
    pub fn save_transcript(
        &self,
        project: &str,
        model: &str,
        timestamp: DateTime<Utc>,
        transcript: &str,
    ) -> Result<PathBuf> {
        let path = self
            .reports_dir
            .join(format!("{}.log", file_stem(project, model, timestamp)));
        write_text(&path, transcript)?;
        Ok(path)
    }
}

/// `{project}_{model}_{timestamp}`, with `:` and `.` in the timestamp
/// replaced so the name is filesystem-safe everywhere.
fn file_stem(project: &str, model: &str, timestamp: DateTime<Utc>) -> String {
    let stamp = timestamp
        .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("{project}_{model}_{stamp}")
}

fn write_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let body = serde_json::to_string_pretty(data)?;
    std::fs::write(path, body)?;
    Ok(())
}

fn write_text(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}
