//! Data model shared across the pipeline: the parsed coverage report, the
//! per-file gap detail, and the final analysis produced from the LLM
//! response. Everything is serde-serializable so a persisted `GapAnalysis`
//! round-trips losslessly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Compute a percentage, returning 0.0 when the total is zero.
#[must_use]
pub fn percentage(covered: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        covered as f64 / total as f64 * 100.0
    }
}

/// Round a percentage to two decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A repository returned by the search collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub owner: String,
    pub name: String,
    pub url: String,
    pub language: String,
}

/// Aggregate branch counts for one file or one whole project.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchTotals {
    pub total: u64,
    pub covered: u64,
    pub percentage: f64,
}

/// A branch group that contains at least one uncovered arm, keyed by the
/// group id from the raw artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchMarker {
    pub line: u32,
    pub covered: bool,
}

/// Detail for one branch group with uncovered arms, enriched with location
/// metadata from the artifact's `branchMap`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedBranch {
    pub line: u32,
    #[serde(rename = "type")]
    pub branch_type: String,
    /// Indices of the arms within the group that were never taken.
    pub uncovered_branches: Vec<usize>,
    /// Total number of arms in the group.
    pub total_branches: usize,
}

/// One source file whose branch coverage fell below the inclusion threshold.
///
/// Created by the parser; the enricher attaches `source_code` and `test_code`
/// exactly once, after which the entry is read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UncoveredFile {
    pub file_path: String,
    /// Statement ids with a zero hit count, parsed to integers.
    pub uncovered_lines: Vec<u32>,
    pub uncovered_branches: Vec<BranchMarker>,
    pub branch_coverage: Option<f64>,
    pub total_branches: u64,
    pub covered_branches: u64,
    pub detailed_branches: Vec<DetailedBranch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_code: Option<String>,
}

/// The structured coverage report for one project at one point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageReport {
    pub repository_name: String,
    pub total_lines: u64,
    pub covered_lines: u64,
    /// Line coverage percentage, rounded to 2 decimals; 0 when there are no
    /// statements.
    pub coverage_percentage: f64,
    /// Branch coverage percentage, rounded to 2 decimals; 100 when there are
    /// no branches at all.
    pub branch_coverage_percentage: f64,
    pub total_files: u64,
    /// Sorted ascending by branch coverage (worst first).
    pub uncovered_files: Vec<UncoveredFile>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installation_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_time_ms: Option<u64>,
}

/// A single uncovered-branch finding tied to a file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Gap {
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub lines: Vec<u32>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub code_snippet: String,
}

/// Risk tier assigned to a prioritized gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

/// A gap annotated with a risk tier and concrete suggested tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrioritizedGap {
    #[serde(default)]
    pub gap: Gap,
    pub priority: Priority,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub suggested_tests: Vec<String>,
}

/// Normalized response from the remote analysis service. Every field
/// defaults to its empty form so a partially-populated reply still parses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    #[serde(default)]
    pub analysis: String,
    #[serde(default, rename = "identifiedGaps")]
    pub identified_gaps: Vec<Gap>,
    #[serde(default)]
    pub prioritization: Vec<PrioritizedGap>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

/// Per-stage wall-clock durations for one pipeline run, in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimingBreakdown {
    pub clone_ms: u64,
    pub installation_ms: u64,
    pub test_ms: u64,
    pub code_extraction_ms: u64,
    pub llm_analysis_ms: u64,
}

impl TimingBreakdown {
    /// Total execution time across all stages.
    #[must_use]
    pub fn total_ms(&self) -> u64 {
        self.clone_ms
            + self.installation_ms
            + self.test_ms
            + self.code_extraction_ms
            + self.llm_analysis_ms
    }
}

/// The final output for one project run. Built once by the orchestrator,
/// persisted, never updated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GapAnalysis {
    pub repository_name: String,
    pub gaps: Vec<Gap>,
    pub prioritized_gaps: Vec<PrioritizedGap>,
    pub suggestions: Vec<String>,
    pub analysis_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timings: Option<TimingBreakdown>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_branch_coverage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_line_coverage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_files: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files_with_low_branch_coverage: Option<u64>,
    pub llm_model: String,
}
