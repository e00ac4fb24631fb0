//! Parsing and aggregation of Istanbul / NYC `coverage-final.json` artifacts.
//!
//! The artifact is a JSON object keyed by file path. Each value contains:
//!   - `s`:         `{ "0": 5, "1": 0, ... }` — hit counts per statement
//!   - `b`:         `{ "0": [5, 0], ... }` — hit counts per branch arm
//!   - `branchMap`: `{ "0": { "line": 12, "type": "if", ... }, ... }`
//!
//! This module turns those counters into a [`CoverageReport`]: project-wide
//! totals plus the list of files whose branch coverage falls below the
//! inclusion threshold, sorted worst first. No I/O happens here.

use serde_json::{Map, Value};

use crate::error::{CovgapError, Result};
use crate::model::{
    percentage, round2, BranchMarker, BranchTotals, CoverageReport, DetailedBranch, UncoveredFile,
};

/// Files with branch coverage strictly below this are included in the
/// report. Policy constant, deliberately not configurable.
pub const LOW_BRANCH_COVERAGE_THRESHOLD: f64 = 90.0;

fn empty_map() -> &'static Map<String, Value> {
    static EMPTY: std::sync::OnceLock<Map<String, Value>> = std::sync::OnceLock::new();
    EMPTY.get_or_init(Map::new)
}

/// Aggregate branch-arm counts across all groups of one file.
///
/// A file with no branch arms at all is vacuously fully covered: the
/// percentage is 100, not 0. Downstream filtering relies on this.
#[must_use]
pub fn branch_totals(branches: &Map<String, Value>) -> BranchTotals {
    let mut total = 0u64;
    let mut covered = 0u64;

    for counts in branches.values() {
        let Some(arms) = counts.as_array() else {
            continue;
        };
        for arm in arms {
            total += 1;
            if arm.as_u64().unwrap_or(0) > 0 {
                covered += 1;
            }
        }
    }

    let percentage = if total == 0 {
        100.0
    } else {
        covered as f64 / total as f64 * 100.0
    };

    BranchTotals {
        total,
        covered,
        percentage,
    }
}

/// Parse a whole-project coverage artifact into a [`CoverageReport`].
///
/// Fails with [`CovgapError::MalformedArtifact`] when the top level is not
/// a JSON object; per-file entries missing `s`, `b`, or `branchMap` are
/// treated as having empty maps.
pub fn parse_report(raw: &Value, project: &str) -> Result<CoverageReport> {
    let entries = raw.as_object().ok_or_else(|| {
        CovgapError::MalformedArtifact("expected a JSON object keyed by file path".to_string())
    })?;

    let mut total_lines = 0u64;
    let mut covered_lines = 0u64;
    let mut total_branches = 0u64;
    let mut covered_branches = 0u64;
    let mut total_files = 0u64;
    let mut low_coverage: Vec<UncoveredFile> = Vec::new();

    for (file_path, entry) in entries {
        total_files += 1;

        let statements = object_field(entry, "s");
        let branches = object_field(entry, "b");

        total_lines += statements.len() as u64;
        covered_lines += statements
            .values()
            .filter(|count| count.as_u64().unwrap_or(0) > 0)
            .count() as u64;

        let totals = branch_totals(branches);
        total_branches += totals.total;
        covered_branches += totals.covered;

        if totals.percentage < LOW_BRANCH_COVERAGE_THRESHOLD {
            let branch_map = object_field(entry, "branchMap");
            low_coverage.push(build_uncovered_file(
                file_path, statements, branches, branch_map, totals,
            ));
        }
    }

    // Worst branch coverage first, so downstream analysis (which is capped)
    // sees the riskiest files.
    low_coverage.sort_by(|a, b| {
        a.branch_coverage
            .unwrap_or(100.0)
            .total_cmp(&b.branch_coverage.unwrap_or(100.0))
    });

    Ok(CoverageReport {
        repository_name: project.to_string(),
        total_lines,
        covered_lines,
        coverage_percentage: round2(percentage(covered_lines, total_lines)),
        branch_coverage_percentage: if total_branches == 0 {
            100.0
        } else {
            round2(percentage(covered_branches, total_branches))
        },
        total_files,
        uncovered_files: low_coverage,
        timestamp: chrono::Utc::now(),
        installation_time_ms: None,
        test_time_ms: None,
    })
}

fn object_field<'a>(entry: &'a Value, key: &str) -> &'a Map<String, Value> {
    entry
        .get(key)
        .and_then(Value::as_object)
        .unwrap_or_else(|| empty_map())
}

fn build_uncovered_file(
    file_path: &str,
    statements: &Map<String, Value>,
    branches: &Map<String, Value>,
    branch_map: &Map<String, Value>,
    totals: BranchTotals,
) -> UncoveredFile {
    let mut uncovered_lines: Vec<u32> = statements
        .iter()
        .filter(|(_, count)| count.as_u64().unwrap_or(0) == 0)
        .filter_map(|(id, _)| id.parse().ok())
        .collect();
    uncovered_lines.sort_unstable();

    UncoveredFile {
        file_path: file_path.to_string(),
        uncovered_lines,
        uncovered_branches: branch_markers(branches),
        branch_coverage: Some(totals.percentage),
        total_branches: totals.total,
        covered_branches: totals.covered,
        detailed_branches: detailed_branches(branches, branch_map),
        source_code: None,
        test_code: None,
    }
}

/// Flat markers for branch groups containing at least one untaken arm.
fn branch_markers(branches: &Map<String, Value>) -> Vec<BranchMarker> {
    let mut markers: Vec<BranchMarker> = branches
        .iter()
        .filter_map(|(group_id, counts)| {
            let arms = counts.as_array()?;
            let any_uncovered = arms.iter().any(|arm| arm.as_u64().unwrap_or(0) == 0);
            if !any_uncovered {
                return None;
            }
            Some(BranchMarker {
                line: group_id.parse().unwrap_or(0),
                covered: false,
            })
        })
        .collect();
    markers.sort_by_key(|m| m.line);
    markers
}

/// Per-group breakdown of uncovered arms, with line/type pulled from
/// `branchMap`. Groups without metadata are skipped: instrumenters may omit
/// entries for synthetic branches.
fn detailed_branches(
    branches: &Map<String, Value>,
    branch_map: &Map<String, Value>,
) -> Vec<DetailedBranch> {
    let mut detailed: Vec<DetailedBranch> = branches
        .iter()
        .filter_map(|(group_id, counts)| {
            let arms = counts.as_array()?;
            let uncovered: Vec<usize> = arms
                .iter()
                .enumerate()
                .filter(|(_, arm)| arm.as_u64().unwrap_or(0) == 0)
                .map(|(idx, _)| idx)
                .collect();
            if uncovered.is_empty() {
                return None;
            }

            let info = branch_map.get(group_id)?;
            Some(DetailedBranch {
                line: info.get("line").and_then(|l| l.as_u64()).unwrap_or(0) as u32,
                branch_type: info
                    .get("type")
                    .and_then(|t| t.as_str())
                    .unwrap_or("unknown")
                    .to_string(),
                uncovered_branches: uncovered,
                total_branches: arms.len(),
            })
        })
        .collect();
    detailed.sort_by_key(|b| b.line);
    detailed
}
