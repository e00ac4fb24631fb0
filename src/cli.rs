//! Console rendering for the covgap CLI.
//!
//! Each `render_*` function returns its output as a `String`, making them
//! easy to test without capturing stdout.

use std::fmt::Write;

use crate::model::{CoverageReport, GapAnalysis};

/// Files listed in the console coverage summary.
const MAX_LISTED_FILES: usize = 10;

/// Sample of uncovered line numbers shown per listed file.
const MAX_LISTED_LINES: usize = 5;

/// Human-readable summary of a parsed coverage report.
#[must_use]
pub fn render_coverage_report(report: &CoverageReport) -> String {
    let mut out = String::new();

    writeln!(out, "{}", "=".repeat(70)).unwrap();
    writeln!(out, "COVERAGE REPORT").unwrap();
    writeln!(out, "{}", "=".repeat(70)).unwrap();
    writeln!(out, "Repository:        {}", report.repository_name).unwrap();
    writeln!(out, "Line coverage:     {:.2}%", report.coverage_percentage).unwrap();
    writeln!(
        out,
        "Branch coverage:   {:.2}%",
        report.branch_coverage_percentage
    )
    .unwrap();
    writeln!(out, "Total lines:       {}", report.total_lines).unwrap();
    writeln!(out, "Covered lines:     {}", report.covered_lines).unwrap();
    writeln!(
        out,
        "Uncovered lines:   {}",
        report.total_lines - report.covered_lines
    )
    .unwrap();
    writeln!(out, "Total files:       {}", report.total_files).unwrap();
    writeln!(
        out,
        "Files below 90% branch coverage: {}",
        report.uncovered_files.len()
    )
    .unwrap();
    writeln!(out, "{}", "=".repeat(70)).unwrap();

    if report.uncovered_files.is_empty() {
        writeln!(out, "\nAll files have branch coverage >= 90%!").unwrap();
        return out;
    }

    writeln!(out, "\nFILES WITH LOW BRANCH COVERAGE (<90%):\n").unwrap();
    for (idx, file) in report.uncovered_files.iter().take(MAX_LISTED_FILES).enumerate() {
        let file_name = file
            .file_path
            .rsplit('/')
            .next()
            .unwrap_or(&file.file_path);
        let coverage = file
            .branch_coverage
            .map(|pct| format!("{pct:.1}"))
            .unwrap_or_else(|| "N/A".to_string());

        writeln!(out, "{}. {}", idx + 1, file_name).unwrap();
        writeln!(out, "   {}", file.file_path).unwrap();
        writeln!(
            out,
            "   Branch coverage: {}% ({}/{})",
            coverage, file.covered_branches, file.total_branches
        )
        .unwrap();

        if !file.uncovered_lines.is_empty() {
            let sample: Vec<String> = file
                .uncovered_lines
                .iter()
                .take(MAX_LISTED_LINES)
                .map(|l| l.to_string())
                .collect();
            let ellipsis = if file.uncovered_lines.len() > MAX_LISTED_LINES {
                "..."
            } else {
                ""
            };
            writeln!(
                out,
                "   {} uncovered line(s): {}{}",
                file.uncovered_lines.len(),
                sample.join(", "),
                ellipsis
            )
            .unwrap();
        }
        out.push('\n');
    }

    if report.uncovered_files.len() > MAX_LISTED_FILES {
        writeln!(
            out,
            "   ... and {} more files\n",
            report.uncovered_files.len() - MAX_LISTED_FILES
        )
        .unwrap();
    }

    out
}

/// Human-readable summary of a finished gap analysis.
#[must_use]
pub fn render_analysis(analysis: &GapAnalysis) -> String {
    let mut out = String::new();

    writeln!(out, "{}", "=".repeat(60)).unwrap();
    writeln!(out, "RESULTS: {}", analysis.repository_name).unwrap();
    writeln!(out, "{}", "=".repeat(60)).unwrap();
    writeln!(out, "Identified gaps:  {}", analysis.gaps.len()).unwrap();
    writeln!(out, "Prioritized gaps: {}", analysis.prioritized_gaps.len()).unwrap();
    writeln!(out, "Suggestions:      {}", analysis.suggestions.len()).unwrap();
    if let Some(ref timings) = analysis.timings {
        writeln!(
            out,
            "Total time:       {:.2}s",
            timings.total_ms() as f64 / 1000.0
        )
        .unwrap();
    }
    writeln!(out, "{}", "=".repeat(60)).unwrap();

    if !analysis.prioritized_gaps.is_empty() {
        writeln!(out, "\nTOP PRIORITIZED GAPS:\n").unwrap();
        for (idx, gap) in analysis.prioritized_gaps.iter().take(3).enumerate() {
            writeln!(out, "{}. [{:?}]", idx + 1, gap.priority).unwrap();
            writeln!(out, "   Reason: {}", gap.reasoning).unwrap();
            if !gap.suggested_tests.is_empty() {
                writeln!(out, "   Suggested tests:").unwrap();
                for test in &gap.suggested_tests {
                    writeln!(out, "     - {test}").unwrap();
                }
            }
            out.push('\n');
        }
    }

    if !analysis.suggestions.is_empty() {
        writeln!(out, "GENERAL RECOMMENDATIONS:\n").unwrap();
        for (idx, suggestion) in analysis.suggestions.iter().enumerate() {
            writeln!(out, "{}. {}", idx + 1, suggestion).unwrap();
        }
    }

    writeln!(out, "\n{}", "=".repeat(60)).unwrap();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Gap, Priority, PrioritizedGap, TimingBreakdown, UncoveredFile};
    use chrono::Utc;

    fn uncovered_file(path: &str, coverage: f64) -> UncoveredFile {
        UncoveredFile {
            file_path: path.to_string(),
            uncovered_lines: vec![3, 4, 7, 9, 12, 15],
            uncovered_branches: vec![],
            branch_coverage: Some(coverage),
            total_branches: 8,
            covered_branches: 4,
            detailed_branches: vec![],
            source_code: None,
            test_code: None,
        }
    }

    fn report(files: Vec<UncoveredFile>) -> CoverageReport {
        CoverageReport {
            repository_name: "demo".to_string(),
            total_lines: 200,
            covered_lines: 150,
            coverage_percentage: 75.0,
            branch_coverage_percentage: 50.0,
            total_files: 20,
            uncovered_files: files,
            timestamp: Utc::now(),
            installation_time_ms: None,
            test_time_ms: None,
        }
    }

    #[test]
    fn test_render_coverage_report_totals() {
        let out = render_coverage_report(&report(vec![uncovered_file("src/a.js", 50.0)]));

        assert!(out.contains("Repository:        demo"));
        assert!(out.contains("Line coverage:     75.00%"));
        assert!(out.contains("Branch coverage:   50.00%"));
        assert!(out.contains("Uncovered lines:   50"));
        assert!(out.contains("Files below 90% branch coverage: 1"));
        // 6 uncovered lines → 5 samples and an ellipsis.
        assert!(out.contains("6 uncovered line(s): 3, 4, 7, 9, 12..."));
    }

    #[test]
    fn test_render_coverage_report_fully_covered() {
        let out = render_coverage_report(&report(vec![]));
        assert!(out.contains("All files have branch coverage >= 90%!"));
        assert!(!out.contains("FILES WITH LOW BRANCH COVERAGE"));
    }

    #[test]
    fn test_render_coverage_report_caps_listing() {
        let files: Vec<_> = (0..14)
            .map(|i| uncovered_file(&format!("src/f{i}.js"), 40.0))
            .collect();
        let out = render_coverage_report(&report(files));

        assert!(out.contains("10. f9.js"));
        assert!(!out.contains("11. f10.js"));
        assert!(out.contains("... and 4 more files"));
    }

    #[test]
    fn test_render_analysis() {
        let analysis = GapAnalysis {
            repository_name: "demo".to_string(),
            gaps: vec![Gap::default()],
            prioritized_gaps: vec![PrioritizedGap {
                gap: Gap::default(),
                priority: Priority::Critical,
                reasoning: "unvalidated input".to_string(),
                suggested_tests: vec!["call with empty payload".to_string()],
            }],
            suggestions: vec!["test error paths".to_string()],
            analysis_date: Utc::now(),
            timings: Some(TimingBreakdown {
                clone_ms: 500,
                installation_ms: 500,
                test_ms: 500,
                code_extraction_ms: 250,
                llm_analysis_ms: 250,
            }),
            initial_branch_coverage: Some(50.0),
            initial_line_coverage: Some(75.0),
            total_files: Some(20),
            files_with_low_branch_coverage: Some(1),
            llm_model: "gpt-4o".to_string(),
        };

        let out = render_analysis(&analysis);
        assert!(out.contains("RESULTS: demo"));
        assert!(out.contains("Identified gaps:  1"));
        assert!(out.contains("[Critical]"));
        assert!(out.contains("Reason: unvalidated input"));
        assert!(out.contains("- call with empty payload"));
        assert!(out.contains("1. test error paths"));
        assert!(out.contains("Total time:       2.00s"));
    }
}
