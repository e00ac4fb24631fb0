//! Rendering of the coverage report into the analysis request sent to the
//! remote service, plus the fixed system instructions describing the
//! expected JSON response.

use std::fmt::Write;

use crate::model::CoverageReport;

/// Hard cap on the number of files rendered into one request. Files beyond
/// the cap are dropped, not summarized, to bound request size.
pub const MAX_PROMPT_FILES: usize = 5;

/// Sample of uncovered line numbers shown per file.
pub const MAX_SAMPLE_LINES: usize = 10;

/// Leading slice of the matched test file included per source file.
pub const MAX_TEST_CHARS: usize = 3000;

/// Fixed instructions describing the analyst role and the required JSON
/// response shape.
pub const SYSTEM_PROMPT: &str = r#"You are a senior software test engineering specialist with deep experience in:
- Code coverage analysis (branch, line, and function coverage)
- Identifying edge cases and untested scenarios
- Testing alternate paths (if/else, switch, loops)
- Testing complex boolean conditions (&&, ||, ternary operators)
- Assessing the quality of test suites

ANALYSIS CONTEXT:
You will receive files with LOW BRANCH COVERAGE (< 90%), together with:
1. The file's full source code
2. The existing tests (when available)
3. Branch coverage metrics (e.g. 80% = 4/5 branches covered)
4. Details of exactly which branches/conditions are NOT covered

YOUR MISSION:
Analyze each file in depth and identify precisely:
1. Which specific branches/conditions are not being tested
2. Why those branches matter (edge cases, validation, error handling)
3. How the current tests fail to reach those scenarios
4. Which SPECIFIC test cases should be added

CRITICAL RULES:
DO:
- Read the SOURCE CODE to understand the logic and locate branches
- Compare against the EXISTING TESTS to see what is missing
- Flag untested if/else arms, early returns, boundary validations
- Suggest SPECIFIC test cases with inputs and expected outputs
- Prioritize by RISK (critical > high > medium > low)

DO NOT:
- Invent generic problems
- Suggest tests for code that is already fully covered
- Be vague ("add more tests")
- Ignore the existing tests provided

RESPONSE STRUCTURE (JSON):
{
  "analysis": "Overall assessment of the coverage state and patterns found",
  "identifiedGaps": [
    {
      "file": "file name",
      "lines": [line numbers with uncovered branches],
      "description": "SPECIFIC description of the uncovered branch (e.g. 'else arm of if(x > 0) on line 45')",
      "code_snippet": "relevant code excerpt"
    }
  ],
  "prioritization": [
    {
      "gap": { "file": "...", "lines": [], "description": "...", "code_snippet": "..." },
      "priority": "CRITICAL|HIGH|MEDIUM|LOW",
      "reasoning": "Why this gap has this priority (consider: error handling, edge cases, data corruption, security)",
      "suggested_tests": [
        "SPECIFIC test 1: input X should return Y to cover branch Z",
        "SPECIFIC test 2: when condition W, expect behavior Q"
      ]
    }
  ],
  "recommendations": [
    "PRACTICAL, actionable recommendations to improve coverage",
    "Refactoring suggestions where the code resists testing"
  ]
}

BE PRECISE, TECHNICAL, AND ACTIONABLE. Every suggestion must be immediately implementable."#;

/// Render the coverage report into the analysis request text.
///
/// Includes at most [`MAX_PROMPT_FILES`] files (the report is already
/// sorted worst first), project-level totals up front, and the fixed
/// four-step instruction block at the end.
#[must_use]
pub fn build_analysis_prompt(report: &CoverageReport) -> String {
    let mut out = String::new();

    writeln!(out, "BRANCH COVERAGE ANALYSIS REPORT").unwrap();
    writeln!(out, "{}", "=".repeat(70)).unwrap();
    writeln!(out, "Repository: {}", report.repository_name).unwrap();
    writeln!(out, "Line coverage: {}%", report.coverage_percentage).unwrap();
    writeln!(
        out,
        "Total lines: {} ({} covered)",
        report.total_lines, report.covered_lines
    )
    .unwrap();
    writeln!(
        out,
        "Files with branch coverage < 90%: {}",
        report.uncovered_files.len()
    )
    .unwrap();
    writeln!(out, "{}", "=".repeat(70)).unwrap();

    for (idx, file) in report.uncovered_files.iter().take(MAX_PROMPT_FILES).enumerate() {
        let file_name = file
            .file_path
            .rsplit('/')
            .next()
            .unwrap_or(&file.file_path);

        writeln!(out, "\nFILE {}: {}", idx + 1, file_name).unwrap();
        writeln!(out, "{}", "-".repeat(70)).unwrap();

        writeln!(out, "\nMETRICS:").unwrap();
        let coverage = file
            .branch_coverage
            .map(|pct| format!("{pct:.1}"))
            .unwrap_or_else(|| "N/A".to_string());
        writeln!(
            out,
            "Branch coverage: {}% ({}/{} branches covered)",
            coverage, file.covered_branches, file.total_branches
        )
        .unwrap();

        if file.uncovered_lines.is_empty() {
            writeln!(out, "All lines are covered").unwrap();
        } else {
            let sample: Vec<String> = file
                .uncovered_lines
                .iter()
                .take(MAX_SAMPLE_LINES)
                .map(|l| l.to_string())
                .collect();
            let ellipsis = if file.uncovered_lines.len() > MAX_SAMPLE_LINES {
                "..."
            } else {
                ""
            };
            writeln!(
                out,
                "Uncovered lines: {}{}",
                sample.join(", "),
                ellipsis
            )
            .unwrap();
        }

        writeln!(out, "\nUNCOVERED BRANCHES:").unwrap();
        if file.detailed_branches.is_empty() {
            writeln!(out, "  No detailed branch information available").unwrap();
        } else {
            for branch in &file.detailed_branches {
                writeln!(
                    out,
                    "  - Line {}: type '{}' - {} of {} branches uncovered",
                    branch.line,
                    branch.branch_type,
                    branch.uncovered_branches.len(),
                    branch.total_branches
                )
                .unwrap();
            }
        }

        writeln!(out, "\nFULL SOURCE CODE:").unwrap();
        writeln!(out, "```javascript").unwrap();
        writeln!(
            out,
            "{}",
            file.source_code.as_deref().unwrap_or("Source not available")
        )
        .unwrap();
        writeln!(out, "```").unwrap();

        writeln!(out, "\nEXISTING TESTS:").unwrap();
        match &file.test_code {
            Some(tests) => {
                let truncated: String = tests.chars().take(MAX_TEST_CHARS).collect();
                writeln!(out, "```javascript\n{truncated}\n```").unwrap();
            }
            None => {
                writeln!(out, "NO TEST FILE FOUND - this is itself a critical problem!").unwrap();
            }
        }
    }

    writeln!(out, "\n{}", "=".repeat(70)).unwrap();
    writeln!(out, "ANALYSIS INSTRUCTIONS").unwrap();
    writeln!(out, "{}", "=".repeat(70)).unwrap();
    out.push_str(
        "\nFor EACH file above, you MUST:\n\
         \n\
         1. IDENTIFY THE SPECIFIC UNCOVERED BRANCHES\n\
         \x20  - Read the code and pinpoint exactly which if/else, switch, and ternary arms are untested\n\
         \x20  - Use the UNCOVERED BRANCHES information as your guide\n\
         \x20  - Cite line and branch type (e.g. \"line 45: else arm of the if is uncovered\")\n\
         \n\
         2. ANALYZE THE EXISTING TESTS\n\
         \x20  - See what is ALREADY being tested\n\
         \x20  - Explain why the uncovered branches are never reached\n\
         \x20  - Note the missing inputs/scenarios\n\
         \n\
         3. SUGGEST SPECIFIC TESTS\n\
         \x20  - For each uncovered branch, suggest ONE specific test\n\
         \x20  - Include: input, expected output, which branch it covers\n\
         \x20  - Be VERY specific (never generic)\n\
         \n\
         4. PRIORITIZE BY RISK\n\
         \x20  - CRITICAL: error handling, security, data corruption\n\
         \x20  - HIGH: important validations, critical edge cases\n\
         \x20  - MEDIUM: relevant alternate paths\n\
         \x20  - LOW: optimization/performance branches\n",
    );
    writeln!(
        out,
        "\nAnalyze ONLY the {} file(s) listed above. Do not invent problems.",
        report.uncovered_files.len().min(MAX_PROMPT_FILES)
    )
    .unwrap();
    writeln!(
        out,
        "\nRespond NOW as JSON with a detailed, actionable analysis."
    )
    .unwrap();

    out
}
