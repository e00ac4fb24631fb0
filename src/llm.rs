//! Remote analysis providers and response normalization.
//!
//! The orchestrator depends only on [`AnalysisProvider`]; the OpenAI and
//! Anthropic backends are selected from configuration at startup. Responses
//! are free-form text expected to contain one JSON object, optionally
//! wrapped in a markdown fence, and are normalized into [`LlmResponse`]
//! with missing fields defaulted rather than rejected.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::config::{Config, Provider};
use crate::error::{CovgapError, Result};
use crate::logcap::RunLog;
use crate::model::{CoverageReport, LlmResponse};
use crate::prompt::{build_analysis_prompt, MAX_PROMPT_FILES, SYSTEM_PROMPT};

const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const ANTHROPIC_MAX_TOKENS: u32 = 8192;

/// Characters of the offending response included in a parse error.
const PARSE_ERROR_PREVIEW_CHARS: usize = 500;

/// Canned analysis returned when there is nothing to analyze.
const FULLY_COVERED_ANALYSIS: &str =
    "The project has no files below the branch coverage threshold. There are no gaps to analyze.";
const FULLY_COVERED_RECOMMENDATIONS: [&str; 2] = [
    "Keep coverage high with continuous testing.",
    "Consider mutation testing to validate the quality of the test suite.",
];

/// A remote completion backend.
pub trait AnalysisProvider {
    /// Send one system-instructed completion request and return the raw
    /// response text.
    fn complete(&self, system: &str, user: &str) -> Result<String>;

    /// Identifier of the underlying model, recorded in the final analysis.
    fn model(&self) -> &str;
}

/// Build the provider selected by the configuration.
pub fn provider_from_config(config: &Config) -> Result<Box<dyn AnalysisProvider>> {
    match config.provider {
        Provider::OpenAi => {
            let api_key = config.openai_api_key.clone().ok_or_else(|| {
                CovgapError::Config("OPENAI_API_KEY is not configured".to_string())
            })?;
            Ok(Box::new(OpenAiProvider {
                api_key,
                model: config.openai_model.clone(),
            }))
        }
        Provider::Anthropic => {
            let api_key = config.anthropic_api_key.clone().ok_or_else(|| {
                CovgapError::Config("ANTHROPIC_API_KEY is not configured".to_string())
            })?;
            Ok(Box::new(AnthropicProvider {
                api_key,
                model: config.anthropic_model.clone(),
            }))
        }
    }
}

/// OpenAI chat-completions backend.
pub struct OpenAiProvider {
    api_key: String,
    model: String,
}

impl AnalysisProvider for OpenAiProvider {
    fn complete(&self, system: &str, user: &str) -> Result<String> {
        let resp = ureq::post(OPENAI_URL)
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .send_json(serde_json::json!({
                "model": self.model,
                "messages": [
                    { "role": "system", "content": system },
                    { "role": "user", "content": user },
                ],
                "response_format": { "type": "json_object" },
            }));

        let body: Value = read_response("OpenAI", resp)?;
        body.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| CovgapError::Remote("OpenAI response contained no content".to_string()))
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Anthropic messages backend.
pub struct AnthropicProvider {
    api_key: String,
    model: String,
}

impl AnalysisProvider for AnthropicProvider {
    fn complete(&self, system: &str, user: &str) -> Result<String> {
        // The messages API has no JSON response mode, so the constraint is
        // restated at the end of the user turn.
        let user = format!(
            "{user}\n\nImportant: respond with a single valid JSON object and nothing else, \
             no text before or after the JSON."
        );

        let resp = ureq::post(ANTHROPIC_URL)
            .set("x-api-key", &self.api_key)
            .set("anthropic-version", ANTHROPIC_VERSION)
            .send_json(serde_json::json!({
                "model": self.model,
                "max_tokens": ANTHROPIC_MAX_TOKENS,
                "system": system,
                "messages": [
                    { "role": "user", "content": user },
                ],
            }));

        let body: Value = read_response("Anthropic", resp)?;
        body.get("content")
            .and_then(|c| c.get(0))
            .and_then(|block| block.get("text"))
            .and_then(|t| t.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| {
                CovgapError::Remote("Anthropic response contained no text block".to_string())
            })
    }

    fn model(&self) -> &str {
        &self.model
    }
}

fn read_response(
    service: &str,
    resp: std::result::Result<ureq::Response, ureq::Error>,
) -> Result<Value> {
    match resp {
        Ok(resp) => resp
            .into_json()
            .map_err(|e| CovgapError::Remote(format!("{service} returned invalid JSON: {e}"))),
        Err(ureq::Error::Status(code, resp)) => {
            let body = resp.into_string().unwrap_or_default();
            Err(CovgapError::Remote(format!(
                "{service} API error (HTTP {code}): {body}"
            )))
        }
        Err(e) => Err(CovgapError::Remote(format!("{service} request failed: {e}"))),
    }
}

/// Extract the JSON object from a response, tolerating a ```json fence,
/// and normalize it with missing fields defaulted.
pub fn parse_llm_response(raw: &str) -> Result<LlmResponse> {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let fence = FENCE.get_or_init(|| Regex::new(r"(?s)```json\n?(.*?)\n?```").unwrap());

    let body = fence
        .captures(raw)
        .and_then(|captures| captures.get(1))
        .map_or(raw, |m| m.as_str());

    serde_json::from_str(body).map_err(|_| CovgapError::ResponseParse {
        preview: body.chars().take(PARSE_ERROR_PREVIEW_CHARS).collect(),
    })
}

/// Run the remote analysis for one coverage report.
///
/// A report with no under-covered files short-circuits to a canned
/// fully-covered response; the provider is never called in that case.
pub fn analyze_gaps(
    provider: &dyn AnalysisProvider,
    report: &CoverageReport,
    log: &RunLog,
) -> Result<LlmResponse> {
    if report.uncovered_files.is_empty() {
        log.info("No coverage gaps found, skipping remote analysis");
        return Ok(LlmResponse {
            analysis: FULLY_COVERED_ANALYSIS.to_string(),
            identified_gaps: vec![],
            prioritization: vec![],
            recommendations: FULLY_COVERED_RECOMMENDATIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        });
    }

    log_selected_files(report, log);

    let prompt = build_analysis_prompt(report);
    let raw = provider.complete(SYSTEM_PROMPT, &prompt)?;
    log.info(format!("Received analysis response ({} chars)", raw.len()));

    parse_llm_response(&raw)
}

fn log_selected_files(report: &CoverageReport, log: &RunLog) {
    let total = report.uncovered_files.len();
    let selected = total.min(MAX_PROMPT_FILES);

    log.info(format!(
        "Files with branch coverage < 90%: {total}, sending {selected} for analysis"
    ));
    if total > MAX_PROMPT_FILES {
        log.info(format!(
            "Limiting the request to {MAX_PROMPT_FILES} files to bound its size"
        ));
    }

    for (idx, file) in report.uncovered_files.iter().take(selected).enumerate() {
        let coverage = file
            .branch_coverage
            .map(|pct| format!("{pct:.1}%"))
            .unwrap_or_else(|| "N/A".to_string());
        let test_status = if file.test_code.is_some() {
            "test found"
        } else {
            "no test found"
        };
        log.info(format!(
            "{}. {} ({} branch coverage, {}/{} branches, {})",
            idx + 1,
            file.file_path,
            coverage,
            file.covered_branches,
            file.total_branches,
            test_status
        ));
    }
}
