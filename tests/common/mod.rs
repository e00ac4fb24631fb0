//! Shared stub collaborators for pipeline integration tests.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use covgap::config::{Config, Provider};
use covgap::error::{CovgapError, Result};
use covgap::github::RepoHost;
use covgap::llm::AnalysisProvider;
use covgap::model::Repository;
use covgap::runner::{load_artifact, CoverageArtifact, CoverageRunner};
use covgap::logcap::RunLog;

/// A configuration pointing all output at a test directory.
pub fn test_config(reports_dir: &Path, repos_dir: &Path) -> Config {
    Config {
        provider: Provider::OpenAi,
        openai_api_key: Some("test-key".to_string()),
        anthropic_api_key: None,
        github_token: None,
        openai_model: "stub-model".to_string(),
        anthropic_model: "unused".to_string(),
        repos_dir: repos_dir.to_path_buf(),
        reports_dir: reports_dir.to_path_buf(),
    }
}

/// Fake repository host: search returns a fixed candidate list, and clone
/// materializes a checkout containing the given coverage artifact. Cloning
/// a repository named in `fail_clone_for` fails with a fetch error.
pub struct StubHost {
    pub repos: Vec<Repository>,
    pub artifact_json: String,
    pub fail_clone_for: Option<String>,
}

pub fn repo(owner: &str, name: &str) -> Repository {
    Repository {
        owner: owner.to_string(),
        name: name.to_string(),
        url: format!("https://github.com/{owner}/{name}"),
        language: "JavaScript".to_string(),
    }
}

impl RepoHost for StubHost {
    fn search(&self, _language: &str, _min_stars: u32, _limit: u32) -> Result<Vec<Repository>> {
        Ok(self.repos.clone())
    }

    fn clone_repo(&self, owner: &str, name: &str, dest: &Path) -> Result<PathBuf> {
        if self.fail_clone_for.as_deref() == Some(name) {
            return Err(CovgapError::Fetch(format!(
                "git clone of {owner}/{name} failed: simulated network error"
            )));
        }

        let checkout = dest.join(name);
        std::fs::create_dir_all(checkout.join("coverage")).unwrap();
        std::fs::write(checkout.join("package.json"), "{}").unwrap();
        std::fs::write(
            checkout.join("coverage/coverage-final.json"),
            &self.artifact_json,
        )
        .unwrap();
        Ok(checkout)
    }
}

/// Runner that skips the external npm/test processes and just loads the
/// artifact already present in the checkout.
pub struct StubRunner;

impl CoverageRunner for StubRunner {
    fn run(&self, project_dir: &Path, _log: &RunLog) -> Result<CoverageArtifact> {
        Ok(CoverageArtifact {
            raw: load_artifact(project_dir)?,
            install_ms: 5,
            test_ms: 7,
        })
    }
}

/// Provider returning a fixed response and counting how often it is called.
pub struct StubProvider {
    pub response: String,
    pub calls: Arc<AtomicUsize>,
}

impl StubProvider {
    pub fn new(response: &str) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                response: response.to_string(),
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }
}

impl AnalysisProvider for StubProvider {
    fn complete(&self, _system: &str, _user: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }

    fn model(&self) -> &str {
        "stub-model"
    }
}

/// An artifact with one file at 50% branch coverage.
pub const LOW_COVERAGE_ARTIFACT: &str = r#"{
    "src/app.js": {
        "s": { "1": 1, "2": 0 },
        "b": { "b1": [1, 0] },
        "branchMap": { "b1": { "line": 2, "type": "if" } }
    }
}"#;

/// An artifact where every branch arm was taken.
pub const FULLY_COVERED_ARTIFACT: &str = r#"{
    "src/app.js": {
        "s": { "1": 4, "2": 2 },
        "b": { "b1": [3, 1] },
        "branchMap": { "b1": { "line": 2, "type": "if" } }
    }
}"#;

/// A minimal valid analysis response for the stub provider.
pub const STUB_RESPONSE: &str = r#"{
    "analysis": "one gap found",
    "identifiedGaps": [
        { "file": "src/app.js", "lines": [2], "description": "else arm of the if on line 2", "code_snippet": "if (x) {}" }
    ],
    "prioritization": [
        {
            "gap": { "file": "src/app.js", "lines": [2], "description": "else arm", "code_snippet": "" },
            "priority": "HIGH",
            "reasoning": "input validation",
            "suggested_tests": ["call with a falsy argument"]
        }
    ],
    "recommendations": ["cover the falsy path"]
}"#;
