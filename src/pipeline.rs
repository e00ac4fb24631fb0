//! Sequencing of one analysis run: fetch → measure → enrich → analyze →
//! persist, with per-stage timing, and the batch driver that isolates
//! per-repository failures.

use std::path::Path;
use std::time::{Duration, Instant};

use chrono::Utc;

use crate::cli::render_coverage_report;
use crate::config::Config;
use crate::coverage::parse_report;
use crate::enrich::enrich_with_sources;
use crate::error::Result;
use crate::github::RepoHost;
use crate::llm::{analyze_gaps, AnalysisProvider};
use crate::logcap::RunLog;
use crate::model::{GapAnalysis, TimingBreakdown};
use crate::runner::CoverageRunner;
use crate::store::ReportStore;

/// Throttle between consecutive repository analyses in batch mode, to avoid
/// hammering the search and analysis services back-to-back.
pub const INTER_REPO_DELAY: Duration = Duration::from_secs(2);

/// Result of a batch run: the successful analyses, in discovery order, plus
/// how many candidates were attempted in total.
pub struct BatchOutcome {
    pub analyses: Vec<GapAnalysis>,
    pub attempted: usize,
}

/// Drives the pipeline for one or many repositories. Depends only on the
/// collaborator traits, never on concrete backends.
pub struct Orchestrator<'a> {
    config: &'a Config,
    host: Box<dyn RepoHost>,
    runner: Box<dyn CoverageRunner>,
    provider: Box<dyn AnalysisProvider>,
    store: ReportStore,
    log: RunLog,
    inter_repo_delay: Duration,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        config: &'a Config,
        host: Box<dyn RepoHost>,
        runner: Box<dyn CoverageRunner>,
        provider: Box<dyn AnalysisProvider>,
    ) -> Self {
        Self {
            config,
            host,
            runner,
            provider,
            store: ReportStore::new(&config.reports_dir),
            log: RunLog::new(),
            inter_repo_delay: INTER_REPO_DELAY,
        }
    }

    /// Override the batch throttle. Used by tests; production keeps
    /// [`INTER_REPO_DELAY`].
    #[must_use]
    pub fn with_inter_repo_delay(mut self, delay: Duration) -> Self {
        self.inter_repo_delay = delay;
        self
    }

    #[must_use]
    pub fn log(&self) -> &RunLog {
        &self.log
    }

    /// Analyze one remote repository end to end.
    pub fn analyze_repository(&self, owner: &str, name: &str) -> Result<GapAnalysis> {
        self.log.begin_run();
        self.log.info(format!("Starting analysis: {owner}/{name}"));

        let result = self.clone_and_run(owner, name);
        match &result {
            Ok(_) => self.log.info(format!("Analysis finished: {name}")),
            Err(e) => {
                self.log.error(format!("Analysis of {owner}/{name} failed: {e}"));
                self.flush_failed_transcript(name);
            }
        }
        result
    }

    /// Analyze a project that already exists on disk. No fetch stage.
    pub fn analyze_local(&self, project_dir: &Path) -> Result<GapAnalysis> {
        self.log.begin_run();
        self.log
            .info(format!("Analyzing local project: {}", project_dir.display()));

        let project_name = project_dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("local-project")
            .to_string();

        let result = self.run_stages(&project_name, project_dir, 0);
        if let Err(e) = &result {
            self.log.error(format!("Local analysis failed: {e}"));
            self.flush_failed_transcript(&project_name);
        }
        result
    }

    /// Discover repositories matching the criteria and analyze each one in
    /// turn. A failure in one repository is logged and skipped; the batch
    /// always runs to the end. Nothing is retried.
    pub fn analyze_many(
        &self,
        language: &str,
        min_stars: u32,
        max_repos: u32,
    ) -> Result<BatchOutcome> {
        self.log
            .info(format!("Searching repositories: {language}, min stars {min_stars}"));

        let repositories = self.host.search(language, min_stars, max_repos)?;
        self.log
            .info(format!("Found {} repositories", repositories.len()));

        let mut analyses = Vec::new();
        for repo in &repositories {
            match self.analyze_repository(&repo.owner, &repo.name) {
                Ok(analysis) => {
                    analyses.push(analysis);
                    std::thread::sleep(self.inter_repo_delay);
                }
                Err(e) => {
                    self.log
                        .error(format!("Skipping {}/{}: {e}", repo.owner, repo.name));
                }
            }
        }

        self.log.info(format!(
            "Batch complete: {}/{} repositories analyzed",
            analyses.len(),
            repositories.len()
        ));
        Ok(BatchOutcome {
            attempted: repositories.len(),
            analyses,
        })
    }

    fn clone_and_run(&self, owner: &str, name: &str) -> Result<GapAnalysis> {
        self.log.info(format!("Cloning {owner}/{name}..."));
        let clone_start = Instant::now();
        let project_dir = self.host.clone_repo(owner, name, &self.config.repos_dir)?;
        let clone_ms = clone_start.elapsed().as_millis() as u64;

        self.run_stages(name, &project_dir, clone_ms)
    }

    fn run_stages(
        &self,
        project_name: &str,
        project_dir: &Path,
        clone_ms: u64,
    ) -> Result<GapAnalysis> {
        // Measure: external test run, then artifact parsing.
        self.log.info("Running coverage analysis...");
        let artifact = self.runner.run(project_dir, &self.log)?;
        let mut report = parse_report(&artifact.raw, project_name)?;
        report.installation_time_ms = Some(artifact.install_ms);
        report.test_time_ms = Some(artifact.test_ms);
        self.log.info(render_coverage_report(&report));

        // Enrich with source and test text.
        self.log.info("Extracting code snippets...");
        let extraction_start = Instant::now();
        report.uncovered_files =
            enrich_with_sources(project_dir, &report.uncovered_files, &self.log);
        let code_extraction_ms = extraction_start.elapsed().as_millis() as u64;

        // Analyze remotely (or short-circuit when fully covered).
        self.log.info("Analyzing gaps...");
        let llm_start = Instant::now();
        let response = analyze_gaps(self.provider.as_ref(), &report, &self.log)?;
        let llm_analysis_ms = llm_start.elapsed().as_millis() as u64;

        let analysis = GapAnalysis {
            repository_name: project_name.to_string(),
            gaps: response.identified_gaps,
            prioritized_gaps: response.prioritization,
            suggestions: response.recommendations,
            analysis_date: Utc::now(),
            timings: Some(TimingBreakdown {
                clone_ms,
                installation_ms: artifact.install_ms,
                test_ms: artifact.test_ms,
                code_extraction_ms,
                llm_analysis_ms,
            }),
            initial_branch_coverage: Some(report.branch_coverage_percentage),
            initial_line_coverage: Some(report.coverage_percentage),
            total_files: Some(report.total_files),
            files_with_low_branch_coverage: Some(report.uncovered_files.len() as u64),
            llm_model: self.provider.model().to_string(),
        };

        // Persist the analysis and the run's transcript.
        let report_path = self.store.save_analysis(&analysis)?;
        self.log
            .info(format!("Results saved: {}", report_path.display()));
        self.store.save_transcript(
            project_name,
            &analysis.llm_model,
            analysis.analysis_date,
            &self.log.transcript(),
        )?;

        Ok(analysis)
    }

    /// Best-effort transcript flush on the failure path, so the captured
    /// log of a failed run is not lost.
    fn flush_failed_transcript(&self, project_name: &str) {
        let saved = self.store.save_transcript(
            project_name,
            self.provider.model(),
            Utc::now(),
            &self.log.transcript(),
        );
        if let Err(e) = saved {
            tracing::warn!("Could not persist failure transcript: {e}");
        }
    }
}
