use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use covgap::cli::render_analysis;
use covgap::config::Config;
use covgap::github::GitHubHost;
use covgap::llm::provider_from_config;
use covgap::logcap::init_tracing;
use covgap::pipeline::Orchestrator;
use covgap::runner::NodeCoverageRunner;

/// covgap — LLM-driven test coverage gap analysis for Node.js projects.
#[derive(Parser)]
#[command(name = "covgap", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one GitHub repository.
    Repo {
        /// Repository owner, e.g. "facebook".
        owner: String,

        /// Repository name, e.g. "react".
        name: String,
    },

    /// Search GitHub and analyze the top matching repositories.
    Search {
        /// Language to search for, e.g. "JavaScript".
        language: String,

        /// Minimum star count.
        #[arg(long, default_value_t = 100)]
        min_stars: u32,

        /// Maximum number of repositories to analyze.
        #[arg(long, default_value_t = 3)]
        max_repos: u32,
    },

    /// Analyze a project directory on the local filesystem.
    Local {
        /// Path to the project root.
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let config = Config::from_env().context("Invalid configuration")?;
    let provider = provider_from_config(&config)?;
    let host = Box::new(GitHubHost::new(config.github_token.clone()));
    let orchestrator = Orchestrator::new(&config, host, Box::new(NodeCoverageRunner), provider);

    match cli.command {
        Commands::Repo { owner, name } => {
            let analysis = orchestrator.analyze_repository(&owner, &name)?;
            print!("{}", render_analysis(&analysis));
        }
        Commands::Search {
            language,
            min_stars,
            max_repos,
        } => {
            let outcome = orchestrator.analyze_many(&language, min_stars, max_repos)?;
            println!(
                "{}/{} repositories analyzed successfully",
                outcome.analyses.len(),
                outcome.attempted
            );
            for analysis in &outcome.analyses {
                print!("{}", render_analysis(analysis));
            }
        }
        Commands::Local { path } => {
            let analysis = orchestrator.analyze_local(&path)?;
            print!("{}", render_analysis(&analysis));
        }
    }

    Ok(())
}
