use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CovgapError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to fetch repository: {0}")]
    Fetch(String),

    #[error("Not a valid Node.js project (no package.json in {})", .0.display())]
    MissingManifest(PathBuf),

    #[error(
        "No coverage artifact found at {}: tests ran but produced no report. \
         Check that the project has a test framework configured for coverage.",
        .0.display()
    )]
    ArtifactMissing(PathBuf),

    #[error("Malformed coverage artifact: {0}")]
    MalformedArtifact(String),

    #[error("Remote analysis service error: {0}")]
    Remote(String),

    #[error("Analysis response is not valid JSON (preview: {preview})")]
    ResponseParse { preview: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CovgapError>;
