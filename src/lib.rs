pub mod cli;
pub mod config;
pub mod coverage;
pub mod enrich;
pub mod error;
pub mod github;
pub mod llm;
pub mod logcap;
pub mod model;
pub mod pipeline;
pub mod prompt;
pub mod runner;
pub mod store;
