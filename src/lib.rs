//! House Style
//!
//! Rewrites uploaded documents into a house writing style: lexical
//! substitution, windowed rewrite stages with a regression guard, acronym
//! expansion, merging, assembly into a `.docx`, and a style audit.

pub mod agent;
pub mod audit;
pub mod config;
pub mod document;
pub mod error;
pub mod lexicon;
pub mod orchestrator;
pub mod server;
pub mod storage;
pub mod utils;

pub use config::AppConfig;
pub use error::{PipelineError, PipelineResult};
pub use orchestrator::Supervisor;
