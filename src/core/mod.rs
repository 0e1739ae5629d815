//! Core data models: option catalogues, the translator config file,
//! translation jobs and console line handling

mod job;
mod options;
mod output;
mod translator_config;

pub use job::*;
pub use options::*;
pub use output::*;
pub use translator_config::*;
