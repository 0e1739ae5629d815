//! Host module for running the translator and persisting its output

pub mod command_runner;
pub mod log_file;

pub use command_runner::{
    CancelToken, CommandRunner, RunError, RunEvent, RunHandle, RunOptions, RunOutcome,
    CANCELLED_EXIT_CODE,
};
pub use log_file::RunLog;
