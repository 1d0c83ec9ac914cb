mod command;
mod invoker;
mod models;

pub use command::{build_command, RunnerCommand};
pub use invoker::{invoke, RunnerError};
pub use models::{
    timestamp_slug, ExecutionOutcome, ExecutionRequest, OutcomeStatus, ReportPaths, RunnerOutput,
    RunnerSettings,
};
