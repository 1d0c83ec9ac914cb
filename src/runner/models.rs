use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use chrono::{DateTime, Local};

use crate::results::ResultSet;

#[derive(Debug, Clone)]
pub struct RunnerSettings {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

/// A single request to run one collection (optionally one folder of it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    collection: PathBuf,
    environment: Option<PathBuf>,
    folder: Option<String>,
}

impl ExecutionRequest {
    pub fn new(collection: PathBuf, environment: Option<PathBuf>, folder: Option<String>) -> Self {
        Self {
            collection,
            environment,
            folder,
        }
    }

    pub fn collection(&self) -> &Path {
        &self.collection
    }

    pub fn environment(&self) -> Option<&Path> {
        self.environment.as_deref()
    }

    pub fn folder(&self) -> Option<&str> {
        self.folder.as_deref()
    }
}

/// Artifact locations for one run, all sharing a timestamp slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub stamp: String,
    pub html: PathBuf,
    pub json: PathBuf,
    pub runner_html: PathBuf,
}

impl ReportPaths {
    pub fn for_stamp(dir: &Path, stamp: &str) -> Self {
        Self {
            stamp: stamp.to_string(),
            html: dir.join(format!("report_{stamp}.html")),
            json: dir.join(format!("report_{stamp}.json")),
            runner_html: dir.join(format!("runner_{stamp}.html")),
        }
    }

    /// Picks the first slug for `at` whose files do not exist yet.
    pub fn allocate(dir: &Path, at: DateTime<Local>) -> Self {
        let base = timestamp_slug(at);
        let mut paths = Self::for_stamp(dir, &base);
        let mut suffix = 1;
        while paths.any_exists() {
            paths = Self::for_stamp(dir, &format!("{base}_{suffix}"));
            suffix += 1;
        }
        paths
    }

    fn any_exists(&self) -> bool {
        self.html.exists() || self.json.exists() || self.runner_html.exists()
    }
}

pub fn timestamp_slug(at: DateTime<Local>) -> String {
    at.format("%Y%m%d_%H%M%S").to_string()
}

#[derive(Debug, Clone)]
pub struct RunnerOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone)]
pub enum OutcomeStatus {
    Completed {
        results: ResultSet,
        exit_code: Option<i32>,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub request: ExecutionRequest,
    pub status: OutcomeStatus,
    pub html_report: Option<PathBuf>,
    pub json_report: Option<PathBuf>,
    pub stdout: String,
    pub stderr: String,
    pub finished_at: DateTime<Local>,
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Completed { .. })
    }

    /// Completed with a zero exit code. Synthetic runs have no exit code and
    /// count as passing when no test failed.
    pub fn all_passed(&self) -> bool {
        match &self.status {
            OutcomeStatus::Completed {
                exit_code: Some(code),
                ..
            } => *code == 0,
            OutcomeStatus::Completed {
                results,
                exit_code: None,
            } => results.statistics.tests.failed == 0,
            OutcomeStatus::Failed { .. } => false,
        }
    }

    pub fn results(&self) -> Option<&ResultSet> {
        match &self.status {
            OutcomeStatus::Completed { results, .. } => Some(results),
            OutcomeStatus::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            OutcomeStatus::Completed { .. } => None,
            OutcomeStatus::Failed { error } => Some(error),
        }
    }
}
