mod progress;
mod session;

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};

use chrono::Local;

pub use progress::{BarProgress, ProgressReporter, Silent, Stage};
pub use session::Session;

use crate::{
    config::Settings,
    report::{render_html, ReportDocument},
    results::{load_report, synthesize, write_structured, ResultSet},
    runner::{
        invoke, ExecutionOutcome, ExecutionRequest, OutcomeStatus, ReportPaths, RunnerError,
    },
};

/// Runs one request end to end and stores the outcome in the session,
/// replacing the previous one.
pub async fn execute<'s>(
    session: &'s mut Session,
    request: ExecutionRequest,
    progress: &mut dyn ProgressReporter,
) -> &'s ExecutionOutcome {
    session.clear();
    let outcome = run_stages(session.settings(), request, progress).await;
    session.record(outcome)
}

struct Captured {
    stdout: String,
    stderr: String,
}

async fn run_stages(
    settings: &Settings,
    request: ExecutionRequest,
    progress: &mut dyn ProgressReporter,
) -> ExecutionOutcome {
    tracing::info!(
        collection = %request.collection().display(),
        folder = request.folder().unwrap_or("<all>"),
        "starting test run"
    );
    let mut captured = Captured {
        stdout: String::new(),
        stderr: String::new(),
    };

    progress.stage(Stage::Preparing);
    if let Err(err) = fs::create_dir_all(&settings.reports_dir) {
        let error = format!(
            "creating reports directory {}: {err}",
            settings.reports_dir.display()
        );
        return finish(request, captured, failed(error), None, None, progress);
    }
    let paths = ReportPaths::allocate(&settings.reports_dir, Local::now());

    progress.stage(Stage::Running);
    let loaded = match invoke(&settings.runner, &request, &paths).await {
        Ok(output) => {
            captured.stdout = output.stdout;
            captured.stderr = output.stderr;
            progress.stage(Stage::Loading);
            if paths.json.exists() {
                load_report(&paths.json)
                    .map(|results| (results, output.exit_code))
                    .map_err(|err| err.to_string())
            } else {
                Err(format!(
                    "test runner exited with {} without writing a structured report",
                    describe_exit(output.exit_code)
                ))
            }
        }
        Err(RunnerError::ToolNotFound { program }) if settings.synthetic_fallback => {
            tracing::warn!(program = %program, "runner not installed; generating synthetic results");
            progress.stage(Stage::Loading);
            let results = synthesize(settings.synthetic_seed);
            write_structured(&paths.json, &results)
                .map(|()| (results, None))
                .map_err(|err| err.to_string())
        }
        Err(err) => Err(err.to_string()),
    };

    let json_report = paths.json.exists().then(|| paths.json.clone());
    let (results, exit_code) = match loaded {
        Ok(loaded) => loaded,
        Err(error) => return finish(request, captured, failed(error), None, json_report, progress),
    };

    progress.stage(Stage::Rendering);
    match write_artifact(&results, &paths) {
        Ok(html_report) => finish(
            request,
            captured,
            OutcomeStatus::Completed { results, exit_code },
            Some(html_report),
            json_report,
            progress,
        ),
        Err(error) => finish(request, captured, failed(error), None, json_report, progress),
    }
}

/// Writes to the reserved `paths.html` so the artifact set keeps one slug.
/// An existing file is an error, never overwritten or renamed.
fn write_artifact(results: &ResultSet, paths: &ReportPaths) -> Result<PathBuf, String> {
    let html = render_html(&ReportDocument::new(results, Local::now()));
    let describe = |err: std::io::Error| format!("writing report {}: {err}", paths.html.display());
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&paths.html)
        .map_err(describe)?;
    file.write_all(html.as_bytes()).map_err(describe)?;
    Ok(paths.html.clone())
}

fn failed(error: String) -> OutcomeStatus {
    OutcomeStatus::Failed { error }
}

fn finish(
    request: ExecutionRequest,
    captured: Captured,
    status: OutcomeStatus,
    html_report: Option<PathBuf>,
    json_report: Option<PathBuf>,
    progress: &mut dyn ProgressReporter,
) -> ExecutionOutcome {
    match &status {
        OutcomeStatus::Completed { results, .. } => tracing::info!(
            total = results.statistics.tests.total,
            failed = results.statistics.tests.failed,
            synthetic = results.synthetic,
            "test run finished"
        ),
        OutcomeStatus::Failed { error } => tracing::warn!(%error, "test run failed"),
    }
    progress.stage(Stage::Finished);
    ExecutionOutcome {
        request,
        status,
        html_report,
        json_report,
        stdout: captured.stdout,
        stderr: captured.stderr,
        finished_at: Local::now(),
    }
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}
