use std::{io, time::Duration};

use thiserror::Error;

use super::{
    command::{build_command, RunnerCommand},
    models::{ExecutionRequest, ReportPaths, RunnerOutput, RunnerSettings},
};

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("test runner `{program}` was not found; is it installed and on PATH?")]
    ToolNotFound { program: String },
    #[error("test execution timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("failed while waiting for the test runner: {0}")]
    Io(#[from] io::Error),
}

/// Runs the external runner to completion or until the timeout elapses.
/// On timeout the child is killed when its handle is dropped.
pub async fn invoke(
    settings: &RunnerSettings,
    request: &ExecutionRequest,
    paths: &ReportPaths,
) -> Result<RunnerOutput, RunnerError> {
    let command = build_command(settings, request, paths);
    run_command(&command, settings.timeout).await
}

pub(crate) async fn run_command(
    command: &RunnerCommand,
    timeout: Duration,
) -> Result<RunnerOutput, RunnerError> {
    tracing::debug!(command = %command.display(), "starting test runner");

    let child = command.to_process().spawn().map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            RunnerError::ToolNotFound {
                program: command.program.clone(),
            }
        } else {
            RunnerError::Spawn {
                program: command.program.clone(),
                source,
            }
        }
    })?;

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| RunnerError::Timeout(timeout))??;

    let result = RunnerOutput {
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };
    tracing::debug!(exit_code = ?result.exit_code, "test runner exited");
    Ok(result)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::ffi::OsString;

    fn sh(script: &str) -> RunnerCommand {
        RunnerCommand {
            program: "sh".to_string(),
            args: vec![OsString::from("-c"), OsString::from(script)],
        }
    }

    #[tokio::test]
    async fn captures_output_and_exit_code() {
        let output = run_command(
            &sh("echo out; echo err >&2; exit 3"),
            Duration::from_secs(10),
        )
        .await
        .unwrap();
        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
    }

    #[tokio::test]
    async fn times_out_long_running_commands() {
        let err = run_command(&sh("sleep 5"), Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(matches!(err, RunnerError::Timeout(_)));
        assert_eq!(err.to_string(), "test execution timed out after 0s");
    }

    #[tokio::test]
    async fn distinguishes_missing_tool() {
        let command = RunnerCommand {
            program: "runboard-no-such-runner".to_string(),
            args: vec![],
        };
        let err = run_command(&command, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, RunnerError::ToolNotFound { .. }));
        assert!(err.to_string().contains("runboard-no-such-runner"));
    }
}
