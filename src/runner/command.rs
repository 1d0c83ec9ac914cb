use std::{ffi::OsString, process::Stdio};

use tokio::process::Command;

use super::models::{ExecutionRequest, ReportPaths, RunnerSettings};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerCommand {
    pub program: String,
    pub args: Vec<OsString>,
}

impl RunnerCommand {
    pub fn display(&self) -> String {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().map(|arg| {
                let arg = arg.to_string_lossy();
                if arg.contains(char::is_whitespace) {
                    format!("\"{arg}\"")
                } else {
                    arg.into_owned()
                }
            }))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub(super) fn to_process(&self) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

/// `<program> [args..] run <collection> --reporters html,json ...`
pub fn build_command(
    settings: &RunnerSettings,
    request: &ExecutionRequest,
    paths: &ReportPaths,
) -> RunnerCommand {
    let mut args: Vec<OsString> = settings.args.iter().map(OsString::from).collect();
    args.push("run".into());
    args.push(request.collection().into());
    args.push("--reporters".into());
    args.push("html,json".into());
    args.push("--reporter-html-export".into());
    args.push(paths.runner_html.clone().into());
    args.push("--reporter-json-export".into());
    args.push(paths.json.clone().into());

    if let Some(environment) = request.environment() {
        args.push("--environment".into());
        args.push(environment.into());
    }
    if let Some(folder) = request.folder() {
        args.push("--folder".into());
        args.push(folder.into());
    }

    RunnerCommand {
        program: settings.program.clone(),
        args,
    }
}
