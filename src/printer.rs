use std::{fmt::Write, path::Path};

use colored::{Color, Colorize};
use url::Url;

use crate::{
    report::ReportEntry,
    results::{ResultSet, TestCaseRecord},
    runner::{ExecutionOutcome, OutcomeStatus},
};

pub fn format_outcome(outcome: &ExecutionOutcome) -> String {
    let mut out = String::new();
    let request = &outcome.request;
    let _ = writeln!(
        out,
        "{} {}{}",
        "Collection:".bold(),
        request.collection().display().to_string().cyan(),
        request
            .folder()
            .map(|folder| format!(" (folder: {folder})"))
            .unwrap_or_default()
            .dimmed()
    );

    match &outcome.status {
        OutcomeStatus::Completed { results, exit_code } => {
            let (label, color) = if outcome.all_passed() {
                ("PASSED", Color::Green)
            } else {
                ("FAILED", Color::Red)
            };
            let exit = match exit_code {
                Some(code) => format!("(exit code {code})"),
                None => "(no runner)".to_string(),
            };
            let _ = writeln!(out, "{} {} {}", "Status:".bold(), label.color(color), exit.dimmed());
            if results.synthetic {
                let _ = writeln!(
                    out,
                    "{}",
                    "Synthetic data: the test runner was not found, results are generated"
                        .yellow()
                );
            }
            out.push_str(&format_summary(results));
        }
        OutcomeStatus::Failed { error } => {
            let _ = writeln!(out, "{} {}", "Test execution failed:".red().bold(), error);
            if !outcome.stderr.trim().is_empty() {
                let _ = writeln!(out, "{}", "Runner stderr".bold());
                let _ = writeln!(out, "{}", outcome.stderr.trim_end().dimmed());
            }
        }
    }

    if let Some(path) = &outcome.html_report {
        let _ = writeln!(out, "{} {}", "HTML report:".bold(), format_file_link(path));
    }
    if let Some(path) = &outcome.json_report {
        let _ = writeln!(out, "{} {}", "JSON report:".bold(), format_file_link(path));
    }
    out
}

pub fn format_summary(results: &ResultSet) -> String {
    let stats = &results.statistics;
    let tests = stats.tests;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "  {} {}   {} {}   {} {}   {} {}",
        "Total Tests".bold(),
        tests.total,
        "Passed".bold(),
        tests.passed().to_string().green(),
        "Failed".bold(),
        tests.failed.to_string().red(),
        "Pending".bold(),
        tests.pending.to_string().yellow()
    );
    let _ = writeln!(
        out,
        "  {} {} total, {} failed, {} pending",
        "Assertions".bold(),
        stats.assertions.total,
        stats.assertions.failed,
        stats.assertions.pending
    );
    let _ = writeln!(
        out,
        "  {} {} total, {} failed",
        "Requests".bold(),
        stats.requests.total,
        stats.requests.failed
    );
    let _ = writeln!(
        out,
        "  {} avg {:.1} ms, min {:.0} ms, max {:.0} ms",
        "Response time".bold(),
        stats.timings.average_ms,
        stats.timings.min_ms,
        stats.timings.max_ms
    );
    if tests.total > 0 {
        let _ = writeln!(
            out,
            "  {} {:.1}% passed, {:.1}% failed, {:.1}% pending",
            "Distribution".bold(),
            percent(tests.passed(), tests.total),
            percent(tests.failed, tests.total),
            percent(tests.pending, tests.total)
        );
    }
    out
}

fn percent(part: u64, total: u64) -> f64 {
    part as f64 * 100.0 / total as f64
}

pub fn format_details(cases: &[TestCaseRecord]) -> String {
    if cases.is_empty() {
        return "No test executions recorded.\n".to_string();
    }

    let width = cases
        .iter()
        .map(|case| case.name.chars().count())
        .max()
        .unwrap_or(0)
        .max("Test Name".len());

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<width$}  {:<6}  {:>9}  {:>4}  {:>10}  {:>6}",
        "Test Name", "Status", "Time (ms)", "Code", "Assertions", "Failed"
    );
    for case in cases {
        let status = if case.is_failed() {
            "FAILED".red()
        } else {
            "PASSED".green()
        };
        let _ = writeln!(
            out,
            "{:<width$}  {}  {:>9}  {:>4}  {:>10}  {:>6}",
            case.name,
            status,
            case.response_time_ms,
            case.status_code,
            case.assertions.len(),
            case.failed_assertions()
        );
        for assertion in &case.assertions {
            if let Some(message) = &assertion.failure {
                let _ = writeln!(
                    out,
                    "    {} {}: {}",
                    "✗".red(),
                    assertion.description,
                    message.dimmed()
                );
            }
        }
    }
    out
}

pub fn format_history(entries: &[ReportEntry]) -> String {
    if entries.is_empty() {
        return "No reports generated yet.\n".to_string();
    }
    let mut out = String::new();
    for entry in entries {
        let _ = writeln!(
            out,
            "{}  {}",
            entry.generated.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
            format_file_link(&entry.path)
        );
    }
    out
}

/// Wraps absolute paths in an OSC 8 hyperlink so terminals can open them.
pub fn format_file_link(path: &Path) -> String {
    let display = path.to_string_lossy();
    match Url::from_file_path(path) {
        Ok(url) => format!("\x1b]8;;{}\x1b\\{}\x1b]8;;\x1b\\", url, display.cyan()),
        Err(_) => display.cyan().to_string(),
    }
}
