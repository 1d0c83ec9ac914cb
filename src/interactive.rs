use std::{
    fmt, fs,
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use anyhow::{anyhow, Result};
use chrono::{DateTime, Local};
use inquire::{Confirm, InquireError, MultiSelect, Password, PasswordDisplayMode, Select, Text};
use walkdir::WalkDir;

use crate::{
    mail::{dispatch, SmtpSettings},
    pipeline::{execute, BarProgress, Session},
    plan::{EmailForm, ExecutionType, RunForm},
    printer::{format_details, format_file_link, format_history, format_outcome},
    report::{export_report, list_reports},
};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const BUILD_TIMESTAMP: &str = env!("BUILD_TIMESTAMP");

pub async fn run_interactive(mut session: Session) -> Result<()> {
    let mut ui = InquireUi;
    run_interactive_with_ui(&mut session, &mut ui).await
}

pub(crate) async fn run_interactive_with_ui(
    session: &mut Session,
    ui: &mut dyn InteractiveUi,
) -> Result<()> {
    ui.print(&format!("runboard v{} (built {})", VERSION, BUILD_TIMESTAMP));
    if session.settings().synthetic_fallback {
        ui.print("Demo mode: synthetic results are used when the test runner is missing.");
    }
    for warning in &session.settings().warnings {
        ui.print(&format!("⚠ {warning}"));
    }

    let labels: Vec<String> = MenuItem::ALL.iter().map(|item| item.to_string()).collect();
    let mut cursor = 0;
    loop {
        // Esc on the main menu quits.
        let Some(index) = ui.select("runboard", &labels, cursor)? else {
            break;
        };
        let choice = *MenuItem::ALL
            .get(index)
            .ok_or_else(|| anyhow!("invalid menu selection"))?;
        cursor = index;

        let result = match choice {
            MenuItem::RunTests => handle_run(session, ui).await,
            MenuItem::ShowResults => {
                show_results(session, ui);
                Ok(())
            }
            MenuItem::ExportReport => handle_export(session, ui),
            MenuItem::ViewReport => {
                if let Some(report) = current_report(session, ui) {
                    ui.print(&format!("Report: {}", format_file_link(&report)));
                }
                Ok(())
            }
            MenuItem::SendEmail => handle_email(session, ui).await,
            MenuItem::EmailSettings => edit_email_settings(session, ui),
            MenuItem::History => list_reports(session.reports_dir())
                .map(|entries| ui.print(format_history(&entries).trim_end())),
            MenuItem::Quit => break,
        };
        if let Err(err) = result {
            ui.print(&format!("Error: {err:#}"));
        }
        ui.print("");
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuItem {
    RunTests,
    ShowResults,
    ExportReport,
    ViewReport,
    SendEmail,
    EmailSettings,
    History,
    Quit,
}

impl MenuItem {
    const ALL: [MenuItem; 8] = [
        MenuItem::RunTests,
        MenuItem::ShowResults,
        MenuItem::ExportReport,
        MenuItem::ViewReport,
        MenuItem::SendEmail,
        MenuItem::EmailSettings,
        MenuItem::History,
        MenuItem::Quit,
    ];
}

impl fmt::Display for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenuItem::RunTests => write!(f, "▶ Run tests"),
            MenuItem::ShowResults => write!(f, "☰ Show results"),
            MenuItem::ExportReport => write!(f, "⇣ Export report"),
            MenuItem::ViewReport => write!(f, "◉ View report"),
            MenuItem::SendEmail => write!(f, "✉ Send email report"),
            MenuItem::EmailSettings => write!(f, "⚙ Email settings"),
            MenuItem::History => write!(f, "↺ Report history"),
            MenuItem::Quit => write!(f, "Quit"),
        }
    }
}

pub(crate) trait InteractiveUi {
    fn print(&mut self, message: &str);
    fn select(&mut self, prompt: &str, items: &[String], start: usize) -> Result<Option<usize>>;
    fn multi_select(&mut self, prompt: &str, items: &[String]) -> Result<Option<Vec<usize>>>;
    fn input(&mut self, prompt: &str, default: Option<&str>) -> Result<Option<String>>;
    fn secret(&mut self, prompt: &str) -> Result<Option<String>>;
    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool>;
}

struct InquireUi;

impl InteractiveUi for InquireUi {
    fn print(&mut self, message: &str) {
        println!("{}", message);
    }

    fn select(&mut self, prompt: &str, items: &[String], start: usize) -> Result<Option<usize>> {
        match Select::new(prompt, items.to_vec())
            .with_page_size(10)
            .with_starting_cursor(start)
            .raw_prompt()
        {
            Ok(choice) => Ok(Some(choice.index)),
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
            Err(other) => Err(other.into()),
        }
    }

    fn multi_select(&mut self, prompt: &str, items: &[String]) -> Result<Option<Vec<usize>>> {
        match MultiSelect::new(prompt, items.to_vec())
            .with_page_size(10)
            .raw_prompt()
        {
            Ok(chosen) => Ok(Some(chosen.into_iter().map(|option| option.index).collect())),
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
            Err(other) => Err(other.into()),
        }
    }

    fn input(&mut self, prompt: &str, default: Option<&str>) -> Result<Option<String>> {
        let mut builder = Text::new(prompt);
        if let Some(value) = default {
            builder = builder.with_default(value);
        }
        match builder.prompt() {
            Ok(value) => Ok(Some(value)),
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
            Err(other) => Err(other.into()),
        }
    }

    fn secret(&mut self, prompt: &str) -> Result<Option<String>> {
        match Password::new(prompt)
            .without_confirmation()
            .with_display_mode(PasswordDisplayMode::Masked)
            .prompt()
        {
            Ok(value) => Ok(Some(value)),
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
            Err(other) => Err(other.into()),
        }
    }

    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool> {
        match Confirm::new(prompt).with_default(default).prompt() {
            Ok(value) => Ok(value),
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(false),
            Err(other) => Err(other.into()),
        }
    }
}

async fn handle_run(session: &mut Session, ui: &mut dyn InteractiveUi) -> Result<()> {
    let Some(form) = prompt_run_form(session, ui)? else {
        ui.print("Run cancelled.");
        return Ok(());
    };

    let settings = session.settings();
    let request = match form.into_request(&settings.catalog, &settings.base_dir) {
        Ok(request) => request,
        Err(err) => {
            ui.print(&format!("⚠ {err}"));
            return Ok(());
        }
    };

    ui.print(&format!(
        "Running {}{}",
        request.collection().display(),
        request
            .folder()
            .map(|folder| format!(" (folder: {folder})"))
            .unwrap_or_default()
    ));

    let mut progress = BarProgress::new();
    let outcome = execute(session, request, &mut progress).await;
    drop(progress);
    ui.print(format_outcome(outcome).trim_end());
    Ok(())
}

fn prompt_run_form(session: &Session, ui: &mut dyn InteractiveUi) -> Result<Option<RunForm>> {
    let settings = session.settings();
    let mut form = RunForm::default();

    let types: Vec<String> = ExecutionType::ALL.iter().map(|t| t.to_string()).collect();
    let Some(index) = ui.select("Execution type", &types, 0)? else {
        return Ok(None);
    };
    form.execution_type = ExecutionType::ALL.get(index).copied();

    match form.execution_type {
        Some(ExecutionType::IndividualService) => {
            let services = settings.catalog.services().to_vec();
            let Some(chosen) = ui.multi_select("Services", &services)? else {
                return Ok(None);
            };
            form.selected_services = chosen
                .into_iter()
                .filter_map(|idx| services.get(idx).cloned())
                .collect();
        }
        Some(ExecutionType::ServicesWithDependencies) => {
            match settings.catalog.dependency_order() {
                Ok(order) => ui.print(&format!("Dependency order: {}", order.join(" → "))),
                Err(err) => {
                    ui.print(&format!("⚠ {err}"));
                    return Ok(None);
                }
            }
            for entry in settings.catalog.dependencies() {
                ui.print(&format!(
                    "  {} depends on {}",
                    entry.service,
                    entry.depends_on.join(", ")
                ));
            }
        }
        _ => {}
    }

    let Some(collection) = prompt_collection(session, ui)? else {
        return Ok(None);
    };
    form.collection = collection;

    let default_env = settings
        .environment
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_default();
    let Some(environment) = ui.input("Environment file (optional)", Some(&default_env))? else {
        return Ok(None);
    };
    form.environment = environment;

    Ok(Some(form))
}

fn prompt_collection(session: &Session, ui: &mut dyn InteractiveUi) -> Result<Option<String>> {
    let settings = session.settings();
    let default_collection = settings.collection.display().to_string();
    let files = discover_collections(&settings.collections_dir)?;
    if files.is_empty() {
        return ui.input("Collection file", Some(&default_collection));
    }

    let mut labels: Vec<String> = files.iter().map(|file| file.to_string()).collect();
    labels.push("Enter a path…".to_string());
    let Some(index) = ui.select("Collection", &labels, 0)? else {
        return Ok(None);
    };
    match files.get(index) {
        Some(file) => Ok(Some(file.absolute.display().to_string())),
        None => ui.input("Collection file", Some(&default_collection)),
    }
}

fn show_results(session: &Session, ui: &mut dyn InteractiveUi) {
    let Some(outcome) = session.last_outcome() else {
        ui.print("No test results yet. Run tests first.");
        return;
    };
    ui.print(format_outcome(outcome).trim_end());
    if let Some(results) = outcome.results() {
        ui.print("");
        ui.print(format_details(&results.cases).trim_end());
    }
}

fn current_report(session: &Session, ui: &mut dyn InteractiveUi) -> Option<PathBuf> {
    let report = session
        .last_outcome()
        .and_then(|outcome| outcome.html_report.clone());
    if report.is_none() {
        ui.print("No report available. Run tests first.");
    }
    report
}

fn handle_export(session: &Session, ui: &mut dyn InteractiveUi) -> Result<()> {
    let Some(report) = current_report(session, ui) else {
        return Ok(());
    };
    let default_dest = session.settings().base_dir.display().to_string();
    let Some(dest) = ui.input("Export to directory", Some(&default_dest))? else {
        ui.print("Export cancelled.");
        return Ok(());
    };
    let dest_dir = resolve_dir(&session.settings().base_dir, dest.trim());
    match export_report(&report, &dest_dir, Local::now()) {
        Ok(path) => ui.print(&format!("Exported {}", format_file_link(&path))),
        Err(err) => ui.print(&format!("Export failed: {err:#}")),
    }
    Ok(())
}

async fn handle_email(session: &Session, ui: &mut dyn InteractiveUi) -> Result<()> {
    let Some(report) = current_report(session, ui) else {
        return Ok(());
    };
    let Some(recipient) = ui.input("Recipient email", None)? else {
        ui.print("Email cancelled.");
        return Ok(());
    };

    let form = EmailForm {
        recipient,
        sender: session.smtp().sender_email.clone(),
    };
    let mailbox = match form.validate() {
        Ok(mailbox) => mailbox,
        Err(err) => {
            ui.print(&format!("⚠ {err}"));
            return Ok(());
        }
    };

    if !ui.confirm(&format!("Send {} to {}?", display_name(&report), mailbox), true)? {
        ui.print("Email cancelled.");
        return Ok(());
    }

    ui.print("Sending email…");
    let result = dispatch(&report, &mailbox.to_string(), session.smtp()).await;
    if result.success {
        ui.print(&format!("✓ {}", result.message));
    } else {
        ui.print(&format!("✗ {}", result.message));
    }
    Ok(())
}

fn edit_email_settings(session: &mut Session, ui: &mut dyn InteractiveUi) -> Result<()> {
    let current = session.smtp().clone();

    let Some(server) = ui.input("SMTP server", Some(&current.server))? else {
        return Ok(());
    };
    let port_default = current.port.to_string();
    let Some(port) = ui.input("SMTP port", Some(&port_default))? else {
        return Ok(());
    };
    let port: u16 = match port.trim().parse() {
        Ok(port) => port,
        Err(_) => {
            ui.print(&format!("⚠ Invalid SMTP port: {}", port.trim()));
            return Ok(());
        }
    };
    let sender_default = current.sender_email.clone().unwrap_or_default();
    let Some(sender) = ui.input("Sender email", Some(&sender_default))? else {
        return Ok(());
    };
    // Blank keeps the stored password.
    let password = ui
        .secret("Sender password (leave blank to keep)")?
        .filter(|value| !value.is_empty())
        .or(current.sender_password);

    let sender = sender.trim();
    session.set_smtp(SmtpSettings {
        server: server.trim().to_string(),
        port,
        sender_email: (!sender.is_empty()).then(|| sender.to_string()),
        sender_password: password,
    });
    ui.print("Email settings updated.");
    Ok(())
}

fn resolve_dir(base_dir: &Path, input: &str) -> PathBuf {
    if input.is_empty() {
        return base_dir.to_path_buf();
    }
    let candidate = PathBuf::from(input);
    if candidate.is_absolute() {
        candidate
    } else {
        base_dir.join(candidate)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[derive(Clone)]
struct CollectionFile {
    absolute: PathBuf,
    relative: PathBuf,
    modified: SystemTime,
    size: u64,
}

impl fmt::Display for CollectionFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {})",
            self.relative.display(),
            format_size(self.size),
            format_relative(self.modified)
        )
    }
}

fn discover_collections(dir: &Path) -> Result<Vec<CollectionFile>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let is_collection = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.ends_with("collection.json"));
        if is_collection {
            let metadata = fs::metadata(entry.path())?;
            files.push(CollectionFile {
                absolute: entry.path().to_path_buf(),
                relative: entry
                    .path()
                    .strip_prefix(dir)
                    .unwrap_or(entry.path())
                    .to_path_buf(),
                modified: metadata.modified().unwrap_or(SystemTime::now()),
                size: metadata.len(),
            });
        }
    }
    files.sort_by(|a, b| b.modified.cmp(&a.modified));
    Ok(files)
}

fn format_size(bytes: u64) -> String {
    match bytes {
        0..=1024 => format!("{} B", bytes),
        1025..=1_048_576 => format!("{:.1} KiB", bytes as f64 / 1024.0),
        _ => format!("{:.1} MiB", bytes as f64 / 1024.0 / 1024.0),
    }
}

fn format_relative(time: SystemTime) -> String {
    let now = SystemTime::now();
    let delta = now.duration_since(time).unwrap_or(Duration::ZERO);
    if delta < Duration::from_secs(60) {
        return format!("{}s ago", delta.as_secs());
    }
    if delta < Duration::from_secs(3600) {
        return format!("{}m ago", delta.as_secs() / 60);
    }
    if delta < Duration::from_secs(86400) {
        return format!("{}h ago", delta.as_secs() / 3600);
    }
    let datetime: DateTime<Local> = DateTime::<Local>::from(time);
    datetime.format("%Y-%m-%d %H:%M").to_string()
}
