use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use runboard::config::{load_config, SettingsBuilder};
use runboard::interactive::run_interactive;
use runboard::pipeline::Session;

#[derive(Parser, Debug)]
#[command(
    name = "runboard",
    version,
    about = "Interactive dashboard for newman test runs",
    disable_help_subcommand = true
)]
struct Cli {
    /// Directory or file containing runboard.json
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override env file used for placeholder expansion
    #[arg(short, long)]
    env: Option<PathBuf>,

    /// Override base directory used for resolving paths
    #[arg(long)]
    cwd: Option<PathBuf>,

    /// Directory that receives generated reports
    #[arg(long, short = 'R')]
    reports: Option<PathBuf>,

    /// Substitute synthetic results when the test runner is not installed
    #[arg(long)]
    demo: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they stay out of the prompts.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();

    let base_dir = cli
        .cwd
        .as_ref()
        .map(|p| resolve_path(Path::new(p)))
        .transpose()?
        .unwrap_or(std::env::current_dir()?);

    let config_target = cli
        .config
        .as_ref()
        .map(|p| resolve_relative(&base_dir, p))
        .unwrap_or_else(|| base_dir.clone());

    let cfg = load_config(&config_target).context("loading configuration")?;
    let config_dir = cfg.as_ref().map(|c| c.dir.clone()).unwrap_or_else(|| {
        if config_target.is_dir() {
            config_target.clone()
        } else {
            config_target
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| config_target.clone())
        }
    });

    let settings = SettingsBuilder::new(base_dir.clone(), config_dir, cfg)
        .with_env_file(cli.env.clone())
        .with_reports_dir(cli.reports.clone())
        .with_demo(cli.demo)
        .build()
        .context("resolving settings")?;
    tracing::debug!(
        reports = %settings.reports_dir.display(),
        runner = %settings.runner.program,
        "settings resolved"
    );

    run_interactive(Session::new(settings)).await
}

fn resolve_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

fn resolve_relative(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
