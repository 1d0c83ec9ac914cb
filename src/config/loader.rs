use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;

pub const CONFIG_FILE_NAME: &str = "runboard.json";

pub const DEFAULT_RUNNER_PROGRAM: &str = "newman";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_SMTP_SERVER: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;
pub const DEFAULT_SYNTHETIC_SEED: u64 = 0x5EED;

const DEFAULT_SERVICES: [&str; 8] = [
    "User Authentication Service",
    "Payment Gateway Service",
    "Order Management Service",
    "Inventory Service",
    "Notification Service",
    "Analytics Service",
    "Reporting Service",
    "Security Service",
];

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RunnerConfig {
    pub program: String,
    /// Arguments placed before `run`, e.g. `["newman"]` with `npx`.
    pub args: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_RUNNER_PROGRAM.to_string(),
            args: Vec::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SmtpConfig {
    pub server: String,
    pub port: u16,
    /// `{NAME}` placeholders resolve against the env file and process
    /// environment.
    pub sender_email: Option<String>,
    /// Same expansion as `sender_email`; write literal braces as `\{` and `\}`.
    pub sender_password: Option<String>,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            server: DEFAULT_SMTP_SERVER.to_string(),
            port: DEFAULT_SMTP_PORT,
            sender_email: None,
            sender_password: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyConfig {
    pub service: String,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RunboardConfig {
    pub runner: RunnerConfig,
    pub collection: String,
    pub environment: Option<String>,
    pub collections_dir: String,
    pub reports_dir: String,
    pub synthetic_fallback: bool,
    pub synthetic_seed: u64,
    pub env: Option<String>,
    pub services: Vec<String>,
    pub dependencies: Vec<DependencyConfig>,
    pub smtp: SmtpConfig,
}

impl Default for RunboardConfig {
    fn default() -> Self {
        Self {
            runner: RunnerConfig::default(),
            collection: "collection.json".to_string(),
            environment: None,
            collections_dir: "collections".to_string(),
            reports_dir: "reports".to_string(),
            synthetic_fallback: false,
            synthetic_seed: DEFAULT_SYNTHETIC_SEED,
            env: None,
            services: DEFAULT_SERVICES.iter().map(|s| s.to_string()).collect(),
            dependencies: default_dependencies(),
            smtp: SmtpConfig::default(),
        }
    }
}

fn default_dependencies() -> Vec<DependencyConfig> {
    let entry = |service: &str, deps: &[&str]| DependencyConfig {
        service: service.to_string(),
        depends_on: deps.iter().map(|d| d.to_string()).collect(),
    };
    vec![
        entry("Payment Gateway Service", &["User Authentication Service"]),
        entry(
            "Order Management Service",
            &["Payment Gateway Service", "Inventory Service"],
        ),
        entry(
            "Notification Service",
            &["User Authentication Service", "Order Management Service"],
        ),
    ]
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: RunboardConfig,
    pub path: PathBuf,
    pub dir: PathBuf,
}

/// Loads `runboard.json` from a directory, or the given file directly.
/// A missing file is not an error.
pub fn load_config(target: &Path) -> Result<Option<LoadedConfig>> {
    let resolved = if target.is_absolute() {
        target.to_path_buf()
    } else {
        std::env::current_dir()?.join(target)
    };

    let (file_path, dir) = if resolved.is_dir() {
        (resolved.join(CONFIG_FILE_NAME), resolved)
    } else {
        let dir = match resolved.parent() {
            Some(parent) => parent.to_path_buf(),
            None => std::env::current_dir()?,
        };
        (resolved, dir)
    };

    if !file_path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(&file_path)
        .with_context(|| format!("reading config {}", file_path.display()))?;

    let config: RunboardConfig = serde_json::from_str(&contents)
        .with_context(|| format!("parsing config {}", file_path.display()))?;

    Ok(Some(LoadedConfig {
        config,
        path: file_path,
        dir,
    }))
}
