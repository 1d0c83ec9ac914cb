use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Result;

use crate::{
    config::{LoadedConfig, RunboardConfig},
    env::{expand_placeholders, load_env_file, EnvMap},
    mail::SmtpSettings,
    plan::ServiceCatalog,
    runner::RunnerSettings,
};

fn resolve_relative(base: &Path, value: &Path) -> PathBuf {
    if value.is_absolute() {
        value.to_path_buf()
    } else {
        base.join(value)
    }
}

/// Fully resolved settings for one interactive session.
#[derive(Debug, Clone)]
pub struct Settings {
    pub base_dir: PathBuf,
    pub config_dir: PathBuf,
    pub runner: RunnerSettings,
    pub collection: PathBuf,
    pub environment: Option<PathBuf>,
    pub collections_dir: PathBuf,
    pub reports_dir: PathBuf,
    pub synthetic_fallback: bool,
    pub synthetic_seed: u64,
    pub catalog: ServiceCatalog,
    pub smtp: SmtpSettings,
    pub env_files: Vec<PathBuf>,
    /// Problems that did not stop the session, shown when it starts.
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SettingsBuilder {
    base_dir: PathBuf,
    config_dir: PathBuf,
    config: Option<LoadedConfig>,
    explicit_env: Option<PathBuf>,
    explicit_reports_dir: Option<PathBuf>,
    force_demo: bool,
}

impl SettingsBuilder {
    pub fn new(base_dir: PathBuf, config_dir: PathBuf, config: Option<LoadedConfig>) -> Self {
        Self {
            base_dir,
            config_dir,
            config,
            explicit_env: None,
            explicit_reports_dir: None,
            force_demo: false,
        }
    }

    pub fn with_env_file(mut self, path: Option<PathBuf>) -> Self {
        self.explicit_env = path;
        self
    }

    pub fn with_reports_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.explicit_reports_dir = dir;
        self
    }

    pub fn with_demo(mut self, demo: bool) -> Self {
        self.force_demo = demo;
        self
    }

    pub fn build(&self) -> Result<Settings> {
        let defaults = RunboardConfig::default();
        let cfg = self
            .config
            .as_ref()
            .map(|loaded| &loaded.config)
            .unwrap_or(&defaults);
        // Paths in the config file are relative to the file itself.
        let cfg_base = if self.config.is_some() {
            self.config_dir.as_path()
        } else {
            self.base_dir.as_path()
        };

        let mut vars = EnvMap::new();
        let mut env_files = Vec::new();
        let env_path = match (&self.explicit_env, &cfg.env) {
            (Some(explicit), _) => Some(resolve_relative(&self.base_dir, explicit)),
            (None, Some(configured)) => Some(cfg_base.join(configured)),
            (None, None) => None,
        };
        if let Some(path) = env_path {
            load_env_file(&path, &mut vars)?;
            env_files.push(path);
        }

        let reports_dir = match &self.explicit_reports_dir {
            Some(dir) => resolve_relative(&self.base_dir, dir),
            None => cfg_base.join(&cfg.reports_dir),
        };

        let mut warnings = Vec::new();
        let smtp = SmtpSettings {
            server: cfg.smtp.server.clone(),
            port: cfg.smtp.port,
            sender_email: expand_secret(
                "smtp.senderEmail",
                cfg.smtp.sender_email.as_deref(),
                &vars,
                &mut warnings,
            ),
            sender_password: expand_secret(
                "smtp.senderPassword",
                cfg.smtp.sender_password.as_deref(),
                &vars,
                &mut warnings,
            ),
        };

        Ok(Settings {
            base_dir: self.base_dir.clone(),
            config_dir: self.config_dir.clone(),
            runner: RunnerSettings {
                program: cfg.runner.program.clone(),
                args: cfg.runner.args.clone(),
                timeout: Duration::from_secs(cfg.runner.timeout_secs),
            },
            collection: cfg_base.join(&cfg.collection),
            environment: cfg.environment.as_ref().map(|env| cfg_base.join(env)),
            collections_dir: cfg_base.join(&cfg.collections_dir),
            reports_dir,
            synthetic_fallback: self.force_demo || cfg.synthetic_fallback,
            synthetic_seed: cfg.synthetic_seed,
            catalog: ServiceCatalog::new(cfg.services.clone(), cfg.dependencies.clone()),
            smtp,
            env_files,
            warnings,
        })
    }
}

fn expand_secret(
    key: &str,
    value: Option<&str>,
    vars: &EnvMap,
    warnings: &mut Vec<String>,
) -> Option<String> {
    let raw = value.filter(|v| !v.trim().is_empty())?;
    match expand_placeholders(raw, vars) {
        Ok(expanded) => Some(expanded),
        Err(error) => {
            tracing::warn!(key, %error, "leaving setting unset");
            warnings.push(format!(
                "{key} left unset: {error} (write literal braces as \\{{ and \\}})"
            ));
            None
        }
    }
}
