mod loader;
mod settings;

pub use loader::{
    load_config, DependencyConfig, LoadedConfig, RunboardConfig, RunnerConfig, SmtpConfig,
    CONFIG_FILE_NAME,
};
pub use settings::{Settings, SettingsBuilder};
