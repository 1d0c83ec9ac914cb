use std::path::Path;

use crate::{config::Settings, mail::SmtpSettings, runner::ExecutionOutcome};

/// State owned by one interactive session: resolved settings and the
/// outcome of the most recent run.
#[derive(Debug)]
pub struct Session {
    settings: Settings,
    last_outcome: Option<ExecutionOutcome>,
}

impl Session {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            last_outcome: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn reports_dir(&self) -> &Path {
        &self.settings.reports_dir
    }

    pub fn smtp(&self) -> &SmtpSettings {
        &self.settings.smtp
    }

    pub fn set_smtp(&mut self, smtp: SmtpSettings) {
        self.settings.smtp = smtp;
    }

    pub fn last_outcome(&self) -> Option<&ExecutionOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn clear(&mut self) {
        self.last_outcome = None;
    }

    pub(super) fn record(&mut self, outcome: ExecutionOutcome) -> &ExecutionOutcome {
        self.last_outcome.insert(outcome)
    }
}
