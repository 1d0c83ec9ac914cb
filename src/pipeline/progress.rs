use std::{fmt, time::Duration};

use indicatif::{ProgressBar, ProgressStyle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Preparing,
    Running,
    Loading,
    Rendering,
    Finished,
}

impl Stage {
    fn position(self) -> u64 {
        match self {
            Stage::Preparing => 10,
            Stage::Running => 30,
            Stage::Loading => 70,
            Stage::Rendering => 90,
            Stage::Finished => 100,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Preparing => write!(f, "Preparing reports directory"),
            Stage::Running => write!(f, "Executing test runner"),
            Stage::Loading => write!(f, "Loading results"),
            Stage::Rendering => write!(f, "Rendering HTML report"),
            Stage::Finished => write!(f, "Test execution completed"),
        }
    }
}

pub trait ProgressReporter {
    fn stage(&mut self, stage: Stage);
}

/// Discards progress updates.
pub struct Silent;

impl ProgressReporter for Silent {
    fn stage(&mut self, _stage: Stage) {}
}

/// Terminal progress bar; ticks while the runner is busy.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos:>3}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }
}

impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for BarProgress {
    fn stage(&mut self, stage: Stage) {
        self.bar.set_position(stage.position());
        self.bar.set_message(stage.to_string());
        if stage == Stage::Finished {
            self.bar.finish_with_message(stage.to_string());
        }
    }
}

impl Drop for BarProgress {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.abandon();
        }
    }
}
