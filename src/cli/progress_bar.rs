use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::ops::restore_ops::{RestoreObserver, RestoreStep};
use crate::progress::Progress;

const BAR_TEMPLATE: &str = "{spinner:.green} {msg} [{bar:40.cyan/blue}] {pos}/{len}";
const SPINNER_TEMPLATE: &str = "{spinner:.green} {msg} {pos}";

/// A spinner that turns into a bar once a total is known. Draws to stderr.
pub struct TerminalProgress {
    bar: ProgressBar,
    sized: bool,
}

impl TerminalProgress {
    pub fn new(message: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template(SPINNER_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar, sized: false }
    }

    pub fn finish(&self) {
        self.bar.finish();
    }
}

impl Progress for TerminalProgress {
    fn report(&mut self, done: usize, total: usize) {
        if !self.sized && total > 0 {
            self.bar.set_length(total as u64);
            self.bar.set_style(
                ProgressStyle::default_bar()
                    .template(BAR_TEMPLATE)
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("█▓▒░"),
            );
            self.sized = true;
        }
        self.bar.set_position(done as u64);
    }
}

/// Renders each restore step as a heading, a bar, and a one-line result.
#[derive(Default)]
pub struct RestoreBars {
    current: Option<TerminalProgress>,
}

impl RestoreObserver for RestoreBars {
    fn step_started(&mut self, step: RestoreStep) {
        println!("Step {}/{}: {}...", step.number(), RestoreStep::ALL.len(), step.description());
        self.current = Some(TerminalProgress::new(step.description()));
    }

    fn step_progress(&mut self, _step: RestoreStep, done: usize, total: usize) {
        if let Some(bar) = self.current.as_mut() {
            bar.report(done, total);
        }
    }

    fn step_finished(&mut self, step: RestoreStep, count: usize) {
        if let Some(bar) = self.current.take() {
            bar.finish();
        }
        let line = match (step, count) {
            (RestoreStep::DeleteContacts, 0) => "No existing contacts to delete".to_string(),
            (RestoreStep::DeleteContacts, n) => format!("Deleted {} contacts", n),
            (RestoreStep::DeleteGroups, 0) => "No user-created groups to delete".to_string(),
            (RestoreStep::DeleteGroups, n) => format!("Deleted {} groups", n),
            (RestoreStep::CreateGroups, 0) => "No user-created groups to restore".to_string(),
            (RestoreStep::CreateGroups, n) => format!("Created {} groups", n),
            (RestoreStep::CreateContacts, 0) => "No contacts to restore".to_string(),
            (RestoreStep::CreateContacts, n) => format!("Created {} contacts", n),
        };
        println!("{}", line);
        println!();
    }
}
