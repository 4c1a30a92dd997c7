use crate::directory::{DirectoryApi, DirectoryClient};
use crate::error::{BackupResult, ResultExt};
use crate::model::BackupFile;
use crate::progress::Progress;

/// The four mutation steps of a restore, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreStep {
    DeleteContacts,
    DeleteGroups,
    CreateGroups,
    CreateContacts,
}

impl RestoreStep {
    pub const ALL: [RestoreStep; 4] = [
        RestoreStep::DeleteContacts,
        RestoreStep::DeleteGroups,
        RestoreStep::CreateGroups,
        RestoreStep::CreateContacts,
    ];

    /// 1-based position, for "Step n/4" output.
    pub fn number(self) -> usize {
        match self {
            RestoreStep::DeleteContacts => 1,
            RestoreStep::DeleteGroups => 2,
            RestoreStep::CreateGroups => 3,
            RestoreStep::CreateContacts => 4,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            RestoreStep::DeleteContacts => "Deleting existing contacts",
            RestoreStep::DeleteGroups => "Deleting existing contact groups",
            RestoreStep::CreateGroups => "Creating contact groups",
            RestoreStep::CreateContacts => "Creating contacts",
        }
    }
}

/// Follows a restore as it runs.
pub trait RestoreObserver {
    fn step_started(&mut self, step: RestoreStep);

    fn step_progress(&mut self, step: RestoreStep, done: usize, total: usize);

    /// `count` is how many items the step actually processed.
    fn step_finished(&mut self, step: RestoreStep, count: usize);
}

pub struct SilentObserver;

impl RestoreObserver for SilentObserver {
    fn step_started(&mut self, _step: RestoreStep) {}
    fn step_progress(&mut self, _step: RestoreStep, _done: usize, _total: usize) {}
    fn step_finished(&mut self, _step: RestoreStep, _count: usize) {}
}

struct StepProgress<'a> {
    observer: &'a mut dyn RestoreObserver,
    step: RestoreStep,
}

impl Progress for StepProgress<'_> {
    fn report(&mut self, done: usize, total: usize) {
        self.observer.step_progress(self.step, done, total);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreSummary {
    pub contacts_deleted: usize,
    pub groups_deleted: usize,
    pub groups_created: usize,
    pub contacts_created: usize,
}

/// Replaces everything in the account with the archive's contents.
///
/// Steps run strictly in order and the first fatal error stops the run
/// with no undo. Group deletion is best-effort; group creation and
/// contact creation are not.
pub fn run_restore<A: DirectoryApi>(
    client: &DirectoryClient<A>,
    archive: &BackupFile,
    observer: &mut dyn RestoreObserver,
) -> BackupResult<RestoreSummary> {
    let mut summary = RestoreSummary::default();

    let step = RestoreStep::DeleteContacts;
    observer.step_started(step);
    summary.contacts_deleted = client
        .delete_all_records(&mut StepProgress { observer: &mut *observer, step })
        .context("failed to delete contacts")?;
    observer.step_finished(step, summary.contacts_deleted);
    tracing::info!(deleted = summary.contacts_deleted, "deleted existing contacts");

    let step = RestoreStep::DeleteGroups;
    observer.step_started(step);
    summary.groups_deleted = client
        .delete_user_categories(&mut StepProgress { observer: &mut *observer, step })
        .context("failed to delete groups")?;
    observer.step_finished(step, summary.groups_deleted);
    tracing::info!(deleted = summary.groups_deleted, "deleted user groups");

    let step = RestoreStep::CreateGroups;
    observer.step_started(step);
    let remap = client
        .create_categories(archive.groups(), &mut StepProgress { observer: &mut *observer, step })
        .context("failed to create groups")?;
    summary.groups_created = remap.len();
    observer.step_finished(step, summary.groups_created);
    tracing::info!(created = summary.groups_created, "recreated user groups");

    let step = RestoreStep::CreateContacts;
    observer.step_started(step);
    summary.contacts_created = client
        .create_records(archive.contacts(), &remap, &mut StepProgress { observer: &mut *observer, step })
        .context("failed to create contacts")?;
    observer.step_finished(step, summary.contacts_created);
    tracing::info!(created = summary.contacts_created, "recreated contacts");

    Ok(summary)
}
