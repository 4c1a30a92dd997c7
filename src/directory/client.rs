use std::thread;

use super::api::DirectoryApi;
use crate::config::RequestPolicy;
use crate::error::{BackupResult, ResultExt};
use crate::model::{ContactGroup, Person};
use crate::ops::remap::GroupRemap;
use crate::ops::sanitize::sanitize;
use crate::progress::{NoProgress, Progress};

/// Paged reads and batched writes against a [`DirectoryApi`], one call at
/// a time with a flat pause after each.
pub struct DirectoryClient<A> {
    api: A,
    policy: RequestPolicy,
}

impl<A: DirectoryApi> DirectoryClient<A> {
    pub fn new(api: A, policy: RequestPolicy) -> Self {
        Self { api, policy }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    fn pause(&self) {
        if !self.policy.request_delay.is_zero() {
            thread::sleep(self.policy.request_delay);
        }
    }

    /// Every contact, in service order. Progress total comes from the
    /// first page's declaration.
    pub fn list_records(&self, progress: &mut dyn Progress) -> BackupResult<Vec<Person>> {
        let mut people = Vec::new();
        let mut total = 0;
        let mut page_token: Option<String> = None;
        let mut page_number = 0;

        loop {
            page_number += 1;
            let page = self
                .api
                .list_people(page_token.as_deref(), self.policy.page_size)
                .with_context(|| format!("failed to list contacts (page {})", page_number))?;
            self.pause();

            if page_number == 1 {
                total = page.total_people;
            }
            tracing::debug!(page = page_number, count = page.connections.len(), "fetched contacts page");
            people.extend(page.connections);
            progress.report(people.len(), total);

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        Ok(people)
    }

    /// Every contact group, system groups included.
    pub fn list_categories(&self) -> BackupResult<Vec<ContactGroup>> {
        let mut groups = Vec::new();
        let mut page_token: Option<String> = None;
        let mut page_number = 0;

        loop {
            page_number += 1;
            let page = self
                .api
                .list_groups(page_token.as_deref(), self.policy.page_size)
                .with_context(|| format!("failed to list contact groups (page {})", page_number))?;
            self.pause();

            tracing::debug!(page = page_number, count = page.contact_groups.len(), "fetched groups page");
            groups.extend(page.contact_groups);

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        Ok(groups)
    }

    /// Deletes every contact in batches. A failed batch stops the run;
    /// batches already sent stay deleted. Returns the number deleted.
    pub fn delete_all_records(&self, progress: &mut dyn Progress) -> BackupResult<usize> {
        let people = self.list_records(&mut NoProgress)?;
        let total = people.len();
        let resource_names: Vec<String> = people
            .into_iter()
            .filter(Person::is_assigned)
            .map(|p| p.resource_name)
            .collect();

        let batches: Vec<&[String]> = resource_names.chunks(self.policy.delete_batch_size).collect();
        let batch_count = batches.len();
        let mut deleted = 0;

        for (i, batch) in batches.into_iter().enumerate() {
            self.api
                .batch_delete_people(batch)
                .with_context(|| {
                    format!("failed to delete contacts batch {} of {}", i + 1, batch_count)
                })?;
            self.pause();

            deleted += batch.len();
            tracing::debug!(batch = i + 1, of = batch_count, deleted, "deleted contacts batch");
            progress.report(deleted, total);
        }

        Ok(deleted)
    }

    /// Deletes user groups one by one. Failures are logged and skipped.
    /// Returns how many were actually deleted.
    pub fn delete_user_categories(&self, progress: &mut dyn Progress) -> BackupResult<usize> {
        let user_groups: Vec<ContactGroup> = self
            .list_categories()?
            .into_iter()
            .filter(ContactGroup::is_user_defined)
            .collect();
        let total = user_groups.len();
        let mut deleted = 0;

        for (i, group) in user_groups.iter().enumerate() {
            match self.api.delete_group(&group.resource_name) {
                Ok(()) => deleted += 1,
                Err(e) => tracing::warn!(
                    group = %group.name,
                    resource_name = %group.resource_name,
                    error = %e,
                    "failed to delete contact group, continuing"
                ),
            }
            self.pause();
            progress.report(i + 1, total);
        }

        Ok(deleted)
    }

    /// Recreates the user groups among `groups`, in order, and returns the
    /// old-to-new identifier table. The first failure aborts.
    pub fn create_categories(
        &self,
        groups: &[ContactGroup],
        progress: &mut dyn Progress,
    ) -> BackupResult<GroupRemap> {
        let user_groups: Vec<&ContactGroup> = groups.iter().filter(|g| g.is_user_defined()).collect();
        let total = user_groups.len();
        let mut remap = GroupRemap::new();

        for (i, group) in user_groups.into_iter().enumerate() {
            let created = self
                .api
                .create_group(&group.name)
                .with_context(|| format!("failed to create contact group {:?}", group.name))?;
            self.pause();

            tracing::debug!(old = %group.resource_name, new = %created.resource_name, "recreated group");
            remap.insert(&group.resource_name, &created.resource_name);
            progress.report(i + 1, total);
        }

        Ok(remap)
    }

    /// Sanitizes and creates `records` in batches. The first failed batch
    /// aborts; earlier batches are not undone. Returns the number created.
    pub fn create_records(
        &self,
        records: &[Person],
        remap: &GroupRemap,
        progress: &mut dyn Progress,
    ) -> BackupResult<usize> {
        let total = records.len();
        let batch_count = total.div_ceil(self.policy.create_batch_size);
        let mut created = 0;

        for (i, chunk) in records.chunks(self.policy.create_batch_size).enumerate() {
            let batch: Vec<Person> = chunk.iter().map(|p| sanitize(p, remap)).collect();
            self.api
                .batch_create_people(&batch)
                .with_context(|| {
                    format!("failed to create contacts batch {} of {}", i + 1, batch_count)
                })?;
            self.pause();

            created += batch.len();
            tracing::debug!(batch = i + 1, of = batch_count, created, "created contacts batch");
            progress.report(created, total);
        }

        Ok(created)
    }
}
