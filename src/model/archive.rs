use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::group::ContactGroup;
use super::person::Person;

/// Current version of the structured backup format.
pub const BACKUP_VERSION: &str = "1.0";

/// One backup: every contact and every group, captured together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupFile {
    #[serde(default)]
    pub version: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    contact_count: usize,
    #[serde(default)]
    group_count: usize,
    #[serde(default)]
    contacts: Vec<Person>,
    #[serde(default)]
    groups: Vec<ContactGroup>,
}

impl BackupFile {
    pub fn create() -> Self {
        Self {
            version: BACKUP_VERSION.to_string(),
            created_at: Utc::now(),
            contact_count: 0,
            group_count: 0,
            contacts: Vec::new(),
            groups: Vec::new(),
        }
    }

    pub fn add_contact(&mut self, contact: Person) {
        self.contacts.push(contact);
        self.contact_count = self.contacts.len();
    }

    pub fn add_group(&mut self, group: ContactGroup) {
        self.groups.push(group);
        self.group_count = self.groups.len();
    }

    pub fn contact_count(&self) -> usize {
        self.contact_count
    }

    pub fn group_count(&self) -> usize {
        self.group_count
    }

    pub fn contacts(&self) -> &[Person] {
        &self.contacts
    }

    pub fn groups(&self) -> &[ContactGroup] {
        &self.groups
    }

    /// True when the stored counts disagree with the lists they describe.
    pub fn counts_mismatch(&self) -> bool {
        self.contact_count != self.contacts.len() || self.group_count != self.groups.len()
    }

    /// Re-derives the stored counts from the lists.
    pub fn recount(&mut self) {
        self.contact_count = self.contacts.len();
        self.group_count = self.groups.len();
    }
}
