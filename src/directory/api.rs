use serde::{Deserialize, Serialize};

use crate::error::BackupResult;
use crate::model::{ContactGroup, Person};

/// One page of the connections listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PeoplePage {
    pub connections: Vec<Person>,
    pub next_page_token: Option<String>,
    /// Declared size of the whole listing; 0 when the service omits it.
    pub total_people: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GroupPage {
    pub contact_groups: Vec<ContactGroup>,
    pub next_page_token: Option<String>,
}

/// The remote people-directory service, one request per method.
///
/// Implementations surface failures verbatim; batching, paging and rate
/// limiting live in [`super::DirectoryClient`].
pub trait DirectoryApi {
    fn list_people(&self, page_token: Option<&str>, page_size: usize) -> BackupResult<PeoplePage>;

    fn list_groups(&self, page_token: Option<&str>, page_size: usize) -> BackupResult<GroupPage>;

    fn batch_delete_people(&self, resource_names: &[String]) -> BackupResult<()>;

    /// Deletes the group itself; its members are kept.
    fn delete_group(&self, resource_name: &str) -> BackupResult<()>;

    fn create_group(&self, name: &str) -> BackupResult<ContactGroup>;

    fn batch_create_people(&self, people: &[Person]) -> BackupResult<()>;
}
