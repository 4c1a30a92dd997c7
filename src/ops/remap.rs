use std::collections::HashMap;

use crate::model::{GroupRef, Membership};

/// Old → new identifiers of the user groups recreated during a restore.
/// System groups never appear here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupRemap {
    table: HashMap<String, String>,
}

impl GroupRemap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, old: &str, new: &str) {
        debug_assert!(
            matches!(GroupRef::classify(old), GroupRef::User(_)),
            "system group {} in remap table",
            old
        );
        self.table.insert(old.to_string(), new.to_string());
    }

    pub fn resolve(&self, old: &str) -> Option<&str> {
        self.table.get(old).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Memberships as they should be submitted to the new account: the
    /// preserved system group verbatim, user groups rewritten, anything
    /// else dropped.
    pub fn rewrite_memberships(&self, memberships: &[Membership]) -> Vec<Membership> {
        memberships
            .iter()
            .filter_map(|membership| {
                let resource_name = membership.group_resource_name()?;
                match GroupRef::classify(resource_name) {
                    GroupRef::System(group) if group.is_preserved() => Some(Membership {
                        metadata: None,
                        ..membership.clone()
                    }),
                    GroupRef::System(_) => None,
                    GroupRef::User(old) => self.resolve(old).map(Membership::to_group),
                }
            })
            .collect()
    }
}

impl FromIterator<(String, String)> for GroupRemap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut remap = GroupRemap::new();
        for (old, new) in iter {
            remap.insert(&old, &new);
        }
        remap
    }
}
