use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupType {
    UserContactGroup,
    SystemContactGroup,
    #[default]
    #[serde(other)]
    GroupTypeUnspecified,
}

/// The fixed, well-known groups every account has. They can be neither
/// created nor deleted, so they never take part in remapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemGroup {
    MyContacts,
    Starred,
    ChatBuddies,
    All,
    Friends,
    Family,
    Coworkers,
    Blocked,
}

impl SystemGroup {
    pub const ALL: [SystemGroup; 8] = [
        SystemGroup::MyContacts,
        SystemGroup::Starred,
        SystemGroup::ChatBuddies,
        SystemGroup::All,
        SystemGroup::Friends,
        SystemGroup::Family,
        SystemGroup::Coworkers,
        SystemGroup::Blocked,
    ];

    pub fn resource_name(self) -> &'static str {
        match self {
            SystemGroup::MyContacts => "contactGroups/myContacts",
            SystemGroup::Starred => "contactGroups/starred",
            SystemGroup::ChatBuddies => "contactGroups/chatBuddies",
            SystemGroup::All => "contactGroups/all",
            SystemGroup::Friends => "contactGroups/friends",
            SystemGroup::Family => "contactGroups/family",
            SystemGroup::Coworkers => "contactGroups/coworkers",
            SystemGroup::Blocked => "contactGroups/blocked",
        }
    }

    pub fn from_resource_name(resource_name: &str) -> Option<SystemGroup> {
        Self::ALL
            .into_iter()
            .find(|g| g.resource_name() == resource_name)
    }

    /// Memberships in this group are carried across a restore verbatim.
    pub fn is_preserved(self) -> bool {
        self == SystemGroup::MyContacts
    }
}

/// What a membership's group reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupRef<'a> {
    System(SystemGroup),
    User(&'a str),
}

impl<'a> GroupRef<'a> {
    pub fn classify(resource_name: &'a str) -> GroupRef<'a> {
        match SystemGroup::from_resource_name(resource_name) {
            Some(system) => GroupRef::System(system),
            None => GroupRef::User(resource_name),
        }
    }
}

/// A contact group (label).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContactGroup {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub resource_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub etag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    pub group_type: GroupType,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub formatted_name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub member_resource_names: Vec<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub member_count: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn is_zero(v: &i64) -> bool {
    *v == 0
}

impl ContactGroup {
    pub fn user(resource_name: &str, name: &str) -> Self {
        Self {
            resource_name: resource_name.to_string(),
            group_type: GroupType::UserContactGroup,
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn system(group: SystemGroup, name: &str) -> Self {
        Self {
            resource_name: group.resource_name().to_string(),
            group_type: GroupType::SystemContactGroup,
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn is_user_defined(&self) -> bool {
        self.group_type == GroupType::UserContactGroup
    }
}
