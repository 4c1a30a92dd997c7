use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Provenance stamp the service attaches to every field-group entry.
/// It is rejected on creation, so it never survives sanitizing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FieldMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_primary: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A calendar date where any part may be unset (0).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Date {
    #[serde(skip_serializing_if = "is_zero")]
    pub year: i32,
    #[serde(skip_serializing_if = "is_zero_u32")]
    pub month: u32,
    #[serde(skip_serializing_if = "is_zero_u32")]
    pub day: u32,
}

impl Date {
    /// `YYYY-MM-DD`, or `--MM-DD` when the year is unknown.
    pub fn to_iso_string(&self) -> String {
        if self.year > 0 {
            format!("{:04}-{:02}-{:02}", self.year, self.month, self.day)
        } else {
            format!("--{:02}-{:02}", self.month, self.day)
        }
    }
}

fn is_zero(v: &i32) -> bool {
    *v == 0
}

fn is_zero_u32(v: &u32) -> bool {
    *v == 0
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Name {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<FieldMetadata>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub display_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub display_name_last_first: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub unstructured_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub family_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub given_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub middle_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub honorific_prefix: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub honorific_suffix: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub phonetic_full_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub phonetic_family_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub phonetic_given_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub phonetic_middle_name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmailAddress {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<FieldMetadata>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub value: String,
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub formatted_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub display_name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EmailAddress {
    pub fn new(value: &str, kind: &str) -> Self {
        Self {
            value: value.to_string(),
            kind: kind.to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PhoneNumber {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<FieldMetadata>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub value: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub canonical_form: String,
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub formatted_type: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PhoneNumber {
    pub fn new(value: &str, kind: &str) -> Self {
        Self {
            value: value.to_string(),
            kind: kind.to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PostalAddress {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<FieldMetadata>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub formatted_value: String,
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub formatted_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub po_box: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub street_address: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub extended_address: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub city: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub region: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub postal_code: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub country: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub country_code: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Organization {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<FieldMetadata>,
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub formatted_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub department: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<Date>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<Date>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Birthday {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<FieldMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<Date>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Biography {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<FieldMetadata>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub value: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub content_type: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Website entry (`urls` in the service's schema).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Website {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<FieldMetadata>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub value: String,
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub formatted_type: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Free-form key/value pair (`userDefined`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CustomField {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<FieldMetadata>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub key: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub value: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Event {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<FieldMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<Date>,
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub formatted_type: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Relation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<FieldMetadata>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub person: String,
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub formatted_type: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Nickname {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<FieldMetadata>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub value: String,
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileAs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<FieldMetadata>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub value: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContactGroupMembership {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub contact_group_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub contact_group_resource_name: String,
}

/// A reference from a person to a contact group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Membership {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<FieldMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_group_membership: Option<ContactGroupMembership>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_membership: Option<Value>,
}

impl Membership {
    pub fn to_group(resource_name: &str) -> Self {
        Self {
            contact_group_membership: Some(ContactGroupMembership {
                contact_group_resource_name: resource_name.to_string(),
                ..ContactGroupMembership::default()
            }),
            ..Self::default()
        }
    }

    pub fn group_resource_name(&self) -> Option<&str> {
        self.contact_group_membership
            .as_ref()
            .map(|m| m.contact_group_resource_name.as_str())
            .filter(|name| !name.is_empty())
    }
}

/// Entry of a field group this tool carries through untouched
/// (occupations, genders, IM clients, interests and the like).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<FieldMetadata>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Access to the per-entry metadata stamp.
pub trait HasMetadata {
    fn metadata(&self) -> Option<&FieldMetadata>;
    fn clear_metadata(&mut self);
}

macro_rules! impl_has_metadata {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl HasMetadata for $ty {
                fn metadata(&self) -> Option<&FieldMetadata> {
                    self.metadata.as_ref()
                }

                fn clear_metadata(&mut self) {
                    self.metadata = None;
                }
            }
        )+
    };
}

impl_has_metadata!(
    Name,
    EmailAddress,
    PhoneNumber,
    PostalAddress,
    Organization,
    Birthday,
    Biography,
    Website,
    CustomField,
    Event,
    Relation,
    Nickname,
    FileAs,
    Membership,
    FieldEntry,
);

/// One contact as the people-directory service returns it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Person {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub resource_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub etag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<Name>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nicknames: Vec<Nickname>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub file_ases: Vec<FileAs>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub email_addresses: Vec<EmailAddress>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub phone_numbers: Vec<PhoneNumber>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<PostalAddress>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub organizations: Vec<Organization>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub birthdays: Vec<Birthday>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub biographies: Vec<Biography>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub urls: Vec<Website>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub user_defined: Vec<CustomField>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<Event>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub relations: Vec<Relation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub memberships: Vec<Membership>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub photos: Vec<FieldEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub occupations: Vec<FieldEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub genders: Vec<FieldEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub im_clients: Vec<FieldEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub interests: Vec<FieldEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sip_addresses: Vec<FieldEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub calendar_urls: Vec<FieldEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub external_ids: Vec<FieldEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub locales: Vec<FieldEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<FieldEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub misc_keywords: Vec<FieldEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub client_data: Vec<FieldEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Field mask requested when listing connections.
pub const PERSON_FIELDS: &str = "names,emailAddresses,phoneNumbers,addresses,organizations,birthdays,biographies,urls,photos,userDefined,events,relations,memberships,nicknames,occupations,genders,imClients,interests,sipAddresses,calendarUrls,externalIds,locales,locations,miscKeywords,clientData";

impl Person {
    /// A person with a single structured name, not yet known to the service.
    pub fn named(given: &str, family: &str) -> Self {
        Self {
            names: vec![Name {
                given_name: given.to_string(),
                family_name: family.to_string(),
                ..Name::default()
            }],
            ..Self::default()
        }
    }

    /// True once the service has assigned an identifier.
    pub fn is_assigned(&self) -> bool {
        !self.resource_name.is_empty()
    }

    /// Every field-group entry, as metadata carriers.
    pub fn entries(&self) -> Vec<&dyn HasMetadata> {
        let mut out: Vec<&dyn HasMetadata> = Vec::new();
        out.extend(self.names.iter().map(|e| e as &dyn HasMetadata));
        out.extend(self.nicknames.iter().map(|e| e as &dyn HasMetadata));
        out.extend(self.file_ases.iter().map(|e| e as &dyn HasMetadata));
        out.extend(self.email_addresses.iter().map(|e| e as &dyn HasMetadata));
        out.extend(self.phone_numbers.iter().map(|e| e as &dyn HasMetadata));
        out.extend(self.addresses.iter().map(|e| e as &dyn HasMetadata));
        out.extend(self.organizations.iter().map(|e| e as &dyn HasMetadata));
        out.extend(self.birthdays.iter().map(|e| e as &dyn HasMetadata));
        out.extend(self.biographies.iter().map(|e| e as &dyn HasMetadata));
        out.extend(self.urls.iter().map(|e| e as &dyn HasMetadata));
        out.extend(self.user_defined.iter().map(|e| e as &dyn HasMetadata));
        out.extend(self.events.iter().map(|e| e as &dyn HasMetadata));
        out.extend(self.relations.iter().map(|e| e as &dyn HasMetadata));
        out.extend(self.memberships.iter().map(|e| e as &dyn HasMetadata));
        for group in self.passthrough_groups() {
            out.extend(group.iter().map(|e| e as &dyn HasMetadata));
        }
        out
    }

    /// Drops the metadata stamp from every field-group entry.
    pub fn clear_field_metadata(&mut self) {
        fn clear<T: HasMetadata>(entries: &mut [T]) {
            entries.iter_mut().for_each(HasMetadata::clear_metadata);
        }

        clear(&mut self.names);
        clear(&mut self.nicknames);
        clear(&mut self.file_ases);
        clear(&mut self.email_addresses);
        clear(&mut self.phone_numbers);
        clear(&mut self.addresses);
        clear(&mut self.organizations);
        clear(&mut self.birthdays);
        clear(&mut self.biographies);
        clear(&mut self.urls);
        clear(&mut self.user_defined);
        clear(&mut self.events);
        clear(&mut self.relations);
        clear(&mut self.memberships);
        clear(&mut self.photos);
        clear(&mut self.occupations);
        clear(&mut self.genders);
        clear(&mut self.im_clients);
        clear(&mut self.interests);
        clear(&mut self.sip_addresses);
        clear(&mut self.calendar_urls);
        clear(&mut self.external_ids);
        clear(&mut self.locales);
        clear(&mut self.locations);
        clear(&mut self.misc_keywords);
        clear(&mut self.client_data);
    }

    pub fn has_field_metadata(&self) -> bool {
        self.entries().iter().any(|e| e.metadata().is_some())
    }

    /// Resource names of every group this person belongs to, in order.
    pub fn group_resource_names(&self) -> impl Iterator<Item = &str> {
        self.memberships.iter().filter_map(Membership::group_resource_name)
    }

    fn passthrough_groups(&self) -> [&Vec<FieldEntry>; 12] {
        [
            &self.photos,
            &self.occupations,
            &self.genders,
            &self.im_clients,
            &self.interests,
            &self.sip_addresses,
            &self.calendar_urls,
            &self.external_ids,
            &self.locales,
            &self.locations,
            &self.misc_keywords,
            &self.client_data,
        ]
    }
}
