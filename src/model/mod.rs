pub mod person;
pub mod group;
pub mod archive;
pub mod token;

// Re-exports for convenience
pub use person::{
    Biography, Birthday, ContactGroupMembership, CustomField, Date, EmailAddress, Event, FieldEntry,
    FieldMetadata, FileAs, HasMetadata, Membership, Name, Nickname, Organization, Person,
    PhoneNumber, PostalAddress, Relation, Website, PERSON_FIELDS,
};
pub use group::{ContactGroup, GroupRef, GroupType, SystemGroup};
pub use archive::{BackupFile, BACKUP_VERSION};
pub use token::{ClientSecret, Token};
