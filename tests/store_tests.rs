use std::fs;

use contacts_backup::error::BackupError;
use contacts_backup::model::*;
use contacts_backup::ops::backup_ops::{self, ExportFormat};
use contacts_backup::store::csv_export::{self, FieldCounts, LABEL_SEPARATOR};
use contacts_backup::store::json_store;
use serde_json::json;
use tempfile::TempDir;

fn setup() -> (TempDir, BackupFile) {
    let dir = TempDir::new().unwrap();

    let mut archive = BackupFile::create();
    archive.add_group(ContactGroup::system(SystemGroup::MyContacts, "myContacts"));
    archive.add_group(ContactGroup::user("contactGroups/abc", "Climbing"));

    let mut first = Person::named("Ada", "Lovelace");
    first.resource_name = "people/c1".into();
    first.email_addresses = vec![
        EmailAddress::new("ada@home.test", "home"),
        EmailAddress::new("ada@work.test", "work"),
    ];
    first.memberships = vec![
        Membership::to_group("contactGroups/myContacts"),
        Membership::to_group("contactGroups/abc"),
    ];
    archive.add_contact(first);

    let mut second = Person::named("Alan", "Turing");
    second.resource_name = "people/c2".into();
    second.phone_numbers = vec![PhoneNumber::new("+44 20 7946 0000", "mobile")];
    archive.add_contact(second);

    (dir, archive)
}

// ==========================================================================
// STRUCTURED FORMAT TESTS
// ==========================================================================

#[test]
fn structured_round_trip_is_lossless() {
    let (dir, mut archive) = setup();
    let mut rich = Person::named("Grace", "Hopper");
    rich.resource_name = "people/c3".into();
    rich.etag = "%EgcBAgkLLjc9".into();
    rich.metadata = Some(json!({"sources": [{"type": "CONTACT", "id": "3"}]}));
    rich.names[0].metadata = Some(FieldMetadata {
        primary: Some(true),
        source: Some(json!({"type": "CONTACT"})),
        ..FieldMetadata::default()
    });
    rich.birthdays.push(Birthday {
        date: Some(Date { year: 1906, month: 12, day: 9 }),
        ..Birthday::default()
    });
    rich.extra.insert("coverPhotos".into(), json!([{"url": "https://example.test/c.jpg"}]));
    archive.add_contact(rich);

    let path = dir.path().join("backup.json");
    json_store::save_structured(&archive, &path).unwrap();
    let loaded = json_store::load_structured(&path).unwrap();

    assert_eq!(loaded, archive);
    assert_eq!(loaded.contacts()[2].extra["coverPhotos"][0]["url"], "https://example.test/c.jpg");
}

#[test]
fn structured_file_uses_archive_field_names() {
    let (dir, archive) = setup();
    let path = dir.path().join("backup.json");
    json_store::save_structured(&archive, &path).unwrap();

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value["version"], "1.0");
    assert_eq!(value["contact_count"], 2);
    assert_eq!(value["group_count"], 2);
    assert_eq!(value["contacts"][0]["emailAddresses"][1]["type"], "work");
    assert_eq!(value["groups"][1]["groupType"], "USER_CONTACT_GROUP");
}

#[test]
fn archive_without_version_is_rejected_before_use() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("old.json");
    fs::write(
        &path,
        r#"{"created_at": "2023-11-02T08:00:00Z", "contact_count": 0, "group_count": 0,
            "contacts": [], "groups": []}"#,
    )
    .unwrap();

    let err = json_store::load_structured(&path).unwrap_err();
    assert!(matches!(err, BackupError::InvalidArchive { .. }));
}

// ==========================================================================
// TABULAR FORMAT TESTS
// ==========================================================================

fn read_csv(path: &std::path::Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let headers = reader.headers().unwrap().iter().map(String::from).collect();
    let rows = reader
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect();
    (headers, rows)
}

#[test]
fn tabular_export_sizes_columns_to_widest_record() {
    let (dir, archive) = setup();
    let path = dir.path().join("contacts.csv");
    csv_export::save_tabular(&archive, &path).unwrap();

    let (headers, rows) = read_csv(&path);
    assert_eq!(rows.len(), 2);

    let email_labels: Vec<_> = headers
        .iter()
        .filter(|h| h.starts_with("Email ") && h.ends_with(" - Label"))
        .collect();
    assert_eq!(email_labels, vec!["Email 1 - Label", "Email 2 - Label"]);

    let col = |name: &str| headers.iter().position(|h| h == name).unwrap();
    assert_eq!(rows[0][col("Email 1 - Label")], "Home");
    assert_eq!(rows[0][col("Email 2 - Value")], "ada@work.test");
    for name in ["Email 1 - Label", "Email 1 - Value", "Email 2 - Label", "Email 2 - Value"] {
        assert_eq!(rows[1][col(name)], "", "{}", name);
    }
    assert_eq!(rows[1][col("Phone 1 - Label")], "Mobile");
}

#[test]
fn tabular_labels_column_names_user_groups() {
    let (dir, mut archive) = setup();
    archive.add_group(ContactGroup::user("contactGroups/def", "Book club"));
    let mut third = Person::named("Edsger", "Dijkstra");
    third.memberships = vec![
        Membership::to_group("contactGroups/abc"),
        Membership::to_group("contactGroups/starred"),
        Membership::to_group("contactGroups/def"),
    ];
    archive.add_contact(third);

    let path = dir.path().join("contacts.csv");
    csv_export::save_tabular(&archive, &path).unwrap();
    let (headers, rows) = read_csv(&path);

    let labels = headers.iter().position(|h| h == "Labels").unwrap();
    assert_eq!(labels, headers.len() - 1);
    assert_eq!(rows[0][labels], "Climbing");
    assert_eq!(rows[1][labels], "");
    assert_eq!(rows[2][labels], format!("Climbing{}Book club", LABEL_SEPARATOR));
}

#[test]
fn tabular_header_count_matches_closed_form() {
    let (_dir, archive) = setup();
    let counts = FieldCounts::scan(archive.contacts()).with_minimum_shape();
    assert_eq!(counts.emails, 2);
    assert_eq!(counts.phones, 1);
    assert_eq!(counts.addresses, 0);

    let headers = csv_export::build_headers(&counts);
    assert_eq!(headers.len(), 14 + 2 * 2 + 2 * 1 + 2);
}

#[test]
fn write_archive_dispatches_on_format() {
    let (dir, archive) = setup();
    let json_path = dir.path().join("out.json");
    let csv_path = dir.path().join("out.csv");

    backup_ops::write_archive(&archive, ExportFormat::Json, &json_path).unwrap();
    backup_ops::write_archive(&archive, ExportFormat::Csv, &csv_path).unwrap();

    assert!(fs::read_to_string(&json_path).unwrap().trim_start().starts_with('{'));
    assert!(fs::read_to_string(&csv_path).unwrap().starts_with("Name Prefix,"));
}

#[test]
fn write_into_missing_directory_fails_with_context() {
    let (dir, archive) = setup();
    let path = dir.path().join("no-such-dir").join("out.json");

    let err = backup_ops::write_archive(&archive, ExportFormat::Json, &path).unwrap_err();
    assert!(err.to_string().starts_with("failed to save backup"));
    assert!(matches!(err.root(), BackupError::Io(_)));
    assert!(!path.exists());
}
