use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{BackupError, BackupResult, ResultExt};
use crate::model::{BackupFile, Date, GroupRef, Person};

/// Joins multiple group names inside the Labels column.
pub const LABEL_SEPARATOR: &str = " ::: ";

const SINGULAR_COLUMNS: [&str; 14] = [
    "Name Prefix",
    "First Name",
    "Middle Name",
    "Last Name",
    "Name Suffix",
    "Phonetic First Name",
    "Phonetic Middle Name",
    "Phonetic Last Name",
    "Nickname",
    "File As",
    "Birthday",
    "Organization Name",
    "Organization Title",
    "Organization Department",
];

const ADDRESS_PARTS: [&str; 8] = [
    "Label",
    "Street",
    "Extended Address",
    "City",
    "Region",
    "Postal Code",
    "Country",
    "PO Box",
];

const TRAILING_COLUMNS: [&str; 2] = ["Notes", "Labels"];

/// How many column blocks each repeated field group gets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldCounts {
    pub emails: usize,
    pub phones: usize,
    pub addresses: usize,
    pub events: usize,
    pub relations: usize,
    pub websites: usize,
    pub custom_fields: usize,
}

impl FieldCounts {
    /// Largest occurrence of each group across `contacts`.
    pub fn scan(contacts: &[Person]) -> Self {
        contacts.iter().fold(Self::default(), |acc, c| Self {
            emails: acc.emails.max(c.email_addresses.len()),
            phones: acc.phones.max(c.phone_numbers.len()),
            addresses: acc.addresses.max(c.addresses.len()),
            events: acc.events.max(c.events.len()),
            relations: acc.relations.max(c.relations.len()),
            websites: acc.websites.max(c.urls.len()),
            custom_fields: acc.custom_fields.max(c.user_defined.len()),
        })
    }

    /// At least one email and one phone block, so every export has them.
    pub fn with_minimum_shape(self) -> Self {
        Self {
            emails: self.emails.max(1),
            phones: self.phones.max(1),
            ..self
        }
    }

    pub fn column_count(&self) -> usize {
        SINGULAR_COLUMNS.len()
            + 2 * (self.emails + self.phones + self.events + self.relations + self.websites + self.custom_fields)
            + ADDRESS_PARTS.len() * self.addresses
            + TRAILING_COLUMNS.len()
    }
}

fn pair_headers(headers: &mut Vec<String>, group: &str, count: usize) {
    for i in 1..=count {
        headers.push(format!("{} {} - Label", group, i));
        headers.push(format!("{} {} - Value", group, i));
    }
}

pub fn build_headers(counts: &FieldCounts) -> Vec<String> {
    let mut headers: Vec<String> = SINGULAR_COLUMNS.iter().map(|c| c.to_string()).collect();

    pair_headers(&mut headers, "Email", counts.emails);
    pair_headers(&mut headers, "Phone", counts.phones);
    for i in 1..=counts.addresses {
        headers.extend(ADDRESS_PARTS.iter().map(|part| format!("Address {} - {}", i, part)));
    }
    pair_headers(&mut headers, "Event", counts.events);
    pair_headers(&mut headers, "Relation", counts.relations);
    pair_headers(&mut headers, "Website", counts.websites);
    pair_headers(&mut headers, "Custom Field", counts.custom_fields);

    headers.extend(TRAILING_COLUMNS.iter().map(|c| c.to_string()));
    headers
}

/// Emits exactly `count` blocks of `width` cells: one per entry, then blanks.
fn push_blocks<T>(
    row: &mut Vec<String>,
    entries: &[T],
    count: usize,
    width: usize,
    cells: impl Fn(&T) -> Vec<String>,
) {
    for i in 0..count {
        match entries.get(i) {
            Some(entry) => row.extend(cells(entry)),
            None => row.extend(std::iter::repeat(String::new()).take(width)),
        }
    }
}

fn format_date(date: Option<&Date>) -> String {
    date.map(Date::to_iso_string).unwrap_or_default()
}

/// One row for `person`, shaped by `counts`.
pub fn person_row(person: &Person, counts: &FieldCounts, group_names: &HashMap<&str, &str>) -> Vec<String> {
    let mut row = Vec::with_capacity(counts.column_count());

    let name = person.names.first().cloned().unwrap_or_default();
    let org = person.organizations.first().cloned().unwrap_or_default();
    let birthday = person
        .birthdays
        .first()
        .map(|b| format_date(b.date.as_ref()))
        .unwrap_or_default();

    row.extend([
        name.honorific_prefix,
        name.given_name,
        name.middle_name,
        name.family_name,
        name.honorific_suffix,
        name.phonetic_given_name,
        name.phonetic_middle_name,
        name.phonetic_family_name,
        person.nicknames.first().map(|n| n.value.clone()).unwrap_or_default(),
        person.file_ases.first().map(|f| f.value.clone()).unwrap_or_default(),
        birthday,
        org.name,
        org.title,
        org.department,
    ]);

    push_blocks(&mut row, &person.email_addresses, counts.emails, 2, |e| {
        vec![normalize_label(&e.kind), e.value.clone()]
    });
    push_blocks(&mut row, &person.phone_numbers, counts.phones, 2, |p| {
        vec![normalize_label(&p.kind), p.value.clone()]
    });
    push_blocks(&mut row, &person.addresses, counts.addresses, ADDRESS_PARTS.len(), |a| {
        vec![
            normalize_label(&a.kind),
            a.street_address.clone(),
            a.extended_address.clone(),
            a.city.clone(),
            a.region.clone(),
            a.postal_code.clone(),
            a.country.clone(),
            a.po_box.clone(),
        ]
    });
    push_blocks(&mut row, &person.events, counts.events, 2, |e| {
        vec![normalize_label(&e.kind), format_date(e.date.as_ref())]
    });
    push_blocks(&mut row, &person.relations, counts.relations, 2, |r| {
        vec![normalize_label(&r.kind), r.person.clone()]
    });
    push_blocks(&mut row, &person.urls, counts.websites, 2, |w| {
        vec![normalize_label(&w.kind), w.value.clone()]
    });
    push_blocks(&mut row, &person.user_defined, counts.custom_fields, 2, |c| {
        vec![c.key.clone(), c.value.clone()]
    });

    row.push(person.biographies.first().map(|b| b.value.clone()).unwrap_or_default());
    row.push(extract_labels(person, group_names).join(LABEL_SEPARATOR));
    row
}

/// Service type values as display labels: `TYPE_HOME` and `home` both
/// become `Home`, `homeFax` becomes `Home Fax`. Unknown values are
/// lowercased with the first letter capitalized.
pub fn normalize_label(label: &str) -> String {
    let lower = label.strip_prefix("TYPE_").unwrap_or(label).to_lowercase();
    match lower.as_str() {
        "" => String::new(),
        "homefax" => "Home Fax".to_string(),
        "workfax" => "Work Fax".to_string(),
        _ => {
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        }
    }
}

/// Names of the user groups `person` belongs to, in membership order.
/// System groups and groups missing from `group_names` are skipped.
pub fn extract_labels<'a>(person: &Person, group_names: &HashMap<&str, &'a str>) -> Vec<&'a str> {
    person
        .group_resource_names()
        .filter_map(|resource_name| match GroupRef::classify(resource_name) {
            GroupRef::System(_) => None,
            GroupRef::User(id) => group_names.get(id).copied(),
        })
        .collect()
}

/// Renders the whole archive as CSV text.
pub fn render_tabular(archive: &BackupFile) -> BackupResult<Vec<u8>> {
    let group_names: HashMap<&str, &str> = archive
        .groups()
        .iter()
        .filter(|g| g.is_user_defined())
        .map(|g| (g.resource_name.as_str(), g.name.as_str()))
        .collect();
    let counts = FieldCounts::scan(archive.contacts()).with_minimum_shape();

    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(build_headers(&counts))?;
    for person in archive.contacts() {
        wtr.write_record(person_row(person, &counts, &group_names))?;
    }
    wtr.into_inner().map_err(|e| BackupError::Io(e.into_error()))
}

/// Lossy spreadsheet export. There is no way back from this format.
pub fn save_tabular(archive: &BackupFile, path: &Path) -> BackupResult<()> {
    let data = render_tabular(archive).context("failed to render CSV")?;
    fs::write(path, data).with_context(|| format!("failed to write CSV file {}", path.display()))?;
    tracing::debug!(path = %path.display(), contacts = archive.contact_count(), "wrote CSV export");
    Ok(())
}
