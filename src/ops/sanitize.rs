use crate::model::Person;

use super::remap::GroupRemap;

/// A creatable copy of a fetched person: no identifier, no etag, no
/// metadata anywhere, no photos or file-as entries, and memberships
/// rewritten through `remap`.
pub fn sanitize(person: &Person, remap: &GroupRemap) -> Person {
    let mut clean = Person {
        names: person.names.clone(),
        nicknames: person.nicknames.clone(),
        email_addresses: person.email_addresses.clone(),
        phone_numbers: person.phone_numbers.clone(),
        addresses: person.addresses.clone(),
        organizations: person.organizations.clone(),
        birthdays: person.birthdays.clone(),
        biographies: person.biographies.clone(),
        urls: person.urls.clone(),
        user_defined: person.user_defined.clone(),
        events: person.events.clone(),
        relations: person.relations.clone(),
        memberships: remap.rewrite_memberships(&person.memberships),
        occupations: person.occupations.clone(),
        genders: person.genders.clone(),
        im_clients: person.im_clients.clone(),
        interests: person.interests.clone(),
        sip_addresses: person.sip_addresses.clone(),
        calendar_urls: person.calendar_urls.clone(),
        external_ids: person.external_ids.clone(),
        locales: person.locales.clone(),
        locations: person.locations.clone(),
        misc_keywords: person.misc_keywords.clone(),
        client_data: person.client_data.clone(),
        ..Person::default()
    };
    clean.clear_field_metadata();
    clean
}
