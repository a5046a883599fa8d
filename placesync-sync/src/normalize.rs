//! Remote entity → canonical entity.
//!
//! Absent text fields become empty strings, the postal address is flattened
//! into three fields, and all phone numbers are collected into
//! `phone_repeater`. Empty values are then dropped so that writing the
//! metadata never blanks an existing field. The join key is always kept.

use std::collections::BTreeMap;

use placesync_core::{types::fields, ExternalKey, MetaValue, PhoneEntry, ENTITY_API_ID};

use crate::remote::RemoteEntity;

/// Normalized, language-tagged form of one remote entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalEntity {
    /// May be empty; such entities are never written.
    pub title: String,
    pub external_key: ExternalKey,
    /// Field name → value, including [`ENTITY_API_ID`]. Never holds empty values.
    pub metadata: BTreeMap<String, MetaValue>,
}

impl CanonicalEntity {
    pub fn has_title(&self) -> bool {
        !self.title.is_empty()
    }
}

/// Normalize one remote entity. Pure and deterministic.
pub fn normalize(entity: &RemoteEntity) -> CanonicalEntity {
    let external_key = ExternalKey::new(entity.id, &entity.langcode);
    let title = text(&entity.title);
    let address = entity.field_address_postal.clone().unwrap_or_default();

    let mut metadata: BTreeMap<String, MetaValue> = [
        (fields::TITLE, title.clone()),
        (fields::SUMMARY, text(&entity.field_summary)),
        (fields::DESCRIPTION, text(&entity.field_body_md)),
        (
            fields::ADDITIONAL_INFORMATION,
            text(&entity.field_additional_information),
        ),
        (fields::MAIL_ADDRESS_STREET, text(&address.address_line1)),
        (fields::MAIL_ADDRESS_ZIP_CODE, text(&address.postal_code)),
        (fields::MAIL_ADDRESS_CITY, text(&address.locality)),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_owned(), MetaValue::Text(value)))
    .collect();

    metadata.insert(
        fields::PHONE_REPEATER.to_owned(),
        MetaValue::Phones(phone_numbers(entity)),
    );
    metadata.retain(|_, value| !value.is_empty());
    metadata.insert(
        ENTITY_API_ID.to_owned(),
        MetaValue::Text(external_key.to_string()),
    );

    CanonicalEntity {
        title,
        external_key,
        metadata,
    }
}

/// Primary phone first, then the additional phones in source order.
fn phone_numbers(entity: &RemoteEntity) -> Vec<PhoneEntry> {
    let mut phones = Vec::new();

    if let Some(number) = entity.field_phone.as_deref().filter(|n| !n.is_empty()) {
        phones.push(PhoneEntry {
            phone_number: number.to_owned(),
            phone_text: text(&entity.phone_supplementary),
        });
    }

    for phone in entity.field_additinal_phones.iter().flatten() {
        phones.push(PhoneEntry {
            phone_number: text(&phone.telephone_number),
            phone_text: text(&phone.telephone_supplementary),
        });
    }

    phones
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{AdditionalPhone, PostalAddress};

    fn entity(id: i64, title: &str) -> RemoteEntity {
        RemoteEntity {
            id,
            langcode: "fi".into(),
            title: Some(title.into()),
            ..RemoteEntity::default()
        }
    }

    fn phones_of(canonical: &CanonicalEntity) -> Vec<PhoneEntry> {
        match canonical.metadata.get(fields::PHONE_REPEATER) {
            Some(MetaValue::Phones(p)) => p.clone(),
            other => panic!("expected phone list, got {other:?}"),
        }
    }

    #[test]
    fn external_key_joins_id_and_langcode() {
        let canonical = normalize(&entity(12, "A"));
        assert_eq!(canonical.external_key.as_str(), "12-fi");
        assert_eq!(
            canonical.metadata.get(ENTITY_API_ID),
            Some(&MetaValue::from("12-fi"))
        );
    }

    #[test]
    fn no_phone_data_omits_phone_repeater() {
        let canonical = normalize(&entity(1, "A"));
        assert!(!canonical.metadata.contains_key(fields::PHONE_REPEATER));
    }

    #[test]
    fn primary_phone_comes_before_additional_phones() {
        let mut remote = entity(1, "A");
        remote.field_phone = Some("03 111".into());
        remote.phone_supplementary = Some("vaihde".into());
        remote.field_additinal_phones = Some(vec![
            AdditionalPhone {
                telephone_number: Some("03 222".into()),
                telephone_supplementary: Some("neuvonta".into()),
            },
            AdditionalPhone {
                telephone_number: Some("03 333".into()),
                telephone_supplementary: None,
            },
        ]);

        let phones = phones_of(&normalize(&remote));
        let numbers: Vec<_> = phones.iter().map(|p| p.phone_number.as_str()).collect();
        assert_eq!(numbers, vec!["03 111", "03 222", "03 333"]);
        assert_eq!(phones[0].phone_text, "vaihde");
        assert_eq!(phones[1].phone_text, "neuvonta");
        assert_eq!(phones[2].phone_text, "");
    }

    #[test]
    fn additional_phones_without_primary() {
        let mut remote = entity(1, "A");
        remote.field_phone = Some(String::new());
        remote.field_additinal_phones = Some(vec![AdditionalPhone {
            telephone_number: Some("040 1".into()),
            telephone_supplementary: None,
        }]);
        let phones = phones_of(&normalize(&remote));
        assert_eq!(phones.len(), 1);
        assert_eq!(phones[0].phone_number, "040 1");
    }

    #[test]
    fn empty_additional_phone_list_is_suppressed() {
        let mut remote = entity(1, "A");
        remote.field_additinal_phones = Some(vec![]);
        assert!(!normalize(&remote)
            .metadata
            .contains_key(fields::PHONE_REPEATER));
    }

    #[test]
    fn address_is_flattened() {
        let mut remote = entity(1, "A");
        remote.field_address_postal = Some(PostalAddress {
            address_line1: Some("Pirkankatu 2".into()),
            postal_code: Some("33210".into()),
            locality: Some("Tampere".into()),
        });
        let meta = normalize(&remote).metadata;
        assert_eq!(meta[fields::MAIL_ADDRESS_STREET], MetaValue::from("Pirkankatu 2"));
        assert_eq!(meta[fields::MAIL_ADDRESS_ZIP_CODE], MetaValue::from("33210"));
        assert_eq!(meta[fields::MAIL_ADDRESS_CITY], MetaValue::from("Tampere"));
    }

    #[test]
    fn absent_fields_are_dropped_not_blanked() {
        let meta = normalize(&entity(1, "A")).metadata;
        let keys: Vec<_> = meta.keys().map(String::as_str).collect();
        assert_eq!(keys, vec![ENTITY_API_ID, fields::TITLE]);
        assert!(meta.values().all(|v| !v.is_empty()));
    }

    #[test]
    fn blank_title_still_normalizes_and_keeps_join_key() {
        let mut remote = entity(4, "");
        remote.field_summary = Some("still here".into());
        let canonical = normalize(&remote);
        assert!(!canonical.has_title());
        assert!(!canonical.metadata.contains_key(fields::TITLE));
        assert_eq!(canonical.external_key.as_str(), "4-fi");
        assert!(canonical.metadata.contains_key(ENTITY_API_ID));
        assert!(canonical.metadata.contains_key(fields::SUMMARY));
    }

    #[test]
    fn whitespace_title_counts_as_title() {
        let canonical = normalize(&entity(5, " "));
        assert!(canonical.has_title());
        assert_eq!(canonical.metadata[fields::TITLE], MetaValue::from(" "));
    }

    #[test]
    fn normalize_is_deterministic() {
        let mut remote = entity(9, "B");
        remote.field_body_md = Some("**body**".into());
        assert_eq!(normalize(&remote), normalize(&remote));
    }
}
