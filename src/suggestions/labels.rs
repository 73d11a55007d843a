//! Inferred disambiguation labels for profile suggestions.
//!
//! When several profiles match a field, the dropdown needs a second line
//! telling them apart. Labels are built from the form's own type
//! composition, so the user is disambiguated with data the form is about to
//! ask for anyway, never with unrelated record contents.

use std::collections::HashMap;

use crate::field_types::{FieldType, FieldTypeGroup};
use crate::records::Profile;

/// Builds one label per profile from the form's field types, in form order,
/// excluding the active field's own type.
///
/// Every label starts with the profile's first `minimal_fields_shown`
/// non-empty distinguishing values. Groups of profiles whose labels still
/// collide get one more value each until they differ or run out; profiles
/// that are identical in every distinguishing field keep identical labels
/// and are left for duplicate removal to collapse.
pub fn create_inferred_labels(
    profiles: &[&Profile],
    form_types: &[FieldType],
    excluded_type: FieldType,
    minimal_fields_shown: usize,
) -> Vec<String> {
    let distinguishing = distinguishing_types(form_types, excluded_type);

    let parts: Vec<Vec<&str>> = profiles
        .iter()
        .map(|profile| {
            distinguishing
                .iter()
                .map(|&field_type| profile.value(field_type))
                .filter(|value| !value.is_empty())
                .collect()
        })
        .collect();

    let mut shown: Vec<usize> = vec![minimal_fields_shown; profiles.len()];
    loop {
        let labels: Vec<String> = parts
            .iter()
            .zip(&shown)
            .map(|(values, &count)| values[..count.min(values.len())].join(", "))
            .collect();

        let mut by_label: HashMap<&str, Vec<usize>> = HashMap::new();
        for (index, label) in labels.iter().enumerate() {
            by_label.entry(label).or_default().push(index);
        }

        let mut grew = false;
        for group in by_label.values().filter(|group| group.len() > 1) {
            for &index in group {
                if shown[index] < parts[index].len() {
                    shown[index] += 1;
                    grew = true;
                }
            }
        }
        if !grew {
            return labels;
        }
    }
}

/// Form types usable for disambiguation: known, non-payment, not the active
/// type, first occurrence only, in form order.
fn distinguishing_types(form_types: &[FieldType], excluded_type: FieldType) -> Vec<FieldType> {
    let mut types = Vec::new();
    for &field_type in form_types {
        if field_type == excluded_type
            || field_type.group() == FieldTypeGroup::Unknown
            || field_type.group() == FieldTypeGroup::Payment
            || types.contains(&field_type)
        {
            continue;
        }
        types.push(field_type);
    }
    types
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn profile(guid: &str, values: &[(FieldType, &str)]) -> Profile {
        Profile {
            guid: guid.into(),
            values: values
                .iter()
                .map(|(t, v)| (*t, v.to_string()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn test_labels_come_from_form_composition() {
        let a = profile(
            "a",
            &[
                (FieldType::NameFirst, "Alice"),
                (FieldType::EmailAddress, "alice@example.com"),
            ],
        );
        let b = profile(
            "b",
            &[
                (FieldType::NameFirst, "Bob"),
                (FieldType::EmailAddress, "bob@example.com"),
            ],
        );
        let labels = create_inferred_labels(
            &[&a, &b],
            &[FieldType::NameFirst, FieldType::EmailAddress],
            FieldType::NameFirst,
            1,
        );
        assert_eq!(labels, vec!["alice@example.com", "bob@example.com"]);
    }

    #[test]
    fn test_colliding_labels_grow_until_distinct() {
        let a = profile(
            "a",
            &[
                (FieldType::NameFirst, "Alice"),
                (FieldType::EmailAddress, "shared@example.com"),
                (FieldType::AddressHomeCity, "Rome"),
            ],
        );
        let b = profile(
            "b",
            &[
                (FieldType::NameFirst, "Alice"),
                (FieldType::EmailAddress, "shared@example.com"),
                (FieldType::AddressHomeCity, "Oslo"),
            ],
        );
        let labels = create_inferred_labels(
            &[&a, &b],
            &[
                FieldType::NameFirst,
                FieldType::EmailAddress,
                FieldType::AddressHomeCity,
            ],
            FieldType::NameFirst,
            1,
        );
        assert_eq!(
            labels,
            vec!["shared@example.com, Rome", "shared@example.com, Oslo"]
        );
    }

    #[test]
    fn test_identical_profiles_keep_identical_labels() {
        let a = profile("a", &[(FieldType::EmailAddress, "same@example.com")]);
        let b = profile("b", &[(FieldType::EmailAddress, "same@example.com")]);
        let labels = create_inferred_labels(
            &[&a, &b],
            &[FieldType::NameFirst, FieldType::EmailAddress],
            FieldType::NameFirst,
            1,
        );
        assert_eq!(labels[0], labels[1]);
    }

    #[test]
    fn test_payment_and_unknown_types_never_label() {
        let a = profile(
            "a",
            &[
                (FieldType::NameFirst, "Alice"),
                (FieldType::EmailAddress, "alice@example.com"),
            ],
        );
        let labels = create_inferred_labels(
            &[&a],
            &[
                FieldType::NameFirst,
                FieldType::Unknown,
                FieldType::CreditCardNumber,
                FieldType::EmailAddress,
            ],
            FieldType::NameFirst,
            1,
        );
        assert_eq!(labels, vec!["alice@example.com"]);
    }

    #[test]
    fn test_profile_without_distinguishing_values_gets_empty_label() {
        let a = profile("a", &[(FieldType::NameFirst, "Alice")]);
        let labels = create_inferred_labels(
            &[&a],
            &[FieldType::NameFirst, FieldType::EmailAddress],
            FieldType::NameFirst,
            1,
        );
        assert_eq!(labels, vec![""]);
    }
}
