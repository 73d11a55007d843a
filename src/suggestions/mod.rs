//! Suggestion generation for a focused field.
//!
//! Candidates are prefix matches of the field's current text against stored
//! values for the field's effective type. Profile rows carry inferred labels
//! and no icons; card rows carry a masked label and the brand icon. Warning
//! rows replace the whole list when filling is not allowed at all.

pub mod labels;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::field_types::{FieldType, FieldTypeGroup};
use crate::form::parsed::ParsedForm;
use crate::form::FormField;
use crate::opaque_ids::{OpaqueIdTable, INVALID_UNIQUE_ID};
use crate::records::{PaymentCard, Profile};

/// Why a warning row replaced the suggestion list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    AutofillDisabled,
    InsecurePayment,
}

impl WarningKind {
    /// Fixed English message; localization belongs to the host.
    pub fn message(self) -> &'static str {
        match self {
            WarningKind::AutofillDisabled => "Form autofill is disabled.",
            WarningKind::InsecurePayment => {
                "Payment autofill is disabled because this form does not use a secure connection."
            }
        }
    }
}

/// Suggestion rows as four index-aligned arrays, the shape the host UI
/// consumes them in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuggestionSet {
    pub values: Vec<String>,
    pub labels: Vec<String>,
    pub icons: Vec<String>,
    pub unique_ids: Vec<i32>,
}

impl SuggestionSet {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// A single warning row with the reserved invalid id.
    pub fn warning(kind: WarningKind) -> Self {
        SuggestionSet {
            values: vec![kind.message().to_string()],
            labels: vec![String::new()],
            icons: vec![String::new()],
            unique_ids: vec![INVALID_UNIQUE_ID],
        }
    }

    /// True when the set is exactly one warning row.
    pub fn is_warning(&self) -> bool {
        self.unique_ids == [INVALID_UNIQUE_ID]
    }

    /// Clears every label and icon, keeping values and ids.
    pub fn blank_labels_and_icons(&mut self) {
        for label in &mut self.labels {
            label.clear();
        }
        for icon in &mut self.icons {
            icon.clear();
        }
    }

    /// Removes rows whose `(value, label)` pair was already seen, keeping
    /// the first occurrence and the original order. Idempotent.
    pub fn remove_duplicates(&mut self) {
        self.debug_check_aligned();
        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut values = Vec::with_capacity(self.values.len());
        let mut labels = Vec::with_capacity(self.labels.len());
        let mut icons = Vec::with_capacity(self.icons.len());
        let mut unique_ids = Vec::with_capacity(self.unique_ids.len());
        for i in 0..self.values.len() {
            if seen.insert((self.values[i].clone(), self.labels[i].clone())) {
                values.push(self.values[i].clone());
                labels.push(self.labels[i].clone());
                icons.push(self.icons[i].clone());
                unique_ids.push(self.unique_ids[i]);
            }
        }
        self.values = values;
        self.labels = labels;
        self.icons = icons;
        self.unique_ids = unique_ids;
    }

    pub(crate) fn debug_check_aligned(&self) {
        debug_assert_eq!(self.values.len(), self.labels.len());
        debug_assert_eq!(self.values.len(), self.icons.len());
        debug_assert_eq!(self.values.len(), self.unique_ids.len());
    }
}

/// Profile candidates for an identity-group target field. `field` is the
/// live field, whose current text narrows the matches as the user types.
pub fn profile_suggestions(
    form: &ParsedForm,
    target_type: FieldType,
    field: &FormField,
    profiles: &[Profile],
    ids: &mut OpaqueIdTable,
) -> SuggestionSet {
    debug_assert_ne!(target_type.group(), FieldTypeGroup::Payment);

    let mut set = SuggestionSet::default();
    let mut matched_profiles: Vec<&Profile> = Vec::new();
    for profile in profiles {
        let stored = profile.value(target_type);
        if !stored.is_empty() && starts_with_ignore_case(stored, &field.value) {
            matched_profiles.push(profile);
            set.values.push(stored.to_string());
            set.unique_ids.push(ids.pack("", &profile.guid));
        }
    }

    let form_types: Vec<FieldType> = form.fields().iter().map(|f| f.effective_type()).collect();
    set.labels = labels::create_inferred_labels(&matched_profiles, &form_types, target_type, 1);

    // No icons for profile suggestions.
    set.icons = vec![String::new(); set.values.len()];
    set.debug_check_aligned();
    set
}

/// Card candidates for a payment-group target field.
pub fn card_suggestions(
    target_type: FieldType,
    field: &FormField,
    cards: &[PaymentCard],
    ids: &mut OpaqueIdTable,
) -> SuggestionSet {
    debug_assert_eq!(target_type.group(), FieldTypeGroup::Payment);

    let mut set = SuggestionSet::default();
    for card in cards {
        let stored = card.value(target_type);
        if stored.is_empty() || !starts_with_ignore_case(stored, &field.value) {
            continue;
        }
        // Never show the full card number.
        let display = if target_type == FieldType::CreditCardNumber {
            card.masked_number()
        } else {
            stored.to_string()
        };
        set.values.push(display);
        set.labels.push(format!("*{}", card.last_four_digits()));
        set.icons.push(card.brand.clone());
        set.unique_ids.push(ids.pack(&card.guid, ""));
    }
    set.debug_check_aligned();
    set
}

fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    value.to_lowercase().starts_with(&prefix.to_lowercase())
}
