//! Personal data records and the store boundary.
//!
//! The engine never owns profile or card data. It reads records through
//! [`PersonalDataStore`] and hands detected imports back through the same
//! trait. [`MemoryStore`] is the bundled reference implementation used by
//! the C FFI layer and the test suites; real hosts wrap their own storage.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::field_types::{FieldType, FieldTypeGroup, FieldTypeSet};
use crate::form::parsed::ParsedForm;

/// A stored identity record: one person's name, address, contact details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Profile {
    pub guid: String,
    /// Text value per field type. Identity, phone and fax types only.
    #[serde(default)]
    pub values: BTreeMap<FieldType, String>,
}

impl Profile {
    /// Stored text for a type; empty when the profile has none.
    pub fn value(&self, field_type: FieldType) -> &str {
        self.values.get(&field_type).map(String::as_str).unwrap_or("")
    }
}

/// A stored payment card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PaymentCard {
    pub guid: String,
    /// Issuer label shown as the suggestion icon, e.g. "Visa".
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub values: BTreeMap<FieldType, String>,
}

impl PaymentCard {
    /// Stored text for a type; empty when the card has none.
    pub fn value(&self, field_type: FieldType) -> &str {
        self.values.get(&field_type).map(String::as_str).unwrap_or("")
    }

    /// Card number with all but the last four digits replaced by `*`.
    pub fn masked_number(&self) -> String {
        let number = self.value(FieldType::CreditCardNumber);
        let count = number.chars().count();
        if count <= 4 {
            return number.to_string();
        }
        let last: String = number.chars().skip(count - 4).collect();
        format!("{}{}", "*".repeat(count - 4), last)
    }

    /// Last four digits of the number; empty when it is shorter than four.
    pub fn last_four_digits(&self) -> String {
        let number = self.value(FieldType::CreditCardNumber);
        let count = number.chars().count();
        if count < 4 {
            return String::new();
        }
        number.chars().skip(count - 4).collect()
    }
}

/// Host-owned record storage, as seen from the engine.
///
/// `possible_field_types` must never return an empty set: a blank value maps
/// to `{Empty}` and an unrecognized one to `{Unknown}`.
pub trait PersonalDataStore {
    fn profiles(&self) -> &[Profile];

    fn payment_cards(&self) -> &[PaymentCard];

    /// Every type whose stored value equals `value`, compared
    /// case-insensitively across all records.
    fn possible_field_types(&self, value: &str) -> FieldTypeSet;

    /// Scans a submitted form for importable records. Identity data is
    /// imported silently; a detected payment card is returned instead so the
    /// host can ask the user first.
    fn import_form_records(&mut self, form: &ParsedForm) -> Option<PaymentCard>;

    /// Persists a card the user accepted.
    fn save_imported_card(&mut self, card: &PaymentCard);
}

/// In-memory reference store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryStore {
    #[serde(default)]
    pub profiles: Vec<Profile>,
    #[serde(default)]
    pub payment_cards: Vec<PaymentCard>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Loads records from a JSON blob with `profiles` and `payment_cards`
    /// arrays.
    pub fn from_json(json: &str) -> crate::error::AutofillResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl PersonalDataStore for MemoryStore {
    fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    fn payment_cards(&self) -> &[PaymentCard] {
        &self.payment_cards
    }

    fn possible_field_types(&self, value: &str) -> FieldTypeSet {
        let mut types = FieldTypeSet::new();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            types.insert(FieldType::Empty);
            return types;
        }
        let needle = trimmed.to_lowercase();
        for profile in &self.profiles {
            for (&field_type, stored) in &profile.values {
                if stored.to_lowercase() == needle {
                    types.insert(field_type);
                }
            }
        }
        for card in &self.payment_cards {
            for (&field_type, stored) in &card.values {
                if stored.to_lowercase() == needle {
                    types.insert(field_type);
                }
            }
        }
        if types.is_empty() {
            types.insert(FieldType::Unknown);
        }
        types
    }

    fn import_form_records(&mut self, form: &ParsedForm) -> Option<PaymentCard> {
        let mut profile_values: BTreeMap<FieldType, String> = BTreeMap::new();
        let mut card_values: BTreeMap<FieldType, String> = BTreeMap::new();
        for field in form.fields() {
            let value = field.value.trim();
            if value.is_empty() {
                continue;
            }
            let field_type = field.effective_type();
            match field_type.group() {
                // Verification codes are never stored.
                FieldTypeGroup::Payment if field_type != FieldType::CreditCardVerificationCode => {
                    card_values.entry(field_type).or_insert_with(|| value.to_string());
                }
                FieldTypeGroup::Identity | FieldTypeGroup::Phone | FieldTypeGroup::Fax => {
                    profile_values.entry(field_type).or_insert_with(|| value.to_string());
                }
                _ => {}
            }
        }

        let has_name = profile_values.contains_key(&FieldType::NameFirst)
            || profile_values.contains_key(&FieldType::NameFull);
        let has_contact = profile_values.contains_key(&FieldType::EmailAddress)
            || profile_values.contains_key(&FieldType::AddressHomeLine1);
        if has_name && has_contact {
            let guid = derived_guid("profile", &joined_values(&profile_values));
            if !self.profiles.iter().any(|p| p.values == profile_values) {
                self.profiles.push(Profile {
                    guid,
                    values: profile_values,
                });
            }
        }

        let number = card_values.get(&FieldType::CreditCardNumber)?.clone();
        if self
            .payment_cards
            .iter()
            .any(|c| c.value(FieldType::CreditCardNumber) == number)
        {
            return None;
        }
        Some(PaymentCard {
            guid: derived_guid("card", &number),
            brand: String::new(),
            values: card_values,
        })
    }

    fn save_imported_card(&mut self, card: &PaymentCard) {
        let number = card.value(FieldType::CreditCardNumber);
        if self
            .payment_cards
            .iter()
            .any(|c| c.value(FieldType::CreditCardNumber) == number)
        {
            return;
        }
        self.payment_cards.push(card.clone());
    }
}

/// Deterministic GUID for an imported record, derived from its content.
fn derived_guid(prefix: &str, seed: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prefix.as_bytes());
    hasher.update(b":");
    hasher.update(seed.as_bytes());
    let digest = hasher.finalize();
    let hex: String = digest[..8].iter().map(|b| format!("{b:02x}")).collect();
    format!("{prefix}-{hex}")
}

fn joined_values(values: &BTreeMap<FieldType, String>) -> String {
    values.values().cloned().collect::<Vec<_>>().join("&")
}
