//! Writing stored values into renderer form fields.
//!
//! Handles the per-control quirks that raw assignment gets wrong:
//! - Select controls only accept strings from their option list.
//! - `<input type="month">` wants a composed `YYYY-MM` value.
//! - Split phone inputs (3-digit prefix box, 4-digit suffix box) each
//!   receive their slice of the full number.

pub mod select;

use crate::field_types::{FieldType, FieldTypeGroup};
use crate::form::{ControlKind, FormField};
use crate::records::{PaymentCard, Profile};

use select::fill_select_control;

/// Digits in the exchange-and-area prefix of a split US phone number.
const PHONE_PREFIX_LENGTH: usize = 3;
/// Digits in the subscriber suffix of a split US phone number.
const PHONE_SUFFIX_LENGTH: usize = 4;

/// Writes the card value for `field_type` into `field`.
pub fn fill_card_field(card: &PaymentCard, field_type: FieldType, field: &mut FormField) {
    debug_assert_eq!(field_type.group(), FieldTypeGroup::Payment);
    match field.control {
        ControlKind::SelectOne => {
            fill_select_control(card.value(field_type), field_type, field);
        }
        ControlKind::Month => {
            let year = card.value(FieldType::CreditCardExp4DigitYear);
            let month = card.value(FieldType::CreditCardExpMonth);
            if !year.is_empty() && !month.is_empty() {
                field.value = format!("{year}-{month:0>2}");
            }
        }
        _ => field.value = card.value(field_type).to_string(),
    }
}

/// Writes the profile value for `field_type` into `field`.
pub fn fill_profile_field(profile: &Profile, field_type: FieldType, field: &mut FormField) {
    debug_assert_ne!(field_type.group(), FieldTypeGroup::Payment);
    // Phone number parts route through the splitter ahead of the select
    // check, matching how grouped phone inputs are marked up in practice.
    if field_type.is_phone_number_part() {
        fill_phone_number_field(profile.value(field_type), field);
    } else if field.control == ControlKind::SelectOne {
        fill_select_control(profile.value(field_type), field_type, field);
    } else {
        field.value = profile.value(field_type).to_string();
    }
}

/// Fills a phone number field, slicing a full 7-digit local number across
/// prefix/suffix inputs when the field's max_length says it is one half of
/// a split pair.
fn fill_phone_number_field(number: &str, field: &mut FormField) {
    let mut value = number.to_string();
    if number.chars().count() == PHONE_PREFIX_LENGTH + PHONE_SUFFIX_LENGTH {
        if field.max_length == PHONE_PREFIX_LENGTH {
            value = number.chars().take(PHONE_PREFIX_LENGTH).collect();
        } else if field.max_length == PHONE_SUFFIX_LENGTH {
            value = number.chars().skip(PHONE_PREFIX_LENGTH).collect();
        }
    }
    field.value = value;
}
