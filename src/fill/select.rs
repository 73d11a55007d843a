//! Option matching for select controls.
//!
//! Stored values rarely match a dropdown's option text exactly; "3" has to
//! find "March", "2027" has to find "27". Matching is case-insensitive and
//! the matched option's own text is written back, so the renderer always
//! receives a string the control actually offers.

use crate::field_types::FieldType;
use crate::form::FormField;

const MONTHS_FULL: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const MONTHS_ABBREVIATED: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Writes the option matching `value` into a select control, trying
/// type-specific alternate spellings when the raw value finds nothing.
/// Returns false and leaves the field untouched on no match.
pub fn fill_select_control(value: &str, field_type: FieldType, field: &mut FormField) -> bool {
    if set_select_value(value, field) {
        return true;
    }
    match field_type {
        FieldType::CreditCardExpMonth => fill_month_select(value, field),
        FieldType::CreditCardExp2DigitYear | FieldType::CreditCardExp4DigitYear => {
            fill_year_select(value, field)
        }
        _ => false,
    }
}

fn set_select_value(value: &str, field: &mut FormField) -> bool {
    let needle = value.to_lowercase();
    let matched = field
        .options
        .iter()
        .find(|option| option.to_lowercase() == needle)
        .cloned();
    match matched {
        Some(option) => {
            field.value = option;
            true
        }
        None => false,
    }
}

fn fill_month_select(value: &str, field: &mut FormField) -> bool {
    let month: usize = match value.trim().parse() {
        Ok(month) if (1..=12).contains(&month) => month,
        _ => return false,
    };
    let candidates = [
        month.to_string(),
        format!("{month:02}"),
        MONTHS_FULL[month - 1].to_string(),
        MONTHS_ABBREVIATED[month - 1].to_string(),
    ];
    candidates.iter().any(|candidate| set_select_value(candidate, field))
}

fn fill_year_select(value: &str, field: &mut FormField) -> bool {
    let year = value.trim();
    if !year.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    // Swap between two- and four-digit spellings.
    match year.len() {
        4 => set_select_value(&year[2..], field),
        2 => set_select_value(&format!("20{year}"), field),
        _ => false,
    }
}
