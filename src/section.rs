//! Logical section detection within a classified form.
//!
//! Checkout pages routinely stack several address blocks and a payment block
//! into one `<form>`. Filling must stay inside the block the user is
//! interacting with. Sections are identified by two heuristics:
//! 1. a section holds either payment fields or non-payment fields, matching
//!    what is being filled;
//! 2. a section does not repeat an (equivalent) field type, except phone and
//!    fax types, which forms legitimately repeat and detection gets wrong
//!    often enough to ignore as a signal.

use std::collections::HashSet;

use crate::field_types::{FieldType, FieldTypeGroup};
use crate::form::parsed::ParsedForm;
use crate::form::FormData;

/// Bounds of the logical section of `form` containing the field at
/// `target_index`, as a half-open index range. Defaults to the whole form.
///
/// Walks fields in order, closing a section when a known type repeats or
/// when group-appropriateness flips, and stops as soon as the closed section
/// contains the target. Fields past that point are not assigned to any
/// section by this call. Unknown-typed fields are transparent.
pub fn find_section_bounds(
    form: &ParsedForm,
    target_index: usize,
    want_payment: bool,
) -> (usize, usize) {
    let mut section_start = 0;
    let mut section_end = form.field_count();

    let mut seen_types: HashSet<FieldType> = HashSet::new();
    let mut target_in_current_section = false;
    for i in 0..form.field_count() {
        let current_type = form.field(i).effective_type().equivalent();

        // Fields of unknown type don't help us to distinguish sections.
        if current_type == FieldType::Unknown {
            continue;
        }

        let mut already_saw_current_type = seen_types.contains(&current_type);
        let current_group = current_type.group();
        if current_group == FieldTypeGroup::Phone || current_group == FieldTypeGroup::Fax {
            already_saw_current_type = false;
        }

        let is_payment_field = current_group == FieldTypeGroup::Payment;
        let is_appropriate_type = is_payment_field == want_payment;

        if already_saw_current_type || !is_appropriate_type {
            if target_in_current_section {
                // Reached the end of the section containing the target.
                section_end = i;
                break;
            }

            // Reached the end of a section, so start a new one.
            seen_types.clear();

            // The boundary field itself opens the new section only when it
            // matches the kind of data being filled.
            if is_appropriate_type {
                section_start = i;
            } else {
                section_start = i + 1;
                continue;
            }
        }

        seen_types.insert(current_type);

        if i == target_index {
            target_in_current_section = true;
        }
    }

    debug_assert!(
        target_in_current_section,
        "target field fell outside every detected section"
    );
    (section_start, section_end)
}

/// True when the section `[section_start, section_end)` of the cached form
/// is already filled in the live `form`: at least one cached field has a
/// live counterpart and every counterpart carries the autofilled flag.
///
/// The two field lists usually line up index for index, but the page may
/// have inserted or removed controls since parsing; a forward search over
/// the cached fields resynchronizes without ever backtracking.
pub fn section_is_autofilled(
    form_structure: &ParsedForm,
    form: &FormData,
    section_start: usize,
    section_end: usize,
) -> bool {
    let mut matched_any = false;
    let mut i = section_start;
    let mut j = 0;
    while i < section_end && j < form.fields.len() {
        // Search forward in the cached fields for a counterpart.
        let mut k = i;
        while k < form_structure.field_count()
            && !form_structure.field(k).matches(&form.fields[j])
        {
            k += 1;
        }

        // No counterpart; move on to the next live field.
        if k >= form_structure.field_count() {
            j += 1;
            continue;
        }

        matched_any = true;
        if !form.fields[j].is_autofilled {
            return false;
        }

        i += 1;
        j += 1;
    }

    matched_any
}
