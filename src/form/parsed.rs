//! Classified form structures held in the engine cache.
//!
//! A [`ParsedForm`] is an immutable-by-default snapshot of a live form taken
//! on forms-seen, enriched later by server predictions and, during submission
//! analysis, by possible-type sets. It lives until the next navigation.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::field_types::{FieldType, FieldTypeSet};
use crate::form::{url_path, url_scheme_and_host, ControlKind, FormData, FormField, SubmissionMethod};

/// Minimum number of fields a form needs before it is worth parsing.
const REQUIRED_FILLABLE_FIELDS: usize = 3;

/// Stable 64-bit identity of a form, used on the classification wire and in
/// the recently-autofilled history.
pub type FormSignature = u64;

/// Stable 32-bit identity of a field within classification payloads.
pub type FieldSignature = u32;

/// A field snapshot plus everything the predictors know about it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedField {
    pub name: String,
    pub control: ControlKind,
    /// Value at snapshot time. Only submission analysis reads it.
    pub value: String,
    pub is_autofilled: bool,
    pub heuristic_type: FieldType,
    /// Server prediction; `None` until a classification response supplies
    /// one. An `Unknown` wire entry stays `None` so the heuristic keeps
    /// precedence.
    pub server_type: Option<FieldType>,
    /// Types whose stored values matched this field's submitted value.
    /// Empty until submission analysis runs.
    #[serde(default)]
    pub possible_types: FieldTypeSet,
}

impl ClassifiedField {
    fn from_field(field: &FormField) -> Self {
        ClassifiedField {
            name: field.name.clone(),
            control: field.control,
            value: field.value.clone(),
            is_autofilled: field.is_autofilled,
            heuristic_type: field.heuristic_type,
            server_type: None,
            possible_types: FieldTypeSet::new(),
        }
    }

    /// The prediction all matching and filling decisions use.
    pub fn effective_type(&self) -> FieldType {
        self.server_type.unwrap_or(self.heuristic_type)
    }

    /// True when some predictor recognized the field.
    pub fn is_fillable(&self) -> bool {
        self.effective_type() != FieldType::Unknown
    }

    /// True when `field` is the live counterpart of this snapshot.
    pub fn matches(&self, field: &FormField) -> bool {
        self.name == field.name && self.control == field.control
    }

    /// Stable hash of name and control kind, correlating submitted fields
    /// with cached ones and naming fields on the wire.
    pub fn signature(&self) -> FieldSignature {
        let mut hasher = Sha256::new();
        hasher.update(self.name.as_bytes());
        hasher.update(b"&");
        hasher.update(control_wire_name(self.control).as_bytes());
        let digest = hasher.finalize();
        u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
    }
}

/// A classified form in the cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedForm {
    name: String,
    method: SubmissionMethod,
    source_url: String,
    action_url: String,
    fields: Vec<ClassifiedField>,
    /// Server experiment tag; empty until a classification response carries
    /// one. All quality metrics for this form are keyed by it.
    #[serde(default)]
    experiment_id: String,
}

impl ParsedForm {
    /// Snapshots a live form.
    pub fn from_form(form: &FormData) -> Self {
        ParsedForm {
            name: form.name.clone(),
            method: form.method,
            source_url: form.source_url.clone(),
            action_url: form.action_url.clone(),
            fields: form.fields.iter().map(ClassifiedField::from_field).collect(),
            experiment_id: String::new(),
        }
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn field(&self, index: usize) -> &ClassifiedField {
        &self.fields[index]
    }

    pub fn fields(&self) -> &[ClassifiedField] {
        &self.fields
    }

    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    /// Number of fields some predictor recognized.
    pub fn autofill_count(&self) -> usize {
        self.fields.iter().filter(|f| f.is_fillable()).count()
    }

    /// True when the live form is the one this snapshot was taken from.
    /// Field values may have drifted; identity is name plus URLs.
    pub fn matches_form(&self, form: &FormData) -> bool {
        self.name == form.name
            && self.source_url == form.source_url
            && self.action_url == form.action_url
    }

    /// Worth keeping in the cache at all: enough fields, and not a search
    /// box (forms posting to a bare `/search` path never carry identity or
    /// payment data).
    pub fn is_parseable(&self) -> bool {
        if self.fields.len() < REQUIRED_FILLABLE_FIELDS {
            return false;
        }
        url_path(&self.action_url) != "/search"
    }

    /// Parseable and submitted via POST; only these are worth asking the
    /// classification server about.
    pub fn is_queryable(&self) -> bool {
        self.is_parseable() && self.method == SubmissionMethod::Post
    }

    /// Parseable with enough recognized fields to generate suggestions.
    pub fn is_autofillable(&self) -> bool {
        self.autofill_count() >= REQUIRED_FILLABLE_FIELDS && self.is_parseable()
    }

    /// True when the page the form lives on was delivered over `https`.
    pub fn is_secure_source(&self) -> bool {
        crate::form::is_https(&self.source_url)
    }

    /// Stable hash over scheme+host, form name and each field's name and
    /// control kind.
    pub fn signature(&self) -> FormSignature {
        let mut hasher = Sha256::new();
        hasher.update(url_scheme_and_host(&self.source_url).as_bytes());
        hasher.update(b"&");
        hasher.update(self.name.as_bytes());
        for field in &self.fields {
            hasher.update(b"&");
            hasher.update(field.name.as_bytes());
            hasher.update(b"&");
            hasher.update(control_wire_name(field.control).as_bytes());
        }
        let digest = hasher.finalize();
        u64::from_be_bytes([
            digest[0], digest[1], digest[2], digest[3], digest[4], digest[5], digest[6], digest[7],
        ])
    }

    /// Applies one server prediction per field, in order, plus the response
    /// experiment tag. `Unknown` entries mean the server had no data and
    /// leave the heuristic in charge.
    ///
    /// The caller has already checked that `types` and the field list have
    /// equal length.
    pub fn apply_server_predictions(&mut self, types: &[FieldType], experiment_id: &str) {
        debug_assert_eq!(types.len(), self.fields.len());
        for (field, &server_type) in self.fields.iter_mut().zip(types) {
            field.server_type = if server_type == FieldType::Unknown {
                None
            } else {
                Some(server_type)
            };
        }
        self.experiment_id = experiment_id.to_string();
    }

    /// Stores the possible-type set determined for one field at submission.
    pub fn set_possible_types(&mut self, index: usize, types: FieldTypeSet) {
        self.fields[index].possible_types = types;
    }
}

/// Wire name of a control kind, reused by both signatures so they stay
/// stable across serde changes.
fn control_wire_name(control: ControlKind) -> &'static str {
    match control {
        ControlKind::Text => "text",
        ControlKind::TextArea => "textarea",
        ControlKind::Password => "password",
        ControlKind::Email => "email",
        ControlKind::Telephone => "tel",
        ControlKind::Number => "number",
        ControlKind::SelectOne => "select-one",
        ControlKind::Month => "month",
        ControlKind::Checkbox => "checkbox",
        ControlKind::Radio => "radio",
        ControlKind::Hidden => "hidden",
    }
}
