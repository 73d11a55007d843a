//! Live form data as delivered by the host transport.
//!
//! These types cross the event boundary on every call, so they stay plain
//! serde records with no engine state attached. The engine never holds on to
//! them; anything it needs beyond the current event is snapshotted into the
//! classified structures in [`parsed`].
//!
//! Field identity is `(name, control)`. Values and the autofilled flag are
//! volatile renderer state and never participate in matching.

pub mod parsed;

use serde::{Deserialize, Serialize};

use crate::field_types::FieldType;

/// Kind of form control a field renders as.
///
/// The set is small and fixed; dispatching on it is always an exhaustive
/// match, never a string comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ControlKind {
    #[default]
    Text,
    #[serde(rename = "textarea")]
    TextArea,
    Password,
    Email,
    #[serde(rename = "tel")]
    Telephone,
    Number,
    SelectOne,
    Month,
    Checkbox,
    Radio,
    Hidden,
}

/// A single form control as the renderer currently sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FormField {
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub control: ControlKind,
    /// Maximum value length the control accepts; 0 means unconstrained.
    #[serde(default)]
    pub max_length: usize,
    /// Set by the renderer once it applies an autofill value.
    #[serde(default)]
    pub is_autofilled: bool,
    /// Display strings of the options, for select controls.
    #[serde(default)]
    pub options: Vec<String>,
    /// Prediction of the upstream markup classifier; `Unknown` when it had
    /// nothing to say.
    #[serde(default = "unknown_type")]
    pub heuristic_type: FieldType,
}

fn unknown_type() -> FieldType {
    FieldType::Unknown
}

impl FormField {
    /// True when `other` refers to the same control, regardless of the
    /// volatile value and flags.
    pub fn same_control(&self, other: &FormField) -> bool {
        self.name == other.name && self.control == other.control
    }
}

/// HTTP method the form submits with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionMethod {
    Get,
    #[default]
    Post,
}

/// A form as observed or submitted in the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FormData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub method: SubmissionMethod,
    /// URL of the page the form lives on.
    #[serde(default)]
    pub source_url: String,
    /// URL the form submits to.
    #[serde(default)]
    pub action_url: String,
    /// False for programmatic (scripted) submissions.
    #[serde(default)]
    pub user_submitted: bool,
    #[serde(default)]
    pub fields: Vec<FormField>,
}

/// Scheme and host of a URL string, lowercased, without any path or query.
///
/// Returns the input up to the end of the authority when it has a scheme,
/// otherwise the input up to the first `/`.
pub(crate) fn url_scheme_and_host(url: &str) -> String {
    let rest_start = match url.find("://") {
        Some(idx) => idx + 3,
        None => 0,
    };
    let end = url[rest_start..]
        .find(['/', '?', '#'])
        .map(|i| rest_start + i)
        .unwrap_or(url.len());
    url[..end].to_lowercase()
}

/// Path component of a URL string, without query or fragment.
pub(crate) fn url_path(url: &str) -> &str {
    let rest_start = match url.find("://") {
        Some(idx) => idx + 3,
        None => 0,
    };
    let rest = &url[rest_start..];
    let path_start = match rest.find('/') {
        Some(idx) => rest_start + idx,
        None => return "",
    };
    let path = &url[path_start..];
    let end = path.find(['?', '#']).unwrap_or(path.len());
    &path[..end]
}

/// True when the URL uses the `https` scheme.
pub(crate) fn is_https(url: &str) -> bool {
    let scheme_end = match url.find("://") {
        Some(idx) => idx,
        None => return false,
    };
    url[..scheme_end].eq_ignore_ascii_case("https")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_control_ignores_value_and_flags() {
        let a = FormField {
            name: "email".into(),
            value: "old".into(),
            control: ControlKind::Text,
            ..FormField::default()
        };
        let b = FormField {
            name: "email".into(),
            value: "new".into(),
            is_autofilled: true,
            ..FormField::default()
        };
        assert!(a.same_control(&b));

        let c = FormField {
            name: "email".into(),
            control: ControlKind::SelectOne,
            ..FormField::default()
        };
        assert!(!a.same_control(&c));
    }

    #[test]
    fn test_url_helpers() {
        assert_eq!(
            url_scheme_and_host("https://Shop.Example.com/checkout?step=2"),
            "https://shop.example.com"
        );
        assert_eq!(url_scheme_and_host("example.com/a"), "example.com");
        assert_eq!(url_path("http://example.com/search?q=x"), "/search");
        assert_eq!(url_path("http://example.com"), "");
        assert_eq!(url_path("https://example.com/a/b#frag"), "/a/b");
        assert!(is_https("https://example.com/pay"));
        assert!(is_https("HTTPS://example.com"));
        assert!(!is_https("http://example.com"));
        assert!(!is_https("example.com"));
    }

    #[test]
    fn test_control_kind_wire_names() {
        assert_eq!(
            serde_json::to_string(&ControlKind::SelectOne).unwrap(),
            "\"select-one\""
        );
        assert_eq!(
            serde_json::to_string(&ControlKind::TextArea).unwrap(),
            "\"textarea\""
        );
        assert_eq!(
            serde_json::to_string(&ControlKind::Telephone).unwrap(),
            "\"tel\""
        );
        let kind: ControlKind = serde_json::from_str("\"month\"").unwrap();
        assert_eq!(kind, ControlKind::Month);
    }

    #[test]
    fn test_form_field_deserializes_with_defaults() {
        let field: FormField = serde_json::from_str(r#"{"name":"city"}"#).unwrap();
        assert_eq!(field.name, "city");
        assert_eq!(field.control, ControlKind::Text);
        assert_eq!(field.heuristic_type, FieldType::Unknown);
        assert_eq!(field.max_length, 0);
        assert!(!field.is_autofilled);
    }
}
