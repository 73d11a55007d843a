//! Classification traffic: query and upload payloads, dispatch, history.
//!
//! The engine runs on one sequential execution context, so outbound
//! requests are fire-and-forget through [`ClassificationTransport`] and
//! responses arrive later as plain events. Nothing here blocks, retries
//! or cancels; stale responses are detected against the live form cache
//! at application time.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::AutofillResult;
use crate::field_types::FieldType;
use crate::form::parsed::{FieldSignature, FormSignature, ParsedForm};
use crate::form::ControlKind;

/// Forms an upload remembers as recently autofilled.
const AUTOFILLED_HISTORY_CAPACITY: usize = 3;

/// Host-side sender for classification traffic. Implementations hand the
/// payload to whatever network stack the host runs; the engine never waits
/// on the result.
pub trait ClassificationTransport {
    fn start_query(&mut self, request: &QueryRequest);
    fn start_upload(&mut self, request: &UploadRequest);
}

/// One classification query covering every cached form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub forms: Vec<FormDescriptor>,
}

/// A form as the classification service sees it: signatures and field
/// shape, no values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormDescriptor {
    pub signature: FormSignature,
    pub fields: Vec<FieldDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub signature: FieldSignature,
    pub name: String,
    pub control: ControlKind,
}

/// Server reply to a [`QueryRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Experiment tag the server ran these predictions under. Tags every
    /// quality metric logged for the affected forms.
    #[serde(default)]
    pub experiment_id: String,
    pub forms: Vec<FormPredictions>,
}

/// Server field types for one form, in field order. An `Unknown` entry
/// means the server has no data for that field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormPredictions {
    pub signature: FormSignature,
    pub field_types: Vec<FieldType>,
}

/// Vote payload sent after a form submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadRequest {
    pub signature: FormSignature,
    /// True when this form is among the last few the user autofilled.
    pub was_recently_autofilled: bool,
    pub positive_upload_rate: f64,
    pub negative_upload_rate: f64,
    pub fields: Vec<UploadFieldInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadFieldInfo {
    pub signature: FieldSignature,
    /// Types whose stored data matched the submitted value, sorted for
    /// stable serialization.
    pub possible_types: Vec<FieldType>,
}

/// Parses a classification response payload.
pub fn parse_query_response(payload: &str) -> AutofillResult<QueryResponse> {
    Ok(serde_json::from_str(payload)?)
}

/// Bounded FIFO of recently autofilled form signatures, newest first.
#[derive(Debug, Default)]
pub struct AutofilledHistory {
    signatures: VecDeque<FormSignature>,
}

impl AutofilledHistory {
    pub fn note(&mut self, signature: FormSignature) {
        self.signatures.push_front(signature);
        self.signatures.truncate(AUTOFILLED_HISTORY_CAPACITY);
    }

    pub fn contains(&self, signature: FormSignature) -> bool {
        self.signatures.contains(&signature)
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}

/// Builds and dispatches classification traffic over a transport.
#[derive(Debug)]
pub struct RequestScheduler<T: ClassificationTransport> {
    transport: T,
    history: AutofilledHistory,
}

impl<T: ClassificationTransport> RequestScheduler<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            history: AutofilledHistory::default(),
        }
    }

    /// Issues one query covering every given form.
    pub fn query_forms(&mut self, forms: &[ParsedForm]) {
        let request = QueryRequest {
            forms: forms.iter().map(describe_form).collect(),
        };
        self.transport.start_query(&request);
    }

    /// Issues an upload vote for a submitted form. The recently-autofilled
    /// flag and the config's sampling rates ride along for the consumer.
    pub fn upload_form(&mut self, form: &ParsedForm, config: &EngineConfig) {
        let signature = form.signature();
        let request = UploadRequest {
            signature,
            was_recently_autofilled: self.history.contains(signature),
            positive_upload_rate: config.positive_upload_rate,
            negative_upload_rate: config.negative_upload_rate,
            fields: form
                .fields()
                .iter()
                .map(|field| {
                    let mut possible_types: Vec<FieldType> =
                        field.possible_types.iter().copied().collect();
                    possible_types.sort();
                    UploadFieldInfo {
                        signature: field.signature(),
                        possible_types,
                    }
                })
                .collect(),
        };
        self.transport.start_upload(&request);
    }

    pub fn note_autofilled(&mut self, signature: FormSignature) {
        self.history.note(signature);
    }

    pub fn history(&self) -> &AutofilledHistory {
        &self.history
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

/// Transport that queues outbound requests for the host to drain. Used by
/// the C FFI layer and the test suites.
#[derive(Debug, Default)]
pub struct QueuedTransport {
    queries: Vec<QueryRequest>,
    uploads: Vec<UploadRequest>,
}

impl QueuedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain_queries(&mut self) -> Vec<QueryRequest> {
        std::mem::take(&mut self.queries)
    }

    pub fn drain_uploads(&mut self) -> Vec<UploadRequest> {
        std::mem::take(&mut self.uploads)
    }

    pub fn queries(&self) -> &[QueryRequest] {
        &self.queries
    }

    pub fn uploads(&self) -> &[UploadRequest] {
        &self.uploads
    }
}

impl ClassificationTransport for QueuedTransport {
    fn start_query(&mut self, request: &QueryRequest) {
        self.queries.push(request.clone());
    }

    fn start_upload(&mut self, request: &UploadRequest) {
        self.uploads.push(request.clone());
    }
}

fn describe_form(form: &ParsedForm) -> FormDescriptor {
    FormDescriptor {
        signature: form.signature(),
        fields: form
            .fields()
            .iter()
            .map(|field| FieldDescriptor {
                signature: field.signature(),
                name: field.name.clone(),
                control: field.control,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{FormData, FormField, SubmissionMethod};

    fn checkout_form() -> ParsedForm {
        let form = FormData {
            name: "checkout".into(),
            source_url: "https://shop.example/cart".into(),
            action_url: "https://shop.example/pay".into(),
            method: SubmissionMethod::Post,
            user_submitted: true,
            fields: vec![
                FormField {
                    name: "name".into(),
                    ..FormField::default()
                },
                FormField {
                    name: "email".into(),
                    ..FormField::default()
                },
                FormField {
                    name: "phone".into(),
                    ..FormField::default()
                },
            ],
        };
        ParsedForm::from_form(&form)
    }

    #[test]
    fn test_history_keeps_three_newest_in_front_order() {
        let mut history = AutofilledHistory::default();
        for signature in [1u64, 2, 3, 4] {
            history.note(signature);
        }
        assert_eq!(history.len(), 3);
        assert!(!history.contains(1));
        assert!(history.contains(2));
        assert!(history.contains(3));
        assert!(history.contains(4));
    }

    #[test]
    fn test_query_covers_every_form_with_field_shape() {
        let mut scheduler = RequestScheduler::new(QueuedTransport::new());
        let form = checkout_form();
        scheduler.query_forms(std::slice::from_ref(&form));

        let queries = scheduler.transport_mut().drain_queries();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].forms.len(), 1);
        let descriptor = &queries[0].forms[0];
        assert_eq!(descriptor.signature, form.signature());
        assert_eq!(descriptor.fields.len(), 3);
        assert_eq!(descriptor.fields[0].name, "name");
        assert_eq!(descriptor.fields[0].signature, form.field(0).signature());
    }

    #[test]
    fn test_upload_flags_recently_autofilled_forms() {
        let mut scheduler = RequestScheduler::new(QueuedTransport::new());
        let config = EngineConfig::default();
        let form = checkout_form();

        scheduler.upload_form(&form, &config);
        scheduler.note_autofilled(form.signature());
        scheduler.upload_form(&form, &config);

        let uploads = scheduler.transport_mut().drain_uploads();
        assert_eq!(uploads.len(), 2);
        assert!(!uploads[0].was_recently_autofilled);
        assert!(uploads[1].was_recently_autofilled);
        assert_eq!(uploads[1].signature, form.signature());
        assert_eq!(uploads[1].positive_upload_rate, 0.01);
        assert_eq!(uploads[1].fields.len(), 3);
    }

    #[test]
    fn test_parse_query_response_defaults_experiment_id() {
        let response = parse_query_response(
            r#"{"forms": [{"signature": 7, "field_types": ["name_full", "email_address"]}]}"#,
        )
        .expect("response should parse");
        assert_eq!(response.experiment_id, "");
        assert_eq!(response.forms.len(), 1);
        assert_eq!(response.forms[0].signature, 7);
        assert_eq!(
            response.forms[0].field_types,
            vec![FieldType::NameFull, FieldType::EmailAddress]
        );
    }

    #[test]
    fn test_parse_query_response_rejects_malformed() {
        assert!(parse_query_response("{].").is_err());
    }
}
