//! Prediction quality accounting at submission time.
//!
//! When a form is submitted we finally learn what the user actually typed,
//! so this is the one moment the heuristic and server predictions can be
//! graded. Events go to a [`MetricsSink`] one at a time; counting and
//! aggregation belong to the host.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::field_types::FieldType;
use crate::form::parsed::{ClassifiedField, FieldSignature, ParsedForm};
use crate::form::ControlKind;
use crate::records::PersonalDataStore;

/// One countable observation about a submitted field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityMetric {
    FieldSubmitted,
    FieldAutofilled,
    FieldAutofillFailed,
    HeuristicTypeUnknown,
    HeuristicTypeMatch,
    HeuristicTypeMismatch,
    ServerTypeUnknown,
    ServerTypeMatch,
    ServerTypeMismatch,
}

/// Host-side receiver for quality events.
pub trait MetricsSink {
    fn log(&mut self, metric: QualityMetric, experiment_id: &str);
}

/// A logged event with the experiment tag it was counted under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricEvent {
    pub metric: QualityMetric,
    pub experiment_id: String,
}

/// Sink that buffers events for the host to drain. Used by the C FFI
/// layer and the test suites.
#[derive(Debug, Default)]
pub struct BufferedMetrics {
    events: Vec<MetricEvent>,
}

impl BufferedMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[MetricEvent] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<MetricEvent> {
        std::mem::take(&mut self.events)
    }
}

impl MetricsSink for BufferedMetrics {
    fn log(&mut self, metric: QualityMetric, experiment_id: &str) {
        self.events.push(MetricEvent {
            metric,
            experiment_id: experiment_id.to_string(),
        });
    }
}

/// Asks the store which stored types match each submitted value and
/// records the answers on the form. Stores never answer with an empty
/// set; an unmatched value comes back as `Unknown` and a blank one as
/// `Empty`.
pub fn determine_possible_types<S: PersonalDataStore>(store: &S, form: &mut ParsedForm) {
    for index in 0..form.field_count() {
        let types = store.possible_field_types(&form.field(index).value);
        debug_assert!(!types.is_empty());
        form.set_possible_types(index, types);
    }
}

/// Grades the cached predictions for a submitted form. `submitted` carries
/// the final values and possible types, `cached` the predictions being
/// graded; fields are correlated by signature.
pub fn log_submission_quality<M: MetricsSink>(
    submitted: &ParsedForm,
    cached: &ParsedForm,
    metrics: &mut M,
) {
    let cached_fields: HashMap<FieldSignature, &ClassifiedField> = cached
        .fields()
        .iter()
        .map(|field| (field.signature(), field))
        .collect();

    let experiment_id = cached.experiment_id();
    for field in submitted.fields() {
        // Select controls never report an autofilled bit, so any metric
        // about them would be misleading. Count nothing.
        if field.control == ControlKind::SelectOne {
            continue;
        }

        metrics.log(QualityMetric::FieldSubmitted, experiment_id);

        // A blank or unrecognized value says nothing about prediction
        // quality.
        if field.possible_types.contains(&FieldType::Empty)
            || field.possible_types.contains(&FieldType::Unknown)
        {
            continue;
        }

        if field.is_autofilled {
            metrics.log(QualityMetric::FieldAutofilled, experiment_id);
            continue;
        }
        metrics.log(QualityMetric::FieldAutofillFailed, experiment_id);

        let (heuristic_type, server_type) = match cached_fields.get(&field.signature()) {
            Some(cached_field) => (cached_field.heuristic_type, cached_field.server_type),
            None => (FieldType::Unknown, None),
        };

        if heuristic_type == FieldType::Unknown {
            metrics.log(QualityMetric::HeuristicTypeUnknown, experiment_id);
        } else if field.possible_types.contains(&heuristic_type) {
            metrics.log(QualityMetric::HeuristicTypeMatch, experiment_id);
        } else {
            metrics.log(QualityMetric::HeuristicTypeMismatch, experiment_id);
        }

        match server_type {
            None => metrics.log(QualityMetric::ServerTypeUnknown, experiment_id),
            Some(server_type) if field.possible_types.contains(&server_type) => {
                metrics.log(QualityMetric::ServerTypeMatch, experiment_id);
            }
            Some(_) => metrics.log(QualityMetric::ServerTypeMismatch, experiment_id),
        }
    }
}
