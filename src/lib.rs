//! Autofill Core Library
//!
//! Embeddable form-autofill engine for browser hosts, including:
//! - **engine**: per-session event loop driving parse, query, fill and
//!   submission analysis
//! - **section**: logical section detection inside mixed checkout forms
//! - **suggestions**: dropdown candidates with inferred labels and masked
//!   card numbers
//! - **quality**: prediction grading at submission time
//! - **requests**: classification queries, upload votes and the
//!   recently-autofilled history
//!
//! The engine runs on one sequential execution context and never blocks;
//! network traffic leaves through a host-provided transport and responses
//! come back as later events. Each host (browser shell, test harness)
//! owns its own I/O, storage and UI and calls this library for the core
//! logic. The optional `ffi` feature wraps the same surface in JSON
//! strings for C callers.
//!
//! # Example (conceptual)
//! ```ignore
//! let mut engine = AutofillEngine::new(config, store, transport, metrics);
//!
//! // The page rendered some forms.
//! engine.on_forms_seen(&forms);
//!
//! // The user focused a field; show the returned rows in a dropdown.
//! let suggestions = engine.on_query(&form, &field);
//!
//! // The user picked a row; send the filled form back to the renderer.
//! if let Some(filled) = engine.on_fill_request(&form, &field, unique_id) {
//!     apply_to_renderer(filled);
//! }
//!
//! // The user submitted; maybe offer to save a new card.
//! if let Some(card) = engine.on_form_submitted(&form) {
//!     ask_user_to_save(card);
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod field_types;
pub mod fill;
pub mod form;
pub mod opaque_ids;
pub mod quality;
pub mod records;
pub mod requests;
pub mod section;
pub mod suggestions;

pub use config::EngineConfig;
pub use engine::AutofillEngine;
pub use error::{AutofillError, AutofillResult};
pub use field_types::{FieldType, FieldTypeGroup, FieldTypeSet};
pub use form::parsed::{ClassifiedField, FieldSignature, FormSignature, ParsedForm};
pub use form::{ControlKind, FormData, FormField, SubmissionMethod};
pub use opaque_ids::{OpaqueIdTable, EMPTY_UNIQUE_ID, INVALID_UNIQUE_ID};
pub use quality::{BufferedMetrics, MetricEvent, MetricsSink, QualityMetric};
pub use records::{MemoryStore, PaymentCard, PersonalDataStore, Profile};
pub use requests::{
    AutofilledHistory, ClassificationTransport, QueryRequest, QueryResponse, QueuedTransport,
    RequestScheduler, UploadRequest,
};
pub use suggestions::{SuggestionSet, WarningKind};

// C FFI exports for browser-shell embedding
#[cfg(feature = "ffi")]
pub mod ffi;
