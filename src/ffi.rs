//! C FFI exports for browser-shell embedding.
//!
//! These functions provide a C-compatible interface for driving the engine
//! from a host shell. State lives behind an opaque engine handle; event
//! payloads and results cross the boundary as JSON strings to simplify
//! marshalling. The handle wires the engine to the bundled in-memory store,
//! queued transport and buffered metrics, so the host drains outbound
//! requests and quality events instead of registering callbacks.

use std::ffi::{c_char, CStr, CString};
use std::ptr;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::engine::AutofillEngine;
use crate::form::{FormData, FormField};
use crate::quality::BufferedMetrics;
use crate::records::{MemoryStore, PaymentCard};
use crate::requests::{QueryRequest, QueuedTransport, UploadRequest};

/// Opaque engine instance handed to C callers.
pub struct AutofillEngineHandle {
    engine: AutofillEngine<MemoryStore, QueuedTransport, BufferedMetrics>,
}

#[derive(Deserialize)]
struct QueryInput {
    form: FormData,
    field: FormField,
}

#[derive(Deserialize)]
struct FillInput {
    form: FormData,
    field: FormField,
    unique_id: i32,
}

#[derive(Serialize)]
struct FillOutput {
    /// The filled form, or `null` when some lookup missed.
    form: Option<FormData>,
}

#[derive(Serialize)]
struct SubmitOutput {
    /// Card detected in the submission, awaiting the user's decision.
    import_offer: Option<PaymentCard>,
}

#[derive(Serialize)]
struct DrainedRequests {
    queries: Vec<QueryRequest>,
    uploads: Vec<UploadRequest>,
}

/// Create an engine from a config and a records blob.
///
/// # Safety
///
/// - `config_json` and `records_json` must be valid null-terminated C strings
/// - The returned handle must be freed by calling `autofill_engine_destroy`
///
/// # Returns
///
/// An opaque engine handle. Returns null when either blob fails to parse.
#[no_mangle]
pub unsafe extern "C" fn autofill_engine_create(
    config_json: *const c_char,
    records_json: *const c_char,
) -> *mut AutofillEngineHandle {
    if config_json.is_null() || records_json.is_null() {
        return ptr::null_mut();
    }

    let config_str = match CStr::from_ptr(config_json).to_str() {
        Ok(s) => s,
        Err(_) => return ptr::null_mut(),
    };
    let records_str = match CStr::from_ptr(records_json).to_str() {
        Ok(s) => s,
        Err(_) => return ptr::null_mut(),
    };

    let config = match EngineConfig::from_json(config_str) {
        Ok(c) => c,
        Err(_) => return ptr::null_mut(),
    };
    let store = match MemoryStore::from_json(records_str) {
        Ok(s) => s,
        Err(_) => return ptr::null_mut(),
    };

    Box::into_raw(Box::new(AutofillEngineHandle {
        engine: AutofillEngine::new(
            config,
            store,
            QueuedTransport::new(),
            BufferedMetrics::new(),
        ),
    }))
}

/// Destroy an engine handle.
///
/// # Safety
///
/// - `handle` must be a pointer returned by `autofill_engine_create`
/// - This function must only be called once per handle
/// - After calling this function, the handle is invalid
#[no_mangle]
pub unsafe extern "C" fn autofill_engine_destroy(handle: *mut AutofillEngineHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

/// Parse newly rendered forms into the engine cache.
///
/// # Safety
///
/// - `handle` must be a live engine handle
/// - `forms_json` must be a valid null-terminated C string holding a JSON
///   array of forms
/// - The returned pointer must be freed by calling `free_string`
///
/// # Returns
///
/// A null-terminated C string containing a success or error envelope.
/// Returns null on invalid pointers.
#[no_mangle]
pub unsafe extern "C" fn autofill_forms_seen_ffi(
    handle: *mut AutofillEngineHandle,
    forms_json: *const c_char,
) -> *mut c_char {
    if handle.is_null() || forms_json.is_null() {
        return ptr::null_mut();
    }

    let c_str = match CStr::from_ptr(forms_json).to_str() {
        Ok(s) => s,
        Err(_) => return ptr::null_mut(),
    };

    let forms: Vec<FormData> = match serde_json::from_str(c_str) {
        Ok(f) => f,
        Err(e) => {
            return create_error_response(&format!("Failed to parse input: {}", e));
        }
    };

    (*handle).engine.on_forms_seen(&forms);
    success_response()
}

/// Answer a suggestion query for a focused field.
///
/// # Safety
///
/// - `handle` must be a live engine handle
/// - `input_json` must be a valid null-terminated C string holding a JSON
///   object with `form` and `field`
/// - The returned pointer must be freed by calling `free_string`
///
/// # Returns
///
/// A null-terminated C string containing the JSON suggestion set.
/// Returns null on invalid pointers.
#[no_mangle]
pub unsafe extern "C" fn autofill_query_ffi(
    handle: *mut AutofillEngineHandle,
    input_json: *const c_char,
) -> *mut c_char {
    if handle.is_null() || input_json.is_null() {
        return ptr::null_mut();
    }

    let c_str = match CStr::from_ptr(input_json).to_str() {
        Ok(s) => s,
        Err(_) => return ptr::null_mut(),
    };

    let input: QueryInput = match serde_json::from_str(c_str) {
        Ok(i) => i,
        Err(e) => {
            return create_error_response(&format!("Failed to parse input: {}", e));
        }
    };

    let suggestions = (*handle).engine.on_query(&input.form, &input.field);

    match serde_json::to_string(&suggestions) {
        Ok(json) => string_to_c_char(json),
        Err(e) => create_error_response(&format!("Failed to serialize output: {}", e)),
    }
}

/// Fill a chosen record into the target field's section.
///
/// # Safety
///
/// - `handle` must be a live engine handle
/// - `input_json` must be a valid null-terminated C string holding a JSON
///   object with `form`, `field` and `unique_id`
/// - The returned pointer must be freed by calling `free_string`
///
/// # Returns
///
/// A null-terminated C string containing the JSON result (FillOutput).
/// Returns null on invalid pointers.
#[no_mangle]
pub unsafe extern "C" fn autofill_fill_ffi(
    handle: *mut AutofillEngineHandle,
    input_json: *const c_char,
) -> *mut c_char {
    if handle.is_null() || input_json.is_null() {
        return ptr::null_mut();
    }

    let c_str = match CStr::from_ptr(input_json).to_str() {
        Ok(s) => s,
        Err(_) => return ptr::null_mut(),
    };

    let input: FillInput = match serde_json::from_str(c_str) {
        Ok(i) => i,
        Err(e) => {
            return create_error_response(&format!("Failed to parse input: {}", e));
        }
    };

    let form = (*handle)
        .engine
        .on_fill_request(&input.form, &input.field, input.unique_id);

    match serde_json::to_string(&FillOutput { form }) {
        Ok(json) => string_to_c_char(json),
        Err(e) => create_error_response(&format!("Failed to serialize output: {}", e)),
    }
}

/// Analyze a submitted form.
///
/// # Safety
///
/// - `handle` must be a live engine handle
/// - `form_json` must be a valid null-terminated C string holding one JSON
///   form
/// - The returned pointer must be freed by calling `free_string`
///
/// # Returns
///
/// A null-terminated C string containing the JSON result (SubmitOutput).
/// Returns null on invalid pointers.
#[no_mangle]
pub unsafe extern "C" fn autofill_form_submitted_ffi(
    handle: *mut AutofillEngineHandle,
    form_json: *const c_char,
) -> *mut c_char {
    if handle.is_null() || form_json.is_null() {
        return ptr::null_mut();
    }

    let c_str = match CStr::from_ptr(form_json).to_str() {
        Ok(s) => s,
        Err(_) => return ptr::null_mut(),
    };

    let form: FormData = match serde_json::from_str(c_str) {
        Ok(f) => f,
        Err(e) => {
            return create_error_response(&format!("Failed to parse input: {}", e));
        }
    };

    let import_offer = (*handle).engine.on_form_submitted(&form);

    match serde_json::to_string(&SubmitOutput { import_offer }) {
        Ok(json) => string_to_c_char(json),
        Err(e) => create_error_response(&format!("Failed to serialize output: {}", e)),
    }
}

/// Resolve the pending import offer from the last submission.
///
/// # Safety
///
/// - `handle` must be a live engine handle
#[no_mangle]
pub unsafe extern "C" fn autofill_import_decision_ffi(
    handle: *mut AutofillEngineHandle,
    accepted: bool,
) {
    if handle.is_null() {
        return;
    }
    (*handle).engine.on_import_decision(accepted);
}

/// Apply a classification response payload to the cached forms.
///
/// Malformed payloads are dropped inside the engine; this function still
/// reports success because the event was consumed.
///
/// # Safety
///
/// - `handle` must be a live engine handle
/// - `payload_json` must be a valid null-terminated C string
/// - The returned pointer must be freed by calling `free_string`
#[no_mangle]
pub unsafe extern "C" fn autofill_classification_response_ffi(
    handle: *mut AutofillEngineHandle,
    payload_json: *const c_char,
) -> *mut c_char {
    if handle.is_null() || payload_json.is_null() {
        return ptr::null_mut();
    }

    let c_str = match CStr::from_ptr(payload_json).to_str() {
        Ok(s) => s,
        Err(_) => return ptr::null_mut(),
    };

    (*handle).engine.on_classification_response(c_str);
    success_response()
}

/// Drop every cached form after a committed navigation.
///
/// # Safety
///
/// - `handle` must be a live engine handle
#[no_mangle]
pub unsafe extern "C" fn autofill_navigation_committed_ffi(handle: *mut AutofillEngineHandle) {
    if handle.is_null() {
        return;
    }
    (*handle).engine.on_navigation_committed();
}

/// Drain the outbound classification traffic queued since the last drain.
///
/// # Safety
///
/// - `handle` must be a live engine handle
/// - The returned pointer must be freed by calling `free_string`
///
/// # Returns
///
/// A null-terminated C string containing a JSON object with `queries` and
/// `uploads` arrays. Returns null on invalid pointers.
#[no_mangle]
pub unsafe extern "C" fn autofill_drain_requests_ffi(
    handle: *mut AutofillEngineHandle,
) -> *mut c_char {
    if handle.is_null() {
        return ptr::null_mut();
    }

    let transport = (*handle).engine.transport_mut();
    let drained = DrainedRequests {
        queries: transport.drain_queries(),
        uploads: transport.drain_uploads(),
    };

    match serde_json::to_string(&drained) {
        Ok(json) => string_to_c_char(json),
        Err(e) => create_error_response(&format!("Failed to serialize output: {}", e)),
    }
}

/// Drain the quality events logged since the last drain.
///
/// # Safety
///
/// - `handle` must be a live engine handle
/// - The returned pointer must be freed by calling `free_string`
///
/// # Returns
///
/// A null-terminated C string containing a JSON array of metric events.
/// Returns null on invalid pointers.
#[no_mangle]
pub unsafe extern "C" fn autofill_drain_metrics_ffi(
    handle: *mut AutofillEngineHandle,
) -> *mut c_char {
    if handle.is_null() {
        return ptr::null_mut();
    }

    let events = (*handle).engine.metrics_mut().drain();

    match serde_json::to_string(&events) {
        Ok(json) => string_to_c_char(json),
        Err(e) => create_error_response(&format!("Failed to serialize output: {}", e)),
    }
}

/// Free a string that was allocated by Rust.
///
/// # Safety
///
/// - `s` must be a pointer that was returned by one of the FFI functions
/// - This function must only be called once per pointer
/// - After calling this function, the pointer is invalid
#[no_mangle]
pub unsafe extern "C" fn free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

/// Convert a Rust string to a C string pointer.
fn string_to_c_char(s: String) -> *mut c_char {
    match CString::new(s) {
        Ok(c_string) => c_string.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

fn success_response() -> *mut c_char {
    string_to_c_char(r#"{"success":true}"#.to_string())
}

/// Create an error response JSON string.
fn create_error_response(message: &str) -> *mut c_char {
    let error_json = format!(
        r#"{{"success":false,"error":"{}"}}"#,
        message.replace('"', r#"\""#)
    );
    string_to_c_char(error_json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    const CONFIG: &str = "{}";
    const RECORDS: &str = r#"{
        "profiles": [{
            "guid": "profile-dana",
            "values": {
                "name_full": "Dana Smith",
                "email_address": "dana@example.com",
                "address_home_line1": "1 Main St"
            }
        }],
        "payment_cards": []
    }"#;
    const FORM: &str = r#"{
        "name": "signup",
        "method": "post",
        "source_url": "https://site.example/join",
        "action_url": "https://site.example/submit",
        "user_submitted": true,
        "fields": [
            {"name": "name", "heuristic_type": "name_full"},
            {"name": "email", "heuristic_type": "email_address"},
            {"name": "address", "heuristic_type": "address_home_line1"}
        ]
    }"#;

    unsafe fn create_engine() -> *mut AutofillEngineHandle {
        let config = CString::new(CONFIG).unwrap();
        let records = CString::new(RECORDS).unwrap();
        let handle = autofill_engine_create(config.as_ptr(), records.as_ptr());
        assert!(!handle.is_null());
        handle
    }

    unsafe fn read_and_free(result: *mut c_char) -> serde_json::Value {
        assert!(!result.is_null());
        let json = CStr::from_ptr(result).to_str().unwrap().to_string();
        free_string(result);
        serde_json::from_str(&json).unwrap()
    }

    unsafe fn call_json(
        f: unsafe extern "C" fn(*mut AutofillEngineHandle, *const c_char) -> *mut c_char,
        handle: *mut AutofillEngineHandle,
        input: &str,
    ) -> serde_json::Value {
        let input = CString::new(input).unwrap();
        read_and_free(f(handle, input.as_ptr()))
    }

    #[test]
    fn test_query_and_fill_through_json_boundary() {
        unsafe {
            let handle = create_engine();

            let seen = call_json(autofill_forms_seen_ffi, handle, &format!("[{}]", FORM));
            assert_eq!(seen["success"], true);

            let query_input = format!(r#"{{"form": {}, "field": {{"name": "name"}}}}"#, FORM);
            let suggestions = call_json(autofill_query_ffi, handle, &query_input);
            assert_eq!(suggestions["values"][0], "Dana Smith");
            assert_eq!(suggestions["unique_ids"][0], 1);

            let fill_input = format!(
                r#"{{"form": {}, "field": {{"name": "name"}}, "unique_id": 1}}"#,
                FORM
            );
            let filled = call_json(autofill_fill_ffi, handle, &fill_input);
            assert_eq!(filled["form"]["fields"][0]["value"], "Dana Smith");
            assert_eq!(filled["form"]["fields"][1]["value"], "dana@example.com");

            let requests = read_and_free(autofill_drain_requests_ffi(handle));
            assert_eq!(requests["queries"].as_array().unwrap().len(), 1);
            assert_eq!(requests["uploads"].as_array().unwrap().len(), 0);

            autofill_engine_destroy(handle);
        }
    }

    #[test]
    fn test_null_inputs() {
        unsafe {
            assert!(autofill_engine_create(ptr::null(), ptr::null()).is_null());

            let handle = create_engine();
            assert!(autofill_forms_seen_ffi(handle, ptr::null()).is_null());
            assert!(autofill_query_ffi(ptr::null_mut(), ptr::null()).is_null());
            assert!(autofill_drain_requests_ffi(ptr::null_mut()).is_null());

            // State-only entry points tolerate null handles.
            autofill_import_decision_ffi(ptr::null_mut(), true);
            autofill_navigation_committed_ffi(ptr::null_mut());

            autofill_engine_destroy(handle);
        }
    }

    #[test]
    fn test_invalid_json_input() {
        unsafe {
            let handle = create_engine();

            let result = call_json(autofill_forms_seen_ffi, handle, "not valid json");
            assert_eq!(result["success"], false);
            assert!(result["error"].as_str().unwrap().contains("parse"));

            autofill_engine_destroy(handle);
        }
    }

    #[test]
    fn test_invalid_records_blob_fails_creation() {
        unsafe {
            let config = CString::new("{}").unwrap();
            let records = CString::new("[not json").unwrap();
            assert!(autofill_engine_create(config.as_ptr(), records.as_ptr()).is_null());
        }
    }
}
