//! FFI bindings for the Mind Measure scoring core
//!
//! C-compatible functions for calling the scoring core from the mobile client.
//! All functions take null-terminated UTF-8 strings and return allocated memory
//! that must be freed by the caller using `mm_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::pipeline::{assessment_to_json, validation_to_json};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => {
            set_last_error("Output contained an interior NUL byte");
            ptr::null_mut()
        }
    }
}

/// Run a JSON-in/JSON-out call, recording failures in the last error slot
unsafe fn json_call(
    input: *const c_char,
    call: impl FnOnce(String) -> Result<String, crate::error::ScoringError>,
) -> *mut c_char {
    clear_last_error();

    let input = match cstr_to_string(input) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    match call(input) {
        Ok(output) => string_to_cstr(&output),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Scoring API
// ============================================================================

/// Score an assessment request and return the scored assessment JSON.
///
/// The request is a check-in, or a baseline carrying feature scores already
/// obtained from the enrichment service.
///
/// # Safety
/// - `request_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `mm_free_string`.
/// - Returns NULL on error; call `mm_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn mm_score_assessment(request_json: *const c_char) -> *mut c_char {
    json_call(request_json, assessment_to_json)
}

/// Validate an assessment state and return the validation report JSON.
///
/// # Safety
/// - `state_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `mm_free_string`.
/// - Returns NULL on error; call `mm_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn mm_validate_assessment(state_json: *const c_char) -> *mut c_char {
    json_call(state_json, validation_to_json)
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by an `mm_` function.
///
/// # Safety
/// - `ptr` must be a pointer returned by an `mm_` function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn mm_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The pointer is valid until the next `mm_` call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn mm_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the scoring core version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn mm_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn check_in_request() -> CString {
        CString::new(
            r#"{
                "assessment_type": "check_in",
                "transcript": "agent: Ready?\nuser: yes\nuser: not at all\nuser: several days\nuser: more than half the days\nuser: nearly every day\nuser: 7",
                "started_at_ms": 1705330800000,
                "ended_at_ms": 1705331100000
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_ffi_score_assessment() {
        let request = check_in_request();

        unsafe {
            let result = mm_score_assessment(request.as_ptr());
            assert!(!result.is_null());
            assert!(mm_last_error().is_null());

            let result_str = CStr::from_ptr(result).to_str().unwrap();
            let scored: serde_json::Value = serde_json::from_str(result_str).unwrap();
            assert_eq!(scored["result"]["final_score"], 60);
            assert_eq!(scored["result"]["model_version"], "v1.0-clinical");
            assert_eq!(scored["validation"]["isValid"], true);

            mm_free_string(result);
        }
    }

    #[test]
    fn test_ffi_validate_assessment() {
        let state = CString::new(
            r#"{"transcript": "", "responses": {"phq2_q1": 0, "phq2_q2": 0, "gad2_q1": 0, "gad2_q2": 0}}"#,
        )
        .unwrap();

        unsafe {
            let result = mm_validate_assessment(state.as_ptr());
            assert!(!result.is_null());

            let result_str = CStr::from_ptr(result).to_str().unwrap();
            let report: serde_json::Value = serde_json::from_str(result_str).unwrap();
            assert_eq!(report["isValid"], false);
            assert_eq!(report["details"]["hasAllQuestions"], true);
            assert_eq!(report["details"]["hasTranscript"], false);
            assert_eq!(report["details"]["hasMood"], false);

            mm_free_string(result);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        let invalid_json = CString::new("not json").unwrap();

        unsafe {
            let result = mm_score_assessment(invalid_json.as_ptr());
            assert!(result.is_null());

            let error = mm_last_error();
            assert!(!error.is_null());
            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(error_str.contains("Failed to parse assessment request"));

            assert!(mm_validate_assessment(ptr::null()).is_null());
            let error_str = CStr::from_ptr(mm_last_error()).to_str().unwrap();
            assert_eq!(error_str, "Invalid JSON string pointer");

            // A successful call clears the previous error
            let request = check_in_request();
            let result = mm_score_assessment(request.as_ptr());
            assert!(mm_last_error().is_null());
            mm_free_string(result);
        }
    }

    #[test]
    fn test_ffi_free_null_is_noop() {
        unsafe {
            mm_free_string(ptr::null_mut());
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = mm_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert_eq!(version_str, crate::ENGINE_VERSION);
        }
    }
}
