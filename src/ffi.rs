//! FFI interface for C/C++ hosts
//!
//! Provides C-compatible functions around the mapping parser and the
//! extraction engine. All structured data is passed as JSON.

use std::ffi::{c_char, CStr, CString};
use std::ptr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::collaborators::{StaticDataTypes, StaticProperties};
use crate::extractors::Extractor;
use crate::mapping::{parse_mapping_lines, parse_mapping_text, serialize_mapping, MappingGroup};
use crate::value::BaseCategory;

/// Result struct returned to the host
/// Both pointers are owned by Rust and must be freed via free_autofill_result
#[repr(C)]
pub struct AutofillResultFFI {
    /// JSON-serialized result (null-terminated)
    pub json_ptr: *mut c_char,
    /// Error message if the call failed (null-terminated), or null on success
    pub error_ptr: *mut c_char,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum SourceFormat {
    #[default]
    Json,
    Xml,
}

/// Extraction request sent along with the source document
#[derive(Debug, Deserialize)]
struct ExtractRequest {
    /// Header-less mapping lines
    mapping: String,
    #[serde(default)]
    format: SourceFormat,
    /// One result per `{list}` record instead of a single result
    #[serde(default)]
    list: bool,
    /// Custom data type → base category name (`literal`, `uri`, `resource`)
    #[serde(default)]
    data_types: IndexMap<String, String>,
    /// Property term → property id
    #[serde(default)]
    properties: IndexMap<String, u64>,
}

/// Parse mapping text into its groups.
///
/// # Safety
/// - `text_ptr` must point to valid memory of at least `text_len` bytes
/// - Caller must free the result via `free_autofill_result`
#[no_mangle]
pub unsafe extern "C" fn parse_mapping_ffi(text_ptr: *const c_char, text_len: usize) -> AutofillResultFFI {
    let text = match read_bytes(text_ptr, text_len) {
        Ok(s) => s,
        Err(msg) => return make_error_result(msg),
    };
    make_json_result(&parse_mapping_text(&text))
}

/// Write groups (as returned by `parse_mapping_ffi`) back to mapping text.
/// The result JSON is a single string.
///
/// # Safety
/// - `groups_json` must be a valid null-terminated C string
/// - Caller must free the result via `free_autofill_result`
#[no_mangle]
pub unsafe extern "C" fn serialize_mapping_ffi(groups_json: *const c_char) -> AutofillResultFFI {
    let json = match read_c_str(groups_json) {
        Ok(s) => s,
        Err(msg) => return make_error_result(msg),
    };
    let groups: IndexMap<String, MappingGroup> = match serde_json::from_str(json) {
        Ok(g) => g,
        Err(e) => return make_error_result(&format!("Failed to parse groups JSON: {}", e)),
    };
    make_json_result(&serialize_mapping(&groups))
}

/// Extract values from a JSON or XML document.
///
/// # Safety
/// - `source_ptr` must point to valid memory of at least `source_len` bytes
/// - `request_json` must be a valid null-terminated C string
/// - Caller must free the result via `free_autofill_result`
#[no_mangle]
pub unsafe extern "C" fn extract_values_ffi(
    source_ptr: *const c_char,
    source_len: usize,
    request_json: *const c_char,
) -> AutofillResultFFI {
    let source = match read_bytes(source_ptr, source_len) {
        Ok(s) => s,
        Err(msg) => return make_error_result(msg),
    };
    let request_str = match read_c_str(request_json) {
        Ok(s) => s,
        Err(msg) => return make_error_result(msg),
    };
    let request: ExtractRequest = match serde_json::from_str(request_str) {
        Ok(r) => r,
        Err(e) => return make_error_result(&format!("Failed to parse request JSON: {}", e)),
    };

    match perform_extraction(&source, &request) {
        Ok(json) => make_string_result(json),
        Err(msg) => make_error_result(&msg),
    }
}

/// Free an AutofillResultFFI returned by any function of this module
///
/// # Safety
/// - `result` must have been returned by a function of this module
/// - Must only be called once per result
#[no_mangle]
pub unsafe extern "C" fn free_autofill_result(result: AutofillResultFFI) {
    if !result.json_ptr.is_null() {
        drop(CString::from_raw(result.json_ptr));
    }
    if !result.error_ptr.is_null() {
        drop(CString::from_raw(result.error_ptr));
    }
}

unsafe fn read_bytes(data: *const c_char, len: usize) -> Result<String, &'static str> {
    if data.is_null() || len == 0 {
        return Ok(String::new());
    }
    let slice = std::slice::from_raw_parts(data as *const u8, len);
    std::str::from_utf8(slice)
        .map(str::to_string)
        .map_err(|_| "Invalid UTF-8 in input")
}

unsafe fn read_c_str<'a>(data: *const c_char) -> Result<&'a str, &'static str> {
    if data.is_null() {
        return Err("Request JSON is null");
    }
    CStr::from_ptr(data)
        .to_str()
        .map_err(|_| "Invalid UTF-8 in request JSON")
}

fn perform_extraction(source: &str, request: &ExtractRequest) -> Result<String, String> {
    let mut types = StaticDataTypes::new();
    for (data_type, base) in &request.data_types {
        match BaseCategory::from_builtin(base) {
            Some(category) => types = types.with_type(data_type.clone(), category),
            None => tracing::debug!(data_type = %data_type, base = %base, "unknown base category"),
        }
    }
    let properties = request
        .properties
        .iter()
        .fold(StaticProperties::new(), |acc, (term, id)| acc.with_property(term.clone(), *id, None));

    let extractor = Extractor::new(&types).with_properties(&properties);
    let mapping = parse_mapping_lines(&request.mapping);

    let json = match request.format {
        SourceFormat::Xml if request.list => serde_json::to_string(&extractor.extract_xml_list(source, &mapping)),
        SourceFormat::Xml => serde_json::to_string(&extractor.extract_xml(source, &mapping)),
        SourceFormat::Json => {
            let document: serde_json::Value = serde_json::from_str(source)
                .map_err(|e| format!("Failed to parse source JSON: {}", e))?;
            if request.list {
                serde_json::to_string(&extractor.extract_list(&document, &mapping))
            } else {
                serde_json::to_string(&extractor.extract(&document, &mapping))
            }
        }
    };
    json.map_err(|e| format!("Failed to serialize result: {}", e))
}

fn make_json_result<T: Serialize + ?Sized>(value: &T) -> AutofillResultFFI {
    match serde_json::to_string(value) {
        Ok(json) => make_string_result(json),
        Err(e) => make_error_result(&format!("Failed to serialize result: {}", e)),
    }
}

fn make_string_result(json: String) -> AutofillResultFFI {
    match CString::new(json) {
        Ok(cstr) => AutofillResultFFI {
            json_ptr: cstr.into_raw(),
            error_ptr: ptr::null_mut(),
        },
        Err(_) => make_error_result("Result JSON contains null bytes"),
    }
}

// Helper to create error result
fn make_error_result(msg: &str) -> AutofillResultFFI {
    let error_cstr = CString::new(msg).unwrap_or_else(|_| CString::from(c"Unknown error"));
    AutofillResultFFI {
        json_ptr: ptr::null_mut(),
        error_ptr: error_cstr.into_raw(),
    }
}
