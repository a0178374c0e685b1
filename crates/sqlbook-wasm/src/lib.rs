use serde::{Deserialize, Serialize};
use sqlbook_core::completion::slicer::slice_statement_at_cursor;
use sqlbook_core::{
    completion_items, CompletionList, CompletionRequest, CursorPosition, SchemaCatalog,
};
use wasm_bindgen::prelude::*;

pub mod encoding;

use encoding::{offset_to_host, position_from_host, range_to_host, Encoding};

const SERIALIZATION_FALLBACK: &str = r#"{"error":"Failed to serialize result"}"#;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompletionItemsRequest {
    text: String,
    position: CursorPosition,
    #[serde(default)]
    catalog: SchemaCatalog,
    #[serde(default)]
    encoding: Encoding,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SliceRequest {
    text: String,
    position: CursorPosition,
    #[serde(default)]
    encoding: Encoding,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SliceResult {
    text: String,
    /// Offsets into the full buffer, in the request's encoding.
    start: usize,
    end: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| SERIALIZATION_FALLBACK.to_string())
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    #[cfg(feature = "tracing")]
    tracing_wasm::set_as_global_default();
}

/// Ranked completion items for a cursor - accepts JSON request, returns JSON
/// completion list.
/// This function never throws - errors are returned in the list's `error` field
#[wasm_bindgen]
pub fn completion_items_json(request_json: &str) -> String {
    let request: CompletionItemsRequest = match serde_json::from_str(request_json) {
        Ok(request) => request,
        Err(err) => {
            let list = CompletionList::from_error(
                CursorPosition::default(),
                format!("Invalid request format: {err}"),
            );
            return to_json(&list);
        }
    };

    let position = position_from_host(&request.text, request.position, request.encoding);
    let core_request = CompletionRequest::new(request.text, position);
    let mut list = completion_items(&core_request, &request.catalog);
    list.replace = range_to_host(&core_request.text, list.replace, request.encoding);
    to_json(&list)
}

/// The statement around a cursor - accepts JSON request, returns JSON slice.
/// Never throws.
#[wasm_bindgen]
pub fn slice_statement_json(request_json: &str) -> String {
    let request: SliceRequest = match serde_json::from_str(request_json) {
        Ok(request) => request,
        Err(err) => {
            return to_json(&SliceResult {
                text: String::new(),
                start: 0,
                end: 0,
                error: Some(format!("Invalid request format: {err}")),
            })
        }
    };

    let position = position_from_host(&request.text, request.position, request.encoding);
    let slice = slice_statement_at_cursor(&request.text, position);
    to_json(&SliceResult {
        text: slice.text.to_string(),
        start: offset_to_host(&request.text, slice.offset, request.encoding),
        end: offset_to_host(&request.text, slice.end(), request.encoding),
        error: None,
    })
}

/// Get version information
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
