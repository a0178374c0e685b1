//! Fuzz target for completion.
//!
//! `completion_items()` must never panic, whatever the buffer and cursor,
//! and must never report an error for input under the size cap.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sqlbook_core::{
    completion_items, ColumnInfo, CompletionRequest, CursorPosition, SchemaCatalog, SchemaObject,
};

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    text: String,
    line: u16,
    column: u16,
    with_catalog: bool,
}

fn catalog() -> SchemaCatalog {
    SchemaCatalog::from_parts(
        vec![SchemaObject::table("users"), SchemaObject::view("totals")],
        vec![
            ("users".to_string(), vec![ColumnInfo::new("id", "INTEGER")]),
            ("totals".to_string(), vec![ColumnInfo::new("sum", "REAL")]),
        ],
    )
}

fuzz_target!(|input: FuzzInput| {
    let catalog = if input.with_catalog {
        catalog()
    } else {
        SchemaCatalog::empty()
    };
    let position = CursorPosition::new(usize::from(input.line), usize::from(input.column));
    let list = completion_items(&CompletionRequest::new(input.text, position), &catalog);
    assert!(list.error.is_none());
});
