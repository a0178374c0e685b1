//! Fuzz target for partial-SQL tolerance.
//!
//! Normalizing and tolerant parsing must not panic on arbitrary text.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sqlbook_core::completion::parse_strategies::{normalize_partial_sql, parse_tolerant};

fuzz_target!(|data: &[u8]| {
    if let Ok(sql) = std::str::from_utf8(data) {
        let _ = normalize_partial_sql(sql);
        let _ = parse_tolerant(sql);
    }
});
