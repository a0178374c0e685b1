//! Built-in SQLite function completions.
//!
//! Items are built once and cloned per request.

use std::sync::LazyLock;

use crate::types::{SuggestionItem, SuggestionKind};

/// Sort rank shared by all function items.
pub const FUNCTION_RANK: u8 = 2;

/// Functions offered in projection lists, in presentation order.
pub const BUILTIN_FUNCTIONS: &[&str] = &[
    "ABS", "AVG", "COUNT", "LOWER", "MAX", "MIN", "RANDOM", "ROUND", "SUM", "UPPER", "LENGTH",
    "COALESCE", "IFNULL", "DATE", "DATETIME", "STRFTIME",
];

static FUNCTION_COMPLETION_CACHE: LazyLock<Vec<SuggestionItem>> = LazyLock::new(|| {
    BUILTIN_FUNCTIONS
        .iter()
        .map(|name| function_to_suggestion(name))
        .collect()
});

/// Label is the bare name; accepting it inserts `NAME(`.
pub fn function_to_suggestion(name: &str) -> SuggestionItem {
    SuggestionItem::new(
        name,
        SuggestionKind::Function,
        format!("{name}("),
        FUNCTION_RANK,
    )
}

pub fn function_suggestions() -> impl Iterator<Item = SuggestionItem> {
    FUNCTION_COMPLETION_CACHE.iter().cloned()
}
