use proptest::prelude::*;
use sqlbook_core::completion::parse_strategies::normalize_partial_sql;
use sqlbook_core::completion::slicer::slice_statement_at_offset;
use sqlbook_core::{
    completion_items, ColumnInfo, CompletionRequest, CursorPosition, SchemaCatalog, SchemaObject,
};

fn catalog() -> SchemaCatalog {
    SchemaCatalog::from_parts(
        vec![SchemaObject::table("users"), SchemaObject::table("orders")],
        vec![
            ("users".to_string(), vec![ColumnInfo::new("id", "INTEGER")]),
            ("orders".to_string(), vec![ColumnInfo::new("user_id", "INTEGER")]),
        ],
    )
}

proptest! {
    #[test]
    fn slice_is_text_between_bounding_semicolons(
        text in "[a-z ;,.*\n]{0,60}",
        raw_offset in 0usize..80,
    ) {
        let offset = raw_offset.min(text.len());
        let slice = slice_statement_at_offset(&text, offset);

        let start = text[..offset].rfind(';').map_or(0, |a| a + 1);
        let end = text[offset..].find(';').map_or(text.len(), |b| offset + b);
        prop_assert_eq!(slice.text, &text[start..end]);
        prop_assert_eq!(slice.offset, start);
        prop_assert!(!slice.text.contains(';'));
        if !text.contains(';') {
            prop_assert_eq!(slice.text, text.as_str());
        }
    }

    #[test]
    fn normalizer_leaves_complete_selects_alone(
        columns in prop::collection::vec("[a-z]{1,6}", 1..4),
        table in "[a-z]{1,8}",
        limit in 1u32..100,
    ) {
        let sql = format!("SELECT {} FROM {table} LIMIT {limit}", columns.join(", "));
        prop_assert_eq!(normalize_partial_sql(&sql), None);
    }

    #[test]
    fn suggestions_are_deterministic(
        text in "(SELECT|FROM|WHERE|JOIN|ORDER BY|users|orders|u|o|\\.|,| ){0,12}",
        column in 1usize..40,
    ) {
        let request = CompletionRequest::new(text, CursorPosition::new(1, column));
        let first = completion_items(&request, &catalog());
        let second = completion_items(&request, &catalog());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn arbitrary_input_never_panics(
        text in "\\PC{0,80}",
        line in 0usize..4,
        column in 0usize..90,
    ) {
        let request = CompletionRequest::new(text, CursorPosition::new(line, column));
        let result = completion_items(&request, &catalog());
        prop_assert!(result.error.is_none());
    }
}
