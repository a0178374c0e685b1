//! Cursor context analysis.
//!
//! Combines the statement slice, the optional statement shape and plain text
//! patterns around the cursor into a [`CompletionContext`]. The clause zone is
//! always derived from text so it behaves the same whether or not the
//! statement parsed.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use super::ast_extractor::StatementShape;
use super::slicer::{cursor_to_offset, StatementSlice};
use crate::catalog::SchemaCatalog;
use crate::types::{ClauseZone, CompletionContext, CursorPosition};

/// Trailing `qualifier.` right before the cursor. Exactly one group matches:
/// double-quoted, backticked, bracketed, or a bare identifier. Bare
/// identifiers use the same character set as the word under the cursor.
fn dot_access_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r#"(?:"([^"]+)"|`([^`]+)`|\[([^\]]+)\]"#,
            r"|([\p{Alphabetic}_][\p{Alphabetic}\p{N}_$]*))\.\s*$",
        ))
        .expect("Invalid regex pattern")
    })
}

fn clause_keyword_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(SELECT|FROM|JOIN|ON|WHERE|GROUP\s+BY|HAVING|ORDER\s+BY)\b")
            .expect("Invalid regex pattern")
    })
}

fn select_keyword_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bSELECT\b").expect("Invalid regex pattern"))
}

fn leading_select_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\s*SELECT\b").expect("Invalid regex pattern"))
}

fn projection_end_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(FROM|GROUP\s+BY|ORDER\s+BY|HAVING|LIMIT)\b")
            .expect("Invalid regex pattern")
    })
}

fn trailing_comma_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r",\s*$").expect("Invalid regex pattern"))
}

/// Build the completion context for a cursor.
///
/// `slice` must be the statement slice of `text` at `position`. `shape` is
/// the reduced tree of that statement when it parsed.
pub fn analyze_context(
    text: &str,
    position: CursorPosition,
    slice: &StatementSlice<'_>,
    shape: Option<&StatementShape>,
    catalog: &SchemaCatalog,
) -> CompletionContext {
    let offset = cursor_to_offset(text, position);
    let before_cursor = &text[..offset];

    let relative = offset.saturating_sub(slice.offset).min(slice.text.len());
    let statement_before_cursor = slice.text.get(..relative).unwrap_or(slice.text);

    let (used_tables, alias_map) = match shape {
        Some(shape) => (shape.used_tables(), shape.alias_map()),
        None => (Vec::new(), BTreeMap::new()),
    };

    let dot_qualifier = extract_dot_qualifier(before_cursor);
    let dot_access_target = dot_qualifier
        .as_deref()
        .map(|qualifier| resolve_qualifier(qualifier, &alias_map));

    let candidate_tables = if used_tables.is_empty() {
        catalog.tables.clone()
    } else {
        used_tables
    };

    CompletionContext {
        dot_qualifier,
        dot_access_target,
        after_comma: before_cursor.trim_end().ends_with(','),
        after_comma_in_projection: is_after_projection_comma(slice.text, relative),
        clause_zone: estimate_zone(slice.text, statement_before_cursor),
        alias_map,
        candidate_tables,
    }
}

/// The identifier written right before a trailing `.`, unquoted.
///
/// For `db.table.` this is `table`.
pub fn extract_dot_qualifier(before_cursor: &str) -> Option<String> {
    let caps = dot_access_regex().captures(before_cursor)?;
    (1..=4)
        .find_map(|group| caps.get(group))
        .map(|m| m.as_str().to_string())
}

/// Alias lookup (exact, then ASCII case-insensitive); the qualifier itself
/// when no alias matches.
fn resolve_qualifier(qualifier: &str, alias_map: &BTreeMap<String, String>) -> String {
    alias_map
        .get(qualifier)
        .or_else(|| {
            alias_map
                .iter()
                .find(|(alias, _)| alias.eq_ignore_ascii_case(qualifier))
                .map(|(_, base)| base)
        })
        .cloned()
        .unwrap_or_else(|| qualifier.to_string())
}

/// Zone of the rightmost clause keyword before the cursor.
///
/// With no keyword before the cursor the zone is `Select` for statements
/// that start with `SELECT` and `Unknown` otherwise.
pub fn estimate_zone(statement: &str, statement_before_cursor: &str) -> ClauseZone {
    let last = clause_keyword_regex()
        .captures_iter(statement_before_cursor)
        .last()
        .and_then(|caps| caps.get(1))
        .map(|m| zone_for_keyword(m.as_str()));

    match last {
        Some(zone) => zone,
        None if leading_select_regex().is_match(statement) => ClauseZone::Select,
        None => ClauseZone::Unknown,
    }
}

fn zone_for_keyword(keyword: &str) -> ClauseZone {
    let head = keyword
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase();
    match head.as_str() {
        "SELECT" => ClauseZone::Select,
        "FROM" => ClauseZone::From,
        "JOIN" => ClauseZone::Join,
        "ON" => ClauseZone::On,
        "WHERE" => ClauseZone::Where,
        "GROUP" => ClauseZone::GroupBy,
        "HAVING" => ClauseZone::Having,
        "ORDER" => ClauseZone::OrderBy,
        _ => ClauseZone::Unknown,
    }
}

/// Byte range of the projection list: after the first `SELECT` up to the
/// first clause that ends it, or the end of the statement.
pub fn projection_span(statement: &str) -> Option<(usize, usize)> {
    let start = select_keyword_regex().find(statement)?.end();
    let end = projection_end_regex()
        .find(&statement[start..])
        .map_or(statement.len(), |m| start + m.start());
    Some((start, end))
}

fn is_after_projection_comma(statement: &str, relative_cursor: usize) -> bool {
    let Some((start, end)) = projection_span(statement) else {
        return false;
    };
    if relative_cursor < start || relative_cursor > end {
        return false;
    }
    statement
        .get(start..relative_cursor)
        .is_some_and(|list| trailing_comma_regex().is_match(list))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnInfo, SchemaObject};
    use crate::completion::slicer::slice_statement_at_cursor;
    use crate::completion::statement_shape;
    use rstest::rstest;

    /// Analyze `sql` with the cursor at the `|` marker.
    fn analyze(sql_with_cursor: &str, catalog: &SchemaCatalog) -> CompletionContext {
        let cursor = sql_with_cursor.find('|').expect("cursor marker");
        let text = sql_with_cursor.replacen('|', "", 1);
        let before = &text[..cursor];
        let line = before.matches('\n').count() + 1;
        let column = before.rsplit('\n').next().unwrap().chars().count() + 1;
        let position = CursorPosition::new(line, column);

        let slice = slice_statement_at_cursor(&text, position);
        let shape = statement_shape(slice.text);
        analyze_context(&text, position, &slice, Some(&shape), catalog)
    }

    fn catalog() -> SchemaCatalog {
        SchemaCatalog::from_parts(
            vec![SchemaObject::table("users"), SchemaObject::table("orders")],
            vec![
                ("users".to_string(), vec![ColumnInfo::new("id", "INTEGER")]),
                ("orders".to_string(), vec![ColumnInfo::new("user_id", "INTEGER")]),
            ],
        )
    }

    #[test]
    fn test_projection_comma_before_from() {
        let ctx = analyze("SELECT id, | FROM users", &catalog());
        assert_eq!(ctx.clause_zone, ClauseZone::Select);
        assert!(ctx.after_comma_in_projection);
        assert!(ctx.after_comma);
        assert_eq!(ctx.candidate_tables, vec!["users"]);
    }

    #[test]
    fn test_alias_dot_access() {
        let ctx = analyze(
            "SELECT * FROM users u JOIN orders o ON u.id = o.user_id WHERE o.|",
            &catalog(),
        );
        assert_eq!(ctx.alias_map.get("o").map(String::as_str), Some("orders"));
        assert_eq!(ctx.alias_map.get("u").map(String::as_str), Some("users"));
        assert_eq!(ctx.dot_qualifier.as_deref(), Some("o"));
        assert_eq!(ctx.dot_access_target.as_deref(), Some("orders"));
        assert_eq!(ctx.clause_zone, ClauseZone::Where);
    }

    #[test]
    fn test_dot_access_unknown_alias_is_literal() {
        let ctx = analyze("SELECT x.| FROM users", &catalog());
        assert_eq!(ctx.dot_access_target.as_deref(), Some("x"));
    }

    #[test]
    fn test_dot_access_alias_case_insensitive() {
        let ctx = analyze("SELECT * FROM users U WHERE u.|", &catalog());
        assert_eq!(ctx.dot_access_target.as_deref(), Some("users"));
    }

    #[rstest]
    #[case("users.", Some("users"))]
    #[case("main.users.", Some("users"))]
    #[case("\"order items\".", Some("order items"))]
    #[case("`orders`.", Some("orders"))]
    #[case("[orders].  ", Some("orders"))]
    #[case("WHERE price > 3.", None)]
    #[case("users", None)]
    #[case("users.id", None)]
    #[case("SELECT é.", Some("é"))]
    #[case("straße.", Some("straße"))]
    #[case("用户表.", Some("用户表"))]
    #[case("v2$.", Some("v2$"))]
    fn test_extract_dot_qualifier(#[case] before: &str, #[case] expected: Option<&str>) {
        assert_eq!(extract_dot_qualifier(before).as_deref(), expected);
    }

    #[rstest]
    #[case("SELECT |", ClauseZone::Select)]
    #[case("|SELECT id FROM users", ClauseZone::Select)]
    #[case("SELECT id FROM |", ClauseZone::From)]
    #[case("SELECT * FROM users u JOIN |", ClauseZone::Join)]
    #[case("SELECT * FROM users u JOIN orders o ON |", ClauseZone::On)]
    #[case("SELECT * FROM users WHERE |", ClauseZone::Where)]
    #[case("SELECT * FROM users group\n  by |", ClauseZone::GroupBy)]
    #[case("SELECT id FROM users GROUP BY id HAVING |", ClauseZone::Having)]
    #[case("SELECT * FROM users ORDER BY |", ClauseZone::OrderBy)]
    #[case("select * from users where |", ClauseZone::Where)]
    #[case("|", ClauseZone::Unknown)]
    #[case("INSERT INTO users VALUES (|", ClauseZone::Unknown)]
    #[case("SELECT 1; |", ClauseZone::Unknown)]
    fn test_clause_zone(#[case] sql: &str, #[case] expected: ClauseZone) {
        let ctx = analyze(sql, &SchemaCatalog::empty());
        assert_eq!(ctx.clause_zone, expected);
    }

    #[test]
    fn test_zone_ignores_keywords_after_cursor() {
        let ctx = analyze("SELECT id, | FROM users WHERE id = 1", &catalog());
        assert_eq!(ctx.clause_zone, ClauseZone::Select);
    }

    #[test]
    fn test_zone_is_word_bounded() {
        let ctx = analyze("SELECT * FROM users WHERE selection_on|", &catalog());
        assert_eq!(ctx.clause_zone, ClauseZone::Where);
    }

    #[test]
    fn test_zone_same_with_and_without_tree() {
        let statement = "SELECT * FROM users WHERE";
        assert_eq!(estimate_zone(statement, statement), ClauseZone::Where);
        let ctx = analyze("SELECT * FROM users WHERE |", &catalog());
        assert_eq!(ctx.clause_zone, ClauseZone::Where);
    }

    #[test]
    fn test_comma_outside_projection() {
        let ctx = analyze("SELECT id FROM users ORDER BY id, |", &catalog());
        assert!(ctx.after_comma);
        assert!(!ctx.after_comma_in_projection);
        assert_eq!(ctx.clause_zone, ClauseZone::OrderBy);
    }

    #[test]
    fn test_projection_without_comma() {
        let ctx = analyze("SELECT id |", &catalog());
        assert!(!ctx.after_comma);
        assert!(!ctx.after_comma_in_projection);
    }

    #[test]
    fn test_projection_span() {
        assert_eq!(projection_span("SELECT a, b FROM t"), Some((6, 12)));
        assert_eq!(projection_span("SELECT a, b"), Some((6, 11)));
        assert_eq!(projection_span("select a limit 1"), Some((6, 9)));
        assert_eq!(projection_span("UPDATE t SET a = 1"), None);
    }

    #[test]
    fn test_candidate_tables_fall_back_to_catalog() {
        let ctx = analyze("SELECT |", &catalog());
        assert_eq!(ctx.candidate_tables, vec!["users", "orders"]);
        assert!(ctx.alias_map.is_empty());
    }

    #[test]
    fn test_candidate_tables_from_unparsable_statement() {
        // Does not parse even after patching; relations come from the token scan.
        let ctx = analyze("SELECT * FROM users WHERE |", &catalog());
        assert_eq!(ctx.candidate_tables, vec!["users"]);
    }

    #[test]
    fn test_no_shape_uses_catalog_tables() {
        let text = "SELECT * FROM users WHERE ";
        let position = CursorPosition::new(1, 27);
        let slice = slice_statement_at_cursor(text, position);
        let ctx = analyze_context(text, position, &slice, None, &catalog());
        assert_eq!(ctx.candidate_tables, vec!["users", "orders"]);
        assert_eq!(ctx.clause_zone, ClauseZone::Where);
    }

    #[test]
    fn test_analysis_uses_only_cursor_statement() {
        let ctx = analyze("SELECT * FROM orders o;\nSELECT * FROM users u WHERE |", &catalog());
        assert_eq!(ctx.candidate_tables, vec!["users"]);
        assert!(!ctx.alias_map.contains_key("o"));
    }
}
