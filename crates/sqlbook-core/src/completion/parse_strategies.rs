//! Parse strategies for SQL that is still being typed.
//!
//! The raw statement is tried first. When it does not parse, a light patch
//! closes the most common unfinished shapes (a projection with no `FROM`, a
//! dangling `FROM` or `JOIN`) with a placeholder table and parsing is retried
//! once. Anything else is treated as unparsable and completion falls back to
//! text heuristics.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use sqlparser::ast::Statement;
#[cfg(feature = "tracing")]
use tracing::debug;

use crate::parser::parse_sql;

/// Table name injected by [`normalize_partial_sql`]. Never offered to users.
pub const PLACEHOLDER_TABLE: &str = "_x_";

/// Which input produced the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ParseStrategy {
    /// The statement parsed as typed.
    Raw,
    /// The statement parsed after [`normalize_partial_sql`] patched it.
    Normalized,
}

#[derive(Debug, Clone)]
pub struct ParsedStatement {
    pub statements: Vec<Statement>,
    pub strategy: ParseStrategy,
}

fn select_start_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\s*SELECT\b").expect("Invalid regex pattern"))
}

fn from_word_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bFROM\b").expect("Invalid regex pattern"))
}

fn trailing_from_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bFROM\s*$").expect("Invalid regex pattern"))
}

fn trailing_join_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bJOIN\s*$").expect("Invalid regex pattern"))
}

/// Patch an unfinished statement so a strict parser can accept it.
///
/// Rules are tried in order and the first match wins:
///
/// 1. starts with `SELECT` and has no `FROM`: append ` FROM _x_`
/// 2. ends with `FROM`: append ` _x_`
/// 3. ends with `JOIN`: append ` _x_ ON 1=1`
///
/// Returns `None` when no rule applies, which includes every complete
/// `SELECT ... FROM t` statement.
pub fn normalize_partial_sql(statement: &str) -> Option<String> {
    let trimmed = statement.trim();

    if select_start_regex().is_match(trimmed) && !from_word_regex().is_match(trimmed) {
        return Some(format!("{trimmed} FROM {PLACEHOLDER_TABLE}"));
    }
    if trailing_from_regex().is_match(trimmed) {
        return Some(format!("{trimmed} {PLACEHOLDER_TABLE}"));
    }
    if trailing_join_regex().is_match(trimmed) {
        return Some(format!("{trimmed} {PLACEHOLDER_TABLE} ON 1=1"));
    }
    None
}

/// Parse a statement, retrying once with the patched variant.
///
/// Never fails loudly: empty input and input that does not parse either way
/// both yield `None`.
pub fn parse_tolerant(statement: &str) -> Option<ParsedStatement> {
    let trimmed = statement.trim();
    if trimmed.is_empty() {
        return None;
    }

    match parse_sql(trimmed) {
        Ok(statements) => {
            return Some(ParsedStatement {
                statements,
                strategy: ParseStrategy::Raw,
            })
        }
        Err(_err) => {
            #[cfg(feature = "tracing")]
            debug!(error = %_err, "raw statement did not parse");
        }
    }

    let patched = normalize_partial_sql(trimmed)?;
    match parse_sql(&patched) {
        Ok(statements) => Some(ParsedStatement {
            statements,
            strategy: ParseStrategy::Normalized,
        }),
        Err(_err) => {
            #[cfg(feature = "tracing")]
            debug!(error = %_err, sql = %patched, "patched statement did not parse");
            None
        }
    }
}
