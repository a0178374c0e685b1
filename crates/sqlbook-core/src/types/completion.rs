use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::CursorPosition;

/// Coarse clause the cursor sits in, used to pick suggestion families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClauseZone {
    Select,
    From,
    Join,
    On,
    Where,
    GroupBy,
    Having,
    OrderBy,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    /// Full editor buffer.
    pub text: String,
    /// Cursor inside `text`.
    pub position: CursorPosition,
}

impl CompletionRequest {
    pub fn new(text: impl Into<String>, position: CursorPosition) -> Self {
        Self {
            text: text.into(),
            position,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompletionContext {
    /// Identifier typed right before a trailing `.` (alias, table, or `db.table` tail).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dot_qualifier: Option<String>,
    /// Object whose columns the qualifier designates, after alias resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dot_access_target: Option<String>,
    /// Last non-whitespace character before the cursor is a comma.
    pub after_comma: bool,
    /// Cursor follows a comma inside the SELECT projection list.
    pub after_comma_in_projection: bool,
    pub clause_zone: ClauseZone,
    /// Alias to base table, from the FROM/JOIN clauses of the statement.
    pub alias_map: BTreeMap<String, String>,
    /// Tables whose columns are offered, in first-reference order.
    pub candidate_tables: Vec<String>,
}

impl CompletionContext {
    pub fn empty() -> Self {
        Self {
            dot_qualifier: None,
            dot_access_target: None,
            after_comma: false,
            after_comma_in_projection: false,
            clause_zone: ClauseZone::Unknown,
            alias_map: BTreeMap::new(),
            candidate_tables: Vec::new(),
        }
    }
}

/// Editor-facing item kind. Tables and columns are both `Field`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum SuggestionKind {
    Field,
    Function,
    Keyword,
    Snippet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionItem {
    pub label: String,
    pub kind: SuggestionKind,
    pub insert_text: String,
    /// Lower ranks sort first.
    pub sort_rank: u8,
    /// `sort_rank` rendered as text for editors that sort alphabetically.
    pub sort_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl SuggestionItem {
    pub fn new(
        label: impl Into<String>,
        kind: SuggestionKind,
        insert_text: impl Into<String>,
        sort_rank: u8,
    ) -> Self {
        Self {
            label: label.into(),
            kind,
            insert_text: insert_text.into(),
            sort_rank,
            sort_text: sort_rank.to_string(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Span of the current line replaced when a suggestion is accepted.
///
/// Columns are 1-based; `end_column` is the cursor column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceRange {
    pub line: usize,
    pub start_column: usize,
    pub end_column: usize,
}

impl ReplaceRange {
    pub fn at(position: CursorPosition) -> Self {
        Self {
            line: position.line,
            start_column: position.column,
            end_column: position.column,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompletionList {
    pub items: Vec<SuggestionItem>,
    pub replace: ReplaceRange,
    /// Error message if the request could not be processed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CompletionList {
    pub fn empty(position: CursorPosition) -> Self {
        Self {
            items: Vec::new(),
            replace: ReplaceRange::at(position),
            error: None,
        }
    }

    pub fn from_error(position: CursorPosition, message: impl Into<String>) -> Self {
        Self {
            items: Vec::new(),
            replace: ReplaceRange::at(position),
            error: Some(message.into()),
        }
    }
}
