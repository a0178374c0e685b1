//! Output formatters for CLI results.

pub mod json;
pub mod table;

pub use json::to_json;
pub use table::{format_details, format_objects, format_outcomes, format_suggestions};

use serde::Serialize;
use sqlbook_core::{ObjectDetails, QueryResult};

/// What one statement of an exercise produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementOutcome {
    pub sql: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<QueryResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatementOutcome {
    pub fn ok(sql: impl Into<String>, result: QueryResult) -> Self {
        Self {
            sql: sql.into(),
            result: Some(result),
            error: None,
        }
    }

    pub fn failed(sql: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            result: None,
            error: Some(message.into()),
        }
    }
}

/// A described table or view together with its first rows.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectReport {
    #[serde(flatten)]
    pub details: ObjectDetails,
    pub preview: QueryResult,
}
