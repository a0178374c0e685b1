//! JSON output formatting.

use anyhow::{Context, Result};
use serde::Serialize;

/// Serialize any output value, pretty-printed unless `compact`.
pub fn to_json<T: Serialize + ?Sized>(value: &T, compact: bool) -> Result<String> {
    let json = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    };
    json.context("Failed to serialize output")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::StatementOutcome;
    use sqlbook_core::QueryResult;

    #[test]
    fn test_outcome_json_shape() {
        let outcomes = vec![
            StatementOutcome::ok("SELECT 1", QueryResult::status("OK")),
            StatementOutcome::failed("SELEC", "near \"SELEC\": syntax error"),
        ];
        let json: serde_json::Value =
            serde_json::from_str(&to_json(&outcomes, true).unwrap()).unwrap();
        assert_eq!(json[0]["result"]["columns"][0], "status");
        assert!(json[0].get("error").is_none());
        assert_eq!(json[1]["error"], "near \"SELEC\": syntax error");
        assert!(json[1].get("result").is_none());
    }

    #[test]
    fn test_compact_has_no_newlines() {
        let json = to_json(&QueryResult::status("OK"), true).unwrap();
        assert!(!json.contains('\n'));
    }
}
