//! Human-readable table output formatting.

use owo_colors::OwoColorize;
use serde_json::Value;
use sqlbook_core::{CompletionList, ObjectKind, QueryResult, SchemaObject, SuggestionKind};
use std::fmt::Write;
use tabled::builder::Builder;
use tabled::settings::Style;

use super::{ObjectReport, StatementOutcome};

/// Render every statement outcome: the statement, then its rows or error.
pub fn format_outcomes(outcomes: &[StatementOutcome], colored: bool) -> String {
    let mut out = String::new();
    for (index, outcome) in outcomes.iter().enumerate() {
        if index > 0 {
            writeln!(out).unwrap();
        }
        write_statement_header(&mut out, &outcome.sql, colored);
        if let Some(result) = &outcome.result {
            write_result(&mut out, result, colored);
        }
        if let Some(message) = &outcome.error {
            let line = format!("error: {message}");
            if colored {
                writeln!(out, "{}", line.red()).unwrap();
            } else {
                writeln!(out, "{line}").unwrap();
            }
        }
    }
    out
}

fn write_statement_header(out: &mut String, sql: &str, colored: bool) {
    let first_line = sql.lines().next().unwrap_or_default();
    let header = if sql.lines().nth(1).is_some() {
        format!("> {first_line} ...")
    } else {
        format!("> {first_line}")
    };
    if colored {
        writeln!(out, "{}", header.bold()).unwrap();
    } else {
        writeln!(out, "{header}").unwrap();
    }
}

fn write_result(out: &mut String, result: &QueryResult, colored: bool) {
    let mut builder = Builder::default();
    builder.push_record(result.columns.iter().cloned());
    for row in &result.rows {
        builder.push_record(row.iter().map(cell_text));
    }
    let mut table = builder.build();
    table.with(Style::psql());
    writeln!(out, "{table}").unwrap();

    let footer = if result.truncated {
        format!("({} rows shown, more available)", result.rows.len())
    } else {
        format!("({} rows)", result.rows.len())
    };
    if colored {
        writeln!(out, "{}", footer.dimmed()).unwrap();
    } else {
        writeln!(out, "{footer}").unwrap();
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn kind_label(kind: SuggestionKind) -> &'static str {
    match kind {
        SuggestionKind::Field => "field",
        SuggestionKind::Function => "function",
        SuggestionKind::Keyword => "keyword",
        SuggestionKind::Snippet => "snippet",
    }
}

/// Render ranked suggestions, one per row, in list order.
pub fn format_suggestions(list: &CompletionList, colored: bool) -> String {
    let mut out = String::new();
    if let Some(error) = &list.error {
        writeln!(out, "error: {error}").unwrap();
        return out;
    }
    if list.items.is_empty() {
        writeln!(out, "No suggestions.").unwrap();
        return out;
    }

    let mut builder = Builder::default();
    builder.push_record(["rank", "label", "kind", "detail"].map(String::from));
    for item in &list.items {
        builder.push_record([
            item.sort_text.clone(),
            item.label.clone(),
            kind_label(item.kind).to_string(),
            item.detail.clone().unwrap_or_default(),
        ]);
    }
    let mut table = builder.build();
    table.with(Style::psql());
    writeln!(out, "{table}").unwrap();

    let replace = format!(
        "replace: line {}, columns {}..{}",
        list.replace.line, list.replace.start_column, list.replace.end_column
    );
    if colored {
        writeln!(out, "{}", replace.dimmed()).unwrap();
    } else {
        writeln!(out, "{replace}").unwrap();
    }
    out
}

fn object_kind_label(kind: ObjectKind) -> &'static str {
    match kind {
        ObjectKind::Table => "table",
        ObjectKind::View => "view",
    }
}

/// Render the tables and views of a database.
pub fn format_objects(objects: &[SchemaObject]) -> String {
    let mut out = String::new();
    if objects.is_empty() {
        writeln!(out, "No tables or views.").unwrap();
        return out;
    }

    let mut builder = Builder::default();
    builder.push_record(["name", "kind"].map(String::from));
    for object in objects {
        builder.push_record([object.name.clone(), object_kind_label(object.kind).to_string()]);
    }
    let mut table = builder.build();
    table.with(Style::psql());
    writeln!(out, "{table}").unwrap();
    out
}

/// Render one object's columns, then its preview rows.
pub fn format_details(report: &ObjectReport, colored: bool) -> String {
    let details = &report.details;
    let mut out = String::new();
    let header = format!("{} {}", object_kind_label(details.kind), details.name);
    if colored {
        writeln!(out, "{}", header.bold()).unwrap();
    } else {
        writeln!(out, "{header}").unwrap();
    }

    let mut builder = Builder::default();
    builder.push_record(["name", "type", "not null", "pk", "fk"].map(String::from));
    for detail in &details.columns {
        let column = &detail.column;
        builder.push_record([
            column.name.clone(),
            column.declared_type.clone(),
            flag(column.not_null),
            flag(column.is_primary_key),
            detail
                .foreign_key
                .as_ref()
                .map(|fk| fk.target())
                .unwrap_or_default(),
        ]);
    }
    let mut table = builder.build();
    table.with(Style::psql());
    writeln!(out, "{table}").unwrap();

    writeln!(out).unwrap();
    write_result(&mut out, &report.preview, colored);
    out
}

fn flag(set: bool) -> String {
    let text = if set { "yes" } else { "" };
    text.to_string()
}
