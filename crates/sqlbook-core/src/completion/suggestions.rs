//! Ranked suggestions from a completion context.
//!
//! A fixed cascade keyed on the dot target and the clause zone. Lower ranks
//! sort first; items of equal rank keep the order they were pushed in.

use super::functions::function_suggestions;
use crate::catalog::SchemaCatalog;
use crate::types::{ClauseZone, CompletionContext, SuggestionItem, SuggestionKind};

pub const COLUMN_RANK: u8 = 0;
pub const TABLE_RANK: u8 = 1;
pub const KEYWORD_RANK: u8 = 5;
pub const SNIPPET_RANK: u8 = 6;

const NEXT_CLAUSES_AFTER_FROM: &[&str] = &["WHERE", "JOIN", "GROUP BY", "ORDER BY", "LIMIT"];
const NEXT_CLAUSES_AFTER_WHERE: &[&str] = &["GROUP BY", "ORDER BY", "LIMIT"];
const ORDER_BY_KEYWORDS: &[&str] = &["ASC", "DESC", "HAVING", "ORDER BY", "LIMIT"];
const STATEMENT_STARTERS: &[&str] = &["SELECT", "WITH"];

/// Predicate keywords offered in `WHERE` and `HAVING`.
pub const OPERATOR_KEYWORDS: &[&str] = &[
    "AND",
    "OR",
    "NOT",
    "IN",
    "LIKE",
    "BETWEEN",
    "IS NULL",
    "IS NOT NULL",
    "EXISTS",
];

fn keyword(label: &str) -> SuggestionItem {
    SuggestionItem::new(
        label,
        SuggestionKind::Keyword,
        format!("{label} "),
        KEYWORD_RANK,
    )
}

fn keywords<'a>(labels: &'a [&'a str]) -> impl Iterator<Item = SuggestionItem> + 'a {
    labels.iter().map(|label| keyword(label))
}

fn star_snippet() -> SuggestionItem {
    SuggestionItem::new("*", SuggestionKind::Snippet, "*", SNIPPET_RANK)
}

/// Columns of one object, labelled by name with `table.column` detail.
fn object_columns<'a>(
    catalog: &'a SchemaCatalog,
    object: &'a str,
) -> impl Iterator<Item = SuggestionItem> + 'a {
    catalog.columns(object).iter().map(move |column| {
        SuggestionItem::new(
            column.name.as_str(),
            SuggestionKind::Field,
            column.name.as_str(),
            COLUMN_RANK,
        )
        .with_detail(format!("{object}.{}", column.name))
    })
}

fn candidate_columns<'a>(
    ctx: &'a CompletionContext,
    catalog: &'a SchemaCatalog,
) -> impl Iterator<Item = SuggestionItem> + 'a {
    ctx.candidate_tables
        .iter()
        .flat_map(move |table| object_columns(catalog, table))
}

fn object_names(catalog: &SchemaCatalog) -> impl Iterator<Item = SuggestionItem> + '_ {
    catalog.objects().map(|name| {
        SuggestionItem::new(name, SuggestionKind::Field, name, TABLE_RANK).with_detail("table/view")
    })
}

/// Build suggestions for a context.
///
/// Deterministic: the same context and catalog always yield the same list.
pub fn build_suggestions(ctx: &CompletionContext, catalog: &SchemaCatalog) -> Vec<SuggestionItem> {
    if let Some(target) = ctx.dot_access_target.as_deref() {
        return object_columns(catalog, target).collect();
    }

    let mut items = Vec::new();
    match ctx.clause_zone {
        ClauseZone::Select => {
            if !ctx.after_comma_in_projection {
                items.push(keyword("FROM"));
            }
            items.extend(candidate_columns(ctx, catalog));
            items.extend(function_suggestions());
            items.push(star_snippet());
        }
        ClauseZone::From | ClauseZone::Join => {
            items.extend(object_names(catalog));
            if ctx.clause_zone == ClauseZone::Join {
                items.push(keyword("ON"));
            }
            items.extend(keywords(NEXT_CLAUSES_AFTER_FROM));
        }
        ClauseZone::Where | ClauseZone::Having => {
            items.extend(candidate_columns(ctx, catalog));
            items.extend(keywords(OPERATOR_KEYWORDS));
            if ctx.clause_zone == ClauseZone::Where {
                items.extend(keywords(NEXT_CLAUSES_AFTER_WHERE));
            }
        }
        ClauseZone::GroupBy => items.extend(candidate_columns(ctx, catalog)),
        ClauseZone::OrderBy => {
            items.extend(candidate_columns(ctx, catalog));
            items.extend(keywords(ORDER_BY_KEYWORDS));
        }
        ClauseZone::On | ClauseZone::Unknown => items.extend(keywords(STATEMENT_STARTERS)),
    }
    items
}

/// Stable sort by rank, for hosts that do not honour `sort_text`.
pub fn sort_by_rank(items: &mut [SuggestionItem]) {
    items.sort_by_key(|item| item.sort_rank);
}
