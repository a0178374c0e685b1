//! Statement shape extraction for completion.
//!
//! The parser's tree is walked once and reduced to the relations referenced
//! in `FROM`/`JOIN` clauses. The context analyzer only ever sees this flat
//! shape, never `sqlparser` types.
//!
//! Statements that do not parse even after patching (`... WHERE o.` while
//! typing) are scanned token by token instead, so aliases still resolve.

use std::collections::BTreeMap;

use sqlparser::ast::{
    ObjectName, Query, Select, SetExpr, Statement, TableFactor, TableWithJoins,
};
use sqlparser::dialect::SQLiteDialect;
use sqlparser::keywords::Keyword;
use sqlparser::tokenizer::{Token, Tokenizer, Word};

use super::parse_strategies::PLACEHOLDER_TABLE;

/// Maximum recursion depth for tree traversal.
const MAX_EXTRACTION_DEPTH: usize = 50;

/// A table or view referenced in a `FROM` or `JOIN` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationRef {
    /// Unqualified object name (last part of `db.table`).
    pub name: String,
    pub alias: Option<String>,
}

/// Relations of a statement in source order, subqueries included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementShape {
    pub relations: Vec<RelationRef>,
}

impl StatementShape {
    /// Referenced object names in first-reference order, without duplicates
    /// and without the parse placeholder.
    pub fn used_tables(&self) -> Vec<String> {
        let mut tables: Vec<String> = Vec::new();
        for relation in &self.relations {
            if relation.name == PLACEHOLDER_TABLE || tables.contains(&relation.name) {
                continue;
            }
            tables.push(relation.name.clone());
        }
        tables
    }

    /// Alias to base object. A later alias of the same name wins.
    pub fn alias_map(&self) -> BTreeMap<String, String> {
        self.relations
            .iter()
            .filter(|relation| relation.name != PLACEHOLDER_TABLE)
            .filter_map(|relation| {
                relation
                    .alias
                    .as_ref()
                    .map(|alias| (alias.clone(), relation.name.clone()))
            })
            .collect()
    }
}

pub fn extract_statement_shape(statements: &[Statement]) -> StatementShape {
    let mut shape = StatementShape::default();
    for stmt in statements {
        extract_from_statement(stmt, &mut shape, 0);
    }
    shape
}

fn extract_from_statement(stmt: &Statement, shape: &mut StatementShape, depth: usize) {
    match stmt {
        Statement::Query(query) => extract_from_query(query, shape, depth),
        Statement::Insert(insert) => {
            if let Some(source) = &insert.source {
                extract_from_query(source, shape, depth);
            }
        }
        Statement::CreateTable(ct) => {
            if let Some(query) = &ct.query {
                extract_from_query(query, shape, depth);
            }
        }
        Statement::CreateView { query, .. } => extract_from_query(query, shape, depth),
        _ => {}
    }
}

fn extract_from_query(query: &Query, shape: &mut StatementShape, depth: usize) {
    if depth > MAX_EXTRACTION_DEPTH {
        return;
    }

    if let Some(with) = &query.with {
        for cte in &with.cte_tables {
            extract_from_query(&cte.query, shape, depth + 1);
        }
    }

    extract_from_set_expr(&query.body, shape, depth + 1);
}

fn extract_from_set_expr(set_expr: &SetExpr, shape: &mut StatementShape, depth: usize) {
    if depth > MAX_EXTRACTION_DEPTH {
        return;
    }

    match set_expr {
        SetExpr::Select(select) => extract_from_select(select, shape, depth),
        SetExpr::Query(query) => extract_from_query(query, shape, depth),
        SetExpr::SetOperation { left, right, .. } => {
            extract_from_set_expr(left, shape, depth + 1);
            extract_from_set_expr(right, shape, depth + 1);
        }
        _ => {}
    }
}

fn extract_from_select(select: &Select, shape: &mut StatementShape, depth: usize) {
    for table_with_joins in &select.from {
        extract_from_table_with_joins(table_with_joins, shape, depth);
    }
}

fn extract_from_table_with_joins(
    twj: &TableWithJoins,
    shape: &mut StatementShape,
    depth: usize,
) {
    extract_from_table_factor(&twj.relation, shape, depth);
    for join in &twj.joins {
        extract_from_table_factor(&join.relation, shape, depth);
    }
}

fn extract_from_table_factor(tf: &TableFactor, shape: &mut StatementShape, depth: usize) {
    if depth > MAX_EXTRACTION_DEPTH {
        return;
    }

    match tf {
        TableFactor::Table { name, alias, .. } => {
            // Relations without a usable name (and their aliases) are skipped.
            if let Some(base) = last_name_part(name) {
                shape.relations.push(RelationRef {
                    name: base,
                    alias: alias.as_ref().map(|a| a.name.value.clone()),
                });
            }
        }
        TableFactor::Derived { subquery, .. } => {
            extract_from_query(subquery, shape, depth + 1);
        }
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => {
            extract_from_table_with_joins(table_with_joins, shape, depth + 1);
        }
        _ => {}
    }
}

fn last_name_part(name: &ObjectName) -> Option<String> {
    name.0
        .last()
        .and_then(|part| part.as_ident())
        .map(|ident| ident.value.clone())
        .filter(|value| !value.is_empty())
}

/// Token-level relation scan for statements without a tree.
///
/// Reads the object name after `FROM`, `JOIN` and `FROM`-list commas, plus an
/// optional (`AS`) alias. Parenthesized sources are skipped whole. Returns an
/// empty shape when the statement cannot be tokenized.
pub fn scan_statement_shape(statement: &str) -> StatementShape {
    let dialect = SQLiteDialect {};
    let Ok(tokens) = Tokenizer::new(&dialect, statement).tokenize() else {
        return StatementShape::default();
    };
    let tokens: Vec<Token> = tokens
        .into_iter()
        .filter(|token| !matches!(token, Token::Whitespace(_)))
        .collect();

    let mut shape = StatementShape::default();
    let mut in_from_clause = false;
    let mut expecting_table = false;
    let mut paren_depth = 0usize;
    let mut index = 0;

    while index < tokens.len() {
        let token = &tokens[index];

        if let Token::Word(word) = token {
            match word.keyword {
                Keyword::FROM => {
                    in_from_clause = true;
                    expecting_table = true;
                    paren_depth = 0;
                    index += 1;
                    continue;
                }
                Keyword::JOIN => {
                    expecting_table = true;
                    index += 1;
                    continue;
                }
                Keyword::WHERE
                | Keyword::GROUP
                | Keyword::ORDER
                | Keyword::HAVING
                | Keyword::LIMIT
                | Keyword::SELECT => {
                    in_from_clause = false;
                    expecting_table = false;
                }
                _ => {}
            }
        }

        if !expecting_table {
            match token {
                Token::LParen => paren_depth += 1,
                Token::RParen => paren_depth = paren_depth.saturating_sub(1),
                Token::Comma if in_from_clause && paren_depth == 0 => expecting_table = true,
                _ => {}
            }
            index += 1;
            continue;
        }

        if matches!(token, Token::LParen) {
            index = skip_parenthesized(&tokens, index);
            index = scan_alias(&tokens, index).1;
            expecting_table = false;
            continue;
        }

        let Some((name, after_name)) = scan_object_name(&tokens, index) else {
            index += 1;
            continue;
        };
        let (alias, after_alias) = scan_alias(&tokens, after_name);
        shape.relations.push(RelationRef { name, alias });
        index = after_alias;
        expecting_table = false;
    }

    shape
}

/// Index just past the parenthesis group opening at `start`.
fn skip_parenthesized(tokens: &[Token], start: usize) -> usize {
    let mut depth = 0usize;
    for (offset, token) in tokens[start..].iter().enumerate() {
        match token {
            Token::LParen => depth += 1,
            Token::RParen => {
                depth -= 1;
                if depth == 0 {
                    return start + offset + 1;
                }
            }
            _ => {}
        }
    }
    tokens.len()
}

/// `a.b.c` starting at `start`; yields the last part.
fn scan_object_name(tokens: &[Token], start: usize) -> Option<(String, usize)> {
    let mut last = None;
    let mut index = start;

    while let Some(Token::Word(word)) = tokens.get(index) {
        last = Some(word.value.clone());
        index += 1;
        if matches!(tokens.get(index), Some(Token::Period)) {
            index += 1;
            continue;
        }
        break;
    }

    last.filter(|name| !name.is_empty()).map(|name| (name, index))
}

fn scan_alias(tokens: &[Token], start: usize) -> (Option<String>, usize) {
    let mut index = start;

    if let Some(Token::Word(word)) = tokens.get(index) {
        if word.keyword == Keyword::AS && word.quote_style.is_none() {
            index += 1;
        }
    }

    match tokens.get(index) {
        Some(Token::Word(word)) if is_identifier_word(word) => {
            (Some(word.value.clone()), index + 1)
        }
        _ => (None, index),
    }
}

fn is_identifier_word(word: &Word) -> bool {
    word.quote_style.is_some() || word.keyword == Keyword::NoKeyword
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_sql;

    fn shape_of(sql: &str) -> StatementShape {
        extract_statement_shape(&parse_sql(sql).unwrap())
    }

    #[test]
    fn test_extract_table_aliases() {
        let shape = shape_of("SELECT * FROM users u JOIN orders o ON u.id = o.user_id");
        assert_eq!(shape.used_tables(), vec!["users", "orders"]);

        let aliases = shape.alias_map();
        assert_eq!(aliases.get("u").map(String::as_str), Some("users"));
        assert_eq!(aliases.get("o").map(String::as_str), Some("orders"));
    }

    #[test]
    fn test_extract_qualified_name_uses_last_part() {
        let shape = shape_of("SELECT * FROM main.users AS m");
        assert_eq!(shape.used_tables(), vec!["users"]);
        assert_eq!(shape.alias_map()["m"], "users");
    }

    #[test]
    fn test_extract_quoted_name() {
        let shape = shape_of("SELECT * FROM \"order items\" oi");
        assert_eq!(shape.used_tables(), vec!["order items"]);
        assert_eq!(shape.alias_map()["oi"], "order items");
    }

    #[test]
    fn test_extract_subquery_relations() {
        let shape = shape_of("SELECT * FROM (SELECT * FROM orders o) AS sub JOIN users u ON 1=1");
        assert_eq!(shape.used_tables(), vec!["orders", "users"]);
        assert!(!shape.alias_map().contains_key("sub"));
        assert_eq!(shape.alias_map()["o"], "orders");
    }

    #[test]
    fn test_extract_nested_join() {
        let shape = shape_of("SELECT * FROM (users u JOIN orders o ON u.id = o.user_id)");
        assert_eq!(shape.used_tables(), vec!["users", "orders"]);
    }

    #[test]
    fn test_extract_cte_and_union() {
        let shape = shape_of(
            "WITH recent AS (SELECT * FROM orders) \
             SELECT id FROM recent UNION SELECT id FROM users",
        );
        assert_eq!(shape.used_tables(), vec!["orders", "recent", "users"]);
    }

    #[test]
    fn test_used_tables_dedup_keeps_first_reference() {
        let shape = shape_of("SELECT * FROM users a JOIN orders o ON 1=1 JOIN users b ON 1=1");
        assert_eq!(shape.used_tables(), vec!["users", "orders"]);
        assert_eq!(shape.alias_map().len(), 3);
    }

    #[test]
    fn test_placeholder_is_dropped() {
        let shape = shape_of("SELECT * FROM users u JOIN _x_ ON 1=1");
        assert_eq!(shape.used_tables(), vec!["users"]);

        let shape = shape_of("SELECT id FROM _x_");
        assert!(shape.used_tables().is_empty());
        assert!(shape.alias_map().is_empty());
    }

    #[test]
    fn test_insert_select() {
        let shape = shape_of("INSERT INTO archive SELECT * FROM users WHERE id > 1");
        assert_eq!(shape.used_tables(), vec!["users"]);
    }

    #[test]
    fn test_scan_unparsable_statement() {
        let sql = "SELECT * FROM users u JOIN orders o ON u.id = o.user_id WHERE o.";
        let shape = scan_statement_shape(sql);
        assert_eq!(shape.used_tables(), vec!["users", "orders"]);
        assert_eq!(shape.alias_map()["o"], "orders");
        assert_eq!(shape.alias_map()["u"], "users");
    }

    #[test]
    fn test_scan_from_list_and_qualified_names() {
        let shape = scan_statement_shape("SELECT * FROM main.users AS m, orders WHERE m.");
        assert_eq!(
            shape.relations,
            vec![
                RelationRef {
                    name: "users".to_string(),
                    alias: Some("m".to_string()),
                },
                RelationRef {
                    name: "orders".to_string(),
                    alias: None,
                },
            ]
        );
    }

    #[test]
    fn test_scan_skips_subqueries_and_keyword_aliases() {
        let shape = scan_statement_shape(
            "SELECT * FROM (SELECT 1, 2) AS sub LEFT JOIN users ON users.id IN (1, 2) WHERE",
        );
        assert_eq!(shape.used_tables(), vec!["users"]);
        assert!(shape.alias_map().is_empty());
    }

    #[test]
    fn test_scan_untokenizable_is_empty() {
        assert!(scan_statement_shape("SELECT * FROM users WHERE name = 'open")
            .relations
            .is_empty());
    }

    #[test]
    fn test_non_query_statement_is_empty() {
        let shape = shape_of("CREATE TABLE t (id INTEGER)");
        assert!(shape.relations.is_empty());
    }
}
