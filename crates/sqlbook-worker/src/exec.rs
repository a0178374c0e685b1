//! Script execution and result mapping.

use rusqlite::types::ValueRef;
use rusqlite::{Batch, Connection, Statement};
use serde_json::Value;
use sqlbook_core::catalog::ObjectKind;
use sqlbook_core::{QueryResult, SchemaObject};

use crate::error::WorkerError;

/// Row cap applied when an `exec` request does not name one.
pub const DEFAULT_ROW_LIMIT: usize = 500;

const SCHEMA_QUERY: &str = "SELECT name, type FROM sqlite_master \
     WHERE type IN ('table','view') AND name NOT LIKE 'sqlite_%' \
     ORDER BY type, name";

/// Run every statement of `sql` in order.
///
/// The first statement that yields columns provides the result; its rows are
/// capped at `limit`. Later result sets are stepped through and discarded.
/// A script without any result set answers with a single `OK` status row.
pub fn execute_script(
    conn: &Connection,
    sql: &str,
    limit: usize,
) -> Result<QueryResult, WorkerError> {
    let mut batch = Batch::new(conn, sql);
    let mut first: Option<QueryResult> = None;

    while let Some(mut stmt) = batch.next()? {
        if stmt.column_count() == 0 {
            stmt.execute([])?;
            continue;
        }
        match first {
            None => first = Some(collect_rows(&mut stmt, limit)?),
            Some(_) => drain_rows(&mut stmt)?,
        }
    }

    Ok(first.unwrap_or_else(|| QueryResult::status("OK")))
}

fn collect_rows(stmt: &mut Statement<'_>, limit: usize) -> Result<QueryResult, WorkerError> {
    let columns: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect();
    let width = columns.len();

    let mut rows = Vec::new();
    let mut truncated = false;
    let mut cursor = stmt.query([])?;
    while let Some(row) = cursor.next()? {
        if rows.len() == limit {
            truncated = true;
            continue;
        }
        let values = (0..width)
            .map(|idx| row.get_ref(idx).map(value_to_json))
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(values);
    }

    Ok(QueryResult {
        columns,
        rows,
        truncated,
    })
}

fn drain_rows(stmt: &mut Statement<'_>) -> Result<(), WorkerError> {
    let mut cursor = stmt.query([])?;
    while cursor.next()?.is_some() {}
    Ok(())
}

/// SQLite value to JSON. Blobs are summarized, not transferred.
pub fn value_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::String(format!("<blob {} bytes>", bytes.len())),
    }
}

/// User tables and views, tables first, each group by name.
pub fn list_objects(conn: &Connection) -> Result<Vec<SchemaObject>, WorkerError> {
    let mut stmt = conn.prepare(SCHEMA_QUERY)?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut objects = Vec::new();
    for row in rows {
        let (name, kind) = row?;
        if let Some(kind) = ObjectKind::from_sqlite_type(&kind) {
            objects.push(SchemaObject { name, kind });
        }
    }
    Ok(objects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn conn_with(sql: &str) -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(sql).unwrap();
        conn
    }

    #[test]
    fn test_select_maps_value_types() {
        let conn = Connection::open_in_memory().unwrap();
        let result = execute_script(
            &conn,
            "SELECT NULL AS n, 42 AS i, 1.5 AS r, 'hi' AS t, x'00ff10' AS b",
            DEFAULT_ROW_LIMIT,
        )
        .unwrap();

        assert_eq!(result.columns, vec!["n", "i", "r", "t", "b"]);
        assert_eq!(
            result.rows,
            vec![vec![json!(null), json!(42), json!(1.5), json!("hi"), json!("<blob 3 bytes>")]]
        );
        assert!(!result.truncated);
    }

    #[test]
    fn test_script_without_result_set_reports_ok() {
        let conn = Connection::open_in_memory().unwrap();
        let result = execute_script(
            &conn,
            "CREATE TABLE t (id INTEGER); INSERT INTO t VALUES (1);",
            DEFAULT_ROW_LIMIT,
        )
        .unwrap();
        assert_eq!(result, QueryResult::status("OK"));

        let count: i64 = conn
            .query_row("SELECT count(*) FROM t", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_first_result_set_wins_and_later_statements_run() {
        let conn = conn_with("CREATE TABLE t (id INTEGER); INSERT INTO t VALUES (1), (2);");
        let result = execute_script(
            &conn,
            "SELECT id FROM t ORDER BY id; SELECT 'second'; INSERT INTO t VALUES (3);",
            DEFAULT_ROW_LIMIT,
        )
        .unwrap();

        assert_eq!(result.columns, vec!["id"]);
        assert_eq!(result.rows, vec![vec![json!(1)], vec![json!(2)]]);

        let count: i64 = conn
            .query_row("SELECT count(*) FROM t", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn test_rows_are_truncated_at_limit() {
        let conn = Connection::open_in_memory().unwrap();
        let result = execute_script(
            &conn,
            "WITH RECURSIVE n(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM n WHERE x < 10) \
             SELECT x FROM n",
            4,
        )
        .unwrap();
        assert_eq!(result.rows.len(), 4);
        assert!(result.truncated);
    }

    #[test]
    fn test_exact_limit_is_not_truncated() {
        let conn = Connection::open_in_memory().unwrap();
        let result = execute_script(&conn, "SELECT 1 UNION ALL SELECT 2", 2).unwrap();
        assert_eq!(result.rows.len(), 2);
        assert!(!result.truncated);
    }

    #[test]
    fn test_pragma_table_info_shape() {
        let conn = conn_with("CREATE TABLE users (id INTEGER PRIMARY KEY, email TEXT NOT NULL)");
        let result = execute_script(&conn, "PRAGMA table_info(\"users\")", 1000).unwrap();
        for column in ["name", "type", "notnull", "pk"] {
            assert!(result.column_index(column).is_some(), "missing {column}");
        }
        assert_eq!(result.rows.len(), 2);
    }

    #[test]
    fn test_sql_error_propagates() {
        let conn = Connection::open_in_memory().unwrap();
        let err = execute_script(&conn, "SELECT * FROM missing", DEFAULT_ROW_LIMIT).unwrap_err();
        assert!(err.to_string().contains("no such table"));
    }

    #[test]
    fn test_list_objects_orders_tables_before_views() {
        let conn = conn_with(
            "CREATE TABLE b (x); CREATE TABLE a (x); CREATE VIEW c AS SELECT * FROM a; \
             CREATE INDEX a_x ON a (x); CREATE TABLE s (id INTEGER PRIMARY KEY AUTOINCREMENT);",
        );
        let objects = list_objects(&conn).unwrap();
        assert_eq!(
            objects,
            vec![
                SchemaObject::table("a"),
                SchemaObject::table("b"),
                SchemaObject::table("s"),
                SchemaObject::view("c"),
            ]
        );
    }
}
