//! Schema catalog snapshot used by the completion analyzer.
//!
//! A catalog lists the user tables and views of a session database together
//! with per-object column metadata. Snapshots are immutable; the session
//! layer replaces them wholesale when the schema changes.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::types::QueryResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Table,
    View,
}

impl ObjectKind {
    /// Parse the `type` column of `sqlite_master`.
    pub fn from_sqlite_type(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("table") {
            Some(Self::Table)
        } else if value.eq_ignore_ascii_case("view") {
            Some(Self::View)
        } else {
            None
        }
    }
}

/// A table or view reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchemaObject {
    pub name: String,
    pub kind: ObjectKind,
}

impl SchemaObject {
    pub fn table(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ObjectKind::Table,
        }
    }

    pub fn view(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ObjectKind::View,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInfo {
    pub name: String,
    /// Declared type as written in the DDL; empty when none was given.
    #[serde(default)]
    pub declared_type: String,
    #[serde(default)]
    pub not_null: bool,
    #[serde(default)]
    pub is_primary_key: bool,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
            not_null: false,
            is_primary_key: false,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    /// Decode the rows of a `PRAGMA table_info(...)` result.
    ///
    /// Columns are located by name (`name`, `type`, `notnull`, `pk`), so the
    /// order the engine reports them in does not matter. Rows without a
    /// usable name are skipped.
    pub fn from_table_info(result: &QueryResult) -> Vec<ColumnInfo> {
        let name_idx = result.column_index("name");
        let type_idx = result.column_index("type");
        let notnull_idx = result.column_index("notnull");
        let pk_idx = result.column_index("pk");

        let Some(name_idx) = name_idx else {
            return Vec::new();
        };

        result
            .rows
            .iter()
            .filter_map(|row| {
                let name = row.get(name_idx)?.as_str()?.to_string();
                let declared_type = type_idx
                    .and_then(|idx| row.get(idx))
                    .and_then(|value| value.as_str())
                    .unwrap_or_default()
                    .to_string();
                Some(ColumnInfo {
                    name,
                    declared_type,
                    not_null: notnull_idx.is_some_and(|idx| is_truthy(row.get(idx))),
                    is_primary_key: pk_idx.is_some_and(|idx| is_truthy(row.get(idx))),
                })
            })
            .collect()
    }
}

/// SQLite reports flags as integers; `pk` is the 1-based key position.
fn is_truthy(value: Option<&serde_json::Value>) -> bool {
    match value {
        Some(serde_json::Value::Bool(flag)) => *flag,
        Some(serde_json::Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0),
        Some(serde_json::Value::String(text)) => !text.is_empty() && text != "0",
        _ => false,
    }
}

/// One row of `PRAGMA foreign_key_list(...)`: `from` references `table.to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKey {
    pub from: String,
    pub table: String,
    /// `None` when the key targets the parent's primary key implicitly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
}

impl ForeignKey {
    /// Decode the rows of a `PRAGMA foreign_key_list(...)` result. Rows
    /// missing `from` or `table` are skipped.
    pub fn from_foreign_key_list(result: &QueryResult) -> Vec<ForeignKey> {
        let (Some(from_idx), Some(table_idx)) =
            (result.column_index("from"), result.column_index("table"))
        else {
            return Vec::new();
        };
        let to_idx = result.column_index("to");

        result
            .rows
            .iter()
            .filter_map(|row| {
                Some(ForeignKey {
                    from: row.get(from_idx)?.as_str()?.to_string(),
                    table: row.get(table_idx)?.as_str()?.to_string(),
                    to: to_idx
                        .and_then(|idx| row.get(idx))
                        .and_then(|value| value.as_str())
                        .map(str::to_string),
                })
            })
            .collect()
    }

    /// `table.to`, or just `table` for an implicit primary-key reference.
    pub fn target(&self) -> String {
        match &self.to {
            Some(to) => format!("{}.{}", self.table, to),
            None => self.table.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDetail {
    #[serde(flatten)]
    pub column: ColumnInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<ForeignKey>,
}

/// Everything the schema browser shows about one table or view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObjectDetails {
    pub name: String,
    pub kind: ObjectKind,
    pub columns: Vec<ColumnDetail>,
}

impl ObjectDetails {
    /// Attach foreign keys to the columns they start from. A column that
    /// starts several keys keeps the first one reported.
    pub fn new(
        object: SchemaObject,
        columns: Vec<ColumnInfo>,
        foreign_keys: Vec<ForeignKey>,
    ) -> Self {
        let columns = columns
            .into_iter()
            .map(|column| {
                let foreign_key = foreign_keys.iter().find(|fk| fk.from == column.name).cloned();
                ColumnDetail {
                    column,
                    foreign_key,
                }
            })
            .collect();
        Self {
            name: object.name,
            kind: object.kind,
            columns,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct SchemaCatalog {
    pub tables: Vec<String>,
    pub views: Vec<String>,
    pub columns_by_table: BTreeMap<String, Vec<ColumnInfo>>,
}

impl SchemaCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Assemble a catalog from the object list and fetched column metadata.
    ///
    /// Every listed object gets an entry in `columns_by_table`, empty when no
    /// metadata was supplied for it. Column lists for unlisted objects are
    /// dropped.
    pub fn from_parts(
        objects: impl IntoIterator<Item = SchemaObject>,
        columns: impl IntoIterator<Item = (String, Vec<ColumnInfo>)>,
    ) -> Self {
        let mut catalog = Self::default();
        for object in objects {
            catalog.columns_by_table.entry(object.name.clone()).or_default();
            match object.kind {
                ObjectKind::Table => catalog.tables.push(object.name),
                ObjectKind::View => catalog.views.push(object.name),
            }
        }
        for (name, cols) in columns {
            if let Some(slot) = catalog.columns_by_table.get_mut(&name) {
                *slot = cols;
            }
        }
        catalog
    }

    /// All objects, tables first, in catalog order.
    pub fn objects(&self) -> impl Iterator<Item = &str> {
        self.tables
            .iter()
            .chain(self.views.iter())
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.views.is_empty()
    }

    /// Resolve an object name as SQLite would: exact match first, then
    /// ASCII case-insensitive.
    pub fn resolve_object(&self, name: &str) -> Option<&str> {
        if self.columns_by_table.contains_key(name) {
            return self
                .columns_by_table
                .get_key_value(name)
                .map(|(key, _)| key.as_str());
        }
        self.columns_by_table
            .keys()
            .find(|key| key.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }

    /// Columns of an object; empty for unknown objects.
    pub fn columns(&self, name: &str) -> &[ColumnInfo] {
        self.resolve_object(name)
            .and_then(|key| self.columns_by_table.get(key))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_parts_fills_missing_entries() {
        let catalog = SchemaCatalog::from_parts(
            vec![SchemaObject::table("users"), SchemaObject::view("active_users")],
            vec![("users".to_string(), vec![ColumnInfo::new("id", "INTEGER")])],
        );

        assert_eq!(catalog.tables, vec!["users"]);
        assert_eq!(catalog.views, vec!["active_users"]);
        assert_eq!(catalog.columns("users").len(), 1);
        assert!(catalog.columns("active_users").is_empty());
        assert!(catalog.columns_by_table.contains_key("active_users"));
    }

    #[test]
    fn test_from_parts_drops_unlisted_columns() {
        let catalog = SchemaCatalog::from_parts(
            vec![SchemaObject::table("users")],
            vec![("ghost".to_string(), vec![ColumnInfo::new("id", "")])],
        );
        assert!(!catalog.columns_by_table.contains_key("ghost"));
    }

    #[test]
    fn test_columns_case_insensitive_fallback() {
        let catalog = SchemaCatalog::from_parts(
            vec![SchemaObject::table("Users")],
            vec![("Users".to_string(), vec![ColumnInfo::new("id", "INTEGER")])],
        );
        assert_eq!(catalog.columns("users").len(), 1);
        assert_eq!(catalog.resolve_object("USERS"), Some("Users"));
        assert!(catalog.columns("orders").is_empty());
    }

    #[test]
    fn test_objects_lists_tables_before_views() {
        let catalog = SchemaCatalog::from_parts(
            vec![
                SchemaObject::view("v"),
                SchemaObject::table("b"),
                SchemaObject::table("a"),
            ],
            Vec::new(),
        );
        let objects: Vec<&str> = catalog.objects().collect();
        assert_eq!(objects, vec!["b", "a", "v"]);
    }

    #[test]
    fn test_from_table_info() {
        let result = QueryResult {
            columns: vec![
                "cid".to_string(),
                "name".to_string(),
                "type".to_string(),
                "notnull".to_string(),
                "dflt_value".to_string(),
                "pk".to_string(),
            ],
            rows: vec![
                vec![json!(0), json!("id"), json!("INTEGER"), json!(0), json!(null), json!(1)],
                vec![json!(1), json!("email"), json!("TEXT"), json!(1), json!(null), json!(0)],
                vec![json!(2), json!("note"), json!(""), json!(0), json!(null), json!(0)],
            ],
            truncated: false,
        };

        let columns = ColumnInfo::from_table_info(&result);
        assert_eq!(
            columns,
            vec![
                ColumnInfo::new("id", "INTEGER").primary_key(),
                ColumnInfo::new("email", "TEXT").not_null(),
                ColumnInfo::new("note", ""),
            ]
        );
    }

    #[test]
    fn test_from_table_info_without_name_column() {
        let result = QueryResult::status("OK");
        assert!(ColumnInfo::from_table_info(&result).is_empty());
    }

    #[test]
    fn test_object_kind_from_sqlite_type() {
        assert_eq!(ObjectKind::from_sqlite_type("table"), Some(ObjectKind::Table));
        assert_eq!(ObjectKind::from_sqlite_type("VIEW"), Some(ObjectKind::View));
        assert_eq!(ObjectKind::from_sqlite_type("index"), None);
    }

    fn foreign_key_list(rows: Vec<Vec<serde_json::Value>>) -> QueryResult {
        QueryResult {
            columns: ["id", "seq", "table", "from", "to", "on_update", "on_delete", "match"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            rows,
            truncated: false,
        }
    }

    #[test]
    fn test_from_foreign_key_list() {
        let result = foreign_key_list(vec![
            vec![json!(0), json!(0), json!("users"), json!("user_id"), json!("id")],
            vec![json!(1), json!(0), json!("products"), json!("sku"), json!(null)],
            vec![json!(2), json!(0), json!(null), json!("broken"), json!("id")],
        ]);
        let keys = ForeignKey::from_foreign_key_list(&result);
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].target(), "users.id");
        assert_eq!(keys[1].to, None);
        assert_eq!(keys[1].target(), "products");
    }

    #[test]
    fn test_object_details_joins_keys_by_column() {
        let details = ObjectDetails::new(
            SchemaObject::table("orders"),
            vec![
                ColumnInfo::new("id", "INTEGER").primary_key(),
                ColumnInfo::new("user_id", "INTEGER"),
            ],
            vec![ForeignKey {
                from: "user_id".to_string(),
                table: "users".to_string(),
                to: Some("id".to_string()),
            }],
        );
        assert_eq!(details.kind, ObjectKind::Table);
        assert_eq!(details.columns[0].foreign_key, None);
        assert_eq!(
            details.columns[1].foreign_key.as_ref().map(ForeignKey::target),
            Some("users.id".to_string())
        );

        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["columns"][1]["name"], "user_id");
        assert_eq!(json["columns"][1]["foreignKey"]["table"], "users");
    }
}
