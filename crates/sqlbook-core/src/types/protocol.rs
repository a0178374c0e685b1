//! Messages exchanged with the SQL engine worker.
//!
//! Every request names the session it targets (`id`) and carries a
//! correlation token (`client`) that the worker echoes on the matching
//! response. Clients drop responses whose token they do not recognize.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::catalog::SchemaObject;

/// Initial database contents for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum Seed {
    /// SQL script executed against an empty database.
    Sql(String),
    /// Raw SQLite database file image.
    Database(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum RequestBody {
    Init {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        seed: Option<Seed>,
    },
    Reset {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        seed: Option<Seed>,
    },
    Schema,
    Exec {
        sql: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        limit: Option<usize>,
    },
}

impl RequestBody {
    /// Short name used when minting correlation tokens and in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Init { .. } => "init",
            Self::Reset { .. } => "reset",
            Self::Schema => "schema",
            Self::Exec { .. } => "exec",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EngineRequest {
    /// Session the request targets.
    pub id: String,
    /// Correlation token echoed on the response.
    pub client: String,
    pub body: RequestBody,
}

/// Tabular result of an `exec` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
    pub truncated: bool,
}

impl QueryResult {
    /// Single-cell `status` result used for statements without a result set.
    pub fn status(value: &str) -> Self {
        Self {
            columns: vec!["status".to_string()],
            rows: vec![vec![serde_json::Value::String(value.to_string())]],
            truncated: false,
        }
    }

    /// Index of a column by exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum ResponseBody {
    Result(QueryResult),
    Schema { objects: Vec<SchemaObject> },
    Error { message: String },
}

impl ResponseBody {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Result(_) => "result",
            Self::Schema { .. } => "schema",
            Self::Error { .. } => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EngineResponse {
    pub id: String,
    pub client: String,
    pub body: ResponseBody,
}

impl EngineResponse {
    pub fn reply(request: &EngineRequest, body: ResponseBody) -> Self {
        Self {
            id: request.id.clone(),
            client: request.client.clone(),
            body,
        }
    }
}
