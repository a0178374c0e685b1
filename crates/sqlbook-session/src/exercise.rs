//! Exercise runner: executes user scripts and keeps the catalog in step with
//! the schema they build. Also backs the schema browser.

use std::sync::Arc;

use futures::try_join;
use sqlbook_core::{
    changes_schema, ColumnInfo, ForeignKey, ObjectDetails, QueryResult, SchemaObject, Seed,
};
use tracing::{debug, warn};

use crate::catalog::{quote_identifier, SchemaCache};
use crate::client::EngineClient;
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::provider::CompletionProvider;

pub struct SqlSession {
    client: EngineClient,
    session_id: String,
    exec_row_limit: usize,
    catalog_row_limit: usize,
    preview_row_limit: usize,
    cache: Arc<SchemaCache>,
}

impl SqlSession {
    pub fn new(client: EngineClient, config: &SessionConfig) -> Self {
        let cache = Arc::new(SchemaCache::new(
            client.clone(),
            config.session_id.clone(),
            config.catalog_row_limit,
        ));
        Self {
            client,
            session_id: config.session_id.clone(),
            exec_row_limit: config.exec_row_limit,
            catalog_row_limit: config.catalog_row_limit,
            preview_row_limit: config.preview_row_limit,
            cache,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn cache(&self) -> &Arc<SchemaCache> {
        &self.cache
    }

    /// A provider reading this session's catalog.
    pub fn completion_provider(&self) -> CompletionProvider {
        CompletionProvider::from_cache(Arc::clone(&self.cache))
    }

    /// Create the session's database and load its catalog.
    pub async fn init(&self, seed: Option<Seed>) -> Result<(), SessionError> {
        self.client.init(&self.session_id, seed).await?;
        self.cache.refresh().await.map(drop)
    }

    /// Throw the database away, recreate it from `seed` and reload the catalog.
    pub async fn reset(&self, seed: Option<Seed>) -> Result<(), SessionError> {
        self.client.reset(&self.session_id, seed).await?;
        self.cache.refresh().await.map(drop)
    }

    /// Run a script. Schema-changing scripts refresh the catalog afterwards,
    /// also when a later statement failed: the engine stops at the failing
    /// statement, so the ones before it have already run. A failed refresh
    /// is logged and does not change the outcome.
    pub async fn execute(&self, sql: &str) -> Result<QueryResult, SessionError> {
        let outcome = self
            .client
            .exec(&self.session_id, sql, Some(self.exec_row_limit))
            .await;

        let engine_ran = matches!(&outcome, Ok(_) | Err(SessionError::Engine(_)));
        if engine_ran && changes_schema(sql) {
            debug!(session = %self.session_id, "script changed the schema; refreshing catalog");
            if let Err(err) = self.cache.refresh().await {
                warn!(session = %self.session_id, error = %err, "catalog refresh after DDL failed");
            }
        }
        outcome
    }

    /// User tables and views, straight from the engine.
    pub async fn objects(&self) -> Result<Vec<SchemaObject>, SessionError> {
        self.client.schema(&self.session_id).await
    }

    /// Columns of a table or view, each with the foreign key it starts.
    ///
    /// `name` is matched exactly first, then ignoring ASCII case.
    pub async fn describe(&self, name: &str) -> Result<ObjectDetails, SessionError> {
        let object = self.find_object(name).await?;
        let quoted = quote_identifier(&object.name);
        let limit = Some(self.catalog_row_limit);

        let info_sql = format!("PRAGMA table_info({quoted});");
        let fk_sql = format!("PRAGMA foreign_key_list({quoted});");
        let (info, keys) = try_join!(
            self.client.exec(&self.session_id, &info_sql, limit),
            self.client.exec(&self.session_id, &fk_sql, limit),
        )?;

        Ok(ObjectDetails::new(
            object,
            ColumnInfo::from_table_info(&info),
            ForeignKey::from_foreign_key_list(&keys),
        ))
    }

    /// The first rows of a table or view.
    pub async fn preview(&self, name: &str) -> Result<QueryResult, SessionError> {
        let object = self.find_object(name).await?;
        let limit = self.preview_row_limit;
        let sql = format!("SELECT * FROM {} LIMIT {limit};", quote_identifier(&object.name));
        self.client.exec(&self.session_id, &sql, Some(limit)).await
    }

    async fn find_object(&self, name: &str) -> Result<SchemaObject, SessionError> {
        let objects = self.objects().await?;
        let exact = objects.iter().position(|object| object.name == name);
        let index = exact.or_else(|| {
            objects
                .iter()
                .position(|object| object.name.eq_ignore_ascii_case(name))
        });
        index
            .map(|idx| objects[idx].clone())
            .ok_or_else(|| SessionError::UnknownObject(name.to_string()))
    }
}
