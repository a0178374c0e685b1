//! Completion entry point for an editor attached to a session.

use std::sync::Arc;

use sqlbook_core::{
    completion_items, CompletionList, CompletionRequest, CursorPosition, SchemaCatalog,
};
use tracing::debug;

use crate::catalog::{CatalogState, SchemaCache};
use crate::client::EngineClient;
use crate::config::SessionConfig;
use crate::error::SessionError;

/// The parts of an editor the provider reads: its text and the cursor.
pub trait EditorModel {
    fn text(&self) -> &str;
    fn cursor(&self) -> CursorPosition;
}

impl EditorModel for CompletionRequest {
    fn text(&self) -> &str {
        &self.text
    }

    fn cursor(&self) -> CursorPosition {
        self.position
    }
}

/// Produces suggestions from whatever catalog the session has right now.
#[derive(Clone)]
pub struct CompletionProvider {
    cache: Arc<SchemaCache>,
}

impl CompletionProvider {
    /// Wire a provider to an engine session and start the first catalog build
    /// in the background.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn attach(client: EngineClient, session_id: &str, config: &SessionConfig) -> Self {
        let cache = Arc::new(SchemaCache::new(client, session_id, config.catalog_row_limit));
        let provider = Self::from_cache(Arc::clone(&cache));
        tokio::spawn(async move {
            // Failures are logged by the cache and reflected in its state.
            let _ = cache.ensure_catalog(false).await;
        });
        provider
    }

    /// Provider over an existing cache. Starts nothing.
    pub fn from_cache(cache: Arc<SchemaCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<SchemaCache> {
        &self.cache
    }

    pub fn catalog_state(&self) -> CatalogState {
        self.cache.state()
    }

    /// Ranked suggestions for the editor's cursor. Never waits on the engine.
    ///
    /// A rebuild in flight keeps serving the snapshot it will replace. With
    /// no snapshot yet the analysis runs against an empty catalog; after a
    /// failed first build the list is empty.
    pub fn provide_completion_items(&self, editor: &dyn EditorModel) -> CompletionList {
        let request = CompletionRequest::new(editor.text(), editor.cursor());
        let state = self.cache.state();
        if let Some(catalog) = state.snapshot() {
            return completion_items(&request, &catalog);
        }
        match state {
            CatalogState::Failed(message) => {
                debug!(
                    session = self.cache.session_id(),
                    %message,
                    "catalog unavailable; no suggestions"
                );
                CompletionList::empty(request.position)
            }
            _ => completion_items(&request, &SchemaCatalog::empty()),
        }
    }

    /// Rebuild the catalog, e.g. after the user ran DDL.
    pub async fn refresh_catalog(&self) -> Result<Arc<SchemaCatalog>, SessionError> {
        self.cache.refresh().await
    }
}
