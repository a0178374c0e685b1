//! Per-session schema catalog cache.
//!
//! The catalog is built from the engine in two round trips: one `schema`
//! request listing user objects, then one `PRAGMA table_info` per object,
//! all in flight at once. The snapshot is published only when every fetch
//! succeeded.

use std::sync::Arc;

use futures::future::try_join_all;
use sqlbook_core::{ColumnInfo, SchemaCatalog};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::client::EngineClient;
use crate::error::SessionError;

/// Where the cache is in its lifecycle. Readable at any time without waiting.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogState {
    NotLoaded,
    /// A build is running. `previous` is the snapshot it will replace.
    Loading {
        previous: Option<Arc<SchemaCatalog>>,
    },
    Ready(Arc<SchemaCatalog>),
    Failed(String),
}

impl CatalogState {
    /// The current snapshot, if the last build finished and succeeded.
    pub fn catalog(&self) -> Option<Arc<SchemaCatalog>> {
        match self {
            Self::Ready(catalog) => Some(Arc::clone(catalog)),
            _ => None,
        }
    }

    /// The best snapshot available right now: the current one, or the one
    /// still standing while a rebuild runs.
    pub fn snapshot(&self) -> Option<Arc<SchemaCatalog>> {
        match self {
            Self::Ready(catalog) => Some(Arc::clone(catalog)),
            Self::Loading { previous } => previous.clone(),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }
}

/// Puts the pre-build state back if a build is dropped before it publishes.
struct LoadingGuard<'a> {
    state: &'a watch::Sender<CatalogState>,
    prior: Option<CatalogState>,
}

impl<'a> LoadingGuard<'a> {
    fn start(state: &'a watch::Sender<CatalogState>) -> Self {
        let prior = state.borrow().clone();
        state.send_replace(CatalogState::Loading {
            previous: prior.snapshot(),
        });
        Self {
            state,
            prior: Some(prior),
        }
    }

    fn previous(&self) -> Option<Arc<SchemaCatalog>> {
        self.prior.as_ref().and_then(CatalogState::snapshot)
    }

    fn finish(mut self, next: CatalogState) {
        self.prior = None;
        self.state.send_replace(next);
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if let Some(prior) = self.prior.take() {
            debug!("catalog build abandoned; restoring previous state");
            self.state.send_replace(prior);
        }
    }
}

pub struct SchemaCache {
    client: EngineClient,
    session_id: String,
    row_limit: usize,
    state: watch::Sender<CatalogState>,
    // Held for the duration of a build so concurrent callers share one.
    building: Mutex<()>,
}

impl SchemaCache {
    pub fn new(client: EngineClient, session_id: impl Into<String>, row_limit: usize) -> Self {
        let (state, _) = watch::channel(CatalogState::NotLoaded);
        Self {
            client,
            session_id: session_id.into(),
            row_limit,
            state,
            building: Mutex::new(()),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn state(&self) -> CatalogState {
        self.state.borrow().clone()
    }

    /// Watch state transitions.
    pub fn subscribe(&self) -> watch::Receiver<CatalogState> {
        self.state.subscribe()
    }

    /// Return the cached snapshot, building it first when there is none or
    /// when `force` is set.
    ///
    /// The earlier snapshot stays readable through
    /// [`CatalogState::snapshot`] while the build runs. A failed build leaves
    /// it in place; with no earlier snapshot the state becomes
    /// [`CatalogState::Failed`]. A build dropped midway restores the state it
    /// started from.
    pub async fn ensure_catalog(&self, force: bool) -> Result<Arc<SchemaCatalog>, SessionError> {
        if !force {
            if let Some(catalog) = self.state().catalog() {
                return Ok(catalog);
            }
        }

        let _guard = self.building.lock().await;
        // Someone else may have finished a build while we waited.
        if !force {
            if let Some(catalog) = self.state().catalog() {
                return Ok(catalog);
            }
        }

        let loading = LoadingGuard::start(&self.state);
        debug!(session = %self.session_id, force, "building schema catalog");

        match self.build().await {
            Ok(catalog) => {
                let catalog = Arc::new(catalog);
                info!(
                    session = %self.session_id,
                    tables = catalog.tables.len(),
                    views = catalog.views.len(),
                    "schema catalog ready"
                );
                loading.finish(CatalogState::Ready(Arc::clone(&catalog)));
                Ok(catalog)
            }
            Err(err) => {
                warn!(session = %self.session_id, error = %err, "schema catalog build failed");
                let next = match loading.previous() {
                    Some(catalog) => CatalogState::Ready(catalog),
                    None => CatalogState::Failed(err.to_string()),
                };
                loading.finish(next);
                Err(err)
            }
        }
    }

    /// Rebuild unconditionally and replace the snapshot.
    pub async fn refresh(&self) -> Result<Arc<SchemaCatalog>, SessionError> {
        self.ensure_catalog(true).await
    }

    async fn build(&self) -> Result<SchemaCatalog, SessionError> {
        let objects = self.client.schema(&self.session_id).await?;

        let fetches = objects.iter().map(|object| async move {
            let sql = format!("PRAGMA table_info({});", quote_identifier(&object.name));
            let result = self
                .client
                .exec(&self.session_id, &sql, Some(self.row_limit))
                .await?;
            Ok::<_, SessionError>((object.name.clone(), ColumnInfo::from_table_info(&result)))
        });
        let columns = try_join_all(fetches).await?;

        Ok(SchemaCatalog::from_parts(objects, columns))
    }
}

/// Double-quoted SQL identifier with embedded quotes doubled.
pub(crate) fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("users", "\"users\"")]
    #[case("order items", "\"order items\"")]
    #[case("we\"ird", "\"we\"\"ird\"")]
    fn test_quote_identifier(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(quote_identifier(name), expected);
    }

    #[test]
    fn test_state_catalog_only_when_ready() {
        assert!(CatalogState::NotLoaded.catalog().is_none());
        assert!(CatalogState::Loading { previous: None }.catalog().is_none());
        assert!(CatalogState::Failed("boom".to_string()).catalog().is_none());
        let ready = CatalogState::Ready(Arc::new(SchemaCatalog::empty()));
        assert!(ready.catalog().is_some_and(|catalog| catalog.is_empty()));
    }

    #[test]
    fn test_snapshot_survives_loading() {
        let catalog = Arc::new(SchemaCatalog::empty());
        let loading = CatalogState::Loading {
            previous: Some(Arc::clone(&catalog)),
        };
        assert!(loading.catalog().is_none());
        assert_eq!(loading.snapshot(), Some(catalog));
        assert!(CatalogState::Failed("boom".to_string()).snapshot().is_none());
    }

    #[test]
    fn test_dropped_build_restores_state() {
        let catalog = Arc::new(SchemaCatalog::empty());
        let (state, _) = watch::channel(CatalogState::Ready(Arc::clone(&catalog)));
        let guard = LoadingGuard::start(&state);
        assert!(state.borrow().is_loading());
        drop(guard);
        assert_eq!(*state.borrow(), CatalogState::Ready(catalog));

        let failed = CatalogState::Failed("no such session".to_string());
        let (state, _) = watch::channel(failed.clone());
        drop(LoadingGuard::start(&state));
        assert_eq!(*state.borrow(), failed);
    }
}
