//! Async session layer for sqlbook exercises.
//!
//! [`EngineClient`] correlates requests and responses over a worker's
//! channels. [`SchemaCache`] keeps a per-session [`SchemaCatalog`] snapshot,
//! [`CompletionProvider`] turns editor state into suggestions against it, and
//! [`SqlSession`] runs exercise scripts, refreshing the catalog after DDL.
//!
//! [`SchemaCatalog`]: sqlbook_core::SchemaCatalog

mod catalog;
mod client;
mod config;
mod error;
mod exercise;
mod provider;

pub use catalog::{CatalogState, SchemaCache};
pub use client::EngineClient;
pub use config::SessionConfig;
pub use error::SessionError;
pub use exercise::SqlSession;
pub use provider::{CompletionProvider, EditorModel};
