//! SQLite execution engine for sqlbook exercises.
//!
//! A [`Worker`] keeps one database per session id and answers
//! [`EngineRequest`](sqlbook_core::EngineRequest)s with
//! [`EngineResponse`](sqlbook_core::EngineResponse)s. [`spawn`] runs a worker
//! on a dedicated thread behind a pair of channels so callers never block on
//! SQLite.

mod error;
mod exec;
mod session;
mod worker;

pub use error::WorkerError;
pub use exec::{execute_script, list_objects, value_to_json, DEFAULT_ROW_LIMIT};
pub use session::{Session, SQLITE_HEADER};
pub use worker::{spawn, EngineHandle, Worker};
