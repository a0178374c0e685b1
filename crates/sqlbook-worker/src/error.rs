use thiserror::Error;

/// Errors raised while serving a request. They travel back to the client as
/// `error` responses carrying the display text.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("No DB for this session.")]
    NoSession,

    #[error("Seed is not a SQLite database image ({len} bytes, header {header:?})")]
    InvalidSeed { len: usize, header: String },

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
}
