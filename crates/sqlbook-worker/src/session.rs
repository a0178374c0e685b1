//! A session owns one SQLite connection and, for image seeds, the temporary
//! file the connection reads from.

use std::io::Write;

use rusqlite::Connection;
use sqlbook_core::Seed;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::WorkerError;

/// Magic string at the start of every SQLite database file.
pub const SQLITE_HEADER: &[u8; 16] = b"SQLite format 3\0";

pub struct Session {
    conn: Connection,
    // Dropped after `conn` so the file outlives the connection.
    _image: Option<NamedTempFile>,
}

impl Session {
    /// Open a fresh database, optionally seeded.
    pub fn open(seed: Option<&Seed>) -> Result<Self, WorkerError> {
        match seed {
            None => Ok(Self {
                conn: Connection::open_in_memory()?,
                _image: None,
            }),
            Some(Seed::Sql(script)) => {
                let conn = Connection::open_in_memory()?;
                conn.execute_batch(script)?;
                debug!(len = script.len(), "session seeded from SQL script");
                Ok(Self { conn, _image: None })
            }
            Some(Seed::Database(bytes)) => {
                validate_image(bytes)?;
                let mut image = NamedTempFile::new()?;
                image.write_all(bytes)?;
                image.flush()?;
                let conn = Connection::open(image.path())?;
                debug!(
                    len = bytes.len(),
                    path = %image.path().display(),
                    "session opened from database image"
                );
                Ok(Self {
                    conn,
                    _image: Some(image),
                })
            }
        }
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

fn validate_image(bytes: &[u8]) -> Result<(), WorkerError> {
    if bytes.starts_with(SQLITE_HEADER) {
        return Ok(());
    }
    let head = &bytes[..bytes.len().min(SQLITE_HEADER.len())];
    Err(WorkerError::InvalidSeed {
        len: bytes.len(),
        header: String::from_utf8_lossy(head).into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_count(session: &Session) -> i64 {
        session
            .conn()
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type IN ('table','view')",
                [],
                |row| row.get(0),
            )
            .unwrap()
    }

    #[test]
    fn test_open_empty() {
        let session = Session::open(None).unwrap();
        assert_eq!(table_count(&session), 0);
    }

    #[test]
    fn test_open_sql_seed() {
        let seed = Seed::Sql(
            "CREATE TABLE t (id INTEGER); CREATE VIEW v AS SELECT * FROM t;".into(),
        );
        let session = Session::open(Some(&seed)).unwrap();
        assert_eq!(table_count(&session), 2);
    }

    #[test]
    fn test_open_bad_sql_seed() {
        let seed = Seed::Sql("CREATE TABLE".into());
        assert!(matches!(
            Session::open(Some(&seed)),
            Err(WorkerError::Sqlite(_))
        ));
    }

    #[test]
    fn test_open_database_image() {
        let source = NamedTempFile::new().unwrap();
        {
            let conn = Connection::open(source.path()).unwrap();
            conn.execute_batch(
                "CREATE TABLE users (id INTEGER PRIMARY KEY); INSERT INTO users VALUES (7);",
            )
            .unwrap();
        }
        let bytes = std::fs::read(source.path()).unwrap();

        let session = Session::open(Some(&Seed::Database(bytes))).unwrap();
        let id: i64 = session
            .conn()
            .query_row("SELECT id FROM users", [], |row| row.get(0))
            .unwrap();
        assert_eq!(id, 7);
    }

    #[test]
    fn test_rejects_non_sqlite_image() {
        let err = Session::open(Some(&Seed::Database(b"not a database".to_vec()))).err().unwrap();
        match err {
            WorkerError::InvalidSeed { len, header } => {
                assert_eq!(len, 14);
                assert_eq!(header, "not a database");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
