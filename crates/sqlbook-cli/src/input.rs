//! Reading exercise files, seeds and configuration.

use anyhow::{Context, Result};
use sqlbook_core::Seed;
use sqlbook_session::SessionConfig;
use sqlbook_worker::SQLITE_HEADER;
use std::fs;
use std::path::Path;

/// Read an exercise or buffer file.
pub fn read_sql(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))
}

/// Load a seed. Files starting with the SQLite header are database images;
/// anything else is read as a SQL script.
pub fn read_seed(path: &Path) -> Result<Seed> {
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read seed: {}", path.display()))?;
    if bytes.starts_with(SQLITE_HEADER) {
        return Ok(Seed::Database(bytes));
    }
    let script = String::from_utf8(bytes).with_context(|| {
        format!(
            "Seed is neither a SQLite database nor UTF-8 SQL: {}",
            path.display()
        )
    })?;
    Ok(Seed::Sql(script))
}

/// Load the session configuration, or the defaults when no file is given.
pub fn load_config(path: Option<&Path>, timeout_ms: Option<u64>) -> Result<SessionConfig> {
    let mut config = match path {
        Some(path) => {
            let source = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            SessionConfig::from_toml_str(&source)
                .with_context(|| format!("Invalid config: {}", path.display()))?
        }
        None => SessionConfig::default(),
    };
    if let Some(timeout_ms) = timeout_ms {
        config.request_timeout_ms = timeout_ms;
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_sql_seed() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "CREATE TABLE t (x);").unwrap();
        assert_eq!(
            read_seed(file.path()).unwrap(),
            Seed::Sql("CREATE TABLE t (x);".to_string())
        );
    }

    #[test]
    fn test_read_database_seed() {
        let file = NamedTempFile::new().unwrap();
        {
            let conn = rusqlite::Connection::open(file.path()).unwrap();
            conn.execute_batch("CREATE TABLE t (x);").unwrap();
        }
        assert!(matches!(read_seed(file.path()).unwrap(), Seed::Database(_)));
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = read_sql(Path::new("/nonexistent/ex.sql")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/ex.sql"));
    }

    #[test]
    fn test_config_with_timeout_override() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "sessionId = \"ch1\"\nrequestTimeoutMs = 100").unwrap();
        let config = load_config(Some(file.path()), Some(250)).unwrap();
        assert_eq!(config.session_id, "ch1");
        assert_eq!(config.request_timeout_ms, 250);
    }

    #[test]
    fn test_default_config() {
        assert_eq!(load_config(None, None).unwrap(), SessionConfig::default());
    }
}
