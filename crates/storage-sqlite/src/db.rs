//! Database file location and connection setup.

use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{Result, StorageError};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// One database file per project: `<data_dir>/<project>.sqlite`.
pub fn database_path(data_dir: &Path, project: &str) -> Result<PathBuf> {
    let file_stem: String = project
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if file_stem.is_empty() || file_stem.chars().all(|c| c == '.') {
        return Err(StorageError::InvalidDestination(format!(
            "project '{}' cannot name a database file",
            project
        )));
    }
    Ok(data_dir.join(format!("{}.sqlite", file_stem)))
}

pub fn open_connection(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let conn = Connection::open(path)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(conn)
}

/// Double-quoted SQL identifier; table names such as `Dataset.table` stay intact.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
