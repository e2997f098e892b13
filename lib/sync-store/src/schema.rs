use std::path::Path;

use rusqlite::Connection;

use crate::error::{inerr, StoreError};

/// Which of the two persisted trees a row belongs to, mirroring the
/// original implementation's `TreeType` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeKind {
    /// The tree as it stood after the last successful sync.
    Saved = 1,
    /// The tree most recently retrieved from the cloud's delta feed.
    Delta = 2,
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS config (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS file_nodes (
    tree   INTEGER NOT NULL,
    id     TEXT NOT NULL,
    name   TEXT NOT NULL,
    size   INTEGER NOT NULL,
    e_tag  TEXT NOT NULL,
    c_tag  TEXT NOT NULL,
    parent TEXT NOT NULL,
    PRIMARY KEY (tree, id)
);

CREATE TABLE IF NOT EXISTS dir_nodes (
    tree   INTEGER NOT NULL,
    id     TEXT NOT NULL,
    name   TEXT,
    parent TEXT,
    PRIMARY KEY (tree, id)
);

CREATE TABLE IF NOT EXISTS hashes (
    id        TEXT NOT NULL,
    algorithm TEXT NOT NULL,
    value     TEXT NOT NULL,
    PRIMARY KEY (id, algorithm)
);
";

/// Opens (creating if necessary) the database at `path` and ensures every
/// table it needs exists.
pub fn open(path: impl AsRef<Path>) -> Result<Connection, StoreError> {
    let conn = Connection::open(path).map_err(StoreError::from)?;
    conn.execute_batch(SCHEMA).map_err(inerr("open"))?;
    Ok(conn)
}

/// Opens an in-memory database, for tests and dry runs.
pub fn open_in_memory() -> Result<Connection, StoreError> {
    let conn = Connection::open_in_memory().map_err(StoreError::from)?;
    conn.execute_batch(SCHEMA).map_err(inerr("open_in_memory"))?;
    Ok(conn)
}
