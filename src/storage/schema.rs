//! Schema bootstrap and connection setup for the datastore file.

use rusqlite::{Connection, OpenFlags};
use std::path::Path;

use super::error::StorageError;

/// The only table. `id` is the primary key so duplicate inserts fail.
const SCHEMA_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS post_history (
        id           TEXT NOT NULL PRIMARY KEY,
        post_time    DATETIME,
        flair        TEXT,
        url          TEXT,
        author       TEXT,
        num_comments INTEGER
    );
"#;

/// Apply connection pragmas for the writer.
///
/// The journal stays in rollback mode: after each commit the main file alone
/// holds every row, which is what the backup snapshot copies.
pub fn apply_pragmas(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "synchronous", "FULL")
}

/// Create the `post_history` table if it is missing.
pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}

/// Liveness probe: a trivial round trip through the connection.
pub fn probe(conn: &Connection) -> rusqlite::Result<()> {
    conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
        .map(|_| ())
}

/// Open (creating if absent) the datastore, apply the schema and probe it.
pub fn open_datastore(path: &Path) -> Result<Connection, StorageError> {
    let existed = path.exists();
    let unavailable = |source| StorageError::Unavailable {
        path: path.to_path_buf(),
        source,
    };

    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(unavailable)?;

    apply_pragmas(&conn).map_err(unavailable)?;
    initialize_schema(&conn).map_err(unavailable)?;
    probe(&conn).map_err(unavailable)?;

    if existed {
        tracing::info!(path = %path.display(), "Opened existing datastore");
    } else {
        tracing::info!(path = %path.display(), "Created datastore");
    }

    Ok(conn)
}
