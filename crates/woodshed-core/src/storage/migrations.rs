//! Database schema migrations for woodshed.
//!
//! Migrations are versioned and applied automatically when opening the
//! database. The `schema_version` table tracks the current migration
//! version.

use rusqlite::{Connection, Result as SqliteResult};

/// Apply all pending migrations to bring the database to the current
/// schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

/// Create the schema_version table if it doesn't exist.
fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (initial database).
fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or(0)
}

/// Set the schema version in the database.
fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// v1: initial schema. Pieces, spots, attempts, projects, membership.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS pieces (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            composer TEXT,
            difficulty INTEGER NOT NULL DEFAULT 3,
            target_tempo INTEGER,
            current_tempo INTEGER,
            total_practice_minutes INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS spots (
            id TEXT PRIMARY KEY,
            piece_id TEXT NOT NULL REFERENCES pieces(id),
            page INTEGER NOT NULL,
            x REAL NOT NULL,
            y REAL NOT NULL,
            width REAL NOT NULL,
            height REAL NOT NULL,
            priority TEXT NOT NULL,
            color TEXT NOT NULL,
            difficulty INTEGER NOT NULL,
            readiness TEXT NOT NULL,
            last_practiced TEXT,
            next_due TEXT,
            recommended_minutes INTEGER NOT NULL,
            active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS attempts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            spot_id TEXT NOT NULL REFERENCES spots(id),
            at TEXT NOT NULL,
            duration_minutes INTEGER NOT NULL,
            result TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS projects (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            concert_date TEXT,
            daily_goal_minutes INTEGER,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS project_pieces (
            project_id TEXT NOT NULL REFERENCES projects(id),
            piece_id TEXT NOT NULL REFERENCES pieces(id),
            position INTEGER NOT NULL,
            PRIMARY KEY (project_id, piece_id)
        );",
    )?;
    set_schema_version(conn, 1)
}

/// v2: lookup indexes for the hot queries (spots by piece, attempts by
/// spot).
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_spots_piece ON spots(piece_id);
         CREATE INDEX IF NOT EXISTS idx_attempts_spot ON attempts(spot_id);
         CREATE INDEX IF NOT EXISTS idx_project_pieces_project
             ON project_pieces(project_id);",
    )?;
    set_schema_version(conn, 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrate_fresh_database() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), 2);

        // Tables exist
        let count: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
                 AND name IN ('pieces', 'spots', 'attempts', 'projects', 'project_pieces')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 5);
    }

    #[test]
    fn test_migrate_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), 2);
    }
}
