//! Schema migrations for the SQLite primary store

use rusqlite::Connection;

use crate::error::StoreError;

/// Migrations in application order; the schema version is the index + 1
const MIGRATIONS: &[(&str, &str)] = &[("v001_initial", include_str!("v001_initial.sql"))];

/// Apply pending migrations, tracking the schema version in `user_version`
pub fn run(conn: &Connection) -> Result<(), StoreError> {
    let current: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    for (idx, (name, sql)) in MIGRATIONS.iter().enumerate() {
        let version = (idx + 1) as i32;
        if version <= current {
            continue;
        }
        tracing::info!("Running migration {version}: {name}");
        conn.execute_batch(sql)
            .map_err(|e| StoreError::Migration(format!("{name}: {e}")))?;
        conn.pragma_update(None, "user_version", version)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(conn: &Connection) -> i32 {
        conn.pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn run_brings_fresh_database_to_latest_version() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(version(&conn), 0);

        run(&conn).unwrap();
        assert_eq!(version(&conn), MIGRATIONS.len() as i32);
    }

    #[test]
    fn run_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        run(&conn).unwrap();
        assert_eq!(version(&conn), MIGRATIONS.len() as i32);
    }

    #[test]
    fn run_creates_tables() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();

        for table in ["attempts", "progress", "configurations"] {
            let count: i32 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "missing table {table}");
        }
    }
}
