//! Drop-and-recreate of the store schema.
//!
//! Rebuilding destroys every row. When the target is a file-backed database
//! that already holds tables, a hot copy is written to
//! `<db_path>.pre-rebuild.bak` before anything is dropped.

use crate::db::{DbError, StoreDb};
use crate::db_backup::backup_database;

/// Every table, children before parents. Dropping in this order keeps each
/// `DROP` legal while foreign keys are enforced.
pub const TABLES_DROP_ORDER: [&str; 6] = [
    "order_lines",
    "orders",
    "products",
    "customers",
    "zip_codes",
    "states",
];

const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Drop all six tables if present and recreate them with their constraints.
pub fn rebuild_schema(db: &mut StoreDb) -> Result<(), DbError> {
    backup_before_rebuild(db)?;

    db.with_transaction(|tx| -> Result<(), DbError> {
        for table in TABLES_DROP_ORDER {
            tx.execute_batch(&format!("DROP TABLE IF EXISTS {table};"))?;
        }
        tx.execute_batch(SCHEMA_SQL)?;
        Ok(())
    })?;

    log::info!("Schema rebuilt ({} tables)", TABLES_DROP_ORDER.len());
    Ok(())
}

fn backup_before_rebuild(db: &StoreDb) -> Result<(), DbError> {
    let db_path: String = db
        .conn_ref()
        .query_row("PRAGMA database_list", [], |row| row.get(2))?;

    if db_path.is_empty() || db_path == ":memory:" {
        // In-memory or temp database, nothing to keep
        return Ok(());
    }

    let mut has_tables = false;
    for table in TABLES_DROP_ORDER {
        if db.table_exists(table)? {
            has_tables = true;
            break;
        }
    }
    if !has_tables {
        return Ok(());
    }

    let backup_path = format!("{db_path}.pre-rebuild.bak");
    backup_database(db, &backup_path)?;
    Ok(())
}
