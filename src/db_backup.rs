//! SQLite online backup.

use std::path::Path;

use rusqlite::backup::Backup;
use rusqlite::Connection;

use crate::db::{DbError, StoreDb};

/// Copy the live database to `dest` with SQLite's online backup API.
///
/// The source stays open and usable during the copy.
pub fn backup_database(db: &StoreDb, dest: impl AsRef<Path>) -> Result<(), DbError> {
    let dest = dest.as_ref();
    let mut backup_conn = Connection::open(dest)
        .map_err(|e| DbError::Backup(format!("Failed to open backup file: {}", e)))?;

    let backup = Backup::new(db.conn_ref(), &mut backup_conn)
        .map_err(|e| DbError::Backup(format!("Failed to initialize backup: {}", e)))?;

    // Store files are small; copy every page in one step
    backup
        .step(-1)
        .map_err(|e| DbError::Backup(e.to_string()))?;

    log::info!("Database backed up to {}", dest.display());
    Ok(())
}
