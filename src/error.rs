//! Error types for file and table loads.
//!
//! A `LoadError` ends one unit of work (a sales file or a lookup table). The
//! transaction for that unit has already been rolled back by the time the
//! caller sees it; the intake pipeline logs it and moves on to the next file.

use std::path::PathBuf;

use rusqlite::ErrorCode;
use thiserror::Error;

use crate::db::DbError;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Constraint violation at row {row_index} [{row}]: {detail}")]
    ConstraintViolation {
        row_index: usize,
        row: String,
        detail: String,
    },

    #[error("Malformed row {row_index} [{row}]: {detail}")]
    MalformedRow {
        row_index: usize,
        row: String,
        detail: String,
    },

    #[error("I/O failure on {}: {source}", .path.display())]
    IoFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("SQLite error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("Failed to open store: {0}")]
    Open(#[from] DbError),
}

impl LoadError {
    /// Classify a store error raised while writing the row at `row_index`.
    pub fn from_row(err: rusqlite::Error, row_index: usize, row: &str) -> Self {
        let is_constraint = matches!(
            err.sqlite_error_code(),
            Some(ErrorCode::ConstraintViolation)
        );
        if is_constraint {
            LoadError::ConstraintViolation {
                row_index,
                row: row.to_string(),
                detail: err.to_string(),
            }
        } else if matches!(
            err,
            rusqlite::Error::InvalidParameterCount(..)
                | rusqlite::Error::InvalidColumnType(..)
                | rusqlite::Error::FromSqlConversionFailure(..)
        ) {
            LoadError::MalformedRow {
                row_index,
                row: row.to_string(),
                detail: err.to_string(),
            }
        } else {
            LoadError::Store(err)
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LoadError::IoFailure {
            path: path.into(),
            source,
        }
    }

    /// Index of the offending data row (0-based, header excluded), if any.
    pub fn row_index(&self) -> Option<usize> {
        match self {
            LoadError::ConstraintViolation { row_index, .. }
            | LoadError::MalformedRow { row_index, .. } => Some(*row_index),
            _ => None,
        }
    }

    /// True when the input data itself is at fault rather than the environment.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            LoadError::ConstraintViolation { .. } | LoadError::MalformedRow { .. }
        )
    }

    /// Get a human-readable recovery suggestion
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            LoadError::ConstraintViolation { .. } => {
                "Fix the reported row (unknown zip/product, duplicate line, or bad quantity) and rerun."
            }
            LoadError::MalformedRow { .. } => "Check the file's columns and value formats.",
            LoadError::IoFailure { .. } => "Check file permissions and that the directories exist.",
            LoadError::Csv(_) => "Check the file is comma-separated with a header row.",
            LoadError::Store(_) | LoadError::Open(_) => {
                "Check the database file is present and not locked."
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn constraint_error() -> rusqlite::Error {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (qty INTEGER CHECK(qty > 0));")
            .unwrap();
        conn.execute("INSERT INTO t (qty) VALUES (0)", []).unwrap_err()
    }

    #[test]
    fn test_constraint_failures_are_classified() {
        let err = LoadError::from_row(constraint_error(), 4, "a,b,c");
        assert!(matches!(err, LoadError::ConstraintViolation { row_index: 4, .. }));
        assert_eq!(err.row_index(), Some(4));
        assert!(err.is_data_error());
        assert!(err.to_string().contains("a,b,c"));
    }

    #[test]
    fn test_other_store_errors_pass_through() {
        let err = LoadError::from_row(rusqlite::Error::QueryReturnedNoRows, 0, "");
        assert!(matches!(err, LoadError::Store(_)));
        assert_eq!(err.row_index(), None);
        assert!(!err.is_data_error());
    }

    #[test]
    fn test_io_failure_names_path() {
        let err = LoadError::io(
            "data/sales_to_load/Sales_1.csv",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.to_string().contains("Sales_1.csv"));
        assert!(!err.recovery_suggestion().is_empty());
    }
}
