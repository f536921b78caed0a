use thiserror::Error;

/// Errors specific to database operations.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to create database directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Database backup failed: {0}")]
    Backup(String),
}

/// A row from the `customers` table.
#[derive(Debug, Clone, PartialEq)]
pub struct DbCustomer {
    pub cust_id: i64,
    pub first: String,
    pub last: String,
    pub addr: String,
    pub zip: String,
}

/// A row from the `orders` table.
#[derive(Debug, Clone, PartialEq)]
pub struct DbOrder {
    pub order_id: i64,
    pub cust_id: i64,
    pub date: String,
}

/// A row from the `order_lines` table.
#[derive(Debug, Clone, PartialEq)]
pub struct DbOrderLine {
    pub order_id: i64,
    pub prod_id: i64,
    pub qty: i64,
}

/// Row counts for every table in the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableCounts {
    pub states: i64,
    pub zip_codes: i64,
    pub customers: i64,
    pub products: i64,
    pub orders: i64,
    pub order_lines: i64,
}
