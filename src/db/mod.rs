//! SQLite store for the Hardware Store sales data.
//!
//! `StoreDb` owns a single connection with foreign-key enforcement switched on.
//! Callers open one per unit of work and drop it when done; write paths go
//! through [`StoreDb::with_transaction`] so the transaction handle is passed
//! explicitly to the functions doing the work.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};

pub mod types;
pub use types::*;

pub struct StoreDb {
    conn: Connection,
}

impl StoreDb {
    /// Borrow the underlying connection for ad-hoc queries.
    pub fn conn_ref(&self) -> &Connection {
        &self.conn
    }

    /// Open (or create) the database at `path`.
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(DbError::CreateDir)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::configure(conn)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, DbError> {
        Self::configure(Connection::open_in_memory()?)
    }

    fn configure(conn: Connection) -> Result<Self, DbError> {
        // SQLite leaves FK enforcement off per connection unless asked.
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn })
    }

    /// Run `f` inside an IMMEDIATE transaction.
    ///
    /// The write lock is taken at `BEGIN`, so nothing `f` reads can be changed
    /// by another writer before it commits. Commits on `Ok`, rolls back on `Err`.
    pub fn with_transaction<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, E>,
        E: From<rusqlite::Error>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        match f(&tx) {
            Ok(val) => {
                tx.commit()?;
                Ok(val)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback() {
                    log::warn!("Rollback failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }

    /// Whether a table with this name exists.
    pub fn table_exists(&self, name: &str) -> Result<bool, DbError> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![name],
                |_row| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Count the rows in every table.
    pub fn table_counts(&self) -> Result<TableCounts, DbError> {
        let count = |table: &str| -> Result<i64, DbError> {
            let n = self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                    row.get(0)
                })?;
            Ok(n)
        };

        Ok(TableCounts {
            states: count("states")?,
            zip_codes: count("zip_codes")?,
            customers: count("customers")?,
            products: count("products")?,
            orders: count("orders")?,
            order_lines: count("order_lines")?,
        })
    }

    // =========================================================================
    // Row access
    // =========================================================================

    pub fn get_customers(&self) -> Result<Vec<DbCustomer>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT cust_id, first, last, addr, zip FROM customers ORDER BY cust_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(DbCustomer {
                cust_id: row.get(0)?,
                first: row.get(1)?,
                last: row.get(2)?,
                addr: row.get(3)?,
                zip: row.get(4)?,
            })
        })?;

        let mut customers = Vec::new();
        for row in rows {
            customers.push(row?);
        }
        Ok(customers)
    }

    /// Orders for one customer, oldest id first.
    pub fn get_customer_orders(&self, cust_id: i64) -> Result<Vec<DbOrder>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT order_id, cust_id, date FROM orders WHERE cust_id = ?1 ORDER BY order_id",
        )?;
        let rows = stmt.query_map(params![cust_id], |row| {
            Ok(DbOrder {
                order_id: row.get(0)?,
                cust_id: row.get(1)?,
                date: row.get(2)?,
            })
        })?;

        let mut orders = Vec::new();
        for row in rows {
            orders.push(row?);
        }
        Ok(orders)
    }

    pub fn get_order_lines(&self, order_id: i64) -> Result<Vec<DbOrderLine>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT order_id, prod_id, qty FROM order_lines WHERE order_id = ?1 ORDER BY prod_id",
        )?;
        let rows = stmt.query_map(params![order_id], |row| {
            Ok(DbOrderLine {
                order_id: row.get(0)?,
                prod_id: row.get(1)?,
                qty: row.get(2)?,
            })
        })?;

        let mut lines = Vec::new();
        for row in rows {
            lines.push(row?);
        }
        Ok(lines)
    }
}
