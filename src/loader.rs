//! Incremental load of one sales file.
//!
//! Each sales row spans three tables: it names a customer, an order (customer
//! plus date) and one order line. The loader resolves or creates the customer,
//! resolves or creates the order, then inserts the line. The whole file runs in
//! a single IMMEDIATE transaction; the first bad row rolls everything back.
//!
//! Repeated (order, product) pairs are not merged. The second occurrence hits
//! the `order_lines` primary key and aborts the file.

use std::fs::File;
use std::path::Path;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use rusqlite::{params, OptionalExtension, Transaction};
use serde::Deserialize;

use crate::db::StoreDb;
use crate::error::LoadError;
use crate::lookups::record_text;

/// One row of a sales extract. Columns are matched by header name.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SalesRow {
    pub first: String,
    pub last: String,
    pub addr: String,
    pub zip: String,
    pub date: String,
    pub prod_id: i64,
    pub qty: i64,
}

/// What one successful file load added to the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub rows: usize,
    pub customers_created: usize,
    pub orders_created: usize,
    pub lines_inserted: usize,
}

/// Result of a get-or-create lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    Existing(i64),
    Created(i64),
}

impl Resolved {
    pub fn id(self) -> i64 {
        match self {
            Resolved::Existing(id) | Resolved::Created(id) => id,
        }
    }

    pub fn was_created(self) -> bool {
        matches!(self, Resolved::Created(_))
    }
}

/// Find the customer with this exact (first, last, addr, zip), inserting one
/// if none exists.
pub fn resolve_customer(tx: &Transaction<'_>, row: &SalesRow) -> rusqlite::Result<Resolved> {
    let existing: Option<i64> = tx
        .query_row(
            "SELECT cust_id FROM customers
             WHERE first = ?1 AND last = ?2 AND addr = ?3 AND zip = ?4
             ORDER BY cust_id
             LIMIT 1",
            params![row.first, row.last, row.addr, row.zip],
            |r| r.get(0),
        )
        .optional()?;

    if let Some(id) = existing {
        return Ok(Resolved::Existing(id));
    }

    let id = tx.query_row(
        "INSERT INTO customers (first, last, addr, zip) VALUES (?1, ?2, ?3, ?4)
         RETURNING cust_id",
        params![row.first, row.last, row.addr, row.zip],
        |r| r.get(0),
    )?;
    Ok(Resolved::Created(id))
}

/// Find the order for (cust_id, date), inserting one if none exists.
pub fn resolve_order(tx: &Transaction<'_>, cust_id: i64, date: &str) -> rusqlite::Result<Resolved> {
    let existing: Option<i64> = tx
        .query_row(
            "SELECT order_id FROM orders WHERE cust_id = ?1 AND date = ?2
             ORDER BY order_id
             LIMIT 1",
            params![cust_id, date],
            |r| r.get(0),
        )
        .optional()?;

    if let Some(id) = existing {
        return Ok(Resolved::Existing(id));
    }

    let id = tx.query_row(
        "INSERT INTO orders (cust_id, date) VALUES (?1, ?2) RETURNING order_id",
        params![cust_id, date],
        |r| r.get(0),
    )?;
    Ok(Resolved::Created(id))
}

pub fn insert_order_line(
    tx: &Transaction<'_>,
    order_id: i64,
    prod_id: i64,
    qty: i64,
) -> rusqlite::Result<()> {
    tx.execute(
        "INSERT INTO order_lines (order_id, prod_id, qty) VALUES (?1, ?2, ?3)",
        params![order_id, prod_id, qty],
    )?;
    Ok(())
}

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap())
}

/// Reject dates that are not a real `YYYY-MM-DD` calendar day.
fn validate_date(date: &str) -> Result<(), String> {
    if !date_re().is_match(date) {
        return Err(format!("date '{}' is not YYYY-MM-DD", date));
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|e| format!("date '{}' is not a calendar date: {}", date, e))
}

/// Materialize one already-parsed row.
fn load_row(
    tx: &Transaction<'_>,
    row: &SalesRow,
    summary: &mut LoadSummary,
) -> rusqlite::Result<()> {
    let customer = resolve_customer(tx, row)?;
    let order = resolve_order(tx, customer.id(), &row.date)?;
    insert_order_line(tx, order.id(), row.prod_id, row.qty)?;

    summary.rows += 1;
    summary.customers_created += usize::from(customer.was_created());
    summary.orders_created += usize::from(order.was_created());
    summary.lines_inserted += 1;
    Ok(())
}

/// Load one sales file into the store.
///
/// All-or-nothing: on error nothing from the file is kept, and the error
/// names the offending row (0-based, header excluded) and its content.
pub fn load_sales_file(db: &mut StoreDb, path: &Path) -> Result<LoadSummary, LoadError> {
    let file = File::open(path).map_err(|e| LoadError::io(path, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(file);
    let headers = reader.headers()?.clone();

    db.with_transaction(|tx| {
        let mut summary = LoadSummary::default();

        for (row_index, result) in reader.records().enumerate() {
            let record = result.map_err(|e| LoadError::MalformedRow {
                row_index,
                row: String::new(),
                detail: e.to_string(),
            })?;
            let text = record_text(&record);
            let malformed = |detail: String| LoadError::MalformedRow {
                row_index,
                row: text.clone(),
                detail,
            };

            let row: SalesRow = record
                .deserialize(Some(&headers))
                .map_err(|e| malformed(e.to_string()))?;
            validate_date(&row.date).map_err(malformed)?;

            load_row(tx, &row, &mut summary)
                .map_err(|e| LoadError::from_row(e, row_index, &text))?;
        }

        Ok(summary)
    })
}

/// Boolean form of [`load_sales_file`]: logs the outcome and reports success.
pub fn load_data(db: &mut StoreDb, path: &Path) -> bool {
    match load_sales_file(db, path) {
        Ok(summary) => {
            log::info!(
                "Loaded {}: {} rows, {} new customers, {} new orders",
                path.display(),
                summary.rows,
                summary.customers_created,
                summary.orders_created
            );
            true
        }
        Err(e) => {
            log::error!("Rolled back {}: {}", path.display(), e);
            false
        }
    }
}
