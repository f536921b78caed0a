//! Bulk load of the static reference tables: products, states, zip codes.
//!
//! Reference files carry a header row, but the header names are ignored:
//! columns are mapped onto the table by position. Each table loads in its own
//! transaction and either lands completely or not at all.

use std::fs::File;
use std::path::{Path, PathBuf};

use rusqlite::{params, Transaction};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::db::StoreDb;
use crate::error::LoadError;

/// Locations of the three reference files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupPaths {
    pub products: PathBuf,
    pub states: PathBuf,
    pub zips: PathBuf,
}

/// One reference-file row that knows which table it belongs to.
pub trait LookupRecord: DeserializeOwned {
    const TABLE: &'static str;

    fn insert(&self, tx: &Transaction<'_>) -> rusqlite::Result<usize>;
}

/// products: id, description, unit price
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductRecord {
    pub prod_id: i64,
    pub prod_desc: String,
    pub unit_price: f64,
}

impl LookupRecord for ProductRecord {
    const TABLE: &'static str = "products";

    fn insert(&self, tx: &Transaction<'_>) -> rusqlite::Result<usize> {
        tx.execute(
            "INSERT INTO products (prod_id, prod_desc, unit_price) VALUES (?1, ?2, ?3)",
            params![self.prod_id, self.prod_desc, self.unit_price],
        )
    }
}

/// states: code, name
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StateRecord {
    pub st: String,
    pub state: String,
}

impl LookupRecord for StateRecord {
    const TABLE: &'static str = "states";

    fn insert(&self, tx: &Transaction<'_>) -> rusqlite::Result<usize> {
        tx.execute(
            "INSERT INTO states (st, state) VALUES (?1, ?2)",
            params![self.st, self.state],
        )
    }
}

/// zips: code, city, state code. The code stays text so leading zeros survive.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ZipRecord {
    pub zip: String,
    pub city: String,
    pub st: String,
}

impl LookupRecord for ZipRecord {
    const TABLE: &'static str = "zip_codes";

    fn insert(&self, tx: &Transaction<'_>) -> rusqlite::Result<usize> {
        tx.execute(
            "INSERT INTO zip_codes (zip, city, st) VALUES (?1, ?2, ?3)",
            params![self.zip, self.city, self.st],
        )
    }
}

/// Per-table outcome of [`load_lookups`].
#[derive(Debug)]
pub struct LookupSummary {
    pub products: Result<usize, LoadError>,
    pub states: Result<usize, LoadError>,
    pub zips: Result<usize, LoadError>,
}

impl LookupSummary {
    pub fn all_loaded(&self) -> bool {
        self.products.is_ok() && self.states.is_ok() && self.zips.is_ok()
    }
}

/// Render a CSV record the way it appeared in the file, for diagnostics.
pub(crate) fn record_text(record: &csv::StringRecord) -> String {
    record.iter().collect::<Vec<_>>().join(",")
}

/// Load every row of `path` into `T::TABLE` inside one transaction.
///
/// Returns the number of rows inserted. The first bad row rolls back the
/// whole table.
pub fn load_table<T: LookupRecord>(db: &mut StoreDb, path: &Path) -> Result<usize, LoadError> {
    let file = File::open(path).map_err(|e| LoadError::io(path, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(file);

    db.with_transaction(|tx| {
        let mut inserted = 0;
        for (row_index, result) in reader.records().enumerate() {
            let record = result.map_err(|e| LoadError::MalformedRow {
                row_index,
                row: String::new(),
                detail: e.to_string(),
            })?;
            let row = record_text(&record);

            // No headers passed: struct fields bind to columns by position
            let parsed: T = record
                .deserialize(None)
                .map_err(|e| LoadError::MalformedRow {
                    row_index,
                    row: row.clone(),
                    detail: e.to_string(),
                })?;

            parsed
                .insert(tx)
                .map_err(|e| LoadError::from_row(e, row_index, &row))?;
            inserted += 1;
        }
        Ok(inserted)
    })
}

fn load_and_report<T: LookupRecord>(db: &mut StoreDb, path: &Path) -> Result<usize, LoadError> {
    match load_table::<T>(db, path) {
        Ok(rows) => {
            log::info!("Loaded {} rows into {} from {}", rows, T::TABLE, path.display());
            Ok(rows)
        }
        Err(e) => {
            log::error!(
                "Failed to load {} from {}, rolled back: {}",
                T::TABLE,
                path.display(),
                e
            );
            Err(e)
        }
    }
}

/// Load products, states and zip codes, in that order.
///
/// A failing table does not stop the others from being attempted; zip codes
/// will of course fail their foreign keys if states did not load.
pub fn load_lookups(db: &mut StoreDb, paths: &LookupPaths) -> LookupSummary {
    let products = load_and_report::<ProductRecord>(db, &paths.products);
    let states = load_and_report::<StateRecord>(db, &paths.states);
    let zips = load_and_report::<ZipRecord>(db, &paths.zips);

    LookupSummary {
        products,
        states,
        zips,
    }
}
