//! Operation-level entry points.
//!
//! `SalesStore` holds only configuration. Every operation opens its own
//! `StoreDb`, does its work and drops the connection on return, whether it
//! succeeded or not.

use std::path::{Path, PathBuf};

use crate::config::StoreConfig;
use crate::db::{DbError, StoreDb, TableCounts};
use crate::error::LoadError;
use crate::intake::{discover_pending, process_pending, IntakeReport};
use crate::loader::{load_data, load_sales_file, LoadSummary};
use crate::lookups::{load_lookups, LookupSummary};
use crate::outreach::{generate_outreach, OutreachError};
use crate::reports::{
    find_incomplete_coverage, find_most_recent_purchase, find_unpurchased_premium_products,
    MailingListEntry, ProductRow, RecentPurchase,
};
use crate::schema::rebuild_schema;

#[derive(Debug, Clone)]
pub struct SalesStore {
    config: StoreConfig,
}

impl SalesStore {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn open(&self) -> Result<StoreDb, DbError> {
        StoreDb::open_at(&self.config.db_path)
    }

    // =========================================================================
    // Setup
    // =========================================================================

    /// Drop and recreate every table. Destroys all data.
    pub fn rebuild_schema(&self) -> Result<(), DbError> {
        let mut db = self.open()?;
        rebuild_schema(&mut db)
    }

    pub fn load_lookups(&self) -> Result<LookupSummary, DbError> {
        let mut db = self.open()?;
        Ok(load_lookups(&mut db, &self.config.lookup_paths()))
    }

    /// Fresh schema plus reference data.
    pub fn rebuild_database(&self) -> Result<LookupSummary, DbError> {
        self.rebuild_schema()?;
        self.load_lookups()
    }

    pub fn table_counts(&self) -> Result<TableCounts, DbError> {
        self.open()?.table_counts()
    }

    // =========================================================================
    // Sales intake
    // =========================================================================

    pub fn load_sales_file(&self, path: &Path) -> Result<LoadSummary, LoadError> {
        let mut db = self.open()?;
        load_sales_file(&mut db, path)
    }

    /// Load one file; `false` means it was rolled back (details are logged).
    pub fn load_data(&self, path: &Path) -> bool {
        match self.open() {
            Ok(mut db) => load_data(&mut db, path),
            Err(e) => {
                log::error!("Cannot open store for {}: {}", path.display(), e);
                false
            }
        }
    }

    pub fn discover_pending(&self) -> Result<Vec<PathBuf>, LoadError> {
        discover_pending(&self.config.to_load_dir)
    }

    /// Each pending file gets its own store connection.
    pub fn process_pending(&self) -> Result<IntakeReport, LoadError> {
        process_pending(&self.config.db_path, &self.config.intake_dirs())
    }

    // =========================================================================
    // Reporting
    // =========================================================================

    pub fn find_incomplete_coverage(&self) -> Result<Vec<MailingListEntry>, DbError> {
        let db = self.open()?;
        find_incomplete_coverage(db.conn_ref())
    }

    pub fn find_unpurchased_premium_products(&self, cust_id: i64) -> Result<Vec<ProductRow>, DbError> {
        let db = self.open()?;
        find_unpurchased_premium_products(db.conn_ref(), cust_id)
    }

    pub fn find_most_recent_purchase(&self, cust_id: i64) -> Result<Vec<RecentPurchase>, DbError> {
        let db = self.open()?;
        find_most_recent_purchase(db.conn_ref(), cust_id)
    }

    /// Write a letter for every customer in the outreach segment.
    pub fn generate_outreach(&self) -> Result<Vec<PathBuf>, OutreachError> {
        let db = self.open()?;
        generate_outreach(db.conn_ref(), &self.config.letters_dir)
    }
}
