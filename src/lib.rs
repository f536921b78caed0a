pub mod config;
pub mod db;
mod db_backup;
pub mod error;
pub mod intake;
pub mod loader;
pub mod lookups;
pub mod outreach;
pub mod reports;
pub mod schema;
pub mod store;

pub use config::StoreConfig;
pub use db_backup::backup_database;
pub use error::LoadError;
pub use store::SalesStore;
