//! File locations for the store, reference data, sales intake and letters.
//!
//! Every field has a default matching the standard project layout, so a
//! config file is only needed to point somewhere else:
//!
//! ```json
//! { "dbPath": "/srv/store/store.db", "toLoadDir": "/srv/incoming" }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::intake::IntakeDirs;
use crate::lookups::LookupPaths;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    #[serde(default = "default_products_file")]
    pub products_file: PathBuf,
    #[serde(default = "default_states_file")]
    pub states_file: PathBuf,
    #[serde(default = "default_zips_file")]
    pub zips_file: PathBuf,
    #[serde(default = "default_to_load_dir")]
    pub to_load_dir: PathBuf,
    #[serde(default = "default_loaded_dir")]
    pub loaded_dir: PathBuf,
    #[serde(default = "default_letters_dir")]
    pub letters_dir: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("../databases/store.db")
}

fn default_products_file() -> PathBuf {
    Path::new("data").join("lookups").join("prods.csv")
}

fn default_states_file() -> PathBuf {
    Path::new("data").join("lookups").join("states.csv")
}

fn default_zips_file() -> PathBuf {
    Path::new("data").join("lookups").join("zips.csv")
}

fn default_to_load_dir() -> PathBuf {
    Path::new("data").join("sales_to_load")
}

fn default_loaded_dir() -> PathBuf {
    Path::new("data").join("sales_loaded")
}

fn default_letters_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            products_file: default_products_file(),
            states_file: default_states_file(),
            zips_file: default_zips_file(),
            to_load_dir: default_to_load_dir(),
            loaded_dir: default_loaded_dir(),
            letters_dir: default_letters_dir(),
        }
    }
}

impl StoreConfig {
    /// Read and parse a JSON config file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Like [`StoreConfig::load_from`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_from(path)
    }

    pub fn lookup_paths(&self) -> LookupPaths {
        LookupPaths {
            products: self.products_file.clone(),
            states: self.states_file.clone(),
            zips: self.zips_file.clone(),
        }
    }

    pub fn intake_dirs(&self) -> IntakeDirs {
        IntakeDirs {
            to_load: self.to_load_dir.clone(),
            loaded: self.loaded_dir.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_project_layout() {
        let config = StoreConfig::default();
        assert_eq!(config.db_path, PathBuf::from("../databases/store.db"));
        assert!(config.to_load_dir.ends_with("sales_to_load"));
        assert!(config.loaded_dir.ends_with("sales_loaded"));
        assert!(config.zips_file.ends_with("zips.csv"));
    }

    #[test]
    fn test_partial_config_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storedata.json");
        fs::write(&path, r#"{ "dbPath": "/tmp/other.db", "lettersDir": "out" }"#).unwrap();

        let config = StoreConfig::load_from(&path).expect("parse");
        assert_eq!(config.db_path, PathBuf::from("/tmp/other.db"));
        assert_eq!(config.letters_dir, PathBuf::from("out"));
        assert_eq!(config.products_file, default_products_file());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::load_or_default(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, StoreConfig::default());
    }

    #[test]
    fn test_invalid_json_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storedata.json");
        fs::write(&path, "{ not json").unwrap();
        let err = StoreConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
