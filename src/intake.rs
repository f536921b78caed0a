//! Sales-file intake pipeline.
//!
//! Orchestrates: discover → load → relocate.
//!
//! Pending files sit in the to-load directory as `Sales_<token>.csv`. They are
//! processed one at a time in file-name order. A file that loads is moved to
//! the loaded directory under the same name; a file that fails stays where it
//! is so it can be fixed and picked up by a later run.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use walkdir::WalkDir;

use crate::db::StoreDb;
use crate::error::LoadError;
use crate::loader::{load_sales_file, LoadSummary};

/// Sales extracts: `Sales_` prefix, `.csv` extension, anything in between.
pub const SALES_FILE_PATTERN: &str = r"^Sales_.+\.csv$";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeDirs {
    pub to_load: PathBuf,
    pub loaded: PathBuf,
}

/// Result of processing a single pending file.
#[derive(Debug)]
pub enum FileOutcome {
    /// Loaded and moved to `destination`.
    Loaded {
        summary: LoadSummary,
        destination: PathBuf,
    },
    /// Left in place.
    Failed(LoadError),
}

#[derive(Debug, Default)]
pub struct IntakeReport {
    pub outcomes: Vec<(PathBuf, FileOutcome)>,
}

impl IntakeReport {
    pub fn loaded_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, FileOutcome::Loaded { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.loaded_count()
    }

    pub fn failed_files(&self) -> Vec<&Path> {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, FileOutcome::Failed(_)))
            .map(|(p, _)| p.as_path())
            .collect()
    }
}

/// Counts-only view of an [`IntakeReport`] for the end-of-run log line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntakeTotals {
    pub files_loaded: usize,
    pub files_failed: usize,
    pub rows_loaded: usize,
}

impl From<&IntakeReport> for IntakeTotals {
    fn from(report: &IntakeReport) -> Self {
        let rows_loaded = report
            .outcomes
            .iter()
            .map(|(_, o)| match o {
                FileOutcome::Loaded { summary, .. } => summary.rows,
                FileOutcome::Failed(_) => 0,
            })
            .sum();
        IntakeTotals {
            files_loaded: report.loaded_count(),
            files_failed: report.failed_count(),
            rows_loaded,
        }
    }
}

fn sales_file_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(SALES_FILE_PATTERN).unwrap())
}

/// List pending sales files in `to_load`, sorted by file name.
///
/// Only regular files directly inside the directory are considered. A missing
/// directory means nothing is pending.
pub fn discover_pending(to_load: &Path) -> Result<Vec<PathBuf>, LoadError> {
    if !to_load.exists() {
        log::debug!("Intake directory {} does not exist", to_load.display());
        return Ok(Vec::new());
    }

    let mut files = Vec::new();

    for entry in WalkDir::new(to_load).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(to_load).to_path_buf();
            LoadError::io(path, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_sales = entry
            .file_name()
            .to_str()
            .map(|name| sales_file_re().is_match(name))
            .unwrap_or(false);
        if is_sales {
            files.push(entry.into_path());
        }
    }

    // Names embed sortable dates/sequence numbers, so this is load order
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Move a file, keeping its name. Tries a rename first and falls back to
/// copy-then-delete across filesystems.
pub fn relocate(source: &Path, dest_dir: &Path) -> Result<PathBuf, LoadError> {
    std::fs::create_dir_all(dest_dir).map_err(|e| LoadError::io(dest_dir, e))?;

    let file_name = source.file_name().ok_or_else(|| {
        LoadError::io(
            source,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
        )
    })?;
    let destination = dest_dir.join(file_name);

    if std::fs::rename(source, &destination).is_err() {
        std::fs::copy(source, &destination).map_err(|e| LoadError::io(&destination, e))?;
        std::fs::remove_file(source).map_err(|e| LoadError::io(source, e))?;
    }

    Ok(destination)
}

/// Load one pending file and relocate it on success.
///
/// The store connection is opened for this file alone and closed before
/// returning.
pub fn process_file(db_path: &Path, path: &Path, loaded_dir: &Path) -> FileOutcome {
    let loaded = StoreDb::open_at(db_path)
        .map_err(LoadError::from)
        .and_then(|mut db| load_sales_file(&mut db, path));
    let summary = match loaded {
        Ok(summary) => summary,
        Err(e) => {
            log::error!("Failed to load: {} ({})", path.display(), e);
            return FileOutcome::Failed(e);
        }
    };

    match relocate(path, loaded_dir) {
        Ok(destination) => {
            log::info!(
                "File: {} loaded successfully! ({} rows, {} new customers, {} new orders)",
                path.display(),
                summary.rows,
                summary.customers_created,
                summary.orders_created
            );
            FileOutcome::Loaded {
                summary,
                destination,
            }
        }
        Err(e) => {
            // The rows are committed; only the move failed.
            log::error!(
                "Loaded {} but could not move it to {}: {}",
                path.display(),
                loaded_dir.display(),
                e
            );
            FileOutcome::Failed(e)
        }
    }
}

/// Process every pending file in order. A failure never stops later files.
pub fn process_pending(db_path: &Path, dirs: &IntakeDirs) -> Result<IntakeReport, LoadError> {
    let files = discover_pending(&dirs.to_load)?;
    let mut report = IntakeReport::default();

    for path in files {
        let outcome = process_file(db_path, &path, &dirs.loaded);
        report.outcomes.push((path, outcome));
    }

    let totals = IntakeTotals::from(&report);
    log::info!(
        "Intake finished: {} loaded, {} failed, {} rows",
        totals.files_loaded,
        totals.files_failed,
        totals.rows_loaded
    );
    Ok(report)
}
