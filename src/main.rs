//! `storedata`: run store operations from the command line.
//!
//! Usage: `storedata [--config <file>] <rebuild|load|letters|all>`
//!
//! - `rebuild`: drop and recreate the schema, then load the reference tables
//! - `load`:    load every pending sales file
//! - `letters`: write outreach letters for the premium-coverage segment
//! - `all`:     `load` followed by `letters`
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::path::PathBuf;
use std::process::ExitCode;

use storedata_lib::{SalesStore, StoreConfig};

const DEFAULT_CONFIG: &str = "storedata.json";
const USAGE: &str = "usage: storedata [--config <file>] <rebuild|load|letters|all>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Rebuild,
    Load,
    Letters,
    All,
}

fn parse_args(args: &[String]) -> Result<(PathBuf, Command), String> {
    let mut config = PathBuf::from(DEFAULT_CONFIG);
    let mut command = None;
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter.next().ok_or("--config needs a file path")?;
                config = PathBuf::from(path);
            }
            "rebuild" => command = Some(Command::Rebuild),
            "load" => command = Some(Command::Load),
            "letters" => command = Some(Command::Letters),
            "all" => command = Some(Command::All),
            other => return Err(format!("unknown argument '{}'", other)),
        }
    }

    command.map(|c| (config, c)).ok_or_else(|| "no command given".to_string())
}

fn run_load(store: &SalesStore) -> Result<bool, String> {
    let report = store
        .process_pending()
        .map_err(|e| format!("Intake failed: {}", e))?;
    for path in report.failed_files() {
        log::warn!("Failed to load: {} (left in place)", path.display());
    }
    Ok(report.failed_count() == 0)
}

fn run_letters(store: &SalesStore) -> Result<(), String> {
    let written = store
        .generate_outreach()
        .map_err(|e| format!("Letter generation failed: {}", e))?;
    log::info!("{} letters written", written.len());
    Ok(())
}

fn run(config_path: PathBuf, command: Command) -> Result<bool, String> {
    let config = StoreConfig::load_or_default(&config_path).map_err(|e| e.to_string())?;
    let store = SalesStore::new(config);

    match command {
        Command::Rebuild => {
            let summary = store
                .rebuild_database()
                .map_err(|e| format!("Rebuild failed: {}", e))?;
            Ok(summary.all_loaded())
        }
        Command::Load => run_load(&store),
        Command::Letters => run_letters(&store).map(|_| true),
        Command::All => {
            let all_loaded = run_load(&store)?;
            run_letters(&store)?;
            Ok(all_loaded)
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (config_path, command) = match parse_args(&args) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("{}\n{}", e, USAGE);
            return ExitCode::from(2);
        }
    };

    match run(config_path, command) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_command_with_default_config() {
        let (config, command) = parse_args(&args(&["load"])).unwrap();
        assert_eq!(config, PathBuf::from(DEFAULT_CONFIG));
        assert_eq!(command, Command::Load);
    }

    #[test]
    fn test_parse_explicit_config() {
        let (config, command) = parse_args(&args(&["--config", "alt.json", "all"])).unwrap();
        assert_eq!(config, PathBuf::from("alt.json"));
        assert_eq!(command, Command::All);
    }

    #[test]
    fn test_parse_rejects_unknown_and_missing() {
        assert!(parse_args(&args(&["frobnicate"])).is_err());
        assert!(parse_args(&args(&[])).is_err());
        assert!(parse_args(&args(&["--config"])).is_err());
    }
}
