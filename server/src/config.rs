//! Configuration for the tens10n server
//!
//! Every value comes from an environment variable with a compile-time
//! default. Command-line flags override the backend choice.
//!
//! Data directory precedence:
//! 1. TENS10N_DATA_DIR environment variable
//! 2. ~/.config/tens10n/data (production default)
//! 3. ./data (fallback when no home directory is known)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_CONFIG_DIR: &str = ".config/tens10n/data";
const DEV_DATA_DIR: &str = "./data";
const DB_FILE_NAME: &str = "tens10n.db";
const DEFAULT_DB_TIMEOUT_MS: u64 = 5000;

/// Which source adapter backs the retrieval service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Backend {
    /// Packaged read-only bundle (directory or zip archive)
    Bundle,
    /// Writable data directory
    Directory,
    /// SQLite document store
    Sqlite,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bundle" => Ok(Self::Bundle),
            "directory" | "dir" => Ok(Self::Directory),
            "sqlite" | "db" => Ok(Self::Sqlite),
            other => Err(format!("unknown backend: {other}")),
        }
    }
}

/// Backend from TENS10N_BACKEND, `bundle` when unset or unrecognized.
pub fn get_backend() -> Backend {
    match std::env::var("TENS10N_BACKEND") {
        Ok(value) => value.parse().unwrap_or_else(|e| {
            tracing::warn!("{}, falling back to bundle", e);
            Backend::Bundle
        }),
        Err(_) => Backend::Bundle,
    }
}

/// Resource root of the packaged bundle: a directory or a `.zip` archive.
pub fn get_bundle_path() -> PathBuf {
    match std::env::var("TENS10N_BUNDLE_PATH") {
        Ok(path) => PathBuf::from(path),
        Err(_) => PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data"),
    }
}

/// Root of the writable directory backend.
pub fn get_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("TENS10N_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(dirs) = directories::BaseDirs::new() {
        return dirs.home_dir().join(DEFAULT_CONFIG_DIR);
    }

    PathBuf::from(DEV_DATA_DIR)
}

pub fn get_db_path() -> PathBuf {
    match std::env::var("TENS10N_DB_PATH") {
        Ok(path) => PathBuf::from(path),
        Err(_) => get_data_dir().join(DB_FILE_NAME),
    }
}

/// Deadline applied to every document store query.
pub fn get_db_timeout() -> Duration {
    parse_timeout_ms(std::env::var("TENS10N_DB_TIMEOUT_MS").ok().as_deref())
}

/// Abort startup when any record was skipped during load.
pub fn get_strict_load() -> bool {
    parse_flag(std::env::var("TENS10N_STRICT_LOAD").ok().as_deref())
}

/// Directory for rolling log files. Logs go to stderr when unset.
pub fn get_log_dir() -> Option<PathBuf> {
    std::env::var("TENS10N_LOG_DIR").ok().map(PathBuf::from)
}

fn parse_timeout_ms(value: Option<&str>) -> Duration {
    let ms = value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|&ms| ms > 0)
        .unwrap_or(DEFAULT_DB_TIMEOUT_MS);
    Duration::from_millis(ms)
}

fn parse_flag(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_data_dir_fallback() {
        // Either TENS10N_DATA_DIR, the home config dir, or ./data.
        let dir = get_data_dir();
        assert!(!dir.as_os_str().is_empty());
    }

    #[test]
    fn test_default_bundle_is_shipped_data() {
        if std::env::var("TENS10N_BUNDLE_PATH").is_err() {
            assert!(get_bundle_path().ends_with("server/data"));
        }
    }

    #[test]
    fn test_backend_parsing() {
        assert_eq!("bundle".parse::<Backend>(), Ok(Backend::Bundle));
        assert_eq!(" Directory ".parse::<Backend>(), Ok(Backend::Directory));
        assert_eq!("SQLITE".parse::<Backend>(), Ok(Backend::Sqlite));
        assert!("mongo".parse::<Backend>().is_err());
    }

    #[test]
    fn test_timeout_parsing() {
        assert_eq!(parse_timeout_ms(None), Duration::from_millis(5000));
        assert_eq!(parse_timeout_ms(Some("250")), Duration::from_millis(250));
        assert_eq!(parse_timeout_ms(Some("0")), Duration::from_millis(5000));
        assert_eq!(parse_timeout_ms(Some("soon")), Duration::from_millis(5000));
    }

    #[test]
    fn test_flag_parsing() {
        assert!(parse_flag(Some("true")));
        assert!(parse_flag(Some(" 1 ")));
        assert!(!parse_flag(Some("false")));
        assert!(!parse_flag(None));
    }
}
