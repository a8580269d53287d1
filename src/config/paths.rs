//! Path utilities for the carbon-yield calculator.
//!
//! Defines standard locations for configuration and exports.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Base data directory.
///
/// Platform data dir via `directories`, falling back to
/// `~/.local/share/biosyn`.
pub fn data_dir() -> PathBuf {
    directories::ProjectDirs::from("org", "Biosyn", "CarbonYield")
        .map(|p| p.data_dir().to_path_buf())
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".local")
                .join("share")
                .join("biosyn")
        })
}

/// Configuration file path.
pub fn config_file() -> PathBuf {
    // Check environment variable first
    if let Ok(path) = std::env::var("BIOSYN_CONFIG") {
        return PathBuf::from(path);
    }

    data_dir().join("config.toml")
}

/// Default export file name for a run, e.g. `carbon_yield_20240312_101500.xlsx`.
pub fn export_file_name(prefix: &str, at: DateTime<Utc>) -> String {
    format!("{}_{}.xlsx", prefix, at.format("%Y%m%d_%H%M%S"))
}

/// Full export path inside `dir`.
pub fn export_path(dir: &Path, prefix: &str, at: DateTime<Utc>) -> PathBuf {
    dir.join(export_file_name(prefix, at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_paths_are_valid() {
        // Just ensure these don't panic
        let _ = data_dir();
        let _ = config_file();
    }

    #[test]
    fn test_export_file_name() {
        let at = Utc.with_ymd_and_hms(2024, 3, 12, 10, 15, 0).unwrap();
        assert_eq!(
            export_file_name("carbon_yield", at),
            "carbon_yield_20240312_101500.xlsx"
        );
        assert_eq!(
            export_path(Path::new("out"), "x", at),
            PathBuf::from("out").join("x_20240312_101500.xlsx")
        );
    }
}
