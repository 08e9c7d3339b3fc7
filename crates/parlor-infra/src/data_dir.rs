//! Data directory resolution.
//!
//! Parlor keeps its database and `config.toml` in one directory:
//! `PARLOR_DATA_DIR` when set, otherwise `~/.parlor`.

use std::path::PathBuf;

/// Resolve the Parlor data directory.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("PARLOR_DATA_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".parlor")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_home_dot_parlor() {
        // The env var is not set in the test environment by default.
        if std::env::var("PARLOR_DATA_DIR").is_err() {
            let dir = resolve_data_dir();
            assert!(dir.ends_with(".parlor"));
        }
    }
}
