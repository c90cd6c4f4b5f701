//! Path utilities

use std::path::PathBuf;

/// Data directory (~/.schemaprobe), falling back to the working directory
/// when no home is known
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".schemaprobe"))
        .unwrap_or_else(|| PathBuf::from(".schemaprobe"))
}

/// Config file location
pub fn config_path() -> PathBuf {
    data_dir().join("config.json")
}

/// Log file name for a run started at `stamp` (`%Y-%m-%d_%H-%M-%S`)
pub fn log_file_name(stamp: &str) -> String {
    format!("discovery_{}.log", safe_filename(stamp))
}

/// Sanitize filename
pub fn safe_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            _ => c,
        })
        .collect()
}
