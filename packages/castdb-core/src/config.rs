//! Store configuration.

use std::path::PathBuf;

/// Store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path of the backing CSV file
    pub data_path: PathBuf,
    /// Attempt budget for transient I/O errors during load and save
    pub max_io_attempts: u32,
    /// Page size used when a listing request names no limit
    pub default_page_size: usize,
    /// Request body read timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("./characters.csv"),
            max_io_attempts: 5,
            default_page_size: 10,
            request_timeout_ms: 5000, // 5 seconds default
        }
    }
}
