// File: src/storage/sqlite/config.rs

/// SQLite log store configuration
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Path to database file (or ":memory:" for in-memory)
    pub path: String,

    /// Enable WAL journal mode
    pub wal_mode: bool,

    /// Busy timeout in milliseconds
    pub busy_timeout_ms: u32,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: "ct-log.db".to_string(),
            wal_mode: true,
            busy_timeout_ms: 5000,
        }
    }
}
