#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Connection string of the live store (schedule, tables, active reservations).
    pub database_url: String,

    /// Connection string of the archive store.
    ///
    /// Archived reservations are moved here and never take part in
    /// availability checks again.
    pub archive_database_url: String,

    // =========================
    // Pool configuration
    // =========================
    /// Upper bound on pooled connections per store.
    pub db_max_connections: u32,

    /// How long a connection waits on a locked database before the statement
    /// fails with a storage error.
    ///
    /// Concurrent bookings for the same table queue behind SQLite's writer
    /// lock; this bounds how long the loser waits before giving up.
    pub db_busy_timeout_ms: u64,

    // =========================
    // Bootstrap
    // =========================
    /// Table ids `1..=table_count` are seeded at startup (existing ids are kept).
    pub table_count: u32,

    /// Emit JSON logs instead of pretty output.
    pub json_logs: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://tablebook.db".to_string());
        let archive_database_url = std::env::var("ARCHIVE_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://tablebook_archive.db".to_string());

        Self {
            database_url,
            archive_database_url,

            db_max_connections: env_or("DB_MAX_CONNECTIONS", 16),
            db_busy_timeout_ms: env_or("DB_BUSY_TIMEOUT_MS", 5_000),

            table_count: env_or("TABLE_COUNT", 10),
            json_logs: std::env::var("APP_ENV").unwrap_or_default() == "production",
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
