pub mod schema;

use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};

use crate::config::AppConfig;
use crate::error::AppError;

/// Handles to both stores. The live store holds the schedule, the tables and
/// active reservations; the archive store only holds archived reservations.
#[derive(Clone)]
pub struct Db {
    pub live: SqlitePool,
    pub archive: SqlitePool,
}

impl Db {
    pub async fn connect(config: &AppConfig) -> anyhow::Result<Self> {
        let live = open_pool(&config.database_url, config)
            .await
            .context("failed to open live store")?;
        let archive = open_pool(&config.archive_database_url, config)
            .await
            .context("failed to open archive store")?;

        Ok(Self { live, archive })
    }

    pub fn from_pools(live: SqlitePool, archive: SqlitePool) -> Self {
        Self { live, archive }
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        schema::migrate_live(&self.live)
            .await
            .context("live store migration failed")?;
        schema::migrate_archive(&self.archive)
            .await
            .context("archive store migration failed")?;
        Ok(())
    }

    /// Makes sure table ids `1..=count` exist. Extra tables are left alone.
    pub async fn seed_tables(&self, count: u32) -> anyhow::Result<()> {
        let mut tx = self.live.begin().await?;
        for id in 1..=i64::from(count) {
            sqlx::query("INSERT OR IGNORE INTO tables (id) VALUES (?);")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await.context("failed to seed tables")?;
        Ok(())
    }
}

async fn open_pool(url: &str, config: &AppConfig) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)
        .with_context(|| format!("invalid database url: {url}"))?
        .create_if_missing(true)
        .busy_timeout(Duration::from_millis(config.db_busy_timeout_ms));

    let pool = SqlitePoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/* =========================
Row helpers shared by the repositories
========================= */

pub(crate) fn column_u8(r: &SqliteRow, column: &'static str) -> Result<u8, sqlx::Error> {
    let v: i64 = r.try_get(column)?;
    u8::try_from(v).map_err(|_| sqlx::Error::Decode(format!("{column} out of range: {v}").into()))
}

pub(crate) fn decode_error(e: AppError) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(e))
}
