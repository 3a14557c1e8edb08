#![allow(dead_code)]

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use uuid::Uuid;

use tablebook::config::AppConfig;
use tablebook::db::Db;
use tablebook::reservation::model::{NewReservation, TableId};
use tablebook::reservation::repository_sqlx::SqlxReservationRepository;
use tablebook::reservation::store::ReservationStore;
use tablebook::schedule::repository_sqlx::SqlxScheduleRepository;
use tablebook::schedule::store::ScheduleStore;
use tablebook::slot::SlotIndex;

/// Isolated, uniquely named in-memory SQLite database.
/// The unique name keeps parallel tests apart while shared cache lets every
/// pooled connection see the same data.
pub async fn memory_pool() -> SqlitePool {
    let name = Uuid::new_v4();
    let options =
        SqliteConnectOptions::from_str(&format!("sqlite:file:{name}?mode=memory&cache=shared"))
            .unwrap();

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .unwrap()
}

/// Migrated live + archive stores with tables 1..=3.
pub async fn setup_db() -> Db {
    let db = Db::from_pools(memory_pool().await, memory_pool().await);
    db.migrate().await.unwrap();
    db.seed_tables(3).await.unwrap();
    db
}

/// Migrated file-backed live + archive stores under the temp dir, opened the
/// way the binary opens them. Pass the returned paths to [`remove_files`].
pub async fn setup_file_db() -> (Db, Vec<PathBuf>) {
    let dir = std::env::temp_dir();
    let name = Uuid::new_v4();
    let live = dir.join(format!("tablebook-{name}.db"));
    let archive = dir.join(format!("tablebook-{name}-archive.db"));

    let config = AppConfig {
        database_url: format!("sqlite://{}", live.display()),
        archive_database_url: format!("sqlite://{}", archive.display()),
        db_max_connections: 8,
        db_busy_timeout_ms: 5_000,
        table_count: 3,
        json_logs: false,
    };
    let db = Db::connect(&config).await.unwrap();
    db.migrate().await.unwrap();
    db.seed_tables(config.table_count).await.unwrap();
    (db, vec![live, archive])
}

pub async fn remove_files(db: Db, paths: Vec<PathBuf>) {
    db.live.close().await;
    db.archive.close().await;
    for path in paths {
        for suffix in ["", "-wal", "-shm", "-journal"] {
            let mut file = path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}

pub fn schedule_store(db: &Db) -> Arc<ScheduleStore> {
    Arc::new(ScheduleStore::new(Arc::new(SqlxScheduleRepository::new(
        db.live.clone(),
    ))))
}

pub fn reservation_store(db: &Db) -> ReservationStore {
    let repo = SqlxReservationRepository::new(db.live.clone(), db.archive.clone());
    ReservationStore::new(Arc::new(repo), schedule_store(db))
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A Monday comfortably in the future.
pub fn monday() -> NaiveDate {
    date(2030, 1, 7)
}

pub fn now() -> NaiveDateTime {
    date(2026, 1, 1).and_hms_opt(8, 0, 0).unwrap()
}

pub fn slot(i: u32) -> SlotIndex {
    SlotIndex::new(i).unwrap()
}

pub fn booking(table_id: TableId, date: NaiveDate, time: u32, duration: u8) -> NewReservation {
    NewReservation {
        name: "Grace".to_string(),
        phone: "555-0199".to_string(),
        table_id,
        date,
        time: slot(time),
        duration,
    }
}
