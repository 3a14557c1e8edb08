use sqlx::SqlitePool;

/// Error text raised by the overlap trigger on `reservations`.
pub const OVERLAP_MESSAGE: &str = "reservation overlaps an existing booking";

pub async fn migrate_live(pool: &SqlitePool) -> anyhow::Result<()> {
    // Weekly schedule, one row per ISO weekday
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS schedule (
  id INTEGER PRIMARY KEY CHECK (id BETWEEN 1 AND 7),
  open_at INTEGER NOT NULL CHECK (open_at BETWEEN 0 AND 47),
  duration INTEGER NOT NULL CHECK (duration >= 0 AND open_at + duration <= 48)
);
"#,
    )
    .execute(pool)
    .await?;

    // 9:00-21:00 every day until staff say otherwise
    sqlx::query(
        r#"
INSERT OR IGNORE INTO schedule (id, open_at, duration) VALUES
  (1, 18, 24), (2, 18, 24), (3, 18, 24), (4, 18, 24),
  (5, 18, 24), (6, 18, 24), (7, 18, 24);
"#,
    )
    .execute(pool)
    .await?;

    // Odd days
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS odd_schedule (
  day TEXT NOT NULL UNIQUE,
  open_at INTEGER NOT NULL CHECK (open_at BETWEEN 0 AND 47),
  duration INTEGER NOT NULL CHECK (duration >= 0 AND open_at + duration <= 48)
);
"#,
    )
    .execute(pool)
    .await?;

    // Tables
    sqlx::query(r#"CREATE TABLE IF NOT EXISTS tables (id INTEGER PRIMARY KEY);"#)
        .execute(pool)
        .await?;

    // Reservations
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS reservations (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  name TEXT NOT NULL,
  phone TEXT NOT NULL,
  table_id INTEGER NOT NULL REFERENCES tables(id),
  date TEXT NOT NULL,
  time INTEGER NOT NULL CHECK (time BETWEEN 0 AND 47),
  duration INTEGER NOT NULL CHECK (duration >= 1 AND time + duration <= 48)
);
"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE UNIQUE INDEX IF NOT EXISTS idx_reservations_slot ON reservations(date, table_id, time);"#,
    )
    .execute(pool)
    .await?;

    // Last line of defence against concurrent bookings of the same interval
    sqlx::query(&format!(
        r#"
CREATE TRIGGER IF NOT EXISTS reservations_no_overlap
BEFORE INSERT ON reservations
WHEN EXISTS (
  SELECT 1 FROM reservations
  WHERE date = NEW.date
    AND table_id = NEW.table_id
    AND time < NEW.time + NEW.duration
    AND NEW.time < time + duration
)
BEGIN
  SELECT RAISE(ABORT, '{OVERLAP_MESSAGE}');
END;
"#
    ))
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn migrate_archive(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS reservations (
  id INTEGER PRIMARY KEY,
  name TEXT NOT NULL,
  phone TEXT NOT NULL,
  table_id INTEGER NOT NULL,
  date TEXT NOT NULL,
  time INTEGER NOT NULL,
  duration INTEGER NOT NULL
);
"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(r#"CREATE INDEX IF NOT EXISTS idx_archive_date ON reservations(date);"#)
        .execute(pool)
        .await?;

    Ok(())
}
