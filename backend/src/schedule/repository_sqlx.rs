use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::db::{column_u8, decode_error};
use crate::error::{AppError, AppResult};
use crate::schedule::model::{OddScheduleDay, OpeningHours, WeekDaySchedule};
use crate::schedule::repository::ScheduleRepository;
use crate::slot::SlotIndex;

/// SQLx-backed implementation of ScheduleRepository.
/// Responsible only for persistence and row mapping.
pub struct SqlxScheduleRepository {
    pool: SqlitePool,
}

impl SqlxScheduleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScheduleRepository for SqlxScheduleRepository {
    async fn fetch_week(&self) -> AppResult<Vec<WeekDaySchedule>> {
        let rows = sqlx::query("SELECT id, open_at, duration FROM schedule ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        let week = rows
            .iter()
            .map(row_to_week_day)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(week)
    }

    async fn fetch_day(&self, day: u8) -> AppResult<Option<WeekDaySchedule>> {
        let row = sqlx::query("SELECT id, open_at, duration FROM schedule WHERE id = ?")
            .bind(i64::from(day))
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(row_to_week_day).transpose()?)
    }

    async fn fetch_odd_day(&self, date: NaiveDate) -> AppResult<Option<OddScheduleDay>> {
        let row = sqlx::query("SELECT day, open_at, duration FROM odd_schedule WHERE day = ?")
            .bind(date)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(row_to_odd_day).transpose()?)
    }

    async fn fetch_odd_days(&self) -> AppResult<Vec<OddScheduleDay>> {
        let rows = sqlx::query("SELECT day, open_at, duration FROM odd_schedule ORDER BY day")
            .fetch_all(&self.pool)
            .await?;

        let days = rows
            .iter()
            .map(row_to_odd_day)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(days)
    }

    async fn fetch_odd_days_after(&self, date: NaiveDate) -> AppResult<Vec<OddScheduleDay>> {
        let rows = sqlx::query(
            "SELECT day, open_at, duration FROM odd_schedule WHERE day > ? ORDER BY day",
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        let days = rows
            .iter()
            .map(row_to_odd_day)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(days)
    }

    async fn replace_week(&self, week: &[WeekDaySchedule]) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        for entry in week {
            let updated = sqlx::query(
                r#"
UPDATE schedule
SET open_at = ?, duration = ?
WHERE id = ?;
"#,
            )
            .bind(i64::from(entry.hours.open_at.get()))
            .bind(i64::from(entry.hours.duration))
            .bind(i64::from(entry.day))
            .execute(&mut *tx)
            .await?
            .rows_affected();

            // Dropping `tx` rolls back the days already written.
            if updated != 1 {
                return Err(AppError::ScheduleNotFound(format!(
                    "weekly row for day {} is missing",
                    entry.day
                )));
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn insert_odd_day(&self, day: &OddScheduleDay) -> AppResult<()> {
        let result = sqlx::query("INSERT INTO odd_schedule (day, open_at, duration) VALUES (?, ?, ?)")
            .bind(day.date)
            .bind(i64::from(day.hours.open_at.get()))
            .bind(i64::from(day.hours.duration))
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(AppError::ScheduleConflict(day.date))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_odd_day(&self, date: NaiveDate) -> AppResult<bool> {
        let deleted = sqlx::query("DELETE FROM odd_schedule WHERE day = ?")
            .bind(date)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted > 0)
    }
}

/* =========================
Row mapping
========================= */

fn row_to_week_day(r: &SqliteRow) -> Result<WeekDaySchedule, sqlx::Error> {
    let day = column_u8(r, "id")?;
    WeekDaySchedule::new(day, row_to_hours(r)?).map_err(decode_error)
}

fn row_to_odd_day(r: &SqliteRow) -> Result<OddScheduleDay, sqlx::Error> {
    Ok(OddScheduleDay {
        date: r.try_get("day")?,
        hours: row_to_hours(r)?,
    })
}

fn row_to_hours(r: &SqliteRow) -> Result<OpeningHours, sqlx::Error> {
    let open_at = SlotIndex::new(column_u8(r, "open_at")?.into()).map_err(decode_error)?;
    OpeningHours::new(open_at, column_u8(r, "duration")?).map_err(decode_error)
}
