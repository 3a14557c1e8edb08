use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::AppResult;
use crate::schedule::model::{OddScheduleDay, WeekDaySchedule};

#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    /// All weekly rows ordered by day.
    async fn fetch_week(&self) -> AppResult<Vec<WeekDaySchedule>>;

    async fn fetch_day(&self, day: u8) -> AppResult<Option<WeekDaySchedule>>;

    async fn fetch_odd_day(&self, date: NaiveDate) -> AppResult<Option<OddScheduleDay>>;

    /// Odd days ordered by date.
    async fn fetch_odd_days(&self) -> AppResult<Vec<OddScheduleDay>>;

    /// Odd days strictly after `date`, ordered by date.
    async fn fetch_odd_days_after(&self, date: NaiveDate) -> AppResult<Vec<OddScheduleDay>>;

    /// Overwrites the seven weekly rows in one transaction.
    async fn replace_week(&self, week: &[WeekDaySchedule]) -> AppResult<()>;

    /// Fails with `ScheduleConflict` if `date` already has a row.
    async fn insert_odd_day(&self, day: &OddScheduleDay) -> AppResult<()>;

    /// Returns false if nothing was scheduled on `date`.
    async fn delete_odd_day(&self, date: NaiveDate) -> AppResult<bool>;
}
