use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use common::logger::warn_if_slow;
use tracing::{debug, info, instrument, warn};

use crate::error::{AppError, AppResult};
use crate::schedule::model::{
    EffectiveSchedule, OddScheduleDay, OpeningHours, WeekDaySchedule, iso_weekday, validate_day,
    validate_week,
};
use crate::schedule::repository::ScheduleRepository;
use crate::slot::SlotIndex;

const READ_BUDGET: Duration = Duration::from_millis(100);
const WRITE_BUDGET: Duration = Duration::from_millis(250);

/// Owns the weekly schedule and the odd-day overrides, and decides which of
/// the two governs a given date.
pub struct ScheduleStore {
    repo: Arc<dyn ScheduleRepository>,
}

impl ScheduleStore {
    pub fn new(repo: Arc<dyn ScheduleRepository>) -> Self {
        Self { repo }
    }

    /// Override for `date` if one exists, otherwise the weekly row of its ISO weekday.
    #[instrument(skip(self), target = "schedule")]
    pub async fn effective_schedule(&self, date: NaiveDate) -> AppResult<EffectiveSchedule> {
        let odd = warn_if_slow("db_fetch_odd_day", READ_BUDGET, self.repo.fetch_odd_day(date)).await?;
        if let Some(odd) = odd {
            debug!(open_at = %odd.hours.open_at, duration = odd.hours.duration, "odd day override applies");
            return Ok(EffectiveSchedule::Odd(odd));
        }

        let day = iso_weekday(date);
        let weekly = warn_if_slow("db_fetch_day", READ_BUDGET, self.repo.fetch_day(day)).await?;
        match weekly {
            Some(w) => Ok(EffectiveSchedule::Weekly(w)),
            None => {
                warn!(day, "weekly schedule row missing");
                Err(AppError::ScheduleNotFound(format!("no schedule for {date}")))
            }
        }
    }

    #[instrument(skip(self), target = "schedule")]
    pub async fn week_day(&self, day: u8) -> AppResult<WeekDaySchedule> {
        validate_day(day)?;
        self.repo
            .fetch_day(day)
            .await?
            .ok_or_else(|| AppError::ScheduleNotFound(format!("no schedule for weekday {day}")))
    }

    /// Monday..Sunday.
    #[instrument(skip(self), target = "schedule")]
    pub async fn weekly_schedule(&self) -> AppResult<Vec<WeekDaySchedule>> {
        let week = warn_if_slow("db_fetch_week", READ_BUDGET, self.repo.fetch_week()).await?;
        if week.len() != 7 {
            warn!(found = week.len(), "weekly schedule does not hold 7 rows");
            return Err(AppError::ScheduleIntegrity(week.len()));
        }
        Ok(week)
    }

    /// All-or-nothing replacement of the seven weekly rows.
    #[instrument(skip(self, week), target = "schedule", fields(entries = week.len()))]
    pub async fn replace_weekly_schedule(&self, week: &[WeekDaySchedule]) -> AppResult<()> {
        validate_week(week)?;

        warn_if_slow("db_replace_week", WRITE_BUDGET, self.repo.replace_week(week)).await?;

        info!("weekly schedule replaced");
        Ok(())
    }

    /// Schedules an exception for `date`. Same-day changes are refused.
    #[instrument(skip(self), target = "schedule")]
    pub async fn add_odd_day(
        &self,
        date: NaiveDate,
        open_at: u32,
        duration: u8,
        today: NaiveDate,
    ) -> AppResult<OddScheduleDay> {
        if date == today {
            warn!("refusing same-day schedule change");
            return Err(AppError::ScheduleRule(
                "the schedule for today can't be changed".to_string(),
            ));
        }

        let open_at = SlotIndex::new(open_at).map_err(|_| {
            AppError::ScheduleValidation(format!("opening slot {open_at} should belong to [0, 47]"))
        })?;
        let odd = OddScheduleDay {
            date,
            hours: OpeningHours::new(open_at, duration)?,
        };

        warn_if_slow("db_insert_odd_day", WRITE_BUDGET, self.repo.insert_odd_day(&odd)).await?;

        info!(open_at = %odd.hours.open_at, duration, "odd day scheduled");
        Ok(odd)
    }

    #[instrument(skip(self), target = "schedule")]
    pub async fn remove_odd_day(&self, date: NaiveDate) -> AppResult<()> {
        if !self.repo.delete_odd_day(date).await? {
            return Err(AppError::ScheduleNotFound(format!("no odd day on {date}")));
        }
        info!("odd day removed");
        Ok(())
    }

    /// Fails with `ScheduleNotFound` when nothing exceptional is scheduled.
    #[instrument(skip(self), target = "schedule")]
    pub async fn list_odd_days(&self) -> AppResult<Vec<OddScheduleDay>> {
        let days = warn_if_slow("db_fetch_odd_days", READ_BUDGET, self.repo.fetch_odd_days()).await?;
        non_empty(days)
    }

    /// Fails with `ScheduleNotFound` when nothing exceptional is coming.
    #[instrument(skip(self), target = "schedule")]
    pub async fn list_odd_days_after(&self, date: NaiveDate) -> AppResult<Vec<OddScheduleDay>> {
        let days = warn_if_slow(
            "db_fetch_odd_days_after",
            READ_BUDGET,
            self.repo.fetch_odd_days_after(date),
        )
        .await?;
        non_empty(days)
    }
}

fn non_empty(days: Vec<OddScheduleDay>) -> AppResult<Vec<OddScheduleDay>> {
    if days.is_empty() {
        return Err(AppError::ScheduleNotFound("nothing special is coming".to_string()));
    }
    Ok(days)
}
