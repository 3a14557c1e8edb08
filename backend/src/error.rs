use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::reservation::model::{ReservationId, TableId};
use crate::slot::SlotIndex;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("time {0:?} should be of H:MM or HH:MM format")]
    TimeFormat(String),

    #[error("time {0} should belong to the 0:00-23:30 half-hour grid")]
    TimeRange(String),

    #[error("invalid schedule: {0}")]
    ScheduleValidation(String),

    #[error("schedule rule violated: {0}")]
    ScheduleRule(String),

    #[error("an odd day is already scheduled on {0}")]
    ScheduleConflict(NaiveDate),

    #[error("no schedule found: {0}")]
    ScheduleNotFound(String),

    #[error("weekly schedule is corrupt: expected 7 days, found {0}")]
    ScheduleIntegrity(usize),

    #[error("the restaurant is closed on {0}")]
    ClosedDay(NaiveDate),

    #[error("reservation start {0} is in the past")]
    PastDate(NaiveDateTime),

    #[error("slots [{start}, {end}) fall outside opening hours [{open_at}, {close_at})")]
    OutOfHours {
        start: u8,
        end: u16,
        open_at: u8,
        close_at: u8,
    },

    #[error("table {table_id} is already booked around {time} on {date}")]
    SlotConflict {
        table_id: TableId,
        date: NaiveDate,
        time: SlotIndex,
    },

    #[error("reservation {0} not found")]
    ReservationNotFound(ReservationId),

    #[error("table {0} does not exist")]
    TableNotFound(TableId),

    #[error("missing or invalid fields: {}", .0.join(", "))]
    InvalidRequest(Vec<&'static str>),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl AppError {
    /// True for rejections a customer can fix by picking another slot or date.
    pub fn is_booking_rejection(&self) -> bool {
        matches!(
            self,
            AppError::PastDate(_)
                | AppError::OutOfHours { .. }
                | AppError::SlotConflict { .. }
                | AppError::ClosedDay(_)
        )
    }
}
