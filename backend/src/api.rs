use chrono::NaiveDate;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::reservation::model::TableId;
use crate::reservation::store::ReservationStore;

/// Free start times of `table_id` on `compact_date` (`YYYYMMDD`) as a JSON
/// array of `H:MM` strings.
///
/// Any failure, from a bad date to a closed day, yields an empty array.
pub async fn available_times_json(
    store: &ReservationStore,
    table_id: TableId,
    compact_date: &str,
) -> String {
    match available_times(store, table_id, compact_date).await {
        Ok(times) => serde_json::to_string(&times).unwrap_or_else(|_| "[]".to_string()),
        Err(e) => {
            debug!(table_id, compact_date, error = %e, "no available times");
            "[]".to_string()
        }
    }
}

async fn available_times(
    store: &ReservationStore,
    table_id: TableId,
    compact_date: &str,
) -> AppResult<Vec<String>> {
    let date = parse_compact_date(compact_date)
        .ok_or(AppError::InvalidRequest(vec!["date"]))?;
    store.possible_times(date, table_id).await
}

pub fn parse_compact_date(s: &str) -> Option<NaiveDate> {
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y%m%d").ok()
}

/// Customer-facing text for a failed booking.
pub fn rejection_message(e: &AppError) -> String {
    match e {
        AppError::PastDate(_) => "That time has already passed. Please pick a later one.".to_string(),
        AppError::OutOfHours { .. } => {
            "The restaurant is not open for the whole of that booking.".to_string()
        }
        AppError::SlotConflict { .. } => {
            "That table is already taken at that time. Please pick another time or table."
                .to_string()
        }
        AppError::ClosedDay(date) => format!("The restaurant is closed on {date}."),
        AppError::TableNotFound(id) => format!("There is no table number {id}."),
        AppError::InvalidRequest(fields) => {
            format!("Please fill in: {}.", fields.join(", "))
        }
        AppError::TimeFormat(_) | AppError::TimeRange(_) => {
            "Bookings start on the hour or the half hour.".to_string()
        }
        AppError::Storage(_) => "Something went wrong on our side. Please try again.".to_string(),
        other => other.to_string(),
    }
}
