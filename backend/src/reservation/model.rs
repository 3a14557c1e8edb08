use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::availability::BookedInterval;
use crate::error::{AppError, AppResult};
use crate::params::RequestParams;
use crate::slot::{SLOTS_PER_DAY, SlotIndex, to_slot_index};

pub type ReservationId = i64;
pub type TableId = i64;

/// A stored booking of one table for `duration` half-hour slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub name: String,
    pub phone: String,
    pub table_id: TableId,
    pub date: NaiveDate,
    pub time: SlotIndex,
    pub duration: u8,
}

impl Reservation {
    pub fn interval(&self) -> BookedInterval {
        BookedInterval {
            time: self.time,
            duration: self.duration,
        }
    }
}

/// A booking request that has passed field validation but not yet the
/// schedule and availability checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReservation {
    pub name: String,
    pub phone: String,
    pub table_id: TableId,
    pub date: NaiveDate,
    pub time: SlotIndex,
    pub duration: u8,
}

impl NewReservation {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time.time_of_day())
    }

    /// Exclusive end slot; may be 48 for a booking that ends at midnight.
    pub fn end(&self) -> u16 {
        self.time.end_after(self.duration)
    }

    pub fn into_reservation(self, id: ReservationId) -> Reservation {
        Reservation {
            id,
            name: self.name,
            phone: self.phone,
            table_id: self.table_id,
            date: self.date,
            time: self.time,
            duration: self.duration,
        }
    }

    /// Reads a booking request from raw form parameters.
    ///
    /// Every missing or unparsable field is reported at once. A time that is
    /// present but off the half-hour grid keeps its own error.
    pub fn from_params(params: &RequestParams) -> AppResult<Self> {
        let mut invalid = Vec::new();

        let name = params.get_str("name").map(str::to_owned);
        if name.is_none() {
            invalid.push("name");
        }

        let phone = params.get_str("phone").map(str::to_owned);
        if phone.is_none() {
            invalid.push("phone");
        }

        let table_id = params.get_int("table_id").filter(|id| *id > 0);
        if table_id.is_none() {
            invalid.push("table_id");
        }

        let date = params.get_date("date");
        if date.is_none() {
            invalid.push("date");
        }

        let time = params.get_str("time");
        if time.is_none() {
            invalid.push("time");
        }

        let duration = params
            .get_int("duration")
            .filter(|d| (1..=i64::from(SLOTS_PER_DAY)).contains(d))
            .and_then(|d| u8::try_from(d).ok());
        if duration.is_none() {
            invalid.push("duration");
        }

        match (name, phone, table_id, date, time, duration) {
            (Some(name), Some(phone), Some(table_id), Some(date), Some(time), Some(duration)) => {
                Ok(Self {
                    name,
                    phone,
                    table_id,
                    date,
                    time: to_slot_index(time)?,
                    duration,
                })
            }
            _ => Err(AppError::InvalidRequest(invalid)),
        }
    }
}
