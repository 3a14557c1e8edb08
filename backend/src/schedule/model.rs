use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::slot::{SLOTS_PER_DAY, SlotIndex, to_slot_index};

/// Opening window of one day: `duration` half-hour slots starting at `open_at`.
/// A zero duration means the restaurant is closed.
///
/// Invariant: `open_at + duration <= 48`, a day never runs past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OpeningHours {
    pub open_at: SlotIndex,
    pub duration: u8,
}

impl OpeningHours {
    pub fn new(open_at: SlotIndex, duration: u8) -> AppResult<Self> {
        if open_at.end_after(duration) > u16::from(SLOTS_PER_DAY) {
            return Err(AppError::ScheduleValidation(format!(
                "opening at {open_at} for {duration} slots runs past midnight"
            )));
        }
        Ok(Self { open_at, duration })
    }

    pub fn closed() -> Self {
        Self {
            open_at: SlotIndex::FIRST,
            duration: 0,
        }
    }

    /// Builds hours from an open/close pair as staff enter them.
    ///
    /// Equal times mean closed. A close of `0:00` after a later open means midnight.
    pub fn from_times(open: &str, close: &str) -> AppResult<Self> {
        let open_at = to_slot_index(open)?;
        let close_at = to_slot_index(close)?;

        let end = match (open_at.get(), close_at.get()) {
            (o, 0) if o > 0 => SLOTS_PER_DAY,
            (_, c) => c,
        };
        let duration = end.checked_sub(open_at.get()).ok_or_else(|| {
            AppError::ScheduleValidation(format!("closing time {close} precedes opening time {open}"))
        })?;

        Self::new(open_at, duration)
    }

    pub fn is_closed(&self) -> bool {
        self.duration == 0
    }

    /// Exclusive end slot.
    pub fn close_at(&self) -> u8 {
        self.open_at.get().saturating_add(self.duration)
    }

    pub fn slots(&self) -> impl Iterator<Item = SlotIndex> + use<> {
        let (start, end) = (self.open_at.get(), self.close_at());
        (start..end).filter_map(|i| SlotIndex::new(i.into()).ok())
    }

    /// True if `[start, start + duration)` lies inside the opening window.
    pub fn contains(&self, start: SlotIndex, duration: u8) -> bool {
        start >= self.open_at && start.end_after(duration) <= u16::from(self.close_at())
    }
}

/// Regular hours for one ISO weekday (1 = Monday .. 7 = Sunday).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekDaySchedule {
    pub day: u8,
    pub hours: OpeningHours,
}

impl WeekDaySchedule {
    pub fn new(day: u8, hours: OpeningHours) -> AppResult<Self> {
        validate_day(day)?;
        Ok(Self { day, hours })
    }

    pub fn weekday(&self) -> Weekday {
        weekday_from_number(self.day)
    }
}

/// Date-specific exception to the weekly schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OddScheduleDay {
    pub date: NaiveDate,
    pub hours: OpeningHours,
}

/// The record that actually governs a calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectiveSchedule {
    Weekly(WeekDaySchedule),
    Odd(OddScheduleDay),
}

impl EffectiveSchedule {
    pub fn hours(&self) -> OpeningHours {
        match self {
            EffectiveSchedule::Weekly(day) => day.hours,
            EffectiveSchedule::Odd(day) => day.hours,
        }
    }

    pub fn is_override(&self) -> bool {
        matches!(self, EffectiveSchedule::Odd(_))
    }
}

/// ISO weekday number of `date`, 1 = Monday.
pub fn iso_weekday(date: NaiveDate) -> u8 {
    date.weekday().number_from_monday() as u8
}

pub fn validate_day(day: u8) -> AppResult<()> {
    if !(1..=7).contains(&day) {
        return Err(AppError::ScheduleValidation(format!(
            "day of the week should be in range [1, 7], got {day}"
        )));
    }
    Ok(())
}

/// A replacement week must name every weekday exactly once, each with hours
/// that close by midnight.
pub fn validate_week(week: &[WeekDaySchedule]) -> AppResult<()> {
    if week.len() != 7 {
        return Err(AppError::ScheduleValidation(format!(
            "a week needs exactly 7 days, got {}",
            week.len()
        )));
    }

    let mut seen = [false; 7];
    for entry in week {
        validate_day(entry.day)?;
        OpeningHours::new(entry.hours.open_at, entry.hours.duration)?;
        let slot = &mut seen[usize::from(entry.day - 1)];
        if *slot {
            return Err(AppError::ScheduleValidation(format!(
                "day {} appears more than once",
                entry.day
            )));
        }
        *slot = true;
    }
    Ok(())
}

fn weekday_from_number(day: u8) -> Weekday {
    match day {
        1 => Weekday::Mon,
        2 => Weekday::Tue,
        3 => Weekday::Wed,
        4 => Weekday::Thu,
        5 => Weekday::Fri,
        6 => Weekday::Sat,
        _ => Weekday::Sun,
    }
}
