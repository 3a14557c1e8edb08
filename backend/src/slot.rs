//! Half-hour time grid.
//!
//! A day is split into 48 slots; slot `i` starts `i * 30` minutes after
//! midnight. The only accepted wall-clock spellings are the canonical ones
//! produced by [`to_time_string`]: `"0:00"`, `"0:30"`, ..., `"23:30"`.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub const SLOTS_PER_DAY: u8 = 48;
pub const SLOT_MINUTES: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SlotIndex(u8);

impl SlotIndex {
    pub const FIRST: SlotIndex = SlotIndex(0);
    pub const LAST: SlotIndex = SlotIndex(SLOTS_PER_DAY - 1);

    pub fn new(index: u32) -> AppResult<Self> {
        if index >= SLOTS_PER_DAY as u32 {
            return Err(AppError::TimeRange(format!("index {index}")));
        }
        Ok(Self(index as u8))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Wall-clock time at which the slot begins.
    pub fn time_of_day(self) -> NaiveTime {
        NaiveTime::MIN + TimeDelta::minutes(i64::from(self.0) * i64::from(SLOT_MINUTES))
    }

    /// Exclusive end of an interval of `duration` slots starting here.
    /// May equal [`SLOTS_PER_DAY`] (midnight) but is never validated against it.
    pub fn end_after(self, duration: u8) -> u16 {
        u16::from(self.0) + u16::from(duration)
    }
}

impl TryFrom<u8> for SlotIndex {
    type Error = AppError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        SlotIndex::new(value.into())
    }
}

impl From<SlotIndex> for u8 {
    fn from(slot: SlotIndex) -> Self {
        slot.0
    }
}

impl FromStr for SlotIndex {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        to_slot_index(s)
    }
}

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let minutes = u32::from(self.0) * SLOT_MINUTES;
        write!(f, "{}:{:02}", minutes / 60, minutes % 60)
    }
}

/// Parses `H:MM` / `HH:MM` into a slot index.
pub fn to_slot_index(time: &str) -> AppResult<SlotIndex> {
    let (hours, minutes) =
        split_clock(time).ok_or_else(|| AppError::TimeFormat(time.to_string()))?;

    let index = hours * 2 + minutes / SLOT_MINUTES;
    match SlotIndex::new(index) {
        // Anything that does not print back identically ("09:00", "9:15",
        // "24:00") is not on the grid.
        Ok(slot) if slot.to_string() == time => Ok(slot),
        _ => Err(AppError::TimeRange(time.to_string())),
    }
}

pub fn to_time_string(index: u32) -> AppResult<String> {
    SlotIndex::new(index).map(|slot| slot.to_string())
}

pub fn map_indices(indices: &[SlotIndex]) -> Vec<String> {
    indices.iter().map(ToString::to_string).collect()
}

fn split_clock(time: &str) -> Option<(u32, u32)> {
    let (hours, minutes) = time.split_once(':')?;
    let well_formed = (1..=2).contains(&hours.len())
        && minutes.len() == 2
        && hours.bytes().chain(minutes.bytes()).all(|b| b.is_ascii_digit());
    if !well_formed {
        return None;
    }
    Some((hours.parse().ok()?, minutes.parse().ok()?))
}
