use chrono::NaiveDate;

use crate::error::{AppError, AppResult};
use crate::schedule::model::OpeningHours;
use crate::slot::SlotIndex;

// ── Availability Algorithm ────────────────────────────────────────

/// An existing booking on one table: `duration` slots starting at `time`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookedInterval {
    pub time: SlotIndex,
    pub duration: u8,
}

/// Free slots of a day given its opening hours and the bookings already made
/// on one table.
///
/// Bookings are expected sorted by `time` and non-overlapping (the booking path
/// guarantees both). Each one is cut out of the free sequence by a positional
/// splice starting where its first slot sits. The splice stops at the booking's
/// own end, so a stray row can never remove slots that are not its own.
pub fn possible_slots(
    date: NaiveDate,
    hours: &OpeningHours,
    booked: &[BookedInterval],
) -> AppResult<Vec<SlotIndex>> {
    if hours.is_closed() {
        return Err(AppError::ClosedDay(date));
    }

    let mut free: Vec<SlotIndex> = hours.slots().collect();

    for b in booked {
        let end = b.time.end_after(b.duration);
        let start = free.partition_point(|s| *s < b.time);
        let len = free[start..]
            .iter()
            .take_while(|s| u16::from(s.get()) < end)
            .count();
        free.drain(start..start + len);
    }

    Ok(free)
}

/// True if every slot of `[start, start + duration)` is still free.
pub fn is_interval_free(start: SlotIndex, duration: u8, possible: &[SlotIndex]) -> bool {
    let end = start.end_after(duration);
    (u16::from(start.get())..end).all(|i| {
        u8::try_from(i)
            .ok()
            .and_then(|i| SlotIndex::new(i.into()).ok())
            .is_some_and(|slot| possible.binary_search(&slot).is_ok())
    })
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]
        #[test]
        fn free_slots_are_hours_minus_bookings(
            open_at in 0u8..48,
            raw_duration in 1u8..=48,
            cuts in prop::collection::vec((0u8..48, 1u8..6), 0..10),
        ) {
            let duration = raw_duration.min(48 - open_at);
            let hours = OpeningHours::new(SlotIndex::new(open_at.into()).unwrap(), duration).unwrap();

            // Build sorted, non-overlapping bookings the way the booking path would.
            let mut taken: BTreeSet<u8> = BTreeSet::new();
            let mut bookings = Vec::new();
            let mut sorted_cuts = cuts.clone();
            sorted_cuts.sort();
            for (start, len) in sorted_cuts {
                let end = (u16::from(start) + u16::from(len)).min(48) as u8;
                if (start..end).any(|i| taken.contains(&i)) {
                    continue;
                }
                taken.extend(start..end);
                bookings.push(BookedInterval { time: SlotIndex::new(start.into()).unwrap(), duration: end - start });
            }

            let date = NaiveDate::from_ymd_opt(2030, 1, 7).unwrap();
            let free: Vec<u8> = possible_slots(date, &hours, &bookings)
                .unwrap()
                .iter()
                .map(|s| s.get())
                .collect();

            let expected: Vec<u8> = (open_at..open_at + duration)
                .filter(|i| !taken.contains(i))
                .collect();
            prop_assert_eq!(free, expected);
        }
    }
}
