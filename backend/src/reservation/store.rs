use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use common::logger::warn_if_slow;
use tracing::{debug, info, instrument, warn};

use crate::availability;
use crate::error::{AppError, AppResult};
use crate::reservation::model::{NewReservation, Reservation, ReservationId, TableId};
use crate::reservation::repository::ReservationRepository;
use crate::schedule::store::ScheduleStore;
use crate::slot::{SlotIndex, map_indices};

const READ_BUDGET: Duration = Duration::from_millis(100);
const WRITE_BUDGET: Duration = Duration::from_millis(250);

/// Booking front door: validates a request against time, opening hours and
/// the table's other bookings before handing it to the repository.
pub struct ReservationStore {
    repo: Arc<dyn ReservationRepository>,
    schedule: Arc<ScheduleStore>,
}

impl ReservationStore {
    pub fn new(repo: Arc<dyn ReservationRepository>, schedule: Arc<ScheduleStore>) -> Self {
        Self { repo, schedule }
    }

    pub fn schedule(&self) -> &ScheduleStore {
        &self.schedule
    }

    /// Books `candidate` and returns the new reservation id.
    ///
    /// Checks run cheapest first: duration, past start, closed day, opening
    /// hours. The availability check and the insert share one transaction.
    #[instrument(
        skip(self, candidate),
        target = "reservations",
        fields(table_id = candidate.table_id, date = %candidate.date, time = %candidate.time)
    )]
    pub async fn reserve(
        &self,
        candidate: &NewReservation,
        now: NaiveDateTime,
    ) -> AppResult<ReservationId> {
        if candidate.duration == 0 {
            warn!("rejecting reservation without a duration");
            return Err(AppError::InvalidRequest(vec!["duration"]));
        }

        let starts_at = candidate.starts_at();
        if starts_at < now {
            warn!(%starts_at, "rejecting reservation in the past");
            return Err(AppError::PastDate(starts_at));
        }

        let hours = self.schedule.effective_schedule(candidate.date).await?.hours();
        if hours.is_closed() {
            warn!("rejecting reservation on a closed day");
            return Err(AppError::ClosedDay(candidate.date));
        }

        if !hours.contains(candidate.time, candidate.duration) {
            warn!(
                open_at = %hours.open_at,
                close_at = hours.close_at(),
                "rejecting reservation outside opening hours"
            );
            return Err(AppError::OutOfHours {
                start: candidate.time.get(),
                end: candidate.end(),
                open_at: hours.open_at.get(),
                close_at: hours.close_at(),
            });
        }

        let id = warn_if_slow(
            "db_insert_if_free",
            WRITE_BUDGET,
            self.repo.insert_if_free(candidate, &hours),
        )
        .await
        .inspect_err(|e| {
            if e.is_booking_rejection() {
                warn!(error = %e, "reservation rejected");
            }
        })?;

        info!(reservation_id = id, duration = candidate.duration, "reservation committed");
        Ok(id)
    }

    /// Moves a reservation into the archive store.
    #[instrument(skip(self), target = "reservations")]
    pub async fn archive(&self, id: ReservationId) -> AppResult<Reservation> {
        let archived = warn_if_slow("db_archive", WRITE_BUDGET, self.repo.archive(id)).await?;
        info!(table_id = archived.table_id, date = %archived.date, "reservation archived");
        Ok(archived)
    }

    /// Finishes archive moves interrupted between the archive insert and the
    /// live commit. Run once at startup.
    #[instrument(skip(self), target = "reservations")]
    pub async fn reconcile_archive(&self) -> AppResult<u64> {
        let removed = self.repo.reconcile_archive().await?;
        if removed > 0 {
            warn!(removed, "removed live reservations that were already archived");
        } else {
            debug!("archive and live store agree");
        }
        Ok(removed)
    }

    #[instrument(skip(self), target = "reservations")]
    pub async fn get_by_id(&self, id: ReservationId) -> AppResult<Reservation> {
        warn_if_slow("db_fetch_by_id", READ_BUDGET, self.repo.fetch_by_id(id))
            .await?
            .ok_or(AppError::ReservationNotFound(id))
    }

    #[instrument(skip(self), target = "reservations")]
    pub async fn get_all(&self) -> AppResult<Vec<Reservation>> {
        warn_if_slow("db_fetch_all", READ_BUDGET, self.repo.fetch_all()).await
    }

    #[instrument(skip(self), target = "reservations")]
    pub async fn get_by_date(&self, date: NaiveDate) -> AppResult<Vec<Reservation>> {
        warn_if_slow("db_fetch_by_date", READ_BUDGET, self.repo.fetch_by_date(date)).await
    }

    #[instrument(skip(self), target = "reservations")]
    pub async fn list_table_ids(&self) -> AppResult<Vec<TableId>> {
        warn_if_slow("db_fetch_table_ids", READ_BUDGET, self.repo.fetch_table_ids()).await
    }

    #[instrument(skip(self), target = "reservations")]
    pub async fn get_archived(&self, id: ReservationId) -> AppResult<Reservation> {
        warn_if_slow("db_fetch_archived", READ_BUDGET, self.repo.fetch_archived(id))
            .await?
            .ok_or(AppError::ReservationNotFound(id))
    }

    /// Start slots still free on `table_id` for `date`.
    #[instrument(skip(self), target = "reservations")]
    pub async fn possible_slots(&self, date: NaiveDate, table_id: TableId) -> AppResult<Vec<SlotIndex>> {
        let hours = self.schedule.effective_schedule(date).await?.hours();
        if hours.is_closed() {
            return Err(AppError::ClosedDay(date));
        }

        let booked = warn_if_slow(
            "db_fetch_booked",
            READ_BUDGET,
            self.repo.fetch_booked(date, table_id),
        )
        .await?;

        let free = availability::possible_slots(date, &hours, &booked)?;
        debug!(booked = booked.len(), free = free.len(), "availability computed");
        Ok(free)
    }

    /// [`possible_slots`](Self::possible_slots) as `H:MM` strings.
    pub async fn possible_times(&self, date: NaiveDate, table_id: TableId) -> AppResult<Vec<String>> {
        let slots = self.possible_slots(date, table_id).await?;
        Ok(map_indices(&slots))
    }
}
