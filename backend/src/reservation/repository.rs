use async_trait::async_trait;
use chrono::NaiveDate;

use crate::availability::BookedInterval;
use crate::error::AppResult;
use crate::reservation::model::{NewReservation, Reservation, ReservationId, TableId};
use crate::schedule::model::OpeningHours;

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    async fn fetch_by_id(&self, id: ReservationId) -> AppResult<Option<Reservation>>;

    async fn fetch_all(&self) -> AppResult<Vec<Reservation>>;

    async fn fetch_by_date(&self, date: NaiveDate) -> AppResult<Vec<Reservation>>;

    /// Bookings of one table on one date, ordered by start slot.
    async fn fetch_booked(&self, date: NaiveDate, table_id: TableId)
    -> AppResult<Vec<BookedInterval>>;

    async fn fetch_table_ids(&self) -> AppResult<Vec<TableId>>;

    /// Atomically re-checks availability of `candidate` against `hours` and the
    /// table's current bookings, then inserts it.
    ///
    /// Fails with `TableNotFound` or `SlotConflict` without writing anything.
    async fn insert_if_free(
        &self,
        candidate: &NewReservation,
        hours: &OpeningHours,
    ) -> AppResult<ReservationId>;

    /// Moves a reservation from the live store to the archive store and
    /// returns the moved row.
    async fn archive(&self, id: ReservationId) -> AppResult<Reservation>;

    async fn fetch_archived(&self, id: ReservationId) -> AppResult<Option<Reservation>>;

    /// Deletes live rows that already have an archive copy. Returns how many
    /// rows were removed.
    async fn reconcile_archive(&self) -> AppResult<u64>;
}
