use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{error, warn};

use crate::availability::{BookedInterval, is_interval_free, possible_slots};
use crate::db::schema::OVERLAP_MESSAGE;
use crate::db::{column_u8, decode_error};
use crate::error::{AppError, AppResult};
use crate::reservation::model::{NewReservation, Reservation, ReservationId, TableId};
use crate::reservation::repository::ReservationRepository;
use crate::schedule::model::OpeningHours;
use crate::slot::SlotIndex;

const SELECT_RESERVATION: &str =
    "SELECT id, name, phone, table_id, date, time, duration FROM reservations";

/// SQLx-backed implementation of ReservationRepository.
///
/// Holds two pools: `live` for active bookings and `archive` for rows moved
/// out by [`ReservationRepository::archive`].
pub struct SqlxReservationRepository {
    live: SqlitePool,
    archive: SqlitePool,
}

impl SqlxReservationRepository {
    pub fn new(live: SqlitePool, archive: SqlitePool) -> Self {
        Self { live, archive }
    }
}

#[async_trait]
impl ReservationRepository for SqlxReservationRepository {
    async fn fetch_by_id(&self, id: ReservationId) -> AppResult<Option<Reservation>> {
        let row = sqlx::query(&format!("{SELECT_RESERVATION} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.live)
            .await?;

        Ok(row.as_ref().map(row_to_reservation).transpose()?)
    }

    async fn fetch_all(&self) -> AppResult<Vec<Reservation>> {
        let rows = sqlx::query(&format!(
            "{SELECT_RESERVATION} ORDER BY date, table_id, time"
        ))
        .fetch_all(&self.live)
        .await?;

        Ok(rows
            .iter()
            .map(row_to_reservation)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn fetch_by_date(&self, date: NaiveDate) -> AppResult<Vec<Reservation>> {
        let rows = sqlx::query(&format!(
            "{SELECT_RESERVATION} WHERE date = ? ORDER BY table_id, time"
        ))
        .bind(date)
        .fetch_all(&self.live)
        .await?;

        Ok(rows
            .iter()
            .map(row_to_reservation)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn fetch_booked(
        &self,
        date: NaiveDate,
        table_id: TableId,
    ) -> AppResult<Vec<BookedInterval>> {
        let rows = sqlx::query(
            "SELECT time, duration FROM reservations WHERE date = ? AND table_id = ? ORDER BY time",
        )
        .bind(date)
        .bind(table_id)
        .fetch_all(&self.live)
        .await?;

        Ok(rows
            .iter()
            .map(row_to_interval)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn fetch_table_ids(&self) -> AppResult<Vec<TableId>> {
        let ids = sqlx::query_scalar::<_, i64>("SELECT id FROM tables ORDER BY id")
            .fetch_all(&self.live)
            .await?;
        Ok(ids)
    }

    async fn insert_if_free(
        &self,
        candidate: &NewReservation,
        hours: &OpeningHours,
    ) -> AppResult<ReservationId> {
        let mut tx = self.live.begin().await?;

        // A write as the first statement takes the writer lock before any read,
        // same as BEGIN IMMEDIATE. Competing bookings wait on busy_timeout here
        // instead of failing a read-to-write lock upgrade later.
        let claimed = sqlx::query("UPDATE tables SET id = id WHERE id = ?")
            .bind(candidate.table_id)
            .execute(&mut *tx)
            .await?;
        if claimed.rows_affected() == 0 {
            return Err(AppError::TableNotFound(candidate.table_id));
        }

        let rows = sqlx::query(
            "SELECT time, duration FROM reservations WHERE date = ? AND table_id = ? ORDER BY time",
        )
        .bind(candidate.date)
        .bind(candidate.table_id)
        .fetch_all(&mut *tx)
        .await?;
        let booked = rows
            .iter()
            .map(row_to_interval)
            .collect::<Result<Vec<_>, _>>()?;

        let possible = possible_slots(candidate.date, hours, &booked)?;
        if !is_interval_free(candidate.time, candidate.duration, &possible) {
            return Err(slot_conflict(candidate));
        }

        let inserted = sqlx::query(
            r#"
INSERT INTO reservations (name, phone, table_id, date, time, duration)
VALUES (?, ?, ?, ?, ?, ?);
"#,
        )
        .bind(&candidate.name)
        .bind(&candidate.phone)
        .bind(candidate.table_id)
        .bind(candidate.date)
        .bind(i64::from(candidate.time.get()))
        .bind(i64::from(candidate.duration))
        .execute(&mut *tx)
        .await;

        let id = match inserted {
            Ok(done) => done.last_insert_rowid(),
            Err(e) if is_overlap(&e) => return Err(slot_conflict(candidate)),
            Err(e) => return Err(e.into()),
        };

        tx.commit().await?;
        Ok(id)
    }

    async fn archive(&self, id: ReservationId) -> AppResult<Reservation> {
        let mut tx = self.live.begin().await?;

        let row = sqlx::query(&format!("{SELECT_RESERVATION} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let reservation = match row {
            Some(r) => row_to_reservation(&r)?,
            None => return Err(AppError::ReservationNotFound(id)),
        };

        sqlx::query("DELETE FROM reservations WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        // The archive store is a separate database. If this insert fails,
        // dropping `tx` rolls the live delete back.
        sqlx::query(
            r#"
INSERT OR REPLACE INTO reservations (id, name, phone, table_id, date, time, duration)
VALUES (?, ?, ?, ?, ?, ?, ?);
"#,
        )
        .bind(reservation.id)
        .bind(&reservation.name)
        .bind(&reservation.phone)
        .bind(reservation.table_id)
        .bind(reservation.date)
        .bind(i64::from(reservation.time.get()))
        .bind(i64::from(reservation.duration))
        .execute(&self.archive)
        .await?;

        if let Err(e) = tx.commit().await {
            warn!(reservation_id = id, error = %e, "live commit failed after archive insert; undoing archive copy");
            if let Err(undo) = sqlx::query("DELETE FROM reservations WHERE id = ?")
                .bind(id)
                .execute(&self.archive)
                .await
            {
                // Left for reconcile_archive: the live row is still there
                // and its archive copy will be treated as authoritative.
                error!(reservation_id = id, error = %undo, "failed to undo archive copy");
            }
            return Err(e.into());
        }

        Ok(reservation)
    }

    async fn fetch_archived(&self, id: ReservationId) -> AppResult<Option<Reservation>> {
        let row = sqlx::query(&format!("{SELECT_RESERVATION} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.archive)
            .await?;

        Ok(row.as_ref().map(row_to_reservation).transpose()?)
    }

    async fn reconcile_archive(&self) -> AppResult<u64> {
        let live_ids = sqlx::query_scalar::<_, i64>("SELECT id FROM reservations ORDER BY id")
            .fetch_all(&self.live)
            .await?;

        let mut removed = 0;
        for id in live_ids {
            let archived = sqlx::query("SELECT id FROM reservations WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.archive)
                .await?;
            if archived.is_none() {
                continue;
            }

            removed += sqlx::query("DELETE FROM reservations WHERE id = ?")
                .bind(id)
                .execute(&self.live)
                .await?
                .rows_affected();
        }

        Ok(removed)
    }
}

fn slot_conflict(candidate: &NewReservation) -> AppError {
    AppError::SlotConflict {
        table_id: candidate.table_id,
        date: candidate.date,
        time: candidate.time,
    }
}

/// Storage-level overlap guards: the `(date, table_id, time)` unique index and
/// the overlap trigger.
fn is_overlap(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => {
            db.is_unique_violation() || db.message().contains(OVERLAP_MESSAGE)
        }
        _ => false,
    }
}

/* =========================
Row mapping
========================= */

fn row_to_reservation(r: &SqliteRow) -> Result<Reservation, sqlx::Error> {
    let BookedInterval { time, duration } = row_to_interval(r)?;
    Ok(Reservation {
        id: r.try_get("id")?,
        name: r.try_get("name")?,
        phone: r.try_get("phone")?,
        table_id: r.try_get("table_id")?,
        date: r.try_get("date")?,
        time,
        duration,
    })
}

fn row_to_interval(r: &SqliteRow) -> Result<BookedInterval, sqlx::Error> {
    let time = SlotIndex::new(column_u8(r, "time")?.into()).map_err(decode_error)?;
    Ok(BookedInterval {
        time,
        duration: column_u8(r, "duration")?,
    })
}
