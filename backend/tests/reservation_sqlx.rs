mod support;

use std::sync::Arc;

use tokio::task::JoinSet;

use tablebook::error::AppError;
use tablebook::reservation::repository::ReservationRepository;
use tablebook::reservation::repository_sqlx::SqlxReservationRepository;

use support::{
    booking, date, monday, now, remove_files, reservation_store, setup_db, setup_file_db,
};

#[tokio::test]
async fn reserve_and_read_back() {
    let db = setup_db().await;
    let store = reservation_store(&db);

    let id = store.reserve(&booking(1, monday(), 24, 2), now()).await.unwrap();
    let r = store.get_by_id(id).await.unwrap();

    assert_eq!(r.name, "Grace");
    assert_eq!(r.date, monday());
    assert_eq!(r.time.get(), 24);
    assert_eq!(r.duration, 2);

    assert_eq!(store.get_by_date(monday()).await.unwrap(), vec![r.clone()]);
    assert!(store.get_by_date(date(2030, 1, 8)).await.unwrap().is_empty());
    assert_eq!(store.get_all().await.unwrap(), vec![r]);
    assert_eq!(store.list_table_ids().await.unwrap(), vec![1, 2, 3]);
}

#[tokio::test]
async fn monday_availability_excludes_the_lunch_booking() {
    let db = setup_db().await;
    let store = reservation_store(&db);
    store
        .schedule()
        .add_odd_day(monday(), 18, 16, date(2030, 1, 1))
        .await
        .unwrap();

    store.reserve(&booking(1, monday(), 24, 2), now()).await.unwrap();

    let free: Vec<u8> = store
        .possible_slots(monday(), 1)
        .await
        .unwrap()
        .iter()
        .map(|s| s.get())
        .collect();
    assert_eq!(free, (18..24).chain(26..34).collect::<Vec<u8>>());

    // Table 2 is untouched.
    assert_eq!(store.possible_slots(monday(), 2).await.unwrap().len(), 16);
}

#[tokio::test]
async fn overlapping_bookings_conflict() {
    let db = setup_db().await;
    let store = reservation_store(&db);

    store.reserve(&booking(1, monday(), 24, 4), now()).await.unwrap();

    for (time, duration) in [(24, 1), (22, 3), (27, 2), (25, 1)] {
        let res = store.reserve(&booking(1, monday(), time, duration), now()).await;
        assert!(
            matches!(res, Err(AppError::SlotConflict { table_id: 1, .. })),
            "{time}+{duration} should conflict, got {res:?}"
        );
    }

    // Touching intervals are fine.
    store.reserve(&booking(1, monday(), 22, 2), now()).await.unwrap();
    store.reserve(&booking(1, monday(), 28, 2), now()).await.unwrap();
    assert_eq!(store.get_by_date(monday()).await.unwrap().len(), 3);
}

#[tokio::test]
async fn schedule_and_time_rejections_write_nothing() {
    let db = setup_db().await;
    let store = reservation_store(&db);
    let closed = date(2030, 1, 9);
    store
        .schedule()
        .add_odd_day(closed, 0, 0, date(2030, 1, 1))
        .await
        .unwrap();

    let past = store.reserve(&booking(1, date(2025, 6, 1), 24, 2), now()).await;
    assert!(matches!(past, Err(AppError::PastDate(_))));

    let early = store.reserve(&booking(1, monday(), 16, 2), now()).await;
    assert!(matches!(early, Err(AppError::OutOfHours { .. })));

    let late = store.reserve(&booking(1, monday(), 41, 2), now()).await;
    assert!(matches!(late, Err(AppError::OutOfHours { close_at: 42, .. })));

    let shut = store.reserve(&booking(1, closed, 24, 2), now()).await;
    assert!(matches!(shut, Err(AppError::ClosedDay(d)) if d == closed));

    let no_table = store.reserve(&booking(42, monday(), 24, 2), now()).await;
    assert!(matches!(no_table, Err(AppError::TableNotFound(42))));

    let zero = store.reserve(&booking(1, monday(), 24, 0), now()).await;
    assert!(matches!(zero, Err(AppError::InvalidRequest(fields)) if fields == vec!["duration"]));

    assert!(store.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn storage_rejects_overlap_that_bypasses_the_store() {
    let db = setup_db().await;
    let store = reservation_store(&db);
    store.reserve(&booking(2, monday(), 24, 4), now()).await.unwrap();

    let res = sqlx::query(
        "INSERT INTO reservations (name, phone, table_id, date, time, duration) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind("Intruder")
    .bind("0")
    .bind(2_i64)
    .bind(monday())
    .bind(26_i64)
    .bind(1_i64)
    .execute(&db.live)
    .await;

    let err = res.unwrap_err();
    assert!(err.to_string().contains("overlaps"), "unexpected error: {err}");
}

#[tokio::test]
async fn concurrent_overlapping_bookings_admit_at_most_one() {
    let db = setup_db().await;
    let store = Arc::new(reservation_store(&db));

    let mut set = JoinSet::new();
    for i in 0..8u32 {
        let store = store.clone();
        set.spawn(async move {
            store
                .reserve(&booking(3, monday(), 24 + (i % 2), 2), now())
                .await
        });
    }

    let mut ok = 0;
    while let Some(res) = set.join_next().await {
        match res.unwrap() {
            Ok(_) => ok += 1,
            Err(AppError::SlotConflict { .. }) | Err(AppError::Storage(_)) => {}
            Err(e) => panic!("unexpected error: {e:?}"),
        }
    }

    let rows = store.get_by_date(monday()).await.unwrap();
    assert!(ok <= 1);
    assert_eq!(rows.len(), ok);
}

#[tokio::test]
async fn concurrent_losers_on_a_file_store_see_a_conflict() {
    let (db, paths) = setup_file_db().await;
    let store = Arc::new(reservation_store(&db));

    let mut set = JoinSet::new();
    for _ in 0..8 {
        let store = store.clone();
        set.spawn(async move { store.reserve(&booking(2, monday(), 30, 2), now()).await });
    }

    let (mut ok, mut conflicts) = (0, 0);
    while let Some(res) = set.join_next().await {
        match res.unwrap() {
            Ok(_) => ok += 1,
            Err(AppError::SlotConflict { table_id: 2, .. }) => conflicts += 1,
            Err(e) => panic!("unexpected error: {e:?}"),
        }
    }

    assert_eq!((ok, conflicts), (1, 7));
    assert_eq!(store.get_by_date(monday()).await.unwrap().len(), 1);

    drop(store);
    remove_files(db, paths).await;
}

#[tokio::test]
async fn archive_moves_an_identical_row() {
    let db = setup_db().await;
    let store = reservation_store(&db);
    let id = store.reserve(&booking(1, monday(), 30, 3), now()).await.unwrap();
    let before = store.get_by_id(id).await.unwrap();

    let moved = store.archive(id).await.unwrap();

    assert_eq!(moved, before);
    assert!(matches!(store.get_by_id(id).await, Err(AppError::ReservationNotFound(_))));
    assert_eq!(store.get_archived(id).await.unwrap(), before);
    assert!(matches!(store.archive(id).await, Err(AppError::ReservationNotFound(_))));

    // Archived bookings no longer block the table.
    let again = store.reserve(&booking(1, monday(), 30, 3), now()).await.unwrap();
    assert_ne!(again, id);
}

#[tokio::test]
async fn failed_archive_insert_keeps_the_live_row() {
    let db = setup_db().await;
    let store = reservation_store(&db);
    let id = store.reserve(&booking(1, monday(), 30, 2), now()).await.unwrap();

    sqlx::query("DROP TABLE reservations")
        .execute(&db.archive)
        .await
        .unwrap();

    let res = store.archive(id).await;
    assert!(matches!(res, Err(AppError::Storage(_))));
    assert_eq!(store.get_by_id(id).await.unwrap().id, id);
}

#[tokio::test]
async fn reconcile_removes_rows_already_archived() {
    let db = setup_db().await;
    let store = reservation_store(&db);
    let kept = store.reserve(&booking(1, monday(), 20, 2), now()).await.unwrap();
    let stranded = store.reserve(&booking(2, monday(), 20, 2), now()).await.unwrap();

    // Simulate a crash after the archive insert but before the live commit.
    let row = store.get_by_id(stranded).await.unwrap();
    sqlx::query(
        "INSERT INTO reservations (id, name, phone, table_id, date, time, duration) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(row.id)
    .bind(&row.name)
    .bind(&row.phone)
    .bind(row.table_id)
    .bind(row.date)
    .bind(i64::from(row.time.get()))
    .bind(i64::from(row.duration))
    .execute(&db.archive)
    .await
    .unwrap();

    assert_eq!(store.reconcile_archive().await.unwrap(), 1);
    assert!(store.get_by_id(kept).await.is_ok());
    assert!(matches!(store.get_by_id(stranded).await, Err(AppError::ReservationNotFound(_))));
    assert_eq!(store.get_archived(stranded).await.unwrap(), row);

    let repo = SqlxReservationRepository::new(db.live.clone(), db.archive.clone());
    assert_eq!(repo.reconcile_archive().await.unwrap(), 0);
}
