mod support;

use tablebook::error::AppError;
use tablebook::schedule::model::{EffectiveSchedule, OddScheduleDay, OpeningHours, WeekDaySchedule};
use tablebook::schedule::repository::ScheduleRepository;
use tablebook::schedule::repository_sqlx::SqlxScheduleRepository;

use support::{date, monday, schedule_store, setup_db, slot};

fn hours(open_at: u32, duration: u8) -> OpeningHours {
    OpeningHours::new(slot(open_at), duration).unwrap()
}

fn week_of(open_at: u32, duration: u8) -> Vec<WeekDaySchedule> {
    (1..=7)
        .map(|d| WeekDaySchedule::new(d, hours(open_at, duration)).unwrap())
        .collect()
}

#[tokio::test]
async fn migration_seeds_a_full_week() {
    let db = setup_db().await;
    let store = schedule_store(&db);

    let week = store.weekly_schedule().await.unwrap();
    assert_eq!(week.len(), 7);
    assert_eq!(week.iter().map(|d| d.day).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5, 6, 7]);
    assert!(week.iter().all(|d| d.hours == hours(18, 24)));

    // Running the migration again keeps the existing rows.
    db.migrate().await.unwrap();
    assert_eq!(store.weekly_schedule().await.unwrap().len(), 7);
}

#[tokio::test]
async fn replace_week_round_trip() {
    let db = setup_db().await;
    let store = schedule_store(&db);

    let mut week = week_of(20, 20);
    week[6] = WeekDaySchedule::new(7, OpeningHours::closed()).unwrap();
    store.replace_weekly_schedule(&week).await.unwrap();

    assert_eq!(store.weekly_schedule().await.unwrap(), week);
    assert!(store.week_day(7).await.unwrap().hours.is_closed());
}

#[tokio::test]
async fn replace_week_is_all_or_nothing() {
    let db = setup_db().await;
    let store = schedule_store(&db);

    // Sunday's row vanishes behind the store's back.
    sqlx::query("DELETE FROM schedule WHERE id = 7")
        .execute(&db.live)
        .await
        .unwrap();

    let res = store.replace_weekly_schedule(&week_of(20, 4)).await;
    assert!(matches!(res, Err(AppError::ScheduleNotFound(_))));

    // Monday..Saturday were rolled back.
    let repo = SqlxScheduleRepository::new(db.live.clone());
    let rows = repo.fetch_week().await.unwrap();
    assert_eq!(rows.len(), 6);
    assert!(rows.iter().all(|d| d.hours == hours(18, 24)));
    assert!(matches!(store.weekly_schedule().await, Err(AppError::ScheduleIntegrity(6))));
}

#[tokio::test]
async fn week_past_midnight_leaves_rows_untouched() {
    let db = setup_db().await;
    let store = schedule_store(&db);

    let mut week = week_of(20, 4);
    week[0].hours = OpeningHours {
        open_at: slot(40),
        duration: 20,
    };
    let res = store.replace_weekly_schedule(&week).await;
    assert!(matches!(res, Err(AppError::ScheduleValidation(_))));

    let rows = store.weekly_schedule().await.unwrap();
    assert!(rows.iter().all(|d| d.hours == hours(18, 24)));
}

#[tokio::test]
async fn odd_day_overrides_and_is_unique() {
    let db = setup_db().await;
    let store = schedule_store(&db);
    let today = date(2030, 1, 1);

    store.add_odd_day(monday(), 24, 8, today).await.unwrap();

    let effective = store.effective_schedule(monday()).await.unwrap();
    assert_eq!(
        effective,
        EffectiveSchedule::Odd(OddScheduleDay {
            date: monday(),
            hours: hours(24, 8)
        })
    );

    let dup = store.add_odd_day(monday(), 20, 2, today).await;
    assert!(matches!(dup, Err(AppError::ScheduleConflict(d)) if d == monday()));

    let tuesday = store.effective_schedule(date(2030, 1, 8)).await.unwrap();
    assert!(matches!(tuesday, EffectiveSchedule::Weekly(w) if w.day == 2));
}

#[tokio::test]
async fn odd_day_listing_and_removal() {
    let db = setup_db().await;
    let store = schedule_store(&db);
    let today = date(2030, 1, 1);

    assert!(matches!(store.list_odd_days().await, Err(AppError::ScheduleNotFound(_))));

    store.add_odd_day(date(2030, 1, 10), 0, 0, today).await.unwrap();
    store.add_odd_day(date(2030, 1, 3), 18, 4, today).await.unwrap();

    let all = store.list_odd_days().await.unwrap();
    assert_eq!(all.iter().map(|d| d.date).collect::<Vec<_>>(), vec![date(2030, 1, 3), date(2030, 1, 10)]);

    let after = store.list_odd_days_after(date(2030, 1, 3)).await.unwrap();
    assert_eq!(after.len(), 1);
    assert!(after[0].hours.is_closed());

    store.remove_odd_day(date(2030, 1, 10)).await.unwrap();
    assert!(matches!(
        store.list_odd_days_after(date(2030, 1, 3)).await,
        Err(AppError::ScheduleNotFound(_))
    ));
    assert!(matches!(
        store.remove_odd_day(date(2030, 1, 10)).await,
        Err(AppError::ScheduleNotFound(_))
    ));
}
