use anyhow::{Context, anyhow};
use chrono::Local;
use common::logger::annotate_span;
use serde::Serialize;
use tracing::error;

use tablebook::api::{available_times_json, rejection_message};
use tablebook::error::{AppError, AppResult};
use tablebook::params::RequestParams;
use tablebook::reservation::model::NewReservation;
use tablebook::reservation::store::ReservationStore;
use tablebook::schedule::model::{OddScheduleDay, OpeningHours};
use tablebook::slot::{SLOTS_PER_DAY, to_time_string};

use crate::cli::{Command, OddCommand, ReservationsCommand, ScheduleCommand};

pub(crate) async fn run(store: &ReservationStore, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Slots { table, date } => {
            annotate_span(Some(&date), Some(table), None);
            println!("{}", available_times_json(store, table, &date).await);
        }

        Command::Reserve {
            name,
            phone,
            table,
            date,
            time,
            duration,
        } => {
            let params: RequestParams = [
                ("name", name),
                ("phone", phone),
                ("table_id", table),
                ("date", date),
                ("time", time),
                ("duration", duration),
            ]
            .into_iter()
            .collect();

            let candidate = NewReservation::from_params(&params).map_err(rejected)?;
            annotate_span(Some(&candidate.date), Some(candidate.table_id), None);

            let id = store
                .reserve(&candidate, Local::now().naive_local())
                .await
                .map_err(rejected)?;
            annotate_span(None, None, Some(id));
            println!("{id}");
        }

        Command::Reservations(cmd) => reservations(store, cmd).await?,
        Command::Schedule(cmd) => schedule(store, cmd).await?,
        Command::Odd(cmd) => odd(store, cmd).await?,

        Command::Tables => print_json(&store.list_table_ids().await?)?,

        Command::Reconcile => {
            let removed = store.reconcile_archive().await?;
            println!("{removed}");
        }
    }

    Ok(())
}

async fn reservations(store: &ReservationStore, cmd: ReservationsCommand) -> anyhow::Result<()> {
    match cmd {
        ReservationsCommand::List { date: Some(date) } => {
            annotate_span(Some(&date), None, None);
            print_json(&store.get_by_date(date).await?)
        }
        ReservationsCommand::List { date: None } => print_json(&store.get_all().await?),

        ReservationsCommand::Show { id, archived } => {
            annotate_span(None, None, Some(id));
            let r = if archived {
                store.get_archived(id).await?
            } else {
                store.get_by_id(id).await?
            };
            print_json(&r)
        }

        ReservationsCommand::Archive { id } => {
            annotate_span(None, None, Some(id));
            let r = store.archive(id).await?;
            print_json(&r)
        }
    }
}

async fn schedule(store: &ReservationStore, cmd: ScheduleCommand) -> anyhow::Result<()> {
    let schedule = store.schedule();
    match cmd {
        ScheduleCommand::Week => {
            for day in schedule.weekly_schedule().await? {
                println!("{:?} {}", day.weekday(), describe(&day.hours)?);
            }
        }

        ScheduleCommand::Set { day, open, close } => {
            let hours = OpeningHours::from_times(&open, &close)?;
            let mut week = schedule.weekly_schedule().await?;
            let entry = week
                .iter_mut()
                .find(|d| d.day == day)
                .ok_or_else(|| anyhow!("day of the week should be in range [1, 7], got {day}"))?;
            entry.hours = hours;
            let weekday = entry.weekday();

            schedule.replace_weekly_schedule(&week).await?;
            println!("{weekday:?} {}", describe(&hours)?);
        }

        ScheduleCommand::Effective { date } => {
            annotate_span(Some(&date), None, None);
            let effective = schedule.effective_schedule(date).await?;
            let source = if effective.is_override() { "odd day" } else { "weekly" };
            println!("{date} {} ({source})", describe(&effective.hours())?);
        }
    }
    Ok(())
}

async fn odd(store: &ReservationStore, cmd: OddCommand) -> anyhow::Result<()> {
    let schedule = store.schedule();
    match cmd {
        OddCommand::Add { date, open, close } => {
            annotate_span(Some(&date), None, None);
            let hours = OpeningHours::from_times(&open, &close)?;
            let added = schedule
                .add_odd_day(
                    date,
                    hours.open_at.get().into(),
                    hours.duration,
                    Local::now().date_naive(),
                )
                .await?;
            println!("{} {}", added.date, describe(&added.hours)?);
        }

        OddCommand::Remove { date } => {
            annotate_span(Some(&date), None, None);
            schedule.remove_odd_day(date).await?;
        }

        OddCommand::List { after } => {
            let days = match after {
                Some(after) => schedule.list_odd_days_after(after).await,
                None => schedule.list_odd_days().await,
            };
            for day in none_scheduled_is_empty(days)? {
                println!("{} {}", day.date, describe(&day.hours)?);
            }
        }
    }
    Ok(())
}

/// `9:00-21:00`, or `closed`.
fn describe(hours: &OpeningHours) -> anyhow::Result<String> {
    if hours.is_closed() {
        return Ok("closed".to_string());
    }
    let open = hours.open_at.to_string();
    let close = to_time_string(u32::from(hours.close_at() % SLOTS_PER_DAY))?;
    Ok(format!("{open}-{close}"))
}

fn none_scheduled_is_empty(days: AppResult<Vec<OddScheduleDay>>) -> AppResult<Vec<OddScheduleDay>> {
    match days {
        Err(AppError::ScheduleNotFound(_)) => Ok(Vec::new()),
        other => other,
    }
}

fn rejected(e: AppError) -> anyhow::Error {
    if matches!(e, AppError::Storage(_)) {
        error!(error = %e, "booking failed on storage");
    }
    anyhow!(rejection_message(&e))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to render output")?;
    println!("{out}");
    Ok(())
}
