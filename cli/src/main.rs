pub mod cli;
mod commands;

use std::sync::Arc;

use clap::Parser;
use common::logger::{TraceId, child_span, init_logger, root_span};
use tracing::{Instrument, info};

use tablebook::config::AppConfig;
use tablebook::db::Db;
use tablebook::reservation::repository_sqlx::SqlxReservationRepository;
use tablebook::reservation::store::ReservationStore;
use tablebook::schedule::repository_sqlx::SqlxScheduleRepository;
use tablebook::schedule::store::ScheduleStore;

use cli::{Cli, Command};

/// Opens both stores, migrates them, seeds tables, and finishes any archive
/// move a previous run left half done.
async fn init_store(cfg: &AppConfig) -> anyhow::Result<ReservationStore> {
    let db = Db::connect(cfg).await?;
    db.migrate().await?;
    db.seed_tables(cfg.table_count).await?;

    let schedule = Arc::new(ScheduleStore::new(Arc::new(SqlxScheduleRepository::new(
        db.live.clone(),
    ))));
    let repo = Arc::new(SqlxReservationRepository::new(db.live, db.archive));
    let store = ReservationStore::new(repo, schedule);

    store.reconcile_archive().await?;

    Ok(store)
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Slots { .. } => "slots",
        Command::Reserve { .. } => "reserve",
        Command::Reservations(_) => "reservations",
        Command::Schedule(_) => "schedule",
        Command::Odd(_) => "odd",
        Command::Tables => "tables",
        Command::Reconcile => "reconcile",
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = AppConfig::from_env();

    init_logger("tablebook", cfg.json_logs);

    let trace_id = TraceId::new();
    let span = root_span(command_name(&cli.command), &trace_id);

    async move {
        let store = init_store(&cfg).instrument(child_span("bootstrap")).await?;
        info!(tables = cfg.table_count, "stores ready");

        commands::run(&store, cli.command).await
    }
    .instrument(span)
    .await
}
