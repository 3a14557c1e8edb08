use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[clap(name = "tablebook", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Free start times of a table as a JSON array
    Slots {
        #[arg(long)]
        table: i64,

        /// Date as YYYYMMDD
        #[arg(long)]
        date: String,
    },

    /// Book a table
    Reserve {
        #[arg(long, default_value = "")]
        name: String,

        #[arg(long, default_value = "")]
        phone: String,

        #[arg(long, default_value = "")]
        table: String,

        /// Date as YYYY-M-D
        #[arg(long, default_value = "")]
        date: String,

        /// Start time as H:MM on the half-hour grid
        #[arg(long, default_value = "")]
        time: String,

        /// Length in half-hour slots
        #[arg(long, default_value = "")]
        duration: String,
    },

    #[command(subcommand)]
    Reservations(ReservationsCommand),

    #[command(subcommand)]
    Schedule(ScheduleCommand),

    #[command(subcommand)]
    Odd(OddCommand),

    /// Known table ids
    Tables,

    /// Drop live reservations that already have an archive copy
    Reconcile,
}

#[derive(Debug, Subcommand)]
pub enum ReservationsCommand {
    List {
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },

    Show {
        id: i64,

        /// Look the id up in the archive store instead
        #[arg(long)]
        archived: bool,
    },

    Archive { id: i64 },
}

#[derive(Debug, Subcommand)]
pub enum ScheduleCommand {
    /// Weekly hours, Monday first
    Week,

    /// Change the regular hours of one weekday (1 = Monday)
    Set {
        #[arg(long)]
        day: u8,

        #[arg(long)]
        open: String,

        /// Equal to `open` for a closed day; 0:00 means midnight
        #[arg(long)]
        close: String,
    },

    /// Hours that apply on a given date
    Effective {
        #[arg(value_parser = parse_date)]
        date: NaiveDate,
    },
}

#[derive(Debug, Subcommand)]
pub enum OddCommand {
    Add {
        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,

        #[arg(long)]
        open: String,

        #[arg(long)]
        close: String,
    },

    Remove {
        #[arg(value_parser = parse_date)]
        date: NaiveDate,
    },

    List {
        /// Only days strictly after this date
        #[arg(long, value_parser = parse_date)]
        after: Option<NaiveDate>,
    },
}

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("{s}: {e}"))
}
