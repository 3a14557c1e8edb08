pub mod api;
pub mod availability;
pub mod config;
pub mod db;
pub mod params;
pub mod reservation;
pub mod schedule;
pub mod slot;

pub mod error;
