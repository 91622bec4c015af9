//! Border crossing status and weather forecast synchronization

pub mod config;
pub mod database;
pub mod errors;
pub mod fetch;
pub mod forecast;
pub mod jobs;
pub mod models;
pub mod status;
