// src/models/mod.rs

//! Domain models for the appointment monitor.
//!
//! This module contains the catalogs, configuration and slot types used
//! throughout the application.

pub mod catalog;
mod config;
mod slot;

// Re-export all public types
pub use catalog::{AppointmentType, Location};
pub use config::{
    Config, ENV_BOT_TOKEN, ENV_CHANNEL_ID, MonitorConfig, PollingConfig, SlackConfig,
};
pub use slot::{PollTarget, Slot};
