//! Polling loop and the per-day bookkeeping it carries.
//!
//! - `SlotTracker`: which slots were already seen today
//! - `Monitor`: polls, diffs and notifies, one cycle at a time

pub mod monitor;
pub mod tracker;

pub use monitor::{CycleReport, Harvest, Monitor, MonitorSettings};
pub use tracker::SlotTracker;
