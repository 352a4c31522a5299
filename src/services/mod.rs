//! Service layer for the appointment monitor.
//!
//! This module contains the business logic for:
//! - Filter resolution (`resolver`)
//! - Booking page polling (`SlotPoller`)
//! - Message rendering and delivery (`Notifier`)

pub mod notifier;
pub mod poller;
pub mod resolver;

pub use notifier::{ConsoleNotifier, Notifier, Rendered, SlackNotifier};
pub use poller::{HttpSource, PageSource, PollOutcome, SlotPoller};
pub use resolver::TypePlan;
