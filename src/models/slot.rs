//! Poll targets and the appointment slots found on them.

use std::fmt;

use serde::Serialize;

use crate::models::catalog::{AppointmentType, Location};
use crate::utils::time::format_clock;

/// Path template of a booking page, relative to the portal base.
const WIZARD_PATH: &str = "/njmvc/AppointmentWizard";

/// One (appointment type, location) page to poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PollTarget {
    pub appointment_type: &'static str,
    pub type_code: u32,
    pub location: &'static str,
    pub location_code: u32,
}

impl PollTarget {
    pub fn new(kind: &AppointmentType, location: &Location) -> Self {
        Self {
            appointment_type: kind.name,
            type_code: kind.code,
            location: location.name,
            location_code: location.code,
        }
    }

    /// Booking page URL for this target.
    pub fn url(&self, portal_base: &str) -> String {
        format!(
            "{}{}/{}/{}",
            portal_base.trim_end_matches('/'),
            WIZARD_PATH,
            self.type_code,
            self.location_code
        )
    }
}

impl fmt::Display for PollTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.appointment_type, self.location)
    }
}

/// A bookable appointment slot, identified by its booking URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slot {
    /// Fully-qualified booking URL (unique key)
    pub url: String,

    /// Appointment type name
    pub appointment_type: String,

    /// Agency location name
    pub location: String,

    /// Date segment of the booking path (e.g. `2024-05-17`)
    pub date: String,

    /// Raw time segment of the booking path (e.g. `830`)
    pub time: String,
}

impl Slot {
    /// Time of day as a 12-hour clock string.
    pub fn display_time(&self) -> String {
        format_clock(&self.time)
    }
}
