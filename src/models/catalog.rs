//! Appointment type and agency location catalogs.
//!
//! The portal addresses every booking page by a pair of numeric codes:
//! the appointment type code and a location code that is only valid for
//! that type. Types without a location table here cannot be polled.

use serde::Serialize;

/// An appointment type offered by the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct AppointmentType {
    pub name: &'static str,
    pub code: u32,
}

/// An agency location, with the code it carries for one appointment type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Location {
    pub name: &'static str,
    pub code: u32,
}

const fn kind(name: &'static str, code: u32) -> AppointmentType {
    AppointmentType { name, code }
}

const fn loc(name: &'static str, code: u32) -> Location {
    Location { name, code }
}

pub const INITIAL_PERMIT: &str = "INITIAL PERMIT (NOT FOR KNOWLEDGE TEST)";
pub const REAL_ID: &str = "REAL ID";
pub const TRANSFER_FROM_OUT_OF_STATE: &str = "TRANSFER FROM OUT OF STATE";

/// Every appointment type the portal knows about, in display order.
pub const APPOINTMENT_TYPES: &[AppointmentType] = &[
    kind(INITIAL_PERMIT, 15),
    kind("CDL PERMIT OR ENDORSEMENT - (NOT FOR KNOWLEDGE TEST)", 14),
    kind(REAL_ID, 12),
    kind("NON-DRIVER ID", 16),
    kind("KNOWLEDGE TESTING", 17),
    kind("RENEWAL: LICENSE OR NON-DRIVER ID", 11),
    kind("RENEWAL: CDL", 6),
    kind(TRANSFER_FROM_OUT_OF_STATE, 7),
    kind("NEW TITLE OR REGISTRATION", 8),
    kind("SENIOR NEW TITLE OR REGISTRATION (65+)", 9),
    kind("REGISTRATION RENEWAL", 10),
    kind("TITLE DUPLICATE/REPLACEMENT", 13),
];

const TRANSFER_LOCATIONS: &[Location] = &[
    loc("OAKLAND", 58),
    loc("PATERSON", 59),
    loc("LODI", 55),
    loc("WAYNE", 67),
    loc("RANDOLPH", 61),
    loc("NORTH BERGEN", 57),
    loc("NEWARK", 56),
    loc("BAYONNE", 47),
    loc("RAHWAY", 60),
    loc("SOUTH PLAINFIELD", 63),
    loc("EDISON", 52),
    loc("FLEMINGTON", 53),
    loc("BAKERS BASIN", 46),
    loc("FREEHOLD", 54),
    loc("EATONTOWN", 51),
    loc("TOMS RIVER", 65),
    loc("DELANCO", 50),
    loc("CAMDEN", 49),
    loc("WEST DEPTFORD", 68),
    loc("SALEM", 64),
    loc("VINELAND", 66),
    loc("CARDIFF", 48),
    loc("RIO GRANDE", 62),
];

const REAL_ID_LOCATIONS: &[Location] = &[
    loc("OAKLAND", 141),
    loc("PATERSON", 142),
    loc("LODI", 136),
    loc("WAYNE", 140),
    loc("RANDOLPH", 145),
    loc("NORTH BERGEN", 139),
    loc("NEWARK", 138),
    loc("BAYONNE", 125),
    loc("RAHWAY", 144),
    loc("SOUTH PLAINFIELD", 131),
    loc("EDISON", 132),
    loc("FLEMINGTON", 133),
    loc("BAKERS BASIN", 124),
    loc("FREEHOLD", 135),
    loc("EATONTOWN", 130),
    loc("TOMS RIVER", 134),
    loc("DELANCO", 129),
    loc("CAMDEN", 127),
    loc("WEST DEPTFORD", 143),
    loc("SALEM", 128),
    loc("VINELAND", 137),
    loc("CARDIFF", 146),
    loc("RIO GRANDE", 126),
];

const INITIAL_PERMIT_LOCATIONS: &[Location] = &[
    loc("OAKLAND", 203),
    loc("PATERSON", 204),
    loc("LODI", 198),
    loc("WAYNE", 202),
    loc("RANDOLPH", 207),
    loc("NORTH BERGEN", 201),
    loc("NEWARK", 200),
    loc("BAYONNE", 187),
    loc("RAHWAY", 206),
    loc("SOUTH PLAINFIELD", 193),
    loc("EDISON", 194),
    loc("FLEMINGTON", 195),
    loc("BAKERS BASIN", 186),
    loc("FREEHOLD", 197),
    loc("EATONTOWN", 192),
    loc("TOMS RIVER", 196),
    loc("DELANCO", 191),
    loc("CAMDEN", 189),
    loc("WEST DEPTFORD", 205),
    loc("SALEM", 190),
    loc("VINELAND", 199),
    loc("CARDIFF", 208),
    loc("RIO GRANDE", 188),
];

/// Locations bookable for the given appointment type, if it has a table.
pub fn locations_for(type_name: &str) -> Option<&'static [Location]> {
    match type_name {
        TRANSFER_FROM_OUT_OF_STATE => Some(TRANSFER_LOCATIONS),
        REAL_ID => Some(REAL_ID_LOCATIONS),
        INITIAL_PERMIT => Some(INITIAL_PERMIT_LOCATIONS),
        _ => None,
    }
}

/// Appointment types that can be polled, in catalog order.
pub fn supported_types() -> impl Iterator<Item = &'static AppointmentType> {
    APPOINTMENT_TYPES
        .iter()
        .filter(|t| locations_for(t.name).is_some())
}

/// Look up a catalog type by name, ignoring case and surrounding whitespace.
pub fn find_type(name: &str) -> Option<&'static AppointmentType> {
    let name = name.trim();
    APPOINTMENT_TYPES
        .iter()
        .find(|t| t.name.eq_ignore_ascii_case(name))
}

/// Look up a location by name within one type's table.
pub fn find_location(locations: &'static [Location], name: &str) -> Option<&'static Location> {
    let name = name.trim();
    locations.iter().find(|l| l.name.eq_ignore_ascii_case(name))
}
