//! Config resolver.
//!
//! Expands operator filters into the concrete (type, location) pairs to poll.

use crate::error::{AppError, Result};
use crate::models::catalog::{self, AppointmentType, Location};
use crate::models::{MonitorConfig, PollTarget};

/// Locations to poll for one appointment type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypePlan {
    pub appointment_type: &'static AppointmentType,
    pub locations: Vec<&'static Location>,
}

impl TypePlan {
    /// Poll targets for this type, in location order.
    pub fn targets(&self) -> impl Iterator<Item = PollTarget> + '_ {
        self.locations
            .iter()
            .map(|location| PollTarget::new(self.appointment_type, location))
    }
}

/// Flatten resolved plans into the ordered list of poll targets.
pub fn flatten(plans: &[TypePlan]) -> Vec<PollTarget> {
    plans.iter().flat_map(TypePlan::targets).collect()
}

/// Validate the monitor filters and expand them into per-type plans.
///
/// Types come out in catalog order regardless of the order they were
/// configured in.
pub fn resolve(config: &MonitorConfig) -> Result<Vec<TypePlan>> {
    let selected = select_types(&config.appointment_types)?;

    let location = config
        .location
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());

    let Some(location) = location else {
        return Ok(selected
            .into_iter()
            .map(|kind| TypePlan {
                appointment_type: kind,
                locations: type_locations(kind).iter().collect(),
            })
            .collect());
    };

    let common = common_locations(&selected);
    if !common.iter().any(|name| name.eq_ignore_ascii_case(location)) {
        return Err(AppError::config(format!(
            "Appointment location '{}' is not valid. Choose one of: {}",
            location,
            common.join(", ")
        )));
    }

    selected
        .into_iter()
        .map(|kind| {
            let found = catalog::find_location(type_locations(kind), location).ok_or_else(|| {
                AppError::config(format!("Location '{}' missing for {}", location, kind.name))
            })?;
            Ok(TypePlan {
                appointment_type: kind,
                locations: vec![found],
            })
        })
        .collect()
}

fn select_types(names: &[String]) -> Result<Vec<&'static AppointmentType>> {
    if names.is_empty() {
        return Ok(catalog::supported_types().collect());
    }

    let mut chosen = Vec::new();
    let mut unknown = Vec::new();
    for name in names {
        match catalog::find_type(name).filter(|t| catalog::locations_for(t.name).is_some()) {
            Some(kind) => chosen.push(kind),
            None => unknown.push(name.as_str()),
        }
    }

    if !unknown.is_empty() {
        let supported: Vec<_> = catalog::supported_types().map(|t| t.name).collect();
        return Err(AppError::config(format!(
            "Appointment types {:?} are not supported. Choose from: {}",
            unknown,
            supported.join(", ")
        )));
    }

    Ok(catalog::supported_types()
        .filter(|t| chosen.contains(t))
        .collect())
}

fn type_locations(kind: &AppointmentType) -> &'static [Location] {
    catalog::locations_for(kind.name).unwrap_or(&[])
}

/// Location names bookable for every selected type, in the first type's order.
fn common_locations(selected: &[&'static AppointmentType]) -> Vec<&'static str> {
    let Some((first, rest)) = selected.split_first() else {
        return Vec::new();
    };
    type_locations(first)
        .iter()
        .map(|l| l.name)
        .filter(|name| {
            rest.iter()
                .all(|kind| type_locations(kind).iter().any(|l| l.name == *name))
        })
        .collect()
}
