//! Turf administration: add, remove, and change turf status.

use crate::directory::Directory;
use crate::error::{BookingError, BookingResult};
use crate::model::{Slot, Turf, TurfStatus};
use chrono::{DateTime, Utc};

/// Add a turf; new turfs start out available
pub fn add_turf(dir: &mut Directory, name: &str, location: &str) -> Turf {
    dir.add_turf(name, location, TurfStatus::Available).clone()
}

/// Remove a turf by id. Slots on the turf are not touched.
pub fn remove_turf(dir: &mut Directory, id: &str) -> BookingResult<Turf> {
    dir.remove_turf(id).ok_or_else(|| BookingError::invalid_turf(id))
}

/// Put a turf under maintenance. Its slots keep their status.
pub fn mark_maintenance(dir: &mut Directory, id: &str) -> BookingResult<Turf> {
    set_status(dir, id, TurfStatus::Maintenance)
}

pub fn mark_available(dir: &mut Directory, id: &str) -> BookingResult<Turf> {
    set_status(dir, id, TurfStatus::Available)
}

fn set_status(dir: &mut Directory, id: &str, status: TurfStatus) -> BookingResult<Turf> {
    let turf = dir
        .find_turf_mut(id)
        .ok_or_else(|| BookingError::invalid_turf(id))?;
    turf.status = status;
    Ok(turf.clone())
}

pub fn add_slot(
    dir: &mut Directory,
    turf_id: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> BookingResult<Slot> {
    dir.add_slot(turf_id, start, end).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SlotStatus;
    use chrono::{Duration, TimeZone};

    fn directory() -> Directory {
        let mut dir = Directory::new();
        dir.add_turf("Main Field", "Stadium A", TurfStatus::Available);
        dir.add_turf("Training Field", "Stadium B", TurfStatus::Maintenance);
        dir
    }

    #[test]
    fn test_add_turf_defaults_available() {
        let mut dir = directory();
        let turf = add_turf(&mut dir, "Indoor", "Hall C");
        assert_eq!(turf.id, "T3");
        assert_eq!(turf.status, TurfStatus::Available);
        assert_eq!(dir.turfs().len(), 3);
    }

    #[test]
    fn test_remove_turf() {
        let mut dir = directory();
        let removed = remove_turf(&mut dir, "T1").unwrap();
        assert_eq!(removed.name, "Main Field");
        assert_eq!(dir.turfs().len(), 1);
    }

    #[test]
    fn test_remove_missing_turf_leaves_list() {
        let mut dir = directory();
        let before = dir.turfs().to_vec();
        let err = remove_turf(&mut dir, "T9").unwrap_err();
        assert_eq!(err.to_string(), "Invalid Turf ID: T9");
        assert_eq!(dir.turfs(), before.as_slice());
    }

    #[test]
    fn test_maintenance_does_not_cascade() {
        let mut dir = directory();
        let start = Utc.with_ymd_and_hms(2026, 6, 1, 18, 0, 0).unwrap();
        add_slot(&mut dir, "T1", start, start + Duration::hours(1)).unwrap();

        let turf = mark_maintenance(&mut dir, "T1").unwrap();
        assert!(turf.is_under_maintenance());
        assert_eq!(dir.find_slot("S1").unwrap().status, SlotStatus::Available);

        let turf = mark_available(&mut dir, "T1").unwrap();
        assert_eq!(turf.status, TurfStatus::Available);
        assert!(mark_maintenance(&mut dir, "T7").is_err());
    }
}
