//! Coach practice scheduling. Advisory only: nothing in the store changes.

use crate::directory::Directory;
use crate::error::{BookingError, BookingResult};
use crate::model::Slot;

/// Check that practice can run on `slot_id` and return the slot
pub fn schedule_practice<'a>(dir: &'a Directory, slot_id: &str) -> BookingResult<&'a Slot> {
    let slot = dir
        .find_slot(slot_id)
        .ok_or_else(|| BookingError::invalid_slot(slot_id))?;
    if dir
        .find_turf(&slot.turf_id)
        .is_some_and(|turf| turf.is_under_maintenance())
    {
        return Err(BookingError::TurfUnderMaintenance(slot.turf_id.clone()));
    }
    Ok(slot)
}
