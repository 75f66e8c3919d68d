//! Booking engine: creates and cancels slot bookings.
//!
//! A slot is `Booked` exactly when one active booking references it, and a
//! player never holds two bookings whose slots overlap in time. Both
//! operations take `now` explicitly so callers control the clock.

use crate::directory::Directory;
use crate::error::{BookingError, BookingResult, Conflict};
use crate::model::{Booking, Role, SlotStatus, User};
use chrono::{DateTime, Duration, Utc};

pub const DEFAULT_CANCELLATION_WINDOW_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy)]
pub struct BookingEngine {
    cancellation_window: Duration,
}

impl Default for BookingEngine {
    fn default() -> Self {
        Self {
            cancellation_window: Duration::hours(DEFAULT_CANCELLATION_WINDOW_HOURS),
        }
    }
}

impl BookingEngine {
    /// Returns `None` when the window does not fit in a `Duration`
    pub fn new(cancellation_window_hours: i64) -> Option<Self> {
        Duration::try_hours(cancellation_window_hours).map(|cancellation_window| Self {
            cancellation_window,
        })
    }

    pub fn cancellation_window_hours(&self) -> i64 {
        self.cancellation_window.num_hours()
    }

    /// Book `slot_id` for `player`.
    ///
    /// Checks run in order: the slot exists, it is available, and the player
    /// holds neither this slot nor one overlapping it.
    pub fn book_slot(
        &self,
        dir: &mut Directory,
        player: &User,
        slot_id: &str,
        now: DateTime<Utc>,
    ) -> BookingResult<Booking> {
        require_player(player, "book slots")?;

        let slot = dir
            .find_slot(slot_id)
            .ok_or_else(|| BookingError::invalid_slot(slot_id))?;
        if !slot.is_available() {
            return Err(BookingError::NotAvailable(slot_id.to_string()));
        }

        for held in dir.bookings_for(player.email()) {
            if held.slot_id == slot.id {
                return Err(BookingError::DuplicateOrOverlap(Conflict::SameSlot {
                    slot: slot.id.clone(),
                }));
            }
            let Some(held_slot) = dir.find_slot(&held.slot_id) else {
                continue;
            };
            if held_slot.overlaps(slot) {
                return Err(BookingError::DuplicateOrOverlap(Conflict::Overlaps {
                    slot: slot.id.clone(),
                    booking: held.id.clone(),
                }));
            }
        }

        if let Some(slot) = dir.find_slot_mut(slot_id) {
            slot.status = SlotStatus::Booked;
        }
        Ok(dir.insert_booking(slot_id, player.email(), now).clone())
    }

    /// Cancel the player's booking on `slot_id`.
    ///
    /// Allowed only while the slot start is in the future and no further
    /// away than the cancellation window.
    pub fn cancel_booking(
        &self,
        dir: &mut Directory,
        player: &User,
        slot_id: &str,
        now: DateTime<Utc>,
    ) -> BookingResult<Booking> {
        require_player(player, "cancel bookings")?;

        let booking_id = dir
            .bookings_for(player.email())
            .find(|b| b.slot_id == slot_id)
            .map(|b| b.id.clone())
            .ok_or_else(|| BookingError::NotFound(slot_id.to_string()))?;

        let slot = dir
            .find_slot(slot_id)
            .ok_or_else(|| BookingError::invalid_slot(slot_id))?;
        let until_start = slot.start - now;
        if until_start > self.cancellation_window || until_start <= Duration::zero() {
            return Err(BookingError::CancellationWindowViolation {
                window_hours: self.cancellation_window_hours(),
            });
        }

        if let Some(slot) = dir.find_slot_mut(slot_id) {
            slot.status = SlotStatus::Available;
        }
        dir.take_booking(&booking_id)
            .ok_or_else(|| BookingError::NotFound(slot_id.to_string()))
    }
}

fn require_player(user: &User, action: &'static str) -> BookingResult<()> {
    if user.role() == Role::Player {
        Ok(())
    } else {
        Err(BookingError::AccessDenied {
            role: user.role(),
            action,
        })
    }
}
