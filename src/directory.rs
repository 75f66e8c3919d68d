//! In-memory directory of users, turfs, slots and bookings.
//!
//! Lookups return `None` for unknown ids. Ids come from per-kind monotonic
//! counters so a removed id is never handed out again.

use crate::error::{BookingError, BookingResult};
use crate::model::{Booking, Slot, SlotStatus, Turf, TurfStatus, User};
use chrono::{DateTime, Utc};

#[derive(Debug, Default)]
struct IdSequence {
    turf: u64,
    slot: u64,
    booking: u64,
}

fn next_id(counter: &mut u64, prefix: char) -> String {
    *counter += 1;
    format!("{}{}", prefix, counter)
}

#[derive(Debug, Default)]
pub struct Directory {
    users: Vec<User>,
    turfs: Vec<Turf>,
    slots: Vec<Slot>,
    bookings: Vec<Booking>,
    ids: IdSequence,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    // Users

    pub fn add_user(&mut self, user: User) {
        self.users.push(user);
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn find_user(&self, email: &str) -> Option<&User> {
        self.users.iter().find(|u| u.email() == email)
    }

    /// Find the user whose email and password both match
    pub fn authenticate(&self, email: &str, password: &str) -> BookingResult<&User> {
        self.users
            .iter()
            .find(|u| u.matches(email, password))
            .ok_or(BookingError::Authentication)
    }

    // Turfs

    pub fn turfs(&self) -> &[Turf] {
        &self.turfs
    }

    pub fn find_turf(&self, id: &str) -> Option<&Turf> {
        self.turfs.iter().find(|t| t.id == id)
    }

    pub(crate) fn find_turf_mut(&mut self, id: &str) -> Option<&mut Turf> {
        self.turfs.iter_mut().find(|t| t.id == id)
    }

    pub fn add_turf(&mut self, name: &str, location: &str, status: TurfStatus) -> &Turf {
        let id = next_id(&mut self.ids.turf, 'T');
        self.turfs.push(Turf {
            id,
            name: name.to_string(),
            location: location.to_string(),
            status,
        });
        &self.turfs[self.turfs.len() - 1]
    }

    /// Remove a turf. Slots that point at it are left in place.
    pub fn remove_turf(&mut self, id: &str) -> Option<Turf> {
        let pos = self.turfs.iter().position(|t| t.id == id)?;
        Some(self.turfs.remove(pos))
    }

    // Slots

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn find_slot(&self, id: &str) -> Option<&Slot> {
        self.slots.iter().find(|s| s.id == id)
    }

    pub(crate) fn find_slot_mut(&mut self, id: &str) -> Option<&mut Slot> {
        self.slots.iter_mut().find(|s| s.id == id)
    }

    /// Add an available slot `[start, end)` on an existing turf
    pub fn add_slot(
        &mut self,
        turf_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> BookingResult<&Slot> {
        if self.find_turf(turf_id).is_none() {
            return Err(BookingError::invalid_turf(turf_id));
        }
        if end <= start {
            return Err(BookingError::InvalidTimeRange);
        }

        let id = next_id(&mut self.ids.slot, 'S');
        self.slots.push(Slot {
            id,
            turf_id: turf_id.to_string(),
            start,
            end,
            status: SlotStatus::Available,
        });
        Ok(&self.slots[self.slots.len() - 1])
    }

    pub fn slots_for_turf<'a>(&'a self, turf_id: &'a str) -> impl Iterator<Item = &'a Slot> {
        self.slots.iter().filter(move |s| s.turf_id == turf_id)
    }

    pub fn available_slots(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter().filter(|s| s.is_available())
    }

    // Bookings

    pub fn bookings(&self) -> &[Booking] {
        &self.bookings
    }

    #[cfg(test)]
    pub fn find_booking(&self, id: &str) -> Option<&Booking> {
        self.bookings.iter().find(|b| b.id == id)
    }

    /// Active bookings held by one player, oldest first
    pub fn bookings_for<'a>(&'a self, player: &'a str) -> impl Iterator<Item = &'a Booking> {
        self.bookings.iter().filter(move |b| b.player == player)
    }

    pub(crate) fn insert_booking(
        &mut self,
        slot_id: &str,
        player: &str,
        created_at: DateTime<Utc>,
    ) -> &Booking {
        let id = next_id(&mut self.ids.booking, 'B');
        self.bookings.push(Booking {
            id,
            slot_id: slot_id.to_string(),
            player: player.to_string(),
            created_at,
        });
        &self.bookings[self.bookings.len() - 1]
    }

    pub(crate) fn take_booking(&mut self, id: &str) -> Option<Booking> {
        let pos = self.bookings.iter().position(|b| b.id == id)?;
        Some(self.bookings.remove(pos))
    }
}
