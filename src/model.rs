//! Entities: users, turfs, slots and bookings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Role of an authenticated user. Exactly one per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Player,
    Coach,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Player => "Player",
            Self::Coach => "Coach",
            Self::Admin => "Admin",
        };
        f.write_str(label)
    }
}

/// A registered user. Identity fields are fixed at construction.
#[derive(Debug, Clone)]
pub struct User {
    email: String,
    name: String,
    role: Role,
    password_digest: [u8; 32],
}

impl User {
    pub fn new(email: &str, password: &str, name: &str, role: Role) -> Self {
        Self {
            email: email.to_string(),
            name: name.to_string(),
            role,
            password_digest: digest(password),
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Check a login attempt against this user's credentials
    pub fn matches(&self, email: &str, password: &str) -> bool {
        self.email == email && self.password_digest == digest(password)
    }
}

fn digest(password: &str) -> [u8; 32] {
    Sha256::digest(password.as_bytes()).into()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TurfStatus {
    #[default]
    Available,
    Maintenance,
}

impl TurfStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::Maintenance => "Maintenance",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turf {
    pub id: String,
    pub name: String,
    pub location: String,
    pub status: TurfStatus,
}

impl Turf {
    pub fn is_under_maintenance(&self) -> bool {
        self.status == TurfStatus::Maintenance
    }
}

impl std::fmt::Display for Turf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} | {} | {} | {}",
            self.id,
            self.name,
            self.location,
            self.status.as_str()
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotStatus {
    Available,
    Booked,
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::Booked => "Booked",
        }
    }
}

/// A bookable interval `[start, end)` on one turf
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub id: String,
    pub turf_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: SlotStatus,
}

impl Slot {
    pub fn is_available(&self) -> bool {
        self.status == SlotStatus::Available
    }

    pub fn overlaps(&self, other: &Slot) -> bool {
        times_overlap(self.start, self.end, other.start, other.end)
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} | Turf:{} | {} - {} | {}",
            self.id,
            self.turf_id,
            self.start.format(TIME_FORMAT),
            self.end.format(TIME_FORMAT),
            self.status.as_str()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Booking {
    pub id: String,
    pub slot_id: String,
    /// Email of the player holding the booking
    pub player: String,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Display for Booking {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} | Slot: {} | Player: {} | Booked: {}",
            self.id,
            self.slot_id,
            self.player,
            self.created_at.format(TIME_FORMAT)
        )
    }
}

/// Half-open interval intersection: touching ranges do not overlap
pub fn times_overlap(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && b_start < a_end
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_role_serde() {
        let role: Role = serde_json::from_str("\"coach\"").unwrap();
        assert_eq!(role, Role::Coach);
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(Role::Player.to_string(), "Player");
    }

    #[test]
    fn test_user_matches() {
        let user = User::new("player1@turfsys.com", "pass", "Kinga", Role::Player);
        assert!(user.matches("player1@turfsys.com", "pass"));
        assert!(!user.matches("player1@turfsys.com", "Pass"));
        assert!(!user.matches("coach1@turfsys.com", "pass"));
    }

    #[test]
    fn test_times_overlap() {
        assert!(times_overlap(at(10), at(12), at(11), at(13)));
        assert!(times_overlap(at(10), at(13), at(11), at(12)));
        // Back-to-back slots share only an endpoint
        assert!(!times_overlap(at(10), at(11), at(11), at(12)));
        assert!(!times_overlap(at(14), at(15), at(10), at(11)));
    }

    #[test]
    fn test_slot_display() {
        let slot = Slot {
            id: "S1".to_string(),
            turf_id: "T1".to_string(),
            start: at(10),
            end: at(10) + Duration::hours(1),
            status: SlotStatus::Available,
        };
        assert_eq!(
            slot.to_string(),
            "S1 | Turf:T1 | 2026-03-14 10:00 - 2026-03-14 11:00 | Available"
        );
    }
}
