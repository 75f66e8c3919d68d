//! Role capability table for main-menu actions.
//!
//! Every main-menu choice maps to an [`Action`]; a role may invoke only the
//! actions listed for it. Rejection happens here, before any store access.

use crate::error::{BookingError, BookingResult};
use crate::model::Role;

/// Main-menu action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ViewTurfs,
    BookSlot,
    SchedulePractice,
    ManageTurfs,
    Logout,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::ViewTurfs,
        Action::BookSlot,
        Action::SchedulePractice,
        Action::ManageTurfs,
        Action::Logout,
    ];

    /// Map a main-menu choice ("1".."5") to its action
    pub fn from_choice(choice: &str) -> Option<Self> {
        match choice.trim() {
            "1" => Some(Self::ViewTurfs),
            "2" => Some(Self::BookSlot),
            "3" => Some(Self::SchedulePractice),
            "4" => Some(Self::ManageTurfs),
            "5" => Some(Self::Logout),
            _ => None,
        }
    }

    pub fn menu_label(&self) -> &'static str {
        match self {
            Self::ViewTurfs => "View Available Turfs",
            Self::BookSlot => "Book a Slot (Player Only)",
            Self::SchedulePractice => "Schedule Practice (Coach Only)",
            Self::ManageTurfs => "Manage Turfs (Admin Only)",
            Self::Logout => "Logout",
        }
    }

    /// Verb phrase used in access-denied messages
    pub fn verb(&self) -> &'static str {
        match self {
            Self::ViewTurfs => "view turfs",
            Self::BookSlot => "book slots",
            Self::SchedulePractice => "schedule practice",
            Self::ManageTurfs => "manage turfs",
            Self::Logout => "log out",
        }
    }
}

const CAPABILITIES: &[(Role, &[Action])] = &[
    (
        Role::Player,
        &[Action::ViewTurfs, Action::BookSlot, Action::Logout],
    ),
    (
        Role::Coach,
        &[Action::ViewTurfs, Action::SchedulePractice, Action::Logout],
    ),
    (
        Role::Admin,
        &[Action::ViewTurfs, Action::ManageTurfs, Action::Logout],
    ),
];

pub fn is_allowed(role: Role, action: Action) -> bool {
    CAPABILITIES
        .iter()
        .find(|(r, _)| *r == role)
        .is_some_and(|(_, actions)| actions.contains(&action))
}

pub fn authorize(role: Role, action: Action) -> BookingResult<()> {
    if is_allowed(role, action) {
        Ok(())
    } else {
        Err(BookingError::AccessDenied {
            role,
            action: action.verb(),
        })
    }
}
