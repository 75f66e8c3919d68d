//! Domain errors for the booking system.
//!
//! None of these are fatal: the menu loop prints the message and carries on.

use crate::model::Role;

pub type BookingResult<T> = Result<T, BookingError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingError {
    #[error("Invalid email or password.")]
    Authentication,

    #[error("Invalid {kind} ID: {id}")]
    InvalidReference { kind: &'static str, id: String },

    #[error("Slot {0} is not available.")]
    NotAvailable(String),

    #[error("{0}")]
    DuplicateOrOverlap(Conflict),

    #[error("No booking found for slot {0}.")]
    NotFound(String),

    #[error("Can cancel only within {window_hours} hours of start time.")]
    CancellationWindowViolation { window_hours: i64 },

    #[error("Access denied: {role} cannot {action}.")]
    AccessDenied { role: Role, action: &'static str },

    #[error("Turf {0} is under maintenance.")]
    TurfUnderMaintenance(String),

    #[error("Slot must end after it starts.")]
    InvalidTimeRange,
}

impl BookingError {
    pub fn invalid_turf(id: &str) -> Self {
        Self::InvalidReference {
            kind: "Turf",
            id: id.to_string(),
        }
    }

    pub fn invalid_slot(id: &str) -> Self {
        Self::InvalidReference {
            kind: "Slot",
            id: id.to_string(),
        }
    }

    /// Short snake_case tag used in transcript events
    pub fn code(&self) -> &'static str {
        match self {
            Self::Authentication => "authentication",
            Self::InvalidReference { .. } => "invalid_reference",
            Self::NotAvailable(_) => "not_available",
            Self::DuplicateOrOverlap(_) => "duplicate_or_overlap",
            Self::NotFound(_) => "not_found",
            Self::CancellationWindowViolation { .. } => "cancellation_window_violation",
            Self::AccessDenied { .. } => "access_denied",
            Self::TurfUnderMaintenance(_) => "turf_under_maintenance",
            Self::InvalidTimeRange => "invalid_time_range",
        }
    }
}

/// Why a booking clashes with one the player already holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    SameSlot { slot: String },
    Overlaps { slot: String, booking: String },
}

impl std::fmt::Display for Conflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Conflict::SameSlot { slot } => write!(f, "You already booked slot {}.", slot),
            Conflict::Overlaps { slot, booking } => write!(
                f,
                "Slot {} overlaps with your existing booking {}.",
                slot, booking
            ),
        }
    }
}
