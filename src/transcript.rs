use crate::error::BookingError;
use crate::model::{Booking, Role, Slot, Turf};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Append-only JSONL log of one session's events
pub struct Transcript {
    pub path: PathBuf,
    session_id: String,
    cwd: PathBuf,
    file: File,
}

#[derive(Serialize)]
struct Event<'a> {
    ts: DateTime<Utc>,
    session_id: &'a str,
    cwd: &'a Path,
    #[serde(rename = "type")]
    event_type: &'a str,
    #[serde(flatten)]
    data: serde_json::Value,
}

impl Transcript {
    pub fn new(path: &Path, session_id: &str, cwd: &Path) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            session_id: session_id.to_string(),
            cwd: cwd.to_path_buf(),
            file,
        })
    }

    pub fn log(&mut self, event_type: &str, data: serde_json::Value) -> Result<()> {
        let event = Event {
            ts: Utc::now(),
            session_id: &self.session_id,
            cwd: &self.cwd,
            event_type,
            data,
        };
        let line = serde_json::to_string(&event)?;
        writeln!(self.file, "{}", line)?;
        self.file.flush()?;
        Ok(())
    }

    pub fn session_start(&mut self, users: usize, turfs: usize, slots: usize) -> Result<()> {
        self.log(
            "session_start",
            serde_json::json!({ "users": users, "turfs": turfs, "slots": slots }),
        )
    }

    pub fn login_ok(&mut self, email: &str, role: Role) -> Result<()> {
        self.log(
            "login_ok",
            serde_json::json!({ "email": email, "role": role }),
        )
    }

    /// Failed login; the attempted password is never recorded
    pub fn login_failed(&mut self, email: &str) -> Result<()> {
        self.log("login_failed", serde_json::json!({ "email": email }))
    }

    pub fn logout(&mut self, email: &str) -> Result<()> {
        self.log("logout", serde_json::json!({ "email": email }))
    }

    pub fn access_denied(&mut self, email: &str, role: Role, action: &str) -> Result<()> {
        self.log(
            "access_denied",
            serde_json::json!({ "email": email, "role": role, "action": action }),
        )
    }

    pub fn booking_created(&mut self, booking: &Booking) -> Result<()> {
        self.log(
            "booking_created",
            serde_json::json!({
                "booking_id": booking.id,
                "slot_id": booking.slot_id,
                "player": booking.player,
            }),
        )
    }

    pub fn booking_cancelled(&mut self, booking: &Booking) -> Result<()> {
        self.log(
            "booking_cancelled",
            serde_json::json!({
                "booking_id": booking.id,
                "slot_id": booking.slot_id,
                "player": booking.player,
            }),
        )
    }

    /// Log a booking or cancellation the engine refused
    pub fn booking_rejected(
        &mut self,
        player: &str,
        slot_id: &str,
        error: &BookingError,
    ) -> Result<()> {
        self.log(
            "booking_rejected",
            serde_json::json!({
                "player": player,
                "slot_id": slot_id,
                "code": error.code(),
                "message": error.to_string(),
            }),
        )
    }

    pub fn practice_scheduled(&mut self, coach: &str, slot_id: &str) -> Result<()> {
        self.log(
            "practice_scheduled",
            serde_json::json!({ "coach": coach, "slot_id": slot_id }),
        )
    }

    pub fn turf_added(&mut self, turf: &Turf) -> Result<()> {
        self.log(
            "turf_added",
            serde_json::json!({
                "turf_id": turf.id,
                "name": turf.name,
                "location": turf.location,
            }),
        )
    }

    pub fn turf_removed(&mut self, turf: &Turf) -> Result<()> {
        self.log("turf_removed", serde_json::json!({ "turf_id": turf.id }))
    }

    pub fn turf_status(&mut self, turf: &Turf) -> Result<()> {
        self.log(
            "turf_status",
            serde_json::json!({ "turf_id": turf.id, "status": turf.status }),
        )
    }

    pub fn slot_added(&mut self, slot: &Slot) -> Result<()> {
        self.log(
            "slot_added",
            serde_json::json!({
                "slot_id": slot.id,
                "turf_id": slot.turf_id,
                "start": slot.start,
                "end": slot.end,
            }),
        )
    }
}
