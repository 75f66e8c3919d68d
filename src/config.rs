use crate::booking::{BookingEngine, DEFAULT_CANCELLATION_WINDOW_HOURS};
use crate::directory::Directory;
use crate::model::{Role, TurfStatus, User};
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// A validation error in the configuration
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]: {}", self.field, self.message)
    }
}

/// Business rules for the booking engine
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct BookingConfig {
    #[serde(default)]
    pub cancellation_window_hours: Option<i64>,
}

impl BookingConfig {
    pub fn cancellation_window_hours(&self) -> i64 {
        self.cancellation_window_hours
            .unwrap_or(DEFAULT_CANCELLATION_WINDOW_HOURS)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserSeed {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TurfSeed {
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub status: TurfStatus,
}

/// A slot relative to startup time
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SlotSeed {
    /// 1-based position in `seed.turfs`
    pub turf: usize,
    pub start_in_minutes: i64,
    #[serde(default = "default_duration_minutes")]
    pub duration_minutes: i64,
    /// Email of a player to book this slot for at startup
    #[serde(default)]
    pub booked_by: Option<String>,
}

fn default_duration_minutes() -> i64 {
    60
}

/// One year, in hours
pub const MAX_CANCELLATION_WINDOW_HOURS: i64 = 24 * 365;
/// Seeded slots start at most a year before or after startup
pub const MAX_SEED_OFFSET_MINUTES: i64 = 60 * 24 * 365;
pub const MAX_SLOT_DURATION_MINUTES: i64 = 60 * 24;

/// Initial directory contents
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct SeedConfig {
    #[serde(default)]
    pub users: Vec<UserSeed>,
    #[serde(default)]
    pub turfs: Vec<TurfSeed>,
    #[serde(default)]
    pub slots: Vec<SlotSeed>,
}

impl SeedConfig {
    /// Three users, two turfs (one under maintenance), two upcoming slots
    pub fn builtin() -> Self {
        let user = |email: &str, name: &str, role| UserSeed {
            email: email.to_string(),
            password: "pass".to_string(),
            name: name.to_string(),
            role,
        };

        SeedConfig {
            users: vec![
                user("player1@turfsys.com", "Kinga", Role::Player),
                user("coach1@turfsys.com", "Tabassum", Role::Coach),
                user("manager1@turfsys.com", "Messi", Role::Admin),
            ],
            turfs: vec![
                TurfSeed {
                    name: "Main Field".to_string(),
                    location: "Stadium A".to_string(),
                    status: TurfStatus::Available,
                },
                TurfSeed {
                    name: "Training Field".to_string(),
                    location: "Stadium B".to_string(),
                    status: TurfStatus::Maintenance,
                },
            ],
            slots: vec![
                SlotSeed {
                    turf: 1,
                    start_in_minutes: 120,
                    duration_minutes: 60,
                    booked_by: None,
                },
                SlotSeed {
                    turf: 2,
                    start_in_minutes: 240,
                    duration_minutes: 60,
                    booked_by: Some("player1@turfsys.com".to_string()),
                },
            ],
        }
    }

    /// Build a directory from this seed. Pre-booked slots go through the
    /// engine so slot status and booking records agree.
    pub fn build(&self, engine: &BookingEngine, now: DateTime<Utc>) -> Result<Directory> {
        let mut dir = Directory::new();

        for u in &self.users {
            dir.add_user(User::new(&u.email, &u.password, &u.name, u.role));
        }

        let turf_ids: Vec<String> = self
            .turfs
            .iter()
            .map(|t| dir.add_turf(&t.name, &t.location, t.status).id.clone())
            .collect();

        for (i, s) in self.slots.iter().enumerate() {
            let turf_id = s
                .turf
                .checked_sub(1)
                .and_then(|idx| turf_ids.get(idx))
                .ok_or_else(|| anyhow::anyhow!("seed.slots[{}]: unknown turf {}", i, s.turf))?;
            let start = offset(now, s.start_in_minutes)
                .ok_or_else(|| anyhow::anyhow!("seed.slots[{}]: start out of range", i))?;
            let end = offset(start, s.duration_minutes)
                .ok_or_else(|| anyhow::anyhow!("seed.slots[{}]: duration out of range", i))?;
            let slot_id = dir
                .add_slot(turf_id, start, end)
                .map_err(|e| anyhow::anyhow!("seed.slots[{}]: {}", i, e))?
                .id
                .clone();

            if let Some(email) = &s.booked_by {
                let player = dir
                    .find_user(email)
                    .cloned()
                    .ok_or_else(|| anyhow::anyhow!("seed.slots[{}]: unknown user {}", i, email))?;
                engine
                    .book_slot(&mut dir, &player, &slot_id, now)
                    .map_err(|e| anyhow::anyhow!("seed.slots[{}]: {}", i, e))?;
            }
        }

        Ok(dir)
    }
}

fn offset(from: DateTime<Utc>, minutes: i64) -> Option<DateTime<Utc>> {
    Duration::try_minutes(minutes).and_then(|d| from.checked_add_signed(d))
}

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub booking: BookingConfig,
    /// Replaces the built-in seed when present
    #[serde(default)]
    pub seed: Option<SeedConfig>,
}

impl Config {
    /// Load configuration from default paths
    /// Priority: local (.turfbook/config.local.toml) > project (.turfbook/config.toml)
    /// > user (~/.turfbook/config.toml)
    pub fn load() -> Result<Self> {
        let mut paths = Vec::new();
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".turfbook").join("config.toml"));
        }
        paths.push(Path::new(".turfbook").join("config.toml"));
        paths.push(Path::new(".turfbook").join("config.local.toml"));
        Self::load_layers(&paths)
    }

    /// Merge each existing file in order; later files take priority
    pub fn load_layers(paths: &[PathBuf]) -> Result<Self> {
        let mut config = Self::default();
        for path in paths {
            if path.exists() {
                let layer = Self::load_from(path)?;
                config.merge(layer);
            }
        }
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))?;
        Ok(config)
    }

    /// Merge another config into this one (other takes priority).
    /// A seed section replaces the previous one wholesale.
    pub fn merge(&mut self, other: Config) {
        if other.booking.cancellation_window_hours.is_some() {
            self.booking.cancellation_window_hours = other.booking.cancellation_window_hours;
        }
        if other.seed.is_some() {
            self.seed = other.seed;
        }
    }

    pub fn seed(&self) -> SeedConfig {
        self.seed.clone().unwrap_or_else(SeedConfig::builtin)
    }

    pub fn engine(&self) -> Result<BookingEngine> {
        let hours = self.booking.cancellation_window_hours();
        BookingEngine::new(hours).ok_or_else(|| {
            anyhow::anyhow!(
                "booking.cancellation_window_hours: {} is out of range",
                hours
            )
        })
    }

    /// Validate the configuration and return any errors found
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        let window = self.booking.cancellation_window_hours();
        if !(1..=MAX_CANCELLATION_WINDOW_HOURS).contains(&window) {
            errors.push(ValidationError {
                field: "booking.cancellation_window_hours".to_string(),
                message: format!(
                    "Must be between 1 and {}, got {}",
                    MAX_CANCELLATION_WINDOW_HOURS, window
                ),
            });
        }

        let seed = self.seed();

        let mut emails = HashSet::new();
        for (i, user) in seed.users.iter().enumerate() {
            if !emails.insert(user.email.as_str()) {
                errors.push(ValidationError {
                    field: format!("seed.users[{}].email", i),
                    message: format!("Duplicate email '{}'", user.email),
                });
            }
        }

        for (i, slot) in seed.slots.iter().enumerate() {
            if slot.turf == 0 || slot.turf > seed.turfs.len() {
                errors.push(ValidationError {
                    field: format!("seed.slots[{}].turf", i),
                    message: format!(
                        "Must be between 1 and {}, got {}",
                        seed.turfs.len(),
                        slot.turf
                    ),
                });
            }
            if slot.start_in_minutes.abs() > MAX_SEED_OFFSET_MINUTES {
                errors.push(ValidationError {
                    field: format!("seed.slots[{}].start_in_minutes", i),
                    message: format!(
                        "Must be within {} minutes of startup, got {}",
                        MAX_SEED_OFFSET_MINUTES, slot.start_in_minutes
                    ),
                });
            }
            if !(1..=MAX_SLOT_DURATION_MINUTES).contains(&slot.duration_minutes) {
                errors.push(ValidationError {
                    field: format!("seed.slots[{}].duration_minutes", i),
                    message: format!(
                        "Must be between 1 and {}, got {}",
                        MAX_SLOT_DURATION_MINUTES, slot.duration_minutes
                    ),
                });
            }
            if let Some(email) = &slot.booked_by {
                let is_player = seed
                    .users
                    .iter()
                    .any(|u| &u.email == email && u.role == Role::Player);
                if !is_player {
                    errors.push(ValidationError {
                        field: format!("seed.slots[{}].booked_by", i),
                        message: format!("'{}' is not a seeded player", email),
                    });
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SlotStatus;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 2, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_validate_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.booking.cancellation_window_hours(), 24);
    }

    #[test]
    fn test_builtin_seed_build() {
        let config = Config::default();
        let dir = config.seed().build(&config.engine().unwrap(), now()).unwrap();

        assert_eq!(dir.users().len(), 3);
        assert_eq!(dir.turfs().len(), 2);
        assert!(dir.find_turf("T2").unwrap().is_under_maintenance());

        let s1 = dir.find_slot("S1").unwrap();
        assert_eq!(s1.start, now() + Duration::hours(2));
        assert_eq!(s1.status, SlotStatus::Available);

        // The pre-booked slot has a matching booking record
        assert_eq!(dir.find_slot("S2").unwrap().status, SlotStatus::Booked);
        let booking = dir.find_booking("B1").unwrap();
        assert_eq!(booking.slot_id, "S2");
        assert_eq!(booking.player, "player1@turfsys.com");
    }

    #[test]
    fn test_parse_config_file() {
        let toml_str = r#"
[booking]
cancellation_window_hours = 12

[[seed.users]]
email = "p@x.io"
password = "secret"
name = "Pat"
role = "player"

[[seed.turfs]]
name = "Cage"
location = "Roof"

[[seed.slots]]
turf = 1
start_in_minutes = 30
booked_by = "p@x.io"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.engine().unwrap().cancellation_window_hours(), 12);

        let seed = config.seed();
        assert_eq!(seed.turfs[0].status, TurfStatus::Available);
        assert_eq!(seed.slots[0].duration_minutes, 60);

        let dir = seed.build(&config.engine().unwrap(), now()).unwrap();
        assert!(dir.authenticate("p@x.io", "secret").is_ok());
        assert_eq!(dir.bookings_for("p@x.io").count(), 1);
    }

    #[test]
    fn test_validate_bad_seed() {
        let mut seed = SeedConfig::builtin();
        seed.users.push(seed.users[0].clone());
        seed.slots[0].turf = 5;
        seed.slots[1].booked_by = Some("coach1@turfsys.com".to_string());
        let config = Config {
            booking: BookingConfig {
                cancellation_window_hours: Some(0),
            },
            seed: Some(seed),
        };

        let errors = config.validate().unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "booking.cancellation_window_hours",
                "seed.users[3].email",
                "seed.slots[0].turf",
                "seed.slots[1].booked_by",
            ]
        );
    }

    #[test]
    fn test_validate_out_of_range_numbers() {
        let config: Config =
            toml::from_str("[booking]\ncancellation_window_hours = 9223372036854775807\n").unwrap();
        let errors = config.validate().unwrap_err();
        assert_eq!(errors[0].field, "booking.cancellation_window_hours");
        assert!(config.engine().is_err());

        let mut seed = SeedConfig::builtin();
        seed.slots[0].start_in_minutes = i64::MAX;
        seed.slots[1].duration_minutes = i64::MAX;
        let config = Config {
            booking: BookingConfig::default(),
            seed: Some(seed),
        };
        let errors = config.validate().unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "seed.slots[0].start_in_minutes",
                "seed.slots[1].duration_minutes",
            ]
        );
    }

    #[test]
    fn test_build_rejects_out_of_range_times() {
        let mut seed = SeedConfig::builtin();
        seed.slots[0].start_in_minutes = i64::MAX;
        let err = seed.build(&BookingEngine::default(), now()).unwrap_err();
        assert_eq!(err.to_string(), "seed.slots[0]: start out of range");

        let mut seed = SeedConfig::builtin();
        seed.slots[1].duration_minutes = i64::MAX;
        let err = seed.build(&BookingEngine::default(), now()).unwrap_err();
        assert_eq!(err.to_string(), "seed.slots[1]: duration out of range");
    }

    #[test]
    fn test_build_rejects_unknown_turf() {
        let mut seed = SeedConfig::builtin();
        seed.slots[0].turf = 0;
        let err = seed.build(&BookingEngine::default(), now()).unwrap_err();
        assert!(err.to_string().contains("seed.slots[0]"));
    }

    #[test]
    fn test_merge_layers() {
        let dir = tempfile::tempdir().unwrap();
        let user = dir.path().join("user.toml");
        let project = dir.path().join("project.toml");
        let missing = dir.path().join("missing.toml");
        std::fs::write(
            &user,
            "[booking]\ncancellation_window_hours = 48\n\n[seed]\nusers = []\n",
        )
        .unwrap();
        std::fs::write(&project, "[booking]\ncancellation_window_hours = 6\n").unwrap();

        let config = Config::load_layers(&[user, project, missing]).unwrap();
        assert_eq!(config.booking.cancellation_window_hours(), 6);
        // The user layer's seed survives a later layer without one
        assert!(config.seed.as_ref().unwrap().users.is_empty());
    }

    #[test]
    fn test_load_from_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[booking\n").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }
}
