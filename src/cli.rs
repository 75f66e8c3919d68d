use crate::{
    admin,
    booking::BookingEngine,
    coach,
    directory::Directory,
    error::{BookingError, BookingResult},
    model::{Turf, User},
    policy::{self, Action},
    transcript::Transcript,
    Args,
};
use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::cell::RefCell;

const INPUT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

pub struct Context {
    pub args: Args,
    pub session_id: String,
    pub transcript: RefCell<Option<Transcript>>,
    pub tracing: RefCell<bool>,
    pub directory: RefCell<Directory>,
    pub engine: BookingEngine,
}

/// Source of interactive input. `Ok(None)` means the user backed out
/// (Ctrl-C / Ctrl-D).
pub trait Input {
    fn prompt(&mut self, prompt: &str) -> Result<Option<String>>;

    /// Like `prompt`, but the line must not be kept in history
    fn prompt_secret(&mut self, prompt: &str) -> Result<Option<String>> {
        self.prompt(prompt)
    }
}

fn read_line(editor: &mut DefaultEditor, prompt: &str, history: bool) -> Result<Option<String>> {
    match editor.readline(prompt) {
        Ok(line) => {
            let line = line.trim().to_string();
            if history && !line.is_empty() {
                editor.add_history_entry(line.as_str())?;
            }
            Ok(Some(line))
        }
        Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl Input for DefaultEditor {
    fn prompt(&mut self, prompt: &str) -> Result<Option<String>> {
        read_line(self, prompt, true)
    }

    fn prompt_secret(&mut self, prompt: &str) -> Result<Option<String>> {
        read_line(self, prompt, false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Logout,
    Exit,
}

fn trace(ctx: &Context, label: &str, content: &str) {
    if *ctx.tracing.borrow() {
        eprintln!("[TRACE:{}] {}", label, content);
    }
}

/// Write a transcript event; a failed write only warns
fn record(ctx: &Context, write: impl FnOnce(&mut Transcript) -> Result<()>) {
    if let Some(transcript) = ctx.transcript.borrow_mut().as_mut() {
        if let Err(e) = write(transcript) {
            eprintln!("Warning: failed to write transcript: {}", e);
        }
    }
}

pub fn run_repl(ctx: Context) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    println!("=== Football Turf Management System ===");
    println!("Type /help for commands, /exit to quit");
    run_session(&ctx, &mut rl)
}

/// Login loop. Returns when the user exits or input ends.
pub fn run_session(ctx: &Context, input: &mut dyn Input) -> Result<()> {
    let (users, turfs, slots) = {
        let dir = ctx.directory.borrow();
        (dir.users().len(), dir.turfs().len(), dir.slots().len())
    };
    record(ctx, |t| t.session_start(users, turfs, slots));

    loop {
        let Some(email) = input.prompt("\nEmail: ")? else {
            return Ok(());
        };
        if email.is_empty() {
            continue;
        }
        if email.starts_with('/') {
            if handle_command(ctx, &email, None) {
                return Ok(());
            }
            continue;
        }
        let Some(password) = input.prompt_secret("Password: ")? else {
            return Ok(());
        };

        let auth = ctx
            .directory
            .borrow()
            .authenticate(&email, &password)
            .cloned();
        match auth {
            Ok(user) => {
                println!("Welcome {}!", user.name());
                trace(ctx, "login", &format!("{} as {}", user.email(), user.role()));
                record(ctx, |t| t.login_ok(user.email(), user.role()));
                if main_menu(ctx, input, &user)? == Flow::Exit {
                    return Ok(());
                }
            }
            Err(e) => {
                println!("Login Failed: {}", e);
                record(ctx, |t| t.login_failed(&email));
            }
        }
    }
}

fn main_menu(ctx: &Context, input: &mut dyn Input, user: &User) -> Result<Flow> {
    loop {
        println!("\n===== Main Menu =====");
        for (i, action) in Action::ALL.iter().enumerate() {
            println!("{}. {}", i + 1, action.menu_label());
        }
        let Some(choice) = input.prompt("Enter choice: ")? else {
            logout(ctx, user);
            return Ok(Flow::Logout);
        };
        if choice.starts_with('/') {
            if handle_command(ctx, &choice, Some(user)) {
                return Ok(Flow::Exit);
            }
            continue;
        }

        let Some(action) = Action::from_choice(&choice) else {
            println!("Invalid choice. Try again.");
            continue;
        };
        if let Err(e) = policy::authorize(user.role(), action) {
            println!("{}", e);
            record(ctx, |t| t.access_denied(user.email(), user.role(), action.verb()));
            continue;
        }

        match action {
            Action::ViewTurfs => print_turfs_and_slots(&ctx.directory.borrow()),
            Action::BookSlot => player_menu(ctx, input, user)?,
            Action::SchedulePractice => coach_menu(ctx, input, user)?,
            Action::ManageTurfs => admin_menu(ctx, input)?,
            Action::Logout => {
                logout(ctx, user);
                return Ok(Flow::Logout);
            }
        }
    }
}

fn logout(ctx: &Context, user: &User) {
    println!("Logging out...");
    record(ctx, |t| t.logout(user.email()));
}

/// Handle a slash command. Returns true when the program should exit.
fn handle_command(ctx: &Context, cmd: &str, user: Option<&User>) -> bool {
    let parts: Vec<&str> = cmd.splitn(2, ' ').collect();
    match parts[0] {
        "/exit" | "/quit" => return true,
        "/help" => {
            println!("Commands:");
            println!("  /exit           - quit");
            println!("  /help           - show commands");
            println!("  /session        - show session info");
            println!("  /trace          - toggle tracing");
        }
        "/session" => {
            println!("Session: {}", ctx.session_id);
            if let Some(path) = &ctx.args.config {
                println!("Config: {}", path.display());
            }
            match ctx.transcript.borrow().as_ref() {
                Some(t) => println!("Transcript: {:?}", t.path),
                None => println!("Transcript: off"),
            }
            println!(
                "Cancellation window: {}h",
                ctx.engine.cancellation_window_hours()
            );
            if let Some(user) = user {
                println!("Logged in: {} <{}> ({})", user.name(), user.email(), user.role());
            }
        }
        "/trace" => {
            let mut t = ctx.tracing.borrow_mut();
            *t = !*t;
            println!("Tracing: {}", if *t { "on" } else { "off" });
        }
        _ => println!("Unknown command: {}", parts[0]),
    }
    false
}

fn print_turfs(dir: &Directory) {
    println!("\n--- All Turfs ---");
    for turf in dir.turfs() {
        println!("{}", turf);
    }
}

fn print_turfs_and_slots(dir: &Directory) {
    println!("\n--- All Turfs & Slots ---");
    for turf in dir.turfs() {
        println!("{}", turf);
        for slot in dir.slots_for_turf(&turf.id) {
            println!("   {}", slot);
        }
    }
}

// Player

fn player_menu(ctx: &Context, input: &mut dyn Input, player: &User) -> Result<()> {
    loop {
        println!("\n===== Player Menu =====");
        println!("1. Book Slot");
        println!("2. Cancel Booking");
        println!("3. View My Bookings");
        println!("4. Back");
        let Some(choice) = input.prompt("Enter choice: ")? else {
            return Ok(());
        };
        match choice.as_str() {
            "1" => book_slot(ctx, input, player)?,
            "2" => cancel_booking(ctx, input, player)?,
            "3" => view_bookings(ctx, player),
            "4" => return Ok(()),
            _ => println!("Invalid choice. Try again."),
        }
    }
}

fn book_slot(ctx: &Context, input: &mut dyn Input, player: &User) -> Result<()> {
    println!("\n--- Available Slots ---");
    for slot in ctx.directory.borrow().available_slots() {
        println!("{}", slot);
    }
    let Some(slot_id) = input.prompt("Enter Slot ID to book: ")? else {
        return Ok(());
    };

    let result = ctx
        .engine
        .book_slot(&mut ctx.directory.borrow_mut(), player, &slot_id, Utc::now());
    match result {
        Ok(booking) => {
            println!("Booking successful: {}", booking);
            trace(ctx, "book", &format!("{} -> {}", booking.id, booking.slot_id));
            record(ctx, |t| t.booking_created(&booking));
        }
        Err(e) => reject(ctx, player, &slot_id, &e),
    }
    Ok(())
}

fn cancel_booking(ctx: &Context, input: &mut dyn Input, player: &User) -> Result<()> {
    let Some(slot_id) = input.prompt("Enter Slot ID to cancel: ")? else {
        return Ok(());
    };

    let result = ctx
        .engine
        .cancel_booking(&mut ctx.directory.borrow_mut(), player, &slot_id, Utc::now());
    match result {
        Ok(booking) => {
            println!("Booking cancelled: {}", booking.id);
            trace(ctx, "cancel", &format!("{} on {}", booking.id, booking.slot_id));
            record(ctx, |t| t.booking_cancelled(&booking));
        }
        Err(e) => reject(ctx, player, &slot_id, &e),
    }
    Ok(())
}

fn reject(ctx: &Context, player: &User, slot_id: &str, error: &BookingError) {
    println!("Error: {}", error);
    trace(ctx, "reject", &format!("{} on {}", error.code(), slot_id));
    record(ctx, |t| t.booking_rejected(player.email(), slot_id, error));
}

fn view_bookings(ctx: &Context, player: &User) {
    let dir = ctx.directory.borrow();
    let mut any = false;
    for booking in dir.bookings_for(player.email()) {
        any = true;
        println!("{}", booking);
    }
    if !any {
        println!("No bookings.");
    }
}

// Coach

fn coach_menu(ctx: &Context, input: &mut dyn Input, user: &User) -> Result<()> {
    loop {
        println!("\n===== Coach Menu =====");
        println!("1. View All Turfs & Slots");
        println!("2. Schedule Practice");
        println!("3. Back");
        let Some(choice) = input.prompt("Enter choice: ")? else {
            return Ok(());
        };
        match choice.as_str() {
            "1" => print_turfs_and_slots(&ctx.directory.borrow()),
            "2" => {
                let Some(slot_id) = input.prompt("Enter Slot ID to schedule practice: ")? else {
                    continue;
                };
                let dir = ctx.directory.borrow();
                match coach::schedule_practice(&dir, &slot_id) {
                    Ok(slot) => {
                        println!("Practice scheduled on Slot {}", slot.id);
                        record(ctx, |t| t.practice_scheduled(user.email(), &slot.id));
                    }
                    Err(e) => println!("Error: {}", e),
                }
            }
            "3" => return Ok(()),
            _ => println!("Invalid choice. Try again."),
        }
    }
}

// Admin

fn admin_menu(ctx: &Context, input: &mut dyn Input) -> Result<()> {
    loop {
        println!("\n===== Turf Admin Menu =====");
        println!("1. Add/Remove Turf");
        println!("2. Mark Turf Under Maintenance");
        println!("3. Mark Turf Available");
        println!("4. Add Slot");
        println!("5. Back");
        let Some(choice) = input.prompt("Enter choice: ")? else {
            return Ok(());
        };
        match choice.as_str() {
            "1" => manage_turfs(ctx, input)?,
            "2" => set_turf_status(ctx, input, admin::mark_maintenance)?,
            "3" => set_turf_status(ctx, input, admin::mark_available)?,
            "4" => add_slot(ctx, input)?,
            "5" => return Ok(()),
            _ => println!("Invalid choice. Try again."),
        }
    }
}

fn manage_turfs(ctx: &Context, input: &mut dyn Input) -> Result<()> {
    println!("\n--- Manage Turfs ---");
    println!("1. Add Turf");
    println!("2. Remove Turf");
    let Some(option) = input.prompt("Enter choice: ")? else {
        return Ok(());
    };

    match option.as_str() {
        "1" => {
            let Some(name) = input.prompt("Enter Turf Name: ")? else {
                return Ok(());
            };
            let Some(location) = input.prompt("Enter Location: ")? else {
                return Ok(());
            };
            let turf = admin::add_turf(&mut ctx.directory.borrow_mut(), &name, &location);
            println!("New Turf added: {}", turf);
            trace(ctx, "turf", &format!("added {}", turf.id));
            record(ctx, |t| t.turf_added(&turf));
        }
        "2" => {
            print_turfs(&ctx.directory.borrow());
            let Some(id) = input.prompt("Enter Turf ID to Remove: ")? else {
                return Ok(());
            };
            let result = admin::remove_turf(&mut ctx.directory.borrow_mut(), &id);
            match result {
                Ok(turf) => {
                    println!("Turf removed successfully.");
                    trace(ctx, "turf", &format!("removed {}", turf.id));
                    record(ctx, |t| t.turf_removed(&turf));
                }
                Err(e) => println!("Error: {}", e),
            }
        }
        _ => println!("Invalid choice. Going back."),
    }
    Ok(())
}

fn set_turf_status(
    ctx: &Context,
    input: &mut dyn Input,
    apply: fn(&mut Directory, &str) -> BookingResult<Turf>,
) -> Result<()> {
    print_turfs(&ctx.directory.borrow());
    let Some(id) = input.prompt("Enter Turf ID: ")? else {
        return Ok(());
    };
    let result = apply(&mut ctx.directory.borrow_mut(), &id);
    match result {
        Ok(turf) => {
            println!("Turf updated: {}", turf);
            trace(ctx, "turf", &format!("{} -> {}", turf.id, turf.status.as_str()));
            record(ctx, |t| t.turf_status(&turf));
        }
        Err(e) => println!("Error: {}", e),
    }
    Ok(())
}

fn add_slot(ctx: &Context, input: &mut dyn Input) -> Result<()> {
    print_turfs(&ctx.directory.borrow());
    let Some(turf_id) = input.prompt("Enter Turf ID: ")? else {
        return Ok(());
    };
    let Some(start) = input.prompt("Start (YYYY-MM-DD HH:MM, UTC): ")? else {
        return Ok(());
    };
    let Some(minutes) = input.prompt("Duration in minutes: ")? else {
        return Ok(());
    };

    let Some(start) = parse_start(&start) else {
        println!("Error: expected a start time like 2026-01-31 18:00");
        return Ok(());
    };
    let Some(end) = minutes
        .parse::<i64>()
        .ok()
        .and_then(Duration::try_minutes)
        .and_then(|d| start.checked_add_signed(d))
    else {
        println!("Error: duration must be a whole number of minutes");
        return Ok(());
    };

    let result = admin::add_slot(&mut ctx.directory.borrow_mut(), &turf_id, start, end);
    match result {
        Ok(slot) => {
            println!("New Slot added: {}", slot);
            trace(ctx, "slot", &format!("added {} on {}", slot.id, slot.turf_id));
            record(ctx, |t| t.slot_added(&slot));
        }
        Err(e) => println!("Error: {}", e),
    }
    Ok(())
}

fn parse_start(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s.trim(), INPUT_TIME_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Role, SlotStatus, TurfStatus};
    use clap::Parser;
    use std::collections::VecDeque;

    /// Replays canned lines, then reports end of input
    struct Script {
        lines: VecDeque<String>,
        secret_prompts: Vec<String>,
    }

    impl Script {
        fn new(lines: &[&str]) -> Self {
            Self {
                lines: lines.iter().map(|l| l.to_string()).collect(),
                secret_prompts: Vec::new(),
            }
        }
    }

    impl Input for Script {
        fn prompt(&mut self, _prompt: &str) -> Result<Option<String>> {
            Ok(self.lines.pop_front())
        }

        fn prompt_secret(&mut self, prompt: &str) -> Result<Option<String>> {
            self.secret_prompts.push(prompt.to_string());
            self.prompt(prompt)
        }
    }

    fn context() -> Context {
        let mut dir = Directory::new();
        dir.add_user(User::new("player1@turfsys.com", "pass", "Kinga", Role::Player));
        dir.add_user(User::new("coach1@turfsys.com", "pass", "Tabassum", Role::Coach));
        dir.add_user(User::new("manager1@turfsys.com", "pass", "Messi", Role::Admin));
        dir.add_turf("Main Field", "Stadium A", TurfStatus::Available);
        let start = Utc::now() + Duration::hours(2);
        dir.add_slot("T1", start, start + Duration::hours(1)).unwrap();

        Context {
            args: Args::parse_from(["turfbook", "--no-transcript"]),
            session_id: "test".to_string(),
            transcript: RefCell::new(None),
            tracing: RefCell::new(false),
            directory: RefCell::new(dir),
            engine: BookingEngine::default(),
        }
    }

    #[test]
    fn test_player_books_and_cancels() {
        let ctx = context();
        let mut script = Script::new(&[
            "player1@turfsys.com",
            "pass",
            "2", // player menu
            "1",
            "S1",
        ]);
        run_session(&ctx, &mut script).unwrap();
        {
            let dir = ctx.directory.borrow();
            assert_eq!(dir.find_slot("S1").unwrap().status, SlotStatus::Booked);
            assert_eq!(dir.bookings_for("player1@turfsys.com").count(), 1);
        }

        let mut script = Script::new(&["player1@turfsys.com", "pass", "2", "2", "S1"]);
        run_session(&ctx, &mut script).unwrap();
        let dir = ctx.directory.borrow();
        assert_eq!(dir.find_slot("S1").unwrap().status, SlotStatus::Available);
        assert!(dir.bookings().is_empty());
    }

    #[test]
    fn test_password_read_as_secret() {
        let ctx = context();
        let mut script = Script::new(&["player1@turfsys.com", "pass"]);
        run_session(&ctx, &mut script).unwrap();
        assert_eq!(script.secret_prompts, vec!["Password: ".to_string()]);
    }

    #[test]
    fn test_wrong_password_does_not_log_in() {
        let ctx = context();
        // With a failed login, "2" / "1" / "S1" are read as email and password
        let mut script = Script::new(&["player1@turfsys.com", "nope", "2", "1", "S1"]);
        run_session(&ctx, &mut script).unwrap();
        assert!(ctx.directory.borrow().bookings().is_empty());
    }

    #[test]
    fn test_coach_cannot_manage_turfs() {
        let ctx = context();
        let mut script = Script::new(&[
            "coach1@turfsys.com",
            "pass",
            "4", // denied at the main menu
            "1", // view turfs
            "5", // logout
            "/exit",
        ]);
        run_session(&ctx, &mut script).unwrap();
        assert_eq!(ctx.directory.borrow().turfs().len(), 1);
    }

    #[test]
    fn test_admin_adds_and_removes_turfs() {
        let ctx = context();
        let mut script = Script::new(&[
            "manager1@turfsys.com",
            "pass",
            "4",
            "1",
            "1",
            "Indoor",
            "Hall C",
            "1",
            "2",
            "T9", // unknown, list unchanged
            "2",
            "T1",
            "4",
            "T2",
            "2026-09-01 18:00",
            "90",
            "5",
            "5",
        ]);
        run_session(&ctx, &mut script).unwrap();

        let dir = ctx.directory.borrow();
        assert!(dir.find_turf("T1").unwrap().is_under_maintenance());
        assert_eq!(dir.turfs().len(), 2);
        let slot = dir.find_slot("S2").unwrap();
        assert_eq!(slot.turf_id, "T2");
        assert_eq!(slot.end - slot.start, Duration::minutes(90));
    }

    #[test]
    fn test_exit_from_main_menu() {
        let ctx = context();
        let mut script = Script::new(&["player1@turfsys.com", "pass", "/exit", "2", "1", "S1"]);
        run_session(&ctx, &mut script).unwrap();
        assert!(ctx.directory.borrow().bookings().is_empty());
    }

    #[test]
    fn test_trace_toggle() {
        let ctx = context();
        assert!(!handle_command(&ctx, "/trace", None));
        assert!(*ctx.tracing.borrow());
        assert!(handle_command(&ctx, "/quit", None));
    }

    #[test]
    fn test_parse_start() {
        let start = parse_start("2026-09-01 18:30").unwrap();
        assert_eq!(start.to_rfc3339(), "2026-09-01T18:30:00+00:00");
        assert!(parse_start("tomorrow").is_none());
    }
}
