mod admin;
mod booking;
mod cli;
mod coach;
mod config;
mod directory;
mod error;
mod model;
mod policy;
mod transcript;

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use std::cell::RefCell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "turfbook", about = "Football turf booking management")]
pub struct Args {
    #[arg(long, env = "TURFBOOK_CONFIG", help = "Config file path")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Session transcripts directory")]
    pub transcripts_dir: Option<PathBuf>,

    #[arg(long, help = "Do not write a session transcript")]
    pub no_transcript: bool,

    #[arg(long, help = "Trace store mutations to stderr")]
    pub trace: bool,

    #[arg(long, help = "Debug output (print effective settings)")]
    pub debug: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let cfg = if let Some(config_path) = &args.config {
        config::Config::load_from(config_path)?
    } else {
        config::Config::load()?
    };

    if let Err(errors) = cfg.validate() {
        for error in &errors {
            eprintln!("Config error {}", error);
        }
        return Err(anyhow::anyhow!(
            "Invalid configuration ({} errors)",
            errors.len()
        ));
    }

    if args.debug {
        eprintln!(
            "[DEBUG] Cancellation window: {}h",
            cfg.booking.cancellation_window_hours()
        );
        eprintln!(
            "[DEBUG] Seed: {}",
            if cfg.seed.is_some() { "config" } else { "built-in" }
        );
    }

    let engine = cfg.engine()?;
    let directory = cfg.seed().build(&engine, Utc::now())?;

    if args.debug {
        eprintln!(
            "[DEBUG] Loaded {} users, {} turfs, {} slots, {} bookings",
            directory.users().len(),
            directory.turfs().len(),
            directory.slots().len(),
            directory.bookings().len()
        );
    }

    let session_id = uuid::Uuid::new_v4().to_string();
    let transcript = if args.no_transcript {
        None
    } else {
        let root = std::env::current_dir()?;
        let transcripts_dir = args
            .transcripts_dir
            .clone()
            .unwrap_or_else(|| root.join(".turfbook").join("sessions"));
        std::fs::create_dir_all(&transcripts_dir)?;
        let transcript_path = transcripts_dir.join(format!("{}.jsonl", session_id));
        Some(transcript::Transcript::new(
            &transcript_path,
            &session_id,
            &root,
        )?)
    };

    let trace = args.trace;
    let ctx = cli::Context {
        args,
        session_id,
        transcript: RefCell::new(transcript),
        tracing: RefCell::new(trace),
        directory: RefCell::new(directory),
        engine,
    };

    cli::run_repl(ctx)
}
