/// Main entry point for the habit-share report tool
///
/// Opens the data file (verifying its consistency on load), then prints the
/// given user's habits and those shared with them, each with its current
/// score. Useful to inspect or sanity-check a store without a server.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use habit_share::{default_data_file, Habit, HabitApp, HabitStorage, IdentityResolver, StaticIdentity, StoreConfig};

/// Command line arguments for the habit-share report tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the JSON data file
    /// If not provided, uses a default location in the user's home directory
    #[arg(long)]
    data: Option<PathBuf>,

    /// User whose habits to report
    #[arg(short, long)]
    user: String,

    /// Include archived habits
    #[arg(long)]
    archived: bool,

    /// Seconds a loaded document is trusted before reloading
    #[arg(long, default_value_t = 10)]
    freshness_secs: u64,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose output (implies debug)
    #[arg(short, long)]
    verbose: bool,
}

fn print_habits<S: HabitStorage, I: IdentityResolver>(
    app: &HabitApp<S, I>,
    title: &str,
    habits: &[Habit],
) -> Result<(), habit_share::AppError> {
    println!("{} ({})", title, habits.len());
    for habit in habits {
        let score = app.get_score(&habit.id)?;
        let archived = if habit.archived { " [archived]" } else { "" };
        println!(
            "  {:<30} {}x/week  score {:>4}{}  ({})",
            habit.name, habit.frequency, score, archived, habit.id
        );
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Set up logging based on command line flags
    let log_level = if args.verbose {
        "debug"
    } else if args.debug {
        "info"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!("habit_share={}", log_level))
        .with_writer(std::io::stderr) // Keep stdout for the report
        .init();

    let data_file = match args.data {
        Some(path) => path,
        None => default_data_file()?,
    };
    info!("Using data file at: {}", data_file.display());

    let config = StoreConfig::file(data_file).with_freshness(Duration::from_secs(args.freshness_secs));
    let app = habit_share::open(&config, StaticIdentity::user(args.user))?;

    let mine = app.get_my_habits(None, args.archived)?;
    print_habits(&app, "My habits", &mine)?;

    let shared = app.get_shared_habits(None)?;
    print_habits(&app, "Shared with me", &shared)?;

    Ok(())
}
