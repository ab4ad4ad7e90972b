use liftlog_core::*;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "liftlog")]
#[command(about = "Workout session tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start and drive a workout session (default)
    Run {
        /// Free-form training type label
        #[arg(long, default_value = "strength")]
        training_type: String,

        /// Target duration in minutes
        #[arg(long, default_value_t = 45)]
        duration: u32,

        /// Body-focus tags used to rank recommended exercises
        #[arg(long)]
        focus: Vec<String>,

        /// Explicit exercises, overriding the recommendation ranking
        #[arg(long)]
        exercise: Vec<String>,

        /// Auto-complete (for testing) - run a scripted session and save it
        #[arg(long)]
        auto_complete: bool,
    },

    /// Resume an interrupted session from its persisted snapshot
    Resume,

    /// Aggregate statistics over workout history
    Stats {
        /// History window in days
        #[arg(long, default_value_t = 90)]
        days: i64,
    },

    /// Roll up the session log to CSV
    Rollup {
        /// Clean up processed log files after rollup
        #[arg(long)]
        cleanup: bool,
    },
}

/// File layout under the data directory
struct DataPaths {
    sessions_log: PathBuf,
    mutations_log: PathBuf,
    active_snapshot: PathBuf,
    csv_archive: PathBuf,
    wal_dir: PathBuf,
}

impl DataPaths {
    fn new(data_dir: &PathBuf) -> Self {
        let wal_dir = data_dir.join("wal");
        Self {
            sessions_log: wal_dir.join("sessions.wal"),
            mutations_log: wal_dir.join("set_mutations.wal"),
            active_snapshot: wal_dir.join("active_session.json"),
            csv_archive: data_dir.join("sessions.csv"),
            wal_dir,
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    liftlog_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());

    match cli.command {
        Some(Commands::Run {
            training_type,
            duration,
            focus,
            exercise,
            auto_complete,
        }) => cmd_run(
            data_dir,
            training_type,
            duration,
            focus,
            exercise,
            auto_complete,
            &config,
        ),
        Some(Commands::Resume) => cmd_resume(data_dir, &config),
        Some(Commands::Stats { days }) => cmd_stats(data_dir, days, &config),
        Some(Commands::Rollup { cleanup }) => cmd_rollup(data_dir, cleanup),
        None => cmd_resume(data_dir, &config),
    }
}

fn build_engine(paths: &DataPaths, config: &Config) -> Result<SessionEngine> {
    std::fs::create_dir_all(&paths.wal_dir)?;

    let catalog = build_default_catalog();
    let errors = catalog.validate();
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::Config("Invalid exercise catalog".into()));
    }

    let store = JsonlStore::new(&paths.sessions_log, &paths.mutations_log);
    Ok(SessionEngine::new(
        Box::new(store),
        catalog,
        EngineOptions::from(config),
    ))
}

fn cmd_run(
    data_dir: PathBuf,
    training_type: String,
    duration: u32,
    focus: Vec<String>,
    exercise: Vec<String>,
    auto_complete: bool,
    config: &Config,
) -> Result<()> {
    let paths = DataPaths::new(&data_dir);
    let mut engine = build_engine(&paths, config)?;

    let focus = if focus.is_empty() {
        vec!["upper".to_string()]
    } else {
        focus
    };
    let recommended = if exercise.is_empty() {
        get_default_catalog().rank_for_focus(&focus, 3)
    } else {
        exercise
    };
    if recommended.is_empty() {
        return Err(Error::Config(format!(
            "no exercises matched focus {:?}; pass --exercise explicitly",
            focus
        )));
    }

    let training_config = TrainingConfig {
        training_type,
        target_duration_minutes: duration,
        body_focus: focus,
        tags: vec![],
        recommended_exercises: recommended.clone(),
    };

    engine.start(training_config)?;
    engine.set_last_active_route("/workout/active");
    println!("Session started: {} exercises planned", recommended.len());

    if auto_complete {
        run_scripted(&mut engine, &recommended, &paths)
    } else {
        run_interactive(&mut engine, &recommended, &paths)
    }
}

/// Scripted session used by tests and demos: two sets per exercise,
/// moderate ratings, rest driven through the engine tick.
fn run_scripted(engine: &mut SessionEngine, exercises: &[String], paths: &DataPaths) -> Result<()> {
    for name in exercises {
        engine.add_exercise(name.clone(), Some(ExerciseSet::new(40.0, 8, 45)))?;
        engine.add_set(name, None)?;

        for set_number in 1..=2 {
            let rec = engine.complete_set(name, set_number, Some(7))?;
            // Drive the rest countdown to completion
            while engine.rest_remaining_seconds().is_some() {
                engine.tick();
            }
            tracing::debug!("{} set {} done, next at {}kg", name, set_number, rec.weight);
        }
        state::save_snapshot(&engine.snapshot(), &paths.active_snapshot)?;
    }

    finish_and_report(engine, paths)
}

fn run_interactive(
    engine: &mut SessionEngine,
    planned: &[String],
    paths: &DataPaths,
) -> Result<()> {
    println!("Planned exercises: {}", planned.join(", "));
    println!();

    let mut last_prompt = Instant::now();
    loop {
        display_session(engine);
        let action = prompt_action()?;

        // Count the seconds the user spent at the prompt
        advance_clock(engine, &mut last_prompt);

        match action {
            UserAction::CompleteNext(rpe) => {
                let Some((name, set_number)) = next_pending_set(engine) else {
                    println!("No pending sets - add an exercise or finish.");
                    continue;
                };
                match engine.complete_set(&name, set_number, rpe) {
                    Ok(rec) => {
                        println!(
                            "✓ {} set {} done. Next: {}kg x {} (rest {}s)",
                            name, set_number, rec.weight, rec.reps, rec.rest_seconds
                        );
                    }
                    Err(e) => println!("Cannot complete set: {}", e),
                }
                state::save_snapshot(&engine.snapshot(), &paths.active_snapshot)?;
            }

            UserAction::AddExercise(name) => {
                match engine.add_exercise(name.clone(), Some(ExerciseSet::new(40.0, 8, 45))) {
                    Ok(()) => println!("Added {}", name),
                    Err(e) => println!("Cannot add exercise: {}", e),
                }
                state::save_snapshot(&engine.snapshot(), &paths.active_snapshot)?;
            }

            UserAction::AddSet(name) => {
                match engine.add_set(&name, None) {
                    Ok(number) => println!("Added {} set {}", name, number),
                    Err(e) => println!("Cannot add set: {}", e),
                }
                state::save_snapshot(&engine.snapshot(), &paths.active_snapshot)?;
            }

            UserAction::Finish => {
                return finish_and_report(engine, paths);
            }

            UserAction::Discard => {
                engine.finish(SaveDecision::Discard)?;
                state::clear_snapshot(&paths.active_snapshot)?;
                println!("Session discarded.");
                return Ok(());
            }

            UserAction::Quit => {
                // Leave the snapshot behind so `liftlog resume` can pick
                // the session back up
                state::save_snapshot(&engine.snapshot(), &paths.active_snapshot)?;
                println!("Session parked. Run `liftlog resume` to continue.");
                return Ok(());
            }
        }
    }
}

fn finish_and_report(engine: &mut SessionEngine, paths: &DataPaths) -> Result<()> {
    match engine.finish(SaveDecision::Save) {
        Ok(FinishOutcome::Saved { session_id, summary }) => {
            state::clear_snapshot(&paths.active_snapshot)?;
            println!();
            println!("✓ Session saved ({})", session_id);
            println!("  Volume:  {:.0} kg", summary.total_volume);
            println!("  Density: {:.1} kg/min", summary.density);
            println!("  Sets:    {}", summary.completed_sets);
            if !summary.muscle_focus.is_empty() {
                let focus: Vec<String> = summary
                    .muscle_focus
                    .iter()
                    .map(|(muscle, sets)| format!("{:?} x{}", muscle, sets))
                    .collect();
                println!("  Muscles: {}", focus.join(", "));
            }
            Ok(())
        }
        Ok(FinishOutcome::Discarded) => {
            state::clear_snapshot(&paths.active_snapshot)?;
            Ok(())
        }
        Err(Error::NothingToSave) => {
            println!("Nothing to save yet - no completed sets.");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

fn cmd_resume(data_dir: PathBuf, config: &Config) -> Result<()> {
    let paths = DataPaths::new(&data_dir);

    let Some(snapshot) = state::load_snapshot(&paths.active_snapshot)? else {
        println!("No session to resume.");
        return Ok(());
    };

    let mut engine = build_engine(&paths, config)?;
    match engine.restore(snapshot) {
        Ok(()) => {
            let snap = engine.snapshot();
            println!(
                "Resumed {:?} session at {:.0}s elapsed, {} exercises.",
                snap.status,
                snap.elapsed_seconds,
                snap.exercises.len()
            );
            if let Some(route) = &snap.last_active_route {
                println!("Last screen: {}", route);
            }
            let planned: Vec<String> = snap.exercises.iter().map(|e| e.name.clone()).collect();
            run_interactive(&mut engine, &planned, &paths)
        }
        Err(e) => {
            // Fatal but recoverable: explain, clear, return to setup
            println!("Stored session could not be recovered: {}", e);
            println!("It has been cleared - start a new session with `liftlog run`.");
            state::clear_snapshot(&paths.active_snapshot)?;
            Ok(())
        }
    }
}

fn cmd_stats(data_dir: PathBuf, days: i64, config: &Config) -> Result<()> {
    let paths = DataPaths::new(&data_dir);
    let sessions = load_recent_sessions(&paths.sessions_log, &paths.csv_archive, days)?;

    if sessions.is_empty() {
        println!("No sessions in the last {} days.", days);
        return Ok(());
    }

    let catalog = get_default_catalog();
    let body_weight = config.athlete.body_weight_kg;

    println!("╭─────────────────────────────────────────╮");
    println!("│  TRAINING STATS ({} days)", days);
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  Sessions: {}", sessions.len());

    let mut total_volume = 0.0;
    let mut total_minutes = 0.0;
    for session in &sessions {
        total_volume += metrics::total_volume(&session.exercises, catalog, body_weight);
        total_minutes += session.duration_seconds as f64 / 60.0;
    }
    println!("  Volume:   {:.0} kg", total_volume);
    if total_minutes > 0.0 {
        println!("  Density:  {:.1} kg/min", total_volume / total_minutes);
    }

    let all_exercises: Vec<ExerciseEntry> = sessions
        .iter()
        .flat_map(|s| s.exercises.iter().cloned())
        .collect();

    let focus = metrics::muscle_focus(&all_exercises, catalog);
    if !focus.is_empty() {
        println!();
        println!("  Muscle focus (completed sets):");
        for (muscle, sets) in &focus {
            println!("    {:<12} {}", format!("{:?}", muscle), "▪".repeat(*sets as usize));
        }
    }

    let breakdown = metrics::composition(&all_exercises, catalog);
    if !breakdown.is_empty() {
        println!();
        println!("  Composition:");
        for (category, sets) in &breakdown {
            println!("    {:<12} {} sets", format!("{:?}", category), sets);
        }
    }

    let buckets = metrics::time_of_day_histogram(&sessions);
    if !buckets.is_empty() {
        println!();
        println!("  Time of day (minutes):");
        for (bucket, seconds) in &buckets {
            println!("    {:<12} {:.0}", format!("{:?}", bucket), *seconds as f64 / 60.0);
        }
    }

    let records = metrics::personal_records(&sessions);
    if !records.is_empty() {
        println!();
        println!("  Personal records:");
        for record in &records {
            match record.improvement_percent {
                Some(pct) => println!(
                    "    {} {}kg on {} (+{:.0}%)",
                    record.exercise,
                    record.weight,
                    record.achieved_at.format("%Y-%m-%d"),
                    pct
                ),
                None => println!(
                    "    {} {}kg on {} (first)",
                    record.exercise,
                    record.weight,
                    record.achieved_at.format("%Y-%m-%d")
                ),
            }
        }
    }

    let score = metrics::quality_score(
        &sessions,
        chrono::Utc::now(),
        catalog,
        body_weight,
        config.athlete.weekly_volume_target,
    );
    println!();
    println!("  Quality score: {:.0}/100", score.total());
    println!(
        "    consistency {:.0}  volume {:.0}  variety {:.0}  intensity {:.0}",
        score.consistency, score.volume, score.variety, score.intensity
    );

    Ok(())
}

fn cmd_rollup(data_dir: PathBuf, cleanup: bool) -> Result<()> {
    let paths = DataPaths::new(&data_dir);

    if !paths.sessions_log.exists() {
        println!("No session log found - nothing to roll up.");
        return Ok(());
    }

    let count = csv_archive::log_to_csv_and_archive(&paths.sessions_log, &paths.csv_archive)?;

    println!("✓ Rolled up {} sessions to CSV", count);
    println!("  CSV: {}", paths.csv_archive.display());

    if cleanup {
        let cleaned = csv_archive::cleanup_processed_logs(&paths.wal_dir)?;
        if cleaned > 0 {
            println!("✓ Cleaned up {} processed log files", cleaned);
        }
    }

    Ok(())
}

// ============================================================================
// Interactive helpers
// ============================================================================

enum UserAction {
    CompleteNext(Option<u8>),
    AddExercise(String),
    AddSet(String),
    Finish,
    Discard,
    Quit,
}

fn display_session(engine: &SessionEngine) {
    let snapshot = engine.snapshot();
    println!("─────────────────────────────────────────");
    println!(
        "Elapsed {:.0}s{}",
        snapshot.elapsed_seconds,
        engine
            .rest_remaining_seconds()
            .map(|r| format!("  (resting {}s)", r))
            .unwrap_or_default()
    );
    for entry in &snapshot.exercises {
        let done = entry.sets.iter().filter(|s| s.completed).count();
        println!("  {} [{}/{} sets]", entry.name, done, entry.sets.len());
        for (i, set) in entry.sets.iter().enumerate() {
            let mark = if set.completed { "x" } else { " " };
            println!(
                "    [{}] set {}: {}kg x {} (rest {}s)",
                mark,
                i + 1,
                set.weight,
                set.reps,
                set.rest_seconds
            );
        }
    }
}

fn prompt_action() -> Result<UserAction> {
    println!("─────────────────────────────────────────");
    println!("Enter = complete next set (append RPE 1-10, e.g. '7')");
    println!("  'a <name>' add exercise, 's <name>' add set");
    println!("  'f' finish & save, 'd' discard, 'q' park for later");
    print!("> ");
    io::stdout().flush()?;

    let mut input = String::new();
    let bytes = io::stdin().read_line(&mut input)?;
    if bytes == 0 {
        // EOF: treat like parking the session
        return Ok(UserAction::Quit);
    }
    let input = input.trim();

    let action = match input {
        "" => UserAction::CompleteNext(None),
        "f" => UserAction::Finish,
        "d" => UserAction::Discard,
        "q" => UserAction::Quit,
        other => {
            if let Ok(rpe) = other.parse::<u8>() {
                UserAction::CompleteNext(Some(rpe))
            } else if let Some(name) = other.strip_prefix("a ") {
                UserAction::AddExercise(name.trim().to_string())
            } else if let Some(name) = other.strip_prefix("s ") {
                UserAction::AddSet(name.trim().to_string())
            } else {
                UserAction::CompleteNext(None)
            }
        }
    };

    Ok(action)
}

/// First uncompleted set in ledger order
fn next_pending_set(engine: &SessionEngine) -> Option<(String, u32)> {
    let snapshot = engine.snapshot();
    for entry in &snapshot.exercises {
        for (i, set) in entry.sets.iter().enumerate() {
            if !set.completed {
                return Some((entry.name.clone(), i as u32 + 1));
            }
        }
    }
    None
}

/// Feed the seconds spent waiting at the prompt into the engine, one tick
/// per second (capped so a machine left overnight does not spin)
fn advance_clock(engine: &mut SessionEngine, last: &mut Instant) {
    let elapsed = last.elapsed().as_secs().min(8 * 60 * 60);
    for _ in 0..elapsed {
        engine.tick();
    }
    *last = Instant::now();
}
