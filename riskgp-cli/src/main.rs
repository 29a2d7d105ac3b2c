//! RISK: Global Power phase router.
//!
//! Routes a session directory through the setup pipeline one phase at a
//! time and exposes consequence extraction over the persisted event
//! history. All game logic lives in `riskgp-engine`; this binary owns
//! argument parsing, file wiring, the journal, and console output.

mod journal;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::{SecondsFormat, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

use riskgp_engine::{
    DEFAULT_WINDOW, GameMode, PipelinePhase, Roster, Session, StateStore, assign_countries,
    extract_consequences, fix_turn_order, issue_resources, seat_players,
};

use journal::Journal;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    /// One human, remaining seats AI-driven
    Solo,
    /// Multiple humans on one machine
    Hotseat,
}

impl From<ModeArg> for GameMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Solo => GameMode::Solo,
            ModeArg::Hotseat => GameMode::Hotseat,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "riskgp", version)]
#[command(about = "RISK: Global Power - session setup pipeline and consequence reports")]
struct Args {
    /// State directory holding the pipeline artifacts
    #[arg(long, default_value = "state")]
    state_dir: PathBuf,

    /// Directory for the append-only engine journal
    #[arg(long, default_value = "logs")]
    logs_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a fresh lobby session (step 0)
    Init {
        #[arg(long, value_enum, default_value_t = ModeArg::Solo)]
        mode: ModeArg,
        /// Replace an existing session and its artifacts
        #[arg(long)]
        force: bool,
    },
    /// Register the roster (step 1)
    Players {
        /// Human player names, comma-separated
        #[arg(long, default_value = "")]
        humans: String,
        /// Number of AI seats to add after the humans
        #[arg(long, default_value_t = 0)]
        ais: u32,
    },
    /// Assign one country per seat (step 2)
    Countries,
    /// Issue equal starting resources (step 3)
    Resources,
    /// Fix the seeded turn order (step 4)
    TurnOrder,
    /// Run whichever phase the session is waiting on
    Run,
    /// Show the session's pipeline position
    Status,
    /// Derive consequence states from the persisted event history
    Consequences {
        /// Turn to anchor the analysis window on
        #[arg(long)]
        turn: i64,
        /// Window size in turns
        #[arg(long, default_value_t = DEFAULT_WINDOW)]
        window: u32,
    },
}

fn now_utc() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, false)
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_uppercase)
        .collect()
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let store = StateStore::new(&args.state_dir);
    let journal = Journal::new(&args.logs_dir);

    match args.command {
        Command::Init { mode, force } => cmd_init(&store, &journal, mode.into(), force),
        Command::Players { humans, ais } => cmd_players(&store, &journal, &humans, ais),
        Command::Countries => cmd_countries(&store, &journal),
        Command::Resources => cmd_resources(&store, &journal),
        Command::TurnOrder => cmd_turn_order(&store, &journal),
        Command::Run => cmd_run(&store, &journal),
        Command::Status => cmd_status(&store),
        Command::Consequences { turn, window } => cmd_consequences(&store, &journal, turn, window),
    }
}

fn cmd_init(store: &StateStore, journal: &Journal, mode: GameMode, force: bool) -> Result<()> {
    println!("{}", "RISK: Global Power - Lobby".bold());
    journal.record("PHASE 0 START");

    if store.session_exists() {
        if !force {
            journal.record("PHASE 0 BLOCKED (SESSION EXISTS)");
            bail!(
                "session already exists in {}; use --force to replace it",
                store.state_dir().display()
            );
        }
        store
            .reset_pipeline()
            .context("clearing previous session artifacts")?;
        journal.record("PHASE 0 RESET");
    }

    let session = Session::new(mode, now_utc());
    store
        .save_session(&session)
        .context("writing session artifact")?;

    println!("Session created ({mode} mode). Next: player setup.");
    journal.record("PHASE 0 COMPLETE");
    Ok(())
}

fn cmd_players(store: &StateStore, journal: &Journal, humans: &str, ais: u32) -> Result<()> {
    println!("{}", "RISK: Global Power - Player Setup".bold());
    journal.record("PHASE 1 START");

    let session = store.load_session().context("loading session")?;
    let humans = split_csv(humans);
    let first_ai = humans.len() + 1;
    let ais: Vec<String> = (0..ais)
        .map(|n| format!("AI-{}", first_ai + n as usize))
        .collect();

    let roster = match Roster::new(humans, ais) {
        Ok(roster) => roster,
        Err(err) => {
            journal.record("PHASE 1 FAIL (BAD ROSTER)");
            return Err(err).context("building roster");
        }
    };

    let advanced = match seat_players(&session, &roster) {
        Ok(advanced) => advanced,
        Err(err) => {
            journal.record("PHASE 1 BLOCKED (WRONG PHASE)");
            return Err(err).context("seating players");
        }
    };

    store.save_roster(&roster).context("writing roster")?;
    store.save_session(&advanced).context("writing session")?;

    println!("Seated {} players:", roster.seats_total);
    for (seat, name) in roster.humans.iter().chain(&roster.ais).enumerate() {
        println!("  Seat {}: {}", seat + 1, name);
    }
    println!("\nPhase 1 complete. Next: country selection.");
    journal.record("PHASE 1 COMPLETE");
    Ok(())
}

fn cmd_countries(store: &StateStore, journal: &Journal) -> Result<()> {
    println!("{}", "RISK: Global Power - Country Selection".bold());
    journal.record("PHASE 2 START");

    let session = store.load_session().context("loading session")?;
    let roster = store.load_roster().context("loading roster")?;

    let (advanced, doc) = match assign_countries(&session, &roster, &now_utc()) {
        Ok(out) => out,
        Err(err) => {
            journal.record("PHASE 2 BLOCKED");
            return Err(err).context("assigning countries");
        }
    };

    store.save_countries(&doc).context("writing countries")?;
    store.save_session(&advanced).context("writing session")?;

    println!("\nCountry Assignments:");
    for entry in &doc.assignments {
        println!("  Seat {}: {}", entry.seat, entry.country.as_str().green());
    }
    println!("\nPhase 2 complete. Next: initial resources.");
    journal.record("PHASE 2 COMPLETE");
    Ok(())
}

fn cmd_resources(store: &StateStore, journal: &Journal) -> Result<()> {
    println!("{}", "RISK: Global Power - Initial Resources".bold());
    journal.record("PHASE 3 START");

    let session = store.load_session().context("loading session")?;
    let roster = store.load_roster().context("loading roster")?;
    let countries = store.load_countries().context("loading countries")?;

    let (advanced, doc) = match issue_resources(&session, &roster, &countries, &now_utc()) {
        Ok(out) => out,
        Err(err) => {
            journal.record("PHASE 3 BLOCKED");
            return Err(err).context("issuing resources");
        }
    };

    store.save_resources(&doc).context("writing resources")?;
    store.save_session(&advanced).context("writing session")?;

    println!("\nInitial Resources ({}):", doc.economy_model);
    for entry in &doc.by_seat {
        let country = entry.country.as_deref().unwrap_or("-");
        let r = entry.resources;
        println!(
            "  Seat {}: {} -> money {}, military {}, influence {}, energy {}, food {}, materials {}",
            entry.seat, country, r.money, r.military_points, r.influence_points, r.energy, r.food,
            r.materials
        );
    }
    println!("\nPhase 3 complete. Next: turn order.");
    journal.record("PHASE 3 COMPLETE");
    Ok(())
}

fn cmd_turn_order(store: &StateStore, journal: &Journal) -> Result<()> {
    println!("{}", "RISK: Global Power - Turn Order".bold());
    journal.record("PHASE 4 START");

    let session = store.load_session().context("loading session")?;
    let roster = store.load_roster().context("loading roster")?;
    let countries = store.load_countries().context("loading countries")?;

    let (advanced, doc) = match fix_turn_order(
        &session,
        &roster,
        &countries,
        store.turn_order_exists(),
        &now_utc(),
    ) {
        Ok(out) => out,
        Err(err) => {
            journal.record("PHASE 4 BLOCKED");
            return Err(err).context("fixing turn order");
        }
    };

    store.save_turn_order(&doc).context("writing turn order")?;
    store.save_session(&advanced).context("writing session")?;

    println!("\nTurn Order (seeded, seed {}):", doc.seed);
    for (position, seat) in doc.order.iter().enumerate() {
        let country = doc
            .seat_to_country
            .get(seat)
            .map_or("-", String::as_str);
        println!("  {}. Seat {} ({})", position + 1, seat, country.green());
    }
    println!("\nPhase 4 complete. Setup finished.");
    journal.record("PHASE 4 COMPLETE");
    journal.record("ENGINE SHUTDOWN");
    Ok(())
}

fn cmd_run(store: &StateStore, journal: &Journal) -> Result<()> {
    if !store.session_exists() {
        journal.record("ROUTER: NO SESSION");
        bail!("no session found; run `riskgp init` first");
    }
    let session = store.load_session().context("loading session")?;
    match session.phase {
        PipelinePhase::Seated => cmd_countries(store, journal),
        PipelinePhase::CountriesAssigned => cmd_resources(store, journal),
        PipelinePhase::ResourcesIssued => cmd_turn_order(store, journal),
        PipelinePhase::Lobby => {
            bail!("session is in the lobby; run `riskgp players` to seat a roster")
        }
        PipelinePhase::TurnOrderFixed => {
            println!("Setup pipeline already complete.");
            Ok(())
        }
    }
}

fn cmd_status(store: &StateStore) -> Result<()> {
    if !store.session_exists() {
        println!("No session. Run `riskgp init`.");
        return Ok(());
    }
    let session = store.load_session().context("loading session")?;
    println!("{}", "Session".bold());
    println!("  mode:    {}", session.mode);
    println!(
        "  step:    {} ({})",
        session.phase.step(),
        session.phase.label()
    );
    println!("  created: {}", session.created_utc);
    match session.seed {
        Some(seed) => println!("  seed:    {seed}"),
        None => println!("  seed:    (not yet pinned)"),
    }
    Ok(())
}

fn cmd_consequences(store: &StateStore, journal: &Journal, turn: i64, window: u32) -> Result<()> {
    println!("{}", "RISK: Global Power - Consequence Report".bold());
    journal.record("CONSEQUENCES START");

    let events = store.load_events().context("loading event history")?;
    let results = extract_consequences(&events, turn, window).context("extracting consequences")?;
    store
        .save_consequences(turn, &results)
        .context("writing consequence report")?;

    if results.is_empty() {
        println!("No actors with events in the window ending at turn {turn}.");
    }
    for (actor, state) in &results {
        let tags: Vec<String> = state.tags.iter().map(ToString::to_string).collect();
        let tags = if tags.is_empty() {
            "-".to_string()
        } else {
            tags.join(", ")
        };
        println!(
            "  {} -> {} (capacity {:.3}, stability {:.3}, momentum {:+.3}, risk {:.3})",
            actor.bold(),
            tags.yellow(),
            state.indices.capacity_index,
            state.indices.stability_index,
            state.indices.momentum_index,
            state.indices.risk_index
        );
    }
    println!(
        "\nReport written to {}",
        store
            .path_of(&StateStore::consequences_file(turn))
            .display()
    );
    journal.record("CONSEQUENCES COMPLETE");
    Ok(())
}
