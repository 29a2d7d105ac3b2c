//! Stress scenarios driven against the engine library in-process.
//!
//! Each run gets its own temp state directory so sessions cannot bleed
//! into each other; the concurrent scenario leans on that isolation.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, ensure};
use tokio::task::JoinSet;

use riskgp_engine::{
    ActionEvent, DEFAULT_WINDOW, GameMode, PipelinePhase, Roster, Session, StateStore,
    assign_countries, extract_consequences, fix_turn_order, issue_resources, seat_players,
};

use crate::report::ScenarioReport;

/// Pinned creation stamp for determinism runs; the session seed derives
/// from it, so two runs with the same stamp must replay identically.
const PINNED_STAMP: &str = "2026-01-01T00:00:00+00:00";

/// Drive the full setup pipeline inside `root`, returning the finished
/// store for artifact inspection.
pub fn run_pipeline_once(root: &Path, seats: u32, stamp: &str) -> Result<StateStore> {
    let store = StateStore::new(root.join("state"));

    let session = Session::new(GameMode::Solo, stamp);
    store.save_session(&session).context("saving session")?;

    let ais = (1..=seats).map(|n| format!("AI-{n}")).collect();
    let roster = Roster::new(vec![], ais).context("building roster")?;
    let session = seat_players(&session, &roster).context("seating players")?;
    store.save_roster(&roster)?;
    store.save_session(&session)?;

    let (session, countries) =
        assign_countries(&session, &roster, stamp).context("assigning countries")?;
    store.save_countries(&countries)?;
    store.save_session(&session)?;

    let (session, resources) =
        issue_resources(&session, &roster, &countries, stamp).context("issuing resources")?;
    store.save_resources(&resources)?;
    store.save_session(&session)?;

    let (session, turn_order) = fix_turn_order(
        &session,
        &roster,
        &countries,
        store.turn_order_exists(),
        stamp,
    )
    .context("fixing turn order")?;
    store.save_turn_order(&turn_order)?;
    store.save_session(&session)?;

    let finished = store.load_session().context("reloading session")?;
    ensure!(
        finished.phase == PipelinePhase::TurnOrderFixed,
        "pipeline ended at step {}, expected 4",
        finished.phase.step()
    );
    Ok(store)
}

/// Sequential throughput: N isolated full-pipeline runs, timed.
pub fn sequential(runs: usize, seats: u32) -> ScenarioReport {
    let mut durations = Vec::with_capacity(runs);
    let mut failures = 0usize;
    for n in 0..runs {
        let started = Instant::now();
        let outcome = tempfile::tempdir()
            .context("creating temp dir")
            .and_then(|dir| run_pipeline_once(dir.path(), seats, &format!("run-{n}")).map(|_| ()));
        match outcome {
            Ok(()) => durations.push(started.elapsed()),
            Err(err) => {
                log::error!("sequential run {n} failed: {err:#}");
                failures += 1;
            }
        }
    }
    ScenarioReport::new("sequential", runs, failures, &durations)
}

/// Concurrent sessions: M pipelines at once, each in its own directory.
pub async fn concurrent(sessions: usize, seats: u32) -> ScenarioReport {
    let mut set: JoinSet<Result<Duration>> = JoinSet::new();
    for n in 0..sessions {
        set.spawn_blocking(move || {
            let started = Instant::now();
            let dir = tempfile::tempdir().context("creating temp dir")?;
            run_pipeline_once(dir.path(), seats, &format!("session-{n}"))?;
            Ok(started.elapsed())
        });
    }

    let mut durations = Vec::with_capacity(sessions);
    let mut failures = 0usize;
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(Ok(duration)) => durations.push(duration),
            Ok(Err(err)) => {
                log::error!("concurrent session failed: {err:#}");
                failures += 1;
            }
            Err(err) => {
                log::error!("concurrent session panicked: {err}");
                failures += 1;
            }
        }
    }
    ScenarioReport::new("concurrent", sessions, failures, &durations)
}

/// Determinism packet: replay the pipeline with a pinned stamp and
/// byte-compare the seeded artifacts, then double-extract consequences
/// over a fixed event history and byte-compare the reports.
pub fn determinism(seats: u32) -> ScenarioReport {
    let mut failures = 0usize;
    let mut durations = Vec::new();
    let mut report = |outcome: Result<Duration>, what: &str| match outcome {
        Ok(duration) => durations.push(duration),
        Err(err) => {
            log::error!("determinism check '{what}' failed: {err:#}");
            failures += 1;
        }
    };

    report(pipeline_replay_is_identical(seats), "pipeline replay");
    report(extraction_replay_is_identical(), "extraction replay");

    let mut out = ScenarioReport::new("determinism", 2, failures, &durations);
    out.note(format!("pinned stamp {PINNED_STAMP}"));
    out
}

fn pipeline_replay_is_identical(seats: u32) -> Result<Duration> {
    let started = Instant::now();
    let dir_a = tempfile::tempdir()?;
    let dir_b = tempfile::tempdir()?;
    let store_a = run_pipeline_once(dir_a.path(), seats, PINNED_STAMP)?;
    let store_b = run_pipeline_once(dir_b.path(), seats, PINNED_STAMP)?;

    for artifact in ["countries.json", "turn_order.json", "resources.json"] {
        let a = std::fs::read_to_string(store_a.path_of(artifact))?;
        let b = std::fs::read_to_string(store_b.path_of(artifact))?;
        ensure!(a == b, "{artifact} differs between replayed sessions");
    }
    Ok(started.elapsed())
}

fn extraction_replay_is_identical() -> Result<Duration> {
    let started = Instant::now();
    let events = fixture_events();
    let first = serde_json::to_string(&extract_consequences(&events, 10, DEFAULT_WINDOW)?)?;
    let second = serde_json::to_string(&extract_consequences(&events, 10, DEFAULT_WINDOW)?)?;
    ensure!(first == second, "consequence reports differ between runs");
    ensure!(
        first.contains("DOMINANT"),
        "fixture lost its dominant actor"
    );
    Ok(started.elapsed())
}

fn fixture_events() -> Vec<ActionEvent> {
    let mut events = Vec::new();
    for (turn, ok, delta, cost) in [
        (6i64, true, 3.0, 1.0),
        (7, true, 4.0, 1.2),
        (8, false, -1.0, 0.8),
        (9, true, 5.0, 1.5),
        (10, true, 4.0, 1.3),
    ] {
        events.push(ActionEvent {
            turn: Some(turn),
            actor: Some("A".to_string()),
            ok: Some(ok),
            cost: Some(cost),
            delta: Some(delta),
            magnitude: None,
        });
    }
    for (turn, ok, delta, cost) in [
        (6i64, true, 2.0, 0.5),
        (7, false, -2.0, 0.7),
        (8, false, -3.0, 0.6),
        (9, false, -2.5, 0.9),
        (10, false, -3.5, 1.0),
    ] {
        events.push(ActionEvent {
            turn: Some(turn),
            actor: Some("B".to_string()),
            ok: Some(ok),
            cost: Some(cost),
            delta: Some(delta),
            magnitude: None,
        });
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_runs_clean_in_a_temp_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = run_pipeline_once(dir.path(), 3, PINNED_STAMP).unwrap();
        assert!(store.turn_order_exists());
    }

    #[test]
    fn determinism_packet_passes() {
        let report = determinism(4);
        assert!(report.passed, "notes: {:?}", report.notes);
    }
}
