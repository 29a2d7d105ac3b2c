//! Deterministic consequence extraction over a windowed event history.
//!
//! A single synchronous pass with no I/O: filter events to the turn
//! window, group by actor, derive per-actor signals/indices/tags, then run
//! the relative dominance pass. Identical input always produces
//! byte-identical serialized output; the golden regression tests depend on
//! this, which is why the result map is a `BTreeMap` and every working
//! collection with serialized reach iterates in a reproducible order.

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;

use crate::consequence::{
    ActionEvent, ConsequenceIndices, ConsequenceSignals, ConsequenceState, ConsequenceTag,
    EvidenceItem, TagSet,
};
use crate::numbers::{u32_to_f64, usize_to_f64};

/// Default extraction window in turns.
pub const DEFAULT_WINDOW: u32 = 5;

/// Capacity gap the top actor needs over the runner-up to be dominant.
pub const DOMINANCE_MARGIN: f64 = 0.20;

/// Runner-up stand-in when only one actor qualifies. Deep enough that a
/// sole actor always clears the margin, finite so the margin survives
/// JSON serialization (serde_json writes non-finite floats as null).
const SOLE_ACTOR_SENTINEL: f64 = -1e9;

const CAPACITY_STRONG: f64 = 0.65;
const STABILITY_STRONG: f64 = 0.55;
const RISK_AGGRESSIVE: f64 = 0.45;
const MOMENTUM_DECLINING: f64 = -0.5;
const STABILITY_UNSTABLE: f64 = 0.35;

/// Extraction precondition violations.
///
/// Malformed event documents surface earlier, at deserialization; an
/// ill-formed window is the one thing the extractor itself refuses.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    /// A zero window makes the turn range ill-formed. Fail fast rather
    /// than clamp.
    #[error("extraction window must be at least 1, got {window}")]
    WindowTooSmall { window: u32 },
}

/// Derive one consequence record per actor with at least one event inside
/// the inclusive window `[current_turn - window + 1, current_turn]`.
///
/// Actors absent from the window are absent from the result. The returned
/// map is keyed by actor id in sorted order, so serializing it is stable
/// across runs and processes.
///
/// # Errors
///
/// Returns [`ExtractError::WindowTooSmall`] when `window == 0`.
pub fn extract_consequences(
    events: &[ActionEvent],
    current_turn: i64,
    window: u32,
) -> Result<BTreeMap<String, ConsequenceState>, ExtractError> {
    if window == 0 {
        return Err(ExtractError::WindowTooSmall { window });
    }

    let lo = current_turn - i64::from(window) + 1;
    let hi = current_turn;
    let turns_used: Vec<i64> = (lo..=hi).collect();

    // Group qualifying events by actor, keeping arrival order inside each
    // group and first-occurrence order across actors.
    let mut actor_order: Vec<String> = Vec::new();
    let mut by_actor: HashMap<String, Vec<&ActionEvent>> = HashMap::new();
    for event in events {
        let Some(turn) = event.turn else { continue };
        if turn < lo || turn > hi {
            continue;
        }
        let Some(actor) = event.actor_id() else {
            continue;
        };
        by_actor
            .entry(actor.to_string())
            .or_insert_with(|| {
                actor_order.push(actor.to_string());
                Vec::new()
            })
            .push(event);
    }

    let mut results: BTreeMap<String, ConsequenceState> = BTreeMap::new();

    for actor in &actor_order {
        let actor_events = &by_actor[actor];
        let state = derive_actor_state(actor, actor_events, current_turn, window, &turns_used);
        results.insert(actor.clone(), state);
    }

    apply_dominance(&mut results, window, &turns_used);

    Ok(results)
}

fn derive_actor_state(
    actor: &str,
    actor_events: &[&ActionEvent],
    current_turn: i64,
    window: u32,
    turns_used: &[i64],
) -> ConsequenceState {
    let attempts = actor_events.len();
    let successes = actor_events.iter().filter(|e| e.succeeded()).count();
    let failures = attempts - successes;

    let total_cost: f64 = actor_events.iter().map(|e| e.cost_or_zero()).sum();
    let net_delta: f64 = actor_events.iter().map(|e| e.delta_or_zero()).sum();
    let magnitudes: Vec<f64> = actor_events.iter().map(|e| e.magnitude_or_delta()).collect();

    let attempts_f = usize_to_f64(attempts);
    let avg_cost = total_cost / attempts_f;
    let outcome_variance = population_variance(&magnitudes);

    let signals = ConsequenceSignals {
        attempts: u32::try_from(attempts).unwrap_or(u32::MAX),
        successes: u32::try_from(successes).unwrap_or(u32::MAX),
        failures: u32::try_from(failures).unwrap_or(u32::MAX),
        net_delta,
        avg_cost,
        outcome_variance,
    };

    let success_rate = usize_to_f64(successes) / attempts_f;
    let failure_rate = usize_to_f64(failures) / attempts_f;

    let capacity_index = 0.7 * success_rate + 0.3 * (net_delta / 10.0).tanh();
    let stability_index = 1.0 / (1.0 + outcome_variance);
    let risk_index = 0.6 * failure_rate + 0.4 * (avg_cost / 10.0).tanh();
    let momentum_index = momentum(actor_events, window, turns_used);

    let indices = ConsequenceIndices {
        capacity_index,
        stability_index,
        momentum_index,
        risk_index,
        dominance_index: 0.0,
    };

    let mut tags = TagSet::new();
    let mut evidence: Vec<EvidenceItem> = Vec::new();

    if capacity_index >= CAPACITY_STRONG && stability_index >= STABILITY_STRONG {
        tags.push(ConsequenceTag::Strong);
        evidence.push(EvidenceItem::thresholded(
            "capacity_index",
            capacity_index,
            CAPACITY_STRONG,
            window,
            turns_used,
        ));
    }

    let aggressive_floor = 3u32.max(window / 2) as usize;
    if attempts >= aggressive_floor && risk_index >= RISK_AGGRESSIVE {
        tags.push(ConsequenceTag::Aggressive);
        evidence.push(EvidenceItem::thresholded(
            "risk_index",
            risk_index,
            RISK_AGGRESSIVE,
            window,
            turns_used,
        ));
    }

    if momentum_index <= MOMENTUM_DECLINING {
        tags.push(ConsequenceTag::Declining);
        evidence.push(EvidenceItem::thresholded(
            "momentum_index",
            momentum_index,
            MOMENTUM_DECLINING,
            window,
            turns_used,
        ));
    }

    if stability_index <= STABILITY_UNSTABLE {
        tags.push(ConsequenceTag::Unstable);
        evidence.push(EvidenceItem::thresholded(
            "stability_index",
            stability_index,
            STABILITY_UNSTABLE,
            window,
            turns_used,
        ));
    }

    ConsequenceState {
        actor_id: actor.to_string(),
        window,
        computed_turn: current_turn,
        signals,
        indices,
        tags,
        evidence,
    }
}

/// Discrete slope of per-turn delta sums across the window, in ascending
/// turn order. Turns with no events contribute 0.0; the denominator is
/// floored at 1 so a single-turn window stays well-defined.
fn momentum(actor_events: &[&ActionEvent], window: u32, turns_used: &[i64]) -> f64 {
    let mut per_turn: BTreeMap<i64, f64> = turns_used.iter().map(|t| (*t, 0.0)).collect();
    for event in actor_events {
        if let Some(sum) = event.turn.and_then(|turn| per_turn.get_mut(&turn)) {
            *sum += event.delta_or_zero();
        }
    }
    let first = per_turn.values().next().copied().unwrap_or(0.0);
    let last = per_turn.values().next_back().copied().unwrap_or(0.0);
    (last - first) / u32_to_f64(window.saturating_sub(1).max(1))
}

/// Population variance: mean of squared deviations from the mean.
fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let len = usize_to_f64(values.len());
    let mean = values.iter().sum::<f64>() / len;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / len
}

/// Second stage: rank by capacity and mark the top actor dominant when its
/// margin over the runner-up clears [`DOMINANCE_MARGIN`]. Replaces the
/// winning entry with a derived copy; never adds or removes actors.
///
/// A sole qualifying actor is measured against [`SOLE_ACTOR_SENTINEL`]
/// and is therefore always dominant.
fn apply_dominance(
    results: &mut BTreeMap<String, ConsequenceState>,
    window: u32,
    turns_used: &[i64],
) {
    let mut ranked: Vec<(String, f64)> = results
        .iter()
        .map(|(actor, state)| (actor.clone(), state.indices.capacity_index))
        .collect();
    if ranked.is_empty() {
        return;
    }
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    let (top_id, top_val) = ranked[0].clone();
    let second_val = ranked.get(1).map_or(SOLE_ACTOR_SENTINEL, |(_, v)| *v);
    let margin = top_val - second_val;

    if margin >= DOMINANCE_MARGIN {
        let receipt = EvidenceItem::thresholded(
            "dominance_margin",
            margin,
            DOMINANCE_MARGIN,
            window,
            turns_used,
        );
        if let Some(top) = results.get(&top_id) {
            let dominant = top.with_dominance(margin, receipt);
            results.insert(top_id, dominant);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(turn: i64, actor: &str, ok: bool, delta: f64, cost: f64) -> ActionEvent {
        ActionEvent {
            turn: Some(turn),
            actor: Some(actor.to_string()),
            ok: Some(ok),
            cost: Some(cost),
            delta: Some(delta),
            magnitude: None,
        }
    }

    #[test]
    fn empty_input_yields_empty_map() {
        let results = extract_consequences(&[], 10, DEFAULT_WINDOW).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn zero_window_fails_fast() {
        let err = extract_consequences(&[], 10, 0).unwrap_err();
        assert_eq!(err, ExtractError::WindowTooSmall { window: 0 });
    }

    #[test]
    fn out_of_window_events_are_excluded() {
        let events = vec![
            event(5, "A", true, 1.0, 0.1),  // below window
            event(11, "A", true, 1.0, 0.1), // above window
            ActionEvent {
                actor: Some("A".to_string()),
                ok: Some(true),
                ..ActionEvent::default()
            }, // no turn: never qualifies
        ];
        let results = extract_consequences(&events, 10, 5).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn blank_actor_contributes_to_nobody() {
        let events = vec![
            ActionEvent {
                turn: Some(10),
                actor: Some("  ".to_string()),
                ok: Some(true),
                ..ActionEvent::default()
            },
            ActionEvent {
                turn: Some(10),
                ..ActionEvent::default()
            },
        ];
        let results = extract_consequences(&events, 10, 5).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn failures_identity_holds() {
        let events = vec![
            event(9, "A", true, 1.0, 0.5),
            event(10, "A", false, -1.0, 0.5),
            event(10, "A", false, 0.5, 0.5),
        ];
        let results = extract_consequences(&events, 10, 5).unwrap();
        let signals = results["A"].signals;
        assert_eq!(signals.attempts, 3);
        assert_eq!(signals.successes, 1);
        assert_eq!(signals.failures, signals.attempts - signals.successes);
    }

    #[test]
    fn single_event_has_zero_variance_and_full_stability() {
        let events = vec![event(10, "A", true, 2.0, 0.1)];
        let results = extract_consequences(&events, 10, 5).unwrap();
        let state = &results["A"];
        assert!(state.signals.outcome_variance.abs() < f64::EPSILON);
        assert!((state.indices.stability_index - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn magnitude_falls_back_to_delta_for_variance() {
        let with_mag = vec![
            ActionEvent {
                magnitude: Some(3.0),
                ..event(9, "A", true, 1.0, 0.0)
            },
            ActionEvent {
                magnitude: Some(1.0),
                ..event(10, "A", true, 1.0, 0.0)
            },
        ];
        let without_mag = vec![event(9, "B", true, 3.0, 0.0), event(10, "B", true, 1.0, 0.0)];
        let mut events = with_mag;
        events.extend(without_mag);
        let results = extract_consequences(&events, 10, 5).unwrap();
        // Same spread either way: variance of [3, 1] is 1.0.
        assert!((results["A"].signals.outcome_variance - 1.0).abs() < 1e-12);
        assert!((results["B"].signals.outcome_variance - 1.0).abs() < 1e-12);
    }

    #[test]
    fn momentum_is_per_turn_slope_with_gap_turns_at_zero() {
        // Deltas only on the window edges: first sum 2.0, last sum -6.0.
        let events = vec![event(6, "A", true, 2.0, 0.0), event(10, "A", true, -6.0, 0.0)];
        let results = extract_consequences(&events, 10, 5).unwrap();
        let momentum = results["A"].indices.momentum_index;
        assert!((momentum - (-8.0 / 4.0)).abs() < 1e-12);
        assert!(results["A"].has_tag(ConsequenceTag::Declining));
    }

    #[test]
    fn momentum_window_one_uses_floored_denominator() {
        let events = vec![event(10, "A", true, 4.0, 0.0)];
        let results = extract_consequences(&events, 10, 1).unwrap();
        // Single-turn window: first == last, slope 0 over denominator 1.
        assert!(results["A"].indices.momentum_index.abs() < f64::EPSILON);
    }

    #[test]
    fn sole_actor_is_always_dominant() {
        let events = vec![event(10, "A", false, -50.0, 9.0)];
        let results = extract_consequences(&events, 10, 5).unwrap();
        let state = &results["A"];
        assert!(state.has_tag(ConsequenceTag::Dominant));
        assert!(state.indices.dominance_index > DOMINANCE_MARGIN);
        assert_eq!(state.tags.last(), Some(&ConsequenceTag::Dominant));
        let receipt = state.evidence.last().unwrap();
        assert_eq!(receipt.signal, "dominance_margin");
        assert_eq!(receipt.threshold, Some(DOMINANCE_MARGIN));
    }

    #[test]
    fn dominance_is_exclusive() {
        let events = vec![
            event(9, "A", true, 8.0, 0.2),
            event(10, "A", true, 8.0, 0.2),
            event(9, "B", false, -1.0, 0.2),
            event(10, "B", false, -1.0, 0.2),
            event(9, "C", false, -1.0, 0.2),
            event(10, "C", true, 0.5, 0.2),
        ];
        let results = extract_consequences(&events, 10, 5).unwrap();
        let dominant: Vec<_> = results
            .values()
            .filter(|s| s.indices.dominance_index > 0.0)
            .collect();
        assert_eq!(dominant.len(), 1);
        assert_eq!(dominant[0].actor_id, "A");
    }

    #[test]
    fn near_tie_produces_no_dominant() {
        let events = vec![event(10, "A", true, 1.0, 0.1), event(10, "B", true, 1.0, 0.1)];
        let results = extract_consequences(&events, 10, 5).unwrap();
        assert!(results.values().all(|s| s.indices.dominance_index == 0.0));
        assert!(
            results
                .values()
                .all(|s| !s.has_tag(ConsequenceTag::Dominant))
        );
    }

    #[test]
    fn aggressive_needs_both_volume_and_risk() {
        // Two attempts at high risk: volume floor (3) not met.
        let sparse = vec![event(9, "A", false, -1.0, 9.0), event(10, "A", false, -1.0, 9.0)];
        let results = extract_consequences(&sparse, 10, 5).unwrap();
        assert!(!results["A"].has_tag(ConsequenceTag::Aggressive));

        // Four failing attempts at real cost: both conditions hold.
        let busy = vec![
            event(7, "A", false, -1.0, 9.0),
            event(8, "A", false, -1.0, 9.0),
            event(9, "A", false, -1.0, 9.0),
            event(10, "A", false, -1.0, 9.0),
        ];
        let results = extract_consequences(&busy, 10, 5).unwrap();
        assert!(results["A"].has_tag(ConsequenceTag::Aggressive));
    }

    #[test]
    fn strong_requires_stability_too() {
        // High success and delta, but magnitudes swing hard.
        let swingy = vec![
            event(8, "A", true, 10.0, 0.1),
            event(9, "A", true, -6.0, 0.1),
            event(10, "A", true, 11.0, 0.1),
        ];
        let results = extract_consequences(&swingy, 10, 5).unwrap();
        assert!(results["A"].indices.capacity_index >= CAPACITY_STRONG);
        assert!(!results["A"].has_tag(ConsequenceTag::Strong));
        assert!(results["A"].has_tag(ConsequenceTag::Unstable));

        // Same totals delivered evenly: stable and strong.
        let steady = vec![
            event(8, "B", true, 5.0, 0.1),
            event(9, "B", true, 5.0, 0.1),
            event(10, "B", true, 5.0, 0.1),
        ];
        let results = extract_consequences(&steady, 10, 5).unwrap();
        assert!(results["B"].has_tag(ConsequenceTag::Strong));
        assert_eq!(results["B"].evidence[0].signal, "capacity_index");
        assert_eq!(results["B"].evidence[0].turns.as_deref(), Some(&[6i64, 7, 8, 9, 10][..]));
    }

    #[test]
    fn removing_out_of_window_event_changes_nothing() {
        let mut events = vec![
            event(9, "A", true, 2.0, 0.3),
            event(10, "A", false, -1.0, 0.3),
            event(10, "B", true, 1.0, 0.2),
        ];
        let baseline = extract_consequences(&events, 10, 3).unwrap();
        events.push(event(7, "A", false, -99.0, 50.0)); // outside window 3
        let with_noise = extract_consequences(&events, 10, 3).unwrap();
        assert_eq!(baseline, with_noise);
    }
}
