//! Turn order (pipeline step 3 -> 4). Structure only: establishes the
//! deterministic seat order, no actions or resolution.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::pipeline::PhaseError;
use crate::pipeline::countries::CountriesDoc;
use crate::pipeline::players::Roster;
use crate::pipeline::session::{GameMode, PipelinePhase, Session};

/// How the order was produced. Only one method exists; the field is
/// persisted so future methods stay distinguishable in old artifacts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderMethod {
    #[default]
    SeededShuffle,
}

/// The persisted turn-order artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnOrderDoc {
    pub phase: u8,
    pub mode: GameMode,
    pub method: OrderMethod,
    pub seed: u32,
    pub seats_total: u32,
    /// Seats in play order.
    pub order: Vec<u32>,
    /// Sorted by seat for stable serialization.
    pub seat_to_country: BTreeMap<u32, String>,
    pub created_utc: String,
}

/// Fix the turn order with a seeded shuffle of seats 1..=N.
///
/// Strict gates, in order: session must be exactly at the resources step;
/// an existing turn-order artifact is never overwritten; assignments must
/// cover seats 1..=N exactly once each with non-blank countries. The seed
/// comes from the session, derived and pinned on first use.
///
/// # Errors
///
/// [`PhaseError::WrongPhase`], [`PhaseError::TurnOrderExists`],
/// [`PhaseError::InvalidRoster`], or [`PhaseError::AssignmentsInvalid`].
pub fn fix_turn_order(
    session: &Session,
    roster: &Roster,
    countries: &CountriesDoc,
    turn_order_exists: bool,
    created_utc: &str,
) -> Result<(Session, TurnOrderDoc), PhaseError> {
    session.expect_phase(PipelinePhase::ResourcesIssued)?;
    if turn_order_exists {
        return Err(PhaseError::TurnOrderExists);
    }
    roster.validate()?;

    let mut seat_to_country: BTreeMap<u32, String> = BTreeMap::new();
    for assignment in &countries.assignments {
        let country = assignment.country.trim();
        if assignment.seat > 0 && !country.is_empty() {
            seat_to_country.insert(assignment.seat, country.to_string());
        }
    }

    let expected: Vec<u32> = roster.seats().collect();
    let missing: Vec<u32> = expected
        .iter()
        .copied()
        .filter(|seat| !seat_to_country.contains_key(seat))
        .collect();
    let extra: Vec<u32> = seat_to_country
        .keys()
        .copied()
        .filter(|seat| *seat > roster.seats_total)
        .collect();
    if !missing.is_empty() || !extra.is_empty() {
        return Err(PhaseError::AssignmentsInvalid { missing, extra });
    }

    let (session, seed) = session.ensure_seed();
    let mut rng = ChaCha8Rng::seed_from_u64(u64::from(seed));
    let mut order = expected;
    order.shuffle(&mut rng);

    let doc = TurnOrderDoc {
        phase: PipelinePhase::TurnOrderFixed.step(),
        mode: session.mode,
        method: OrderMethod::SeededShuffle,
        seed,
        seats_total: roster.seats_total,
        order,
        seat_to_country,
        created_utc: created_utc.to_string(),
    };

    Ok((session.advanced_to(PipelinePhase::TurnOrderFixed), doc))
}
