//! Initial resource issue (pipeline step 2 -> 3).

use serde::{Deserialize, Serialize};

use crate::pipeline::PhaseError;
use crate::pipeline::countries::CountriesDoc;
use crate::pipeline::players::Roster;
use crate::pipeline::session::{GameMode, PipelinePhase, Session};

/// Which starting-economy rules produced the packets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EconomyModel {
    /// Every seat starts with the same packet, regardless of country.
    #[default]
    EqualStart,
}

impl std::fmt::Display for EconomyModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EconomyModel::EqualStart => write!(f, "EQUAL_START"),
        }
    }
}

/// Starting stockpile for one seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePacket {
    pub money: i64,
    pub military_points: i64,
    pub influence_points: i64,
    pub energy: i64,
    pub food: i64,
    pub materials: i64,
}

impl ResourcePacket {
    /// The flat starting packet used by [`EconomyModel::EqualStart`].
    #[must_use]
    pub const fn equal_start() -> Self {
        Self {
            money: 100,
            military_points: 50,
            influence_points: 25,
            energy: 10,
            food: 10,
            materials: 10,
        }
    }
}

/// One seat's entry in the resources artifact. The country is optional so
/// a doc produced from partial assignments still round-trips; validation
/// against full coverage happens at the turn-order gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatResources {
    pub seat: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub resources: ResourcePacket,
}

/// The persisted resources artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcesDoc {
    pub phase: u8,
    pub mode: GameMode,
    pub economy_model: EconomyModel,
    pub seats_total: u32,
    pub by_seat: Vec<SeatResources>,
    pub created_utc: String,
}

/// Issue the equal-start packet to every seat.
///
/// # Errors
///
/// Returns [`PhaseError::WrongPhase`] unless countries are assigned, or
/// [`PhaseError::InvalidRoster`] when the roster state is unusable.
pub fn issue_resources(
    session: &Session,
    roster: &Roster,
    countries: &CountriesDoc,
    created_utc: &str,
) -> Result<(Session, ResourcesDoc), PhaseError> {
    session.expect_phase(PipelinePhase::CountriesAssigned)?;
    roster.validate()?;
    if countries.assignments.is_empty() {
        return Err(PhaseError::InvalidRoster {
            reason: "countries artifact holds no assignments".to_string(),
        });
    }

    let by_seat = roster
        .seats()
        .map(|seat| SeatResources {
            seat,
            country: countries.country_for(seat).map(str::to_string),
            resources: ResourcePacket::equal_start(),
        })
        .collect();

    let doc = ResourcesDoc {
        phase: PipelinePhase::ResourcesIssued.step(),
        mode: session.mode,
        economy_model: EconomyModel::EqualStart,
        seats_total: roster.seats_total,
        by_seat,
        created_utc: created_utc.to_string(),
    };

    Ok((session.advanced_to(PipelinePhase::ResourcesIssued), doc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::countries::assign_countries;

    fn setup(seats: u32) -> (Session, Roster, CountriesDoc) {
        let roster = Roster::new(
            vec!["ALICE".to_string()],
            (2..=seats).map(|n| format!("AI-{n}")).collect(),
        )
        .unwrap();
        let session = Session::new(GameMode::Solo, "2026-08-29T00:00:00+00:00")
            .advanced_to(PipelinePhase::Seated);
        let (session, countries) = assign_countries(&session, &roster, "t").unwrap();
        (session, roster, countries)
    }

    #[test]
    fn every_seat_gets_the_equal_start_packet() {
        let (session, roster, countries) = setup(4);
        let (next, doc) = issue_resources(&session, &roster, &countries, "t").unwrap();
        assert_eq!(next.phase, PipelinePhase::ResourcesIssued);
        assert_eq!(doc.by_seat.len(), 4);
        assert_eq!(doc.economy_model, EconomyModel::EqualStart);
        for entry in &doc.by_seat {
            assert_eq!(entry.resources, ResourcePacket::equal_start());
            assert!(entry.country.is_some());
        }
    }

    #[test]
    fn wrong_phase_is_blocked() {
        let (_, roster, countries) = setup(2);
        let lobby = Session::new(GameMode::Solo, "t");
        let err = issue_resources(&lobby, &roster, &countries, "t").unwrap_err();
        assert_eq!(err, PhaseError::WrongPhase { expected: 2, found: 0 });
    }

    #[test]
    fn empty_assignments_are_rejected() {
        let (session, roster, mut countries) = setup(2);
        countries.assignments.clear();
        let err = issue_resources(&session, &roster, &countries, "t").unwrap_err();
        assert!(matches!(err, PhaseError::InvalidRoster { .. }));
    }
}
