//! Roster registration (pipeline step 0 -> 1).

use serde::{Deserialize, Serialize};

use crate::pipeline::session::{PipelinePhase, Session};
use crate::pipeline::PhaseError;

/// Who occupies the seats. Seat numbers run 1..=`seats_total`, humans
/// first in list order, then AIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    pub humans: Vec<String>,
    pub ais: Vec<String>,
    pub seats_total: u32,
}

impl Roster {
    /// Build a roster from the two player lists.
    ///
    /// # Errors
    ///
    /// Returns [`PhaseError::InvalidRoster`] when no seat is filled or a
    /// name is blank.
    pub fn new(humans: Vec<String>, ais: Vec<String>) -> Result<Self, PhaseError> {
        let seats_total = u32::try_from(humans.len() + ais.len())
            .map_err(|_| PhaseError::InvalidRoster {
                reason: "too many players".to_string(),
            })?;
        let roster = Self {
            humans,
            ais,
            seats_total,
        };
        roster.validate()?;
        Ok(roster)
    }

    /// Re-check the invariants after deserialization.
    ///
    /// # Errors
    ///
    /// Returns [`PhaseError::InvalidRoster`] when the seat count is zero,
    /// disagrees with the lists, or any name is blank.
    pub fn validate(&self) -> Result<(), PhaseError> {
        if self.seats_total == 0 {
            return Err(PhaseError::InvalidRoster {
                reason: "seats_total must be at least 1".to_string(),
            });
        }
        let listed = self.humans.len() + self.ais.len();
        if listed != self.seats_total as usize {
            return Err(PhaseError::InvalidRoster {
                reason: format!(
                    "seats_total is {} but {} players are listed",
                    self.seats_total, listed
                ),
            });
        }
        if self
            .humans
            .iter()
            .chain(&self.ais)
            .any(|name| name.trim().is_empty())
        {
            return Err(PhaseError::InvalidRoster {
                reason: "player names must not be blank".to_string(),
            });
        }
        Ok(())
    }

    /// Seat numbers in order, 1-based.
    #[must_use]
    pub fn seats(&self) -> impl Iterator<Item = u32> + '_ {
        1..=self.seats_total
    }
}

/// Register the roster against a lobby session. Returns the advanced
/// session; the roster document itself is persisted by the caller.
///
/// # Errors
///
/// Returns [`PhaseError::WrongPhase`] unless the session is in the lobby,
/// or [`PhaseError::InvalidRoster`] when the roster fails validation.
pub fn seat_players(session: &Session, roster: &Roster) -> Result<Session, PhaseError> {
    session.expect_phase(PipelinePhase::Lobby)?;
    roster.validate()?;
    Ok(session.advanced_to(PipelinePhase::Seated))
}
