//! Session document and pipeline step tracking.

use serde::{Deserialize, Serialize};

use crate::pipeline::PhaseError;
use crate::seed::derive_seed;

/// How many seats are human-driven.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameMode {
    /// One human, remaining seats AI-driven.
    #[default]
    Solo,
    /// Multiple humans sharing one machine.
    Hotseat,
}

impl std::fmt::Display for GameMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameMode::Solo => write!(f, "SOLO"),
            GameMode::Hotseat => write!(f, "HOTSEAT"),
        }
    }
}

/// Pipeline step the session has completed.
///
/// Serialized as the bare step number for artifact compatibility; the
/// setup pipeline compresses the conceptual game phases into steps 0..=4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PipelinePhase {
    /// Session created, nobody seated yet.
    Lobby,
    /// Roster registered.
    Seated,
    /// Every seat holds a country.
    CountriesAssigned,
    /// Starting resources issued.
    ResourcesIssued,
    /// Turn order fixed; setup complete.
    TurnOrderFixed,
}

impl PipelinePhase {
    /// Numeric pipeline step, as persisted in `session.json`.
    #[must_use]
    pub const fn step(self) -> u8 {
        match self {
            PipelinePhase::Lobby => 0,
            PipelinePhase::Seated => 1,
            PipelinePhase::CountriesAssigned => 2,
            PipelinePhase::ResourcesIssued => 3,
            PipelinePhase::TurnOrderFixed => 4,
        }
    }

    /// Human label for router output and journal lines.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            PipelinePhase::Lobby => "lobby",
            PipelinePhase::Seated => "player setup",
            PipelinePhase::CountriesAssigned => "country selection",
            PipelinePhase::ResourcesIssued => "initial resources",
            PipelinePhase::TurnOrderFixed => "turn order",
        }
    }
}

impl TryFrom<u8> for PipelinePhase {
    type Error = String;

    fn try_from(step: u8) -> Result<Self, Self::Error> {
        match step {
            0 => Ok(PipelinePhase::Lobby),
            1 => Ok(PipelinePhase::Seated),
            2 => Ok(PipelinePhase::CountriesAssigned),
            3 => Ok(PipelinePhase::ResourcesIssued),
            4 => Ok(PipelinePhase::TurnOrderFixed),
            other => Err(format!("unknown pipeline step {other}")),
        }
    }
}

impl From<PipelinePhase> for u8 {
    fn from(phase: PipelinePhase) -> Self {
        phase.step()
    }
}

/// The root session document. Owns the pipeline step, the mode, and the
/// deterministic seed every shuffle in the pipeline draws from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub phase: PipelinePhase,
    pub mode: GameMode,
    /// Stored on first use; derived from `created_utc` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u32>,
    pub created_utc: String,
}

impl Session {
    /// Fresh lobby session. `created_utc` is caller-supplied so the engine
    /// stays clock-free and replays stay reproducible.
    #[must_use]
    pub fn new(mode: GameMode, created_utc: impl Into<String>) -> Self {
        Self {
            phase: PipelinePhase::Lobby,
            mode,
            seed: None,
            created_utc: created_utc.into(),
        }
    }

    /// Gate check used by every phase transition.
    ///
    /// # Errors
    ///
    /// Returns [`PhaseError::WrongPhase`] when the session is not at
    /// `expected`.
    pub fn expect_phase(&self, expected: PipelinePhase) -> Result<(), PhaseError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(PhaseError::WrongPhase {
                expected: expected.step(),
                found: self.phase.step(),
            })
        }
    }

    /// Copy with the pipeline step advanced. Transitions replace the
    /// session document; they never mutate the loaded one.
    #[must_use]
    pub fn advanced_to(&self, phase: PipelinePhase) -> Self {
        Self {
            phase,
            ..self.clone()
        }
    }

    /// The session seed, deriving and pinning one from `created_utc` on
    /// first use. Returns the (possibly updated) session alongside the
    /// seed so callers can persist the pin.
    #[must_use]
    pub fn ensure_seed(&self) -> (Self, u32) {
        match self.seed {
            Some(seed) => (self.clone(), seed),
            None => {
                let seed = derive_seed(&self.created_utc);
                let pinned = Self {
                    seed: Some(seed),
                    ..self.clone()
                };
                (pinned, seed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_round_trips_through_step_number() {
        let json = serde_json::to_string(&PipelinePhase::ResourcesIssued).unwrap();
        assert_eq!(json, "3");
        let back: PipelinePhase = serde_json::from_str("3").unwrap();
        assert_eq!(back, PipelinePhase::ResourcesIssued);
        assert!(serde_json::from_str::<PipelinePhase>("9").is_err());
    }

    #[test]
    fn expect_phase_reports_both_steps() {
        let session = Session::new(GameMode::Solo, "2026-08-29T00:00:00+00:00");
        let err = session
            .expect_phase(PipelinePhase::ResourcesIssued)
            .unwrap_err();
        assert_eq!(err, PhaseError::WrongPhase { expected: 3, found: 0 });
    }

    #[test]
    fn ensure_seed_pins_once_and_is_stable() {
        let session = Session::new(GameMode::Solo, "2026-08-29T00:00:00+00:00");
        let (pinned, seed) = session.ensure_seed();
        let (again, same) = pinned.ensure_seed();
        assert_eq!(pinned.seed, Some(seed));
        assert_eq!(seed, same);
        assert_eq!(pinned, again);
        assert!(seed < 1 << 31);
    }
}
