//! Phase-gated setup pipeline: lobby, seating, country assignment,
//! initial resources, turn order.
//!
//! Each phase is a pure transition over already-loaded artifacts. The
//! transitions never touch the filesystem; the store and the CLI own I/O,
//! so every gate here is testable without a state directory.

use thiserror::Error;

pub mod countries;
pub mod players;
pub mod resources;
pub mod session;
pub mod turn_order;

pub use countries::{CountriesDoc, CountryAssignment, assign_countries, normalize_pool};
pub use players::{Roster, seat_players};
pub use resources::{EconomyModel, ResourcePacket, ResourcesDoc, SeatResources, issue_resources};
pub use session::{GameMode, PipelinePhase, Session};
pub use turn_order::{OrderMethod, TurnOrderDoc, fix_turn_order};

/// Gate violations raised by the phase transitions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PhaseError {
    /// The session is not at the pipeline step this phase requires.
    #[error("session at pipeline step {found}, expected {expected}")]
    WrongPhase { expected: u8, found: u8 },

    /// Turn order is fixed once; re-running the phase is refused rather
    /// than silently reshuffled.
    #[error("turn order already exists; refusing to overwrite")]
    TurnOrderExists,

    /// Roster must seat at least one player and agree with its own lists.
    #[error("invalid roster: {reason}")]
    InvalidRoster { reason: String },

    /// The country pool cannot cover every seat.
    #[error("country pool too small: have {available}, need {needed}")]
    PoolTooSmall { available: usize, needed: usize },

    /// Seat assignments must cover seats 1..=N exactly once each.
    #[error("seat assignments invalid: missing seats {missing:?}, extra seats {extra:?}")]
    AssignmentsInvalid { missing: Vec<u32>, extra: Vec<u32> },
}
