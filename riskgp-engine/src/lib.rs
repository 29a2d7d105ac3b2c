//! RISK: Global Power engine
//!
//! Platform-agnostic core for the turn-based grand-strategy simulation:
//! the phase-gated setup pipeline (lobby through turn order), the
//! file-backed state store, and the deterministic consequence derivation
//! core that converts raw per-actor event history into normalized indices
//! and audited behavioral tags.

pub mod consequence;
pub mod numbers;
pub mod pipeline;
pub mod seed;
pub mod store;

// Re-export commonly used types
pub use consequence::{
    ActionEvent, ConsequenceIndices, ConsequenceSignals, ConsequenceState, ConsequenceTag,
    DOMINANCE_MARGIN, EvidenceItem, ExtractError, TagSet, extract_consequences,
};
pub use consequence::extract::DEFAULT_WINDOW;
pub use pipeline::{
    CountriesDoc, CountryAssignment, EconomyModel, GameMode, OrderMethod, PhaseError,
    PipelinePhase, ResourcePacket, ResourcesDoc, Roster, SeatResources, Session, TurnOrderDoc,
    assign_countries, fix_turn_order, issue_resources, normalize_pool, seat_players,
};
pub use seed::derive_seed;
pub use store::{StateStore, StoreError};
