//! Loosely-typed action events consumed by the extractor.
//!
//! Events arrive from the surrounding simulation as JSON documents with
//! every key optional. Unknown keys are ignored; missing keys default at
//! the point of use rather than at deserialization, so a round-tripped
//! event stays byte-faithful to what the producer wrote.

use serde::{Deserialize, Serialize};

/// One recorded action by one actor on one turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ok: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnitude: Option<f64>,
}

impl ActionEvent {
    /// Actor identifier, trimmed. `None` when missing or whitespace-only;
    /// such events qualify for no actor's metrics.
    #[must_use]
    pub fn actor_id(&self) -> Option<&str> {
        let actor = self.actor.as_deref()?.trim();
        if actor.is_empty() { None } else { Some(actor) }
    }

    /// Missing `ok` counts as failure.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.ok.unwrap_or(false)
    }

    #[must_use]
    pub fn cost_or_zero(&self) -> f64 {
        self.cost.unwrap_or(0.0)
    }

    #[must_use]
    pub fn delta_or_zero(&self) -> f64 {
        self.delta.unwrap_or(0.0)
    }

    /// Magnitude falls back to the event's delta, then to 0.0.
    #[must_use]
    pub fn magnitude_or_delta(&self) -> f64 {
        self.magnitude.unwrap_or_else(|| self.delta_or_zero())
    }
}
