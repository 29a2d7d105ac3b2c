//! Derived consequence state for actors in the turn pipeline.
//!
//! Everything in this module is derived, never authored: tags and indices
//! are recomputed from the raw event history on every extraction call, and
//! each emitted record carries the evidence that justifies its tags.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

pub mod event;
pub mod extract;

pub use event::ActionEvent;
pub use extract::{DOMINANCE_MARGIN, ExtractError, extract_consequences};

/// Tag set for one actor. Inline capacity covers the worst case of the
/// four first-pass tags; `DOMINANT` spills at most once per call.
pub type TagSet = SmallVec<[ConsequenceTag; 4]>;

/// Classification label attached when an index crosses its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsequenceTag {
    /// High capacity with high stability.
    Strong,
    /// Sustained activity at elevated risk.
    Aggressive,
    /// Negative delta slope across the window.
    Declining,
    /// High outcome variance.
    Unstable,
    /// Top capacity with a clear margin over the field. Relative; at most
    /// one actor per extraction carries it, always as the last tag.
    Dominant,
}

impl std::fmt::Display for ConsequenceTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ConsequenceTag::Strong => "STRONG",
            ConsequenceTag::Aggressive => "AGGRESSIVE",
            ConsequenceTag::Declining => "DECLINING",
            ConsequenceTag::Unstable => "UNSTABLE",
            ConsequenceTag::Dominant => "DOMINANT",
        };
        write!(f, "{label}")
    }
}

/// One justification for a tag: the signal that triggered it, the value it
/// had, and the comparison boundary it crossed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub signal: String,
    pub value: f64,
    /// Comparison boundary; absent for purely informational entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<u32>,
    /// Turn numbers considered, ascending.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turns: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl EvidenceItem {
    /// Evidence for a threshold-triggered tag over a window of turns.
    #[must_use]
    pub fn thresholded(
        signal: &str,
        value: f64,
        threshold: f64,
        window: u32,
        turns: &[i64],
    ) -> Self {
        Self {
            signal: signal.to_string(),
            value,
            threshold: Some(threshold),
            window: Some(window),
            turns: Some(turns.to_vec()),
            note: None,
        }
    }
}

/// Raw windowed measurements for one actor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsequenceSignals {
    pub attempts: u32,
    pub successes: u32,
    /// Always `attempts - successes`.
    pub failures: u32,
    pub net_delta: f64,
    pub avg_cost: f64,
    /// Population variance of per-event magnitude; 0.0 for a single event.
    pub outcome_variance: f64,
}

/// Normalized derived scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsequenceIndices {
    /// Blended success rate and saturated net delta.
    pub capacity_index: f64,
    /// `1 / (1 + outcome_variance)`, in (0, 1].
    pub stability_index: f64,
    /// Discrete slope of per-turn delta across the window. Signed.
    pub momentum_index: f64,
    /// Blended failure rate and saturated average cost.
    pub risk_index: f64,
    /// Relative; zero except for the single top-ranked actor when the
    /// margin criterion is met.
    pub dominance_index: f64,
}

impl ConsequenceIndices {
    /// Copy with `dominance_index` overridden, everything else kept.
    #[must_use]
    pub const fn with_dominance(self, margin: f64) -> Self {
        Self {
            dominance_index: margin,
            ..self
        }
    }
}

/// The emitted consequence record for one `(actor, turn, window)` triple.
///
/// Built once per qualifying actor per extraction and never mutated; the
/// dominance pass replaces the top actor's record with a derived copy
/// rather than editing it in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsequenceState {
    pub actor_id: String,
    pub window: u32,
    pub computed_turn: i64,
    pub signals: ConsequenceSignals,
    pub indices: ConsequenceIndices,
    /// Derived-only labels, unique, `DOMINANT` last when present.
    #[serde(default)]
    pub tags: TagSet,
    /// One or more receipts per triggered tag.
    #[serde(default)]
    pub evidence: Vec<EvidenceItem>,
}

impl ConsequenceState {
    /// Derive the dominant copy of this record: `dominance_index` set to
    /// `margin`, `DOMINANT` appended (idempotent), one margin receipt
    /// added. The original record is left untouched.
    #[must_use]
    pub fn with_dominance(&self, margin: f64, receipt: EvidenceItem) -> Self {
        let mut tags = self.tags.clone();
        if !tags.contains(&ConsequenceTag::Dominant) {
            tags.push(ConsequenceTag::Dominant);
        }
        let mut evidence = self.evidence.clone();
        evidence.push(receipt);
        Self {
            actor_id: self.actor_id.clone(),
            window: self.window,
            computed_turn: self.computed_turn,
            signals: self.signals,
            indices: self.indices.with_dominance(margin),
            tags,
            evidence,
        }
    }

    /// Whether this record carries the given tag.
    #[must_use]
    pub fn has_tag(&self, tag: ConsequenceTag) -> bool {
        self.tags.contains(&tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_serialize_as_screaming_labels() {
        let json = serde_json::to_string(&ConsequenceTag::Declining).unwrap();
        assert_eq!(json, "\"DECLINING\"");
        assert_eq!(ConsequenceTag::Dominant.to_string(), "DOMINANT");
    }

    #[test]
    fn with_dominance_appends_once_and_keeps_original() {
        let base = ConsequenceState {
            actor_id: "A".to_string(),
            window: 5,
            computed_turn: 10,
            signals: ConsequenceSignals::default(),
            indices: ConsequenceIndices::default(),
            tags: TagSet::from_slice(&[ConsequenceTag::Strong]),
            evidence: Vec::new(),
        };
        let receipt = EvidenceItem::thresholded("dominance_margin", 0.3, 0.2, 5, &[6, 7, 8, 9, 10]);
        let derived = base.with_dominance(0.3, receipt.clone());
        let again = derived.with_dominance(0.3, receipt);

        assert!(base.tags.iter().all(|t| *t != ConsequenceTag::Dominant));
        assert_eq!(
            derived.tags.as_slice(),
            &[ConsequenceTag::Strong, ConsequenceTag::Dominant]
        );
        assert_eq!(
            again.tags.iter().filter(|t| **t == ConsequenceTag::Dominant).count(),
            1
        );
        assert!((derived.indices.dominance_index - 0.3).abs() < f64::EPSILON);
        assert!((base.indices.dominance_index).abs() < f64::EPSILON);
    }
}
