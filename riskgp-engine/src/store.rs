//! File-backed state store for the pipeline artifacts.
//!
//! All persistence for the engine goes through here: one pretty-printed
//! JSON document per artifact under a caller-supplied state directory.
//! The consequence core never touches this module; it stays pure so the
//! golden regression strategy holds.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::consequence::{ActionEvent, ConsequenceState};
use crate::pipeline::countries::CountriesDoc;
use crate::pipeline::players::Roster;
use crate::pipeline::resources::ResourcesDoc;
use crate::pipeline::session::Session;
use crate::pipeline::turn_order::TurnOrderDoc;

pub const SESSION_FILE: &str = "session.json";
pub const PLAYERS_FILE: &str = "players.json";
pub const COUNTRIES_FILE: &str = "countries.json";
pub const RESOURCES_FILE: &str = "resources.json";
pub const TURN_ORDER_FILE: &str = "turn_order.json";
pub const EVENTS_FILE: &str = "events.json";

/// Store failures, tagged with the artifact involved.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The artifact does not exist yet; an earlier phase must run first.
    #[error("missing state/{name}; run the earlier phases first")]
    Missing { name: String },

    #[error("failed reading or writing state/{name}")]
    Io {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("state/{name} holds invalid JSON")]
    Parse {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Typed load/save over one state directory.
#[derive(Debug, Clone)]
pub struct StateStore {
    state_dir: PathBuf,
}

impl StateStore {
    #[must_use]
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: state_dir.into(),
        }
    }

    #[must_use]
    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    #[must_use]
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.state_dir.join(name)
    }

    fn load<T: DeserializeOwned>(&self, name: &str) -> Result<T, StoreError> {
        let path = self.path_of(name);
        let text = fs::read_to_string(&path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                StoreError::Missing {
                    name: name.to_string(),
                }
            } else {
                StoreError::Io {
                    name: name.to_string(),
                    source,
                }
            }
        })?;
        serde_json::from_str(&text).map_err(|source| StoreError::Parse {
            name: name.to_string(),
            source,
        })
    }

    fn save<T: Serialize>(&self, name: &str, value: &T) -> Result<(), StoreError> {
        fs::create_dir_all(&self.state_dir).map_err(|source| StoreError::Io {
            name: name.to_string(),
            source,
        })?;
        let text = serde_json::to_string_pretty(value).map_err(|source| StoreError::Parse {
            name: name.to_string(),
            source,
        })?;
        fs::write(self.path_of(name), text).map_err(|source| StoreError::Io {
            name: name.to_string(),
            source,
        })
    }

    /// # Errors
    /// Fails when the session artifact is missing, unreadable, or invalid.
    pub fn load_session(&self) -> Result<Session, StoreError> {
        self.load(SESSION_FILE)
    }

    /// # Errors
    /// Fails when the state directory or file cannot be written.
    pub fn save_session(&self, session: &Session) -> Result<(), StoreError> {
        self.save(SESSION_FILE, session)
    }

    /// # Errors
    /// Fails when the roster artifact is missing, unreadable, or invalid.
    pub fn load_roster(&self) -> Result<Roster, StoreError> {
        self.load(PLAYERS_FILE)
    }

    /// # Errors
    /// Fails when the state directory or file cannot be written.
    pub fn save_roster(&self, roster: &Roster) -> Result<(), StoreError> {
        self.save(PLAYERS_FILE, roster)
    }

    /// # Errors
    /// Fails when the countries artifact is missing, unreadable, or invalid.
    pub fn load_countries(&self) -> Result<CountriesDoc, StoreError> {
        self.load(COUNTRIES_FILE)
    }

    /// # Errors
    /// Fails when the state directory or file cannot be written.
    pub fn save_countries(&self, doc: &CountriesDoc) -> Result<(), StoreError> {
        self.save(COUNTRIES_FILE, doc)
    }

    /// # Errors
    /// Fails when the resources artifact is missing, unreadable, or invalid.
    pub fn load_resources(&self) -> Result<ResourcesDoc, StoreError> {
        self.load(RESOURCES_FILE)
    }

    /// # Errors
    /// Fails when the state directory or file cannot be written.
    pub fn save_resources(&self, doc: &ResourcesDoc) -> Result<(), StoreError> {
        self.save(RESOURCES_FILE, doc)
    }

    /// # Errors
    /// Fails when the turn-order artifact is missing, unreadable, or invalid.
    pub fn load_turn_order(&self) -> Result<TurnOrderDoc, StoreError> {
        self.load(TURN_ORDER_FILE)
    }

    /// # Errors
    /// Fails when the state directory or file cannot be written.
    pub fn save_turn_order(&self, doc: &TurnOrderDoc) -> Result<(), StoreError> {
        self.save(TURN_ORDER_FILE, doc)
    }

    /// Whether the turn-order artifact already exists (overwrite gate).
    #[must_use]
    pub fn turn_order_exists(&self) -> bool {
        self.path_of(TURN_ORDER_FILE).exists()
    }

    /// Whether a session has been created at all.
    #[must_use]
    pub fn session_exists(&self) -> bool {
        self.path_of(SESSION_FILE).exists()
    }

    /// Load the persisted action-event history. A missing file is an
    /// empty history, not an error; silence is not failure here.
    ///
    /// # Errors
    /// Fails when the file exists but is unreadable or invalid.
    pub fn load_events(&self) -> Result<Vec<ActionEvent>, StoreError> {
        match self.load(EVENTS_FILE) {
            Err(StoreError::Missing { .. }) => Ok(Vec::new()),
            other => other,
        }
    }

    /// # Errors
    /// Fails when the state directory or file cannot be written.
    pub fn save_events(&self, events: &[ActionEvent]) -> Result<(), StoreError> {
        self.save(EVENTS_FILE, &events)
    }

    /// Persist a consequence report for one computed turn.
    ///
    /// # Errors
    /// Fails when the state directory or file cannot be written.
    pub fn save_consequences(
        &self,
        computed_turn: i64,
        results: &BTreeMap<String, ConsequenceState>,
    ) -> Result<(), StoreError> {
        self.save(&Self::consequences_file(computed_turn), results)
    }

    /// Report file name for one computed turn.
    #[must_use]
    pub fn consequences_file(computed_turn: i64) -> String {
        format!("consequences_turn_{computed_turn}.json")
    }

    /// Remove the five pipeline artifacts so a session can restart from
    /// the lobby. Leaves the event history and any reports alone.
    ///
    /// # Errors
    /// Fails when an existing artifact cannot be removed.
    pub fn reset_pipeline(&self) -> Result<(), StoreError> {
        for name in [
            SESSION_FILE,
            PLAYERS_FILE,
            COUNTRIES_FILE,
            RESOURCES_FILE,
            TURN_ORDER_FILE,
        ] {
            let path = self.path_of(name);
            if path.exists() {
                fs::remove_file(path).map_err(|source| StoreError::Io {
                    name: name.to_string(),
                    source,
                })?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::session::GameMode;

    #[test]
    fn session_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state"));
        let session = Session::new(GameMode::Hotseat, "2026-08-29T00:00:00+00:00");
        store.save_session(&session).unwrap();
        assert_eq!(store.load_session().unwrap(), session);
    }

    #[test]
    fn missing_artifact_is_typed() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());
        let err = store.load_roster().unwrap_err();
        assert!(matches!(err, StoreError::Missing { ref name } if name == PLAYERS_FILE));
    }

    #[test]
    fn missing_events_are_an_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());
        assert!(store.load_events().unwrap().is_empty());
    }

    #[test]
    fn reset_clears_artifacts_but_not_events() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());
        let session = Session::new(GameMode::Solo, "2026-08-29T00:00:00+00:00");
        store.save_session(&session).unwrap();
        store.save_events(&[]).unwrap();
        store.reset_pipeline().unwrap();
        assert!(!store.session_exists());
        assert!(store.path_of(EVENTS_FILE).exists());
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());
        fs::create_dir_all(store.state_dir()).unwrap();
        fs::write(store.path_of(SESSION_FILE), "{not json").unwrap();
        assert!(matches!(
            store.load_session().unwrap_err(),
            StoreError::Parse { .. }
        ));
    }
}
