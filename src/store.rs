//! Persistence boundary.
//!
//! Tracker values live in a per-character flag document owned by the host.
//! The engine never caches them; every operation reads a fresh snapshot,
//! computes, and writes back one batch.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::config::NeedsConfig;
use crate::error::{NeedsError, Result};

/// Flag namespace all engine keys live under.
pub const FLAG_NAMESPACE: &str = "survival-needs";

/// Key of the per-character accrual marker (world-time seconds).
pub const LAST_UPDATE_TIME_KEY: &str = "lastUpdateTime";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CharacterId(pub String);

impl CharacterId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CharacterId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A dotted write target inside the flag namespace:
/// `survival-needs.<key>` or `survival-needs.<key>.<sub>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FlagPath {
    pub key: String,
    pub sub: Option<String>,
}

impl FlagPath {
    pub fn tracker(tracker_id: &str) -> Self {
        Self {
            key: tracker_id.to_string(),
            sub: None,
        }
    }

    pub fn sub_property(tracker_id: &str, sub: &str) -> Self {
        Self {
            key: tracker_id.to_string(),
            sub: Some(sub.to_string()),
        }
    }

    pub fn last_update_time() -> Self {
        Self {
            key: LAST_UPDATE_TIME_KEY.to_string(),
            sub: None,
        }
    }
}

impl fmt::Display for FlagPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sub {
            Some(sub) => write!(f, "{FLAG_NAMESPACE}.{}.{sub}", self.key),
            None => write!(f, "{FLAG_NAMESPACE}.{}", self.key),
        }
    }
}

/// A stored flag value: plain number, or a bundle for trackers that carry
/// sub-properties alongside the main value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    Number(f64),
    Bundle(BTreeMap<String, f64>),
}

impl FlagValue {
    /// The main tracker value, whatever the storage shape.
    pub fn value(&self) -> Option<f64> {
        match self {
            FlagValue::Number(n) => Some(*n),
            FlagValue::Bundle(map) => map.get("value").copied(),
        }
    }
}

/// Read-only async view the engine operates against.
///
/// `batch_update` carries every write of one logical operation; the host's
/// per-document update is assumed atomic, so a partially applied operation
/// cannot be observed.
pub trait NeedsStore: Send + Sync {
    fn characters(&self) -> impl std::future::Future<Output = Result<Vec<CharacterId>>> + Send;

    fn read(
        &self,
        character: &CharacterId,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<FlagValue>>> + Send;

    fn batch_update(
        &self,
        character: &CharacterId,
        writes: &[(FlagPath, f64)],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

impl<T: NeedsStore> NeedsStore for std::sync::Arc<T> {
    async fn characters(&self) -> Result<Vec<CharacterId>> {
        (**self).characters().await
    }

    async fn read(&self, character: &CharacterId, key: &str) -> Result<Option<FlagValue>> {
        (**self).read(character, key).await
    }

    async fn batch_update(&self, character: &CharacterId, writes: &[(FlagPath, f64)]) -> Result<()> {
        (**self).batch_update(character, writes).await
    }
}

#[derive(Debug, Clone, Default)]
pub struct TrackerState {
    pub value: f64,
    pub subs: BTreeMap<String, f64>,
}

/// One character's tracker state as read from the store, with config defaults
/// filled in for anything absent.
#[derive(Debug, Clone, Default)]
pub struct NeedsState {
    pub trackers: BTreeMap<String, TrackerState>,
    pub last_update_time: Option<f64>,
    /// Tracker ids that had no stored value at all (used to detect
    /// uninitialized characters).
    pub missing: BTreeSet<String>,
}

impl NeedsState {
    pub fn value(&self, tracker_id: &str) -> f64 {
        self.trackers.get(tracker_id).map_or(0.0, |t| t.value)
    }

    pub fn subs(&self, tracker_id: &str) -> BTreeMap<String, f64> {
        self.trackers
            .get(tracker_id)
            .map(|t| t.subs.clone())
            .unwrap_or_default()
    }
}

/// Reads every enabled tracker plus the accrual marker for one character.
pub async fn load_needs_state<S: NeedsStore>(
    store: &S,
    character: &CharacterId,
    config: &NeedsConfig,
) -> Result<NeedsState> {
    let mut state = NeedsState::default();
    for tracker in config.enabled_trackers() {
        match store.read(character, &tracker.id).await? {
            Some(FlagValue::Number(value)) => {
                state.trackers.insert(
                    tracker.id.clone(),
                    TrackerState {
                        value,
                        subs: BTreeMap::new(),
                    },
                );
            }
            Some(FlagValue::Bundle(map)) => {
                let value = map.get("value").copied().unwrap_or(tracker.default_value);
                let mut subs: BTreeMap<String, f64> = map
                    .iter()
                    .filter(|(k, _)| k.as_str() != "value")
                    .map(|(k, v)| (k.clone(), *v))
                    .collect();
                for sub in &tracker.sub_properties {
                    subs.entry(sub.id.clone()).or_insert(sub.default_value);
                }
                state
                    .trackers
                    .insert(tracker.id.clone(), TrackerState { value, subs });
            }
            None => {
                state.missing.insert(tracker.id.clone());
                let subs = tracker
                    .sub_properties
                    .iter()
                    .map(|s| (s.id.clone(), s.default_value))
                    .collect();
                state.trackers.insert(
                    tracker.id.clone(),
                    TrackerState {
                        value: tracker.default_value,
                        subs,
                    },
                );
            }
        }
    }
    state.last_update_time = store
        .read(character, LAST_UPDATE_TIME_KEY)
        .await?
        .and_then(|v| v.value());
    Ok(state)
}

/// In-process store for tests and the demo runner.
#[derive(Debug, Default)]
pub struct MemoryStore {
    characters: Mutex<BTreeMap<CharacterId, BTreeMap<String, FlagValue>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_character(&self, character: CharacterId) {
        self.characters
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(character)
            .or_default();
    }

    /// Seeds a raw flag value, bypassing batch-write semantics. Test helper.
    pub fn seed(&self, character: &CharacterId, key: &str, value: FlagValue) {
        self.characters
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(character.clone())
            .or_default()
            .insert(key.to_string(), value);
    }
}

impl NeedsStore for MemoryStore {
    async fn characters(&self) -> Result<Vec<CharacterId>> {
        Ok(self
            .characters
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect())
    }

    async fn read(&self, character: &CharacterId, key: &str) -> Result<Option<FlagValue>> {
        Ok(self
            .characters
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(character)
            .and_then(|flags| flags.get(key).cloned()))
    }

    async fn batch_update(&self, character: &CharacterId, writes: &[(FlagPath, f64)]) -> Result<()> {
        let mut characters = self.characters.lock().unwrap_or_else(|e| e.into_inner());
        let flags = characters
            .get_mut(character)
            .ok_or_else(|| NeedsError::Persistence(format!("unknown character {character}")))?;
        for (path, value) in writes {
            match &path.sub {
                None => match flags.get_mut(&path.key) {
                    // A plain write into an existing bundle updates its main
                    // value and keeps the sub-properties.
                    Some(FlagValue::Bundle(map)) => {
                        map.insert("value".to_string(), *value);
                    }
                    _ => {
                        flags.insert(path.key.clone(), FlagValue::Number(*value));
                    }
                },
                Some(sub) => {
                    let entry = flags
                        .entry(path.key.clone())
                        .or_insert_with(|| FlagValue::Bundle(BTreeMap::new()));
                    if let FlagValue::Number(n) = entry {
                        let mut map = BTreeMap::new();
                        map.insert("value".to_string(), *n);
                        *entry = FlagValue::Bundle(map);
                    }
                    if let FlagValue::Bundle(map) = entry {
                        map.insert(sub.clone(), *value);
                    }
                }
            }
        }
        Ok(())
    }
}
