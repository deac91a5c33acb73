//! Engine assembly: config snapshot, collaborators, per-character locking.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::OwnedMutexGuard;

use crate::config::NeedsConfig;
use crate::effects::{ConditionResolver, EffectApi};
use crate::error::Result;
use crate::store::{load_needs_state, CharacterId, NeedsState, NeedsStore};

/// The needs engine. Owns an immutable [`NeedsConfig`] snapshot and drives
/// every operation against the injected store, effect collection, and
/// condition resolver.
///
/// Each operation takes a per-character async mutex for its whole span, read
/// through reconcile, so interleaved calls for one character serialize while
/// different characters proceed concurrently.
pub struct NeedsEngine<S, E, C> {
    config: NeedsConfig,
    store: S,
    effects: E,
    conditions: C,
    locks: Mutex<HashMap<CharacterId, Arc<tokio::sync::Mutex<()>>>>,
}

impl<S, E, C> NeedsEngine<S, E, C>
where
    S: NeedsStore,
    E: EffectApi,
    C: ConditionResolver,
{
    pub fn new(config: NeedsConfig, store: S, effects: E, conditions: C) -> Self {
        Self {
            config,
            store,
            effects,
            conditions,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &NeedsConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub(crate) fn effects(&self) -> &E {
        &self.effects
    }

    pub(crate) fn conditions(&self) -> &C {
        &self.conditions
    }

    /// Swaps in a new configuration snapshot. A settings change on the host
    /// side means rebuilding the engine value, never mutating a live one.
    pub fn with_config(self, config: NeedsConfig) -> Self {
        Self { config, ..self }
    }

    /// Current tracker state for one character, defaults filled in.
    pub async fn snapshot(&self, character: &CharacterId) -> Result<NeedsState> {
        load_needs_state(&self.store, character, &self.config).await
    }

    pub(crate) async fn lock_character(
        &self,
        character: &CharacterId,
    ) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(
                locks
                    .entry(character.clone())
                    .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
            )
        };
        lock.lock_owned().await
    }
}
