//! Effect and condition boundary.
//!
//! The engine never touches the host's effect documents directly; it describes
//! what should exist and lets an [`EffectApi`] implementation carry out the
//! create/delete batches. Identity is the (tracker, threshold-band) pair, not
//! the slug the host stores for display.

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::error::Result;
use crate::store::CharacterId;

/// Composite identity of one managed effect. Two effects are the same exactly
/// when both components match.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EffectKey {
    pub tracker_id: String,
    pub threshold_name: String,
}

impl EffectKey {
    pub fn new(tracker_id: impl Into<String>, threshold_name: impl Into<String>) -> Self {
        Self {
            tracker_id: tracker_id.into(),
            threshold_name: threshold_name.into(),
        }
    }
}

/// Display/storage slug: `sn-<tracker>-<name>`, lowercased, with runs of
/// non-alphanumerics collapsed to single hyphens.
pub fn effect_slug(key: &EffectKey) -> String {
    let mut slug = String::from("sn");
    for part in [key.tracker_id.as_str(), key.threshold_name.as_str()] {
        slug.push('-');
        let mut last_hyphen = false;
        for ch in part.chars() {
            if ch.is_ascii_alphanumeric() {
                slug.push(ch.to_ascii_lowercase());
                last_hyphen = false;
            } else if !last_hyphen {
                slug.push('-');
                last_hyphen = true;
            }
        }
        while slug.ends_with('-') {
            slug.pop();
        }
    }
    slug
}

/// An effect the host currently has applied, tagged with engine provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedEffect {
    /// Host-side document id, opaque to the engine.
    pub id: String,
    pub key: EffectKey,
}

/// One condition the effect grants, with an optional severity badge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionGrant {
    pub condition: String,
    pub badge: Option<u8>,
}

/// Everything the host needs to materialize one managed effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectDescriptor {
    pub key: EffectKey,
    pub name: String,
    pub slug: String,
    pub grants: Vec<ConditionGrant>,
}

/// Host-side effect collection for one character.
pub trait EffectApi: Send + Sync {
    /// Effects previously created by this engine, and only those.
    fn list_managed(
        &self,
        character: &CharacterId,
    ) -> impl std::future::Future<Output = Result<Vec<AppliedEffect>>> + Send;

    fn create(
        &self,
        character: &CharacterId,
        effects: &[EffectDescriptor],
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    fn delete(
        &self,
        character: &CharacterId,
        ids: &[String],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

impl<T: EffectApi> EffectApi for std::sync::Arc<T> {
    async fn list_managed(&self, character: &CharacterId) -> Result<Vec<AppliedEffect>> {
        (**self).list_managed(character).await
    }

    async fn create(&self, character: &CharacterId, effects: &[EffectDescriptor]) -> Result<()> {
        (**self).create(character, effects).await
    }

    async fn delete(&self, character: &CharacterId, ids: &[String]) -> Result<()> {
        (**self).delete(character, ids).await
    }
}

/// Maps a symptom slug from tracker config to the host's condition identifier.
pub trait ConditionResolver: Send + Sync {
    fn resolve(&self, slug: &str) -> Option<String>;

    /// Whether the condition supports a numeric severity badge.
    fn supports_badge(&self, slug: &str) -> bool;
}

/// Conditions that carry a numeric severity value in the target system.
pub const BADGE_CONDITIONS: &[&str] = &[
    "enfeebled",
    "drained",
    "stupefied",
    "clumsy",
    "frightened",
    "sickened",
    "slowed",
];

const KNOWN_CONDITIONS: &[&str] = &[
    "enfeebled",
    "drained",
    "stupefied",
    "clumsy",
    "frightened",
    "sickened",
    "slowed",
    "fatigued",
    "confused",
    "fascinated",
];

/// Resolver over the standard condition set. The host's id for a condition is
/// its slug.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinConditions;

impl ConditionResolver for BuiltinConditions {
    fn resolve(&self, slug: &str) -> Option<String> {
        KNOWN_CONDITIONS
            .contains(&slug)
            .then(|| slug.to_string())
    }

    fn supports_badge(&self, slug: &str) -> bool {
        BADGE_CONDITIONS.contains(&slug)
    }
}

/// In-process effect collection for tests and the demo runner.
#[derive(Debug, Default)]
pub struct MemoryEffects {
    next_id: Mutex<u64>,
    applied: Mutex<BTreeMap<CharacterId, Vec<(AppliedEffect, EffectDescriptor)>>>,
}

impl MemoryEffects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn descriptors(&self, character: &CharacterId) -> Vec<EffectDescriptor> {
        self.applied
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(character)
            .map(|list| list.iter().map(|(_, d)| d.clone()).collect())
            .unwrap_or_default()
    }
}

impl EffectApi for MemoryEffects {
    async fn list_managed(&self, character: &CharacterId) -> Result<Vec<AppliedEffect>> {
        Ok(self
            .applied
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(character)
            .map(|list| list.iter().map(|(a, _)| a.clone()).collect())
            .unwrap_or_default())
    }

    async fn create(&self, character: &CharacterId, effects: &[EffectDescriptor]) -> Result<()> {
        let mut applied = self.applied.lock().unwrap_or_else(|e| e.into_inner());
        let list = applied.entry(character.clone()).or_default();
        let mut next_id = self.next_id.lock().unwrap_or_else(|e| e.into_inner());
        for descriptor in effects {
            *next_id += 1;
            list.push((
                AppliedEffect {
                    id: format!("fx-{next_id}"),
                    key: descriptor.key.clone(),
                },
                descriptor.clone(),
            ));
        }
        Ok(())
    }

    async fn delete(&self, character: &CharacterId, ids: &[String]) -> Result<()> {
        let mut applied = self.applied.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(list) = applied.get_mut(character) {
            list.retain(|(a, _)| !ids.contains(&a.id));
        }
        Ok(())
    }
}
