//! Threshold resolution and effect-set reconciliation.
//!
//! Reconciliation is a pure convergence step: given current tracker values,
//! compute the effect each tracker should project and diff that against what
//! the host actually has applied. It never mutates tracker values, and calling
//! it twice with unchanged input is a no-op.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, warn};

use crate::config::{ThresholdBand, TrackerDef};
use crate::effects::{
    effect_slug, ConditionGrant, ConditionResolver, EffectApi, EffectDescriptor, EffectKey,
};
use crate::engine::NeedsEngine;
use crate::error::Result;
use crate::store::{load_needs_state, CharacterId, NeedsState, NeedsStore};

/// Highest band whose threshold the value meets. Bands sharing a threshold
/// resolve to the latest-defined one.
pub fn best_band(tracker: &TrackerDef, value: f64) -> Option<&ThresholdBand> {
    let mut best: Option<&ThresholdBand> = None;
    for band in &tracker.threshold_effects {
        if value >= band.threshold && best.map_or(true, |b| band.threshold >= b.threshold) {
            best = Some(band);
        }
    }
    best
}

/// Materializes the effect a satisfied band projects. Symptoms the resolver
/// cannot map are skipped; a band with no resolvable symptoms still produces
/// a named marker effect.
pub fn build_descriptor<C: ConditionResolver>(
    tracker: &TrackerDef,
    band: &ThresholdBand,
    conditions: &C,
) -> EffectDescriptor {
    let key = EffectKey::new(tracker.id.clone(), band.name.clone());
    let mut grants = Vec::with_capacity(band.symptoms.len());
    for symptom in &band.symptoms {
        let Some(condition) = conditions.resolve(&symptom.slug) else {
            warn!(
                "symptom '{}' on {}/{} does not resolve to a condition, skipping",
                symptom.slug, tracker.id, band.name
            );
            continue;
        };
        let badge = match symptom.value {
            Some(v) if conditions.supports_badge(&symptom.slug) => Some(v),
            Some(v) => {
                warn!(
                    "condition '{}' takes no badge, dropping value {v}",
                    symptom.slug
                );
                None
            }
            None => None,
        };
        grants.push(ConditionGrant { condition, badge });
    }
    EffectDescriptor {
        name: band.name.clone(),
        slug: effect_slug(&key),
        key,
        grants,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub added: Vec<EffectKey>,
    pub removed: Vec<EffectKey>,
}

impl ReconcileOutcome {
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

impl<S, E, C> NeedsEngine<S, E, C>
where
    S: NeedsStore,
    E: EffectApi,
    C: ConditionResolver,
{
    /// Reconciles one character's applied effects against current state.
    pub async fn reconcile(&self, character: &CharacterId) -> Result<ReconcileOutcome> {
        let _guard = self.lock_character(character).await;
        let state = load_needs_state(self.store(), character, self.config()).await?;
        self.reconcile_inner(character, &state).await
    }

    /// Reconciliation body; the caller holds the character lock.
    pub(crate) async fn reconcile_inner(
        &self,
        character: &CharacterId,
        state: &NeedsState,
    ) -> Result<ReconcileOutcome> {
        let config = self.config();
        let applied = self.effects().list_managed(character).await?;

        // Desired effect per tracker: at most one key each.
        let mut desired: BTreeMap<String, EffectDescriptor> = BTreeMap::new();
        for tracker in config.enabled_trackers() {
            if tracker.threshold_effects.is_empty() {
                continue;
            }
            if let Some(band) = best_band(tracker, state.value(&tracker.id)) {
                desired.insert(
                    tracker.id.clone(),
                    build_descriptor(tracker, band, self.conditions()),
                );
            }
        }

        let mut to_remove: Vec<String> = Vec::new();
        let mut removed: Vec<EffectKey> = Vec::new();
        let mut present: BTreeSet<EffectKey> = BTreeSet::new();
        for effect in &applied {
            let keep = desired
                .get(&effect.key.tracker_id)
                .is_some_and(|d| d.key == effect.key);
            // Effects from disabled or deleted trackers, unsatisfied bands,
            // and duplicate keys all fall out here.
            if keep && present.insert(effect.key.clone()) {
                continue;
            }
            to_remove.push(effect.id.clone());
            removed.push(effect.key.clone());
        }

        if !to_remove.is_empty() {
            // Re-list before deleting; a concurrent host-side removal must not
            // turn into an error for ids that are already gone.
            let current: BTreeSet<String> = self
                .effects()
                .list_managed(character)
                .await?
                .into_iter()
                .map(|e| e.id)
                .collect();
            to_remove.retain(|id| current.contains(id));
            if !to_remove.is_empty() {
                self.effects().delete(character, &to_remove).await?;
            }
        }

        let candidates: Vec<EffectDescriptor> = desired
            .into_values()
            .filter(|d| !present.contains(&d.key))
            .collect();
        let mut added: Vec<EffectKey> = Vec::new();
        if !candidates.is_empty() {
            // Same race guard as the removal batch: only add keys that are
            // still absent after the deletes landed.
            let current_keys: BTreeSet<EffectKey> = self
                .effects()
                .list_managed(character)
                .await?
                .into_iter()
                .map(|e| e.key)
                .collect();
            let to_create: Vec<EffectDescriptor> = candidates
                .into_iter()
                .filter(|d| !current_keys.contains(&d.key))
                .collect();
            added = to_create.iter().map(|d| d.key.clone()).collect();
            if !to_create.is_empty() {
                self.effects().create(character, &to_create).await?;
            }
        }

        let outcome = ReconcileOutcome { added, removed };
        if !outcome.is_noop() {
            debug!(
                "reconciled {character}: +{} -{}",
                outcome.added.len(),
                outcome.removed.len()
            );
        }
        Ok(outcome)
    }
}
