//! Direct state changes: manual set-value with the coupling cascade, long
//! rest, first-time initialization, and config-driven special actions.

use log::debug;

use crate::effects::{ConditionResolver, EffectApi};
use crate::engine::NeedsEngine;
use crate::error::{NeedsError, Result};
use crate::store::{load_needs_state, CharacterId, FlagPath, NeedsState, NeedsStore};

#[derive(Debug, Clone, Copy, Default)]
pub struct SetValueOptions {
    /// A consumption-driven decrease feeds the coupling cascade (eating fills
    /// the bowels, drinking fills the bladder).
    pub triggered_by_consumption: bool,
    /// Reconcile even when the clamped value equals the stored one.
    pub force_effect_update: bool,
}

/// What a special-action invocation did.
#[derive(Debug, Clone, Default)]
pub struct ActionOutcome {
    pub long_rest_applied: bool,
    /// `(tracker_id, actual_delta)` for every tracker the action touched.
    pub changes: Vec<(String, f64)>,
}

impl<S, E, C> NeedsEngine<S, E, C>
where
    S: NeedsStore,
    E: EffectApi,
    C: ConditionResolver,
{
    /// Sets a tracker to `requested` (clamped to its range) and reconciles.
    /// Returns the value actually stored.
    pub async fn set_value(
        &self,
        character: &CharacterId,
        tracker_id: &str,
        requested: f64,
        options: SetValueOptions,
    ) -> Result<f64> {
        let _guard = self.lock_character(character).await;
        let mut state = load_needs_state(self.store(), character, self.config()).await?;
        self.set_value_locked(character, &mut state, tracker_id, requested, options)
            .await
    }

    pub(crate) async fn set_value_locked(
        &self,
        character: &CharacterId,
        state: &mut NeedsState,
        tracker_id: &str,
        requested: f64,
        options: SetValueOptions,
    ) -> Result<f64> {
        let config = self.config();
        let tracker = config
            .tracker(tracker_id)
            .ok_or_else(|| NeedsError::InvalidInput(format!("unknown tracker '{tracker_id}'")))?;
        if !requested.is_finite() {
            return Err(NeedsError::InvalidInput(format!(
                "non-finite value {requested} for tracker '{tracker_id}'"
            )));
        }

        let subs = state.subs(tracker_id);
        let clamped = requested.clamp(0.0, tracker.effective_max(&subs));
        let current = state.value(tracker_id);
        if clamped == current {
            if options.force_effect_update {
                self.reconcile_inner(character, state).await?;
            }
            return Ok(clamped);
        }

        let mut writes = vec![(FlagPath::tracker(tracker_id), clamped)];
        let decrease = current - clamped;
        if options.triggered_by_consumption && decrease > 0.0 {
            for (target, percentage) in config.couplings_from(tracker_id) {
                let target_subs = state.subs(&target.id);
                let increase = (decrease * percentage / 100.0).round();
                if increase <= 0.0 {
                    continue;
                }
                let next = (state.value(&target.id) + increase)
                    .clamp(0.0, target.effective_max(&target_subs));
                if next != state.value(&target.id) {
                    writes.push((FlagPath::tracker(&target.id), next));
                }
            }
        }

        self.store().batch_update(character, &writes).await?;
        for (path, value) in &writes {
            if let Some(entry) = state.trackers.get_mut(&path.key) {
                entry.value = *value;
            }
        }
        debug!("{character}: {tracker_id} {current} -> {clamped}");
        self.reconcile_inner(character, state).await?;
        Ok(clamped)
    }

    /// Applies a long rest: every `by_long_rest` tracker drops by its
    /// configured amount and the accrual marker resets to `now_seconds`.
    /// Returns whether anything changed.
    pub async fn apply_long_rest(&self, character: &CharacterId, now_seconds: f64) -> Result<bool> {
        let _guard = self.lock_character(character).await;
        let mut state = load_needs_state(self.store(), character, self.config()).await?;
        self.apply_long_rest_locked(character, &mut state, now_seconds)
            .await
    }

    pub(crate) async fn apply_long_rest_locked(
        &self,
        character: &CharacterId,
        state: &mut NeedsState,
        now_seconds: f64,
    ) -> Result<bool> {
        let config = self.config();
        let mut writes: Vec<(FlagPath, f64)> = Vec::new();
        for tracker in config.enabled_trackers() {
            if !tracker.regeneration.by_long_rest {
                continue;
            }
            let subs = state.subs(&tracker.id);
            let current = state.value(&tracker.id);
            let next = (current - tracker.regeneration.long_rest_amount)
                .clamp(0.0, tracker.effective_max(&subs));
            if next != current {
                writes.push((FlagPath::tracker(&tracker.id), next));
            }
        }
        if writes.is_empty() {
            return Ok(false);
        }

        writes.push((FlagPath::last_update_time(), now_seconds));
        self.store().batch_update(character, &writes).await?;
        for (path, value) in &writes {
            if path.key == crate::store::LAST_UPDATE_TIME_KEY {
                state.last_update_time = Some(*value);
            } else if let Some(entry) = state.trackers.get_mut(&path.key) {
                entry.value = *value;
            }
        }
        debug!("{character}: long rest applied");
        self.reconcile_inner(character, state).await?;
        Ok(true)
    }

    /// Writes defaults for every enabled tracker and stamps the accrual
    /// marker, unless the character already carries both. Returns whether
    /// initialization ran.
    pub async fn ensure_initialized(
        &self,
        character: &CharacterId,
        now_seconds: f64,
    ) -> Result<bool> {
        let _guard = self.lock_character(character).await;
        let state = load_needs_state(self.store(), character, self.config()).await?;
        if state.last_update_time.is_some() && state.missing.is_empty() {
            return Ok(false);
        }
        self.initialize_locked(character, now_seconds, &state).await?;
        Ok(true)
    }

    /// One batch of defaults (sub-properties included) plus the marker, then
    /// one reconcile against the fresh defaults.
    pub(crate) async fn initialize_locked(
        &self,
        character: &CharacterId,
        now_seconds: f64,
        state: &NeedsState,
    ) -> Result<()> {
        let config = self.config();
        let mut writes: Vec<(FlagPath, f64)> = Vec::new();
        let mut fresh = state.clone();
        fresh.missing.clear();
        for tracker in config.enabled_trackers() {
            writes.push((FlagPath::tracker(&tracker.id), tracker.default_value));
            for sub in &tracker.sub_properties {
                writes.push((
                    FlagPath::sub_property(&tracker.id, &sub.id),
                    sub.default_value,
                ));
            }
            if let Some(entry) = fresh.trackers.get_mut(&tracker.id) {
                entry.value = tracker.default_value;
                for sub in &tracker.sub_properties {
                    entry.subs.insert(sub.id.clone(), sub.default_value);
                }
            }
        }
        writes.push((FlagPath::last_update_time(), now_seconds));
        fresh.last_update_time = Some(now_seconds);
        self.store().batch_update(character, &writes).await?;
        debug!("{character}: initialized {} trackers", writes.len() - 1);
        self.reconcile_inner(character, &fresh).await?;
        Ok(())
    }

    /// Direct relief action (urinate, defecate, dry off): sets the tracker to
    /// the action's configured floor with a forced reconcile.
    pub async fn relieve(
        &self,
        character: &CharacterId,
        tracker_id: &str,
        action_id: &str,
    ) -> Result<f64> {
        let _guard = self.lock_character(character).await;
        let config = self.config();
        let tracker = config
            .tracker(tracker_id)
            .ok_or_else(|| NeedsError::InvalidInput(format!("unknown tracker '{tracker_id}'")))?;
        let action = tracker
            .special_actions
            .iter()
            .find(|a| a.id == action_id)
            .ok_or_else(|| {
                NeedsError::InvalidInput(format!("unknown action '{action_id}' on '{tracker_id}'"))
            })?;
        let floor = action.reduces_to.ok_or_else(|| {
            NeedsError::InvalidInput(format!("action '{action_id}' is not a direct relief action"))
        })?;

        let mut state = load_needs_state(self.store(), character, config).await?;
        self.set_value_locked(
            character,
            &mut state,
            tracker_id,
            floor,
            SetValueOptions {
                triggered_by_consumption: false,
                force_effect_update: true,
            },
        )
        .await
    }

    /// Choice-based action (rest options, boredom/stress relief): applies the
    /// chosen reduction plus its mood side effect, or triggers a full long
    /// rest.
    pub async fn apply_choice(
        &self,
        character: &CharacterId,
        tracker_id: &str,
        action_id: &str,
        choice_id: &str,
        now_seconds: f64,
    ) -> Result<ActionOutcome> {
        let _guard = self.lock_character(character).await;
        let config = self.config();
        let tracker = config
            .tracker(tracker_id)
            .ok_or_else(|| NeedsError::InvalidInput(format!("unknown tracker '{tracker_id}'")))?;
        let action = tracker
            .special_actions
            .iter()
            .find(|a| a.id == action_id && a.opens_choices_dialog)
            .ok_or_else(|| {
                NeedsError::InvalidInput(format!(
                    "unknown choice action '{action_id}' on '{tracker_id}'"
                ))
            })?;
        let choice = action
            .choices
            .iter()
            .find(|c| c.id == choice_id)
            .ok_or_else(|| {
                NeedsError::InvalidInput(format!("unknown choice '{choice_id}' on '{action_id}'"))
            })?
            .clone();

        let mut state = load_needs_state(self.store(), character, config).await?;
        let mut outcome = ActionOutcome::default();

        if choice.triggers_long_rest {
            outcome.long_rest_applied = self
                .apply_long_rest_locked(character, &mut state, now_seconds)
                .await?;
            return Ok(outcome);
        }

        if let Some(reduces_by) = choice.reduces_by {
            let before = state.value(tracker_id);
            let after = self
                .set_value_locked(
                    character,
                    &mut state,
                    tracker_id,
                    before - reduces_by,
                    SetValueOptions {
                        triggered_by_consumption: false,
                        force_effect_update: true,
                    },
                )
                .await?;
            outcome.changes.push((tracker_id.to_string(), after - before));
        }

        for (target_id, change) in [
            (crate::config::tracker_ids::STRESS, choice.stress_change),
            (crate::config::tracker_ids::BOREDOM, choice.boredom_change),
        ] {
            if change == 0.0 || target_id == tracker_id || config.tracker(target_id).is_none() {
                continue;
            }
            let before = state.value(target_id);
            let after = self
                .set_value_locked(
                    character,
                    &mut state,
                    target_id,
                    before + change,
                    SetValueOptions::default(),
                )
                .await?;
            if after != before {
                outcome.changes.push((target_id.to_string(), after - before));
            }
        }
        Ok(outcome)
    }
}
