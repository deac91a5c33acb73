//! Passive accrual on world-time intervals.
//!
//! Accrual is quantized: only whole elapsed intervals count, and the marker
//! advances by exactly the intervals consumed, so partial-interval remainders
//! are never lost to drift.

use log::{debug, warn};

use crate::effects::{ConditionResolver, EffectApi};
use crate::engine::NeedsEngine;
use crate::error::Result;
use crate::store::{load_needs_state, CharacterId, FlagPath, NeedsStore};

/// Outcome of one [`NeedsEngine::advance_all`] sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdvanceReport {
    pub processed: usize,
    pub updated: usize,
    pub failed: usize,
}

impl<S, E, C> NeedsEngine<S, E, C>
where
    S: NeedsStore,
    E: EffectApi,
    C: ConditionResolver,
{
    /// Advances one character to `now_seconds`. Returns whether any tracker
    /// value changed. A character with no accrual marker is initialized
    /// instead and skipped for this tick.
    pub async fn advance(&self, character: &CharacterId, now_seconds: f64) -> Result<bool> {
        let _guard = self.lock_character(character).await;
        self.advance_locked(character, now_seconds).await
    }

    /// Advances every character the store knows about. One character's failure
    /// is logged and counted; the sweep continues.
    pub async fn advance_all(&self, now_seconds: f64) -> Result<AdvanceReport> {
        let mut report = AdvanceReport::default();
        for character in self.store().characters().await? {
            report.processed += 1;
            match self.advance(&character, now_seconds).await {
                Ok(true) => report.updated += 1,
                Ok(false) => {}
                Err(err) => {
                    warn!("advancing {character} failed: {err}");
                    report.failed += 1;
                }
            }
        }
        debug!(
            "advance sweep: {} processed, {} updated, {} failed",
            report.processed, report.updated, report.failed
        );
        Ok(report)
    }

    pub(crate) async fn advance_locked(
        &self,
        character: &CharacterId,
        now_seconds: f64,
    ) -> Result<bool> {
        let config = self.config();
        let mut state = load_needs_state(self.store(), character, config).await?;

        let Some(last) = state.last_update_time else {
            debug!("{character} has no accrual marker, initializing");
            self.initialize_locked(character, now_seconds, &state).await?;
            return Ok(false);
        };

        let interval = config.globals.interval_seconds();
        if interval <= 0.0 || config.enabled_trackers().next().is_none() {
            return Ok(false);
        }
        let elapsed = now_seconds - last;
        let intervals = (elapsed / interval).floor();
        if intervals < 1.0 {
            return Ok(false);
        }

        let mut writes: Vec<(FlagPath, f64)> = Vec::new();
        for tracker in config.enabled_trackers() {
            let subs = state.subs(&tracker.id);
            let rate = tracker.effective_rate(&subs);
            if rate == 0.0 {
                continue;
            }
            let current = state.value(&tracker.id);
            let next = (current + rate * intervals).clamp(0.0, tracker.effective_max(&subs));
            if next != current {
                writes.push((FlagPath::tracker(&tracker.id), next));
            }
        }

        let changed = !writes.is_empty();
        // Consume exactly the whole intervals; the remainder stays pending.
        writes.push((FlagPath::last_update_time(), last + intervals * interval));
        self.store().batch_update(character, &writes).await?;

        for (path, value) in &writes {
            if path.sub.is_none() {
                if let Some(tracker) = state.trackers.get_mut(&path.key) {
                    tracker.value = *value;
                }
            }
        }
        self.reconcile_inner(character, &state).await?;
        Ok(changed)
    }
}
