//! Eating and drinking.
//!
//! One consumption is a single transaction: every reduction, derived fill,
//! and mood delta is computed against the same before-snapshot, rounded per
//! component, and written in one batch before a single reconcile.

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::{tracker_ids, ItemFilter};
use crate::effects::{ConditionResolver, EffectApi};
use crate::engine::NeedsEngine;
use crate::error::{NeedsError, Result};
use crate::store::{load_needs_state, CharacterId, FlagPath, NeedsStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CaloricType {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DrinkCaloric {
    #[default]
    None,
    Slight,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Taste {
    Boring,
    #[default]
    Average,
    Interesting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DrinkQuality {
    Dirty,
    #[default]
    Average,
    Purified,
}

/// The thing being consumed, as the host sees it.
#[derive(Debug, Clone)]
pub struct ConsumedItem {
    pub name: String,
    /// Bulk of one use, in the host's bulk units.
    pub effective_bulk: f64,
    /// Standard-use items skip the bulk scaling and restore the configured
    /// baseline exactly (a standard ration, a standard waterskin pull).
    pub standard_use: bool,
}

/// The user's answers about what they consumed.
#[derive(Debug, Clone)]
pub struct ConsumptionChoice {
    pub target_tracker_id: String,
    pub caloric: CaloricType,
    pub drink_caloric: DrinkCaloric,
    pub taste: Taste,
    pub quality: DrinkQuality,
    pub alcoholic: bool,
    pub potion: bool,
}

impl Default for ConsumptionChoice {
    fn default() -> Self {
        Self {
            target_tracker_id: tracker_ids::HUNGER.to_string(),
            caloric: CaloricType::default(),
            drink_caloric: DrinkCaloric::default(),
            taste: Taste::default(),
            quality: DrinkQuality::default(),
            alcoholic: false,
            potion: false,
        }
    }
}

/// Per-tracker result of one consumption.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerDelta {
    pub tracker_id: String,
    /// Signed change asked for before clamping.
    pub requested: f64,
    /// Signed change actually stored.
    pub actual: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ConsumptionOutcome {
    pub deltas: Vec<TrackerDelta>,
    pub narrative: Vec<String>,
}

impl<S, E, C> NeedsEngine<S, E, C>
where
    S: NeedsStore,
    E: EffectApi,
    C: ConditionResolver,
{
    /// Consumes one use of an item against the chosen tracker.
    pub async fn consume(
        &self,
        character: &CharacterId,
        item: &ConsumedItem,
        choice: &ConsumptionChoice,
    ) -> Result<ConsumptionOutcome> {
        let _guard = self.lock_character(character).await;
        let config = self.config();
        let target = config
            .tracker(&choice.target_tracker_id)
            .ok_or_else(|| {
                NeedsError::InvalidInput(format!(
                    "unknown tracker '{}'",
                    choice.target_tracker_id
                ))
            })?;
        if !target.regeneration.by_item {
            return Err(NeedsError::InvalidInput(format!(
                "tracker '{}' is not restored by items",
                target.id
            )));
        }

        let mut state = load_needs_state(self.store(), character, config).await?;
        let settings = &config.consumption;
        let is_drink = target.id == tracker_ids::THIRST;

        let standard_bulk = if is_drink {
            settings.standard_drink_use_bulk
        } else {
            settings.standard_food_use_bulk
        };
        let effectiveness = if item.standard_use || standard_bulk <= 0.0 {
            1.0
        } else {
            item.effective_bulk / standard_bulk
        };

        // Requested decreases per tracker. A standard use restores the exact
        // configured baseline; only the bulk-scaled path rounds.
        let mut reductions: BTreeMap<String, f64> = BTreeMap::new();
        if is_drink {
            let thirst = if item.standard_use {
                target.regeneration.item_restore_amount
            } else {
                (target.regeneration.item_restore_amount * effectiveness).round()
            };
            reductions.insert(target.id.clone(), thirst);
            // Caloric drinks also ease hunger through the drink table, but
            // only in the bulk-scaled path.
            if !item.standard_use {
                let drink_mod = match choice.drink_caloric {
                    DrinkCaloric::None => settings.drink_caloric_modifiers.none,
                    DrinkCaloric::Slight => settings.drink_caloric_modifiers.slight,
                    DrinkCaloric::High => settings.drink_caloric_modifiers.high,
                };
                if let Some(hunger) = config.tracker(tracker_ids::HUNGER) {
                    let amount = (hunger.regeneration.item_restore_amount
                        * drink_mod
                        * effectiveness)
                        .round();
                    if amount > 0.0 {
                        reductions.insert(hunger.id.clone(), amount);
                    }
                }
            }
        } else if item.standard_use {
            reductions.insert(target.id.clone(), target.regeneration.item_restore_amount);
        } else {
            let caloric_mod = match choice.caloric {
                CaloricType::Low => settings.food_caloric_modifiers.low,
                CaloricType::Medium => settings.food_caloric_modifiers.medium,
                CaloricType::High => settings.food_caloric_modifiers.high,
            };
            let amount =
                (target.regeneration.item_restore_amount * caloric_mod * effectiveness).round();
            reductions.insert(target.id.clone(), amount);
        }

        let mut outcome = ConsumptionOutcome::default();
        let mut working: BTreeMap<String, f64> = BTreeMap::new();

        fn before(
            state: &crate::store::NeedsState,
            working: &BTreeMap<String, f64>,
            id: &str,
        ) -> f64 {
            working.get(id).copied().unwrap_or_else(|| state.value(id))
        }

        // Primary reductions, with the actual (post-clamp) decrease kept for
        // the derived fills.
        let mut actual_reductions: BTreeMap<String, f64> = BTreeMap::new();
        for (tracker_id, reduction) in &reductions {
            let Some(def) = config.tracker(tracker_id) else {
                continue;
            };
            let subs = state.subs(tracker_id);
            let current = before(&state, &working, tracker_id);
            let next = (current - reduction).clamp(0.0, def.effective_max(&subs));
            let actual = current - next;
            working.insert(tracker_id.clone(), next);
            actual_reductions.insert(tracker_id.clone(), actual);
            outcome.deltas.push(TrackerDelta {
                tracker_id: tracker_id.clone(),
                requested: -reduction,
                actual: -actual,
            });
        }

        // Second-order fills keyed off the reductions that actually landed.
        for rule in &settings.derived_fills {
            let Some(&actual) = actual_reductions.get(&rule.trigger_tracker_id) else {
                continue;
            };
            if actual <= 0.0 {
                continue;
            }
            let Some(def) = config.tracker(&rule.target_tracker_id) else {
                continue;
            };
            if !def.enabled {
                continue;
            }
            let fill = (actual * rule.multiplier).round();
            let subs = state.subs(&def.id);
            let current = before(&state, &working, &def.id);
            let next = (current + fill).clamp(0.0, def.effective_max(&subs));
            working.insert(def.id.clone(), next);
            outcome.deltas.push(TrackerDelta {
                tracker_id: def.id.clone(),
                requested: fill,
                actual: next - current,
            });
        }

        // Mood deltas, accumulated per tracker before clamping. A standard
        // use is plain fare: boring food, no quality judgement on the drink.
        let mut mood: BTreeMap<&str, f64> = BTreeMap::new();
        let taste = if item.standard_use && !is_drink {
            Taste::Boring
        } else {
            choice.taste
        };
        let tasted = !is_drink || choice.drink_caloric != DrinkCaloric::None;
        if tasted {
            let delta = match taste {
                Taste::Boring => settings.taste_boredom.boring,
                Taste::Average => settings.taste_boredom.average,
                Taste::Interesting => settings.taste_boredom.interesting,
            };
            *mood.entry(tracker_ids::BOREDOM).or_default() += delta;
        }
        if is_drink && !item.standard_use {
            let delta = match choice.quality {
                DrinkQuality::Dirty => settings.quality_stress.dirty,
                DrinkQuality::Average => settings.quality_stress.average,
                DrinkQuality::Purified => settings.quality_stress.purified,
            };
            *mood.entry(tracker_ids::STRESS).or_default() += delta;
        }
        if choice.alcoholic {
            *mood.entry(tracker_ids::STRESS).or_default() += settings.alcoholic.stress;
            *mood.entry(tracker_ids::BOREDOM).or_default() += settings.alcoholic.boredom;
        }
        if choice.potion {
            *mood.entry(tracker_ids::STRESS).or_default() += settings.potion.stress;
            *mood.entry(tracker_ids::BOREDOM).or_default() += settings.potion.boredom;
        }
        for (tracker_id, delta) in mood {
            if delta == 0.0 {
                continue;
            }
            let Some(def) = config.tracker(tracker_id).filter(|d| d.enabled) else {
                continue;
            };
            let rounded = delta.round();
            let subs = state.subs(tracker_id);
            let current = before(&state, &working, tracker_id);
            let next = (current + rounded).clamp(0.0, def.effective_max(&subs));
            if next != current {
                working.insert(tracker_id.to_string(), next);
            }
            outcome.deltas.push(TrackerDelta {
                tracker_id: tracker_id.to_string(),
                requested: rounded,
                actual: next - current,
            });
        }

        let writes: Vec<(FlagPath, f64)> = working
            .iter()
            .filter(|(id, value)| state.value(id) != **value)
            .map(|(id, value)| (FlagPath::tracker(id), *value))
            .collect();
        if !writes.is_empty() {
            self.store().batch_update(character, &writes).await?;
            for (path, value) in &writes {
                if let Some(entry) = state.trackers.get_mut(&path.key) {
                    entry.value = *value;
                }
            }
        }

        for delta in &outcome.deltas {
            if delta.actual != 0.0 {
                outcome.narrative.push(format!(
                    "{}: {:+}",
                    delta.tracker_id, delta.actual
                ));
            }
        }
        debug!(
            "{character} consumed '{}' targeting {}: {:?}",
            item.name, target.id, outcome.narrative
        );

        self.reconcile_inner(character, &state).await?;
        Ok(outcome)
    }
}

// --- Inventory matching ---------------------------------------------------

/// One host inventory entry, reduced to what item matching needs.
#[derive(Debug, Clone)]
pub struct InventoryItem {
    pub name: String,
    /// Host item type (e.g. `consumable`, `equipment`).
    pub kind: String,
    pub remaining_uses: Option<u32>,
    pub quantity: u32,
    pub effective_bulk_per_use: f64,
}

impl InventoryItem {
    /// Usable means at least one use or one unit left.
    pub fn is_usable(&self) -> bool {
        match self.remaining_uses {
            Some(uses) => uses > 0,
            None => self.quantity > 0,
        }
    }
}

/// Provides a character's inventory for item-based regeneration.
pub trait ItemSource: Send + Sync {
    fn items(
        &self,
        character: &CharacterId,
    ) -> impl std::future::Future<Output = Result<Vec<InventoryItem>>> + Send;
}

/// Items matching a tracker's consumption filter: usable, of an allowed type,
/// and named by at least one keyword. An empty type list means `consumable`
/// only; an empty keyword list matches any name.
pub fn matching_items(filter: &ItemFilter, items: &[InventoryItem]) -> Vec<InventoryItem> {
    items
        .iter()
        .filter(|item| item.is_usable())
        .filter(|item| {
            if filter.types.is_empty() {
                item.kind == "consumable"
            } else {
                filter.types.iter().any(|t| t == &item.kind)
            }
        })
        .filter(|item| {
            if filter.name_keywords.is_empty() {
                return true;
            }
            let name = item.name.to_lowercase();
            filter
                .name_keywords
                .iter()
                .any(|kw| name.contains(&kw.to_lowercase()))
        })
        .cloned()
        .collect()
}
