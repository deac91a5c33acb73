use std::collections::BTreeMap;
use std::sync::Arc;

use survival_needs::{
    config::{tracker_ids, SUB_FOLLOWERS, SUB_SHRINES},
    effect_slug, BuiltinConditions, CaloricType, CharacterId, ConsumedItem, ConsumptionChoice,
    DrinkCaloric, DrinkQuality, EffectApi, EffectDescriptor, EffectKey, FlagValue, MemoryEffects,
    MemoryStore, NeedsConfig, NeedsEngine, NeedsStore, SetValueOptions, Taste,
};

type Engine = NeedsEngine<Arc<MemoryStore>, Arc<MemoryEffects>, BuiltinConditions>;

const INTERVAL: f64 = 4.0 * 3600.0;

fn setup() -> (Engine, Arc<MemoryStore>, Arc<MemoryEffects>, CharacterId) {
    let store = Arc::new(MemoryStore::new());
    let effects = Arc::new(MemoryEffects::new());
    let character = CharacterId::from("valeros");
    store.add_character(character.clone());
    let engine = NeedsEngine::new(
        NeedsConfig::builtin(),
        Arc::clone(&store),
        Arc::clone(&effects),
        BuiltinConditions,
    );
    (engine, store, effects, character)
}

async fn value(engine: &Engine, character: &CharacterId, tracker: &str) -> f64 {
    engine.snapshot(character).await.unwrap().value(tracker)
}

async fn applied_keys(effects: &MemoryEffects, character: &CharacterId) -> Vec<EffectKey> {
    let mut keys: Vec<EffectKey> = effects
        .list_managed(character)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.key)
        .collect();
    keys.sort();
    keys
}

#[tokio::test]
async fn values_clamp_to_the_tracker_range() {
    let (engine, _, _, ch) = setup();
    engine.ensure_initialized(&ch, 0.0).await.unwrap();

    let stored = engine
        .set_value(&ch, tracker_ids::HUNGER, 1_000_000.0, SetValueOptions::default())
        .await
        .unwrap();
    assert_eq!(stored, 100.0);

    let stored = engine
        .set_value(&ch, tracker_ids::HUNGER, -50.0, SetValueOptions::default())
        .await
        .unwrap();
    assert_eq!(stored, 0.0);
}

#[tokio::test]
async fn unknown_tracker_and_non_finite_values_are_rejected() {
    let (engine, _, _, ch) = setup();
    engine.ensure_initialized(&ch, 0.0).await.unwrap();

    assert!(engine
        .set_value(&ch, "no-such-tracker", 10.0, SetValueOptions::default())
        .await
        .is_err());
    assert!(engine
        .set_value(&ch, tracker_ids::HUNGER, f64::NAN, SetValueOptions::default())
        .await
        .is_err());
    // Nothing was written.
    assert_eq!(value(&engine, &ch, tracker_ids::HUNGER).await, 0.0);
}

#[tokio::test]
async fn first_advance_initializes_instead_of_accruing() {
    let (engine, store, _, ch) = setup();

    let changed = engine.advance(&ch, 10.0 * INTERVAL).await.unwrap();
    assert!(!changed);
    assert_eq!(value(&engine, &ch, tracker_ids::HUNGER).await, 0.0);

    let marker = store.read(&ch, "lastUpdateTime").await.unwrap().unwrap();
    assert_eq!(marker.value(), Some(10.0 * INTERVAL));
}

#[tokio::test]
async fn accrual_consumes_whole_intervals_without_drift() {
    let (engine, store, _, ch) = setup();
    engine.ensure_initialized(&ch, 0.0).await.unwrap();

    // 2.5 intervals elapsed: exactly two are consumed.
    engine.advance(&ch, 2.5 * INTERVAL).await.unwrap();
    assert_eq!(value(&engine, &ch, tracker_ids::THIRST).await, 2.0 * 3.33);
    let marker = store.read(&ch, "lastUpdateTime").await.unwrap().unwrap();
    assert_eq!(marker.value(), Some(2.0 * INTERVAL));

    // The same clock again: less than a full interval pending, no change.
    let changed = engine.advance(&ch, 2.5 * INTERVAL).await.unwrap();
    assert!(!changed);
    assert_eq!(value(&engine, &ch, tracker_ids::THIRST).await, 2.0 * 3.33);

    // The half interval plus another half makes the third tick.
    engine.advance(&ch, 3.0 * INTERVAL).await.unwrap();
    assert_eq!(value(&engine, &ch, tracker_ids::THIRST).await, 3.0 * 3.33);
}

#[tokio::test]
async fn accrual_pushes_a_tracker_into_its_top_band() {
    let (engine, _, effects, ch) = setup();
    engine.ensure_initialized(&ch, 0.0).await.unwrap();
    engine
        .set_value(&ch, tracker_ids::HUNGER, 89.0, SetValueOptions::default())
        .await
        .unwrap();

    engine.advance(&ch, 3.0 * INTERVAL).await.unwrap();
    let hunger = value(&engine, &ch, tracker_ids::HUNGER).await;
    assert!(hunger > 90.0, "hunger was {hunger}");

    let keys = applied_keys(&effects, &ch).await;
    assert!(keys.contains(&EffectKey::new("hunger", "Starving")));
}

#[tokio::test]
async fn reconciliation_is_idempotent_and_keeps_one_effect_per_tracker() {
    let (engine, _, effects, ch) = setup();
    engine.ensure_initialized(&ch, 0.0).await.unwrap();
    engine
        .set_value(&ch, tracker_ids::HUNGER, 95.0, SetValueOptions::default())
        .await
        .unwrap();

    let first = engine.reconcile(&ch).await.unwrap();
    assert!(first.is_noop(), "set_value already reconciled: {first:?}");
    let second = engine.reconcile(&ch).await.unwrap();
    assert!(second.is_noop());

    let hunger_effects: Vec<_> = applied_keys(&effects, &ch)
        .await
        .into_iter()
        .filter(|k| k.tracker_id == "hunger")
        .collect();
    assert_eq!(hunger_effects, vec![EffectKey::new("hunger", "Starving")]);

    // Dropping below the band swaps the effect, still exactly one.
    engine
        .set_value(&ch, tracker_ids::HUNGER, 50.0, SetValueOptions::default())
        .await
        .unwrap();
    let hunger_effects: Vec<_> = applied_keys(&effects, &ch)
        .await
        .into_iter()
        .filter(|k| k.tracker_id == "hunger")
        .collect();
    assert_eq!(hunger_effects, vec![EffectKey::new("hunger", "Peckish")]);
}

#[tokio::test]
async fn duplicate_managed_effects_converge_back_to_one() {
    let (engine, _, effects, ch) = setup();
    engine.ensure_initialized(&ch, 0.0).await.unwrap();
    engine
        .set_value(&ch, tracker_ids::HUNGER, 95.0, SetValueOptions::default())
        .await
        .unwrap();

    // A second copy of the same effect lands behind the engine's back.
    let key = EffectKey::new("hunger", "Starving");
    effects
        .create(
            &ch,
            &[EffectDescriptor {
                key: key.clone(),
                name: "Starving".to_string(),
                slug: effect_slug(&key),
                grants: vec![],
            }],
        )
        .await
        .unwrap();
    let hunger_keys: Vec<_> = applied_keys(&effects, &ch)
        .await
        .into_iter()
        .filter(|k| k.tracker_id == "hunger")
        .collect();
    assert_eq!(hunger_keys.len(), 2);

    let outcome = engine.reconcile(&ch).await.unwrap();
    assert_eq!(outcome.removed, vec![key.clone()]);
    assert!(outcome.added.is_empty(), "no re-add after the duplicate purge");
    let hunger_keys: Vec<_> = applied_keys(&effects, &ch)
        .await
        .into_iter()
        .filter(|k| k.tracker_id == "hunger")
        .collect();
    assert_eq!(hunger_keys, vec![key]);
}

#[tokio::test]
async fn threshold_selection_matches_the_band_table() {
    let (engine, _, effects, ch) = setup();
    engine.ensure_initialized(&ch, 0.0).await.unwrap();

    for (input, expected) in [
        (39.0, None),
        (85.0, Some("Famished")),
        (90.0, Some("Starving")),
    ] {
        engine
            .set_value(
                &ch,
                tracker_ids::HUNGER,
                input,
                SetValueOptions {
                    force_effect_update: true,
                    ..SetValueOptions::default()
                },
            )
            .await
            .unwrap();
        let hunger_effects: Vec<_> = applied_keys(&effects, &ch)
            .await
            .into_iter()
            .filter(|k| k.tracker_id == "hunger")
            .collect();
        match expected {
            None => assert!(hunger_effects.is_empty(), "at {input}: {hunger_effects:?}"),
            Some(name) => {
                assert_eq!(hunger_effects, vec![EffectKey::new("hunger", name)], "at {input}");
            }
        }
    }
}

#[tokio::test]
async fn orphaned_effects_from_removed_trackers_are_cleaned_up() {
    let (engine, _, effects, ch) = setup();
    engine.ensure_initialized(&ch, 0.0).await.unwrap();
    engine
        .set_value(&ch, tracker_ids::WETNESS, 80.0, SetValueOptions::default())
        .await
        .unwrap();
    assert!(applied_keys(&effects, &ch)
        .await
        .contains(&EffectKey::new("wetness", "Soaked")));

    // A config reload without the wetness tracker sheds its effect.
    let trackers: Vec<_> = NeedsConfig::builtin()
        .trackers()
        .iter()
        .filter(|t| t.id != tracker_ids::WETNESS)
        .cloned()
        .collect();
    let engine = engine.with_config(NeedsConfig::builtin().with_trackers(trackers));
    engine.reconcile(&ch).await.unwrap();
    assert!(applied_keys(&effects, &ch)
        .await
        .iter()
        .all(|k| k.tracker_id != "wetness"));
}

#[tokio::test]
async fn eating_a_standard_ration_fills_the_bowels_and_bores() {
    let (engine, _, _, ch) = setup();
    engine.ensure_initialized(&ch, 0.0).await.unwrap();
    engine
        .set_value(&ch, tracker_ids::HUNGER, 50.0, SetValueOptions::default())
        .await
        .unwrap();

    let outcome = engine
        .consume(
            &ch,
            &ConsumedItem {
                name: "Trail Rations".to_string(),
                effective_bulk: 0.02,
                standard_use: true,
            },
            &ConsumptionChoice {
                caloric: CaloricType::Medium,
                taste: Taste::Boring,
                ..ConsumptionChoice::default()
            },
        )
        .await
        .unwrap();

    // A standard use restores the exact 3.33 baseline, unrounded; the bowels
    // take round(3.33 * 6) = 20; boring food adds boredom.
    let hunger = value(&engine, &ch, tracker_ids::HUNGER).await;
    assert!((hunger - 46.67).abs() < 1e-9, "hunger was {hunger}");
    assert_eq!(value(&engine, &ch, tracker_ids::BOWELS).await, 20.0);
    assert_eq!(value(&engine, &ch, tracker_ids::BOREDOM).await, 20.0);
    assert!(!outcome.narrative.is_empty());
}

#[tokio::test]
async fn a_standard_drink_never_touches_hunger() {
    let (engine, _, _, ch) = setup();
    engine.ensure_initialized(&ch, 0.0).await.unwrap();
    engine
        .set_value(&ch, tracker_ids::THIRST, 60.0, SetValueOptions::default())
        .await
        .unwrap();
    engine
        .set_value(&ch, tracker_ids::HUNGER, 30.0, SetValueOptions::default())
        .await
        .unwrap();

    engine
        .consume(
            &ch,
            &ConsumedItem {
                name: "Waterskin".to_string(),
                effective_bulk: 0.02,
                standard_use: true,
            },
            &ConsumptionChoice {
                target_tracker_id: tracker_ids::THIRST.to_string(),
                drink_caloric: DrinkCaloric::High,
                quality: DrinkQuality::Dirty,
                ..ConsumptionChoice::default()
            },
        )
        .await
        .unwrap();

    // The exact 20-point baseline, with the bladder fill derived from it.
    assert_eq!(value(&engine, &ch, tracker_ids::THIRST).await, 40.0);
    assert_eq!(value(&engine, &ch, tracker_ids::BLADDER).await, 40.0);
    // A standard pull skips the drink-caloric hunger table and the quality
    // stress table, whatever the choice says.
    assert_eq!(value(&engine, &ch, tracker_ids::HUNGER).await, 30.0);
    assert_eq!(value(&engine, &ch, tracker_ids::STRESS).await, 0.0);
}

#[tokio::test]
async fn oversized_meals_scale_by_bulk() {
    let (engine, _, _, ch) = setup();
    engine.ensure_initialized(&ch, 0.0).await.unwrap();
    engine
        .set_value(&ch, tracker_ids::HUNGER, 50.0, SetValueOptions::default())
        .await
        .unwrap();

    // Double bulk, high caloric: 3.33 * 1.5 * 2 rounds to 10.
    engine
        .consume(
            &ch,
            &ConsumedItem {
                name: "Feast Platter".to_string(),
                effective_bulk: 0.04,
                standard_use: false,
            },
            &ConsumptionChoice {
                caloric: CaloricType::High,
                ..ConsumptionChoice::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(value(&engine, &ch, tracker_ids::HUNGER).await, 40.0);
    assert_eq!(value(&engine, &ch, tracker_ids::BOWELS).await, 60.0);
}

#[tokio::test]
async fn drinking_dirty_ale_hits_thirst_bladder_and_mood() {
    let (engine, _, _, ch) = setup();
    engine.ensure_initialized(&ch, 0.0).await.unwrap();
    for (tracker, start) in [
        (tracker_ids::THIRST, 60.0),
        (tracker_ids::STRESS, 10.0),
        (tracker_ids::BOREDOM, 50.0),
    ] {
        engine
            .set_value(&ch, tracker, start, SetValueOptions::default())
            .await
            .unwrap();
    }

    engine
        .consume(
            &ch,
            &ConsumedItem {
                name: "Mug of Ale".to_string(),
                effective_bulk: 0.02,
                standard_use: false,
            },
            &ConsumptionChoice {
                target_tracker_id: tracker_ids::THIRST.to_string(),
                drink_caloric: DrinkCaloric::Slight,
                quality: DrinkQuality::Dirty,
                alcoholic: true,
                ..ConsumptionChoice::default()
            },
        )
        .await
        .unwrap();

    // Thirst drops the full 20 baseline; the bladder takes round(20 * 2).
    assert_eq!(value(&engine, &ch, tracker_ids::THIRST).await, 40.0);
    assert_eq!(value(&engine, &ch, tracker_ids::BLADDER).await, 40.0);
    // Dirty water +25 stress, alcohol +10 stress / -40 boredom.
    assert_eq!(value(&engine, &ch, tracker_ids::STRESS).await, 45.0);
    assert_eq!(value(&engine, &ch, tracker_ids::BOREDOM).await, 10.0);
    // A slightly caloric drink eases hunger via the drink table; at zero
    // hunger the reduction lands as nothing.
    assert_eq!(value(&engine, &ch, tracker_ids::HUNGER).await, 0.0);
}

#[tokio::test]
async fn consumption_driven_decreases_cascade_into_coupled_trackers() {
    let (engine, _, _, ch) = setup();
    engine.ensure_initialized(&ch, 0.0).await.unwrap();
    engine
        .set_value(&ch, tracker_ids::THIRST, 60.0, SetValueOptions::default())
        .await
        .unwrap();
    assert_eq!(value(&engine, &ch, tracker_ids::BLADDER).await, 0.0);

    // A 20-point thirst drop at 200% puts 40 points on the bladder.
    engine
        .set_value(
            &ch,
            tracker_ids::THIRST,
            40.0,
            SetValueOptions {
                triggered_by_consumption: true,
                ..SetValueOptions::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(value(&engine, &ch, tracker_ids::BLADDER).await, 40.0);

    // A manual correction does not cascade.
    engine
        .set_value(&ch, tracker_ids::THIRST, 20.0, SetValueOptions::default())
        .await
        .unwrap();
    assert_eq!(value(&engine, &ch, tracker_ids::BLADDER).await, 40.0);
}

#[tokio::test]
async fn long_rest_restores_the_rest_regenerated_trackers() {
    let (engine, store, _, ch) = setup();
    engine.ensure_initialized(&ch, 0.0).await.unwrap();
    engine
        .set_value(&ch, tracker_ids::SLEEP, 90.0, SetValueOptions::default())
        .await
        .unwrap();
    engine
        .set_value(&ch, tracker_ids::STRESS, 60.0, SetValueOptions::default())
        .await
        .unwrap();
    engine
        .set_value(&ch, tracker_ids::HUNGER, 80.0, SetValueOptions::default())
        .await
        .unwrap();

    let changed = engine.apply_long_rest(&ch, 8.0 * 3600.0).await.unwrap();
    assert!(changed);
    assert_eq!(value(&engine, &ch, tracker_ids::SLEEP).await, 10.0);
    assert_eq!(value(&engine, &ch, tracker_ids::STRESS).await, 10.0);
    // Hunger does not regenerate by rest.
    assert_eq!(value(&engine, &ch, tracker_ids::HUNGER).await, 80.0);
    let marker = store.read(&ch, "lastUpdateTime").await.unwrap().unwrap();
    assert_eq!(marker.value(), Some(8.0 * 3600.0));
}

#[tokio::test]
async fn long_rest_with_nothing_to_restore_is_a_noop() {
    let (engine, store, _, ch) = setup();
    engine.ensure_initialized(&ch, 123.0).await.unwrap();

    let changed = engine.apply_long_rest(&ch, 9999.0).await.unwrap();
    assert!(!changed);
    // The marker keeps its original stamp.
    let marker = store.read(&ch, "lastUpdateTime").await.unwrap().unwrap();
    assert_eq!(marker.value(), Some(123.0));
}

#[tokio::test]
async fn initialization_runs_once() {
    let (engine, _, _, ch) = setup();
    assert!(engine.ensure_initialized(&ch, 0.0).await.unwrap());
    engine
        .set_value(&ch, tracker_ids::HUNGER, 42.0, SetValueOptions::default())
        .await
        .unwrap();
    // Already initialized: values survive.
    assert!(!engine.ensure_initialized(&ch, 50.0).await.unwrap());
    assert_eq!(value(&engine, &ch, tracker_ids::HUNGER).await, 42.0);
}

#[tokio::test]
async fn divine_favor_accrues_and_caps_with_sub_properties() {
    let (engine, store, _, ch) = setup();
    engine.ensure_initialized(&ch, 0.0).await.unwrap();

    let mut bundle = BTreeMap::new();
    bundle.insert("value".to_string(), 0.0);
    bundle.insert(SUB_SHRINES.to_string(), 12.0);
    bundle.insert(SUB_FOLLOWERS.to_string(), 25.0);
    store.seed(&ch, tracker_ids::FAVOR, FlagValue::Bundle(bundle));

    // Rate 0.1 per shrine per interval.
    engine.advance(&ch, INTERVAL).await.unwrap();
    let favor = value(&engine, &ch, tracker_ids::FAVOR).await;
    assert!((favor - 1.2).abs() < 1e-9, "favor was {favor}");

    // Max is 10 + floor(12/5) + floor(25/10) = 14.
    let stored = engine
        .set_value(&ch, tracker_ids::FAVOR, 99.0, SetValueOptions::default())
        .await
        .unwrap();
    assert_eq!(stored, 14.0);
}

#[tokio::test]
async fn relieving_resets_the_tracker_and_its_effect() {
    let (engine, _, effects, ch) = setup();
    engine.ensure_initialized(&ch, 0.0).await.unwrap();
    engine
        .set_value(&ch, tracker_ids::BLADDER, 95.0, SetValueOptions::default())
        .await
        .unwrap();
    assert!(applied_keys(&effects, &ch)
        .await
        .contains(&EffectKey::new("piss", "Urgent Bladder")));

    let stored = engine
        .relieve(&ch, tracker_ids::BLADDER, "relieve_piss")
        .await
        .unwrap();
    assert_eq!(stored, 0.0);
    assert!(applied_keys(&effects, &ch)
        .await
        .iter()
        .all(|k| k.tracker_id != "piss"));
}

#[tokio::test]
async fn boredom_choices_trade_against_stress() {
    let (engine, _, _, ch) = setup();
    engine.ensure_initialized(&ch, 0.0).await.unwrap();
    engine
        .set_value(&ch, tracker_ids::BOREDOM, 50.0, SetValueOptions::default())
        .await
        .unwrap();
    engine
        .set_value(&ch, tracker_ids::STRESS, 10.0, SetValueOptions::default())
        .await
        .unwrap();

    let outcome = engine
        .apply_choice(&ch, tracker_ids::BOREDOM, "relieve_boredom", "start_argument", 0.0)
        .await
        .unwrap();
    assert!(!outcome.long_rest_applied);
    assert_eq!(value(&engine, &ch, tracker_ids::BOREDOM).await, 25.0);
    assert_eq!(value(&engine, &ch, tracker_ids::STRESS).await, 35.0);
}

#[tokio::test]
async fn the_full_rest_choice_triggers_a_long_rest() {
    let (engine, _, _, ch) = setup();
    engine.ensure_initialized(&ch, 0.0).await.unwrap();
    engine
        .set_value(&ch, tracker_ids::SLEEP, 70.0, SetValueOptions::default())
        .await
        .unwrap();

    let outcome = engine
        .apply_choice(&ch, tracker_ids::SLEEP, "manage_sleep", "full_long_rest", 1000.0)
        .await
        .unwrap();
    assert!(outcome.long_rest_applied);
    assert_eq!(value(&engine, &ch, tracker_ids::SLEEP).await, 0.0);
}

#[tokio::test]
async fn advance_all_isolates_per_character_failures() {
    let (engine, store, _, ch) = setup();
    let other = CharacterId::from("merisiel");
    store.add_character(other.clone());
    engine.ensure_initialized(&ch, 0.0).await.unwrap();
    engine.ensure_initialized(&other, 0.0).await.unwrap();

    let report = engine.advance_all(2.0 * INTERVAL).await.unwrap();
    assert_eq!(report.processed, 2);
    assert_eq!(report.updated, 2);
    assert_eq!(report.failed, 0);
    assert_eq!(value(&engine, &other, tracker_ids::THIRST).await, 2.0 * 3.33);
}
