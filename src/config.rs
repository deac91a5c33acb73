//! Tracker and consumption configuration.
//!
//! The host persists configuration as JSON blobs. Everything here is parsed
//! and defaulted once into an immutable [`NeedsConfig`] snapshot; a config
//! change means building a new snapshot, never mutating a live one.

use std::collections::BTreeSet;

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ids of the built-in trackers that other components refer to by name.
pub mod tracker_ids {
    pub const HUNGER: &str = "hunger";
    pub const THIRST: &str = "thirst";
    pub const SLEEP: &str = "sleep";
    pub const BLADDER: &str = "piss";
    pub const BOWELS: &str = "poop";
    pub const BOREDOM: &str = "boredom";
    pub const STRESS: &str = "stress";
    pub const WETNESS: &str = "wetness";
    pub const FAVOR: &str = "favor";
}

/// Sub-property names used by dynamic-max trackers.
pub const SUB_SHRINES: &str = "shrines";
pub const SUB_FOLLOWERS: &str = "followers";

fn default_enabled() -> bool {
    true
}

fn default_max_value() -> f64 {
    100.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerDef {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub default_value: f64,
    #[serde(default = "default_max_value")]
    pub max_value: f64,
    /// Legacy passive rate field; `base_increase_per_interval` wins when set.
    #[serde(default)]
    pub increase_per_interval: f64,
    #[serde(default)]
    pub base_increase_per_interval: Option<f64>,
    /// Conditional accrual addend scaled by the `shrines` sub-property.
    #[serde(default)]
    pub increase_per_shrine_per_interval: Option<f64>,
    #[serde(default)]
    pub is_dynamic_max: bool,
    #[serde(default)]
    pub default_max_value: Option<f64>,
    #[serde(default)]
    pub shrines_per_extra_point: Option<f64>,
    #[serde(default)]
    pub followers_per_max_point: Option<f64>,
    #[serde(default)]
    pub sub_properties: Vec<SubPropertyDef>,
    #[serde(default)]
    pub threshold_effects: Vec<ThresholdBand>,
    #[serde(default)]
    pub regeneration: Regeneration,
    #[serde(default)]
    pub decrease_when_other_tracker_decreases: Option<CouplingRule>,
    #[serde(default)]
    pub special_actions: Vec<SpecialAction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubPropertyDef {
    pub id: String,
    #[serde(default)]
    pub default_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdBand {
    pub threshold: f64,
    pub name: String,
    #[serde(default)]
    pub symptoms: Vec<Symptom>,
}

/// One external condition grant, with an optional severity badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Symptom {
    pub slug: String,
    #[serde(default)]
    pub value: Option<u8>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Regeneration {
    #[serde(default)]
    pub by_long_rest: bool,
    #[serde(default)]
    pub long_rest_amount: f64,
    #[serde(default)]
    pub by_item: bool,
    #[serde(default)]
    pub item_restore_amount: f64,
    #[serde(default)]
    pub item_filter: ItemFilter,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemFilter {
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub name_keywords: Vec<String>,
}

/// "When tracker X decreases by consumption, raise this tracker by a
/// percentage of the decrease."
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouplingRule {
    pub source_tracker_id: String,
    pub increase_this_tracker_by_percentage_of_other: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecialAction {
    pub id: String,
    #[serde(default)]
    pub label: String,
    /// Direct relief actions set the tracker to this floor.
    #[serde(default)]
    pub reduces_to: Option<f64>,
    #[serde(default)]
    pub opens_choices_dialog: bool,
    #[serde(default)]
    pub choices: Vec<ActionChoice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionChoice {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub reduces_by: Option<f64>,
    #[serde(default)]
    pub triggers_long_rest: bool,
    #[serde(default)]
    pub stress_change: f64,
    #[serde(default)]
    pub boredom_change: f64,
}

impl TrackerDef {
    /// Passive accrual per interval, including the shrine-scaled addend.
    pub fn effective_rate(&self, subs: &std::collections::BTreeMap<String, f64>) -> f64 {
        let base = self
            .base_increase_per_interval
            .unwrap_or(self.increase_per_interval);
        let per_shrine = self.increase_per_shrine_per_interval.unwrap_or(0.0);
        base + per_shrine * subs.get(SUB_SHRINES).copied().unwrap_or(0.0)
    }

    /// Value ceiling: the static max, or the dynamically computed one for
    /// trackers whose ceiling grows with shrines/followers.
    pub fn effective_max(&self, subs: &std::collections::BTreeMap<String, f64>) -> f64 {
        if !self.is_dynamic_max {
            return self.max_value;
        }
        let mut max = self.default_max_value.unwrap_or(self.max_value);
        let shrines = subs.get(SUB_SHRINES).copied().unwrap_or(0.0);
        let followers = subs.get(SUB_FOLLOWERS).copied().unwrap_or(0.0);
        if let Some(per_point) = self.shrines_per_extra_point {
            if per_point > 0.0 {
                max += (shrines / per_point).floor();
            }
        }
        if let Some(per_point) = self.followers_per_max_point {
            if per_point > 0.0 {
                max += (followers / per_point).floor();
            }
        }
        max
    }
}

// --- Consumption calculation settings -------------------------------------

fn default_standard_use_bulk() -> f64 {
    0.02
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumptionSettings {
    #[serde(default = "default_standard_use_bulk")]
    pub standard_food_use_bulk: f64,
    #[serde(default = "default_standard_use_bulk")]
    pub standard_drink_use_bulk: f64,
    #[serde(default)]
    pub food_caloric_modifiers: FoodCaloricModifiers,
    #[serde(default)]
    pub drink_caloric_modifiers: DrinkCaloricModifiers,
    #[serde(default)]
    pub taste_boredom: TasteBoredomDeltas,
    #[serde(default)]
    pub quality_stress: QualityStressDeltas,
    #[serde(default = "default_alcoholic_delta")]
    pub alcoholic: MoodDelta,
    #[serde(default = "default_potion_delta")]
    pub potion: MoodDelta,
    /// Second-order fills evaluated after any primary reduction.
    #[serde(default = "DerivedFillRule::default_set")]
    pub derived_fills: Vec<DerivedFillRule>,
}

fn default_alcoholic_delta() -> MoodDelta {
    MoodDelta {
        stress: 10.0,
        boredom: -40.0,
    }
}

fn default_potion_delta() -> MoodDelta {
    MoodDelta {
        stress: 15.0,
        boredom: -10.0,
    }
}

impl Default for ConsumptionSettings {
    fn default() -> Self {
        Self {
            standard_food_use_bulk: default_standard_use_bulk(),
            standard_drink_use_bulk: default_standard_use_bulk(),
            food_caloric_modifiers: FoodCaloricModifiers::default(),
            drink_caloric_modifiers: DrinkCaloricModifiers::default(),
            taste_boredom: TasteBoredomDeltas::default(),
            quality_stress: QualityStressDeltas::default(),
            alcoholic: default_alcoholic_delta(),
            potion: default_potion_delta(),
            derived_fills: DerivedFillRule::default_set(),
        }
    }
}

/// Multipliers on the hunger baseline by food caloric density. `medium` must
/// stay neutral (x1.0).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodCaloricModifiers {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

impl Default for FoodCaloricModifiers {
    fn default() -> Self {
        Self {
            low: 0.5,
            medium: 1.0,
            high: 1.5,
        }
    }
}

/// Multipliers on the hunger baseline for caloric drinks. `none` contributes
/// zero hunger reduction regardless of bulk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrinkCaloricModifiers {
    pub none: f64,
    pub slight: f64,
    pub high: f64,
}

impl Default for DrinkCaloricModifiers {
    fn default() -> Self {
        Self {
            none: 0.0,
            slight: 0.25,
            high: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TasteBoredomDeltas {
    pub boring: f64,
    pub average: f64,
    pub interesting: f64,
}

impl Default for TasteBoredomDeltas {
    fn default() -> Self {
        Self {
            boring: 20.0,
            average: 0.0,
            interesting: -30.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityStressDeltas {
    pub dirty: f64,
    pub average: f64,
    pub purified: f64,
}

impl Default for QualityStressDeltas {
    fn default() -> Self {
        Self {
            dirty: 25.0,
            average: 0.0,
            purified: -15.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodDelta {
    pub stress: f64,
    pub boredom: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedFillRule {
    pub trigger_tracker_id: String,
    pub target_tracker_id: String,
    pub multiplier: f64,
}

impl DerivedFillRule {
    pub fn default_set() -> Vec<Self> {
        vec![
            Self {
                trigger_tracker_id: tracker_ids::HUNGER.to_string(),
                target_tracker_id: tracker_ids::BOWELS.to_string(),
                multiplier: 6.0,
            },
            Self {
                trigger_tracker_id: tracker_ids::THIRST.to_string(),
                target_tracker_id: tracker_ids::BLADDER.to_string(),
                multiplier: 2.0,
            },
        ]
    }
}

// --- Global settings and the assembled snapshot ---------------------------

fn default_update_interval_hours() -> f64 {
    4.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSettings {
    #[serde(default = "default_update_interval_hours")]
    pub update_interval_hours: f64,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            update_interval_hours: default_update_interval_hours(),
        }
    }
}

impl GlobalSettings {
    pub fn interval_seconds(&self) -> f64 {
        self.update_interval_hours * 3600.0
    }
}

/// Immutable configuration snapshot consumed by every engine operation.
#[derive(Debug, Clone)]
pub struct NeedsConfig {
    pub globals: GlobalSettings,
    pub consumption: ConsumptionSettings,
    trackers: Vec<TrackerDef>,
}

impl Default for NeedsConfig {
    fn default() -> Self {
        Self::builtin()
    }
}

impl NeedsConfig {
    /// The built-in tracker set and calculation constants.
    pub fn builtin() -> Self {
        Self {
            globals: GlobalSettings::default(),
            consumption: ConsumptionSettings::default(),
            trackers: default_trackers(),
        }
    }

    /// Builds a snapshot from the host's raw JSON setting blobs. Malformed or
    /// missing blobs degrade to the built-in defaults with a warning; this
    /// never fails.
    pub fn from_overlays(
        globals: GlobalSettings,
        tracker_json: Option<&str>,
        consumption_json: Option<&str>,
    ) -> Self {
        let trackers = match tracker_json.map(str::trim).filter(|s| !s.is_empty()) {
            Some(text) => match serde_json::from_str::<Value>(text) {
                Ok(Value::Array(user)) => merge_tracker_overlay(default_trackers(), user),
                Ok(_) => {
                    warn!("tracker config is not a JSON array, using defaults");
                    default_trackers()
                }
                Err(err) => {
                    warn!("tracker config failed to parse ({err}), using defaults");
                    default_trackers()
                }
            },
            None => default_trackers(),
        };

        let consumption = match consumption_json.map(str::trim).filter(|s| !s.is_empty()) {
            Some(text) => match serde_json::from_str::<Value>(text) {
                Ok(user @ Value::Object(_)) => {
                    match serde_json::to_value(ConsumptionSettings::default()) {
                        Ok(mut base) => {
                            overlay_value(&mut base, &user);
                            match serde_json::from_value(base) {
                                Ok(settings) => settings,
                                Err(err) => {
                                    warn!(
                                        "consumption settings overlay invalid ({err}), using defaults"
                                    );
                                    ConsumptionSettings::default()
                                }
                            }
                        }
                        Err(err) => {
                            warn!("consumption settings unavailable ({err}), using defaults");
                            ConsumptionSettings::default()
                        }
                    }
                }
                Ok(_) => {
                    warn!("consumption settings are not a JSON object, using defaults");
                    ConsumptionSettings::default()
                }
                Err(err) => {
                    warn!("consumption settings failed to parse ({err}), using defaults");
                    ConsumptionSettings::default()
                }
            },
            None => ConsumptionSettings::default(),
        };

        let mut config = Self {
            globals,
            consumption,
            trackers,
        };
        config.sanitize();
        config
    }

    /// Replaces the tracker list wholesale (tests and embedders that build
    /// definitions programmatically).
    pub fn with_trackers(mut self, trackers: Vec<TrackerDef>) -> Self {
        self.trackers = trackers;
        self.sanitize();
        self
    }

    pub fn tracker(&self, id: &str) -> Option<&TrackerDef> {
        self.trackers.iter().find(|t| t.id == id)
    }

    pub fn trackers(&self) -> &[TrackerDef] {
        &self.trackers
    }

    pub fn enabled_trackers(&self) -> impl Iterator<Item = &TrackerDef> {
        self.trackers.iter().filter(|t| t.enabled)
    }

    /// Coupling rules fed by a decrease of `source_id`: `(target tracker,
    /// percentage)` pairs.
    pub fn couplings_from<'a>(
        &'a self,
        source_id: &'a str,
    ) -> impl Iterator<Item = (&'a TrackerDef, f64)> + 'a {
        self.enabled_trackers().filter_map(move |t| {
            t.decrease_when_other_tracker_decreases
                .as_ref()
                .filter(|rule| rule.source_tracker_id == source_id)
                .map(|rule| (t, rule.increase_this_tracker_by_percentage_of_other))
        })
    }

    fn sanitize(&mut self) {
        let mut seen = BTreeSet::new();
        self.trackers.retain(|t| {
            if t.id.is_empty() {
                warn!("dropping tracker with empty id");
                return false;
            }
            if !seen.insert(t.id.clone()) {
                warn!("duplicate tracker id '{}', keeping the first", t.id);
                return false;
            }
            true
        });
        for tracker in &mut self.trackers {
            if !tracker.max_value.is_finite() || tracker.max_value <= 0.0 {
                warn!(
                    "tracker '{}' has invalid maxValue {}, using {}",
                    tracker.id,
                    tracker.max_value,
                    default_max_value()
                );
                tracker.max_value = default_max_value();
            }
            if !tracker.default_value.is_finite() {
                tracker.default_value = 0.0;
            }
            tracker.default_value = tracker.default_value.clamp(0.0, tracker.max_value);
        }
    }
}

/// Overlays each user tracker onto the built-in definition with the same id,
/// field by field, so partial user JSON inherits the rest of the default.
/// User trackers with unknown ids are appended after receiving type-level
/// defaults.
fn merge_tracker_overlay(defaults: Vec<TrackerDef>, user: Vec<Value>) -> Vec<TrackerDef> {
    let mut merged: Vec<TrackerDef> = Vec::with_capacity(defaults.len());
    let user_by_id = |id: &str| {
        user.iter()
            .find(|v| v.get("id").and_then(Value::as_str) == Some(id))
    };

    for default in defaults {
        match user_by_id(&default.id) {
            Some(overlay) => {
                let overlaid = serde_json::to_value(&default).ok().and_then(|mut base| {
                    overlay_value(&mut base, overlay);
                    serde_json::from_value(base).ok()
                });
                match overlaid {
                    Some(tracker) => merged.push(tracker),
                    None => {
                        warn!(
                            "tracker overlay for '{}' invalid, keeping default",
                            default.id
                        );
                        merged.push(default);
                    }
                }
            }
            None => merged.push(default),
        }
    }

    for value in &user {
        let Some(id) = value.get("id").and_then(Value::as_str) else {
            warn!("ignoring custom tracker without an id");
            continue;
        };
        if merged.iter().any(|t| t.id == id) {
            continue;
        }
        match serde_json::from_value::<TrackerDef>(value.clone()) {
            Ok(tracker) => merged.push(tracker),
            Err(err) => warn!("custom tracker '{id}' invalid ({err}), skipping"),
        }
    }
    merged
}

/// Deep merge: objects merge key-wise, everything else is replaced by the
/// user value.
fn overlay_value(base: &mut Value, user: &Value) {
    match (base, user) {
        (Value::Object(base_map), Value::Object(user_map)) => {
            for (key, user_value) in user_map {
                match base_map.get_mut(key) {
                    Some(base_value) => overlay_value(base_value, user_value),
                    None => {
                        base_map.insert(key.clone(), user_value.clone());
                    }
                }
            }
        }
        (base_slot, user_value) => *base_slot = user_value.clone(),
    }
}

// --- Built-in tracker definitions -----------------------------------------

fn band(threshold: f64, name: &str, symptoms: Vec<Symptom>) -> ThresholdBand {
    ThresholdBand {
        threshold,
        name: name.to_string(),
        symptoms,
    }
}

fn sym(slug: &str, value: Option<u8>) -> Symptom {
    Symptom {
        slug: slug.to_string(),
        value,
    }
}

fn tracker(id: &str, name: &str) -> TrackerDef {
    TrackerDef {
        id: id.to_string(),
        name: name.to_string(),
        enabled: true,
        default_value: 0.0,
        max_value: 100.0,
        increase_per_interval: 0.0,
        base_increase_per_interval: None,
        increase_per_shrine_per_interval: None,
        is_dynamic_max: false,
        default_max_value: None,
        shrines_per_extra_point: None,
        followers_per_max_point: None,
        sub_properties: Vec::new(),
        threshold_effects: Vec::new(),
        regeneration: Regeneration::default(),
        decrease_when_other_tracker_decreases: None,
        special_actions: Vec::new(),
    }
}

fn choice(
    id: &str,
    label: &str,
    reduces_by: f64,
    stress_change: f64,
    boredom_change: f64,
) -> ActionChoice {
    ActionChoice {
        id: id.to_string(),
        label: label.to_string(),
        reduces_by: Some(reduces_by),
        triggers_long_rest: false,
        stress_change,
        boredom_change,
    }
}

fn keywords(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

fn default_trackers() -> Vec<TrackerDef> {
    use tracker_ids::*;

    let mut hunger = tracker(HUNGER, "Hunger");
    // 100 points over 30 days at six 4-hour intervals per day.
    hunger.increase_per_interval = 0.555;
    hunger.threshold_effects = vec![
        band(40.0, "Peckish", vec![sym("fatigued", None)]),
        band(70.0, "Famished", vec![sym("enfeebled", Some(1))]),
        band(
            90.0,
            "Starving",
            vec![
                sym("drained", Some(2)),
                sym("enfeebled", Some(2)),
                sym("fatigued", None),
            ],
        ),
    ];
    hunger.regeneration = Regeneration {
        by_long_rest: false,
        long_rest_amount: 0.0,
        by_item: true,
        item_restore_amount: 3.33,
        item_filter: ItemFilter {
            types: keywords(&["consumable", "equipment"]),
            name_keywords: keywords(&[
                "food", "ration", "meal", "jerky", "biscuit", "bread", "cheese", "meat", "stew",
                "fruit", "vegetable", "berries", "nuts",
            ]),
        },
    };

    let mut thirst = tracker(THIRST, "Thirst");
    // 100 points over 5 days at six 4-hour intervals per day.
    thirst.increase_per_interval = 3.33;
    thirst.threshold_effects = vec![
        band(35.0, "Thirsty", vec![sym("fatigued", None)]),
        band(
            70.0,
            "Parched",
            vec![sym("enfeebled", Some(1)), sym("fatigued", None)],
        ),
        band(
            90.0,
            "Dehydrated",
            vec![
                sym("enfeebled", Some(2)),
                sym("drained", Some(2)),
                sym("stupefied", Some(1)),
            ],
        ),
    ];
    thirst.regeneration = Regeneration {
        by_long_rest: false,
        long_rest_amount: 0.0,
        by_item: true,
        item_restore_amount: 20.0,
        item_filter: ItemFilter {
            types: keywords(&["consumable", "equipment"]),
            name_keywords: keywords(&[
                "water", "drink", "waterskin", "canteen", "flask", "ale", "beer", "wine", "mead",
                "juice", "tea", "broth", "potion",
            ]),
        },
    };

    let mut sleep = tracker(SLEEP, "Sleep Deprivation");
    sleep.increase_per_interval = 10.0;
    sleep.threshold_effects = vec![
        band(30.0, "Tired", vec![sym("fatigued", None)]),
        band(
            60.0,
            "Weary",
            vec![sym("slowed", Some(1)), sym("stupefied", Some(1))],
        ),
        band(
            85.0,
            "Exhausted",
            vec![
                sym("stupefied", Some(2)),
                sym("slowed", Some(1)),
                sym("drained", Some(1)),
            ],
        ),
    ];
    sleep.regeneration = Regeneration {
        by_long_rest: true,
        long_rest_amount: 80.0,
        ..Regeneration::default()
    };
    sleep.special_actions = vec![SpecialAction {
        id: "manage_sleep".to_string(),
        label: "Rest Options".to_string(),
        reduces_to: None,
        opens_choices_dialog: true,
        choices: vec![
            choice("short_nap", "Short Nap (30 min)", 15.0, 0.0, 0.0),
            choice("moderate_sleep", "Sleep (4 hours)", 40.0, 0.0, 0.0),
            ActionChoice {
                id: "full_long_rest".to_string(),
                label: "Full Night's Rest (8+ hours)".to_string(),
                reduces_by: None,
                triggers_long_rest: true,
                stress_change: 0.0,
                boredom_change: 0.0,
            },
        ],
    }];

    let mut bladder = tracker(BLADDER, "Bladder");
    bladder.threshold_effects = vec![
        band(60.0, "Need to Urinate", vec![]),
        band(
            90.0,
            "Urgent Bladder",
            vec![sym("clumsy", Some(1)), sym("fatigued", None)],
        ),
    ];
    bladder.decrease_when_other_tracker_decreases = Some(CouplingRule {
        source_tracker_id: THIRST.to_string(),
        increase_this_tracker_by_percentage_of_other: 200.0,
    });
    bladder.special_actions = vec![SpecialAction {
        id: "relieve_piss".to_string(),
        label: "Urinate".to_string(),
        reduces_to: Some(0.0),
        opens_choices_dialog: false,
        choices: Vec::new(),
    }];

    let mut bowels = tracker(BOWELS, "Bowels");
    bowels.threshold_effects = vec![
        band(70.0, "Need to Defecate", vec![sym("slowed", Some(1))]),
        band(
            95.0,
            "Bowel Emergency",
            vec![sym("enfeebled", Some(2)), sym("sickened", Some(1))],
        ),
    ];
    bowels.decrease_when_other_tracker_decreases = Some(CouplingRule {
        source_tracker_id: HUNGER.to_string(),
        increase_this_tracker_by_percentage_of_other: 600.0,
    });
    bowels.special_actions = vec![SpecialAction {
        id: "relieve_poop".to_string(),
        label: "Defecate".to_string(),
        reduces_to: Some(0.0),
        opens_choices_dialog: false,
        choices: Vec::new(),
    }];

    let mut boredom = tracker(BOREDOM, "Boredom");
    boredom.increase_per_interval = 2.0;
    boredom.threshold_effects = vec![
        band(40.0, "Restless", vec![]),
        band(70.0, "Bored", vec![sym("stupefied", Some(1))]),
        band(
            95.0,
            "Profoundly Bored",
            vec![sym("stupefied", Some(2)), sym("fascinated", None)],
        ),
    ];
    boredom.special_actions = vec![SpecialAction {
        id: "relieve_boredom".to_string(),
        label: "Alleviate Boredom".to_string(),
        reduces_to: None,
        opens_choices_dialog: true,
        choices: vec![
            choice("read", "Read a Book", 40.0, -5.0, 0.0),
            choice("play_game", "Play a Game", 25.0, -10.0, 0.0),
            choice("socialize", "Pleasant Socializing", 30.0, -15.0, 0.0),
            choice("gamble_small", "Gamble (Small Stakes)", 25.0, 10.0, 0.0),
            choice(
                "start_argument",
                "Start a Pointless Argument",
                25.0,
                25.0,
                0.0,
            ),
        ],
    }];

    let mut stress = tracker(STRESS, "Stress");
    stress.threshold_effects = vec![
        band(40.0, "Anxious", vec![]),
        band(70.0, "Stressed", vec![sym("frightened", Some(1))]),
        band(
            95.0,
            "Overwhelmed",
            vec![
                sym("stupefied", Some(2)),
                sym("frightened", Some(2)),
                sym("confused", None),
            ],
        ),
    ];
    stress.regeneration = Regeneration {
        by_long_rest: true,
        long_rest_amount: 50.0,
        ..Regeneration::default()
    };
    stress.special_actions = vec![SpecialAction {
        id: "relieve_stress".to_string(),
        label: "Alleviate Stress".to_string(),
        reduces_to: None,
        opens_choices_dialog: true,
        choices: vec![
            choice("meditate", "Meditate", 30.0, 0.0, 5.0),
            choice("talk_it_out", "Talk with a Confidante", 40.0, 0.0, -5.0),
            choice("relaxing_hobby", "Relaxing Hobby", 50.0, 0.0, -20.0),
            choice("drink_heavily", "Drink Heavily", 50.0, 0.0, -30.0),
            choice("isolate", "Isolate Self", 10.0, 0.0, 20.0),
        ],
    }];

    let mut wetness = tracker(WETNESS, "Wetness");
    wetness.threshold_effects = vec![
        band(30.0, "Damp", vec![]),
        band(
            70.0,
            "Soaked",
            vec![sym("clumsy", Some(1)), sym("fatigued", None)],
        ),
        band(
            95.0,
            "Freezing Wet",
            vec![
                sym("slowed", Some(1)),
                sym("enfeebled", Some(2)),
                sym("drained", Some(1)),
            ],
        ),
    ];
    wetness.special_actions = vec![SpecialAction {
        id: "dry_off".to_string(),
        label: "Dry Off".to_string(),
        reduces_to: Some(0.0),
        opens_choices_dialog: false,
        choices: Vec::new(),
    }];

    let mut favor = tracker(FAVOR, "Divine Favor");
    favor.is_dynamic_max = true;
    favor.max_value = 10.0;
    favor.default_max_value = Some(10.0);
    favor.shrines_per_extra_point = Some(5.0);
    favor.followers_per_max_point = Some(10.0);
    favor.base_increase_per_interval = Some(0.0);
    favor.increase_per_shrine_per_interval = Some(0.1);
    favor.sub_properties = vec![
        SubPropertyDef {
            id: SUB_SHRINES.to_string(),
            default_value: 0.0,
        },
        SubPropertyDef {
            id: SUB_FOLLOWERS.to_string(),
            default_value: 0.0,
        },
    ];
    favor.threshold_effects = vec![band(5.0, "Favored", vec![]), band(10.0, "Exalted", vec![])];
    favor.regeneration = Regeneration {
        by_long_rest: true,
        long_rest_amount: 1.0,
        ..Regeneration::default()
    };

    vec![
        hunger, thirst, sleep, bladder, bowels, boredom, stress, wetness, favor,
    ]
}
