//! Survival-needs simulation for tabletop characters.
//!
//! Configuration-driven trackers (hunger, thirst, sleep, and the rest) accrue
//! on whole world-time intervals, resolve into threshold bands, and project
//! externally applied status effects through an idempotent reconciler. The
//! host supplies persistence, the effect collection, and condition lookup
//! behind async traits; this crate owns only the math and the convergence.

pub mod accrual;
pub mod adjust;
pub mod config;
pub mod consumption;
pub mod debounce;
pub mod effects;
pub mod engine;
pub mod error;
pub mod reconcile;
pub mod store;

pub use accrual::AdvanceReport;
pub use adjust::{ActionOutcome, SetValueOptions};
pub use config::{GlobalSettings, NeedsConfig, TrackerDef};
pub use consumption::{
    CaloricType, ConsumedItem, ConsumptionChoice, ConsumptionOutcome, DrinkCaloric, DrinkQuality,
    Taste,
};
pub use debounce::Debouncer;
pub use effects::{
    effect_slug, AppliedEffect, BuiltinConditions, ConditionResolver, EffectApi, EffectDescriptor,
    EffectKey, MemoryEffects,
};
pub use engine::NeedsEngine;
pub use error::{NeedsError, Result};
pub use reconcile::ReconcileOutcome;
pub use store::{CharacterId, FlagPath, FlagValue, MemoryStore, NeedsState, NeedsStore};
