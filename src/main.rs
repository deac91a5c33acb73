use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use survival_needs::{
    config::GlobalSettings, BuiltinConditions, CaloricType, CharacterId, ConsumedItem,
    ConsumptionChoice, DrinkQuality, MemoryEffects, MemoryStore, NeedsConfig, NeedsEngine, Taste,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "survival-needs demo runner")]
struct Cli {
    /// Optional tracker config JSON overlay
    #[arg(long)]
    trackers: Option<PathBuf>,

    /// Optional consumption settings JSON overlay
    #[arg(long)]
    consumption: Option<PathBuf>,

    /// Number of accrual intervals to simulate
    #[arg(long, default_value_t = 12)]
    steps: u64,

    /// World hours per simulated step
    #[arg(long, default_value_t = 4.0)]
    hours_per_step: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let tracker_json = match &cli.trackers {
        Some(path) => Some(
            fs::read_to_string(path)
                .with_context(|| format!("reading tracker config {}", path.display()))?,
        ),
        None => None,
    };
    let consumption_json = match &cli.consumption {
        Some(path) => Some(
            fs::read_to_string(path)
                .with_context(|| format!("reading consumption settings {}", path.display()))?,
        ),
        None => None,
    };
    let config = NeedsConfig::from_overlays(
        GlobalSettings::default(),
        tracker_json.as_deref(),
        consumption_json.as_deref(),
    );

    let store = MemoryStore::new();
    let party = [
        CharacterId::from("valeros"),
        CharacterId::from("merisiel"),
        CharacterId::from("ezren"),
    ];
    for character in &party {
        store.add_character(character.clone());
    }

    let engine = NeedsEngine::new(config, store, MemoryEffects::new(), BuiltinConditions);

    let mut now = 0.0;
    for character in &party {
        engine.ensure_initialized(character, now).await?;
    }

    let step_seconds = cli.hours_per_step * 3600.0;
    for step in 1..=cli.steps {
        now += step_seconds;
        let report = engine.advance_all(now).await?;
        println!(
            "step {step:>3}: {:.0}h elapsed, {} characters updated",
            now / 3600.0,
            report.updated
        );

        // Valeros keeps eating; the others tough it out.
        if step % 6 == 0 {
            let outcome = engine
                .consume(
                    &party[0],
                    &ConsumedItem {
                        name: "Trail Rations".to_string(),
                        effective_bulk: 0.02,
                        standard_use: true,
                    },
                    &ConsumptionChoice {
                        caloric: CaloricType::Medium,
                        taste: Taste::Boring,
                        quality: DrinkQuality::Average,
                        ..ConsumptionChoice::default()
                    },
                )
                .await?;
            println!("         {} eats: {}", party[0], outcome.narrative.join(", "));
        }
    }

    println!();
    for character in &party {
        let state = engine.snapshot(character).await?;
        println!("{character}:");
        for tracker in engine.config().enabled_trackers() {
            println!("  {:<10} {:>6.1}", tracker.id, state.value(&tracker.id));
        }
        let effects = engine.reconcile(character).await?;
        if !effects.is_noop() {
            println!("  (effects settled: +{} -{})", effects.added.len(), effects.removed.len());
        }
    }
    Ok(())
}
