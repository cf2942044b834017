//! Walks one host session end to end: the host keeps its default models and
//! behaviors, an extension declares the example overrides, and the queues are
//! applied at the game start and initialization finished checkpoints.
//!
//! Usage: `stagehand [settings-file]` (defaults to `stagehand.toml`).

use std::error::Error;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use stagehand::{
    Declarations, DiagnosticSettings, Diagnostics, Extension, Family, Instance, KindKeeper,
    ReplaceMode, Session, Settings,
};

// ------------- Host side -------------
struct SmithingModel {
    energy_cost: i32,
}
struct PersuasionModel {
    success_chance: f32,
}
struct MapVisibilityModel {
    spotting_range: f32,
}
#[derive(Default)]
struct CraftingBehavior {
    listeners: usize,
}

fn host_kinds() -> stagehand::Result<KindKeeper> {
    let mut keeper = KindKeeper::new();
    let models = Family::Model.root();
    let behaviors = Family::Behavior.root();

    let smithing = keeper.keep_abstract("SmithingModel", &models)?;
    let default_smithing = keeper.keep_concrete("DefaultSmithingModel", &smithing, || {
        Ok(SmithingModel { energy_cost: 10 })
    })?;
    keeper.keep_concrete("ExampleSmithModel", &default_smithing, || {
        Ok(SmithingModel { energy_cost: 0 })
    })?;

    let default_persuasion = keeper.keep_concrete("DefaultPersuasionModel", &models, || {
        Ok(PersuasionModel { success_chance: 0.5 })
    })?;
    keeper.keep_concrete("ExamplePersuasionModel", &default_persuasion, || {
        Ok(PersuasionModel { success_chance: 1.0 })
    })?;

    let default_visibility = keeper.keep_concrete("DefaultMapVisibilityModel", &models, || {
        Ok(MapVisibilityModel { spotting_range: 20.0 })
    })?;
    keeper.keep_concrete("ExampleMapVisibilityModel", &default_visibility, || {
        Ok(MapVisibilityModel {
            spotting_range: 100.0,
        })
    })?;

    let crafting = keeper.keep_concrete("CraftingCampaignBehavior", &behaviors, || {
        Ok(CraftingBehavior { listeners: 2 })
    })?;
    keeper.keep_default::<CraftingBehavior>("ExampleCraftingBehavior", &crafting)?;
    keeper.with_teardown(&behaviors, |instance| {
        let released = instance
            .downcast_mut::<CraftingBehavior>()
            .map(|behavior| std::mem::take(&mut behavior.listeners))
            .unwrap_or_default();
        info!(kind = %instance.kind(), released, "behavior listeners released");
    })?;
    Ok(keeper)
}

fn construct_all(keeper: &KindKeeper, names: &[&str]) -> stagehand::Result<Vec<Instance>> {
    names
        .iter()
        .filter_map(|name| keeper.get(name))
        .map(|kind| keeper.construct(&kind))
        .collect()
}

// ------------- Extension side -------------
struct ExampleOverrides {
    quiet: bool,
}

impl Extension for ExampleOverrides {
    fn name(&self) -> &str {
        "example-overrides"
    }
    fn configure(&mut self, settings: &mut DiagnosticSettings) {
        if self.quiet {
            settings.enabled = false;
        }
    }
    fn declare(&mut self, declarations: &mut Declarations<'_>) -> stagehand::Result<()> {
        let pairs = [
            ("ExampleSmithModel", "DefaultSmithingModel"),
            ("ExamplePersuasionModel", "DefaultPersuasionModel"),
            ("ExampleMapVisibilityModel", "DefaultMapVisibilityModel"),
        ];
        for (install, target) in pairs {
            let install = declarations.keeper().get(install);
            let target = declarations.keeper().get(target);
            if let (Some(install), Some(target)) = (install, target) {
                declarations.replace_model(&install, &target, ReplaceMode::ReplaceOrAdd)?;
            }
        }
        let install = declarations.keeper().get("ExampleCraftingBehavior");
        let target = declarations.keeper().get("CraftingCampaignBehavior");
        if let (Some(install), Some(target)) = (install, target) {
            declarations.replace_behavior(&install, &target, ReplaceMode::RemoveAndAdd)?;
        }
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "stagehand.toml".to_string());
    let settings = Settings::load(&path)?;
    info!(path = %path, log_file = ?settings.diagnostics.log_file, "settings loaded");

    let keeper = Arc::new(host_kinds()?);
    let mut session = Session::new(Arc::clone(&keeper), Diagnostics::new(settings.diagnostics));

    session.pre_main_menu()?;
    session.run_extension(&mut ExampleOverrides { quiet: false })?;

    let mut models = construct_all(
        &keeper,
        &[
            "DefaultSmithingModel",
            "DefaultPersuasionModel",
            "DefaultMapVisibilityModel",
        ],
    )?;
    let report = session.game_start(&mut models)?;
    println!("{}", report.to_json()?);

    let mut behaviors = construct_all(&keeper, &["CraftingCampaignBehavior"])?;
    let report = session.initialization_finished(&mut behaviors)?;
    println!("{}", report.to_json()?);

    session.session_end()?;

    for model in &models {
        if let Some(smithing) = model.downcast_ref::<SmithingModel>() {
            info!(kind = %model.kind(), energy_cost = smithing.energy_cost, "smithing");
        } else if let Some(persuasion) = model.downcast_ref::<PersuasionModel>() {
            info!(kind = %model.kind(), success_chance = persuasion.success_chance, "persuasion");
        } else if let Some(visibility) = model.downcast_ref::<MapVisibilityModel>() {
            let spotting_range = visibility.spotting_range;
            info!(kind = %model.kind(), spotting_range, "map visibility");
        }
    }
    Ok(())
}
