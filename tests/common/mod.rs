#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use stagehand::{
    DiagnosticSettings, Diagnostics, Family, Instance, Kind, KindKeeper, Level, MemorySink,
    Session,
};

pub struct Smithing {
    pub energy_cost: i32,
}

#[derive(Default)]
pub struct Plain;

/// Counts teardown hook invocations across a test.
pub static TEARDOWNS: AtomicUsize = AtomicUsize::new(0);

// Model side:
//   Model > SmithingModel (abstract) > DefaultSmithingModel > ExampleSmithModel > MasterSmithModel
//                                                           > OtherSmithModel
//   Model > DefaultPersuasionModel > ExamplePersuasionModel
//                                  > BrokenPersuasionModel (factory fails)
//   Model > DefaultMapVisibilityModel
// Behavior side:
//   Behavior > CraftingCampaignBehavior > ExampleCraftingBehavior
//   Behavior > PartyBehavior
pub fn keeper() -> KindKeeper {
    let mut keeper = KindKeeper::new();
    let models = Family::Model.root();
    let behaviors = Family::Behavior.root();

    let smithing = keeper.keep_abstract("SmithingModel", &models).unwrap();
    let default_smithing = keeper
        .keep_concrete("DefaultSmithingModel", &smithing, || {
            Ok(Smithing { energy_cost: 10 })
        })
        .unwrap();
    let example_smith = keeper
        .keep_concrete("ExampleSmithModel", &default_smithing, || {
            Ok(Smithing { energy_cost: 0 })
        })
        .unwrap();
    keeper
        .keep_default::<Plain>("MasterSmithModel", &example_smith)
        .unwrap();
    keeper
        .keep_default::<Plain>("OtherSmithModel", &default_smithing)
        .unwrap();

    let persuasion = keeper
        .keep_default::<Plain>("DefaultPersuasionModel", &models)
        .unwrap();
    keeper
        .keep_default::<Plain>("ExamplePersuasionModel", &persuasion)
        .unwrap();
    keeper
        .keep_concrete::<Plain, _>("BrokenPersuasionModel", &persuasion, || {
            Err("no persuasion table".to_string())
        })
        .unwrap();
    keeper
        .keep_default::<Plain>("DefaultMapVisibilityModel", &models)
        .unwrap();

    let crafting = keeper
        .keep_default::<Plain>("CraftingCampaignBehavior", &behaviors)
        .unwrap();
    keeper
        .keep_default::<Plain>("ExampleCraftingBehavior", &crafting)
        .unwrap();
    keeper
        .keep_default::<Plain>("PartyBehavior", &behaviors)
        .unwrap();
    keeper
        .with_teardown(&behaviors, |_| {
            TEARDOWNS.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    keeper
}

pub fn kind(keeper: &KindKeeper, name: &str) -> Kind {
    keeper
        .get(name)
        .unwrap_or_else(|| panic!("{name} is not kept"))
}

pub fn collection(keeper: &KindKeeper, names: &[&str]) -> Vec<Instance> {
    names
        .iter()
        .map(|name| keeper.construct(&kind(keeper, name)).expect("constructible"))
        .collect()
}

pub fn names(collection: &[Instance]) -> Vec<String> {
    collection
        .iter()
        .map(|instance| instance.kind().name().to_string())
        .collect()
}

/// Diagnostics recording everything into a memory sink.
pub fn diagnostics() -> (Diagnostics, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let settings = DiagnosticSettings {
        min_level: Level::Tracking,
        ..DiagnosticSettings::default()
    };
    let diagnostics = Diagnostics::new(settings).with_sink(sink.clone());
    (diagnostics, sink)
}

/// A session already inside its declaration window.
pub fn session() -> (Session, Arc<KindKeeper>, Arc<MemorySink>) {
    let keeper = Arc::new(keeper());
    let (diagnostics, sink) = diagnostics();
    let mut session = Session::new(Arc::clone(&keeper), diagnostics);
    session.pre_main_menu().expect("declaration window opens");
    (session, keeper, sink)
}
