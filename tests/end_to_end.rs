mod common;

use common::{Smithing, collection, kind, names, session};
use stagehand::{Level, ReplaceMode};

#[test]
fn example_smith_model_replaces_the_default() {
    let (mut session, keeper, sink) = session();
    session
        .declare_replace(
            &kind(&keeper, "ExampleSmithModel"),
            &kind(&keeper, "DefaultSmithingModel"),
            ReplaceMode::ReplaceOrAdd,
        )
        .expect("declare");

    let mut models = collection(&keeper, &["DefaultSmithingModel", "DefaultPersuasionModel"]);
    let report = session.game_start(&mut models).expect("models apply");
    assert!(report.changed());
    assert_eq!(names(&models), ["ExampleSmithModel", "DefaultPersuasionModel"]);
    let smithing = models[0].downcast_ref::<Smithing>().expect("smithing state");
    assert_eq!(smithing.energy_cost, 0);

    let naming: Vec<String> = sink
        .messages_at(Level::Info)
        .into_iter()
        .filter(|m| m.contains("ExampleSmithModel"))
        .collect();
    assert_eq!(
        naming,
        vec!["DefaultSmithingModel found. Replacing with ExampleSmithModel".to_string()]
    );

    let json = report.to_json().expect("report serializes");
    assert!(json.contains("\"decision\": \"replaced\""));
    assert!(json.contains("\"family\": \"model\""));

    let mut behaviors = collection(&keeper, &["CraftingCampaignBehavior"]);
    session
        .initialization_finished(&mut behaviors)
        .expect("behaviors apply");
    session.session_end().expect("close");
    assert!(sink.messages_at(Level::Warning).is_empty());
    assert!(sink.messages_at(Level::Error).is_empty());
}

#[test]
fn mixed_session_applies_both_families() {
    let (mut session, keeper, sink) = session();
    {
        let mut declarations = session.declarations().expect("window is open");
        declarations
            .replace_model(
                &kind(&keeper, "ExamplePersuasionModel"),
                &kind(&keeper, "DefaultPersuasionModel"),
                ReplaceMode::Replace,
            )
            .expect("declare");
        declarations
            .replace_behavior(
                &kind(&keeper, "ExampleCraftingBehavior"),
                &kind(&keeper, "CraftingCampaignBehavior"),
                ReplaceMode::RemoveAndAdd,
            )
            .expect("declare");
        declarations
            .remove(&kind(&keeper, "PartyBehavior"))
            .expect("declare");
    }

    let mut models = collection(&keeper, &["DefaultSmithingModel", "DefaultPersuasionModel"]);
    session.game_start(&mut models).expect("models apply");
    assert_eq!(names(&models), ["DefaultSmithingModel", "ExamplePersuasionModel"]);

    let mut behaviors = collection(
        &keeper,
        &["PartyBehavior", "CraftingCampaignBehavior", "PartyBehavior"],
    );
    let report = session
        .initialization_finished(&mut behaviors)
        .expect("behaviors apply");
    assert_eq!(names(&behaviors), ["PartyBehavior", "ExampleCraftingBehavior"]);
    assert_eq!(report.decisions.len(), 2);
    let info = sink.messages_at(Level::Info);
    let swapped = "CraftingCampaignBehavior found. Removing it and adding ExampleCraftingBehavior";
    assert!(info.iter().any(|m| m == swapped));
    assert!(info.iter().any(|m| m == "PartyBehavior found. Removing PartyBehavior"));
}
