//! The apply pass: one queue against one live collection.
//!
//! Tasks run in declaration order against the collection as earlier tasks
//! left it. A targeted task only ever touches the first matching slot. The
//! instance a task installs is built before the collection is touched, so a
//! failing factory skips its task and leaves the collection as it was.

use serde::Serialize;
use tracing::debug;

use crate::collection::ManagedCollection;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::kind::{Family, Instance, Kind, KindKeeper};
use crate::task::{ReplaceMode, TaskAction, TaskQueue, TaskRecord};

/// The outcome of a single task.
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    Added {
        install: Kind,
        index: usize,
    },
    Replaced {
        target: Kind,
        previous: Kind,
        install: Kind,
        index: usize,
    },
    AlreadyPresent {
        install: Kind,
        index: usize,
    },
    /// `index` is where the removed entry sat; `appended` went to the end.
    Removed {
        target: Kind,
        previous: Kind,
        index: usize,
        appended: Option<Kind>,
    },
    NotFound {
        target: Kind,
    },
    Failed {
        install: Kind,
        reason: String,
    },
}

impl Decision {
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::Added { .. } | Self::Replaced { .. } | Self::Removed { .. }
        )
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ApplyReport {
    pub family: Family,
    pub decisions: Vec<Decision>,
    /// Kinds left in the collection, in slot order.
    pub kinds: Vec<Kind>,
}

impl ApplyReport {
    pub fn changed(&self) -> bool {
        self.decisions.iter().any(Decision::is_mutation)
    }
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Drains `queue` and applies every task to `collection`.
///
/// Fails only when the queue was already applied, in which case the
/// collection is not touched.
pub fn apply(
    queue: &mut TaskQueue,
    collection: &mut dyn ManagedCollection,
    keeper: &KindKeeper,
    diagnostics: &Diagnostics,
) -> Result<ApplyReport> {
    let family = queue.family();
    let tasks = queue.drain()?;
    let mut decisions = Vec::with_capacity(tasks.len());
    for task in &tasks {
        decisions.push(apply_task(task, &mut *collection, keeper, diagnostics));
    }
    let kinds = collection.kinds();
    diagnostics.collection(family, &kinds);
    debug!(
        family = %family,
        tasks = tasks.len(),
        entries = kinds.len(),
        "apply pass complete"
    );
    Ok(ApplyReport {
        family,
        decisions,
        kinds,
    })
}

fn label(family: Family) -> &'static str {
    match family {
        Family::Behavior => "Behavior",
        Family::Model => "Model",
    }
}

/// First slot whose kind is the target or descends from it.
fn find_slot(
    collection: &dyn ManagedCollection,
    keeper: &KindKeeper,
    target: &Kind,
) -> Option<(usize, Kind)> {
    (0..collection.len()).find_map(|index| {
        let kind = collection.kind_at(index)?;
        keeper
            .is_assignable_from(kind, target)
            .then(|| (index, kind.clone()))
    })
}

fn construct(
    keeper: &KindKeeper,
    diagnostics: &Diagnostics,
    install: &Kind,
) -> std::result::Result<Instance, Decision> {
    keeper.construct(install).map_err(|e| {
        diagnostics.error(e.to_string());
        Decision::Failed {
            install: install.clone(),
            reason: e.to_string(),
        }
    })
}

fn apply_task(
    task: &TaskRecord,
    collection: &mut dyn ManagedCollection,
    keeper: &KindKeeper,
    diagnostics: &Diagnostics,
) -> Decision {
    let family = task.family();
    match task.action() {
        TaskAction::Add { install } => {
            let instance = match construct(keeper, diagnostics, install) {
                Ok(instance) => instance,
                Err(failed) => return failed,
            };
            diagnostics.info(format!("Adding {} {install}", label(family)));
            append(collection, instance)
        }
        TaskAction::Replace { install, target } => match find_slot(collection, keeper, target) {
            Some((index, previous)) if previous == *install => {
                diagnostics.warning(format!("{} {install} already present.", label(family)));
                Decision::AlreadyPresent {
                    install: install.clone(),
                    index,
                }
            }
            Some((index, previous)) => {
                let instance = match construct(keeper, diagnostics, install) {
                    Ok(instance) => instance,
                    Err(failed) => return failed,
                };
                if task.mode() == ReplaceMode::RemoveAndAdd {
                    diagnostics.info(format!("{target} found. Removing it and adding {install}"));
                    remove(collection, keeper, index);
                    collection.push(instance);
                    return Decision::Removed {
                        target: target.clone(),
                        previous,
                        index,
                        appended: Some(install.clone()),
                    };
                }
                diagnostics.info(format!("{target} found. Replacing with {install}"));
                collection.replace_at(index, instance);
                Decision::Replaced {
                    target: target.clone(),
                    previous,
                    install: install.clone(),
                    index,
                }
            }
            None if task.mode() == ReplaceMode::Replace => not_found(family, target, diagnostics),
            None => {
                let instance = match construct(keeper, diagnostics, install) {
                    Ok(instance) => instance,
                    Err(failed) => return failed,
                };
                diagnostics.info(format!("{target} not found. Adding {install}"));
                append(collection, instance)
            }
        },
        TaskAction::Remove { target } => match find_slot(collection, keeper, target) {
            Some((index, previous)) => {
                diagnostics.info(format!("{target} found. Removing {previous}"));
                remove(collection, keeper, index);
                Decision::Removed {
                    target: target.clone(),
                    previous,
                    index,
                    appended: None,
                }
            }
            None => not_found(family, target, diagnostics),
        },
    }
}

fn append(collection: &mut dyn ManagedCollection, instance: Instance) -> Decision {
    let index = collection.len();
    let install = instance.kind().clone();
    collection.push(instance);
    Decision::Added { install, index }
}

fn remove(collection: &mut dyn ManagedCollection, keeper: &KindKeeper, index: usize) {
    let mut removed = collection.remove_at(index);
    if let Some(teardown) = keeper.teardown_for(removed.kind()) {
        teardown(&mut removed);
    }
}

fn not_found(family: Family, target: &Kind, diagnostics: &Diagnostics) -> Decision {
    diagnostics.warning(format!("{} {target} not found.", label(family)));
    Decision::NotFound {
        target: target.clone(),
    }
}
