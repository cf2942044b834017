//! Task records, the per-family queues they wait in, and the declaration API
//! that validates them on the way in.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::diagnostics::Diagnostics;
use crate::error::{Result, StagehandError};
use crate::kind::{Family, Kind, KindKeeper};

// ------------- ReplaceMode -------------
/// What happens when a task's target is, or is not, found in a collection.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplaceMode {
    /// Replace the target in place; do nothing when it is missing.
    Replace,
    /// Replace the target in place; append when it is missing.
    #[default]
    ReplaceOrAdd,
    /// Remove the target, then append the installed kind at the end.
    RemoveAndAdd,
}

impl fmt::Display for ReplaceMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Replace => "replace",
            Self::ReplaceOrAdd => "replace_or_add",
            Self::RemoveAndAdd => "remove_and_add",
        })
    }
}

// ------------- TaskRecord -------------
/// What a task does once its queue is applied.
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TaskAction {
    /// Append `install` without looking at the collection.
    Add { install: Kind },
    /// Swap the first entry matching `target` for `install`.
    Replace { install: Kind, target: Kind },
    /// Drop the first entry matching `target`.
    Remove { target: Kind },
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct TaskRecord {
    action: TaskAction,
    mode: ReplaceMode,
    family: Family,
}

impl TaskRecord {
    /// Builds a task after checking it against the kinds held by `keeper`.
    ///
    /// `install` may only be left out by remove-only tasks. A `target` that is
    /// not kept is accepted and later reported as not found, but a kept target
    /// must be an ancestor of (or the same as) `install`.
    pub fn validated(
        keeper: &KindKeeper,
        install: Option<&Kind>,
        target: Option<&Kind>,
        mode: ReplaceMode,
    ) -> Result<Self> {
        let install_family = match install {
            Some(kind) => {
                let entry = keeper.entry(kind).ok_or_else(|| {
                    StagehandError::declaration(
                        Some(kind),
                        format!("{kind} is not a valid model or behavior"),
                    )
                })?;
                if !entry.is_concrete() {
                    return Err(StagehandError::declaration(
                        Some(kind),
                        format!("{kind} is abstract and cannot be installed"),
                    ));
                }
                Some(entry.family())
            }
            None => None,
        };
        if let Some(target) = target {
            if keeper.is_root(target) {
                return Err(StagehandError::declaration(
                    Some(target),
                    format!("{target} is a family root and would match anything"),
                ));
            }
        }
        if mode == ReplaceMode::RemoveAndAdd && target.is_none() {
            return Err(StagehandError::declaration(install, "removal needs a target"));
        }
        let (action, family) = match (install.zip(install_family), target) {
            (Some((install, family)), Some(target)) => {
                if let Some(target_family) = keeper.family(target) {
                    if target_family != family {
                        return Err(StagehandError::declaration(
                            Some(install),
                            format!("{install} is a {family} but {target} is a {target_family}"),
                        ));
                    }
                    if !keeper.is_assignable_from(install, target) {
                        return Err(StagehandError::declaration(
                            Some(install),
                            format!("{install} does not derive from {target}"),
                        ));
                    }
                }
                let action = TaskAction::Replace {
                    install: install.clone(),
                    target: target.clone(),
                };
                (action, family)
            }
            (Some((install, family)), None) => (
                TaskAction::Add {
                    install: install.clone(),
                },
                family,
            ),
            (None, Some(target)) => {
                let family = keeper.family(target).ok_or_else(|| {
                    StagehandError::declaration(
                        Some(target),
                        format!("cannot remove {target}: it is not a valid model or behavior"),
                    )
                })?;
                (
                    TaskAction::Remove {
                        target: target.clone(),
                    },
                    family,
                )
            }
            (None, None) => {
                return Err(StagehandError::declaration(
                    None,
                    "a task needs a kind to install or a target",
                ));
            }
        };
        Ok(Self {
            action,
            mode,
            family,
        })
    }

    pub fn action(&self) -> &TaskAction {
        &self.action
    }
    pub fn install(&self) -> Option<&Kind> {
        match &self.action {
            TaskAction::Add { install } | TaskAction::Replace { install, .. } => Some(install),
            TaskAction::Remove { .. } => None,
        }
    }
    pub fn target(&self) -> Option<&Kind> {
        match &self.action {
            TaskAction::Replace { target, .. } | TaskAction::Remove { target } => Some(target),
            TaskAction::Add { .. } => None,
        }
    }
    pub fn mode(&self) -> ReplaceMode {
        self.mode
    }
    pub fn family(&self) -> Family {
        self.family
    }
}
impl fmt::Display for TaskRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.action {
            TaskAction::Add { install } => write!(f, "add {} {install}", self.family),
            TaskAction::Replace { install, target } => {
                write!(f, "{} {target} with {} {install}", self.mode, self.family)
            }
            TaskAction::Remove { target } => write!(f, "remove {} {target}", self.family),
        }
    }
}

// ------------- TaskQueue -------------
/// Tasks of one family in declaration order; drained exactly once.
#[derive(Debug)]
pub struct TaskQueue {
    family: Family,
    tasks: Vec<TaskRecord>,
    consumed: bool,
}

impl TaskQueue {
    pub fn new(family: Family) -> Self {
        Self {
            family,
            tasks: Vec::new(),
            consumed: false,
        }
    }
    pub fn family(&self) -> Family {
        self.family
    }
    pub fn push(&mut self, task: TaskRecord) -> Result<()> {
        if self.consumed {
            return Err(StagehandError::Reuse {
                family: self.family,
            });
        }
        if task.family != self.family {
            return Err(StagehandError::declaration(
                task.install().or(task.target()),
                format!("a {} task cannot join the {} queue", task.family, self.family),
            ));
        }
        self.tasks.push(task);
        Ok(())
    }
    pub fn tasks(&self) -> &[TaskRecord] {
        &self.tasks
    }
    pub fn len(&self) -> usize {
        self.tasks.len()
    }
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
    pub fn is_consumed(&self) -> bool {
        self.consumed
    }
    /// Hands out every task and marks the queue consumed.
    pub fn drain(&mut self) -> Result<Vec<TaskRecord>> {
        if self.consumed {
            return Err(StagehandError::Reuse {
                family: self.family,
            });
        }
        self.consumed = true;
        Ok(std::mem::take(&mut self.tasks))
    }
}

// ------------- Declarations -------------
/// The declaration surface handed to extensions while the window is open.
pub struct Declarations<'s> {
    keeper: &'s KindKeeper,
    models: &'s mut TaskQueue,
    behaviors: &'s mut TaskQueue,
    diagnostics: &'s Diagnostics,
}

impl<'s> Declarations<'s> {
    pub fn new(
        keeper: &'s KindKeeper,
        models: &'s mut TaskQueue,
        behaviors: &'s mut TaskQueue,
        diagnostics: &'s Diagnostics,
    ) -> Self {
        Self {
            keeper,
            models,
            behaviors,
            diagnostics,
        }
    }

    pub fn keeper(&self) -> &KindKeeper {
        self.keeper
    }

    /// Appends `install` unconditionally when its queue is applied.
    pub fn add(&mut self, install: &Kind) -> Result<()> {
        self.declare(None, Some(install), None, ReplaceMode::ReplaceOrAdd)
    }
    pub fn replace(&mut self, install: &Kind, target: &Kind, mode: ReplaceMode) -> Result<()> {
        self.declare(None, Some(install), Some(target), mode)
    }
    /// Removes the first entry matching `target` without installing anything.
    pub fn remove(&mut self, target: &Kind) -> Result<()> {
        self.declare(None, None, Some(target), ReplaceMode::RemoveAndAdd)
    }

    pub fn add_model(&mut self, install: &Kind) -> Result<()> {
        self.declare(Some(Family::Model), Some(install), None, ReplaceMode::ReplaceOrAdd)
    }
    pub fn add_behavior(&mut self, install: &Kind) -> Result<()> {
        self.declare(Some(Family::Behavior), Some(install), None, ReplaceMode::ReplaceOrAdd)
    }
    pub fn replace_model(
        &mut self,
        install: &Kind,
        target: &Kind,
        mode: ReplaceMode,
    ) -> Result<()> {
        self.declare(Some(Family::Model), Some(install), Some(target), mode)
    }
    pub fn replace_behavior(
        &mut self,
        install: &Kind,
        target: &Kind,
        mode: ReplaceMode,
    ) -> Result<()> {
        self.declare(Some(Family::Behavior), Some(install), Some(target), mode)
    }

    fn declare(
        &mut self,
        expected: Option<Family>,
        install: Option<&Kind>,
        target: Option<&Kind>,
        mode: ReplaceMode,
    ) -> Result<()> {
        let task = TaskRecord::validated(self.keeper, install, target, mode).and_then(|task| {
            match expected {
                Some(family) if family != task.family => Err(StagehandError::declaration(
                    install,
                    format!("{task} was declared as a {family}"),
                )),
                _ => Ok(task),
            }
        });
        let task = match task {
            Ok(task) => task,
            Err(e) => {
                self.diagnostics.error(format!("Loading error - {e}"));
                return Err(e);
            }
        };
        if let Some(target) = task.target() {
            if !self.keeper.contains(target) {
                self.diagnostics
                    .track(format!("{target} is not known, it will be reported as not found"));
            }
        }
        self.diagnostics.track(format!("Queued {task}"));
        match task.family {
            Family::Model => self.models.push(task),
            Family::Behavior => self.behaviors.push(task),
        }
    }
}
