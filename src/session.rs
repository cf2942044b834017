//! The engine context for one host session.
//!
//! A [`Session`] owns the two task queues, the lifecycle phase and the
//! diagnostics for one run of the host. Nothing is global: independent
//! sessions can share a [`KindKeeper`] and never see each other's tasks.

use std::sync::Arc;

use tracing::debug;

use crate::apply::{self, ApplyReport};
use crate::collection::ManagedCollection;
use crate::diagnostics::{DiagnosticSettings, Diagnostics};
use crate::error::{Result, StagehandError};
use crate::gate::{self, Checkpoint, Phase, Transition};
use crate::kind::{Family, Kind, KindKeeper};
use crate::task::{Declarations, ReplaceMode, TaskQueue};

/// An independent piece of code that wants the host's collections changed.
pub trait Extension {
    fn name(&self) -> &str;

    /// Adjusts the session's diagnostics before anything is declared.
    fn configure(&mut self, _settings: &mut DiagnosticSettings) {}

    /// Declares every add, replace or removal this extension needs.
    fn declare(&mut self, declarations: &mut Declarations<'_>) -> Result<()>;
}

#[derive(Debug)]
pub struct Session {
    keeper: Arc<KindKeeper>,
    diagnostics: Diagnostics,
    phase: Phase,
    models: TaskQueue,
    behaviors: TaskQueue,
    history: Vec<Transition>,
}

impl Session {
    pub fn new(keeper: Arc<KindKeeper>, diagnostics: Diagnostics) -> Self {
        Self {
            keeper,
            diagnostics,
            phase: Phase::Uninitialized,
            models: TaskQueue::new(Family::Model),
            behaviors: TaskQueue::new(Family::Behavior),
            history: Vec::new(),
        }
    }
    pub fn phase(&self) -> Phase {
        self.phase
    }
    pub fn keeper(&self) -> &KindKeeper {
        &self.keeper
    }
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }
    pub fn queue(&self, family: Family) -> &TaskQueue {
        match family {
            Family::Model => &self.models,
            Family::Behavior => &self.behaviors,
        }
    }
    /// Every transition taken so far, oldest first.
    pub fn history(&self) -> &[Transition] {
        &self.history
    }

    fn commit(&mut self, transition: Transition) {
        debug!(
            checkpoint = %transition.checkpoint,
            from = %transition.from,
            to = %transition.to,
            "lifecycle transition"
        );
        self.phase = transition.to;
        self.history.push(transition);
    }

    // ------------- Checkpoints -------------
    /// Opens the declaration window with two empty queues.
    pub fn pre_main_menu(&mut self) -> Result<()> {
        let transition = gate::transition(self.phase, Checkpoint::PreMainMenu)?;
        self.diagnostics.checkpoint(Checkpoint::PreMainMenu);
        self.models = TaskQueue::new(Family::Model);
        self.behaviors = TaskQueue::new(Family::Behavior);
        self.commit(transition);
        Ok(())
    }

    /// Applies the model queue to the live model collection.
    pub fn game_start(&mut self, models: &mut dyn ManagedCollection) -> Result<ApplyReport> {
        self.apply_at(Checkpoint::GameStart, Family::Model, models)
    }

    /// Applies the behavior queue to the live behavior collection.
    pub fn initialization_finished(
        &mut self,
        behaviors: &mut dyn ManagedCollection,
    ) -> Result<ApplyReport> {
        self.apply_at(Checkpoint::InitializationFinished, Family::Behavior, behaviors)
    }

    /// Fires `checkpoint` and applies the `family` queue to `collection`.
    ///
    /// The checkpoint must be the one that drains `family`; otherwise the
    /// call fails and neither the phase nor the collection changes.
    pub fn apply_at(
        &mut self,
        checkpoint: Checkpoint,
        family: Family,
        collection: &mut dyn ManagedCollection,
    ) -> Result<ApplyReport> {
        let transition = gate::transition(self.phase, checkpoint)?;
        if transition.drains() != Some(family) {
            return Err(StagehandError::phase(
                format!("applying the {family} queue at {checkpoint}"),
                self.phase,
            ));
        }
        self.diagnostics.checkpoint(checkpoint);
        let queue = match family {
            Family::Model => &mut self.models,
            Family::Behavior => &mut self.behaviors,
        };
        let report = apply::apply(queue, collection, &self.keeper, &self.diagnostics)?;
        self.commit(transition);
        Ok(report)
    }

    /// Closes the session; later declarations and applies are rejected.
    pub fn session_end(&mut self) -> Result<()> {
        let transition = gate::transition(self.phase, Checkpoint::SessionEnd)?;
        self.diagnostics.checkpoint(Checkpoint::SessionEnd);
        for queue in [&self.models, &self.behaviors] {
            if !queue.is_consumed() && !queue.is_empty() {
                self.diagnostics.warning(format!(
                    "{} {} task(s) were never applied",
                    queue.len(),
                    queue.family()
                ));
            }
        }
        self.commit(transition);
        Ok(())
    }

    // ------------- Declarations -------------
    pub fn declarations(&mut self) -> Result<Declarations<'_>> {
        if !self.phase.accepts_declarations() {
            return Err(StagehandError::phase("declaration", self.phase));
        }
        Ok(Declarations::new(
            &self.keeper,
            &mut self.models,
            &mut self.behaviors,
            &self.diagnostics,
        ))
    }
    pub fn declare_add(&mut self, install: &Kind) -> Result<()> {
        self.declarations()?.add(install)
    }
    pub fn declare_replace(
        &mut self,
        install: &Kind,
        target: &Kind,
        mode: ReplaceMode,
    ) -> Result<()> {
        self.declarations()?.replace(install, target, mode)
    }
    pub fn declare_remove(&mut self, target: &Kind) -> Result<()> {
        self.declarations()?.remove(target)
    }

    /// Lets an extension configure diagnostics and declare its tasks.
    ///
    /// Declarations made before an error stay queued.
    pub fn run_extension(&mut self, extension: &mut dyn Extension) -> Result<()> {
        if !self.phase.accepts_declarations() {
            return Err(StagehandError::phase(
                format!("loading extension {}", extension.name()),
                self.phase,
            ));
        }
        extension.configure(self.diagnostics.settings_mut());
        self.diagnostics.track(format!("Loading {}", extension.name()));
        let mut declarations = self.declarations()?;
        extension.declare(&mut declarations)
    }
}
