//! Stagehand – deferred registration of behavior and model overrides.
//!
//! A host process keeps two ordered collections of live objects, *behaviors*
//! and *models*, and only lets them be changed at a few lifecycle checkpoints.
//! Extensions cannot touch those collections whenever they like; instead they
//! declare up front what they want changed, and stagehand applies those
//! declarations when the right checkpoint fires:
//! * A [`kind::Kind`] names a concrete or abstract implementation.
//! * The [`kind::KindKeeper`] owns every kind, its capability family, its
//!   parent in the hierarchy and, for concrete kinds, a factory.
//! * A [`task::TaskRecord`] asks for a kind to be added, to replace the first
//!   entry matching a target kind, or for that entry to be removed.
//! * A [`session::Session`] queues tasks per family and hands each queue to the
//!   [`apply`](mod@apply) pass exactly once, at the checkpoint the [`gate`] allows.
//!
//! ## Modules
//! * [`kind`] – Kinds, families, live instances and the keeper answering
//!   assignability questions.
//! * [`task`] – Task records, per-family queues and the declaration API.
//! * [`collection`] – The [`collection::ManagedCollection`] contract the host's
//!   collections fulfil.
//! * [`apply`](mod@apply) – Matching, replacement, addition and removal against a live
//!   collection.
//! * [`gate`] – The lifecycle state machine as a pure transition table.
//! * [`session`] – The engine context tying queues, gate and diagnostics
//!   together, plus the [`session::Extension`] hooks.
//! * [`diagnostics`] – Leveled, timestamped decision log with file and memory sinks.
//! * [`settings`] – Settings read through the `config` crate.
//!
//! ## Matching
//! A targeted task scans the collection for the first entry whose kind is
//! assignable to the target, i.e. the entry is the target kind or one of its
//! descendants and so already fulfils the target's contract. Only that slot
//! is acted upon. An entry that already is the installed kind is left alone.
//!
//! ## Quick Start
//! ```
//! use std::sync::Arc;
//! use stagehand::{Diagnostics, Family, KindKeeper, ReplaceMode, Session};
//!
//! #[derive(Default)]
//! struct Smithing;
//!
//! let mut keeper = KindKeeper::new();
//! let default = keeper.keep_default::<Smithing>("DefaultSmithingModel", &Family::Model.root())?;
//! let example = keeper.keep_default::<Smithing>("ExampleSmithModel", &default)?;
//! let keeper = Arc::new(keeper);
//!
//! let mut session = Session::new(Arc::clone(&keeper), Diagnostics::default());
//! session.pre_main_menu()?;
//! session.declare_replace(&example, &default, ReplaceMode::ReplaceOrAdd)?;
//!
//! let mut models = vec![keeper.construct(&default)?];
//! let report = session.game_start(&mut models)?;
//! assert_eq!(report.kinds, vec![example]);
//! # Ok::<(), stagehand::StagehandError>(())
//! ```

pub mod apply;
pub mod collection;
pub mod diagnostics;
pub mod error;
pub mod gate;
pub mod kind;
pub mod session;
pub mod settings;
pub mod task;

pub use apply::{ApplyReport, Decision, apply};
pub use collection::ManagedCollection;
pub use diagnostics::{
    CheckpointLog, CollectionLog, DiagnosticSettings, Diagnostics, FileSink, Level, MemorySink,
    Record, Sink,
};
pub use error::{Result, StagehandError};
pub use gate::{Checkpoint, Phase, Transition};
pub use kind::{Family, Instance, Kind, KindKeeper};
pub use session::{Extension, Session};
pub use settings::Settings;
pub use task::{Declarations, ReplaceMode, TaskAction, TaskQueue, TaskRecord};
