//! Lifecycle gate: which host checkpoint may do what, and in which order.
//!
//! `Uninitialized → Declaring → ModelsApplied → BehaviorsApplied → Closed`.
//! Transitions only move forward and each fires at most once. The table lives
//! in [`transition`], a pure function, so the ordering rules can be checked
//! without any host or collection around.

use std::fmt;

use serde::Serialize;

use crate::error::{Result, StagehandError};
use crate::kind::Family;

// ------------- Phase -------------
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Uninitialized,
    Declaring,
    ModelsApplied,
    BehaviorsApplied,
    Closed,
}

impl Phase {
    pub fn accepts_declarations(&self) -> bool {
        *self == Self::Declaring
    }
    pub fn is_terminal(&self) -> bool {
        *self == Self::Closed
    }
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Declaring => "declaring",
            Self::ModelsApplied => "models_applied",
            Self::BehaviorsApplied => "behaviors_applied",
            Self::Closed => "closed",
        }
    }
}
impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ------------- Checkpoint -------------
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Checkpoint {
    /// Before the host's main menu; opens the declaration window.
    PreMainMenu,
    /// The host starts a game; the model collection is live.
    GameStart,
    /// Models are integrated and the behavior collection is live.
    InitializationFinished,
    /// Nothing may be declared or applied any more.
    SessionEnd,
}

impl Checkpoint {
    pub const ALL: [Checkpoint; 4] = [
        Checkpoint::PreMainMenu,
        Checkpoint::GameStart,
        Checkpoint::InitializationFinished,
        Checkpoint::SessionEnd,
    ];

    /// The family whose queue is applied when this checkpoint fires.
    pub fn drains(&self) -> Option<Family> {
        match self {
            Self::GameStart => Some(Family::Model),
            Self::InitializationFinished => Some(Family::Behavior),
            Self::PreMainMenu | Self::SessionEnd => None,
        }
    }
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreMainMenu => "pre_main_menu",
            Self::GameStart => "game_start",
            Self::InitializationFinished => "initialization_finished",
            Self::SessionEnd => "session_end",
        }
    }
}
impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ------------- Transition -------------
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct Transition {
    pub checkpoint: Checkpoint,
    pub from: Phase,
    pub to: Phase,
}

impl Transition {
    pub fn drains(&self) -> Option<Family> {
        self.checkpoint.drains()
    }
}

fn target_phase(current: Phase, checkpoint: Checkpoint) -> Option<Phase> {
    use Checkpoint as C;
    use Phase as P;
    match (current, checkpoint) {
        (P::Uninitialized, C::PreMainMenu) => Some(P::Declaring),
        (P::Declaring, C::GameStart) => Some(P::ModelsApplied),
        (P::ModelsApplied, C::InitializationFinished) => Some(P::BehaviorsApplied),
        // a host may never reach the later checkpoints
        (
            P::Uninitialized | P::Declaring | P::ModelsApplied | P::BehaviorsApplied,
            C::SessionEnd,
        ) => Some(P::Closed),
        _ => None,
    }
}

/// Computes the transition a checkpoint triggers from `current`.
pub fn transition(current: Phase, checkpoint: Checkpoint) -> Result<Transition> {
    match target_phase(current, checkpoint) {
        Some(to) => Ok(Transition {
            checkpoint,
            from: current,
            to,
        }),
        None => Err(StagehandError::phase(checkpoint.as_str(), current)),
    }
}

/// Checkpoints that are accepted from `phase`.
pub fn valid_checkpoints(phase: Phase) -> Vec<Checkpoint> {
    Checkpoint::ALL
        .into_iter()
        .filter(|checkpoint| target_phase(phase, *checkpoint).is_some())
        .collect()
}
