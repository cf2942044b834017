use thiserror::Error;

use crate::gate::Phase;
use crate::kind::{Family, Kind};

#[derive(Error, Debug)]
pub enum StagehandError {
    #[error("Declaration error: {message}")]
    Declaration { kind: Option<Kind>, message: String },
    #[error("Phase error: {operation} is not permitted while {phase}")]
    Phase { operation: String, phase: Phase },
    #[error("Reuse error: the {family} queue has already been applied")]
    Reuse { family: Family },
    #[error("Construction error: could not construct {kind}: {message}")]
    Construction { kind: Kind, message: String },
    #[error("Registry error: {0}")]
    Registry(String),
    #[error("Config error: {0}")]
    Config(String),
}

impl StagehandError {
    pub(crate) fn declaration(kind: Option<&Kind>, message: impl Into<String>) -> Self {
        Self::Declaration {
            kind: kind.cloned(),
            message: message.into(),
        }
    }
    pub(crate) fn phase(operation: impl Into<String>, phase: Phase) -> Self {
        Self::Phase {
            operation: operation.into(),
            phase,
        }
    }
}

pub type Result<T> = std::result::Result<T, StagehandError>;

// Helper conversions
impl From<config::ConfigError> for StagehandError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}
