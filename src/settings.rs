use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::diagnostics::DiagnosticSettings;
use crate::error::Result;

/// Host-side settings, read from an optional file and the environment.
///
/// Environment variables use the `STAGEHAND` prefix and `__` between
/// sections, e.g. `STAGEHAND__DIAGNOSTICS__MIN_LEVEL=warning`.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub diagnostics: DiagnosticSettings,
}

impl Settings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(Environment::with_prefix("STAGEHAND").separator("__"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}
