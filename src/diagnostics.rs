//! Leveled, timestamped record of every decision the engine takes.
//!
//! Each record is mirrored to `tracing` and, when enabled and at or above the
//! configured minimum level, handed to every attached [`Sink`]. The
//! [`FileSink`] appends human readable lines to a log file and serializes its
//! writes, so one file can be shared by several sessions.

use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

// used for timestamps on every line
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{error, info, trace, warn};

use crate::gate::Checkpoint;
use crate::kind::{Family, Kind};

// ------------- Levels and filters -------------
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Tracking,
    Info,
    Warning,
    Error,
}

impl Level {
    fn decorate(&self, message: &str) -> String {
        match self {
            Self::Tracking => format!("[Track] {message}"),
            Self::Info => format!("[Info] {message}"),
            Self::Warning => format!("[Warn]/!\\ {message}"),
            Self::Error => format!("!!![Error] {message} !!!"),
        }
    }
}

/// Which collections get their full content listed after an apply pass.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionLog {
    #[default]
    None,
    Models,
    Behaviors,
    All,
}

impl CollectionLog {
    pub fn covers(&self, family: Family) -> bool {
        matches!(
            (self, family),
            (Self::All, _) | (Self::Models, Family::Model) | (Self::Behaviors, Family::Behavior)
        )
    }
}

/// Which checkpoints announce themselves when they fire.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointLog {
    None,
    #[default]
    All,
    PreMainMenu,
    GameStart,
    InitializationFinished,
    SessionEnd,
}

impl CheckpointLog {
    pub fn covers(&self, checkpoint: Checkpoint) -> bool {
        match self {
            Self::None => false,
            Self::All => true,
            Self::PreMainMenu => checkpoint == Checkpoint::PreMainMenu,
            Self::GameStart => checkpoint == Checkpoint::GameStart,
            Self::InitializationFinished => checkpoint == Checkpoint::InitializationFinished,
            Self::SessionEnd => checkpoint == Checkpoint::SessionEnd,
        }
    }
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticSettings {
    pub enabled: bool,
    pub min_level: Level,
    pub collections: CollectionLog,
    pub checkpoints: CheckpointLog,
    pub log_file: Option<PathBuf>,
}

impl Default for DiagnosticSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            min_level: Level::Info,
            collections: CollectionLog::None,
            checkpoints: CheckpointLog::All,
            log_file: None,
        }
    }
}

// ------------- Records and sinks -------------
#[derive(Clone, Debug)]
pub struct Record {
    pub level: Level,
    pub timestamp: DateTime<Local>,
    pub message: String,
}

impl Record {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            timestamp: Local::now(),
            message: message.into(),
        }
    }
}
impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} > {}",
            self.timestamp.format("%d/%m/%y %H:%M:%S%.3f"),
            self.level.decorate(&self.message)
        )
    }
}

pub trait Sink: Send + Sync {
    fn write(&self, record: &Record) -> io::Result<()>;
}

/// Appends one line per record to a file, creating it when missing.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }
    pub fn path(&self) -> &Path {
        &self.path
    }
}
impl Sink for FileSink {
    fn write(&self, record: &Record) -> io::Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{record}")
    }
}

/// Keeps records in memory, for hosts that render them themselves and for tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<Record>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn records(&self) -> Vec<Record> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
    pub fn lines(&self) -> Vec<String> {
        self.records().iter().map(Record::to_string).collect()
    }
    pub fn messages_at(&self, level: Level) -> Vec<String> {
        self.records()
            .into_iter()
            .filter(|record| record.level == level)
            .map(|record| record.message)
            .collect()
    }
}
impl Sink for MemorySink {
    fn write(&self, record: &Record) -> io::Result<()> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(record.clone());
        Ok(())
    }
}

// ------------- Diagnostics -------------
pub struct Diagnostics {
    settings: DiagnosticSettings,
    // opened lazily for the current `log_file`
    file: Mutex<Option<Arc<FileSink>>>,
    sinks: Vec<Arc<dyn Sink>>,
}

impl Diagnostics {
    pub fn new(settings: DiagnosticSettings) -> Self {
        Self {
            settings,
            file: Mutex::new(None),
            sinks: Vec::new(),
        }
    }
    pub fn with_sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sinks.push(sink);
        self
    }
    pub fn settings(&self) -> &DiagnosticSettings {
        &self.settings
    }
    pub fn settings_mut(&mut self) -> &mut DiagnosticSettings {
        &mut self.settings
    }

    /// The sink for the `log_file` currently configured, reopened when the
    /// path was changed through [`Diagnostics::settings_mut`].
    fn file_sink(&self) -> Option<Arc<FileSink>> {
        let path = self.settings.log_file.as_deref()?;
        let mut file = self.file.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(sink) = file.as_ref().filter(|sink| sink.path() == path) {
            return Some(Arc::clone(sink));
        }
        let sink = Arc::new(FileSink::new(path));
        *file = Some(Arc::clone(&sink));
        Some(sink)
    }

    pub fn record(&self, level: Level, message: impl Into<String>) {
        let record = Record::new(level, message);
        match level {
            Level::Tracking => trace!(target: "stagehand", "{}", record.message),
            Level::Info => info!(target: "stagehand", "{}", record.message),
            Level::Warning => warn!(target: "stagehand", "{}", record.message),
            Level::Error => error!(target: "stagehand", "{}", record.message),
        }
        if !self.settings.enabled || level < self.settings.min_level {
            return;
        }
        if let Some(file) = self.file_sink() {
            deliver(&*file, &record);
        }
        for sink in &self.sinks {
            deliver(&**sink, &record);
        }
    }
    pub fn track(&self, message: impl Into<String>) {
        self.record(Level::Tracking, message)
    }
    pub fn info(&self, message: impl Into<String>) {
        self.record(Level::Info, message)
    }
    pub fn warning(&self, message: impl Into<String>) {
        self.record(Level::Warning, message)
    }
    pub fn error(&self, message: impl Into<String>) {
        self.record(Level::Error, message)
    }

    pub fn checkpoint(&self, checkpoint: Checkpoint) {
        if self.settings.checkpoints.covers(checkpoint) {
            self.info(checkpoint.to_string());
        }
    }

    /// Lists a collection's content, one line per slot.
    pub fn collection(&self, family: Family, kinds: &[Kind]) {
        if !self.settings.collections.covers(family) {
            return;
        }
        let heading = match family {
            Family::Behavior => " * Behavior list",
            Family::Model => " * Model list",
        };
        self.track(heading);
        for (index, kind) in kinds.iter().enumerate() {
            self.track(format!("{index} -> {kind}"));
        }
    }
}

fn deliver(sink: &dyn Sink, record: &Record) {
    if let Err(e) = sink.write(record) {
        warn!(target: "stagehand", error = %e, "diagnostics sink rejected a record");
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new(DiagnosticSettings::default())
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("settings", &self.settings)
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_carry_timestamp_and_decoration() {
        let record = Record::new(Level::Warning, "Model DefaultSmithingModel not found.");
        let line = record.to_string();
        let (stamp, message) = line.split_once(" > ").unwrap();
        // dd/mm/yy HH:MM:SS.fff
        assert_eq!(stamp.len(), 21);
        assert_eq!(message, "[Warn]/!\\ Model DefaultSmithingModel not found.");
        assert_eq!(Level::Error.decorate("boom"), "!!![Error] boom !!!");
    }

    #[test]
    fn minimum_level_and_master_switch_filter_sinks() {
        let sink = Arc::new(MemorySink::new());
        let mut diagnostics = Diagnostics::default().with_sink(sink.clone());
        diagnostics.track("hidden");
        diagnostics.info("shown");
        diagnostics.settings_mut().enabled = false;
        diagnostics.error("also hidden");
        assert_eq!(sink.messages_at(Level::Info), vec!["shown".to_string()]);
        assert_eq!(sink.records().len(), 1);
    }

    #[test]
    fn collection_filter_selects_families() {
        assert!(CollectionLog::All.covers(Family::Behavior));
        assert!(CollectionLog::Models.covers(Family::Model));
        assert!(!CollectionLog::Models.covers(Family::Behavior));
        assert!(!CollectionLog::None.covers(Family::Model));
    }

    #[test]
    fn checkpoint_filter_selects_one_or_all() {
        assert!(CheckpointLog::All.covers(Checkpoint::SessionEnd));
        assert!(CheckpointLog::GameStart.covers(Checkpoint::GameStart));
        assert!(!CheckpointLog::GameStart.covers(Checkpoint::PreMainMenu));
        assert!(!CheckpointLog::None.covers(Checkpoint::GameStart));
    }
}
