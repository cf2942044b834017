use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use stagehand::{
    CheckpointLog, CollectionLog, DiagnosticSettings, Diagnostics, FileSink, Instance, KindKeeper,
    Level, MemorySink, Record, Session, Settings, Sink,
};

fn scratch(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("stagehand-{}-{name}", std::process::id()));
    let _ = fs::remove_file(&path);
    path
}

#[test]
fn file_sink_appends_lines() {
    let path = scratch("append.log");
    let sink = FileSink::new(path.clone());
    sink.write(&Record::new(Level::Info, "first")).expect("write");
    sink.write(&Record::new(Level::Warning, "second")).expect("write");
    let content = fs::read_to_string(&path).expect("log file exists");
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with(" > [Info] first"));
    assert!(lines[1].ends_with(" > [Warn]/!\\ second"));
    let _ = fs::remove_file(&path);
}

#[test]
fn log_file_changes_apply_to_the_next_record() {
    let path = scratch("settings.log");
    let settings = DiagnosticSettings {
        log_file: Some(path.clone()),
        ..DiagnosticSettings::default()
    };
    let mut diagnostics = Diagnostics::new(settings);
    diagnostics.info("kept");
    diagnostics.track("below the minimum level");
    diagnostics.settings_mut().enabled = false;
    diagnostics.error("switched off");

    let moved = scratch("moved.log");
    diagnostics.settings_mut().enabled = true;
    diagnostics.settings_mut().log_file = Some(moved.clone());
    diagnostics.warning("after the move");

    let first = fs::read_to_string(&path).expect("first log");
    assert_eq!(first.lines().count(), 1);
    assert!(first.contains("[Info] kept"));
    let second = fs::read_to_string(&moved).expect("second log");
    assert_eq!(second.lines().count(), 1);
    assert!(second.contains("after the move"));
    let _ = fs::remove_file(&path);
    let _ = fs::remove_file(&moved);
}

#[test]
fn session_log_file_can_move_between_checkpoints() {
    let first = scratch("session-first.log");
    let second = scratch("session-second.log");
    let settings = DiagnosticSettings {
        log_file: Some(first.clone()),
        ..DiagnosticSettings::default()
    };
    let mut session = Session::new(Arc::new(KindKeeper::new()), Diagnostics::new(settings));
    session.pre_main_menu().expect("open");
    session.diagnostics_mut().settings_mut().log_file = Some(second.clone());
    let mut models: Vec<Instance> = Vec::new();
    session.game_start(&mut models).expect("models apply");

    let before = fs::read_to_string(&first).expect("first log");
    assert!(before.contains("[Info] pre_main_menu"));
    assert!(!before.contains("game_start"));
    let after = fs::read_to_string(&second).expect("second log");
    assert!(after.contains("[Info] game_start"));
    let _ = fs::remove_file(&first);
    let _ = fs::remove_file(&second);
}

#[test]
fn several_sinks_see_the_same_records() {
    let first = Arc::new(MemorySink::new());
    let second = Arc::new(MemorySink::new());
    let diagnostics = Diagnostics::default()
        .with_sink(first.clone())
        .with_sink(second.clone());
    diagnostics.error("boom");
    assert_eq!(first.lines().len(), 1);
    assert_eq!(first.messages_at(Level::Error), second.messages_at(Level::Error));
    assert!(first.lines()[0].contains("!!![Error] boom !!!"));
}

#[test]
fn missing_settings_file_gives_defaults() {
    let path = scratch("absent.toml");
    let settings = Settings::load(&path).expect("optional file");
    assert_eq!(settings, Settings::default());
}

#[test]
fn settings_file_is_read() {
    let path = scratch("present.toml");
    fs::write(
        &path,
        "[diagnostics]\n\
         enabled = false\n\
         min_level = \"warning\"\n\
         collections = \"behaviors\"\n\
         checkpoints = \"game_start\"\n\
         log_file = \"custom.log\"\n",
    )
    .expect("write settings");
    let settings = Settings::load(&path).expect("parsed");
    let diagnostics = settings.diagnostics;
    assert!(!diagnostics.enabled);
    assert_eq!(diagnostics.min_level, Level::Warning);
    assert_eq!(diagnostics.collections, CollectionLog::Behaviors);
    assert_eq!(diagnostics.checkpoints, CheckpointLog::GameStart);
    assert_eq!(diagnostics.log_file, Some(PathBuf::from("custom.log")));
    let _ = fs::remove_file(&path);
}

#[test]
fn malformed_settings_are_a_config_error() {
    let path = scratch("broken.toml");
    fs::write(&path, "[diagnostics]\nmin_level = \"loud\"\n").expect("write settings");
    let err = Settings::load(&path).unwrap_err();
    assert!(matches!(err, stagehand::StagehandError::Config(_)));
    let _ = fs::remove_file(&path);
}
