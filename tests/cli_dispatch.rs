use std::path::PathBuf;

use clap::Parser;
use student_perf::cli::{dispatch, Cli};
use student_perf::config::AppConfig;
use student_perf::features::PerformanceLevel;
use student_perf::history::PredictionHistory;

fn config_with_history(history_dir: &std::path::Path) -> AppConfig {
    let fixtures: PathBuf = [env!("CARGO_MANIFEST_DIR"), "tests", "fixtures"].iter().collect();
    let mut cfg = AppConfig::defaults();
    cfg.artifacts.dir = fixtures.to_string_lossy().into_owned();
    cfg.history.path = history_dir.join("history").to_string_lossy().into_owned();
    cfg
}

#[test]
fn predict_with_record_appends_to_history() {
    let temp_dir = tempfile::tempdir().expect("temp dir should be created");
    let cfg = config_with_history(temp_dir.path());
    let history_path = cfg.history.path.clone();

    let cli = Cli::parse_from(["student_perf", "predict", "--record", "--json"]);
    dispatch(cli, cfg).expect("predict should succeed");

    let history = PredictionHistory::open(&history_path).expect("history should reopen");
    assert_eq!(history.len().unwrap(), 1);
    let entries = history.recent(1).unwrap();
    assert_eq!(entries[0].label, PerformanceLevel::Medium);
    assert_eq!(entries[0].math_score, 70);
}

#[test]
fn predict_without_record_leaves_history_untouched() {
    let temp_dir = tempfile::tempdir().expect("temp dir should be created");
    let cfg = config_with_history(temp_dir.path());
    let history_path = cfg.history.path.clone();

    let cli = Cli::parse_from(["student_perf", "predict", "--gender", "MALE", "--math", "95"]);
    dispatch(cli, cfg).expect("predict should succeed");

    assert!(!PathBuf::from(history_path).exists());
}

#[test]
fn out_of_range_score_fails_before_loading_models() {
    let temp_dir = tempfile::tempdir().expect("temp dir should be created");
    let mut cfg = config_with_history(temp_dir.path());
    cfg.artifacts.dir = temp_dir.path().join("absent").to_string_lossy().into_owned();

    let cli = Cli::parse_from(["student_perf", "predict", "--math", "150"]);
    let err = dispatch(cli, cfg).unwrap_err();
    assert!(format!("{err:#}").contains("math"));
}

#[test]
fn missing_artifacts_fail_the_command() {
    let temp_dir = tempfile::tempdir().expect("temp dir should be created");
    let mut cfg = config_with_history(temp_dir.path());
    cfg.artifacts.dir = temp_dir.path().join("absent").to_string_lossy().into_owned();

    let cli = Cli::parse_from(["student_perf", "predict"]);
    let err = dispatch(cli, cfg).unwrap_err();
    assert!(format!("{err:#}").contains("model artifacts are required"));
}

#[test]
fn schema_and_config_commands_succeed() {
    let temp_dir = tempfile::tempdir().expect("temp dir should be created");

    let cli = Cli::parse_from(["student_perf", "schema"]);
    dispatch(cli, config_with_history(temp_dir.path())).expect("schema should print");

    let cli = Cli::parse_from(["student_perf", "config"]);
    dispatch(cli, config_with_history(temp_dir.path())).expect("config should print");
}
