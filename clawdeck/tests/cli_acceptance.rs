use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

struct CliTestEnv {
    _temp_dir: TempDir,
    home: PathBuf,
    xdg_data: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_data = base.join("xdg-data");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");

        fs::create_dir_all(&home).expect("failed to create HOME");
        fs::create_dir_all(&xdg_data).expect("failed to create XDG_DATA_HOME");
        fs::create_dir_all(&xdg_config).expect("failed to create XDG_CONFIG_HOME");
        fs::create_dir_all(&xdg_state).expect("failed to create XDG_STATE_HOME");

        write_config(&xdg_config);

        Self {
            _temp_dir: temp_dir,
            home,
            xdg_data,
            xdg_config,
            xdg_state,
        }
    }
}

/// Path to the session fixtures shared with the core crate.
fn fixture_sessions_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../clawdeck-core/tests/fixtures/sessions")
}

fn write_config(xdg_config: &PathBuf) {
    let sessions = fixture_sessions_dir()
        .canonicalize()
        .expect("missing session fixtures");
    write_config_with(xdg_config, &sessions);
}

fn write_config_with(xdg_config: &Path, sessions: &Path) {
    let dir = xdg_config.join("clawdeck");
    fs::create_dir_all(&dir).expect("failed to create config dir");
    let toml = format!("[agent]\nsessions_dir = {:?}\n", sessions.to_str().unwrap());
    fs::write(dir.join("config.toml"), toml).expect("failed to write config");
}

fn run_clawdeck(env: &CliTestEnv, args: &[&str]) -> Output {
    let bin_path = PathBuf::from(assert_cmd::cargo::cargo_bin!("clawdeck"));

    Command::new(bin_path)
        .args(args)
        .env("HOME", &env.home)
        .env("XDG_DATA_HOME", &env.xdg_data)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .output()
        .unwrap_or_else(|e| panic!("failed to execute clawdeck: {e}"))
}

fn assert_success(args: &[&str], output: &Output) {
    if output.status.success() {
        return;
    }

    let rendered_args = args
        .iter()
        .map(|arg| OsString::from(arg).to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    panic!(
        "clawdeck {rendered_args} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        output.status, stdout, stderr
    );
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

// Lower bound covering every fixture timestamp (2026-08-19T00:00:00Z),
// so window defaults relative to the wall clock never hide them.
const FIXTURE_SINCE: &str = "1787184000000";

#[test]
fn feed_shows_transcript_derived_activities() {
    let env = CliTestEnv::new();

    let args = ["feed", "--since", FIXTURE_SINCE];
    let output = run_clawdeck(&env, &args);
    assert_success(&args, &output);

    let stdout = stdout_of(&output);
    assert!(
        stdout.contains("Exec: cargo test --workspace"),
        "expected derived exec activity, got:\n{stdout}"
    );
    assert!(stdout.contains("Wrote: email-summary.md"));
}

#[test]
fn feed_json_is_parseable_and_sorted() {
    let env = CliTestEnv::new();

    let args = ["--json", "feed", "--since", FIXTURE_SINCE];
    let output = run_clawdeck(&env, &args);
    assert_success(&args, &output);

    let parsed: serde_json::Value =
        serde_json::from_str(&stdout_of(&output)).expect("feed --json should emit valid JSON");
    let entries = parsed.as_array().expect("feed JSON should be an array");
    assert_eq!(entries.len(), 3);

    let times: Vec<i64> = entries
        .iter()
        .map(|e| e["creation_time"].as_i64().expect("creation_time"))
        .collect();
    let mut sorted = times.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(times, sorted, "feed must be newest first");
}

#[test]
fn log_then_feed_round_trips_explicit_activity() {
    let env = CliTestEnv::new();

    let log_args = [
        "log",
        "task_completed",
        "Shipped the weekly report",
        "--description",
        "sent to the team channel",
    ];
    let output = run_clawdeck(&env, &log_args);
    assert_success(&log_args, &output);
    assert!(stdout_of(&output).contains("Logged act_"));

    // The logged activity shows up in the feed and in a text search
    let feed_args = ["feed", "--search", "weekly report"];
    let output = run_clawdeck(&env, &feed_args);
    assert_success(&feed_args, &output);
    assert!(stdout_of(&output).contains("Shipped the weekly report"));
}

#[test]
fn sessions_lists_fixtures_and_shows_messages() {
    let env = CliTestEnv::new();

    let args = ["sessions"];
    let output = run_clawdeck(&env, &args);
    assert_success(&args, &output);

    let stdout = stdout_of(&output);
    assert!(stdout.contains("a1b2c3d4e5f6"));
    assert!(stdout.contains("Please summarize my unread email"));

    let args = ["sessions", "a1b2c3"];
    let output = run_clawdeck(&env, &args);
    assert_success(&args, &output);
    assert!(stdout_of(&output).contains("On it. Checking your inbox now."));
}

#[test]
fn sessions_and_cost_handle_multibyte_session_ids() {
    let env = CliTestEnv::new();

    // Session ids are file stems, so any UTF-8 filename is a valid id.
    // Here the é straddles the 12-character display cutoff when counted
    // in bytes.
    let sessions = env.home.join("sessions");
    fs::create_dir_all(&sessions).expect("failed to create sessions dir");
    let line = concat!(
        r#"{"type":"message","timestamp":"2026-08-20T09:00:12Z","#,
        r#""message":{"role":"assistant","timestamp":1787216412000,"#,
        r#""content":[{"type":"text","text":"All done."}],"#,
        r#""usage":{"cost":{"total":0.002,"input":0.001,"output":0.001}}}}"#,
    );
    fs::write(sessions.join("aaaaaaaaaaaéb.jsonl"), line).expect("failed to write session");
    write_config_with(&env.xdg_config, &sessions);

    let args = ["sessions"];
    let output = run_clawdeck(&env, &args);
    assert_success(&args, &output);
    assert!(stdout_of(&output).contains("aaaaaaaaaaaé"));

    let args = ["cost"];
    let output = run_clawdeck(&env, &args);
    assert_success(&args, &output);
    assert!(stdout_of(&output).contains("aaaaaaaaaaaé"));
}

#[test]
fn feed_watch_rejects_json_output() {
    let env = CliTestEnv::new();

    let args = ["--json", "feed", "--watch"];
    let output = run_clawdeck(&env, &args);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not supported with --watch"));
}

#[test]
fn cost_json_reports_all_time_totals() {
    let env = CliTestEnv::new();

    let args = ["--json", "cost"];
    let output = run_clawdeck(&env, &args);
    assert_success(&args, &output);

    let parsed: serde_json::Value =
        serde_json::from_str(&stdout_of(&output)).expect("cost --json should emit valid JSON");
    assert_eq!(parsed["all_time"]["session_count"].as_u64(), Some(3));
    let total = parsed["all_time"]["total"].as_f64().expect("total");
    assert!((total - 0.016).abs() < 1e-9, "got total {total}");
    assert_eq!(parsed["by_day"].as_array().map(|a| a.len()), Some(14));
}

#[test]
fn rhythm_counts_logged_activity() {
    let env = CliTestEnv::new();

    let log_args = ["log", "build", "Compiled the release binary"];
    let output = run_clawdeck(&env, &log_args);
    assert_success(&log_args, &output);

    let args = ["--json", "rhythm"];
    let output = run_clawdeck(&env, &args);
    assert_success(&args, &output);

    let parsed: serde_json::Value =
        serde_json::from_str(&stdout_of(&output)).expect("rhythm --json should emit valid JSON");
    assert_eq!(parsed["week_days"].as_array().map(|a| a.len()), Some(7));
    assert_eq!(parsed["streak"].as_u64(), Some(1));
    assert_eq!(parsed["activity_count_this_week"].as_u64(), Some(1));
}

#[test]
fn inbox_strips_noise_and_metadata() {
    let env = CliTestEnv::new();

    let args = ["inbox"];
    let output = run_clawdeck(&env, &args);
    assert_success(&args, &output);

    let stdout = stdout_of(&output);
    assert!(stdout.contains("Can you check the build?"));
    assert!(!stdout.contains("Read HEARTBEAT"));
    assert!(!stdout.contains("untrusted metadata"));
}

#[test]
fn gateway_commands_fail_cleanly_when_unconfigured() {
    let env = CliTestEnv::new();

    let args = ["send", "hello"];
    let output = run_clawdeck(&env, &args);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("gateway is not configured"));

    let args = ["crons"];
    let output = run_clawdeck(&env, &args);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("gateway is not configured"));
}
