use std::io::Write;
use std::process::{Command, Output};

fn gate_bench(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_gate_bench"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to launch gate_bench")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn default_run_reports_every_attempt() {
    let output = gate_bench(&["2", "3", "5", "5", "--jitter-steps", "1", "--seed", "9"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let out = stdout(&output);
    assert!(out.contains("Write: Threads count: 2, Loops count: 5, Summary: 10,"), "{}", out);
    assert!(out.contains("Read: Threads count: 3, Loops count: 5, Summary: 15,"), "{}", out);
    assert!(out.contains("Strategy: turnstile,"), "{}", out);
    for line in out.lines().filter(|l| l.starts_with("Write: ") && !l.contains("Threads")) {
        let written = &line["Write: ".len()..];
        assert_eq!(written.len(), 9, "{}", line);
        assert!(written.bytes().all(|b| b.is_ascii_uppercase()), "{}", line);
    }
}

fn access_lines(out: &str) -> Vec<&str> {
    out.lines()
        .filter(|l| l.starts_with("read: ") || (l.starts_with("Write: ") && !l.contains("Threads")))
        .collect()
}

#[test]
fn quiet_run_prints_only_the_report() {
    let output = gate_bench(&["1", "1", "3", "3", "--jitter-steps", "1", "--quiet"]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(access_lines(&out).is_empty(), "{}", out);
    assert!(out.contains("Summary: 3,"), "{}", out);
}

#[test]
fn every_successful_access_is_printed() {
    let output = gate_bench(&["1", "2", "4", "4", "--jitter-steps", "1", "-s", "native-rw"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let out = stdout(&output);
    let lines = access_lines(&out);
    assert!(!lines.is_empty(), "{}", out);

    let reads = lines.iter().filter(|l| l.starts_with("read: ")).count();
    let writes = lines.len() - reads;
    assert!(out.contains(&format!("Successful read: {},", reads)), "{}", out);
    assert!(out.contains(&format!("Successful write: {},", writes)), "{}", out);
}

#[test]
fn zero_count_is_rejected_before_any_work() {
    let output = gate_bench(&["0", "3", "5", "5"]);
    assert_eq!(output.status.code(), Some(255));
    assert!(stderr(&output).contains("usage"));
    assert!(!stdout(&output).contains("Summary"));
}

#[test]
fn negative_count_is_rejected() {
    let output = gate_bench(&["2", "-3", "5", "5"]);
    assert_eq!(output.status.code(), Some(255));
    assert!(stderr(&output).contains("reader thread count"));
}

#[test]
fn missing_argument_prints_usage() {
    let output = gate_bench(&["2", "3", "5"]);
    assert_eq!(output.status.code(), Some(255));
    assert!(stderr(&output).contains("usage"));
}

#[test]
fn non_numeric_argument_is_rejected() {
    let output = gate_bench(&["two", "3", "5", "5"]);
    assert_eq!(output.status.code(), Some(255));
}

#[test]
fn unknown_strategy_is_rejected() {
    let output = gate_bench(&["1", "1", "1", "1", "--strategy", "spinlock"]);
    assert_eq!(output.status.code(), Some(255));
}

#[test]
fn settings_file_picks_the_strategy() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .unwrap();
    writeln!(
        file,
        "strategy = \"native-rw\"\nbuffer_capacity = 5\nseed = 3\n\n[jitter]\nstep_ms = 0\nsteps = 1"
    )
    .unwrap();
    let path = file.path().to_str().unwrap().to_string();

    let output = gate_bench(&["1", "2", "4", "4", "-c", &path]);
    assert!(output.status.success(), "{}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("Strategy: native-rw,"), "{}", out);
    for line in out.lines().filter(|l| l.starts_with("read: ")) {
        assert_eq!(line["read: ".len()..].len(), 4, "{}", line);
    }
}

#[test]
fn command_line_overrides_settings_file() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .unwrap();
    writeln!(file, "strategy = \"native-rw\"\n\n[jitter]\nstep_ms = 0\nsteps = 1").unwrap();
    let path = file.path().to_str().unwrap().to_string();

    let output = gate_bench(&["1", "1", "2", "2", "-c", &path, "--strategy", "turnstile-strict", "-q"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("Strategy: turnstile-strict,"));
}

#[test]
fn invalid_capacity_is_rejected() {
    let output = gate_bench(&["1", "1", "1", "1", "--capacity", "1"]);
    assert_eq!(output.status.code(), Some(255));
}
