//! Binary-level checks for argument handling and fatal configuration errors.
//!
//! Run with: cargo test -p stancemap-cli --test cli_test

use std::process::Command;

fn stancemap(dir: &std::path::Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_stancemap"));
    cmd.current_dir(dir)
        .env_remove("OPENAI_API_KEY")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn analyze_without_api_key_fails_before_touching_files() {
    let dir = tempfile::tempdir().unwrap();
    let output = stancemap(dir.path()).arg("analyze").output().unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("OPENAI_API_KEY"), "stderr: {stderr}");
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn aggregate_help_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let output = stancemap(dir.path()).args(["aggregate", "--help"]).output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--concurrency"));
    assert!(stdout.contains("--timeout"));
}

#[test]
fn aggregate_ignores_unknown_trailing_arguments() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("public")).unwrap();
    std::fs::write(
        dir.path().join("public/national_governments.csv"),
        "country,code,foreign_affairs_ministry_url,http_response_code\n\
         Downland,DL,https://www.down.example,404\n",
    )
    .unwrap();

    let output = stancemap(dir.path())
        .args([
            "aggregate",
            "--concurrency",
            "2",
            "--date",
            "2025-06-28",
            "--frobnicate",
            "extra",
        ])
        .env_remove("BROWSERLESS_URL")
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    // No live rows: the run directory exists but holds no artifacts.
    let run_dir = dir.path().join("results/2025-06-28");
    assert!(run_dir.is_dir());
    assert_eq!(std::fs::read_dir(run_dir).unwrap().count(), 0);
}

#[test]
fn probe_without_url_column_fails() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("countries.csv");
    std::fs::write(&csv, "country,code\nTestland,TL\n").unwrap();

    let output = stancemap(dir.path())
        .args(["probe", "--countries-csv"])
        .arg(&csv)
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Required CSV column not found"), "stderr: {stderr}");
    assert_eq!(
        std::fs::read_to_string(&csv).unwrap(),
        "country,code\nTestland,TL\n"
    );
}

#[test]
fn probe_with_zero_timeout_fails_and_leaves_table_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("countries.csv");
    let original = "country,code,foreign_affairs_ministry_url,http_response_code\n\
                    Testland,TL,https://www.example.com,200\n";
    std::fs::write(&csv, original).unwrap();

    let output = stancemap(dir.path())
        .args(["probe", "--timeout", "0", "--countries-csv"])
        .arg(&csv)
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("timeout must be positive"), "stderr: {stderr}");
    assert_eq!(std::fs::read_to_string(&csv).unwrap(), original);
}
