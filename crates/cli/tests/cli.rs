use assert_cmd::Command;
use tempfile::TempDir;

fn libris(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("libris").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("RUST_LOG")
        .env_remove("LIBRIS_ENV")
        .env("LIBRIS_CONFIG_DIR", dir.path())
        .env("LIBRIS_STORAGE__BACKEND", "file")
        .env("LIBRIS_STORAGE__PATH", dir.path().join("library.json"))
        .env("LIBRIS_TELEMETRY__FILTER", "warn");
    cmd
}

fn stdout_json(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

#[test]
fn books_lists_seed_catalog() {
    let dir = TempDir::new().unwrap();
    let books = stdout_json(libris(&dir).arg("books"));
    assert_eq!(books.as_array().unwrap().len(), 8);
    assert!(dir.path().join("library.json").exists());
}

#[test]
fn search_by_category() {
    let dir = TempDir::new().unwrap();
    let found = stdout_json(libris(&dir).args(["search", "--category", "Dystopian"]));
    assert_eq!(found.as_array().unwrap().len(), 1);
    assert_eq!(found[0]["title"], "1984");
}

#[test]
fn borrow_persists_between_runs() {
    let dir = TempDir::new().unwrap();
    libris(&dir).args(["borrow", "6"]).assert().success();

    let loans = stdout_json(libris(&dir).arg("borrowed"));
    assert_eq!(loans.as_array().unwrap().len(), 1);
    assert_eq!(loans[0]["id"], "6");

    libris(&dir).args(["borrow", "6"]).assert().failure();
    libris(&dir).args(["return", "6"]).assert().success();
    libris(&dir).args(["return", "6"]).assert().failure();
}

#[test]
fn fourth_borrow_fails() {
    let dir = TempDir::new().unwrap();
    for id in ["1", "2", "3"] {
        libris(&dir).args(["borrow", id]).assert().success();
    }
    libris(&dir).args(["borrow", "4"]).assert().failure();

    let due = stdout_json(libris(&dir).arg("due"));
    assert!(due["overdue"].as_array().unwrap().is_empty());
}

#[test]
fn debug_logs_stay_off_stdout() {
    let dir = TempDir::new().unwrap();
    let output = libris(&dir)
        .env("LIBRIS_TELEMETRY__FILTER", "debug")
        .arg("categories")
        .assert()
        .success()
        .get_output()
        .clone();

    let categories: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(categories[0], "All");
    assert!(String::from_utf8_lossy(&output.stderr).contains("running catalog command"));
}

#[test]
fn out_of_range_loan_period_is_rejected() {
    let dir = TempDir::new().unwrap();
    let output = libris(&dir)
        .env("LIBRIS_LENDING__LOAN_PERIOD_DAYS", "10000000")
        .args(["borrow", "1"])
        .assert()
        .failure()
        .get_output()
        .clone();

    assert!(String::from_utf8_lossy(&output.stderr).contains("loan_period_days"));
    assert!(!dir.path().join("library.json").exists());
}
