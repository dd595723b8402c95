use assert_cmd::Command;
use lockbuster::{RecordsDb, ScoreStore};
use tempfile::tempdir;

fn lockbuster() -> Command {
    Command::cargo_bin("lockbuster").unwrap()
}

fn seeded_db(path: &std::path::Path) {
    let mut db = RecordsDb::open(path).unwrap();
    db.set("speedrun:25", 18.5).unwrap();
    db.set("countdown:60", 42.0).unwrap();
}

#[test]
fn best_on_empty_database() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("records.db");

    let out = lockbuster()
        .arg("--db")
        .arg(&db)
        .arg("best")
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&out.get_output().stdout).to_string();
    assert!(stdout.contains("no best records yet"));
}

#[test]
fn default_database_lives_under_home_state_dir() {
    let home = tempdir().unwrap();

    lockbuster()
        .env("HOME", home.path())
        .arg("best")
        .assert()
        .success();

    let db = home
        .path()
        .join(".local")
        .join("state")
        .join("lockbuster")
        .join("records.db");
    assert!(db.exists());
}

#[test]
fn best_lists_stored_records() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("records.db");
    seeded_db(&db);

    let out = lockbuster()
        .arg("--db")
        .arg(&db)
        .arg("best")
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&out.get_output().stdout).to_string();
    assert!(stdout.contains("speedrun:25"));
    assert!(stdout.contains("18.500s"));
    assert!(stdout.contains("countdown:60"));
    assert!(stdout.contains("42"));
}

#[test]
fn export_writes_csv_file() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("records.db");
    let csv = dir.path().join("best.csv");
    seeded_db(&db);

    lockbuster()
        .arg("--db")
        .arg(&db)
        .arg("export")
        .arg("-o")
        .arg(&csv)
        .assert()
        .success();

    let text = std::fs::read_to_string(&csv).unwrap();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "key,value,updated_at");
    assert!(lines[1].starts_with("countdown:60,42,"));
    assert!(lines[2].starts_with("speedrun:25,18.5,"));
}

#[test]
fn clear_empties_the_database() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("records.db");
    seeded_db(&db);

    let out = lockbuster()
        .arg("--db")
        .arg(&db)
        .arg("clear")
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&out.get_output().stdout).to_string();
    assert!(stdout.contains("removed 2"));

    assert!(RecordsDb::open(&db).unwrap().all_records().unwrap().is_empty());
}

#[test]
fn play_requires_a_tty() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("records.db");

    // assert_cmd pipes stdin, so the tty check should reject the session
    lockbuster()
        .arg("--db")
        .arg(&db)
        .args(["play", "speedrun", "--target", "25"])
        .write_stdin("")
        .assert()
        .failure();
}

#[test]
fn unknown_difficulty_is_rejected() {
    lockbuster()
        .args(["play", "chess-clock", "--difficulty", "impossible"])
        .assert()
        .failure();
}
