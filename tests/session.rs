//! Command sessions over the file store
//!
//! Drives `Session` with scripted input the way a user at the prompt would,
//! then checks both the printed output and the state left on disk.

use std::fs;
use std::path::Path;

use filecabinet::cli::Session;
use filecabinet::storage::{FileStore, RecordStore, StoreStat};
use filecabinet::validation::RuleSet;
use tempfile::TempDir;

const INSERT_THREE: &str = "\
insert (id, firstname, lastname, dateofbirth, height, income, patronymicletter) values (1, Ann, Lee, 1990-01-02, 170, 1000, B)
insert (id, firstname, lastname, dateofbirth, height, income, patronymicletter) values (2, Bob, Kim, 1980-03-04, 181, 2000.50, C)
insert (id, firstname, lastname, dateofbirth, height, income, patronymicletter) values (3, Cid, Lee, 1975-12-31, 165, 300, D)
";

fn open(path: &Path) -> FileStore {
    FileStore::open(path, Box::new(RuleSet::builtin_default().validator())).unwrap()
}

/// Run `script` against the store at `path`, returning the printed output.
fn run_script(path: &Path, script: &str) -> String {
    let mut session = Session::new(Box::new(open(path)), script.as_bytes(), Vec::new());
    session.run().unwrap();
    String::from_utf8(session.into_output()).unwrap()
}

#[test]
fn test_records_survive_between_sessions() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("cabinet.db");

    run_script(&db, INSERT_THREE);
    let out = run_script(&db, "list\nfind lastname lee\nexit\n");

    assert!(out.contains("#2, Bob, Kim, 1980-Mar-04, 181, 2000.50, C"));
    assert!(out.contains("#1, Ann, Lee"));
    assert!(out.contains("#3, Cid, Lee"));
    assert!(out.contains("Exiting an application..."));
}

#[test]
fn test_delete_then_purge_reports_counts() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("cabinet.db");

    let script = format!("{}delete where lastname = Lee\nstat\npurge\nstat\n", INSERT_THREE);
    let out = run_script(&db, &script);

    assert!(out.contains("Record(s) #1, #3 deleted."));
    assert!(out.contains("1 record(s). 2 removed."));
    assert!(out.contains("Data storage processing is completed: 2 of 3 records were purged."));
    assert!(out.contains("1 record(s). 0 removed."));

    let store = open(&db);
    assert_eq!(store.get_stat().unwrap(), StoreStat { live: 1, removed: 0 });
    assert_eq!(store.get(2).unwrap().unwrap().first_name, "Bob");
}

#[test]
fn test_export_then_import_into_another_cabinet() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("source.db");
    let target = dir.path().join("target.db");
    let export = dir.path().join("records.json");

    let script = format!("{}export json '{}'\n", INSERT_THREE, export.display());
    let out = run_script(&source, &script);
    assert!(out.contains("All records are exported into file"));

    let out = run_script(&target, &format!("import json '{}'\n", export.display()));
    assert!(out.contains("3 record(s) were imported from"));

    assert_eq!(open(&target).get_all().unwrap(), open(&source).get_all().unwrap());
}

#[test]
fn test_import_reports_skipped_records() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("cabinet.db");
    let import = dir.path().join("import.json");
    fs::write(
        &import,
        r#"[
            {"id": 4, "first_name": "Dan", "last_name": "Roe", "date_of_birth": "1991-07-07",
             "height": 180, "income": "10.00", "patronymic_letter": "E"},
            {"id": 5, "first_name": "Eve", "last_name": "Roe", "date_of_birth": "1991-07-07",
             "height": 999, "income": "10.00", "patronymic_letter": "E"},
            {"id": 6}
        ]"#,
    )
    .unwrap();

    let out = run_script(&db, &format!("import json '{}'\nstat\n", import.display()));

    assert!(out.contains("Skipped record #6"));
    assert!(out.contains("Skipped record #5"));
    assert!(out.contains("1 record(s) were imported from"));
    assert!(out.contains("1 record(s). 0 removed."));
}

#[test]
fn test_update_is_written_through() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("cabinet.db");

    let script = format!("{}update set income = 4200 where id = 2\n", INSERT_THREE);
    run_script(&db, &script);

    let record = open(&db).get(2).unwrap().unwrap();
    assert_eq!(record.income.to_string(), "4200.00");
    assert_eq!(record.last_name, "Kim");
}
