#![allow(clippy::unwrap_used)]

use super::*;

#[test]
fn test_fresh_schema_version() {
    let db = Database::open_in_memory().unwrap();
    assert_eq!(db.schema_version().unwrap(), schema::CURRENT_VERSION);
}

#[test]
fn test_read_missing_document() {
    let db = Database::open_in_memory().unwrap();
    assert!(db.read(DocKey::Budgets).unwrap().is_none());
    assert!(db.updated_at(DocKey::Budgets).unwrap().is_none());
}

#[test]
fn test_write_then_read() {
    let mut db = Database::open_in_memory().unwrap();
    db.write_all(&[(DocKey::Transactions, "[]".into())]).unwrap();
    assert_eq!(db.read(DocKey::Transactions).unwrap().as_deref(), Some("[]"));
    assert!(db.updated_at(DocKey::Transactions).unwrap().is_some());
}

#[test]
fn test_write_replaces_whole_document() {
    let mut db = Database::open_in_memory().unwrap();
    db.write_all(&[(DocKey::Budgets, r#"{"Rent":"1"}"#.into())]).unwrap();
    db.write_all(&[(DocKey::Budgets, r#"{"Gas":"2"}"#.into())]).unwrap();
    assert_eq!(
        db.read(DocKey::Budgets).unwrap().as_deref(),
        Some(r#"{"Gas":"2"}"#)
    );
}

#[test]
fn test_write_all_multiple_keys() {
    let mut db = Database::open_in_memory().unwrap();
    db.write_all(&[
        (DocKey::Budgets, "{}".into()),
        (DocKey::SetupComplete, "true".into()),
    ])
    .unwrap();
    assert_eq!(db.read(DocKey::Budgets).unwrap().as_deref(), Some("{}"));
    assert_eq!(db.read(DocKey::SetupComplete).unwrap().as_deref(), Some("true"));
}

#[test]
fn test_clear_removes_everything() {
    let mut db = Database::open_in_memory().unwrap();
    db.write_all(&[
        (DocKey::Budgets, "{}".into()),
        (DocKey::Transactions, "[]".into()),
    ])
    .unwrap();
    db.clear().unwrap();
    assert!(db.read(DocKey::Budgets).unwrap().is_none());
    assert!(db.read(DocKey::Transactions).unwrap().is_none());
}

#[test]
fn test_reopen_on_disk_keeps_documents() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.db");
    {
        let mut db = Database::open(&path).unwrap();
        db.write_all(&[(DocKey::Transactions, "[1]".into())]).unwrap();
    }
    let db = Database::open(&path).unwrap();
    assert_eq!(db.read(DocKey::Transactions).unwrap().as_deref(), Some("[1]"));
    assert_eq!(db.schema_version().unwrap(), schema::CURRENT_VERSION);
}
