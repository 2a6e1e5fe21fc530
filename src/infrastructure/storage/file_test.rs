use anyhow::Result;
use tempfile::TempDir;

use super::FileStorage;
use crate::domain::models::StateStorage;

#[test]
fn it_returns_none_without_a_file() -> Result<()> {
    let tmp_dir = TempDir::new()?;
    let storage = FileStorage::new(tmp_dir.path().join("storage.json"));

    assert_eq!(storage.get("missing")?, None);

    return Ok(());
}

#[test]
fn it_persists_values_across_instances() -> Result<()> {
    let tmp_dir = TempDir::new()?;
    let file_path = tmp_dir.path().join("nested/storage.json");

    let storage = FileStorage::new(file_path.clone());
    storage.set("first", r#"{"a":1}"#)?;
    storage.set("second", "null")?;

    let reopened = FileStorage::new(file_path);
    assert_eq!(reopened.get("first")?, Some(r#"{"a":1}"#.to_string()));
    assert_eq!(reopened.get("second")?, Some("null".to_string()));

    return Ok(());
}

#[test]
fn it_overwrites_and_removes_values() -> Result<()> {
    let tmp_dir = TempDir::new()?;
    let storage = FileStorage::new(tmp_dir.path().join("storage.json"));

    storage.set("key", r#""one""#)?;
    storage.set("key", r#""two""#)?;
    assert_eq!(storage.get("key")?, Some(r#""two""#.to_string()));

    storage.remove("key")?;
    assert_eq!(storage.get("key")?, None);

    return Ok(());
}

#[test]
fn it_rejects_non_json_values() -> Result<()> {
    let tmp_dir = TempDir::new()?;
    let storage = FileStorage::new(tmp_dir.path().join("storage.json"));

    assert!(storage.set("key", "not json").is_err());

    return Ok(());
}
