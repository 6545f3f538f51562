//! Loading schema documents from disk in every supported format.

use pretty_assertions::assert_eq;
use schema_core::Value;
use schema_loader::{ChainLoader, FileLoader, LoadError, MemoryLoader, ResourceLoader};
use serde_json::json;
use std::fs;
use tempfile::TempDir;
use url::Url;

fn write(dir: &TempDir, name: &str, content: &str) -> Url {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("write fixture");
    Url::from_file_path(&path).expect("absolute path")
}

#[test]
fn test_loads_json_file() {
    let dir = TempDir::new().unwrap();
    let url = write(&dir, "person.json", r#"{"type": "object", "required": ["id"]}"#);

    let doc = FileLoader.load(&url).unwrap();
    assert_eq!(doc, Value::try_from(json!({"type": "object", "required": ["id"]})).unwrap());
}

#[test]
fn test_loads_yaml_file() {
    let dir = TempDir::new().unwrap();
    let url = write(&dir, "person.yml", "type: object\nrequired:\n  - id\n");

    let doc = FileLoader.load(&url).unwrap();
    assert_eq!(doc, Value::try_from(json!({"type": "object", "required": ["id"]})).unwrap());
}

#[test]
fn test_loads_toml_file() {
    let dir = TempDir::new().unwrap();
    let url = write(&dir, "person.toml", "type = \"object\"\nrequired = [\"id\"]\n");

    let doc = FileLoader.load(&url).unwrap();
    assert_eq!(doc, Value::try_from(json!({"type": "object", "required": ["id"]})).unwrap());
}

#[test]
fn test_missing_file_is_not_found() {
    let dir = TempDir::new().unwrap();
    let url = Url::from_file_path(dir.path().join("nope.json")).unwrap();

    let err = FileLoader.load(&url).unwrap_err();
    assert!(err.is_not_found(), "unexpected error: {err}");
}

#[test]
fn test_broken_file_is_reported() {
    let dir = TempDir::new().unwrap();
    let url = write(&dir, "broken.json", "{\"type\": ");

    let err = FileLoader.load(&url).unwrap_err();
    assert!(matches!(err, LoadError::Json(_)));
}

#[test]
fn test_memory_overrides_disk_in_chain() {
    let dir = TempDir::new().unwrap();
    let url = write(&dir, "shadowed.json", r#"{"type": "string"}"#);

    let mut memory = MemoryLoader::new();
    memory.add_resource(url.as_str(), json!({"type": "integer"})).unwrap();
    let chain = ChainLoader::new().with(memory).with(FileLoader);

    assert_eq!(chain.load(&url).unwrap(), Value::try_from(json!({"type": "integer"})).unwrap());
}
