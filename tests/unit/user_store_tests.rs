//! Unit tests for the user settings file.

use chesscli_engine::persistence::UserStore;

#[test]
fn missing_file_has_no_username() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = UserStore::new(dir.path().join(".chesscli.json"));
    assert!(store.read_username().is_none());
}

#[test]
fn written_username_reads_back() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = UserStore::new(dir.path().join(".chesscli.json"));

    assert!(store.write_username("magnus"));
    assert_eq!(store.read_username().as_deref(), Some("magnus"));

    let raw = std::fs::read_to_string(store.path()).expect("file written");
    assert_eq!(raw, r#"{"username":"magnus"}"#);
}

#[test]
fn empty_or_absent_name_reads_as_none() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = UserStore::new(dir.path().join(".chesscli.json"));

    std::fs::write(store.path(), r#"{"username":""}"#).expect("write");
    assert!(store.read_username().is_none());

    std::fs::write(store.path(), r#"{"theme":"dark"}"#).expect("write");
    assert!(store.read_username().is_none());
}

#[test]
fn corrupt_file_reads_as_none() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = UserStore::new(dir.path().join(".chesscli.json"));
    std::fs::write(store.path(), "username=magnus").expect("write");
    assert!(store.read_username().is_none());
}

#[test]
fn write_into_missing_directory_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = UserStore::new(dir.path().join("absent").join(".chesscli.json"));
    assert!(!store.write_username("magnus"));
}
