use modvault_fs::{AtomicWriteOptions, atomic_read, atomic_write, commit_staged, ensure_dir, staging_path};
use tempfile::tempdir;

#[test]
fn test_atomic_write_replaces_existing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("existing.json");

    std::fs::write(&path, "original").unwrap();
    atomic_write(&path, b"new content", AtomicWriteOptions::new()).unwrap();

    assert_eq!(atomic_read(&path).unwrap(), b"new content");
}

#[test]
fn test_staged_file_commits_into_nested_dir() {
    let dir = tempdir().unwrap();
    let destination = dir.path().join("Checkpoint").join("Model").join("model.safetensors");
    ensure_dir(destination.parent().unwrap()).unwrap();

    let staging = staging_path(&destination).unwrap();
    std::fs::write(&staging, b"weights").unwrap();
    commit_staged(&staging, &destination).unwrap();

    assert!(!staging.exists());
    assert_eq!(atomic_read(&destination).unwrap(), b"weights");
}

#[test]
fn test_commit_replaces_previous_download() {
    let dir = tempdir().unwrap();
    let destination = dir.path().join("model.ckpt");
    std::fs::write(&destination, b"stale").unwrap();

    let staging = staging_path(&destination).unwrap();
    std::fs::write(&staging, b"fresh").unwrap();
    commit_staged(&staging, &destination).unwrap();

    assert_eq!(atomic_read(&destination).unwrap(), b"fresh");
}
