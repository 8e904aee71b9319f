use std::fs;

use serde_json::json;
use tempfile::TempDir;
use wikirag_core::ResourceDescriptor;
use wikirag_engine::{
    ensure_output_dir, ArtifactDirectory, LocalDirectoryTarget, PersistError, Target,
    TargetError,
};

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("out");
    assert!(!new_dir.exists());
    ensure_output_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn write_replaces_existing_artifact() {
    let temp = TempDir::new().unwrap();
    let directory = ArtifactDirectory::new(temp.path().to_path_buf());

    let first = directory.write("abc.wikitext", b"hello").unwrap();
    assert_eq!(first.file_name().unwrap(), "abc.wikitext");
    assert_eq!(fs::read_to_string(&first).unwrap(), "hello");

    let second = directory.write("abc.wikitext", b"world").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(&second).unwrap(), "world");
}

#[test]
fn no_partial_file_on_error() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let directory = ArtifactDirectory::new(file_path.clone());
    let result = directory.write("abc.wikitext", b"data");
    assert!(result.is_err());
    assert!(!file_path.with_file_name("abc.wikitext").exists());
}

#[test]
fn remove_reports_whether_a_file_was_there() {
    let temp = TempDir::new().unwrap();
    let directory = ArtifactDirectory::new(temp.path().to_path_buf());
    directory.write("abc.html", b"<p/>").unwrap();

    assert!(directory.remove("abc.html").unwrap());
    assert!(!directory.remove("abc.html").unwrap());
}

#[test]
fn unsafe_file_names_are_rejected() {
    let temp = TempDir::new().unwrap();
    let directory = ArtifactDirectory::new(temp.path().to_path_buf());

    for name in ["", "../escape", "a/b", ".hidden"] {
        assert!(matches!(
            directory.write(name, b"x"),
            Err(PersistError::FileName(_))
        ));
    }
}

#[test]
fn local_directory_target_writes_and_removes() {
    let temp = TempDir::new().unwrap();
    let mut target = LocalDirectoryTarget::new();
    let resource = ResourceDescriptor::new("abc", "wikitext", b"text".to_vec());
    assert!(matches!(
        target.write(&resource),
        Err(TargetError::NotConfigured)
    ));

    let settings = json!({ "path": temp.path().join("export").to_string_lossy() });
    target
        .set_config(settings.as_object().unwrap().clone())
        .unwrap();
    target.write(&resource).unwrap();
    let path = temp.path().join("export").join("abc.wikitext");
    assert_eq!(fs::read_to_string(&path).unwrap(), "text");

    target
        .remove(&ResourceDescriptor::empty("abc", "wikitext"))
        .unwrap();
    assert!(!path.exists());
    target
        .remove(&ResourceDescriptor::empty("abc", "wikitext"))
        .unwrap();
}
