//! Tests for unique name generation.

use provena_storage::{DEFAULT_NAME_LENGTH, NameGenerator, unique_name_in};
use std::collections::HashSet;
use tempfile::TempDir;

#[test]
fn test_names_never_collide_across_ten_thousand_calls() {
    let temp_dir = TempDir::new().unwrap();
    let mut seen = HashSet::new();

    for _ in 0..10_000 {
        let name = unique_name_in(temp_dir.path()).unwrap();
        assert_eq!(name.len(), DEFAULT_NAME_LENGTH);
        assert!(seen.insert(name.clone()), "duplicate name {name}");
        std::fs::write(temp_dir.path().join(&name), b"").unwrap();
    }
}

#[test]
fn test_short_names_skip_taken_prefixes() {
    let temp_dir = TempDir::new().unwrap();
    let generator = NameGenerator::new(1);

    // 62 single-character names exist; fill most of them with longer entries
    for _ in 0..50 {
        let name = generator.unique_in(temp_dir.path()).unwrap();
        let existing: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert!(existing.iter().all(|entry| !entry.starts_with(&name)));
        std::fs::write(temp_dir.path().join(format!("{name}.bam")), b"").unwrap();
    }
}

#[test]
fn test_missing_directory_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let result = unique_name_in(&temp_dir.path().join("absent"));
    assert!(matches!(
        result.unwrap_err().kind(),
        provena_error::ProvenaErrorKind::Storage(_)
    ));
}
