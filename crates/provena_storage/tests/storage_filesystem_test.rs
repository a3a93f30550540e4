//! Tests for filesystem blob storage.

use provena_storage::{BlobStorage, FileSystemStorage};
use tempfile::TempDir;

#[tokio::test]
async fn test_store_and_retrieve() {
    let temp_dir = TempDir::new().unwrap();
    let storage = FileSystemStorage::new(temp_dir.path()).unwrap();

    let data = b"Hello, world!";
    let reference = storage.store(data).await.unwrap();

    assert_eq!(reference.size_bytes, data.len() as u64);
    assert_eq!(reference.content_hash, FileSystemStorage::compute_hash(data));
    assert!(reference.storage_path.ends_with(&reference.content_hash));

    let retrieved = storage.retrieve(&reference).await.unwrap();
    assert_eq!(retrieved, data);
}

#[tokio::test]
async fn test_deduplication() {
    let temp_dir = TempDir::new().unwrap();
    let storage = FileSystemStorage::new(temp_dir.path()).unwrap();

    let ref1 = storage.store(b"Duplicate content").await.unwrap();
    let ref2 = storage.store(b"Duplicate content").await.unwrap();

    assert_eq!(ref1, ref2);
    assert!(std::path::Path::new(&ref1.storage_path).exists());
}

#[tokio::test]
async fn test_hash_verification() {
    let temp_dir = TempDir::new().unwrap();
    let storage = FileSystemStorage::new(temp_dir.path()).unwrap();

    let reference = storage.store(b"Original data").await.unwrap();
    tokio::fs::write(&reference.storage_path, b"Corrupted data")
        .await
        .unwrap();

    let result = storage.retrieve(&reference).await;
    assert!(matches!(
        result.unwrap_err().kind(),
        provena_error::ProvenaErrorKind::Storage(_)
    ));
}
