mod common;

use common::*;
use defectscan::{FileSystemStorage, persist_result};

fn sample_result() -> DetectionResult {
    let img = canvas_with_squares(275, 183, &[(50, 50, 30)]);
    DetectionPipeline::new().detect_image(&img).unwrap()
}

#[test]
fn test_save_writes_file_and_returns_url() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let storage = FileSystemStorage::new(dir.path().join("media"), "/media");

    let locator = storage.save("report.bin", b"abc")?;

    assert_eq!(locator.name, "report.bin");
    assert_eq!(locator.url, "/media/report.bin");
    assert_eq!(locator.path, dir.path().join("media").join("report.bin"));
    assert_eq!(std::fs::read(&locator.path)?, b"abc");
    Ok(())
}

#[test]
fn test_save_never_overwrites() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let storage = FileSystemStorage::new(dir.path(), "/media/");

    storage.save("a.png", b"first")?;
    let err = storage.save("a.png", b"second").unwrap_err();

    assert!(matches!(err, StorageError::AlreadyExists(_)), "{:?}", err);
    assert_eq!(std::fs::read(dir.path().join("a.png"))?, b"first");
    Ok(())
}

#[test]
fn test_save_rejects_path_like_names() {
    let dir = tempfile::TempDir::new().unwrap();
    let storage = FileSystemStorage::new(dir.path(), "/media/");

    for name in ["../escape.png", "sub/dir.png", "", ".hidden", "a b.png"] {
        let err = storage.save(name, b"x").unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)), "{}", name);
    }
}

#[test]
fn test_storage_key_validation() {
    assert!(StorageKey::new("upload_42-a").is_ok());
    for bad in ["", "has space", "dot.dot", "../x", "slash/y"] {
        assert!(matches!(StorageKey::new(bad), Err(StorageError::InvalidKey(_))), "{}", bad);
    }

    let a = StorageKey::generate();
    let b = StorageKey::generate();
    assert_ne!(a, b);
    assert!(StorageKey::new(a.as_str()).is_ok());
}

#[test]
fn test_persist_result_writes_both_images() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let storage = FileSystemStorage::new(dir.path(), "/media/");
    let result = sample_result();
    let key = StorageKey::new("job1")?;

    let stored = persist_result(&storage, &key, &result)?;

    assert_eq!(stored.resized.name, "resized_job1.png");
    assert_eq!(stored.processed.name, "processed_job1.png");
    assert_eq!(stored.processed.url, "/media/processed_job1.png");

    let resized = image::open(&stored.resized.path)?.to_rgb8();
    let processed = image::open(&stored.processed.path)?.to_rgb8();
    assert_eq!(resized, result.normalized);
    assert_eq!(processed, result.annotated);
    Ok(())
}

#[test]
fn test_distinct_keys_do_not_collide() -> anyhow::Result<()> {
    let storage = MemoryStorage::default();
    let result = sample_result();

    persist_result(&storage, &StorageKey::generate(), &result)?;
    persist_result(&storage, &StorageKey::generate(), &result)?;
    assert_eq!(storage.objects.lock().unwrap().len(), 4);

    let key = StorageKey::new("same")?;
    persist_result(&storage, &key, &result)?;
    let err = persist_result(&storage, &key, &result).unwrap_err();
    assert!(matches!(err, StorageError::AlreadyExists(_)));
    Ok(())
}

#[test]
fn test_remove_deletes_file_and_tolerates_missing() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let storage = FileSystemStorage::new(dir.path(), "/media/");

    let locator = storage.save("gone.png", b"x")?;
    storage.remove("gone.png")?;
    assert!(!locator.path.exists());

    storage.remove("gone.png")?;
    assert!(matches!(storage.remove("../x.png"), Err(StorageError::InvalidKey(_))));
    Ok(())
}

#[test]
fn test_failed_second_save_removes_resized_file() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let storage = FileSystemStorage::new(dir.path(), "/media/");
    let result = sample_result();
    let key = StorageKey::new("half")?;

    std::fs::write(dir.path().join("processed_half.png"), b"taken")?;
    let err = persist_result(&storage, &key, &result).unwrap_err();

    assert!(matches!(err, StorageError::AlreadyExists(_)), "{:?}", err);
    assert!(!dir.path().join("resized_half.png").exists());
    assert_eq!(std::fs::read(dir.path().join("processed_half.png"))?, b"taken");
    Ok(())
}

#[test]
fn test_failed_second_save_leaves_no_partial_objects() -> anyhow::Result<()> {
    let storage = MemoryStorage::default();
    let result = sample_result();
    let key = StorageKey::new("k1")?;

    storage
        .objects
        .lock()
        .unwrap()
        .insert("processed_k1.png".to_string(), Vec::new());
    assert!(persist_result(&storage, &key, &result).is_err());

    let objects = storage.objects.lock().unwrap();
    assert!(!objects.contains_key("resized_k1.png"));
    assert_eq!(objects.len(), 1);
    Ok(())
}
