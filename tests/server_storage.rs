#![cfg(feature = "server")]

use canvas_studio::imaging::DataUrl;
use canvas_studio::server::{ApiError, ImageStore};
use tempfile::TempDir;

#[tokio::test]
async fn test_upload_keeps_stem_and_extension() {
    let dir = TempDir::new().unwrap();
    let store = ImageStore::new(dir.path());

    let url = store.save_upload("../../holiday photo.png", b"\x89PNG").await.unwrap();
    let name = url.strip_prefix("/uploads/").unwrap();
    assert!(name.starts_with("holiday photo_"));
    assert!(name.ends_with(".png"));
    assert_eq!(name.len(), "holiday photo_".len() + 32 + ".png".len());

    let stored = tokio::fs::read(dir.path().join("uploads").join(name)).await.unwrap();
    assert_eq!(stored, b"\x89PNG");
    assert_eq!(store.read("uploads", name).await.unwrap(), b"\x89PNG");
}

#[tokio::test]
async fn test_empty_upload_is_rejected() {
    let dir = TempDir::new().unwrap();
    let store = ImageStore::new(dir.path());
    let err = store.save_upload("a.png", &[]).await.unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(ref message) if message == "No file uploaded."));
}

#[tokio::test]
async fn test_save_data_url_picks_extension() {
    let dir = TempDir::new().unwrap();
    let store = ImageStore::new(dir.path());

    let jpeg = store.save_data_url(&DataUrl::encode("image/jpeg", b"jpeg")).await.unwrap();
    assert!(jpeg.starts_with("/edits/edit_"));
    assert!(jpeg.ends_with(".jpg"));

    let webp = store.save_data_url(&DataUrl::encode("image/webp", b"webp")).await.unwrap();
    assert!(webp.ends_with(".png"));
    let name = webp.strip_prefix("/edits/").unwrap();
    assert_eq!(tokio::fs::read(dir.path().join("edits").join(name)).await.unwrap(), b"webp");
}

#[tokio::test]
async fn test_save_validation_messages() {
    let dir = TempDir::new().unwrap();
    let store = ImageStore::new(dir.path());

    let message = |err: ApiError| match err {
        ApiError::BadRequest(message) => message,
        other => panic!("expected bad request, got {other:?}"),
    };
    assert_eq!(message(store.save_data_url("  ").await.unwrap_err()), "No image data.");
    assert_eq!(message(store.save_data_url("data:image/png").await.unwrap_err()), "Invalid data URL.");
    assert_eq!(
        message(store.save_data_url("data:image/png;base64,@@@").await.unwrap_err()),
        "Invalid base64 content."
    );
}

#[tokio::test]
async fn test_read_refuses_paths_outside_store() {
    let dir = TempDir::new().unwrap();
    let store = ImageStore::new(dir.path());
    assert!(store.read("secrets", "a.png").await.is_none());
    assert!(store.read("uploads", "../a.png").await.is_none());
}
