//! Persistence round-trip and edge case tests.
//!
//! Tests file I/O operations, JSON persistence, and profile round-trip.

use std::path::PathBuf;
use tempfile::TempDir;

use crate::persistence::{load_json, load_json_or_default, save_json};
use crate::profiles::{Profile, ProfileKey, ProfileSet, DEFAULT_PROFILE_AUTHORITY};

// ============================================================================
// JSON Persistence Tests
// ============================================================================

#[tokio::test]
async fn test_save_and_load_json_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("profiles.json");

    let profiles = ProfileSet::default();

    save_json(&file_path, &profiles).await.unwrap();
    let loaded: ProfileSet = load_json(&file_path).await.unwrap();

    assert_eq!(loaded, profiles);
}

#[tokio::test]
async fn test_save_creates_parent_directories() {
    let temp_dir = TempDir::new().unwrap();
    let nested_path = temp_dir.path().join("deeply").join("nested").join("profiles.json");

    let result = save_json(&nested_path, &serde_json::json!({"key": "value"})).await;
    assert!(result.is_ok());
    assert!(nested_path.exists());
}

#[tokio::test]
async fn test_load_nonexistent_file() {
    let file_path = PathBuf::from("/nonexistent/path/profiles.json");

    let result: Result<ProfileSet, _> = load_json(&file_path).await;
    assert!(result.is_err());

    let fallback: ProfileSet = load_json_or_default(&file_path).await;
    assert_eq!(fallback, ProfileSet::default());
}

// ============================================================================
// Profile Persistence Tests
// ============================================================================

#[tokio::test]
async fn test_profiles_full_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("profiles.json");

    let mut profiles = ProfileSet::default();
    profiles.replace_profiles(vec![
        Profile::new("Asia", "https://asia.example.org/gma/", "https://thekey.me/cas"),
        Profile::new("Europe", "https://eu.example.org/gma/", "https://thekey.me/cas"),
    ]);
    profiles.set_custom(Profile::new("Mine", "http://10.0.0.5/gma/", "https://cas.mine.org/cas"));
    profiles.select(ProfileKey::Index(1)).unwrap();

    save_json(&file_path, &profiles).await.unwrap();
    let loaded: ProfileSet = load_json(&file_path).await.unwrap();

    assert_eq!(loaded.current, ProfileKey::Index(1));
    assert_eq!(loaded.current().label, "Europe");
    assert_eq!(loaded.custom.gma_base, "http://10.0.0.5/gma/");
    assert_eq!(loaded.profiles.len(), 2);
}

// ============================================================================
// Backward Compatibility Tests
// ============================================================================

#[tokio::test]
async fn test_load_minimal_json_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("minimal.json");

    tokio::fs::write(&file_path, "{}").await.unwrap();

    let loaded: ProfileSet = load_json(&file_path).await.unwrap();

    assert_eq!(loaded, ProfileSet::default());
    assert_eq!(loaded.authority, DEFAULT_PROFILE_AUTHORITY);
}

#[tokio::test]
async fn test_load_json_with_unknown_fields() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("extra_fields.json");

    let json = r#"{
        "current": "custom",
        "unknown_field": 12345,
        "profiles": [
            { "label": "Asia", "gmaBase": "https://asia.example.org/gma/", "casURL": "https://thekey.me/cas", "region": "APAC" }
        ]
    }"#;
    tokio::fs::write(&file_path, json).await.unwrap();

    let loaded: ProfileSet = load_json(&file_path).await.unwrap();
    assert_eq!(loaded.current, ProfileKey::Custom);
    assert_eq!(loaded.profiles[0].label, "Asia");
}

#[tokio::test]
async fn test_invalid_key_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("bad_key.json");
    tokio::fs::write(&file_path, r#"{ "current": "second" }"#).await.unwrap();

    let result: Result<ProfileSet, _> = load_json(&file_path).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_atomic_write() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("atomic.json");

    save_json(&file_path, &ProfileSet::default()).await.unwrap();

    assert!(!file_path.with_extension("json.tmp").exists());
    assert!(file_path.exists());
}

// ============================================================================
// Edge Cases
// ============================================================================

#[tokio::test]
async fn test_unicode_labels() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("unicode.json");

    let mut profiles = ProfileSet::default();
    profiles.set_custom(Profile::new(
        "日本 サーバー",
        "https://jp.example.org/gma/",
        "https://thekey.me/cas",
    ));

    save_json(&file_path, &profiles).await.unwrap();
    let loaded: ProfileSet = load_json(&file_path).await.unwrap();

    assert_eq!(loaded.custom.label, "日本 サーバー");
}
