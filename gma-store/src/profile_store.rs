//! Persistent profile store.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use gma_fetch::{Method, ResponseBody, ResponseKind, Transport, TransportRequest};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::error::StoreError;
use crate::persistence::{default_profiles_path, load_json_or_default, save_json};
use crate::profiles::{Profile, ProfileKey, ProfileSet};

/// Profile set backed by a JSON file.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    profiles: Arc<RwLock<ProfileSet>>,
    path: PathBuf,
}

impl ProfileStore {
    /// Creates a store with the built-in profiles.
    pub fn new(path: PathBuf) -> Self {
        Self {
            profiles: Arc::new(RwLock::new(ProfileSet::default())),
            path,
        }
    }

    /// Loads profiles from the default path.
    pub async fn load_default() -> Self {
        Self::load(default_profiles_path()).await
    }

    /// Loads profiles from a path, falling back to the built-in profiles.
    pub async fn load(path: PathBuf) -> Self {
        let profiles: ProfileSet = load_json_or_default(&path).await;
        debug!(path = %path.display(), count = profiles.profiles.len(), "Profiles loaded");
        Self {
            profiles: Arc::new(RwLock::new(profiles)),
            path,
        }
    }

    /// The backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets a copy of the current profile set.
    pub async fn get(&self) -> ProfileSet {
        self.profiles.read().await.clone()
    }

    /// The selected profile.
    pub async fn current(&self) -> Profile {
        self.profiles.read().await.current().clone()
    }

    /// Updates the profile set in place.
    pub async fn update<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut ProfileSet) -> R,
    {
        let mut profiles = self.profiles.write().await;
        f(&mut profiles)
    }

    /// Selects a profile.
    ///
    /// # Errors
    ///
    /// Returns `ProfileNotFound` if the key does not name a profile.
    pub async fn select(&self, key: ProfileKey) -> Result<Profile, StoreError> {
        self.update(|set| set.select(key).cloned()).await
    }

    /// Replaces the custom profile and selects it.
    pub async fn set_custom(&self, profile: Profile) {
        self.update(|set| {
            set.set_custom(profile);
            set.current = ProfileKey::Custom;
        })
        .await;
    }

    /// Saves the profile set to disk.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be written.
    pub async fn save(&self) -> Result<(), StoreError> {
        let profiles = self.profiles.read().await;
        save_json(&self.path, &*profiles).await?;
        info!(path = %self.path.display(), "Profiles saved");
        Ok(())
    }

    /// Fetches the latest profile list from the configured authority.
    ///
    /// # Errors
    ///
    /// See [`fetch_profiles`].
    pub async fn refresh(&self, transport: &dyn Transport) -> Result<Vec<Profile>, StoreError> {
        let authority = self.profiles.read().await.authority.clone();
        self.refresh_from(transport, &authority).await
    }

    /// Fetches the latest profile list from `url` and replaces the known profiles.
    ///
    /// # Errors
    ///
    /// See [`fetch_profiles`].
    pub async fn refresh_from(
        &self,
        transport: &dyn Transport,
        url: &str,
    ) -> Result<Vec<Profile>, StoreError> {
        let profiles = fetch_profiles(transport, url).await?;
        self.update(|set| set.replace_profiles(profiles.clone())).await;
        info!(count = profiles.len(), "Profiles refreshed");
        Ok(profiles)
    }
}

/// Fetches the published profile list.
///
/// # Errors
///
/// `Fetch` when the request fails, `UnexpectedProfileData` when the answer
/// is not a list, `Serialization` when an entry is not a profile.
#[instrument(skip(transport))]
pub async fn fetch_profiles(transport: &dyn Transport, url: &str) -> Result<Vec<Profile>, StoreError> {
    let response = transport
        .call(TransportRequest::new(Method::Get, url, ResponseKind::Json))
        .await?;

    match response.body {
        ResponseBody::Json(list @ Value::Array(_)) => Ok(serde_json::from_value(list)?),
        _ => Err(StoreError::UnexpectedProfileData),
    }
}

// ============================================================================
// Tests
// ============================================================================
