// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # GMA Store
//!
//! Server profiles for the GMA reporting client.
//!
//! This crate provides:
//!
//! - **Profiles**: the known GMA/CAS server pairs, a custom one, and the selection
//! - **ProfileStore**: the profile set with JSON persistence and refresh from
//!   the profile authority
//! - **Persistence**: File I/O helpers for JSON data
//!
//! ## Usage
//!
//! ```ignore
//! use gma_store::{ProfileKey, ProfileStore};
//! use gma_fetch::ReqwestTransport;
//!
//! let store = ProfileStore::load_default().await;
//! store.refresh(&ReqwestTransport::new()).await?;
//! store.select(ProfileKey::Index(0)).await?;
//! store.save().await?;
//! ```

pub mod error;
pub mod persistence;
pub mod profile_store;
pub mod profiles;

pub use error::StoreError;
pub use persistence::{
    default_config_dir, default_profiles_path, load_json, load_json_or_default, save_json,
};
pub use profile_store::{fetch_profiles, ProfileStore};
pub use profiles::{Profile, ProfileKey, ProfileSet, DEFAULT_PROFILE_AUTHORITY};

#[cfg(test)]
mod persistence_tests;
