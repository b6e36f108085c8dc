//! Server profiles.
//!
//! A profile names one GMA backend and the CAS server that issues tickets
//! for it. The set holds the known profiles, one user-defined custom
//! profile, and which of them is selected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Where the latest list of profiles is published.
pub const DEFAULT_PROFILE_AUTHORITY: &str = "http://test.dodomail.net/MobileGMA/profiles.json";

// ============================================================================
// Profile
// ============================================================================

/// One server profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Display label.
    pub label: String,
    /// GMA backend base URL.
    #[serde(rename = "gmaBase")]
    pub gma_base: String,
    /// CAS server URL.
    #[serde(rename = "casURL")]
    pub cas_url: String,
}

impl Profile {
    /// Creates a profile.
    pub fn new(
        label: impl Into<String>,
        gma_base: impl Into<String>,
        cas_url: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            gma_base: gma_base.into(),
            cas_url: cas_url.into(),
        }
    }

    /// The built-in demo server.
    pub fn global_ops_demo() -> Self {
        Self::new(
            "Global Ops Demo",
            "https://globalopsccci.org/gma47demo1/",
            "https://thekey.me/cas",
        )
    }

    /// Placeholder for the user-defined server.
    pub fn custom_placeholder() -> Self {
        Self::new(
            "Custom server...",
            "http://gma.example.com/",
            "https://signin.example.com/cas",
        )
    }
}

// ============================================================================
// Profile Key
// ============================================================================

/// Selects a profile: a list index or the custom profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ProfileKey {
    /// Index into the profile list.
    Index(usize),
    /// The custom profile.
    Custom,
}

impl Default for ProfileKey {
    fn default() -> Self {
        Self::Index(0)
    }
}

impl fmt::Display for ProfileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::Custom => f.write_str("custom"),
        }
    }
}

impl FromStr for ProfileKey {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("custom") {
            return Ok(Self::Custom);
        }
        s.parse()
            .map(Self::Index)
            .map_err(|_| StoreError::InvalidProfileKey(s.to_string()))
    }
}

impl TryFrom<String> for ProfileKey {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ProfileKey> for String {
    fn from(key: ProfileKey) -> Self {
        key.to_string()
    }
}

// ============================================================================
// Profile Set
// ============================================================================

/// Known profiles plus the custom profile and the current selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSet {
    /// Profiles published by the authority.
    pub profiles: Vec<Profile>,
    /// The user-defined profile.
    pub custom: Profile,
    /// The selected profile.
    pub current: ProfileKey,
    /// URL the profile list is refreshed from.
    pub authority: String,
}

impl Default for ProfileSet {
    fn default() -> Self {
        Self {
            profiles: vec![Profile::global_ops_demo()],
            custom: Profile::custom_placeholder(),
            current: ProfileKey::default(),
            authority: DEFAULT_PROFILE_AUTHORITY.to_string(),
        }
    }
}

impl ProfileSet {
    /// Looks up a profile.
    pub fn get(&self, key: ProfileKey) -> Option<&Profile> {
        match key {
            ProfileKey::Index(i) => self.profiles.get(i),
            ProfileKey::Custom => Some(&self.custom),
        }
    }

    /// The selected profile.
    ///
    /// A selection that no longer exists falls back to the first profile,
    /// then to the custom one.
    pub fn current(&self) -> &Profile {
        self.get(self.current)
            .or_else(|| self.profiles.first())
            .unwrap_or(&self.custom)
    }

    /// Selects a profile.
    ///
    /// # Errors
    ///
    /// Returns `ProfileNotFound` for an index past the end of the list.
    pub fn select(&mut self, key: ProfileKey) -> Result<&Profile, StoreError> {
        if self.get(key).is_none() {
            return Err(StoreError::ProfileNotFound(key.to_string()));
        }
        self.current = key;
        Ok(self.current())
    }

    /// Replaces the custom profile.
    pub fn set_custom(&mut self, profile: Profile) {
        self.custom = profile;
    }

    /// Replaces the published profiles, keeping the selection when it still exists.
    pub fn replace_profiles(&mut self, profiles: Vec<Profile>) {
        self.profiles = profiles;
        if self.get(self.current).is_none() {
            self.current = ProfileKey::default();
        }
    }

    /// Labels keyed by profile; the custom profile comes last.
    pub fn labels(&self) -> Vec<(ProfileKey, &str)> {
        self.profiles
            .iter()
            .enumerate()
            .map(|(i, p)| (ProfileKey::Index(i), p.label.as_str()))
            .chain(std::iter::once((ProfileKey::Custom, self.custom.label.as_str())))
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_profile_key_parse() {
        assert_eq!("0".parse::<ProfileKey>().unwrap(), ProfileKey::Index(0));
        assert_eq!(" 3 ".parse::<ProfileKey>().unwrap(), ProfileKey::Index(3));
        assert_eq!("custom".parse::<ProfileKey>().unwrap(), ProfileKey::Custom);
        assert!(matches!(
            "first".parse::<ProfileKey>(),
            Err(StoreError::InvalidProfileKey(_))
        ));
        assert_eq!(ProfileKey::Custom.to_string(), "custom");
    }

    #[test]
    fn test_profile_wire_names() {
        let value = serde_json::to_value(Profile::global_ops_demo()).unwrap();
        assert_eq!(
            value,
            json!({
                "label": "Global Ops Demo",
                "gmaBase": "https://globalopsccci.org/gma47demo1/",
                "casURL": "https://thekey.me/cas"
            })
        );
    }

    #[test]
    fn test_defaults() {
        let set = ProfileSet::default();
        assert_eq!(set.current(), &Profile::global_ops_demo());
        assert_eq!(set.authority, DEFAULT_PROFILE_AUTHORITY);
        assert_eq!(set.get(ProfileKey::Custom), Some(&Profile::custom_placeholder()));
    }

    #[test]
    fn test_select() {
        let mut set = ProfileSet::default();

        assert_eq!(set.select(ProfileKey::Custom).unwrap().label, "Custom server...");
        assert!(matches!(
            set.select(ProfileKey::Index(5)),
            Err(StoreError::ProfileNotFound(_))
        ));
        assert_eq!(set.current, ProfileKey::Custom);
    }

    #[test]
    fn test_replace_profiles_resets_missing_selection() {
        let mut set = ProfileSet::default();
        set.replace_profiles(vec![
            Profile::new("A", "https://a.example.com/", "https://cas.example.com/cas"),
            Profile::new("B", "https://b.example.com/", "https://cas.example.com/cas"),
        ]);
        set.select(ProfileKey::Index(1)).unwrap();

        set.replace_profiles(vec![Profile::new(
            "C",
            "https://c.example.com/",
            "https://cas.example.com/cas",
        )]);

        assert_eq!(set.current, ProfileKey::Index(0));
        assert_eq!(set.current().label, "C");
    }

    #[test]
    fn test_current_falls_back_when_list_empty() {
        let mut set = ProfileSet::default();
        set.replace_profiles(Vec::new());
        assert_eq!(set.current(), &set.custom);
    }

    #[test]
    fn test_labels() {
        let set = ProfileSet::default();
        assert_eq!(
            set.labels(),
            vec![
                (ProfileKey::Index(0), "Global Ops Demo"),
                (ProfileKey::Custom, "Custom server..."),
            ]
        );
    }

    #[test]
    fn test_set_serializes_key_as_string() {
        let mut set = ProfileSet::default();
        set.current = ProfileKey::Custom;
        let value = serde_json::to_value(&set).unwrap();
        assert_eq!(value["current"], json!("custom"));

        let back: ProfileSet = serde_json::from_value(value).unwrap();
        assert_eq!(back, set);
    }
}
