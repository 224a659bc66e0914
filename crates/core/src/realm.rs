//! Realm resolution table.
//!
//! Maps a realm display name (as stored on character records) to the slug
//! the Battle.net API expects in profile URLs. Loaded once at startup from a
//! TOML file and never mutated afterwards:
//!
//! ```toml
//! [realms]
//! "Area 52" = "area-52"
//! "Aerie Peak" = "aerie-peak"
//! ```
//!
//! A character whose realm is missing from the table is not eligible for
//! refresh.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::CovdbError;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RealmFile {
    realms: BTreeMap<String, String>,
}

/// Immutable realm name -> slug mapping.
#[derive(Debug, Clone, Default)]
pub struct RealmTable {
    slugs: BTreeMap<String, String>,
}

/// Slugs are path segments: non-empty, lowercase, no whitespace or `/`.
fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| !c.is_whitespace() && c != '/' && !c.is_uppercase())
}

impl RealmTable {
    /// Read and validate the realm definition file.
    pub fn load(path: &Path) -> Result<Self, CovdbError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CovdbError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: RealmFile = toml::from_str(&raw).map_err(|source| CovdbError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_entries(file.realms)
    }

    /// Build a table from already-parsed entries, validating every slug.
    pub fn from_entries<I, K, V>(entries: I) -> Result<Self, CovdbError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut slugs = BTreeMap::new();
        for (realm, slug) in entries {
            let realm = realm.into();
            let slug = slug.into();
            if realm.trim().is_empty() {
                return Err(CovdbError::Validation("empty realm name".into()));
            }
            if !is_valid_slug(&slug) {
                return Err(CovdbError::InvalidSlug { realm, slug });
            }
            slugs.insert(realm, slug);
        }
        Ok(Self { slugs })
    }

    /// Slug for `realm`, or `None` if the realm is unknown.
    pub fn resolve(&self, realm: &str) -> Option<&str> {
        self.slugs.get(realm).map(String::as_str)
    }

    pub fn contains(&self, realm: &str) -> bool {
        self.slugs.contains_key(realm)
    }

    pub fn len(&self) -> usize {
        self.slugs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slugs.is_empty()
    }
}
