//! Static character lists used to seed a collection.
//!
//! One TOML file per (region, faction) pair, named after the collection
//! table (`characters_eu_horde.toml`):
//!
//! ```toml
//! [realms]
//! "Argent Dawn" = ["Alice", "Bob"]
//! "Ravencrest" = ["Carol"]
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::CovdbError;
use crate::region::Collection;

/// Character names grouped by realm display name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CharacterList {
    pub realms: BTreeMap<String, Vec<String>>,
}

impl CharacterList {
    /// Path of the list file for `collection` inside `dir`.
    pub fn path_for(dir: &Path, collection: Collection) -> PathBuf {
        dir.join(format!("{}.toml", collection.table_name()))
    }

    pub fn load(path: &Path) -> Result<Self, CovdbError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CovdbError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| CovdbError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Total number of names across all realms.
    pub fn len(&self) -> usize {
        self.realms.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::{Faction, Region};

    #[test]
    fn path_uses_table_name() {
        let p = CharacterList::path_for(
            Path::new("/data/rio"),
            Collection::new(Region::Eu, Faction::Horde),
        );
        assert_eq!(p, PathBuf::from("/data/rio/characters_eu_horde.toml"));
    }

    #[test]
    fn loads_names_per_realm() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.toml");
        std::fs::write(
            &path,
            "[realms]\n\"Argent Dawn\" = [\"Alice\", \"Bob\"]\nRavencrest = [\"Carol\"]\n",
        )
        .unwrap();

        let list = CharacterList::load(&path).unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list.realms["Argent Dawn"], vec!["Alice", "Bob"]);
    }

    #[test]
    fn unknown_top_level_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.toml");
        std::fs::write(&path, "[characters]\nfoo = [\"bar\"]\n").unwrap();
        assert!(matches!(
            CharacterList::load(&path),
            Err(CovdbError::Parse { .. })
        ));
    }
}
