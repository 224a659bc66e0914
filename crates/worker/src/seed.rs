//! Bootstrap seeding from the static character lists.

use std::path::Path;

use covdb_core::roster::CharacterList;
use covdb_core::staleness::NEVER_REFRESHED;
use covdb_core::{Collection, RealmTable};

use crate::error::WorkerError;
use crate::store::CharacterStore;

/// Counts reported after seeding one collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: u64,
    /// Names that were already present.
    pub skipped: u64,
    /// Names on realms missing from the realm table.
    pub unknown_realm: u64,
}

impl std::ops::AddAssign for SeedReport {
    fn add_assign(&mut self, rhs: Self) {
        self.inserted += rhs.inserted;
        self.skipped += rhs.skipped;
        self.unknown_realm += rhs.unknown_realm;
    }
}

/// Insert every listed character of `collection` as never refreshed.
pub async fn seed_collection(
    store: &dyn CharacterStore,
    realms: &RealmTable,
    collection: Collection,
    list: &CharacterList,
) -> Result<SeedReport, WorkerError> {
    let mut report = SeedReport::default();

    for (realm, names) in &list.realms {
        if !realms.contains(realm) {
            tracing::warn!(%collection, %realm, names = names.len(), "Skipping unknown realm");
            report.unknown_realm += names.len() as u64;
            continue;
        }
        let inserted = store
            .insert_many(collection, realm, names, NEVER_REFRESHED)
            .await?;
        report.inserted += inserted;
        report.skipped += (names.len() as u64).saturating_sub(inserted);
    }

    tracing::info!(
        %collection,
        inserted = report.inserted,
        skipped = report.skipped,
        unknown_realm = report.unknown_realm,
        "Collection seeded",
    );
    Ok(report)
}

/// Seed every collection whose list file exists in `dir`.
///
/// A missing file is skipped with a warning; a malformed one is an error.
pub async fn seed_all(
    store: &dyn CharacterStore,
    realms: &RealmTable,
    dir: &Path,
) -> Result<SeedReport, WorkerError> {
    let mut total = SeedReport::default();

    for collection in Collection::all() {
        let path = CharacterList::path_for(dir, collection);
        if !path.is_file() {
            tracing::warn!(%collection, path = %path.display(), "No character list, skipping");
            continue;
        }
        let list = CharacterList::load(&path)?;
        total += seed_collection(store, realms, collection, &list).await?;
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use covdb_core::{CovdbError, Faction, Region};

    use super::*;
    use crate::store::memory::MemoryStore;

    fn realms() -> RealmTable {
        RealmTable::from_entries([("Argent Dawn", "argent-dawn")]).unwrap()
    }

    fn list(entries: Vec<(&str, Vec<&str>)>) -> CharacterList {
        CharacterList {
            realms: entries
                .into_iter()
                .map(|(realm, names)| {
                    (
                        realm.to_string(),
                        names.iter().map(|n| n.to_string()).collect(),
                    )
                })
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[tokio::test]
    async fn seeds_known_realms_as_never_refreshed() {
        let store = MemoryStore::new();
        let collection = Collection::new(Region::Eu, Faction::Alliance);
        let list = list(vec![
            ("Argent Dawn", vec!["Alice", "Bob"]),
            ("Nowhere", vec!["Carol"]),
        ]);

        let report = seed_collection(&store, &realms(), collection, &list)
            .await
            .unwrap();

        assert_eq!(
            report,
            SeedReport {
                inserted: 2,
                skipped: 0,
                unknown_realm: 1
            }
        );
        let rows = store.all(collection);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|c| c.last_modified == Some(NEVER_REFRESHED)));
    }

    #[tokio::test]
    async fn reseeding_skips_existing() {
        let store = MemoryStore::new();
        let collection = Collection::new(Region::Us, Faction::Horde);
        let list = list(vec![("Argent Dawn", vec!["Alice", "Bob"])]);

        seed_collection(&store, &realms(), collection, &list)
            .await
            .unwrap();
        let again = seed_collection(&store, &realms(), collection, &list)
            .await
            .unwrap();

        assert_eq!(again.inserted, 0);
        assert_eq!(again.skipped, 2);
        assert_eq!(store.all(collection).len(), 2);
    }

    #[tokio::test]
    async fn seed_all_skips_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("characters_kr_horde.toml"),
            "[realms]\n\"Argent Dawn\" = [\"Alice\"]\n",
        )
        .unwrap();
        let store = MemoryStore::new();

        let report = seed_all(&store, &realms(), dir.path()).await.unwrap();

        assert_eq!(report.inserted, 1);
        assert_eq!(
            store.all(Collection::new(Region::Kr, Faction::Horde)).len(),
            1
        );
    }

    #[tokio::test]
    async fn seed_all_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("characters_us_horde.toml"), "realms = 3\n").unwrap();
        let store = MemoryStore::new();

        let err = seed_all(&store, &realms(), dir.path()).await.unwrap_err();

        assert!(matches!(
            err,
            WorkerError::Domain(CovdbError::Parse { .. })
        ));
    }
}
