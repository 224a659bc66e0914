//! Single character insertion.

use covdb_core::{Collection, CovdbError, RealmTable};
use covdb_db::models::character::{Character, NewCharacter};

use crate::error::WorkerError;
use crate::store::CharacterStore;

#[derive(Debug)]
pub enum InsertOutcome {
    Inserted(Character),
    /// `(name, realm)` already exists in the collection.
    AlreadyPresent,
}

/// Insert one never-refreshed character. Unknown realms are rejected.
pub async fn insert_character(
    store: &dyn CharacterStore,
    realms: &RealmTable,
    collection: Collection,
    realm: &str,
    name: &str,
) -> Result<InsertOutcome, WorkerError> {
    if !realms.contains(realm) {
        return Err(CovdbError::UnknownRealm(realm.to_string()).into());
    }
    if name.trim().is_empty() {
        return Err(CovdbError::Validation("character name is empty".into()).into());
    }

    let input = NewCharacter::never_refreshed(realm, name);
    let outcome = match store.insert(collection, &input).await? {
        Some(character) => InsertOutcome::Inserted(character),
        None => InsertOutcome::AlreadyPresent,
    };

    match &outcome {
        InsertOutcome::Inserted(c) => {
            tracing::info!(%collection, id = c.id, realm, name, "Character inserted")
        }
        InsertOutcome::AlreadyPresent => {
            tracing::info!(%collection, realm, name, "Character already present")
        }
    }
    Ok(outcome)
}
