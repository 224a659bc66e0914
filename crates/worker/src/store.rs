//! Store seam used by the refresh engine, seeding, insertion and export.
//!
//! [`PgCharacterStore`] forwards to [`CharacterRepo`]; unit tests swap in
//! an in-memory implementation.

use async_trait::async_trait;
use covdb_core::types::{DbId, Timestamp};
use covdb_core::{Collection, Covenant};
use covdb_db::models::character::{Character, NewCharacter};
use covdb_db::repositories::CharacterRepo;
use covdb_db::DbPool;

#[async_trait]
pub trait CharacterStore: Send + Sync {
    /// Clock the store stamps rows with.
    async fn now(&self) -> Result<Timestamp, sqlx::Error>;

    async fn count_all(&self, collection: Collection) -> Result<i64, sqlx::Error>;

    async fn count_due(&self, collection: Collection, cutoff: Timestamp)
        -> Result<i64, sqlx::Error>;

    /// Atomically select one due record and stamp it as just refreshed.
    /// Records reset since `pass_started` are not handed out again.
    async fn claim_next_due(
        &self,
        collection: Collection,
        cutoff: Timestamp,
        pass_started: Timestamp,
    ) -> Result<Option<Character>, sqlx::Error>;

    async fn mark_refreshed(
        &self,
        collection: Collection,
        id: DbId,
        covenant: Option<&Covenant>,
    ) -> Result<bool, sqlx::Error>;

    async fn reset_last_modified(&self, collection: Collection, id: DbId)
        -> Result<bool, sqlx::Error>;

    async fn delete(&self, collection: Collection, id: DbId) -> Result<bool, sqlx::Error>;

    /// Insert unless `(name, realm)` exists; `None` means already present.
    async fn insert(
        &self,
        collection: Collection,
        input: &NewCharacter,
    ) -> Result<Option<Character>, sqlx::Error>;

    async fn insert_many(
        &self,
        collection: Collection,
        realm: &str,
        names: &[String],
        last_modified: Timestamp,
    ) -> Result<u64, sqlx::Error>;

    /// Distinct realm names present in the collection, sorted.
    async fn list_realms(&self, collection: Collection) -> Result<Vec<String>, sqlx::Error>;

    /// Characters with a chosen covenant, ordered by realm then name.
    async fn list_with_covenant(&self, collection: Collection)
        -> Result<Vec<Character>, sqlx::Error>;
}

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgCharacterStore {
    pool: DbPool,
}

impl PgCharacterStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CharacterStore for PgCharacterStore {
    async fn now(&self) -> Result<Timestamp, sqlx::Error> {
        CharacterRepo::now(&self.pool).await
    }

    async fn count_all(&self, collection: Collection) -> Result<i64, sqlx::Error> {
        CharacterRepo::count_all(&self.pool, collection).await
    }

    async fn count_due(
        &self,
        collection: Collection,
        cutoff: Timestamp,
    ) -> Result<i64, sqlx::Error> {
        CharacterRepo::count_due(&self.pool, collection, cutoff).await
    }

    async fn claim_next_due(
        &self,
        collection: Collection,
        cutoff: Timestamp,
        pass_started: Timestamp,
    ) -> Result<Option<Character>, sqlx::Error> {
        CharacterRepo::claim_next_due(&self.pool, collection, cutoff, pass_started).await
    }

    async fn mark_refreshed(
        &self,
        collection: Collection,
        id: DbId,
        covenant: Option<&Covenant>,
    ) -> Result<bool, sqlx::Error> {
        CharacterRepo::mark_refreshed(&self.pool, collection, id, covenant).await
    }

    async fn reset_last_modified(
        &self,
        collection: Collection,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        CharacterRepo::reset_last_modified(&self.pool, collection, id).await
    }

    async fn delete(&self, collection: Collection, id: DbId) -> Result<bool, sqlx::Error> {
        CharacterRepo::delete(&self.pool, collection, id).await
    }

    async fn insert(
        &self,
        collection: Collection,
        input: &NewCharacter,
    ) -> Result<Option<Character>, sqlx::Error> {
        CharacterRepo::insert(&self.pool, collection, input).await
    }

    async fn insert_many(
        &self,
        collection: Collection,
        realm: &str,
        names: &[String],
        last_modified: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        CharacterRepo::insert_many(&self.pool, collection, realm, names, last_modified).await
    }

    async fn list_realms(&self, collection: Collection) -> Result<Vec<String>, sqlx::Error> {
        CharacterRepo::list_realms(&self.pool, collection).await
    }

    async fn list_with_covenant(
        &self,
        collection: Collection,
    ) -> Result<Vec<Character>, sqlx::Error> {
        CharacterRepo::list_with_covenant(&self.pool, collection).await
    }
}
